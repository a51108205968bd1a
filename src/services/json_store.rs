// JSON files under DATA_DIR (seleção do admin, help-chat).
// Read-modify-write serializado por um mutex do processo; escrita via rename.

use crate::utils::error::{AppError, AppResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::PathBuf;
use tokio::sync::Mutex;

pub struct JsonFileStore<T> {
    path: PathBuf,
    lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
            _marker: PhantomData,
        }
    }

    async fn read_unlocked(&self) -> AppResult<T> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(|b| b.is_ascii_whitespace()) => Ok(T::default()),
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(value) => Ok(value),
                Err(e) => {
                    log::error!("❌ Corrupt JSON in {}, starting empty: {}", self.path.display(), e);
                    Ok(T::default())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
            Err(e) => Err(AppError::StorageError(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn write_unlocked(&self, value: &T) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(value)
            .map_err(|e| AppError::StorageError(format!("Failed to encode JSON: {}", e)))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    pub async fn load(&self) -> AppResult<T> {
        let _guard = self.lock.lock().await;
        self.read_unlocked().await
    }

    /// Applies `f` to the current value and persists the result.
    pub async fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> AppResult<R> {
        let _guard = self.lock.lock().await;
        let mut value = self.read_unlocked().await?;
        let result = f(&mut value);
        self.write_unlocked(&value).await?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_reads_default() {
        let dir = tempfile::tempdir().unwrap();
        let store: JsonFileStore<Vec<String>> = JsonFileStore::new(dir.path().join("x.json"));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/selected.json");
        let store: JsonFileStore<Vec<String>> = JsonFileStore::new(path.clone());

        let len = store.update(|v| {
            v.push("a".into());
            v.len()
        }).await.unwrap();
        assert_eq!(len, 1);

        let reopened: JsonFileStore<Vec<String>> = JsonFileStore::new(path);
        assert_eq!(reopened.load().await.unwrap(), vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store: JsonFileStore<Vec<String>> = JsonFileStore::new(path);
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(JsonFileStore::<Vec<u32>>::new(dir.path().join("n.json")));

        let mut handles = Vec::new();
        for i in 0..20 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.update(|v| v.push(i)).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.load().await.unwrap().len(), 20);
    }
}
