use crate::config::AppConfig;
use crate::database::PortalStore;
use crate::services::admin_service::AdminSelection;
use crate::services::disk_storage::DiskStorage;
use crate::services::gemini_service::GeminiClient;
use crate::services::helpchat_service::HelpchatService;
use crate::services::signed_url::UrlSigner;
use crate::services::token_service::TokenVerifier;
use std::sync::Arc;

/// Shared by every worker through `web::Data<AppState>`
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn PortalStore>,
    pub verifier: TokenVerifier,
    pub storage: DiskStorage,
    pub signer: UrlSigner,
    pub selection: AdminSelection,
    pub helpchat: HelpchatService,
    pub ai: GeminiClient,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn PortalStore>) -> Self {
        Self {
            verifier: TokenVerifier::new(&config),
            storage: DiskStorage::new(&config),
            signer: UrlSigner::new(&config),
            selection: AdminSelection::new(&config.data_dir),
            helpchat: HelpchatService::new(&config.data_dir),
            ai: GeminiClient::new(&config),
            store,
            config,
        }
    }
}
