use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Client,
}

/// Documento da collection "users", chave = email.
/// É a única fonte de verdade para saber quem é admin.
#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
pub struct User {
    #[serde(rename = "_id")]
    pub email: String,
    pub role: UserRole,
    pub created_at: i64,
}

impl User {
    pub fn new(email: &str, role: UserRole) -> Self {
        Self {
            email: email.trim().to_lowercase(),
            role,
            created_at: chrono::Utc::now().timestamp(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}
