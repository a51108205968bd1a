use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ClientStatus {
    #[default]
    Pending,
    Active,
    Inactive,
}

/// Cliente do escritório (collection "clients")
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Client {
    #[serde(rename = "_id")]
    pub id: String,

    /// Sempre em minúsculas, único
    pub email: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(default)]
    pub status: ClientStatus,

    pub created_at: i64,
    pub updated_at: i64,
}

/// Campos editáveis do perfil. `None` mantém o valor atual.
#[derive(Debug, Clone, Default, Deserialize, utoipa::ToSchema)]
pub struct ClientProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    /// Only honoured on admin routes
    pub status: Option<ClientStatus>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl Client {
    pub fn new(email: &str, name: &str) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            email: email.trim().to_lowercase(),
            name: name.trim().to_string(),
            phone: None,
            address_line1: None,
            address_line2: None,
            city: None,
            postal_code: None,
            country: None,
            status: ClientStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a profile update. Status changes only when `allow_status` is set.
    pub fn apply(&mut self, update: ClientProfileUpdate, allow_status: bool) {
        if let Some(name) = non_empty(update.name) {
            self.name = name;
        }
        if update.phone.is_some() {
            self.phone = non_empty(update.phone);
        }
        if update.address_line1.is_some() {
            self.address_line1 = non_empty(update.address_line1);
        }
        if update.address_line2.is_some() {
            self.address_line2 = non_empty(update.address_line2);
        }
        if update.city.is_some() {
            self.city = non_empty(update.city);
        }
        if update.postal_code.is_some() {
            self.postal_code = non_empty(update.postal_code);
        }
        if update.country.is_some() {
            self.country = non_empty(update.country);
        }
        if allow_status {
            if let Some(status) = update.status {
                self.status = status;
            }
        }
        self.updated_at = chrono::Utc::now().timestamp();
    }
}
