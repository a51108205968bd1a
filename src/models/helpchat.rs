use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
    Admin,
}

/// Linha do log do help-chat (arquivo helpchat-log.json)
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HelpchatLogEntry {
    pub session_id: String,
    pub role: ChatRole,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    pub created_at: i64,
}

/// Resposta do admin aguardando entrega ao widget (helpchat-outbox.json)
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutboxMessage {
    pub id: String,
    pub session_id: String,
    pub message: String,
    pub created_at: i64,
    #[serde(default)]
    pub delivered: bool,
}
