use crate::database::AdminTable;
use crate::middleware::auth::Claims;
use crate::models::{Client, ClientProfileUpdate, HelpchatLogEntry, OutboxMessage};
use crate::services::admin_service::require_admin;
use crate::services::helpchat_service::{HelpchatLogRequest, OutboxRequest};
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};
use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

const DEFAULT_TABLE_LIMIT: usize = 100;
const MAX_TABLE_LIMIT: usize = 500;

#[derive(Serialize, utoipa::ToSchema)]
pub struct ClientsResponse {
    pub success: bool,
    pub clients: Vec<Client>,
    pub count: usize,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct TableQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct TableResponse {
    pub success: bool,
    pub table: String,
    #[schema(value_type = Vec<Object>)]
    pub rows: Vec<serde_json::Value>,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct SelectedClients {
    #[serde(default)]
    pub selected: Vec<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuery {
    pub session_id: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HelpchatLogResponse {
    pub success: bool,
    pub entries: Vec<HelpchatLogEntry>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct OutboxResponse {
    pub success: bool,
    pub messages: Vec<OutboxMessage>,
}

fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_TABLE_LIMIT).clamp(1, MAX_TABLE_LIMIT)
}

// ==================== CLIENTS ====================

/// GET /api/admin/clients
#[utoipa::path(
    get,
    path = "/api/admin/clients",
    tag = "Admin",
    responses(
        (status = 200, description = "All clients, newest first", body = ClientsResponse),
        (status = 403, description = "Not an admin")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_clients(user: web::ReqData<Claims>, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    require_admin(state.store.as_ref(), &user).await?;

    let clients = state.store.list_clients().await?;
    Ok(HttpResponse::Ok().json(ClientsResponse {
        success: true,
        count: clients.len(),
        clients,
    }))
}

/// GET /api/admin/clients/{id}
#[utoipa::path(
    get,
    path = "/api/admin/clients/{id}",
    tag = "Admin",
    params(("id" = String, Path, description = "Client id")),
    responses(
        (status = 200, description = "Client", body = crate::api::clients::ClientResponse),
        (status = 404, description = "Unknown client")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_client(
    user: web::ReqData<Claims>,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    require_admin(state.store.as_ref(), &user).await?;

    let id = path.into_inner();
    let client = state
        .store
        .get_client(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Client {}", id)))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "client": client })))
}

/// PUT /api/admin/clients/{id} - Perfil e status
#[utoipa::path(
    put,
    path = "/api/admin/clients/{id}",
    tag = "Admin",
    params(("id" = String, Path, description = "Client id")),
    request_body = ClientProfileUpdate,
    responses(
        (status = 200, description = "Client updated", body = crate::api::clients::ClientResponse),
        (status = 404, description = "Unknown client")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_client(
    user: web::ReqData<Claims>,
    state: web::Data<AppState>,
    path: web::Path<String>,
    update: web::Json<ClientProfileUpdate>,
) -> AppResult<HttpResponse> {
    require_admin(state.store.as_ref(), &user).await?;

    let id = path.into_inner();
    let mut client = state
        .store
        .get_client(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Client {}", id)))?;

    client.apply(update.into_inner(), true);
    state.store.save_client(&client).await?;
    log::info!("✏️  Admin {} updated client {} ({:?})", user.sub, client.id, client.status);

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "client": client })))
}

// ==================== TABLE BROWSER ====================

/// GET /api/admin/tables/{table}?limit=
#[utoipa::path(
    get,
    path = "/api/admin/tables/{table}",
    tag = "Admin",
    params(
        ("table" = String, Path, description = "clients | documents | users | services"),
        TableQuery
    ),
    responses(
        (status = 200, description = "Raw rows", body = TableResponse),
        (status = 400, description = "Unknown table")
    ),
    security(("bearer_auth" = []))
)]
pub async fn browse_table(
    user: web::ReqData<Claims>,
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<TableQuery>,
) -> AppResult<HttpResponse> {
    require_admin(state.store.as_ref(), &user).await?;

    let table = AdminTable::parse(&path.into_inner())?;
    let limit = clamp_limit(query.limit);
    let rows = state.store.list_table(table, limit).await?;

    Ok(HttpResponse::Ok().json(TableResponse {
        success: true,
        table: table.collection_name().to_string(),
        count: rows.len(),
        rows,
    }))
}

// ==================== SELECTED CLIENTS ====================

/// GET /api/admin/selected-clients
#[utoipa::path(
    get,
    path = "/api/admin/selected-clients",
    tag = "Admin",
    responses((status = 200, description = "Current selection", body = SelectedClients)),
    security(("bearer_auth" = []))
)]
pub async fn get_selected_clients(
    user: web::ReqData<Claims>,
    state: web::Data<AppState>,
) -> AppResult<HttpResponse> {
    require_admin(state.store.as_ref(), &user).await?;
    let selected = state.selection.get().await?;
    Ok(HttpResponse::Ok().json(SelectedClients { selected }))
}

/// POST /api/admin/selected-clients
#[utoipa::path(
    post,
    path = "/api/admin/selected-clients",
    tag = "Admin",
    request_body = SelectedClients,
    responses((status = 200, description = "Stored selection", body = SelectedClients)),
    security(("bearer_auth" = []))
)]
pub async fn set_selected_clients(
    user: web::ReqData<Claims>,
    state: web::Data<AppState>,
    body: web::Json<SelectedClients>,
) -> AppResult<HttpResponse> {
    require_admin(state.store.as_ref(), &user).await?;
    let selected = state.selection.set(body.into_inner().selected).await?;
    log::info!("☑️  Admin selection saved ({} clients)", selected.len());
    Ok(HttpResponse::Ok().json(SelectedClients { selected }))
}

// ==================== HELP-CHAT ====================

/// POST /api/admin/helpchat-log - Público (widget do site)
#[utoipa::path(
    post,
    path = "/api/admin/helpchat-log",
    tag = "Help-chat",
    request_body = HelpchatLogRequest,
    responses(
        (status = 200, description = "Entry appended", body = HelpchatLogEntry),
        (status = 400, description = "Empty message or session id"),
        (status = 403, description = "Role admin is reserved for outbox replies")
    )
)]
pub async fn append_helpchat_log(
    state: web::Data<AppState>,
    body: web::Json<HelpchatLogRequest>,
) -> AppResult<HttpResponse> {
    let entry = state.helpchat.append_log(body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "entry": entry })))
}

/// GET /api/admin/helpchat-log?sessionId=
#[utoipa::path(
    get,
    path = "/api/admin/helpchat-log",
    tag = "Help-chat",
    params(SessionQuery),
    responses((status = 200, description = "Log entries", body = HelpchatLogResponse)),
    security(("bearer_auth" = []))
)]
pub async fn get_helpchat_log(
    user: web::ReqData<Claims>,
    state: web::Data<AppState>,
    query: web::Query<SessionQuery>,
) -> AppResult<HttpResponse> {
    require_admin(state.store.as_ref(), &user).await?;
    let entries = state.helpchat.list_log(query.session_id.as_deref()).await?;
    Ok(HttpResponse::Ok().json(HelpchatLogResponse { success: true, entries }))
}

/// POST /api/admin/helpchat-outbox - Resposta do admin para uma sessão
#[utoipa::path(
    post,
    path = "/api/admin/helpchat-outbox",
    tag = "Help-chat",
    request_body = OutboxRequest,
    responses((status = 200, description = "Reply queued", body = OutboxMessage)),
    security(("bearer_auth" = []))
)]
pub async fn enqueue_helpchat_reply(
    user: web::ReqData<Claims>,
    state: web::Data<AppState>,
    body: web::Json<OutboxRequest>,
) -> AppResult<HttpResponse> {
    require_admin(state.store.as_ref(), &user).await?;
    let message = state.helpchat.enqueue(body.into_inner()).await?;
    log::info!("💬 Reply queued for session {}", message.session_id);
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "message": message })))
}

/// GET /api/admin/helpchat-outbox?sessionId= - Público, polling do widget
#[utoipa::path(
    get,
    path = "/api/admin/helpchat-outbox",
    tag = "Help-chat",
    params(SessionQuery),
    responses(
        (status = 200, description = "Pending replies, now marked delivered", body = OutboxResponse),
        (status = 400, description = "Missing sessionId")
    )
)]
pub async fn poll_helpchat_outbox(
    state: web::Data<AppState>,
    query: web::Query<SessionQuery>,
) -> AppResult<HttpResponse> {
    let session_id = query
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("sessionId is required".to_string()))?;

    let messages = state.helpchat.take_pending(session_id).await?;
    Ok(HttpResponse::Ok().json(OutboxResponse { success: true, messages }))
}
