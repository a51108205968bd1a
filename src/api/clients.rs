use crate::middleware::auth::Claims;
use crate::models::{Client, ClientProfileUpdate, Service};
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};
use actix_web::{web, HttpResponse};
use serde::Serialize;

#[derive(Serialize, utoipa::ToSchema)]
pub struct ClientResponse {
    pub success: bool,
    pub client: Client,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ServicesResponse {
    pub success: bool,
    pub services: Vec<Service>,
}

fn token_email(user: &Claims) -> AppResult<String> {
    let email = user.email();
    if email.is_empty() {
        return Err(AppError::InvalidRequest("Token carries no email".to_string()));
    }
    Ok(email)
}

/// GET /api/clients/me - Cadastro do cliente logado
#[utoipa::path(
    get,
    path = "/api/clients/me",
    tag = "Clients",
    responses(
        (status = 200, description = "Caller's client record", body = ClientResponse),
        (status = 404, description = "No client record yet")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_me(user: web::ReqData<Claims>, state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let email = token_email(&user)?;
    let client = state
        .store
        .find_client_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("Client profile".to_string()))?;

    Ok(HttpResponse::Ok().json(ClientResponse { success: true, client }))
}

/// POST /api/clients/me - Cria ou atualiza o próprio cadastro
#[utoipa::path(
    post,
    path = "/api/clients/me",
    tag = "Clients",
    request_body = ClientProfileUpdate,
    responses(
        (status = 200, description = "Profile saved", body = ClientResponse),
        (status = 400, description = "Token without email")
    ),
    security(("bearer_auth" = []))
)]
pub async fn save_me(
    user: web::ReqData<Claims>,
    state: web::Data<AppState>,
    update: web::Json<ClientProfileUpdate>,
) -> AppResult<HttpResponse> {
    let email = token_email(&user)?;
    let update = update.into_inner();

    let mut client = match state.store.find_client_by_email(&email).await? {
        Some(existing) => existing,
        None => {
            log::info!("👤 New client signup: {}", email);
            Client::new(&email, update.name.as_deref().unwrap_or(""))
        }
    };
    client.apply(update, false);
    state.store.save_client(&client).await?;

    Ok(HttpResponse::Ok().json(ClientResponse { success: true, client }))
}

/// GET /api/services - Catálogo público de serviços
#[utoipa::path(
    get,
    path = "/api/services",
    tag = "Clients",
    responses(
        (status = 200, description = "Active services", body = ServicesResponse)
    )
)]
pub async fn list_services(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let services = state
        .store
        .list_services()
        .await?
        .into_iter()
        .filter(|s| s.active)
        .collect();

    Ok(HttpResponse::Ok().json(ServicesResponse { success: true, services }))
}
