mod api;
mod config;
mod database;
mod middleware;
mod models;
mod seeds;
mod services;
mod state;
#[cfg(test)]
mod test_support;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Configuration (.env + environment)
    let config = match config::AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    log::info!("🚀 Starting Client Portal Service...");
    log::info!("📁 Uploads: {}", config.uploads_dir.display());
    log::info!("🗂️  Data: {}", config.data_dir.display());

    tokio::fs::create_dir_all(&config.uploads_dir).await?;
    tokio::fs::create_dir_all(&config.data_dir).await?;

    // MongoDB quando configurado, senão store em memória
    let store: Arc<dyn database::PortalStore> = match &config.database_url {
        Some(url) => {
            let db = database::MongoDB::new(url).await.map_err(|e| {
                log::error!("❌ Failed to connect to MongoDB: {}", e);
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
            })?;
            log::info!("✅ MongoDB connected successfully");
            Arc::new(db)
        }
        None => {
            log::warn!("⚠️  DATABASE_URL not set, using the in-memory store (data is lost on restart)");
            Arc::new(database::MemoryStore::new())
        }
    };

    // 🌱 Seeds: admins + catálogo de serviços
    seeds::portal_seed::seed_admin_users(store.as_ref(), &config.admin_emails).await;
    seeds::portal_seed::seed_default_services(store.as_ref()).await;

    if config.gemini_api_key.is_none() {
        log::warn!("⚠️  GEMINI_API_KEY not set, AI endpoints will answer with the fallback message");
    }

    let host = config.host.clone();
    let port = config.port;
    let cors_origins = config.cors_origins.clone();
    let state = web::Data::new(state::AppState::new(config, store));

    log::info!("🌐 Server starting on {}:{}", host, port);
    log::info!("📚 Swagger UI available at: http://{}:{}/swagger-ui/", host, port);
    log::info!("📄 OpenAPI spec at: http://{}:{}/api-docs/openapi.json", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
                actix_web::http::header::CACHE_CONTROL,
            ])
            .expose_headers(vec![actix_web::http::header::CONTENT_TYPE])
            .max_age(3600);
        for origin in &cors_origins {
            cors = cors.allowed_origin(origin);
        }

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi)
            )
            .configure(api::configure)
    })
    .bind(format!("{}:{}", host, port))?
    .run()
    .await
}
