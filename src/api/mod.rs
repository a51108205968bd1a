pub mod admin;
pub mod ai;
pub mod clients;
pub mod documents;
pub mod files;
pub mod health;
pub mod metrics;
pub mod multipart;
pub mod swagger;
pub mod uploads;

use crate::middleware::auth::AuthMiddleware;
use actix_web::{guard, web};

/// JSON bodies on the AI routes carry base64 images
const AI_JSON_LIMIT: usize = 32 * 1024 * 1024;

/// Registers every route. Shared by `main` and the handler tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        // Health check
        .route("/health", web::get().to(health::health_check))
        // Metrics
        .route("/metrics", web::get().to(metrics::get_metrics))

        // ==================== FILES ====================
        .route("/uploads/{path:.*}", web::get().to(files::serve_upload))
        .route("/files/signed/{path:.*}", web::get().to(files::serve_signed))

        // ==================== PUBLIC ====================
        .route("/api/services", web::get().to(clients::list_services))

        // Help-chat widget: log append e polling do outbox sem login
        .service(
            web::resource("/api/admin/helpchat-log")
                .guard(guard::Post())
                .to(admin::append_helpchat_log),
        )
        .service(
            web::resource("/api/admin/helpchat-outbox")
                .guard(guard::Get())
                .to(admin::poll_helpchat_outbox),
        )

        // AI assistant
        .service(
            web::scope("/api/ai")
                .app_data(web::JsonConfig::default().limit(AI_JSON_LIMIT))
                .route("/legal", web::post().to(ai::legal))
                .route("/chat", web::post().to(ai::chat))
                .route("/translate", web::post().to(ai::translate))
                .route("/analyze-image", web::post().to(ai::analyze_image)),
        )

        // ==================== ADMIN (JWT + users table) ====================
        .service(
            web::scope("/api/admin")
                .wrap(AuthMiddleware)
                .route("/clients", web::get().to(admin::list_clients))
                .route("/clients/{id}", web::get().to(admin::get_client))
                .route("/clients/{id}", web::put().to(admin::update_client))
                .route("/tables/{table}", web::get().to(admin::browse_table))
                .route("/selected-clients", web::get().to(admin::get_selected_clients))
                .route("/selected-clients", web::post().to(admin::set_selected_clients))
                .route("/helpchat-log", web::get().to(admin::get_helpchat_log))
                .route("/helpchat-outbox", web::post().to(admin::enqueue_helpchat_reply)),
        )

        // ==================== CLIENT PORTAL (JWT) ====================
        .service(
            web::scope("/api/clients")
                .wrap(AuthMiddleware)
                .route("/me", web::get().to(clients::get_me))
                .route("/me", web::post().to(clients::save_me))
                .route("/{client_id}/documents", web::get().to(documents::list_documents))
                .route("/{client_id}/documents", web::post().to(documents::upload_document))
                .route(
                    "/{client_id}/documents/{document_id}",
                    web::delete().to(documents::delete_document),
                )
                .route(
                    "/{client_id}/documents/{document_id}/hide",
                    web::post().to(documents::hide_document),
                )
                .route(
                    "/{client_id}/documents/{document_id}/preview",
                    web::get().to(documents::preview_document),
                ),
        )

        // ==================== DISK UPLOADS (JWT) ====================
        .service(
            web::resource("/api/upload-to-disk")
                .wrap(AuthMiddleware)
                .route(web::post().to(uploads::upload_to_disk)),
        )
        .service(
            web::resource("/api/delete-upload")
                .wrap(AuthMiddleware)
                .route(web::delete().to(uploads::delete_upload)),
        );
}
