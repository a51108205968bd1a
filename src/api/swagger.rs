use utoipa::OpenApi;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Client Portal Service API",
        version = "1.0.0",
        description = "Backend of the firm's website and client portal.\n\n**Authentication:** portal and admin endpoints require a JWT Bearer token from the identity provider. Admin rights come from the users table.\n\n**Features:**\n- Disk uploads with PDF thumbnails\n- Client documents with signed previews\n- Admin console and help-chat relay\n- AI assistant (legal Q&A, chat, translation, image analysis)",
    ),
    paths(
        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,

        // Uploads & files
        crate::api::uploads::upload_to_disk,
        crate::api::uploads::delete_upload,
        crate::api::files::serve_upload,
        crate::api::files::serve_signed,

        // Documents
        crate::api::documents::list_documents,
        crate::api::documents::upload_document,
        crate::api::documents::delete_document,
        crate::api::documents::hide_document,
        crate::api::documents::preview_document,

        // Clients
        crate::api::clients::get_me,
        crate::api::clients::save_me,
        crate::api::clients::list_services,

        // Admin
        crate::api::admin::list_clients,
        crate::api::admin::get_client,
        crate::api::admin::update_client,
        crate::api::admin::browse_table,
        crate::api::admin::get_selected_clients,
        crate::api::admin::set_selected_clients,
        crate::api::admin::append_helpchat_log,
        crate::api::admin::get_helpchat_log,
        crate::api::admin::enqueue_helpchat_reply,
        crate::api::admin::poll_helpchat_outbox,

        // AI
        crate::api::ai::legal,
        crate::api::ai::chat,
        crate::api::ai::translate,
        crate::api::ai::analyze_image,
    ),
    components(
        schemas(
            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,

            crate::api::uploads::UploadResponse,
            crate::api::uploads::DeleteUploadRequest,

            crate::api::documents::DocumentsResponse,
            crate::api::documents::DocumentResponse,
            crate::api::documents::DeleteDocumentResponse,
            crate::services::document_service::DocumentView,
            crate::services::document_service::DeleteMode,
            crate::services::signed_url::SignedUrl,
            crate::models::Document,
            crate::models::DocumentCategory,
            crate::models::DocKind,
            crate::models::UiCategory,
            crate::models::IdentitySubCategory,

            crate::api::clients::ClientResponse,
            crate::api::clients::ServicesResponse,
            crate::models::Client,
            crate::models::ClientStatus,
            crate::models::ClientProfileUpdate,
            crate::models::Service,
            crate::models::PracticeArea,

            crate::api::admin::ClientsResponse,
            crate::api::admin::TableResponse,
            crate::api::admin::SelectedClients,
            crate::api::admin::HelpchatLogResponse,
            crate::api::admin::OutboxResponse,
            crate::services::helpchat_service::HelpchatLogRequest,
            crate::services::helpchat_service::OutboxRequest,
            crate::models::HelpchatLogEntry,
            crate::models::OutboxMessage,
            crate::models::ChatRole,

            crate::api::ai::LegalRequest,
            crate::api::ai::ChatRequest,
            crate::api::ai::TranslateRequest,
            crate::api::ai::AnalyzeImageRequest,
            crate::api::ai::AiResponse,
            crate::services::gemini_service::ChatTurn,
            crate::services::gemini_service::TurnRole,
            crate::services::gemini_service::Source,
        )
    ),
    tags(
        (name = "Health", description = "Health check and Prometheus metrics."),
        (name = "Uploads", description = "Generic disk uploads under the caller's user id."),
        (name = "Files", description = "Stored files and signed document previews."),
        (name = "Documents", description = "Client documents: identity, bank, compliance, expenses. Identity documents keep only the latest per type."),
        (name = "Clients", description = "Client self-service profile and the public services catalogue."),
        (name = "Admin", description = "Admin console. Requires an admin entry in the users table."),
        (name = "Help-chat", description = "Website help-chat log and admin reply outbox."),
        (name = "AI", description = "Generative AI assistant. Failures answer with a fallback message."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Identity provider access token"))
                        .build()
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_portal_routes() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/api/upload-to-disk"));
        assert!(paths.contains_key("/api/clients/{client_id}/documents"));
        assert!(paths.contains_key("/api/admin/selected-clients"));
        assert!(paths.contains_key("/api/ai/analyze-image"));
    }
}
