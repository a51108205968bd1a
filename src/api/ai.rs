use crate::api::metrics;
use crate::services::gemini_service::{AiAnswer, ChatTurn, Source, FALLBACK_MESSAGE};
use crate::state::AppState;
use crate::utils::error::{AppError, AppResult};
use actix_web::{web, HttpResponse};
use base64::Engine;
use serde::{Deserialize, Serialize};

const MAX_QUESTION_CHARS: usize = 4_000;
const MAX_TRANSLATION_CHARS: usize = 20_000;
const DEFAULT_LANGUAGE: &str = "English";

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LegalRequest {
    pub question: String,
    pub language: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    pub text: String,
    #[serde(alias = "source")]
    pub source_language: Option<String>,
    #[serde(alias = "target")]
    pub target_language: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeImageRequest {
    /// Base64 payload, optionally as a `data:` URL
    #[serde(alias = "image")]
    pub image_base64: String,
    pub mime_type: Option<String>,
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AiResponse {
    pub success: bool,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
}

fn required_text(value: &str, field: &str, max_chars: usize) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::InvalidRequest(format!("{} is required", field)));
    }
    if value.chars().count() > max_chars {
        return Err(AppError::InvalidRequest(format!(
            "{} is longer than {} characters",
            field, max_chars
        )));
    }
    Ok(value.to_string())
}

/// Success, or the fallback text with `success: false`. Never an error status.
fn respond(feature: &str, result: AppResult<AiAnswer>) -> HttpResponse {
    match result {
        Ok(answer) => HttpResponse::Ok().json(AiResponse {
            success: true,
            text: answer.text,
            sources: answer.sources,
        }),
        Err(e) => {
            log::error!("❌ AI {} failed: {}", feature, e);
            metrics::increment_ai_failure_count();
            HttpResponse::Ok().json(AiResponse {
                success: false,
                text: FALLBACK_MESSAGE.to_string(),
                sources: vec![],
            })
        }
    }
}

/// Splits an optional `data:<mime>;base64,` prefix and decodes the image.
fn decode_image(request: &AnalyzeImageRequest, max_bytes: usize) -> AppResult<(Vec<u8>, String)> {
    let raw = request.image_base64.trim();
    let (data_url_mime, payload) = match raw.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest
                .split_once(',')
                .ok_or_else(|| AppError::InvalidRequest("Malformed data URL".to_string()))?;
            let mime = header.trim_end_matches(";base64").to_string();
            (Some(mime), payload)
        }
        None => (None, raw),
    };

    let mime_type = request
        .mime_type
        .clone()
        .or(data_url_mime)
        .unwrap_or_else(|| "image/jpeg".to_string())
        .to_lowercase();
    if !mime_type.starts_with("image/") {
        return Err(AppError::InvalidRequest(format!("Unsupported image type: {}", mime_type)));
    }

    if payload.is_empty() {
        return Err(AppError::InvalidRequest("image is required".to_string()));
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|_| AppError::InvalidRequest("image is not valid base64".to_string()))?;
    if bytes.len() > max_bytes {
        return Err(AppError::PayloadTooLarge(format!("Image exceeds the {} byte limit", max_bytes)));
    }

    Ok((bytes, mime_type))
}

/// POST /api/ai/legal - Pergunta jurídica com busca na web
#[utoipa::path(
    post,
    path = "/api/ai/legal",
    tag = "AI",
    request_body = LegalRequest,
    responses(
        (status = 200, description = "Answer, or fallback text with success=false", body = AiResponse),
        (status = 400, description = "Empty question")
    )
)]
pub async fn legal(state: web::Data<AppState>, body: web::Json<LegalRequest>) -> AppResult<HttpResponse> {
    let question = required_text(&body.question, "question", MAX_QUESTION_CHARS)?;
    let language = body
        .language
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(DEFAULT_LANGUAGE);

    log::info!("⚖️  POST /ai/legal ({} chars, {})", question.chars().count(), language);
    Ok(respond("legal", state.ai.legal_answer(&question, language).await))
}

/// POST /api/ai/chat
#[utoipa::path(
    post,
    path = "/api/ai/chat",
    tag = "AI",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Reply, or fallback text with success=false", body = AiResponse),
        (status = 400, description = "Empty message")
    )
)]
pub async fn chat(state: web::Data<AppState>, body: web::Json<ChatRequest>) -> AppResult<HttpResponse> {
    let message = required_text(&body.message, "message", MAX_QUESTION_CHARS)?;
    Ok(respond("chat", state.ai.chat(&body.history, &message).await))
}

/// POST /api/ai/translate
#[utoipa::path(
    post,
    path = "/api/ai/translate",
    tag = "AI",
    request_body = TranslateRequest,
    responses(
        (status = 200, description = "Translation, or fallback text with success=false", body = AiResponse),
        (status = 400, description = "Empty text or target language")
    )
)]
pub async fn translate(state: web::Data<AppState>, body: web::Json<TranslateRequest>) -> AppResult<HttpResponse> {
    let text = required_text(&body.text, "text", MAX_TRANSLATION_CHARS)?;
    let target = required_text(&body.target_language, "targetLanguage", 64)?;

    log::info!("🌐 POST /ai/translate ({} chars → {})", text.chars().count(), target);
    Ok(respond(
        "translate",
        state
            .ai
            .translate(&text, body.source_language.as_deref(), &target)
            .await,
    ))
}

/// POST /api/ai/analyze-image
#[utoipa::path(
    post,
    path = "/api/ai/analyze-image",
    tag = "AI",
    request_body = AnalyzeImageRequest,
    responses(
        (status = 200, description = "Analysis, or fallback text with success=false", body = AiResponse),
        (status = 400, description = "Bad base64 or non-image type")
    )
)]
pub async fn analyze_image(
    state: web::Data<AppState>,
    body: web::Json<AnalyzeImageRequest>,
) -> AppResult<HttpResponse> {
    let (bytes, mime_type) = decode_image(&body, state.config.max_upload_bytes)?;

    log::info!("🖼️  POST /ai/analyze-image ({} bytes, {})", bytes.len(), mime_type);
    Ok(respond(
        "analyze-image",
        state
            .ai
            .analyze_image(&bytes, &mime_type, body.prompt.as_deref())
            .await,
    ))
}
