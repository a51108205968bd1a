// ==================== GENERATIVE AI ====================
// Cliente do Gemini (generateContent). Sem retries e sem streaming:
// quem chama troca qualquer erro por uma mensagem amigável.

use crate::config::AppConfig;
use crate::services::prompts;
use crate::utils::error::{AppError, AppResult};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_HISTORY_TURNS: usize = 20;

pub const FALLBACK_MESSAGE: &str =
    "Sorry, our assistant is unavailable right now. Please try again later or contact our office.";

// ==================== WIRE MODELS ====================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    #[serde(rename_all = "camelCase")]
    InlineData { inline_data: Blob },
    Text { text: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part::Text { text: text.to_string() }],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Tool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    uri: Option<String>,
    title: Option<String>,
}

// ==================== PUBLIC TYPES ====================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, utoipa::ToSchema)]
pub struct Source {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct AiAnswer {
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub text: String,
}

fn extract_answer(response: GenerateContentResponse) -> AppResult<AiAnswer> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| AppError::UpstreamError("Model returned no candidates".to_string()))?;

    let text = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| match part {
                    Part::Text { text } => Some(text),
                    Part::InlineData { .. } => None,
                })
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AppError::UpstreamError("Model returned an empty answer".to_string()));
    }

    let mut sources: Vec<Source> = Vec::new();
    if let Some(metadata) = candidate.grounding_metadata {
        for web in metadata.grounding_chunks.into_iter().filter_map(|c| c.web) {
            if let Some(uri) = web.uri {
                if !sources.iter().any(|s| s.uri == uri) {
                    sources.push(Source { uri, title: web.title });
                }
            }
        }
    }

    Ok(AiAnswer {
        text: text.trim().to_string(),
        sources,
    })
}

/// Thin client for the Gemini `generateContent` endpoint
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    api_base: String,
    model: String,
    vision_model: String,
}

impl GeminiClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .user_agent(concat!("client-portal-service/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_default(),
            api_key: config.gemini_api_key.clone(),
            api_base: config.gemini_api_base.clone(),
            model: config.gemini_model.clone(),
            vision_model: config.gemini_vision_model.clone(),
        }
    }

    async fn generate(&self, model: &str, request: GenerateContentRequest) -> AppResult<AiAnswer> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| AppError::ConfigError("GEMINI_API_KEY not set".to_string()))?;

        let url = format!("{}/models/{}:generateContent", self.api_base, model);
        log::info!("🤖 Calling {} ({} content blocks)", model, request.contents.len());
        crate::api::metrics::increment_ai_call_count();

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::UpstreamError(format!("Failed to reach model API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamError(format!(
                "Model API error {}: {}",
                status,
                body.chars().take(300).collect::<String>()
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::UpstreamError(format!("Failed to parse model response: {}", e)))?;

        extract_answer(parsed)
    }

    /// Legal Q&A grounded with web search
    pub async fn legal_answer(&self, question: &str, language: &str) -> AppResult<AiAnswer> {
        let request = GenerateContentRequest {
            system_instruction: Content::text(None, &prompts::legal_system_instruction(language)),
            contents: vec![Content::text(Some("user"), question)],
            tools: vec![Tool { google_search: serde_json::json!({}) }],
        };
        self.generate(&self.model, request).await
    }

    pub async fn chat(&self, history: &[ChatTurn], message: &str) -> AppResult<AiAnswer> {
        let skip = history.len().saturating_sub(MAX_HISTORY_TURNS);
        let mut contents: Vec<Content> = history
            .iter()
            .skip(skip)
            .filter(|turn| !turn.text.trim().is_empty())
            .map(|turn| {
                let role = match turn.role {
                    TurnRole::User => "user",
                    TurnRole::Model => "model",
                };
                Content::text(Some(role), &turn.text)
            })
            .collect();
        contents.push(Content::text(Some("user"), message));

        let request = GenerateContentRequest {
            system_instruction: Content::text(None, prompts::chat_system_instruction()),
            contents,
            tools: vec![],
        };
        self.generate(&self.model, request).await
    }

    pub async fn translate(&self, text: &str, source: Option<&str>, target: &str) -> AppResult<AiAnswer> {
        let request = GenerateContentRequest {
            system_instruction: Content::text(
                None,
                &prompts::translation_system_instruction(source, target),
            ),
            contents: vec![Content::text(Some("user"), text)],
            tools: vec![],
        };
        self.generate(&self.model, request).await
    }

    pub async fn analyze_image(&self, image: &[u8], mime_type: &str, prompt: Option<&str>) -> AppResult<AiAnswer> {
        let prompt = prompt
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(prompts::DEFAULT_IMAGE_PROMPT);

        let request = GenerateContentRequest {
            system_instruction: Content::text(None, prompts::image_system_instruction()),
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::InlineData {
                        inline_data: Blob {
                            mime_type: mime_type.to_string(),
                            data: base64::engine::general_purpose::STANDARD.encode(image),
                        },
                    },
                    Part::Text { text: prompt.to_string() },
                ],
            }],
            tools: vec![],
        };
        self.generate(&self.vision_model, request).await
    }
}
