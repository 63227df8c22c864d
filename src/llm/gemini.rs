use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::de::IgnoredAny;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::llm::backend::{ConsultationBackend, ResponsePart};
use crate::llm::media::InlineImage;
use crate::utils::http::get_http_client;
use crate::utils::timing::log_llm_timing;

const IMAGE_EDIT_SYSTEM_INSTRUCTION: &str =
    "Edit the image based on the prompt. CRITICAL: respond with an image, NOT TEXT.";

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub base_url: String,
    pub text_model: String,
    pub image_model: String,
    pub temperature: f32,
    pub top_k: i32,
    pub top_p: f32,
    pub safety_profile: String,
    pub timeout: Duration,
}

impl GeminiSettings {
    pub fn from_config(config: &Config) -> Self {
        GeminiSettings {
            api_key: config.gemini_api_key.clone(),
            base_url: config.gemini_base_url.clone(),
            text_model: config.gemini_model.clone(),
            image_model: config.gemini_image_model.clone(),
            temperature: config.gemini_temperature,
            top_k: config.gemini_top_k,
            top_p: config.gemini_top_p,
            safety_profile: config.gemini_safety_settings.clone(),
            timeout: Duration::from_secs(config.gemini_timeout_seconds),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
    Other(IgnoredAny),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    data: String,
}

pub struct GeminiClient {
    settings: GeminiSettings,
}

impl GeminiClient {
    pub fn new(settings: GeminiSettings) -> Self {
        GeminiClient { settings }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(GeminiSettings::from_config(config))
    }

    fn redact_api_key(&self, text: &str) -> String {
        let key = self.settings.api_key.trim();
        if key.is_empty() {
            return text.to_string();
        }
        text.replace(key, "[redacted]")
    }

    fn build_safety_settings(&self) -> Vec<Value> {
        let threshold = match self.settings.safety_profile.as_str() {
            "standard" => "BLOCK_MEDIUM_AND_ABOVE",
            "permissive" => "OFF",
            other => {
                warn!(
                    "Unknown GEMINI_SAFETY_SETTINGS value '{}', using permissive defaults.",
                    other
                );
                "OFF"
            }
        };

        vec![
            json!({ "category": "HARM_CATEGORY_HARASSMENT", "threshold": threshold }),
            json!({ "category": "HARM_CATEGORY_HATE_SPEECH", "threshold": threshold }),
            json!({ "category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": threshold }),
            json!({ "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": threshold }),
        ]
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            model
        )
    }

    /// Sends one request. A failed attempt is reported, never repeated.
    async fn call_gemini_api(&self, model: &str, payload: Value) -> Result<GeminiResponse> {
        let client = get_http_client();
        let url = self.endpoint(model);

        if tracing::enabled!(tracing::Level::DEBUG) {
            let payload_summary = summarize_gemini_payload(&payload);
            debug!(target: "llm.gemini", model = model, payload = %payload_summary);
        }

        let response = match client
            .post(&url)
            .header("x-goog-api-key", &self.settings.api_key)
            .timeout(self.settings.timeout)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                let err_text = self.redact_api_key(&err.to_string());
                warn!(
                    "Gemini request failed to send: {} (timeout={}, connect={}, status={:?})",
                    err_text,
                    err.is_timeout(),
                    err.is_connect(),
                    err.status()
                );
                return Err(anyhow!("Gemini request failed: {}", err_text));
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let (message, body_summary) = summarize_error_body(&body);
            warn!("Gemini API error: status={}, body={}", status, body_summary);
            let detail = self.redact_api_key(&message.unwrap_or(body_summary));
            return Err(anyhow!(
                "Gemini request failed with status {}: {}",
                status,
                detail
            ));
        }

        let value = response
            .json::<GeminiResponse>()
            .await
            .map_err(|err| anyhow!("Gemini returned an unreadable response: {}", err))?;
        if tracing::enabled!(tracing::Level::DEBUG) {
            let response_summary = summarize_gemini_response(&value);
            debug!(target: "llm.gemini", model = model, response = %response_summary);
        }
        Ok(value)
    }
}

#[async_trait]
impl ConsultationBackend for GeminiClient {
    fn is_configured(&self) -> bool {
        !self.settings.api_key.trim().is_empty()
    }

    async fn generate_content(
        &self,
        image: &InlineImage,
        prompt: &str,
        response_schema: &Value,
    ) -> Result<String> {
        let payload = json!({
            "contents": [{ "role": "user", "parts": build_gemini_parts(image, prompt) }],
            "generationConfig": {
                "temperature": self.settings.temperature,
                "topK": self.settings.top_k,
                "topP": self.settings.top_p,
                "responseMimeType": "application/json",
                "responseSchema": response_schema,
            },
            "safetySettings": self.build_safety_settings(),
        });

        let model = self.settings.text_model.as_str();
        let metadata = request_metadata(image, prompt, None);
        log_llm_timing("gemini", model, "analyze_profile", Some(metadata), || async {
            let response = self.call_gemini_api(model, payload).await?;
            Ok(extract_text_from_response(response))
        })
        .await
    }

    async fn edit_image(
        &self,
        image: &InlineImage,
        prompt: &str,
        style_name: &str,
    ) -> Result<Vec<ResponsePart>> {
        let payload = json!({
            "systemInstruction": { "parts": [{ "text": IMAGE_EDIT_SYSTEM_INSTRUCTION }] },
            "contents": [{ "role": "user", "parts": build_gemini_parts(image, prompt) }],
            "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] },
            "safetySettings": self.build_safety_settings(),
        });

        let model = self.settings.image_model.as_str();
        let metadata = request_metadata(image, prompt, Some(style_name));
        log_llm_timing("gemini", model, "edit_brow_image", Some(metadata), || async {
            let response = self.call_gemini_api(model, payload).await?;
            Ok(extract_parts_from_response(response))
        })
        .await
    }
}

fn request_metadata(image: &InlineImage, prompt: &str, style_name: Option<&str>) -> Value {
    let mut metadata = json!({
        "imageMime": image.mime_type,
        "imageChars": image.data.len(),
        "promptChars": prompt.chars().count(),
    });
    if let Some(style_name) = style_name {
        metadata["style"] = json!(style_name);
    }
    metadata
}

fn build_gemini_parts(image: &InlineImage, prompt: &str) -> Vec<Value> {
    vec![
        json!({
            "inlineData": {
                "mimeType": image.mime_type,
                "data": image.data,
            }
        }),
        json!({ "text": prompt }),
    ]
}

fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

fn summarize_gemini_parts(parts: &[Value]) -> Vec<Value> {
    parts
        .iter()
        .map(|part| {
            if let Some(text) = part.get("text").and_then(|value| value.as_str()) {
                json!({ "text": truncate_for_log(text, 200) })
            } else if let Some(inline_data) = part.get("inlineData") {
                let mime_type = inline_data
                    .get("mimeType")
                    .and_then(|value| value.as_str())
                    .unwrap_or("unknown");
                let data_len = inline_data
                    .get("data")
                    .and_then(|value| value.as_str())
                    .map(|value| value.len())
                    .unwrap_or(0);
                json!({ "inlineData": { "mimeType": mime_type, "dataLen": data_len } })
            } else {
                json!({ "unknownPart": true })
            }
        })
        .collect()
}

fn summarize_gemini_payload(payload: &Value) -> Value {
    let mut summary = Map::new();

    if payload.pointer("/systemInstruction").is_some() {
        summary.insert(
            "systemInstruction".to_string(),
            Value::String("image_edit_system_instruction".to_string()),
        );
    }

    if let Some(contents) = payload.get("contents").and_then(|value| value.as_array()) {
        let summarized_contents: Vec<Value> = contents
            .iter()
            .map(|content| {
                let role = content
                    .get("role")
                    .and_then(|value| value.as_str())
                    .unwrap_or("user");
                let parts = content
                    .get("parts")
                    .and_then(|value| value.as_array())
                    .map(|parts| summarize_gemini_parts(parts))
                    .unwrap_or_default();
                json!({ "role": role, "parts": parts })
            })
            .collect();
        summary.insert("contents".to_string(), Value::Array(summarized_contents));
    }

    if let Some(config) = payload.get("generationConfig") {
        let mut config = config.clone();
        // The schema is large and static; log only that one was sent.
        if let Some(object) = config.as_object_mut() {
            if object.remove("responseSchema").is_some() {
                object.insert("responseSchema".to_string(), json!("<analysis schema>"));
            }
        }
        summary.insert("generationConfig".to_string(), config);
    }

    Value::Object(summary)
}

fn summarize_gemini_response(response: &GeminiResponse) -> Value {
    let mut text_parts = 0usize;
    let mut image_parts = 0usize;
    let mut text_preview = None;
    let mut finish_reason = None;

    let candidates = response.candidates.as_deref().unwrap_or(&[]);
    for candidate in candidates {
        if finish_reason.is_none() {
            finish_reason = candidate.finish_reason.clone();
        }
        let parts = candidate
            .content
            .as_ref()
            .and_then(|content| content.parts.as_deref())
            .unwrap_or(&[]);
        for part in parts {
            match part {
                GeminiPart::Text { text } => {
                    text_parts += 1;
                    if text_preview.is_none() && !text.trim().is_empty() {
                        text_preview = Some(truncate_for_log(text, 200));
                    }
                }
                GeminiPart::InlineData { inline_data } => {
                    if inline_data.mime_type.starts_with("image/") {
                        image_parts += 1;
                    }
                }
                GeminiPart::Other(_) => {}
            }
        }
    }

    json!({
        "candidates": candidates.len(),
        "finishReason": finish_reason,
        "textParts": text_parts,
        "imageParts": image_parts,
        "textPreview": text_preview
    })
}

fn summarize_error_body(body: &str) -> (Option<String>, String) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return (None, "empty response body".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let message = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
            .or_else(|| {
                value
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(|v| v.to_string())
            });
        return (message, truncate_for_log(&value.to_string(), 2000));
    }

    (None, truncate_for_log(trimmed, 2000))
}

fn first_candidate_parts(response: GeminiResponse) -> Vec<GeminiPart> {
    response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts)
        .unwrap_or_default()
}

fn extract_text_from_response(response: GeminiResponse) -> String {
    first_candidate_parts(response)
        .into_iter()
        .filter_map(|part| match part {
            GeminiPart::Text { text } => Some(text),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("")
}

fn extract_parts_from_response(response: GeminiResponse) -> Vec<ResponsePart> {
    first_candidate_parts(response)
        .into_iter()
        .filter_map(|part| match part {
            GeminiPart::Text { text } => Some(ResponsePart::Text(text)),
            GeminiPart::InlineData { inline_data } => Some(ResponsePart::Image(InlineImage {
                mime_type: inline_data.mime_type,
                data: inline_data.data,
            })),
            GeminiPart::Other(_) => None,
        })
        .collect()
}
