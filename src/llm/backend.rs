//! Outbound contract with the hosted multimodal model.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::llm::media::InlineImage;

/// One part of a model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePart {
    Text(String),
    Image(InlineImage),
}

#[async_trait]
pub trait ConsultationBackend: Send + Sync {
    /// Whether a service credential is available.
    fn is_configured(&self) -> bool;

    /// Image + instructions in, JSON text conforming to `response_schema` out.
    async fn generate_content(
        &self,
        image: &InlineImage,
        prompt: &str,
        response_schema: &Value,
    ) -> Result<String>;

    /// Image + edit instructions in, every part of the first candidate out.
    /// `style_name` labels the call in timing logs only.
    async fn edit_image(
        &self,
        image: &InlineImage,
        prompt: &str,
        style_name: &str,
    ) -> Result<Vec<ResponsePart>>;
}
