//! Scripted backend for exercising the consultation flow without the network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::llm::{ConsultationBackend, InlineImage, ResponsePart};

#[derive(Debug, Clone)]
pub enum ImageOutcome {
    Parts(Vec<ResponsePart>),
    Fail(&'static str),
    Slow(Duration, Vec<ResponsePart>),
}

pub fn image_part(data: &str) -> ResponsePart {
    ResponsePart::Image(InlineImage {
        mime_type: "image/png".to_string(),
        data: data.to_string(),
    })
}

pub struct FakeBackend {
    configured: bool,
    text: Result<String, String>,
    images: HashMap<String, ImageOutcome>,
    text_calls: AtomicUsize,
    image_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    text_prompts: Mutex<Vec<String>>,
    image_prompts: Mutex<Vec<String>>,
    completion_order: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        FakeBackend {
            configured: true,
            text: Err("no scripted analysis".to_string()),
            images: HashMap::new(),
            text_calls: AtomicUsize::new(0),
            image_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            text_prompts: Mutex::new(Vec::new()),
            image_prompts: Mutex::new(Vec::new()),
            completion_order: Mutex::new(Vec::new()),
        }
    }

    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    pub fn with_analysis(mut self, text: impl Into<String>) -> Self {
        self.text = Ok(text.into());
        self
    }

    pub fn with_analysis_failure(mut self, message: &str) -> Self {
        self.text = Err(message.to_string());
        self
    }

    pub fn with_image(mut self, style_name: &str, outcome: ImageOutcome) -> Self {
        self.images.insert(style_name.to_string(), outcome);
        self
    }

    pub fn text_calls(&self) -> usize {
        self.text_calls.load(Ordering::SeqCst)
    }

    pub fn image_calls(&self) -> usize {
        self.image_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn text_prompts(&self) -> Vec<String> {
        self.text_prompts.lock().unwrap().clone()
    }

    pub fn image_prompts(&self) -> Vec<String> {
        self.image_prompts.lock().unwrap().clone()
    }

    pub fn completion_order(&self) -> Vec<String> {
        self.completion_order.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConsultationBackend for FakeBackend {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn generate_content(
        &self,
        _image: &InlineImage,
        prompt: &str,
        _response_schema: &Value,
    ) -> Result<String> {
        self.text_calls.fetch_add(1, Ordering::SeqCst);
        self.text_prompts.lock().unwrap().push(prompt.to_string());
        self.text.clone().map_err(|message| anyhow!(message))
    }

    async fn edit_image(
        &self,
        _image: &InlineImage,
        prompt: &str,
        style_name: &str,
    ) -> Result<Vec<ResponsePart>> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        self.image_prompts.lock().unwrap().push(prompt.to_string());
        let style = style_name.to_string();

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let outcome = match self.images.get(&style).cloned() {
            Some(ImageOutcome::Parts(parts)) => Ok(parts),
            Some(ImageOutcome::Fail(message)) => Err(anyhow!(message)),
            Some(ImageOutcome::Slow(delay, parts)) => {
                tokio::time::sleep(delay).await;
                Ok(parts)
            }
            None => Err(anyhow!("no scripted image for style {style}")),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completion_order.lock().unwrap().push(style);
        outcome
    }
}
