use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::consult::error::IntakeError;
use crate::llm::media::{detect_mime_type, is_supported_image_mime, normalize_image_mime_type};
use crate::llm::InlineImage;

/// Brow thickness the client prefers; every suggested style follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StylePreference {
    #[default]
    Natural,
    NaturalSlim,
    Slender,
}

impl StylePreference {
    pub const ALL: [StylePreference; 3] = [
        StylePreference::Natural,
        StylePreference::NaturalSlim,
        StylePreference::Slender,
    ];

    /// Label as shown to clients and embedded in prompts.
    pub fn label(self) -> &'static str {
        match self {
            StylePreference::Natural => "Tự Nhiên",
            StylePreference::NaturalSlim => "Tự Nhiên (Nhỏ)",
            StylePreference::Slender => "Mảnh Mai (Nhỏ Nhất)",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            StylePreference::Natural => "standard, harmonious shape",
            StylePreference::NaturalSlim => "slimmer and tidy",
            StylePreference::Slender => "the slimmest, most delicate shape",
        }
    }

    pub fn is_slim(self) -> bool {
        !matches!(self, StylePreference::Natural)
    }
}

impl fmt::Display for StylePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StylePreference {
    type Err = IntakeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let normalized = trimmed.to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "natural" => return Ok(StylePreference::Natural),
            "natural-slim" | "naturalslim" | "slim" => return Ok(StylePreference::NaturalSlim),
            "slender" | "slimmest" => return Ok(StylePreference::Slender),
            _ => {}
        }
        StylePreference::ALL
            .into_iter()
            .find(|preference| preference.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| IntakeError::UnknownStylePreference(trimmed.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct PortraitImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl PortraitImage {
    /// Accepts bytes whose sniffed type is an image Gemini can read.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, IntakeError> {
        if bytes.is_empty() {
            return Err(IntakeError::UnreadableImage("file is empty".to_string()));
        }
        let mime_type = detect_mime_type(&bytes)
            .map(|mime| normalize_image_mime_type(&mime))
            .ok_or_else(|| IntakeError::UnsupportedImage("unrecognized format".to_string()))?;
        if !is_supported_image_mime(&mime_type) {
            return Err(IntakeError::UnsupportedImage(mime_type));
        }
        Ok(PortraitImage { bytes, mime_type })
    }

    pub async fn load(path: &Path) -> Result<Self, IntakeError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| IntakeError::UnreadableImage(format!("{}: {}", path.display(), err)))?;
        Self::from_bytes(bytes)
    }

    pub fn encode(&self) -> InlineImage {
        InlineImage::from_bytes(&self.bytes, &self.mime_type)
    }
}

/// A complete, validated submission. Consumed once by the orchestrator.
#[derive(Debug, Clone)]
pub struct UserIntake {
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub occupation: String,
    pub style_preference: StylePreference,
    pub has_prior_tattoo: bool,
    pub portrait: PortraitImage,
}

/// Raw form fields as collected. `submit` refuses until every field is filled.
#[derive(Debug, Clone, Default)]
pub struct IntakeForm {
    pub name: String,
    pub date_of_birth: String,
    pub occupation: String,
    pub style_preference: StylePreference,
    pub has_prior_tattoo: bool,
    pub portrait: Option<PortraitImage>,
}

fn required(value: &str, field: &'static str) -> Result<String, IntakeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(IntakeError::MissingField(field));
    }
    Ok(trimmed.to_string())
}

impl IntakeForm {
    pub fn submit(self) -> Result<UserIntake, IntakeError> {
        let name = required(&self.name, "name")?;
        let dob_text = required(&self.date_of_birth, "date of birth")?;
        let date_of_birth = NaiveDate::parse_from_str(&dob_text, "%Y-%m-%d")
            .map_err(|_| IntakeError::InvalidDate(dob_text.clone()))?;
        let occupation = required(&self.occupation, "occupation")?;
        let portrait = self.portrait.ok_or(IntakeError::MissingField("portrait image"))?;

        Ok(UserIntake {
            name,
            date_of_birth,
            occupation,
            style_preference: self.style_preference,
            has_prior_tattoo: self.has_prior_tattoo,
            portrait,
        })
    }
}
