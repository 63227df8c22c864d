//! Typed analysis result and the output-shape constraint handed to the model.
//!
//! Required fields carry no serde defaults, so a response missing any of
//! them fails to decode. Count invariants that JSON typing cannot express
//! are checked once in [`AnalysisResult::validate`].

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::consult::error::ConsultError;

pub const BROW_STYLE_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceAnalysis {
    pub golden_ratio: String,
    pub features: String,
    pub aura: String,
    pub eyes: String,
    pub dominant_energy: String,
    pub current_brow_problems: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowStyle {
    pub name: String,
    pub reason: String,
    /// Physical shape description; doubles as the image-edit instruction.
    pub effect_on_face: String,
    pub impression: String,
    pub job_suitability: String,
    pub is_recommended: bool,
    /// Data URL of the edited portrait. Absent until generation succeeds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSuggestion {
    pub color: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeforeAfter {
    pub softness_increase: String,
    pub brightness_increase: String,
    pub years_younger: String,
    pub first_impression: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Numerology {
    pub main_number: String,
    pub soul_mission: String,
    pub life_phase: String,
    pub yearly_lesson: String,
    pub career_energy: String,
    pub connection_to_brow: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeAdvice {
    pub current_phase: String,
    pub focus_this_year: String,
    pub posture_to_build: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftClosing {
    pub suggestions: Vec<String>,
    pub final_note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub face_analysis: FaceAnalysis,
    pub brow_styles: Vec<BrowStyle>,
    pub color_suggestion: ColorSuggestion,
    pub before_after: BeforeAfter,
    pub numerology: Numerology,
    pub life_advice: LifeAdvice,
    pub soft_closing: SoftClosing,
}

impl AnalysisResult {
    pub fn validate(&self) -> Result<(), ConsultError> {
        if self.brow_styles.len() != BROW_STYLE_COUNT {
            return Err(ConsultError::Validation(format!(
                "expected {} brow styles, got {}",
                BROW_STYLE_COUNT,
                self.brow_styles.len()
            )));
        }
        let recommended = self
            .brow_styles
            .iter()
            .filter(|style| style.is_recommended)
            .count();
        if recommended != 1 {
            return Err(ConsultError::Validation(format!(
                "expected exactly one recommended brow style, got {}",
                recommended
            )));
        }
        Ok(())
    }

    pub fn recommended_style(&self) -> Option<&BrowStyle> {
        self.brow_styles.iter().find(|style| style.is_recommended)
    }
}

fn string_fields(names: &[&str]) -> Value {
    let properties: serde_json::Map<String, Value> = names
        .iter()
        .map(|name| (name.to_string(), json!({ "type": "STRING" })))
        .collect();
    Value::Object(properties)
}

fn object_of_strings(names: &[&str]) -> Value {
    json!({
        "type": "OBJECT",
        "properties": string_fields(names),
        "required": names,
    })
}

/// Gemini `responseSchema` for [`AnalysisResult`].
pub fn analysis_schema() -> Value {
    let mut face_analysis = object_of_strings(&[
        "goldenRatio",
        "features",
        "aura",
        "eyes",
        "dominantEnergy",
        "currentBrowProblems",
    ]);
    face_analysis["properties"]["currentBrowProblems"]["description"] = json!(
        "In-depth critique of the current brows and what the client loses by leaving them as they are."
    );

    json!({
        "type": "OBJECT",
        "properties": {
            "faceAnalysis": face_analysis,
            "browStyles": {
                "type": "ARRAY",
                "minItems": BROW_STYLE_COUNT,
                "maxItems": BROW_STYLE_COUNT,
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "reason": { "type": "STRING" },
                        "effectOnFace": {
                            "type": "STRING",
                            "description": "Detailed physical description of the brow shape for the image generator."
                        },
                        "impression": { "type": "STRING" },
                        "jobSuitability": { "type": "STRING" },
                        "isRecommended": {
                            "type": "BOOLEAN",
                            "description": "Set to true for the single best suited style out of the 3."
                        }
                    },
                    "required": ["name", "reason", "effectOnFace", "impression", "jobSuitability", "isRecommended"]
                }
            },
            "colorSuggestion": object_of_strings(&["color", "reason"]),
            "beforeAfter": object_of_strings(&[
                "softnessIncrease",
                "brightnessIncrease",
                "yearsYounger",
                "firstImpression",
            ]),
            "numerology": object_of_strings(&[
                "mainNumber",
                "soulMission",
                "lifePhase",
                "yearlyLesson",
                "careerEnergy",
                "connectionToBrow",
            ]),
            "lifeAdvice": object_of_strings(&["currentPhase", "focusThisYear", "postureToBuild"]),
            "softClosing": {
                "type": "OBJECT",
                "properties": {
                    "suggestions": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "finalNote": { "type": "STRING" }
                },
                "required": ["suggestions", "finalNote"]
            }
        },
        "required": [
            "faceAnalysis",
            "browStyles",
            "colorSuggestion",
            "beforeAfter",
            "numerology",
            "lifeAdvice",
            "softClosing"
        ]
    })
}

fn strip_json_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    match rest.trim_end().strip_suffix("```") {
        Some(body) => body.trim(),
        None => trimmed,
    }
}

/// Decodes model output and enforces the count invariants.
pub fn parse_analysis(text: &str) -> Result<AnalysisResult, ConsultError> {
    let result: AnalysisResult = serde_json::from_str(strip_json_fence(text))
        .map_err(|err| ConsultError::Validation(err.to_string()))?;
    result.validate()?;
    Ok(result)
}
