use anyhow::anyhow;
use futures::future::join_all;
use tracing::{error, info};

use crate::consult::error::ConsultError;
use crate::consult::image_edit::generate_style_image;
use crate::consult::intake::UserIntake;
use crate::consult::prompts::build_analysis_prompt;
use crate::consult::schema::{analysis_schema, parse_analysis, AnalysisResult};
use crate::llm::ConsultationBackend;

/// Runs one consultation: a structured analysis call, then one image edit per
/// suggested style, all issued together. The returned result keeps the
/// model's style order; a style whose edit failed has no `image_url`.
pub async fn analyze_profile(
    backend: &dyn ConsultationBackend,
    intake: &UserIntake,
    response_language: Option<&str>,
) -> Result<AnalysisResult, ConsultError> {
    if !backend.is_configured() {
        error!("Analysis refused: Gemini API key is not configured");
        return Err(ConsultError::MissingApiKey);
    }

    let portrait = intake.portrait.encode();
    let prompt = build_analysis_prompt(intake, response_language);
    let schema = analysis_schema();

    let text = backend
        .generate_content(&portrait, &prompt, &schema)
        .await
        .map_err(|err| {
            error!("Analysis failed: {:#}", err);
            ConsultError::Service(err)
        })?;
    if text.trim().is_empty() {
        error!("Analysis failed: model returned no text");
        return Err(ConsultError::Service(anyhow!("No response from the model")));
    }

    let mut result = parse_analysis(&text).map_err(|err| {
        error!("Analysis failed: {}", err);
        err
    })?;
    info!(
        "Analysis parsed for {}: {} brow styles, recommended={:?}",
        intake.name,
        result.brow_styles.len(),
        result.recommended_style().map(|style| style.name.as_str())
    );

    let image_jobs = result.brow_styles.iter().map(|style| {
        generate_style_image(
            backend,
            &portrait,
            style,
            intake.style_preference,
            intake.has_prior_tattoo,
        )
    });
    let images = join_all(image_jobs).await;

    for (style, image) in result.brow_styles.iter_mut().zip(images) {
        style.image_url = image.map(|image| image.to_data_url());
    }

    let generated = result
        .brow_styles
        .iter()
        .filter(|style| style.image_url.is_some())
        .count();
    info!(
        "Brow previews generated: {}/{}",
        generated,
        result.brow_styles.len()
    );

    Ok(result)
}
