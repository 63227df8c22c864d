use tracing::{info, warn};

use crate::consult::intake::StylePreference;
use crate::consult::prompts::build_image_edit_prompt;
use crate::consult::schema::BrowStyle;
use crate::llm::{ConsultationBackend, InlineImage, ResponsePart};

/// First part carrying image bytes, if any.
fn first_image_part(parts: Vec<ResponsePart>) -> Option<InlineImage> {
    parts.into_iter().find_map(|part| match part {
        ResponsePart::Image(image) if !image.data.trim().is_empty() => Some(image),
        _ => None,
    })
}

/// Renders one style onto the portrait. Failures are logged and collapse to
/// `None`; nothing is propagated to the caller.
pub async fn generate_style_image(
    backend: &dyn ConsultationBackend,
    portrait: &InlineImage,
    style: &BrowStyle,
    preference: StylePreference,
    has_prior_tattoo: bool,
) -> Option<InlineImage> {
    let prompt =
        build_image_edit_prompt(&style.name, &style.effect_on_face, preference, has_prior_tattoo);

    let parts = match backend.edit_image(portrait, &prompt, &style.name).await {
        Ok(parts) => parts,
        Err(err) => {
            warn!("Failed to generate image for style {}: {:#}", style.name, err);
            return None;
        }
    };

    let part_count = parts.len();
    match first_image_part(parts) {
        Some(mut image) => {
            if image.mime_type.trim().is_empty() {
                image.mime_type = "image/png".to_string();
            }
            info!(
                "Generated image for style {} ({}, {} base64 chars)",
                style.name,
                image.mime_type,
                image.data.len()
            );
            Some(image)
        }
        None => {
            warn!(
                "Failed to generate image for style {}: response had {} part(s) and no image data",
                style.name, part_count
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consult::test_support::{image_part, FakeBackend, ImageOutcome};

    fn style(name: &str) -> BrowStyle {
        BrowStyle {
            name: name.to_string(),
            reason: "r".to_string(),
            effect_on_face: "Slim straight brow".to_string(),
            impression: "i".to_string(),
            job_suitability: "j".to_string(),
            is_recommended: false,
            image_url: None,
        }
    }

    fn portrait() -> InlineImage {
        InlineImage::from_bytes(b"portrait", "image/jpeg")
    }

    #[tokio::test]
    async fn returns_first_part_with_image_data() {
        let backend = FakeBackend::new().with_image(
            "Soft",
            ImageOutcome::Parts(vec![
                ResponsePart::Text("Here you go".to_string()),
                ResponsePart::Image(InlineImage {
                    mime_type: "image/png".to_string(),
                    data: String::new(),
                }),
                image_part("UDE="),
                image_part("UDI="),
            ]),
        );
        let image = generate_style_image(
            &backend,
            &portrait(),
            &style("Soft"),
            StylePreference::Natural,
            false,
        )
        .await
        .unwrap();
        assert_eq!(image.data, "UDE=");
        assert_eq!(backend.image_calls(), 1);
    }

    #[tokio::test]
    async fn text_only_response_is_absent() {
        let backend = FakeBackend::new().with_image(
            "Soft",
            ImageOutcome::Parts(vec![ResponsePart::Text("I can't edit faces".to_string())]),
        );
        let image = generate_style_image(
            &backend,
            &portrait(),
            &style("Soft"),
            StylePreference::Natural,
            false,
        )
        .await;
        assert!(image.is_none());
    }

    #[tokio::test]
    async fn backend_error_is_absorbed() {
        let backend = FakeBackend::new().with_image("Soft", ImageOutcome::Fail("quota exceeded"));
        let image = generate_style_image(
            &backend,
            &portrait(),
            &style("Soft"),
            StylePreference::Slender,
            true,
        )
        .await;
        assert!(image.is_none());
        assert_eq!(backend.image_calls(), 1);
    }

    #[tokio::test]
    async fn prompt_sent_matches_builder_output() {
        let backend = FakeBackend::new().with_image("Western", ImageOutcome::Parts(vec![image_part("UDE=")]));
        generate_style_image(
            &backend,
            &portrait(),
            &style("Western"),
            StylePreference::Natural,
            true,
        )
        .await;
        let expected =
            build_image_edit_prompt("Western", "Slim straight brow", StylePreference::Natural, true);
        assert_eq!(backend.image_prompts(), vec![expected]);
    }

    #[tokio::test]
    async fn missing_mime_type_defaults_to_png() {
        let backend = FakeBackend::new().with_image(
            "Soft",
            ImageOutcome::Parts(vec![ResponsePart::Image(InlineImage {
                mime_type: String::new(),
                data: "UDE=".to_string(),
            })]),
        );
        let image = generate_style_image(
            &backend,
            &portrait(),
            &style("Soft"),
            StylePreference::Natural,
            false,
        )
        .await
        .unwrap();
        assert_eq!(image.to_data_url(), "data:image/png;base64,UDE=");
    }
}
