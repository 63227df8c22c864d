use std::fmt::Write as _;

use crate::consult::schema::{AnalysisResult, BrowStyle};

const IMAGE_PENDING: &str = "still processing (preview unavailable)";

fn image_status(style: &BrowStyle) -> String {
    match style.image_url.as_deref() {
        Some(url) => {
            let (mime, payload) = url
                .strip_prefix("data:")
                .and_then(|rest| rest.split_once(";base64,"))
                .unwrap_or(("image", url));
            format!("ready ({}, ~{} KB)", mime, payload.len() * 3 / 4 / 1024)
        }
        None => IMAGE_PENDING.to_string(),
    }
}

/// Plain-text consultation report. Data URLs are summarised, not printed.
pub fn render_text(result: &AnalysisResult) -> String {
    let mut out = String::new();
    let face = &result.face_analysis;

    let _ = writeln!(out, "== Face analysis ==");
    let _ = writeln!(out, "Golden ratio:     {}", face.golden_ratio);
    let _ = writeln!(out, "Features:         {}", face.features);
    let _ = writeln!(out, "Aura:             {}", face.aura);
    let _ = writeln!(out, "Eyes:             {}", face.eyes);
    let _ = writeln!(out, "Dominant energy:  {}", face.dominant_energy);
    let _ = writeln!(out, "Current brows:    {}", face.current_brow_problems);

    let _ = writeln!(out, "\n== Brow styles ==");
    for (index, style) in result.brow_styles.iter().enumerate() {
        let marker = if style.is_recommended { " [recommended]" } else { "" };
        let _ = writeln!(out, "{}. {}{}", index + 1, style.name, marker);
        let _ = writeln!(out, "   Why:        {}", style.reason);
        let _ = writeln!(out, "   Shape:      {}", style.effect_on_face);
        let _ = writeln!(out, "   Impression: {}", style.impression);
        let _ = writeln!(out, "   Career fit: {}", style.job_suitability);
        let _ = writeln!(out, "   Preview:    {}", image_status(style));
    }

    let color = &result.color_suggestion;
    let _ = writeln!(out, "\n== Ink colour ==");
    let _ = writeln!(out, "{}: {}", color.color, color.reason);

    let before_after = &result.before_after;
    let _ = writeln!(out, "\n== Before / after ==");
    let _ = writeln!(out, "Softer:           {}", before_after.softness_increase);
    let _ = writeln!(out, "Brighter:         {}", before_after.brightness_increase);
    let _ = writeln!(out, "Younger:          {}", before_after.years_younger);
    let _ = writeln!(out, "First impression: {}", before_after.first_impression);

    let numerology = &result.numerology;
    let _ = writeln!(out, "\n== Numerology ==");
    let _ = writeln!(out, "Main number:      {}", numerology.main_number);
    let _ = writeln!(out, "Soul mission:     {}", numerology.soul_mission);
    let _ = writeln!(out, "Life phase:       {}", numerology.life_phase);
    let _ = writeln!(out, "Yearly lesson:    {}", numerology.yearly_lesson);
    let _ = writeln!(out, "Career energy:    {}", numerology.career_energy);
    let _ = writeln!(out, "Brow connection:  {}", numerology.connection_to_brow);

    let advice = &result.life_advice;
    let _ = writeln!(out, "\n== Life advice ==");
    let _ = writeln!(out, "Current phase:    {}", advice.current_phase);
    let _ = writeln!(out, "Focus this year:  {}", advice.focus_this_year);
    let _ = writeln!(out, "Posture to build: {}", advice.posture_to_build);

    let _ = writeln!(out, "\n== A few thoughts ==");
    for suggestion in &result.soft_closing.suggestions {
        let _ = writeln!(out, "- {}", suggestion);
    }
    let _ = writeln!(out, "{}", result.soft_closing.final_note);

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consult::schema::fixtures::three_styles;
    use crate::consult::schema::parse_analysis;

    #[test]
    fn missing_image_renders_as_pending_not_error() {
        let mut result = parse_analysis(&three_styles().to_string()).unwrap();
        result.brow_styles[0].image_url =
            Some(format!("data:image/png;base64,{}", "A".repeat(4096)));

        let text = render_text(&result);
        assert!(text.contains("Preview:    ready (image/png, ~3 KB)"));
        assert_eq!(text.matches(IMAGE_PENDING).count(), 2);
        assert!(!text.contains("AAAA"));
    }

    #[test]
    fn recommended_style_is_marked_once() {
        let result = parse_analysis(&three_styles().to_string()).unwrap();
        let text = render_text(&result);
        assert_eq!(text.matches("[recommended]").count(), 1);
        assert!(text.contains("2. Nature Cong Vừa [recommended]"));
        assert!(text.contains("- Try the soft arch"));
        assert!(text.ends_with("You deserve to shine.\n"));
    }
}
