use crate::consult::intake::{StylePreference, UserIntake};

/// Numerology readings are computed against this year, never the clock.
pub const NUMEROLOGY_REFERENCE_YEAR: i32 = 2025;

const SOFT_ARCH_KEYWORDS: &[&str] = &["nhẹ", "soft", "flat"];
const HIGH_ARCH_KEYWORDS: &[&str] = &["tây", "high", "western"];

/// Brow geometry class that drives the image-edit shape rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchShape {
    Flat,
    Balanced,
    High,
}

impl ArchShape {
    /// Keyword match over the style name. A name matching neither class, or
    /// both, gets the balanced arch.
    pub fn classify(style_name: &str) -> Self {
        let lowered = style_name.to_lowercase();
        let soft = SOFT_ARCH_KEYWORDS.iter().any(|keyword| lowered.contains(keyword));
        let high = HIGH_ARCH_KEYWORDS.iter().any(|keyword| lowered.contains(keyword));
        match (soft, high) {
            (true, false) => ArchShape::Flat,
            (false, true) => ArchShape::High,
            _ => ArchShape::Balanced,
        }
    }

    pub fn geometry_rule(self) -> &'static str {
        match self {
            ArchShape::Flat => FLAT_ARCH_RULE,
            ArchShape::Balanced => BALANCED_ARCH_RULE,
            ArchShape::High => HIGH_ARCH_RULE,
        }
    }
}

const FLAT_ARCH_RULE: &str = "SHAPE: FLAT / STRAIGHT / KOREAN STYLE. The brow body should be mostly horizontal with a very soft, low tail. DO NOT ARCH HIGH. Look youthful and gentle.";

const HIGH_ARCH_RULE: &str = "SHAPE: HIGH ARCH / ANGULAR / WESTERN STYLE. The peak must be DISTINCTLY HIGH and SHARP. The tail should lift upwards. Look fierce, sharp and luxurious.";

const BALANCED_ARCH_RULE: &str = "SHAPE: STANDARD CURVE / BALANCED ARCH. A classic semi-circle arch. The peak is visible but soft. The tail drops gently. Look standard and balanced.";

const CORRECTIVE_CONTEXT: &str = "The client HAS AN OLD BROW TATTOO. Recommend new shapes that CORRECT the old one: every new shape must be SMALLER and MORE REFINED so the face looks softer and never harsh.";

const VIRGIN_CONTEXT: &str = "The client has natural, untreated brows (never tattooed).";

const CORRECTIVE_EDIT_BLOCK: &str = r#"CORRECTIVE MODE ACTIVE (fixing an old tattoo):
- The client has an OLD, likely thick or blocky tattoo.
- IGNORE the boundaries of the old tattoo.
- GENERATE A NEW, SLIMMER AND MORE REFINED SHAPE.
- SIMULATE REMOVAL of the excess old ink: replace messy old borders with clean skin or new delicate strokes.
- The new brow MUST be THINNER and SMALLER than the old one to look elegant."#;

const ENHANCEMENT_EDIT_BLOCK: &str = r#"VIRGIN BROWS MODE (enhancement):
- Enhance the natural brow bone structure.
- Keep the shape balanced and refined."#;

const ANALYSIS_TASK: &str = r#"Analyze the attached face photo together with the client details above and return the JSON analysis.

1. FACE ANALYSIS AND CURRENT PROBLEMS
- Golden ratio, forehead/nose/brow shape, demeanour (gentle, sharp, elegant...), eye area, dominant energy.
- currentBrowProblems: a frank, moving critique of the current brows (sparse brows that make the face pale, drooping tails that make it look sad, asymmetry...). Explain what the client loses by not acting: looking older, less vibrant, a weaker first impression and fortune. Sincere, but touching the client's worries so they want to change.

2. THREE BROW STYLES (exactly these three, clearly different from each other)
- Style 1: "Nature Cong Nhẹ" (Soft Nature Arch). Slim nature brow, almost horizontal, a very slight curve at the tail (flat/low arch), soft form. Feeling: youthful, gentle, clear.
- Style 2: "Nature Cong Vừa" (Defined Nature Arch). Clearly lifted, balanced arch (standard medium arch), rounded peak. Feeling: elegant, balanced, bright face.
- Style 3: "Nature Cong Tây" (High Nature Arch). Strong curve (high arch), high peak and lifted tail. Feeling: bold, sharp, noble, powerful, completely different from the other two.
In "effectOnFace" describe the physical shape in English for the image generator:
- Style 1: "Slim straight brow, flat horizontal shape with very subtle tail curve, soft edges, airy powder"
- Style 2: "Slim standard arch brow, balanced curve, distinct peak point, elegant and refined, airy powder"
- Style 3: "Slim high arch brow, angular peak, lifted tail, sharp and fierce, luxury look, airy powder"
IMPORTANT: mark exactly ONE style, the best one, with "isRecommended": true.

3. INK COLOUR
- Soft Neutral Brown with a translucent effect.
- Technique: "Nature Brows" powder, fine airy particles, no contour, never heavy.

4. BEFORE / AFTER
- How many percent softer, how many percent brighter, how many years younger, and the new first impression.

5. NUMEROLOGY (year {year})
- Main number, soul mission, life phase, the lesson of {year}, career energy. Connect the brow shape to the numerology.

6. LIFE PHASE AND SOFT CLOSING
- Advice for {year}.
- 3-4 gentle sentences that open the client's desire to book, followed by a warm final note."#;

fn correction_context(has_prior_tattoo: bool) -> &'static str {
    if has_prior_tattoo {
        CORRECTIVE_CONTEXT
    } else {
        VIRGIN_CONTEXT
    }
}

fn preference_adjustment(preference: StylePreference) -> &'static str {
    if preference.is_slim() {
        "The client chose a slim preference: make the brow very refined and thin."
    } else {
        "Keep natural, harmonious thickness."
    }
}

/// Instruction text for the single structured-analysis call.
pub fn build_analysis_prompt(intake: &UserIntake, response_language: Option<&str>) -> String {
    let year = NUMEROLOGY_REFERENCE_YEAR;
    let mut prompt = format!(
        "THE CURRENT YEAR IS {year}.\n\
         Act as a master Face Analysis, Feng Shui, Numerology and brow-tattoo consultant. \
         Produce a complete, natural, emotionally rich consultation that helps the client decide for themselves.\n\n\
         Client details:\n\
         - Full name: {name}\n\
         - Date of birth: {dob} (compute numerology relative to the year {year})\n\
         - Occupation: {job}\n\
         - BROW CONDITION: {context}\n\
         - BROW PREFERENCE: \"{preference}\" ({preference_desc}). IMPORTANT: all 3 suggested styles must respect this thickness and size.\n\n",
        name = intake.name,
        dob = intake.date_of_birth.format("%Y-%m-%d"),
        job = intake.occupation,
        context = correction_context(intake.has_prior_tattoo),
        preference = intake.style_preference.label(),
        preference_desc = intake.style_preference.description(),
    );
    prompt.push_str(&ANALYSIS_TASK.replace("{year}", &year.to_string()));
    if let Some(lang) = response_language.map(str::trim).filter(|lang| !lang.is_empty()) {
        prompt.push_str(&format!(
            "\n\nPlease reply in {}. Keep the style names and effectOnFace exactly as specified.",
            lang
        ));
    }
    prompt
}

/// Instruction text for editing one style onto the client's portrait.
pub fn build_image_edit_prompt(
    style_name: &str,
    effect_on_face: &str,
    preference: StylePreference,
    has_prior_tattoo: bool,
) -> String {
    let mode_block = if has_prior_tattoo {
        CORRECTIVE_EDIT_BLOCK
    } else {
        ENHANCEMENT_EDIT_BLOCK
    };
    let geometry_rule = ArchShape::classify(style_name).geometry_rule();

    format!(
        r#"ROLE: Expert high-end photo retoucher and permanent-makeup master artist.
TASK: EDIT the eyebrows of the person in the provided image.

CRITICAL CONSTRAINT (IDENTITY PRESERVATION):
- KEEP the face, skin texture, lighting, makeup, eyes and hair 100% UNCHANGED.
- This is NOT a new character generation. This is an EDIT of the specific person in the photo.
- DO NOT apply smoothing filters or cartoon effects. Keep it raw and realistic.

STYLE: "NATURE BROWS" (healed effect, "my brows but better"):
- Opacity: extremely sheer and natural, 40-50% opacity only.
- Color: transparent soft ash brown / taupe. It must look like NO TATTOO, just naturally beautiful, fluffy brows. Not dark, not makeup.
- Technique: airy powder / nano mist with a soft, misty particle effect.
- Edges: soft and fuzzy, no hard outline; the brow fades gently into the skin. The brow head is an extremely soft, transparent gradient.
- Size: SLIM AND REFINED. Strictly no thick, heavy or blocky brows.

{mode_block}

TARGET SHAPE: "{style_name}"
- GEOMETRIC RULE (MUST FOLLOW): {geometry_rule}
- Shape detail: {effect_on_face}
- Preference adjustment: "{preference}". {adjustment}
- Symmetry: left and right brows must be geometrically symmetric.
- Makeup: add very subtle natural eyeliner and wispy lashes so the eyes look more beautiful but still natural.

OUTPUT QUALITY: 8K resolution, macro photography detail, hyper-realistic texture."#,
        preference = preference.label(),
        adjustment = preference_adjustment(preference),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consult::intake::PortraitImage;
    use chrono::NaiveDate;

    fn intake(has_prior_tattoo: bool) -> UserIntake {
        UserIntake {
            name: "An".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 1).unwrap(),
            occupation: "Designer".to_string(),
            style_preference: StylePreference::Natural,
            has_prior_tattoo,
            portrait: PortraitImage {
                bytes: vec![1, 2, 3],
                mime_type: "image/jpeg".to_string(),
            },
        }
    }

    #[test]
    fn analysis_prompt_embeds_client_details_and_reference_year() {
        let prompt = build_analysis_prompt(&intake(false), Some("Vietnamese"));
        assert!(prompt.contains("Full name: An"));
        assert!(prompt.contains("Date of birth: 1990-05-01"));
        assert!(prompt.contains("Occupation: Designer"));
        assert!(prompt.contains("\"Tự Nhiên\""));
        assert!(prompt.contains(VIRGIN_CONTEXT));
        assert!(prompt.contains("NUMEROLOGY (year 2025)"));
        assert!(!prompt.contains("{year}"));
        assert!(prompt.ends_with("Keep the style names and effectOnFace exactly as specified."));
    }

    #[test]
    fn analysis_prompt_switches_to_corrective_framing() {
        let prompt = build_analysis_prompt(&intake(true), None);
        assert!(prompt.contains(CORRECTIVE_CONTEXT));
        assert!(!prompt.contains(VIRGIN_CONTEXT));
        assert!(!prompt.contains("Please reply in"));
    }

    #[test]
    fn builders_are_deterministic() {
        let client = intake(true);
        assert_eq!(
            build_analysis_prompt(&client, Some("Vietnamese")),
            build_analysis_prompt(&client, Some("Vietnamese"))
        );
        let first = build_image_edit_prompt("Nature Cong Tây", "high arch", StylePreference::Slender, true);
        let second = build_image_edit_prompt("Nature Cong Tây", "high arch", StylePreference::Slender, true);
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn arch_shape_follows_name_keywords() {
        assert_eq!(ArchShape::classify("Nature Cong Nhẹ"), ArchShape::Flat);
        assert_eq!(ArchShape::classify("Soft Nature Arch"), ArchShape::Flat);
        assert_eq!(ArchShape::classify("FLAT korean"), ArchShape::Flat);
        assert_eq!(ArchShape::classify("Nature Cong Tây"), ArchShape::High);
        assert_eq!(ArchShape::classify("Western Luxe"), ArchShape::High);
        assert_eq!(ArchShape::classify("High Nature Arch"), ArchShape::High);
        assert_eq!(ArchShape::classify("Nature Cong Vừa"), ArchShape::Balanced);
        assert_eq!(ArchShape::classify(""), ArchShape::Balanced);
        assert_eq!(ArchShape::classify("Soft but High"), ArchShape::Balanced);
    }

    #[test]
    fn edit_prompt_selects_geometry_rule_by_style_name() {
        let flat = build_image_edit_prompt("Soft Arch", "d", StylePreference::Natural, false);
        let high = build_image_edit_prompt("Western Arch", "d", StylePreference::Natural, false);
        let balanced = build_image_edit_prompt("Defined Arch", "d", StylePreference::Natural, false);
        assert!(flat.contains(FLAT_ARCH_RULE));
        assert!(high.contains(HIGH_ARCH_RULE));
        assert!(balanced.contains(BALANCED_ARCH_RULE));
        assert!(!balanced.contains(FLAT_ARCH_RULE) && !balanced.contains(HIGH_ARCH_RULE));
    }

    #[test]
    fn edit_prompt_carries_mode_block_and_shape_detail() {
        let corrective = build_image_edit_prompt(
            "Nature Cong Vừa",
            "Slim standard arch brow",
            StylePreference::NaturalSlim,
            true,
        );
        assert!(corrective.contains("CORRECTIVE MODE ACTIVE"));
        assert!(corrective.contains("SIMULATE REMOVAL"));
        assert!(!corrective.contains("VIRGIN BROWS MODE"));
        assert!(corrective.contains("Shape detail: Slim standard arch brow"));
        assert!(corrective.contains("\"Tự Nhiên (Nhỏ)\""));
        assert!(corrective.contains("very refined and thin"));
        assert!(corrective.contains("IDENTITY PRESERVATION"));

        let enhancement =
            build_image_edit_prompt("Nature Cong Vừa", "x", StylePreference::Natural, false);
        assert!(enhancement.contains("VIRGIN BROWS MODE"));
        assert!(!enhancement.contains("CORRECTIVE MODE ACTIVE"));
    }
}
