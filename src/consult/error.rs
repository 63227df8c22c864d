/// Terminal failures of one consultation. Per-style image failures are not
/// represented here; they surface as a missing image on that style.
#[derive(Debug, thiserror::Error)]
pub enum ConsultError {
    #[error("Gemini API key is missing; set GEMINI_API_KEY before running an analysis")]
    MissingApiKey,
    #[error("Analysis request failed: {0}")]
    Service(#[source] anyhow::Error),
    #[error("Analysis response was malformed: {0}")]
    Validation(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IntakeError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Invalid date of birth '{0}'; expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Unknown style preference '{0}'; expected natural, natural-slim or slender")]
    UnknownStylePreference(String),
    #[error("Portrait could not be read: {0}")]
    UnreadableImage(String),
    #[error("Portrait is not a supported image ({0})")]
    UnsupportedImage(String),
}
