pub mod backend;
pub mod gemini;
pub mod media;

pub use backend::{ConsultationBackend, ResponsePart};
pub use gemini::GeminiClient;
pub use media::InlineImage;
