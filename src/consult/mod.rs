pub mod error;
pub mod image_edit;
pub mod intake;
pub mod orchestrator;
pub mod prompts;
pub mod report;
pub mod schema;

#[cfg(test)]
pub(crate) mod test_support;

pub use intake::{IntakeForm, PortraitImage, StylePreference};
pub use orchestrator::analyze_profile;
pub use schema::analysis_schema;
