use std::env;
use std::path::PathBuf;

use anyhow::Result;
use once_cell::sync::Lazy;
use tracing::warn;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub log_dir: PathBuf,
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub gemini_image_model: String,
    pub gemini_temperature: f32,
    pub gemini_top_k: i32,
    pub gemini_top_p: f32,
    pub gemini_safety_settings: String,
    pub gemini_timeout_seconds: u64,
    pub response_language: String,
}

pub static CONFIG: Lazy<Config> =
    Lazy::new(|| Config::load().expect("Failed to load configuration"));

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_f32(name: &str, default: f32) -> f32 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<f32>().ok())
        .unwrap_or(default)
}

fn env_i32(name: &str, default: i32) -> i32 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<i32>().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

/// First non-blank value among `names`, or an empty string.
fn env_first_non_empty(names: &[&str]) -> String {
    names
        .iter()
        .filter_map(|name| env::var(name).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

fn normalize_base_url(value: String) -> String {
    let trimmed = value.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return DEFAULT_GEMINI_BASE_URL.to_string();
    }
    trimmed.to_string()
}

fn normalize_gemini_safety_settings(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "permissive".to_string();
    }

    let lowered = trimmed.to_lowercase();
    match lowered.as_str() {
        "permissive" | "off" | "none" => "permissive".to_string(),
        "standard" => "standard".to_string(),
        _ => {
            warn!(
                "Unknown GEMINI_SAFETY_SETTINGS value '{}'; defaulting to permissive.",
                value
            );
            "permissive".to_string()
        }
    }
}

impl Config {
    /// Reads configuration from the environment. A missing API key is not an
    /// error here; analysis refuses to start without one.
    pub fn load() -> Result<Self> {
        Ok(Config {
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            log_dir: PathBuf::from(env_string("LOG_DIR", "logs")),
            gemini_api_key: env_first_non_empty(&["GEMINI_API_KEY", "API_KEY"]),
            gemini_base_url: normalize_base_url(env_string(
                "GEMINI_BASE_URL",
                DEFAULT_GEMINI_BASE_URL,
            )),
            gemini_model: env_string("GEMINI_MODEL", "gemini-2.5-flash"),
            gemini_image_model: env_string("GEMINI_IMAGE_MODEL", "gemini-2.5-flash-image"),
            gemini_temperature: env_f32("GEMINI_TEMPERATURE", 0.7),
            gemini_top_k: env_i32("GEMINI_TOP_K", 40),
            gemini_top_p: env_f32("GEMINI_TOP_P", 0.95),
            gemini_safety_settings: normalize_gemini_safety_settings(env_string(
                "GEMINI_SAFETY_SETTINGS",
                "permissive",
            )),
            gemini_timeout_seconds: env_u64("GEMINI_TIMEOUT_SECONDS", 90).max(1),
            response_language: env_string("CONSULT_RESPONSE_LANGUAGE", "Vietnamese"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_helpers_fall_back_on_garbage() {
        env::set_var("BROW_TEST_F32_GARBAGE", "warm");
        env::set_var("BROW_TEST_U64_PADDED", " 42 ");
        assert_eq!(env_f32("BROW_TEST_F32_GARBAGE", 0.5), 0.5);
        assert_eq!(env_u64("BROW_TEST_U64_PADDED", 7), 42);
        assert_eq!(env_i32("BROW_TEST_I32_UNSET", -3), -3);
    }

    #[test]
    fn first_non_empty_skips_blank_values() {
        env::set_var("BROW_TEST_KEY_PRIMARY", "   ");
        env::set_var("BROW_TEST_KEY_ALIAS", "alias-key");
        assert_eq!(
            env_first_non_empty(&["BROW_TEST_KEY_PRIMARY", "BROW_TEST_KEY_ALIAS"]),
            "alias-key"
        );
        assert_eq!(env_first_non_empty(&["BROW_TEST_KEY_MISSING"]), "");
    }

    #[test]
    fn base_url_loses_trailing_slash_and_defaults_when_blank() {
        assert_eq!(
            normalize_base_url("http://localhost:8080/".to_string()),
            "http://localhost:8080"
        );
        assert_eq!(normalize_base_url("  ".to_string()), DEFAULT_GEMINI_BASE_URL);
    }

    #[test]
    fn safety_profile_is_normalized() {
        assert_eq!(normalize_gemini_safety_settings("OFF".to_string()), "permissive");
        assert_eq!(normalize_gemini_safety_settings("Standard".to_string()), "standard");
        assert_eq!(normalize_gemini_safety_settings("strict".to_string()), "permissive");
    }
}
