use std::env;

use crate::merge::IdentityKeys;
use crate::render::OutputFormat;

/// Config holds all application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub templates_dir: String,
    /// Empty means print to stdout
    pub output_dir: String,
    pub output_format: OutputFormat,
    /// Tera template used for text output
    pub text_template: String,
    pub identity_keys: IdentityKeys,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn load() -> Self {
        Self {
            templates_dir: get_env("TEMPLATES_DIR", "templates"),
            output_dir: get_env("OUTPUT_DIR", ""),
            output_format: get_env("OUTPUT_FORMAT", "yaml").parse().unwrap_or_else(|e| {
                tracing::warn!("{}, falling back to yaml", e);
                OutputFormat::Yaml
            }),
            text_template: get_env("TEXT_TEMPLATE", ""),
            identity_keys: match env::var("IDENTITY_KEYS") {
                Ok(keys) if !keys.trim().is_empty() => keys.parse().unwrap_or_default(),
                _ => IdentityKeys::default(),
            },
        }
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
