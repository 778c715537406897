//! Runtime configuration: environment variables plus an optional TOML file
//! with prompt overrides.
//!
//! See `AppConfig` and `Prompts` for the expected schema.

use std::time::Duration;

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::domain::ModelSelector;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_TEMPERATURE: f32 = 0.4;

/// Shape of the optional TOML file pointed to by `QNA_CONFIG_PATH`.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct FileConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub temperature: Option<f32>,
}

/// Prompts handed to the engine. `{num}`, `{question_type}`, `{schema}` and
/// `{custom_instructions}` are substituted per request.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub system: String,
  pub user_template: String,
  pub instructions_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      system: "You are an assistant that writes quiz questions about the content of a YouTube video. Respond ONLY with strict JSON.".into(),
      user_template: "Watch the attached video and generate {num} {question_type} questions about its content.\nReturn JSON of the form {\"questions\": [ ... ]} where every item has this shape:\n{schema}\n{custom_instructions}".into(),
      instructions_template: "Additional instructions: {custom_instructions}".into(),
    }
  }
}

/// Everything the server and the engine builder need at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
  pub port: u16,
  pub gemini_base_url: String,
  pub request_timeout: Duration,
  pub default_model: ModelSelector,
  pub temperature: f32,
  pub prompts: Prompts,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      port: 3000,
      gemini_base_url: DEFAULT_GEMINI_BASE_URL.into(),
      request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
      default_model: ModelSelector::default(),
      temperature: DEFAULT_TEMPERATURE,
      prompts: Prompts::default(),
    }
  }
}

impl AppConfig {
  /// Read env vars and the optional TOML file. Invalid values are logged and
  /// replaced by defaults; startup never fails on configuration.
  pub fn from_env() -> Self {
    let mut cfg = AppConfig::default();

    if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
      cfg.port = port;
    }
    if let Ok(url) = std::env::var("GEMINI_BASE_URL") {
      cfg.gemini_base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(secs) = std::env::var("GEMINI_TIMEOUT_SECS").ok().and_then(|s| s.parse::<u64>().ok()) {
      cfg.request_timeout = Duration::from_secs(secs);
    }
    if let Ok(raw) = std::env::var("QNA_DEFAULT_MODEL") {
      match raw.parse::<ModelSelector>() {
        Ok(m) => cfg.default_model = m,
        Err(e) => warn!(target: "tubequiz_backend", error = %e, "Ignoring QNA_DEFAULT_MODEL"),
      }
    }

    if let Some(file) = load_file_config_from_env() {
      cfg.apply(file);
    }
    cfg
  }

  pub fn apply(&mut self, file: FileConfig) {
    self.prompts = file.prompts;
    if let Some(t) = file.temperature {
      self.temperature = t;
    }
  }
}

/// Attempt to load `FileConfig` from QNA_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_file_config_from_env() -> Option<FileConfig> {
  let path = std::env::var("QNA_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_file_config(&s) {
      Ok(cfg) => {
        info!(target: "tubequiz_backend", %path, "Loaded prompt config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "tubequiz_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "tubequiz_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

pub fn parse_file_config(s: &str) -> Result<FileConfig, toml::de::Error> {
  toml::from_str::<FileConfig>(s)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_toml_keeps_default_prompts() {
    let file = parse_file_config("temperature = 0.9\n[prompts]\nsystem = \"Be brief.\"\n").expect("toml");
    let mut cfg = AppConfig::default();
    cfg.apply(file);
    assert_eq!(cfg.temperature, 0.9);
    assert_eq!(cfg.prompts.system, "Be brief.");
    assert_eq!(cfg.prompts.user_template, Prompts::default().user_template);
  }

  #[test]
  fn empty_toml_is_all_defaults() {
    let mut cfg = AppConfig::default();
    cfg.apply(parse_file_config("").expect("toml"));
    assert_eq!(cfg.temperature, DEFAULT_TEMPERATURE);
    assert_eq!(cfg.prompts.system, Prompts::default().system);
  }

  #[test]
  fn malformed_toml_is_an_error() {
    assert!(parse_file_config("temperature = \"hot\"").is_err());
  }
}
