//! Public request/response structs for the HTTP API (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::DEFAULT_QUESTIONS;
use crate::render::RenderedBlock;

/// Form submission. Optional fields fall back to the page defaults.
#[derive(Deserialize)]
pub struct GenerateIn {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_num")]
    pub num: i64,
    #[serde(default)]
    pub question_type: Option<String>,
    #[serde(default)]
    pub custom_instructions: Option<String>,
}

fn default_num() -> i64 {
    DEFAULT_QUESTIONS as i64
}

#[derive(Debug, Serialize)]
pub struct GenerateOut {
    pub request_id: String,
    pub model: String,
    pub question_type: String,
    pub blocks: Vec<RenderedBlock>,
    pub text: String,
}

#[derive(Serialize)]
pub struct ChoiceOut {
    pub id: &'static str,
    pub label: &'static str,
}

#[derive(Serialize)]
pub struct ModelsOut {
    pub default: &'static str,
    pub models: Vec<ChoiceOut>,
}

#[derive(Serialize)]
pub struct QuestionTypesOut {
    pub question_types: Vec<ChoiceOut>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub cached_clients: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}
