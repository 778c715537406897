//! Question-generation engine: the trait seam plus a Gemini REST client.
//!
//! One `generateContent` call per request with the YouTube URL attached as
//! `fileData`; the model is asked for strict JSON which we decode into a
//! `QuestionSet`. Calls are instrumented and log model names, latencies and
//! token usage (not contents).
//!
//! NOTE: We never log the API key.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::config::{AppConfig, Prompts};
use crate::domain::{Credential, ModelSelector, QuestionKind, QuestionSet};
use crate::error::QnaError;
use crate::util::{fill_template, strip_code_fences, trunc_for_log};

const API_KEY_HEADER: &str = "x-goog-api-key";
const UA: &str = "tubequiz-backend/0.1";

/// A ready-to-use connection to a question generator.
#[async_trait]
pub trait QuestionEngine: Send + Sync {
  async fn generate_questions_from_source(
    &self,
    source: &str,
    num: u8,
    kind: QuestionKind,
    custom_instructions: Option<&str>,
  ) -> Result<QuestionSet, QnaError>;
}

/// Builds engines. Construction may touch the network and may reject the
/// credential/model pair with `ClientInitializationFailed`.
#[async_trait]
pub trait EngineBuilder: Send + Sync {
  async fn build_engine(
    &self,
    credential: &Credential,
    model: ModelSelector,
  ) -> Result<Arc<dyn QuestionEngine>, QnaError>;
}

/// Builder for `GeminiEngine`, carrying the server-wide settings.
#[derive(Clone, Debug)]
pub struct GeminiBuilder {
  pub base_url: String,
  pub timeout: Duration,
  pub temperature: f32,
  pub prompts: Prompts,
}

impl GeminiBuilder {
  pub fn from_config(cfg: &AppConfig) -> Self {
    Self {
      base_url: cfg.gemini_base_url.clone(),
      timeout: cfg.request_timeout,
      temperature: cfg.temperature,
      prompts: cfg.prompts.clone(),
    }
  }
}

#[async_trait]
impl EngineBuilder for GeminiBuilder {
  /// Build the HTTP client and confirm the key can see the model.
  #[instrument(level = "info", skip(self, credential))]
  async fn build_engine(
    &self,
    credential: &Credential,
    model: ModelSelector,
  ) -> Result<Arc<dyn QuestionEngine>, QnaError> {
    let init_failed = |reason: String| QnaError::ClientInitializationFailed { model, reason };

    let client = reqwest::Client::builder()
      .timeout(self.timeout)
      .build()
      .map_err(|e| init_failed(e.to_string()))?;

    let url = format!("{}/models/{}", self.base_url, model.as_str());
    let res = client.get(&url)
      .header(USER_AGENT, UA)
      .header(API_KEY_HEADER, credential.expose())
      .send().await
      .map_err(|e| init_failed(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_gemini_error(&body).unwrap_or_else(|| trunc_for_log(&body, 200));
      error!(target: "engine", %model, %status, "Model lookup rejected");
      return Err(init_failed(format!("HTTP {}: {}", status, msg)));
    }

    info!(target: "engine", %model, base_url = %self.base_url, "Gemini engine ready");
    Ok(Arc::new(GeminiEngine {
      client,
      api_key: credential.expose().to_string(),
      base_url: self.base_url.clone(),
      model,
      temperature: self.temperature,
      prompts: self.prompts.clone(),
    }))
  }
}

pub struct GeminiEngine {
  client: reqwest::Client,
  api_key: String,
  base_url: String,
  model: ModelSelector,
  temperature: f32,
  prompts: Prompts,
}

impl GeminiEngine {
  fn build_request(&self, source: &str, num: u8, kind: QuestionKind, custom_instructions: Option<&str>) -> GenerateContentRequest {
    GenerateContentRequest {
      system_instruction: Content { role: None, parts: vec![Part::text(&self.prompts.system)] },
      contents: vec![Content {
        role: Some("user".into()),
        parts: vec![
          Part::file(source),
          Part::text(&build_user_prompt(&self.prompts, num, kind, custom_instructions)),
        ],
      }],
      generation_config: GenerationConfig {
        temperature: self.temperature,
        response_mime_type: "application/json".into(),
      },
    }
  }
}

#[async_trait]
impl QuestionEngine for GeminiEngine {
  #[instrument(level = "info", skip(self, custom_instructions), fields(model = %self.model, kind = kind.id()))]
  async fn generate_questions_from_source(
    &self,
    source: &str,
    num: u8,
    kind: QuestionKind,
    custom_instructions: Option<&str>,
  ) -> Result<QuestionSet, QnaError> {
    let url = format!("{}/models/{}:generateContent", self.base_url, self.model.as_str());
    let req = self.build_request(source, num, kind, custom_instructions);

    let start = std::time::Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, UA)
      .header(CONTENT_TYPE, "application/json")
      .header(API_KEY_HEADER, &self.api_key)
      .json(&req).send().await
      .map_err(|e| QnaError::GenerationFailed(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_gemini_error(&body).unwrap_or_else(|| trunc_for_log(&body, 200));
      error!(elapsed = ?start.elapsed(), %status, "Gemini call failed");
      return Err(QnaError::GenerationFailed(format!("Gemini HTTP {}: {}", status, msg)));
    }

    let body: GenerateContentResponse = res.json().await
      .map_err(|e| QnaError::GenerationFailed(e.to_string()))?;
    if let Some(usage) = &body.usage_metadata {
      info!(prompt_tokens = ?usage.prompt_token_count, completion_tokens = ?usage.candidates_token_count, total_tokens = ?usage.total_token_count, "Gemini usage");
    }

    let set = parse_question_set(&body)?;
    info!(elapsed = ?start.elapsed(), questions = set.len(), "Questions generated");
    Ok(set)
  }
}

fn build_user_prompt(prompts: &Prompts, num: u8, kind: QuestionKind, custom_instructions: Option<&str>) -> String {
  let extra = custom_instructions
    .map(|ci| fill_template(&prompts.instructions_template, &[("custom_instructions", ci)]))
    .unwrap_or_default();
  let num = num.to_string();
  fill_template(
    &prompts.user_template,
    &[
      ("num", &num),
      ("question_type", kind.label()),
      ("schema", kind.schema_hint()),
      ("custom_instructions", &extra),
    ],
  )
  .trim_end()
  .to_string()
}

/// Pull the model's text out of the first candidate and decode it.
fn parse_question_set(body: &GenerateContentResponse) -> Result<QuestionSet, QnaError> {
  let text: String = body.candidates.first()
    .and_then(|c| c.content.as_ref())
    .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
    .unwrap_or_default();

  if text.trim().is_empty() {
    let reason = body.candidates.first()
      .and_then(|c| c.finish_reason.clone())
      .unwrap_or_else(|| "no candidates".into());
    return Err(QnaError::GenerationFailed(format!("Empty model response ({reason})")));
  }

  debug!(target: "engine", preview = %trunc_for_log(&text, 80), "Decoding model output");
  serde_json::from_str::<QuestionSet>(strip_code_fences(&text))
    .map_err(|e| QnaError::GenerationFailed(format!("JSON parse error: {}", e)))
}

// --- Gemini DTOs ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
  system_instruction: Content,
  contents: Vec<Content>,
  generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  role: Option<String>,
  #[serde(default)]
  parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  text: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  file_data: Option<FileData>,
}

impl Part {
  fn text(s: &str) -> Self { Self { text: Some(s.to_string()), file_data: None } }
  fn file(uri: &str) -> Self {
    Self { text: None, file_data: Some(FileData { file_uri: uri.to_string() }) }
  }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileData { file_uri: String }

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
  temperature: f32,
  response_mime_type: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
  #[serde(default)] candidates: Vec<Candidate>,
  #[serde(default)] usage_metadata: Option<UsageMetadata>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
  #[serde(default)] content: Option<Content>,
  #[serde(default)] finish_reason: Option<String>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
  #[serde(default)] prompt_token_count: Option<u32>,
  #[serde(default)] candidates_token_count: Option<u32>,
  #[serde(default)] total_token_count: Option<u32>,
}

/// Try to extract a clean error message from a Google API error body.
fn extract_gemini_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}


#[cfg(test)]
mod tests {
  use super::*;

  fn engine() -> GeminiEngine {
    GeminiEngine {
      client: reqwest::Client::new(),
      api_key: "k".into(),
      base_url: "http://localhost".into(),
      model: ModelSelector::Gemini20Flash,
      temperature: 0.4,
      prompts: Prompts::default(),
    }
  }

  #[test]
  fn request_attaches_video_and_prompt() {
    let req = engine().build_request("https://www.youtube.com/watch?v=abc", 3, QuestionKind::ShortAnswer, Some("Focus on key concepts"));
    let v = serde_json::to_value(&req).expect("json");
    assert_eq!(v["contents"][0]["parts"][0]["fileData"]["fileUri"], "https://www.youtube.com/watch?v=abc");
    let prompt = v["contents"][0]["parts"][1]["text"].as_str().expect("prompt");
    assert!(prompt.contains("generate 3 Short Answer questions"));
    assert!(prompt.contains("\"keywords\""));
    assert!(prompt.ends_with("Additional instructions: Focus on key concepts"));
    assert_eq!(v["generationConfig"]["responseMimeType"], "application/json");
    assert!(v["systemInstruction"].get("role").is_none());
  }

  #[test]
  fn prompt_without_instructions_has_no_trailer() {
    let p = build_user_prompt(&Prompts::default(), 2, QuestionKind::TrueFalse, None);
    assert!(!p.contains("Additional instructions"));
    assert!(p.contains("\"answer\": boolean"));
  }

  #[test]
  fn parses_fenced_model_output() {
    let body: GenerateContentResponse = serde_json::from_str(r#"{
      "candidates": [{"content": {"role": "model", "parts": [{"text": "```json\n{\"questions\": [{\"question\": \"Q?\", \"answer\": false}]}\n```"}]}}],
      "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 5, "totalTokenCount": 15}
    }"#).expect("body");
    let set = parse_question_set(&body).expect("set");
    assert_eq!(set.len(), 1);
    assert_eq!(set.questions[0].answer.as_deref(), Some("False"));
  }

  #[test]
  fn one_off_shape_record_does_not_sink_the_reply() {
    let text = r#"{"questions": [{"question": "A?", "options": {"B": "two", "A": "one"}, "answer": "one"}, {"question": "B?", "answer": "b", "keywords": "alpha,beta"}]}"#;
    let body = GenerateContentResponse {
      candidates: vec![Candidate {
        content: Some(Content { role: None, parts: vec![Part::text(text)] }),
        finish_reason: None,
      }],
      usage_metadata: None,
    };
    let set = parse_question_set(&body).expect("set");
    assert_eq!(set.len(), 2);
    assert_eq!(set.questions[0].options, Some(vec!["one".to_string(), "two".to_string()]));
    assert_eq!(set.questions[1].keywords, Some(vec!["alpha".to_string(), "beta".to_string()]));
  }

  #[test]
  fn empty_or_garbled_output_is_generation_failure() {
    let body: GenerateContentResponse = serde_json::from_str(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#).expect("body");
    match parse_question_set(&body) {
      Err(QnaError::GenerationFailed(msg)) => assert!(msg.contains("SAFETY")),
      other => panic!("unexpected: {other:?}"),
    }
    let body: GenerateContentResponse = serde_json::from_str(r#"{"candidates": [{"content": {"parts": [{"text": "not json"}]}}]}"#).expect("body");
    assert!(matches!(parse_question_set(&body), Err(QnaError::GenerationFailed(_))));
  }

  #[test]
  fn google_error_message_is_extracted() {
    let body = r#"{"error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT"}}"#;
    assert_eq!(extract_gemini_error(body).as_deref(), Some("API key not valid. Please pass a valid API key."));
    assert!(extract_gemini_error("<html>").is_none());
  }
}
