//! Domain models: credentials, model selection, question kinds, generation
//! requests and the question records returned by the engine.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::QnaError;

/// Smallest and largest number of questions a single request may ask for.
pub const MIN_QUESTIONS: u8 = 1;
pub const MAX_QUESTIONS: u8 = 5;
pub const DEFAULT_QUESTIONS: u8 = 3;

/// Opaque API secret supplied with each submission. Held in memory only.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Credential(String);

impl Credential {
  /// Surrounding whitespace from copy/paste is dropped.
  pub fn new(raw: impl Into<String>) -> Self { Self(raw.into().trim().to_string()) }

  /// Empty or whitespace-only keys mean "not configured yet".
  pub fn is_blank(&self) -> bool { self.0.is_empty() }

  pub fn expose(&self) -> &str { &self.0 }
}

impl fmt::Debug for Credential {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_blank() { f.write_str("Credential(<empty>)") } else { f.write_str("Credential(<redacted>)") }
  }
}

/// Hosted model variants the form offers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelSelector {
  #[serde(rename = "gemini-2.0-flash")]
  Gemini20Flash,
  #[serde(rename = "gemini-2.0-flash-lite-preview-02-05")]
  Gemini20FlashLite,
  #[serde(rename = "gemini-2.0-pro-exp-02-05")]
  Gemini20ProExp,
}

impl ModelSelector {
  pub const ALL: [ModelSelector; 3] = [
    ModelSelector::Gemini20Flash,
    ModelSelector::Gemini20FlashLite,
    ModelSelector::Gemini20ProExp,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      ModelSelector::Gemini20Flash => "gemini-2.0-flash",
      ModelSelector::Gemini20FlashLite => "gemini-2.0-flash-lite-preview-02-05",
      ModelSelector::Gemini20ProExp => "gemini-2.0-pro-exp-02-05",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      ModelSelector::Gemini20Flash => "Gemini 2.0 Flash",
      ModelSelector::Gemini20FlashLite => "Gemini 2.0 Flash Lite (preview 02-05)",
      ModelSelector::Gemini20ProExp => "Gemini 2.0 Pro (experimental 02-05)",
    }
  }
}

impl Default for ModelSelector {
  fn default() -> Self { ModelSelector::Gemini20Flash }
}

impl fmt::Display for ModelSelector {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for ModelSelector {
  type Err = QnaError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let wanted = s.trim();
    ModelSelector::ALL
      .into_iter()
      .find(|m| m.as_str() == wanted)
      .ok_or_else(|| QnaError::UnknownModel(wanted.to_string()))
  }
}

/// Which shape of question the engine is asked to produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
  MultipleChoice,
  ShortAnswer,
  TrueFalse,
  FillInBlank,
}

impl QuestionKind {
  pub const ALL: [QuestionKind; 4] = [
    QuestionKind::MultipleChoice,
    QuestionKind::ShortAnswer,
    QuestionKind::TrueFalse,
    QuestionKind::FillInBlank,
  ];

  pub fn id(self) -> &'static str {
    match self {
      QuestionKind::MultipleChoice => "multiple_choice",
      QuestionKind::ShortAnswer => "short_answer",
      QuestionKind::TrueFalse => "true_false",
      QuestionKind::FillInBlank => "fill_in_blank",
    }
  }

  /// Human label, also what the engine prompt names the question type as.
  pub fn label(self) -> &'static str {
    match self {
      QuestionKind::MultipleChoice => "Multiple Choice",
      QuestionKind::ShortAnswer => "Short Answer",
      QuestionKind::TrueFalse => "True/False",
      QuestionKind::FillInBlank => "Fill in the Blank",
    }
  }

  /// JSON shape of one question, handed to the model as an output contract.
  pub fn schema_hint(self) -> &'static str {
    match self {
      QuestionKind::MultipleChoice =>
        r#"{"question": string, "options": [string, string, string, string], "answer": string, "explanation": string}"#,
      QuestionKind::ShortAnswer =>
        r#"{"question": string, "answer": string, "explanation": string, "keywords": [string]}"#,
      QuestionKind::TrueFalse =>
        r#"{"question": string, "answer": boolean, "explanation": string}"#,
      QuestionKind::FillInBlank =>
        r#"{"question": string (use "_____" for the blank), "answer": string, "explanation": string, "blank_word": string}"#,
    }
  }
}

impl Default for QuestionKind {
  fn default() -> Self { QuestionKind::MultipleChoice }
}

impl FromStr for QuestionKind {
  type Err = QnaError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let wanted = s.trim();
    QuestionKind::ALL
      .into_iter()
      .find(|k| k.id() == wanted || k.label().eq_ignore_ascii_case(wanted))
      .ok_or_else(|| QnaError::UnknownQuestionKind(wanted.to_string()))
  }
}

impl<'de> Deserialize<'de> for QuestionKind {
  fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(d)?;
    raw.parse().map_err(serde::de::Error::custom)
  }
}

/// Validated number of questions, always within `[MIN_QUESTIONS, MAX_QUESTIONS]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuestionCount(u8);

impl QuestionCount {
  pub fn get(self) -> u8 { self.0 }
}

impl Default for QuestionCount {
  fn default() -> Self { QuestionCount(DEFAULT_QUESTIONS) }
}

impl TryFrom<i64> for QuestionCount {
  type Error = QnaError;

  fn try_from(n: i64) -> Result<Self, Self::Error> {
    if (MIN_QUESTIONS as i64..=MAX_QUESTIONS as i64).contains(&n) {
      Ok(QuestionCount(n as u8))
    } else {
      Err(QnaError::CountOutOfRange(n))
    }
  }
}

/// One submission's worth of generation parameters.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
  pub source: String,
  pub count: QuestionCount,
  pub kind: QuestionKind,
  pub instructions: Option<String>,
}

impl GenerationRequest {
  /// Validate raw form values. Blank instructions collapse to `None`.
  pub fn new(
    source: impl Into<String>,
    count: i64,
    kind: QuestionKind,
    instructions: Option<String>,
  ) -> Result<Self, QnaError> {
    Ok(Self {
      source: source.into(),
      count: QuestionCount::try_from(count)?,
      kind,
      instructions: instructions.filter(|s| !s.trim().is_empty()),
    })
  }
}

/// Ordered questions as returned by the engine. Items are decoded one at a
/// time, so an off-shape record never costs the rest of the reply.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct QuestionSet {
  #[serde(default, deserialize_with = "records_leniently")]
  pub questions: Vec<QuestionRecord>,
}

impl QuestionSet {
  pub fn len(&self) -> usize { self.questions.len() }
  pub fn is_empty(&self) -> bool { self.questions.is_empty() }
}

/// Loosely-shaped question as decoded from the engine. Which optional fields
/// are present decides how it is displayed (see `QuestionShape`).
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct QuestionRecord {
  #[serde(default, deserialize_with = "question_as_text")]
  pub question: String,
  #[serde(default, deserialize_with = "list_leniently", skip_serializing_if = "Option::is_none")]
  pub options: Option<Vec<String>>,
  #[serde(default, deserialize_with = "list_leniently", skip_serializing_if = "Option::is_none")]
  pub keywords: Option<Vec<String>>,
  #[serde(default, deserialize_with = "as_text", skip_serializing_if = "Option::is_none")]
  pub answer: Option<String>,
  #[serde(default, deserialize_with = "as_text", skip_serializing_if = "Option::is_none")]
  pub explanation: Option<String>,
}

impl QuestionRecord {
  /// Best-effort record from any JSON item; a bare string is taken as the question.
  fn from_value(v: Value) -> Option<Self> {
    match v {
      Value::Null => None,
      obj @ Value::Object(_) => Some(serde_json::from_value(obj).unwrap_or_default()),
      other => Some(QuestionRecord { question: value_text(other).unwrap_or_default(), ..Default::default() }),
    }
  }
}

fn records_leniently<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<QuestionRecord>, D::Error> {
  let items = Option::<Vec<Value>>::deserialize(d)?.unwrap_or_default();
  Ok(items.into_iter().filter_map(QuestionRecord::from_value).collect())
}

// True/False questions come back with a boolean answer.
fn value_text(v: Value) -> Option<String> {
  match v {
    Value::Null => None,
    Value::String(s) => Some(s),
    Value::Bool(b) => Some(if b { "True".into() } else { "False".into() }),
    other => Some(other.to_string()),
  }
}

fn as_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
  Ok(Option::<Value>::deserialize(d)?.and_then(value_text))
}

fn question_as_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
  Ok(as_text(d)?.unwrap_or_default())
}

/// Lists arrive as arrays, as `{"A": .., "B": ..}` maps (values taken in key
/// order) or as one comma-separated string.
fn list_leniently<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<String>>, D::Error> {
  Ok(match Option::<Value>::deserialize(d)? {
    None | Some(Value::Null) => None,
    Some(Value::Array(items)) => Some(items.into_iter().filter_map(value_text).collect()),
    Some(Value::Object(map)) => Some(map.into_iter().filter_map(|(_, v)| value_text(v)).collect()),
    Some(Value::String(s)) => Some(s.split(',').map(str::trim).filter(|p| !p.is_empty()).map(String::from).collect()),
    Some(other) => value_text(other).map(|t| vec![t]),
  })
}

/// The four display shapes a record can take.
#[derive(Clone, Debug, PartialEq)]
pub enum QuestionShape<'a> {
  /// Has `options`.
  MultipleChoice {
    question: &'a str,
    options: &'a [String],
    answer: Option<&'a str>,
    explanation: Option<&'a str>,
  },
  /// Has `keywords` but no `options`.
  Keyworded {
    question: &'a str,
    answer: Option<&'a str>,
    keywords: &'a [String],
  },
  /// Has `answer` only.
  PlainAnswer {
    question: &'a str,
    answer: &'a str,
    explanation: Option<&'a str>,
  },
  /// Nothing but the prompt.
  PromptOnly {
    question: &'a str,
    explanation: Option<&'a str>,
  },
}

impl QuestionRecord {
  /// Classify by field presence, options first, then keywords, then answer.
  /// Blank explanations are folded to `None` here.
  pub fn shape(&self) -> QuestionShape<'_> {
    let question = self.question.as_str();
    let explanation = self.explanation.as_deref().filter(|e| !e.trim().is_empty());
    let answer = self.answer.as_deref();

    if let Some(options) = &self.options {
      QuestionShape::MultipleChoice { question, options, answer, explanation }
    } else if let Some(keywords) = &self.keywords {
      QuestionShape::Keyworded { question, answer, keywords }
    } else if let Some(answer) = answer {
      QuestionShape::PlainAnswer { question, answer, explanation }
    } else {
      QuestionShape::PromptOnly { question, explanation }
    }
  }
}
