//! Hands a validated request to the engine behind a cached handle.

use tracing::{debug, instrument, warn};

use crate::domain::{GenerationRequest, QuestionSet};
use crate::error::QnaError;
use crate::factory::ClientHandle;
use crate::util::normalize_youtube_url;

/// `Ok(None)` when the source is blank: nothing to do, no engine call.
/// Engine failures surface once, unchanged; there is no local retry.
#[instrument(level = "info", skip(handle, request), fields(model = %handle.model(), count = request.count.get(), kind = request.kind.id()))]
pub async fn generate(handle: &ClientHandle, request: &GenerationRequest) -> Result<Option<QuestionSet>, QnaError> {
  if request.source.trim().is_empty() {
    debug!(target: "dispatch", "Blank source; nothing generated");
    return Ok(None);
  }

  let source = normalize_youtube_url(&request.source);
  let set = handle
    .engine()
    .generate_questions_from_source(&source, request.count.get(), request.kind, request.instructions.as_deref())
    .await?;
  if set.is_empty() {
    warn!(target: "dispatch", "Engine returned no questions");
  }
  Ok(Some(set))
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use async_trait::async_trait;

  use super::*;
  use crate::domain::{Credential, ModelSelector, QuestionKind, QuestionRecord};
  use crate::engine::{testing::FakeEngine, EngineBuilder, QuestionEngine};
  use crate::factory::ClientFactory;

  /// Hands out one pre-built engine so tests can inspect its calls.
  struct Fixed(Arc<FakeEngine>);

  #[async_trait]
  impl EngineBuilder for Fixed {
    async fn build_engine(&self, _: &Credential, _: ModelSelector) -> Result<Arc<dyn QuestionEngine>, QnaError> {
      Ok(self.0.clone())
    }
  }

  async fn handle_for(engine: Arc<FakeEngine>) -> ClientHandle {
    ClientFactory::new(Arc::new(Fixed(engine)))
      .get(&Credential::new("k"), ModelSelector::Gemini20Flash)
      .await
      .expect("ok")
      .expect("handle")
  }

  fn one_question() -> QuestionSet {
    QuestionSet { questions: vec![QuestionRecord { question: "q".into(), ..Default::default() }] }
  }

  #[tokio::test]
  async fn blank_source_makes_no_call() {
    let engine = Arc::new(FakeEngine::replying(one_question()));
    let handle = handle_for(engine.clone()).await;
    let req = GenerationRequest::new("   ", 3, QuestionKind::MultipleChoice, None).expect("req");
    assert!(generate(&handle, &req).await.expect("ok").is_none());
    assert_eq!(engine.call_count(), 0);
  }

  #[tokio::test]
  async fn forwards_normalized_parameters() {
    let engine = Arc::new(FakeEngine::replying(one_question()));
    let handle = handle_for(engine.clone()).await;
    let req = GenerationRequest::new("https://youtu.be/abc123?t=10", 5, QuestionKind::FillInBlank, Some("  ".into())).expect("req");
    let set = generate(&handle, &req).await.expect("ok").expect("set");
    assert_eq!(set.len(), 1);

    let calls = engine.calls.lock().expect("calls");
    assert_eq!(calls.len(), 1);
    let (source, num, kind, instructions) = &calls[0];
    assert_eq!(source, "https://www.youtube.com/watch?v=abc123");
    assert_eq!(*num, 5);
    assert_eq!(*kind, QuestionKind::FillInBlank);
    assert!(instructions.is_none());
  }

  #[tokio::test]
  async fn engine_failure_surfaces_once() {
    let engine = Arc::new(FakeEngine::failing("quota exceeded"));
    let handle = handle_for(engine.clone()).await;
    let req = GenerationRequest::new("https://youtu.be/abc", 2, QuestionKind::ShortAnswer, Some("Focus".into())).expect("req");
    match generate(&handle, &req).await {
      Err(QnaError::GenerationFailed(msg)) => assert_eq!(msg, "quota exceeded"),
      other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(engine.call_count(), 1);
  }

  #[test]
  fn out_of_range_counts_are_rejected_before_dispatch() {
    for n in [0, 6, -1, 100] {
      assert!(matches!(
        GenerationRequest::new("https://youtu.be/abc", n, QuestionKind::TrueFalse, None),
        Err(QnaError::CountOutOfRange(_))
      ));
    }
  }
}
