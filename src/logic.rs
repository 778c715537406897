//! One form submission, end to end: parse the selections, fetch or build the
//! engine handle, dispatch, render.

use tracing::{info, instrument};
use uuid::Uuid;

use crate::dispatch::generate;
use crate::domain::{Credential, GenerationRequest, ModelSelector, QuestionKind};
use crate::error::QnaError;
use crate::protocol::{GenerateIn, GenerateOut};
use crate::render::{render, render_text};
use crate::state::AppState;

#[instrument(
    level = "info",
    skip(state, input),
    fields(url_len = input.url.len(), num = input.num, has_instructions = input.custom_instructions.is_some())
)]
pub async fn handle_generate(state: &AppState, input: GenerateIn) -> Result<GenerateOut, QnaError> {
    let model = match input.model.as_deref().filter(|m| !m.trim().is_empty()) {
        Some(m) => m.parse::<ModelSelector>()?,
        None => state.config.default_model,
    };
    let kind = match input.question_type.as_deref().filter(|k| !k.trim().is_empty()) {
        Some(k) => k.parse::<QuestionKind>()?,
        None => QuestionKind::default(),
    };
    let request = GenerationRequest::new(input.url, input.num, kind, input.custom_instructions)?;

    let credential = Credential::new(input.api_key);
    let handle = state
        .clients
        .get(&credential, model)
        .await?
        .ok_or(QnaError::MissingCredential)?;

    let request_id = Uuid::new_v4().to_string();
    let set = generate(&handle, &request).await?;
    let blocks: Vec<_> = render(set.as_ref()).collect();
    info!(target: "tubequiz_backend", %request_id, %model, kind = kind.id(), blocks = blocks.len(), "Questions rendered");

    Ok(GenerateOut {
        request_id,
        model: model.as_str().to_string(),
        question_type: kind.label().to_string(),
        text: render_text(blocks.iter().cloned()),
        blocks,
    })
}
