//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use tracing::{field, info, instrument, Span};

use crate::domain::{ModelSelector, QuestionKind};
use crate::error::QnaError;
use crate::logic::handle_generate;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthOut { ok: true, cached_clients: state.clients.cached_len().await })
}

#[instrument(level = "debug", skip(state))]
pub async fn http_get_models(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let models = ModelSelector::ALL
        .into_iter()
        .map(|m| ChoiceOut { id: m.as_str(), label: m.label() })
        .collect();
    Json(ModelsOut { default: state.config.default_model.as_str(), models })
}

#[instrument(level = "debug")]
pub async fn http_get_question_types() -> impl IntoResponse {
    let question_types = QuestionKind::ALL
        .into_iter()
        .map(|k| ChoiceOut { id: k.id(), label: k.label() })
        .collect();
    Json(QuestionTypesOut { question_types })
}

#[instrument(level = "info", skip(state, payload), fields(model = field::Empty, num = field::Empty))]
pub async fn http_post_generate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateIn>, JsonRejection>,
) -> Result<Json<GenerateOut>, QnaError> {
    let Json(body) = payload?;
    let span = Span::current();
    span.record("model", body.model.as_deref().unwrap_or("default"));
    span.record("num", body.num);
    let out = handle_generate(&state, body).await?;
    info!(target: "tubequiz_backend", request_id = %out.request_id, blocks = out.blocks.len(), "HTTP generate served");
    Ok(Json(out))
}
