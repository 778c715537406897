//! Memoizing factory for engine handles, keyed by (credential, model).
//!
//! At most one handle is built per distinct key for the lifetime of the
//! factory. Each key owns a slot; only callers of the same key wait on a
//! construction in flight. Failed constructions leave the slot empty, so a
//! corrected key (or a retry of the same one) gets a fresh attempt.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, instrument, warn};

use crate::domain::{Credential, ModelSelector};
use crate::engine::{EngineBuilder, QuestionEngine};
use crate::error::QnaError;

/// Shared, reusable connection to the engine for one (credential, model) pair.
#[derive(Clone)]
pub struct ClientHandle {
    engine: Arc<dyn QuestionEngine>,
    model: ModelSelector,
}

impl ClientHandle {
    pub fn engine(&self) -> &dyn QuestionEngine {
        self.engine.as_ref()
    }

    pub fn model(&self) -> ModelSelector {
        self.model
    }

    /// True when both handles point at the same cached engine instance.
    #[cfg(test)]
    pub fn same_instance(&self, other: &ClientHandle) -> bool {
        Arc::ptr_eq(&self.engine, &other.engine)
    }
}

type Slot = Arc<OnceCell<ClientHandle>>;

pub struct ClientFactory {
    builder: Arc<dyn EngineBuilder>,
    slots: Mutex<HashMap<(Credential, ModelSelector), Slot>>,
}

impl ClientFactory {
    pub fn new(builder: Arc<dyn EngineBuilder>) -> Self {
        Self { builder, slots: Mutex::new(HashMap::new()) }
    }

    /// `Ok(None)` for a blank credential: not configured yet, nothing attempted.
    /// The map lock only covers the slot lookup; construction runs on the
    /// slot, so unrelated keys and `cached_len` never wait on the network.
    #[instrument(level = "info", skip(self, credential))]
    pub async fn get(
        &self,
        credential: &Credential,
        model: ModelSelector,
    ) -> Result<Option<ClientHandle>, QnaError> {
        if credential.is_blank() {
            debug!(target: "factory", "No credential supplied; skipping engine construction");
            return Ok(None);
        }

        let slot = {
            let mut slots = self.slots.lock().await;
            slots.entry((credential.clone(), model)).or_default().clone()
        };
        if let Some(handle) = slot.get() {
            debug!(target: "factory", "Reusing cached engine");
            return Ok(Some(handle.clone()));
        }

        let handle = slot
            .get_or_try_init(|| async {
                let engine = self.builder.build_engine(credential, model).await?;
                info!(target: "factory", "Engine constructed and cached");
                Ok::<_, QnaError>(ClientHandle { engine, model })
            })
            .await
            .map_err(|e| {
                warn!(target: "factory", error = %e, "Engine construction failed; nothing cached");
                e
            })?;
        Ok(Some(handle.clone()))
    }

    /// Number of keys with a constructed handle.
    pub async fn cached_len(&self) -> usize {
        self.slots.lock().await.values().filter(|s| s.initialized()).count()
    }
}
