use std::sync::Arc;

use tracing::debug;

use super::cache::EmbeddingCache;
use super::{Embedding, EmbeddingService};
use crate::error::Result;

/// Memoizing front for an [`EmbeddingService`].
///
/// The cache is injected so tests and separate model namespaces can each
/// own one. The cache lock is never held while the service is called, so two
/// concurrent misses on one key may both call out; only the first result is
/// kept and both callers get it.
#[derive(Clone)]
pub struct EmbeddingProvider {
    service: Arc<dyn EmbeddingService>,
    cache: Arc<EmbeddingCache>,
    default_model: String,
}

impl EmbeddingProvider {
    pub fn new(
        service: Arc<dyn EmbeddingService>,
        cache: Arc<EmbeddingCache>,
        default_model: impl Into<String>,
    ) -> Self {
        Self {
            service,
            cache,
            default_model: default_model.into(),
        }
    }

    pub fn get_embedding(&self, text: &str) -> Result<Embedding> {
        self.get_embedding_with_model(text, &self.default_model)
    }

    pub fn get_embedding_with_model(&self, text: &str, model: &str) -> Result<Embedding> {
        if let Some(hit) = self.cache.get(model, text) {
            debug!(model, chars = text.chars().count(), "embedding cache hit");
            return Ok(hit);
        }

        debug!(
            model,
            service = self.service.name(),
            chars = text.chars().count(),
            "embedding cache miss"
        );
        let fresh = self.service.embed(text, model)?;
        Ok(self.cache.insert(model, text, fresh))
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }
}
