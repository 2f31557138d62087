use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::corpus::Document;
use crate::embed::provider::EmbeddingProvider;
use crate::embed::{Embedding, cosine_similarity};
use crate::error::Result;

/// A document with its similarity to the query.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}

/// Ranks a fixed document collection against queries by embedding similarity.
///
/// Every query re-scores the whole collection; document embeddings come from
/// the provider's cache after the first query.
pub struct Retriever {
    provider: EmbeddingProvider,
    documents: Vec<Document>,
    pool: Option<rayon::ThreadPool>,
}

impl Retriever {
    pub fn new(provider: EmbeddingProvider, documents: Vec<Document>) -> Self {
        Self {
            provider,
            documents,
            pool: None,
        }
    }

    /// Fetch document embeddings on up to `n` threads. `n <= 1` stays sequential.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.pool = if n > 1 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .thread_name(|i| format!("ragkb-embed-{i}"))
                .build()
            {
                Ok(pool) => Some(pool),
                Err(e) => {
                    warn!(error = %e, "could not build embedding pool, fetching sequentially");
                    None
                }
            }
        } else {
            None
        };
        self
    }

    /// The `top_k` documents most similar to `query`, best first.
    pub fn most_relevant(&self, query: &str, top_k: usize) -> Result<Vec<Document>> {
        Ok(self
            .rank(query, top_k)?
            .into_iter()
            .map(|scored| scored.document)
            .collect())
    }

    /// Like [`Retriever::most_relevant`], keeping the scores.
    ///
    /// Equal scores keep collection order. Any embedding failure fails the
    /// whole call; no partial ranking is ever returned. A blank query ranks
    /// nothing and makes no embedding calls.
    pub fn rank(&self, query: &str, top_k: usize) -> Result<Vec<ScoredDocument>> {
        if top_k == 0 || self.documents.is_empty() || query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.provider.get_embedding(query)?;
        let doc_embeddings = self.document_embeddings()?;

        let mut scored = Vec::with_capacity(self.documents.len());
        for (doc, embedding) in self.documents.iter().zip(&doc_embeddings) {
            let score = cosine_similarity(&query_embedding, embedding)?;
            debug!(id = %doc.id, score, "scored document");
            scored.push(ScoredDocument {
                document: doc.clone(),
                score,
            });
        }

        // sort_by is stable, so ties keep collection order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(top_k);

        info!(
            top_k,
            candidates = self.documents.len(),
            returned = scored.len(),
            "ranked documents"
        );
        Ok(scored)
    }

    /// Embeddings for every document, in collection order.
    fn document_embeddings(&self) -> Result<Vec<Embedding>> {
        let texts: Vec<String> = self.documents.iter().map(Document::composite_text).collect();
        match &self.pool {
            Some(pool) => self.fetch_parallel(pool, &texts),
            None => texts
                .iter()
                .map(|text| self.provider.get_embedding(text))
                .collect(),
        }
    }

    /// Documents sharing a cache key must all get the vector of the first
    /// of them, as they would sequentially. Only that first text is fetched;
    /// the rest reuse its result.
    fn fetch_parallel(
        &self,
        pool: &rayon::ThreadPool,
        texts: &[String],
    ) -> Result<Vec<Embedding>> {
        let cache = self.provider.cache();
        let model = self.provider.default_model();

        let mut leaders: Vec<&str> = Vec::new();
        let mut slot_of_key: HashMap<String, usize> = HashMap::new();
        let slots: Vec<usize> = texts
            .iter()
            .map(|text| {
                *slot_of_key.entry(cache.key(model, text)).or_insert_with(|| {
                    leaders.push(text);
                    leaders.len() - 1
                })
            })
            .collect();

        let fetched: Vec<Embedding> = pool.install(|| {
            leaders
                .par_iter()
                .map(|text| self.provider.get_embedding(text))
                .collect::<Result<Vec<Embedding>>>()
        })?;

        Ok(slots.into_iter().map(|slot| fetched[slot].clone()).collect())
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn provider(&self) -> &EmbeddingProvider {
        &self.provider
    }
}
