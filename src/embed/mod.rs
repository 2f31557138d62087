pub mod cache;
pub mod ollama;
pub mod openai;
pub mod provider;

use crate::error::{RetrievalError, ServiceError};

pub type Embedding = Vec<f32>;

/// A remote (or local) text-embedding backend.
pub trait EmbeddingService: Send + Sync {
    fn embed(&self, text: &str, model: &str) -> Result<Embedding, ServiceError>;
    fn name(&self) -> &str;
}

pub(crate) fn http_error(service: &str, err: ureq::Error) -> ServiceError {
    match err {
        ureq::Error::StatusCode(status) => ServiceError::Status {
            service: service.to_string(),
            status,
        },
        other => ServiceError::Transport {
            service: service.to_string(),
            message: other.to_string(),
        },
    }
}

pub(crate) fn read_body(
    service: &str,
    response: &mut ureq::http::Response<ureq::Body>,
) -> Result<String, ServiceError> {
    response
        .body_mut()
        .read_to_string()
        .map_err(|e| http_error(service, e))
}

/// Cosine similarity of two equal-length vectors.
///
/// A zero-magnitude vector scores 0.0 against everything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, RetrievalError> {
    if a.len() != b.len() {
        return Err(RetrievalError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 { Ok(0.0) } else { Ok(dot / denom) }
}
