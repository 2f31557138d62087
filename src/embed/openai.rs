use serde::Deserialize;
use tracing::debug;

use super::{Embedding, EmbeddingService, http_error, read_body};
use crate::error::ServiceError;

const SERVICE: &str = "openai";

pub const DEFAULT_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_KEY_ENV: &str = "OPENAI_API_KEY";

/// OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAiService {
    base_url: String,
    api_key: Option<String>,
    key_env: String,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiService {
    /// Reads the API key from `key_env` once, at construction.
    pub fn from_env(base_url: &str, key_env: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: std::env::var(key_env).ok().filter(|k| !k.is_empty()),
            key_env: key_env.to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }
}

fn parse_response(body: &str) -> Result<Embedding, ServiceError> {
    let resp: EmbeddingsResponse =
        serde_json::from_str(body).map_err(|e| ServiceError::InvalidResponse {
            service: SERVICE.into(),
            message: e.to_string(),
        })?;
    resp.data
        .into_iter()
        .next()
        .map(|d| d.embedding)
        .ok_or_else(|| ServiceError::InvalidResponse {
            service: SERVICE.into(),
            message: "no embedding in response".into(),
        })
}

impl EmbeddingService for OpenAiService {
    fn embed(&self, text: &str, model: &str) -> Result<Embedding, ServiceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ServiceError::NotConfigured {
                service: SERVICE.into(),
                reason: format!("{} is not set", self.key_env),
            })?;

        let body = serde_json::json!({
            "model": model,
            "input": text,
        });
        debug!(model, url = %self.endpoint(), "requesting openai embedding");

        let mut response = ureq::post(&self.endpoint())
            .header("Authorization", format!("Bearer {api_key}"))
            .send_json(&body)
            .map_err(|e| http_error(SERVICE, e))?;
        let text = read_body(SERVICE, &mut response)?;
        parse_response(&text)
    }

    fn name(&self) -> &str {
        SERVICE
    }
}
