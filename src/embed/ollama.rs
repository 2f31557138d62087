use serde::Deserialize;
use tracing::debug;

use super::{Embedding, EmbeddingService, http_error, read_body};
use crate::error::ServiceError;

const SERVICE: &str = "ollama";

pub struct OllamaService {
    base_url: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaService {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/embeddings", self.base_url)
    }
}

fn parse_response(body: &str) -> Result<Embedding, ServiceError> {
    let resp: EmbeddingResponse =
        serde_json::from_str(body).map_err(|e| ServiceError::InvalidResponse {
            service: SERVICE.into(),
            message: e.to_string(),
        })?;
    if resp.embedding.is_empty() {
        return Err(ServiceError::InvalidResponse {
            service: SERVICE.into(),
            message: "empty embedding".into(),
        });
    }
    Ok(resp.embedding)
}

impl EmbeddingService for OllamaService {
    fn embed(&self, text: &str, model: &str) -> Result<Embedding, ServiceError> {
        let body = serde_json::json!({
            "model": model,
            "prompt": text,
        });
        debug!(model, url = %self.endpoint(), "requesting ollama embedding");

        let mut response = ureq::post(&self.endpoint())
            .send_json(&body)
            .map_err(|e| http_error(SERVICE, e))?;
        let text = read_body(SERVICE, &mut response)?;
        parse_response(&text)
    }

    fn name(&self) -> &str {
        SERVICE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let service = OllamaService::new("http://localhost:11434/");
        assert_eq!(service.endpoint(), "http://localhost:11434/api/embeddings");
    }

    #[test]
    fn parses_embedding_field() {
        let v = parse_response(r#"{"embedding":[0.5,-0.25]}"#).unwrap();
        assert_eq!(v, vec![0.5, -0.25]);
    }

    #[test]
    fn rejects_empty_or_malformed_bodies() {
        assert!(matches!(
            parse_response(r#"{"embedding":[]}"#),
            Err(ServiceError::InvalidResponse { .. })
        ));
        assert!(matches!(
            parse_response("not json"),
            Err(ServiceError::InvalidResponse { .. })
        ));
    }
}
