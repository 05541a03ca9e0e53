use minerva_core::{AppError, HttpConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::retry::{build_client, map_transport_error};

const EMBEDDING_MODEL: &str = "text-embedding-004";

/// HTTP client for Google's Gemini Embeddings API.
///
/// Used to build the embedding similarity index: one vector per resource,
/// computed from its title and description.
///
/// # Examples
///
/// ```no_run
/// use minerva_client::GeminiClient;
/// use minerva_core::HttpConfig;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = GeminiClient::new("your-api-key", &HttpConfig::default())?;
/// let embedding = client.get_embeddings("Introduction to version control").await?;
/// println!("Embedding dimension: {}", embedding.len()); // 768
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    http: HttpConfig,
}

#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    content: Content,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: EmbeddingData,
}

#[derive(Deserialize)]
struct EmbeddingData {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct GeminiErrorBody {
    error: GeminiErrorDetail,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

impl GeminiClient {
    /// Creates a new Gemini client with the specified API key.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ClientError` if the HTTP client cannot be built.
    pub fn new(api_key: &str, http: &HttpConfig) -> Result<Self, AppError> {
        Ok(Self {
            client: build_client(http)?,
            api_key: api_key.to_string(),
            http: http.clone(),
        })
    }

    fn request_body(text: &str) -> EmbeddingRequest {
        EmbeddingRequest {
            model: format!("models/{}", EMBEDDING_MODEL),
            content: Content {
                parts: vec![Part {
                    text: text.replace('\n', " "),
                }],
            },
        }
    }

    /// Generates a text embedding.
    ///
    /// # Errors
    ///
    /// Returns `AppError::GeminiError` for API-level failures (bad key, quota).
    /// Returns `AppError::RateLimitExceeded` on HTTP 429.
    /// Returns `AppError::Timeout`/`NetworkError`/`ClientError` for transport failures.
    pub async fn get_embeddings(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:embedContent",
            EMBEDDING_MODEL
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(text))
            .send()
            .await
            .map_err(|e| map_transport_error(e, &self.http))?;

        let status = response.status();

        if !status.is_success() {
            if status.as_u16() == 429 {
                return Err(AppError::RateLimitExceeded);
            }
            let error_text = response.text().await.unwrap_or_default();
            if let Ok(body) = serde_json::from_str::<GeminiErrorBody>(&error_text) {
                let msg = body.error.message;
                if status.as_u16() == 401 || msg.contains("API key") {
                    return Err(AppError::GeminiError(
                        "401 Unauthorized - Invalid API key".to_string(),
                    ));
                }
                return Err(AppError::GeminiError(msg));
            }
            return Err(AppError::GeminiError(format!("HTTP {}", status)));
        }

        let embedding_response: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::ClientError(format!("Failed to parse response: {}", e)))?;

        if embedding_response.embedding.values.is_empty() {
            return Err(AppError::EmptyResponse);
        }
        Ok(embedding_response.embedding.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_client() {
        assert!(GeminiClient::new("test-api-key", &HttpConfig::default()).is_ok());
    }

    #[test]
    fn test_request_serialization() {
        let request = GeminiClient::request_body("Line 1\nLine 2");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "models/text-embedding-004");
        assert_eq!(json["content"]["parts"][0]["text"], "Line 1 Line 2");
    }

    #[test]
    fn test_response_deserialization() {
        let parsed: EmbeddingResponse =
            serde_json::from_str(r#"{"embedding": {"values": [0.25, -0.5]}}"#).unwrap();
        assert_eq!(parsed.embedding.values, vec![0.25, -0.5]);

        let err: GeminiErrorBody = serde_json::from_str(
            r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#,
        )
        .unwrap();
        assert!(err.error.message.contains("API key"));
    }
}
