use super::ImageGenerationService;
use crate::models::GenerationRequest;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;

/// reqwest-backed client for hosted text-to-image endpoints.
pub struct InferenceClient {
    client: Client,
    credential: String,
    timeout: Option<Duration>,
}

impl InferenceClient {
    pub fn new(credential: String) -> Self {
        Self::new_with_client(credential, Client::new())
    }

    pub fn new_with_client(credential: String, client: Client) -> Self {
        Self {
            client,
            credential,
            timeout: None,
        }
    }

    /// Requests run until completion unless a timeout is set here.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ImageGenerationService for InferenceClient {
    async fn generate_image(&self, request: &GenerationRequest) -> Result<Vec<u8>> {
        tracing::debug!(
            "Sending image generation request to {} ({})",
            request.endpoint.display_name,
            request.endpoint.url
        );

        let mut builder = self
            .client
            .post(&request.endpoint.url)
            .header(AUTHORIZATION, format!("Bearer {}", self.credential))
            .header(CONTENT_TYPE, "application/json")
            .json(&request.body());

        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!(
                "Failed to send request to {}: {}",
                request.endpoint.display_name,
                e
            );
            e
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(
                "{} API error (status {}): {}",
                request.endpoint.display_name,
                status,
                error_text
            );
            return Err(Error::Transport(format!(
                "API error (status {}): {}",
                status, error_text
            )));
        }

        let bytes = response.bytes().await?;
        tracing::debug!(
            "Received {} bytes from {}",
            bytes.len(),
            request.endpoint.display_name
        );
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EndpointDescriptor;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request_for(server: &MockServer, prompt: &str) -> GenerationRequest {
        GenerationRequest {
            prompt: prompt.to_string(),
            endpoint: EndpointDescriptor::new("Flux", format!("{}/models/flux", server.uri())),
        }
    }

    #[tokio::test]
    async fn test_generate_image_returns_raw_bytes() {
        let server = MockServer::start().await;
        let fake_image = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

        Mock::given(method("POST"))
            .and(path("/models/flux"))
            .and(header("Authorization", "Bearer hf_test"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(serde_json::json!({ "inputs": "a red bicycle" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Type", "image/png")
                    .set_body_bytes(fake_image.clone()),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = InferenceClient::new("hf_test".to_string());
        let result = client
            .generate_image(&request_for(&server, "a red bicycle"))
            .await
            .unwrap();
        assert_eq!(result, fake_image);
    }

    #[tokio::test]
    async fn test_generate_image_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/flux"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model overloaded"))
            .mount(&server)
            .await;

        let client = InferenceClient::new("hf_test".to_string());
        let err = client
            .generate_image(&request_for(&server, "x"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transport(_)));
        let message = err.to_string();
        assert!(message.contains("500"));
        assert!(message.contains("model overloaded"));
    }

    #[tokio::test]
    async fn test_generate_image_passes_empty_body_through() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/flux"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = InferenceClient::new("hf_test".to_string());
        let bytes = client
            .generate_image(&request_for(&server, "x"))
            .await
            .unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_generate_image_connection_failure() {
        let request = GenerationRequest {
            prompt: "x".to_string(),
            endpoint: EndpointDescriptor::new("Nowhere", "http://127.0.0.1:9/models/none"),
        };

        let client = InferenceClient::new("hf_test".to_string());
        let err = client.generate_image(&request).await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_generate_image_respects_timeout() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(vec![1, 2, 3])
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = InferenceClient::new("hf_test".to_string())
            .with_timeout(Some(Duration::from_millis(100)));
        let err = client
            .generate_image(&request_for(&server, "slow"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }
}
