//! Hosted inference integration for image generation
//!
//! Provides the interface to Hugging Face style text-to-image endpoints:
//! a JSON prompt goes out, raw image bytes come back.

pub mod client;
pub mod mock;

pub use client::InferenceClient;
pub use mock::{MockInferenceClient, MockResponse};

use crate::models::GenerationRequest;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ImageGenerationService: Send + Sync {
    async fn generate_image(&self, request: &GenerationRequest) -> Result<Vec<u8>>;
}
