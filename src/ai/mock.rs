use super::ImageGenerationService;
use crate::models::GenerationRequest;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Scripted outcome for one call to the mock.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Image(Vec<u8>),
    Failure(String),
}

#[derive(Clone)]
pub struct MockInferenceClient {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockInferenceClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_image_response(self, response: Vec<u8>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockResponse::Image(response));
        self
    }

    pub fn with_failure(self, message: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockResponse::Failure(message.into()));
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn get_requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockInferenceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageGenerationService for MockInferenceClient {
    async fn generate_image(&self, request: &GenerationRequest) -> Result<Vec<u8>> {
        *self.call_count.lock().unwrap() += 1;
        self.requests.lock().unwrap().push(request.clone());

        match self.responses.lock().unwrap().pop_front() {
            Some(MockResponse::Image(bytes)) => Ok(bytes),
            Some(MockResponse::Failure(message)) => Err(Error::Transport(message)),
            // Tiny JPEG header when nothing was scripted
            None => Ok(vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46]),
        }
    }
}
