//! Data models and structures
//!
//! Defines endpoint descriptors, request/response shapes for the hosted
//! inference API, generation history entries and the injected configuration.

use crate::image::ImageHandle;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One selectable image-generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDescriptor {
    #[serde(rename = "name")]
    pub display_name: String,
    pub url: String,
}

impl EndpointDescriptor {
    pub fn new(display_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            url: url.into(),
        }
    }
}

/// The three hosted models offered out of the box, in menu order.
pub fn default_endpoints() -> Vec<EndpointDescriptor> {
    vec![
        EndpointDescriptor::new(
            "Flux",
            "https://api-inference.huggingface.co/models/black-forest-labs/FLUX.1-dev",
        ),
        EndpointDescriptor::new(
            "Diffusion V-4",
            "https://api-inference.huggingface.co/models/CompVis/stable-diffusion-v1-4",
        ),
        EndpointDescriptor::new(
            "Diffusion XL Base",
            "https://api-inference.huggingface.co/models/stabilityai/stable-diffusion-xl-base-1.0",
        ),
    ]
}

/// Load an endpoint list from a JSON file of `[{"name": ..., "url": ...}]`.
pub fn load_endpoints(path: &Path) -> Result<Vec<EndpointDescriptor>> {
    let json = std::fs::read_to_string(path)?;
    let endpoints: Vec<EndpointDescriptor> = serde_json::from_str(&json)?;
    validate_endpoints(&endpoints)?;
    Ok(endpoints)
}

fn validate_endpoints(endpoints: &[EndpointDescriptor]) -> Result<()> {
    if endpoints.is_empty() {
        return Err(Error::Config("endpoint list is empty".to_string()));
    }

    let mut seen = HashSet::new();
    for endpoint in endpoints {
        if !seen.insert(endpoint.url.as_str()) {
            return Err(Error::Config(format!(
                "duplicate endpoint url: {}",
                endpoint.url
            )));
        }
    }
    Ok(())
}

/// A single submission: the prompt captured at submit time and its target.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub endpoint: EndpointDescriptor,
}

impl GenerationRequest {
    pub fn body(&self) -> InferenceRequest<'_> {
        InferenceRequest {
            inputs: &self.prompt,
        }
    }
}

/// Wire body for the hosted inference API.
#[derive(Debug, Serialize)]
pub struct InferenceRequest<'a> {
    pub inputs: &'a str,
}

/// One completed generation as kept in the session history.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub prompt: String,
    pub image: ImageHandle,
    pub created_at: DateTime<Utc>,
}

/// Controller lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Error,
    Success,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub endpoints: Vec<EndpointDescriptor>,
    pub credential: String,
    pub download_dir: PathBuf,
    pub history_limit: Option<NonZeroUsize>,
    pub request_timeout: Option<Duration>,
}

impl Config {
    pub fn new(endpoints: Vec<EndpointDescriptor>, credential: String) -> Self {
        Self {
            endpoints,
            credential,
            download_dir: PathBuf::from("."),
            history_limit: None,
            request_timeout: None,
        }
    }

    pub fn with_download_dir(mut self, dir: PathBuf) -> Self {
        self.download_dir = dir;
        self
    }

    pub fn with_history_limit(mut self, limit: NonZeroUsize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_endpoints(mut self, endpoints: Vec<EndpointDescriptor>) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e.into());
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credential = lookup("HF_API_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| Error::Config("HF_API_TOKEN not set".to_string()))?;

        let mut config = Self::new(default_endpoints(), credential);

        if let Some(dir) = lookup("DOWNLOAD_DIR") {
            config.download_dir = PathBuf::from(dir);
        }

        if let Some(raw) = lookup("HISTORY_LIMIT") {
            let limit: NonZeroUsize = raw.parse().map_err(|_| {
                Error::Config(format!(
                    "HISTORY_LIMIT must be a positive integer, got '{}'",
                    raw
                ))
            })?;
            config.history_limit = Some(limit);
        }

        if let Some(raw) = lookup("REQUEST_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().map_err(|_| {
                Error::Config(format!(
                    "REQUEST_TIMEOUT_SECS must be a number of seconds, got '{}'",
                    raw
                ))
            })?;
            config.request_timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Case-insensitive lookup by display name.
    pub fn find_endpoint(&self, name: &str) -> Option<&EndpointDescriptor> {
        self.endpoints
            .iter()
            .find(|e| e.display_name.eq_ignore_ascii_case(name.trim()))
    }
}
