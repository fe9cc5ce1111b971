//! Generation lifecycle for one user session.
//!
//! The controller owns the session state (prompt, selected model, phase,
//! last error, current image, history) and is the only path to the remote
//! endpoint. At most one request is in flight; submissions made while one
//! is pending are rejected.

use crate::ai::{ImageGenerationService, InferenceClient};
use crate::export;
use crate::image::{ImageHandle, ImageStore};
use crate::models::{Config, EndpointDescriptor, GenerationRequest, GenerationResult, Phase};
use crate::{Error, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const NO_MODEL_SELECTED: &str = "Please select a model.";
const GENERATION_CANCELLED: &str = "generation cancelled";

/// Everything the UI renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub current_prompt: String,
    pub selected_endpoint: Option<EndpointDescriptor>,
    pub phase: Phase,
    pub last_error: Option<String>,
    pub current_image: Option<ImageHandle>,
    pub history: Vec<GenerationResult>,
}

/// Token for a submission that has been accepted but not yet resolved.
///
/// Pass it to [`GenerationController::complete`] or
/// [`GenerationController::abandon`]. A token dropped without either is
/// treated as abandoned on the next submission.
#[derive(Debug)]
#[must_use = "a pending generation keeps the controller in Loading until it is resolved"]
pub struct PendingGeneration {
    id: Uuid,
    request: GenerationRequest,
    alive: Arc<()>,
}

impl PendingGeneration {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn request(&self) -> &GenerationRequest {
        &self.request
    }
}

#[derive(Debug)]
struct InFlight {
    id: Uuid,
    token: Weak<()>,
}

/// Moves the controller out of `Loading` if a generation future is dropped
/// before it resolves.
struct CancelOnDrop<'a> {
    controller: &'a mut GenerationController,
    armed: bool,
}

impl Drop for CancelOnDrop<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.controller.cancel_in_flight();
        }
    }
}

pub struct GenerationController {
    service: Box<dyn ImageGenerationService>,
    config: Config,
    state: SessionState,
    store: ImageStore,
    in_flight: Option<InFlight>,
}

impl GenerationController {
    /// Build a controller around an explicit service, e.g. a mock.
    pub fn new(config: Config, service: Box<dyn ImageGenerationService>) -> Self {
        Self {
            service,
            config,
            state: SessionState::default(),
            store: ImageStore::new(),
            in_flight: None,
        }
    }

    /// Build a controller talking to the hosted endpoints over HTTPS.
    pub fn from_config(config: Config) -> Self {
        let client =
            InferenceClient::new(config.credential.clone()).with_timeout(config.request_timeout);
        Self::new(config, Box::new(client))
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn history(&self) -> &[GenerationResult] {
        &self.state.history
    }

    pub fn store(&self) -> &ImageStore {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn endpoints(&self) -> &[EndpointDescriptor] {
        &self.config.endpoints
    }

    pub fn select_endpoint(&mut self, endpoint: EndpointDescriptor) {
        debug!("Selected model: {}", endpoint.display_name);
        self.state.selected_endpoint = Some(endpoint);
    }

    /// Select one of the configured endpoints by display name.
    pub fn select_endpoint_by_name(&mut self, name: &str) -> Result<()> {
        let endpoint = self
            .config
            .find_endpoint(name)
            .cloned()
            .ok_or_else(|| Error::Validation(format!("Unknown model: {}", name.trim())))?;
        self.select_endpoint(endpoint);
        Ok(())
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.state.current_prompt = prompt.into();
    }

    /// Validate the current input and move to `Loading`.
    ///
    /// The returned token captures the prompt as it is now; later calls to
    /// [`set_prompt`](Self::set_prompt) do not affect it.
    pub fn begin_submit(&mut self) -> Result<PendingGeneration> {
        if let Some(in_flight) = &self.in_flight {
            if in_flight.token.strong_count() > 0 {
                return Err(Error::ConcurrentSubmission);
            }
            warn!(
                "[{}] Pending generation was dropped without being resolved",
                in_flight.id
            );
            self.cancel_in_flight();
        }

        let Some(endpoint) = self.state.selected_endpoint.clone() else {
            self.state.phase = Phase::Error;
            self.state.last_error = Some(NO_MODEL_SELECTED.to_string());
            info!("Submission rejected: no model selected");
            return Err(Error::Validation(NO_MODEL_SELECTED.to_string()));
        };

        let pending = PendingGeneration {
            id: Uuid::new_v4(),
            request: GenerationRequest {
                prompt: self.state.current_prompt.clone(),
                endpoint,
            },
            alive: Arc::new(()),
        };

        self.in_flight = Some(InFlight {
            id: pending.id,
            token: Arc::downgrade(&pending.alive),
        });
        self.state.phase = Phase::Loading;
        self.state.last_error = None;

        info!(
            "[{}] Generating image with {}",
            pending.id, pending.request.endpoint.display_name
        );
        Ok(pending)
    }

    fn ensure_in_flight(&self, pending: &PendingGeneration) -> Result<()> {
        match &self.in_flight {
            Some(in_flight) if in_flight.id == pending.id => Ok(()),
            _ => Err(Error::Validation(format!(
                "Generation {} is not in progress",
                pending.id
            ))),
        }
    }

    /// Resolve a pending submission with the outcome of the remote call.
    ///
    /// An empty payload from any service counts as a transport failure.
    pub fn complete(
        &mut self,
        pending: PendingGeneration,
        outcome: Result<Vec<u8>>,
    ) -> Result<ImageHandle> {
        self.ensure_in_flight(&pending)?;
        self.in_flight = None;

        let bytes = match outcome {
            Ok(bytes) if bytes.is_empty() => {
                Err(Error::Transport("empty response body".to_string()))
            }
            other => other,
        };

        match bytes {
            Ok(bytes) => {
                let size = bytes.len();
                let handle = self.store.acquire(bytes);

                self.state.current_image = Some(handle);
                self.state.history.push(GenerationResult {
                    prompt: pending.request.prompt,
                    image: handle,
                    created_at: Utc::now(),
                });
                self.enforce_history_limit();
                self.state.phase = Phase::Success;

                info!(
                    "[{}] Generated image ({} bytes), history has {} entr{}",
                    pending.id,
                    size,
                    self.state.history.len(),
                    if self.state.history.len() == 1 { "y" } else { "ies" }
                );
                Ok(handle)
            }
            Err(e) => {
                error!("[{}] Generation failed: {}", pending.id, e);
                self.state.phase = Phase::Error;
                self.state.last_error = Some(format!("Error generating image: {}", e));
                Err(e)
            }
        }
    }

    /// Give up on a pending submission and return to `Error`.
    ///
    /// History and the current image are left as they were.
    pub fn abandon(&mut self, pending: PendingGeneration) -> Result<()> {
        self.ensure_in_flight(&pending)?;
        self.cancel_in_flight();
        Ok(())
    }

    fn cancel_in_flight(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            info!("[{}] Generation cancelled", in_flight.id);
            self.state.phase = Phase::Error;
            self.state.last_error =
                Some(format!("Error generating image: {}", GENERATION_CANCELLED));
        }
    }

    /// Call the endpoint for an accepted submission and record the result.
    ///
    /// Dropping the returned future before it finishes cancels the
    /// submission, leaving the controller in `Error`.
    pub async fn generate(&mut self, pending: PendingGeneration) -> Result<ImageHandle> {
        self.ensure_in_flight(&pending)?;

        let mut guard = CancelOnDrop {
            controller: self,
            armed: true,
        };
        let outcome = guard
            .controller
            .service
            .generate_image(pending.request())
            .await;
        guard.armed = false;
        guard.controller.complete(pending, outcome)
    }

    /// Run one full generation: validate, call the endpoint, record the result.
    ///
    /// Failures are reflected in [`SessionState`] (`phase` and `last_error`)
    /// and also returned so callers can tell them apart.
    pub async fn submit(&mut self) -> Result<ImageHandle> {
        let pending = self.begin_submit()?;
        self.generate(pending).await
    }

    /// Save an image to the configured download directory.
    pub fn download(&self, handle: Option<&ImageHandle>) -> Result<Option<PathBuf>> {
        self.download_to(handle, &self.config.download_dir)
    }

    pub fn download_to(&self, handle: Option<&ImageHandle>, dir: &Path) -> Result<Option<PathBuf>> {
        export::download(&self.store, handle, dir)
    }

    pub fn export_history(&self, path: &Path) -> Result<()> {
        export::export_history_html(&self.state.history, &self.store, path)
    }

    /// Release every image handle and reset the session to `Idle`.
    ///
    /// The selected model and prompt are kept.
    pub fn end_session(&mut self) {
        let released = self.store.release_all();
        self.state.history.clear();
        self.state.current_image = None;
        self.state.last_error = None;
        self.state.phase = Phase::Idle;
        self.in_flight = None;
        info!("Session ended, released {} image(s)", released);
    }

    /// Drop the oldest entries beyond the limit. The newest entry always stays.
    fn enforce_history_limit(&mut self) {
        let Some(limit) = self.config.history_limit else {
            return;
        };

        while self.state.history.len() > limit.get() {
            let evicted = self.state.history.remove(0);
            self.store.release(&evicted.image);
            debug!("Evicted history entry for prompt: {}", evicted.prompt);
        }
    }
}

impl Drop for GenerationController {
    fn drop(&mut self) {
        self.store.release_all();
    }
}
