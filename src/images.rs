//! Image flow: prompt submission against `/generate_image` and the
//! most-recent-first history of results.

use crate::gateway::{TransportGateway, IMAGE_PATH};
use crate::models::{ImageHistory, ImageModel, ImageRecord, ImageRequest, RequestStatus};
use crate::reply::{self, ReplyFormat};
use crate::{Error, Result};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageState {
    history: ImageHistory,
    current: Option<ImageRecord>,
    model: ImageModel,
    status: RequestStatus,
}

impl ImageState {
    pub fn new(model: ImageModel, history: ImageHistory) -> Self {
        Self {
            history,
            current: None,
            model,
            status: RequestStatus::Idle,
        }
    }

    pub fn history(&self) -> &ImageHistory {
        &self.history
    }

    pub fn current(&self) -> Option<&ImageRecord> {
        self.current.as_ref()
    }

    pub fn model(&self) -> ImageModel {
        self.model
    }

    pub fn status(&self) -> &RequestStatus {
        &self.status
    }

    pub fn request(&self, prompt: &str) -> ImageRequest {
        ImageRequest::new(self.model, prompt)
    }

    pub fn loading(&self) -> Self {
        Self {
            status: RequestStatus::Loading,
            ..self.clone()
        }
    }

    pub fn generated(&self, record: ImageRecord) -> Self {
        let mut history = self.history.clone();
        if let Some(evicted) = history.prepend(record.clone()) {
            tracing::debug!("Image history full, dropped {}", evicted);
        }
        Self {
            history,
            current: Some(record),
            model: self.model,
            status: RequestStatus::Idle,
        }
    }

    pub fn failed(&self, reason: impl Into<String>) -> Self {
        Self {
            status: RequestStatus::Failed(reason.into()),
            ..self.clone()
        }
    }

    pub fn cleared(&self) -> Self {
        let mut history = self.history.clone();
        history.clear();
        Self {
            history,
            ..self.clone()
        }
    }

    /// Display the history entry at `index`; unchanged when out of range.
    pub fn showing(&self, index: usize) -> Self {
        match self.history.get(index) {
            Some(record) => Self {
                current: Some(record.clone()),
                ..self.clone()
            },
            None => self.clone(),
        }
    }

    pub fn with_model(&self, model: ImageModel) -> Self {
        Self {
            model,
            ..self.clone()
        }
    }
}

pub struct ImageGenerationClient {
    gateway: Arc<dyn TransportGateway>,
    reply_format: ReplyFormat,
    state: Mutex<ImageState>,
    updates: watch::Sender<ImageState>,
}

impl ImageGenerationClient {
    pub fn new(gateway: Arc<dyn TransportGateway>, model: ImageModel) -> Self {
        Self::with_history(gateway, model, ImageHistory::new())
    }

    /// Start from a preconfigured (for example bounded) history.
    pub fn with_history(
        gateway: Arc<dyn TransportGateway>,
        model: ImageModel,
        history: ImageHistory,
    ) -> Self {
        let initial = ImageState::new(model, history);
        let (updates, _) = watch::channel(initial.clone());
        Self {
            gateway,
            reply_format: ReplyFormat::default(),
            state: Mutex::new(initial),
            updates,
        }
    }

    pub fn with_reply_format(mut self, reply_format: ReplyFormat) -> Self {
        self.reply_format = reply_format;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<ImageState> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> ImageState {
        self.updates.borrow().clone()
    }

    pub async fn select_model(&self, model: ImageModel) {
        let mut state = self.state.lock().await;
        let next = state.with_model(model);
        self.commit(&mut state, next);
        info!("Image model set to {}", model);
    }

    pub async fn generate(&self, prompt: &str) -> Result<ImageRecord> {
        if prompt.trim().is_empty() {
            return Err(Error::Validation("Prompt must not be empty".to_string()));
        }

        let mut state = self.state.lock().await;
        let request = state.request(prompt);
        let loading = state.loading();
        self.commit(&mut state, loading);

        match self.submit(&request).await {
            Ok(reference) => {
                let record = ImageRecord::from(reference);
                let next = state.generated(record.clone());
                self.commit(&mut state, next);
                info!(
                    "Generated image with {} ({} in history)",
                    request.model,
                    state.history.len()
                );
                Ok(record)
            }
            Err(e) => {
                warn!("Image generation failed: {}", e);
                let next = state.failed(e.to_string());
                self.commit(&mut state, next);
                Err(e)
            }
        }
    }

    pub async fn clear_history(&self) {
        let mut state = self.state.lock().await;
        let next = state.cleared();
        self.commit(&mut state, next);
        info!("Image history cleared");
    }

    /// Make the history entry at `index` the current image.
    pub async fn show(&self, index: usize) -> Option<ImageRecord> {
        let mut state = self.state.lock().await;
        let record = state.history.get(index).cloned()?;
        let next = state.showing(index);
        self.commit(&mut state, next);
        Some(record)
    }

    async fn submit(&self, request: &ImageRequest) -> Result<String> {
        tracing::debug!("Posting image prompt (model: {})", request.model);
        let body = serde_json::to_value(request)?;
        let response = self.gateway.post(IMAGE_PATH, &body).await?;
        reply::decode_image_reference(self.reply_format, &response)
    }

    fn commit(&self, current: &mut ImageState, next: ImageState) {
        *current = next;
        self.updates.send_replace(current.clone());
    }
}
