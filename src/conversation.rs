//! Chat flow: transcript accumulation against the `/generate_chat` endpoint.
//!
//! [`ConversationState`] is an immutable value; every transition returns a
//! new state. [`ConversationClient`] owns the current state and performs one
//! backend call per operation, holding its writer lock for the whole call so
//! concurrent operations apply one after another.

use crate::gateway::{TransportGateway, CHAT_PATH};
use crate::models::{ChatModel, ChatRequest, Message, RequestStatus, Transcript};
use crate::reply::{self, ReplyFormat};
use crate::{prompts, Error, Result};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{info, warn};

/// Model used for the bootstrap call, independent of the user's selection.
pub const BOOTSTRAP_MODEL: ChatModel = ChatModel::Gpt35Turbo;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationState {
    transcript: Transcript,
    model: ChatModel,
    status: RequestStatus,
}

impl ConversationState {
    pub fn new(model: ChatModel) -> Self {
        Self {
            transcript: Transcript::new(),
            model,
            status: RequestStatus::Idle,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn model(&self) -> ChatModel {
        self.model
    }

    pub fn status(&self) -> &RequestStatus {
        &self.status
    }

    /// Request carrying only the system prompt.
    pub fn bootstrap_request(&self) -> ChatRequest {
        ChatRequest {
            model: BOOTSTRAP_MODEL,
            messages: vec![Message::system(prompts::CHAT_SYSTEM).to_wire()],
        }
    }

    /// Request carrying the whole transcript followed by `user`.
    pub fn send_request(&self, user: &Message) -> ChatRequest {
        let mut messages = self.transcript.to_wire();
        messages.push(user.to_wire());
        ChatRequest {
            model: self.model,
            messages,
        }
    }

    pub fn loading(&self) -> Self {
        Self {
            status: RequestStatus::Loading,
            ..self.clone()
        }
    }

    /// The bootstrap reply replaces the transcript; the system prompt is not kept.
    pub fn bootstrapped(&self, reply: Message) -> Self {
        Self {
            transcript: Transcript::from(vec![reply]),
            model: self.model,
            status: RequestStatus::Idle,
        }
    }

    pub fn exchanged(&self, user: Message, reply: Message) -> Self {
        let mut transcript = self.transcript.clone();
        transcript.push(user);
        transcript.push(reply);
        Self {
            transcript,
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

    pub fn with_model(&self, model: ChatModel) -> Self {
        Self {
            model,
            ..self.clone()
        }
    }
}

pub struct ConversationClient {
    gateway: Arc<dyn TransportGateway>,
    reply_format: ReplyFormat,
    state: Mutex<ConversationState>,
    updates: watch::Sender<ConversationState>,
}

impl ConversationClient {
    pub fn new(gateway: Arc<dyn TransportGateway>, model: ChatModel) -> Self {
        let initial = ConversationState::new(model);
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

    /// Receiver notified after every state change.
    pub fn subscribe(&self) -> watch::Receiver<ConversationState> {
        self.updates.subscribe()
    }

    /// Latest published state. Does not wait for an in-flight call.
    pub fn snapshot(&self) -> ConversationState {
        self.updates.borrow().clone()
    }

    pub fn transcript(&self) -> Transcript {
        self.updates.borrow().transcript.clone()
    }

    pub async fn select_model(&self, model: ChatModel) {
        let mut state = self.state.lock().await;
        let next = state.with_model(model);
        self.commit(&mut state, next);
        info!("Chat model set to {}", model);
    }

    /// Seed the conversation with the assistant's answer to the system prompt.
    pub async fn initialize(&self) -> Result<Message> {
        let mut state = self.state.lock().await;
        let request = state.bootstrap_request();
        let loading = state.loading();
        self.commit(&mut state, loading);

        match self.exchange(&request).await {
            Ok(text) => {
                let reply = Message::assistant(text);
                let next = state.bootstrapped(reply.clone());
                self.commit(&mut state, next);
                info!("Conversation bootstrapped");
                Ok(reply)
            }
            Err(e) => {
                warn!("Bootstrap chat request failed: {}", e);
                let next = state.failed(e.to_string());
                self.commit(&mut state, next);
                Err(e)
            }
        }
    }

    /// Send `content` with the current transcript and record both sides of
    /// the exchange. The transcript is untouched when the call fails.
    pub async fn send_message(&self, content: &str) -> Result<Message> {
        if content.trim().is_empty() {
            return Err(Error::Validation("Message must not be empty".to_string()));
        }

        let mut state = self.state.lock().await;
        let user = Message::user(content);
        let request = state.send_request(&user);
        let loading = state.loading();
        self.commit(&mut state, loading);

        match self.exchange(&request).await {
            Ok(text) => {
                let reply = Message::assistant(text);
                let next = state.exchanged(user, reply.clone());
                self.commit(&mut state, next);
                info!(
                    "Chat exchange complete ({} messages in transcript)",
                    state.transcript.len()
                );
                Ok(reply)
            }
            Err(e) => {
                warn!("Chat request failed: {}", e);
                let next = state.failed(e.to_string());
                self.commit(&mut state, next);
                Err(e)
            }
        }
    }

    async fn exchange(&self, request: &ChatRequest) -> Result<String> {
        tracing::debug!(
            "Posting {} messages to chat endpoint (model: {})",
            request.messages.len(),
            request.model
        );
        let body = serde_json::to_value(request)?;
        let response = self.gateway.post(CHAT_PATH, &body).await?;
        reply::decode_chat_reply(self.reply_format, &response)
    }

    fn commit(&self, current: &mut ConversationState, next: ConversationState) {
        *current = next;
        self.updates.send_replace(current.clone());
    }
}
