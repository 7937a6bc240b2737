//! Presentation-facing entry point owning both clients.
//!
//! A front end turns user input into [`Action`]s and renders the returned
//! [`Outcome`] together with the client snapshots.

use crate::config::Config;
use crate::conversation::ConversationClient;
use crate::gateway::{HttpGateway, TransportGateway};
use crate::images::ImageGenerationClient;
use crate::models::{ChatModel, ImageHistory, ImageModel, ImageRecord, Message};
use crate::Result;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Bootstrap,
    SendMessage(String),
    SelectChatModel(ChatModel),
    GenerateImage(String),
    SelectImageModel(ImageModel),
    ClearHistory,
    ShowImage(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Reply(Message),
    Image(ImageRecord),
    ChatModelSelected(ChatModel),
    ImageModelSelected(ImageModel),
    HistoryCleared,
    Shown(Option<ImageRecord>),
}

pub struct App {
    chat: ConversationClient,
    images: ImageGenerationClient,
}

impl App {
    /// Construct an app talking to the configured backend over HTTP.
    pub fn new(config: &Config) -> Result<Self> {
        let gateway = HttpGateway::new(config.backend_url.clone(), config.request_timeout)?;
        info!("Backend: {}", gateway.base_url());
        Self::with_gateway(Arc::new(gateway), config)
    }

    /// Build an app on top of any gateway. Both clients share it.
    pub fn with_gateway(gateway: Arc<dyn TransportGateway>, config: &Config) -> Result<Self> {
        let history = match config.image_history_capacity {
            Some(capacity) => ImageHistory::bounded(capacity)?,
            None => ImageHistory::new(),
        };

        let chat = ConversationClient::new(Arc::clone(&gateway), config.chat_model)
            .with_reply_format(config.reply_format);
        let images = ImageGenerationClient::with_history(gateway, config.image_model, history)
            .with_reply_format(config.reply_format);

        Ok(Self { chat, images })
    }

    pub fn chat(&self) -> &ConversationClient {
        &self.chat
    }

    pub fn images(&self) -> &ImageGenerationClient {
        &self.images
    }

    pub async fn dispatch(&self, action: Action) -> Result<Outcome> {
        match action {
            Action::Bootstrap => self.chat.initialize().await.map(Outcome::Reply),
            Action::SendMessage(content) => {
                self.chat.send_message(&content).await.map(Outcome::Reply)
            }
            Action::SelectChatModel(model) => {
                self.chat.select_model(model).await;
                Ok(Outcome::ChatModelSelected(model))
            }
            Action::GenerateImage(prompt) => {
                self.images.generate(&prompt).await.map(Outcome::Image)
            }
            Action::SelectImageModel(model) => {
                self.images.select_model(model).await;
                Ok(Outcome::ImageModelSelected(model))
            }
            Action::ClearHistory => {
                self.images.clear_history().await;
                Ok(Outcome::HistoryCleared)
            }
            Action::ShowImage(index) => Ok(Outcome::Shown(self.images.show(index).await)),
        }
    }
}
