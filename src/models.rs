//! Data models and structures
//!
//! Defines the conversation and image-history types owned by the clients,
//! the model allow-lists, and the request payloads sent to the backend.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

pub const IMAGE_SIZE: &str = "1024x1024";
pub const IMAGE_QUALITY: &str = "standard";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(Error::Validation(format!("Unknown role '{}'", other))),
        }
    }
}

/// A single chat message. Fields are private so a message cannot change
/// after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: Uuid,
    role: Role,
    content: String,
    created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn to_wire(&self) -> WireMessage {
        WireMessage {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// Ordered conversation history. Insertion order is the order sent to the
/// backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn to_wire(&self) -> Vec<WireMessage> {
        self.messages.iter().map(Message::to_wire).collect()
    }

    /// Rebuild a transcript from wire pairs. Ids and timestamps are fresh.
    pub fn from_wire(pairs: Vec<WireMessage>) -> Self {
        Self {
            messages: pairs
                .into_iter()
                .map(|pair| Message::new(pair.role, pair.content))
                .collect(),
        }
    }
}

impl From<Vec<Message>> for Transcript {
    fn from(messages: Vec<Message>) -> Self {
        Self { messages }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChatModel {
    #[default]
    #[serde(rename = "gpt-4-turbo")]
    Gpt4Turbo,
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
}

impl ChatModel {
    pub const ALL: [ChatModel; 2] = [ChatModel::Gpt4Turbo, ChatModel::Gpt35Turbo];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatModel::Gpt4Turbo => "gpt-4-turbo",
            ChatModel::Gpt35Turbo => "gpt-3.5-turbo",
        }
    }
}

impl fmt::Display for ChatModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|model| model.as_str() == s)
            .ok_or_else(|| {
                Error::Validation(format!(
                    "Unsupported chat model '{}' (expected one of: {})",
                    s,
                    allow_list(&Self::ALL.map(|m| m.as_str()))
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ImageModel {
    #[default]
    #[serde(rename = "dall-e-3")]
    DallE3,
    #[serde(rename = "dall-e-2")]
    DallE2,
}

impl ImageModel {
    pub const ALL: [ImageModel; 2] = [ImageModel::DallE3, ImageModel::DallE2];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageModel::DallE3 => "dall-e-3",
            ImageModel::DallE2 => "dall-e-2",
        }
    }
}

impl fmt::Display for ImageModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageModel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|model| model.as_str() == s)
            .ok_or_else(|| {
                Error::Validation(format!(
                    "Unsupported image model '{}' (expected one of: {})",
                    s,
                    allow_list(&Self::ALL.map(|m| m.as_str()))
                ))
            })
    }
}

fn allow_list(names: &[&str]) -> String {
    names.join(", ")
}

/// Reference to a generated image: a URL, or a `data:` URL for inline
/// payloads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRecord(String);

impl ImageRecord {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ImageRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ImageRecord {
    fn from(reference: String) -> Self {
        Self(reference)
    }
}

impl From<&str> for ImageRecord {
    fn from(reference: &str) -> Self {
        Self(reference.to_string())
    }
}

/// Most-recent-first list of generated images.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageHistory {
    records: VecDeque<ImageRecord>,
    capacity: Option<usize>,
}

impl ImageHistory {
    /// History without a size limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// History that keeps at most `capacity` entries, dropping the oldest.
    pub fn bounded(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::Validation(
                "Image history capacity must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            records: VecDeque::with_capacity(capacity),
            capacity: Some(capacity),
        })
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// Insert at the front. Returns the evicted entry when the history is
    /// bounded and already full.
    pub fn prepend(&mut self, record: ImageRecord) -> Option<ImageRecord> {
        self.records.push_front(record);
        match self.capacity {
            Some(cap) if self.records.len() > cap => self.records.pop_back(),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ImageRecord> {
        self.records.get(index)
    }

    pub fn first(&self) -> Option<&ImageRecord> {
        self.records.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageRecord> {
        self.records.iter()
    }

    pub fn to_vec(&self) -> Vec<ImageRecord> {
        self.records.iter().cloned().collect()
    }
}

/// Progress of the most recent backend call made by a client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestStatus {
    #[default]
    Idle,
    Loading,
    Failed(String),
}

impl RequestStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestStatus::Loading)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RequestStatus::Failed(_))
    }
}

// Backend request payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: ChatModel,
    pub messages: Vec<WireMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRequest {
    pub model: ImageModel,
    pub prompt: String,
    pub size: String,
    pub quality: String,
    pub n: u32,
}

impl ImageRequest {
    pub fn new(model: ImageModel, prompt: impl Into<String>) -> Self {
        Self {
            model,
            prompt: prompt.into(),
            size: IMAGE_SIZE.to_string(),
            quality: IMAGE_QUALITY.to_string(),
            n: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");

        let role: Role = serde_json::from_str("\"system\"").unwrap();
        assert_eq!(role, Role::System);
        assert!("moderator".parse::<Role>().is_err());
    }

    #[test]
    fn test_messages_get_unique_ids() {
        let a = Message::user("hi");
        let b = Message::user("hi");
        assert_ne!(a.id(), b.id());
        assert_eq!(a.content(), b.content());
    }

    #[test]
    fn test_transcript_wire_round_trip() {
        let transcripts = vec![
            Transcript::new(),
            Transcript::from(vec![Message::assistant("Hello! How can I help?")]),
            Transcript::from(vec![
                Message::system("be brief"),
                Message::user("What is 2+2?"),
                Message::assistant("4"),
                Message::user("  padded \"quoted\" text\n"),
                Message::assistant(""),
            ]),
        ];

        for transcript in transcripts {
            let json = serde_json::to_string(&transcript.to_wire()).unwrap();
            let pairs: Vec<WireMessage> = serde_json::from_str(&json).unwrap();
            let rebuilt = Transcript::from_wire(pairs);

            assert_eq!(rebuilt.len(), transcript.len());
            for (original, copy) in transcript.iter().zip(rebuilt.iter()) {
                assert_eq!(copy.role(), original.role());
                assert_eq!(copy.content(), original.content());
            }
        }
    }

    #[test]
    fn test_chat_request_wire_shape() {
        let request = ChatRequest {
            model: ChatModel::Gpt35Turbo,
            messages: vec![Message::user("hello").to_wire()],
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "model": "gpt-3.5-turbo",
                "messages": [{ "role": "user", "content": "hello" }]
            })
        );
    }

    #[test]
    fn test_image_request_defaults() {
        let value = serde_json::to_value(ImageRequest::new(ImageModel::DallE2, "a red fox")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "model": "dall-e-2",
                "prompt": "a red fox",
                "size": "1024x1024",
                "quality": "standard",
                "n": 1
            })
        );
    }

    #[test]
    fn test_model_allow_lists() {
        assert_eq!("gpt-4-turbo".parse::<ChatModel>().unwrap(), ChatModel::Gpt4Turbo);
        assert_eq!("dall-e-2".parse::<ImageModel>().unwrap(), ImageModel::DallE2);

        let err = "gpt-5".parse::<ChatModel>().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("gpt-3.5-turbo"));
        assert!("midjourney".parse::<ImageModel>().is_err());

        assert_eq!(ChatModel::default(), ChatModel::Gpt4Turbo);
        assert_eq!(ImageModel::default(), ImageModel::DallE3);
    }

    #[test]
    fn test_history_prepends() {
        let mut history = ImageHistory::new();
        history.prepend("b".into());
        history.prepend("a".into());
        history.prepend("c".into());

        let refs: Vec<&str> = history.iter().map(ImageRecord::as_str).collect();
        assert_eq!(refs, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_history_allows_duplicates_and_clears() {
        let mut history = ImageHistory::new();
        history.prepend("same".into());
        history.prepend("same".into());
        assert_eq!(history.len(), 2);

        history.clear();
        assert!(history.is_empty());
        assert!(history.first().is_none());
    }

    #[test]
    fn test_bounded_history_evicts_oldest() {
        let mut history = ImageHistory::bounded(2).unwrap();
        assert_eq!(history.prepend("one".into()), None);
        assert_eq!(history.prepend("two".into()), None);
        assert_eq!(history.prepend("three".into()), Some(ImageRecord::from("one")));

        assert_eq!(history.to_vec(), vec![ImageRecord::from("three"), ImageRecord::from("two")]);
        assert!(ImageHistory::bounded(0).is_err());
    }
}
