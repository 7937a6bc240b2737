//! Environment-driven configuration.

use crate::models::{ChatModel, ImageModel};
use crate::reply::ReplyFormat;
use crate::{Error, Result};
use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub backend_url: String,
    pub request_timeout: Option<Duration>,
    pub chat_model: ChatModel,
    pub image_model: ImageModel,
    pub reply_format: ReplyFormat,
    pub image_history_capacity: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout: None,
            chat_model: ChatModel::default(),
            image_model: ImageModel::default(),
            reply_format: ReplyFormat::default(),
            image_history_capacity: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let request_timeout = get("VISION_REQUEST_TIMEOUT_SECS")
            .map(|value| parse_positive("VISION_REQUEST_TIMEOUT_SECS", &value))
            .transpose()?
            .map(|secs| Duration::from_secs(secs as u64));

        let image_history_capacity = get("VISION_IMAGE_HISTORY_CAPACITY")
            .map(|value| parse_positive("VISION_IMAGE_HISTORY_CAPACITY", &value))
            .transpose()?;

        Ok(Self {
            backend_url: get("VISION_BACKEND_URL")
                .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            request_timeout,
            chat_model: parse_or_default("VISION_CHAT_MODEL", get("VISION_CHAT_MODEL"))?,
            image_model: parse_or_default("VISION_IMAGE_MODEL", get("VISION_IMAGE_MODEL"))?,
            reply_format: parse_or_default("VISION_REPLY_FORMAT", get("VISION_REPLY_FORMAT"))?,
            image_history_capacity,
        })
    }
}

fn parse_positive(key: &str, value: &str) -> Result<usize> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::Config(format!(
            "{} must be a positive integer, got '{}'",
            key, value
        ))),
    }
}

fn parse_or_default<T>(key: &str, value: Option<String>) -> Result<T>
where
    T: std::str::FromStr<Err = Error> + Default,
{
    match value {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{}: {}", key, e))),
        None => Ok(T::default()),
    }
}
