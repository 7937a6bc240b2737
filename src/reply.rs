//! Decoding of backend replies
//!
//! The backend may answer with bare text or with a JSON envelope. Decoding
//! turns a [`RawResponse`] into the assistant's text or an image reference,
//! and is the only place where HTTP status and body encoding are checked.

use crate::gateway::RawResponse;
use crate::{Error, Result};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyFormat {
    /// The whole body is the reply.
    Text,
    /// The body must be a JSON string or a known JSON envelope.
    Json,
    /// Unwrap known JSON envelopes, otherwise take the body as text.
    #[default]
    Auto,
}

impl ReplyFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReplyFormat::Text => "text",
            ReplyFormat::Json => "json",
            ReplyFormat::Auto => "auto",
        }
    }
}

impl fmt::Display for ReplyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReplyFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(ReplyFormat::Text),
            "json" => Ok(ReplyFormat::Json),
            "auto" => Ok(ReplyFormat::Auto),
            other => Err(Error::Validation(format!(
                "Unknown reply format '{}' (expected text, json or auto)",
                other
            ))),
        }
    }
}

/// Extract the assistant's reply text.
pub fn decode_chat_reply(format: ReplyFormat, response: &RawResponse) -> Result<String> {
    decode(format, response, chat_text_from_json)
}

/// Extract the generated image's reference.
pub fn decode_image_reference(format: ReplyFormat, response: &RawResponse) -> Result<String> {
    decode(format, response, image_reference_from_json)
}

fn decode(
    format: ReplyFormat,
    response: &RawResponse,
    from_json: fn(&Value) -> Option<String>,
) -> Result<String> {
    let body = body_text(response)?;

    match format {
        ReplyFormat::Text => Ok(body.to_string()),
        ReplyFormat::Json => {
            let value: Value = serde_json::from_str(body)
                .map_err(|e| Error::Decode(format!("Reply is not valid JSON: {}", e)))?;
            from_json(&value)
                .ok_or_else(|| Error::Decode("Reply JSON has no recognised payload".to_string()))
        }
        ReplyFormat::Auto => {
            let unwrapped = serde_json::from_str::<Value>(body)
                .ok()
                .and_then(|value| from_json(&value));
            match unwrapped {
                Some(payload) => Ok(payload),
                None => {
                    tracing::debug!("Reply is not a known JSON envelope, using body as text");
                    Ok(body.to_string())
                }
            }
        }
    }
}

fn body_text(response: &RawResponse) -> Result<&str> {
    let text = std::str::from_utf8(&response.body)
        .map_err(|e| Error::Decode(format!("Reply is not valid UTF-8: {}", e)));

    if !response.is_success() {
        let body = match text {
            Ok(text) => text.to_string(),
            Err(_) => String::from_utf8_lossy(&response.body).into_owned(),
        };
        tracing::error!("Backend error (status {}): {}", response.status, body);
        return Err(Error::Backend {
            status: response.status,
            body,
        });
    }

    let text = text?;
    if text.trim().is_empty() {
        return Err(Error::Decode("Reply body is empty".to_string()));
    }
    Ok(text)
}

fn chat_text_from_json(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Object(map) => {
            if let Some(content) = value
                .pointer("/choices/0/message/content")
                .and_then(Value::as_str)
            {
                return Some(content.to_string());
            }
            ["content", "message", "text"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .map(str::to_string)
        }
        _ => None,
    }
}

fn image_reference_from_json(value: &Value) -> Option<String> {
    match value {
        Value::String(url) => Some(url.clone()),
        Value::Object(_) => {
            let item = value.pointer("/data/0").unwrap_or(value);
            if let Some(url) = item.get("url").and_then(Value::as_str) {
                return Some(url.to_string());
            }
            item.get("b64_json")
                .and_then(Value::as_str)
                .and_then(inline_image_reference)
        }
        _ => None,
    }
}

fn inline_image_reference(b64: &str) -> Option<String> {
    let bytes = match base64::engine::general_purpose::STANDARD.decode(b64) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Ignoring undecodable base64 image payload: {}", e);
            return None;
        }
    };
    Some(format!("data:{};base64,{}", sniff_image_mime(&bytes), b64))
}

fn sniff_image_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "image/png",
    }
}
