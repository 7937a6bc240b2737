//! Client for a generative-AI backend with a chat flow and an image flow
//!
//! Both flows post JSON to a remote endpoint and keep session-local state: a
//! conversation transcript for chat and a most-recent-first history for
//! generated images. A presentation layer drives them through [`app::App`].

pub mod app;
pub mod config;
pub mod conversation;
pub mod error;
pub mod gateway;
pub mod images;
pub mod models;
pub mod prompts;
pub mod reply;

pub use error::{Error, Result};
