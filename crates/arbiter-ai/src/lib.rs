//! AI layer: chat-completion client and conflict-of-interest narratives.

mod client;
pub mod narrative;

pub use client::{
    ChatClient, DEFAULT_LLM_BASE_URL, DEFAULT_MODEL, GenerateRequest, LlmError, TextGenerator,
};
pub use narrative::{CoiReport, default_report_filename, research};
