//! # Chat Backends
//!
//! This crate provides the generative side of ragmark: a chat-model trait
//! and the OpenAI implementation used to turn retrieved context into
//! answers.
//!
//! Calls are single shot. The engine assembles the prompt, bounds the output
//! length, and decides what a failure means; this crate only carries the
//! messages to the API and the completion back.

pub mod chat;
pub mod error;
pub mod openai;

pub use chat::{ChatMessage, ChatModel, ChatRole};
pub use error::{LlmError, Result};
pub use openai::OpenAiChat;
