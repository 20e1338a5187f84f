//! # zapbot-providers
//!
//! AI provider implementations for zapbot.

pub mod openai;

pub use openai::OpenAiProvider;
