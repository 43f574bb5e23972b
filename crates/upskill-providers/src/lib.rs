//! upskill-providers: text-generation provider integrations.
//!
//! Implements the `QuestionGenerator` trait for Gemini and OpenAI-compatible
//! APIs, plus a mock for tests, and loads provider configuration.

pub mod config;
pub mod gemini;
mod http;
pub mod mock;
pub mod openai;

pub use config::{create_provider, load_config, ProviderConfig, UpskillConfig};
pub use upskill_core::error::ProviderError;
