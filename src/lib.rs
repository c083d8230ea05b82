//! # localbot - local command-line chatbot
//!
//! Answers questions with a pretrained sequence-to-sequence model while
//! keeping a short sliding window of the conversation.
//!
//! ## Features
//!
//! - Greeting and arithmetic short-circuits that skip the model
//! - Bounded conversation memory rendered into the prompt
//! - Cleanup of raw model output
//! - T5-family inference through candle, downloaded from the Hugging Face hub
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use localbot::{agent::ChatAgent, config::Config};
//! use localbot::providers::{seq2seq::select_device, Seq2SeqProvider};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     config.validate()?;
//!     let device = select_device(config.model.force_cpu)?;
//!     let provider = Seq2SeqProvider::load(&config.model, device)?;
//!     let mut agent = ChatAgent::new(Arc::new(provider), &config);
//!
//!     if let Some(reply) = agent.handle_turn("What is 2 + 2?").await? {
//!         println!("Bot: {}", reply.text);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod config;
pub mod models;
pub mod providers;
pub mod repl;
pub mod tools;
pub mod utils;

// Re-export commonly used types for convenience
pub use agent::{ChatAgent, ConversationMemory, Reply, ReplySource};
pub use config::{Config, GenerationConfig, MemoryConfig, ModelConfig};
pub use models::{ModelProvider, ModelResponse, QueryContext, Role, Turn};
pub use tools::{Calculator, MathOutcome};
