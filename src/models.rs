use async_trait::async_trait;
use anyhow::Result;
use std::fmt;

use crate::config::GenerationConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "User"),
            Role::Bot => write!(f, "Bot"),
        }
    }
}

/// One message in the conversation log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

impl fmt::Display for Turn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.role, self.content)
    }
}

#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub content: String,
    pub model_used: String,
    pub tokens_used: u32,
    pub response_time_ms: u64,
}

#[derive(Debug, Clone)]
pub struct QueryContext {
    pub prompt: String,
    pub generation: GenerationConfig,
}

/// The text-generation capability the chatbot delegates general questions to.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn generate(&self, context: &QueryContext) -> Result<ModelResponse>;
    fn name(&self) -> &str;
    fn is_available(&self) -> bool;
}
