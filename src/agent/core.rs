use crate::agent::memory::ConversationMemory;
use crate::agent::postprocess::clean_response;
use crate::agent::query::{self, QueryKind, GREETING_REPLY};
use crate::config::{Config, GenerationConfig};
use crate::models::{ModelProvider, QueryContext};
use crate::tools::Calculator;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

/// Where a reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Greeting,
    Math,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub source: ReplySource,
}

impl Reply {
    fn new(text: impl Into<String>, source: ReplySource) -> Self {
        Self { text: text.into(), source }
    }
}

/// Drives one conversational turn: classify, answer, remember.
pub struct ChatAgent {
    provider: Arc<dyn ModelProvider>,
    memory: ConversationMemory,
    calculator: Calculator,
    generation: GenerationConfig,
}

impl std::fmt::Debug for ChatAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatAgent")
            .field("provider", &self.provider.name())
            .field("memory_len", &self.memory.len())
            .field("generation", &self.generation)
            .finish()
    }
}

impl ChatAgent {
    pub fn new(provider: Arc<dyn ModelProvider>, config: &Config) -> Self {
        info!(
            "Chat agent ready - provider: {}, memory turns: {}",
            provider.name(),
            config.memory.max_turns
        );
        Self {
            provider,
            memory: ConversationMemory::new(config.memory.max_turns),
            calculator: Calculator::new(),
            generation: config.generation.clone(),
        }
    }

    /// Runs one turn. Returns `Ok(None)` for blank input.
    ///
    /// The user message is recorded before generation and stays recorded
    /// if the model call fails.
    pub async fn handle_turn(&mut self, input: &str) -> Result<Option<Reply>> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(None);
        }

        self.memory.add_user_message(input);
        let reply = self.respond(input).await?;
        self.memory.add_bot_message(&reply.text);

        Ok(Some(reply))
    }

    /// Answers `input` without touching memory.
    pub async fn respond(&self, input: &str) -> Result<Reply> {
        match query::classify(input) {
            QueryKind::Greeting => return Ok(Reply::new(GREETING_REPLY, ReplySource::Greeting)),
            QueryKind::Math => {
                if let Some(answer) = self.calculator.evaluate(input).answer() {
                    debug!("Calculator answered: {}", answer);
                    return Ok(Reply::new(answer, ReplySource::Math));
                }
                debug!("No arithmetic expression found, asking the model");
            }
            QueryKind::General => {}
        }

        self.generate_model_response(input).await
    }

    async fn generate_model_response(&self, input: &str) -> Result<Reply> {
        let prompt = query::build_prompt(&self.memory.context_string(), input);
        debug!("Prompt length: {} characters", prompt.len());

        let context = QueryContext {
            prompt,
            generation: self.generation.clone(),
        };

        let response = self.provider.generate(&context).await?;
        debug!(
            "{} produced {} tokens in {}ms",
            response.model_used, response.tokens_used, response.response_time_ms
        );

        Ok(Reply::new(clean_response(&response.content), ReplySource::Model))
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// Forgets the conversation so far.
    pub fn clear_memory(&mut self) -> usize {
        self.memory.clear()
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }
}
