use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use localbot::agent::ChatAgent;
use localbot::config::Config;
use localbot::models::{ModelProvider, ModelResponse, QueryContext};

/// Replays canned outputs and records every prompt it receives.
/// `None` entries make the call fail.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Option<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(replies: &[Option<&str>]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.map(str::to_string)).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn generate(&self, context: &QueryContext) -> Result<ModelResponse> {
        self.prompts.lock().unwrap().push(context.prompt.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Some(content)) => Ok(ModelResponse {
                content,
                model_used: "scripted".to_string(),
                tokens_used: 0,
                response_time_ms: 0,
            }),
            Some(None) => Err(anyhow!("CUDA out of memory")),
            None => Err(anyhow!("no scripted reply left")),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[allow(dead_code)]
pub fn agent_with(provider: Arc<ScriptedProvider>, max_turns: usize) -> ChatAgent {
    let mut config = Config::default();
    config.memory.max_turns = max_turns;
    ChatAgent::new(provider, &config)
}
