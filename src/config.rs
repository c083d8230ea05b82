use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::utils::paths;

const CONFIG_FILE: &str = "config.toml";

/// Upper bound for `memory.max_turns`.
pub const MAX_MEMORY_TURNS: usize = 10_000;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub generation: GenerationConfig,
    pub memory: MemoryConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Hugging Face model identifier.
    pub model_id: String,
    pub revision: String,
    /// Skip accelerator detection and always run on the CPU.
    pub force_cpu: bool,
    /// Sampling seed; a random one is drawn when unset.
    pub seed: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_id: "google/flan-t5-large".to_string(),
            revision: "main".to_string(),
            force_cpu: false,
            seed: None,
        }
    }
}

/// Decoding parameters handed to the model on every general-path turn.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub max_length: usize,
    pub min_length: usize,
    pub top_p: f64,
    /// Zero disables the top-k cut.
    pub top_k: usize,
    pub temperature: f64,
    pub num_beams: usize,
    pub early_stopping: bool,
    pub no_repeat_ngram_size: usize,
    /// Draw tokens (and beam candidates) from the warped distribution
    /// instead of taking the most likely ones.
    pub do_sample: bool,
    /// Prompt tokens beyond this are truncated before encoding.
    pub max_input_tokens: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_length: 200,
            min_length: 5,
            top_p: 0.92,
            top_k: 50,
            temperature: 0.7,
            num_beams: 4,
            early_stopping: true,
            no_repeat_ngram_size: 3,
            do_sample: true,
            max_input_tokens: 512,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Number of user/bot exchanges kept in the conversation log.
    pub max_turns: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { max_turns: 5 }
    }
}

impl Config {
    /// Loads the configuration, honouring an explicit path first, then
    /// `./config.toml`, then the data directory. Falls back to defaults.
    ///
    /// The result is not validated yet; command-line overrides still apply.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match Self::locate(explicit)? {
            Some(path) => {
                info!("Loading configuration from {:?}", path);
                Self::from_file(&path)?
            }
            None => {
                debug!("No config.toml found, using defaults");
                Self::default()
            }
        };

        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config {:?}: {}", path, e))?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    fn locate(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(anyhow!("Config file not found: {:?}", path));
            }
            return Ok(Some(path.to_path_buf()));
        }

        let local = std::env::current_dir()?.join(CONFIG_FILE);
        if local.exists() {
            return Ok(Some(local));
        }

        if let Some(data_dir) = paths::get_data_dir() {
            let path = data_dir.join(CONFIG_FILE);
            if path.exists() {
                return Ok(Some(path));
            }
        }

        Ok(None)
    }

    fn apply_env(&mut self) {
        if let Ok(model) = std::env::var("LOCALBOT_MODEL") {
            if !model.trim().is_empty() {
                self.model.model_id = model.trim().to_string();
            }
        }
        if let Ok(turns) = std::env::var("LOCALBOT_MEMORY_TURNS") {
            if let Ok(turns) = turns.trim().parse::<usize>() {
                self.memory.max_turns = turns;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let generation = &self.generation;

        if self.memory.max_turns == 0 {
            return Err(anyhow!("memory.max_turns must be at least 1"));
        }
        if self.memory.max_turns > MAX_MEMORY_TURNS {
            return Err(anyhow!(
                "memory.max_turns ({}) exceeds the limit of {}",
                self.memory.max_turns,
                MAX_MEMORY_TURNS
            ));
        }
        if self.model.model_id.trim().is_empty() {
            return Err(anyhow!("model.model_id must not be empty"));
        }
        if generation.num_beams == 0 {
            return Err(anyhow!("generation.num_beams must be at least 1"));
        }
        if generation.min_length > generation.max_length {
            return Err(anyhow!(
                "generation.min_length ({}) exceeds max_length ({})",
                generation.min_length,
                generation.max_length
            ));
        }
        if generation.temperature <= 0.0 {
            return Err(anyhow!("generation.temperature must be positive"));
        }
        if !(generation.top_p > 0.0 && generation.top_p <= 1.0) {
            return Err(anyhow!("generation.top_p must be in (0, 1]"));
        }
        if generation.max_input_tokens < 2 {
            return Err(anyhow!("generation.max_input_tokens must be at least 2"));
        }
        Ok(())
    }
}
