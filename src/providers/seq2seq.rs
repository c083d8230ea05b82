use anyhow::{anyhow, Error, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::{LogitsProcessor, Sampling};
use candle_transformers::models::t5;
use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};
use tokenizers::Tokenizer;

use crate::config::{GenerationConfig, ModelConfig};
use crate::models::{ModelProvider, ModelResponse, QueryContext};
use crate::providers::decoding::{self, SpecialTokens};

struct Seq2SeqState {
    model: t5::T5ForConditionalGeneration,
    tokenizer: Tokenizer,
}

/// Encoder-decoder (T5 family) model served from the Hugging Face hub.
pub struct Seq2SeqProvider {
    model_id: String,
    device: Device,
    special: SpecialTokens,
    seed: Option<u64>,
    state: Arc<Mutex<Seq2SeqState>>,
}

struct ModelFiles {
    config: PathBuf,
    tokenizer: PathBuf,
    weights: PathBuf,
}

fn fetch_files(config: &ModelConfig) -> Result<ModelFiles> {
    let api = Api::new()?;
    let repo = api.repo(Repo::with_revision(
        config.model_id.clone(),
        RepoType::Model,
        config.revision.clone(),
    ));

    Ok(ModelFiles {
        config: repo.get("config.json")?,
        tokenizer: repo.get("tokenizer.json")?,
        weights: repo.get("model.safetensors")?,
    })
}

/// Accelerator when one is compiled in and present, CPU otherwise.
pub fn select_device(force_cpu: bool) -> Result<Device> {
    if force_cpu {
        return Ok(Device::Cpu);
    }
    if candle_core::utils::cuda_is_available() {
        return Ok(Device::new_cuda(0)?);
    }
    if candle_core::utils::metal_is_available() {
        return Ok(Device::new_metal(0)?);
    }
    Ok(Device::Cpu)
}

pub fn device_label(device: &Device) -> &'static str {
    match device {
        Device::Cpu => "cpu",
        Device::Cuda(_) => "cuda",
        Device::Metal(_) => "metal",
    }
}

impl Seq2SeqProvider {
    /// Downloads (or reuses cached) weights and builds the model on `device`. Blocking.
    pub fn load(config: &ModelConfig, device: Device) -> Result<Self> {
        let start = Instant::now();
        info!("Loading {} on {}", config.model_id, device_label(&device));

        let files = fetch_files(config)?;

        let model_config = std::fs::read_to_string(&files.config)?;
        let mut model_config: t5::Config = serde_json::from_str(&model_config)?;
        model_config.use_cache = true;
        let special = SpecialTokens {
            decoder_start: model_config
                .decoder_start_token_id
                .unwrap_or(model_config.pad_token_id) as u32,
            eos: model_config.eos_token_id as u32,
        };

        let tokenizer = Tokenizer::from_file(&files.tokenizer).map_err(Error::msg)?;

        // SAFETY: the weights file is not modified while it is mapped.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[files.weights], DType::F32, &device)?
        };
        let model = t5::T5ForConditionalGeneration::load(vb, &model_config)?;

        info!("Model loaded in {:.2?}", start.elapsed());

        Ok(Self {
            model_id: config.model_id.clone(),
            device,
            special,
            seed: config.seed,
            state: Arc::new(Mutex::new(Seq2SeqState { model, tokenizer })),
        })
    }
}

impl Seq2SeqState {
    fn encode_prompt(&self, prompt: &str, max_input_tokens: usize, eos: u32) -> Result<Vec<u32>> {
        let encoding = self.tokenizer.encode(prompt, true).map_err(Error::msg)?;
        let mut ids = encoding.get_ids().to_vec();
        if ids.len() > max_input_tokens {
            warn!("Prompt truncated from {} to {} tokens", ids.len(), max_input_tokens);
            ids.truncate(max_input_tokens - 1);
            ids.push(eos);
        }
        Ok(ids)
    }

    fn generate(
        &mut self,
        prompt: &str,
        generation: &GenerationConfig,
        special: SpecialTokens,
        device: &Device,
        seed: u64,
    ) -> Result<Vec<u32>> {
        let input_ids = self.encode_prompt(prompt, generation.max_input_tokens, special.eos)?;
        let input = Tensor::new(input_ids.as_slice(), device)?.unsqueeze(0)?;

        self.model.clear_kv_cache();
        let encoder_output = self.model.encode(&input)?;
        let model = &mut self.model;

        let output = if generation.num_beams > 1 {
            // Each beam carries its own history, so the decoder reruns the
            // full prefix instead of relying on its single kv cache.
            let scorer = |prefix: &[u32]| -> Result<Vec<f32>> {
                model.clear_kv_cache();
                let decoder_input = Tensor::new(prefix, device)?.unsqueeze(0)?;
                let logits = model.decode(&decoder_input, &encoder_output)?.squeeze(0)?;
                Ok(logits.to_dtype(DType::F32)?.to_vec1::<f32>()?)
            };
            let mut rng = StdRng::seed_from_u64(seed);
            decoding::beam_search(scorer, generation, special, &mut rng)?
        } else {
            let scorer = |prefix: &[u32]| -> Result<Vec<f32>> {
                let fed = if prefix.len() == 1 { prefix } else { &prefix[prefix.len() - 1..] };
                let decoder_input = Tensor::new(fed, device)?.unsqueeze(0)?;
                let logits = model.decode(&decoder_input, &encoder_output)?.squeeze(0)?;
                Ok(logits.to_dtype(DType::F32)?.to_vec1::<f32>()?)
            };
            let sampling = match (generation.do_sample, generation.top_k) {
                (false, _) => Sampling::ArgMax,
                (true, 0) => Sampling::TopP {
                    p: generation.top_p,
                    temperature: generation.temperature,
                },
                (true, k) => Sampling::TopKThenTopP {
                    k,
                    p: generation.top_p,
                    temperature: generation.temperature,
                },
            };
            let mut processor = LogitsProcessor::from_sampling(seed, sampling);
            let sampler = |logits: &[f32]| -> Result<u32> {
                let logits = Tensor::new(logits, &Device::Cpu)?;
                Ok(processor.sample(&logits)?)
            };
            decoding::sample_decode(scorer, sampler, generation, special)?
        };

        self.model.clear_kv_cache();
        Ok(output)
    }
}

#[async_trait]
impl ModelProvider for Seq2SeqProvider {
    fn name(&self) -> &str {
        &self.model_id
    }

    fn is_available(&self) -> bool {
        !self.state.is_poisoned()
    }

    async fn generate(&self, context: &QueryContext) -> Result<ModelResponse> {
        let state_arc = self.state.clone();
        let prompt = context.prompt.clone();
        let generation = context.generation.clone();
        let special = self.special;
        let device = self.device.clone();
        let seed = self.seed.unwrap_or_else(rand::random);
        let model_used = self.model_id.clone();

        // Run inference in a blocking thread to avoid blocking the async runtime
        let result = tokio::task::spawn_blocking(move || {
            let mut state = state_arc
                .lock()
                .map_err(|_| anyhow!("model state poisoned by an earlier panic"))?;
            let start_gen = Instant::now();

            let tokens = state.generate(&prompt, &generation, special, &device, seed)?;
            let content = state.tokenizer.decode(&tokens, true).map_err(Error::msg)?;
            let time_ms = start_gen.elapsed().as_millis() as u64;
            debug!("Generated {} tokens in {}ms", tokens.len(), time_ms);

            Ok::<ModelResponse, anyhow::Error>(ModelResponse {
                content,
                model_used,
                tokens_used: tokens.len() as u32,
                response_time_ms: time_ms,
            })
        })
        .await??;

        Ok(result)
    }
}
