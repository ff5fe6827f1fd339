//! Cover letter generation engine using Candle for local model execution

use crate::config::GenerationConfig;
use crate::error::{Result, ResumeWriterError};
use crate::llm::device::get_device_with_override;
use crate::llm::model_manager::weight_files;
use candle_core::{DType, Device, IndexOp, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::{llama, phi3};
use candle_transformers::utils::apply_repeat_penalty;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokenizers::Tokenizer;

const DEFAULT_SEED: u64 = 299792458;
const REPEAT_PENALTY_WINDOW: usize = 64;

/// Result of a single generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub text: String,
    pub token_count: usize,
    pub generation_time_ms: u64,
    pub tokens_per_second: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModelKind {
    Phi,
    Llama,
}

/// Trait over the causal model families the generator supports
trait CausalModel: Send + Sync {
    fn forward(&mut self, input_ids: &Tensor, start_pos: usize) -> Result<Tensor>;
    fn reset_kv_cache(&mut self) -> Result<()>;
}

struct PhiModel {
    model: phi3::Model,
}

impl CausalModel for PhiModel {
    fn forward(&mut self, input_ids: &Tensor, start_pos: usize) -> Result<Tensor> {
        self.model.forward(input_ids, start_pos).map_err(|e| {
            ResumeWriterError::ModelError(format!("Phi forward pass failed: {}", e))
        })
    }

    fn reset_kv_cache(&mut self) -> Result<()> {
        self.model.clear_kv_cache();
        Ok(())
    }
}

struct LlamaModel {
    model: llama::Llama,
    cache: llama::Cache,
    config: llama::Config,
    device: Device,
}

impl CausalModel for LlamaModel {
    fn forward(&mut self, input_ids: &Tensor, start_pos: usize) -> Result<Tensor> {
        self.model
            .forward(input_ids, start_pos, &mut self.cache)
            .map_err(|e| {
                ResumeWriterError::ModelError(format!("Llama forward pass failed: {}", e))
            })
    }

    fn reset_kv_cache(&mut self) -> Result<()> {
        self.cache = llama::Cache::new(true, DType::F32, &self.config, &self.device)
            .map_err(|e| ResumeWriterError::ModelError(format!("Failed to reset cache: {}", e)))?;
        Ok(())
    }
}

/// Generation engine for the cover letter model
pub struct GeneratorEngine {
    model: Box<dyn CausalModel>,
    kind: ModelKind,
    tokenizer: Tokenizer,
    device: Device,
    config: GenerationConfig,
}

impl GeneratorEngine {
    /// Load a causal LM from a downloaded model directory.
    pub fn load(model_path: &Path, config: GenerationConfig) -> Result<Self> {
        println!("🔄 Loading generator from: {}", model_path.display());

        let device = get_device_with_override()?;

        let tokenizer = Tokenizer::from_file(model_path.join("tokenizer.json")).map_err(|e| {
            ResumeWriterError::ModelError(format!("Failed to load tokenizer: {}", e))
        })?;

        let config_content = std::fs::read_to_string(model_path.join("config.json"))
            .map_err(|e| ResumeWriterError::ModelError(format!("Failed to read model config: {}", e)))?;
        let model_config: serde_json::Value = serde_json::from_str(&config_content)
            .map_err(|e| ResumeWriterError::ModelError(format!("Failed to parse model config: {}", e)))?;

        let model_type = model_config["model_type"].as_str().unwrap_or("unknown");
        let architecture = model_config["architectures"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|v| v.as_str())
            .unwrap_or("");

        let (model, kind): (Box<dyn CausalModel>, ModelKind) = match (model_type, architecture) {
            ("phi3", _) | (_, "Phi3ForCausalLM") => {
                println!("🔧 Loading Phi model (architecture: {})", architecture);
                (Self::load_phi_model(model_path, &device, &model_config)?, ModelKind::Phi)
            }
            ("llama", _) | (_, "LlamaForCausalLM") => {
                println!("🔧 Loading Llama model");
                (Self::load_llama_model(model_path, &device, &model_config)?, ModelKind::Llama)
            }
            _ => {
                return Err(ResumeWriterError::ModelError(format!(
                    "Unsupported generator model type '{}' (architecture '{}')",
                    model_type, architecture
                )));
            }
        };

        println!("✅ Generator loaded");

        Ok(Self {
            model,
            kind,
            tokenizer,
            device,
            config,
        })
    }

    fn load_phi_model(
        model_path: &Path,
        device: &Device,
        config: &serde_json::Value,
    ) -> Result<Box<dyn CausalModel>> {
        let phi_config = serde_json::from_value::<phi3::Config>(config.clone()).map_err(|e| {
            ResumeWriterError::ModelError(format!("Failed to parse Phi-3 config: {}", e))
        })?;

        let files = weight_files(model_path)?;
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&files, DType::F32, device)? };
        let model = phi3::Model::new(&phi_config, vb).map_err(|e| {
            ResumeWriterError::ModelError(format!("Failed to load Phi-3 model: {}", e))
        })?;

        Ok(Box::new(PhiModel { model }))
    }

    fn load_llama_model(
        model_path: &Path,
        device: &Device,
        config: &serde_json::Value,
    ) -> Result<Box<dyn CausalModel>> {
        let llama_config = llama::Config {
            hidden_size: config["hidden_size"].as_u64().unwrap_or(2048) as usize,
            intermediate_size: config["intermediate_size"].as_u64().unwrap_or(5632) as usize,
            vocab_size: config["vocab_size"].as_u64().unwrap_or(32000) as usize,
            num_hidden_layers: config["num_hidden_layers"].as_u64().unwrap_or(22) as usize,
            num_attention_heads: config["num_attention_heads"].as_u64().unwrap_or(32) as usize,
            num_key_value_heads: config["num_key_value_heads"].as_u64().unwrap_or(4) as usize,
            max_position_embeddings: config["max_position_embeddings"].as_u64().unwrap_or(2048)
                as usize,
            rms_norm_eps: config["rms_norm_eps"].as_f64().unwrap_or(1e-5),
            rope_theta: config["rope_theta"].as_f64().unwrap_or(10000.0) as f32,
            rope_scaling: None,
            tie_word_embeddings: config["tie_word_embeddings"].as_bool().unwrap_or(false),
            bos_token_id: Some(1),
            eos_token_id: Some(llama::LlamaEosToks::Single(2)),
            use_flash_attn: false,
        };

        let files = weight_files(model_path)?;
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&files, DType::F32, device)? };
        let model = llama::Llama::load(vb, &llama_config).map_err(|e| {
            ResumeWriterError::ModelError(format!("Failed to load Llama model: {}", e))
        })?;

        let cache = llama::Cache::new(true, DType::F32, &llama_config, device).map_err(|e| {
            ResumeWriterError::ModelError(format!("Failed to initialize Llama cache: {}", e))
        })?;

        Ok(Box::new(LlamaModel {
            model,
            cache,
            config: llama_config,
            device: device.clone(),
        }))
    }

    /// Check if token is end-of-sequence. Covers the sentinel tokens of the
    /// model families we load (llama </s>, phi <|end|> and friends).
    fn is_eos_token(&self, token: u32) -> bool {
        matches!(token, 2 | 32000 | 32001 | 32007 | 128001 | 128009)
    }

    /// The cover letter prompt ends mid-sentence so the model continues it.
    /// Instruct-tuned Phi models still need their chat wrapper; llama-family
    /// chat models handle raw continuation well enough without one.
    fn format_prompt(&self, prompt: &str) -> String {
        match self.kind {
            ModelKind::Phi => format!("<|user|>\n{}\n<|end|>\n<|assistant|>\n", prompt.trim()),
            ModelKind::Llama => prompt.to_string(),
        }
    }

    /// Generate a continuation of the prompt. Returns the full decoded text
    /// (prompt included) so the caller can locate the letter opening inside it.
    pub fn generate(&mut self, prompt: &str) -> Result<GenerationOutput> {
        let start = std::time::Instant::now();

        self.model.reset_kv_cache()?;

        let formatted_prompt = self.format_prompt(prompt);
        let encoding = self
            .tokenizer
            .encode(formatted_prompt.as_str(), true)
            .map_err(|e| ResumeWriterError::ModelError(format!("Failed to tokenize input: {}", e)))?;
        let mut tokens = encoding.get_ids().to_vec();
        let input_length = tokens.len();

        log::debug!("Prompt tokenized to {} tokens", input_length);

        // Process the entire prompt at once, then feed one token at a time
        let input_tensor = Tensor::new(&tokens[..], &self.device)?.unsqueeze(0)?;
        let mut logits = self.model.forward(&input_tensor, 0)?;

        let seed = self.config.seed.unwrap_or(DEFAULT_SEED);
        let mut logits_processor = LogitsProcessor::new(
            seed,
            Some(self.config.temperature),
            Some(self.config.top_p),
        );

        let mut generated_tokens = Vec::new();

        for step in 0..self.config.max_new_tokens {
            let final_logits = if logits.dims().len() == 3 {
                // [batch_size, seq_len, vocab_size] - take the last position
                let seq_len = logits.dims()[1];
                logits.i((0, seq_len - 1))?
            } else if logits.dims().len() == 2 {
                let seq_len = logits.dims()[0];
                logits.i(seq_len - 1)?
            } else {
                logits.clone()
            };

            let final_logits = if self.config.repeat_penalty > 1.0 {
                let window_start = tokens.len().saturating_sub(REPEAT_PENALTY_WINDOW);
                apply_repeat_penalty(
                    &final_logits,
                    self.config.repeat_penalty,
                    &tokens[window_start..],
                )?
            } else {
                final_logits
            };

            let next_token = logits_processor.sample(&final_logits)?;

            // Only honor EOS after some meaningful content has been produced
            if step >= 10 && self.is_eos_token(next_token) {
                log::debug!("EOS token {} after {} tokens", next_token, step);
                break;
            }

            tokens.push(next_token);
            generated_tokens.push(next_token);

            let new_token_tensor = Tensor::new(&[next_token], &self.device)?.unsqueeze(0)?;
            logits = self.model.forward(&new_token_tensor, input_length + step)?;
        }

        let full_text = self.tokenizer.decode(&tokens, true).map_err(|e| {
            ResumeWriterError::ModelError(format!("Failed to decode output: {}", e))
        })?;

        let elapsed = start.elapsed();
        let token_count = generated_tokens.len();

        Ok(GenerationOutput {
            text: full_text,
            token_count,
            generation_time_ms: elapsed.as_millis() as u64,
            tokens_per_second: if token_count == 0 {
                0.0
            } else {
                token_count as f64 / elapsed.as_secs_f64()
            },
        })
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_output_rates() {
        let output = GenerationOutput {
            text: "Dear Hiring Manager,".to_string(),
            token_count: 40,
            generation_time_ms: 2000,
            tokens_per_second: 20.0,
        };

        assert_eq!(output.token_count, 40);
        assert!(output.tokens_per_second > 0.0);
    }
}
