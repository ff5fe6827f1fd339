//! Summarization engine backed by a local seq2seq model (flan-t5 family)

use crate::config::SummarizationConfig;
use crate::error::{Result, ResumeWriterError};
use crate::llm::device::get_device_with_override;
use crate::llm::model_manager::weight_files;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::generation::LogitsProcessor;
use candle_transformers::models::t5;
use std::path::Path;
use tokenizers::Tokenizer;

pub struct SummarizerEngine {
    model: t5::T5ForConditionalGeneration,
    model_config: t5::Config,
    tokenizer: Tokenizer,
    device: Device,
    config: SummarizationConfig,
}

impl SummarizerEngine {
    /// Load a seq2seq summarization model from a downloaded model directory.
    pub fn load(model_path: &Path, config: SummarizationConfig) -> Result<Self> {
        println!("🔄 Loading summarizer from: {}", model_path.display());

        let device = get_device_with_override()?;

        let tokenizer = Tokenizer::from_file(model_path.join("tokenizer.json")).map_err(|e| {
            ResumeWriterError::ModelError(format!("Failed to load tokenizer: {}", e))
        })?;

        let config_content = std::fs::read_to_string(model_path.join("config.json"))
            .map_err(|e| ResumeWriterError::ModelError(format!("Failed to read model config: {}", e)))?;
        let model_config: t5::Config = serde_json::from_str(&config_content)
            .map_err(|e| ResumeWriterError::ModelError(format!("Failed to parse T5 config: {}", e)))?;

        let files = weight_files(model_path)?;
        let vb = unsafe { VarBuilder::from_mmaped_safetensors(&files, DType::F32, &device)? };
        let model = t5::T5ForConditionalGeneration::load(vb, &model_config).map_err(|e| {
            ResumeWriterError::ModelError(format!("Failed to load T5 model: {}", e))
        })?;

        println!("✅ Summarizer loaded");

        Ok(Self {
            model,
            model_config,
            tokenizer,
            device,
            config,
        })
    }

    /// Run one summarization pass over an instruction-prefixed passage.
    /// Input is truncated to the model's token budget; decoding is greedy,
    /// matching the deterministic summarization of the original pipeline.
    pub fn summarize(&mut self, instruction: &str) -> Result<String> {
        let encoding = self
            .tokenizer
            .encode(instruction, true)
            .map_err(|e| ResumeWriterError::ModelError(format!("Failed to tokenize input: {}", e)))?;

        let mut input_ids = encoding.get_ids().to_vec();
        if input_ids.len() > self.config.max_input_tokens {
            input_ids.truncate(self.config.max_input_tokens);
        }

        self.model.clear_kv_cache();

        let input_tensor = Tensor::new(&input_ids[..], &self.device)?.unsqueeze(0)?;
        let encoder_output = self.model.encode(&input_tensor)?;

        let decoder_start = self
            .model_config
            .decoder_start_token_id
            .unwrap_or(self.model_config.pad_token_id) as u32;
        let mut output_ids: Vec<u32> = vec![decoder_start];

        // Greedy decode: temperature None makes the processor take argmax
        let mut logits_processor = LogitsProcessor::new(299792458, None, None);

        for step in 0..self.config.max_summary_tokens {
            let decoder_input = if step == 0 || !self.model_config.use_cache {
                Tensor::new(output_ids.as_slice(), &self.device)?.unsqueeze(0)?
            } else {
                let last = *output_ids.last().expect("decoder sequence is never empty");
                Tensor::new(&[last], &self.device)?.unsqueeze(0)?
            };

            let logits = self
                .model
                .decode(&decoder_input, &encoder_output)?
                .squeeze(0)?;
            let logits = if logits.dims().len() == 2 {
                logits.get(logits.dim(0)? - 1)?
            } else {
                logits
            };

            let next_token = logits_processor.sample(&logits)?;

            // Hold off on EOS until the summary has some substance
            if next_token as usize == self.model_config.eos_token_id
                && step >= self.config.min_summary_tokens
            {
                break;
            }

            output_ids.push(next_token);
        }

        let summary = self
            .tokenizer
            .decode(&output_ids[1..], true)
            .map_err(|e| ResumeWriterError::ModelError(format!("Failed to decode summary: {}", e)))?;

        Ok(summary.trim().to_string())
    }

    pub fn config(&self) -> &SummarizationConfig {
        &self.config
    }
}
