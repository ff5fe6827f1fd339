//! Pipeline orchestration: summarize the resume, then draft the cover letter.

use crate::config::Config;
use crate::error::{Result, ResumeWriterError};
use crate::llm::generator::GeneratorEngine;
use crate::llm::model_manager::ModelManager;
use crate::llm::prompts::{
    extract_cover_letter, fallback_cover_letter, format_cover_letter, CoverLetterRequest,
    PromptBuilder,
};
use crate::llm::summarizer::SummarizerEngine;
use crate::monitor::MemoryMonitor;
use crate::text::{chunk_text, clean_for_model, first_sentences};
use serde::{Deserialize, Serialize};

/// Minimum length for a generated letter to be considered usable. Anything
/// shorter means the model trailed off immediately and the template letter
/// reads better.
const MIN_LETTER_CHARS: usize = 40;

/// Number of leading sentences kept when the summarizer is unavailable.
const FALLBACK_SUMMARY_SENTENCES: usize = 5;

/// Both documents produced for one application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationDraft {
    pub resume_summary: String,
    pub cover_letter: String,
}

/// Inputs for one application run.
#[derive(Debug, Clone, Default)]
pub struct ApplicationRequest {
    pub resume_text: String,
    pub job_description: String,
    pub company: Option<String>,
    pub position: Option<String>,
}

pub struct ResumeEngine {
    summarizer: SummarizerEngine,
    generator: GeneratorEngine,
    prompts: PromptBuilder,
    monitor: MemoryMonitor,
}

impl ResumeEngine {
    /// Download (if needed) and load both models.
    pub async fn load(config: &Config) -> Result<Self> {
        let mut monitor = MemoryMonitor::new();
        monitor.log_usage("startup");

        config.ensure_models_dir()?;
        let mut manager = ModelManager::new(
            config.get_models_dir(),
            &config.models.available_models,
        )
        .await?;

        let summarizer_path = manager.ensure_model(&config.models.default_summarizer).await?;
        let generator_path = manager.ensure_model(&config.models.default_generator).await?;

        let summarizer = SummarizerEngine::load(&summarizer_path, config.summarization.clone())?;
        monitor.log_usage("summarizer loaded");

        let generator = GeneratorEngine::load(&generator_path, config.generation.clone())?;
        monitor.log_usage("generator loaded");

        Ok(Self {
            summarizer,
            generator,
            prompts: PromptBuilder::new(config.prompt.clone()),
            monitor,
        })
    }

    /// Summarize a resume, chunking long inputs to fit the model's context.
    /// Falls back to an extractive summary when inference fails, so the
    /// pipeline always produces something usable.
    pub fn summarize_resume(&mut self, resume_text: &str) -> Result<String> {
        let text = clean_for_model(resume_text);
        if text.is_empty() {
            return Err(ResumeWriterError::InvalidInput(
                "Resume text is empty".to_string(),
            ));
        }

        let summary = match self.summarize_with_model(&text) {
            Ok(summary) if !summary.trim().is_empty() => summary,
            Ok(_) => {
                log::warn!("Summarizer produced empty output, using extractive fallback");
                first_sentences(&text, FALLBACK_SUMMARY_SENTENCES)
            }
            Err(e) => {
                log::warn!("Summarization failed ({}), using extractive fallback", e);
                first_sentences(&text, FALLBACK_SUMMARY_SENTENCES)
            }
        };

        self.monitor.log_usage("resume summarized");
        Ok(summary)
    }

    fn summarize_with_model(&mut self, text: &str) -> Result<String> {
        let chunk_threshold = self.summarizer.config().chunk_threshold_chars;
        let chunk_size = self.summarizer.config().chunk_size_chars;
        let resummarize_threshold = self.summarizer.config().resummarize_threshold_chars;

        if text.len() <= chunk_threshold {
            let instruction = self.prompts.summarize_instruction(text);
            return self.summarizer.summarize(&instruction);
        }

        let chunks = chunk_text(text, chunk_size);
        log::info!("Resume split into {} chunks for summarization", chunks.len());

        let mut partial_summaries = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            log::debug!("Summarizing chunk {}/{}", i + 1, chunks.len());
            let instruction = self.prompts.summarize_instruction(chunk);
            partial_summaries.push(self.summarizer.summarize(&instruction)?);
        }

        let combined = partial_summaries.join(" ");
        if combined.len() > resummarize_threshold {
            let instruction = self.prompts.summarize_instruction(&combined);
            self.summarizer.summarize(&instruction)
        } else {
            Ok(combined)
        }
    }

    /// Draft a cover letter from a resume summary and job description.
    /// Falls back to a template letter when generation fails or trails off.
    pub fn generate_cover_letter(
        &mut self,
        resume_summary: &str,
        job_description: &str,
        company: Option<&str>,
        position: Option<&str>,
    ) -> Result<String> {
        if job_description.trim().is_empty() {
            return Err(ResumeWriterError::InvalidInput(
                "Job description is empty".to_string(),
            ));
        }

        let request = CoverLetterRequest {
            resume_summary,
            job_description,
            company,
            position,
        };
        let prompt = self.prompts.cover_letter_prompt(&request);

        let letter = match self.generator.generate(&prompt) {
            Ok(output) => {
                log::info!(
                    "Generated {} tokens in {}ms ({:.1} tok/s)",
                    output.token_count,
                    output.generation_time_ms,
                    output.tokens_per_second
                );
                let extracted = extract_cover_letter(&output.text, &prompt);
                if extracted.len() < MIN_LETTER_CHARS {
                    log::warn!("Generated letter too short, using template fallback");
                    fallback_cover_letter(resume_summary, company)
                } else {
                    format_cover_letter(&extracted, company)
                }
            }
            Err(e) => {
                log::warn!("Generation failed ({}), using template fallback", e);
                fallback_cover_letter(resume_summary, company)
            }
        };

        self.monitor.log_usage("cover letter generated");
        Ok(letter)
    }

    /// Run the full pipeline for one application.
    pub fn write_application(&mut self, request: &ApplicationRequest) -> Result<ApplicationDraft> {
        let resume_summary = self.summarize_resume(&request.resume_text)?;
        let cover_letter = self.generate_cover_letter(
            &resume_summary,
            &request.job_description,
            request.company.as_deref(),
            request.position.as_deref(),
        )?;

        Ok(ApplicationDraft {
            resume_summary,
            cover_letter,
        })
    }

    pub fn peak_memory_mb(&self) -> u64 {
        self.monitor.peak_mb()
    }
}
