//! Configuration management for the resume writer

use crate::error::{Result, ResumeWriterError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub models: ModelConfig,
    pub summarization: SummarizationConfig,
    pub generation: GenerationConfig,
    pub prompt: PromptConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub models_dir: PathBuf,
    pub default_summarizer: String,
    pub default_generator: String,
    pub available_models: Vec<AvailableModel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableModel {
    pub name: String,
    pub repo_id: String,
    pub model_type: ModelType,
    pub size_mb: u64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelType {
    Summarizer,
    Generator,
}

/// Knobs for the summarization pass. Character thresholds mirror the
/// chunked summarization flow: resumes longer than `chunk_threshold_chars`
/// are split into `chunk_size_chars` pieces, and the combined per-chunk
/// summaries are re-summarized when they exceed `resummarize_threshold_chars`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizationConfig {
    pub chunk_threshold_chars: usize,
    pub chunk_size_chars: usize,
    pub resummarize_threshold_chars: usize,
    pub max_input_tokens: usize,
    pub min_summary_tokens: usize,
    pub max_summary_tokens: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: f64,
    pub top_p: f64,
    pub repeat_penalty: f32,
    pub max_new_tokens: usize,
    pub seed: Option<u64>,
}

/// Character budgets for cover-letter prompt assembly, sized for the
/// generator's context window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    pub summary_budget_chars: usize,
    pub job_budget_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        let models_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".resume-writer")
            .join("models");

        Self {
            models: ModelConfig {
                models_dir,
                default_summarizer: "flan-t5-small".to_string(),
                default_generator: "tinyllama".to_string(),
                available_models: vec![
                    // Seq2seq summarization models
                    AvailableModel {
                        name: "flan-t5-small".to_string(),
                        repo_id: "google/flan-t5-small".to_string(),
                        model_type: ModelType::Summarizer,
                        size_mb: 310,
                        description: "Compact instruction-tuned summarizer, fine on 8GB machines".to_string(),
                    },
                    AvailableModel {
                        name: "flan-t5-base".to_string(),
                        repo_id: "google/flan-t5-base".to_string(),
                        model_type: ModelType::Summarizer,
                        size_mb: 990,
                        description: "Higher-quality summarizer, slower on CPU".to_string(),
                    },
                    // Causal LM generation models
                    AvailableModel {
                        name: "tinyllama".to_string(),
                        repo_id: "TinyLlama/TinyLlama-1.1B-Chat-v1.0".to_string(),
                        model_type: ModelType::Generator,
                        size_mb: 2200,
                        description: "Lightweight chat model for cover letter drafting".to_string(),
                    },
                    AvailableModel {
                        name: "phi-3-mini".to_string(),
                        repo_id: "microsoft/Phi-3-mini-4k-instruct".to_string(),
                        model_type: ModelType::Generator,
                        size_mb: 7600,
                        description: "Stronger instruction-tuned generator, needs more RAM".to_string(),
                    },
                ],
            },
            summarization: SummarizationConfig {
                chunk_threshold_chars: 1000,
                chunk_size_chars: 800,
                resummarize_threshold_chars: 300,
                max_input_tokens: 512,
                min_summary_tokens: 30,
                max_summary_tokens: 128,
            },
            generation: GenerationConfig {
                temperature: 0.4,
                top_p: 0.9,
                repeat_penalty: 1.2,
                max_new_tokens: 220,
                seed: None,
            },
            prompt: PromptConfig {
                summary_budget_chars: 200,
                job_budget_chars: 300,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 7860,
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load from an explicit path. A missing file is created with defaults.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            toml::from_str(&content)
                .map_err(|e| ResumeWriterError::Configuration(format!("Failed to parse config: {}", e)))?
        } else {
            let config = Self::default();
            config.save_to(config_path)?;
            config
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ResumeWriterError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(config_path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-writer")
            .join("config.toml")
    }

    /// RESUME_WRITER_HOST and RESUME_WRITER_PORT win over the config file.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("RESUME_WRITER_HOST") {
            if !host.trim().is_empty() {
                self.server.host = host;
            }
        }
        if let Ok(port) = std::env::var("RESUME_WRITER_PORT") {
            self.server.port = port.parse().map_err(|_| {
                ResumeWriterError::Configuration(format!(
                    "RESUME_WRITER_PORT must be a valid port number, got '{}'",
                    port
                ))
            })?;
        }
        Ok(())
    }

    pub fn models_dir(&self) -> &PathBuf {
        &self.models.models_dir
    }

    pub fn get_models_dir(&self) -> PathBuf {
        self.models.models_dir.clone()
    }

    pub fn ensure_models_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.models.models_dir)?;
        Ok(())
    }

    pub fn get_model_by_name(&self, name: &str) -> Option<&AvailableModel> {
        self.models.available_models.iter().find(|m| m.name == name)
    }

    pub fn list_summarizer_models(&self) -> Vec<&AvailableModel> {
        self.models
            .available_models
            .iter()
            .filter(|m| matches!(m.model_type, ModelType::Summarizer))
            .collect()
    }

    pub fn list_generator_models(&self) -> Vec<&AvailableModel> {
        self.models
            .available_models
            .iter()
            .filter(|m| matches!(m.model_type, ModelType::Generator))
            .collect()
    }

    /// Socket address string for the web server
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Env vars are process-global and unit tests run on parallel threads,
    // so every test that touches RESUME_WRITER_* takes this lock.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config_has_both_model_types() {
        let config = Config::default();
        assert!(!config.list_summarizer_models().is_empty());
        assert!(!config.list_generator_models().is_empty());
        assert!(config.get_model_by_name(&config.models.default_summarizer).is_some());
        assert!(config.get_model_by_name(&config.models.default_generator).is_some());
    }

    #[test]
    fn test_bind_address() {
        let config = Config::default();
        assert_eq!(config.bind_address(), "127.0.0.1:7860");
    }

    #[test]
    fn test_env_port_override() {
        let _guard = ENV_LOCK.lock().unwrap();

        let mut config = Config::default();
        std::env::set_var("RESUME_WRITER_PORT", "9999");
        let result = config.apply_env_overrides();
        std::env::remove_var("RESUME_WRITER_PORT");
        result.unwrap();
        assert_eq!(config.server.port, 9999);

        std::env::set_var("RESUME_WRITER_PORT", "not-a-port");
        let result = config.apply_env_overrides();
        std::env::remove_var("RESUME_WRITER_PORT");
        assert!(result.is_err());
    }

    #[test]
    fn test_config_round_trip() {
        let _guard = ENV_LOCK.lock().unwrap();

        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.server.port = 8123;
        config.models.default_generator = "phi-3-mini".to_string();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.server.port, 8123);
        assert_eq!(loaded.models.default_generator, "phi-3-mini");
        assert_eq!(
            loaded.models.available_models.len(),
            config.models.available_models.len()
        );
    }

    #[test]
    fn test_load_from_missing_path_writes_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();

        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.server.port, Config::default().server.port);
    }
}
