//! CLI interface for the resume writer

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "resume-writer")]
#[command(about = "Local AI resume summaries and cover letters")]
#[command(long_about = "Summarize your resume and draft tailored cover letters with small local models. No API keys, nothing leaves your machine.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web interface
    Serve {
        /// Bind host (overrides config and RESUME_WRITER_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides config and RESUME_WRITER_PORT)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Run the interactive terminal mode
    Terminal,

    /// Generate a summary and cover letter from files, non-interactively
    Generate {
        /// Path to resume file (PDF, DOCX, TXT)
        #[arg(short, long)]
        resume: PathBuf,

        /// Path to job description file (TXT)
        #[arg(short, long)]
        job: PathBuf,

        /// Company name
        #[arg(short, long)]
        company: Option<String>,

        /// Position title
        #[arg(short, long)]
        position: Option<String>,
    },

    /// Model management commands
    Models {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ModelAction {
    /// List available models
    List,

    /// Download a model
    Download {
        /// Model name from the registry
        model: String,

        /// Force re-download if model exists
        #[arg(short, long)]
        force: bool,
    },

    /// Remove a downloaded model
    Remove {
        /// Model name to remove
        model: String,
    },

    /// Show model information
    Info {
        /// Model name
        model: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,
}

/// Validate file extension
pub fn validate_file_extension(path: &PathBuf, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_file_extension() {
        let path = PathBuf::from("resume.pdf");
        assert!(validate_file_extension(&path, &["pdf", "txt"]).is_ok());
        assert!(validate_file_extension(&path, &["txt"]).is_err());
        assert!(validate_file_extension(&PathBuf::from("noext"), &["txt"]).is_err());
    }
}
