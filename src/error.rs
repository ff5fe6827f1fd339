//! Error handling for the resume writer application

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResumeWriterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF extraction error: {0}")]
    PdfExtraction(String),

    #[error("DOCX extraction error: {0}")]
    DocxExtraction(String),

    #[error("No text content: {0}")]
    NoTextContent(String),

    #[error("File format not supported: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Model error: {0}")]
    ModelError(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

pub type Result<T> = std::result::Result<T, ResumeWriterError>;

/// Convert anyhow errors to our custom error type
impl From<anyhow::Error> for ResumeWriterError {
    fn from(err: anyhow::Error) -> Self {
        ResumeWriterError::Generation(err.to_string())
    }
}

/// Convert candle core errors to our custom error type
impl From<candle_core::Error> for ResumeWriterError {
    fn from(err: candle_core::Error) -> Self {
        ResumeWriterError::ModelError(err.to_string())
    }
}

impl ResumeWriterError {
    /// True when the error was caused by the user's input rather than the
    /// models or the environment. The web layer uses this to pick a 4xx
    /// status instead of a 5xx.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ResumeWriterError::UnsupportedFormat(_)
                | ResumeWriterError::NoTextContent(_)
                | ResumeWriterError::InvalidInput(_)
                | ResumeWriterError::PdfExtraction(_)
                | ResumeWriterError::DocxExtraction(_)
        )
    }
}
