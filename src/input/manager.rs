//! Input manager for handling different file types

use crate::error::{Result, ResumeWriterError};
use crate::input::file_detector::FileType;
use crate::input::text_extractor::{DocxExtractor, PdfExtractor, PlainTextExtractor, TextExtractor};
use crate::text::normalize_whitespace;
use log::info;
use std::collections::HashMap;
use std::path::Path;

pub struct InputManager {
    docx_extractor: DocxExtractor,
    cache: HashMap<String, String>,
    enable_cache: bool,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            docx_extractor: DocxExtractor::new(),
            cache: HashMap::new(),
            enable_cache: true,
        }
    }

    pub fn with_cache(mut self, enable: bool) -> Self {
        self.enable_cache = enable;
        self
    }

    /// Extract text from a file on disk.
    pub async fn extract_text(&mut self, path: &Path) -> Result<String> {
        let path_str = path.to_string_lossy().to_string();

        // Check cache first
        if self.enable_cache {
            if let Some(cached_text) = self.cache.get(&path_str) {
                info!("Using cached text for: {}", path.display());
                return Ok(cached_text.clone());
            }
        }

        if !path.exists() {
            return Err(ResumeWriterError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let file_type = self.detect_file_type(path)?;
        let bytes = tokio::fs::read(path).await?;
        let text = self.extract_typed(&path_str, file_type, &bytes)?;

        // Cache the result
        if self.enable_cache {
            self.cache.insert(path_str, text.clone());
        }

        Ok(text)
    }

    /// Extract text from uploaded bytes, using the original file name for
    /// type detection. Uploads are never cached.
    pub fn extract_bytes(&self, file_name: &str, bytes: &[u8]) -> Result<String> {
        let file_type = FileType::from_file_name(file_name);
        self.extract_typed(file_name, file_type, bytes)
    }

    fn extract_typed(&self, source: &str, file_type: FileType, bytes: &[u8]) -> Result<String> {
        let raw = match file_type {
            FileType::Pdf => {
                info!("Extracting text from PDF: {}", source);
                PdfExtractor.extract(bytes)?
            }
            FileType::Docx => {
                info!("Extracting text from DOCX: {}", source);
                self.docx_extractor.extract(bytes)?
            }
            FileType::Text => {
                info!("Reading plain text: {}", source);
                PlainTextExtractor.extract(bytes)?
            }
            FileType::Unknown => {
                return Err(ResumeWriterError::UnsupportedFormat(format!(
                    "Unsupported file type for '{}'. Please use PDF, DOCX, or TXT",
                    source
                )));
            }
        };

        let text = normalize_whitespace(&raw);
        if text.is_empty() {
            // Covers empty files and image-only PDFs with no text layer
            return Err(ResumeWriterError::NoTextContent(format!(
                "No text found in '{}'. The document may be empty or image-only",
                source
            )));
        }

        Ok(text)
    }

    fn detect_file_type(&self, path: &Path) -> Result<FileType> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| {
                ResumeWriterError::InvalidInput(format!(
                    "File has no extension: {}",
                    path.display()
                ))
            })?;

        Ok(FileType::from_extension(extension))
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}
