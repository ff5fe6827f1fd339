//! Text extraction from various file formats

use crate::error::{Result, ResumeWriterError};
use regex::Regex;
use std::io::Read;

/// Extracts plain text from a document given its raw bytes. Byte-based so
/// the same extractors serve both on-disk files and web uploads.
pub trait TextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String>;
}

pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let text = pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
            ResumeWriterError::PdfExtraction(format!(
                "Failed to extract text from PDF (encrypted or malformed?): {}",
                e
            ))
        })?;
        Ok(text)
    }
}

pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// DOCX files are zip archives; the document body lives in
/// `word/document.xml`. We pull that entry and strip the WordprocessingML
/// markup, keeping paragraph breaks.
pub struct DocxExtractor {
    tag_regex: Regex,
}

impl DocxExtractor {
    pub fn new() -> Self {
        Self {
            tag_regex: Regex::new(r"<[^>]*>").expect("Invalid XML tag regex"),
        }
    }
}

impl Default for DocxExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for DocxExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let cursor = std::io::Cursor::new(bytes);
        let mut archive = zip::ZipArchive::new(cursor).map_err(|e| {
            ResumeWriterError::DocxExtraction(format!("Not a valid DOCX archive: {}", e))
        })?;

        let mut xml = String::new();
        archive
            .by_name("word/document.xml")
            .map_err(|e| {
                ResumeWriterError::DocxExtraction(format!(
                    "DOCX is missing word/document.xml: {}",
                    e
                ))
            })?
            .read_to_string(&mut xml)
            .map_err(|e| {
                ResumeWriterError::DocxExtraction(format!("Failed to read document body: {}", e))
            })?;

        Ok(self.document_xml_to_text(&xml))
    }
}

impl DocxExtractor {
    fn document_xml_to_text(&self, xml: &str) -> String {
        let with_breaks = xml
            .replace("</w:p>", "\n")
            .replace("<w:br/>", "\n")
            .replace("<w:tab/>", "\t");

        let stripped = self.tag_regex.replace_all(&with_breaks, "");

        let text = stripped
            .replace("&amp;", "&")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&#39;", "'");

        let lines: Vec<String> = text
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::{SimpleFileOptions, ZipWriter};

    fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
            .collect();
        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><w:document><w:body>{}</w:body></w:document>",
            body
        );

        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = ZipWriter::new(&mut cursor);
            writer
                .start_file("word/document.xml", SimpleFileOptions::default())
                .unwrap();
            writer.write_all(xml.as_bytes()).unwrap();
            writer.finish().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn test_docx_extraction_keeps_paragraphs() {
        let bytes = build_docx(&["John Doe", "Senior Software Engineer", "Rust &amp; Python"]);
        let text = DocxExtractor::new().extract(&bytes).unwrap();

        assert_eq!(text, "John Doe\nSenior Software Engineer\nRust & Python");
    }

    #[test]
    fn test_docx_extraction_rejects_garbage() {
        let result = DocxExtractor::new().extract(b"definitely not a zip archive");
        assert!(matches!(result, Err(ResumeWriterError::DocxExtraction(_))));
    }

    #[test]
    fn test_plain_text_extraction() {
        let text = PlainTextExtractor.extract(b"hello resume").unwrap();
        assert_eq!(text, "hello resume");
    }
}
