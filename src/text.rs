//! Text cleanup, chunking, and truncation helpers shared by the prompt
//! assembler and the summarization pipeline.

use regex::Regex;

/// Collapse all whitespace runs to single spaces and trim. This is the shape
/// the models want their input in; extracted PDF text in particular is full
/// of stray newlines and column artifacts.
pub fn clean_for_model(text: &str) -> String {
    let re = Regex::new(r"\s+").expect("Invalid whitespace regex");
    re.replace_all(text.trim(), " ").to_string()
}

/// Normalize whitespace while keeping paragraph structure: trim each line,
/// drop trailing blank runs down to a single blank line.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = Vec::new();
    let mut blank_run = 0usize;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            blank_run += 1;
            if blank_run == 1 && !out.is_empty() {
                out.push(String::new());
            }
        } else {
            blank_run = 0;
            out.push(trimmed.to_string());
        }
    }

    while out.last().map(|l| l.is_empty()).unwrap_or(false) {
        out.pop();
    }

    out.join("\n")
}

/// Split text into word-aligned chunks of at most `max_chars` characters.
/// A single word longer than the budget becomes its own chunk.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let added = if current.is_empty() {
            word.chars().count()
        } else {
            word.chars().count() + 1
        };

        if current_len + added > max_chars && !current.is_empty() {
            chunks.push(current.join(" "));
            current.clear();
            current_len = 0;
        }

        current_len += if current.is_empty() {
            word.chars().count()
        } else {
            word.chars().count() + 1
        };
        current.push(word);
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}

/// Truncate text to at most `max_chars`, backing up to the last word
/// boundary so prompts never end mid-word.
pub fn truncate_at_word(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut: String = text.chars().take(max_chars).collect();
    match cut.rfind(char::is_whitespace) {
        Some(idx) => cut[..idx].trim_end().to_string(),
        None => cut,
    }
}

/// Take the first `n` sentences of a text. Used by the extractive fallback
/// when the summarization model is unavailable.
pub fn first_sentences(text: &str, n: usize) -> String {
    let sentences: Vec<&str> = text
        .split('.')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .take(n)
        .collect();

    if sentences.is_empty() {
        return String::new();
    }

    format!("{}.", sentences.join(". "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_for_model_collapses_whitespace() {
        let input = "John  Doe\n\nSoftware\tEngineer\n";
        assert_eq!(clean_for_model(input), "John Doe Software Engineer");
    }

    #[test]
    fn test_normalize_whitespace_keeps_paragraphs() {
        let input = "  Summary  \n\n\n\nExperienced developer\n\n";
        assert_eq!(normalize_whitespace(input), "Summary\n\nExperienced developer");
    }

    #[test]
    fn test_chunk_text_respects_budget() {
        let text = "one two three four five six seven eight nine ten".repeat(4);
        let chunks = chunk_text(&text, 40);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 40, "chunk too long: {}", chunk);
        }
    }

    #[test]
    fn test_chunk_text_breaks_at_words() {
        let chunks = chunk_text("alpha beta gamma delta", 11);
        assert_eq!(chunks, vec!["alpha beta", "gamma delta"]);
    }

    #[test]
    fn test_truncate_at_word() {
        assert_eq!(truncate_at_word("hello world again", 12), "hello world");
        assert_eq!(truncate_at_word("short", 12), "short");
    }

    #[test]
    fn test_first_sentences() {
        let text = "First sentence. Second sentence. Third sentence. Fourth.";
        assert_eq!(first_sentences(text, 2), "First sentence. Second sentence.");
        assert_eq!(first_sentences("", 3), "");
    }
}
