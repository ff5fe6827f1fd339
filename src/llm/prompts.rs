//! Prompt assembly for the two models, plus post-generation cleanup of the
//! cover letter. Character budgets keep the prompt inside the generator's
//! context window.

use crate::config::PromptConfig;
use crate::text::truncate_at_word;
use regex::Regex;

const LETTER_OPENING: &str = "Dear Hiring Manager,";

const COVER_LETTER_TEMPLATE: &str = r#"Write a professional cover letter based on the following:

Candidate Background: {summary}

Job Description: {job}

Company: {company}
Position: {position}

Cover Letter:

Dear Hiring Manager,

I am excited to apply {position_part}{company_part}. My background aligns closely with the role's requirements. I have experience with"#;

/// Inputs for a cover letter prompt.
#[derive(Debug, Clone)]
pub struct CoverLetterRequest<'a> {
    pub resume_summary: &'a str,
    pub job_description: &'a str,
    pub company: Option<&'a str>,
    pub position: Option<&'a str>,
}

pub struct PromptBuilder {
    config: PromptConfig,
}

impl PromptBuilder {
    pub fn new(config: PromptConfig) -> Self {
        Self { config }
    }

    /// The summarizer is instruction-tuned; a bare task prefix is all it needs.
    pub fn summarize_instruction(&self, passage: &str) -> String {
        format!("summarize: {}", passage.trim())
    }

    /// Build the generation prompt. The prompt ends mid-sentence on purpose:
    /// the model continues from "I have experience with", which anchors the
    /// letter in the candidate's actual background.
    pub fn cover_letter_prompt(&self, request: &CoverLetterRequest) -> String {
        let company = request.company.map(str::trim).filter(|c| !c.is_empty());
        let position = request.position.map(str::trim).filter(|p| !p.is_empty());

        let company_part = company
            .map(|c| format!(" at {}", c))
            .unwrap_or_default();
        let position_part = position
            .map(|p| format!("for the {} position", p))
            .unwrap_or_else(|| "for this position".to_string());

        COVER_LETTER_TEMPLATE
            .replace(
                "{summary}",
                &truncate_at_word(
                    request.resume_summary.trim(),
                    self.config.summary_budget_chars,
                ),
            )
            .replace(
                "{job}",
                &truncate_at_word(
                    request.job_description.trim(),
                    self.config.job_budget_chars,
                ),
            )
            .replace("{company}", company.unwrap_or("this company"))
            .replace("{position}", position.unwrap_or("this role"))
            .replace("{position_part}", &position_part)
            .replace("{company_part}", &company_part)
    }
}

/// Pull the letter body out of the raw model output. The prompt ends with a
/// partial letter opening, so everything from the salutation onward is the
/// letter; when no salutation survived generation, slice off the prompt.
pub fn extract_cover_letter(generated: &str, prompt: &str) -> String {
    for marker in [LETTER_OPENING, "I am writing to express"] {
        if let Some(idx) = generated.find(marker) {
            return generated[idx..].trim().to_string();
        }
    }

    if generated.len() > prompt.len() && generated.starts_with(prompt) {
        return generated[prompt.len()..].trim().to_string();
    }

    generated.trim().to_string()
}

/// Repair the letter's structure: guarantee the salutation, append a closing
/// when the model trailed off without one, and collapse excess blank lines.
pub fn format_cover_letter(letter: &str, company: Option<&str>) -> String {
    let mut letter = letter.trim().to_string();

    if !letter.starts_with("Dear") {
        letter = format!("{}\n\n{}", LETTER_OPENING, letter);
    }

    let lower = letter.to_lowercase();
    let has_closing = ["sincerely", "best regards", "thank you"]
        .iter()
        .any(|closing| lower.contains(closing));

    if !has_closing {
        let team = company
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| c.to_string())
            .unwrap_or_else(|| "your team".to_string());
        letter.push_str(&format!(
            "\n\nThank you for considering my application. I look forward to discussing how my experience can contribute to {}.\n\nBest regards,\n[Your Name]",
            team
        ));
    }

    let re = Regex::new(r"\n\s*\n\s*\n").expect("Invalid blank line regex");
    re.replace_all(&letter, "\n\n").trim().to_string()
}

/// Template letter used when the generation model is unavailable.
pub fn fallback_cover_letter(
    resume_summary: &str,
    company: Option<&str>,
) -> String {
    let company_part = company
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| format!(" at {}", c))
        .unwrap_or_default();

    format!(
        "{opening}\n\n\
        I am excited to apply for this position{company_part}. Based on my background in {summary}, I believe I would be a strong fit for your team.\n\n\
        The job requirements align well with my experience, particularly in the areas mentioned in your posting. I am eager to contribute my skills and learn from your team.\n\n\
        Thank you for considering my application. I look forward to discussing this opportunity further.\n\n\
        Best regards,\n[Your Name]",
        opening = LETTER_OPENING,
        company_part = company_part,
        summary = truncate_at_word(resume_summary.trim(), 100),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> PromptBuilder {
        PromptBuilder::new(PromptConfig {
            summary_budget_chars: 200,
            job_budget_chars: 300,
        })
    }

    #[test]
    fn test_cover_letter_prompt_with_all_fields() {
        let prompt = builder().cover_letter_prompt(&CoverLetterRequest {
            resume_summary: "Backend engineer with Rust experience.",
            job_description: "Senior engineer role building APIs.",
            company: Some("Acme"),
            position: Some("Senior Engineer"),
        });

        assert!(prompt.contains("Backend engineer with Rust experience."));
        assert!(prompt.contains("Senior engineer role building APIs."));
        assert!(prompt.contains("Company: Acme"));
        assert!(prompt.contains("Position: Senior Engineer"));
        assert!(prompt.contains("for the Senior Engineer position at Acme"));
        assert!(prompt.ends_with("I have experience with"));
    }

    #[test]
    fn test_cover_letter_prompt_defaults_optional_fields() {
        let prompt = builder().cover_letter_prompt(&CoverLetterRequest {
            resume_summary: "Engineer.",
            job_description: "Role.",
            company: None,
            position: Some("  "),
        });

        assert!(prompt.contains("Company: this company"));
        assert!(prompt.contains("Position: this role"));
        assert!(prompt.contains("apply for this position."));
    }

    #[test]
    fn test_cover_letter_prompt_honors_budgets() {
        let long_summary = "word ".repeat(200);
        let prompt = builder().cover_letter_prompt(&CoverLetterRequest {
            resume_summary: &long_summary,
            job_description: "Role.",
            company: None,
            position: None,
        });

        let background_line = prompt
            .lines()
            .find(|l| l.starts_with("Candidate Background:"))
            .unwrap();
        assert!(background_line.len() < 200 + "Candidate Background: ".len() + 1);
    }

    #[test]
    fn test_extract_cover_letter_finds_marker() {
        let prompt = "Write a letter:\n\nDear Hiring Manager,\n\nI am excited to apply";
        let generated = format!("{} for this role. More text here.", prompt);
        let letter = extract_cover_letter(&generated, prompt);
        assert!(letter.starts_with("Dear Hiring Manager,"));
        assert!(letter.contains("More text here."));
    }

    #[test]
    fn test_format_cover_letter_adds_missing_pieces() {
        let formatted = format_cover_letter("I can write code.", Some("Acme"));
        assert!(formatted.starts_with("Dear Hiring Manager,"));
        assert!(formatted.contains("contribute to Acme"));
        assert!(formatted.contains("Best regards,"));
    }

    #[test]
    fn test_format_cover_letter_keeps_existing_closing() {
        let letter = "Dear Hiring Manager,\n\nBody.\n\nSincerely,\nJane";
        let formatted = format_cover_letter(letter, None);
        assert!(!formatted.contains("[Your Name]"));
    }

    #[test]
    fn test_format_cover_letter_collapses_blank_lines() {
        let letter = "Dear Hiring Manager,\n\n\n\nBody text. Thank you.";
        let formatted = format_cover_letter(letter, None);
        assert!(!formatted.contains("\n\n\n"));
    }

    #[test]
    fn test_fallback_cover_letter() {
        let letter = fallback_cover_letter("distributed systems", Some("Acme"));
        assert!(letter.starts_with("Dear Hiring Manager,"));
        assert!(letter.contains("at Acme"));
        assert!(letter.contains("distributed systems"));
    }
}
