//! Integration tests for the resume writer

use resume_writer::engine::ApplicationRequest;
use resume_writer::input::manager::InputManager;
use resume_writer::llm::prompts::{
    extract_cover_letter, format_cover_letter, CoverLetterRequest, PromptBuilder,
};
use resume_writer::Config;
use std::path::Path;

#[tokio::test]
async fn test_text_extraction_from_txt() {
    let mut manager = InputManager::new();
    let path = Path::new("tests/fixtures/sample_resume.txt");

    let result = manager.extract_text(path).await;
    assert!(result.is_ok());

    let text = result.unwrap();
    assert!(text.contains("John Doe"));
    assert!(text.contains("Senior Software Engineer"));
    assert!(text.contains("Rust"));
    assert!(text.contains("PostgreSQL"));
}

#[tokio::test]
async fn test_caching_functionality() {
    let mut manager = InputManager::new();
    let path = Path::new("tests/fixtures/sample_resume.txt");

    let text1 = manager.extract_text(path).await.unwrap();
    assert_eq!(manager.cache_size(), 1);

    let text2 = manager.extract_text(path).await.unwrap();
    assert_eq!(text1, text2);
    assert_eq!(manager.cache_size(), 1);
}

#[tokio::test]
async fn test_unsupported_file_type() {
    let mut manager = InputManager::new();
    let path = Path::new("tests/fixtures/unsupported.xyz");

    let result = manager.extract_text(path).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_empty_file_is_rejected() {
    let mut manager = InputManager::new();
    let path = Path::new("tests/fixtures/empty.txt");

    let result = manager.extract_text(path).await;
    assert!(result.is_err());
    let err = result.unwrap_err();
    assert!(err.to_string().contains("No text found"));
}

#[tokio::test]
async fn test_nonexistent_file() {
    let mut manager = InputManager::new();
    let path = Path::new("tests/fixtures/nonexistent.txt");

    let result = manager.extract_text(path).await;
    assert!(result.is_err());
}

#[test]
fn test_extract_bytes_matches_file_extraction() {
    let manager = InputManager::new();
    let bytes = std::fs::read("tests/fixtures/sample_resume.txt").unwrap();

    let text = manager.extract_bytes("sample_resume.txt", &bytes).unwrap();
    assert!(text.contains("John Doe"));

    // Same bytes with an unknown extension are rejected
    assert!(manager.extract_bytes("sample_resume.dat", &bytes).is_err());
}

#[test]
fn test_prompt_pipeline_end_to_end() {
    let config = Config::default();
    let builder = PromptBuilder::new(config.prompt.clone());

    let job = std::fs::read_to_string("tests/fixtures/sample_job.txt").unwrap();
    let prompt = builder.cover_letter_prompt(&CoverLetterRequest {
        resume_summary: "Backend engineer with 8 years of Rust and Python experience.",
        job_description: &job,
        company: Some("Initech"),
        position: Some("Senior Backend Engineer"),
    });

    assert!(prompt.contains("Company: Initech"));
    assert!(prompt.ends_with("I have experience with"));

    // Simulate the model echoing the prompt and continuing it
    let generated = format!(
        "{} Rust, PostgreSQL, and Kafka, which map directly to your stack.",
        prompt
    );
    let letter = extract_cover_letter(&generated, &prompt);
    assert!(letter.starts_with("Dear Hiring Manager,"));

    let formatted = format_cover_letter(&letter, Some("Initech"));
    assert!(formatted.starts_with("Dear Hiring Manager,"));
    assert!(!formatted.contains("\n\n\n"));
    let lower = formatted.to_lowercase();
    assert!(
        lower.contains("thank you") || lower.contains("best regards") || lower.contains("sincerely")
    );
}

#[test]
fn test_application_request_defaults() {
    let request = ApplicationRequest {
        resume_text: "Engineer.".to_string(),
        job_description: "Role.".to_string(),
        ..Default::default()
    };
    assert!(request.company.is_none());
    assert!(request.position.is_none());
}

#[tokio::test]
async fn test_web_form_and_health_routes() {
    let form = resume_writer::web::handlers::form().await;
    assert!(form.is_ok());
    let page = form.unwrap().0;
    assert!(page.contains("job_description"));
    assert!(page.contains("resume_file"));
    assert!(page.contains("action=\"/generate\""));

    let health = resume_writer::web::handlers::health().await;
    assert_eq!(health.0["status"], "ok");
}
