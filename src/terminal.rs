//! Interactive terminal mode: the same pipeline as the web form, driven by
//! stdin prompts.

use crate::config::Config;
use crate::engine::{ApplicationRequest, ResumeEngine};
use crate::error::Result;
use crate::input::manager::InputManager;
use colored::*;
use std::io::{self, BufRead, Write};
use std::path::Path;

pub async fn run(config: &Config) -> Result<()> {
    println!("\n💼 {}", "Resume Writer".bold());
    println!("{}", "Local resume summaries and cover letters".dimmed());
    println!();

    let mut engine = ResumeEngine::load(config).await?;
    let mut input_manager = InputManager::new();

    loop {
        let resume_text = read_resume(&mut input_manager).await?;
        let job_description = read_multiline("📋 Paste the job description (finish with an empty line):")?;

        if job_description.trim().is_empty() {
            println!("{}", "⚠️  Job description is required".yellow());
            continue;
        }

        let company = optional(read_line("🏢 Company name (optional): ")?);
        let position = optional(read_line("💺 Position title (optional): ")?);

        println!("\n🔄 Working on it, this can take a minute on CPU...\n");

        let request = ApplicationRequest {
            resume_text,
            job_description,
            company,
            position,
        };

        match engine.write_application(&request) {
            Ok(draft) => {
                println!("{}", "📄 Resume Summary".bold().green());
                println!("{}", "─".repeat(60));
                println!("{}\n", draft.resume_summary);
                println!("{}", "✉️  Cover Letter".bold().green());
                println!("{}", "─".repeat(60));
                println!("{}\n", draft.cover_letter);
            }
            Err(e) => {
                println!("{} {}", "❌ Failed:".red(), e);
            }
        }

        let again = read_line("Generate another? (y/n): ")?;
        if !again.trim().eq_ignore_ascii_case("y") {
            println!("👋 Goodbye!");
            break;
        }
        println!();
    }

    Ok(())
}

async fn read_resume(input_manager: &mut InputManager) -> Result<String> {
    loop {
        println!("How would you like to provide your resume?");
        println!("  1. 📁 Load from a file (PDF, DOCX, or TXT)");
        println!("  2. ⌨️  Paste the text");
        let choice = read_line("Choice (1/2): ")?;

        match choice.trim() {
            "1" => {
                let path = read_line("📁 Path to resume file: ")?;
                match input_manager.extract_text(Path::new(path.trim())).await {
                    Ok(text) => return Ok(text),
                    Err(e) => println!("{} {}", "❌".red(), e),
                }
            }
            "2" => {
                let text = read_multiline("⌨️  Paste your resume (finish with an empty line):")?;
                if text.trim().is_empty() {
                    println!("{}", "⚠️  Resume text cannot be empty".yellow());
                } else {
                    return Ok(text);
                }
            }
            _ => println!("{}", "⚠️  Please enter 1 or 2".yellow()),
        }
    }
}

fn read_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end().to_string())
}

fn read_multiline(prompt: &str) -> Result<String> {
    println!("{}", prompt);

    let stdin = io::stdin();
    let mut lines = Vec::new();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            break;
        }
        lines.push(line);
    }

    Ok(lines.join("\n"))
}

fn optional(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
