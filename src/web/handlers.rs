//! Request handlers for the web form.

use crate::engine::ApplicationRequest;
use crate::error::ResumeWriterError;
use crate::web::state::AppState;
use askama::Template;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Resume Writer</title>
<style>
body { font-family: sans-serif; max-width: 720px; margin: 2em auto; padding: 0 1em; }
label { display: block; margin-top: 1em; font-weight: bold; }
textarea, input[type=text] { width: 100%; box-sizing: border-box; padding: 0.4em; }
textarea { min-height: 8em; }
button { margin-top: 1.5em; padding: 0.6em 2em; font-size: 1em; }
.hint { color: #666; font-size: 0.85em; }
</style>
</head>
<body>
<h1>📝 Resume Writer</h1>
<p>Upload a resume and paste a job description to get a summary and a draft cover letter. Everything runs locally.</p>
<form action="/generate" method="post" enctype="multipart/form-data">
<label for="resume_file">Resume file (PDF, DOCX, or TXT)</label>
<input type="file" id="resume_file" name="resume_file" accept=".pdf,.docx,.doc,.txt">
<p class="hint">Or paste the resume text below instead.</p>
<label for="resume_text">Resume text</label>
<textarea id="resume_text" name="resume_text"></textarea>
<label for="job_description">Job description</label>
<textarea id="job_description" name="job_description" required></textarea>
<label for="company">Company (optional)</label>
<input type="text" id="company" name="company">
<label for="position">Position (optional)</label>
<input type="text" id="position" name="position">
<button type="submit">Generate</button>
</form>
</body>
</html>
"#,
    ext = "html"
)]
struct FormTemplate;

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Resume Writer - Results</title>
<style>
body { font-family: sans-serif; max-width: 720px; margin: 2em auto; padding: 0 1em; }
pre { white-space: pre-wrap; background: #f6f6f6; padding: 1em; border-radius: 4px; }
</style>
</head>
<body>
<h1>📝 Your Application Draft</h1>
<h2>Resume Summary</h2>
<pre>{{ resume_summary }}</pre>
<h2>Cover Letter</h2>
<pre>{{ cover_letter }}</pre>
<p><a href="/">← Generate another</a></p>
</body>
</html>
"#,
    ext = "html"
)]
struct ResultTemplate {
    resume_summary: String,
    cover_letter: String,
}

/// Error wrapper that maps pipeline errors to HTTP responses. Input problems
/// become 400s; everything else is a 500.
#[derive(Debug)]
pub struct WebError(ResumeWriterError);

impl From<ResumeWriterError> for WebError {
    fn from(err: ResumeWriterError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = if self.0.is_user_error() {
            log::warn!("Rejected request: {}", self.0);
            StatusCode::BAD_REQUEST
        } else {
            log::error!("Request failed: {}", self.0);
            StatusCode::INTERNAL_SERVER_ERROR
        };

        let message = self
            .0
            .to_string()
            .replace('<', "&lt;")
            .replace('>', "&gt;");
        let body = format!(
            "<!DOCTYPE html><html><body style=\"font-family: sans-serif; max-width: 720px; margin: 2em auto;\">\
            <h1>⚠️ Something went wrong</h1><p>{}</p><p><a href=\"/\">← Back</a></p></body></html>",
            message
        );

        (status, Html(body)).into_response()
    }
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> ResumeWriterError {
    ResumeWriterError::InvalidInput(format!("Malformed form upload: {}", e))
}

pub async fn form() -> Result<Html<String>, WebError> {
    let page = FormTemplate.render().map_err(ResumeWriterError::from)?;
    Ok(Html(page))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "resume-writer",
    }))
}

pub async fn generate(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Html<String>, WebError> {
    let mut resume_file: Option<(String, Vec<u8>)> = None;
    let mut resume_text = String::new();
    let mut job_description = String::new();
    let mut company: Option<String> = None;
    let mut position: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "resume_file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                if !file_name.is_empty() && !bytes.is_empty() {
                    resume_file = Some((file_name, bytes.to_vec()));
                }
            }
            "resume_text" => resume_text = field.text().await.map_err(multipart_error)?,
            "job_description" => job_description = field.text().await.map_err(multipart_error)?,
            "company" => company = non_empty(field.text().await.map_err(multipart_error)?),
            "position" => position = non_empty(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }

    // The uploaded file wins when both a file and pasted text are present
    let resume = match resume_file {
        Some((file_name, bytes)) => state.input.extract_bytes(&file_name, &bytes)?,
        None if !resume_text.trim().is_empty() => resume_text,
        None => {
            return Err(ResumeWriterError::InvalidInput(
                "Please upload a resume file or paste resume text".to_string(),
            )
            .into());
        }
    };

    if job_description.trim().is_empty() {
        return Err(ResumeWriterError::InvalidInput(
            "Please provide a job description".to_string(),
        )
        .into());
    }

    let request = ApplicationRequest {
        resume_text: resume,
        job_description,
        company,
        position,
    };

    // Inference runs for minutes on CPU; move it off the async workers so
    // the server (health checks included) stays responsive meanwhile.
    let mut engine = state.engine.clone().lock_owned().await;
    let draft = tokio::task::spawn_blocking(move || engine.write_application(&request))
        .await
        .map_err(|e| {
            ResumeWriterError::Generation(format!("Generation task failed: {}", e))
        })??;

    let page = ResultTemplate {
        resume_summary: draft.resume_summary,
        cover_letter: draft.cover_letter,
    }
    .render()
    .map_err(ResumeWriterError::from)?;

    Ok(Html(page))
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use crate::engine::ResumeEngine;

    // The generation call moves the engine guard into a blocking task, which
    // requires it to be Send. This fails to compile if a model backend ever
    // picks up a thread-bound field.
    #[test]
    fn test_engine_guard_moves_across_threads() {
        fn assert_send<T: Send + 'static>() {}
        assert_send::<tokio::sync::OwnedMutexGuard<ResumeEngine>>();
    }
}
