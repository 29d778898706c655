//! Vertex AI Gemini adapter for [`GenerationProvider`].
//!
//! # Invariants
//! - Construction fails when project, model or access token are missing;
//!   there is no half-initialized client.
//! - The HTTP client carries the configured timeout; an elapsed timeout is a
//!   `GenerationError::Request` like any other transport failure.

use super::prompt::{reconstruct_prompt, refine_prompt};
use super::{require_text, GenerationError, GenerationProvider, ReconstructRequest, RefineRequest};
use crate::config::GenerationConfig;
use crate::logging::sanitize_message;
use crate::model::refinement::Difficulty;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const MAX_ERROR_BODY_CHARS: usize = 300;

/// `generateContent` request body.
#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

/// `generateContent` response body; only the fields we read.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Gemini client holding one initialized HTTP handle.
pub struct GeminiProvider {
    client: reqwest::blocking::Client,
    endpoint: String,
    access_token: String,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl GeminiProvider {
    /// Builds a provider from config, reading the token from the configured env var.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let token_var = config.access_token_env.as_str();
        let access_token = std::env::var(token_var)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| {
                GenerationError::Unavailable(format!(
                    "access token env var `{token_var}` is not set"
                ))
            })?;
        Self::with_token(config, access_token)
    }

    /// Builds a provider from config with an explicit bearer token.
    pub fn with_token(
        config: &GenerationConfig,
        access_token: impl Into<String>,
    ) -> Result<Self, GenerationError> {
        let access_token = access_token.into();
        if access_token.trim().is_empty() {
            return Err(GenerationError::Unavailable(
                "access token is blank".to_string(),
            ));
        }
        let endpoint = resolve_endpoint(config)?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| GenerationError::Unavailable(format!("http client: {err}")))?;

        info!(
            "event=generation_init module=generation status=ok region={} timeout_secs={}",
            config.region, config.timeout_secs
        );

        Ok(Self {
            client,
            endpoint,
            access_token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn generate(
        &self,
        operation: &'static str,
        difficulty: Difficulty,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        let started_at = Instant::now();
        info!(
            "event=generation_call module=generation status=start operation={operation} difficulty={difficulty} prompt_chars={}",
            prompt.chars().count()
        );

        let result = self.send(prompt);
        match &result {
            Ok(text) => info!(
                "event=generation_call module=generation status=ok operation={operation} difficulty={difficulty} duration_ms={} output_chars={}",
                started_at.elapsed().as_millis(),
                text.chars().count()
            ),
            Err(err) => error!(
                "event=generation_call module=generation status=error operation={operation} difficulty={difficulty} duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    fn send(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = GenerateContentRequest {
            contents: [Content {
                role: "user",
                parts: [RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .map_err(|err| GenerationError::Request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .unwrap_or_else(|_| "unreadable error body".to_string());
            return Err(GenerationError::Request(format!(
                "status {status}: {}",
                sanitize_message(&error_text, MAX_ERROR_BODY_CHARS)
            )));
        }

        let parsed = response
            .json::<GenerateContentResponse>()
            .map_err(|err| GenerationError::InvalidResponse(err.to_string()))?;
        extract_text(parsed)
    }
}

impl GenerationProvider for GeminiProvider {
    fn refine(&self, request: &RefineRequest<'_>) -> Result<String, GenerationError> {
        self.generate("refine", request.difficulty, &refine_prompt(request))
    }

    fn reconstruct(&self, request: &ReconstructRequest<'_>) -> Result<String, GenerationError> {
        self.generate("reconstruct", request.difficulty, &reconstruct_prompt(request))
    }
}

fn resolve_endpoint(config: &GenerationConfig) -> Result<String, GenerationError> {
    if let Some(endpoint) = config.endpoint.as_deref().filter(|v| !v.trim().is_empty()) {
        return Ok(endpoint.trim().to_string());
    }

    let project_id = required(config.project_id.as_deref(), "generation.project_id")?;
    let model_id = required(config.model_id.as_deref(), "generation.model_id")?;
    let region = required(Some(config.region.as_str()), "generation.region")?;

    Ok(format!(
        "https://{region}-aiplatform.googleapis.com/v1/projects/{project_id}/locations/{region}/publishers/google/models/{model_id}:generateContent"
    ))
}

fn required<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str, GenerationError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| GenerationError::Unavailable(format!("{name} is not configured")))
}

/// Concatenates the text parts of the first candidate.
pub(crate) fn extract_text(response: GenerateContentResponse) -> Result<String, GenerationError> {
    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default();
    require_text(text)
}
