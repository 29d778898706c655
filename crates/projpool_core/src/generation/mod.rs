//! Text-generation capability consumed by the refinement workflow.
//!
//! # Responsibility
//! - Define the provider contract (`refine`, `reconstruct`).
//! - Own prompt templates and the Vertex AI Gemini adapter.
//!
//! # Invariants
//! - A provider never returns blank text as success.
//! - Timeouts surface as ordinary `GenerationError`s.

pub mod gemini;
pub mod prompt;

use crate::model::refinement::Difficulty;
use std::sync::Arc;

/// Inputs for first-time generation of one difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefineRequest<'a> {
    pub label_text: &'a str,
    pub difficulty: Difficulty,
    pub project_name: &'a str,
    pub project_description: &'a str,
}

/// Inputs for feedback-driven rework of existing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconstructRequest<'a> {
    pub previous_text: &'a str,
    pub feedback: &'a str,
    pub label_text: &'a str,
    pub difficulty: Difficulty,
}

/// Provider failures. Every variant is safe to retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// Provider is misconfigured or could not be initialized.
    #[error("generation provider unavailable: {0}")]
    Unavailable(String),
    /// Transport failure, timeout, or non-success status.
    #[error("generation request failed: {0}")]
    Request(String),
    /// Response could not be decoded.
    #[error("generation response invalid: {0}")]
    InvalidResponse(String),
    #[error("generation provider returned empty text")]
    EmptyOutput,
}

/// External text-generation capability.
pub trait GenerationProvider: Send + Sync {
    /// Generates explanatory text for one label at one difficulty.
    fn refine(&self, request: &RefineRequest<'_>) -> Result<String, GenerationError>;
    /// Reworks previously generated text according to user feedback.
    fn reconstruct(&self, request: &ReconstructRequest<'_>) -> Result<String, GenerationError>;
}

impl<T: GenerationProvider + ?Sized> GenerationProvider for &T {
    fn refine(&self, request: &RefineRequest<'_>) -> Result<String, GenerationError> {
        (**self).refine(request)
    }

    fn reconstruct(&self, request: &ReconstructRequest<'_>) -> Result<String, GenerationError> {
        (**self).reconstruct(request)
    }
}

impl<T: GenerationProvider + ?Sized> GenerationProvider for Arc<T> {
    fn refine(&self, request: &RefineRequest<'_>) -> Result<String, GenerationError> {
        (**self).refine(request)
    }

    fn reconstruct(&self, request: &ReconstructRequest<'_>) -> Result<String, GenerationError> {
        (**self).reconstruct(request)
    }
}

/// Rejects blank provider output; returns the text unchanged otherwise.
pub fn require_text(text: String) -> Result<String, GenerationError> {
    if text.trim().is_empty() {
        return Err(GenerationError::EmptyOutput);
    }
    Ok(text)
}
