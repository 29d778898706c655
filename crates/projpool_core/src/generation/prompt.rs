//! Prompt templates for refinement and reconstruction.
//!
//! One fixed template per difficulty tier. Every prompt forbids follow-up
//! questions.

use super::{ReconstructRequest, RefineRequest};
use crate::model::refinement::Difficulty;

const SINGLE_USE_PREAMBLE: &str = "You are writing single-use guidance for a client. \
Do not ask follow-up questions or offer further help.";

/// Builds the generation prompt for `request.difficulty`.
pub fn refine_prompt(request: &RefineRequest<'_>) -> String {
    let RefineRequest {
        label_text,
        difficulty,
        project_name,
        project_description,
    } = *request;

    let body = match difficulty {
        Difficulty::Simple => format!(
            "Give a short overview, then a step-by-step checklist with clear, \
             hand-holding guidance so a beginner can complete the '{label_text}' \
             part of the '{project_name}' project."
        ),
        Difficulty::Intermediate => format!(
            "Give a short overview, then a well-described checklist with \
             well-explained guidance steps so someone with intermediate experience \
             can complete the '{label_text}' part of the '{project_name}' project."
        ),
        Difficulty::InDepth => format!(
            "Give a short overview, then an advanced checklist and guidance steps \
             for the '{label_text}' part of the '{project_name}' project. Treat it \
             as a challenging task and assume the reader is highly skilled."
        ),
    };

    format!(
        "{SINGLE_USE_PREAMBLE} {body} Project overview: '{project_description}'"
    )
}

/// Builds the prompt that reworks `previous_text` according to `feedback`.
pub fn reconstruct_prompt(request: &ReconstructRequest<'_>) -> String {
    format!(
        "{SINGLE_USE_PREAMBLE} Revise the guidance below for the '{label}' task \
         ({difficulty} level), changing only what the feedback asks for.\n\
         Current guidance:\n{previous}\n\
         Feedback:\n{feedback}",
        label = request.label_text,
        difficulty = request.difficulty,
        previous = request.previous_text,
        feedback = request.feedback,
    )
}
