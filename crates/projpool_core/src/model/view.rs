//! Output projections composed from base records.
//!
//! Plain views carry a record's own fields; detail views add related records
//! by composition. Nothing here is persisted.

use super::label::{Label, LabelId};
use super::project::{Project, ProjectId};
use super::refinement::{Difficulty, Refinement, RefinementId};
use super::UserId;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlainProject {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlainLabel {
    pub id: LabelId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlainRefinement {
    pub id: RefinementId,
    pub difficulty: Difficulty,
    pub generated_text: String,
}

/// Label with its refinements, as nested under a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelSummary {
    #[serde(flatten)]
    pub label: PlainLabel,
    pub refinements: Vec<PlainRefinement>,
}

/// Label with its owning project and refinements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelDetail {
    #[serde(flatten)]
    pub label: PlainLabel,
    pub project: PlainProject,
    pub refinements: Vec<PlainRefinement>,
}

/// Refinement with the label it explains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefinementDetail {
    #[serde(flatten)]
    pub refinement: PlainRefinement,
    pub input_label: PlainLabel,
}

/// Project with its owner and labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: PlainProject,
    pub owner_id: UserId,
    pub labels: Vec<LabelSummary>,
}

pub fn plain_project(project: &Project) -> PlainProject {
    PlainProject {
        id: project.id,
        name: project.name.clone(),
        description: project.description.clone(),
    }
}

pub fn plain_label(label: &Label) -> PlainLabel {
    PlainLabel {
        id: label.id,
        text: label.text.clone(),
    }
}

pub fn plain_refinement(refinement: &Refinement) -> PlainRefinement {
    PlainRefinement {
        id: refinement.id,
        difficulty: refinement.difficulty,
        generated_text: refinement.generated_text.clone(),
    }
}

pub fn label_summary(label: &Label, refinements: &[Refinement]) -> LabelSummary {
    LabelSummary {
        label: plain_label(label),
        refinements: refinements.iter().map(plain_refinement).collect(),
    }
}

pub fn label_detail(label: &Label, project: &Project, refinements: &[Refinement]) -> LabelDetail {
    LabelDetail {
        label: plain_label(label),
        project: plain_project(project),
        refinements: refinements.iter().map(plain_refinement).collect(),
    }
}

pub fn refinement_detail(refinement: &Refinement, label: &Label) -> RefinementDetail {
    RefinementDetail {
        refinement: plain_refinement(refinement),
        input_label: plain_label(label),
    }
}

pub fn project_detail(project: &Project, labels: Vec<LabelSummary>) -> ProjectDetail {
    ProjectDetail {
        project: plain_project(project),
        owner_id: project.owner_id,
        labels,
    }
}
