//! Label and refinement workflow.
//!
//! # Responsibility
//! - Batch label creation under the per-project cap.
//! - Provider-backed generation, manual text entry, and feedback-driven
//!   rework of refinements keyed by `(label, difficulty)`.
//! - Owner-scoped label/refinement reads and label deletion.
//!
//! # Invariants
//! - Ownership is resolved through the owning project before any input
//!   validation or provider call.
//! - Provider calls run with no transaction open; results are persisted only
//!   after every required call succeeded.
//! - A provider failure leaves stored refinements exactly as they were.

use super::owned_project;
use crate::config::{AppConfig, LimitsConfig};
use crate::error::{WorkflowError, WorkflowResult};
use crate::generation::{
    require_text, GenerationError, GenerationProvider, ReconstructRequest, RefineRequest,
};
use crate::model::label::{normalize_label_text, Label, LabelId};
use crate::model::project::{Project, ProjectId};
use crate::model::refinement::{
    Difficulty, Refinement, RefinementEdit, RefinementId, RefinementPatch,
};
use crate::model::text::MANUAL_TEXT;
use crate::model::view::{
    label_detail, label_summary, refinement_detail, LabelDetail, LabelSummary, RefinementDetail,
};
use crate::model::UserId;
use crate::repo::label_repo::{LabelCapacity, LabelRepository, SqliteLabelRepository};
use crate::repo::project_repo::{ProjectAuthority, ProjectRepository, SqliteProjectRepository};
use crate::repo::refinement_repo::{RefinementRepository, SqliteRefinementRepository};
use crate::repo::RepoResult;
use log::{error, info, warn};
use rusqlite::Connection;
use std::time::Instant;

/// Label count limits enforced by [`RefinementWorkflow::add_labels`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowLimits {
    pub max_labels_per_project: u32,
    pub max_labels_per_request: u32,
}

impl Default for WorkflowLimits {
    fn default() -> Self {
        Self::from(&LimitsConfig::default())
    }
}

impl From<&LimitsConfig> for WorkflowLimits {
    fn from(value: &LimitsConfig) -> Self {
        Self {
            max_labels_per_project: value.max_labels_per_project,
            max_labels_per_request: value.max_labels_per_request,
        }
    }
}

/// Workflow over SQLite repositories sharing one connection.
pub type SqliteRefinementWorkflow<'conn, G> = RefinementWorkflow<
    SqliteProjectRepository<'conn>,
    SqliteLabelRepository<'conn>,
    SqliteRefinementRepository<'conn>,
    G,
>;

/// Orchestrates label storage, refinement storage, and the generation provider.
pub struct RefinementWorkflow<P, L, R, G>
where
    P: ProjectRepository + ProjectAuthority,
    L: LabelRepository,
    R: RefinementRepository,
    G: GenerationProvider,
{
    projects: P,
    labels: L,
    refinements: R,
    provider: G,
    limits: WorkflowLimits,
}

impl<'conn, G: GenerationProvider> SqliteRefinementWorkflow<'conn, G> {
    /// Builds the workflow from a migrated connection with default limits.
    pub fn try_from_connection(conn: &'conn Connection, provider: G) -> RepoResult<Self> {
        Ok(Self::new(
            SqliteProjectRepository::try_new(conn)?,
            SqliteLabelRepository::try_new(conn)?,
            SqliteRefinementRepository::try_new(conn)?,
            provider,
        ))
    }

    /// Builds the workflow with the `[limits]` section of `config`.
    pub fn try_from_config(
        conn: &'conn Connection,
        provider: G,
        config: &AppConfig,
    ) -> RepoResult<Self> {
        Ok(Self::try_from_connection(conn, provider)?
            .with_limits(WorkflowLimits::from(&config.limits)))
    }
}

impl<P, L, R, G> RefinementWorkflow<P, L, R, G>
where
    P: ProjectRepository + ProjectAuthority,
    L: LabelRepository,
    R: RefinementRepository,
    G: GenerationProvider,
{
    pub fn new(projects: P, labels: L, refinements: R, provider: G) -> Self {
        Self {
            projects,
            labels,
            refinements,
            provider,
            limits: WorkflowLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: WorkflowLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> WorkflowLimits {
        self.limits
    }

    /// Creates labels on an owned project, in input order.
    ///
    /// # Contract
    /// - `texts` holds 1..=`max_labels_per_request` entries.
    /// - Entries blank or longer than 100 chars after trim are skipped.
    /// - The cap counts every submitted entry, skipped ones included; a batch
    ///   that would overflow it persists nothing.
    pub fn add_labels(
        &self,
        user_id: UserId,
        project_id: ProjectId,
        texts: &[String],
    ) -> WorkflowResult<Vec<Label>> {
        owned_project(&self.projects, user_id, project_id)?;

        let max_per_request = self.limits.max_labels_per_request as usize;
        if texts.is_empty() || texts.len() > max_per_request {
            return Err(WorkflowError::InvalidArgument(format!(
                "texts must contain between 1 and {max_per_request} entries, got {}",
                texts.len()
            )));
        }

        let accepted: Vec<String> = texts
            .iter()
            .filter_map(|text| normalize_label_text(text))
            .collect();
        let capacity = LabelCapacity {
            max_per_project: self.limits.max_labels_per_project,
            requested: texts.len() as u32,
        };

        match self.labels.create_labels(project_id, &accepted, capacity) {
            Ok(labels) => {
                info!(
                    "event=label_add module=workflow status=ok project_id={} submitted={} created={}",
                    project_id,
                    texts.len(),
                    labels.len()
                );
                Ok(labels)
            }
            Err(err) => {
                let err = WorkflowError::from(err);
                warn!(
                    "event=label_add module=workflow status=error project_id={} submitted={} error_code={}",
                    project_id,
                    texts.len(),
                    err.kind().code()
                );
                Err(err)
            }
        }
    }

    /// Generates text for one tier and upserts it under `(label_id, difficulty)`.
    pub fn generate(
        &self,
        user_id: UserId,
        label_id: LabelId,
        difficulty: Difficulty,
    ) -> WorkflowResult<Refinement> {
        let (label, project) = self.owned_label(user_id, label_id)?;
        let text = self.refine_one(&label, &project, difficulty)?;
        let refinement = self
            .refinements
            .upsert_refinement(label_id, difficulty, &text)?;
        info!(
            "event=refinement_generate module=workflow status=ok label_id={} difficulty={} refinement_id={}",
            label_id, difficulty, refinement.id
        );
        Ok(refinement)
    }

    /// Generates every tier, then persists all three in one transaction.
    ///
    /// The first provider failure aborts the call before anything is written;
    /// the error names the failing tier.
    pub fn generate_all(
        &self,
        user_id: UserId,
        label_id: LabelId,
    ) -> WorkflowResult<Vec<Refinement>> {
        let (label, project) = self.owned_label(user_id, label_id)?;

        let mut generated = Vec::with_capacity(Difficulty::ALL.len());
        for difficulty in Difficulty::ALL {
            let text = self.refine_one(&label, &project, difficulty)?;
            generated.push((difficulty, text));
        }

        let refinements = self.refinements.upsert_refinements(label_id, &generated)?;
        info!(
            "event=refinement_generate_all module=workflow status=ok label_id={} count={}",
            label_id,
            refinements.len()
        );
        Ok(refinements)
    }

    /// Stores caller-supplied text under `(label_id, difficulty)`.
    pub fn set_manual_text(
        &self,
        user_id: UserId,
        label_id: LabelId,
        difficulty: Difficulty,
        text: &str,
    ) -> WorkflowResult<Refinement> {
        self.owned_label(user_id, label_id)?;
        let text = MANUAL_TEXT.normalize(text)?;
        let refinement = self
            .refinements
            .upsert_refinement(label_id, difficulty, &text)?;
        info!(
            "event=refinement_manual module=workflow status=ok label_id={} difficulty={} text_chars={}",
            label_id,
            difficulty,
            text.chars().count()
        );
        Ok(refinement)
    }

    /// Applies exactly one of feedback-driven rework or direct overwrite.
    pub fn patch_refinement(
        &self,
        user_id: UserId,
        refinement_id: RefinementId,
        patch: RefinementPatch,
    ) -> WorkflowResult<Refinement> {
        let (refinement, label) = self.owned_refinement(user_id, refinement_id)?;
        let text = match patch.into_edit()? {
            RefinementEdit::ReplaceText(text) => text,
            RefinementEdit::Feedback(feedback) => {
                let request = ReconstructRequest {
                    previous_text: &refinement.generated_text,
                    feedback: &feedback,
                    label_text: &label.text,
                    difficulty: refinement.difficulty,
                };
                self.call_provider(label.id, refinement.difficulty, "reconstruct", || {
                    self.provider.reconstruct(&request)
                })?
            }
        };

        let updated = self
            .refinements
            .update_refinement_text(refinement_id, &text)?;
        info!(
            "event=refinement_patch module=workflow status=ok refinement_id={} difficulty={}",
            refinement_id, updated.difficulty
        );
        Ok(updated)
    }

    /// Deletes an owned label and every refinement under it.
    pub fn delete_label(&self, user_id: UserId, label_id: LabelId) -> WorkflowResult<()> {
        self.owned_label(user_id, label_id)?;
        self.labels.delete_label(label_id)?;
        info!(
            "event=label_delete module=workflow status=ok label_id={}",
            label_id
        );
        Ok(())
    }

    /// Loads an owned label with its project and refinements.
    pub fn get_label(&self, user_id: UserId, label_id: LabelId) -> WorkflowResult<LabelDetail> {
        let (label, project) = self.owned_label(user_id, label_id)?;
        let refinements = self.refinements.list_refinements(label_id)?;
        Ok(label_detail(&label, &project, &refinements))
    }

    /// Lists labels of an owned project in creation order.
    pub fn list_labels(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> WorkflowResult<Vec<LabelSummary>> {
        owned_project(&self.projects, user_id, project_id)?;
        self.labels
            .list_labels(project_id)?
            .iter()
            .map(|label| -> WorkflowResult<LabelSummary> {
                let refinements = self.refinements.list_refinements(label.id)?;
                Ok(label_summary(label, &refinements))
            })
            .collect()
    }

    /// Loads an owned refinement with the label it explains.
    pub fn get_refinement(
        &self,
        user_id: UserId,
        refinement_id: RefinementId,
    ) -> WorkflowResult<RefinementDetail> {
        let (refinement, label) = self.owned_refinement(user_id, refinement_id)?;
        Ok(refinement_detail(&refinement, &label))
    }

    fn refine_one(
        &self,
        label: &Label,
        project: &Project,
        difficulty: Difficulty,
    ) -> WorkflowResult<String> {
        let request = RefineRequest {
            label_text: &label.text,
            difficulty,
            project_name: &project.name,
            project_description: &project.description,
        };
        self.call_provider(label.id, difficulty, "refine", || {
            self.provider.refine(&request)
        })
    }

    fn call_provider(
        &self,
        label_id: LabelId,
        difficulty: Difficulty,
        operation: &'static str,
        call: impl FnOnce() -> Result<String, GenerationError>,
    ) -> WorkflowResult<String> {
        let started_at = Instant::now();
        match call().and_then(require_text) {
            Ok(text) => Ok(text),
            Err(err) => {
                error!(
                    "event=provider_call module=workflow status=error operation={} label_id={} difficulty={} duration_ms={} error_code=generation_failed error={}",
                    operation,
                    label_id,
                    difficulty,
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(WorkflowError::generation(label_id, difficulty, err))
            }
        }
    }

    fn owned_label(&self, user_id: UserId, label_id: LabelId) -> WorkflowResult<(Label, Project)> {
        let label = self
            .labels
            .get_label(label_id)?
            .ok_or(WorkflowError::NotFoundOrForbidden)?;
        let project = owned_project(&self.projects, user_id, label.project_id)?;
        Ok((label, project))
    }

    fn owned_refinement(
        &self,
        user_id: UserId,
        refinement_id: RefinementId,
    ) -> WorkflowResult<(Refinement, Label)> {
        let refinement = self
            .refinements
            .get_refinement(refinement_id)?
            .ok_or(WorkflowError::NotFoundOrForbidden)?;
        let (label, _) = self.owned_label(user_id, refinement.label_id)?;
        Ok((refinement, label))
    }
}
