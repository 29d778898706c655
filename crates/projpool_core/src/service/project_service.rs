//! Project use-case service.
//!
//! # Responsibility
//! - Owner-scoped create, read, update, and delete of projects.
//! - Public feed listing across all owners.
//!
//! # Invariants
//! - A project the caller does not own is reported exactly like a missing one.
//! - Renaming or re-describing a project never touches stored refinements.

use super::owned_project;
use crate::error::WorkflowResult;
use crate::model::project::{NewProject, Project, ProjectId, ProjectUpdate};
use crate::model::view::{label_summary, project_detail, LabelSummary, ProjectDetail};
use crate::model::UserId;
use crate::repo::label_repo::{LabelRepository, SqliteLabelRepository};
use crate::repo::project_repo::{ProjectAuthority, ProjectRepository, SqliteProjectRepository};
use crate::repo::refinement_repo::{RefinementRepository, SqliteRefinementRepository};
use crate::repo::RepoResult;
use log::info;
use rusqlite::Connection;

/// Project service over SQLite repositories sharing one connection.
pub type SqliteProjectService<'conn> = ProjectService<
    SqliteProjectRepository<'conn>,
    SqliteLabelRepository<'conn>,
    SqliteRefinementRepository<'conn>,
>;

/// Use-case service for project CRUD and project detail reads.
pub struct ProjectService<P, L, R>
where
    P: ProjectRepository + ProjectAuthority,
    L: LabelRepository,
    R: RefinementRepository,
{
    projects: P,
    labels: L,
    refinements: R,
}

impl<'conn> SqliteProjectService<'conn> {
    /// Builds the service from a migrated connection.
    pub fn try_from_connection(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Self::new(
            SqliteProjectRepository::try_new(conn)?,
            SqliteLabelRepository::try_new(conn)?,
            SqliteRefinementRepository::try_new(conn)?,
        ))
    }
}

impl<P, L, R> ProjectService<P, L, R>
where
    P: ProjectRepository + ProjectAuthority,
    L: LabelRepository,
    R: RefinementRepository,
{
    pub fn new(projects: P, labels: L, refinements: R) -> Self {
        Self {
            projects,
            labels,
            refinements,
        }
    }

    /// Creates a project owned by `owner_id`.
    pub fn create_project(
        &self,
        owner_id: UserId,
        name: &str,
        description: &str,
    ) -> WorkflowResult<Project> {
        let new_project = NewProject::new(name, description)?;
        let project = self.projects.create_project(owner_id, &new_project)?;
        info!(
            "event=project_create module=service status=ok project_id={}",
            project.id
        );
        Ok(project)
    }

    /// Loads one owned project with its labels and their refinements.
    pub fn get_project(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> WorkflowResult<ProjectDetail> {
        let project = owned_project(&self.projects, user_id, project_id)?;
        self.detail(&project)
    }

    /// Lists the caller's projects, oldest first.
    pub fn list_projects(&self, user_id: UserId) -> WorkflowResult<Vec<ProjectDetail>> {
        self.projects
            .list_projects_by_owner(user_id)?
            .iter()
            .map(|project| self.detail(project))
            .collect()
    }

    /// Lists every project, newest first. No ownership filter applies.
    pub fn list_public_projects(&self) -> WorkflowResult<Vec<ProjectDetail>> {
        self.projects
            .list_all_projects()?
            .iter()
            .map(|project| self.detail(project))
            .collect()
    }

    /// Applies a partial update. An empty update returns the project unchanged.
    pub fn update_project(
        &self,
        user_id: UserId,
        project_id: ProjectId,
        update: &ProjectUpdate,
    ) -> WorkflowResult<Project> {
        let current = owned_project(&self.projects, user_id, project_id)?;
        let update = update.normalized()?;
        if update.is_empty() {
            return Ok(current);
        }
        let project = self.projects.update_project(project_id, &update)?;
        info!(
            "event=project_update module=service status=ok project_id={}",
            project_id
        );
        Ok(project)
    }

    /// Deletes a project together with its labels and refinements.
    pub fn delete_project(&self, user_id: UserId, project_id: ProjectId) -> WorkflowResult<()> {
        owned_project(&self.projects, user_id, project_id)?;
        self.projects.delete_project(project_id)?;
        info!(
            "event=project_delete module=service status=ok project_id={}",
            project_id
        );
        Ok(())
    }

    fn detail(&self, project: &Project) -> WorkflowResult<ProjectDetail> {
        let labels = self
            .labels
            .list_labels(project.id)?
            .iter()
            .map(|label| -> WorkflowResult<LabelSummary> {
                let refinements = self.refinements.list_refinements(label.id)?;
                Ok(label_summary(label, &refinements))
            })
            .collect::<WorkflowResult<Vec<_>>>()?;
        Ok(project_detail(project, labels))
    }
}
