//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository and provider calls into use-case level APIs.
//! - Enforce ownership before touching any owned record.

pub mod project_service;
pub mod refinement_workflow;

use crate::error::{WorkflowError, WorkflowResult};
use crate::model::project::{Project, ProjectId};
use crate::model::UserId;
use crate::repo::project_repo::{ProjectAuthority, ProjectRepository};

/// Loads `project_id` if `user_id` owns it; missing and foreign look the same.
pub(crate) fn owned_project<P>(
    projects: &P,
    user_id: UserId,
    project_id: ProjectId,
) -> WorkflowResult<Project>
where
    P: ProjectRepository + ProjectAuthority,
{
    if !projects.owns_project(user_id, project_id)? {
        return Err(WorkflowError::NotFoundOrForbidden);
    }
    projects
        .get_project(project_id)?
        .ok_or(WorkflowError::NotFoundOrForbidden)
}
