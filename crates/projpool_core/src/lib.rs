//! Core domain logic for ProjPool.
//! This crate is the single source of truth for project, label, and
//! refinement invariants.

pub mod config;
pub mod db;
pub mod error;
pub mod generation;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{AppConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, open_db_with_config, DbError};
pub use error::{ErrorKind, WorkflowError, WorkflowResult};
pub use generation::gemini::GeminiProvider;
pub use generation::{GenerationError, GenerationProvider, ReconstructRequest, RefineRequest};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::label::{Label, LabelId};
pub use model::project::{Project, ProjectId, ProjectUpdate};
pub use model::refinement::{Difficulty, Refinement, RefinementId, RefinementPatch};
pub use model::UserId;
pub use repo::{RepoError, RepoResult};
pub use service::project_service::{ProjectService, SqliteProjectService};
pub use service::refinement_workflow::{
    RefinementWorkflow, SqliteRefinementWorkflow, WorkflowLimits,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
