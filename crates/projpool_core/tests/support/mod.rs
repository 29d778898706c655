#![allow(dead_code)]

use projpool_core::db::open_db_in_memory;
use projpool_core::{
    Difficulty, GenerationError, GenerationProvider, Label, Project, ReconstructRequest,
    RefineRequest, SqliteProjectService, SqliteRefinementWorkflow, UserId,
};
use rusqlite::Connection;
use std::collections::VecDeque;
use std::sync::Mutex;
use uuid::Uuid;

/// One provider call as seen by the test double.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    Refine {
        label_text: String,
        difficulty: Difficulty,
        project_name: String,
        project_description: String,
    },
    Reconstruct {
        previous_text: String,
        feedback: String,
        label_text: String,
        difficulty: Difficulty,
    },
}

/// Provider returning queued outcomes in order and recording every call.
///
/// An exhausted queue answers with `GenerationError::Unavailable`.
#[derive(Default)]
pub struct ScriptedProvider {
    outcomes: Mutex<VecDeque<Result<String, GenerationError>>>,
    calls: Mutex<Vec<ProviderCall>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        let provider = Self::new();
        for text in texts {
            provider.push_ok(text);
        }
        provider
    }

    pub fn push_ok(&self, text: &str) {
        self.outcomes.lock().unwrap().push_back(Ok(text.to_string()));
    }

    pub fn push_err(&self, err: GenerationError) {
        self.outcomes.lock().unwrap().push_back(Err(err));
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next_outcome(&self, call: ProviderCall) -> Result<String, GenerationError> {
        self.calls.lock().unwrap().push(call);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GenerationError::Unavailable("script exhausted".to_string())))
    }
}

impl GenerationProvider for ScriptedProvider {
    fn refine(&self, request: &RefineRequest<'_>) -> Result<String, GenerationError> {
        self.next_outcome(ProviderCall::Refine {
            label_text: request.label_text.to_string(),
            difficulty: request.difficulty,
            project_name: request.project_name.to_string(),
            project_description: request.project_description.to_string(),
        })
    }

    fn reconstruct(&self, request: &ReconstructRequest<'_>) -> Result<String, GenerationError> {
        self.next_outcome(ProviderCall::Reconstruct {
            previous_text: request.previous_text.to_string(),
            feedback: request.feedback.to_string(),
            label_text: request.label_text.to_string(),
            difficulty: request.difficulty,
        })
    }
}

pub fn open() -> Connection {
    open_db_in_memory().unwrap()
}

pub fn projects(conn: &Connection) -> SqliteProjectService<'_> {
    SqliteProjectService::try_from_connection(conn).unwrap()
}

pub fn workflow<'conn, 'p>(
    conn: &'conn Connection,
    provider: &'p ScriptedProvider,
) -> SqliteRefinementWorkflow<'conn, &'p ScriptedProvider> {
    SqliteRefinementWorkflow::try_from_connection(conn, provider).unwrap()
}

pub fn user() -> UserId {
    Uuid::new_v4()
}

pub fn create_project(conn: &Connection, owner: UserId) -> Project {
    projects(conn)
        .create_project(owner, "Garden shed", "Build a small shed from a kit")
        .unwrap()
}

pub fn add_label(conn: &Connection, owner: UserId, project: &Project, text: &str) -> Label {
    let provider = ScriptedProvider::new();
    workflow(conn, &provider)
        .add_labels(owner, project.id, &texts(&[text]))
        .unwrap()
        .remove(0)
}

pub fn texts(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

pub fn refinement_rows_for(conn: &Connection, label_id: Uuid, difficulty: Difficulty) -> i64 {
    conn.query_row(
        "SELECT COUNT(*) FROM refinements WHERE label_id = ?1 AND difficulty = ?2;",
        [label_id.to_string(), difficulty.as_str().to_string()],
        |row| row.get(0),
    )
    .unwrap()
}
