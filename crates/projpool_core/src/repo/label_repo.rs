//! Label repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Batch creation checks the per-project cap and inserts inside one
//!   immediate transaction, so a rejected batch persists nothing.
//! - Label listing is deterministic: creation order.
//! - Deleting a label removes its refinements via `ON DELETE CASCADE`.

use super::{ensure_schema_ready, parse_uuid, RepoError, RepoResult};
use crate::model::label::{Label, LabelId};
use crate::model::project::ProjectId;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const LABEL_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    text,
    created_at
FROM labels";

/// Capacity rule applied atomically with a batch insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelCapacity {
    /// Ceiling on labels held by one project.
    pub max_per_project: u32,
    /// Slots the request claims, counted before blank entries are dropped.
    pub requested: u32,
}

/// Repository interface for label operations.
pub trait LabelRepository {
    /// Inserts `texts` in order if `capacity` allows; returns stored labels.
    fn create_labels(
        &self,
        project_id: ProjectId,
        texts: &[String],
        capacity: LabelCapacity,
    ) -> RepoResult<Vec<Label>>;
    fn get_label(&self, label_id: LabelId) -> RepoResult<Option<Label>>;
    fn list_labels(&self, project_id: ProjectId) -> RepoResult<Vec<Label>>;
    /// Deletes one label together with its refinements.
    fn delete_label(&self, label_id: LabelId) -> RepoResult<()>;
}

/// SQLite-backed label repository.
pub struct SqliteLabelRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLabelRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl LabelRepository for SqliteLabelRepository<'_> {
    fn create_labels(
        &self,
        project_id: ProjectId,
        texts: &[String],
        capacity: LabelCapacity,
    ) -> RepoResult<Vec<Label>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        let existing = count_labels_in(&tx, project_id)?;
        if existing + capacity.requested > capacity.max_per_project {
            return Err(RepoError::CapacityExceeded {
                project_id,
                existing,
                requested: capacity.requested,
                max: capacity.max_per_project,
            });
        }

        let mut label_ids = Vec::with_capacity(texts.len());
        for text in texts {
            let label_id = Uuid::new_v4();
            tx.execute(
                "INSERT INTO labels (id, project_id, text) VALUES (?1, ?2, ?3);",
                params![label_id.to_string(), project_id.to_string(), text.as_str()],
            )?;
            label_ids.push(label_id);
        }
        tx.commit()?;

        label_ids
            .into_iter()
            .map(|label_id| {
                self.get_label(label_id)?
                    .ok_or_else(|| not_found(label_id))
            })
            .collect()
    }

    fn get_label(&self, label_id: LabelId) -> RepoResult<Option<Label>> {
        self.conn
            .query_row(
                &format!("{LABEL_SELECT_SQL} WHERE id = ?1;"),
                [label_id.to_string()],
                |row| Ok(read_label_columns(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_labels(&self, project_id: ProjectId) -> RepoResult<Vec<Label>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LABEL_SELECT_SQL}
             WHERE project_id = ?1
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([project_id.to_string()])?;
        let mut labels = Vec::new();
        while let Some(row) = rows.next()? {
            labels.push(read_label_columns(row)?);
        }
        Ok(labels)
    }

    fn delete_label(&self, label_id: LabelId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM labels WHERE id = ?1;", [label_id.to_string()])?;
        if changed == 0 {
            return Err(not_found(label_id));
        }
        Ok(())
    }
}

fn not_found(label_id: LabelId) -> RepoError {
    RepoError::NotFound {
        entity: "label",
        id: label_id,
    }
}

fn count_labels_in(conn: &Connection, project_id: ProjectId) -> RepoResult<u32> {
    let count: u32 = conn.query_row(
        "SELECT COUNT(*) FROM labels WHERE project_id = ?1;",
        [project_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

fn read_label_columns(row: &Row<'_>) -> RepoResult<Label> {
    let id: String = row.get("id")?;
    let project_id: String = row.get("project_id")?;
    Ok(Label {
        id: parse_uuid(&id, "labels.id")?,
        project_id: parse_uuid(&project_id, "labels.project_id")?,
        text: row.get("text")?,
        created_at: row.get("created_at")?,
    })
}
