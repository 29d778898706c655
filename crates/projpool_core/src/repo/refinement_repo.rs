//! Refinement repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Writes are keyed by `(label_id, difficulty)`: a second write for the
//!   same key updates the existing row in place instead of inserting.
//! - Batch upserts commit all rows or none.
//! - Listing order is tier order: simple, intermediate, in_depth.

use super::{ensure_schema_ready, parse_uuid, RepoError, RepoResult};
use crate::model::label::LabelId;
use crate::model::refinement::{Difficulty, Refinement, RefinementId};
use log::error;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const REFINEMENT_SELECT_SQL: &str = "SELECT
    id,
    label_id,
    difficulty,
    generated_text,
    created_at,
    updated_at
FROM refinements";

const REFINEMENT_UPSERT_SQL: &str = "INSERT INTO refinements (id, label_id, difficulty, generated_text)
VALUES (?1, ?2, ?3, ?4)
ON CONFLICT (label_id, difficulty) DO UPDATE SET
    generated_text = excluded.generated_text,
    updated_at = (strftime('%s', 'now') * 1000);";

/// Repository interface for refinement operations.
pub trait RefinementRepository {
    fn get_refinement(&self, refinement_id: RefinementId) -> RepoResult<Option<Refinement>>;
    /// Looks up the refinement stored under the natural key.
    fn find_refinement(
        &self,
        label_id: LabelId,
        difficulty: Difficulty,
    ) -> RepoResult<Option<Refinement>>;
    fn list_refinements(&self, label_id: LabelId) -> RepoResult<Vec<Refinement>>;
    /// Creates or updates the refinement for `(label_id, difficulty)`.
    fn upsert_refinement(
        &self,
        label_id: LabelId,
        difficulty: Difficulty,
        text: &str,
    ) -> RepoResult<Refinement>;
    /// Upserts several tiers of one label in a single transaction.
    fn upsert_refinements(
        &self,
        label_id: LabelId,
        entries: &[(Difficulty, String)],
    ) -> RepoResult<Vec<Refinement>>;
    /// Overwrites the text of an existing refinement.
    fn update_refinement_text(
        &self,
        refinement_id: RefinementId,
        text: &str,
    ) -> RepoResult<Refinement>;
}

/// SQLite-backed refinement repository.
pub struct SqliteRefinementRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRefinementRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }

    fn load_by_key(&self, label_id: LabelId, difficulty: Difficulty) -> RepoResult<Refinement> {
        self.find_refinement(label_id, difficulty)?
            .ok_or_else(|| RepoError::InvalidData(format!(
                "refinement for label {label_id} difficulty {difficulty} missing after upsert"
            )))
    }
}

impl RefinementRepository for SqliteRefinementRepository<'_> {
    fn get_refinement(&self, refinement_id: RefinementId) -> RepoResult<Option<Refinement>> {
        self.conn
            .query_row(
                &format!("{REFINEMENT_SELECT_SQL} WHERE id = ?1;"),
                [refinement_id.to_string()],
                |row| Ok(read_refinement_columns(row)),
            )
            .optional()?
            .transpose()
    }

    fn find_refinement(
        &self,
        label_id: LabelId,
        difficulty: Difficulty,
    ) -> RepoResult<Option<Refinement>> {
        self.conn
            .query_row(
                &format!("{REFINEMENT_SELECT_SQL} WHERE label_id = ?1 AND difficulty = ?2;"),
                params![label_id.to_string(), difficulty.as_str()],
                |row| Ok(read_refinement_columns(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_refinements(&self, label_id: LabelId) -> RepoResult<Vec<Refinement>> {
        let mut stmt = self.conn.prepare(&format!(
            "{REFINEMENT_SELECT_SQL}
             WHERE label_id = ?1
             ORDER BY CASE difficulty
                WHEN 'simple' THEN 0
                WHEN 'intermediate' THEN 1
                ELSE 2
             END ASC;"
        ))?;
        let mut rows = stmt.query([label_id.to_string()])?;
        let mut refinements = Vec::new();
        while let Some(row) = rows.next()? {
            refinements.push(read_refinement_columns(row)?);
        }
        Ok(refinements)
    }

    fn upsert_refinement(
        &self,
        label_id: LabelId,
        difficulty: Difficulty,
        text: &str,
    ) -> RepoResult<Refinement> {
        upsert_in(self.conn, label_id, difficulty, text)?;
        self.load_by_key(label_id, difficulty)
    }

    fn upsert_refinements(
        &self,
        label_id: LabelId,
        entries: &[(Difficulty, String)],
    ) -> RepoResult<Vec<Refinement>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let written = entries
            .iter()
            .try_for_each(|(difficulty, text)| upsert_in(&tx, label_id, *difficulty, text));

        if let Err(err) = written {
            if let Err(rollback_err) = tx.rollback() {
                error!(
                    "event=refinement_batch_rollback module=repo status=error label_id={} error={}",
                    label_id, rollback_err
                );
            }
            return Err(err);
        }
        tx.commit()?;

        entries
            .iter()
            .map(|(difficulty, _)| self.load_by_key(label_id, *difficulty))
            .collect()
    }

    fn update_refinement_text(
        &self,
        refinement_id: RefinementId,
        text: &str,
    ) -> RepoResult<Refinement> {
        let changed = self.conn.execute(
            "UPDATE refinements
             SET
                generated_text = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![refinement_id.to_string(), text],
        )?;
        if changed == 0 {
            return Err(not_found(refinement_id));
        }
        self.get_refinement(refinement_id)?
            .ok_or_else(|| not_found(refinement_id))
    }
}

fn not_found(refinement_id: RefinementId) -> RepoError {
    RepoError::NotFound {
        entity: "refinement",
        id: refinement_id,
    }
}

fn upsert_in(
    conn: &Connection,
    label_id: LabelId,
    difficulty: Difficulty,
    text: &str,
) -> RepoResult<()> {
    conn.execute(
        REFINEMENT_UPSERT_SQL,
        params![
            Uuid::new_v4().to_string(),
            label_id.to_string(),
            difficulty.as_str(),
            text,
        ],
    )?;
    Ok(())
}

fn read_refinement_columns(row: &Row<'_>) -> RepoResult<Refinement> {
    let id: String = row.get("id")?;
    let label_id: String = row.get("label_id")?;
    let difficulty_text: String = row.get("difficulty")?;
    let difficulty = difficulty_text.parse::<Difficulty>().map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid difficulty `{difficulty_text}` in refinements.difficulty"
        ))
    })?;

    Ok(Refinement {
        id: parse_uuid(&id, "refinements.id")?,
        label_id: parse_uuid(&label_id, "refinements.label_id")?,
        difficulty,
        generated_text: row.get("generated_text")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
