//! Project repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Deleting a project removes its labels and their refinements through
//!   `ON DELETE CASCADE` inside the same transaction.
//! - Owner-scoped reads never return another owner's project.

use super::{ensure_schema_ready, parse_uuid, RepoError, RepoResult};
use crate::model::project::{NewProject, Project, ProjectId, ProjectUpdate};
use crate::model::UserId;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const PROJECT_SELECT_SQL: &str = "SELECT
    id,
    owner_id,
    name,
    description,
    created_at,
    updated_at
FROM projects";

/// Ownership check consumed by label and refinement access paths.
pub trait ProjectAuthority {
    /// Returns whether `user_id` owns `project_id`. Missing projects are `false`.
    fn owns_project(&self, user_id: UserId, project_id: ProjectId) -> RepoResult<bool>;
}

/// Repository interface for project operations.
pub trait ProjectRepository {
    /// Inserts one project and returns the stored record.
    fn create_project(&self, owner_id: UserId, project: &NewProject) -> RepoResult<Project>;
    /// Loads one project by id regardless of owner.
    fn get_project(&self, project_id: ProjectId) -> RepoResult<Option<Project>>;
    /// Lists projects owned by one user, oldest first.
    fn list_projects_by_owner(&self, owner_id: UserId) -> RepoResult<Vec<Project>>;
    /// Lists every project, newest first.
    fn list_all_projects(&self) -> RepoResult<Vec<Project>>;
    /// Applies present fields of `update`; returns the stored record.
    fn update_project(&self, project_id: ProjectId, update: &ProjectUpdate) -> RepoResult<Project>;
    /// Deletes one project and, transitively, its labels and refinements.
    fn delete_project(&self, project_id: ProjectId) -> RepoResult<()>;
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ProjectAuthority for SqliteProjectRepository<'_> {
    fn owns_project(&self, user_id: UserId, project_id: ProjectId) -> RepoResult<bool> {
        let owned: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM projects WHERE id = ?1 AND owner_id = ?2
            );",
            params![project_id.to_string(), user_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(owned == 1)
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create_project(&self, owner_id: UserId, project: &NewProject) -> RepoResult<Project> {
        let project_id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO projects (id, owner_id, name, description)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                project_id.to_string(),
                owner_id.to_string(),
                project.name.as_str(),
                project.description.as_str(),
            ],
        )?;
        load_required_project(self.conn, project_id)
    }

    fn get_project(&self, project_id: ProjectId) -> RepoResult<Option<Project>> {
        self.conn
            .query_row(
                &format!("{PROJECT_SELECT_SQL} WHERE id = ?1;"),
                [project_id.to_string()],
                |row| Ok(read_project_columns(row)),
            )
            .optional()?
            .transpose()
    }

    fn list_projects_by_owner(&self, owner_id: UserId) -> RepoResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL}
             WHERE owner_id = ?1
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([owner_id.to_string()])?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(read_project_columns(row)?);
        }
        Ok(projects)
    }

    fn list_all_projects(&self) -> RepoResult<Vec<Project>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PROJECT_SELECT_SQL} ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(read_project_columns(row)?);
        }
        Ok(projects)
    }

    fn update_project(&self, project_id: ProjectId, update: &ProjectUpdate) -> RepoResult<Project> {
        let changed = self.conn.execute(
            "UPDATE projects
             SET
                name = COALESCE(?2, name),
                description = COALESCE(?3, description),
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![
                project_id.to_string(),
                update.name.as_deref(),
                update.description.as_deref(),
            ],
        )?;
        if changed == 0 {
            return Err(not_found(project_id));
        }
        load_required_project(self.conn, project_id)
    }

    fn delete_project(&self, project_id: ProjectId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1;", [project_id.to_string()])?;
        if changed == 0 {
            return Err(not_found(project_id));
        }
        Ok(())
    }
}

fn not_found(project_id: ProjectId) -> RepoError {
    RepoError::NotFound {
        entity: "project",
        id: project_id,
    }
}

fn load_required_project(conn: &Connection, project_id: ProjectId) -> RepoResult<Project> {
    SqliteProjectRepository { conn }
        .get_project(project_id)?
        .ok_or_else(|| not_found(project_id))
}

fn read_project_columns(row: &Row<'_>) -> RepoResult<Project> {
    let id: String = row.get("id")?;
    let owner_id: String = row.get("owner_id")?;
    Ok(Project {
        id: parse_uuid(&id, "projects.id")?,
        owner_id: parse_uuid(&owner_id, "projects.owner_id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
