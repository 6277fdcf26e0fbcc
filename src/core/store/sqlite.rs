//! SQLite-backed project and milestone store
//!
//! The database holds two tables:
//! - `projects`: numeric id, unique handle, display name
//! - `milestones`: global id, owning project, per-project iid (unique per project)
//!
//! Handle lookups use SQLite's default BINARY collation, so they are exact
//! and case-sensitive.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use super::{EntityStore, MemoryStore, ProjectStore, StoreError};
use crate::core::identity::{Iid, MilestoneId, ProjectHandle, ProjectId};
use crate::core::project::Project;
use crate::entities::milestone::{Milestone, MilestoneState};

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Row counts reported by `refmark store list`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub projects: usize,
    pub milestones: usize,
}

/// Milestone store backed by SQLite
pub struct SqliteStore {
    conn: Connection,
}

type MilestoneRow = (i64, i64, u32, String, String, Option<String>);

impl SqliteStore {
    /// Open or create a store at `path`
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Unavailable(format!("{}: {}", parent.display(), e)))?;
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open a throwaway store (tests, dry runs)
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let store = Self { conn };
        store.init_schema()?;
        store.check_schema_version()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY,
                handle TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS milestones (
                id INTEGER PRIMARY KEY,
                project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
                iid INTEGER NOT NULL,
                title TEXT NOT NULL,
                state TEXT NOT NULL DEFAULT 'active',
                due_date TEXT,
                UNIQUE (project_id, iid)
            );
            CREATE INDEX IF NOT EXISTS idx_milestones_project ON milestones(project_id);
            "#,
        )?;
        self.conn.execute(
            "INSERT OR IGNORE INTO schema_version (version) SELECT ?1 WHERE NOT EXISTS (SELECT 1 FROM schema_version)",
            params![SCHEMA_VERSION],
        )?;
        Ok(())
    }

    fn check_schema_version(&self) -> Result<(), StoreError> {
        let found: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))?;
        if found != SCHEMA_VERSION {
            return Err(StoreError::SchemaVersion {
                found,
                expected: SCHEMA_VERSION,
            });
        }
        Ok(())
    }

    /// Insert or replace a project with a known id
    pub fn insert_project(&self, project: &Project) -> Result<(), StoreError> {
        write_project(&self.conn, project)
    }

    /// Create a project, assigning the next free id
    pub fn create_project(&self, handle: ProjectHandle, name: Option<&str>) -> Result<Project, StoreError> {
        let mut project = Project::new(ProjectId(0), handle);
        if let Some(name) = name {
            project = project.with_name(name);
        }
        self.conn.execute(
            "INSERT INTO projects (handle, name) VALUES (?1, ?2)",
            params![project.handle.as_str(), project.name],
        )?;
        project.id = ProjectId(self.conn.last_insert_rowid());
        Ok(project)
    }

    /// Insert or update a milestone, keyed by its global id
    pub fn upsert_milestone(&self, milestone: &Milestone) -> Result<(), StoreError> {
        write_milestone(&self.conn, milestone)
    }

    /// Insert or update a milestone by (project, iid), assigning a global id if new
    pub fn put_milestone(
        &self,
        project: &Project,
        iid: Iid,
        title: &str,
        state: MilestoneState,
        due_date: Option<NaiveDate>,
    ) -> Result<Milestone, StoreError> {
        let id: i64 = self.conn.query_row(
            r#"INSERT INTO milestones (project_id, iid, title, state, due_date)
               VALUES (?1, ?2, ?3, ?4, ?5)
               ON CONFLICT(project_id, iid) DO UPDATE SET
                   title = excluded.title,
                   state = excluded.state,
                   due_date = excluded.due_date
               RETURNING id"#,
            params![
                project.id.0,
                iid.0,
                title,
                state.to_string(),
                due_date.map(|d| d.to_string()),
            ],
            |row| row.get(0),
        )?;

        let mut milestone = Milestone::new(MilestoneId(id), project.id, iid, title).with_state(state);
        milestone.due_date = due_date;
        Ok(milestone)
    }

    /// Copy every project and milestone of an in-memory store
    pub fn import(&mut self, source: &MemoryStore) -> Result<StoreStats, StoreError> {
        let tx = self.conn.transaction()?;
        let mut stats = StoreStats::default();
        for project in source.projects() {
            write_project(&tx, project)?;
            stats.projects += 1;
            for milestone in source.milestones_for(project.id) {
                write_milestone(&tx, milestone)?;
                stats.milestones += 1;
            }
        }
        tx.commit()?;
        Ok(stats)
    }

    /// Run `f` inside one transaction; an error from `f` rolls back every write it made
    pub fn atomically<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<StoreError>,
    {
        let tx = self.conn.unchecked_transaction().map_err(StoreError::from)?;
        let value = f(self)?;
        tx.commit().map_err(StoreError::from)?;
        Ok(value)
    }

    /// All projects, ordered by handle
    pub fn projects(&self) -> Result<Vec<Project>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, handle, name FROM projects ORDER BY handle")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<Result<Vec<(i64, String, String)>, _>>()?;
        rows.into_iter().map(project_from_row).collect()
    }

    /// Milestones of one project, ordered by iid
    pub fn milestones(&self, project: &Project) -> Result<Vec<Milestone>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, iid, title, state, due_date FROM milestones WHERE project_id = ?1 ORDER BY iid",
        )?;
        let rows = stmt
            .query_map(params![project.id.0], milestone_row)?
            .collect::<Result<Vec<MilestoneRow>, _>>()?;
        rows.into_iter().map(milestone_from_row).collect()
    }

    pub fn statistics(&self) -> Result<StoreStats, StoreError> {
        let projects: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))?;
        let milestones: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM milestones", [], |row| row.get(0))?;
        Ok(StoreStats {
            projects: projects as usize,
            milestones: milestones as usize,
        })
    }
}

fn write_project(conn: &Connection, project: &Project) -> Result<(), StoreError> {
    conn.execute(
        r#"INSERT INTO projects (id, handle, name) VALUES (?1, ?2, ?3)
           ON CONFLICT(id) DO UPDATE SET handle = excluded.handle, name = excluded.name"#,
        params![project.id.0, project.handle.as_str(), project.name],
    )?;
    Ok(())
}

fn write_milestone(conn: &Connection, milestone: &Milestone) -> Result<(), StoreError> {
    conn.execute(
        r#"INSERT INTO milestones (id, project_id, iid, title, state, due_date)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)
           ON CONFLICT(id) DO UPDATE SET
               project_id = excluded.project_id,
               iid = excluded.iid,
               title = excluded.title,
               state = excluded.state,
               due_date = excluded.due_date"#,
        params![
            milestone.id.0,
            milestone.project_id.0,
            milestone.iid.0,
            milestone.title,
            milestone.state.to_string(),
            milestone.due_date.map(|d| d.to_string()),
        ],
    )?;
    Ok(())
}

fn milestone_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MilestoneRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn project_from_row((id, handle, name): (i64, String, String)) -> Result<Project, StoreError> {
    let handle = ProjectHandle::parse(&handle)
        .map_err(|e| StoreError::Corrupt(format!("project {}: {}", id, e)))?;
    Ok(Project::new(ProjectId(id), handle).with_name(name))
}

fn milestone_from_row(
    (id, project_id, iid, title, state, due_date): MilestoneRow,
) -> Result<Milestone, StoreError> {
    let state: MilestoneState = state
        .parse()
        .map_err(|e| StoreError::Corrupt(format!("milestone {}: {}", id, e)))?;
    let due_date = due_date
        .map(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d"))
        .transpose()
        .map_err(|e| StoreError::Corrupt(format!("milestone {} due date: {}", id, e)))?;

    let mut milestone =
        Milestone::new(MilestoneId(id), ProjectId(project_id), Iid(iid), title).with_state(state);
    milestone.due_date = due_date;
    Ok(milestone)
}

impl ProjectStore for SqliteStore {
    fn find_by_handle(&self, handle: &str) -> Result<Option<Project>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, handle, name FROM projects WHERE handle = ?1",
                params![handle],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;
        row.map(project_from_row).transpose()
    }
}

impl EntityStore for SqliteStore {
    type Entity = Milestone;

    fn find_by_local_id(&self, project: &Project, iid: Iid) -> Result<Option<Milestone>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, project_id, iid, title, state, due_date FROM milestones WHERE project_id = ?1 AND iid = ?2",
                params![project.id.0, iid.0],
                milestone_row,
            )
            .optional()?;
        row.map(milestone_from_row).transpose()
    }
}
