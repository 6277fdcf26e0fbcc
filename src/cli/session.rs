//! Store and current-project setup shared by `render` and `refs`

use miette::{IntoDiagnostic, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::cli::GlobalOpts;
use crate::core::identity::Iid;
use crate::core::project::Project;
use crate::core::store::{EntityStore, MemoryStore, ProjectStore, SqliteStore, StoreError};
use crate::core::Config;
use crate::entities::Milestone;

/// Either store backend, chosen by file extension
pub enum AnyStore {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl AnyStore {
    /// Open an existing store; `.yaml`/`.yml` is a fixture, anything else SQLite
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(miette::miette!(
                help = "Create one with 'refmark store init <DB>'",
                "store not found: {}",
                path.display()
            ));
        }

        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Ok(AnyStore::Memory(MemoryStore::load(path)?)),
            _ => Ok(AnyStore::Sqlite(SqliteStore::open(path).into_diagnostic()?)),
        }
    }
}

impl ProjectStore for AnyStore {
    fn find_by_handle(&self, handle: &str) -> Result<Option<Project>, StoreError> {
        match self {
            AnyStore::Memory(store) => store.find_by_handle(handle),
            AnyStore::Sqlite(store) => store.find_by_handle(handle),
        }
    }
}

impl EntityStore for AnyStore {
    type Entity = Milestone;

    fn find_by_local_id(&self, project: &Project, iid: Iid) -> Result<Option<Milestone>, StoreError> {
        match self {
            AnyStore::Memory(store) => store.find_by_local_id(project, iid),
            AnyStore::Sqlite(store) => store.find_by_local_id(project, iid),
        }
    }
}

/// Resolved configuration, open store, and current project
pub struct Session {
    pub config: Config,
    pub store: AnyStore,
    pub current: Project,
}

impl Session {
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let config = Config::load()?;

        let store_path: PathBuf = global
            .store
            .clone()
            .or_else(|| config.store.clone())
            .ok_or_else(|| {
                miette::miette!(
                    help = "Pass --store or set 'store' in .refmark/config.yaml",
                    "no store configured"
                )
            })?;

        let handle = global
            .project
            .clone()
            .or_else(|| config.project.clone())
            .ok_or_else(|| {
                miette::miette!(
                    help = "Pass --project or set 'project' in .refmark/config.yaml",
                    "no current project configured"
                )
            })?;

        let store = AnyStore::open(&store_path)?;
        let current = store
            .find_by_handle(&handle)
            .into_diagnostic()?
            .ok_or_else(|| miette::miette!("unknown project '{}' in {}", handle, store_path.display()))?;

        debug!(store = %store_path.display(), project = %current.handle, "session ready");

        Ok(Self {
            config,
            store,
            current,
        })
    }
}

/// Read a document from `file`, or stdin when absent or `-`
pub fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .map_err(|e| miette::miette!("cannot read {}: {}", path.display(), e)),
        _ => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text).into_diagnostic()?;
            Ok(text)
        }
    }
}
