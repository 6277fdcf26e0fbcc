//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::yaml::{load_yaml, YamlError};

/// Directory marking a refmark workspace
pub const WORKSPACE_DIR: &str = ".refmark";

/// Refmark configuration with layered hierarchy
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Store location (`.db`/`.sqlite` database or `.yaml` fixture)
    pub store: Option<PathBuf>,

    /// Handle of the project unqualified references belong to
    pub project: Option<String>,

    /// Base URL prefixed to rendered links
    pub base_url: Option<String>,

    /// Tera template used to render a resolved reference
    pub template: Option<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load() -> Result<Self, YamlError> {
        let start = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::load_from(&start, Self::global_config_path().as_deref(), &EnvVars::from_process())
    }

    /// Load starting from `start`, with explicit global path and environment
    pub fn load_from(start: &Path, global_path: Option<&Path>, env: &EnvVars) -> Result<Self, YamlError> {
        // 1. Built-in defaults (already in Default impl)
        let mut config = Config::default();

        // 2. Global user config (~/.config/refmark/config.yaml)
        if let Some(global_path) = global_path.filter(|p| p.exists()) {
            config.merge(load_yaml(global_path)?);
        }

        // 3. Workspace config (.refmark/config.yaml)
        if let Some(workspace) = Self::discover_workspace(start) {
            let path = workspace.join(WORKSPACE_DIR).join("config.yaml");
            if path.exists() {
                let mut workspace_config: Config = load_yaml(&path)?;
                // Relative store paths are relative to the workspace root
                if let Some(store) = workspace_config.store.take() {
                    workspace_config.store = Some(if store.is_relative() {
                        workspace.join(store)
                    } else {
                        store
                    });
                }
                config.merge(workspace_config);
            }
        }

        // 4. Environment variables
        config.merge(env.to_config());

        Ok(config)
    }

    /// Find the workspace root by walking up from `start`
    pub fn discover_workspace(start: &Path) -> Option<PathBuf> {
        let mut current = start.canonicalize().ok()?;
        loop {
            if current.join(WORKSPACE_DIR).is_dir() {
                return Some(current);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Get the path to the global config file
    pub fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "refmark")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Config) {
        if other.store.is_some() {
            self.store = other.store;
        }
        if other.project.is_some() {
            self.project = other.project;
        }
        if other.base_url.is_some() {
            self.base_url = other.base_url;
        }
        if other.template.is_some() {
            self.template = other.template;
        }
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .map(|u| u.trim_end_matches('/'))
            .unwrap_or("")
    }
}

/// Environment overrides (`REFMARK_STORE`, `REFMARK_PROJECT`, `REFMARK_BASE_URL`)
#[derive(Debug, Default, Clone)]
pub struct EnvVars {
    pub store: Option<String>,
    pub project: Option<String>,
    pub base_url: Option<String>,
}

impl EnvVars {
    pub fn from_process() -> Self {
        Self {
            store: std::env::var("REFMARK_STORE").ok(),
            project: std::env::var("REFMARK_PROJECT").ok(),
            base_url: std::env::var("REFMARK_BASE_URL").ok(),
        }
    }

    fn to_config(&self) -> Config {
        Config {
            store: self.store.clone().filter(|s| !s.is_empty()).map(PathBuf::from),
            project: self.project.clone().filter(|s| !s.is_empty()),
            base_url: self.base_url.clone().filter(|s| !s.is_empty()),
            template: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_merge_precedence() {
        let mut config = Config {
            store: Some(PathBuf::from("a.db")),
            project: Some("a/a".to_string()),
            ..Config::default()
        };
        config.merge(Config {
            project: Some("b/b".to_string()),
            ..Config::default()
        });
        assert_eq!(config.store, Some(PathBuf::from("a.db")));
        assert_eq!(config.project.as_deref(), Some("b/b"));
    }

    #[test]
    fn test_layers() {
        let tmp = tempdir().unwrap();
        let global = tmp.path().join("global.yaml");
        std::fs::write(&global, "base_url: https://global.example\nproject: g/g\n").unwrap();

        let root = tmp.path().join("repo");
        std::fs::create_dir_all(root.join(WORKSPACE_DIR)).unwrap();
        std::fs::write(
            root.join(WORKSPACE_DIR).join("config.yaml"),
            "store: refs.db\nproject: acme/web\n",
        )
        .unwrap();
        let nested = root.join("docs/guide");
        std::fs::create_dir_all(&nested).unwrap();

        let env = EnvVars {
            base_url: Some("https://env.example/".to_string()),
            ..EnvVars::default()
        };
        let config = Config::load_from(&nested, Some(&global), &env).unwrap();

        assert_eq!(config.project.as_deref(), Some("acme/web"));
        assert_eq!(
            config.store,
            Some(root.canonicalize().unwrap().join("refs.db"))
        );
        assert_eq!(config.base_url(), "https://env.example");
    }

    #[test]
    fn test_missing_layers_yield_defaults() {
        let tmp = tempdir().unwrap();
        let config = Config::load_from(tmp.path(), None, &EnvVars::default()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.base_url(), "");
    }

    #[test]
    fn test_malformed_config_is_reported() {
        let tmp = tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join(WORKSPACE_DIR)).unwrap();
        std::fs::write(tmp.path().join(WORKSPACE_DIR).join("config.yaml"), "store: [\n").unwrap();

        let err = Config::load_from(tmp.path(), None, &EnvVars::default()).unwrap_err();
        assert!(matches!(err, YamlError::Syntax(_)));
    }
}
