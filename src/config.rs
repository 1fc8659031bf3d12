use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::storage::Repo;

/// Connection settings for a [`Repo`].
///
/// There is no built-in statement timeout; `busy_timeout_ms` is how long
/// SQLite waits on a locked database before failing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    /// Database file; in-memory when absent
    pub database: Option<String>,
    pub busy_timeout_ms: Option<u64>,
    /// Take the write lock when a scope opens instead of on first write
    pub immediate_transactions: bool,
    /// Create missing tables on open
    pub create_schema: bool,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            database: None,
            busy_timeout_ms: None,
            immediate_transactions: false,
            create_schema: true,
        }
    }
}

/// Config file `open_repo` reads when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "relgraph.toml";

impl RepoConfig {
    /// Parse settings from TOML; absent keys keep their defaults
    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Read the config file at `path`, or `None` when there is none
    pub fn load(path: &Path) -> anyhow::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config {}", path.display()))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(Some(config))
    }

    pub fn database_path(&self) -> Option<&Path> {
        self.database.as_deref().map(Path::new)
    }
}

/// Open the repository named by the config at `path` (default
/// [`DEFAULT_CONFIG_FILE`]), falling back to an in-memory database when the
/// file does not exist.
pub fn open_repo(path: Option<&Path>) -> anyhow::Result<Repo> {
    let path = path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
    let config = RepoConfig::load(path)?.unwrap_or_default();
    if let Some(db_path) = config.database_path() {
        prepare_db_dir(db_path)?;
    }
    tracing::info!("Opening repository {:?}", config.database.as_deref().unwrap_or(":memory:"));
    let repo = Repo::open_with(&config)
        .with_context(|| format!("cannot open repository from {}", path.display()))?;
    Ok(repo)
}

fn prepare_db_dir(db_path: &Path) -> anyhow::Result<()> {
    match db_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)
            .with_context(|| format!("cannot create database directory {}", dir.display())),
        _ => Ok(()),
    }
}
