use std::fs;
use std::path::{Path, PathBuf};

use lifelog_store::{MigrationConfig, SqliteConfig};
use serde::Deserialize;
use tracing::debug;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "lifelog.toml";

/// Database file used when neither the config nor `--db` names one.
pub const DEFAULT_DB_FILE: &str = "lifelog.db";

/// Durable backend to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Sqlite,
    Redb,
}

impl Backend {
    pub fn name(self) -> &'static str {
        match self {
            Self::Sqlite => "SQLite",
            Self::Redb => "redb",
        }
    }
}

/// Contents of `lifelog.toml`.
///
/// ```toml
/// backend = "sqlite"
/// path = "data/lifelog.db"
///
/// [sqlite]
/// journal_mode = "wal"
/// busy_timeout_ms = 2000
///
/// [migration]
/// write_back_on_read = true
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub backend: Backend,
    pub path: PathBuf,
    pub sqlite: SqliteConfig,
    pub migration: MigrationSection,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            path: PathBuf::from(DEFAULT_DB_FILE),
            sqlite: SqliteConfig::default(),
            migration: MigrationSection::default(),
        }
    }
}

/// `[migration]` table, mirrored into [`MigrationConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MigrationSection {
    pub write_back_on_read: bool,
    pub eager_migration: bool,
}

impl Default for MigrationSection {
    fn default() -> Self {
        let defaults = MigrationConfig::default();
        Self {
            write_back_on_read: defaults.write_back_on_read,
            eager_migration: defaults.eager_migration,
        }
    }
}

impl From<MigrationSection> for MigrationConfig {
    fn from(section: MigrationSection) -> Self {
        MigrationConfig {
            write_back_on_read: section.write_back_on_read,
            eager_migration: section.eager_migration,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl CliConfig {
    /// Parse config text.
    pub fn parse(path: &Path, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the config. An explicit path must exist; without one,
    /// `lifelog.toml` in the working directory is used if present and
    /// defaults otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => {
                let p = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !p.exists() {
                    debug!("no {DEFAULT_CONFIG_FILE}, using defaults");
                    return Ok(Self::default());
                }
                p
            }
        };
        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config");
        Self::parse(&path, &text)
    }

    /// Apply the `--db` override.
    pub fn with_db(mut self, db: Option<PathBuf>) -> Self {
        if let Some(db) = db {
            self.path = db;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifelog_store::JournalMode;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = CliConfig::parse(Path::new("t.toml"), "").unwrap();
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.path, PathBuf::from(DEFAULT_DB_FILE));
        assert_eq!(config.sqlite.journal_mode, JournalMode::Wal);
        assert!(config.migration.write_back_on_read);
        assert!(!config.migration.eager_migration);
    }

    #[test]
    fn full_file() {
        let text = r#"
            backend = "redb"
            path = "data/life.redb"

            [sqlite]
            journal_mode = "delete"
            busy_timeout_ms = 250

            [migration]
            eager_migration = true
        "#;
        let config = CliConfig::parse(Path::new("t.toml"), text).unwrap();
        assert_eq!(config.backend, Backend::Redb);
        assert_eq!(config.path, PathBuf::from("data/life.redb"));
        assert_eq!(config.sqlite.journal_mode, JournalMode::Delete);
        assert_eq!(config.sqlite.busy_timeout_ms, 250);
        assert_eq!(config.sqlite.page_size, 4096);

        let migration: MigrationConfig = config.migration.into();
        assert!(migration.eager_migration);
        assert!(migration.write_back_on_read);
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let err = CliConfig::parse(Path::new("t.toml"), r#"backend = "postgres""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().starts_with("invalid config t.toml"));
    }

    #[test]
    fn db_flag_overrides_path() {
        let config = CliConfig::default().with_db(Some(PathBuf::from("other.db")));
        assert_eq!(config.path, PathBuf::from("other.db"));
        let config = config.with_db(None);
        assert_eq!(config.path, PathBuf::from("other.db"));
    }

    #[test]
    fn explicit_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lifelog.toml");
        fs::write(&path, "path = \"x.db\"\n").unwrap();
        let config = CliConfig::load(Some(&path)).unwrap();
        assert_eq!(config.path, PathBuf::from("x.db"));

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            CliConfig::load(Some(&missing)),
            Err(ConfigError::Read { .. })
        ));
    }
}
