//! Database configuration and path resolution.
//!
//! A [`DatabaseConfig`] describes one database file: where it lives, which
//! schema version the caller expects, how to open it, and the upgrade map
//! that evolves older files to that version.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

use super::migrations::UpgradeMap;

/// Suffix appended to conventional database names.
pub const DATABASE_SUFFIX: &str = "SQLite.db";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "LITESYNC_DATA_DIR";

/// Configuration for one database handle.
///
/// # Examples
///
/// ```
/// use litesync::database::DatabaseConfig;
/// use std::time::Duration;
///
/// let config = DatabaseConfig::new("/tmp/notesSQLite.db")
///     .with_version(3)
///     .with_busy_timeout(Duration::from_secs(10));
/// assert_eq!(config.version, 3);
/// assert!(!config.read_only);
/// ```
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the database file.
    pub path: PathBuf,
    /// Schema version the caller expects after open.
    pub version: i32,
    /// Busy timeout for lock contention.
    pub busy_timeout: Duration,
    /// Whether to create the file (and its directory) when missing.
    pub auto_create: bool,
    /// Whether to open the file read-only.
    pub read_only: bool,
    /// Whether exports may be encoded through a cipher.
    pub encrypted: bool,
    /// Whether the file lives outside the managed data directory.
    pub external: bool,
    /// Per-version upgrade statements applied on open.
    pub upgrades: UpgradeMap,
}

impl DatabaseConfig {
    /// Creates a configuration with default settings.
    ///
    /// Defaults: version 1, 5000 ms busy timeout, auto-create, read-write,
    /// not encrypted, not external, empty upgrade map.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            version: 1,
            busy_timeout: Duration::from_millis(5000),
            auto_create: true,
            read_only: false,
            encrypted: false,
            external: false,
            upgrades: UpgradeMap::new(),
        }
    }

    /// Resolves a database name the conventional way.
    ///
    /// A plain name becomes `<dir>/<name>SQLite.db` (a name already ending
    /// in `SQLite.db` is kept as is). A name containing `/` that does not end
    /// in `SQLite.db` is an external file: it is opened read-only and never
    /// upgraded.
    ///
    /// # Examples
    ///
    /// ```
    /// use litesync::database::DatabaseConfig;
    ///
    /// let config = DatabaseConfig::for_name("/data", "notes");
    /// assert_eq!(config.path.to_str().unwrap(), "/data/notesSQLite.db");
    ///
    /// let config = DatabaseConfig::for_name("/data", "/mnt/shared/catalog.db");
    /// assert!(config.external && config.read_only);
    /// ```
    #[must_use]
    pub fn for_name(dir: impl AsRef<Path>, name: &str) -> Self {
        if name.contains('/') && !name.ends_with(DATABASE_SUFFIX) {
            return Self::new(name).external();
        }

        let file = if name.ends_with(DATABASE_SUFFIX) {
            OsString::from(name)
        } else {
            OsString::from(format!("{name}{DATABASE_SUFFIX}"))
        };
        let file = Path::new(&file);
        if file.is_absolute() {
            Self::new(file)
        } else {
            Self::new(dir.as_ref().join(file))
        }
    }

    /// Sets the schema version expected after open.
    #[must_use]
    pub const fn with_version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    /// Sets the upgrade map applied on open.
    #[must_use]
    pub fn with_upgrades(mut self, upgrades: UpgradeMap) -> Self {
        self.upgrades = upgrades;
        self
    }

    /// Sets the busy timeout duration.
    #[must_use]
    pub const fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Opens the database read-only. Disables `auto_create`.
    #[must_use]
    pub const fn read_only(mut self) -> Self {
        self.read_only = true;
        self.auto_create = false;
        self
    }

    /// Marks the file as external: read-only, never upgraded.
    #[must_use]
    pub const fn external(mut self) -> Self {
        self.external = true;
        self.read_only()
    }

    /// Allows cipher-encoded exports.
    #[must_use]
    pub const fn encrypted(mut self) -> Self {
        self.encrypted = true;
        self
    }

    /// The file name without directories, lossily decoded.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Database name as it appears in exported documents.
    ///
    /// The `SQLite.db` suffix is stripped from conventional names.
    #[must_use]
    pub fn database_name(&self) -> String {
        let file = self.file_name();
        file.strip_suffix(DATABASE_SUFFIX)
            .map_or_else(|| file.clone(), str::to_string)
    }

    /// Path of the transient upgrade backup, `backup-<file>` next to the
    /// live file.
    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        self.path.with_file_name(format!("backup-{}", self.file_name()))
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty path or a version below 1.
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(Error::Validation {
                field: "path".into(),
                message: "database path cannot be empty".into(),
            });
        }
        if self.version < 1 {
            return Err(Error::Validation {
                field: "version".into(),
                message: format!("version must be at least 1, got {}", self.version),
            });
        }
        Ok(())
    }
}

/// Returns the default data directory, `~/.litesync`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
///
/// # Examples
///
/// ```no_run
/// use litesync::database::default_data_dir;
///
/// let data_dir = default_data_dir().unwrap();
/// println!("Data directory: {}", data_dir.display());
/// ```
pub fn default_data_dir() -> Result<PathBuf> {
    home::home_dir()
        .map(|home| home.join(".litesync"))
        .ok_or_else(|| Error::Validation {
            field: "home_directory".into(),
            message: "Cannot determine home directory".into(),
        })
}

/// Resolves the data directory.
///
/// The resolution order is:
/// 1. `$LITESYNC_DATA_DIR` if set
/// 2. `~/.litesync` otherwise
///
/// # Errors
///
/// Returns an error if `LITESYNC_DATA_DIR` is unset and the home directory
/// cannot be determined.
pub fn resolve_data_dir() -> Result<PathBuf> {
    match std::env::var_os(DATA_DIR_ENV) {
        Some(dir) if !dir.is_empty() => Ok(PathBuf::from(dir)),
        _ => default_data_dir(),
    }
}
