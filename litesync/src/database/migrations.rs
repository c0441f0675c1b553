//! Version-driven schema upgrades.
//!
//! The stored schema version is the engine's `user_version` pragma. When a
//! handle is opened with a requested version above the stored one and an
//! [`UpgradeMap`] is configured, the file is copied to `backup-<name>`, every
//! pending step is applied in ascending order, and the backup is removed.
//! If any step fails the backup is copied back over the live file, so the
//! database is left exactly as it was before the open.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Operation, Result};

use super::connection::{remove_if_exists, Database};
use super::executor::execute_script;
use super::transaction::run_in_transaction;

/// One upgrade step: the statements that bring the schema from
/// `from_version` (exclusive) up to `to_version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionUpgradeStep {
    /// The version this step starts after.
    pub from_version: i32,
    /// The version reached once the step is applied.
    pub to_version: i32,
    /// Statements executed in order, as one script.
    pub statements: Vec<String>,
}

impl VersionUpgradeStep {
    /// The step's statements joined into one script.
    #[must_use]
    pub fn script(&self) -> String {
        self.statements
            .iter()
            .map(|s| s.trim().trim_end_matches(';'))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(";\n")
    }
}

/// Ordered mapping from target version to upgrade statements.
///
/// # Examples
///
/// ```
/// use litesync::database::UpgradeMap;
///
/// let map = UpgradeMap::new()
///     .with_step(1, ["CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT)"])
///     .unwrap()
///     .with_step(2, ["ALTER TABLE notes ADD COLUMN title TEXT"])
///     .unwrap();
///
/// let pending = map.pending(1, 2);
/// assert_eq!(pending.len(), 1);
/// assert_eq!(pending[0].from_version, 1);
/// assert_eq!(pending[0].to_version, 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpgradeMap {
    steps: BTreeMap<i32, Vec<String>>,
}

#[derive(Debug, Deserialize, Serialize)]
struct UpgradeFile {
    #[serde(default)]
    upgrades: Vec<UpgradeEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
struct UpgradeEntry {
    to_version: i32,
    statements: Vec<String>,
}

impl UpgradeMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if no step is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of configured steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Adds the step reaching `to_version`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `to_version` is not positive, is
    /// already present, or has no statements.
    pub fn insert<I, S>(&mut self, to_version: i32, statements: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if to_version < 1 {
            return Err(Error::Validation {
                field: "to_version".into(),
                message: format!("upgrade versions must be positive, got {to_version}"),
            });
        }
        if self.steps.contains_key(&to_version) {
            return Err(Error::Validation {
                field: "to_version".into(),
                message: format!("duplicate upgrade for version {to_version}"),
            });
        }
        let statements: Vec<String> = statements.into_iter().map(Into::into).collect();
        if statements.is_empty() {
            return Err(Error::Validation {
                field: "statements".into(),
                message: format!("upgrade to version {to_version} has no statements"),
            });
        }
        self.steps.insert(to_version, statements);
        Ok(())
    }

    /// Builder form of [`UpgradeMap::insert`].
    ///
    /// # Errors
    ///
    /// Same as [`UpgradeMap::insert`].
    pub fn with_step<I, S>(mut self, to_version: i32, statements: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(to_version, statements)?;
        Ok(self)
    }

    /// Every step in ascending order.
    #[must_use]
    pub fn steps(&self) -> Vec<VersionUpgradeStep> {
        let mut from_version = 0;
        self.steps
            .iter()
            .map(|(&to_version, statements)| {
                let step = VersionUpgradeStep {
                    from_version,
                    to_version,
                    statements: statements.clone(),
                };
                from_version = to_version;
                step
            })
            .collect()
    }

    /// Steps with `to_version` in `(current, requested]`, ascending, each
    /// starting where the previous one ended.
    #[must_use]
    pub fn pending(&self, current: i32, requested: i32) -> Vec<VersionUpgradeStep> {
        if requested <= current {
            return Vec::new();
        }
        let mut from_version = current;
        self.steps
            .range(current + 1..=requested)
            .map(|(&to_version, statements)| {
                let step = VersionUpgradeStep {
                    from_version,
                    to_version,
                    statements: statements.clone(),
                };
                from_version = to_version;
                step
            })
            .collect()
    }

    /// Parses a YAML upgrade file.
    ///
    /// ```yaml
    /// upgrades:
    ///   - to_version: 1
    ///     statements:
    ///       - CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT)
    ///   - to_version: 2
    ///     statements:
    ///       - ALTER TABLE notes ADD COLUMN title TEXT
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] for malformed YAML and
    /// [`Error::Validation`] when versions are not strictly increasing and
    /// positive.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: UpgradeFile = serde_yaml::from_str(yaml)?;
        let mut map = Self::new();
        let mut last = 0;
        for entry in file.upgrades {
            if entry.to_version <= last {
                return Err(Error::Validation {
                    field: "upgrades".into(),
                    message: format!(
                        "versions must be strictly increasing: {} follows {last}",
                        entry.to_version
                    ),
                });
            }
            last = entry.to_version;
            map.insert(entry.to_version, entry.statements)?;
        }
        Ok(map)
    }

    /// Reads and parses a YAML upgrade file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, otherwise the errors
    /// of [`UpgradeMap::from_yaml_str`].
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }
}

/// Reads `PRAGMA user_version`.
///
/// # Errors
///
/// Returns the engine error if the pragma cannot be read.
pub fn get_user_version(conn: &Connection) -> rusqlite::Result<i32> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}

/// Writes `PRAGMA user_version`.
///
/// # Errors
///
/// Returns the engine error if the pragma cannot be written.
pub fn set_user_version(conn: &Connection, version: i32) -> rusqlite::Result<()> {
    conn.execute_batch(&format!("PRAGMA user_version = {version}"))
}

/// Applies `steps` in order, each as one transaction, then records
/// `target` as the stored version.
///
/// # Errors
///
/// Returns [`Error::MigrationFailed`] carrying the failing step's version.
pub fn apply_upgrades(conn: &Connection, steps: &[VersionUpgradeStep], target: i32) -> Result<()> {
    for step in steps {
        log::info!(
            "upgrading from version {} to {}",
            step.from_version,
            step.to_version
        );
        run_in_transaction(conn, Operation::Upgrade, |conn| {
            execute_script(conn, &step.script(), Operation::Execute)
        })
        .map_err(|e| Error::MigrationFailed {
            version: step.to_version,
            message: format!("Failed in onUpgrade to version {}: {e}", step.to_version),
        })?;
    }
    set_user_version(conn, target).map_err(|e| Error::MigrationFailed {
        version: target,
        message: format!("Failed in setVersion {e}"),
    })
}

impl Database {
    /// Runs the upgrade cycle on a freshly opened handle.
    pub(super) fn upgrade_on_open(&mut self) -> Result<()> {
        if self.config.read_only || self.config.external {
            return Ok(());
        }
        let current = {
            let conn = self.connection_for(Operation::Open)?;
            match get_user_version(conn) {
                Ok(version) => version,
                Err(e) => {
                    let err = Error::OpenFailed {
                        message: format!("Failed in getVersion {e}"),
                    };
                    return Err(self.abandon(err));
                }
            }
        };
        let requested = self.config.version;

        if requested <= current {
            if requested < current {
                log::warn!(
                    "{}: stored version {current} is ahead of requested version {requested}",
                    self.config.path.display()
                );
            }
            return Ok(());
        }
        if self.config.upgrades.is_empty() {
            log::debug!("no upgrade map: version {requested} not enforced");
            return Ok(());
        }

        let steps = self.config.upgrades.pending(current, requested);
        let live = self.config.path.clone();
        let backup = self.config.backup_path();
        if let Err(e) = fs::copy(&live, &backup) {
            let err = Error::OpenFailed {
                message: format!("Failed in backupDB {}: {e}", backup.display()),
            };
            return Err(self.abandon(err));
        }
        log::debug!("backed up {} to {}", live.display(), backup.display());

        let outcome = {
            let conn = self.connection_for(Operation::Open)?;
            apply_upgrades(conn, &steps, requested)
        };

        match outcome {
            Ok(()) => {
                if let Err(e) = remove_if_exists(&backup) {
                    let err = Error::OpenFailed {
                        message: format!("Failed in deleteBackupDB {e}"),
                    };
                    return Err(self.abandon(err));
                }
                log::info!("{} upgraded to version {requested}", live.display());
                Ok(())
            }
            Err(upgrade_err) => {
                log::warn!("upgrade failed, restoring {}: {upgrade_err}", live.display());
                self.drop_connection();
                Err(restore_after_failure(&backup, &live, &upgrade_err))
            }
        }
    }

    /// Closes the connection after a failed open step and returns `err`.
    fn abandon(&mut self, err: Error) -> Error {
        self.drop_connection();
        err
    }

    fn drop_connection(&mut self) {
        self.transaction_active = false;
        if let Some(conn) = self.conn.take() {
            if let Err((_, e)) = conn.close() {
                log::warn!("close after failed open: {e}");
            }
        }
    }
}

/// Puts the pre-upgrade file back and builds the error reported for the
/// failed open. The handle must already be closed.
fn restore_after_failure(backup: &Path, live: &Path, upgrade_err: &Error) -> Error {
    match restore(backup, live) {
        Ok(()) => Error::OpenFailed {
            message: format!("Failed OnUpgrade {upgrade_err}"),
        },
        Err(e) => {
            log::error!("cannot restore {} from {}: {e}", live.display(), backup.display());
            Error::OpenFailed {
                message: format!(
                    "Failed in restoreDB {e} (after: {upgrade_err}); the database may be corrupted"
                ),
            }
        }
    }
}

/// Copies `backup` over `live` and removes the backup.
fn restore(backup: &Path, live: &Path) -> std::io::Result<()> {
    fs::copy(backup, live)?;
    fs::remove_file(backup)?;
    log::info!("restored {} from backup", live.display());
    Ok(())
}
