// logfilter-core/src/gateway.rs
//! Durable storage for the filter configuration.
//!
//! The core never talks to a storage backend directly; it goes through a
//! `ConfigGateway`. Two gateways are provided: a YAML file store for tools
//! and services, and an in-memory store for embedding. Gateway I/O happens
//! only when configuration is loaded or updated, never while filtering.
//!
//! License: MIT OR Apache-2.0

use chrono::{DateTime, Utc};
use fs2::FileExt;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use crate::config::RuleSet;
use crate::errors::FilterError;

/// Environment variable overriding the default configuration file location.
pub const CONFIG_PATH_ENV: &str = "LOGFILTER_CONFIG";

const CONFIG_FILE_TMP_SUFFIX: &str = ".tmp";
const CONFIG_FILE_LOCK_SUFFIX: &str = ".lock";

/// Loads and saves `RuleSet`s.
pub trait ConfigGateway: Send + Sync {
    fn load(&self) -> Result<RuleSet, FilterError>;

    fn save(&self, rule_set: &RuleSet) -> Result<(), FilterError>;
}

/// Loads the stored configuration, falling back to the disabled rule set
/// when storage cannot be read so that startup never blocks on it.
pub fn load_or_disabled(gateway: &dyn ConfigGateway) -> RuleSet {
    match gateway.load() {
        Ok(rule_set) => rule_set,
        Err(e) => {
            warn!("Could not load filter configuration, filtering stays disabled: {}", e);
            RuleSet::disabled()
        }
    }
}

/// The default location of the configuration file: `$LOGFILTER_CONFIG` when
/// set, otherwise `<config dir>/logfilter/config.yaml`.
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("logfilter").join("config.yaml"))
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredConfig {
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    rule_set: RuleSet,
}

/// Stores the configuration as a YAML document on disk.
#[derive(Debug, Clone)]
pub struct FileConfigGateway {
    path: PathBuf,
}

impl FileConfigGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A gateway at [`default_config_path`].
    pub fn at_default_location() -> Result<Self, FilterError> {
        default_config_path()
            .map(Self::new)
            .ok_or_else(|| FilterError::Storage("no configuration directory available".to_string()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn storage_error(&self, action: &str, e: impl std::fmt::Display) -> FilterError {
        FilterError::Storage(format!("failed to {} {}: {}", action, self.path.display(), e))
    }

    fn sibling_path(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn tmp_path(&self) -> PathBuf {
        self.sibling_path(CONFIG_FILE_TMP_SUFFIX)
    }

    fn lock_path(&self) -> PathBuf {
        self.sibling_path(CONFIG_FILE_LOCK_SUFFIX)
    }

    /// Writes `contents` to the temp file and renames it over the target.
    /// Callers hold the exclusive lock on [`Self::lock_path`].
    fn replace_with(&self, contents: &[u8]) -> Result<(), FilterError> {
        let tmp_path = self.tmp_path();
        {
            let mut tmp = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)
                .map_err(|e| self.storage_error("create temporary file for", e))?;
            tmp.write_all(contents)
                .and_then(|_| tmp.flush())
                .map_err(|e| self.storage_error("write", e))?;
        }
        fs::rename(&tmp_path, &self.path).map_err(|e| self.storage_error("replace", e))
    }
}

impl ConfigGateway for FileConfigGateway {
    fn load(&self) -> Result<RuleSet, FilterError> {
        if !self.path.exists() {
            info!("No filter configuration at {}, using defaults.", self.path.display());
            return Ok(RuleSet::disabled());
        }

        let mut raw = String::new();
        {
            let mut f = OpenOptions::new()
                .read(true)
                .open(&self.path)
                .map_err(|e| self.storage_error("open", e))?;
            FileExt::lock_shared(&f).map_err(|e| self.storage_error("lock", e))?;
            let read = f.read_to_string(&mut raw);
            let _ = FileExt::unlock(&f);
            read.map_err(|e| self.storage_error("read", e))?;
        }

        if raw.trim().is_empty() {
            return Ok(RuleSet::disabled());
        }

        let stored: StoredConfig =
            serde_yml::from_str(&raw).map_err(|e| self.storage_error("parse", e))?;
        info!(
            "Loaded filter configuration from {} ({} pair(s), saved at {}).",
            self.path.display(),
            stored.rule_set.len(),
            stored
                .saved_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "unknown".to_string())
        );
        Ok(stored.rule_set)
    }

    fn save(&self, rule_set: &RuleSet) -> Result<(), FilterError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.storage_error("create directory for", e))?;
            }
        }

        let stored = StoredConfig {
            saved_at: Some(Utc::now()),
            rule_set: rule_set.clone(),
        };
        let yaml = serde_yml::to_string(&stored)?;

        // Writers serialize on the lock file before touching the temp file.
        let lock = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(|e| self.storage_error("create lock file for", e))?;
        FileExt::lock_exclusive(&lock).map_err(|e| self.storage_error("lock", e))?;
        let replaced = self.replace_with(yaml.as_bytes());
        let _ = FileExt::unlock(&lock);
        replaced?;

        info!("Saved filter configuration to {}.", self.path.display());
        Ok(())
    }
}

/// Keeps the configuration in process memory.
#[derive(Debug, Default)]
pub struct MemoryConfigGateway {
    stored: RwLock<Option<RuleSet>>,
}

impl MemoryConfigGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule_set(rule_set: RuleSet) -> Self {
        Self {
            stored: RwLock::new(Some(rule_set)),
        }
    }
}

impl ConfigGateway for MemoryConfigGateway {
    fn load(&self) -> Result<RuleSet, FilterError> {
        let stored = self.stored.read().unwrap_or_else(PoisonError::into_inner);
        Ok(stored.clone().unwrap_or_default())
    }

    fn save(&self, rule_set: &RuleSet) -> Result<(), FilterError> {
        debug!("Storing filter configuration in memory.");
        *self.stored.write().unwrap_or_else(PoisonError::into_inner) = Some(rule_set.clone());
        Ok(())
    }
}
