//! Application registry persisted in `config.json`.
//!
//! The registry holds the server settings, users, issued API tokens and
//! the catalog of collections. It is stored as one pretty-printed JSON file
//! and guarded by the same kind of advisory lock as collections, so the CLI
//! and a running server can share it.

use crate::activity::LogLevel;
use crate::catalog::{CollectionCatalog, CollectionInfo};
use crate::credentials::{password_hash, ApiKey, Permission, User};
use crate::document::{to_pretty_json, write_atomic};
use crate::error::{CoreError, CoreResult};
use crate::id::RecordId;
use crate::lock::FileLock;
use crate::paths::{collection_name, CollectionPaths};
use chrono::{DateTime, Duration, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;
use tracing::{debug, info};

/// Default bind host.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default bind port.
pub const DEFAULT_PORT: u16 = 3000;

/// Contents of `config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Host the HTTP surface binds to.
    pub host: String,
    /// Port the HTTP surface binds to.
    pub port: u16,
    /// Whether collection activity is written to log files.
    #[serde(default = "enabled")]
    pub need_logs: bool,
    /// Levels written to collection log files.
    #[serde(default = "all_levels")]
    pub loggers: Vec<LogLevel>,
    /// Registered users.
    #[serde(default)]
    pub users: Vec<User>,
    /// Issued API tokens.
    #[serde(default)]
    pub api_keys: Vec<ApiKey>,
    /// Known collections.
    #[serde(default)]
    pub databases: Vec<CollectionInfo>,
}

fn enabled() -> bool {
    true
}

fn all_levels() -> Vec<LogLevel> {
    LogLevel::ALL.to_vec()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            need_logs: true,
            loggers: all_levels(),
            users: Vec::new(),
            api_keys: Vec::new(),
            databases: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Levels collections should write, honouring `need_logs`.
    #[must_use]
    pub fn effective_log_levels(&self) -> Vec<LogLevel> {
        if self.need_logs {
            self.loggers.clone()
        } else {
            Vec::new()
        }
    }
}

/// Handle on a `config.json` file.
///
/// Every call reloads the file under its lock, like [`Store`](crate::Store)
/// does for collections.
#[derive(Debug, Clone)]
pub struct Registry {
    path: PathBuf,
    lock_path: PathBuf,
    temp_path: PathBuf,
    lock_timeout: Option<StdDuration>,
}

impl Registry {
    /// Opens the registry at `path`, creating it with defaults if absent.
    pub fn open(path: &Path) -> CoreResult<Self> {
        Self::open_with_lock_timeout(path, None)
    }

    /// Opens the registry, waiting at most `timeout` for its lock on every
    /// call (`None` = wait forever).
    pub fn open_with_lock_timeout(path: &Path, timeout: Option<StdDuration>) -> CoreResult<Self> {
        let mut registry = Self::at(path);
        registry.lock_timeout = timeout;
        registry.update(|_| Ok(()))?;
        Ok(registry)
    }

    fn at(path: &Path) -> Self {
        let with = |suffix: &str| {
            let mut os = path.as_os_str().to_os_string();
            os.push(suffix);
            PathBuf::from(os)
        };
        Self {
            path: path.to_path_buf(),
            lock_path: with(".lock"),
            temp_path: with(".tmp"),
            lock_timeout: None,
        }
    }

    /// Sets the lock acquisition timeout.
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: StdDuration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    /// Returns the lock acquisition timeout.
    #[must_use]
    pub fn lock_timeout(&self) -> Option<StdDuration> {
        self.lock_timeout
    }

    /// Returns the registry file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the current configuration.
    pub fn snapshot(&self) -> CoreResult<AppConfig> {
        let _lock = self.lock(None)?;
        self.load()
    }

    /// Runs a read-modify-write cycle on the configuration.
    ///
    /// Nothing is written if `mutate` fails or leaves the configuration
    /// unchanged.
    pub fn update<T>(&self, mutate: impl FnOnce(&mut AppConfig) -> CoreResult<T>) -> CoreResult<T> {
        self.update_within(None, mutate)
    }

    /// Like [`update`](Self::update), waiting at most `timeout` for the lock
    /// instead of the registry's own timeout.
    pub fn update_within<T>(
        &self,
        timeout: Option<StdDuration>,
        mutate: impl FnOnce(&mut AppConfig) -> CoreResult<T>,
    ) -> CoreResult<T> {
        let _lock = self.lock(timeout)?;
        let mut config = self.load()?;
        let before = config.clone();
        let out = mutate(&mut config)?;
        if config != before || !self.path.exists() {
            write_atomic(&self.path, &self.temp_path, &to_pretty_json(&config)?)?;
        }
        Ok(out)
    }

    fn lock(&self, timeout: Option<StdDuration>) -> CoreResult<FileLock> {
        FileLock::acquire(&self.lock_path, timeout.or(self.lock_timeout))
    }

    fn load(&self) -> CoreResult<AppConfig> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "registry missing, using defaults");
            return Ok(AppConfig::default());
        }
        let bytes = fs::read(&self.path)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| CoreError::corrupt(&self.path, format!("invalid registry: {e}")))
    }

    /// Sets the server address and collection log levels.
    pub fn configure(&self, host: &str, port: u16, loggers: Vec<LogLevel>) -> CoreResult<()> {
        self.update(|config| {
            config.host = host.to_string();
            config.port = port;
            config.need_logs = true;
            config.loggers = loggers;
            Ok(())
        })?;
        info!(host, port, "application configured");
        Ok(())
    }

    /// Resets the configuration to defaults.
    pub fn reset(&self) -> CoreResult<()> {
        self.update(|config| {
            *config = AppConfig::default();
            Ok(())
        })
    }

    /// Registers a user. The password is stored hashed.
    pub fn create_user(&self, username: &str, password: &str, permissions: Permission) -> CoreResult<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(CoreError::invalid_input("username is empty"));
        }

        let user = self.update(|config| {
            if config.users.iter().any(|u| u.username == username) {
                return Err(CoreError::already_exists("user", username));
            }
            let user = User {
                username: username.to_string(),
                password: password_hash(password),
                permissions,
            };
            config.users.push(user.clone());
            Ok(user)
        })?;
        info!(username, %permissions, "user created");
        Ok(user)
    }

    /// Removes a user and the tokens issued to them.
    ///
    /// # Errors
    ///
    /// `UnknownEntry` if the user does not exist, `Protected` if they are the
    /// last administrator.
    pub fn delete_user(&self, username: &str) -> CoreResult<()> {
        self.update(|config| {
            let user = config
                .users
                .iter()
                .find(|u| u.username == username)
                .ok_or_else(|| CoreError::unknown("user", username))?;

            let admins = config
                .users
                .iter()
                .filter(|u| u.permissions == Permission::Administrator)
                .count();
            if user.permissions == Permission::Administrator && admins == 1 {
                return Err(CoreError::Protected {
                    name: username.to_string(),
                });
            }

            config.users.retain(|u| u.username != username);
            config.api_keys.retain(|k| k.author != username);
            Ok(())
        })?;
        info!(username, "user deleted");
        Ok(())
    }

    /// Lists registered users.
    pub fn users(&self) -> CoreResult<Vec<User>> {
        Ok(self.snapshot()?.users)
    }

    /// Returns the user whose name and password match.
    pub fn authenticate(&self, username: &str, password: &str) -> CoreResult<Option<User>> {
        let hash = password_hash(password);
        Ok(self
            .snapshot()?
            .users
            .into_iter()
            .find(|u| u.username == username && u.password == hash))
    }

    /// Issues an API token for `username`, pruning expired tokens.
    pub fn create_token(&self, username: &str, ttl: Duration) -> CoreResult<ApiKey> {
        self.update(|config| {
            if !config.users.iter().any(|u| u.username == username) {
                return Err(CoreError::unknown("user", username));
            }
            let now = Utc::now();
            config.api_keys.retain(|k| k.is_valid_at(now));

            let key = ApiKey::issue(username, ttl);
            config.api_keys.push(key.clone());
            Ok(key)
        })
    }

    /// Resolves an unexpired token to its user.
    pub fn user_for_token(&self, token: &str, now: DateTime<Utc>) -> CoreResult<Option<User>> {
        let config = self.snapshot()?;
        let Some(key) = config
            .api_keys
            .iter()
            .find(|k| k.token == token && k.is_valid_at(now))
        else {
            return Ok(None);
        };
        Ok(config.users.into_iter().find(|u| u.username == key.author))
    }

    /// Lists known collections.
    pub fn collections(&self) -> CoreResult<Vec<CollectionInfo>> {
        Ok(self.snapshot()?.databases)
    }

    /// Finds a collection by catalog id.
    pub fn collection_by_id(&self, id: i64) -> CoreResult<Option<CollectionInfo>> {
        Ok(self.collections()?.into_iter().find(|c| c.id == id))
    }

    /// Finds a collection by name (extension ignored).
    pub fn collection_by_name(&self, name: &str) -> CoreResult<Option<CollectionInfo>> {
        let name = collection_name(name)?;
        Ok(self.collections()?.into_iter().find(|c| c.name == name))
    }
}

impl CollectionCatalog for Registry {
    fn register(
        &self,
        paths: &CollectionPaths,
        author: &str,
        lock_timeout: Option<StdDuration>,
    ) -> CoreResult<Option<CollectionInfo>> {
        let created = self.update_within(lock_timeout, |config| {
            if config.databases.iter().any(|c| c.name == paths.name) {
                return Ok(None);
            }
            let info = CollectionInfo {
                id: RecordId::generate().as_i64(),
                name: paths.name.clone(),
                path: paths.data.display().to_string(),
                logs_path: paths.log.display().to_string(),
                created_at: Local::now().format("%d-%m-%Y %H:%M:%S").to_string(),
                author: author.to_string(),
            };
            config.databases.push(info.clone());
            Ok(Some(info))
        })?;

        if let Some(info) = &created {
            info!(collection = %info.name, id = info.id, author, "collection registered");
        }
        Ok(created)
    }

    fn unregister(&self, name: &str, lock_timeout: Option<StdDuration>) -> CoreResult<()> {
        self.update_within(lock_timeout, |config| {
            config.databases.retain(|c| c.name != name);
            Ok(())
        })?;
        info!(collection = name, "collection unregistered");
        Ok(())
    }
}
