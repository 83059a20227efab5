//! TOML-based configuration system for contactsync.
//!
//! All sensitive values (bind password, API key) are stored as `_env` fields
//! that reference environment variable names. The actual secrets are
//! resolved at runtime via [`AppConfig::resolve_env_vars`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory (LDAP) connection and search settings.
    pub directory: DirectoryConfig,

    /// Remote helpdesk/CRM API settings.
    pub remote: RemoteConfig,

    /// Reconciliation behaviour settings.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

/// LDAP attribute names for the fields of a directory record.
///
/// Defaults follow Active Directory conventions; plain OpenLDAP deployments
/// typically override `display_name` to `cn` and `phone` to
/// `telephoneNumber` equivalents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeMap {
    #[serde(default = "default_attr_display_name")]
    pub display_name: String,

    #[serde(default = "default_attr_email")]
    pub email: String,

    #[serde(default = "default_attr_title")]
    pub title: String,

    #[serde(default = "default_attr_department")]
    pub department: String,

    #[serde(default = "default_attr_phone")]
    pub phone: String,

    #[serde(default = "default_attr_mobile")]
    pub mobile: String,

    #[serde(default = "default_attr_extension")]
    pub extension: String,
}

fn default_attr_display_name() -> String {
    "displayName".into()
}
fn default_attr_email() -> String {
    "mail".into()
}
fn default_attr_title() -> String {
    "title".into()
}
fn default_attr_department() -> String {
    "department".into()
}
fn default_attr_phone() -> String {
    "telephoneNumber".into()
}
fn default_attr_mobile() -> String {
    "mobile".into()
}
fn default_attr_extension() -> String {
    "ipPhone".into()
}

impl Default for AttributeMap {
    fn default() -> Self {
        Self {
            display_name: default_attr_display_name(),
            email: default_attr_email(),
            title: default_attr_title(),
            department: default_attr_department(),
            phone: default_attr_phone(),
            mobile: default_attr_mobile(),
            extension: default_attr_extension(),
        }
    }
}

/// Directory server connection and search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// Directory server hostname.
    pub host: String,

    /// Directory server port (default 636).
    #[serde(default = "default_ldap_port")]
    pub port: u16,

    /// Use LDAPS (default true).
    #[serde(default = "default_true")]
    pub use_ssl: bool,

    /// Upgrade a plain connection with STARTTLS.
    #[serde(default)]
    pub use_starttls: bool,

    /// Search base DN (e.g. `OU=Users,DC=example,DC=com`).
    pub base_dn: String,

    /// Bind DN for authenticated queries.
    pub bind_dn: String,

    /// Environment variable holding the bind password.
    pub bind_password_env: String,

    /// LDAP search filter. The default selects enabled person accounts
    /// (the `userAccountControl` bit test excludes disabled AD accounts).
    #[serde(default = "default_ldap_filter")]
    pub filter: String,

    /// Connection timeout in seconds (default 10).
    #[serde(default = "default_ldap_timeout")]
    pub connect_timeout_secs: u64,

    /// LDAP attribute names for each record field.
    #[serde(default)]
    pub attributes: AttributeMap,

    /// Resolved bind password (populated by `resolve_env_vars`).
    #[serde(skip)]
    pub bind_password: Option<String>,
}

fn default_ldap_port() -> u16 {
    636
}
fn default_ldap_filter() -> String {
    "(&(objectClass=person)(!(userAccountControl:1.2.840.113556.1.4.803:=2)))".into()
}
fn default_ldap_timeout() -> u64 {
    10
}

// ---------------------------------------------------------------------------
// Remote API
// ---------------------------------------------------------------------------

/// Remote helpdesk/CRM API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// API base URL (e.g. `https://desk.example.com/api/v1`).
    pub api_url: String,

    /// Environment variable holding the static API key.
    pub api_key_env: String,

    /// Request timeout in seconds (default 30).
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,

    /// Resolved API key (populated by `resolve_env_vars`).
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_http_timeout() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// Sync behaviour
// ---------------------------------------------------------------------------

/// A single DN-substring → client mapping entry.
///
/// Entries are matched in configuration-file order; the first pattern found
/// in a record's distinguished name wins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientMapping {
    /// Substring to look for in the distinguished name (e.g. `OU=Sales`).
    pub pattern: String,

    /// Remote client identifier assigned on match.
    pub client_id: u64,
}

/// Reconciliation behaviour configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Country-code prefix to replace in phone numbers (default `+49`).
    #[serde(default = "default_country_prefix")]
    pub country_prefix: String,

    /// Replacement for the country-code prefix (default `0`).
    #[serde(default = "default_prefix_replacement")]
    pub prefix_replacement: String,

    /// Path to the line-oriented exclusion file.
    #[serde(default = "default_exclusion_file")]
    pub exclusion_file: PathBuf,

    /// Static DN-substring → client mappings, in match order.
    #[serde(default)]
    pub mappings: Vec<ClientMapping>,
}

fn default_country_prefix() -> String {
    "+49".into()
}
fn default_prefix_replacement() -> String {
    "0".into()
}
fn default_exclusion_file() -> PathBuf {
    PathBuf::from("/var/lib/contactsync/exclusions.txt")
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            country_prefix: default_country_prefix(),
            prefix_replacement: default_prefix_replacement(),
            exclusion_file: default_exclusion_file(),
            mappings: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for the daily-rolling log file. `None` logs to console only.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".into()
}
fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load an [`AppConfig`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Resolve all `*_env` fields from environment variables and populate
    /// the corresponding resolved fields.
    ///
    /// Fields that reference a missing variable log a warning but do **not**
    /// fail -- callers check the `Option` fields and decide what is required
    /// for their execution mode (`validate` tolerates missing secrets,
    /// `sync` does not).
    pub fn resolve_env_vars(&mut self) {
        info!("resolving environment variable references in config");

        self.directory.bind_password = resolve_optional_env(
            &self.directory.bind_password_env,
            "directory.bind_password_env",
        );
        self.remote.api_key =
            resolve_optional_env(&self.remote.api_key_env, "remote.api_key_env");

        debug!("environment variable resolution complete");
    }

    /// Validate that all required fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.directory.host.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "directory.host".into(),
                detail: "directory host must not be empty".into(),
            });
        }
        if self.directory.base_dn.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "directory.base_dn".into(),
                detail: "search base DN must not be empty".into(),
            });
        }
        if self.directory.bind_dn.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "directory.bind_dn".into(),
                detail: "bind DN must not be empty".into(),
            });
        }
        if self.remote.api_url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "remote.api_url".into(),
                detail: "API URL must not be empty".into(),
            });
        }
        if !self.remote.api_url.starts_with("http://")
            && !self.remote.api_url.starts_with("https://")
        {
            return Err(ConfigError::InvalidValue {
                field: "remote.api_url".into(),
                detail: "API URL must start with http:// or https://".into(),
            });
        }
        for (i, mapping) in self.sync.mappings.iter().enumerate() {
            if mapping.pattern.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("sync.mappings[{}].pattern", i),
                    detail: "mapping pattern must not be empty".into(),
                });
            }
            if mapping.client_id == 0 {
                return Err(ConfigError::InvalidValue {
                    field: format!("sync.mappings[{}].client_id", i),
                    detail: "client id 0 is reserved for 'decline'".into(),
                });
            }
        }

        Ok(())
    }

    /// Convenience: load, resolve, and validate in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.resolve_env_vars();
        config.validate()?;
        Ok(config)
    }
}

/// Try to read an environment variable by name. Returns `Some(value)` on
/// success; logs a warning and returns `None` if the variable is unset.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}
