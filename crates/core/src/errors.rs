//! Error types for the contactsync core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`SyncError`] enum unifies them for callers that want a single
//! error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    RemoteApi(#[from] RemoteApiError),

    #[error(transparent)]
    Exclusion(#[from] ExclusionError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A required environment variable is not set.
    #[error("required environment variable '{var}' is not set (referenced by config field '{field}')")]
    EnvVarMissing {
        var: String,
        field: String,
    },

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue {
        field: String,
        detail: String,
    },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Directory errors
// ---------------------------------------------------------------------------

/// Errors from the LDAP directory reader.
///
/// Any of these is fatal to a sync run: without a directory result set
/// there is nothing to reconcile.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Could not reach the directory server.
    #[error("directory connection failed: {0}")]
    ConnectionFailed(String),

    /// The bind DN or password was rejected.
    #[error("directory bind failed for '{bind_dn}'")]
    AuthenticationFailed {
        bind_dn: String,
    },

    /// The search itself failed (bad base DN, bad filter, server error).
    #[error("directory search failed: {0}")]
    SearchFailed(String),

    /// Underlying ldap3 protocol error.
    #[error("ldap protocol error: {0}")]
    Protocol(#[from] ldap3::LdapError),
}

// ---------------------------------------------------------------------------
// Remote API errors
// ---------------------------------------------------------------------------

/// Errors from the remote helpdesk/CRM contact API.
#[derive(Debug, Error)]
pub enum RemoteApiError {
    /// HTTP-level transport error (network, TLS, etc.).
    #[error("remote API HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The API returned a non-success status code.
    #[error("remote API error (HTTP {status}): {body}")]
    ApiError {
        status: u16,
        body: String,
    },

    /// API key is missing or rejected.
    #[error("remote API authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The requested contact does not exist.
    #[error("remote contact not found: {0}")]
    ContactNotFound(u64),

    /// More than one remote contact carries the same email address.
    ///
    /// Contacts are keyed by email; multiple matches mean the remote data
    /// violates that invariant, so the record is abandoned rather than
    /// updating an arbitrary match.
    #[error("ambiguous email match for '{email}': {count} contacts")]
    AmbiguousEmail {
        email: String,
        count: usize,
    },

    /// JSON deserialization failure.
    #[error("remote API response parse error: {0}")]
    ParseError(String),
}

// ---------------------------------------------------------------------------
// Exclusion store errors
// ---------------------------------------------------------------------------

/// Errors from the exclusion file store.
#[derive(Debug, Error)]
pub enum ExclusionError {
    /// Generic I/O wrapper.
    #[error("exclusion file I/O error at '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
