//! contactsync core library.
//!
//! This crate provides the components for directory → helpdesk contact
//! synchronization: configuration, the LDAP directory reader, the remote
//! contact API client, static client resolution, the exclusion store, and
//! the reconciliation engine.

pub mod config;
pub mod directory;
pub mod errors;
pub mod exclusions;
pub mod models;
pub mod normalize;
pub mod reconciler;
pub mod remote;
pub mod resolver;

// Re-exports for convenience.
pub use config::AppConfig;
pub use exclusions::ExclusionStore;
pub use reconciler::Reconciler;
pub use resolver::ClientResolver;
