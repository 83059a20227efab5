//! Directory service access.
//!
//! [`DirectorySource`] is the seam between the reconciliation engine and
//! the directory service: production code uses the LDAP implementation,
//! tests substitute a fake.

pub mod ldap;

use async_trait::async_trait;

use crate::errors::DirectoryError;
use crate::models::DirectoryRecord;

pub use ldap::LdapDirectory;

/// Source of directory records for a sync run.
#[async_trait]
pub trait DirectorySource: Send + Sync {
    /// Fetch all enabled user/contact records under the configured search
    /// base. Failure here is fatal to the run.
    async fn fetch_records(&self) -> Result<Vec<DirectoryRecord>, DirectoryError>;
}
