//! Remote helpdesk/CRM contact API access.
//!
//! [`RemoteApi`] is the seam between the reconciliation engine and the
//! remote system: production code uses the HTTP implementation, tests
//! substitute a fake.

pub mod http;

use async_trait::async_trait;

use crate::errors::RemoteApiError;
use crate::models::{Client, ContactPayload, RemoteContact};

pub use http::HttpRemoteApi;

/// Operations the reconciler needs from the remote contact API.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Look up a contact by exact email match.
    ///
    /// Returns `None` when no contact carries the email and an
    /// [`RemoteApiError::AmbiguousEmail`] error when more than one does.
    async fn find_contact_by_email(
        &self,
        email: &str,
    ) -> Result<Option<RemoteContact>, RemoteApiError>;

    /// Create a new contact.
    async fn create_contact(
        &self,
        payload: &ContactPayload,
    ) -> Result<RemoteContact, RemoteApiError>;

    /// Overwrite an existing contact, keyed by its remote identifier.
    async fn update_contact(
        &self,
        id: u64,
        payload: &ContactPayload,
    ) -> Result<RemoteContact, RemoteApiError>;

    /// Fetch the live client list.
    async fn list_clients(&self) -> Result<Vec<Client>, RemoteApiError>;
}
