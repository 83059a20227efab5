//! Domain model types used throughout contactsync.
//!
//! These types bridge the directory reader, the remote API client, and the
//! reconciliation engine.

use chrono::Utc;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Directory side
// ---------------------------------------------------------------------------

/// A user/contact entry as returned by the directory service.
///
/// Read-only per run; never persisted. Attributes the directory does not
/// carry for an entry are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryRecord {
    pub display_name: String,
    pub email: String,
    pub title: String,
    pub department: String,
    pub phone: String,
    pub mobile: String,
    pub extension: String,
    pub distinguished_name: String,
}

impl DirectoryRecord {
    /// Whether this record carries a usable email address.
    pub fn has_email(&self) -> bool {
        !self.email.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Remote side
// ---------------------------------------------------------------------------

/// A contact as stored in the remote helpdesk/CRM system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoteContact {
    /// Remote-system identifier, assigned by the API.
    pub id: u64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub extension: String,
    /// Owning client identifier.
    pub client_id: u64,
}

/// The body submitted to the remote API on create and update.
///
/// Phone fields are expected to already be normalized (see
/// [`crate::normalize::PhoneRule`]).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactPayload {
    pub name: String,
    pub email: String,
    pub title: String,
    pub department: String,
    pub phone: String,
    pub mobile: String,
    pub extension: String,
    pub client_id: u64,
}

/// A client (tenant/company) record from the remote system.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Client {
    pub id: u64,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Run outcome reporting
// ---------------------------------------------------------------------------

/// What happened to a single directory record during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// An existing remote contact was updated.
    Updated,
    /// A new remote contact was created.
    Created,
    /// The record carries no email address.
    SkippedNoEmail,
    /// The email is on the exclusion list.
    SkippedExcluded,
    /// The operator declined the record; it was added to the exclusion list.
    Declined,
    /// No client could be assigned and no decision was recorded.
    Unassigned,
    /// A remote call for this record failed; the record was abandoned.
    Failed,
}

impl std::fmt::Display for RecordOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Updated => write!(f, "updated"),
            Self::Created => write!(f, "created"),
            Self::SkippedNoEmail => write!(f, "skipped_no_email"),
            Self::SkippedExcluded => write!(f, "skipped_excluded"),
            Self::Declined => write!(f, "declined"),
            Self::Unassigned => write!(f, "unassigned"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Counters from a single reconciliation run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncStats {
    pub total_records: usize,
    pub updated: usize,
    pub created: usize,
    pub skipped_no_email: usize,
    pub skipped_excluded: usize,
    pub declined: usize,
    pub unassigned: usize,
    pub failed: usize,
    pub started_at: String,
    pub completed_at: Option<String>,
}

impl SyncStats {
    /// Create stats stamped with the current time.
    pub fn begin() -> Self {
        Self {
            started_at: Utc::now().to_rfc3339(),
            ..Default::default()
        }
    }

    /// Bump the counter for a record outcome.
    pub fn record(&mut self, outcome: RecordOutcome) {
        match outcome {
            RecordOutcome::Updated => self.updated += 1,
            RecordOutcome::Created => self.created += 1,
            RecordOutcome::SkippedNoEmail => self.skipped_no_email += 1,
            RecordOutcome::SkippedExcluded => self.skipped_excluded += 1,
            RecordOutcome::Declined => self.declined += 1,
            RecordOutcome::Unassigned => self.unassigned += 1,
            RecordOutcome::Failed => self.failed += 1,
        }
    }

    /// Stamp the completion time.
    pub fn finish(&mut self) {
        self.completed_at = Some(Utc::now().to_rfc3339());
    }

    /// Number of records that resulted in a remote write.
    pub fn written(&self) -> usize {
        self.updated + self.created
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_email() {
        let mut record = DirectoryRecord {
            display_name: "Jane Doe".into(),
            email: "jane@x.com".into(),
            ..Default::default()
        };
        assert!(record.has_email());

        record.email = "   ".into();
        assert!(!record.has_email());

        record.email = String::new();
        assert!(!record.has_email());
    }

    #[test]
    fn test_stats_record_and_written() {
        let mut stats = SyncStats::begin();
        stats.record(RecordOutcome::Updated);
        stats.record(RecordOutcome::Updated);
        stats.record(RecordOutcome::Created);
        stats.record(RecordOutcome::Failed);
        stats.record(RecordOutcome::SkippedExcluded);
        stats.finish();

        assert_eq!(stats.updated, 2);
        assert_eq!(stats.created, 1);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.skipped_excluded, 1);
        assert_eq!(stats.written(), 3);
        assert!(stats.completed_at.is_some());
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(RecordOutcome::Updated.to_string(), "updated");
        assert_eq!(RecordOutcome::SkippedNoEmail.to_string(), "skipped_no_email");
        assert_eq!(RecordOutcome::Declined.to_string(), "declined");
    }

    #[test]
    fn test_remote_contact_deserializes_with_missing_optionals() {
        let json = r#"{"id": 7, "name": "Jane Doe", "email": "jane@x.com", "client_id": 101}"#;
        let contact: RemoteContact = serde_json::from_str(json).unwrap();
        assert_eq!(contact.id, 7);
        assert_eq!(contact.client_id, 101);
        assert!(contact.title.is_empty());
        assert!(contact.phone.is_empty());
    }
}
