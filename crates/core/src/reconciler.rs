//! Directory → remote contact reconciliation engine.
//!
//! The [`Reconciler`] is the heart of contactsync. It performs one
//! sequential pass:
//!
//! 1. Fetch all enabled records from the directory (fatal on failure).
//! 2. For each record with an email, look up the remote contact by email:
//!    found → update in place, not found → queue as new.
//! 3. For each queued record: skip if excluded, otherwise assign a client
//!    (static mapping first, interactive selection as fallback) and create
//!    the contact. A decline appends the email to the exclusion list.
//!
//! Every remote call is independently guarded: a failure is logged, the
//! record is abandoned, and the pass continues. There are no retries and
//! no rollback.

use tracing::{debug, error, info, warn};

use crate::directory::DirectorySource;
use crate::errors::SyncError;
use crate::exclusions::ExclusionStore;
use crate::models::{Client, ContactPayload, DirectoryRecord, RecordOutcome, SyncStats};
use crate::normalize::PhoneRule;
use crate::remote::RemoteApi;
use crate::resolver::ClientResolver;

// ---------------------------------------------------------------------------
// Interactive selection seam
// ---------------------------------------------------------------------------

/// Outcome of asking for a client assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// Assign the record to this client.
    Client(u64),
    /// The operator declined the record; remember it in the exclusion list.
    Decline,
    /// No decision was made (non-interactive run); do not remember anything.
    Skip,
}

/// Asks for a client assignment when the static mapping has no answer.
///
/// The CLI implements this with an interactive prompt; tests script it.
pub trait ClientPicker: Send {
    fn pick(&mut self, record: &DirectoryRecord, clients: &[Client]) -> Selection;
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The single-pass reconciliation engine.
pub struct Reconciler {
    directory: Box<dyn DirectorySource>,
    remote: Box<dyn RemoteApi>,
    resolver: ClientResolver,
    exclusions: ExclusionStore,
    picker: Box<dyn ClientPicker>,
    phone_rule: PhoneRule,
    dry_run: bool,
}

impl Reconciler {
    /// Create a new reconciler with all required collaborators.
    pub fn new(
        directory: Box<dyn DirectorySource>,
        remote: Box<dyn RemoteApi>,
        resolver: ClientResolver,
        exclusions: ExclusionStore,
        picker: Box<dyn ClientPicker>,
        phone_rule: PhoneRule,
    ) -> Self {
        info!("initializing reconciler");
        Self {
            directory,
            remote,
            resolver,
            exclusions,
            picker,
            phone_rule,
            dry_run: false,
        }
    }

    /// Enable dry-run mode: all reads and routing happen, but no remote
    /// write and no exclusion append is performed.
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    // -----------------------------------------------------------------------
    // Main entry point
    // -----------------------------------------------------------------------

    /// Execute one full reconciliation pass.
    ///
    /// Returns statistics about what was synced. A directory failure aborts
    /// the run; per-record remote failures are counted and skipped.
    pub async fn run(&mut self) -> Result<SyncStats, SyncError> {
        let mut stats = SyncStats::begin();

        let records = self.directory.fetch_records().await?;
        stats.total_records = records.len();
        info!(count = records.len(), "fetched directory records");

        let pending = self.update_pass(records, &mut stats).await;
        self.create_pass(pending, &mut stats).await;

        stats.finish();
        info!(
            updated = stats.updated,
            created = stats.created,
            declined = stats.declined,
            excluded = stats.skipped_excluded,
            failed = stats.failed,
            "reconciliation completed"
        );
        Ok(stats)
    }

    // -----------------------------------------------------------------------
    // Pass 1: update existing contacts, queue the rest
    // -----------------------------------------------------------------------

    /// Route each record: existing remote contact → update, unknown email →
    /// returned queue of new-contact candidates.
    async fn update_pass(
        &self,
        records: Vec<DirectoryRecord>,
        stats: &mut SyncStats,
    ) -> Vec<DirectoryRecord> {
        let mut pending = Vec::new();

        for record in records {
            if !record.has_email() {
                debug!(name = %record.display_name, "record has no email, skipping");
                stats.record(RecordOutcome::SkippedNoEmail);
                continue;
            }
            let email = record.email.trim().to_string();

            match self.remote.find_contact_by_email(&email).await {
                Ok(Some(existing)) => {
                    // Client assignment is only ever chosen for new
                    // contacts; updates keep the contact where it lives.
                    let payload = build_payload(&record, existing.client_id, &self.phone_rule);
                    if self.dry_run {
                        info!(email = %email, id = existing.id, "dry-run: would update contact");
                        stats.record(RecordOutcome::Updated);
                        continue;
                    }
                    match self.remote.update_contact(existing.id, &payload).await {
                        Ok(_) => {
                            info!(email = %email, id = existing.id, "updated contact");
                            stats.record(RecordOutcome::Updated);
                        }
                        Err(e) => {
                            error!(email = %email, id = existing.id, error = %e, "contact update failed");
                            stats.record(RecordOutcome::Failed);
                        }
                    }
                }
                Ok(None) => pending.push(record),
                Err(e) => {
                    error!(email = %email, error = %e, "contact lookup failed");
                    stats.record(RecordOutcome::Failed);
                }
            }
        }

        debug!(count = pending.len(), "queued new-contact candidates");
        pending
    }

    // -----------------------------------------------------------------------
    // Pass 2: create queued contacts
    // -----------------------------------------------------------------------

    /// Process the new-contact queue: consult the exclusion list, assign a
    /// client (static mapping, then interactive selection), create.
    async fn create_pass(&mut self, pending: Vec<DirectoryRecord>, stats: &mut SyncStats) {
        // The live client list is fetched lazily, at most once per run, and
        // only if a record actually reaches interactive selection.
        let mut clients: Option<Vec<Client>> = None;

        for record in pending {
            let email = record.email.trim().to_string();

            if self.exclusions.contains(&email) {
                debug!(email = %email, "email is on the exclusion list, skipping");
                stats.record(RecordOutcome::SkippedExcluded);
                continue;
            }

            let selection = match self.resolver.resolve(&record.distinguished_name) {
                Some(client_id) => Selection::Client(client_id),
                None => {
                    if clients.is_none() {
                        match self.remote.list_clients().await {
                            Ok(list) => clients = Some(list),
                            Err(e) => {
                                error!(email = %email, error = %e, "client list fetch failed");
                                stats.record(RecordOutcome::Failed);
                                continue;
                            }
                        }
                    }
                    let list = clients.as_deref().unwrap_or(&[]);
                    self.picker.pick(&record, list)
                }
            };

            match selection {
                Selection::Client(client_id) => {
                    let payload = build_payload(&record, client_id, &self.phone_rule);
                    if self.dry_run {
                        info!(email = %email, client_id, "dry-run: would create contact");
                        stats.record(RecordOutcome::Created);
                        continue;
                    }
                    match self.remote.create_contact(&payload).await {
                        Ok(created) => {
                            info!(email = %email, id = created.id, client_id, "created contact");
                            stats.record(RecordOutcome::Created);
                        }
                        Err(e) => {
                            error!(email = %email, error = %e, "contact creation failed");
                            stats.record(RecordOutcome::Failed);
                        }
                    }
                }
                Selection::Decline => {
                    if self.dry_run {
                        info!(email = %email, "dry-run: would add email to exclusion list");
                    } else if let Err(e) = self.exclusions.add(&email) {
                        // The decline still counts; it just won't be
                        // remembered for the next run.
                        warn!(email = %email, error = %e, "failed to persist exclusion");
                    }
                    stats.record(RecordOutcome::Declined);
                }
                Selection::Skip => {
                    debug!(email = %email, "no client assigned, record skipped");
                    stats.record(RecordOutcome::Unassigned);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Payload construction
// ---------------------------------------------------------------------------

/// Build the create/update body for a record, normalizing phone fields.
///
/// The extension is an internal number and carries no country prefix, so
/// the rule is not applied to it.
pub fn build_payload(
    record: &DirectoryRecord,
    client_id: u64,
    phone_rule: &PhoneRule,
) -> ContactPayload {
    ContactPayload {
        name: record.display_name.clone(),
        email: record.email.trim().to_string(),
        title: record.title.clone(),
        department: record.department.clone(),
        phone: phone_rule.apply(&record.phone),
        mobile: phone_rule.apply(&record.mobile),
        extension: record.extension.clone(),
        client_id,
    }
}
