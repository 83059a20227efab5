//! Static DN → client resolution.
//!
//! [`ClientResolver`] maps a record's distinguished name to a remote client
//! identifier by substring matching against the configured mapping table.
//! Records it cannot resolve fall back to interactive selection in the
//! reconciler.

use tracing::debug;

use crate::config::ClientMapping;

/// Resolves distinguished names to client identifiers via the static
/// mapping table.
///
/// Mappings are checked in configuration-file order and the first pattern
/// contained in the DN wins, so more specific patterns should be listed
/// before broader ones.
#[derive(Debug, Clone)]
pub struct ClientResolver {
    mappings: Vec<ClientMapping>,
}

impl ClientResolver {
    pub fn new(mappings: Vec<ClientMapping>) -> Self {
        Self { mappings }
    }

    /// Return the client id for the first mapping whose pattern appears in
    /// the distinguished name, or `None` if no pattern matches.
    ///
    /// Matching is case-sensitive: patterns are written exactly as the
    /// directory renders DN components.
    pub fn resolve(&self, distinguished_name: &str) -> Option<u64> {
        for mapping in &self.mappings {
            if distinguished_name.contains(&mapping.pattern) {
                debug!(
                    pattern = %mapping.pattern,
                    client_id = mapping.client_id,
                    "resolved client from static mapping"
                );
                return Some(mapping.client_id);
            }
        }
        debug!(dn = %distinguished_name, "no static client mapping matched");
        None
    }

    /// Number of configured mappings.
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}
