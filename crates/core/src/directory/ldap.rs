//! LDAP implementation of the directory source.
//!
//! Connects to the configured server, binds with the service account, and
//! runs one subtree search per [`fetch_records`](DirectorySource::fetch_records)
//! call. Each run opens a fresh connection; there is nothing to keep warm
//! between the single search of a run and the next run.

use async_trait::async_trait;
use ldap3::{LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use tracing::{debug, info, instrument, warn};

use crate::config::DirectoryConfig;
use crate::directory::DirectorySource;
use crate::errors::DirectoryError;
use crate::models::DirectoryRecord;

/// LDAP result code for invalid credentials.
const RC_INVALID_CREDENTIALS: u32 = 49;

/// Directory source backed by an LDAP/Active Directory server.
pub struct LdapDirectory {
    config: DirectoryConfig,
}

impl LdapDirectory {
    pub fn new(config: DirectoryConfig) -> Self {
        info!(
            host = %config.host,
            base_dn = %config.base_dn,
            "created LdapDirectory"
        );
        Self { config }
    }

    fn server_url(&self) -> String {
        let scheme = if self.config.use_ssl { "ldaps" } else { "ldap" };
        format!("{}://{}:{}", scheme, self.config.host, self.config.port)
    }

    /// Connect and bind, returning a ready-to-search handle.
    async fn connect(&self) -> Result<ldap3::Ldap, DirectoryError> {
        let url = self.server_url();
        debug!(url = %url, "connecting to directory server");

        let settings = LdapConnSettings::new()
            .set_conn_timeout(std::time::Duration::from_secs(
                self.config.connect_timeout_secs,
            ))
            .set_starttls(self.config.use_starttls);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| {
                DirectoryError::ConnectionFailed(format!("connect to {} failed: {}", url, e))
            })?;

        // Drive the connection in the background for the lifetime of the handle.
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        let bind_dn = &self.config.bind_dn;
        let bind_password = self.config.bind_password.as_deref().unwrap_or("");
        debug!(bind_dn = %bind_dn, "performing LDAP bind");

        let result = ldap.simple_bind(bind_dn, bind_password).await?;
        if result.rc == RC_INVALID_CREDENTIALS {
            return Err(DirectoryError::AuthenticationFailed {
                bind_dn: bind_dn.clone(),
            });
        }
        if result.rc != 0 {
            return Err(DirectoryError::ConnectionFailed(format!(
                "bind failed with code {}: {}",
                result.rc, result.text
            )));
        }

        Ok(ldap)
    }

    /// Convert an LDAP entry to a [`DirectoryRecord`].
    ///
    /// Entries without a display name are unusable (nothing to show the
    /// operator, nothing to write to the remote system) and are dropped
    /// with a warning.
    fn entry_to_record(&self, entry: SearchEntry) -> Option<DirectoryRecord> {
        let attrs = &self.config.attributes;
        let display_name = attr_first(&entry, &attrs.display_name);
        if display_name.is_empty() {
            warn!(dn = %entry.dn, "dropping directory entry without display name");
            return None;
        }

        Some(DirectoryRecord {
            display_name,
            email: attr_first(&entry, &attrs.email),
            title: attr_first(&entry, &attrs.title),
            department: attr_first(&entry, &attrs.department),
            phone: attr_first(&entry, &attrs.phone),
            mobile: attr_first(&entry, &attrs.mobile),
            extension: attr_first(&entry, &attrs.extension),
            distinguished_name: entry.dn,
        })
    }
}

#[async_trait]
impl DirectorySource for LdapDirectory {
    #[instrument(skip(self))]
    async fn fetch_records(&self) -> Result<Vec<DirectoryRecord>, DirectoryError> {
        let mut ldap = self.connect().await?;

        let attrs = &self.config.attributes;
        let requested: Vec<&str> = vec![
            attrs.display_name.as_str(),
            attrs.email.as_str(),
            attrs.title.as_str(),
            attrs.department.as_str(),
            attrs.phone.as_str(),
            attrs.mobile.as_str(),
            attrs.extension.as_str(),
        ];

        debug!(
            filter = %self.config.filter,
            base_dn = %self.config.base_dn,
            "searching directory"
        );

        let result = ldap
            .search(
                &self.config.base_dn,
                Scope::Subtree,
                &self.config.filter,
                requested,
            )
            .await?;

        let (entries, _) = result
            .success()
            .map_err(|e| DirectoryError::SearchFailed(e.to_string()))?;

        let total = entries.len();
        let records: Vec<DirectoryRecord> = entries
            .into_iter()
            .map(SearchEntry::construct)
            .filter_map(|entry| self.entry_to_record(entry))
            .collect();

        let _ = ldap.unbind().await;

        info!(
            total_found = total,
            usable = records.len(),
            "directory search completed"
        );
        Ok(records)
    }
}

/// First value of a named attribute, or an empty string.
fn attr_first(entry: &SearchEntry, name: &str) -> String {
    entry
        .attrs
        .get(name)
        .and_then(|values| values.first())
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AttributeMap;
    use std::collections::HashMap;

    fn sample_config() -> DirectoryConfig {
        DirectoryConfig {
            host: "ldap.example.com".into(),
            port: 636,
            use_ssl: true,
            use_starttls: false,
            base_dn: "OU=Users,DC=example,DC=com".into(),
            bind_dn: "CN=svc,DC=example,DC=com".into(),
            bind_password_env: "LDAP_PW".into(),
            filter: "(objectClass=person)".into(),
            connect_timeout_secs: 10,
            attributes: AttributeMap::default(),
            bind_password: None,
        }
    }

    fn entry_with(attrs: Vec<(&str, Vec<&str>)>) -> SearchEntry {
        SearchEntry {
            dn: "CN=Jane Doe,OU=Sales,DC=example,DC=com".into(),
            attrs: attrs
                .into_iter()
                .map(|(k, vs)| (k.to_string(), vs.into_iter().map(String::from).collect()))
                .collect(),
            bin_attrs: HashMap::new(),
        }
    }

    #[test]
    fn test_server_url_schemes() {
        let mut config = sample_config();
        let dir = LdapDirectory::new(config.clone());
        assert_eq!(dir.server_url(), "ldaps://ldap.example.com:636");

        config.use_ssl = false;
        config.port = 389;
        let dir = LdapDirectory::new(config);
        assert_eq!(dir.server_url(), "ldap://ldap.example.com:389");
    }

    #[test]
    fn test_entry_to_record_maps_attributes() {
        let dir = LdapDirectory::new(sample_config());
        let entry = entry_with(vec![
            ("displayName", vec!["Jane Doe"]),
            ("mail", vec!["jane@x.com"]),
            ("title", vec!["Account Manager"]),
            ("department", vec!["Sales"]),
            ("telephoneNumber", vec!["+49301234567"]),
            ("mobile", vec!["+491701234567"]),
            ("ipPhone", vec!["1234"]),
        ]);

        let record = dir.entry_to_record(entry).unwrap();
        assert_eq!(record.display_name, "Jane Doe");
        assert_eq!(record.email, "jane@x.com");
        assert_eq!(record.title, "Account Manager");
        assert_eq!(record.department, "Sales");
        assert_eq!(record.phone, "+49301234567");
        assert_eq!(record.mobile, "+491701234567");
        assert_eq!(record.extension, "1234");
        assert_eq!(
            record.distinguished_name,
            "CN=Jane Doe,OU=Sales,DC=example,DC=com"
        );
    }

    #[test]
    fn test_entry_without_display_name_dropped() {
        let dir = LdapDirectory::new(sample_config());
        let entry = entry_with(vec![("mail", vec!["jane@x.com"])]);
        assert!(dir.entry_to_record(entry).is_none());
    }

    #[test]
    fn test_missing_attributes_default_to_empty() {
        let dir = LdapDirectory::new(sample_config());
        let entry = entry_with(vec![("displayName", vec!["Jane Doe"])]);

        let record = dir.entry_to_record(entry).unwrap();
        assert!(record.email.is_empty());
        assert!(record.phone.is_empty());
        assert!(record.extension.is_empty());
    }

    #[test]
    fn test_multi_valued_attribute_takes_first() {
        let dir = LdapDirectory::new(sample_config());
        let entry = entry_with(vec![
            ("displayName", vec!["Jane Doe"]),
            ("mail", vec!["jane@x.com", "jane.doe@x.com"]),
        ]);

        let record = dir.entry_to_record(entry).unwrap();
        assert_eq!(record.email, "jane@x.com");
    }
}
