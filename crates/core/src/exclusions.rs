//! Line-oriented exclusion file store.
//!
//! The exclusion file holds one email per line. Blank lines and lines
//! starting with `#` are ignored on load. During a sync run the file is
//! append-only: declining a record adds its email without rewriting prior
//! content. The management CLI may additionally remove entries, which does
//! rewrite the file.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::errors::ExclusionError;

/// Operator-maintained skip list of email addresses.
#[derive(Debug)]
pub struct ExclusionStore {
    path: PathBuf,
    emails: HashSet<String>,
}

impl ExclusionStore {
    /// Load the store from the given file.
    ///
    /// A missing file yields an empty store -- the file is created lazily on
    /// the first [`add`](Self::add).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ExclusionError> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            debug!(path = %path.display(), "exclusion file not found, starting empty");
            return Ok(Self {
                path,
                emails: HashSet::new(),
            });
        }

        let contents = std::fs::read_to_string(&path).map_err(|e| ExclusionError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        let emails: HashSet<String> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();

        info!(path = %path.display(), count = emails.len(), "loaded exclusion list");
        Ok(Self { path, emails })
    }

    /// Whether the given email is excluded.
    pub fn contains(&self, email: &str) -> bool {
        self.emails.contains(email.trim())
    }

    /// Append an email to the store and the backing file.
    ///
    /// Already-present emails are not appended again. Parent directories
    /// are created if needed.
    pub fn add(&mut self, email: &str) -> Result<(), ExclusionError> {
        let email = email.trim();
        if email.is_empty() || self.emails.contains(email) {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| ExclusionError::IoError {
                    path: self.path.display().to_string(),
                    source: e,
                })?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ExclusionError::IoError {
                path: self.path.display().to_string(),
                source: e,
            })?;
        writeln!(file, "{}", email).map_err(|e| ExclusionError::IoError {
            path: self.path.display().to_string(),
            source: e,
        })?;

        self.emails.insert(email.to_string());
        info!(email, "added email to exclusion list");
        Ok(())
    }

    /// Remove an email from the store, rewriting the backing file.
    ///
    /// Non-matching lines (including comments) are preserved verbatim.
    /// Returns `true` if the email was present.
    pub fn remove(&mut self, email: &str) -> Result<bool, ExclusionError> {
        let email = email.trim();
        if !self.emails.remove(email) {
            return Ok(false);
        }

        let contents =
            std::fs::read_to_string(&self.path).map_err(|e| ExclusionError::IoError {
                path: self.path.display().to_string(),
                source: e,
            })?;
        let retained: String = contents
            .lines()
            .filter(|line| line.trim() != email)
            .map(|line| format!("{}\n", line))
            .collect();
        std::fs::write(&self.path, retained).map_err(|e| ExclusionError::IoError {
            path: self.path.display().to_string(),
            source: e,
        })?;

        info!(email, "removed email from exclusion list");
        Ok(true)
    }

    /// All excluded emails, sorted for stable display.
    pub fn emails(&self) -> Vec<&str> {
        let mut list: Vec<&str> = self.emails.iter().map(String::as_str).collect();
        list.sort_unstable();
        list
    }

    /// Number of excluded emails.
    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}
