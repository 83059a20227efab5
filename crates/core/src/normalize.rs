//! Phone number normalization.
//!
//! Directory phone fields are stored in international notation
//! (`+49 30 1234567`) while the remote system expects the national form
//! (`030 1234567`). The rule is a plain prefix replacement, applied at most
//! once, at the start of the number.

/// A configured country-prefix replacement rule.
#[derive(Debug, Clone)]
pub struct PhoneRule {
    prefix: String,
    replacement: String,
}

impl PhoneRule {
    pub fn new(prefix: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            replacement: replacement.into(),
        }
    }

    /// Apply the rule to a phone number.
    ///
    /// Numbers not starting with the prefix pass through unchanged. An
    /// empty prefix disables the rule entirely.
    pub fn apply(&self, number: &str) -> String {
        if self.prefix.is_empty() {
            return number.to_string();
        }
        match number.strip_prefix(&self.prefix) {
            Some(rest) => format!("{}{}", self.replacement, rest),
            None => number.to_string(),
        }
    }
}
