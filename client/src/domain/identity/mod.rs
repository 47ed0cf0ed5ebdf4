//! Locally persisted caller identity.
//!
//! Pages persist the user id as free-form text and it is routinely polluted
//! (`"1:1"`, `" 42x "`). [`resolve`] sanitises it into a strict numeric id;
//! [`IdentityStore`] reads it, together with the companion profile fields,
//! from the injected key-value store.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::domain::ports::{KeyValueStore, keys};

/// Caller identity resolved once per page load.
///
/// ## Invariants
/// - `user_id`, when present, is the integer spelled by the ASCII digits of
///   `raw_input` in their original order.
/// - Companion fields are trimmed and never blank.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    raw_input: String,
    user_id: Option<u64>,
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
}

impl Identity {
    /// Text the id was resolved from; empty when nothing was stored.
    #[must_use]
    pub fn raw_input(&self) -> &str {
        self.raw_input.as_str()
    }

    /// Sanitised numeric id.
    #[must_use]
    pub const fn user_id(&self) -> Option<u64> {
        self.user_id
    }

    /// Display name companion field.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// E-mail companion field.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Phone companion field.
    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    /// Whether the id, name, and e-mail are all known.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.user_id.is_some() && self.name.is_some() && self.email.is_some()
    }

    /// Attach companion profile fields; blank values are treated as absent.
    #[must_use]
    pub fn with_profile(
        mut self,
        name: Option<&str>,
        email: Option<&str>,
        phone: Option<&str>,
    ) -> Self {
        self.name = non_blank(name);
        self.email = non_blank(email);
        self.phone = non_blank(phone);
        self
    }
}

/// Sanitise a persisted user id.
///
/// Every character that is not an ASCII digit is removed. An empty remainder,
/// or one too large for `u64`, leaves the id absent. This never fails; pages
/// decide whether an absent id is fatal.
///
/// # Examples
///
/// ```
/// use rental_sync::domain::resolve;
///
/// assert_eq!(resolve(Some(" 42x ")).user_id(), Some(42));
/// assert_eq!(resolve(Some("abc")).user_id(), None);
/// assert_eq!(resolve(None).user_id(), None);
/// ```
#[must_use]
pub fn resolve(raw: Option<&str>) -> Identity {
    let raw_input = raw.unwrap_or_default().to_owned();
    let digits: String = raw_input.chars().filter(char::is_ascii_digit).collect();
    let user_id = if digits.is_empty() {
        None
    } else {
        match digits.parse::<u64>() {
            Ok(value) => Some(value),
            Err(error) => {
                debug!(%error, digits = digits.len(), "persisted user id does not fit u64");
                None
            }
        }
    };
    Identity {
        raw_input,
        user_id,
        ..Identity::default()
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_owned)
}

/// Reads the caller's identity from persisted storage.
#[derive(Clone)]
pub struct IdentityStore {
    storage: Arc<dyn KeyValueStore>,
}

impl IdentityStore {
    /// Build a store over the given key-value capability.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self { storage }
    }

    /// Resolve the identity persisted under the standard keys.
    #[must_use]
    pub fn load(&self) -> Identity {
        let raw = self.storage.get(keys::USER_ID);
        let name = self.storage.get(keys::USER_NAME);
        let email = self.storage.get(keys::USER_EMAIL);
        let phone = self.storage.get(keys::USER_PHONE);
        resolve(raw.as_deref()).with_profile(name.as_deref(), email.as_deref(), phone.as_deref())
    }
}
