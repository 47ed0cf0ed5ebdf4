//! Driven port for the browser-style key-value store holding identity.
//!
//! Reads never fail from the caller's point of view: an unreadable entry is
//! simply absent, matching how pages treat missing storage keys. Writes can
//! fail and report why.

use super::define_port_error;

/// Storage keys shared by the rental pages.
pub mod keys {
    /// Numeric user identifier, possibly polluted with stray characters.
    pub const USER_ID: &str = "userId";
    /// Display name captured at login.
    pub const USER_NAME: &str = "userName";
    /// E-mail address captured at login.
    pub const USER_EMAIL: &str = "userEmail";
    /// Phone number captured at login.
    pub const USER_PHONE: &str = "userPhone";
    /// Booking whose invoice the invoice page shows.
    pub const BOOKING_INVOICE_ID: &str = "bookingInvoiceId";
}

define_port_error! {
    /// Errors raised while persisting a key.
    pub enum KeyValueStoreError {
        /// The backing medium rejected the write.
        Write { key: String, message: String } =>
            "failed to store '{key}': {message}",
    }
}

/// Port for persisted string entries.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`KeyValueStoreError::Write`] when the entry cannot be
    /// persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), KeyValueStoreError>;
}
