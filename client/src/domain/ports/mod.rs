//! Domain ports for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod key_value_store;
mod transport;

#[cfg(test)]
pub use key_value_store::MockKeyValueStore;
pub use key_value_store::{KeyValueStore, KeyValueStoreError, keys};
#[cfg(test)]
pub use transport::MockTransport;
pub use transport::{FixtureTransport, RawResponse, Transport, TransportError, TransportRequest};
