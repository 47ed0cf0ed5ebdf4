//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **http**: reqwest-backed [`Transport`](crate::domain::ports::Transport)
//! - **storage**: in-memory and JSON-file
//!   [`KeyValueStore`](crate::domain::ports::KeyValueStore) implementations
//!
//! Adapters translate between domain types and infrastructure types. They
//! contain no sync logic.

pub mod http;
pub mod storage;
