//! Resource sync core for the vehicle-rental web client.
//!
//! Every account-bound page of the rental application follows the same cycle:
//! resolve the persisted identity, perform one REST call, and turn the result
//! into something the presentation layer can show. This crate owns that cycle
//! so pages no longer reimplement it by hand.
//!
//! # Overview
//!
//! - [`domain::IdentityStore`] sanitises the persisted user id into an
//!   [`domain::Identity`].
//! - [`domain::ResourceClient`] performs one exchange through the injected
//!   [`domain::ports::Transport`] and classifies it into a
//!   [`domain::FetchOutcome`].
//! - [`domain::ViewBinder`] turns outcomes into a [`domain::RenderPlan`].
//! - [`domain::SyncController`] wires the three together per page or form.
//!
//! Outbound adapters for HTTP and key-value storage live in [`outbound`];
//! runtime settings live in [`config`].
//!
//! # Example
//!
//! ```
//! use rental_sync::domain::resolve;
//!
//! let identity = resolve(Some(" 42x "));
//! assert_eq!(identity.user_id(), Some(42));
//! ```

pub mod config;
pub mod domain;
pub mod outbound;
