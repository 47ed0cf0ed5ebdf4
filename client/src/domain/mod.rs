//! Domain types and services for the resource sync cycle.
//!
//! Purpose: own identity resolution, response classification, and render
//! planning independently of any transport or storage technology. Adapters
//! plug in through [`ports`].

mod endpoint;
mod identity;
mod outcome;
pub mod pages;
pub mod ports;
pub mod records;
mod render_plan;
mod resource_client;
mod sync_controller;
mod view_binder;

pub use self::endpoint::{Endpoint, EndpointBuilder, Method, PayloadShape};
pub use self::identity::{Identity, IdentityStore, resolve};
pub use self::outcome::{ErrorKind, FetchOutcome};
pub use self::pages::{Destination, Form, NavigationTargets, Page};
pub use self::records::{DisplayZone, FieldKind, FieldSpec, RecordSchema};
pub use self::render_plan::{DisplayField, DisplayRecord, RenderPlan, StorageWrite};
pub use self::resource_client::ResourceClient;
pub use self::sync_controller::{SyncController, SyncError};
pub use self::view_binder::{BindReport, DropReason, SoftValidationFailure, ViewBinder};
