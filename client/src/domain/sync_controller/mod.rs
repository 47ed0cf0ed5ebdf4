//! One resolve, call, bind cycle per page load or form submission.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::pages::{Form, MissingInput, NavigationTargets, Page, PageSource};
use crate::domain::ports::{KeyValueStore, KeyValueStoreError, keys};
use crate::domain::{FetchOutcome, IdentityStore, RenderPlan, ResourceClient, ViewBinder};

/// Errors raised while applying a plan.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A redirect side effect could not be written.
    #[error(transparent)]
    Storage(#[from] KeyValueStoreError),
}

/// Runs pages and forms against one backend and one storage.
#[derive(Clone)]
pub struct SyncController {
    storage: Arc<dyn KeyValueStore>,
    identity: IdentityStore,
    client: ResourceClient,
    binder: ViewBinder,
    targets: NavigationTargets,
}

impl SyncController {
    /// Wire a controller from its collaborators.
    ///
    /// The binder's login target is replaced by `targets.login` so gate
    /// redirects and form destinations agree.
    pub fn new(
        storage: Arc<dyn KeyValueStore>,
        client: ResourceClient,
        binder: ViewBinder,
        targets: NavigationTargets,
    ) -> Self {
        let gate = if binder.login_target() == targets.login {
            binder
        } else {
            ViewBinder::new(targets.login.clone()).with_zone(binder.zone())
        };
        Self {
            identity: IdentityStore::new(storage.clone()),
            storage,
            client,
            binder: gate,
            targets,
        }
    }

    /// Navigation targets in use.
    #[must_use]
    pub const fn targets(&self) -> &NavigationTargets {
        &self.targets
    }

    /// Load `page` and return what to show.
    pub async fn load_page(&self, page: Page) -> RenderPlan {
        let identity = self.identity.load();
        if !page.requirement().is_met_by(&identity) {
            debug!(page = %page, "identity gate redirected to login");
            return self
                .binder
                .bind_identity_gate(&identity)
                .unwrap_or_else(|| self.binder.redirect_to_login());
        }

        let selected_booking = self.storage.get(keys::BOOKING_INVOICE_ID);
        let schema = page.schema();
        match page.source(&identity, selected_booking.as_deref()) {
            Ok(PageSource::Identity) => {
                let outcome = FetchOutcome::success(200, Page::identity_payload(&identity));
                self.binder.bind(&outcome, &schema)
            }
            Ok(PageSource::Remote(endpoint)) => {
                let outcome = self.client.call(&endpoint).await;
                let (plan, report) = self.binder.bind_with_report(&outcome, &schema);
                if !report.is_clean() {
                    debug!(page = %page, dropped = report.dropped.len(), "page bound with dropped records");
                }
                plan
            }
            Err(MissingInput::Identity) => self.binder.redirect_to_login(),
            Err(missing @ MissingInput::BookingSelection) => RenderPlan::error(missing.to_string()),
        }
    }

    /// Submit `form` and return where to go next.
    pub async fn submit(&self, form: &Form) -> RenderPlan {
        let identity = self.identity.load();
        if form.requires_identity()
            && let Some(redirect) = self.binder.bind_identity_gate(&identity)
        {
            debug!(form = form.name(), "identity gate redirected to login");
            return redirect;
        }

        let endpoint = match form.endpoint(&identity) {
            Ok(endpoint) => endpoint,
            Err(error) => return RenderPlan::error(error.to_string()),
        };
        let outcome = self.client.call(&endpoint).await;
        let side_effects = outcome
            .payload()
            .map(|payload| form.side_effects(payload))
            .unwrap_or_default();
        self.binder.bind_after_write(
            &outcome,
            self.targets.resolve(form.destination()),
            side_effects,
        )
    }

    /// Apply a plan's storage writes, in order, and return its target.
    ///
    /// Plans other than [`RenderPlan::Redirect`] are left alone and yield
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Storage`] at the first write that fails; later
    /// writes are not attempted.
    pub fn apply(&self, plan: &RenderPlan) -> Result<Option<String>, SyncError> {
        let RenderPlan::Redirect {
            target,
            side_effects,
        } = plan
        else {
            return Ok(None);
        };
        for write in side_effects {
            self.storage.set(&write.key, &write.value)?;
        }
        info!(%target, writes = side_effects.len(), "redirect applied");
        Ok(Some(target.clone()))
    }
}

#[cfg(test)]
mod tests;
