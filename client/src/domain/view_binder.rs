//! Turns fetch outcomes into render plans.
//!
//! The binder never touches presentation technology. It validates records
//! against a [`RecordSchema`], renders each field according to its kind, and
//! reports soft validation failures alongside the plan.

use serde_json::{Map, Value};
use tracing::warn;

use crate::domain::records::{DisplayZone, InvalidValue, RecordSchema, render_value};
use crate::domain::{
    DisplayField, DisplayRecord, ErrorKind, FetchOutcome, Identity, RenderPlan, StorageWrite,
};

/// Why a record was left out of a [`RenderPlan::Rows`] plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// A required field was absent or null.
    MissingField,
    /// A field was present but could not be rendered as its kind.
    InvalidValue(String),
    /// The collection element was not an object.
    NotAnObject,
}

/// One record dropped during binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftValidationFailure {
    /// Position of the record in the payload.
    pub index: usize,
    /// Offending field, when the problem is field-specific.
    pub field: Option<&'static str>,
    /// What was wrong with it.
    pub reason: DropReason,
}

impl SoftValidationFailure {
    /// Soft failures never abort rendering.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::ValidationSoft
    }
}

/// Soft failures observed while binding one outcome.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BindReport {
    /// Dropped records in payload order.
    pub dropped: Vec<SoftValidationFailure>,
}

impl BindReport {
    /// Whether every record survived validation.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.dropped.is_empty()
    }
}

/// Produces render plans for one presentation context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewBinder {
    login_target: String,
    zone: DisplayZone,
}

impl ViewBinder {
    /// Binder redirecting anonymous callers to `login_target`.
    pub fn new(login_target: impl Into<String>) -> Self {
        Self {
            login_target: login_target.into(),
            zone: DisplayZone::Local,
        }
    }

    /// Render timestamps in `zone` instead of the host's local zone.
    #[must_use]
    pub const fn with_zone(mut self, zone: DisplayZone) -> Self {
        self.zone = zone;
        self
    }

    /// Zone timestamps are rendered in.
    #[must_use]
    pub const fn zone(&self) -> DisplayZone {
        self.zone
    }

    /// Navigation target used by the identity gate.
    #[must_use]
    pub fn login_target(&self) -> &str {
        self.login_target.as_str()
    }

    /// Bind `outcome` against `schema`, discarding the report.
    #[must_use]
    pub fn bind(&self, outcome: &FetchOutcome, schema: &RecordSchema) -> RenderPlan {
        self.bind_with_report(outcome, schema).0
    }

    /// Bind `outcome` against `schema` and report dropped records.
    ///
    /// A single object payload is treated as a one-element collection. A
    /// payload that is neither an array nor an object cannot hold records and
    /// becomes an error state.
    #[must_use]
    pub fn bind_with_report(
        &self,
        outcome: &FetchOutcome,
        schema: &RecordSchema,
    ) -> (RenderPlan, BindReport) {
        let payload = match outcome {
            FetchOutcome::Success { payload, .. } => payload,
            FetchOutcome::Failure {
                kind,
                message,
                status,
            } => {
                return (
                    RenderPlan::error(failure_message(*kind, message, *status)),
                    BindReport::default(),
                );
            }
        };

        let elements: Vec<&Value> = match payload {
            Value::Array(items) => items.iter().collect(),
            Value::Object(_) => vec![payload],
            Value::Null => Vec::new(),
            other => {
                return (
                    RenderPlan::error(format!(
                        "Unexpected response from the server: {} cannot hold records",
                        scalar_name(other)
                    )),
                    BindReport::default(),
                );
            }
        };

        let mut report = BindReport::default();
        let records: Vec<DisplayRecord> = elements
            .into_iter()
            .enumerate()
            .filter_map(|(index, element)| match self.map_record(element, schema) {
                Ok(record) => Some(record),
                Err((field, reason)) => {
                    warn!(
                        schema = schema.name(),
                        index,
                        field = field.unwrap_or_default(),
                        ?reason,
                        "dropping record that failed validation"
                    );
                    report.dropped.push(SoftValidationFailure {
                        index,
                        field,
                        reason,
                    });
                    None
                }
            })
            .collect();

        let plan = if records.is_empty() {
            RenderPlan::Empty {
                message: schema.empty_message().to_owned(),
            }
        } else {
            RenderPlan::Rows { records }
        };
        (plan, report)
    }

    /// Redirect anonymous callers to the login target.
    ///
    /// Returns `None` when the identity carries a user id and the caller may
    /// proceed.
    #[must_use]
    pub fn bind_identity_gate(&self, identity: &Identity) -> Option<RenderPlan> {
        identity
            .user_id()
            .is_none()
            .then(|| self.redirect_to_login())
    }

    /// Plain redirect to the login target.
    #[must_use]
    pub fn redirect_to_login(&self) -> RenderPlan {
        RenderPlan::redirect(self.login_target.clone())
    }

    /// Redirect after a successful write, or show why it failed.
    #[must_use]
    pub fn bind_after_write(
        &self,
        outcome: &FetchOutcome,
        on_success_target: &str,
        side_effects: Vec<StorageWrite>,
    ) -> RenderPlan {
        match outcome {
            FetchOutcome::Success { .. } => RenderPlan::Redirect {
                target: on_success_target.to_owned(),
                side_effects,
            },
            FetchOutcome::Failure {
                kind,
                message,
                status,
            } => RenderPlan::error(failure_message(*kind, message, *status)),
        }
    }

    fn map_record(
        &self,
        element: &Value,
        schema: &RecordSchema,
    ) -> Result<DisplayRecord, (Option<&'static str>, DropReason)> {
        let Some(object) = element.as_object() else {
            return Err((None, DropReason::NotAnObject));
        };
        let mut fields = Vec::with_capacity(schema.fields().len());
        for spec in schema.fields() {
            let Some(value) = present(object, spec.key()) else {
                if spec.is_required() {
                    return Err((Some(spec.key()), DropReason::MissingField));
                }
                continue;
            };
            let rendered = render_value(spec.kind(), value, self.zone).map_err(
                |InvalidValue { reason }| (Some(spec.key()), DropReason::InvalidValue(reason)),
            )?;
            fields.push(DisplayField {
                key: spec.key().to_owned(),
                label: spec.label().to_owned(),
                value: rendered,
            });
        }
        Ok(DisplayRecord::new(fields))
    }
}

fn present<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    object.get(key).filter(|value| !value.is_null())
}

fn failure_message(kind: ErrorKind, message: &str, status: Option<u16>) -> String {
    match (kind, status) {
        (ErrorKind::Transport, _) => format!("Unable to reach the server: {message}"),
        (ErrorKind::HttpError, Some(code)) => format!("Request failed ({code}): {message}"),
        (ErrorKind::HttpError, None) => format!("Request failed: {message}"),
        (ErrorKind::SchemaMismatch | ErrorKind::ValidationSoft, _) => {
            format!("Unexpected response from the server: {message}")
        }
    }
}

const fn scalar_name(value: &Value) -> &'static str {
    match value {
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Null | Value::Array(_) | Value::Object(_) => "this payload",
    }
}
