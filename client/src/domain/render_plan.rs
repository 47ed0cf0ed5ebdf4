//! The core's sole output: what the presentation layer must show or do.

use serde::Serialize;

/// One labelled value of a display record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayField {
    /// JSON key the value came from.
    pub key: String,
    /// Human label from the schema.
    pub label: String,
    /// Rendered value.
    pub value: String,
}

/// One validated, field-mapped record in schema order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct DisplayRecord {
    fields: Vec<DisplayField>,
}

impl DisplayRecord {
    /// Wrap fields that are already in display order.
    #[must_use]
    pub const fn new(fields: Vec<DisplayField>) -> Self {
        Self { fields }
    }

    /// Fields in display order.
    #[must_use]
    pub fn fields(&self) -> &[DisplayField] {
        &self.fields
    }

    /// Rendered value for `key`, if the record carries it.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|field| field.key == key)
            .map(|field| field.value.as_str())
    }
}

/// A storage write the caller applies before navigating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageWrite {
    /// Storage key.
    pub key: String,
    /// Value to store.
    pub value: String,
}

impl StorageWrite {
    /// Build a write.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Instruction consumed exactly once by the presentation sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderPlan {
    /// Records to display, in payload order.
    Rows {
        /// Validated records.
        records: Vec<DisplayRecord>,
    },
    /// Nothing to show; display the message instead.
    Empty {
        /// Schema-specific "no records" message.
        message: String,
    },
    /// The call failed; display the message.
    ErrorState {
        /// Human-readable failure.
        message: String,
    },
    /// Apply the writes in order, then navigate to `target`.
    Redirect {
        /// Navigation target.
        target: String,
        /// Storage writes to apply first.
        side_effects: Vec<StorageWrite>,
    },
}

impl RenderPlan {
    /// Redirect without side effects.
    pub fn redirect(target: impl Into<String>) -> Self {
        Self::Redirect {
            target: target.into(),
            side_effects: Vec::new(),
        }
    }

    /// Error state with `message`.
    pub fn error(message: impl Into<String>) -> Self {
        Self::ErrorState {
            message: message.into(),
        }
    }

    /// Whether this plan navigates away.
    #[must_use]
    pub const fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plans_serialise_with_a_kind_tag() {
        let plan = RenderPlan::Redirect {
            target: "/static/home".to_owned(),
            side_effects: vec![StorageWrite::new("userId", "7")],
        };
        let encoded = serde_json::to_value(&plan).expect("serialise plan");
        assert_eq!(
            encoded,
            json!({
                "kind": "redirect",
                "target": "/static/home",
                "side_effects": [{ "key": "userId", "value": "7" }]
            })
        );
    }

    #[test]
    fn records_serialise_as_field_lists() {
        let record = DisplayRecord::new(vec![DisplayField {
            key: "status".to_owned(),
            label: "Status".to_owned(),
            value: "Paid".to_owned(),
        }]);
        let encoded = serde_json::to_value(&record).expect("serialise record");
        assert_eq!(
            encoded,
            json!([{ "key": "status", "label": "Status", "value": "Paid" }])
        );
        assert_eq!(record.value("status"), Some("Paid"));
        assert_eq!(record.value("missing"), None);
    }
}
