//! Record schemas for the rental pages and per-field rendering rules.
//!
//! A [`RecordSchema`] is an ordered list of [`FieldSpec`]s. Rendering keeps
//! text and integer values byte for byte. Decimal amounts always carry two
//! fractional digits, rounding ties away from zero. Percentages gain a `%`
//! suffix and timestamps are shown in the viewer's zone.

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone};
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;

use crate::domain::PayloadShape;

/// Display format for localised timestamps.
pub const TIMESTAMP_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const NAIVE_TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Primitive type of one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text, shown as received.
    Text,
    /// Integer, shown as received.
    Integer,
    /// ISO-8601 timestamp, shown in the viewer's zone.
    Timestamp,
    /// Decimal amount, shown with two fractional digits.
    Amount,
    /// Whole-number percentage, shown with a `%` suffix.
    Percentage,
}

/// One named field of a record schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    key: &'static str,
    label: &'static str,
    kind: FieldKind,
    required: bool,
}

impl FieldSpec {
    /// Field that must be present for the record to render.
    #[must_use]
    pub const fn required(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            key,
            label,
            kind,
            required: true,
        }
    }

    /// Field that is rendered only when present.
    #[must_use]
    pub const fn optional(key: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            key,
            label,
            kind,
            required: false,
        }
    }

    /// JSON key.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.key
    }

    /// Human label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        self.label
    }

    /// Primitive type.
    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Whether absence drops the record.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }
}

/// Cardinality of the payload a schema binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// The endpoint returns an array of records.
    Many,
    /// The endpoint returns one record object.
    One,
}

/// Fixed, ordered mapping of fields for one kind of record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
    name: &'static str,
    empty_message: &'static str,
    cardinality: Cardinality,
    fields: Vec<FieldSpec>,
}

impl RecordSchema {
    /// Build a schema from its parts.
    #[must_use]
    pub const fn new(
        name: &'static str,
        empty_message: &'static str,
        cardinality: Cardinality,
        fields: Vec<FieldSpec>,
    ) -> Self {
        Self {
            name,
            empty_message,
            cardinality,
            fields,
        }
    }

    /// Schema identifier used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Message shown when there is nothing to render.
    #[must_use]
    pub const fn empty_message(&self) -> &'static str {
        self.empty_message
    }

    /// Whether the payload is one record or a list.
    #[must_use]
    pub const fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Fields in display order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Payload shape a resource call for this schema must enforce.
    ///
    /// Collections only need to be arrays; per-record problems are soft and
    /// handled by the binder. Single records must be objects.
    #[must_use]
    pub fn shape(&self) -> PayloadShape {
        match self.cardinality {
            Cardinality::Many => PayloadShape::Collection,
            Cardinality::One => PayloadShape::record(Vec::<String>::new()),
        }
    }

    /// Billing records listed on the billing home page.
    #[must_use]
    pub fn billing() -> Self {
        use FieldKind::{Amount, Integer, Text, Timestamp};
        Self::new(
            "billing",
            "No billing records found.",
            Cardinality::Many,
            vec![
                FieldSpec::required("billing_id", "Billing ID", Integer),
                FieldSpec::required("booking_id", "Booking ID", Integer),
                FieldSpec::required("payment_status", "Payment Status", Text),
                FieldSpec::required("payment_method", "Payment Method", Text),
                FieldSpec::required("total_amount", "Total Amount", Amount),
                FieldSpec::required("created_at", "Created At", Timestamp),
                FieldSpec::required("updated_at", "Updated At", Timestamp),
            ],
        )
    }

    /// Invoice for one booking.
    #[must_use]
    pub fn invoice() -> Self {
        use FieldKind::{Amount, Integer, Text, Timestamp};
        Self::new(
            "invoice",
            "No invoice found for this booking.",
            Cardinality::One,
            vec![
                FieldSpec::required("booking_id", "Booking ID", Integer),
                FieldSpec::required("user_id", "User ID", Integer),
                FieldSpec::required("vehicle_id", "Vehicle ID", Integer),
                FieldSpec::required("start_time", "Start Time", Timestamp),
                FieldSpec::required("end_time", "End Time", Timestamp),
                FieldSpec::required("total_cost", "Total Cost", Amount),
                FieldSpec::required("status", "Status", Text),
                FieldSpec::optional("created_at", "Created At", Timestamp),
                FieldSpec::optional("updated_at", "Updated At", Timestamp),
                FieldSpec::optional("generated_at", "Generated At", Timestamp),
            ],
        )
    }

    /// Completed rentals on the history page.
    #[must_use]
    pub fn rental_history() -> Self {
        use FieldKind::{Amount, Integer, Text, Timestamp};
        Self::new(
            "rental_history",
            "No completed rentals found.",
            Cardinality::Many,
            vec![
                FieldSpec::required("booking_id", "Booking ID", Integer),
                FieldSpec::required("vehicle_id", "Vehicle ID", Integer),
                FieldSpec::required("start_time", "Start Time", Timestamp),
                FieldSpec::required("end_time", "End Time", Timestamp),
                FieldSpec::required("status", "Status", Text),
                FieldSpec::required("total_cost", "Total Cost", Amount),
                FieldSpec::optional("created_at", "Created At", Timestamp),
                FieldSpec::optional("updated_at", "Updated At", Timestamp),
            ],
        )
    }

    /// Vehicles available for booking.
    #[must_use]
    pub fn vehicle_listing() -> Self {
        use FieldKind::{Integer, Percentage, Text};
        Self::new(
            "vehicle_listing",
            "No vehicles available for booking.",
            Cardinality::Many,
            vec![
                FieldSpec::required("vehicle_id", "Vehicle ID", Integer),
                FieldSpec::required("license_plate", "License Plate", Text),
                FieldSpec::required("location", "Location", Text),
                FieldSpec::required("charge_level", "Charge Level", Percentage),
                FieldSpec::required("status", "Status", Text),
                FieldSpec::optional("cleanliness", "Cleanliness", Text),
            ],
        )
    }

    /// The caller's current bookings.
    #[must_use]
    pub fn booking() -> Self {
        use FieldKind::{Integer, Percentage, Text, Timestamp};
        Self::new(
            "booking",
            "No booked vehicles found.",
            Cardinality::Many,
            vec![
                FieldSpec::required("bookingId", "Booking ID", Integer),
                FieldSpec::required("licensePlate", "License Plate", Text),
                FieldSpec::required("location", "Location", Text),
                FieldSpec::optional("chargeLevel", "Charge Level", Percentage),
                FieldSpec::required("startTime", "Start Time", Timestamp),
                FieldSpec::required("endTime", "End Time", Timestamp),
            ],
        )
    }

    /// Membership tier shown on the settings page.
    #[must_use]
    pub fn membership() -> Self {
        Self::new(
            "membership",
            "Membership tier not found.",
            Cardinality::One,
            vec![FieldSpec::required(
                "membership_tier",
                "Membership Tier",
                FieldKind::Text,
            )],
        )
    }

    /// Profile fields shown on the account home page.
    #[must_use]
    pub fn profile() -> Self {
        use FieldKind::{Integer, Text};
        Self::new(
            "profile",
            "No user data found.",
            Cardinality::One,
            vec![
                FieldSpec::required("userId", "User ID", Integer),
                FieldSpec::required("name", "Name", Text),
                FieldSpec::required("email", "Email", Text),
                FieldSpec::optional("phone", "Phone", Text),
            ],
        )
    }
}

/// Zone timestamps are rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayZone {
    /// The host's local zone.
    #[default]
    Local,
    /// A fixed UTC offset.
    Fixed(FixedOffset),
}

/// Why a present value could not be rendered as its declared kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidValue {
    /// Short description of the problem.
    pub reason: String,
}

/// Render one JSON value according to `kind`.
///
/// # Errors
///
/// Returns [`InvalidValue`] when the value cannot represent `kind`.
pub fn render_value(kind: FieldKind, value: &Value, zone: DisplayZone) -> Result<String, InvalidValue> {
    match kind {
        FieldKind::Text => Ok(render_text(value)),
        FieldKind::Integer => render_integer(value),
        FieldKind::Amount => render_amount(value),
        FieldKind::Percentage => render_percentage(value),
        FieldKind::Timestamp => render_timestamp(value, zone),
    }
}

fn render_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn render_integer(value: &Value) -> Result<String, InvalidValue> {
    match value {
        Value::Number(number) if number.is_i64() || number.is_u64() => Ok(number.to_string()),
        Value::String(text) if text.trim().parse::<i64>().is_ok() => Ok(text.clone()),
        other => Err(invalid(format!("expected an integer, found {other}"))),
    }
}

fn render_amount(value: &Value) -> Result<String, InvalidValue> {
    let amount = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    // Keep the exact binary value so only true ties round away from zero.
    amount
        .and_then(Decimal::from_f64_retain)
        .map(|exact| {
            let cents = exact.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            format!("{cents:.2}")
        })
        .ok_or_else(|| invalid(format!("expected a decimal amount, found {value}")))
}

fn render_percentage(value: &Value) -> Result<String, InvalidValue> {
    match value {
        Value::Number(number) => Ok(format!("{number}%")),
        Value::String(text) if text.trim().parse::<f64>().is_ok_and(f64::is_finite) => {
            Ok(format!("{}%", text.trim()))
        }
        other => Err(invalid(format!("expected a percentage, found {other}"))),
    }
}

fn render_timestamp(value: &Value, zone: DisplayZone) -> Result<String, InvalidValue> {
    let Value::String(text) = value else {
        return Err(invalid(format!("expected a timestamp string, found {value}")));
    };
    let trimmed = text.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(format_instant(&instant, zone));
    }
    // Zone-less timestamps are read as the viewer's wall-clock time.
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|naive| naive.format(TIMESTAMP_DISPLAY_FORMAT).to_string())
        .ok_or_else(|| invalid(format!("unrecognised timestamp '{trimmed}'")))
}

fn format_instant(instant: &DateTime<FixedOffset>, zone: DisplayZone) -> String {
    match zone {
        DisplayZone::Local => instant
            .with_timezone(&Local)
            .format(TIMESTAMP_DISPLAY_FORMAT)
            .to_string(),
        DisplayZone::Fixed(offset) => offset
            .from_utc_datetime(&instant.naive_utc())
            .format(TIMESTAMP_DISPLAY_FORMAT)
            .to_string(),
    }
}

fn invalid(reason: String) -> InvalidValue {
    InvalidValue { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn utc() -> DisplayZone {
        DisplayZone::Fixed(FixedOffset::east_opt(0).expect("zero offset"))
    }

    #[rstest]
    #[case(json!(12.5), "12.50")]
    #[case(json!(3), "3.00")]
    #[case(json!("19.999"), "20.00")]
    #[case(json!(" 7.1 "), "7.10")]
    #[case(json!(0.125), "0.13")]
    #[case(json!(12.125), "12.13")]
    #[case(json!(-0.125), "-0.13")]
    #[case(json!("2.675"), "2.67")]
    #[case(json!(1.005), "1.00")]
    fn amounts_have_two_fraction_digits(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(render_value(FieldKind::Amount, &value, utc()), Ok(expected.to_owned()));
    }

    #[rstest]
    #[case(json!("free"))]
    #[case(json!(null))]
    #[case(json!([1]))]
    fn non_numeric_amounts_are_invalid(#[case] value: Value) {
        assert!(render_value(FieldKind::Amount, &value, utc()).is_err());
    }

    #[rstest]
    #[case(json!("Paid"), "Paid")]
    #[case(json!("  spaced  "), "  spaced  ")]
    #[case(json!(true), "true")]
    fn text_is_preserved(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(render_value(FieldKind::Text, &value, utc()), Ok(expected.to_owned()));
    }

    #[rstest]
    #[case(json!(42), "42")]
    #[case(json!("0042"), "0042")]
    fn integers_are_preserved(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(render_value(FieldKind::Integer, &value, utc()), Ok(expected.to_owned()));
    }

    #[rstest]
    #[case(json!(80), "80%")]
    #[case(json!("45"), "45%")]
    #[case(json!(99.5), "99.5%")]
    fn percentages_gain_a_suffix(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(
            render_value(FieldKind::Percentage, &value, utc()),
            Ok(expected.to_owned())
        );
    }

    #[rstest]
    #[case(json!("full"))]
    #[case(json!(null))]
    fn non_numeric_percentages_are_invalid(#[case] value: Value) {
        assert!(render_value(FieldKind::Percentage, &value, utc()).is_err());
    }

    #[test]
    fn fractional_integers_are_invalid() {
        assert!(render_value(FieldKind::Integer, &json!(4.5), utc()).is_err());
    }

    #[test]
    fn offset_timestamps_are_shifted_into_the_display_zone() {
        let plus_two = DisplayZone::Fixed(FixedOffset::east_opt(2 * 3600).expect("offset"));
        let rendered = render_value(
            FieldKind::Timestamp,
            &json!("2024-05-01T08:30:00Z"),
            plus_two,
        );
        assert_eq!(rendered, Ok("2024-05-01 10:30:00".to_owned()));
    }

    #[test]
    fn naive_timestamps_are_read_as_wall_clock() {
        let rendered = render_value(FieldKind::Timestamp, &json!("2024-05-01 08:30:00"), utc());
        assert_eq!(rendered, Ok("2024-05-01 08:30:00".to_owned()));
    }

    #[test]
    fn unrecognised_timestamps_are_invalid() {
        assert!(render_value(FieldKind::Timestamp, &json!("yesterday"), utc()).is_err());
    }

    #[test]
    fn collection_schemas_expect_arrays() {
        assert_eq!(RecordSchema::billing().shape(), PayloadShape::Collection);
        assert!(matches!(
            RecordSchema::invoice().shape(),
            PayloadShape::Record { required } if required.is_empty()
        ));
    }

    #[rstest]
    #[case(RecordSchema::billing())]
    #[case(RecordSchema::invoice())]
    #[case(RecordSchema::rental_history())]
    #[case(RecordSchema::vehicle_listing())]
    #[case(RecordSchema::booking())]
    #[case(RecordSchema::membership())]
    #[case(RecordSchema::profile())]
    fn every_schema_has_a_required_field(#[case] schema: RecordSchema) {
        assert!(schema.fields().iter().any(FieldSpec::is_required));
        assert!(!schema.empty_message().is_empty());
    }
}
