//! Catalogue of the rental pages and form submissions.
//!
//! Each read [`Page`] pairs an endpoint with a [`RecordSchema`]; each write
//! [`Form`] pairs an endpoint with a post-success [`Destination`] and the
//! storage writes that must happen before navigating there.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::domain::ports::keys;
use crate::domain::records::TIMESTAMP_DISPLAY_FORMAT;
use crate::domain::{Endpoint, Identity, PayloadShape, RecordSchema, StorageWrite};

const SUBMITTED_TIME_FORMATS: [&str; 5] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// How much identity a page or form needs before it may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityRequirement {
    /// Anonymous callers are fine.
    Anonymous,
    /// A sanitised user id must be present.
    UserId,
    /// The user id plus the name and e-mail companions must be present.
    CompleteProfile,
}

impl IdentityRequirement {
    /// Whether `identity` satisfies this requirement.
    #[must_use]
    pub const fn is_met_by(self, identity: &Identity) -> bool {
        match self {
            Self::Anonymous => true,
            Self::UserId => identity.user_id().is_some(),
            Self::CompleteProfile => identity.is_complete(),
        }
    }
}

/// Named read flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    /// Account summary built from stored identity alone.
    Home,
    /// The caller's billing records.
    Billing,
    /// Invoice for the booking selected in storage.
    Invoice,
    /// Completed rentals.
    RentalHistory,
    /// Membership tier.
    Settings,
    /// Vehicles available for booking.
    Vehicles,
    /// The caller's bookings.
    Bookings,
}

/// Where a page's records come from.
#[derive(Debug, Clone, PartialEq)]
pub enum PageSource {
    /// Records are derived from the stored identity.
    Identity,
    /// Records are fetched with one resource call.
    Remote(Endpoint),
}

/// Inputs a page needs that are missing from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MissingInput {
    /// No usable identity; the caller must log in.
    #[error("no user is logged in")]
    Identity,
    /// The invoice page was opened without a selected booking.
    #[error("No booking ID provided.")]
    BookingSelection,
}

impl Page {
    /// Every page, in navigation order.
    pub const ALL: [Self; 7] = [
        Self::Home,
        Self::Billing,
        Self::Invoice,
        Self::RentalHistory,
        Self::Settings,
        Self::Vehicles,
        Self::Bookings,
    ];

    /// Short name used on the command line and in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Billing => "billing",
            Self::Invoice => "invoice",
            Self::RentalHistory => "history",
            Self::Settings => "settings",
            Self::Vehicles => "vehicles",
            Self::Bookings => "bookings",
        }
    }

    /// Identity the page needs before it may load.
    #[must_use]
    pub const fn requirement(self) -> IdentityRequirement {
        match self {
            Self::Home | Self::Settings => IdentityRequirement::CompleteProfile,
            Self::Billing | Self::RentalHistory | Self::Bookings => IdentityRequirement::UserId,
            Self::Invoice | Self::Vehicles => IdentityRequirement::Anonymous,
        }
    }

    /// Schema the page's records are bound against.
    #[must_use]
    pub fn schema(self) -> RecordSchema {
        match self {
            Self::Home => RecordSchema::profile(),
            Self::Billing => RecordSchema::billing(),
            Self::Invoice => RecordSchema::invoice(),
            Self::RentalHistory => RecordSchema::rental_history(),
            Self::Settings => RecordSchema::membership(),
            Self::Vehicles => RecordSchema::vehicle_listing(),
            Self::Bookings => RecordSchema::booking(),
        }
    }

    /// Resolve where the page's records come from.
    ///
    /// `selected_booking` is the stored `bookingInvoiceId` entry; only the
    /// invoice page reads it.
    ///
    /// # Errors
    ///
    /// Returns [`MissingInput`] when the identity or the booking selection
    /// the page needs is absent.
    pub fn source(
        self,
        identity: &Identity,
        selected_booking: Option<&str>,
    ) -> Result<PageSource, MissingInput> {
        if !self.requirement().is_met_by(identity) {
            return Err(MissingInput::Identity);
        }
        let user_id = || {
            identity
                .user_id()
                .map(|id| id.to_string())
                .ok_or(MissingInput::Identity)
        };
        let shape = self.schema().shape();
        let endpoint = match self {
            Self::Home => return Ok(PageSource::Identity),
            Self::Billing => Endpoint::get("/api/v1/billing/bills").query("user_id", user_id()?),
            Self::Invoice => {
                let booking = selected_booking
                    .map(str::trim)
                    .filter(|booking| !booking.is_empty())
                    .ok_or(MissingInput::BookingSelection)?;
                return Ok(PageSource::Remote(
                    Endpoint::get("/api/v1/billing/invoice")
                        .query("booking_id", booking)
                        .expect(PayloadShape::record(["booking_id"]))
                        .build(),
                ));
            }
            Self::RentalHistory => Endpoint::get("/api/v1/user/history").query("user_id", user_id()?),
            Self::Settings => Endpoint::get("/api/v1/user/settings").query("user_id", user_id()?),
            Self::Vehicles => Endpoint::get("/api/v1/booking/vehicles"),
            Self::Bookings => Endpoint::get("/api/v1/booking/bookings").query("userId", user_id()?),
        };
        Ok(PageSource::Remote(endpoint.expect(shape).build()))
    }

    /// Profile record the home page shows for `identity`.
    #[must_use]
    pub fn identity_payload(identity: &Identity) -> Value {
        json!({
            "userId": identity.user_id(),
            "name": identity.name(),
            "email": identity.email(),
            "phone": identity.phone(),
        })
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A page name that is not in the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown page '{0}'; expected one of home, billing, invoice, history, settings, vehicles, bookings")]
pub struct UnknownPage(pub String);

impl FromStr for Page {
    type Err = UnknownPage;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|page| page.name() == wanted)
            .ok_or_else(|| UnknownPage(value.to_owned()))
    }
}

/// Where a successful form submission navigates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    /// Account home.
    Home,
    /// Login page.
    Login,
    /// Settings page.
    Settings,
    /// Bookings list.
    Bookings,
}

/// Concrete navigation targets for each [`Destination`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTargets {
    /// Login page.
    pub login: String,
    /// Account home.
    pub home: String,
    /// Settings page.
    pub settings: String,
    /// Bookings list.
    pub bookings: String,
}

impl Default for NavigationTargets {
    fn default() -> Self {
        Self {
            login: "/static/login".to_owned(),
            home: "/static/home".to_owned(),
            settings: "/static/settings".to_owned(),
            bookings: "/static/bookings_home".to_owned(),
        }
    }
}

impl NavigationTargets {
    /// Target for `destination`.
    #[must_use]
    pub fn resolve(&self, destination: Destination) -> &str {
        match destination {
            Destination::Home => &self.home,
            Destination::Login => &self.login,
            Destination::Settings => &self.settings,
            Destination::Bookings => &self.bookings,
        }
    }
}

/// Login form fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account e-mail.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Signup and profile-update form fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileForm {
    /// Display name.
    pub name: String,
    /// E-mail address.
    pub email: String,
    /// Phone number.
    pub phone: String,
    /// New or initial password.
    pub password: String,
}

/// Booking form fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingForm {
    /// Vehicle to book.
    pub vehicle_id: u64,
    /// Requested start, as typed by the user.
    pub start_time: String,
    /// Requested end, as typed by the user.
    pub end_time: String,
}

/// Named write flows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Form {
    /// Authenticate and capture identity.
    Login(Credentials),
    /// Register a new account.
    Signup(ProfileForm),
    /// Replace the caller's profile.
    UpdateProfile(ProfileForm),
    /// Book a vehicle.
    CreateBooking(BookingForm),
    /// Move an existing booking.
    ModifyBooking {
        /// Booking to change.
        booking_id: u64,
        /// New vehicle and times.
        booking: BookingForm,
    },
    /// Cancel an existing booking.
    CancelBooking {
        /// Booking to cancel.
        booking_id: u64,
    },
}

/// Why a form could not be turned into a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// The form needs a logged-in caller.
    #[error("no user is logged in")]
    NotLoggedIn,
    /// A submitted time could not be read.
    #[error("{field} '{value}' is not a valid date and time")]
    InvalidTime {
        /// Form field name.
        field: &'static str,
        /// Submitted text.
        value: String,
    },
}

impl Form {
    /// Short name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Login(_) => "login",
            Self::Signup(_) => "signup",
            Self::UpdateProfile(_) => "update_profile",
            Self::CreateBooking(_) => "create_booking",
            Self::ModifyBooking { .. } => "modify_booking",
            Self::CancelBooking { .. } => "cancel_booking",
        }
    }

    /// Where the caller goes once the write succeeds.
    #[must_use]
    pub const fn destination(&self) -> Destination {
        match self {
            Self::Login(_) => Destination::Home,
            Self::Signup(_) => Destination::Login,
            Self::UpdateProfile(_) => Destination::Settings,
            Self::CreateBooking(_) | Self::ModifyBooking { .. } | Self::CancelBooking { .. } => {
                Destination::Bookings
            }
        }
    }

    /// Whether the form needs a sanitised user id.
    #[must_use]
    pub const fn requires_identity(&self) -> bool {
        !matches!(self, Self::Login(_) | Self::Signup(_))
    }

    /// Build the request for this submission.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::NotLoggedIn`] when the form needs an identity
    /// that is absent, and [`FormError::InvalidTime`] when a booking time
    /// cannot be normalised.
    pub fn endpoint(&self, identity: &Identity) -> Result<Endpoint, FormError> {
        let user_id = identity.user_id();
        let require_user = || user_id.ok_or(FormError::NotLoggedIn);
        let endpoint = match self {
            Self::Login(credentials) => Endpoint::post("/api/v1/user/login")
                .json_body(json!(credentials))
                .expect(PayloadShape::record(["user_id"])),
            Self::Signup(profile) => {
                Endpoint::post("/api/v1/user/signup").json_body(json!(profile))
            }
            Self::UpdateProfile(profile) => Endpoint::put("/api/v1/user/settings")
                .query("user_id", require_user()?.to_string())
                .json_body(json!(profile)),
            Self::CreateBooking(booking) => Endpoint::post("/api/v1/booking").json_body(json!({
                "user_id": require_user()?,
                "vehicle_id": booking.vehicle_id,
                "start_time": booking.start_time,
                "end_time": booking.end_time,
            })),
            Self::ModifyBooking {
                booking_id,
                booking,
            } => {
                let user = require_user()?;
                let start = normalise_time("start_time", &booking.start_time)?;
                let end = normalise_time("end_time", &booking.end_time)?;
                Endpoint::put(format!("/api/v1/booking/modify/{booking_id}"))
                    .header("userId", user.to_string())
                    .header("vehicleId", booking.vehicle_id.to_string())
                    .json_body(json!({ "startTime": start, "endTime": end }))
            }
            Self::CancelBooking { booking_id } => {
                require_user()?;
                Endpoint::delete(format!("/api/v1/booking/cancel/{booking_id}"))
            }
        };
        Ok(endpoint.build())
    }

    /// Storage writes to apply after a successful submission.
    ///
    /// Login copies the profile from the response `payload`; a profile update
    /// copies it from the submitted form. Other forms write nothing.
    #[must_use]
    pub fn side_effects(&self, payload: &Value) -> Vec<StorageWrite> {
        match self {
            Self::Login(_) => [
                (keys::USER_ID, "user_id"),
                (keys::USER_NAME, "name"),
                (keys::USER_EMAIL, "email"),
                (keys::USER_PHONE, "phone"),
            ]
            .into_iter()
            .filter_map(|(key, field)| {
                scalar_text(payload.get(field)?).map(|value| StorageWrite::new(key, value))
            })
            .collect(),
            Self::UpdateProfile(profile) => vec![
                StorageWrite::new(keys::USER_NAME, profile.name.as_str()),
                StorageWrite::new(keys::USER_EMAIL, profile.email.as_str()),
                StorageWrite::new(keys::USER_PHONE, profile.phone.as_str()),
            ],
            Self::Signup(_)
            | Self::CreateBooking(_)
            | Self::ModifyBooking { .. }
            | Self::CancelBooking { .. } => Vec::new(),
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Normalise a submitted booking time to `YYYY-MM-DD HH:MM:SS`.
///
/// # Errors
///
/// Returns [`FormError::InvalidTime`] when `value` matches none of the
/// accepted input formats.
pub fn normalise_time(field: &'static str, value: &str) -> Result<String, FormError> {
    let trimmed = value.trim();
    SUBMITTED_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|time| time.format(TIMESTAMP_DISPLAY_FORMAT).to_string())
        .ok_or_else(|| FormError::InvalidTime {
            field,
            value: value.to_owned(),
        })
}
