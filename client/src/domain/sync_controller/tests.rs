//! Tests for the page and form cycles.

use super::*;
use crate::domain::ports::{FixtureTransport, MockKeyValueStore, RawResponse, TransportError};
use crate::domain::records::DisplayZone;
use crate::domain::pages::{BookingForm, Credentials};
use crate::domain::{Method, StorageWrite};
use crate::outbound::storage::MemoryKeyValueStore;
use chrono::FixedOffset;
use rstest::rstest;
use url::Url;

struct Harness {
    controller: SyncController,
    storage: Arc<MemoryKeyValueStore>,
    transport: Arc<FixtureTransport>,
}

fn harness(entries: &[(&str, &str)], transport: FixtureTransport) -> Harness {
    let storage = Arc::new(MemoryKeyValueStore::with_entries(
        entries
            .iter()
            .map(|&(key, value)| (key.to_owned(), value.to_owned())),
    ));
    let transport = Arc::new(transport);
    let client = ResourceClient::new(
        transport.clone(),
        Url::parse("http://localhost:5000").expect("valid base URL"),
    );
    let utc = FixedOffset::east_opt(0).expect("zero offset");
    let binder = ViewBinder::new("/static/login").with_zone(DisplayZone::Fixed(utc));
    let controller = SyncController::new(
        storage.clone(),
        client,
        binder,
        NavigationTargets::default(),
    );
    Harness {
        controller,
        storage,
        transport,
    }
}

const PROFILE: [(&str, &str); 3] = [
    ("userId", "1:1"),
    ("userName", "Ada"),
    ("userEmail", "ada@example.com"),
];

#[rstest]
#[case(Page::Billing)]
#[case(Page::RentalHistory)]
#[case(Page::Bookings)]
#[case(Page::Settings)]
#[case(Page::Home)]
#[tokio::test]
async fn anonymous_loads_redirect_without_a_call(#[case] page: Page) {
    let h = harness(&[], FixtureTransport::responding(RawResponse::json(200, "[]")));

    let plan = h.controller.load_page(page).await;

    assert_eq!(plan, RenderPlan::redirect("/static/login"));
    assert!(h.transport.sent().is_empty());
}

#[rstest]
#[tokio::test]
async fn polluted_ids_are_sanitised_before_the_call() {
    let h = harness(
        &PROFILE,
        FixtureTransport::responding(RawResponse::json(200, "[]")),
    );

    let plan = h.controller.load_page(Page::Billing).await;

    assert_eq!(
        plan,
        RenderPlan::Empty {
            message: "No billing records found.".to_owned()
        }
    );
    let sent = h.transport.sent();
    let urls: Vec<&str> = sent.iter().map(|request| request.url.as_str()).collect();
    assert_eq!(urls, ["http://localhost:5000/api/v1/billing/bills?user_id=11"]);
}

#[rstest]
#[tokio::test]
async fn settings_repairs_a_wrapped_membership_body() {
    let h = harness(
        &PROFILE,
        FixtureTransport::responding(RawResponse::json(200, r#"xyz{"membership_tier":"gold"}##"#)),
    );

    let plan = h.controller.load_page(Page::Settings).await;

    let RenderPlan::Rows { records } = plan else {
        panic!("expected rows, got {plan:?}");
    };
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].value("membership_tier"), Some("gold"));
}

#[rstest]
#[tokio::test]
async fn home_renders_the_stored_profile_without_a_call() {
    let h = harness(
        &PROFILE,
        FixtureTransport::failing(TransportError::unreachable("unused")),
    );

    let plan = h.controller.load_page(Page::Home).await;

    let RenderPlan::Rows { records } = plan else {
        panic!("expected rows, got {plan:?}");
    };
    assert_eq!(records[0].value("userId"), Some("11"));
    assert_eq!(records[0].value("name"), Some("Ada"));
    assert_eq!(records[0].value("phone"), None);
    assert!(h.transport.sent().is_empty());
}

#[rstest]
#[tokio::test]
async fn invoice_without_selection_is_an_error_state() {
    let h = harness(&[], FixtureTransport::responding(RawResponse::json(200, "{}")));

    let plan = h.controller.load_page(Page::Invoice).await;

    assert_eq!(plan, RenderPlan::error("No booking ID provided."));
    assert!(h.transport.sent().is_empty());
}

#[rstest]
#[tokio::test]
async fn invoice_surfaces_the_server_error_field() {
    let h = harness(
        &[("bookingInvoiceId", "5")],
        FixtureTransport::responding(RawResponse::json(200, r#"{"error":"Invoice not found"}"#)),
    );

    let plan = h.controller.load_page(Page::Invoice).await;

    assert_eq!(
        plan,
        RenderPlan::error("Unexpected response from the server: Invoice not found")
    );
}

#[rstest]
#[tokio::test]
async fn transport_failures_render_an_error_state() {
    let h = harness(
        &[],
        FixtureTransport::failing(TransportError::timeout("after 30s")),
    );

    let plan = h.controller.load_page(Page::Vehicles).await;

    assert_eq!(
        plan,
        RenderPlan::error("Unable to reach the server: request timed out: after 30s")
    );
}

#[rstest]
#[tokio::test]
async fn login_redirects_home_and_persists_the_profile() {
    let body = r#"{"user_id":7,"name":"Ada","email":"ada@example.com","phone":"555"}"#;
    let h = harness(&[], FixtureTransport::responding(RawResponse::json(200, body)));
    let form = Form::Login(Credentials {
        email: "ada@example.com".to_owned(),
        password: "secret".to_owned(),
    });

    let plan = h.controller.submit(&form).await;
    let target = h.controller.apply(&plan).expect("memory store accepts writes");

    assert_eq!(target.as_deref(), Some("/static/home"));
    assert_eq!(h.storage.get("userId").as_deref(), Some("7"));
    assert_eq!(h.storage.get("userPhone").as_deref(), Some("555"));
}

#[rstest]
#[tokio::test]
async fn rejected_login_shows_the_server_message() {
    let h = harness(
        &[],
        FixtureTransport::responding(RawResponse::json(401, r#"{"message":"Invalid credentials"}"#)),
    );
    let form = Form::Login(Credentials {
        email: "ada@example.com".to_owned(),
        password: "wrong".to_owned(),
    });

    let plan = h.controller.submit(&form).await;

    assert_eq!(plan, RenderPlan::error("Request failed (401): Invalid credentials"));
    assert_eq!(h.controller.apply(&plan).expect("no writes"), None);
    assert_eq!(h.storage.get("userId"), None);
}

#[rstest]
#[tokio::test]
async fn booking_forms_gate_anonymous_callers() {
    let h = harness(&[], FixtureTransport::responding(RawResponse::json(200, "{}")));

    let plan = h
        .controller
        .submit(&Form::CancelBooking { booking_id: 3 })
        .await;

    assert_eq!(plan, RenderPlan::redirect("/static/login"));
    assert!(h.transport.sent().is_empty());
}

#[rstest]
#[tokio::test]
async fn invalid_booking_times_never_reach_the_server() {
    let h = harness(
        &PROFILE,
        FixtureTransport::responding(RawResponse::json(200, "{}")),
    );
    let form = Form::ModifyBooking {
        booking_id: 2,
        booking: BookingForm {
            vehicle_id: 4,
            start_time: "soon".to_owned(),
            end_time: "later".to_owned(),
        },
    };

    let plan = h.controller.submit(&form).await;

    assert!(matches!(plan, RenderPlan::ErrorState { .. }));
    assert!(h.transport.sent().is_empty());
}

#[rstest]
#[tokio::test]
async fn cancel_booking_redirects_to_the_booking_list() {
    let h = harness(
        &PROFILE,
        FixtureTransport::responding(RawResponse::json(200, r#"{"message":"Booking cancelled"}"#)),
    );

    let plan = h
        .controller
        .submit(&Form::CancelBooking { booking_id: 3 })
        .await;

    assert_eq!(plan, RenderPlan::redirect("/static/bookings_home"));
    let sent = h.transport.sent();
    assert_eq!(sent.first().map(|request| request.method), Some(Method::Delete));
}

#[test]
fn apply_stops_at_the_first_failed_write() {
    let mut storage = MockKeyValueStore::new();
    storage
        .expect_set()
        .times(1)
        .returning(|key, _| Err(KeyValueStoreError::write(key, "disk full")));
    let client = ResourceClient::new(
        Arc::new(FixtureTransport::responding(RawResponse::json(200, "{}"))),
        Url::parse("http://localhost:5000").expect("valid base URL"),
    );
    let controller = SyncController::new(
        Arc::new(storage),
        client,
        ViewBinder::new("/static/login"),
        NavigationTargets::default(),
    );
    let plan = RenderPlan::Redirect {
        target: "/static/home".to_owned(),
        side_effects: vec![
            StorageWrite::new("userId", "7"),
            StorageWrite::new("userName", "Ada"),
        ],
    };

    let error = controller.apply(&plan).expect_err("write fails");

    assert!(matches!(error, SyncError::Storage(_)));
    assert_eq!(error.to_string(), "failed to store 'userId': disk full");
}

#[test]
fn apply_ignores_non_redirect_plans() {
    let h = harness(&[], FixtureTransport::responding(RawResponse::json(200, "{}")));
    assert_eq!(h.controller.apply(&RenderPlan::error("boom")).expect("no writes"), None);
}

#[test]
fn custom_login_targets_drive_the_gate() {
    let storage = Arc::new(MemoryKeyValueStore::default());
    let client = ResourceClient::new(
        Arc::new(FixtureTransport::responding(RawResponse::json(200, "{}"))),
        Url::parse("http://localhost:5000").expect("valid base URL"),
    );
    let targets = NavigationTargets {
        login: "/signin".to_owned(),
        ..NavigationTargets::default()
    };
    let controller = SyncController::new(storage, client, ViewBinder::new("/static/login"), targets);
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");

    let plan = runtime.block_on(controller.load_page(Page::Bookings));

    assert_eq!(plan, RenderPlan::redirect("/signin"));
}
