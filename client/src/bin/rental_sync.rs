//! Run rental pages and form submissions from the command line.
//!
//! Each invocation performs one page load or one submission, applies any
//! redirect side effects to the JSON storage file, and prints the render plan
//! as JSON on stdout.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io::{self, Write};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use ortho_config::OrthoConfig;
use rental_sync::config::SyncSettings;
use rental_sync::domain::pages::{BookingForm, Credentials, ProfileForm};
use rental_sync::domain::ports::{KeyValueStore, keys};
use rental_sync::domain::{Form, Page, RenderPlan, ResourceClient, SyncController, ViewBinder};
use rental_sync::outbound::http::ReqwestTransport;
use rental_sync::outbound::storage::JsonFileKeyValueStore;
use tokio::runtime::Builder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// `rental-sync` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "rental-sync",
    about = "Load rental pages and submit rental forms against the REST backend",
    version
)]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Select the booking whose invoice the invoice page shows.
    SelectInvoice {
        /// Booking identifier.
        booking_id: u64,
    },
    #[command(flatten)]
    Sync(SyncCommand),
}

/// Commands that run one resolve, call and bind cycle.
#[derive(Debug, Clone, Subcommand)]
enum SyncCommand {
    /// Load one page and print its render plan.
    Show {
        /// Page name: home, billing, invoice, history, settings, vehicles, bookings.
        page: Page,
    },
    /// Log in and persist the returned profile.
    Login {
        /// Account e-mail.
        #[arg(long)]
        email: String,
        /// Account password.
        #[arg(long)]
        password: String,
    },
    /// Register a new account.
    Signup(ProfileArgs),
    /// Replace the logged-in user's profile.
    UpdateProfile(ProfileArgs),
    /// Book a vehicle.
    Book(BookingArgs),
    /// Change the vehicle or times of an existing booking.
    ModifyBooking {
        /// Booking to change.
        #[arg(long = "booking-id", value_name = "id")]
        booking_id: u64,
        #[command(flatten)]
        booking: BookingArgs,
    },
    /// Cancel an existing booking.
    CancelBooking {
        /// Booking to cancel.
        #[arg(long = "booking-id", value_name = "id")]
        booking_id: u64,
    },
}

#[derive(Debug, Clone, Args)]
struct ProfileArgs {
    /// Display name.
    #[arg(long)]
    name: String,
    /// E-mail address.
    #[arg(long)]
    email: String,
    /// Phone number.
    #[arg(long, default_value = "")]
    phone: String,
    /// Password.
    #[arg(long)]
    password: String,
}

impl From<ProfileArgs> for ProfileForm {
    fn from(args: ProfileArgs) -> Self {
        Self {
            name: args.name,
            email: args.email,
            phone: args.phone,
            password: args.password,
        }
    }
}

#[derive(Debug, Clone, Args)]
struct BookingArgs {
    /// Vehicle to book.
    #[arg(long = "vehicle-id", value_name = "id")]
    vehicle_id: u64,
    /// Start time, for example `2024-05-01T10:00`.
    #[arg(long = "start", value_name = "time")]
    start_time: String,
    /// End time, for example `2024-05-01T12:00`.
    #[arg(long = "end", value_name = "time")]
    end_time: String,
}

impl From<BookingArgs> for BookingForm {
    fn from(args: BookingArgs) -> Self {
        Self {
            vehicle_id: args.vehicle_id,
            start_time: args.start_time,
            end_time: args.end_time,
        }
    }
}

fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let settings = SyncSettings::load_from_iter([OsString::from("rental-sync")])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;

    let storage_path = settings.storage_path().map_err(io::Error::other)?;
    let storage = Arc::new(JsonFileKeyValueStore::open(&storage_path).map_err(io::Error::other)?);

    let command = match args.command {
        Command::SelectInvoice { booking_id } => {
            return select_invoice(storage.as_ref(), booking_id);
        }
        Command::Sync(command) => command,
    };

    let transport = ReqwestTransport::new(settings.timeout())
        .map_err(|error| io::Error::other(format!("create HTTP client: {error}")))?;
    let base_url = settings.base_url().map_err(io::Error::other)?;
    let client = ResourceClient::new(Arc::new(transport), base_url);
    let targets = settings.navigation_targets();
    let binder = ViewBinder::new(targets.login.clone())
        .with_zone(settings.display_zone().map_err(io::Error::other)?);
    let controller = SyncController::new(storage, client, binder, targets);

    let plan = run(&controller, command).await;
    if let Some(target) = controller.apply(&plan).map_err(io::Error::other)? {
        info!(%target, "navigate");
    }
    print_plan(&plan)
}

fn select_invoice(storage: &dyn KeyValueStore, booking_id: u64) -> io::Result<()> {
    storage
        .set(keys::BOOKING_INVOICE_ID, &booking_id.to_string())
        .map_err(io::Error::other)?;
    info!(booking_id, "invoice booking selected");
    Ok(())
}

async fn run(controller: &SyncController, command: SyncCommand) -> RenderPlan {
    let form = match command {
        SyncCommand::Show { page } => return controller.load_page(page).await,
        SyncCommand::Login { email, password } => Form::Login(Credentials { email, password }),
        SyncCommand::Signup(profile) => Form::Signup(profile.into()),
        SyncCommand::UpdateProfile(profile) => Form::UpdateProfile(profile.into()),
        SyncCommand::Book(booking) => Form::CreateBooking(booking.into()),
        SyncCommand::ModifyBooking {
            booking_id,
            booking,
        } => Form::ModifyBooking {
            booking_id,
            booking: booking.into(),
        },
        SyncCommand::CancelBooking { booking_id } => Form::CancelBooking { booking_id },
    };
    controller.submit(&form).await
}

fn print_plan(plan: &RenderPlan) -> io::Result<()> {
    let encoded = serde_json::to_string_pretty(plan).map_err(io::Error::other)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{encoded}")
}

#[cfg(test)]
mod tests {
    //! Unit tests for CLI parsing.

    use super::*;
    use rental_sync::outbound::storage::MemoryKeyValueStore;
    use rstest::rstest;

    #[rstest]
    fn show_accepts_catalogue_pages() {
        let args = CliArgs::try_parse_from(["rental-sync", "show", "history"]).expect("parse");
        assert!(matches!(
            args.command,
            Command::Sync(SyncCommand::Show {
                page: Page::RentalHistory
            })
        ));
    }

    #[rstest]
    fn show_rejects_unknown_pages() {
        let error = CliArgs::try_parse_from(["rental-sync", "show", "garage"])
            .expect_err("garage is not a page");
        assert!(error.to_string().contains("garage"));
    }

    #[rstest]
    fn modify_booking_collects_times() {
        let args = CliArgs::try_parse_from([
            "rental-sync",
            "modify-booking",
            "--booking-id",
            "9",
            "--vehicle-id",
            "4",
            "--start",
            "2024-05-01T10:00",
            "--end",
            "2024-05-01T12:00",
        ])
        .expect("parse");
        let Command::Sync(SyncCommand::ModifyBooking {
            booking_id,
            booking,
        }) = args.command
        else {
            panic!("expected modify-booking");
        };
        assert_eq!(booking_id, 9);
        assert_eq!(BookingForm::from(booking).vehicle_id, 4);
    }

    #[rstest]
    fn select_invoice_is_a_storage_only_command() {
        let args = CliArgs::try_parse_from(["rental-sync", "select-invoice", "7"]).expect("parse");
        assert!(matches!(
            args.command,
            Command::SelectInvoice { booking_id: 7 }
        ));
    }

    #[rstest]
    fn select_invoice_records_the_booking() {
        let storage = MemoryKeyValueStore::new();
        select_invoice(&storage, 7).expect("memory store accepts writes");
        assert_eq!(
            storage.get(keys::BOOKING_INVOICE_ID),
            Some("7".to_owned())
        );
    }
}
