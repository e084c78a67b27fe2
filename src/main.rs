use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Local, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};

use haven_booking::config::AppConfig;
use haven_booking::error::AppError;
use haven_booking::telemetry;
use haven_booking::workflows::booking::{
    BedCapacity, Booking, BookingEvent, BookingRepository, BookingRequest,
    BookingWorkflowError, BookingWorkflowService, BroadcastEventHub, CapacitySnapshot, GeoPoint,
    InMemoryBookingRepository, InMemoryCapacityLedger, InMemorySessionStore, LocationId,
    NeedsAssessment, RequesterIdentity, ResourceAvailability, SecurityLevel, SessionId,
    SessionRecord, SessionRepository, ShelterLocation, SupportService,
};

#[derive(Parser, Debug)]
#[command(
    name = "Safehouse Placement Orchestrator",
    about = "Demonstrate the safehouse booking workflow from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk one booking through the full placement lifecycle (default command)
    Demo(DemoArgs),
}

#[derive(Args, Debug)]
struct DemoArgs {
    /// Beds at the demo location
    #[arg(long, default_value_t = 10)]
    total_beds: u32,
    /// Guests on the booking
    #[arg(long, default_value_t = 3)]
    guests: u32,
    /// Requested check-in date (YYYY-MM-DD), defaults to today
    #[arg(long, value_parser = parse_date)]
    check_in: Option<NaiveDate>,
    /// Nights the party expects to stay
    #[arg(long, default_value_t = 14)]
    nights: i64,
    /// Arrange a shuttle pickup as part of the workflow
    #[arg(long)]
    transportation: bool,
    /// Book through an anonymous session instead of a registered user
    #[arg(long)]
    anonymous: bool,
    /// Special needs to match against the location (comma separated)
    #[arg(long, value_delimiter = ',', value_parser = parse_service)]
    needs: Vec<SupportService>,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            total_beds: 10,
            guests: 3,
            check_in: None,
            nights: 14,
            transportation: false,
            anonymous: false,
            needs: Vec::new(),
        }
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Demo(DemoArgs::default()));

    match command {
        Command::Demo(args) => run_demo(args),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

fn parse_service(raw: &str) -> Result<SupportService, String> {
    raw.parse()
}

fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    println!("Safehouse placement demo");

    let location_id = LocationId("loc-harbor".to_string());
    let house = demo_location(&location_id, args.total_beds);
    println!(
        "Location: {} (security {}, {} beds)",
        house.name,
        house.security_level.label(),
        args.total_beds
    );

    let ledger = Arc::new(InMemoryCapacityLedger::new());
    ledger.register(house);

    let bookings = Arc::new(InMemoryBookingRepository::new());
    let sessions = Arc::new(InMemorySessionStore::new());
    let hub = Arc::new(BroadcastEventHub::default());
    let mut feed = hub.subscribe();

    let service = BookingWorkflowService::new(
        ledger,
        bookings.clone(),
        sessions.clone(),
        hub.clone(),
        config.matching,
    );

    let requester = if args.anonymous {
        let session_id = SessionId("sess-demo".to_string());
        sessions
            .put(SessionRecord::new(session_id.clone(), Utc::now()))
            .map_err(BookingWorkflowError::from)?;
        RequesterIdentity::Anonymous { session_id }
    } else {
        RequesterIdentity::Registered {
            user_id: "user-demo".to_string(),
        }
    };

    let check_in = args.check_in.unwrap_or_else(|| Local::now().date_naive());

    render_capacity("Before placement", service.availability(&location_id)?);

    let request = BookingRequest {
        location_id: location_id.clone(),
        requester,
        requested_check_in: check_in,
        requested_check_out: Some(check_in + Duration::days(args.nights)),
        number_of_guests: args.guests,
        special_needs: args.needs.clone(),
        accessibility_needs: Vec::new(),
        transportation_required: args.transportation,
        pickup_location: args
            .transportation
            .then_some(GeoPoint {
                latitude: 41.6005,
                longitude: -93.6091,
            }),
    };

    let booking = service.create_reservation(request)?;
    render_booking("Reservation created", &booking);
    render_capacity("After reservation", service.availability(&location_id)?);

    if args.transportation {
        let arranged = service.arrange_transportation(&booking.id, None)?;
        if let Some(plan) = &arranged.transportation {
            println!(
                "Shuttle {}: {:.1} km pickup, ETA {} minutes",
                plan.status.label(),
                plan.distance_km,
                plan.eta_minutes
            );
        }
    }

    service.record_intake(&booking.id, demo_assessment())?;
    service.activate_support_services(
        &booking.id,
        &[SupportService::Counseling, SupportService::Medical],
    )?;
    service.approve(&booking.id, "duty-counselor".to_string())?;

    let checked_in = service.check_in(&booking.id)?;
    render_booking("Checked in", &checked_in);
    render_capacity("While occupied", service.availability(&location_id)?);

    let active = bookings
        .active_for_location(&location_id)
        .map_err(BookingWorkflowError::from)?;
    println!("Active placements at the location: {}", active.len());

    let checked_out = service.check_out(&booking.id)?;
    render_booking("Checked out", &checked_out);
    render_capacity("After stay", service.availability(&location_id)?);

    println!("\nPublished transitions");
    while let Ok(event) = feed.try_recv() {
        render_event(&event);
    }

    match serde_json::to_string_pretty(&checked_out) {
        Ok(json) => println!("\nRecord as stored\n{json}"),
        Err(err) => eprintln!("could not render the stored record: {err}"),
    }

    Ok(())
}

fn demo_location(id: &LocationId, total_beds: u32) -> ShelterLocation {
    ShelterLocation {
        id: id.clone(),
        name: "Harbor Lights House".to_string(),
        capacity: BedCapacity::vacant(total_beds),
        resources: ResourceAvailability::full(),
        security_level: SecurityLevel::High,
        accessibility_features: vec![
            "wheelchair access".to_string(),
            "ground floor room".to_string(),
        ],
        coordinates: GeoPoint {
            latitude: 41.5868,
            longitude: -93.625,
        },
        auto_approve: false,
        accepting_placements: true,
    }
}

fn demo_assessment() -> NeedsAssessment {
    let mut responses = BTreeMap::new();
    responses.insert("immediate_danger".to_string(), "no".to_string());
    responses.insert("medication_needed".to_string(), "yes".to_string());

    NeedsAssessment {
        assessed_by: "duty-counselor".to_string(),
        assessed_at: Utc::now(),
        summary: "Initial intake complete; medication review scheduled".to_string(),
        responses,
        follow_up_required: true,
    }
}

fn render_capacity(label: &str, capacity: CapacitySnapshot) {
    println!(
        "{label}: {} beds total, {} available / {} reserved / {} occupied",
        capacity.total, capacity.available, capacity.reserved, capacity.occupied
    );
}

fn render_booking(label: &str, booking: &Booking) {
    let view = booking.status_view();
    println!(
        "{label}: {} is {} (step {}/6)",
        view.booking_id, view.status, view.workflow_step
    );
    if !view.next_steps.is_empty() {
        println!("  next: {}", view.next_steps.join(", "));
    }
}

fn render_event(event: &BookingEvent) {
    let from = event
        .from_status
        .map(|status| status.label())
        .unwrap_or("(new)");
    println!(
        "- {} {} -> {} at {}",
        event.booking_id,
        from,
        event.to_status,
        event.occurred_at.format("%H:%M:%S")
    );
    if let Some(capacity) = event.capacity {
        println!(
            "    beds now {} available / {} reserved / {} occupied",
            capacity.available, capacity.reserved, capacity.occupied
        );
    }
}
