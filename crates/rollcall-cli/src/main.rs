//! Rollcall CLI - run events, check-ins, prize draws, and claims from the shell.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod commands;
mod output;

use commands::{audit, checkin, claim, credential, draw, event, export, prize, Context};

#[derive(Parser)]
#[command(name = "rollcall")]
#[command(about = "Rollcall event check-in, prize draw, and claim CLI")]
struct Cli {
    /// Directory holding one JSON file per event
    #[arg(long, global = true, default_value = "rollcall-data")]
    store: PathBuf,
    /// Settings JSON file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Audit journal path (default: <store>/audit.rcj)
    #[arg(long, global = true)]
    journal: Option<PathBuf>,
    /// Act as if the current time were this RFC 3339 instant
    #[arg(long, global = true)]
    at: Option<DateTime<Utc>>,
    #[command(subcommand)]
    command: Commands,
}

/// Status an operator may move an event to.
#[derive(Clone, Copy, ValueEnum)]
pub enum StatusArg {
    /// Open for check-in
    Active,
    /// Finished
    Ended,
    /// Called off
    Cancelled,
}

/// Prize category argument.
#[derive(Clone, Copy, ValueEnum)]
pub enum PrizeTypeArg {
    /// In-app currency
    Currency,
    /// Physical goods
    Physical,
    /// Voucher or coupon
    Voucher,
    /// Service
    Service,
}

/// Claim status argument.
#[derive(Clone, Copy, ValueEnum)]
pub enum ClaimStatusArg {
    /// Awaiting a claim
    Pending,
    /// Claimed
    Claimed,
    /// Deadline passed
    Expired,
}

/// Export format.
#[derive(Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    /// Comma-separated values with a header row
    Csv,
    /// JSON array of rows
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a draft event
    Create {
        /// Event title
        #[arg(long)]
        title: String,
        /// Organizer user id
        #[arg(long)]
        creator: String,
        /// Venue latitude
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Venue longitude
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Geofence radius in meters
        #[arg(long, default_value_t = 100.0)]
        radius: f64,
        /// Start instant (RFC 3339)
        #[arg(long)]
        start: DateTime<Utc>,
        /// End instant (RFC 3339)
        #[arg(long)]
        end: DateTime<Utc>,
        /// Capacity
        #[arg(long)]
        max_attendees: u32,
        /// Let one user win several prizes
        #[arg(long)]
        allow_multiple_wins: bool,
        /// Scheduled draw time (RFC 3339), informational
        #[arg(long)]
        draw_time: Option<DateTime<Utc>>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move an event to a new status
    Status {
        /// Event id
        event: String,
        /// Target status
        #[arg(value_enum)]
        status: StatusArg,
    },
    /// Show one event
    Show {
        /// Event id
        event: String,
        /// Output the full event as JSON
        #[arg(long)]
        json: bool,
    },
    /// List stored events
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a prize to an event
    AddPrize {
        /// Event id
        event: String,
        /// Prize title
        #[arg(long)]
        title: String,
        /// Prize category
        #[arg(long = "type", value_enum)]
        prize_type: PrizeTypeArg,
        /// Value in whole currency units
        #[arg(long, default_value_t = 0)]
        value: u64,
        /// Number of winner slots
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },
    /// Issue a fresh QR credential, replacing the current one
    Issue {
        /// Event id
        event: String,
        /// Output the full credential as JSON
        #[arg(long)]
        json: bool,
    },
    /// Switch an event's QR credential off
    Deactivate {
        /// Event id
        event: String,
    },
    /// Verify a scan and admit the attendee
    CheckIn {
        /// Event id
        event: String,
        /// Scanned QR text
        #[arg(long, conflicts_with = "payload_file", required_unless_present = "payload_file")]
        payload: Option<String>,
        /// File containing the scanned QR text
        #[arg(long)]
        payload_file: Option<PathBuf>,
        /// Scanner latitude
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Scanner longitude
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Reported horizontal accuracy in meters
        #[arg(long)]
        accuracy: Option<f64>,
        /// Scanning user id
        #[arg(long)]
        user: String,
        /// Display name
        #[arg(long)]
        name: String,
        /// Contact email
        #[arg(long)]
        email: Option<String>,
        /// Contact phone
        #[arg(long)]
        phone: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Draw winners for every active prize
    Draw {
        /// Event id
        event: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Discard a draw that has no claimed prizes
    Reset {
        /// Event id
        event: String,
    },
    /// Redeem a winner's claim code
    Claim {
        /// Event id
        event: String,
        /// Winner id
        winner: String,
        /// Claim code
        code: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Expire pending winners whose deadline passed
    Sweep {
        /// Event id (default: every stored event)
        event: Option<String>,
    },
    /// Export an event's winners
    Export {
        /// Event id
        event: String,
        /// Output format
        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,
        /// Only winners with this claim status
        #[arg(long, value_enum)]
        status: Option<ClaimStatusArg>,
        /// Only winners of this prize id
        #[arg(long)]
        prize: Option<String>,
        /// Only winners of this prize category
        #[arg(long = "prize-type", value_enum)]
        prize_type: Option<PrizeTypeArg>,
        /// Only winners with this user id
        #[arg(long)]
        user: Option<String>,
        /// Write to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Inspect the audit journal
    Audit {
        #[command(subcommand)]
        command: AuditCommands,
    },
}

#[derive(Subcommand)]
enum AuditCommands {
    /// List audit records
    List {
        /// Only records for this event id
        #[arg(long)]
        event: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Verify the hash chain
    Verify {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let ctx = Context::new(cli.store, cli.journal, cli.config, cli.at);

    let result = match cli.command {
        Commands::Create {
            title,
            creator,
            lat,
            lng,
            radius,
            start,
            end,
            max_attendees,
            allow_multiple_wins,
            draw_time,
            json,
        } => event::create(
            &ctx,
            event::NewEvent {
                title,
                creator,
                lat,
                lng,
                radius,
                start,
                end,
                max_attendees,
                allow_multiple_wins,
                draw_time,
            },
            json,
        ),
        Commands::Status { event, status } => event::status(&ctx, event, status),
        Commands::Show { event, json } => event::show(&ctx, event, json),
        Commands::List { json } => event::list(&ctx, json),
        Commands::AddPrize {
            event,
            title,
            prize_type,
            value,
            quantity,
        } => prize::add(&ctx, event, title, prize_type, value, quantity),
        Commands::Issue { event, json } => credential::issue(&ctx, event, json),
        Commands::Deactivate { event } => credential::deactivate(&ctx, event),
        Commands::CheckIn {
            event,
            payload,
            payload_file,
            lat,
            lng,
            accuracy,
            user,
            name,
            email,
            phone,
            json,
        } => checkin::run(
            &ctx,
            event,
            checkin::Scan {
                payload,
                payload_file,
                lat,
                lng,
                accuracy,
                user,
                name,
                email,
                phone,
            },
            json,
        ),
        Commands::Draw { event, json } => draw::run(&ctx, event, json),
        Commands::Reset { event } => draw::reset(&ctx, event),
        Commands::Claim {
            event,
            winner,
            code,
            json,
        } => claim::run(&ctx, event, winner, code, json),
        Commands::Sweep { event } => claim::sweep(&ctx, event),
        Commands::Export {
            event,
            format,
            status,
            prize,
            prize_type,
            user,
            output,
        } => export::run(
            &ctx,
            event,
            format,
            export::Filters {
                status,
                prize,
                prize_type,
                user,
            },
            output,
        ),
        Commands::Audit { command } => match command {
            AuditCommands::List { event, json } => audit::list(&ctx, event, json),
            AuditCommands::Verify { json } => audit::verify(&ctx, json),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
