//! Event creation, status changes, and listings.

use crate::commands::{event_id, user_id, CmdResult, Context};
use crate::output;
use crate::StatusArg;
use chrono::{DateTime, Utc};
use rollcall_core::{Coordinate, Event, EventSchedule, EventStatus};
use serde_json::json;

/// Arguments of `rollcall create`.
pub struct NewEvent {
    pub title: String,
    pub creator: String,
    pub lat: f64,
    pub lng: f64,
    pub radius: f64,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub max_attendees: u32,
    pub allow_multiple_wins: bool,
    pub draw_time: Option<DateTime<Utc>>,
}

pub fn create(ctx: &Context, args: NewEvent, json: bool) -> CmdResult {
    let mut event = Event::new(
        args.title,
        user_id(&args.creator)?,
        Coordinate::new(args.lat, args.lng)?,
        args.radius,
        EventSchedule::between(args.start, args.end),
        args.max_attendees,
    )?;
    event.draw_settings.allow_multiple_wins = args.allow_multiple_wins;
    event.draw_settings.draw_time = args.draw_time;

    let desk = ctx.desk()?;
    let id = desk.create(event, ctx.now())?;

    if json {
        println!("{}", output::format_json(&json!({ "eventId": id })));
    } else {
        println!("{}", id);
    }
    Ok(())
}

pub fn status(ctx: &Context, event: String, status: StatusArg) -> CmdResult {
    let id = event_id(&event)?;
    let next = match status {
        StatusArg::Active => EventStatus::Active,
        StatusArg::Ended => EventStatus::Ended,
        StatusArg::Cancelled => EventStatus::Cancelled,
    };
    let previous = ctx.desk()?.transition(&id, next, ctx.now())?;
    println!("{}: {} -> {}", id, previous, next);
    Ok(())
}

pub fn show(ctx: &Context, event: String, json: bool) -> CmdResult {
    let id = event_id(&event)?;
    let event = ctx.desk()?.event(&id)?;

    if json {
        println!("{}", output::format_json(&event));
        return Ok(());
    }

    println!("Event:       {}", event.id);
    println!("Title:       {}", event.title);
    println!("Status:      {}", event.status);
    println!("Creator:     {}", event.creator);
    println!(
        "Venue:       {:.6}, {:.6} (radius {} m)",
        event.location.lat, event.location.lng, event.verification_radius_meters
    );
    println!(
        "Window:      {} .. {}",
        event.schedule.starts_at().to_rfc3339(),
        event.schedule.ends_at().to_rfc3339()
    );
    println!(
        "Attendees:   {}/{}",
        event.current_attendees(),
        event.max_attendees
    );
    match &event.qr_credential {
        Some(c) => println!(
            "Credential:  {} ({}, expires {}, scans {}{})",
            c.id,
            if c.is_active { "active" } else { "inactive" },
            c.expires_at.to_rfc3339(),
            c.scans_used,
            c.scan_limit.map(|l| format!("/{}", l)).unwrap_or_default()
        ),
        None => println!("Credential:  none"),
    }
    match event.drawn_at {
        Some(at) => println!("Drawn at:    {}", at.to_rfc3339()),
        None => println!("Drawn at:    not drawn"),
    }

    if !event.prizes.is_empty() {
        println!();
        let widths = [36, 24, 9, 10, 4, 6];
        output::print_table_header(&[
            ("PRIZE_ID", widths[0]),
            ("TITLE", widths[1]),
            ("TYPE", widths[2]),
            ("VALUE", widths[3]),
            ("QTY", widths[4]),
            ("ACTIVE", widths[5]),
        ]);
        for prize in &event.prizes {
            let prize_type = serde_json::to_value(prize.prize_type)?;
            let value = prize.value.to_string();
            let quantity = prize.quantity.to_string();
            println!(
                "{}",
                output::format_table_row(
                    &[
                        prize.id.as_str(),
                        &prize.title,
                        prize_type.as_str().unwrap_or("?"),
                        &value,
                        &quantity,
                        if prize.is_active { "yes" } else { "no" },
                    ],
                    &widths,
                )
            );
        }
    }

    if !event.winners.is_empty() {
        println!();
        let widths = [36, 24, 24, 8, 25];
        output::print_table_header(&[
            ("WINNER_ID", widths[0]),
            ("USER", widths[1]),
            ("PRIZE", widths[2]),
            ("STATUS", widths[3]),
            ("DEADLINE", widths[4]),
        ]);
        for winner in &event.winners {
            let status = winner.claim_status.to_string();
            let deadline = winner.claim_deadline.to_rfc3339();
            println!(
                "{}",
                output::format_table_row(
                    &[
                        winner.id.as_str(),
                        winner.user_id.as_str(),
                        &winner.prize_title,
                        &status,
                        &deadline,
                    ],
                    &widths,
                )
            );
        }
    }
    Ok(())
}

pub fn list(ctx: &Context, json: bool) -> CmdResult {
    let desk = ctx.desk()?;
    let mut events = Vec::new();
    for id in desk.list()? {
        events.push(desk.event(&id)?);
    }

    if json {
        let rows: Vec<_> = events
            .iter()
            .map(|e| {
                json!({
                    "eventId": e.id,
                    "title": e.title,
                    "status": e.status,
                    "attendees": e.current_attendees(),
                    "maxAttendees": e.max_attendees,
                    "prizes": e.prizes.len(),
                    "winners": e.winners.len(),
                })
            })
            .collect();
        println!("{}", output::format_json(&rows));
        return Ok(());
    }

    let widths = [36, 28, 9, 9, 7];
    output::print_table_header(&[
        ("EVENT_ID", widths[0]),
        ("TITLE", widths[1]),
        ("STATUS", widths[2]),
        ("ATTENDEES", widths[3]),
        ("WINNERS", widths[4]),
    ]);
    for e in &events {
        let status = e.status.to_string();
        let attendees = format!("{}/{}", e.current_attendees(), e.max_attendees);
        let winners = e.winners.len().to_string();
        println!(
            "{}",
            output::format_table_row(
                &[e.id.as_str(), &e.title, &status, &attendees, &winners],
                &widths,
            )
        );
    }
    Ok(())
}
