//! Calendar seam and the `icalBuddy` reference backend.
//!
//! Only the presence of upcoming events affects the panel's size; the event
//! list itself is broadcast for the renderer's tile.  Every failure mode —
//! missing helper, denied access, unparsable output — degrades to "zero
//! events", never an error.

use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};
use islet_core::{config::Config, platform};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::core::PanelEvent;

#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub title: String,
    pub starts_at: DateTime<Local>,
    pub location: Option<String>,
}

pub trait CalendarSource: Send + Sync + 'static {
    /// Fetch upcoming events; the answer arrives as
    /// `PanelEvent::CalendarEvents` (possibly empty).
    fn refresh(&self, reply: mpsc::Sender<PanelEvent>);
}

/// `icalBuddy` subprocess backend.
pub struct IcalBuddy {
    binary: Option<PathBuf>,
    lookahead_days: u32,
}

impl IcalBuddy {
    pub fn discover(config: &Config) -> Self {
        let binary = platform::find_icalbuddy_binary();
        match &binary {
            Some(p) => info!("calendar: using helper {}", p.display()),
            None => warn!("calendar: icalBuddy not found, no upcoming events"),
        }
        Self {
            binary,
            lookahead_days: config.calendar.lookahead_days,
        }
    }
}

impl CalendarSource for IcalBuddy {
    fn refresh(&self, reply: mpsc::Sender<PanelEvent>) {
        let Some(bin) = self.binary.clone() else {
            let _ = reply.try_send(PanelEvent::CalendarEvents(Vec::new()));
            return;
        };
        let range = format!("eventsToday+{}", self.lookahead_days);
        tokio::spawn(async move {
            let events = match run_fetch(&bin, &range).await {
                Ok(events) => events,
                Err(e) => {
                    debug!("calendar: fetch failed: {}", e);
                    Vec::new()
                }
            };
            let _ = reply.send(PanelEvent::CalendarEvents(events)).await;
        });
    }
}

async fn run_fetch(bin: &PathBuf, range: &str) -> anyhow::Result<Vec<CalendarEvent>> {
    let out = tokio::process::Command::new(bin)
        .args([
            "-npn", // no property names
            "-nc",  // no calendar names
            "-nrd", // absolute dates
            "-b",
            "* ",
            "-df",
            "%Y-%m-%d",
            "-tf",
            "%H:%M",
            "-iep",
            "title,datetime,location",
            "-po",
            "title,datetime,location",
            range,
        ])
        .output()
        .await?;
    if !out.status.success() {
        anyhow::bail!("icalBuddy exited with {}", out.status);
    }
    Ok(parse_events(&String::from_utf8_lossy(&out.stdout)))
}

/// Parse icalBuddy's bulleted output: a `* ` line opens an event, indented
/// lines carry its date/time and location.  Events whose date cannot be
/// read are dropped.
fn parse_events(text: &str) -> Vec<CalendarEvent> {
    struct Partial {
        title: String,
        starts_at: Option<DateTime<Local>>,
        location: Option<String>,
    }

    let mut out: Vec<CalendarEvent> = Vec::new();
    let mut current: Option<Partial> = None;

    let flush = |p: Option<Partial>, out: &mut Vec<CalendarEvent>| {
        if let Some(p) = p {
            match p.starts_at {
                Some(starts_at) => out.push(CalendarEvent {
                    title: p.title,
                    starts_at,
                    location: p.location,
                }),
                None => debug!("calendar: dropping undated event '{}'", p.title),
            }
        }
    };

    for line in text.lines() {
        if let Some(title) = line.strip_prefix("* ") {
            flush(current.take(), &mut out);
            current = Some(Partial {
                title: title.trim().to_string(),
                starts_at: None,
                location: None,
            });
            continue;
        }

        let Some(partial) = current.as_mut() else {
            continue;
        };
        let detail = line.trim();
        if detail.is_empty() {
            continue;
        }
        if let Some(loc) = detail.strip_prefix("location:") {
            partial.location = Some(loc.trim().to_string());
        } else if partial.starts_at.is_none() {
            partial.starts_at = parse_start(detail);
        }
    }
    flush(current.take(), &mut out);

    out.sort_by_key(|e| e.starts_at);
    out
}

/// `2026-08-07 at 09:30 - 09:45`, `2026-08-07 - 2026-08-08`, or a bare
/// `2026-08-07` for all-day events.  Only the start matters.
fn parse_start(detail: &str) -> Option<DateTime<Local>> {
    let start = detail.split(" - ").next()?.trim();
    let (date_part, time_part) = match start.split_once(" at ") {
        Some((d, t)) => (d.trim(), Some(t.trim())),
        None => (start, None),
    };

    let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()?;
    let time = match time_part {
        Some(t) => NaiveTime::parse_from_str(t, "%H:%M").ok()?,
        None => NaiveTime::MIN,
    };
    Local.from_local_datetime(&date.and_time(time)).single()
}
