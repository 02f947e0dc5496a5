//! Database row types. These map directly to SQLite rows and stay distinct
//! from the chapter-types API models to keep the DB layer independent.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use tracing::warn;

use chapter_types::models::Event;
use chapter_types::schedule::Schedule;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M:%S";

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub role: String,
    pub created_at: String,
}

pub struct EventRow {
    pub id: String,
    pub event_name: String,
    pub event_description: String,
    pub event_date: Option<String>,
    pub event_time: Option<String>,
    pub event_hours: f64,
    pub event_location: String,
    pub event_lat: f64,
    pub event_long: f64,
    pub event_limit: i64,
    pub check_in_window: i64,
    pub check_in_radius: f64,
    pub is_hidden: bool,
    pub created_at: String,
}

impl EventRow {
    /// Unparseable dates and times become `None`, which the session check
    /// reads as "not in session".
    pub fn into_event(self, event_rsvped: Vec<String>, event_attending: Vec<String>) -> Event {
        let event_date = self.event_date.as_deref().and_then(|d| {
            NaiveDate::parse_from_str(d, DATE_FORMAT)
                .map_err(|e| warn!("Corrupt event_date '{}' on event '{}': {}", d, self.id, e))
                .ok()
        });
        let event_time = self.event_time.as_deref().and_then(|t| {
            NaiveTime::parse_from_str(t, TIME_FORMAT)
                .map_err(|e| warn!("Corrupt event_time '{}' on event '{}': {}", t, self.id, e))
                .ok()
        });
        let created_at = parse_timestamp(&self.created_at).unwrap_or_else(|| {
            warn!("Corrupt created_at '{}' on event '{}'", self.created_at, self.id);
            DateTime::default()
        });

        Event {
            id: self.id,
            event_name: self.event_name,
            event_description: self.event_description,
            schedule: Schedule {
                event_date,
                event_time,
                event_hours: self.event_hours,
            },
            event_location: self.event_location,
            event_lat: self.event_lat,
            event_long: self.event_long,
            event_limit: self.event_limit.clamp(0, u32::MAX as i64) as u32,
            check_in_window: self.check_in_window.clamp(0, u32::MAX as i64) as u32,
            check_in_radius: self.check_in_radius,
            event_rsvped,
            event_attending,
            is_hidden: self.is_hidden,
            created_at,
        }
    }
}

pub struct AnnouncementRow {
    pub id: String,
    pub title: String,
    pub body: String,
    pub author_id: String,
    pub author_username: String,
    pub created_at: String,
}

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone; treat
/// them as UTC. RFC 3339 is accepted too.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .ok()
}
