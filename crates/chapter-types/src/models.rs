use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attendance::AttendanceState;
use crate::schedule::Schedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Member,
    Sponsor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "member",
            Role::Sponsor => "sponsor",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(Role::Member),
            "sponsor" => Ok(Role::Sponsor),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Full event record. Also the admin projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub event_name: String,
    pub event_description: String,
    #[serde(flatten)]
    pub schedule: Schedule,
    pub event_location: String,
    pub event_lat: f64,
    pub event_long: f64,
    pub event_limit: u32,
    /// Minutes. Stored and returned, never consulted by the session check.
    pub check_in_window: u32,
    /// Meters.
    pub check_in_radius: f64,
    pub event_rsvped: Vec<String>,
    pub event_attending: Vec<String>,
    pub is_hidden: bool,
    pub created_at: DateTime<Utc>,
}

pub type AdminEvent = Event;

impl Event {
    pub fn state_of(&self, user_id: &str) -> AttendanceState {
        AttendanceState::of(user_id, &self.event_rsvped, &self.event_attending)
    }

    pub fn is_in_session_at(&self, now: NaiveDateTime) -> bool {
        self.schedule.is_in_session_at(now)
    }
}

/// What signed-in members see: membership sets and check-in configuration,
/// without the admin visibility flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberEvent {
    pub id: String,
    pub event_name: String,
    pub event_description: String,
    #[serde(flatten)]
    pub schedule: Schedule,
    pub event_location: String,
    pub event_lat: f64,
    pub event_long: f64,
    pub event_limit: u32,
    pub check_in_window: u32,
    pub check_in_radius: f64,
    pub event_rsvped: Vec<String>,
    pub event_attending: Vec<String>,
}

impl MemberEvent {
    pub fn state_of(&self, user_id: &str) -> AttendanceState {
        AttendanceState::of(user_id, &self.event_rsvped, &self.event_attending)
    }

    pub fn rsvp_count(&self) -> usize {
        self.event_rsvped.len()
    }
}

impl From<Event> for MemberEvent {
    fn from(e: Event) -> Self {
        Self {
            id: e.id,
            event_name: e.event_name,
            event_description: e.event_description,
            schedule: e.schedule,
            event_location: e.event_location,
            event_lat: e.event_lat,
            event_long: e.event_long,
            event_limit: e.event_limit,
            check_in_window: e.check_in_window,
            check_in_radius: e.check_in_radius,
            event_rsvped: e.event_rsvped,
            event_attending: e.event_attending,
        }
    }
}

/// Anonymous feed entry. Counts only, no user ids or coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicEvent {
    pub id: String,
    pub event_name: String,
    pub event_description: String,
    #[serde(flatten)]
    pub schedule: Schedule,
    pub event_location: String,
    pub event_limit: u32,
    pub rsvp_count: usize,
}

impl From<Event> for PublicEvent {
    fn from(e: Event) -> Self {
        Self {
            rsvp_count: e.event_rsvped.len(),
            id: e.id,
            event_name: e.event_name,
            event_description: e.event_description,
            schedule: e.schedule,
            event_location: e.event_location,
            event_limit: e.event_limit,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub author_id: Uuid,
    pub author_username: String,
    pub created_at: DateTime<Utc>,
}
