use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::AttendanceError;
use crate::schedule::Schedule;

/// Where a single user stands with respect to a single event.
///
/// `NotRsvped -> Rsvped -> CheckedIn`. `CheckedIn` has no exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceState {
    NotRsvped,
    Rsvped,
    CheckedIn,
}

impl AttendanceState {
    /// Attendance wins over RSVP membership, so a user who is somehow in
    /// `attending` without an RSVP still reads as checked in.
    pub fn of(user_id: &str, rsvped: &[String], attending: &[String]) -> Self {
        if attending.iter().any(|id| id == user_id) {
            AttendanceState::CheckedIn
        } else if rsvped.iter().any(|id| id == user_id) {
            AttendanceState::Rsvped
        } else {
            AttendanceState::NotRsvped
        }
    }

    pub fn rsvp(self) -> Result<Self, AttendanceError> {
        match self {
            AttendanceState::NotRsvped => Ok(AttendanceState::Rsvped),
            AttendanceState::Rsvped | AttendanceState::CheckedIn => Err(AttendanceError::AlreadyRsvped),
        }
    }

    /// Removing an absent RSVP is a no-op.
    pub fn unrsvp(self) -> Result<Self, AttendanceError> {
        match self {
            AttendanceState::NotRsvped | AttendanceState::Rsvped => Ok(AttendanceState::NotRsvped),
            AttendanceState::CheckedIn => Err(AttendanceError::AlreadyCheckedIn),
        }
    }

    pub fn check_in(self) -> Result<Self, AttendanceError> {
        match self {
            AttendanceState::Rsvped => Ok(AttendanceState::CheckedIn),
            AttendanceState::CheckedIn => Err(AttendanceError::AlreadyCheckedIn),
            AttendanceState::NotRsvped => Err(AttendanceError::NotRsvped),
        }
    }
}

/// Checks that need nothing but the event record and the clock: session
/// window first, then prior attendance, then RSVP membership.
pub fn precheck_check_in(
    schedule: &Schedule,
    state: AttendanceState,
    now: NaiveDateTime,
) -> Result<(), AttendanceError> {
    if !schedule.is_in_session_at(now) {
        return Err(AttendanceError::EventNotInSession);
    }
    state.check_in().map(|_| ())
}
