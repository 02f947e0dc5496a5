use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};

/// When an event runs. All values are naive local wall-clock; no timezone
/// normalization happens anywhere in the session check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub event_date: Option<NaiveDate>,
    pub event_time: Option<NaiveTime>,
    pub event_hours: f64,
}

impl Schedule {
    /// `[start, end]` of the session, or `None` when there is no date or the
    /// duration cannot be represented.
    pub fn bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        session_bounds(self.event_date, self.event_time, self.event_hours)
    }

    pub fn is_in_session_at(&self, now: NaiveDateTime) -> bool {
        is_in_session_at(self.event_date, self.event_time, self.event_hours, now)
    }

    pub fn is_in_session(&self) -> bool {
        self.is_in_session_at(Local::now().naive_local())
    }
}

/// Start is midnight of `date` when no time-of-day is set. A negative
/// duration yields an end before the start, which no instant satisfies.
pub fn session_bounds(
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
    hours: f64,
) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let date = date?;
    if !hours.is_finite() {
        return None;
    }

    let start = match time {
        Some(t) => date.and_time(t),
        None => date.and_hms_opt(0, 0, 0)?,
    };

    let seconds = (hours * 3600.0).round() as i64;
    let end = start.checked_add_signed(TimeDelta::try_seconds(seconds)?)?;
    Some((start, end))
}

/// Inclusive on both ends. Malformed input degrades to `false`.
pub fn is_in_session_at(
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
    hours: f64,
    now: NaiveDateTime,
) -> bool {
    match session_bounds(date, time, hours) {
        Some((start, end)) => start <= now && now <= end,
        None => false,
    }
}
