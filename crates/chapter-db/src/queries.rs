use std::collections::HashMap;

use anyhow::Result;
use rusqlite::Connection;

use chapter_types::api::EventInput;
use chapter_types::models::{Event, Role};

use crate::Database;
use crate::models::{AnnouncementRow, DATE_FORMAT, EventRow, TIME_FORMAT, UserRow};

/// Result of adding a user to an event's RSVP list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsvpOutcome {
    Added { rsvp_count: usize },
    AlreadyRsvped,
    CapacityExceeded,
    EventNotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnrsvpOutcome {
    Removed,
    /// The user had no RSVP; nothing changed.
    NotPresent,
    AlreadyCheckedIn,
    EventNotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInOutcome {
    Recorded,
    AlreadyCheckedIn,
    NotRsvped,
    EventNotFound,
}

const RSVP_EXISTS: &str = "SELECT EXISTS(SELECT 1 FROM event_rsvps WHERE event_id = ?1 AND user_id = ?2)";
const ATTENDANCE_EXISTS: &str = "SELECT EXISTS(SELECT 1 FROM event_attendance WHERE event_id = ?1 AND user_id = ?2)";

const EVENT_COLUMNS: &str = "id, event_name, event_description, event_date, event_time, event_hours,
     event_location, event_lat, event_long, event_limit, check_in_window, check_in_radius,
     is_hidden, created_at";

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str, password_hash: &str, role: Role) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password, role) VALUES (?1, ?2, ?3, ?4)",
                (id, username, password_hash, role.as_str()),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    // -- Events --

    pub fn insert_event(&self, id: &str, input: &EventInput) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO events (id, event_name, event_description, event_date, event_time, event_hours,
                     event_location, event_lat, event_long, event_limit, check_in_window, check_in_radius, is_hidden)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                rusqlite::params![
                    id,
                    input.event_name,
                    input.event_description,
                    format_date(input),
                    format_time(input),
                    input.schedule.event_hours,
                    input.event_location,
                    input.event_lat,
                    input.event_long,
                    input.event_limit as i64,
                    input.check_in_window as i64,
                    input.check_in_radius,
                    input.is_hidden,
                ],
            )?;
            Ok(())
        })
    }

    /// Returns false when no event has this id. Membership sets are untouched.
    pub fn update_event(&self, id: &str, input: &EventInput) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE events SET event_name = ?2, event_description = ?3, event_date = ?4, event_time = ?5,
                     event_hours = ?6, event_location = ?7, event_lat = ?8, event_long = ?9, event_limit = ?10,
                     check_in_window = ?11, check_in_radius = ?12, is_hidden = ?13
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    input.event_name,
                    input.event_description,
                    format_date(input),
                    format_time(input),
                    input.schedule.event_hours,
                    input.event_location,
                    input.event_lat,
                    input.event_long,
                    input.event_limit as i64,
                    input.check_in_window as i64,
                    input.check_in_radius,
                    input.is_hidden,
                ],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn set_event_hidden(&self, id: &str, hidden: bool) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE events SET is_hidden = ?2 WHERE id = ?1",
                rusqlite::params![id, hidden],
            )?;
            Ok(changed > 0)
        })
    }

    /// RSVP and attendance rows go with the event (ON DELETE CASCADE).
    pub fn delete_event(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM events WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    pub fn get_event(&self, id: &str) -> Result<Option<Event>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM events WHERE id = ?1", EVENT_COLUMNS);
            let row = conn.query_row(&sql, [id], event_row).optional()?;

            let Some(row) = row else {
                return Ok(None);
            };

            let rsvped = query_member_ids(
                conn,
                "SELECT user_id FROM event_rsvps WHERE event_id = ?1 ORDER BY rowid",
                id,
            )?;
            let attending = query_member_ids(
                conn,
                "SELECT user_id FROM event_attendance WHERE event_id = ?1 ORDER BY rowid",
                id,
            )?;

            Ok(Some(row.into_event(rsvped, attending)))
        })
    }

    /// Events ordered by date then time; undated events last.
    pub fn list_events(&self, include_hidden: bool) -> Result<Vec<Event>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM events WHERE is_hidden = 0 OR ?1
                 ORDER BY event_date IS NULL, event_date, event_time, created_at",
                EVENT_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([include_hidden], event_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            // Batch-load membership for every event instead of one query per event
            let mut rsvped = query_all_member_ids(conn, "SELECT event_id, user_id FROM event_rsvps ORDER BY rowid")?;
            let mut attending =
                query_all_member_ids(conn, "SELECT event_id, user_id FROM event_attendance ORDER BY rowid")?;

            let events = rows
                .into_iter()
                .map(|row| {
                    let r = rsvped.remove(&row.id).unwrap_or_default();
                    let a = attending.remove(&row.id).unwrap_or_default();
                    row.into_event(r, a)
                })
                .collect();

            Ok(events)
        })
    }

    // -- RSVP Tracker --

    /// Capacity check and insert run in one transaction under the connection
    /// lock, so concurrent RSVPs cannot push the count past `event_limit`.
    /// Hidden events only accept RSVPs when `include_hidden` is set.
    pub fn add_rsvp(&self, event_id: &str, user_id: &str, include_hidden: bool) -> Result<RsvpOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let Some((limit, hidden)) = query_limit_and_visibility(&tx, event_id)? else {
                return Ok(RsvpOutcome::EventNotFound);
            };
            if hidden && !include_hidden {
                return Ok(RsvpOutcome::EventNotFound);
            }

            if member_exists(&tx, RSVP_EXISTS, event_id, user_id)? {
                return Ok(RsvpOutcome::AlreadyRsvped);
            }

            let count: i64 = tx.query_row(
                "SELECT COUNT(*) FROM event_rsvps WHERE event_id = ?1",
                [event_id],
                |row| row.get(0),
            )?;
            if count >= limit {
                return Ok(RsvpOutcome::CapacityExceeded);
            }

            tx.execute(
                "INSERT INTO event_rsvps (event_id, user_id) VALUES (?1, ?2)",
                (event_id, user_id),
            )?;
            tx.commit()?;

            Ok(RsvpOutcome::Added {
                rsvp_count: (count + 1) as usize,
            })
        })
    }

    /// Refuses once the user has checked in, so attendance stays a subset of RSVPs.
    pub fn remove_rsvp(&self, event_id: &str, user_id: &str, include_hidden: bool) -> Result<UnrsvpOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let Some((_, hidden)) = query_limit_and_visibility(&tx, event_id)? else {
                return Ok(UnrsvpOutcome::EventNotFound);
            };
            if hidden && !include_hidden {
                return Ok(UnrsvpOutcome::EventNotFound);
            }

            if member_exists(&tx, ATTENDANCE_EXISTS, event_id, user_id)? {
                return Ok(UnrsvpOutcome::AlreadyCheckedIn);
            }

            let removed = tx.execute(
                "DELETE FROM event_rsvps WHERE event_id = ?1 AND user_id = ?2",
                (event_id, user_id),
            )?;
            tx.commit()?;

            if removed > 0 {
                Ok(UnrsvpOutcome::Removed)
            } else {
                Ok(UnrsvpOutcome::NotPresent)
            }
        })
    }

    // -- Attendance Recorder --

    /// Re-checks attendance and RSVP membership inside the transaction, then
    /// appends. A repeated call never adds a second row.
    pub fn record_attendance(
        &self,
        event_id: &str,
        user_id: &str,
        latitude: f64,
        longitude: f64,
        accuracy: Option<f64>,
    ) -> Result<CheckInOutcome> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if query_limit_and_visibility(&tx, event_id)?.is_none() {
                return Ok(CheckInOutcome::EventNotFound);
            }

            if member_exists(&tx, ATTENDANCE_EXISTS, event_id, user_id)? {
                return Ok(CheckInOutcome::AlreadyCheckedIn);
            }
            if !member_exists(&tx, RSVP_EXISTS, event_id, user_id)? {
                return Ok(CheckInOutcome::NotRsvped);
            }

            tx.execute(
                "INSERT OR IGNORE INTO event_attendance (event_id, user_id, latitude, longitude, accuracy)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![event_id, user_id, latitude, longitude, accuracy],
            )?;
            tx.commit()?;

            Ok(CheckInOutcome::Recorded)
        })
    }

    // -- Announcements --

    pub fn insert_announcement(&self, id: &str, title: &str, body: &str, author_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO announcements (id, title, body, author_id) VALUES (?1, ?2, ?3, ?4)",
                (id, title, body, author_id),
            )?;
            Ok(())
        })
    }

    pub fn get_announcement(&self, id: &str) -> Result<Option<AnnouncementRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT a.id, a.title, a.body, a.author_id, u.username, a.created_at
                     FROM announcements a
                     LEFT JOIN users u ON a.author_id = u.id
                     WHERE a.id = ?1",
                    [id],
                    announcement_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Newest first.
    pub fn list_announcements(&self, limit: u32) -> Result<Vec<AnnouncementRow>> {
        self.with_conn(|conn| {
            // JOIN users to fetch author_username in a single query
            let mut stmt = conn.prepare(
                "SELECT a.id, a.title, a.body, a.author_id, u.username, a.created_at
                 FROM announcements a
                 LEFT JOIN users u ON a.author_id = u.id
                 ORDER BY a.created_at DESC, a.rowid DESC
                 LIMIT ?1",
            )?;

            let rows = stmt
                .query_map([limit], announcement_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    pub fn delete_announcement(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute("DELETE FROM announcements WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }
}

fn format_date(input: &EventInput) -> Option<String> {
    input.schedule.event_date.map(|d| d.format(DATE_FORMAT).to_string())
}

fn format_time(input: &EventInput) -> Option<String> {
    input.schedule.event_time.map(|t| t.format(TIME_FORMAT).to_string())
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT id, username, password, role, created_at FROM users WHERE {} = ?1",
        column
    );
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                role: row.get(3)?,
                created_at: row.get(4)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn event_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        id: row.get(0)?,
        event_name: row.get(1)?,
        event_description: row.get(2)?,
        event_date: row.get(3)?,
        event_time: row.get(4)?,
        event_hours: row.get(5)?,
        event_location: row.get(6)?,
        event_lat: row.get(7)?,
        event_long: row.get(8)?,
        event_limit: row.get(9)?,
        check_in_window: row.get(10)?,
        check_in_radius: row.get(11)?,
        is_hidden: row.get(12)?,
        created_at: row.get(13)?,
    })
}

fn announcement_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AnnouncementRow> {
    Ok(AnnouncementRow {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        author_id: row.get(3)?,
        author_username: row.get::<_, Option<String>>(4)?.unwrap_or_else(|| "unknown".to_string()),
        created_at: row.get(5)?,
    })
}

fn query_limit_and_visibility(conn: &Connection, event_id: &str) -> Result<Option<(i64, bool)>> {
    conn.query_row(
        "SELECT event_limit, is_hidden FROM events WHERE id = ?1",
        [event_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()
}

fn member_exists(conn: &Connection, sql: &str, event_id: &str, user_id: &str) -> Result<bool> {
    Ok(conn.query_row(sql, (event_id, user_id), |row| row.get(0))?)
}

fn query_member_ids(conn: &Connection, sql: &str, event_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map([event_id], |row| row.get(0))?
        .collect::<std::result::Result<Vec<String>, _>>()?;
    Ok(ids)
}

fn query_all_member_ids(conn: &Connection, sql: &str) -> Result<HashMap<String, Vec<String>>> {
    let mut stmt = conn.prepare(sql)?;
    let mut map: HashMap<String, Vec<String>> = HashMap::new();
    let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
    for row in rows {
        let (event_id, user_id) = row?;
        map.entry(event_id).or_default().push(user_id);
    }
    Ok(map)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
