use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            role        TEXT NOT NULL DEFAULT 'member',
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS events (
            id                  TEXT PRIMARY KEY,
            event_name          TEXT NOT NULL,
            event_description   TEXT NOT NULL DEFAULT '',
            event_date          TEXT,
            event_time          TEXT,
            event_hours         REAL NOT NULL,
            event_location      TEXT NOT NULL DEFAULT '',
            event_lat           REAL NOT NULL,
            event_long          REAL NOT NULL,
            event_limit         INTEGER NOT NULL,
            check_in_window     INTEGER NOT NULL DEFAULT 0,
            check_in_radius     REAL NOT NULL,
            is_hidden           INTEGER NOT NULL DEFAULT 0,
            created_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_events_date
            ON events(event_date, event_time);

        -- rowid order is RSVP order
        CREATE TABLE IF NOT EXISTS event_rsvps (
            event_id    TEXT NOT NULL REFERENCES events(id) ON DELETE CASCADE,
            user_id     TEXT NOT NULL REFERENCES users(id),
            rsvped_at   TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (event_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS event_attendance (
            event_id        TEXT NOT NULL REFERENCES events(id) ON DELETE CASCADE,
            user_id         TEXT NOT NULL REFERENCES users(id),
            latitude        REAL NOT NULL,
            longitude       REAL NOT NULL,
            accuracy        REAL,
            checked_in_at   TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (event_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS announcements (
            id          TEXT PRIMARY KEY,
            title       TEXT NOT NULL,
            body        TEXT NOT NULL,
            author_id   TEXT NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_announcements_created
            ON announcements(created_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
