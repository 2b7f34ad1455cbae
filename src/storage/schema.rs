use rusqlite::Connection;

pub mod tables {
    pub const TRACKS: &str = "tracks";

    #[cfg(test)]
    pub const ALL_TABLES: &[&str] = &[TRACKS];
}

pub mod columns {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const BPM: &str = "bpm";
    pub const TRACK_KEY: &str = "track_key";
    pub const TAGS: &str = "tags";

    pub const ALL_COLUMNS: &[&str] = &[ID, NAME, DESCRIPTION, BPM, TRACK_KEY, TAGS];
}

pub use columns::*;
pub use tables::*;

/// Drops `tracks`, recreates it and inserts the sample track.
pub const SCRIPT: &str = include_str!("../../schema.sql");

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS tracks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    bpm REAL,
    track_key TEXT,
    tags TEXT
);
"#;

/// Creates missing tables, keeps existing rows
pub fn init(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA)
}

/// Runs [`SCRIPT`]. Whatever `tracks` held before is gone afterwards.
pub fn reset(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCRIPT)
}
