use log::{debug, info};
use rusqlite::{
    Connection, OptionalExtension, Row, params,
    types::{Type, Value},
};

use crate::{
    config,
    domain::{
        id::TrackId,
        track::{NewTrack, Track, TrackUpdate},
    },
    storage::{
        db,
        error::StorageError,
        schema::{self, columns, tables},
    },
};

use columns::*;
use tables::*;

/// Main structure that implements all storage logic
pub struct Storage {
    pub(crate) db: rusqlite::Connection,
}

/// selects [`ALL_COLUMNS`] in order, see [`track_from_row`]
fn select_tracks() -> String {
    format!("SELECT {} FROM {TRACKS}", ALL_COLUMNS.join(", "))
}

fn track_from_row(row: &Row) -> rusqlite::Result<Track> {
    let id = TrackId::try_from(row.get::<_, i64>(0)?)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(e)))?;

    Ok(Track {
        id,
        name: row.get(1)?,
        description: row.get(2)?,
        bpm: bpm_from_value(row.get(3)?),
        track_key: row.get(4)?,
        tags: row.get(5)?,
    })
}

/// REAL affinity keeps unparseable text as TEXT, such values read as no tempo
fn bpm_from_value(value: Value) -> Option<f64> {
    match value {
        Value::Real(bpm) => Some(bpm),
        Value::Integer(bpm) => Some(bpm as f64),
        Value::Text(text) => {
            let bpm = text.trim().parse::<f64>().ok();
            if bpm.is_none() {
                log::warn!("Column {BPM} of {TRACKS} holds non-numeric text {text:?}");
            }
            bpm
        }
        Value::Null | Value::Blob(_) => None,
    }
}

fn find_track(conn: &Connection, id: TrackId) -> Result<Option<Track>, rusqlite::Error> {
    conn.query_row(
        &format!("{} WHERE {ID} = ?1", select_tracks()),
        params![id.get()],
        track_from_row,
    )
    .optional()
}

fn track_exists(conn: &Connection, id: TrackId) -> Result<bool, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {TRACKS} WHERE {ID} = ?1)"),
        params![id.get()],
        |row| row.get(0),
    )
}

impl Storage {
    /// when called, opens a data base connection
    pub fn new(db_config: &config::Database) -> Result<Self, StorageError> {
        let db = db::open(db_config)?;
        Ok(Self::from_existing_conn(db))
    }

    pub fn from_existing_conn(db: rusqlite::Connection) -> Self {
        Self { db }
    }

    /// Drops and recreates `tracks`, then inserts the sample track.
    ///
    /// Runs in one transaction, so a failure leaves the previous table untouched.
    pub fn reset_and_seed(&mut self) -> Result<Track, StorageError> {
        let tx = self.db.transaction()?;

        schema::reset(&tx)?;
        let id = TrackId::try_from(tx.last_insert_rowid())?;
        let track = find_track(&tx, id)?.ok_or(StorageError::TrackNotFound(id))?;

        tx.commit()?;
        info!("Reset {TRACKS} table, seeded track {} ({})", track.id, track.name);
        Ok(track)
    }

    /// All tracks ordered by id
    pub fn list_tracks(&self) -> Result<Vec<Track>, StorageError> {
        let mut stmt = self
            .db
            .prepare(&format!("{} ORDER BY {ID}", select_tracks()))?;

        let tracks = stmt
            .query_map([], track_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tracks)
    }

    pub fn get_track(&self, id: TrackId) -> Result<Track, StorageError> {
        find_track(&self.db, id)?.ok_or(StorageError::TrackNotFound(id))
    }

    /// inserts a track, returns the id the database assigned to it
    pub fn add_track(&mut self, track: &NewTrack) -> Result<TrackId, StorageError> {
        let tx = self.db.transaction()?;

        tx.execute(
            &format!(
                "INSERT INTO {TRACKS} ({NAME}, {DESCRIPTION}, {BPM}, {TRACK_KEY}, {TAGS})
                 VALUES (?1, ?2, ?3, ?4, ?5)"
            ),
            params![
                track.name,
                track.description,
                track.bpm,
                track.track_key,
                track.tags
            ],
        )?;
        let id = TrackId::try_from(tx.last_insert_rowid())?;

        tx.commit()?;
        debug!("Added track {id} ({})", track.name);
        Ok(id)
    }

    pub fn update_track(
        &mut self,
        id: TrackId,
        update: &TrackUpdate,
    ) -> Result<Track, StorageError> {
        let tx = self.db.transaction()?;

        if !track_exists(&tx, id)? {
            return Err(StorageError::TrackNotFound(id));
        }

        tx.execute(
            &format!(
                "UPDATE {TRACKS} SET
                    {NAME} = ?1,
                    {DESCRIPTION} = ?2,
                    {BPM} = COALESCE(?3, {BPM}),
                    {TRACK_KEY} = COALESCE(?4, {TRACK_KEY}),
                    {TAGS} = COALESCE(?5, {TAGS})
                 WHERE {ID} = ?6"
            ),
            params![
                update.name,
                update.description,
                update.bpm,
                update.track_key,
                update.tags,
                id.get()
            ],
        )?;
        let track = find_track(&tx, id)?.ok_or(StorageError::TrackNotFound(id))?;

        tx.commit()?;
        debug!("Updated track {id}");
        Ok(track)
    }

    pub fn delete_track(&mut self, id: TrackId) -> Result<(), StorageError> {
        let tx = self.db.transaction()?;

        if !track_exists(&tx, id)? {
            return Err(StorageError::TrackNotFound(id));
        }

        tx.execute(
            &format!("DELETE FROM {TRACKS} WHERE {ID} = ?1"),
            params![id.get()],
        )?;

        tx.commit()?;
        debug!("Deleted track {id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::{Connection, params};

    use crate::{
        domain::{
            id::TrackId,
            track::{NewTrack, TrackUpdate},
        },
        storage::{
            error::StorageError,
            operations::Storage,
            schema::{self, *},
        },
    };

    fn setup_storage() -> anyhow::Result<Storage> {
        let conn = Connection::open_in_memory()?;
        schema::init(&conn)?;
        Ok(Storage::from_existing_conn(conn))
    }

    fn new_track(name: &str) -> NewTrack {
        NewTrack {
            name: name.to_string(),
            description: Some(format!("{name} description")),
            ..Default::default()
        }
    }

    #[test]
    fn test_reset_and_seed_returns_sample_track() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;

        let track = storage.reset_and_seed()?;

        assert!(track.id.get() > 0);
        assert_eq!(track.name, "One More Time");
        assert_eq!(
            track.description.as_deref(),
            Some("A classic house track by Daft Punk")
        );
        assert_eq!(track.bpm, Some(123.5));
        assert_eq!(track.track_key.as_deref(), Some("A Major"));
        assert_eq!(
            track.tags.as_deref(),
            Some("House, French House, Vocal House, Electronic")
        );

        assert_eq!(storage.list_tracks()?, vec![track]);

        Ok(())
    }

    #[test]
    fn test_reset_and_seed_is_idempotent() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;

        storage.reset_and_seed()?;
        storage.add_track(&new_track("Aerodynamic"))?;
        storage.add_track(&new_track("Digital Love"))?;
        assert_eq!(storage.list_tracks()?.len(), 3);

        let seeded = storage.reset_and_seed()?;

        let tracks = storage.list_tracks()?;
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0], seeded);
        assert_eq!(tracks[0].name, "One More Time");

        Ok(())
    }

    #[test]
    fn test_add_and_get_track() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;

        let id = storage.add_track(&NewTrack {
            name: "Around the World".to_string(),
            description: None,
            bpm: Some(121.0),
            track_key: Some("E Minor".to_string()),
            tags: Some("House, Electronic".to_string()),
        })?;

        let track = storage.get_track(id)?;
        assert_eq!(track.id, id);
        assert_eq!(track.name, "Around the World");
        assert_eq!(track.description, None);
        assert_eq!(track.bpm, Some(121.0));
        assert_eq!(track.track_key.as_deref(), Some("E Minor"));
        assert_eq!(track.tag_list(), vec!["House", "Electronic"]);

        Ok(())
    }

    #[test]
    fn test_ids_are_unique_and_increasing() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;

        let first = storage.add_track(&new_track("a"))?;
        let second = storage.add_track(&new_track("b"))?;
        storage.delete_track(second)?;
        let third = storage.add_track(&new_track("c"))?;

        assert!(first.get() > 0);
        assert!(second.get() > first.get());
        // AUTOINCREMENT never hands out a deleted id again
        assert!(third.get() > second.get());

        Ok(())
    }

    #[test]
    fn test_list_tracks_ordered_by_id() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;
        assert!(storage.list_tracks()?.is_empty());

        let ids = ["x", "y", "z"]
            .into_iter()
            .map(|name| storage.add_track(&new_track(name)))
            .collect::<Result<Vec<_>, _>>()?;

        let listed = storage
            .list_tracks()?
            .into_iter()
            .map(|t| t.id)
            .collect::<Vec<_>>();
        assert_eq!(listed, ids);

        Ok(())
    }

    #[test]
    fn test_get_missing_track() -> anyhow::Result<()> {
        let storage = setup_storage()?;

        let result = storage.get_track(TrackId(7));
        assert!(matches!(result, Err(StorageError::TrackNotFound(TrackId(7)))));

        Ok(())
    }

    #[test]
    fn test_update_track_keeps_unset_optionals() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;
        let seeded = storage.reset_and_seed()?;

        let updated = storage.update_track(
            seeded.id,
            &TrackUpdate {
                name: "One More Time (Radio Edit)".to_string(),
                description: "Shorter".to_string(),
                bpm: None,
                track_key: None,
                tags: Some("House".to_string()),
            },
        )?;

        assert_eq!(updated.id, seeded.id);
        assert_eq!(updated.name, "One More Time (Radio Edit)");
        assert_eq!(updated.description.as_deref(), Some("Shorter"));
        assert_eq!(updated.bpm, seeded.bpm);
        assert_eq!(updated.track_key, seeded.track_key);
        assert_eq!(updated.tags.as_deref(), Some("House"));
        assert_eq!(storage.get_track(seeded.id)?, updated);

        Ok(())
    }

    #[test]
    fn test_update_missing_track() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;

        let result = storage.update_track(
            TrackId(3),
            &TrackUpdate {
                name: "n".to_string(),
                description: "d".to_string(),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(StorageError::TrackNotFound(_))));
        assert!(storage.list_tracks()?.is_empty());

        Ok(())
    }

    #[test]
    fn test_delete_track() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;
        let keep = storage.add_track(&new_track("keep"))?;
        let removed = storage.add_track(&new_track("drop"))?;

        storage.delete_track(removed)?;

        let remaining = storage.list_tracks()?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, keep);

        let again = storage.delete_track(removed);
        assert!(matches!(again, Err(StorageError::TrackNotFound(id)) if id == removed));

        Ok(())
    }

    #[test]
    fn test_null_name_insert_fails() -> anyhow::Result<()> {
        let storage = setup_storage()?;

        let result = storage.db.execute(
            &format!("INSERT INTO {TRACKS} ({NAME}) VALUES (?1)"),
            params![Option::<String>::None],
        );
        assert!(result.is_err());

        Ok(())
    }

    #[test]
    fn test_non_numeric_bpm_reads_as_missing() -> anyhow::Result<()> {
        let mut storage = setup_storage()?;
        let seeded = storage.reset_and_seed()?;

        storage.db.execute(
            &format!("INSERT INTO {TRACKS} ({NAME}, {BPM}) VALUES (?1, ?2)"),
            params!["Legacy", "fast"],
        )?;
        storage.db.execute(
            &format!("INSERT INTO {TRACKS} ({NAME}, {BPM}) VALUES (?1, ?2)"),
            params!["Integer tempo", 128],
        )?;

        let tracks = storage.list_tracks()?;
        assert_eq!(tracks.len(), 3);
        assert_eq!(tracks[0], seeded);
        assert_eq!(tracks[1].name, "Legacy");
        assert_eq!(tracks[1].bpm, None);
        assert_eq!(tracks[2].bpm, Some(128.0));

        Ok(())
    }

    #[test]
    fn test_non_positive_stored_id_is_rejected() -> anyhow::Result<()> {
        let storage = setup_storage()?;

        storage.db.execute(
            &format!("INSERT INTO {TRACKS} ({ID}, {NAME}) VALUES (?1, ?2)"),
            params![0, "Zero"],
        )?;

        let result = storage.list_tracks();
        assert!(matches!(
            result,
            Err(StorageError::Database(
                rusqlite::Error::FromSqlConversionFailure(0, _, _)
            ))
        ));

        Ok(())
    }
}
