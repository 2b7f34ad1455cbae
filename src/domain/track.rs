use super::id::TrackId;

/// A row of the `tracks` table
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub description: Option<String>,
    /// tempo in beats per minute
    pub bpm: Option<f64>,
    /// musical key label, e.g. "A Major"
    pub track_key: Option<String>,
    /// comma-separated free text, stored as given
    pub tags: Option<String>,
}

impl Track {
    /// Splits the raw tag string on commas.
    ///
    /// Whitespace around each tag is trimmed and empty entries are skipped.
    /// Duplicates are kept, the column enforces no structure.
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .as_deref()
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Values for a track that has not been assigned an id yet
#[derive(Debug, Clone, Default)]
pub struct NewTrack {
    pub name: String,
    pub description: Option<String>,
    pub bpm: Option<f64>,
    pub track_key: Option<String>,
    pub tags: Option<String>,
}

/// Changes applied to an existing track.
///
/// `name` and `description` always overwrite the stored values,
/// the remaining fields only when they are `Some`.
#[derive(Debug, Clone, Default)]
pub struct TrackUpdate {
    pub name: String,
    pub description: String,
    pub bpm: Option<f64>,
    pub track_key: Option<String>,
    pub tags: Option<String>,
}
