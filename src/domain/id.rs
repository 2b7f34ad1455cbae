use std::{fmt::Display, str::FromStr};

use serde::Serialize;

/// Surrogate key of a row in the `tracks` table.
///
/// SQLite assigns it on insert and it is always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TrackId(pub i64);

#[derive(Debug, thiserror::Error)]
#[error("track id must be a positive integer")]
pub struct InvalidTrackId;

impl TrackId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for TrackId {
    type Error = InvalidTrackId;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(InvalidTrackId)
        }
    }
}

impl FromStr for TrackId {
    type Err = InvalidTrackId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.parse::<i64>().map_err(|_| InvalidTrackId)?;
        Self::try_from(raw)
    }
}

impl Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
