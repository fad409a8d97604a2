use chrono::{DateTime, FixedOffset};

/// One NPR program whose archive page gets scraped.
#[derive(Debug, Clone)]
pub struct Show {
    pub name: String,
    pub archive_url: String,
}

impl Show {
    pub fn new(name: impl Into<String>, archive_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            archive_url: archive_url.into(),
        }
    }
}

/// One music clip from an episode rundown. Held in memory for the duration
/// of a run; there is no identity beyond the fields and no deduplication.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub title: String,
    pub description: String,
    pub pub_date: DateTime<FixedOffset>,
    pub audio_url: String,
    pub duration_secs: u32,
}
