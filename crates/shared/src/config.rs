use crate::models::Show;

/// Scrape settings, built once in main and passed down explicitly. Nothing
/// here is read from the environment or from disk.
#[derive(Debug, Clone)]
pub struct Config {
    pub shows: Vec<Show>,
    /// Only segments whose rundown slug starts with this are kept.
    pub topic_prefix: String,
    /// Feed holds at most this many segments across all shows.
    pub max_items: usize,
    pub base_url: String,
}

impl Config {
    /// The four NPR news magazines that carry music segments.
    pub fn npr() -> Self {
        Self {
            shows: vec![
                Show::new(
                    "Morning Edition",
                    "https://www.npr.org/programs/morning-edition/archive",
                ),
                Show::new(
                    "All Things Considered",
                    "https://www.npr.org/programs/all-things-considered/archive",
                ),
                Show::new(
                    "Weekend Edition Saturday",
                    "https://www.npr.org/programs/weekend-edition-saturday/archive",
                ),
                Show::new(
                    "Weekend Edition Sunday",
                    "https://www.npr.org/programs/weekend-edition-sunday/archive",
                ),
            ],
            topic_prefix: "Music".to_string(),
            max_items: 50,
            base_url: "https://www.npr.org".to_string(),
        }
    }
}
