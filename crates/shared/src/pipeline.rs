use anyhow::Result;
use log::info;

use crate::archive;
use crate::config::Config;
use crate::episode;
use crate::models::Segment;
use crate::session::Session;

/// Walk every show in declared order, one request at a time, and collect the
/// matching segments. Any fetch or extraction error aborts the whole run;
/// there is no partial output.
pub async fn run(session: &Session, config: &Config) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();

    for show in &config.shows {
        info!("Scraping {}", show.name);
        let episodes = archive::list_episodes(session, show).await?;
        info!("Found {} episodes for {}", episodes.len(), show.name);

        for episode_url in &episodes {
            info!("Reading {}", episode_url);
            let found =
                episode::extract_segments(session, show, episode_url, &config.topic_prefix)
                    .await?;
            segments.extend(found);
        }
    }

    Ok(order_and_cap(segments, config.max_items))
}

/// Newest first; equal dates keep discovery order; at most `max` entries.
pub fn order_and_cap(mut segments: Vec<Segment>, max: usize) -> Vec<Segment> {
    segments.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));
    segments.truncate(max);
    segments
}
