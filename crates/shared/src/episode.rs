use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::models::{Segment, Show};
use crate::session::Session;

// Some older listings carry a human-readable date ("July 5, 2025") in the
// datetime attribute instead of a machine one. Those episodes are skipped
// wholesale rather than guessed at.
static MONTH_COMMA_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]+ [0-9]{1,2}, [0-9]{4}").unwrap());

const BROADCAST_TIME_SELECTOR: &str = "time";
const SEGMENT_SELECTOR: &str = "article.rundown-segment";
const SLUG_SELECTOR: &str = ".rundown-segment__slug";
const TITLE_SELECTOR: &str = ".rundown-segment__title";
const AUDIO_LINK_SELECTOR: &str = ".audio-tool-download a[href]";
const DURATION_SELECTOR: &str = ".audio-module-duration";

/// Fetch an episode page and return the segments matching `topic_prefix`.
pub async fn extract_segments(
    session: &Session,
    show: &Show,
    episode_url: &str,
    topic_prefix: &str,
) -> Result<Vec<Segment>> {
    let html = session
        .fetch(episode_url)
        .await
        .with_context(|| format!("Failed to fetch episode {}", episode_url))?;

    parse_episode(&html, show, episode_url, topic_prefix)
}

/// Walk the rundown blocks of an episode page.
///
/// A missing or month-comma broadcast date skips the whole episode, and a
/// block missing its slug, title, or download link is skipped on its own;
/// both reflect real inconsistency in the source HTML and are logged, not
/// raised. A duration that is present but does not parse is a hard error.
pub fn parse_episode(
    html: &str,
    show: &Show,
    episode_url: &str,
    topic_prefix: &str,
) -> Result<Vec<Segment>> {
    let document = Html::parse_document(html);

    let time_selector = Selector::parse(BROADCAST_TIME_SELECTOR).unwrap();
    let datetime = document
        .select(&time_selector)
        .next()
        .and_then(|time| time.value().attr("datetime"));
    let Some(datetime) = datetime else {
        debug!("No broadcast date on {}; skipping episode", episode_url);
        return Ok(Vec::new());
    };

    if MONTH_COMMA_DATE.is_match(datetime) {
        debug!(
            "Non-standard broadcast date {:?} on {}; skipping episode",
            datetime, episode_url
        );
        return Ok(Vec::new());
    }

    let broadcast = parse_broadcast_date(datetime)
        .with_context(|| format!("Bad broadcast date {:?} on {}", datetime, episode_url))?;

    let segment_selector = Selector::parse(SEGMENT_SELECTOR).unwrap();
    let slug_selector = Selector::parse(SLUG_SELECTOR).unwrap();
    let title_selector = Selector::parse(TITLE_SELECTOR).unwrap();
    let audio_selector = Selector::parse(AUDIO_LINK_SELECTOR).unwrap();
    let duration_selector = Selector::parse(DURATION_SELECTOR).unwrap();

    let mut segments = Vec::new();

    for block in document.select(&segment_selector) {
        let Some(slug) = block.select(&slug_selector).next() else {
            debug!("Segment without a slug on {}; skipping", episode_url);
            continue;
        };
        let slug = text_of(&slug);
        if !slug.starts_with(topic_prefix) {
            debug!("Skipping {:?} segment on {}", slug, episode_url);
            continue;
        }

        let title = block
            .select(&title_selector)
            .next()
            .map(|el| text_of(&el))
            .unwrap_or_default();
        if title.is_empty() {
            debug!("{} segment without a title on {}; skipping", slug, episode_url);
            continue;
        }

        let Some(audio_url) = block
            .select(&audio_selector)
            .next()
            .and_then(|a| a.value().attr("href"))
        else {
            debug!("No download link for {:?} on {}; skipping", title, episode_url);
            continue;
        };

        let duration = block
            .select(&duration_selector)
            .next()
            .map(|el| text_of(&el))
            .ok_or_else(|| anyhow!("No duration for {:?} on {}", title, episode_url))?;
        let duration_secs = parse_duration(&duration)
            .with_context(|| format!("Bad duration for {:?} on {}", title, episode_url))?;

        info!("Matched {:?} ({})", title, show.name);
        segments.push(Segment {
            title: format!("{} ({})", title, show.name),
            description: format!("Source: {}", episode_url),
            pub_date: broadcast,
            audio_url: audio_url.to_string(),
            duration_secs,
        });
    }

    Ok(segments)
}

/// Broadcast dates come in a few shapes: full RFC 3339, offset without
/// colon, or a bare day taken as midnight UTC.
fn parse_broadcast_date(raw: &str) -> Result<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt);
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Ok(dt);
    }
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(day.and_time(NaiveTime::MIN).and_utc().fixed_offset());
    }
    anyhow::bail!("Unrecognized broadcast date format: {:?}", raw)
}

/// "MM:SS" to total seconds. Anything else fails the whole run.
pub fn parse_duration(raw: &str) -> Result<u32> {
    let (minutes, seconds) = raw
        .trim()
        .split_once(':')
        .ok_or_else(|| anyhow!("Duration {:?} is not MM:SS", raw))?;
    let minutes: u32 = minutes
        .parse()
        .with_context(|| format!("Bad minutes in duration {:?}", raw))?;
    let seconds: u32 = seconds
        .parse()
        .with_context(|| format!("Bad seconds in duration {:?}", raw))?;

    Ok(minutes * 60 + seconds)
}

fn text_of(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const EPISODE_URL: &str = "https://www.npr.org/programs/morning-edition/2025/07/28/";

    fn show() -> Show {
        Show::new(
            "Morning Edition",
            "https://www.npr.org/programs/morning-edition/archive",
        )
    }

    fn parse(html: &str) -> Result<Vec<Segment>> {
        parse_episode(html, &show(), EPISODE_URL, "Music")
    }

    fn rundown(date: &str, blocks: &str) -> String {
        format!(
            "<html><body><time datetime=\"{}\">date</time>{}</body></html>",
            date, blocks
        )
    }

    const MUSIC_BLOCK: &str = r#"
        <article class="rundown-segment">
          <p class="rundown-segment__slug">Music Interviews</p>
          <h3 class="rundown-segment__title"><a href="/story">A Fiddler Returns</a></h3>
          <div class="audio-tool audio-tool-download">
            <a href="https://ondemand.npr.org/fiddler.mp3">Download</a>
          </div>
          <span class="audio-module-duration">04:30</span>
        </article>
    "#;

    // ==================== Episode-level skips ====================

    #[test]
    fn test_month_comma_date_skips_episode() {
        // "July 28, 2025" is the known-unparseable listing format
        let html = rundown("July 28, 2025", MUSIC_BLOCK);
        assert!(parse(&html).unwrap().is_empty());
    }

    #[test]
    fn test_missing_broadcast_date_skips_episode() {
        let html = format!("<html><body>{}</body></html>", MUSIC_BLOCK);
        assert!(parse(&html).unwrap().is_empty());
    }

    #[test]
    fn test_unrecognized_date_format_is_fatal() {
        // Survives the month-comma check but parses as nothing we know
        let html = rundown("28/07/2025", MUSIC_BLOCK);
        assert!(parse(&html).is_err());
    }

    // ==================== Segment-level skips ====================

    #[test]
    fn test_matching_segment_is_extracted() {
        let html = rundown("2025-07-28", MUSIC_BLOCK);
        let segments = parse(&html).unwrap();
        assert_eq!(segments.len(), 1);

        let segment = &segments[0];
        assert_eq!(segment.title, "A Fiddler Returns (Morning Edition)");
        assert_eq!(segment.description, format!("Source: {}", EPISODE_URL));
        assert_eq!(segment.audio_url, "https://ondemand.npr.org/fiddler.mp3");
        assert_eq!(segment.duration_secs, 270);
        assert_eq!(
            segment.pub_date,
            "2025-07-28T00:00:00Z".parse::<DateTime<Utc>>().unwrap()
        );
    }

    #[test]
    fn test_segment_without_slug_is_skipped() {
        let blocks = format!(
            r#"<article class="rundown-segment">
                 <h3 class="rundown-segment__title">No slug here</h3>
                 <div class="audio-tool-download"><a href="https://x/a.mp3">dl</a></div>
                 <span class="audio-module-duration">01:00</span>
               </article>{}"#,
            MUSIC_BLOCK
        );
        let html = rundown("2025-07-28", &blocks);
        let segments = parse(&html).unwrap();
        // The slugless block is dropped, its sibling is unaffected
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].title, "A Fiddler Returns (Morning Edition)");
    }

    #[test]
    fn test_non_music_slug_is_skipped() {
        let blocks = format!(
            r#"<article class="rundown-segment">
                 <p class="rundown-segment__slug">Politics</p>
                 <h3 class="rundown-segment__title">Hearings Continue</h3>
                 <div class="audio-tool-download"><a href="https://x/b.mp3">dl</a></div>
                 <span class="audio-module-duration">07:10</span>
               </article>{}"#,
            MUSIC_BLOCK
        );
        let html = rundown("2025-07-28", &blocks);
        let segments = parse(&html).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].title, "A Fiddler Returns (Morning Edition)");
    }

    #[test]
    fn test_music_prefix_matches_all_music_slugs() {
        // "Music News" also starts with the topical prefix
        let blocks = r#"<article class="rundown-segment">
             <p class="rundown-segment__slug">Music News</p>
             <h3 class="rundown-segment__title">Festival Lineup Announced</h3>
             <div class="audio-tool-download"><a href="https://x/c.mp3">dl</a></div>
             <span class="audio-module-duration">02:05</span>
           </article>"#;
        let html = rundown("2025-07-28", blocks);
        let segments = parse(&html).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].duration_secs, 125);
    }

    #[test]
    fn test_segment_without_title_is_skipped() {
        let blocks = r#"<article class="rundown-segment">
             <p class="rundown-segment__slug">Music Reviews</p>
             <div class="audio-tool-download"><a href="https://x/d.mp3">dl</a></div>
             <span class="audio-module-duration">03:00</span>
           </article>"#;
        let html = rundown("2025-07-28", blocks);
        assert!(parse(&html).unwrap().is_empty());
    }

    #[test]
    fn test_segment_without_download_link_is_skipped() {
        let blocks = r#"<article class="rundown-segment">
             <p class="rundown-segment__slug">Music Reviews</p>
             <h3 class="rundown-segment__title">Stream-Only Review</h3>
             <span class="audio-module-duration">03:00</span>
           </article>"#;
        let html = rundown("2025-07-28", blocks);
        assert!(parse(&html).unwrap().is_empty());
    }

    #[test]
    fn test_missing_duration_is_fatal() {
        // The asymmetry is deliberate: structural gaps are skipped above,
        // but a music segment with no duration aborts the run
        let blocks = r#"<article class="rundown-segment">
             <p class="rundown-segment__slug">Music Interviews</p>
             <h3 class="rundown-segment__title">Untimed Interview</h3>
             <div class="audio-tool-download"><a href="https://x/e.mp3">dl</a></div>
           </article>"#;
        let html = rundown("2025-07-28", blocks);
        assert!(parse(&html).is_err());
    }

    #[test]
    fn test_malformed_duration_is_fatal() {
        let blocks = r#"<article class="rundown-segment">
             <p class="rundown-segment__slug">Music Interviews</p>
             <h3 class="rundown-segment__title">Oddly Timed Interview</h3>
             <div class="audio-tool-download"><a href="https://x/f.mp3">dl</a></div>
             <span class="audio-module-duration">four minutes</span>
           </article>"#;
        let html = rundown("2025-07-28", blocks);
        assert!(parse(&html).is_err());
    }

    // ==================== Duration parsing ====================

    #[test]
    fn test_duration_minutes_and_seconds() {
        assert_eq!(parse_duration("04:30").unwrap(), 270);
    }

    #[test]
    fn test_duration_seconds_only() {
        assert_eq!(parse_duration("00:05").unwrap(), 5);
    }

    #[test]
    fn test_duration_surrounding_whitespace() {
        assert_eq!(parse_duration("  12:00 \n").unwrap(), 720);
    }

    #[test]
    fn test_duration_without_colon_fails() {
        assert!(parse_duration("430").is_err());
    }

    #[test]
    fn test_duration_non_numeric_fails() {
        assert!(parse_duration("aa:bb").is_err());
    }

    // ==================== Broadcast date parsing ====================

    #[test]
    fn test_rfc3339_broadcast_date() {
        let dt = parse_broadcast_date("2025-07-28T06:00:00-04:00").unwrap();
        assert_eq!(dt.to_rfc2822(), "Mon, 28 Jul 2025 06:00:00 -0400");
    }

    #[test]
    fn test_bare_day_broadcast_date_is_midnight_utc() {
        let dt = parse_broadcast_date("2025-07-28").unwrap();
        assert_eq!(dt.to_rfc2822(), "Mon, 28 Jul 2025 00:00:00 +0000");
    }
}
