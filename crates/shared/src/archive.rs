use anyhow::{Context, Result};
use scraper::{Html, Selector};
use url::Url;

use crate::models::Show;
use crate::session::Session;

/// Episode links on NPR archive pages are the headline anchors.
const EPISODE_LINK_SELECTOR: &str = "h2 > a[href]";

/// Fetch a show's archive page and return the episode URLs it links to.
/// Only the first archive page is consulted; no pagination.
pub async fn list_episodes(session: &Session, show: &Show) -> Result<Vec<String>> {
    let html = session
        .fetch(&show.archive_url)
        .await
        .with_context(|| format!("Failed to fetch archive for {}", show.name))?;
    let base = Url::parse(&show.archive_url)
        .with_context(|| format!("Invalid archive URL for {}", show.name))?;

    Ok(parse_archive(&html, &base))
}

/// Pull every headline anchor out of an archive page, resolved against the
/// page URL. Anchors whose href does not resolve are dropped.
pub fn parse_archive(html: &str, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(EPISODE_LINK_SELECTOR).unwrap();

    document
        .select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(|href| base.join(href).ok())
        .map(|url| url.to_string())
        .collect()
}
