use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::config::Config;
use crate::models::Segment;

/// Channel-level placeholder artwork; the archive pages expose no per-show art.
const CHANNEL_IMAGE_URL: &str = "https://media.npr.org/chrome/npr-logo.png";
const CHANNEL_DESCRIPTION: &str = "Music segments scraped from NPR program rundowns";
const ENCLOSURE_TYPE: &str = "audio/mpeg";

/// Serialize the segments as an indented RSS 2.0 document. `now` becomes the
/// channel's pubDate and lastBuildDate; main passes `Utc::now()`.
pub fn render(segments: &[Segment], config: &Config, now: DateTime<Utc>) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    writer.write_event(Event::Start(rss))?;
    writer.write_event(Event::Start(BytesStart::new("channel")))?;

    let show_names: Vec<&str> = config.shows.iter().map(|s| s.name.as_str()).collect();
    let title = format!("Music segments from NPR's {}", show_names.join(" & "));
    let build_date = now.to_rfc2822();

    write_text_element(&mut writer, "title", &title)?;
    write_text_element(&mut writer, "description", CHANNEL_DESCRIPTION)?;
    write_text_element(&mut writer, "link", &config.base_url)?;
    write_text_element(&mut writer, "pubDate", &build_date)?;
    write_text_element(&mut writer, "lastBuildDate", &build_date)?;

    writer.write_event(Event::Start(BytesStart::new("image")))?;
    write_text_element(&mut writer, "url", CHANNEL_IMAGE_URL)?;
    write_text_element(&mut writer, "title", &title)?;
    write_text_element(&mut writer, "link", &config.base_url)?;
    writer.write_event(Event::End(BytesEnd::new("image")))?;

    for segment in segments {
        writer.write_event(Event::Start(BytesStart::new("item")))?;
        write_text_element(&mut writer, "title", &segment.title)?;
        write_text_element(&mut writer, "description", &segment.description)?;
        write_text_element(&mut writer, "pubDate", &segment.pub_date.to_rfc2822())?;

        let mut enclosure = BytesStart::new("enclosure");
        enclosure.push_attribute(("url", segment.audio_url.as_str()));
        enclosure.push_attribute(("type", ENCLOSURE_TYPE));
        enclosure.push_attribute(("length", segment.duration_secs.to_string().as_str()));
        writer.write_event(Event::Empty(enclosure))?;

        writer.write_event(Event::End(BytesEnd::new("item")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("channel")))?;
    writer.write_event(Event::End(BytesEnd::new("rss")))?;

    String::from_utf8(writer.into_inner()).context("Feed is not valid UTF-8")
}

fn write_text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
