// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Renders a [`FeedDocument`] as RSS 2.0 with iTunes and Dublin Core tags.
//!
//! Rendering is a pure function of the document: the whole feed is written
//! from scratch on every call, and the same document always produces the
//! same bytes. Text content goes through [`codec::wrap`] so each field gets
//! its literal-block or escaped treatment as it is written.

use std::borrow::Cow;
use std::io;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::codec::{self, Field};
use crate::error::FeedError;

use super::document::FeedDocument;
use super::model::{ChannelInfo, EpisodeRecord, explicit_str};

pub const ITUNES_NAMESPACE: &str = "http://www.itunes.com/dtds/podcast-1.0.dtd";
pub const DUBLIN_CORE_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";
pub const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";
pub const CONTENT_NAMESPACE: &str = "http://purl.org/rss/1.0/modules/content/";

/// Render the complete feed text for `document`
pub fn render_feed(document: &FeedDocument) -> Result<String, FeedError> {
    let mut out = FeedWriter::new();

    out.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    out.start_with(
        "rss",
        &[
            ("version", "2.0"),
            ("xmlns:itunes", ITUNES_NAMESPACE),
            ("xmlns:dc", DUBLIN_CORE_NAMESPACE),
            ("xmlns:atom", ATOM_NAMESPACE),
            ("xmlns:content", CONTENT_NAMESPACE),
        ],
    )?;
    out.start("channel")?;

    write_channel(&mut out, document)?;
    for episode in document.episodes() {
        write_episode(&mut out, episode)?;
    }

    out.end("channel")?;
    out.end("rss")?;
    out.finish()
}

fn write_channel(out: &mut FeedWriter, document: &FeedDocument) -> Result<(), FeedError> {
    let channel: &ChannelInfo = document.channel();

    out.field("title", Field::ChannelTitle, &channel.title)?;
    out.optional_field("link", Field::ChannelLink, channel.link.as_deref())?;
    out.field("description", Field::ChannelDescription, &channel.description)?;
    if let Some(feed_url) = channel.feed_url.as_deref() {
        out.empty(
            "atom:link",
            &[
                ("href", feed_url),
                ("rel", "self"),
                ("type", "application/rss+xml"),
            ],
        )?;
    }
    out.optional_field("language", Field::Language, non_empty(&channel.language))?;
    out.optional_field("copyright", Field::Copyright, channel.copyright.as_deref())?;

    // Derived from the episodes rather than the clock so output stays stable
    let last_build = document
        .episodes()
        .iter()
        .filter_map(|e| e.pub_date)
        .max()
        .map(|date| date.to_rfc2822());
    out.optional_field("lastBuildDate", Field::LastBuildDate, last_build.as_deref())?;

    out.field("category", Field::Category, &channel.category)?;
    out.optional_field("itunes:author", Field::ItunesAuthor, channel.author.as_deref())?;
    out.field("itunes:summary", Field::ItunesSummary, channel.summary())?;
    out.field("itunes:type", Field::ItunesType, channel.podcast_type.as_str())?;

    out.start("itunes:owner")?;
    out.field("itunes:name", Field::OwnerName, &channel.owner_name)?;
    out.field("itunes:email", Field::OwnerEmail, &channel.owner_email)?;
    out.end("itunes:owner")?;

    if let Some(image_url) = non_empty(&channel.image_url) {
        out.empty("itunes:image", &[("href", image_url)])?;
    }
    out.empty("itunes:category", &[("text", channel.category.as_str())])?;
    out.field(
        "itunes:explicit",
        Field::ItunesExplicit,
        explicit_str(channel.explicit),
    )?;

    Ok(())
}

fn write_episode(out: &mut FeedWriter, episode: &EpisodeRecord) -> Result<(), FeedError> {
    out.start("item")?;

    out.field("title", Field::EpisodeTitle, &episode.title)?;
    out.optional_field("link", Field::EpisodeLink, episode.link.as_deref())?;
    out.field("description", Field::EpisodeDescription, &episode.description)?;

    out.start_with("guid", &[("isPermaLink", "false")])?;
    out.text(Field::Guid, &episode.guid)?;
    out.end("guid")?;

    out.optional_field("dc:creator", Field::Creator, episode.creator.as_deref())?;

    let length = episode.enclosure.length.to_string();
    out.empty(
        "enclosure",
        &[
            ("url", episode.enclosure.url.as_str()),
            ("length", length.as_str()),
            ("type", episode.enclosure.mime_type.as_str()),
        ],
    )?;

    let pub_date = episode.pub_date.map(|date| date.to_rfc2822());
    out.optional_field("pubDate", Field::PubDate, pub_date.as_deref())?;

    match episode.duration.as_deref() {
        Some(duration) if is_valid_duration(duration) => {
            out.field("itunes:duration", Field::Duration, duration)?;
        }
        Some(duration) => {
            tracing::warn!(guid = %episode.guid, duration = %duration, "Dropping malformed itunes:duration");
        }
        None => {}
    }

    out.field(
        "itunes:episodeType",
        Field::EpisodeType,
        episode.episode_type.as_str(),
    )?;
    if let Some(image_url) = episode.image_url.as_deref() {
        out.empty("itunes:image", &[("href", image_url)])?;
    }
    if let Some(season) = episode.season {
        out.field("itunes:season", Field::Season, &season.to_string())?;
    }
    if let Some(number) = episode.episode_number {
        out.field("itunes:episode", Field::EpisodeNumber, &number.to_string())?;
    }
    out.field(
        "itunes:explicit",
        Field::ItunesExplicit,
        explicit_str(episode.explicit),
    )?;
    out.field("itunes:summary", Field::ItunesSummary, episode.summary())?;

    out.end("item")
}

/// Accepts `[H]H:MM:SS`, `M[M]:SS` or a plain number of seconds
pub fn is_valid_duration(duration: &str) -> bool {
    fn all_digits(s: &str) -> bool {
        !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
    }

    let parts: Vec<&str> = duration.split(':').collect();

    match parts.as_slice() {
        [seconds] => all_digits(seconds),
        [minutes, seconds] => {
            all_digits(minutes) && minutes.len() <= 2 && all_digits(seconds) && seconds.len() == 2
        }
        [hours, minutes, seconds] => {
            all_digits(hours)
                && hours.len() <= 2
                && all_digits(minutes)
                && minutes.len() == 2
                && all_digits(seconds)
                && seconds.len() == 2
        }
        _ => false,
    }
}

fn non_empty(value: &str) -> Option<&str> {
    Some(value).filter(|v| !v.trim().is_empty())
}

/// Thin wrapper over the quick-xml writer that routes text through the codec
struct FeedWriter {
    writer: Writer<Vec<u8>>,
}

impl FeedWriter {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    fn event(&mut self, event: Event<'_>) -> Result<(), FeedError> {
        self.writer
            .write_event(event)
            .map_err(|e| FeedError::Render(io::Error::other(e)))
    }

    fn start(&mut self, name: &str) -> Result<(), FeedError> {
        self.event(Event::Start(BytesStart::new(name)))
    }

    fn start_with(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), FeedError> {
        self.element(name, attrs, false)
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), FeedError> {
        self.element(name, attrs, true)
    }

    /// Attribute values are escaped by quick-xml; only invalid characters are removed here
    fn element(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
        empty: bool,
    ) -> Result<(), FeedError> {
        let values: Vec<Cow<'_, str>> = attrs
            .iter()
            .map(|(_, value)| codec::strip_invalid_chars(value))
            .collect();
        let element = BytesStart::new(name).with_attributes(
            attrs
                .iter()
                .zip(&values)
                .map(|((key, _), value)| (*key, value.as_ref())),
        );

        if empty {
            self.event(Event::Empty(element))
        } else {
            self.event(Event::Start(element))
        }
    }

    fn end(&mut self, name: &str) -> Result<(), FeedError> {
        self.event(Event::End(BytesEnd::new(name)))
    }

    /// Write already-encoded text content for `field`
    fn text(&mut self, field: Field, raw: &str) -> Result<(), FeedError> {
        let encoded = codec::wrap(field, raw);
        self.event(Event::Text(BytesText::from_escaped(encoded)))
    }

    fn field(&mut self, name: &str, field: Field, raw: &str) -> Result<(), FeedError> {
        self.start(name)?;
        self.text(field, raw)?;
        self.end(name)
    }

    fn optional_field(
        &mut self,
        name: &str,
        field: Field,
        raw: Option<&str>,
    ) -> Result<(), FeedError> {
        match raw {
            Some(raw) => self.field(name, field, raw),
            None => Ok(()),
        }
    }

    fn finish(self) -> Result<String, FeedError> {
        let mut bytes = self.writer.into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes)
            .map_err(|e| FeedError::Render(io::Error::new(io::ErrorKind::InvalidData, e)))
    }
}
