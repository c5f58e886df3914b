// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{DateTime, FixedOffset, NaiveDateTime};

use crate::config::FeedDefaults;
use crate::error::FeedError;

use super::document::FeedDocument;
use super::model::{
    ChannelInfo, Enclosure, EpisodeRecord, EpisodeType, PodcastType, parse_explicit,
};

/// Parse feed text into a document using the built-in defaults
pub fn parse_feed(text: &str) -> Result<FeedDocument, FeedError> {
    parse_feed_with(text, &FeedDefaults::default())
}

/// Parse feed text into a document.
///
/// Items without an enclosure URL are skipped, as are items whose guid
/// repeats an earlier item.
pub fn parse_feed_with(text: &str, defaults: &FeedDefaults) -> Result<FeedDocument, FeedError> {
    let channel = rss::Channel::read_from(text.as_bytes())?;

    let info = parse_channel(&channel, defaults);

    let episodes: Vec<EpisodeRecord> = channel
        .items()
        .iter()
        .filter_map(|item| parse_episode(item, defaults))
        .collect();

    tracing::debug!(
        title = %info.title,
        items = channel.items().len(),
        episodes = episodes.len(),
        "Parsed feed"
    );

    Ok(FeedDocument::from_parts(info, episodes))
}

fn parse_channel(channel: &rss::Channel, defaults: &FeedDefaults) -> ChannelInfo {
    let itunes = channel.itunes_ext();

    let itunes_summary = itunes.and_then(|ext| non_empty(ext.summary()));
    let description = non_empty(Some(channel.description()))
        .or_else(|| itunes_summary.clone())
        .or_else(|| itunes.and_then(|ext| non_empty(ext.subtitle())))
        .unwrap_or_default();
    // Only keep a separate summary when it says something the description doesn't
    let summary = itunes_summary.filter(|s| *s != description);

    let category = itunes
        .and_then(|ext| ext.categories().first())
        .and_then(|c| non_empty(Some(c.text())))
        .or_else(|| {
            channel
                .categories()
                .first()
                .and_then(|c| non_empty(Some(c.name())))
        })
        .unwrap_or_else(|| defaults.category.clone());

    let image_url = itunes
        .and_then(|ext| non_empty(ext.image()))
        .or_else(|| channel.image().and_then(|img| non_empty(Some(img.url()))))
        .unwrap_or_default();

    let author = itunes.and_then(|ext| non_empty(ext.author()));
    let owner = itunes.and_then(|ext| ext.owner());
    let owner_name = owner
        .and_then(|o| non_empty(o.name()))
        .or_else(|| author.clone())
        .unwrap_or_default();
    let owner_email = owner
        .and_then(|o| non_empty(o.email()))
        .unwrap_or_else(|| defaults.owner_email.clone());

    let link = non_empty(Some(channel.link())).or_else(|| atom_link(channel, "alternate"));

    ChannelInfo {
        title: channel.title().trim().to_string(),
        description,
        summary,
        link,
        language: non_empty(channel.language()).unwrap_or_else(|| defaults.language.clone()),
        copyright: non_empty(channel.copyright()),
        author,
        category,
        image_url,
        owner_name,
        owner_email,
        explicit: itunes
            .and_then(|ext| ext.explicit())
            .is_some_and(parse_explicit),
        podcast_type: itunes
            .and_then(|ext| ext.r#type())
            .and_then(PodcastType::parse)
            .unwrap_or_default(),
        feed_url: atom_link(channel, "self"),
    }
}

/// Find the href of a channel-level `atom:link` with the given `rel`
fn atom_link(channel: &rss::Channel, rel: &str) -> Option<String> {
    channel
        .extensions()
        .get("atom")
        .and_then(|elements| elements.get("link"))
        .into_iter()
        .flatten()
        .find(|link| {
            // rel defaults to "alternate" in Atom
            link.attrs().get("rel").map_or("alternate", String::as_str) == rel
        })
        .and_then(|link| non_empty(link.attrs().get("href").map(String::as_str)))
}

fn parse_episode(item: &rss::Item, defaults: &FeedDefaults) -> Option<EpisodeRecord> {
    let title = item
        .title()
        .map(|t| t.trim().to_string())
        .unwrap_or_else(|| "Untitled Episode".to_string());

    let Some(enclosure) = item.enclosure().filter(|e| !e.url().trim().is_empty()) else {
        tracing::warn!(title = %title, "Skipping item without an enclosure");
        return None;
    };

    let link = non_empty(item.link());
    let guid = item
        .guid()
        .and_then(|g| non_empty(Some(g.value())))
        .or_else(|| link.clone())
        .unwrap_or_else(|| enclosure.url().to_string());

    let itunes = item.itunes_ext();
    let itunes_summary = itunes.and_then(|ext| non_empty(ext.summary()));

    let description = non_empty(item.content())
        .or_else(|| non_empty(item.description()))
        .or_else(|| itunes_summary.clone())
        .unwrap_or_default();

    let creator = item
        .dublin_core_ext()
        .and_then(|dc| dc.creators().first())
        .and_then(|c| non_empty(Some(c.as_str())))
        .or_else(|| itunes.and_then(|ext| non_empty(ext.author())))
        .or_else(|| non_empty(item.author()));

    let pub_date = item.pub_date().and_then(|date_str| {
        let parsed = parse_date(date_str);
        if parsed.is_none() {
            tracing::warn!(guid = %guid, date = %date_str, "Ignoring unparseable pubDate");
        }
        parsed
    });

    let summary = itunes_summary.filter(|summary| *summary != description);

    Some(EpisodeRecord {
        title,
        description,
        summary,
        link,
        creator,
        enclosure: Enclosure {
            url: enclosure.url().trim().to_string(),
            length: enclosure.length().trim().parse().unwrap_or(0),
            mime_type: non_empty(Some(enclosure.mime_type()))
                .unwrap_or_else(|| defaults.mime_type.clone()),
        },
        pub_date,
        duration: itunes.and_then(|ext| non_empty(ext.duration())),
        image_url: itunes.and_then(|ext| non_empty(ext.image())),
        season: itunes.and_then(|ext| parse_number(ext.season())),
        episode_number: itunes.and_then(|ext| parse_number(ext.episode())),
        episode_type: itunes
            .and_then(|ext| ext.episode_type())
            .and_then(EpisodeType::parse)
            .unwrap_or_default(),
        explicit: itunes
            .and_then(|ext| ext.explicit())
            .is_some_and(parse_explicit),
        guid,
    })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Non-numeric values degrade to `None` rather than failing the feed
fn parse_number(value: Option<&str>) -> Option<u32> {
    value.and_then(|v| v.trim().parse().ok())
}

/// Parse an RSS date, falling back to formats that don't strictly conform
/// to RFC 2822
pub(crate) fn parse_date(date_str: &str) -> Option<DateTime<FixedOffset>> {
    let date_str = date_str.trim();
    if let Ok(dt) = DateTime::parse_from_rfc2822(date_str) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        return Some(dt);
    }

    let formats = [
        "%a, %d %b %Y %H:%M:%S %z",
        "%d %b %Y %H:%M:%S %z",
        "%Y-%m-%d %H:%M:%S %z",
    ];
    for format in formats {
        if let Ok(dt) = DateTime::parse_from_str(date_str, format) {
            return Some(dt);
        }
    }

    // Last resort: no zone at all, assume UTC
    NaiveDateTime::parse_from_str(date_str, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc().fixed_offset())
}
