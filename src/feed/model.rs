// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Show-level `itunes:type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PodcastType {
    #[default]
    Episodic,
    Serial,
}

impl PodcastType {
    pub fn as_str(self) -> &'static str {
        match self {
            PodcastType::Episodic => "episodic",
            PodcastType::Serial => "serial",
        }
    }

    /// Lenient parse; unknown values yield `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "episodic" => Some(PodcastType::Episodic),
            "serial" => Some(PodcastType::Serial),
            _ => None,
        }
    }
}

/// Episode-level `itunes:episodeType`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeType {
    #[default]
    Full,
    Trailer,
    Bonus,
}

impl EpisodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            EpisodeType::Full => "full",
            EpisodeType::Trailer => "trailer",
            EpisodeType::Bonus => "bonus",
        }
    }

    /// Lenient parse; unknown values yield `None`
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "full" => Some(EpisodeType::Full),
            "trailer" => Some(EpisodeType::Trailer),
            "bonus" => Some(EpisodeType::Bonus),
            _ => None,
        }
    }
}

impl fmt::Display for PodcastType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for EpisodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interpret an `itunes:explicit` value. Accepts both the old `yes`/`no`
/// spelling and Apple's current `true`/`false`.
pub fn parse_explicit(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "yes" | "true" | "explicit"
    )
}

/// Render an explicit flag the way the feed has always published it
pub fn explicit_str(explicit: bool) -> &'static str {
    if explicit { "yes" } else { "no" }
}

/// Show-level metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub title: String,
    pub description: String,
    /// `itunes:summary` override; the description is used when unset
    pub summary: Option<String>,
    pub link: Option<String>,
    pub language: String,
    pub copyright: Option<String>,
    pub author: Option<String>,
    pub category: String,
    pub image_url: String,
    pub owner_name: String,
    pub owner_email: String,
    pub explicit: bool,
    pub podcast_type: PodcastType,
    /// Public URL of the feed itself, emitted as `atom:link rel="self"`
    pub feed_url: Option<String>,
}

impl ChannelInfo {
    pub fn summary(&self) -> &str {
        self.summary.as_deref().unwrap_or(&self.description)
    }
}

/// The audio file attached to an episode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enclosure {
    pub url: String,
    pub length: u64,
    pub mime_type: String,
}

/// A single published episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub guid: String,
    pub title: String,
    pub description: String,
    /// Plain-text `itunes:summary`; the description is used when unset
    pub summary: Option<String>,
    pub link: Option<String>,
    pub creator: Option<String>,
    pub enclosure: Enclosure,
    pub pub_date: Option<DateTime<FixedOffset>>,
    pub duration: Option<String>,
    pub image_url: Option<String>,
    pub season: Option<u32>,
    pub episode_number: Option<u32>,
    pub episode_type: EpisodeType,
    pub explicit: bool,
}

impl EpisodeRecord {
    pub fn summary(&self) -> &str {
        self.summary.as_deref().unwrap_or(&self.description)
    }
}

/// Channel attributes supplied when generating a new feed.
///
/// Required on generation: title, description, language, category,
/// image_url and owner_name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub link: Option<String>,
    pub language: Option<String>,
    pub copyright: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
    pub explicit: Option<bool>,
    pub podcast_type: Option<PodcastType>,
    pub feed_url: Option<String>,
}

/// One channel attribute and its replacement value
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelField {
    Title(String),
    Description(String),
    Summary(Option<String>),
    Link(Option<String>),
    Language(String),
    Copyright(Option<String>),
    Author(Option<String>),
    Category(String),
    ImageUrl(String),
    OwnerName(String),
    OwnerEmail(String),
    Explicit(bool),
    PodcastType(PodcastType),
    FeedUrl(Option<String>),
}

impl ChannelField {
    pub fn name(&self) -> &'static str {
        match self {
            ChannelField::Title(_) => "title",
            ChannelField::Description(_) => "description",
            ChannelField::Summary(_) => "summary",
            ChannelField::Link(_) => "link",
            ChannelField::Language(_) => "language",
            ChannelField::Copyright(_) => "copyright",
            ChannelField::Author(_) => "author",
            ChannelField::Category(_) => "category",
            ChannelField::ImageUrl(_) => "image_url",
            ChannelField::OwnerName(_) => "owner_name",
            ChannelField::OwnerEmail(_) => "owner_email",
            ChannelField::Explicit(_) => "explicit",
            ChannelField::PodcastType(_) => "podcast_type",
            ChannelField::FeedUrl(_) => "feed_url",
        }
    }

    /// Apply this value to a channel
    pub fn apply(self, channel: &mut ChannelInfo) {
        match self {
            ChannelField::Title(v) => channel.title = v,
            ChannelField::Description(v) => channel.description = v,
            ChannelField::Summary(v) => channel.summary = v,
            ChannelField::Link(v) => channel.link = v,
            ChannelField::Language(v) => channel.language = v,
            ChannelField::Copyright(v) => channel.copyright = v,
            ChannelField::Author(v) => channel.author = v,
            ChannelField::Category(v) => channel.category = v,
            ChannelField::ImageUrl(v) => channel.image_url = v,
            ChannelField::OwnerName(v) => channel.owner_name = v,
            ChannelField::OwnerEmail(v) => channel.owner_email = v,
            ChannelField::Explicit(v) => channel.explicit = v,
            ChannelField::PodcastType(v) => channel.podcast_type = v,
            ChannelField::FeedUrl(v) => channel.feed_url = v,
        }
    }
}

/// Episode attributes for adding or patching an episode.
///
/// When adding, title, description and audio_url are required. When
/// updating, every supplied field replaces the stored one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeFields {
    pub guid: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub link: Option<String>,
    pub creator: Option<String>,
    pub audio_url: Option<String>,
    pub file_size: Option<u64>,
    pub mime_type: Option<String>,
    pub pub_date: Option<DateTime<FixedOffset>>,
    pub duration: Option<String>,
    pub image_url: Option<String>,
    pub season: Option<u32>,
    pub episode_number: Option<u32>,
    pub episode_type: Option<EpisodeType>,
    pub explicit: Option<bool>,
}

impl EpisodeFields {
    /// Overlay the supplied fields onto an existing record
    pub fn merge_into(self, record: &EpisodeRecord) -> EpisodeRecord {
        EpisodeRecord {
            guid: self.guid.unwrap_or_else(|| record.guid.clone()),
            title: self.title.unwrap_or_else(|| record.title.clone()),
            description: self
                .description
                .unwrap_or_else(|| record.description.clone()),
            summary: self.summary.or_else(|| record.summary.clone()),
            link: self.link.or_else(|| record.link.clone()),
            creator: self.creator.or_else(|| record.creator.clone()),
            enclosure: Enclosure {
                url: self
                    .audio_url
                    .unwrap_or_else(|| record.enclosure.url.clone()),
                length: self.file_size.unwrap_or(record.enclosure.length),
                mime_type: self
                    .mime_type
                    .unwrap_or_else(|| record.enclosure.mime_type.clone()),
            },
            pub_date: self.pub_date.or(record.pub_date),
            duration: self.duration.or_else(|| record.duration.clone()),
            image_url: self.image_url.or_else(|| record.image_url.clone()),
            season: self.season.or(record.season),
            episode_number: self.episode_number.or(record.episode_number),
            episode_type: self.episode_type.unwrap_or(record.episode_type),
            explicit: self.explicit.unwrap_or(record.explicit),
        }
    }
}
