// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::Utc;
use url::Url;
use uuid::Uuid;

use crate::config::FeedDefaults;
use crate::error::{FeedError, ValidationError};

use super::model::{
    ChannelField, ChannelFields, ChannelInfo, Enclosure, EpisodeFields, EpisodeRecord,
};

/// A show and its episodes, in publish order (most recent last)
#[derive(Debug, Clone, PartialEq)]
pub struct FeedDocument {
    channel: ChannelInfo,
    episodes: Vec<EpisodeRecord>,
}

impl FeedDocument {
    /// Assemble a document from already-validated parts. Later episodes whose
    /// guid repeats an earlier one are dropped.
    pub(crate) fn from_parts(channel: ChannelInfo, episodes: Vec<EpisodeRecord>) -> Self {
        let mut document = Self {
            channel,
            episodes: Vec::with_capacity(episodes.len()),
        };
        for episode in episodes {
            if document.contains(&episode.guid) {
                tracing::warn!(guid = %episode.guid, "Skipping episode with duplicate guid");
                continue;
            }
            document.episodes.push(episode);
        }
        document
    }

    /// Create a new feed with no episodes
    pub fn generate(fields: ChannelFields) -> Result<Self, FeedError> {
        Self::generate_with(fields, &FeedDefaults::default())
    }

    /// Create a new feed, filling unset optional fields from `defaults`
    pub fn generate_with(fields: ChannelFields, defaults: &FeedDefaults) -> Result<Self, FeedError> {
        let channel = ChannelInfo {
            title: require(fields.title, "title")?,
            description: require(fields.description, "description")?,
            language: require(fields.language, "language")?,
            category: require(fields.category, "category")?,
            image_url: require_url(fields.image_url, "image_url")?,
            owner_name: require(fields.owner_name, "owner_name")?,
            owner_email: non_empty(fields.owner_email)
                .unwrap_or_else(|| defaults.owner_email.clone()),
            summary: non_empty(fields.summary),
            link: non_empty(fields.link),
            copyright: non_empty(fields.copyright),
            author: non_empty(fields.author),
            explicit: fields.explicit.unwrap_or(false),
            podcast_type: fields.podcast_type.unwrap_or_default(),
            feed_url: non_empty(fields.feed_url),
        };

        tracing::info!(title = %channel.title, "Generated new feed");
        Ok(Self {
            channel,
            episodes: Vec::new(),
        })
    }

    pub fn channel(&self) -> &ChannelInfo {
        &self.channel
    }

    pub fn episodes(&self) -> &[EpisodeRecord] {
        &self.episodes
    }

    pub fn episode_count(&self) -> usize {
        self.episodes.len()
    }

    /// The most recently appended episode
    pub fn latest_episode(&self) -> Option<&EpisodeRecord> {
        self.episodes.last()
    }

    pub fn episode(&self, guid: &str) -> Option<&EpisodeRecord> {
        self.episodes.iter().find(|e| e.guid == guid)
    }

    fn contains(&self, guid: &str) -> bool {
        self.episode(guid).is_some()
    }

    fn position(&self, guid: &str) -> Result<usize, FeedError> {
        self.episodes
            .iter()
            .position(|e| e.guid == guid)
            .ok_or_else(|| FeedError::EpisodeNotFound {
                guid: guid.to_string(),
            })
    }

    /// Replace a single channel attribute
    pub fn update_channel_field(&mut self, field: ChannelField) {
        tracing::debug!(field = field.name(), "Updating channel field");
        field.apply(&mut self.channel);
    }

    /// Append a new episode
    pub fn add_episode(&mut self, fields: EpisodeFields) -> Result<&EpisodeRecord, FeedError> {
        self.add_episode_with(fields, &FeedDefaults::default())
    }

    /// Append a new episode, filling unset optional fields from `defaults`.
    ///
    /// A guid that is already in use is rejected rather than overwritten.
    pub fn add_episode_with(
        &mut self,
        fields: EpisodeFields,
        defaults: &FeedDefaults,
    ) -> Result<&EpisodeRecord, FeedError> {
        let title = require(fields.title, "title")?;
        let description = require(fields.description, "description")?;
        let audio_url = require_url(fields.audio_url, "audio_url")?;

        let guid = non_empty(fields.guid).unwrap_or_else(|| Uuid::new_v4().to_string());
        if self.contains(&guid) {
            return Err(ValidationError::DuplicateGuid(guid).into());
        }

        let record = EpisodeRecord {
            guid,
            title,
            description,
            summary: non_empty(fields.summary),
            link: non_empty(fields.link),
            creator: non_empty(fields.creator),
            enclosure: Enclosure {
                url: audio_url,
                length: fields.file_size.unwrap_or(0),
                mime_type: non_empty(fields.mime_type)
                    .unwrap_or_else(|| defaults.mime_type.clone()),
            },
            pub_date: Some(
                fields
                    .pub_date
                    .unwrap_or_else(|| Utc::now().fixed_offset()),
            ),
            duration: non_empty(fields.duration),
            image_url: non_empty(fields.image_url),
            season: fields.season,
            episode_number: fields.episode_number,
            episode_type: fields.episode_type.unwrap_or_default(),
            explicit: fields.explicit.unwrap_or(false),
        };

        tracing::info!(guid = %record.guid, title = %record.title, "Adding episode");
        self.episodes.push(record);
        Ok(&self.episodes[self.episodes.len() - 1])
    }

    /// Overlay `fields` onto the episode identified by `guid`.
    ///
    /// Only the supplied fields are validated. Stored values are kept as
    /// they are, even when they came from a feed that would not pass the
    /// checks for new episodes. The episode list is rebuilt and swapped in
    /// once the patch has been accepted.
    pub fn update_episode(
        &mut self,
        guid: &str,
        fields: EpisodeFields,
    ) -> Result<&EpisodeRecord, FeedError> {
        let index = self.position(guid)?;
        validate_patch(&fields)?;
        let merged = fields.merge_into(&self.episodes[index]);

        if merged.guid != guid && self.contains(&merged.guid) {
            return Err(ValidationError::DuplicateGuid(merged.guid).into());
        }

        let mut merged = Some(merged);
        let rebuilt: Vec<EpisodeRecord> = self
            .episodes
            .iter()
            .enumerate()
            .filter_map(|(i, episode)| {
                if i == index {
                    merged.take()
                } else {
                    Some(episode.clone())
                }
            })
            .collect();
        self.episodes = rebuilt;

        tracing::info!(guid = %guid, "Updated episode");
        Ok(&self.episodes[index])
    }

    /// Remove the episode identified by `guid`, keeping the others in order
    pub fn delete_episode(&mut self, guid: &str) -> Result<EpisodeRecord, FeedError> {
        let index = self.position(guid)?;
        let removed = self.episodes.remove(index);
        tracing::info!(guid = %guid, remaining = self.episodes.len(), "Deleted episode");
        Ok(removed)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn require(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    non_empty(value).ok_or(ValidationError::MissingField(field))
}

fn require_url(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    let value = require(value, field)?;
    check_url(&value, field)?;
    Ok(value)
}

fn check_url(value: &str, field: &'static str) -> Result<(), ValidationError> {
    Url::parse(value).map_err(|_| ValidationError::InvalidUrl {
        field,
        value: value.to_string(),
    })?;
    Ok(())
}

/// Supplied required fields must not be blank, and a new audio URL must be absolute
fn validate_patch(fields: &EpisodeFields) -> Result<(), ValidationError> {
    let required = [
        (&fields.guid, "guid"),
        (&fields.title, "title"),
        (&fields.description, "description"),
        (&fields.audio_url, "audio_url"),
    ];
    for (value, field) in required {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            return Err(ValidationError::MissingField(field));
        }
    }

    match fields.audio_url.as_deref() {
        Some(url) => check_url(url, "audio_url"),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn channel_fields() -> ChannelFields {
        ChannelFields {
            title: Some("Test Podcast".to_string()),
            description: Some("A show about tests".to_string()),
            language: Some("en".to_string()),
            category: Some("Technology".to_string()),
            image_url: Some("https://example.com/cover.jpg".to_string()),
            owner_name: Some("Owner".to_string()),
            ..Default::default()
        }
    }

    fn episode_fields(guid: &str) -> EpisodeFields {
        EpisodeFields {
            guid: Some(guid.to_string()),
            title: Some(format!("Episode {guid}")),
            description: Some(format!("<p>About {guid}</p>")),
            audio_url: Some(format!("https://example.com/{guid}.mp3")),
            file_size: Some(2048),
            ..Default::default()
        }
    }

    fn document_with(guids: &[&str]) -> FeedDocument {
        let mut doc = FeedDocument::generate(channel_fields()).unwrap();
        for guid in guids {
            doc.add_episode(episode_fields(guid)).unwrap();
        }
        doc
    }

    #[test]
    fn generate_applies_defaults() {
        let doc = FeedDocument::generate(channel_fields()).unwrap();
        let channel = doc.channel();

        assert_eq!(channel.owner_email, "noreply@example.com");
        assert!(!channel.explicit);
        assert_eq!(channel.podcast_type, crate::feed::PodcastType::Episodic);
        assert_eq!(doc.episode_count(), 0);
    }

    #[test]
    fn generate_requires_cover_art() {
        let fields = ChannelFields {
            image_url: None,
            ..channel_fields()
        };
        let err = FeedDocument::generate(fields).unwrap_err();
        assert!(matches!(
            err,
            FeedError::Validation(ValidationError::MissingField("image_url"))
        ));
    }

    #[test]
    fn generate_uses_configured_owner_email() {
        let defaults = FeedDefaults {
            owner_email: "feeds@example.org".to_string(),
            ..Default::default()
        };
        let doc = FeedDocument::generate_with(channel_fields(), &defaults).unwrap();
        assert_eq!(doc.channel().owner_email, "feeds@example.org");
    }

    #[test]
    fn add_episode_fills_defaults() {
        let mut doc = document_with(&[]);
        let record = doc
            .add_episode(EpisodeFields {
                title: Some("T".to_string()),
                description: Some("D".to_string()),
                audio_url: Some("https://example.com/a.mp3".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert!(Uuid::parse_str(&record.guid).is_ok());
        assert!(record.pub_date.is_some());
        assert_eq!(record.enclosure.mime_type, "audio/mpeg");
        assert_eq!(record.enclosure.length, 0);
        assert_eq!(record.episode_type, crate::feed::EpisodeType::Full);
    }

    #[test]
    fn add_episode_names_missing_field() {
        let mut doc = document_with(&[]);
        let err = doc
            .add_episode(EpisodeFields {
                title: Some("T".to_string()),
                ..Default::default()
            })
            .unwrap_err();

        assert!(matches!(
            err,
            FeedError::Validation(ValidationError::MissingField("description"))
        ));
        assert_eq!(doc.episode_count(), 0);
    }

    #[test]
    fn add_episode_rejects_relative_audio_url() {
        let mut doc = document_with(&[]);
        let fields = EpisodeFields {
            audio_url: Some("audio/a.mp3".to_string()),
            ..episode_fields("a")
        };
        assert!(matches!(
            doc.add_episode(fields),
            Err(FeedError::Validation(ValidationError::InvalidUrl { .. }))
        ));
    }

    #[test]
    fn add_episode_rejects_duplicate_guid() {
        let mut doc = document_with(&["a"]);
        let err = doc.add_episode(episode_fields("a")).unwrap_err();

        assert!(matches!(
            err,
            FeedError::Validation(ValidationError::DuplicateGuid(ref g)) if g == "a"
        ));
        assert_eq!(doc.episode_count(), 1);
    }

    #[test]
    fn add_episode_keeps_supplied_pub_date() {
        let mut doc = document_with(&[]);
        let date = DateTime::parse_from_rfc2822("Mon, 01 Jan 2024 12:00:00 +0000").unwrap();
        let record = doc
            .add_episode(EpisodeFields {
                pub_date: Some(date),
                ..episode_fields("a")
            })
            .unwrap();
        assert_eq!(record.pub_date, Some(date));
    }

    #[test]
    fn update_episode_merges_fields() {
        let mut doc = document_with(&["a", "b"]);
        let updated = doc
            .update_episode(
                "a",
                EpisodeFields {
                    title: Some("New".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.title, "New");
        assert_eq!(updated.description, "<p>About a</p>");
        assert_eq!(updated.enclosure.url, "https://example.com/a.mp3");
        let guids: Vec<_> = doc.episodes().iter().map(|e| e.guid.as_str()).collect();
        assert_eq!(guids, ["a", "b"]);
    }

    #[test]
    fn update_missing_episode_is_not_found() {
        let mut doc = document_with(&["a"]);
        let err = doc
            .update_episode("zzz", EpisodeFields::default())
            .unwrap_err();
        assert!(matches!(err, FeedError::EpisodeNotFound { ref guid } if guid == "zzz"));
    }

    #[test]
    fn update_rejecting_change_leaves_document_untouched() {
        let mut doc = document_with(&["a", "b"]);
        let before = doc.clone();

        let err = doc.update_episode(
            "a",
            EpisodeFields {
                guid: Some("b".to_string()),
                title: Some("Clash".to_string()),
                ..Default::default()
            },
        );

        assert!(matches!(
            err,
            Err(FeedError::Validation(ValidationError::DuplicateGuid(_)))
        ));
        assert_eq!(doc, before);
    }

    #[test]
    fn update_rejects_blank_or_relative_supplied_values() {
        let mut doc = document_with(&["a"]);
        let before = doc.clone();

        let blank = doc.update_episode(
            "a",
            EpisodeFields {
                description: Some("  ".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(
            blank,
            Err(FeedError::Validation(ValidationError::MissingField("description")))
        ));

        let relative = doc.update_episode(
            "a",
            EpisodeFields {
                audio_url: Some("/media/a.mp3".to_string()),
                ..Default::default()
            },
        );
        assert!(matches!(
            relative,
            Err(FeedError::Validation(ValidationError::InvalidUrl { field: "audio_url", .. }))
        ));
        assert_eq!(doc, before);
    }

    #[test]
    fn update_accepts_episodes_parsed_from_legacy_feeds() {
        let mut doc = crate::feed::parse_feed(
            r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Legacy</title>
    <description>Old show</description>
    <item>
      <title>No notes</title>
      <guid>old-1</guid>
      <enclosure url="https://example.com/old.mp3" length="1" type="audio/mpeg"/>
    </item>
    <item>
      <title>Relative audio</title>
      <description>Hosted next to the feed</description>
      <guid>rel-1</guid>
      <enclosure url="/media/rel.mp3" length="1" type="audio/mpeg"/>
    </item>
  </channel>
</rss>"#,
        )
        .unwrap();

        let renamed = doc
            .update_episode(
                "old-1",
                EpisodeFields {
                    title: Some("Renamed".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(renamed.title, "Renamed");
        assert_eq!(renamed.description, "");

        let renamed = doc
            .update_episode(
                "rel-1",
                EpisodeFields {
                    title: Some("Renamed too".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(renamed.title, "Renamed too");
        assert_eq!(renamed.enclosure.url, "/media/rel.mp3");
    }

    #[test]
    fn delete_episode_keeps_order() {
        let mut doc = document_with(&["a", "b", "c"]);
        let removed = doc.delete_episode("b").unwrap();

        assert_eq!(removed.guid, "b");
        let guids: Vec<_> = doc.episodes().iter().map(|e| e.guid.as_str()).collect();
        assert_eq!(guids, ["a", "c"]);
        assert!(matches!(
            doc.delete_episode("b"),
            Err(FeedError::EpisodeNotFound { .. })
        ));
    }

    #[test]
    fn latest_episode_is_last_appended() {
        let doc = document_with(&["a", "b"]);
        assert_eq!(doc.latest_episode().map(|e| e.guid.as_str()), Some("b"));
        assert!(document_with(&[]).latest_episode().is_none());
    }

    #[test]
    fn from_parts_drops_duplicate_guids() {
        let doc = document_with(&["a", "b"]);
        let mut episodes = doc.episodes().to_vec();
        episodes.push(episodes[0].clone());

        let rebuilt = FeedDocument::from_parts(doc.channel().clone(), episodes);
        assert_eq!(rebuilt.episode_count(), 2);
    }
}
