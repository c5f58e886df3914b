// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The entry point callers use to create and edit a feed.
//!
//! A [`FeedManager`] starts out uninitialized and becomes live once a feed
//! is generated or parsed. Every mutating call re-renders the complete feed
//! text, which the caller is responsible for persisting.

use crate::config::FeedDefaults;
use crate::error::FeedError;
use crate::feed::{
    ChannelField, ChannelFields, ChannelInfo, EpisodeFields, EpisodeRecord, FeedDocument,
    parse_feed_with, render_feed,
};

#[derive(Debug, Clone)]
enum FeedState {
    Uninitialized,
    Live { document: FeedDocument, xml: String },
}

/// Owns one feed document and its latest rendering
#[derive(Debug, Clone)]
pub struct FeedManager {
    state: FeedState,
    defaults: FeedDefaults,
}

impl Default for FeedManager {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedManager {
    /// Create a manager with no feed loaded
    pub fn new() -> Self {
        Self::with_defaults(FeedDefaults::default())
    }

    pub fn with_defaults(defaults: FeedDefaults) -> Self {
        Self {
            state: FeedState::Uninitialized,
            defaults,
        }
    }

    /// Load previously published feed text
    pub fn from_xml(text: &str) -> Result<Self, FeedError> {
        let mut manager = Self::new();
        manager.load(text)?;
        Ok(manager)
    }

    /// Replace the current state with a parsed feed
    pub fn load(&mut self, text: &str) -> Result<&str, FeedError> {
        let document = parse_feed_with(text, &self.defaults)?;
        tracing::info!(
            title = %document.channel().title,
            episodes = document.episode_count(),
            "Loaded existing feed"
        );
        self.commit(document)
    }

    pub fn is_live(&self) -> bool {
        matches!(self.state, FeedState::Live { .. })
    }

    /// Start a brand new feed. Any previously loaded feed is discarded.
    pub fn generate(&mut self, fields: ChannelFields) -> Result<&str, FeedError> {
        let document = FeedDocument::generate_with(fields, &self.defaults)?;
        self.commit(document)
    }

    /// The feed text produced by the last successful operation
    pub fn xml(&self) -> Result<&str, FeedError> {
        match &self.state {
            FeedState::Live { xml, .. } => Ok(xml),
            FeedState::Uninitialized => Err(FeedError::NotReady),
        }
    }

    pub fn channel(&self) -> Result<&ChannelInfo, FeedError> {
        Ok(self.document()?.channel())
    }

    pub fn episodes(&self) -> Result<&[EpisodeRecord], FeedError> {
        Ok(self.document()?.episodes())
    }

    pub fn episode(&self, guid: &str) -> Result<&EpisodeRecord, FeedError> {
        self.document()?
            .episode(guid)
            .ok_or_else(|| FeedError::EpisodeNotFound {
                guid: guid.to_string(),
            })
    }

    pub fn episode_count(&self) -> Result<usize, FeedError> {
        Ok(self.document()?.episode_count())
    }

    pub fn latest_episode(&self) -> Result<Option<&EpisodeRecord>, FeedError> {
        Ok(self.document()?.latest_episode())
    }

    /// Append an episode and re-render. Returns the stored record.
    pub fn add_episode(&mut self, fields: EpisodeFields) -> Result<EpisodeRecord, FeedError> {
        let defaults = self.defaults.clone();
        self.mutate(|document| {
            document
                .add_episode_with(fields, &defaults)
                .map(Clone::clone)
        })
    }

    /// Merge `fields` into the episode identified by `guid` and re-render
    pub fn update_episode(
        &mut self,
        guid: &str,
        fields: EpisodeFields,
    ) -> Result<EpisodeRecord, FeedError> {
        self.mutate(|document| document.update_episode(guid, fields).map(Clone::clone))
    }

    /// Remove the episode identified by `guid` and re-render
    pub fn delete_episode(&mut self, guid: &str) -> Result<EpisodeRecord, FeedError> {
        self.mutate(|document| document.delete_episode(guid))
    }

    /// Replace one channel attribute and re-render
    pub fn update_channel_field(&mut self, field: ChannelField) -> Result<&str, FeedError> {
        self.mutate(|document| {
            document.update_channel_field(field);
            Ok(())
        })?;
        self.xml()
    }

    pub fn update_title(&mut self, title: impl Into<String>) -> Result<&str, FeedError> {
        self.update_channel_field(ChannelField::Title(title.into()))
    }

    pub fn update_description(&mut self, description: impl Into<String>) -> Result<&str, FeedError> {
        self.update_channel_field(ChannelField::Description(description.into()))
    }

    pub fn update_category(&mut self, category: impl Into<String>) -> Result<&str, FeedError> {
        self.update_channel_field(ChannelField::Category(category.into()))
    }

    fn document(&self) -> Result<&FeedDocument, FeedError> {
        match &self.state {
            FeedState::Live { document, .. } => Ok(document),
            FeedState::Uninitialized => Err(FeedError::NotReady),
        }
    }

    /// Apply `op` to a copy of the document, render it, and only then make
    /// it current. A failure at any step leaves the previous state intact.
    fn mutate<T>(
        &mut self,
        op: impl FnOnce(&mut FeedDocument) -> Result<T, FeedError>,
    ) -> Result<T, FeedError> {
        let mut document = self.document()?.clone();
        let output = op(&mut document)?;
        self.commit(document)?;
        Ok(output)
    }

    fn commit(&mut self, document: FeedDocument) -> Result<&str, FeedError> {
        let xml = render_feed(&document)?;
        tracing::debug!(episodes = document.episode_count(), bytes = xml.len(), "Rendered feed");
        self.state = FeedState::Live { document, xml };
        self.xml()
    }
}
