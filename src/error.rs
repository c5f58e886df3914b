// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use thiserror::Error;

/// A mutation was rejected before it touched the document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid URL in field {field}: '{value}'")]
    InvalidUrl { field: &'static str, value: String },

    #[error("An episode with guid '{0}' already exists")]
    DuplicateGuid(String),
}

/// Errors raised by the feed document engine
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Failed to parse RSS feed: {0}")]
    Malformed(#[from] rss::Error),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Episode with guid '{guid}' not found")]
    EpisodeNotFound { guid: String },

    #[error("No feed loaded; generate or parse a feed first")]
    NotReady,

    #[error("Failed to render feed: {0}")]
    Render(#[source] std::io::Error),
}

impl FeedError {
    /// HTTP status a request layer should answer with for this error
    pub fn http_status(&self) -> u16 {
        match self {
            FeedError::Malformed(_) | FeedError::Validation(_) => 400,
            FeedError::EpisodeNotFound { .. } => 404,
            FeedError::NotReady | FeedError::Render(_) => 500,
        }
    }
}

/// Errors that can occur when loading feed text or field files
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to fetch feed from {url}: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to read file {path}: {source}")]
    FileReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Feed from {origin} is not valid UTF-8")]
    InvalidUtf8 { origin: String },

    #[error("Failed to parse fields JSON in {path}: {source}")]
    JsonParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors that can occur while loading the configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),
}
