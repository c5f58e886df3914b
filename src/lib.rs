pub mod codec;
pub mod config;
pub mod error;
pub mod feed;
pub mod http;
pub mod manager;

// Re-export main types for convenience
pub use codec::{Field, Treatment, wrap};
pub use config::{Config, FeedDefaults};
pub use error::{ConfigError, FeedError, SourceError, ValidationError};
pub use feed::{
    ChannelField, ChannelFields, ChannelInfo, Enclosure, EpisodeFields, EpisodeRecord,
    EpisodeType, FeedDocument, PodcastType, load_feed_text, parse_feed, render_feed,
};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use manager::FeedManager;
