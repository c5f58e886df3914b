mod document;
mod fetch;
mod model;
mod parse;
mod render;

pub use document::FeedDocument;
pub use fetch::{
    fetch_feed_text, is_url, load_feed_text, read_feed_file, read_fields_json, write_feed_file,
};
pub use model::{
    ChannelField, ChannelFields, ChannelInfo, Enclosure, EpisodeFields, EpisodeRecord,
    EpisodeType, PodcastType,
};
pub use parse::{parse_feed, parse_feed_with};
pub use render::{is_valid_duration, render_feed};
