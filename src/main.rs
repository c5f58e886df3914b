use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, FixedOffset};
use clap::{Args as ClapArgs, Parser, Subcommand};
use colored::Colorize;

use podforge::feed::{read_fields_json, write_feed_file};
use podforge::{
    ChannelField, ChannelFields, Config, EpisodeFields, EpisodeType, FeedManager, PodcastType,
    ReqwestClient, load_feed_text,
};

/// Create and edit podcast RSS feeds
#[derive(Parser, Debug)]
#[command(name = "podforge")]
#[command(about = "Create and edit podcast RSS feeds")]
#[command(version)]
struct Args {
    /// Path to a TOML config file with feed defaults
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write the resulting feed to this file instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a new feed with no episodes
    Generate {
        #[command(flatten)]
        channel: ChannelArgs,

        /// JSON file with channel fields; flags take precedence
        #[arg(long)]
        fields: Option<PathBuf>,
    },

    /// Append an episode to an existing feed
    AddEpisode {
        /// RSS feed URL or path to local RSS file
        feed: String,

        #[command(flatten)]
        episode: EpisodeArgs,

        /// JSON file with episode fields; flags take precedence
        #[arg(long)]
        fields: Option<PathBuf>,
    },

    /// Change fields of an existing episode
    UpdateEpisode {
        /// RSS feed URL or path to local RSS file
        feed: String,

        /// Guid of the episode to change
        #[arg(id = "target_guid", value_name = "GUID")]
        guid: String,

        #[command(flatten)]
        episode: EpisodeArgs,

        /// JSON file with episode fields; flags take precedence
        #[arg(long)]
        fields: Option<PathBuf>,
    },

    /// Remove an episode
    DeleteEpisode {
        /// RSS feed URL or path to local RSS file
        feed: String,

        /// Guid of the episode to remove
        guid: String,
    },

    /// Change show-level fields
    SetChannel {
        /// RSS feed URL or path to local RSS file
        feed: String,

        #[command(flatten)]
        channel: ChannelArgs,
    },

    /// List the episodes of a feed
    List {
        /// RSS feed URL or path to local RSS file
        feed: String,

        /// Print episode records as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(ClapArgs, Debug, Default)]
struct ChannelArgs {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// Plain-text itunes:summary, if it should differ from the description
    #[arg(long)]
    summary: Option<String>,
    /// Show website
    #[arg(long)]
    link: Option<String>,
    #[arg(long)]
    language: Option<String>,
    #[arg(long)]
    copyright: Option<String>,
    #[arg(long)]
    author: Option<String>,
    #[arg(long)]
    category: Option<String>,
    /// Cover art URL
    #[arg(long)]
    image_url: Option<String>,
    #[arg(long)]
    owner_name: Option<String>,
    #[arg(long)]
    owner_email: Option<String>,
    #[arg(long)]
    explicit: Option<bool>,
    /// episodic or serial
    #[arg(long, value_parser = parse_podcast_type)]
    podcast_type: Option<PodcastType>,
    /// Public URL of this feed
    #[arg(long)]
    feed_url: Option<String>,
}

impl ChannelArgs {
    fn into_fields(self, base: ChannelFields) -> ChannelFields {
        ChannelFields {
            title: self.title.or(base.title),
            description: self.description.or(base.description),
            summary: self.summary.or(base.summary),
            link: self.link.or(base.link),
            language: self.language.or(base.language),
            copyright: self.copyright.or(base.copyright),
            author: self.author.or(base.author),
            category: self.category.or(base.category),
            image_url: self.image_url.or(base.image_url),
            owner_name: self.owner_name.or(base.owner_name),
            owner_email: self.owner_email.or(base.owner_email),
            explicit: self.explicit.or(base.explicit),
            podcast_type: self.podcast_type.or(base.podcast_type),
            feed_url: self.feed_url.or(base.feed_url),
        }
    }

    fn into_updates(self) -> Vec<ChannelField> {
        let mut updates = Vec::new();
        if let Some(v) = self.title {
            updates.push(ChannelField::Title(v));
        }
        if let Some(v) = self.description {
            updates.push(ChannelField::Description(v));
        }
        if let Some(v) = self.summary {
            updates.push(ChannelField::Summary(Some(v)));
        }
        if let Some(v) = self.link {
            updates.push(ChannelField::Link(Some(v)));
        }
        if let Some(v) = self.language {
            updates.push(ChannelField::Language(v));
        }
        if let Some(v) = self.copyright {
            updates.push(ChannelField::Copyright(Some(v)));
        }
        if let Some(v) = self.author {
            updates.push(ChannelField::Author(Some(v)));
        }
        if let Some(v) = self.category {
            updates.push(ChannelField::Category(v));
        }
        if let Some(v) = self.image_url {
            updates.push(ChannelField::ImageUrl(v));
        }
        if let Some(v) = self.owner_name {
            updates.push(ChannelField::OwnerName(v));
        }
        if let Some(v) = self.owner_email {
            updates.push(ChannelField::OwnerEmail(v));
        }
        if let Some(v) = self.explicit {
            updates.push(ChannelField::Explicit(v));
        }
        if let Some(v) = self.podcast_type {
            updates.push(ChannelField::PodcastType(v));
        }
        if let Some(v) = self.feed_url {
            updates.push(ChannelField::FeedUrl(Some(v)));
        }
        updates
    }
}

#[derive(ClapArgs, Debug, Default)]
struct EpisodeArgs {
    /// Stable episode id (generated when adding without one)
    #[arg(long)]
    guid: Option<String>,
    #[arg(long)]
    title: Option<String>,
    /// Show notes; HTML is kept as-is
    #[arg(long)]
    description: Option<String>,
    /// Plain-text itunes:summary
    #[arg(long)]
    summary: Option<String>,
    #[arg(long)]
    link: Option<String>,
    #[arg(long)]
    creator: Option<String>,
    #[arg(long)]
    audio_url: Option<String>,
    /// Audio file size in bytes
    #[arg(long)]
    file_size: Option<u64>,
    #[arg(long)]
    mime_type: Option<String>,
    /// Publish time, RFC 2822 or RFC 3339
    #[arg(long, value_parser = parse_pub_date)]
    pub_date: Option<DateTime<FixedOffset>>,
    /// HH:MM:SS, MM:SS or seconds
    #[arg(long)]
    duration: Option<String>,
    /// Episode artwork URL
    #[arg(long)]
    image_url: Option<String>,
    #[arg(long)]
    season: Option<u32>,
    #[arg(long)]
    episode_number: Option<u32>,
    /// full, trailer or bonus
    #[arg(long, value_parser = parse_episode_type)]
    episode_type: Option<EpisodeType>,
    #[arg(long)]
    explicit: Option<bool>,
}

impl EpisodeArgs {
    fn into_fields(self, base: EpisodeFields) -> EpisodeFields {
        EpisodeFields {
            guid: self.guid.or(base.guid),
            title: self.title.or(base.title),
            description: self.description.or(base.description),
            summary: self.summary.or(base.summary),
            link: self.link.or(base.link),
            creator: self.creator.or(base.creator),
            audio_url: self.audio_url.or(base.audio_url),
            file_size: self.file_size.or(base.file_size),
            mime_type: self.mime_type.or(base.mime_type),
            pub_date: self.pub_date.or(base.pub_date),
            duration: self.duration.or(base.duration),
            image_url: self.image_url.or(base.image_url),
            season: self.season.or(base.season),
            episode_number: self.episode_number.or(base.episode_number),
            episode_type: self.episode_type.or(base.episode_type),
            explicit: self.explicit.or(base.explicit),
        }
    }
}

fn parse_podcast_type(value: &str) -> Result<PodcastType, String> {
    PodcastType::parse(value).ok_or_else(|| format!("expected episodic or serial, got '{value}'"))
}

fn parse_episode_type(value: &str) -> Result<EpisodeType, String> {
    EpisodeType::parse(value)
        .ok_or_else(|| format!("expected full, trailer or bonus, got '{value}'"))
}

fn parse_pub_date(value: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .map_err(|e| format!("invalid date '{value}': {e}"))
}

fn load_fields<T: serde::de::DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    match path {
        Some(path) => Ok(read_fields_json(path)?),
        None => Ok(T::default()),
    }
}

async fn load_manager(client: &ReqwestClient, feed: &str, config: &Config) -> Result<FeedManager> {
    let text = load_feed_text(client, feed)
        .await
        .with_context(|| format!("Failed to load feed from {feed}"))?;
    let mut manager = FeedManager::with_defaults(config.defaults.clone());
    manager
        .load(&text)
        .with_context(|| format!("Failed to parse feed from {feed}"))?;
    Ok(manager)
}

fn emit(manager: &FeedManager, output: Option<&Path>) -> Result<()> {
    let xml = manager.xml()?;
    match output {
        Some(path) => {
            write_feed_file(path, xml)?;
            eprintln!(
                "{} {} ({} episodes)",
                "Wrote".green().bold(),
                path.display().to_string().cyan(),
                manager.episode_count()?
            );
        }
        None => print!("{xml}"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path).context("Failed to load config")?,
        None => Config::default(),
    };
    let client = ReqwestClient::new();
    let output = args.output.as_deref();

    match args.command {
        Command::Generate { channel, fields } => {
            let fields = channel.into_fields(load_fields(fields.as_deref())?);
            let mut manager = FeedManager::with_defaults(config.defaults.clone());
            manager.generate(fields).context("Failed to generate feed")?;
            emit(&manager, output)?;
        }

        Command::AddEpisode {
            feed,
            episode,
            fields,
        } => {
            let mut manager = load_manager(&client, &feed, &config).await?;
            let fields = episode.into_fields(load_fields(fields.as_deref())?);
            let record = manager
                .add_episode(fields)
                .context("Failed to add episode")?;
            eprintln!(
                "{} {} {}",
                "Added".green().bold(),
                record.title.bold(),
                format!("({})", record.guid).dimmed()
            );
            emit(&manager, output)?;
        }

        Command::UpdateEpisode {
            feed,
            guid,
            episode,
            fields,
        } => {
            let mut manager = load_manager(&client, &feed, &config).await?;
            let fields = episode.into_fields(load_fields(fields.as_deref())?);
            let record = manager
                .update_episode(&guid, fields)
                .with_context(|| format!("Failed to update episode {guid}"))?;
            eprintln!("{} {}", "Updated".green().bold(), record.title.bold());
            emit(&manager, output)?;
        }

        Command::DeleteEpisode { feed, guid } => {
            let mut manager = load_manager(&client, &feed, &config).await?;
            let record = manager
                .delete_episode(&guid)
                .with_context(|| format!("Failed to delete episode {guid}"))?;
            eprintln!("{} {}", "Deleted".red().bold(), record.title.bold());
            emit(&manager, output)?;
        }

        Command::SetChannel { feed, channel } => {
            let updates = channel.into_updates();
            if updates.is_empty() {
                bail!("No channel fields given");
            }
            let mut manager = load_manager(&client, &feed, &config).await?;
            for update in updates {
                let name = update.name();
                manager
                    .update_channel_field(update)
                    .with_context(|| format!("Failed to update channel {name}"))?;
            }
            emit(&manager, output)?;
        }

        Command::List { feed, json } => {
            let manager = load_manager(&client, &feed, &config).await?;
            let episodes = manager.episodes()?;
            if json {
                println!("{}", serde_json::to_string_pretty(episodes)?);
            } else {
                println!(
                    "{} {}",
                    manager.channel()?.title.bold().magenta(),
                    format!("({} episodes)", episodes.len()).dimmed()
                );
                for (index, episode) in episodes.iter().enumerate() {
                    println!(
                        "  {:>3}. {} {}",
                        index + 1,
                        episode.title,
                        episode.guid.dimmed()
                    );
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn flags_override_json_fields() {
        let base = EpisodeFields {
            title: Some("From JSON".to_string()),
            description: Some("Kept".to_string()),
            ..Default::default()
        };
        let args = EpisodeArgs {
            title: Some("From flag".to_string()),
            ..Default::default()
        };

        let fields = args.into_fields(base);
        assert_eq!(fields.title.as_deref(), Some("From flag"));
        assert_eq!(fields.description.as_deref(), Some("Kept"));
    }

    #[test]
    fn channel_args_become_updates() {
        let args = ChannelArgs {
            title: Some("T".to_string()),
            explicit: Some(true),
            ..Default::default()
        };
        let updates = args.into_updates();
        assert_eq!(
            updates,
            vec![
                ChannelField::Title("T".to_string()),
                ChannelField::Explicit(true)
            ]
        );
    }

    #[test]
    fn pub_date_accepts_both_formats() {
        assert!(parse_pub_date("2024-01-01T12:00:00Z").is_ok());
        assert!(parse_pub_date("Mon, 01 Jan 2024 12:00:00 +0000").is_ok());
        assert!(parse_pub_date("soon").is_err());
    }
}
