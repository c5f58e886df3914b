// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::SourceError;
use crate::http::HttpClient;

/// Fetch published feed text from a URL
pub async fn fetch_feed_text<C: HttpClient>(client: &C, url: &str) -> Result<String, SourceError> {
    let response = client
        .get(url)
        .await
        .map_err(|e| SourceError::FetchFailed {
            url: url.to_string(),
            source: e,
        })?;

    if !(200..300).contains(&response.status) {
        return Err(SourceError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        });
    }

    tracing::debug!(url = %url, bytes = response.body.len(), "Fetched feed");
    String::from_utf8(response.body.to_vec()).map_err(|_| SourceError::InvalidUtf8 {
        origin: url.to_string(),
    })
}

/// Read feed text from a local file
pub fn read_feed_file(path: &Path) -> Result<String, SourceError> {
    let bytes = std::fs::read(path).map_err(|e| SourceError::FileReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    String::from_utf8(bytes).map_err(|_| SourceError::InvalidUtf8 {
        origin: path.display().to_string(),
    })
}

/// Load feed text from either a URL or a file path
pub async fn load_feed_text<C: HttpClient>(client: &C, source: &str) -> Result<String, SourceError> {
    if is_url(source) {
        fetch_feed_text(client, source).await
    } else {
        read_feed_file(Path::new(source))
    }
}

/// Write rendered feed text to a file
pub fn write_feed_file(path: &Path, text: &str) -> Result<(), SourceError> {
    std::fs::write(path, text).map_err(|e| SourceError::FileWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read a JSON file of channel or episode fields
pub fn read_fields_json<T: DeserializeOwned>(path: &Path) -> Result<T, SourceError> {
    let content = std::fs::read_to_string(path).map_err(|e| SourceError::FileReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    serde_json::from_str(&content).map_err(|e| SourceError::JsonParseFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Determine if a string is a URL or a file path
pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::EpisodeFields;
    use crate::http::HttpResponse;
    use async_trait::async_trait;
    use bytes::Bytes;
    use tempfile::tempdir;

    struct StaticClient {
        status: u16,
        body: &'static str,
    }

    #[async_trait]
    impl HttpClient for StaticClient {
        async fn get(&self, _url: &str) -> Result<HttpResponse, reqwest::Error> {
            Ok(HttpResponse {
                status: self.status,
                body: Bytes::from_static(self.body.as_bytes()),
            })
        }
    }

    #[test]
    fn is_url_detects_http() {
        assert!(is_url("http://example.com/feed.xml"));
        assert!(is_url("https://example.com/feed.xml"));
    }

    #[test]
    fn is_url_rejects_file_paths() {
        assert!(!is_url("/path/to/feed.xml"));
        assert!(!is_url("./feed.xml"));
        assert!(!is_url("feed.xml"));
    }

    #[tokio::test]
    async fn fetch_returns_body_text() {
        let client = StaticClient {
            status: 200,
            body: "<rss/>",
        };
        let text = fetch_feed_text(&client, "https://example.com/feed.xml")
            .await
            .unwrap();
        assert_eq!(text, "<rss/>");
    }

    #[tokio::test]
    async fn fetch_rejects_error_status() {
        let client = StaticClient {
            status: 404,
            body: "",
        };
        let err = load_feed_text(&client, "https://example.com/missing.xml")
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::HttpStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn load_reads_local_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feed.xml");
        write_feed_file(&path, "<rss/>").unwrap();

        let client = StaticClient {
            status: 500,
            body: "",
        };
        let text = load_feed_text(&client, path.to_str().unwrap()).await.unwrap();
        assert_eq!(text, "<rss/>");
    }

    #[test]
    fn read_fields_json_parses_episode_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("episode.json");
        std::fs::write(
            &path,
            r#"{"title": "Ep", "description": "D", "audio_url": "https://example.com/a.mp3"}"#,
        )
        .unwrap();

        let fields: EpisodeFields = read_fields_json(&path).unwrap();
        assert_eq!(fields.title.as_deref(), Some("Ep"));
        assert_eq!(
            fields.audio_url.as_deref(),
            Some("https://example.com/a.mp3")
        );
    }

    #[test]
    fn read_fields_json_reports_bad_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("episode.json");
        std::fs::write(&path, "{not json").unwrap();

        let result: Result<EpisodeFields, _> = read_fields_json(&path);
        assert!(matches!(result, Err(SourceError::JsonParseFailed { .. })));
    }
}
