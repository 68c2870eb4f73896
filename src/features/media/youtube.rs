//! YouTube search and stream resolution
//!
//! Searches through the YouTube Data API when a key is configured, otherwise
//! through `yt-dlp ytsearchN:`. Streams are always resolved with yt-dlp.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use super::{MediaItem, MediaProvider, PlayableSource};

const SEARCH_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/search";
const YTDLP_TIMEOUT: Duration = Duration::from_secs(60);

pub struct YouTubeProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    ytdlp_path: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: ResultId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct ResultId {
    kind: String,
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    title: String,
}

impl YouTubeProvider {
    pub fn new(api_key: Option<String>, ytdlp_path: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            ytdlp_path: ytdlp_path.into(),
        }
    }

    async fn search_api(&self, api_key: &str, query: &str, limit: usize) -> Result<Vec<MediaItem>> {
        let max_results = limit.to_string();
        let response = self
            .client
            .get(SEARCH_ENDPOINT)
            .query(&[
                ("part", "id,snippet"),
                ("type", "video"),
                ("q", query),
                ("maxResults", max_results.as_str()),
                ("key", api_key),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: SearchResponse = response.json().await?;
        Ok(items_from_api(body, limit))
    }

    async fn search_ytdlp(&self, query: &str, limit: usize) -> Result<Vec<MediaItem>> {
        let target = format!("ytsearch{limit}:{query}");
        let stdout = self
            .run_ytdlp(&["--flat-playlist", "--dump-json", "--no-warnings", "--quiet", &target])
            .await?;
        parse_search_lines(&stdout, limit)
    }

    async fn run_ytdlp(&self, args: &[&str]) -> Result<String> {
        let mut cmd = Command::new(&self.ytdlp_path);
        cmd.args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        match timeout(YTDLP_TIMEOUT, cmd.output()).await {
            Ok(Ok(output)) => {
                if !output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    return Err(anyhow!("yt-dlp failed: {}", stderr.trim()));
                }
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
            Ok(Err(e)) => Err(anyhow!("Failed to execute yt-dlp: {e}")),
            Err(_) => Err(anyhow!("yt-dlp timed out after {} seconds", YTDLP_TIMEOUT.as_secs())),
        }
    }
}

#[async_trait]
impl MediaProvider for YouTubeProvider {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<MediaItem>> {
        debug!("Searching YouTube for '{query}' (limit {limit})");
        match &self.api_key {
            Some(key) => match self.search_api(key, query, limit).await {
                Ok(items) => Ok(items),
                Err(e) => {
                    warn!("YouTube Data API search failed, falling back to yt-dlp: {e}");
                    self.search_ytdlp(query, limit).await
                }
            },
            None => self.search_ytdlp(query, limit).await,
        }
    }

    async fn fetch_playable(&self, id: &str) -> Result<PlayableSource> {
        let url = format!("https://youtu.be/{id}");
        let stdout = self
            .run_ytdlp(&[
                "-f",
                "bestaudio/best",
                "--no-playlist",
                "--no-warnings",
                "--dump-json",
                &url,
            ])
            .await?;
        parse_playable(&stdout, &url)
    }
}

fn items_from_api(body: SearchResponse, limit: usize) -> Vec<MediaItem> {
    body.items
        .into_iter()
        .filter(|r| r.id.kind == "youtube#video")
        .filter_map(|r| {
            r.id.video_id.map(|id| MediaItem {
                title: r.snippet.title,
                id,
            })
        })
        .take(limit)
        .collect()
}

/// One JSON object per line, as printed by `--flat-playlist --dump-json`
fn parse_search_lines(stdout: &str, limit: usize) -> Result<Vec<MediaItem>> {
    let mut items = Vec::new();
    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        let json: serde_json::Value = serde_json::from_str(line)
            .map_err(|e| anyhow!("Failed to parse yt-dlp JSON output: {e}"))?;
        let Some(id) = json.get("id").and_then(|v| v.as_str()) else {
            continue;
        };
        let title = json
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown Title");
        items.push(MediaItem {
            title: title.to_string(),
            id: id.to_string(),
        });
        if items.len() == limit {
            break;
        }
    }
    Ok(items)
}

fn parse_playable(stdout: &str, page_url: &str) -> Result<PlayableSource> {
    let line = stdout
        .lines()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| anyhow!("yt-dlp returned no metadata"))?;
    let json: serde_json::Value = serde_json::from_str(line)
        .map_err(|e| anyhow!("Failed to parse yt-dlp JSON output: {e}"))?;

    // Playlists resolve to their first entry
    let entry = json
        .get("entries")
        .and_then(|e| e.as_array())
        .and_then(|e| e.first())
        .unwrap_or(&json);

    let stream_url = entry
        .get("url")
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow!("yt-dlp metadata has no stream url"))?;
    let title = entry
        .get("title")
        .and_then(|v| v.as_str())
        .unwrap_or("Unknown Title");

    Ok(PlayableSource {
        title: title.to_string(),
        url: page_url.to_string(),
        stream_url: stream_url.to_string(),
    })
}
