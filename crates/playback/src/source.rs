// Media sources and open requests
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::PlaybackError;

static EPISODE_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// First integer in an episode label, `1` when there is none.
///
/// `"Episode 12 - Finale"` → 12, `"Special"` → 1.
pub fn episode_number(label: &str) -> u32 {
    EPISODE_NUMBER
        .find(label)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A single fixed-quality stream
    Direct,
    /// An HLS master playlist with quality variants
    AdaptiveManifest,
}

impl SourceKind {
    /// Guess the kind from the URL path.
    pub fn detect(url: &Url) -> Self {
        let is_manifest = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .is_some_and(|last| last.to_ascii_lowercase().ends_with(".m3u8"));
        if is_manifest {
            SourceKind::AdaptiveManifest
        } else {
            SourceKind::Direct
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaSource {
    pub url: Url,
    pub kind: SourceKind,
    pub title: String,
    pub poster: Option<String>,
}

impl MediaSource {
    pub fn new(url: Url, title: impl Into<String>) -> Self {
        Self {
            kind: SourceKind::detect(&url),
            url,
            title: title.into(),
            poster: None,
        }
    }

    pub fn parse(input: &str, title: impl Into<String>) -> Result<Self, PlaybackError> {
        let url = Url::parse(input.trim())
            .map_err(|e| PlaybackError::invalid_source(input, e.to_string()))?;
        Ok(Self::new(url, title))
    }

    pub fn with_kind(mut self, kind: SourceKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_poster(mut self, poster: impl Into<String>) -> Self {
        self.poster = Some(poster.into());
        self
    }
}

/// Everything needed to open one episode.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRequest {
    pub source: MediaSource,
    /// Key for resume position and continue-watching records
    pub source_id: String,
    pub episode_label: String,
    pub subtitles: Option<Url>,
    /// Name of the site the stream was scraped from
    pub provider: Option<String>,
}

impl MediaRequest {
    pub fn new(source: MediaSource, source_id: impl Into<String>) -> Self {
        Self {
            source,
            source_id: source_id.into(),
            episode_label: String::new(),
            subtitles: None,
            provider: None,
        }
    }

    pub fn with_episode(mut self, label: impl Into<String>) -> Self {
        self.episode_label = label.into();
        self
    }

    pub fn with_subtitles(mut self, url: Url) -> Self {
        self.subtitles = Some(url);
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn episode_number(&self) -> u32 {
        episode_number(&self.episode_label)
    }

    pub fn title(&self) -> &str {
        &self.source.title
    }
}
