// External collaborators of a playback session
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{Client, header};
use skip_times::SkipIntervalResolver;
use tracing::debug;
use url::Url;

use crate::progress::ProgressRecord;
use crate::settings::Settings;
use crate::subtitles::SubtitleCue;
use crate::{PlaybackConfig, PlaybackError};

/// Downloads adaptive manifests.
#[async_trait]
pub trait ManifestFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<String, PlaybackError>;
}

#[derive(Debug, Clone)]
pub struct HttpManifestFetcher {
    client: Client,
}

impl HttpManifestFetcher {
    pub fn new(config: &PlaybackConfig) -> Result<Self, PlaybackError> {
        Ok(Self::with_client(config.build_client()?))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ManifestFetcher for HttpManifestFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, PlaybackError> {
        let response = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, "application/vnd.apple.mpegurl, */*")
            .send()
            .await
            .map_err(|e| PlaybackError::from_http("manifest fetch", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlaybackError::transient(
                "manifest fetch",
                format!("HTTP {status} for {url}"),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PlaybackError::from_http("manifest fetch", e))?;
        debug!("Fetched manifest {} ({} bytes)", url, body.len());
        Ok(body)
    }
}

/// Parses a raw subtitle file into cues.
pub trait CueParser: Send + Sync {
    fn parse(&self, raw: &[u8]) -> Result<Vec<SubtitleCue>, PlaybackError>;
}

/// Loads the cue list of an episode.
#[async_trait]
pub trait SubtitleSource: Send + Sync {
    async fn load(&self, url: &Url) -> Result<Vec<SubtitleCue>, PlaybackError>;
}

/// Downloads a subtitle file and hands it to a [`CueParser`].
#[derive(Clone)]
pub struct HttpSubtitleSource {
    client: Client,
    parser: Arc<dyn CueParser>,
}

impl HttpSubtitleSource {
    pub fn new(client: Client, parser: Arc<dyn CueParser>) -> Self {
        Self { client, parser }
    }
}

#[async_trait]
impl SubtitleSource for HttpSubtitleSource {
    async fn load(&self, url: &Url) -> Result<Vec<SubtitleCue>, PlaybackError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| PlaybackError::from_http("subtitle fetch", e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(PlaybackError::transient(
                "subtitle fetch",
                format!("HTTP {status} for {url}"),
            ));
        }
        let raw = response
            .bytes()
            .await
            .map_err(|e| PlaybackError::from_http("subtitle fetch", e))?;
        self.parser.parse(&raw)
    }
}

impl std::fmt::Debug for HttpSubtitleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSubtitleSource").finish_non_exhaustive()
    }
}

/// Translates one cue text into a target language.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, language: &str) -> Result<String, PlaybackError>;
}

/// Receives continue-watching records.
pub trait ProgressSink: Send + Sync {
    fn save(&self, record: &ProgressRecord);
}

/// Latest [`ProgressRecord`] per source id, kept in memory.
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    records: RwLock<HashMap<String, ProgressRecord>>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, source_id: &str) -> Option<ProgressRecord> {
        self.records.read().get(source_id).cloned()
    }

    /// Records ordered by most recently saved first.
    pub fn continue_watching(&self) -> Vec<ProgressRecord> {
        let mut records: Vec<_> = self.records.read().values().cloned().collect();
        records.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        records
    }
}

impl ProgressSink for MemoryProgressStore {
    fn save(&self, record: &ProgressRecord) {
        self.records
            .write()
            .insert(record.source_id.clone(), record.clone());
    }
}

/// Pushes "episode watched" updates to the user's tracking service.
#[async_trait]
pub trait CompletionUpdater: Send + Sync {
    async fn mark_watched(&self, catalog_id: i64, episode: u32) -> Result<(), PlaybackError>;
}

/// Everything a session talks to besides the media primitive.
///
/// The optional collaborators switch their feature off when absent.
#[derive(Clone)]
pub struct Collaborators {
    pub manifests: Arc<dyn ManifestFetcher>,
    pub skip_times: SkipIntervalResolver,
    pub progress: Arc<dyn ProgressSink>,
    pub settings: Settings,
    pub subtitles: Option<Arc<dyn SubtitleSource>>,
    pub translator: Option<Arc<dyn Translator>>,
    pub completion: Option<Arc<dyn CompletionUpdater>>,
}

impl Collaborators {
    pub fn new(
        manifests: Arc<dyn ManifestFetcher>,
        skip_times: SkipIntervalResolver,
        progress: Arc<dyn ProgressSink>,
        settings: Settings,
    ) -> Self {
        Self {
            manifests,
            skip_times,
            progress,
            settings,
            subtitles: None,
            translator: None,
            completion: None,
        }
    }

    pub fn with_subtitles(mut self, source: Arc<dyn SubtitleSource>) -> Self {
        self.subtitles = Some(source);
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn with_completion(mut self, updater: Arc<dyn CompletionUpdater>) -> Self {
        self.completion = Some(updater);
        self
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("subtitles", &self.subtitles.is_some())
            .field("translator", &self.translator.is_some())
            .field("completion", &self.completion.is_some())
            .finish_non_exhaustive()
    }
}
