// In-crate fakes for session tests
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use skip_times::{
    MappingLookup, SkipInterval, SkipIntervalResolver, SkipKind, SkipTimesError,
    SkipTimesService, StaticCatalogIds, VoteType,
};
use tokio::sync::oneshot;
use url::Url;

use crate::media::{MediaPlayer, ObservationToken, ReadySignal};
use crate::services::{
    Collaborators, CompletionUpdater, ManifestFetcher, MemoryProgressStore, SubtitleSource,
    Translator,
};
use crate::settings::Settings;
use crate::subtitles::SubtitleCue;
use crate::PlaybackError;

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    Load(Url),
    Play,
    Pause,
    Seek(f64),
    SetRate(f32),
}

#[derive(Debug)]
struct PlayerState {
    position: f64,
    duration: f64,
    rate: f32,
    commands: Vec<PlayerCommand>,
    hold_ready: bool,
    pending_ready: Vec<oneshot::Sender<()>>,
    observations: HashSet<u64>,
    next_token: u64,
    released: usize,
    pip: bool,
}

/// Media primitive whose clock only moves when a test moves it.
#[derive(Debug)]
pub struct FakePlayer {
    state: Mutex<PlayerState>,
}

impl FakePlayer {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PlayerState {
                position: 0.0,
                duration: f64::NAN,
                rate: 0.0,
                commands: Vec::new(),
                hold_ready: false,
                pending_ready: Vec::new(),
                observations: HashSet::new(),
                next_token: 1,
                released: 0,
                pip: false,
            }),
        }
    }

    pub fn set_position(&self, position: f64) {
        self.state.lock().position = position;
    }

    pub fn set_duration(&self, duration: f64) {
        self.state.lock().duration = duration;
    }

    /// Keep load signals pending until [`FakePlayer::complete_loads`].
    pub fn hold_ready(&self, hold: bool) {
        self.state.lock().hold_ready = hold;
    }

    pub fn complete_loads(&self) {
        let pending: Vec<_> = self.state.lock().pending_ready.drain(..).collect();
        for tx in pending {
            let _ = tx.send(());
        }
    }

    pub fn fail_loads(&self) {
        self.state.lock().pending_ready.clear();
    }

    pub fn commands(&self) -> Vec<PlayerCommand> {
        self.state.lock().commands.clone()
    }

    pub fn clear_commands(&self) {
        self.state.lock().commands.clear();
    }

    pub fn loaded(&self) -> Vec<Url> {
        self.commands()
            .into_iter()
            .filter_map(|c| match c {
                PlayerCommand::Load(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.commands()
            .into_iter()
            .filter_map(|c| match c {
                PlayerCommand::Seek(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn active_observations(&self) -> usize {
        self.state.lock().observations.len()
    }

    pub fn released_observations(&self) -> usize {
        self.state.lock().released
    }

    pub fn is_picture_in_picture(&self) -> bool {
        self.state.lock().pip
    }
}

impl MediaPlayer for FakePlayer {
    fn load(&self, url: &Url) -> ReadySignal {
        let (tx, rx) = oneshot::channel();
        let mut state = self.state.lock();
        state.commands.push(PlayerCommand::Load(url.clone()));
        state.position = 0.0;
        state.rate = 0.0;
        if state.hold_ready {
            state.pending_ready.push(tx);
        } else {
            let _ = tx.send(());
        }
        rx
    }

    fn play(&self) {
        let mut state = self.state.lock();
        state.commands.push(PlayerCommand::Play);
        if state.rate == 0.0 {
            state.rate = 1.0;
        }
    }

    fn pause(&self) {
        let mut state = self.state.lock();
        state.commands.push(PlayerCommand::Pause);
        state.rate = 0.0;
    }

    fn seek(&self, seconds: f64) {
        let mut state = self.state.lock();
        state.commands.push(PlayerCommand::Seek(seconds));
        state.position = seconds;
    }

    fn set_rate(&self, rate: f32) {
        let mut state = self.state.lock();
        state.commands.push(PlayerCommand::SetRate(rate));
        state.rate = rate;
    }

    fn rate(&self) -> f32 {
        self.state.lock().rate
    }

    fn current_position(&self) -> f64 {
        self.state.lock().position
    }

    fn duration(&self) -> f64 {
        self.state.lock().duration
    }

    fn observe_ticks(&self, _interval: Duration) -> ObservationToken {
        let mut state = self.state.lock();
        let token = state.next_token;
        state.next_token += 1;
        state.observations.insert(token);
        ObservationToken(token)
    }

    fn release_observation(&self, token: ObservationToken) {
        let mut state = self.state.lock();
        if state.observations.remove(&token.0) {
            state.released += 1;
        }
    }

    fn enter_picture_in_picture(&self) -> bool {
        self.state.lock().pip = true;
        true
    }

    fn exit_picture_in_picture(&self) {
        self.state.lock().pip = false;
    }
}

/// Serves manifests from a fixed table; unknown URLs fail.
#[derive(Debug, Default)]
pub struct FakeManifests {
    bodies: HashMap<String, String>,
    delay: Option<Duration>,
}

impl FakeManifests {
    pub fn with(mut self, url: &str, body: &str) -> Self {
        self.bodies.insert(url.to_string(), body.to_string());
        self
    }

    /// Answer every fetch only after `delay` of tokio time.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl ManifestFetcher for FakeManifests {
    async fn fetch(&self, url: &Url) -> Result<String, PlaybackError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.bodies
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| PlaybackError::transient("manifest fetch", "HTTP 404"))
    }
}

pub struct FixedMapping(pub Option<i64>);

#[async_trait]
impl MappingLookup for FixedMapping {
    async fn secondary_id(&self, catalog_id: i64) -> Result<Option<i64>, SkipTimesError> {
        Ok(self.0.map(|offset| offset + catalog_id))
    }
}

/// Skip-time service returning fixed intervals and recording votes.
#[derive(Default)]
pub struct RecordingSkipService {
    intervals: Vec<SkipInterval>,
    pub requests: Mutex<Vec<(i64, u32)>>,
    pub votes: Mutex<Vec<(String, VoteType)>>,
}

impl RecordingSkipService {
    pub fn new(intervals: Vec<SkipInterval>) -> Self {
        Self {
            intervals,
            ..Self::default()
        }
    }
}

#[async_trait]
impl SkipTimesService for RecordingSkipService {
    async fn skip_times(
        &self,
        secondary_id: i64,
        episode: u32,
    ) -> Result<Vec<SkipInterval>, SkipTimesError> {
        self.requests.lock().push((secondary_id, episode));
        Ok(self.intervals.clone())
    }

    async fn vote(&self, skip_id: &str, vote: VoteType) -> Result<(), SkipTimesError> {
        self.votes.lock().push((skip_id.to_string(), vote));
        Ok(())
    }
}

pub struct FixedSubtitles(pub Vec<SubtitleCue>);

#[async_trait]
impl SubtitleSource for FixedSubtitles {
    async fn load(&self, _url: &Url) -> Result<Vec<SubtitleCue>, PlaybackError> {
        Ok(self.0.clone())
    }
}

/// Prefixes texts with the language and counts calls.
#[derive(Default)]
pub struct CountingTranslator {
    pub calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Translator for CountingTranslator {
    async fn translate(&self, text: &str, language: &str) -> Result<String, PlaybackError> {
        self.calls.lock().push((text.to_string(), language.to_string()));
        Ok(format!("[{language}] {text}"))
    }
}

#[derive(Default)]
pub struct RecordingCompletion {
    pub updates: Mutex<Vec<(i64, u32)>>,
}

#[async_trait]
impl CompletionUpdater for RecordingCompletion {
    async fn mark_watched(&self, catalog_id: i64, episode: u32) -> Result<(), PlaybackError> {
        self.updates.lock().push((catalog_id, episode));
        Ok(())
    }
}

pub fn interval(kind: SkipKind, start: f64, end: f64, id: &str) -> SkipInterval {
    SkipInterval {
        kind,
        start_seconds: start,
        end_seconds: end,
        skip_id: id.to_string(),
    }
}

/// Fakes wired into a [`Collaborators`] set.
pub struct FakeServices {
    pub settings: Settings,
    pub progress: Arc<MemoryProgressStore>,
    pub skip_service: Arc<RecordingSkipService>,
    pub translator: Arc<CountingTranslator>,
    pub completion: Arc<RecordingCompletion>,
    pub collaborators: Collaborators,
}

impl FakeServices {
    /// `"Show"` resolves to catalog id 10 and secondary id 110.
    pub fn new(manifests: FakeManifests, intervals: Vec<SkipInterval>, cues: Vec<SubtitleCue>) -> Self {
        let settings = Settings::in_memory();
        let progress = Arc::new(MemoryProgressStore::new());
        let skip_service = Arc::new(RecordingSkipService::new(intervals));
        let translator = Arc::new(CountingTranslator::default());
        let completion = Arc::new(RecordingCompletion::default());
        let resolver = SkipIntervalResolver::new(
            Arc::new(StaticCatalogIds::new().with("Show", 10)),
            Arc::new(FixedMapping(Some(100))),
            skip_service.clone(),
        );
        let collaborators = Collaborators::new(
            Arc::new(manifests),
            resolver,
            progress.clone(),
            settings.clone(),
        )
        .with_subtitles(Arc::new(FixedSubtitles(cues)))
        .with_translator(translator.clone())
        .with_completion(completion.clone());

        Self {
            settings,
            progress,
            skip_service,
            translator,
            completion,
            collaborators,
        }
    }
}
