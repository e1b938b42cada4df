// Playback session actor
//
// One task owns all session state. Commands, clock ticks, timer firings and
// lookup results arrive on a single channel and are handled in order, so no
// state is ever touched from two places.
mod event;
mod skip;
mod state;


pub use event::{
    LookupOutcome, MediaEvent, RestorePoint, SessionCommand, SessionEvent, SourceSwap,
    TimerPurpose,
};
pub use skip::{SkipController, SkipEvaluation};
pub use state::{PlaybackState, SessionView, SkipMarker, VisibleSkip};

use std::future::Future;
use std::sync::Arc;

use hls::QualityLadder;
use skip_times::{SkipInterval, VoteType};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::clock::{ClockObserver, TickKind};
use crate::format::{format_remaining, format_time, speed_indicator};
use crate::media::{ClockSnapshot, MediaPlayer};
use crate::progress::{ProgressContext, ProgressTracker};
use crate::services::Collaborators;
use crate::settings::SubtitleAppearance;
use crate::source::{MediaRequest, SourceKind};
use crate::subtitles::{SubtitlePrefs, SubtitleSynchronizer, SubtitleUpdate, TranslationRequest};
use crate::timer::TimerSlot;
use crate::{Generation, GenerationScope, PlaybackConfig, PlaybackError, SPEED_OPTIONS};

/// Cloneable sender side of a [`PlaybackSession`]
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionEvent>,
}

impl SessionHandle {
    pub async fn send(&self, command: SessionCommand) -> Result<(), PlaybackError> {
        self.tx
            .send(SessionEvent::Command(command))
            .await
            .map_err(|_| PlaybackError::SessionClosed)
    }

    pub async fn open(&self, request: MediaRequest) -> Result<(), PlaybackError> {
        self.send(SessionCommand::Open(Box::new(request))).await
    }

    /// Forward the primitive's end-of-media notification.
    pub async fn media_ended(&self) -> Result<(), PlaybackError> {
        self.tx
            .send(SessionEvent::Media(MediaEvent::EndOfMedia))
            .await
            .map_err(|_| PlaybackError::SessionClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

pub struct PlaybackSession {
    config: PlaybackConfig,
    player: Arc<dyn MediaPlayer>,
    services: Collaborators,

    tx: mpsc::Sender<SessionEvent>,
    rx: mpsc::Receiver<SessionEvent>,
    view: watch::Sender<SessionView>,

    scope: GenerationScope,
    state: PlaybackState,
    request: Option<MediaRequest>,
    resume_at: Option<f64>,

    ladder: QualityLadder,
    current_quality: Option<usize>,
    pending_swap: Option<u64>,
    next_swap_id: u64,

    /// Provisional fraction while the user drags the progress bar
    scrub: Option<f64>,

    skips: SkipController,
    subtitles: SubtitleSynchronizer,
    progress: ProgressTracker,

    observer: Option<ClockObserver>,
    hide_controls: TimerSlot,
    subtitle_poll: TimerSlot,
    skip_poll: TimerSlot,

    closed: bool,
}

impl PlaybackSession {
    pub fn new(
        player: Arc<dyn MediaPlayer>,
        services: Collaborators,
        config: PlaybackConfig,
    ) -> Self {
        let (tx, rx) = mpsc::channel(config.event_channel_capacity.max(1));
        let initial = SessionView {
            subtitles_hidden: services.settings.subtitles_hidden(),
            subtitle_appearance: services.settings.subtitle_appearance(),
            ..SessionView::default()
        };
        let (view, _) = watch::channel(initial);

        Self {
            progress: ProgressTracker::new(config.completion_threshold_seconds),
            config,
            player,
            services,
            tx,
            rx,
            view,
            scope: GenerationScope::new(),
            state: PlaybackState::Idle,
            request: None,
            resume_at: None,
            ladder: QualityLadder::empty(),
            current_quality: None,
            pending_swap: None,
            next_swap_id: 0,
            scrub: None,
            skips: SkipController::default(),
            subtitles: SubtitleSynchronizer::new(),
            observer: None,
            hide_controls: TimerSlot::new("hide-controls"),
            subtitle_poll: TimerSlot::new("subtitle-poll"),
            skip_poll: TimerSlot::new("skip-visibility"),
            closed: false,
        }
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            tx: self.tx.clone(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.subscribe()
    }

    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn generation(&self) -> Generation {
        self.scope.current()
    }

    pub fn ladder(&self) -> &QualityLadder {
        &self.ladder
    }

    pub fn skip_intervals(&self) -> &[SkipInterval] {
        self.skips.intervals()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Handle events until the session is dismissed.
    pub async fn run(mut self) {
        info!("Playback session started");
        while let Some(event) = self.rx.recv().await {
            self.handle_event(event);
            if self.closed {
                break;
            }
        }
        info!("Playback session finished");
    }

    /// Handle every event already queued without waiting for more.
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while !self.closed {
            match self.rx.try_recv() {
                Ok(event) => {
                    self.handle_event(event);
                    handled += 1;
                }
                Err(_) => break,
            }
        }
        handled
    }

    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Command(command) => self.handle_command(command),
            SessionEvent::Media(MediaEvent::EndOfMedia) => self.on_end_of_media(),
            SessionEvent::Tick(tick) => {
                if !self.scope.is_current(tick.generation) {
                    trace!(generation = %tick.generation, "Dropping tick of a previous media");
                    return;
                }
                match tick.kind {
                    TickKind::Display => self.on_display_tick(tick.snapshot),
                    TickKind::Persist => self.on_persist_tick(tick.snapshot),
                }
            }
            SessionEvent::Timer {
                purpose,
                generation,
            } => {
                if !self.scope.is_current(generation) {
                    trace!(%generation, ?purpose, "Dropping stale timer");
                    return;
                }
                self.on_timer(purpose);
            }
            SessionEvent::Lookup {
                generation,
                outcome,
            } => {
                if !self.scope.is_current(generation) {
                    debug!(
                        %generation,
                        current = %self.scope.current(),
                        "Discarding stale {} result",
                        outcome.name()
                    );
                    return;
                }
                self.on_lookup(outcome);
            }
        }
    }

    fn update_view(&self, f: impl FnOnce(&mut SessionView)) {
        self.view.send_modify(f);
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state == state {
            return;
        }
        debug!(from = %self.state, to = %state, "Playback state changed");
        self.state = state;
        self.update_view(|v| v.state = state);
    }

    fn timer_event(&self, purpose: TimerPurpose) -> SessionEvent {
        SessionEvent::Timer {
            purpose,
            generation: self.scope.current(),
        }
    }

    /// Run `work` off the session task and deliver its outcome tagged with
    /// the current generation. Opening other media cancels it.
    fn spawn_lookup<F>(&self, work: F)
    where
        F: Future<Output = LookupOutcome> + Send + 'static,
    {
        let tx = self.tx.clone();
        let token = self.scope.token();
        let generation = self.scope.current();
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    trace!(%generation, "Lookup cancelled");
                }
                outcome = work => {
                    if tx.send(SessionEvent::Lookup { generation, outcome }).await.is_err() {
                        trace!(%generation, "Session closed before lookup completed");
                    }
                }
            }
        });
    }

    fn stop_activity(&mut self) {
        self.hide_controls.cancel();
        self.subtitle_poll.cancel();
        self.skip_poll.cancel();
        self.observer = None;
    }

    fn open_media(&mut self, request: MediaRequest) {
        let generation = self.scope.advance();
        info!(
            %generation,
            source_id = %request.source_id,
            "Opening {:?} from {}",
            request.title(),
            request.source.url
        );

        // the previous media must not keep advancing under the new source id
        if self.state.has_source() {
            self.player.pause();
        }
        self.stop_activity();
        self.ladder = QualityLadder::empty();
        self.current_quality = None;
        self.pending_swap = None;
        self.scrub = None;
        self.skips.reset();
        self.subtitles.clear();

        let settings = self.services.settings.clone();
        self.progress.reset(ProgressContext {
            source_id: request.source_id.clone(),
            title: request.title().to_owned(),
            episode_number: request.episode_number(),
            poster: request.source.poster.clone(),
            provider: request.provider.clone(),
        });
        self.resume_at = settings
            .last_position(&request.source_id)
            .filter(|p| p.is_finite() && *p > 0.0);

        let picture_in_picture = self.view.borrow().picture_in_picture;
        self.view.send_replace(SessionView {
            state: PlaybackState::Loading,
            title: request.title().to_owned(),
            episode_label: request.episode_label.clone(),
            subtitles_hidden: settings.subtitles_hidden(),
            subtitle_appearance: settings.subtitle_appearance(),
            picture_in_picture,
            ..SessionView::default()
        });
        self.state = PlaybackState::Loading;

        self.observer = Some(ClockObserver::spawn(
            self.player.clone(),
            self.config.display_tick_interval,
            self.config.persist_tick_interval,
            generation,
            self.tx.clone(),
        ));
        self.show_controls();

        let resume_at = self.resume_at;
        match request.source.kind {
            SourceKind::Direct => {
                self.attach_source(request.source.url.clone(), SourceSwap::Initial { resume_at })
            }
            SourceKind::AdaptiveManifest => {
                let fetcher = self.services.manifests.clone();
                let url = request.source.url.clone();
                self.spawn_lookup(async move {
                    let result = fetcher.fetch(&url).await;
                    LookupOutcome::Manifest { url, result }
                });
            }
        }

        if let (Some(url), Some(source)) = (request.subtitles.clone(), self.services.subtitles.clone())
        {
            self.spawn_lookup(async move { LookupOutcome::Subtitles(source.load(&url).await) });
        }

        let resolver = self.services.skip_times.clone();
        let title = request.title().to_owned();
        let override_id = settings.catalog_override(&title);
        let episode = request.episode_number();
        self.spawn_lookup(async move {
            LookupOutcome::SkipIntervals(resolver.resolve(&title, override_id, episode).await)
        });

        self.request = Some(request);
    }

    /// Load `url` into the primitive; `swap` runs once it is ready.
    fn attach_source(&mut self, url: Url, swap: SourceSwap) {
        debug!("Attaching source {}", url);
        let ready = self.player.load(&url);
        self.next_swap_id += 1;
        let swap_id = self.next_swap_id;
        self.pending_swap = Some(swap_id);
        if self.state == PlaybackState::Loading {
            self.set_state(PlaybackState::Ready);
        }

        self.spawn_lookup(async move {
            let ready = ready.await.is_ok();
            LookupOutcome::SourceReady {
                swap_id,
                swap,
                ready,
            }
        });
    }

    fn on_lookup(&mut self, outcome: LookupOutcome) {
        match outcome {
            LookupOutcome::Manifest { url, result } => self.on_manifest(url, result),
            LookupOutcome::SourceReady {
                swap_id,
                swap,
                ready,
            } => self.on_source_ready(swap_id, swap, ready),
            LookupOutcome::SkipIntervals(intervals) => self.on_skip_intervals(intervals),
            LookupOutcome::Subtitles(result) => match result {
                Ok(cues) if cues.is_empty() => debug!("Subtitle file has no cues"),
                Ok(cues) => {
                    info!("Loaded {} subtitle cues", cues.len());
                    self.subtitles.load(cues);
                    let generation = self.scope.current();
                    self.subtitle_poll.start_repeating(
                        self.config.subtitle_poll_interval,
                        self.tx.clone(),
                        move || SessionEvent::Timer {
                            purpose: TimerPurpose::SubtitlePoll,
                            generation,
                        },
                    );
                }
                Err(e) => warn!("Subtitles unavailable: {}", e),
            },
            LookupOutcome::Translation {
                cue_index,
                language,
                result,
            } => match result {
                Ok(text) => {
                    let shown = self.subtitles.apply_translation(cue_index, &language, text);
                    if let Some(text) = shown {
                        if !self.view.borrow().subtitles_hidden {
                            self.update_view(|v| v.subtitle = Some(text));
                        }
                    }
                }
                Err(e) => debug!("Translation of cue {} to {} failed: {}", cue_index, language, e),
            },
        }
    }

    fn on_manifest(&mut self, url: Url, result: Result<String, PlaybackError>) {
        let resume_at = self.resume_at;
        let text = match result {
            Ok(text) => text,
            Err(e) => {
                warn!("Manifest fetch failed, playing {} directly: {}", url, e);
                self.attach_source(url, SourceSwap::Initial { resume_at });
                return;
            }
        };

        let ladder = QualityLadder::from_manifest(&text, &url);
        let preferred = self.services.settings.preferred_quality();
        let selected = ladder
            .select(preferred.as_deref())
            .and_then(|index| ladder.get(index).map(|v| (index, v.label, v.url.clone())));
        let Some((index, label, variant_url)) = selected else {
            let reason = PlaybackError::malformed_manifest(format!("no recognized variants in {url}"));
            debug!("{}, playing it directly", reason);
            self.attach_source(url, SourceSwap::Initial { resume_at });
            return;
        };

        info!(
            "Selected {} out of {} qualities (preferred: {:?})",
            label,
            ladder.len(),
            preferred
        );
        let labels: Vec<String> = ladder.labels().iter().map(|l| l.to_string()).collect();
        self.ladder = ladder;
        self.current_quality = Some(index);
        self.update_view(|v| {
            v.qualities = labels;
            v.current_quality = Some(label.to_string());
        });
        self.attach_source(variant_url, SourceSwap::Initial { resume_at });
    }

    fn on_source_ready(&mut self, swap_id: u64, swap: SourceSwap, ready: bool) {
        if self.pending_swap != Some(swap_id) {
            debug!("Ignoring readiness of superseded source #{}", swap_id);
            return;
        }
        self.pending_swap = None;
        if !ready {
            warn!("Source #{} failed to become ready", swap_id);
            return;
        }

        match swap {
            SourceSwap::Initial { resume_at } => {
                if let Some(position) = resume_at {
                    info!("Resuming at {}", format_time(position));
                    self.player.seek(position);
                }
                if self.config.autoplay {
                    self.player.play();
                    self.set_state(PlaybackState::Playing);
                }
            }
            SourceSwap::Quality(restore) => {
                if restore.position.is_finite() {
                    self.player.seek(restore.position);
                }
                if restore.was_playing {
                    self.player.play();
                    if self.state != PlaybackState::Ended {
                        self.set_state(PlaybackState::Playing);
                    }
                } else {
                    self.player.pause();
                }
                debug!(
                    "Quality switch restored position {:.1}s (playing: {})",
                    restore.position, restore.was_playing
                );
            }
        }
    }

    fn on_skip_intervals(&mut self, intervals: Vec<SkipInterval>) {
        if intervals.is_empty() {
            debug!("No skip intervals for this episode");
            return;
        }
        info!("Loaded {} skip intervals", intervals.len());
        self.skips.load(intervals);

        let markers = self.skips.markers(self.player.duration());
        self.update_view(|v| v.skip_markers = markers);

        let generation = self.scope.current();
        self.skip_poll.start_repeating(
            self.config.skip_poll_interval,
            self.tx.clone(),
            move || SessionEvent::Timer {
                purpose: TimerPurpose::SkipVisibility,
                generation,
            },
        );
    }

    fn on_display_tick(&mut self, snapshot: ClockSnapshot) {
        if self.state == PlaybackState::Ended || !self.state.has_source() {
            return;
        }
        if self.state.has_source() && self.pending_swap.is_none() {
            let next = match (self.state, snapshot.is_playing) {
                (_, true) => PlaybackState::Playing,
                (PlaybackState::Playing, false) => PlaybackState::Paused,
                (state, false) => state,
            };
            self.set_state(next);
        }

        let markers = self.skips.markers(snapshot.duration);
        let scrub = self.scrub;
        self.update_view(|v| {
            match scrub {
                Some(fraction) if snapshot.has_known_duration() => {
                    v.set_time(fraction * snapshot.duration, snapshot.duration);
                    v.progress = fraction;
                }
                Some(_) => {}
                None => v.set_time(snapshot.position, snapshot.duration),
            }
            v.skip_markers = markers;
        });
    }

    fn on_persist_tick(&mut self, snapshot: ClockSnapshot) {
        // until the opened source is ready the clock may still describe other media
        if !self.state.has_source() || self.pending_swap.is_some() {
            return;
        }
        if snapshot.is_playing && !snapshot.has_known_duration() {
            trace!("{}", PlaybackError::clock_unavailable("media duration not known yet"));
            return;
        }
        let settings = &self.services.settings;
        let completion_enabled =
            self.services.completion.is_some() && settings.completion_updates_enabled();
        let Some(update) = self.progress.on_tick(&snapshot, completion_enabled) else {
            return;
        };

        let record = &update.record;
        self.services.progress.save(record);
        settings.save_position(
            &record.source_id,
            record.position_seconds,
            record.duration_seconds,
        );
        if update.completion_due {
            self.push_completion();
        }
    }

    fn push_completion(&self) {
        let (Some(updater), Some(request)) =
            (self.services.completion.clone(), self.request.as_ref())
        else {
            return;
        };
        let resolver = self.services.skip_times.clone();
        let title = request.title().to_owned();
        let override_id = self.services.settings.catalog_override(&title);
        let episode = request.episode_number();
        let token = self.scope.token();

        tokio::spawn(async move {
            let work = async {
                let Some(catalog_id) = resolver.catalog_id(&title, override_id).await else {
                    warn!("No catalog id for {:?}, skipping completion update", title);
                    return;
                };
                match updater.mark_watched(catalog_id, episode).await {
                    Ok(()) => info!("Marked {:?} episode {} as watched", title, episode),
                    Err(e) => warn!("Completion update for {:?} failed: {}", title, e),
                }
            };
            tokio::select! {
                _ = token.cancelled() => {}
                _ = work => {}
            }
        });
    }

    fn on_timer(&mut self, purpose: TimerPurpose) {
        match purpose {
            TimerPurpose::HideControls => {
                if self.scrub.is_none() {
                    self.update_view(|v| v.controls_visible = false);
                }
            }
            TimerPurpose::SubtitlePoll => self.poll_subtitles(),
            TimerPurpose::SkipVisibility => self.poll_skips(),
        }
    }

    fn subtitle_prefs(&self) -> SubtitlePrefs {
        let settings = &self.services.settings;
        if self.services.translator.is_some() && settings.translation_enabled() {
            SubtitlePrefs::translated(settings.translation_language())
        } else {
            SubtitlePrefs::original()
        }
    }

    fn poll_subtitles(&mut self) {
        if self.subtitles.is_empty() || self.view.borrow().subtitles_hidden {
            return;
        }
        let position = self.player.current_position();
        let prefs = self.subtitle_prefs();
        match self.subtitles.resolve(position, &prefs) {
            SubtitleUpdate::Unchanged => {}
            SubtitleUpdate::Clear => self.update_view(|v| v.subtitle = None),
            SubtitleUpdate::Show {
                text, translation, ..
            } => {
                self.update_view(|v| v.subtitle = Some(text));
                if let Some(request) = translation {
                    self.request_translation(request);
                }
            }
        }
    }

    fn request_translation(&self, request: TranslationRequest) {
        let Some(translator) = self.services.translator.clone() else {
            return;
        };
        trace!(
            "Requesting {} translation of cue {}",
            request.language, request.cue_index
        );
        self.spawn_lookup(async move {
            let result = translator.translate(&request.text, &request.language).await;
            LookupOutcome::Translation {
                cue_index: request.cue_index,
                language: request.language,
                result,
            }
        });
    }

    fn poll_skips(&mut self) {
        if self.skips.is_empty() || !self.state.has_source() {
            return;
        }
        let position = self.player.current_position();
        let settings = self.services.settings.clone();
        let evaluation = self.skips.evaluate(position, |kind| settings.auto_skip(kind));
        if let Some(target) = evaluation.seek_to {
            info!("Auto-skipping to {}", format_time(target));
            self.player.seek(target);
        }
        let visible = evaluation.visible;
        self.update_view(|v| v.visible_skips = visible);
    }

    fn on_end_of_media(&mut self) {
        if !self.state.has_source() {
            debug!("Ignoring end of media while {}", self.state);
            return;
        }
        info!("Reached end of media");
        self.player.pause();
        self.hide_controls.cancel();
        self.set_state(PlaybackState::Ended);

        let duration = self.player.duration();
        let vote_prompt =
            self.services.settings.skip_feedback_enabled() && self.skips.can_vote();
        self.update_view(|v| {
            v.position = duration;
            v.duration = duration;
            v.progress = 1.0;
            v.elapsed_label = format_time(duration);
            v.remaining_label = format_remaining(0.0);
            v.controls_visible = true;
            v.vote_prompt = vote_prompt;
        });
    }

    fn handle_command(&mut self, command: SessionCommand) {
        trace!(?command, "Handling command");
        match command {
            SessionCommand::Open(request) => self.open_media(*request),
            SessionCommand::Dismiss => self.dismiss(),
            SessionCommand::TapSurface => self.toggle_controls(),
            SessionCommand::ToggleSubtitles => self.toggle_subtitles(),
            SessionCommand::SetTranslation(enabled) => {
                self.services.settings.set_translation_enabled(enabled)
            }
            SessionCommand::SetTranslationLanguage(language) => {
                self.services.settings.set_translation_language(&language)
            }
            SessionCommand::SetSubtitleAppearance(appearance) => {
                self.set_subtitle_appearance(appearance)
            }
            SessionCommand::DismissVotePrompt => self.update_view(|v| v.vote_prompt = false),
            SessionCommand::TogglePictureInPicture => self.toggle_picture_in_picture(),
            _ if !self.state.has_source() => {
                debug!("Ignoring {:?} while {}", command, self.state);
            }
            SessionCommand::Play => self.play(),
            SessionCommand::Pause => self.pause(),
            SessionCommand::TogglePlayPause => {
                if self.player.rate() == 0.0 {
                    self.play();
                } else {
                    self.pause();
                }
            }
            SessionCommand::SeekBy(delta) => self.seek_by(delta),
            SessionCommand::Rewind => self.seek_by(-self.config.seek_step_seconds),
            SessionCommand::Forward => self.seek_by(self.config.seek_step_seconds),
            SessionCommand::SeekToFraction(fraction) => self.seek_to_fraction(fraction),
            SessionCommand::BeginScrub(fraction) => self.scrub_to(fraction, true),
            SessionCommand::UpdateScrub(fraction) => self.scrub_to(fraction, false),
            SessionCommand::EndScrub(fraction) => self.end_scrub(fraction),
            SessionCommand::SetRate(rate) => self.set_rate(rate),
            SessionCommand::BeginHoldSpeed => {
                let rate = self
                    .services
                    .settings
                    .hold_speed()
                    .unwrap_or(self.config.default_hold_speed);
                self.set_rate(rate);
            }
            SessionCommand::EndHoldSpeed => self.set_rate(1.0),
            SessionCommand::ChangeQuality(index) => self.change_quality(index),
            SessionCommand::Skip(index) => self.skip(index),
            SessionCommand::Vote(vote) => self.vote(vote),
        }
    }

    fn show_controls(&mut self) {
        self.update_view(|v| v.controls_visible = true);
        let event = self.timer_event(TimerPurpose::HideControls);
        self.hide_controls
            .start_once(self.config.hide_controls_delay, self.tx.clone(), event);
    }

    fn toggle_controls(&mut self) {
        let visible = self.view.borrow().controls_visible;
        if !visible {
            self.show_controls();
        } else if self.scrub.is_none() {
            self.hide_controls.cancel();
            self.update_view(|v| v.controls_visible = false);
        }
    }

    fn play(&mut self) {
        self.player.play();
        self.set_state(PlaybackState::Playing);
        self.show_controls();
    }

    fn pause(&mut self) {
        self.player.pause();
        if self.state != PlaybackState::Ended {
            self.set_state(PlaybackState::Paused);
        }
        self.show_controls();
    }

    fn seek_by(&mut self, delta: f64) {
        let duration = self.player.duration();
        let mut target = (self.player.current_position() + delta).max(0.0);
        if duration.is_finite() && duration > 0.0 {
            target = target.min(duration);
        }
        self.seek_to(target);
    }

    fn seek_to(&mut self, target: f64) {
        let duration = self.player.duration();
        self.player.seek(target);
        if self.state == PlaybackState::Ended && !(target >= duration) {
            self.set_state(PlaybackState::Paused);
            self.update_view(|v| v.vote_prompt = false);
        }
        self.update_view(|v| v.set_time(target, duration));
        self.show_controls();
    }

    fn seek_to_fraction(&mut self, fraction: f64) {
        let duration = self.player.duration();
        if !(duration.is_finite() && duration > 0.0) {
            debug!("Duration unknown, ignoring seek to fraction {}", fraction);
            return;
        }
        self.seek_to(fraction.clamp(0.0, 1.0) * duration);
    }

    fn scrub_to(&mut self, fraction: f64, begin: bool) {
        let fraction = fraction.clamp(0.0, 1.0);
        let duration = self.player.duration();
        self.scrub = Some(fraction);
        if !begin && duration.is_finite() && duration > 0.0 {
            self.player.seek(fraction * duration);
        }
        self.update_view(|v| {
            v.seeking = true;
            v.set_time(fraction * duration, duration);
            v.progress = fraction;
        });
        if begin {
            self.show_controls();
        }
    }

    fn end_scrub(&mut self, fraction: f64) {
        self.scrub = None;
        self.update_view(|v| v.seeking = false);
        self.seek_to_fraction(fraction);
    }

    fn set_rate(&mut self, rate: f32) {
        if !(rate.is_finite() && rate > 0.0) {
            warn!("Ignoring invalid playback rate {}", rate);
            return;
        }
        if !SPEED_OPTIONS.contains(&rate) {
            debug!("Playback rate {} is not in the speed menu", rate);
        }
        self.player.set_rate(rate);
        self.update_view(|v| {
            v.rate = rate;
            v.speed_indicator = speed_indicator(rate);
        });
    }

    fn change_quality(&mut self, index: usize) {
        if self.pending_swap.is_some() {
            debug!("Source switch already in progress, ignoring quality change");
            return;
        }
        if self.current_quality == Some(index) {
            return;
        }
        let Some(variant) = self.ladder.get(index) else {
            warn!("No quality at index {} ({} available)", index, self.ladder.len());
            return;
        };
        let label = variant.label;
        let url = variant.url.clone();
        let restore = RestorePoint {
            position: self.player.current_position(),
            was_playing: self.player.rate() != 0.0,
        };

        info!(
            "Switching quality to {} at {}",
            label,
            format_time(restore.position)
        );
        self.services.settings.set_preferred_quality(label.as_str());
        self.current_quality = Some(index);
        self.update_view(|v| v.current_quality = Some(label.to_string()));
        self.attach_source(url, SourceSwap::Quality(restore));
    }

    fn skip(&mut self, index: usize) {
        let position = self.player.current_position();
        let Some(target) = self.skips.manual_skip(index, position) else {
            debug!("Skip {} not available at {:.1}s", index, position);
            return;
        };
        info!("Skipping to {}", format_time(target));
        self.player.seek(target);
        self.update_view(|v| v.visible_skips.retain(|s| s.index != index));
    }

    fn toggle_subtitles(&mut self) {
        let hidden = !self.view.borrow().subtitles_hidden;
        self.services.settings.set_subtitles_hidden(hidden);
        if !hidden {
            self.subtitles.invalidate();
        }
        self.update_view(|v| {
            v.subtitles_hidden = hidden;
            if hidden {
                v.subtitle = None;
            }
        });
    }

    fn set_subtitle_appearance(&mut self, appearance: SubtitleAppearance) {
        self.services.settings.set_subtitle_appearance(&appearance);
        self.update_view(|v| v.subtitle_appearance = appearance);
    }

    fn vote(&mut self, vote: VoteType) {
        if self.state != PlaybackState::Ended {
            debug!("Skip votes are only taken after the episode ended");
            return;
        }
        if !self.services.settings.skip_feedback_enabled() {
            return;
        }
        let Some(skip_ids) = self.skips.take_vote() else {
            debug!("Skip intervals already voted on");
            return;
        };
        self.update_view(|v| v.vote_prompt = false);

        for skip_id in skip_ids {
            let resolver = self.services.skip_times.clone();
            tokio::spawn(async move {
                if let Err(e) = resolver.vote(&skip_id, vote).await {
                    warn!("{}", PlaybackError::from(e));
                }
            });
        }
    }

    fn toggle_picture_in_picture(&mut self) {
        let active = if self.view.borrow().picture_in_picture {
            self.player.exit_picture_in_picture();
            false
        } else {
            self.player.enter_picture_in_picture()
        };
        self.update_view(|v| v.picture_in_picture = active);
    }

    fn dismiss(&mut self) {
        info!(generation = %self.scope.current(), "Dismissing playback session");
        self.scope.cancel();
        self.stop_activity();
        self.progress.clear();
        if self.state.has_source() {
            self.player.pause();
        }
        self.set_state(PlaybackState::Idle);
        self.closed = true;
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("state", &self.state)
            .field("generation", &self.scope.current())
            .field("qualities", &self.ladder.len())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}
