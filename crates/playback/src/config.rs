use std::time::Duration;

use reqwest::Client;

use crate::PlaybackError;

/// Playback rates offered in the speed menu
pub const SPEED_OPTIONS: [f32; 7] = [0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0];

/// Tuning knobs for a [`PlaybackSession`](crate::PlaybackSession)
#[derive(Debug, Clone)]
pub struct PlaybackConfig {
    /// Period of the coarse clock tick driving labels and the progress bar
    pub display_tick_interval: Duration,

    /// Period of the dense clock tick driving progress persistence
    pub persist_tick_interval: Duration,

    /// Period of the subtitle cue poll
    pub subtitle_poll_interval: Duration,

    /// Period of the skip button visibility check
    pub skip_poll_interval: Duration,

    /// Delay before the controls hide after being shown
    pub hide_controls_delay: Duration,

    /// Remaining seconds below which an episode counts as watched
    pub completion_threshold_seconds: f64,

    /// Step used by the rewind/forward commands
    pub seek_step_seconds: f64,

    /// Start playing once the initial source is ready
    pub autoplay: bool,

    /// Hold-to-speed rate used when none is saved
    pub default_hold_speed: f32,

    /// Capacity of the session event channel
    pub event_channel_capacity: usize,

    /// Timeout for manifest and subtitle requests
    pub request_timeout: Duration,

    /// User agent for manifest and subtitle requests
    pub user_agent: String,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            display_tick_interval: Duration::from_millis(500),
            persist_tick_interval: Duration::from_secs(1),
            subtitle_poll_interval: Duration::from_millis(100),
            skip_poll_interval: Duration::from_millis(500),
            hide_controls_delay: Duration::from_secs(3),
            completion_threshold_seconds: 120.0,
            seek_step_seconds: 10.0,
            autoplay: true,
            default_hold_speed: 2.0,
            event_channel_capacity: 64,
            request_timeout: Duration::from_secs(15),
            user_agent: skip_times::DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl PlaybackConfig {
    pub fn builder() -> PlaybackConfigBuilder {
        PlaybackConfigBuilder::new()
    }

    pub fn build_client(&self) -> Result<Client, PlaybackError> {
        Client::builder()
            .timeout(self.request_timeout)
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(|e| PlaybackError::from_http("client setup", e))
    }
}

/// Builder for [`PlaybackConfig`]
#[derive(Debug, Default)]
pub struct PlaybackConfigBuilder {
    config: PlaybackConfig,
}

impl PlaybackConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn display_tick_interval(mut self, interval: Duration) -> Self {
        self.config.display_tick_interval = interval;
        self
    }

    pub fn persist_tick_interval(mut self, interval: Duration) -> Self {
        self.config.persist_tick_interval = interval;
        self
    }

    pub fn subtitle_poll_interval(mut self, interval: Duration) -> Self {
        self.config.subtitle_poll_interval = interval;
        self
    }

    pub fn skip_poll_interval(mut self, interval: Duration) -> Self {
        self.config.skip_poll_interval = interval;
        self
    }

    pub fn hide_controls_delay(mut self, delay: Duration) -> Self {
        self.config.hide_controls_delay = delay;
        self
    }

    pub fn completion_threshold_seconds(mut self, seconds: f64) -> Self {
        self.config.completion_threshold_seconds = seconds;
        self
    }

    pub fn seek_step_seconds(mut self, seconds: f64) -> Self {
        self.config.seek_step_seconds = seconds;
        self
    }

    pub fn autoplay(mut self, autoplay: bool) -> Self {
        self.config.autoplay = autoplay;
        self
    }

    pub fn default_hold_speed(mut self, rate: f32) -> Self {
        self.config.default_hold_speed = rate;
        self
    }

    /// Clamped to at least 1.
    pub fn event_channel_capacity(mut self, capacity: usize) -> Self {
        self.config.event_channel_capacity = capacity.max(1);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> PlaybackConfig {
        self.config
    }
}
