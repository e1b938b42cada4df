// Session state published to the presentation layer
use std::fmt::Display;

use skip_times::SkipKind;

use crate::format::{format_remaining, format_time};
use crate::settings::SubtitleAppearance;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Ended,
}

impl PlaybackState {
    /// A source is attached and accepts transport commands.
    pub fn has_source(&self) -> bool {
        matches!(
            self,
            PlaybackState::Ready | PlaybackState::Playing | PlaybackState::Paused | PlaybackState::Ended
        )
    }
}

impl Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Loading => "loading",
            PlaybackState::Ready => "ready",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Ended => "ended",
        };
        f.write_str(name)
    }
}

/// Skip interval drawn on the progress bar, as fractions of the duration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkipMarker {
    pub kind: SkipKind,
    pub start_fraction: f64,
    pub end_fraction: f64,
}

/// Skip button currently offered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleSkip {
    pub index: usize,
    pub kind: SkipKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub state: PlaybackState,
    pub title: String,
    pub episode_label: String,
    /// Seconds shown on the elapsed label
    pub position: f64,
    pub duration: f64,
    /// Progress bar fraction; the scrub position while seeking
    pub progress: f64,
    pub elapsed_label: String,
    pub remaining_label: String,
    pub seeking: bool,
    pub controls_visible: bool,
    pub qualities: Vec<String>,
    pub current_quality: Option<String>,
    pub rate: f32,
    pub speed_indicator: Option<String>,
    pub skip_markers: Vec<SkipMarker>,
    pub visible_skips: Vec<VisibleSkip>,
    pub subtitle: Option<String>,
    pub subtitles_hidden: bool,
    pub subtitle_appearance: SubtitleAppearance,
    pub vote_prompt: bool,
    pub picture_in_picture: bool,
}

impl Default for SessionView {
    fn default() -> Self {
        Self {
            state: PlaybackState::Idle,
            title: String::new(),
            episode_label: String::new(),
            position: 0.0,
            duration: f64::NAN,
            progress: 0.0,
            elapsed_label: format_time(0.0),
            remaining_label: format_remaining(f64::NAN),
            seeking: false,
            controls_visible: true,
            qualities: Vec::new(),
            current_quality: None,
            rate: 1.0,
            speed_indicator: None,
            skip_markers: Vec::new(),
            visible_skips: Vec::new(),
            subtitle: None,
            subtitles_hidden: false,
            subtitle_appearance: SubtitleAppearance::default(),
            vote_prompt: false,
            picture_in_picture: false,
        }
    }
}

impl SessionView {
    /// Update the time labels for `position` seconds into `duration`.
    pub fn set_time(&mut self, position: f64, duration: f64) {
        self.position = position;
        self.duration = duration;
        if duration.is_finite() && duration > 0.0 {
            self.progress = (position / duration).clamp(0.0, 1.0);
            self.elapsed_label = format_time(position);
            self.remaining_label = format_remaining((duration - position).max(0.0));
        } else {
            self.progress = 0.0;
            self.elapsed_label = format_time(position);
            self.remaining_label = format_remaining(f64::NAN);
        }
    }
}
