// Session inputs
use skip_times::{SkipInterval, VoteType};
use url::Url;

use crate::clock::Tick;
use crate::settings::SubtitleAppearance;
use crate::source::MediaRequest;
use crate::subtitles::SubtitleCue;
use crate::{Generation, PlaybackError};

/// User-facing commands accepted by a session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Open(Box<MediaRequest>),
    Play,
    Pause,
    TogglePlayPause,
    /// Relative seek by the given number of seconds
    SeekBy(f64),
    /// Jump back by the configured seek step
    Rewind,
    /// Jump ahead by the configured seek step
    Forward,
    /// Tap on the progress bar at a fraction of the duration
    SeekToFraction(f64),
    BeginScrub(f64),
    UpdateScrub(f64),
    EndScrub(f64),
    SetRate(f32),
    BeginHoldSpeed,
    EndHoldSpeed,
    /// Switch to the ladder entry at this index
    ChangeQuality(usize),
    /// Skip the interval at this index
    Skip(usize),
    TapSurface,
    ToggleSubtitles,
    SetTranslation(bool),
    SetTranslationLanguage(String),
    SetSubtitleAppearance(SubtitleAppearance),
    Vote(VoteType),
    DismissVotePrompt,
    TogglePictureInPicture,
    Dismiss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    EndOfMedia,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPurpose {
    HideControls,
    SubtitlePoll,
    SkipVisibility,
}

/// Position and playing flag captured before a quality switch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RestorePoint {
    pub position: f64,
    pub was_playing: bool,
}

/// What to do once a newly attached source is ready
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceSwap {
    Initial { resume_at: Option<f64> },
    Quality(RestorePoint),
}

/// Completed asynchronous work, always delivered with its generation.
#[derive(Debug)]
pub enum LookupOutcome {
    Manifest {
        url: Url,
        result: Result<String, PlaybackError>,
    },
    SourceReady {
        swap_id: u64,
        swap: SourceSwap,
        ready: bool,
    },
    SkipIntervals(Vec<SkipInterval>),
    Subtitles(Result<Vec<SubtitleCue>, PlaybackError>),
    Translation {
        cue_index: usize,
        language: String,
        result: Result<String, PlaybackError>,
    },
}

impl LookupOutcome {
    pub fn name(&self) -> &'static str {
        match self {
            LookupOutcome::Manifest { .. } => "manifest",
            LookupOutcome::SourceReady { .. } => "source readiness",
            LookupOutcome::SkipIntervals(_) => "skip intervals",
            LookupOutcome::Subtitles(_) => "subtitles",
            LookupOutcome::Translation { .. } => "translation",
        }
    }
}

#[derive(Debug)]
pub enum SessionEvent {
    Command(SessionCommand),
    Media(MediaEvent),
    Tick(Tick),
    Timer {
        purpose: TimerPurpose,
        generation: Generation,
    },
    Lookup {
        generation: Generation,
        outcome: LookupOutcome,
    },
}

impl From<Tick> for SessionEvent {
    fn from(tick: Tick) -> Self {
        SessionEvent::Tick(tick)
    }
}

impl From<SessionCommand> for SessionEvent {
    fn from(command: SessionCommand) -> Self {
        SessionEvent::Command(command)
    }
}
