//! Playback session engine.
//!
//! Drives an injected media primitive through a single-owner session actor:
//! quality ladder selection, clock observation, skip intervals, subtitle
//! synchronization and resume/progress bookkeeping. All asynchronous
//! lookups run off the session task and marshal their results back as
//! events tagged with the generation that started them.

pub mod clock;
pub mod config;
pub mod error;
pub mod format;
pub mod generation;
pub mod media;
pub mod progress;
pub mod services;
pub mod session;
pub mod settings;
pub mod source;
pub mod subtitles;
pub mod timer;

#[cfg(test)]
pub(crate) mod testing;

pub use clock::{ClockObserver, Tick, TickKind};
pub use config::{PlaybackConfig, PlaybackConfigBuilder, SPEED_OPTIONS};
pub use error::PlaybackError;
pub use generation::{Generation, GenerationScope};
pub use media::{ClockSnapshot, MediaPlayer, ObservationGuard, ObservationToken, ReadySignal};
pub use progress::{ProgressContext, ProgressRecord, ProgressTracker, ProgressUpdate};
pub use services::{
    Collaborators, CompletionUpdater, CueParser, HttpManifestFetcher, HttpSubtitleSource,
    ManifestFetcher, MemoryProgressStore, ProgressSink, SubtitleSource, Translator,
};
pub use session::{PlaybackSession, PlaybackState, SessionCommand, SessionHandle, SessionView};
pub use settings::{MemorySettings, Settings, SettingsStore, SubtitleAppearance};
pub use source::{MediaRequest, MediaSource, SourceKind, episode_number};
pub use subtitles::{SubtitleCue, SubtitlePrefs, SubtitleSynchronizer, SubtitleUpdate};
