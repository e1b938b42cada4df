// Subtitle cue synchronization
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::trace;

/// One timed subtitle entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleCue {
    pub start: f64,
    pub end: f64,
    pub original_text: String,
    /// Translations keyed by language code, filled lazily
    #[serde(default)]
    pub translations: HashMap<String, String>,
}

impl SubtitleCue {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            original_text: text.into(),
            translations: HashMap::new(),
        }
    }

    pub fn contains(&self, position: f64) -> bool {
        position >= self.start && position <= self.end
    }

    pub fn translation(&self, language: &str) -> Option<&str> {
        self.translations.get(language).map(String::as_str)
    }
}

/// Translation preferences read on every resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitlePrefs {
    pub translate: bool,
    pub language: String,
}

impl SubtitlePrefs {
    pub fn original() -> Self {
        Self {
            translate: false,
            language: String::new(),
        }
    }

    pub fn translated(language: impl Into<String>) -> Self {
        Self {
            translate: true,
            language: language.into(),
        }
    }

    /// Language to display, `None` for the original text.
    pub fn effective_language(&self) -> Option<&str> {
        (self.translate && !self.language.is_empty()).then_some(self.language.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub cue_index: usize,
    pub language: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubtitleUpdate {
    /// Same cue and language as the previous resolution
    Unchanged,
    Show {
        cue_index: usize,
        text: String,
        /// Set when the translation is missing and has not been requested yet
        translation: Option<TranslationRequest>,
    },
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Resolved {
    cue_index: Option<usize>,
    language: Option<String>,
}

/// Tracks the active cue and decides when the displayed text must change.
#[derive(Debug, Default)]
pub struct SubtitleSynchronizer {
    cues: Vec<SubtitleCue>,
    last: Option<Resolved>,
    requested: HashSet<(usize, String)>,
}

impl SubtitleSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, cues: Vec<SubtitleCue>) {
        self.cues = cues;
        self.last = None;
        self.requested.clear();
    }

    pub fn clear(&mut self) {
        self.load(Vec::new());
    }

    pub fn cues(&self) -> &[SubtitleCue] {
        &self.cues
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.last.as_ref().and_then(|r| r.cue_index)
    }

    /// Force the next resolution to report the current text again.
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    /// First cue in natural order whose closed range contains `position`.
    pub fn cue_at(&self, position: f64) -> Option<usize> {
        self.cues.iter().position(|cue| cue.contains(position))
    }

    pub fn resolve(&mut self, position: f64, prefs: &SubtitlePrefs) -> SubtitleUpdate {
        let resolved = Resolved {
            cue_index: self.cue_at(position),
            language: prefs.effective_language().map(str::to_owned),
        };
        if self.last.as_ref() == Some(&resolved) {
            return SubtitleUpdate::Unchanged;
        }
        self.last = Some(resolved.clone());

        let Some(index) = resolved.cue_index else {
            return SubtitleUpdate::Clear;
        };
        let cue = &self.cues[index];
        let Some(language) = resolved.language else {
            return SubtitleUpdate::Show {
                cue_index: index,
                text: cue.original_text.clone(),
                translation: None,
            };
        };

        if let Some(text) = cue.translation(&language) {
            return SubtitleUpdate::Show {
                cue_index: index,
                text: text.to_owned(),
                translation: None,
            };
        }

        let translation = if self.requested.insert((index, language.clone())) {
            Some(TranslationRequest {
                cue_index: index,
                language,
                text: cue.original_text.clone(),
            })
        } else {
            trace!("Translation of cue {} already requested", index);
            None
        };
        SubtitleUpdate::Show {
            cue_index: index,
            text: cue.original_text.clone(),
            translation,
        }
    }

    /// Store a finished translation.
    ///
    /// Returns the text to display when the cue and language are still the
    /// active ones.
    pub fn apply_translation(
        &mut self,
        cue_index: usize,
        language: &str,
        text: String,
    ) -> Option<String> {
        let cue = self.cues.get_mut(cue_index)?;
        cue.translations.insert(language.to_owned(), text.clone());

        let active = self.last.as_ref().is_some_and(|r| {
            r.cue_index == Some(cue_index) && r.language.as_deref() == Some(language)
        });
        active.then_some(text)
    }
}
