// User preferences behind an injected store
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use skip_times::{SkipKind, SkipTimesConfig, SkipTimesConfigBuilder};
use tracing::warn;

/// Key/value store for user preferences.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&self, key: &str, value: Value);
}

/// In-memory [`SettingsStore`]
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: RwLock<HashMap<String, Value>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        self.values.write().insert(key.to_owned(), value);
    }
}

pub mod keys {
    pub const PREFERRED_QUALITY: &str = "player.preferred_quality";
    pub const AUTO_SKIP_INTRO: &str = "skip.auto_intro";
    pub const AUTO_SKIP_OUTRO: &str = "skip.auto_outro";
    pub const SKIP_FEEDBACK: &str = "skip.feedback";
    pub const SKIP_TIMES_INSTANCE: &str = "skip.instance_url";
    pub const COMPLETION_UPDATES: &str = "tracking.send_updates";
    pub const TRANSLATION_ENABLED: &str = "subtitles.translation_enabled";
    pub const TRANSLATION_LANGUAGE: &str = "subtitles.translation_language";
    pub const SUBTITLES_HIDDEN: &str = "subtitles.hidden";
    pub const SUBTITLE_APPEARANCE: &str = "subtitles.appearance";
    pub const HOLD_SPEED: &str = "player.hold_speed";

    pub fn last_position(source_id: &str) -> String {
        format!("progress.{source_id}.position")
    }

    pub fn total_duration(source_id: &str) -> String {
        format!("progress.{source_id}.duration")
    }

    pub fn catalog_override(title: &str) -> String {
        format!("catalog.override.{title}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleAppearance {
    pub font_size: f32,
    pub color: String,
    pub border_width: f32,
    pub border_color: String,
}

impl Default for SubtitleAppearance {
    fn default() -> Self {
        Self {
            font_size: 20.0,
            color: "#FFFFFF".to_owned(),
            border_width: 1.0,
            border_color: "#000000".to_owned(),
        }
    }
}

/// Typed accessors over a [`SettingsStore`]
#[derive(Clone)]
pub struct Settings {
    store: Arc<dyn SettingsStore>,
}

impl Settings {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySettings::new()))
    }

    fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.store.get(key)?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Ignoring malformed setting {}: {}", key, e);
                None
            }
        }
    }

    fn put<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(v) => self.store.set(key, v),
            Err(e) => warn!("Failed to store setting {}: {}", key, e),
        }
    }

    fn flag(&self, key: &str) -> bool {
        self.get_as(key).unwrap_or(false)
    }

    pub fn auto_skip(&self, kind: SkipKind) -> bool {
        match kind {
            SkipKind::Intro => self.flag(keys::AUTO_SKIP_INTRO),
            SkipKind::Outro => self.flag(keys::AUTO_SKIP_OUTRO),
        }
    }

    pub fn set_auto_skip(&self, kind: SkipKind, enabled: bool) {
        let key = match kind {
            SkipKind::Intro => keys::AUTO_SKIP_INTRO,
            SkipKind::Outro => keys::AUTO_SKIP_OUTRO,
        };
        self.put(key, &enabled);
    }

    pub fn skip_feedback_enabled(&self) -> bool {
        self.flag(keys::SKIP_FEEDBACK)
    }

    pub fn set_skip_feedback(&self, enabled: bool) {
        self.put(keys::SKIP_FEEDBACK, &enabled);
    }

    pub fn completion_updates_enabled(&self) -> bool {
        self.flag(keys::COMPLETION_UPDATES)
    }

    pub fn set_completion_updates(&self, enabled: bool) {
        self.put(keys::COMPLETION_UPDATES, &enabled);
    }

    /// Self-hosted skip-time service URL, if the user configured one.
    pub fn skip_times_instance(&self) -> Option<String> {
        self.get_as(keys::SKIP_TIMES_INSTANCE)
    }

    pub fn set_skip_times_instance(&self, url: &str) {
        self.put(keys::SKIP_TIMES_INSTANCE, &url);
    }

    /// Finish `builder`, pointing it at the saved skip-time instance if any.
    pub fn skip_times_config(&self, builder: SkipTimesConfigBuilder) -> SkipTimesConfig {
        builder
            .skip_times_instance(self.skip_times_instance().as_deref())
            .build()
    }

    pub fn preferred_quality(&self) -> Option<String> {
        self.get_as(keys::PREFERRED_QUALITY)
    }

    pub fn set_preferred_quality(&self, label: &str) {
        self.put(keys::PREFERRED_QUALITY, &label);
    }

    /// Manual catalog id for a title. Stored either as a number or a string.
    pub fn catalog_override(&self, title: &str) -> Option<i64> {
        match self.store.get(&keys::catalog_override(title))? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn set_catalog_override(&self, title: &str, id: i64) {
        self.put(&keys::catalog_override(title), &id);
    }

    pub fn last_position(&self, source_id: &str) -> Option<f64> {
        self.get_as(&keys::last_position(source_id))
    }

    pub fn total_duration(&self, source_id: &str) -> Option<f64> {
        self.get_as(&keys::total_duration(source_id))
    }

    pub fn save_position(&self, source_id: &str, position: f64, duration: f64) {
        self.put(&keys::last_position(source_id), &position);
        self.put(&keys::total_duration(source_id), &duration);
    }

    pub fn translation_enabled(&self) -> bool {
        self.flag(keys::TRANSLATION_ENABLED)
    }

    pub fn set_translation_enabled(&self, enabled: bool) {
        self.put(keys::TRANSLATION_ENABLED, &enabled);
    }

    pub fn translation_language(&self) -> String {
        self.get_as(keys::TRANSLATION_LANGUAGE)
            .unwrap_or_else(|| "en".to_owned())
    }

    pub fn set_translation_language(&self, language: &str) {
        self.put(keys::TRANSLATION_LANGUAGE, &language);
    }

    pub fn subtitles_hidden(&self) -> bool {
        self.flag(keys::SUBTITLES_HIDDEN)
    }

    pub fn set_subtitles_hidden(&self, hidden: bool) {
        self.put(keys::SUBTITLES_HIDDEN, &hidden);
    }

    pub fn subtitle_appearance(&self) -> SubtitleAppearance {
        self.get_as(keys::SUBTITLE_APPEARANCE).unwrap_or_default()
    }

    pub fn set_subtitle_appearance(&self, appearance: &SubtitleAppearance) {
        self.put(keys::SUBTITLE_APPEARANCE, appearance);
    }

    pub fn hold_speed(&self) -> Option<f32> {
        self.get_as::<f32>(keys::HOLD_SPEED)
            .filter(|rate| rate.is_finite() && *rate > 0.0)
    }

    pub fn set_hold_speed(&self, rate: f32) {
        self.put(keys::HOLD_SPEED, &rate);
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings").finish_non_exhaustive()
    }
}
