//! Skip interval resolution for episodic media.
//!
//! Resolves a display title and episode number to the intro/outro intervals
//! published by a community skip-time service. Resolution is a chain of three
//! lookups (title → catalog id → secondary id → intervals) where every stage
//! degrades to "no intervals" instead of failing.

mod client;
mod config;
mod error;
mod interval;
mod lookup;
mod models;
mod resolver;
mod title;

pub use client::{AniSkipClient, AniZipClient};
pub use config::{
    DEFAULT_MAPPINGS_BASE_URL, DEFAULT_SKIP_TIMES_BASE_URL, DEFAULT_USER_AGENT, SkipTimesConfig,
    SkipTimesConfigBuilder,
};
pub use error::SkipTimesError;
pub use interval::{SkipInterval, SkipKind, VoteType};
pub use lookup::{CatalogIdLookup, MappingLookup, SkipTimesService, StaticCatalogIds};
pub use resolver::SkipIntervalResolver;
pub use title::normalize_title;
