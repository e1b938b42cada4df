use std::collections::HashMap;

use async_trait::async_trait;

use crate::{SkipInterval, SkipTimesError, VoteType, normalize_title};

/// Resolves a normalized title to its primary catalog id.
#[async_trait]
pub trait CatalogIdLookup: Send + Sync {
    async fn catalog_id(&self, title: &str) -> Result<Option<i64>, SkipTimesError>;
}

/// Maps a primary catalog id to the secondary id the skip-time service uses.
#[async_trait]
pub trait MappingLookup: Send + Sync {
    async fn secondary_id(&self, catalog_id: i64) -> Result<Option<i64>, SkipTimesError>;
}

/// Community skip-time service.
#[async_trait]
pub trait SkipTimesService: Send + Sync {
    /// Intro/outro intervals for one episode. Unknown kinds are filtered out.
    async fn skip_times(
        &self,
        secondary_id: i64,
        episode: u32,
    ) -> Result<Vec<SkipInterval>, SkipTimesError>;

    async fn vote(&self, skip_id: &str, vote: VoteType) -> Result<(), SkipTimesError>;
}

/// Fixed title → catalog id table.
///
/// Titles are normalized on insert and on lookup.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalogIds {
    ids: HashMap<String, i64>,
}

impl StaticCatalogIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, title: &str, id: i64) -> Self {
        self.insert(title, id);
        self
    }

    pub fn insert(&mut self, title: &str, id: i64) {
        self.ids.insert(normalize_title(title).to_lowercase(), id);
    }
}

#[async_trait]
impl CatalogIdLookup for StaticCatalogIds {
    async fn catalog_id(&self, title: &str) -> Result<Option<i64>, SkipTimesError> {
        Ok(self.ids.get(&normalize_title(title).to_lowercase()).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_ids_match_normalized_titles() {
        let ids = StaticCatalogIds::new().with("Example", 42);

        assert_eq!(ids.catalog_id("example (Dub)").await.unwrap(), Some(42));
        assert_eq!(ids.catalog_id("Other").await.unwrap(), None);
    }
}
