use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::lookup::{CatalogIdLookup, MappingLookup, SkipTimesService};
use crate::{SkipInterval, SkipTimesError, VoteType, normalize_title};

/// Run one pipeline stage, collapsing both "absent" and "failed" to `None`.
async fn stage<T, Fut>(name: &'static str, fut: Fut) -> Option<T>
where
    Fut: Future<Output = Result<Option<T>, SkipTimesError>>,
{
    match fut.await {
        Ok(Some(value)) => Some(value),
        Ok(None) => {
            debug!(stage = name, "Skip interval stage produced no value");
            None
        }
        Err(e) => {
            warn!(stage = name, error = %e, "Skip interval stage failed");
            None
        }
    }
}

/// Resolves the skip intervals of an episode.
///
/// Skip intervals are an enhancement: every method here degrades to an empty
/// result instead of returning an error, except voting which reports back so
/// callers can log it.
#[derive(Clone)]
pub struct SkipIntervalResolver {
    catalog: Arc<dyn CatalogIdLookup>,
    mapping: Arc<dyn MappingLookup>,
    service: Arc<dyn SkipTimesService>,
}

impl SkipIntervalResolver {
    pub fn new(
        catalog: Arc<dyn CatalogIdLookup>,
        mapping: Arc<dyn MappingLookup>,
        service: Arc<dyn SkipTimesService>,
    ) -> Self {
        Self {
            catalog,
            mapping,
            service,
        }
    }

    /// Primary catalog id for a display title.
    ///
    /// A manual override wins over the lookup, which runs on the normalized
    /// title.
    pub async fn catalog_id(&self, title: &str, override_id: Option<i64>) -> Option<i64> {
        if let Some(id) = override_id {
            debug!("Using catalog id override {} for {:?}", id, title);
            return Some(id);
        }

        let normalized = normalize_title(title);
        if normalized.is_empty() {
            return None;
        }
        stage("catalog id", self.catalog.catalog_id(&normalized)).await
    }

    pub async fn resolve(
        &self,
        title: &str,
        override_id: Option<i64>,
        episode: u32,
    ) -> Vec<SkipInterval> {
        let Some(catalog_id) = self.catalog_id(title, override_id).await else {
            return Vec::new();
        };
        let Some(secondary_id) =
            stage("secondary id", self.mapping.secondary_id(catalog_id)).await
        else {
            return Vec::new();
        };
        let fetch = async {
            self.service
                .skip_times(secondary_id, episode)
                .await
                .map(Some)
        };
        let intervals = stage("skip times", fetch).await.unwrap_or_default();

        debug!(
            "Resolved {} skip intervals for {:?} episode {} (catalog {}, secondary {})",
            intervals.len(),
            title,
            episode,
            catalog_id,
            secondary_id
        );
        intervals
    }

    pub async fn vote(&self, skip_id: &str, vote: VoteType) -> Result<(), SkipTimesError> {
        self.service.vote(skip_id, vote).await
    }
}

impl std::fmt::Debug for SkipIntervalResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkipIntervalResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SkipKind, StaticCatalogIds};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedMapping(Option<i64>);

    #[async_trait]
    impl MappingLookup for FixedMapping {
        async fn secondary_id(&self, _catalog_id: i64) -> Result<Option<i64>, SkipTimesError> {
            Ok(self.0)
        }
    }

    /// Records every title it is asked about, without normalizing them.
    #[derive(Default)]
    struct RecordingCatalog {
        titles: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CatalogIdLookup for RecordingCatalog {
        async fn catalog_id(&self, title: &str) -> Result<Option<i64>, SkipTimesError> {
            self.titles.lock().unwrap().push(title.to_string());
            Ok((title == "Example").then_some(7))
        }
    }

    struct FailingMapping;

    #[async_trait]
    impl MappingLookup for FailingMapping {
        async fn secondary_id(&self, _catalog_id: i64) -> Result<Option<i64>, SkipTimesError> {
            Err(SkipTimesError::catalog("unreachable"))
        }
    }

    #[derive(Default)]
    struct RecordingService {
        requests: Mutex<Vec<(i64, u32)>>,
    }

    #[async_trait]
    impl SkipTimesService for RecordingService {
        async fn skip_times(
            &self,
            secondary_id: i64,
            episode: u32,
        ) -> Result<Vec<SkipInterval>, SkipTimesError> {
            self.requests.lock().unwrap().push((secondary_id, episode));
            Ok(vec![SkipInterval {
                kind: SkipKind::Intro,
                start_seconds: 30.0,
                end_seconds: 120.0,
                skip_id: "op-1".to_string(),
            }])
        }

        async fn vote(&self, _skip_id: &str, _vote: VoteType) -> Result<(), SkipTimesError> {
            Ok(())
        }
    }

    fn resolver(
        catalog: StaticCatalogIds,
        mapping: Arc<dyn MappingLookup>,
        service: Arc<RecordingService>,
    ) -> SkipIntervalResolver {
        SkipIntervalResolver::new(Arc::new(catalog), mapping, service)
    }

    #[tokio::test]
    async fn test_full_pipeline() {
        let service = Arc::new(RecordingService::default());
        let resolver = resolver(
            StaticCatalogIds::new().with("Example", 7),
            Arc::new(FixedMapping(Some(700))),
            service.clone(),
        );

        let intervals = resolver.resolve("Example (Dub)", None, 4).await;

        assert_eq!(intervals.len(), 1);
        assert_eq!(*service.requests.lock().unwrap(), vec![(700, 4)]);
    }

    #[tokio::test]
    async fn test_catalog_lookup_receives_normalized_title() {
        let catalog = Arc::new(RecordingCatalog::default());
        let service = Arc::new(RecordingService::default());
        let resolver = SkipIntervalResolver::new(
            catalog.clone(),
            Arc::new(FixedMapping(Some(700))),
            service.clone(),
        );

        let intervals = resolver.resolve("Example (Dub)", None, 2).await;

        assert_eq!(*catalog.titles.lock().unwrap(), vec!["Example".to_string()]);
        assert_eq!(intervals.len(), 1);
        assert_eq!(*service.requests.lock().unwrap(), vec![(700, 2)]);
    }

    #[tokio::test]
    async fn test_blank_title_never_looked_up() {
        let catalog = Arc::new(RecordingCatalog::default());
        let resolver = SkipIntervalResolver::new(
            catalog.clone(),
            Arc::new(FixedMapping(Some(700))),
            Arc::new(RecordingService::default()),
        );

        assert_eq!(resolver.catalog_id(" \"\" (Dub)", None).await, None);
        assert!(catalog.titles.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_override_skips_catalog_lookup() {
        let service = Arc::new(RecordingService::default());
        let resolver = resolver(
            StaticCatalogIds::new(),
            Arc::new(FixedMapping(Some(9))),
            service.clone(),
        );

        assert_eq!(resolver.catalog_id("Unknown", Some(123)).await, Some(123));
        assert_eq!(resolver.resolve("Unknown", Some(123), 1).await.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_title_short_circuits() {
        let service = Arc::new(RecordingService::default());
        let resolver = resolver(
            StaticCatalogIds::new(),
            Arc::new(FixedMapping(Some(9))),
            service.clone(),
        );

        assert!(resolver.resolve("Unknown", None, 1).await.is_empty());
        assert!(service.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_mapping_short_circuits() {
        let service = Arc::new(RecordingService::default());
        let resolver = resolver(
            StaticCatalogIds::new().with("Example", 7),
            Arc::new(FixedMapping(None)),
            service.clone(),
        );

        assert!(resolver.resolve("Example", None, 1).await.is_empty());
        assert!(service.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_stage_degrades_to_empty() {
        let service = Arc::new(RecordingService::default());
        let resolver = resolver(
            StaticCatalogIds::new().with("Example", 7),
            Arc::new(FailingMapping),
            service.clone(),
        );

        assert!(resolver.resolve("Example", None, 1).await.is_empty());
    }
}
