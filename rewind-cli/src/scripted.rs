// Offline skip-time service backed by command line intervals
use async_trait::async_trait;
use parking_lot::Mutex;
use skip_times::{
    MappingLookup, SkipInterval, SkipKind, SkipTimesError, SkipTimesService, VoteType,
};
use tracing::info;

/// Serves a fixed set of intervals for every episode and records votes.
///
/// Also acts as the id mapping so a session can resolve without network
/// access: every catalog id maps to itself.
#[derive(Debug, Default)]
pub struct ScriptedSkipTimes {
    intervals: Vec<SkipInterval>,
    votes: Mutex<Vec<(String, VoteType)>>,
}

impl ScriptedSkipTimes {
    pub fn new(intro: Option<(f64, f64)>, outro: Option<(f64, f64)>) -> Self {
        let intervals = [(SkipKind::Intro, intro), (SkipKind::Outro, outro)]
            .into_iter()
            .filter_map(|(kind, range)| {
                range.map(|(start, end)| SkipInterval {
                    kind,
                    start_seconds: start,
                    end_seconds: end,
                    skip_id: format!("scripted-{}", kind.api_name()),
                })
            })
            .collect();
        Self {
            intervals,
            votes: Mutex::new(Vec::new()),
        }
    }

    pub fn intervals(&self) -> &[SkipInterval] {
        &self.intervals
    }

    pub fn votes(&self) -> Vec<(String, VoteType)> {
        self.votes.lock().clone()
    }
}

#[async_trait]
impl MappingLookup for ScriptedSkipTimes {
    async fn secondary_id(&self, catalog_id: i64) -> Result<Option<i64>, SkipTimesError> {
        Ok(Some(catalog_id))
    }
}

#[async_trait]
impl SkipTimesService for ScriptedSkipTimes {
    async fn skip_times(
        &self,
        _secondary_id: i64,
        _episode: u32,
    ) -> Result<Vec<SkipInterval>, SkipTimesError> {
        Ok(self.intervals.clone())
    }

    async fn vote(&self, skip_id: &str, vote: VoteType) -> Result<(), SkipTimesError> {
        info!("Recorded {} for {}", vote, skip_id);
        self.votes.lock().push((skip_id.to_owned(), vote));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_intervals() {
        let scripted = ScriptedSkipTimes::new(Some((30.0, 120.0)), None);

        let intervals = scripted.skip_times(1, 3).await.unwrap();
        assert_eq!(intervals.len(), 1);
        assert_eq!(intervals[0].kind, SkipKind::Intro);
        assert_eq!(intervals[0].skip_id, "scripted-op");
        assert_eq!(scripted.secondary_id(7).await.unwrap(), Some(7));
    }

    #[tokio::test]
    async fn test_votes_recorded() {
        let scripted = ScriptedSkipTimes::new(None, Some((1300.0, 1390.0)));
        scripted.vote("scripted-ed", VoteType::Upvote).await.unwrap();

        assert_eq!(
            scripted.votes(),
            vec![("scripted-ed".to_string(), VoteType::Upvote)]
        );
    }
}
