use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::interval::{SkipInterval, SkipKind, VoteType};

/// Response of the id mapping service (`/mappings`)
#[derive(Debug, Deserialize)]
pub struct MappingsResponse {
    #[serde(default)]
    pub mappings: Option<Mappings>,
}

#[derive(Debug, Deserialize)]
pub struct Mappings {
    #[serde(default)]
    pub mal_id: Option<i64>,
}

impl MappingsResponse {
    pub fn mal_id(&self) -> Option<i64> {
        self.mappings.as_ref().and_then(|m| m.mal_id)
    }
}

/// Response of `GET /v1/skip-times/{id}/{episode}`
///
/// Results are kept as raw values so that one malformed entry does not
/// discard the whole list.
#[derive(Debug, Deserialize)]
pub struct SkipTimesResponse {
    #[serde(default)]
    pub found: bool,
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct SkipTimeResult {
    pub interval: IntervalModel,
    pub skip_type: String,
    pub skip_id: String,
}

#[derive(Debug, Deserialize)]
pub struct IntervalModel {
    pub start_time: f64,
    pub end_time: f64,
}

impl SkipTimesResponse {
    /// Convert to domain intervals, keeping only intro and outro entries.
    pub fn into_intervals(self) -> Vec<SkipInterval> {
        self.results
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<SkipTimeResult>(value) {
                Ok(result) => Some(result),
                Err(e) => {
                    debug!("Dropping malformed skip-time result: {}", e);
                    None
                }
            })
            .filter_map(|result| {
                let kind = SkipKind::from_api(&result.skip_type)?;
                if !(result.interval.end_time >= result.interval.start_time) {
                    debug!(
                        "Dropping inverted interval {} ({} > {})",
                        result.skip_id, result.interval.start_time, result.interval.end_time
                    );
                    return None;
                }
                Some(SkipInterval {
                    kind,
                    start_seconds: result.interval.start_time,
                    end_seconds: result.interval.end_time,
                    skip_id: result.skip_id,
                })
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct VoteRequest {
    pub vote_type: VoteType,
}
