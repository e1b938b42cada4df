use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use tracing::{debug, info};
use url::Url;

use crate::lookup::{MappingLookup, SkipTimesService};
use crate::models::{MappingsResponse, SkipTimesResponse, VoteRequest};
use crate::{SkipInterval, SkipTimesConfig, SkipTimesError, VoteType};

/// Parse a base URL, making sure relative joins keep its last path segment.
fn parse_base_url(input: &str) -> Result<Url, SkipTimesError> {
    let mut base = input.trim().to_owned();
    if !base.ends_with('/') {
        base.push('/');
    }
    Url::parse(&base).map_err(|e| SkipTimesError::invalid_url(input, e.to_string()))
}

/// Client for the id mapping service.
#[derive(Debug, Clone)]
pub struct AniZipClient {
    client: Client,
    base_url: Url,
    query_param: String,
}

impl AniZipClient {
    pub fn new(client: Client, config: &SkipTimesConfig) -> Result<Self, SkipTimesError> {
        Ok(Self {
            client,
            base_url: parse_base_url(&config.mappings_base_url)?,
            query_param: config.mapping_query_param.clone(),
        })
    }

    pub fn mappings_url(&self, catalog_id: i64) -> Result<Url, SkipTimesError> {
        let mut url = self
            .base_url
            .join("mappings")
            .map_err(|e| SkipTimesError::invalid_url(self.base_url.as_str(), e.to_string()))?;
        url.query_pairs_mut()
            .append_pair(&self.query_param, &catalog_id.to_string());
        Ok(url)
    }
}

#[async_trait]
impl MappingLookup for AniZipClient {
    async fn secondary_id(&self, catalog_id: i64) -> Result<Option<i64>, SkipTimesError> {
        let url = self.mappings_url(catalog_id)?;
        let response = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!("No mapping for catalog id {}", catalog_id);
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SkipTimesError::http_status(status, url, "mapping lookup"));
        }

        let body = response.text().await?;
        let mappings: MappingsResponse =
            serde_json::from_str(&body).map_err(|e| SkipTimesError::json("mapping lookup", e))?;
        Ok(mappings.mal_id())
    }
}

/// Client for the community skip-time service.
#[derive(Debug, Clone)]
pub struct AniSkipClient {
    client: Client,
    base_url: Url,
}

impl AniSkipClient {
    pub fn new(client: Client, config: &SkipTimesConfig) -> Result<Self, SkipTimesError> {
        Ok(Self {
            client,
            base_url: parse_base_url(&config.skip_times_base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn skip_times_url(&self, secondary_id: i64, episode: u32) -> Result<Url, SkipTimesError> {
        let mut url = self
            .base_url
            .join(&format!("v1/skip-times/{secondary_id}/{episode}"))
            .map_err(|e| SkipTimesError::invalid_url(self.base_url.as_str(), e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("types", "op")
            .append_pair("types", "ed");
        Ok(url)
    }

    pub fn vote_url(&self, skip_id: &str) -> Result<Url, SkipTimesError> {
        self.base_url
            .join(&format!("v1/skip-times/vote/{skip_id}"))
            .map_err(|e| SkipTimesError::invalid_url(self.base_url.as_str(), e.to_string()))
    }
}

#[async_trait]
impl SkipTimesService for AniSkipClient {
    async fn skip_times(
        &self,
        secondary_id: i64,
        episode: u32,
    ) -> Result<Vec<SkipInterval>, SkipTimesError> {
        let url = self.skip_times_url(secondary_id, episode)?;
        let response = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        // the service answers 404 when nobody submitted times for the episode
        if status == StatusCode::NOT_FOUND {
            debug!("No skip times for {} episode {}", secondary_id, episode);
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(SkipTimesError::http_status(status, url, "skip-time lookup"));
        }

        let body = response.text().await?;
        let parsed: SkipTimesResponse =
            serde_json::from_str(&body).map_err(|e| SkipTimesError::json("skip-time lookup", e))?;
        let intervals = parsed.into_intervals();
        debug!(
            "Fetched {} skip intervals for {} episode {}",
            intervals.len(),
            secondary_id,
            episode
        );
        Ok(intervals)
    }

    async fn vote(&self, skip_id: &str, vote: VoteType) -> Result<(), SkipTimesError> {
        let url = self.vote_url(skip_id)?;
        let response = self
            .client
            .post(url.clone())
            .header(header::ACCEPT, "application/json")
            .json(&VoteRequest { vote_type: vote })
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::CREATED {
            return Err(SkipTimesError::http_status(status, url, "skip-time vote"));
        }
        info!("Sent {} for skip interval {}", vote, skip_id);
        Ok(())
    }
}
