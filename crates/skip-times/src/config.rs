use std::time::Duration;

use reqwest::Client;

use crate::SkipTimesError;

pub const DEFAULT_SKIP_TIMES_BASE_URL: &str = "https://api.aniskip.com/";
pub const DEFAULT_MAPPINGS_BASE_URL: &str = "https://api.ani.zip/";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";

/// Configuration for the skip-time and mapping HTTP clients
#[derive(Debug, Clone)]
pub struct SkipTimesConfig {
    /// Base URL of the skip-time service (`{base}/v1/skip-times/...`)
    pub skip_times_base_url: String,

    /// Base URL of the id mapping service (`{base}/mappings?...`)
    pub mappings_base_url: String,

    /// Query parameter carrying the catalog id on mapping requests
    pub mapping_query_param: String,

    /// Overall timeout for a single request
    pub timeout: Duration,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// User agent string
    pub user_agent: String,
}

impl Default for SkipTimesConfig {
    fn default() -> Self {
        Self {
            skip_times_base_url: DEFAULT_SKIP_TIMES_BASE_URL.to_owned(),
            mappings_base_url: DEFAULT_MAPPINGS_BASE_URL.to_owned(),
            mapping_query_param: "anilist_id".to_owned(),
            timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl SkipTimesConfig {
    pub fn builder() -> SkipTimesConfigBuilder {
        SkipTimesConfigBuilder::new()
    }

    /// Build a `reqwest` client honouring the timeouts and user agent.
    pub fn build_client(&self) -> Result<Client, SkipTimesError> {
        Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.connect_timeout)
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(SkipTimesError::from)
    }
}

/// Builder for [`SkipTimesConfig`]
#[derive(Debug, Default)]
pub struct SkipTimesConfigBuilder {
    config: SkipTimesConfig,
}

impl SkipTimesConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip_times_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.skip_times_base_url = url.into();
        self
    }

    /// Use a self-hosted skip-time instance when one is configured.
    ///
    /// Blank values keep the current base URL.
    pub fn skip_times_instance(mut self, instance: Option<&str>) -> Self {
        if let Some(instance) = instance.map(str::trim).filter(|s| !s.is_empty()) {
            self.config.skip_times_base_url = instance.to_owned();
        }
        self
    }

    pub fn mappings_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.mappings_base_url = url.into();
        self
    }

    pub fn mapping_query_param(mut self, param: impl Into<String>) -> Self {
        self.config.mapping_query_param = param.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> SkipTimesConfig {
        self.config
    }
}
