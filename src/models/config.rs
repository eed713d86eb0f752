//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Source;
use crate::utils::retry::RetryPolicy;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client, retry and pacing settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Multi-source fetch behavior
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Keyword/sentiment analysis settings
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Per-platform switches, endpoints and credentials
    #[serde(default)]
    pub sources: SourcesConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Overlay credentials from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Overlay credentials from an arbitrary key lookup.
    ///
    /// Empty values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("RAKUTEN_APP_ID") {
            self.sources.rakuten.credentials.app_id = Some(v);
        }
        if let Some(v) = get("BOOKING_USERNAME") {
            self.sources.booking.credentials.username = Some(v);
        }
        if let Some(v) = get("BOOKING_PASSWORD") {
            self.sources.booking.credentials.password = Some(v);
        }
        if let Some(v) = get("EXPEDIA_CLIENT_ID") {
            self.sources.expedia.credentials.client_id = Some(v);
        }
        if let Some(v) = get("EXPEDIA_CLIENT_SECRET") {
            self.sources.expedia.credentials.client_secret = Some(v);
        }
        if let Some(v) = get("AGODA_API_KEY") {
            self.sources.agoda.credentials.api_key = Some(v);
        }
        if let Some(v) = get("AGODA_PARTNER_ID") {
            self.sources.agoda.credentials.partner_id = Some(v);
        }
    }

    /// Settings for one source.
    pub fn source_settings(&self, source: Source) -> &SourceSettings {
        match source {
            Source::Rakuten => &self.sources.rakuten,
            Source::Jalan => &self.sources.jalan,
            Source::Booking => &self.sources.booking,
            Source::Expedia => &self.sources.expedia,
            Source::Agoda => &self.sources.agoda,
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if !(self.http.backoff_factor.is_finite() && self.http.backoff_factor > 0.0) {
            return Err(AppError::validation("http.backoff_factor must be > 0"));
        }
        if self.fetch.default_limit == 0 {
            return Err(AppError::validation("fetch.default_limit must be > 0"));
        }
        let limits = [
            ("keyword_limit", self.analysis.keyword_limit),
            ("sentiment_keyword_limit", self.analysis.sentiment_keyword_limit),
            ("ota_keyword_limit", self.analysis.ota_keyword_limit),
        ];
        for (name, limit) in limits {
            if !(1..=100).contains(&limit) {
                return Err(AppError::validation(format!(
                    "analysis.{name} must be between 1 and 100"
                )));
            }
        }
        if self.analysis.min_frequency == 0 {
            return Err(AppError::validation("analysis.min_frequency must be > 0"));
        }
        for source in Source::all() {
            let settings = self.source_settings(source);
            if let Some(endpoint) = &settings.endpoint {
                url::Url::parse(endpoint).map_err(|e| {
                    AppError::validation(format!("sources.{source}.endpoint is invalid: {e}"))
                })?;
            }
        }
        Ok(())
    }
}

/// HTTP client, retry and pacing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Pause after each successful request, in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Additional attempts after the first failure
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Delay before retry `n` is `backoff_factor^n` seconds
    #[serde(default = "defaults::backoff_factor")]
    pub backoff_factor: f64,
}

impl HttpConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.backoff_factor)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            max_retries: defaults::max_retries(),
            backoff_factor: defaults::backoff_factor(),
        }
    }
}

/// Multi-source fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Reviews per source when the caller gives no limit
    #[serde(default = "defaults::default_limit")]
    pub default_limit: usize,

    /// Deadline for one source's search + fetch; 0 disables it
    #[serde(default = "defaults::per_source_timeout")]
    pub per_source_timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            default_limit: defaults::default_limit(),
            per_source_timeout_secs: defaults::per_source_timeout(),
        }
    }
}

/// Analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Overall top keywords
    #[serde(default = "defaults::keyword_limit")]
    pub keyword_limit: usize,

    /// Keywords for each of the positive/negative lists
    #[serde(default = "defaults::sentiment_keyword_limit")]
    pub sentiment_keyword_limit: usize,

    /// Keywords per source breakdown
    #[serde(default = "defaults::ota_keyword_limit")]
    pub ota_keyword_limit: usize,

    /// Minimum occurrences for a keyword to be ranked
    #[serde(default = "defaults::min_frequency")]
    pub min_frequency: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            keyword_limit: defaults::keyword_limit(),
            sentiment_keyword_limit: defaults::sentiment_keyword_limit(),
            ota_keyword_limit: defaults::ota_keyword_limit(),
            min_frequency: defaults::min_frequency(),
        }
    }
}

/// Settings for every source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "defaults::rakuten")]
    pub rakuten: SourceSettings,
    #[serde(default)]
    pub jalan: SourceSettings,
    #[serde(default = "defaults::booking")]
    pub booking: SourceSettings,
    #[serde(default = "defaults::expedia")]
    pub expedia: SourceSettings,
    #[serde(default = "defaults::agoda")]
    pub agoda: SourceSettings,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            rakuten: defaults::rakuten(),
            jalan: SourceSettings::default(),
            booking: defaults::booking(),
            expedia: defaults::expedia(),
            agoda: defaults::agoda(),
        }
    }
}

/// Switch, endpoint and credentials for one source.
///
/// A disabled source uses synthesized demo data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceSettings {
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of the platform API
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub credentials: Credentials,
}

/// Credential fields; each source reads the ones it needs.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub partner_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    /// OAuth2 token endpoint
    #[serde(default)]
    pub token_url: Option<String>,
}

// Secrets stay out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("app_id", &mask(&self.app_id))
            .field("api_key", &mask(&self.api_key))
            .field("partner_id", &mask(&self.partner_id))
            .field("username", &self.username)
            .field("password", &mask(&self.password))
            .field("client_id", &mask(&self.client_id))
            .field("client_secret", &mask(&self.client_secret))
            .field("token_url", &self.token_url)
            .finish()
    }
}

mod defaults {
    use super::{Credentials, SourceSettings};

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
            .into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        1000
    }
    pub fn max_retries() -> u32 {
        3
    }
    pub fn backoff_factor() -> f64 {
        2.0
    }

    // Fetch defaults
    pub fn default_limit() -> usize {
        100
    }
    pub fn per_source_timeout() -> u64 {
        120
    }

    // Analysis defaults
    pub fn keyword_limit() -> usize {
        30
    }
    pub fn sentiment_keyword_limit() -> usize {
        10
    }
    pub fn ota_keyword_limit() -> usize {
        10
    }
    pub fn min_frequency() -> usize {
        2
    }

    // Source defaults
    pub fn rakuten() -> SourceSettings {
        SourceSettings {
            enabled: true,
            endpoint: Some(
                "https://app.rakuten.co.jp/services/api/Travel/KeywordHotelSearch/20170426".into(),
            ),
            credentials: Credentials::default(),
        }
    }
    pub fn booking() -> SourceSettings {
        SourceSettings {
            enabled: false,
            endpoint: Some("https://distribution-xml.booking.com/2.7/json".into()),
            credentials: Credentials::default(),
        }
    }
    pub fn expedia() -> SourceSettings {
        SourceSettings {
            enabled: false,
            endpoint: Some("https://api.expedia.com/reviews/v3".into()),
            credentials: Credentials {
                token_url: Some("https://api.expedia.com/identity/oauth2/v3/token".into()),
                ..Credentials::default()
            },
        }
    }
    pub fn agoda() -> SourceSettings {
        SourceSettings {
            enabled: false,
            endpoint: Some("https://affiliateapi.agoda.com/reviews".into()),
            credentials: Credentials::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.http.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_keyword_limit() {
        let mut config = Config::default();
        config.analysis.keyword_limit = 0;
        assert!(config.validate().is_err());
        config.analysis.keyword_limit = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_secondary_keyword_limits() {
        let mut config = Config::default();
        config.analysis.sentiment_keyword_limit = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.analysis.ota_keyword_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_invalid_endpoint() {
        let mut config = Config::default();
        config.sources.agoda.endpoint = Some("not a url".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_partial_toml_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[http]
max_retries = 1

[sources.booking]
enabled = true

[sources.booking.credentials]
username = "hotel-admin"
password = "secret"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.http.max_retries, 1);
        assert_eq!(config.http.timeout_secs, 30);
        assert!(config.sources.booking.enabled);
        assert_eq!(
            config.sources.booking.credentials.username.as_deref(),
            Some("hotel-admin")
        );
        // Untouched sections keep their defaults
        assert!(config.sources.expedia.credentials.token_url.is_some());
        assert_eq!(config.analysis.keyword_limit, 30);
    }

    #[test]
    fn load_or_default_falls_back() {
        let config = Config::load_or_default("/nonexistent/hotelscope.toml");
        assert_eq!(config.fetch.default_limit, 100);
    }

    #[test]
    fn env_overrides_credentials() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("RAKUTEN_APP_ID", "app-123"),
            ("AGODA_API_KEY", "key-9"),
            ("EXPEDIA_CLIENT_ID", ""),
        ]);
        let mut config = Config::default();
        config.apply_env_with(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(
            config.sources.rakuten.credentials.app_id.as_deref(),
            Some("app-123")
        );
        assert_eq!(config.sources.agoda.credentials.api_key.as_deref(), Some("key-9"));
        assert!(config.sources.expedia.credentials.client_id.is_none());
    }

    #[test]
    fn debug_masks_secrets() {
        let creds = Credentials {
            password: Some("hunter2".into()),
            ..Credentials::default()
        };
        let out = format!("{creds:?}");
        assert!(!out.contains("hunter2"));
        assert!(out.contains("<set>"));
    }
}
