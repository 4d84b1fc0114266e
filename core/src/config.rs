use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_STORAGE_KEY: &str = "slide_app_data";
pub const DEFAULT_DOCUMENT_ID_KEY: &str = "slide_jsonbin_id";
pub const DEFAULT_REMOTE_BASE_URL: &str = "https://api.jsonbin.io/v3";

/// Remote backup endpoint. Without an API key cloud sync is never attempted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub collection_id: Option<String>,
    /// Pinned document id. Takes precedence over the cached one.
    pub document_id: Option<String>,
    pub document_name: String,
}

impl RemoteConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerConfig {
    /// Key the snapshot lives under in the local store.
    pub storage_key: String,
    /// Key the remote document id is cached under.
    pub document_id_key: String,
    /// Quiet period before a scheduled remote write fires.
    pub sync_debounce: Duration,
    /// How long the success state is shown before reverting to idle.
    pub sync_reset: Duration,
    pub week_length_days: i64,
    /// UTC hour week starts are pinned to, so dates don't drift.
    pub week_start_hour: u32,
    pub remote: RemoteConfig,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.into(),
            document_id_key: DEFAULT_DOCUMENT_ID_KEY.into(),
            sync_debounce: Duration::from_millis(2000),
            sync_reset: Duration::from_millis(3000),
            week_length_days: 7,
            week_start_hour: 12,
            remote: RemoteConfig {
                base_url: DEFAULT_REMOTE_BASE_URL.into(),
                api_key: None,
                collection_id: None,
                document_id: None,
                document_name: "slide-app-data".into(),
            },
        }
    }
}

impl LedgerConfig {
    /// Load from the process environment, reading `.env` first if present.
    /// Unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        let mut config = Self::default();

        if let Ok(v) = std::env::var("SLIDE_STORAGE_KEY") {
            config.storage_key = v;
        }
        if let Some(ms) = env_parse::<u64>("SLIDE_SYNC_DEBOUNCE_MS") {
            config.sync_debounce = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("SLIDE_SYNC_RESET_MS") {
            config.sync_reset = Duration::from_millis(ms);
        }
        if let Some(days) = env_parse::<i64>("SLIDE_WEEK_LENGTH_DAYS") {
            if days > 0 {
                config.week_length_days = days;
            }
        }
        if let Some(hour) = env_parse::<u32>("SLIDE_WEEK_START_HOUR") {
            if hour < 24 {
                config.week_start_hour = hour;
            }
        }

        if let Ok(v) = std::env::var("JSONBIN_BASE_URL") {
            config.remote.base_url = v.trim_end_matches('/').to_string();
        }
        config.remote.api_key = env_nonempty("JSONBIN_API_KEY");
        config.remote.collection_id = env_nonempty("JSONBIN_COLLECTION_ID");
        config.remote.document_id = env_nonempty("JSONBIN_BIN_ID");

        config
    }

    /// Config with short delays and no remote credentials, for tests.
    pub fn default_test() -> Self {
        Self {
            storage_key: "slide_test_data".into(),
            document_id_key: "slide_test_doc_id".into(),
            sync_debounce: Duration::from_millis(50),
            sync_reset: Duration::from_millis(100),
            ..Self::default()
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok()?.trim().parse().ok()
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
