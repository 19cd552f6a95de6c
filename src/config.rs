use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::api_connection::endpoints::{
    DEFAULT_APP_ID_ENV_VAR, DEFAULT_APP_KEY_ENV_VAR, NUTRITIONIX_BASE_URL,
};
use crate::session::DEFAULT_RECENT_LIMIT;

const DATA_DIR_ENV_VAR: &str = "NUTRI_DATA_DIR";
const BASE_URL_ENV_VAR: &str = "NUTRITIONIX_BASE_URL";
const TIMEOUT_ENV_VAR: &str = "NUTRITIONIX_TIMEOUT_SECS";
const RECENT_LIMIT_ENV_VAR: &str = "NUTRI_RECENT_LIMIT";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct LookupConfig {
    pub base_url: String,
    pub app_id_env_var: String,
    pub app_key_env_var: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub lookup: LookupConfig,
    pub recent_limit: usize,
}

impl AppConfig {
    /// Reads the environment (after `.env`). Unset or unparsable values fall
    /// back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = get(DATA_DIR_ENV_VAR)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let base_url = get(BASE_URL_ENV_VAR)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| NUTRITIONIX_BASE_URL.to_string());
        let timeout_secs = get(TIMEOUT_ENV_VAR)
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let recent_limit = get(RECENT_LIMIT_ENV_VAR)
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_RECENT_LIMIT);

        Self {
            data_dir,
            lookup: LookupConfig {
                base_url,
                app_id_env_var: DEFAULT_APP_ID_ENV_VAR.to_string(),
                app_key_env_var: DEFAULT_APP_KEY_ENV_VAR.to_string(),
                timeout: Duration::from_secs(timeout_secs),
            },
            recent_limit,
        }
    }
}
