use std::env;
use std::path::PathBuf;

const DEFAULT_API_BASE_URL: &str = "https://api.perplexity.ai";
const DEFAULT_SYSTEM_PROMPT: &str = "Be precise and concise.";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_MODEL: &str = "sonar";

/// Runtime settings derived from the environment. The on-disk API key and
/// query history live in [`crate::store::ConfigStore`] instead.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base_url: String,
    pub system_prompt: String,
    pub request_timeout_secs: u64,
    pub config_dir: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        Self {
            api_base_url: get_var("PLEXI_API_BASE_URL")
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            system_prompt: get_var("PLEXI_SYSTEM_PROMPT")
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            request_timeout_secs: parse_request_timeout_secs(
                get_var("PLEXI_REQUEST_TIMEOUT_SECS").as_deref(),
            ),
            config_dir: parse_config_dir(get_var("PLEXI_CONFIG_DIR").as_deref()),
        }
    }
}

fn parse_request_timeout_secs(raw: Option<&str>) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
}

fn parse_config_dir(raw: Option<&str>) -> Option<PathBuf> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
