use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
const PREFERENCES_FILE: &str = "preferences.json";
const APP_DIR: &str = "plain-word";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub timeout: Duration,
    pub log_level: String,
    pub preferences_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            log_level: "info".to_string(),
            preferences_path: default_preferences_path(),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let api_base_url = env_string("WORDBOOK_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let timeout = Duration::from_millis(
            env_string("WORDBOOK_TIMEOUT_MS")
                .and_then(|value| value.parse::<u64>().ok())
                .unwrap_or(DEFAULT_TIMEOUT_MS),
        );

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let preferences_path = env_string("WORDBOOK_PREFS_PATH")
            .map(PathBuf::from)
            .or_else(default_preferences_path);

        Self {
            api_base_url,
            timeout,
            log_level,
            preferences_path,
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn default_preferences_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(PREFERENCES_FILE))
}
