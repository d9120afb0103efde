use std::env;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://fantasy.premierleague.com/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_BEHAVIOUR_WINDOW: usize = 10;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base: String,
    pub http_timeout: Duration,
    pub cache_ttl: Duration,
    /// Manager entry id used by the "my team" operations.
    pub team_id: Option<u32>,
    pub behaviour_window: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            team_id: None,
            behaviour_window: DEFAULT_BEHAVIOUR_WINDOW,
        }
    }
}

impl Config {
    /// Reads `.env` (if present) and then the process environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let api_base = opt_env("FPL_API_BASE")
            .map(|raw| raw.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let http_timeout = Duration::from_secs(
            env::var("FPL_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|val| val.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS)
                .clamp(1, 120),
        );
        let cache_ttl = Duration::from_secs(
            env::var("FPL_CACHE_TTL_SECS")
                .ok()
                .and_then(|val| val.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_CACHE_TTL_SECS)
                .clamp(1, 86_400),
        );
        let team_id = opt_env("FPL_TEAM_ID").and_then(|val| val.trim().parse::<u32>().ok());
        let behaviour_window = env::var("FPL_BEHAVIOUR_WINDOW")
            .ok()
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_BEHAVIOUR_WINDOW)
            .clamp(1, 38);

        Self {
            api_base,
            http_timeout,
            cache_ttl,
            team_id,
            behaviour_window,
        }
    }
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .and_then(|val| if val.trim().is_empty() { None } else { Some(val) })
}
