use std::{env, str::FromStr};

/// Server settings read from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub cleanup_interval_secs: u64,
    pub inactive_game_timeout_secs: u64,
    pub active_game_timeout_secs: u64,
    pub cors_allowed_origins: Vec<String>,
    /// Largest board (rows * cols) a client may request.
    pub max_board_cells: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cleanup_interval_secs: 60,
            inactive_game_timeout_secs: 600,
            active_game_timeout_secs: 86400,
            cors_allowed_origins: vec!["http://localhost:5173".to_string()],
            max_board_cells: 10_000,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.cors_allowed_origins);

        Self {
            cleanup_interval_secs: env_or("CLEANUP_INTERVAL_SECONDS", defaults.cleanup_interval_secs),
            inactive_game_timeout_secs: env_or(
                "INACTIVE_GAME_TIMEOUT_SECONDS",
                defaults.inactive_game_timeout_secs,
            ),
            active_game_timeout_secs: env_or(
                "ACTIVE_GAME_TIMEOUT_SECONDS",
                defaults.active_game_timeout_secs,
            ),
            cors_allowed_origins,
            max_board_cells: env_or("MAX_BOARD_CELLS", defaults.max_board_cells),
        }
    }
}

/// Parse `key` from the environment, falling back to `default` when it is
/// unset or malformed.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
