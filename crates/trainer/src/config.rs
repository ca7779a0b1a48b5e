use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Config {
    pub puzzle_db_path: String,
    pub progress_path: String,
    pub time_limit: Option<Duration>,
    pub seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            puzzle_db_path: env::var("PUZZLE_DB_PATH")
                .unwrap_or_else(|_| "storage/puzzles.db".to_string()),
            progress_path: env::var("PROGRESS_PATH")
                .unwrap_or_else(|_| "storage/progress.json".to_string()),
            time_limit: env::var("PUZZLE_TIME_LIMIT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|secs: &u64| *secs > 0)
                .map(Duration::from_secs),
            seed: env::var("PUZZLE_SEED").ok().and_then(|v| v.parse().ok()),
        }
    }
}
