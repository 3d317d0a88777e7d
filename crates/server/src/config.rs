//! Server configuration read from the environment.
use std::env;
use std::path::PathBuf;

/// Process-level settings. Combat tuning lives in the data directory.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Directory holding `config.toml`, `kits.ron` and `maps/`.
    pub data_dir: PathBuf,
    /// Overrides `tick_hz` from `config.toml` when set.
    pub tick_hz: Option<u32>,
    /// Stop after this many seconds. Zero runs until interrupted.
    pub run_seconds: u64,
    /// Also write logs to `<dir>/arena-server.log`.
    pub log_dir: Option<PathBuf>,
    /// Map under `maps/` to load. Without one the room is an open field.
    pub map: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(dir) = read_env::<PathBuf>("ARENA_DATA_DIR") {
            config.data_dir = dir;
        }
        if let Some(hz) = read_env::<u32>("ARENA_TICK_HZ") {
            config.tick_hz = Some(hz.max(1));
        }
        if let Some(seconds) = read_env::<u64>("ARENA_RUN_SECONDS") {
            config.run_seconds = seconds;
        }
        config.log_dir = read_env::<PathBuf>("ARENA_LOG_DIR");
        config.map = read_env::<String>("ARENA_MAP").filter(|name| !name.is_empty());

        config
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            tick_hz: None,
            run_seconds: 0,
            log_dir: None,
            map: None,
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
