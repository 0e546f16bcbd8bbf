use std::{env, path::PathBuf, time::Duration};

use crate::storage::resolve_data_path;

/// Timers that drive the ticker. Every delay the overlay uses lives here so
/// the engine can be stepped with a virtual clock in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickerTiming {
    /// How often the runtime re-reads the data file.
    pub poll_interval: Duration,
    /// How long an item stays up before the next weighted pick.
    pub rotation_interval: Duration,
    pub fade_out: Duration,
    pub fade_in: Duration,
    /// How long a "Goal Completed" celebration holds the ticker.
    pub celebration_window: Duration,
    /// Delay before a progress bar starts moving from its previous value.
    pub bar_start_delay: Duration,
    pub bar_animation: Duration,
    /// Granularity of the runtime's timer loop.
    pub frame_interval: Duration,
}

impl Default for TickerTiming {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(2_000),
            rotation_interval: Duration::from_millis(20_000),
            fade_out: Duration::from_millis(400),
            fade_in: Duration::from_millis(400),
            celebration_window: Duration::from_millis(5_000),
            bar_start_delay: Duration::from_millis(50),
            bar_animation: Duration::from_millis(1_000),
            frame_interval: Duration::from_millis(100),
        }
    }
}

impl TickerTiming {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            poll_interval: millis_var("TICKER_POLL_MS").unwrap_or(defaults.poll_interval),
            rotation_interval: millis_var("TICKER_ROTATION_MS")
                .unwrap_or(defaults.rotation_interval),
            fade_out: millis_var("TICKER_FADE_MS").unwrap_or(defaults.fade_out),
            fade_in: millis_var("TICKER_FADE_MS").unwrap_or(defaults.fade_in),
            celebration_window: millis_var("TICKER_CELEBRATION_MS")
                .unwrap_or(defaults.celebration_window),
            ..defaults
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub completed_path: PathBuf,
    pub goals_path: PathBuf,
    pub sync_url: Option<String>,
    pub timing: TickerTiming,
}

impl Config {
    pub fn from_env() -> Result<Self, std::io::Error> {
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8080);

        let data_path = resolve_data_path()?;
        let completed_path = env::var("APP_COMPLETED_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_path.with_file_name("completed_goals.json"));
        let goals_path = env::var("APP_GOALS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_path.with_file_name("goals.json"));

        let sync_url = match env::var("SYNC_URL") {
            Ok(value) if value.eq_ignore_ascii_case("off") || value.is_empty() => None,
            Ok(value) => Some(value),
            Err(_) => Some(format!("http://127.0.0.1:{port}/api/ticker")),
        };

        Ok(Self {
            port,
            data_path,
            completed_path,
            goals_path,
            sync_url,
            timing: TickerTiming::from_env(),
        })
    }
}

fn millis_var(name: &str) -> Option<Duration> {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}
