use std::time::Duration;

/// Kiosk configuration, loaded from environment variables.
pub struct Config {
    /// API key for the hosted recognition model.
    pub api_key: Option<String>,
    /// Model name passed to the generateContent endpoint.
    pub model: String,
    /// V4L2 device path (default: /dev/video0).
    pub camera_device: String,
    /// Similarity score (0–100) required for a positive face match.
    pub match_threshold: f32,
    /// Delay between ID-detection polls while searching for a card.
    pub poll_interval: Duration,
    /// Slower delay after a transient detection error.
    pub poll_backoff: Duration,
    /// Fixed "locating face on card" delay before comparison.
    pub locate_delay: Duration,
    /// Artificial delay for a simulated document scan.
    pub sim_scan_delay: Duration,
    /// Artificial delay for a simulated face match.
    pub sim_match_delay: Duration,
}

impl Config {
    /// Load configuration from `VANGUARD_*` environment variables with
    /// defaults.
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("VANGUARD_API_KEY").ok(),
            model: std::env::var("VANGUARD_MODEL")
                .unwrap_or_else(|_| "gemini-3-flash-preview".to_string()),
            camera_device: std::env::var("VANGUARD_CAMERA_DEVICE")
                .unwrap_or_else(|_| "/dev/video0".to_string()),
            match_threshold: env_f32("VANGUARD_MATCH_THRESHOLD", 70.0),
            poll_interval: Duration::from_millis(env_u64("VANGUARD_POLL_INTERVAL_MS", 3000)),
            poll_backoff: Duration::from_millis(env_u64("VANGUARD_POLL_BACKOFF_MS", 5000)),
            locate_delay: Duration::from_millis(env_u64("VANGUARD_LOCATE_DELAY_MS", 1000)),
            sim_scan_delay: Duration::from_millis(env_u64("VANGUARD_SIM_SCAN_DELAY_MS", 2000)),
            sim_match_delay: Duration::from_millis(env_u64("VANGUARD_SIM_MATCH_DELAY_MS", 1500)),
        }
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
