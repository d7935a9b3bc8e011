//! Runtime and per-turn configuration.
//!
//! Values are resolved once, before a turn starts, and then carried through
//! the execution context unchanged. Nothing reads the environment mid-turn.

use std::time::Duration;

/// Default reflection retry budget per turn.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default superstep cap per turn.
pub const DEFAULT_MAX_STEPS: u64 = 25;

/// Tunables fixed for the duration of one turn.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnConfig {
    /// Identifier forwarded to the model port.
    pub model_id: String,
    pub temperature: f32,
    /// Reflection loop budget. Exhaustion is a normal terminal outcome.
    pub max_retries: u32,
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            model_id: "default".to_string(),
            temperature: 0.7,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Engine-level settings.
#[derive(Clone, Debug, PartialEq)]
pub struct RuntimeConfig {
    /// Hard cap on supersteps per turn. Hitting it forces a terminal outcome.
    pub max_steps: u64,
    /// Upper bound on concurrently running frontier nodes. `None` follows
    /// host parallelism.
    pub concurrency_limit: Option<usize>,
    /// Whole-turn deadline enforced at the service boundary.
    pub turn_timeout: Option<Duration>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
            concurrency_limit: None,
            turn_timeout: None,
        }
    }
}

impl RuntimeConfig {
    /// Resolve settings from the environment, falling back to defaults.
    ///
    /// Reads `.env` files via dotenvy first, so local development picks up
    /// `LINGOGRAPH_MAX_STEPS`, `LINGOGRAPH_CONCURRENCY`, and
    /// `LINGOGRAPH_TURN_TIMEOUT_MS` without exporting anything.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();
        if let Some(steps) = env_parse::<u64>("LINGOGRAPH_MAX_STEPS") {
            config.max_steps = steps;
        }
        if let Some(limit) = env_parse::<usize>("LINGOGRAPH_CONCURRENCY") {
            config.concurrency_limit = Some(limit);
        }
        if let Some(ms) = env_parse::<u64>("LINGOGRAPH_TURN_TIMEOUT_MS") {
            config.turn_timeout = Some(Duration::from_millis(ms));
        }
        config
    }
}

impl TurnConfig {
    /// Resolve per-turn tunables from the environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();
        if let Ok(model) = std::env::var("LINGOGRAPH_MODEL_ID") {
            if !model.is_empty() {
                config.model_id = model;
            }
        }
        if let Some(temperature) = env_parse::<f32>("LINGOGRAPH_TEMPERATURE") {
            config.temperature = temperature;
        }
        if let Some(retries) = env_parse::<u32>("LINGOGRAPH_MAX_RETRIES") {
            config.max_retries = retries;
        }
        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
