//! Oracle configuration and repetition scaling.

use std::env;

/// Default seed of the per-configuration random stream.
pub const DEFAULT_SEED: u64 = 0x0123_4567_89AB_CDEF;

/// Nominal number of random trials per stage and variant.
pub const DEFAULT_TRIALS: usize = 200;

/// Scales nominal repetition counts for fast or thorough runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepetitionMode {
    /// Debug builds and slow targets: an eighth of the nominal count.
    Reduced,
    Standard,
    /// Four times the nominal count.
    Extended,
}

impl RepetitionMode {
    pub fn adjusted(self, nominal: usize) -> usize {
        match self {
            RepetitionMode::Reduced => (nominal / 8).max(2),
            RepetitionMode::Standard => nominal,
            RepetitionMode::Extended => nominal.saturating_mul(4),
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "reduced" | "fast" => Some(RepetitionMode::Reduced),
            "standard" => Some(RepetitionMode::Standard),
            "extended" | "slow" => Some(RepetitionMode::Extended),
            _ => None,
        }
    }
}

impl Default for RepetitionMode {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            RepetitionMode::Reduced
        } else {
            RepetitionMode::Standard
        }
    }
}

/// Configuration for the ConformanceOracle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleConfig {
    /// Seed each configuration's random stream starts from
    pub seed: u64,

    /// Nominal trial count of the random stages
    pub trials: usize,

    /// Scaling applied to `trials`
    pub repetition: RepetitionMode,

    /// Lane counts `verify_all` runs every type pair at
    pub lane_counts: Vec<usize>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            trials: DEFAULT_TRIALS,
            repetition: RepetitionMode::default(),
            lane_counts: vec![1, 2, 4, 8, 16],
        }
    }
}

impl OracleConfig {
    /// Defaults overridden by `F2I_SEED` and `F2I_REPETITIONS`.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = OracleConfig::default();

        if let Ok(seed) = env::var("F2I_SEED") {
            match parse_seed(&seed) {
                Some(seed) => config.seed = seed,
                None => log::warn!("ignoring unparseable F2I_SEED={:?}", seed),
            }
        }

        if let Ok(mode) = env::var("F2I_REPETITIONS") {
            match RepetitionMode::parse(&mode) {
                Some(mode) => config.repetition = mode,
                None => log::warn!("ignoring unknown F2I_REPETITIONS={:?}", mode),
            }
        }

        config
    }

    /// Trials actually run per random stage.
    pub fn adjusted_trials(&self) -> usize {
        self.repetition.adjusted(self.trials)
    }
}

fn parse_seed(text: &str) -> Option<u64> {
    let text = text.trim();
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}
