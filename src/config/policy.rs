//! Scoring policy knobs that are not part of the question bank itself.
//!
//! TOML shape (all keys optional):
//! ```toml
//! [policy]
//! invert_routing = "weakness"      # or "strength_penalty"
//! invert_multiplier = 0.8
//! antipattern_multiplier = 1.0
//! slow_factor = 0.5
//! keyword_hits = true
//! ```

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};

/// Where the evidence of an inverted question goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvertPolicy {
    /// Selection adds to the weakness total.
    #[default]
    Weakness,
    /// Selection subtracts from the strength total.
    StrengthPenalty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringPolicy {
    pub invert_routing: InvertPolicy,
    /// Used when a question sets `invert_score` without `invert_multiplier`.
    pub invert_multiplier: f64,
    /// Used when a block has no `anti_weight_multiplier`.
    pub antipattern_multiplier: f64,
    /// Share of a paired question's weight taken back for "slow" picks.
    pub slow_factor: f64,
    /// Count keyword hits in free-text answers.
    pub keyword_hits: bool,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            invert_routing: InvertPolicy::Weakness,
            invert_multiplier: 0.8,
            antipattern_multiplier: 1.0,
            slow_factor: 0.5,
            keyword_hits: true,
        }
    }
}

impl ScoringPolicy {
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        for (field, value) in [
            ("invert_multiplier", self.invert_multiplier),
            ("antipattern_multiplier", self.antipattern_multiplier),
            ("slow_factor", self.slow_factor),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigurationError::InvalidPolicy { field, value });
            }
        }
        Ok(())
    }
}
