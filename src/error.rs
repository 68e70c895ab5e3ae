//! Error taxonomy for the scoring engine.
//!
//! Only structural problems are errors. Per-item data gaps (unknown option
//! tokens, odd answer shapes, bad weights) are absorbed and counted in the
//! report's data-quality block instead.

use thiserror::Error;

/// The fixed potential/dimension registry is absent or inconsistent.
/// Raised once when an engine is constructed, never per run.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("expected exactly {expected} potentials, found {found}")]
    PotentialCount { expected: usize, found: usize },

    #[error("expected exactly {expected} dimensions, found {found}")]
    DimensionCount { expected: usize, found: usize },

    #[error("{kind} at position {position} has an empty id")]
    EmptyId { kind: &'static str, position: usize },

    #[error("duplicate {kind} id `{id}`")]
    DuplicateId { kind: &'static str, id: String },

    #[error("typo correction `{typo}` points to unknown potential `{target}`")]
    UnknownTypoTarget { typo: String, target: String },

    #[error("policy value `{field}` must be a finite number >= 0, got {value}")]
    InvalidPolicy { field: &'static str, value: f64 },

    #[error("failed to read engine config at {path}: {message}")]
    Unreadable { path: String, message: String },

    #[error("failed to parse engine config: {0}")]
    Parse(String),
}

/// The question bank violates its structural contract.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("question #{position} in block `{block}` has no id")]
    MissingQuestionId { block: String, position: usize },

    #[error("question id `{id}` appears more than once")]
    DuplicateQuestionId { id: String },
}

/// Umbrella error for callers that both build and run an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn umbrella_wraps_both_kinds() {
        let e: EngineError = SchemaError::DuplicateQuestionId { id: "q7".into() }.into();
        assert_eq!(
            e.to_string(),
            "schema error: question id `q7` appears more than once"
        );

        let e: EngineError = ConfigurationError::DimensionCount {
            expected: 3,
            found: 2,
        }
        .into();
        assert!(matches!(e, EngineError::Configuration(_)));
    }
}
