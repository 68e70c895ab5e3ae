// src/scoring/mod.rs
//! Scoring pipeline: schema normalizer → answer extractor → evidence
//! aggregator → tier & matrix resolver. Everything here is pure and
//! synchronous; callers own all I/O.

pub mod aggregate;
pub mod answers;
pub mod keywords;
pub mod matrix;
pub mod schema;

// Re-export convenient types.
pub use crate::scoring::aggregate::{
    question_contributions, Accumulators, Contribution, PotentialAccumulator, Target,
};
pub use crate::scoring::answers::{
    classify, extract_evidence, AnswerDocument, AnswerEvidence, AnswerShape, ExtractStats,
    Selection,
};
pub use crate::scoring::matrix::{dominant_dimension, resolve, MatrixPlacement, Tier, TierPlacement};
pub use crate::scoring::schema::{
    normalize_schema, NormalizedSchema, OptionTable, QuestionKind, QuestionSpec, SchemaQuality,
};
