//! # Scoring Engine
//! Wires the pipeline for one respondent:
//! normalize schema → extract answers → aggregate evidence → floor weakness
//! → resolve tiers and slots → build the report.
//!
//! No I/O. The engine holds an immutable [`EngineConfig`] and can be shared
//! across threads; every run uses fresh accumulators.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{EngineConfig, Registry, ScoringPolicy};
use crate::debug::anon_hash;
use crate::error::{ConfigurationError, SchemaError};
use crate::report::{DataQuality, Report};
use crate::scoring::{
    classify, extract_evidence, normalize_schema, question_contributions, resolve,
    Accumulators, AnswerDocument, AnswerShape, ExtractStats,
};

#[derive(Debug, Clone)]
pub struct ScoringEngine {
    config: Arc<EngineConfig>,
}

impl ScoringEngine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigurationError> {
        config.policy.validate()?;
        Ok(Self {
            config: Arc::new(config),
        })
    }

    /// Built-in registry and default policy.
    pub fn with_defaults() -> Self {
        Self {
            config: Arc::new(EngineConfig::default()),
        }
    }

    /// Load config from `$ENGINE_CONFIG_PATH` / `config/engine.toml` / seed.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        Self::new(EngineConfig::load()?)
    }

    pub fn registry(&self) -> &Registry {
        &self.config.registry
    }

    pub fn policy(&self) -> &ScoringPolicy {
        &self.config.policy
    }

    /// Score one answer document against a question bank.
    pub fn score(&self, blocks: &Value, answers: &Value) -> Result<Report, SchemaError> {
        self.score_with_id(blocks, answers, None)
    }

    /// Like [`score`](Self::score); `fallback_id` is used when the answer
    /// document carries no `respondent_id`.
    pub fn score_with_id(
        &self,
        blocks: &Value,
        answers: &Value,
        fallback_id: Option<&str>,
    ) -> Result<Report, SchemaError> {
        let started = Instant::now();
        let registry = self.registry();
        let policy = self.policy();

        let schema = match normalize_schema(blocks, registry, policy) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "schema rejected");
                crate::metrics::record_schema_error();
                crate::debug::record_schema_error();
                return Err(e);
            }
        };

        let doc = AnswerDocument::from_value(answers);
        let respondent = doc.respondent_id.or(fallback_id);
        let who = respondent.map(anon_hash).unwrap_or_else(|| "-".to_string());

        let mut acc = Accumulators::new();
        let mut stats = ExtractStats::default();
        let mut answered = 0usize;
        let mut unsupported = 0usize;

        for q in &schema.questions {
            let Some(raw) = doc.get(&q.id) else {
                continue;
            };
            answered += 1;
            let shape = classify(raw);
            if shape == AnswerShape::Unrecognized {
                unsupported += 1;
                debug!(question = %q.id, "unsupported answer shape");
                continue;
            }
            let evidence = extract_evidence(shape, q, registry, &mut stats);
            let contributions = question_contributions(q, &evidence, policy);
            debug!(
                question = %q.id,
                block = %q.block_id,
                contributions = contributions.len(),
                "question scored"
            );
            for c in &contributions {
                acc.apply(c);
            }
        }

        acc.clamp_non_finite();
        acc.floor_weakness();
        let placement = resolve(registry, &acc);

        let meta = DataQuality {
            questions: schema.questions.len(),
            answered,
            dropped_options: schema.quality.dropped_options,
            unresolved_tokens: stats.unresolved_tokens,
            unsupported_answers: unsupported,
            unparsable_weights: schema.quality.unparsable_weights,
            undimensioned_questions: schema.quality.undimensioned_questions,
        };
        let report = Report::build(registry, &acc, &placement, respondent, meta);

        let elapsed_ms = started.elapsed().as_secs_f64() * 1_000.0;
        crate::metrics::record_run(&meta, elapsed_ms);
        crate::debug::record_run(respondent, elapsed_ms);
        info!(
            respondent = %who,
            questions = meta.questions,
            answered = meta.answered,
            unresolved = meta.unresolved_tokens,
            elapsed_ms,
            "scoring run finished"
        );
        Ok(report)
    }
}
