//! # Schema Normalizer
//!
//! Turns a question-bank document of loosely specified shape into a flat,
//! ordered list of [`QuestionSpec`]s.
//!
//! Per option, the potential is taken from (first hit wins):
//! 1. an explicit `potential` / `potential_id` field,
//! 2. an option id (`id`, `code`, `value`) that itself names a potential.
//!
//! The option table then gets keys in strategy order, never overwriting a key
//! set by an earlier strategy:
//! 1. option ids,
//! 2. positional keys `opt_<n>` / `option_<n>` (1-based, list order),
//! 3. option labels.
//!
//! Options whose potential cannot be determined are dropped and counted.
//! A question without an id, or a repeated id, is a [`SchemaError`].

use crate::config::{DimensionId, PotentialId, Registry, ScoringPolicy};
use crate::error::SchemaError;
use crate::scoring::keywords::KeywordSet;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Resolved question type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    SingleSelect,
    MultiSelect,
    FreeText,
    Paired,
}

impl QuestionKind {
    /// Unknown or missing types fall back to single-select.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.unwrap_or_default().trim().to_ascii_lowercase().as_str() {
            "multi_choice" | "multi_select" | "multiple_choice" | "checkbox" | "multi" => {
                Self::MultiSelect
            }
            "text" | "free_text" | "textarea" | "open" => Self::FreeText,
            "fast_slow" | "paired" | "pair" | "fast_slow_pair" => Self::Paired,
            _ => Self::SingleSelect,
        }
    }
}

/// Option token → potential, per question.
#[derive(Debug, Clone, Default)]
pub struct OptionTable {
    keys: HashMap<String, PotentialId>,
}

impl OptionTable {
    pub fn get(&self, token: &str) -> Option<PotentialId> {
        self.keys.get(&token.trim().to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn insert_first(&mut self, key: String, pid: PotentialId) {
        if !key.is_empty() {
            self.keys.entry(key).or_insert(pid);
        }
    }
}

/// Canonical question descriptor.
#[derive(Debug, Clone)]
pub struct QuestionSpec {
    pub id: String,
    pub block_id: String,
    pub kind: QuestionKind,
    pub weight: f64,
    /// `None` means undimensioned: counts toward totals, never toward columns.
    pub dimension: Option<DimensionId>,
    pub inverted: bool,
    pub invert_multiplier: f64,
    pub antipattern: bool,
    pub antipattern_multiplier: f64,
    pub reverse_item: bool,
    pub slow_factor: f64,
    pub max_choices: Option<usize>,
    pub options: OptionTable,
    pub keywords: KeywordSet,
}

/// Data-quality counters gathered while normalizing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemaQuality {
    pub dropped_options: usize,
    pub unparsable_weights: usize,
    pub undimensioned_questions: usize,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizedSchema {
    pub questions: Vec<QuestionSpec>,
    pub quality: SchemaQuality,
}

pub fn normalize_schema(
    doc: &Value,
    registry: &Registry,
    policy: &ScoringPolicy,
) -> Result<NormalizedSchema, SchemaError> {
    let mut quality = SchemaQuality::default();
    let mut seen = HashSet::new();
    let mut ordered: Vec<(i64, QuestionSpec)> = Vec::new();

    let blocks = doc
        .get("blocks")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for (block_pos, block) in blocks.iter().enumerate() {
        let block_id = block
            .get("block_id")
            .and_then(scalar_string)
            .unwrap_or_else(|| format!("block_{}", block_pos + 1));
        let rules = BlockRules::from_block(block, policy);

        let questions = block
            .get("questions")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for (q_pos, q) in questions.iter().enumerate() {
            let id = q
                .get("id")
                .and_then(scalar_string)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| SchemaError::MissingQuestionId {
                    block: block_id.clone(),
                    position: q_pos + 1,
                })?;
            if !seen.insert(id.clone()) {
                return Err(SchemaError::DuplicateQuestionId { id });
            }

            let spec = normalize_question(id, &block_id, q, &rules, registry, policy, &mut quality);
            let order = q.get("order").and_then(parse_number).map(|o| o as i64);
            ordered.push((order.unwrap_or(i64::MAX), spec));
        }
    }

    // Stable: equal order keys keep document order.
    ordered.sort_by_key(|(order, _)| *order);
    let questions = ordered.into_iter().map(|(_, q)| q).collect::<Vec<_>>();

    debug!(
        questions = questions.len(),
        dropped_options = quality.dropped_options,
        undimensioned = quality.undimensioned_questions,
        "schema normalized"
    );
    Ok(NormalizedSchema { questions, quality })
}

/// Block-level `scoring_rules` overrides.
struct BlockRules {
    reverse_items: HashSet<String>,
    antipattern: bool,
    antipattern_multiplier: f64,
}

impl BlockRules {
    fn from_block(block: &Value, policy: &ScoringPolicy) -> Self {
        let rules = block.get("scoring_rules");
        let reverse_items = rules
            .and_then(|r| r.get("reverse_items"))
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(scalar_string).collect())
            .unwrap_or_default();
        let antipattern = rules.and_then(|r| r.get("antipattern")).is_some_and(flag);
        let antipattern_multiplier = rules
            .and_then(|r| r.get("anti_weight_multiplier"))
            .and_then(parse_multiplier)
            .unwrap_or(policy.antipattern_multiplier);
        Self {
            reverse_items,
            antipattern,
            antipattern_multiplier,
        }
    }
}

fn normalize_question(
    id: String,
    block_id: &str,
    q: &Value,
    rules: &BlockRules,
    registry: &Registry,
    policy: &ScoringPolicy,
    quality: &mut SchemaQuality,
) -> QuestionSpec {
    let kind = QuestionKind::parse(q.get("type").and_then(Value::as_str));

    let (weight, parsed) = resolve_weight(q.get("weight"));
    if !parsed {
        quality.unparsable_weights += 1;
    }

    let dimension = q
        .get("column")
        .or_else(|| q.get("dimension"))
        .and_then(Value::as_str)
        .and_then(|c| registry.resolve_dimension(c));
    if dimension.is_none() {
        quality.undimensioned_questions += 1;
    }

    let inverted = ["invert_score", "invert"]
        .iter()
        .any(|k| q.get(*k).is_some_and(flag));
    let invert_multiplier = q
        .get("invert_multiplier")
        .and_then(parse_multiplier)
        .unwrap_or(policy.invert_multiplier);

    let antipattern = rules.antipattern
        || ["antipattern", "is_antipattern", "weakness"]
            .iter()
            .any(|k| q.get(*k).is_some_and(flag))
        || q.get("direction")
            .and_then(Value::as_str)
            .is_some_and(|d| matches!(d.trim(), "weakness" | "antipattern"));
    let antipattern_multiplier = q
        .get("anti_weight_multiplier")
        .and_then(parse_multiplier)
        .unwrap_or(rules.antipattern_multiplier);
    let reverse_item =
        rules.reverse_items.contains(&id) || q.get("reverse_item").is_some_and(flag);

    let slow_factor = q
        .get("slow_factor")
        .and_then(parse_multiplier)
        .unwrap_or(policy.slow_factor);
    let max_choices = q
        .get("max_choices")
        .and_then(Value::as_u64)
        .filter(|n| *n > 0)
        .map(|n| n as usize);

    let options = q
        .get("options")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let (options, dropped) = build_option_table(options, registry);
    quality.dropped_options += dropped;

    let keywords = KeywordSet::from_value(q.get("keywords"), registry);

    QuestionSpec {
        id,
        block_id: block_id.to_string(),
        kind,
        weight,
        dimension,
        inverted,
        invert_multiplier,
        antipattern,
        antipattern_multiplier,
        reverse_item,
        slow_factor,
        max_choices,
        options,
        keywords,
    }
}

/// Returns the table and the number of options that were dropped.
pub(crate) fn build_option_table(options: &[Value], registry: &Registry) -> (OptionTable, usize) {
    let mut resolved: Vec<(usize, PotentialId, &Value)> = Vec::with_capacity(options.len());
    let mut dropped = 0;

    for (i, opt) in options.iter().enumerate() {
        let position = i + 1;
        let explicit = ["potential", "potential_id"]
            .iter()
            .filter_map(|k| opt.get(*k).and_then(scalar_string))
            .find_map(|p| registry.resolve_token(&p));
        let by_option_id = || {
            option_ids(opt)
                .into_iter()
                .find_map(|id| registry.resolve_token(&id))
        };

        match explicit.or_else(by_option_id) {
            Some((pid, _)) => resolved.push((position, pid, opt)),
            None => {
                debug!(position, "option without a resolvable potential dropped");
                dropped += 1;
            }
        }
    }

    let mut table = OptionTable::default();
    for (_, pid, opt) in &resolved {
        for id in option_ids(opt) {
            table.insert_first(id.to_lowercase(), *pid);
        }
    }
    for (position, pid, _) in &resolved {
        table.insert_first(format!("opt_{position}"), *pid);
        table.insert_first(format!("option_{position}"), *pid);
    }
    for (_, pid, opt) in &resolved {
        if let Some(label) = ["label", "text", "title"]
            .iter()
            .find_map(|k| opt.get(*k).and_then(Value::as_str))
        {
            table.insert_first(label.trim().to_lowercase(), *pid);
        }
    }

    (table, dropped)
}

/// Option ids in preference order. A bare string option is its own id.
fn option_ids(opt: &Value) -> Vec<String> {
    if let Value::String(s) = opt {
        return vec![s.trim().to_string()];
    }
    ["id", "code", "value"]
        .iter()
        .filter_map(|k| opt.get(*k).and_then(scalar_string))
        .filter(|s| !s.is_empty())
        .collect()
}

/// `(weight, parsed)`. Absent or unparsable → 1.0; negative or non-finite → 0.0.
pub(crate) fn resolve_weight(raw: Option<&Value>) -> (f64, bool) {
    let (w, parsed) = match raw {
        None | Some(Value::Null) => (1.0, true),
        Some(v) => match parse_number(v) {
            Some(w) => (w, true),
            None => (1.0, false),
        },
    };
    if w.is_finite() && w >= 0.0 {
        (w, parsed)
    } else {
        (0.0, parsed)
    }
}

/// Multipliers must be finite and non-negative, otherwise the default applies.
fn parse_multiplier(v: &Value) -> Option<f64> {
    parse_number(v).filter(|m| m.is_finite() && *m >= 0.0)
}

fn parse_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
        _ => None,
    }
}

/// Strings (trimmed) and integers; everything else has no id.
fn scalar_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    }
}

fn flag(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
        Value::String(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "y"
        ),
        _ => false,
    }
}
