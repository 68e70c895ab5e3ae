//! # Answer Extractor
//!
//! Raw answers arrive in many shapes (`"citrine"`, `["opt_1","opt_3"]`,
//! `{"selected": [...]}`, `{"fast": [...], "slow": [...]}`, `{"text": "..."}`).
//! They are classified once into [`AnswerShape`], then resolved against the
//! registry and the question's option table into [`AnswerEvidence`].

use crate::config::{PotentialId, Registry, TokenMatch};
use crate::scoring::schema::{QuestionKind, QuestionSpec};
use serde_json::{Map, Value};
use tracing::trace;

/// Keys whose value holds the actual selection, in lookup order.
const SELECTION_KEYS: [&str; 5] = ["selected", "value", "choices", "choice", "answer"];

/// Nested containers deeper than this are ignored.
const MAX_DEPTH: usize = 16;

/// Raw answer classified by shape, before any token resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerShape {
    Single(String),
    Multi(Vec<String>),
    Paired { fast: Vec<String>, slow: Vec<String> },
    Text(String),
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub potential: PotentialId,
    pub token: String,
}

/// Canonical evidence for one question.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerEvidence {
    Selected(Vec<Selection>),
    Paired {
        fast: Vec<Selection>,
        slow: Vec<Selection>,
    },
    Text(String),
    Empty,
}

/// Respondent id and per-question answer map of an answer document.
#[derive(Debug, Clone, Copy)]
pub struct AnswerDocument<'a> {
    pub respondent_id: Option<&'a str>,
    answers: Option<&'a Map<String, Value>>,
}

impl<'a> AnswerDocument<'a> {
    /// The answer map is `answers`, else `responses`, else the document itself.
    pub fn from_value(doc: &'a Value) -> Self {
        let answers = ["answers", "responses"]
            .iter()
            .find_map(|k| doc.get(*k).and_then(Value::as_object))
            .or_else(|| doc.as_object());
        let respondent_id = doc
            .get("respondent_id")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty());
        Self {
            respondent_id,
            answers,
        }
    }

    pub fn get(&self, question_id: &str) -> Option<&'a Value> {
        self.answers
            .and_then(|m| m.get(question_id))
            .filter(|v| !v.is_null())
    }

    pub fn len(&self) -> usize {
        self.answers.map_or(0, Map::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn classify(raw: &Value) -> AnswerShape {
    classify_at(raw, 0)
}

fn classify_at(raw: &Value, depth: usize) -> AnswerShape {
    if depth > MAX_DEPTH {
        return AnswerShape::Unrecognized;
    }
    match raw {
        Value::String(s) if !s.trim().is_empty() => AnswerShape::Single(s.clone()),
        Value::Array(_) => multi(flatten(raw, depth)),
        Value::Object(map) => {
            if map.contains_key("fast") || map.contains_key("slow") {
                let fast = map.get("fast").map(|v| flatten(v, depth + 1)).unwrap_or_default();
                let slow = map.get("slow").map(|v| flatten(v, depth + 1)).unwrap_or_default();
                if fast.is_empty() && slow.is_empty() {
                    return AnswerShape::Unrecognized;
                }
                return AnswerShape::Paired { fast, slow };
            }
            if let Some(inner) = SELECTION_KEYS.iter().find_map(|k| map.get(*k)) {
                return classify_at(inner, depth + 1);
            }
            if let Some(Value::String(text)) = map.get("text") {
                if text.trim().is_empty() {
                    return AnswerShape::Unrecognized;
                }
                return AnswerShape::Text(text.clone());
            }
            multi(flatten(raw, depth))
        }
        _ => AnswerShape::Unrecognized,
    }
}

fn multi(tokens: Vec<String>) -> AnswerShape {
    if tokens.is_empty() {
        AnswerShape::Unrecognized
    } else {
        AnswerShape::Multi(tokens)
    }
}

/// Collect every non-empty string in a nested list/object, in document order.
fn flatten(raw: &Value, depth: usize) -> Vec<String> {
    let mut out = Vec::new();
    flatten_into(raw, depth, &mut out);
    out
}

fn flatten_into(raw: &Value, depth: usize, out: &mut Vec<String>) {
    if depth > MAX_DEPTH {
        return;
    }
    match raw {
        Value::String(s) if !s.trim().is_empty() => out.push(s.clone()),
        Value::Array(items) => {
            for it in items {
                flatten_into(it, depth + 1, out);
            }
        }
        Value::Object(map) => {
            for v in map.values() {
                flatten_into(v, depth + 1, out);
            }
        }
        _ => {}
    }
}

/// Tokens that did not resolve to any potential.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub unresolved_tokens: usize,
}

/// Resolve a classified answer for `question` into evidence.
pub fn extract_evidence(
    shape: AnswerShape,
    question: &QuestionSpec,
    registry: &Registry,
    stats: &mut ExtractStats,
) -> AnswerEvidence {
    let mut resolve = |tokens: Vec<String>| resolve_tokens(tokens, question, registry, stats);

    match (question.kind, shape) {
        (_, AnswerShape::Unrecognized) => AnswerEvidence::Empty,

        (QuestionKind::FreeText, AnswerShape::Single(s) | AnswerShape::Text(s)) => {
            AnswerEvidence::Text(s)
        }
        (QuestionKind::FreeText, AnswerShape::Multi(parts)) => AnswerEvidence::Text(parts.join(" ")),
        (QuestionKind::FreeText, AnswerShape::Paired { mut fast, slow }) => {
            fast.extend(slow);
            AnswerEvidence::Text(fast.join(" "))
        }

        (QuestionKind::Paired, AnswerShape::Paired { fast, slow }) => AnswerEvidence::Paired {
            fast: resolve(fast),
            slow: resolve(slow),
        },
        (QuestionKind::Paired, AnswerShape::Single(t) | AnswerShape::Text(t)) => {
            AnswerEvidence::Paired {
                fast: resolve(vec![t]),
                slow: Vec::new(),
            }
        }
        (QuestionKind::Paired, AnswerShape::Multi(ts)) => AnswerEvidence::Paired {
            fast: resolve(ts),
            slow: Vec::new(),
        },

        (_, AnswerShape::Single(t) | AnswerShape::Text(t)) => {
            AnswerEvidence::Selected(resolve(vec![t]))
        }
        (kind, AnswerShape::Multi(ts)) => {
            let mut selected = resolve(ts);
            if let (QuestionKind::MultiSelect, Some(max)) = (kind, question.max_choices) {
                selected.truncate(max);
            }
            AnswerEvidence::Selected(selected)
        }
        (_, AnswerShape::Paired { mut fast, slow }) => {
            fast.extend(slow);
            AnswerEvidence::Selected(resolve(fast))
        }
    }
}

/// Resolve tokens in order, dropping unknown ones and repeated potentials.
fn resolve_tokens(
    tokens: Vec<String>,
    question: &QuestionSpec,
    registry: &Registry,
    stats: &mut ExtractStats,
) -> Vec<Selection> {
    let mut out: Vec<Selection> = Vec::with_capacity(tokens.len());
    for token in tokens {
        let hit = registry.resolve_token(&token).or_else(|| {
            question
                .options
                .get(&token)
                .map(|pid| (pid, TokenMatch::OptionTable))
        });
        match hit {
            Some((potential, how)) => {
                trace!(question = %question.id, %token, ?how, "token resolved");
                if out.iter().all(|s| s.potential != potential) {
                    out.push(Selection { potential, token });
                }
            }
            None => {
                trace!(question = %question.id, %token, "token unresolved");
                stats.unresolved_tokens += 1;
            }
        }
    }
    out
}
