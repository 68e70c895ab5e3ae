//! Keyword hit counting for free-text answers.
//!
//! A question may carry `"keywords": {"<potential>": ["word", ...]}`. Each
//! potential gets one case-insensitive, whole-word regex; a free-text answer
//! yields the number of hits per potential. No other text interpretation.

use crate::config::{PotentialId, Registry};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct KeywordSet {
    patterns: Vec<(PotentialId, Regex)>,
}

impl KeywordSet {
    /// Build from the question's `keywords` value. Unknown potentials, empty
    /// word lists and patterns that fail to compile are skipped.
    pub fn from_value(raw: Option<&Value>, registry: &Registry) -> Self {
        let Some(Value::Object(map)) = raw else {
            return Self::default();
        };

        let mut patterns: Vec<(PotentialId, Regex)> = Vec::new();
        for (key, words) in map {
            let Some((pid, _)) = registry.resolve_token(key) else {
                debug!(potential = %key, "keyword list for unknown potential skipped");
                continue;
            };
            let words = collect_words(words);
            if words.is_empty() {
                continue;
            }
            let alternation = words
                .iter()
                .map(|w| regex::escape(w))
                .collect::<Vec<_>>()
                .join("|");
            match Regex::new(&format!(r"(?iu)\b(?:{alternation})\b")) {
                Ok(re) => patterns.push((pid, re)),
                Err(e) => debug!(potential = %key, error = %e, "keyword pattern rejected"),
            }
        }
        patterns.sort_by_key(|(pid, _)| *pid);
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Hits per potential, in declaration order, zero counts omitted.
    pub fn count_hits(&self, text: &str) -> Vec<(PotentialId, usize)> {
        self.patterns
            .iter()
            .filter_map(|(pid, re)| {
                let n = re.find_iter(text).count();
                (n > 0).then_some((*pid, n))
            })
            .collect()
    }
}

fn collect_words(raw: &Value) -> Vec<String> {
    let mut out = Vec::new();
    match raw {
        Value::String(s) => out.push(s.trim().to_string()),
        Value::Array(items) => {
            for it in items {
                if let Value::String(s) = it {
                    out.push(s.trim().to_string());
                }
            }
        }
        _ => {}
    }
    out.retain(|w| !w.is_empty());
    out.sort();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counts_whole_words_case_insensitive() {
        let r = Registry::default_seed();
        let raw = json!({
            "ruby": ["drive", "Лидер"],
            "sapphire": "calm",
            "opal": ["ignored"]
        });
        let set = KeywordSet::from_value(Some(&raw), &r);
        let hits = set.count_hits("I DRIVE the team, a лидер by nature; overdrive doesn't count. Drive!");
        let ruby = r.potential_by_id("ruby").unwrap();
        assert_eq!(hits, vec![(ruby, 3)]);
    }

    #[test]
    fn missing_or_malformed_keywords_are_empty() {
        let r = Registry::default_seed();
        assert!(KeywordSet::from_value(None, &r).is_empty());
        assert!(KeywordSet::from_value(Some(&json!(["ruby"])), &r).is_empty());
        assert!(KeywordSet::from_value(Some(&json!({"ruby": []})), &r).is_empty());
    }

    #[test]
    fn metacharacters_are_escaped() {
        let r = Registry::default_seed();
        let raw = json!({"amber": ["c++", "a.b"]});
        let set = KeywordSet::from_value(Some(&raw), &r);
        assert!(set.count_hits("axb").is_empty());
    }
}
