//! The JSON report handed to report-rendering collaborators.
//!
//! All maps are `BTreeMap`s so the same inputs always serialize to the same
//! bytes.

use crate::config::Registry;
use crate::scoring::{dominant_dimension, Accumulators, MatrixPlacement, Tier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotentialScore {
    pub name: String,
    pub strength: f64,
    pub weakness: f64,
    pub columns: BTreeMap<String, f64>,
    pub dominant_column: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rows {
    pub row1_strengths: Vec<String>,
    pub row2_energy: Vec<String>,
    pub row3_weaknesses: Vec<String>,
}

/// Row → dimension id → potential id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Matrix3x3 {
    pub row1_strengths: BTreeMap<String, String>,
    pub row2_energy: BTreeMap<String, String>,
    pub row3_weaknesses: BTreeMap<String, String>,
}

/// Per-item gaps absorbed during the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQuality {
    pub questions: usize,
    pub answered: usize,
    pub dropped_options: usize,
    pub unresolved_tokens: usize,
    pub unsupported_answers: usize,
    pub unparsable_weights: usize,
    pub undimensioned_questions: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respondent_id: Option<String>,
    pub scores: BTreeMap<String, PotentialScore>,
    pub rows: Rows,
    pub matrix_3x3: Matrix3x3,
    pub meta: DataQuality,
}

impl Report {
    pub fn build(
        registry: &Registry,
        acc: &Accumulators,
        placement: &MatrixPlacement,
        respondent_id: Option<&str>,
        meta: DataQuality,
    ) -> Self {
        let mut scores = BTreeMap::new();
        for pid in registry.potential_ids() {
            let a = acc.get(pid);
            let columns = registry
                .dimension_ids()
                .map(|d| (registry.dimension(d).id.clone(), a.column(d)))
                .collect();
            let dominant_column = dominant_dimension(registry, a)
                .map(|d| registry.dimension(d).id.clone())
                .unwrap_or_default();
            let p = registry.potential(pid);
            scores.insert(
                p.id.clone(),
                PotentialScore {
                    name: p.name.clone(),
                    strength: a.strength,
                    weakness: a.weakness,
                    columns,
                    dominant_column,
                },
            );
        }

        let ids = |tier: Tier| -> Vec<String> {
            placement
                .tier(tier)
                .members
                .iter()
                .map(|p| registry.potential(*p).id.clone())
                .collect()
        };
        let slots = |tier: Tier| -> BTreeMap<String, String> {
            registry
                .dimension_ids()
                .zip(&placement.tier(tier).slots)
                .map(|(d, p)| {
                    (
                        registry.dimension(d).id.clone(),
                        registry.potential(*p).id.clone(),
                    )
                })
                .collect()
        };

        Self {
            respondent_id: respondent_id.map(str::to_string),
            scores,
            rows: Rows {
                row1_strengths: ids(Tier::Strength),
                row2_energy: ids(Tier::Neutral),
                row3_weaknesses: ids(Tier::Weakness),
            },
            matrix_3x3: Matrix3x3 {
                row1_strengths: slots(Tier::Strength),
                row2_energy: slots(Tier::Neutral),
                row3_weaknesses: slots(Tier::Weakness),
            },
            meta,
        }
    }

    /// Pretty JSON, the on-disk `report.json` format.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
