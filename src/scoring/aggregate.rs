//! # Evidence Aggregator
//!
//! Turns one question's evidence into signed [`Contribution`]s, then folds
//! them into one [`PotentialAccumulator`] per potential.
//!
//! Routing per question (first match wins):
//! - antipattern → weakness `+per_item * multiplier` (negated for reverse items)
//! - inverted    → weakness `+per_item * multiplier`, or a strength penalty
//!   under [`InvertPolicy::StrengthPenalty`]; never dimension points
//! - otherwise   → strength and the question's dimension bucket
//!
//! Per-item weight: multi-select splits `weight / n`; single-select uses the
//! full weight; paired questions split within the fast and slow lists.

use crate::config::{
    DimensionId, InvertPolicy, PotentialId, ScoringPolicy, DIMENSION_COUNT, POTENTIAL_COUNT,
};
use crate::scoring::answers::{AnswerEvidence, Selection};
use crate::scoring::schema::{QuestionKind, QuestionSpec};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PotentialAccumulator {
    pub strength: f64,
    pub weakness: f64,
    /// Points per dimension, indexed by canonical dimension order.
    pub columns: [f64; DIMENSION_COUNT],
}

impl PotentialAccumulator {
    pub fn column(&self, dim: DimensionId) -> f64 {
        self.columns[dim.index()]
    }
}

/// Exactly one accumulator per potential, fresh for every run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accumulators {
    slots: [PotentialAccumulator; POTENTIAL_COUNT],
}

impl Accumulators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, pid: PotentialId) -> &PotentialAccumulator {
        &self.slots[pid.index()]
    }

    pub fn get_mut(&mut self, pid: PotentialId) -> &mut PotentialAccumulator {
        &mut self.slots[pid.index()]
    }

    pub fn apply(&mut self, c: &Contribution) {
        let acc = self.get_mut(c.potential);
        match c.target {
            Target::Strength { dimension } => {
                acc.strength += c.amount;
                if let Some(dim) = dimension {
                    acc.columns[dim.index()] += c.amount;
                }
            }
            Target::Weakness => acc.weakness += c.amount,
        }
    }

    /// Replace overflowed totals so every number stays finite in the report:
    /// `±inf` saturates to `±f64::MAX`, NaN becomes `0.0`.
    pub fn clamp_non_finite(&mut self) {
        for acc in &mut self.slots {
            acc.strength = finite(acc.strength);
            acc.weakness = finite(acc.weakness);
            for c in &mut acc.columns {
                *c = finite(*c);
            }
        }
    }

    /// Clamp every weakness total to `>= 0` (also normalizes `-0.0`).
    pub fn floor_weakness(&mut self) {
        for acc in &mut self.slots {
            if acc.weakness.is_nan() || acc.weakness <= 0.0 {
                acc.weakness = 0.0;
            }
        }
    }
}

fn finite(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(-f64::MAX, f64::MAX)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Target {
    /// `dimension: None` for undimensioned questions, slow picks and strength penalties.
    Strength { dimension: Option<DimensionId> },
    Weakness,
}

/// One signed delta for one potential.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contribution {
    pub potential: PotentialId,
    pub target: Target,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Route {
    Normal,
    Antipattern { multiplier: f64, reverse: bool },
    Inverted { multiplier: f64, policy: InvertPolicy },
}

impl Route {
    fn for_question(q: &QuestionSpec, policy: &ScoringPolicy) -> Self {
        if q.antipattern {
            Route::Antipattern {
                multiplier: q.antipattern_multiplier,
                reverse: q.reverse_item,
            }
        } else if q.inverted {
            Route::Inverted {
                multiplier: q.invert_multiplier,
                policy: policy.invert_routing,
            }
        } else {
            Route::Normal
        }
    }

    fn contribution(self, potential: PotentialId, per_item: f64, dim: Option<DimensionId>) -> Contribution {
        let (target, amount) = match self {
            Route::Normal => (Target::Strength { dimension: dim }, per_item),
            Route::Antipattern { multiplier, reverse } => {
                let delta = per_item * multiplier;
                (Target::Weakness, if reverse { -delta } else { delta })
            }
            Route::Inverted {
                multiplier,
                policy: InvertPolicy::Weakness,
            } => (Target::Weakness, per_item * multiplier),
            Route::Inverted {
                multiplier,
                policy: InvertPolicy::StrengthPenalty,
            } => (Target::Strength { dimension: None }, -per_item * multiplier),
        };
        Contribution {
            potential,
            target,
            amount,
        }
    }
}

/// All contributions of one answered question.
pub fn question_contributions(
    q: &QuestionSpec,
    evidence: &AnswerEvidence,
    policy: &ScoringPolicy,
) -> Vec<Contribution> {
    let route = Route::for_question(q, policy);
    let dim = q.dimension;

    match evidence {
        AnswerEvidence::Empty => Vec::new(),

        AnswerEvidence::Selected(selected) => {
            let per_item = match q.kind {
                QuestionKind::MultiSelect => split(q.weight, selected.len()),
                _ => q.weight,
            };
            selected
                .iter()
                .map(|s| route.contribution(s.potential, per_item, dim))
                .collect()
        }

        AnswerEvidence::Paired { fast, slow } => {
            let mut out: Vec<Contribution> = fast_contributions(route, fast, q.weight, dim);
            if route == Route::Normal {
                let per_slow = split(q.weight * q.slow_factor, slow.len());
                out.extend(slow.iter().map(|s| Contribution {
                    potential: s.potential,
                    target: Target::Strength { dimension: None },
                    amount: -per_slow,
                }));
            }
            out
        }

        AnswerEvidence::Text(text) => {
            if !policy.keyword_hits || q.keywords.is_empty() {
                return Vec::new();
            }
            let hits = q.keywords.count_hits(text);
            let total: usize = hits.iter().map(|(_, n)| n).sum();
            if total == 0 {
                return Vec::new();
            }
            hits.into_iter()
                .map(|(pid, n)| route.contribution(pid, q.weight * n as f64 / total as f64, dim))
                .collect()
        }
    }
}

fn fast_contributions(
    route: Route,
    fast: &[Selection],
    weight: f64,
    dim: Option<DimensionId>,
) -> Vec<Contribution> {
    let per_fast = split(weight, fast.len());
    fast.iter()
        .map(|s| route.contribution(s.potential, per_fast, dim))
        .collect()
}

fn split(weight: f64, n: usize) -> f64 {
    if n == 0 {
        0.0
    } else {
        weight / n as f64
    }
}
