//! # Tier & Matrix Resolver
//!
//! One deterministic pass over the accumulators:
//! 1. row 3 (weakness tier): top three weakness totals;
//! 2. row 1 (strength tier): top three strength totals among the other six;
//! 3. row 2 (neutral tier): the remaining three.
//!
//! Sorts are stable, so ties keep declaration order. Within a tier each
//! dimension, in canonical order, takes the unplaced member with the most
//! positive points for it; slots nobody has points for are filled by the
//! leftover members in descending strength.

use crate::config::{DimensionId, PotentialId, Registry};
use crate::scoring::aggregate::{Accumulators, PotentialAccumulator};

pub const TIER_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Strength,
    Neutral,
    Weakness,
}

impl Tier {
    /// Report row order.
    pub const ALL: [Tier; 3] = [Tier::Strength, Tier::Neutral, Tier::Weakness];

    pub fn key(self) -> &'static str {
        match self {
            Tier::Strength => "row1_strengths",
            Tier::Neutral => "row2_energy",
            Tier::Weakness => "row3_weaknesses",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TierPlacement {
    /// Members in ranking order.
    pub members: Vec<PotentialId>,
    /// One member per dimension, indexed by canonical dimension order.
    pub slots: Vec<PotentialId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixPlacement {
    pub strength: TierPlacement,
    pub neutral: TierPlacement,
    pub weakness: TierPlacement,
}

impl MatrixPlacement {
    pub fn tier(&self, tier: Tier) -> &TierPlacement {
        match tier {
            Tier::Strength => &self.strength,
            Tier::Neutral => &self.neutral,
            Tier::Weakness => &self.weakness,
        }
    }
}

pub fn resolve(registry: &Registry, acc: &Accumulators) -> MatrixPlacement {
    let mut pool: Vec<PotentialId> = registry.potential_ids().collect();

    sort_desc_by(&mut pool, |p| acc.get(p).weakness);
    let weakness = take_front(&mut pool);

    sort_desc_by(&mut pool, |p| acc.get(p).strength);
    let strength = take_front(&mut pool);

    // Whatever is left is the neutral tier, kept in strength order.
    let neutral = pool;

    MatrixPlacement {
        strength: place(strength, registry, acc),
        neutral: place(neutral, registry, acc),
        weakness: place(weakness, registry, acc),
    }
}

fn place(members: Vec<PotentialId>, registry: &Registry, acc: &Accumulators) -> TierPlacement {
    let mut remaining = members.clone();
    let mut slots: Vec<Option<PotentialId>> = Vec::with_capacity(registry.dimensions().len());

    for dim in registry.dimension_ids() {
        let mut best: Option<(usize, f64)> = None;
        for (i, &p) in remaining.iter().enumerate() {
            let points = acc.get(p).column(dim);
            if points <= 0.0 {
                continue;
            }
            match best {
                Some((_, b)) if points <= b => {}
                _ => best = Some((i, points)),
            }
        }
        slots.push(best.map(|(i, _)| remaining.remove(i)));
    }

    sort_desc_by(&mut remaining, |p| acc.get(p).strength);
    let mut leftovers = remaining.into_iter();
    let slots = slots
        .into_iter()
        .filter_map(|slot| slot.or_else(|| leftovers.next()))
        .collect();

    TierPlacement { members, slots }
}

/// The dimension with the most points; the first canonical one on ties or all-zero.
pub fn dominant_dimension(registry: &Registry, acc: &PotentialAccumulator) -> Option<DimensionId> {
    let mut best: Option<DimensionId> = None;
    for dim in registry.dimension_ids() {
        match best {
            Some(b) if acc.column(dim) <= acc.column(b) => {}
            _ => best = Some(dim),
        }
    }
    best
}

fn take_front(pool: &mut Vec<PotentialId>) -> Vec<PotentialId> {
    let n = TIER_SIZE.min(pool.len());
    pool.drain(..n).collect()
}

/// Stable descending sort under IEEE total order.
fn sort_desc_by(ids: &mut [PotentialId], key: impl Fn(PotentialId) -> f64) {
    ids.sort_by(|a, b| key(*b).total_cmp(&key(*a)));
}
