//! # Potential & Dimension Registry
//!
//! The one immutable table of the nine potentials, the three dimensions and the
//! typo-correction map. Built once (from `config/engine.toml` or the built-in
//! seed), validated, then shared read-only by every scoring run.
//!
//! Token lookup order: exact display name → case-insensitive internal id
//! (also after stripping an `opt_` / `option_` prefix) → typo table.
//! Per-question option tables are layered on top by the schema normalizer.

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

pub const POTENTIAL_COUNT: usize = 9;
pub const DIMENSION_COUNT: usize = 3;

/// Prefixes older schemas put in front of option tokens.
const TOKEN_PREFIXES: [&str; 2] = ["option_", "opt_"];

/// Index of a potential in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PotentialId(usize);

impl PotentialId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of a dimension in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DimensionId(usize);

impl DimensionId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Potential {
    /// Stable internal id, e.g. `"citrine"`.
    pub id: String,
    /// Display name shown to respondents, e.g. `"Цитрин"`.
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub id: String,
    pub name: String,
}

/// Which registry rule matched a token. Kept for debug logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenMatch {
    DisplayName,
    InternalId,
    TypoCorrection,
    OptionTable,
}

#[derive(Debug, Clone)]
pub struct Registry {
    potentials: Vec<Potential>,
    dimensions: Vec<Dimension>,
    by_name: HashMap<String, PotentialId>,
    by_id: HashMap<String, PotentialId>,
    typos: HashMap<String, PotentialId>,
    dimension_keys: HashMap<String, DimensionId>,
}

impl Registry {
    /// Validate and index the given tables.
    ///
    /// Fails if the counts are not exactly nine and three, an id or display
    /// name is empty or repeated, or a typo correction names an unknown
    /// potential.
    pub fn new(
        potentials: Vec<Potential>,
        dimensions: Vec<Dimension>,
        typos: BTreeMap<String, String>,
    ) -> Result<Self, ConfigurationError> {
        if potentials.len() != POTENTIAL_COUNT {
            return Err(ConfigurationError::PotentialCount {
                expected: POTENTIAL_COUNT,
                found: potentials.len(),
            });
        }
        if dimensions.len() != DIMENSION_COUNT {
            return Err(ConfigurationError::DimensionCount {
                expected: DIMENSION_COUNT,
                found: dimensions.len(),
            });
        }
        check_ids("potential", potentials.iter().map(|p| p.id.as_str()))?;
        check_ids("dimension", dimensions.iter().map(|d| d.id.as_str()))?;
        // Display names are lookup keys too.
        check_ids("potential name", potentials.iter().map(|p| p.name.as_str()))?;
        check_ids("dimension name", dimensions.iter().map(|d| d.name.as_str()))?;

        let mut registry = Self::index(potentials, dimensions);
        for (typo, target) in typos {
            let pid = registry
                .by_id
                .get(&normalize(&target))
                .copied()
                .ok_or_else(|| ConfigurationError::UnknownTypoTarget {
                    typo: typo.clone(),
                    target: target.clone(),
                })?;
            registry.typos.insert(normalize(&typo), pid);
        }
        Ok(registry)
    }

    /// Built-in registry used when no config file is present.
    pub fn default_seed() -> Self {
        let potentials = [
            ("amber", "Янтарь"),
            ("shungite", "Шунгит"),
            ("citrine", "Цитрин"),
            ("emerald", "Изумруд"),
            ("ruby", "Рубин"),
            ("garnet", "Гранат"),
            ("sapphire", "Сапфир"),
            ("heliodor", "Гелиодор"),
            ("amethyst", "Аметист"),
        ]
        .into_iter()
        .map(|(id, name)| Potential {
            id: id.to_string(),
            name: name.to_string(),
        })
        .collect();

        let dimensions = [
            ("perception", "Восприятие"),
            ("motivation", "Мотивация"),
            ("instrument", "Инструмент"),
        ]
        .into_iter()
        .map(|(id, name)| Dimension {
            id: id.to_string(),
            name: name.to_string(),
        })
        .collect();

        let mut registry = Self::index(potentials, dimensions);
        for (typo, target) in default_typos() {
            if let Some(&pid) = registry.by_id.get(target) {
                registry.typos.insert(typo.to_string(), pid);
            }
        }
        registry
    }

    fn index(potentials: Vec<Potential>, dimensions: Vec<Dimension>) -> Self {
        let mut by_name = HashMap::new();
        let mut by_id = HashMap::new();
        for (i, p) in potentials.iter().enumerate() {
            by_name.insert(p.name.trim().to_string(), PotentialId(i));
            by_id.insert(normalize(&p.id), PotentialId(i));
        }

        let mut dimension_keys = HashMap::new();
        for (i, d) in dimensions.iter().enumerate() {
            dimension_keys.insert(normalize(&d.name), DimensionId(i));
        }
        // Ids win over display names on collision.
        for (i, d) in dimensions.iter().enumerate() {
            dimension_keys.insert(normalize(&d.id), DimensionId(i));
        }

        Self {
            potentials,
            dimensions,
            by_name,
            by_id,
            typos: HashMap::new(),
            dimension_keys,
        }
    }

    pub fn potentials(&self) -> &[Potential] {
        &self.potentials
    }

    pub fn potential(&self, id: PotentialId) -> &Potential {
        &self.potentials[id.0]
    }

    /// Potential ids in declaration order.
    pub fn potential_ids(&self) -> impl Iterator<Item = PotentialId> + '_ {
        (0..self.potentials.len()).map(PotentialId)
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn dimension(&self, id: DimensionId) -> &Dimension {
        &self.dimensions[id.0]
    }

    /// Dimension ids in canonical order.
    pub fn dimension_ids(&self) -> impl Iterator<Item = DimensionId> + '_ {
        (0..self.dimensions.len()).map(DimensionId)
    }

    pub fn typo_count(&self) -> usize {
        self.typos.len()
    }

    /// Look up a potential by internal id (case-insensitive).
    pub fn potential_by_id(&self, id: &str) -> Option<PotentialId> {
        self.by_id.get(&normalize(id)).copied()
    }

    /// Match a dimension by id or display name (case-insensitive).
    pub fn resolve_dimension(&self, raw: &str) -> Option<DimensionId> {
        let key = normalize(raw);
        if key.is_empty() {
            return None;
        }
        self.dimension_keys.get(&key).copied()
    }

    /// Resolve an answer token against the fixed tables only.
    pub fn resolve_token(&self, token: &str) -> Option<(PotentialId, TokenMatch)> {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Some(&pid) = self.by_name.get(trimmed) {
            return Some((pid, TokenMatch::DisplayName));
        }

        let key = normalize(trimmed);
        let stripped = strip_token_prefix(&key);
        for candidate in [key.as_str(), stripped] {
            if let Some(&pid) = self.by_id.get(candidate) {
                return Some((pid, TokenMatch::InternalId));
            }
        }
        for candidate in [key.as_str(), stripped] {
            if let Some(&pid) = self.typos.get(candidate) {
                return Some((pid, TokenMatch::TypoCorrection));
            }
        }
        None
    }
}

/// Lowercase + trim. Unicode-aware so Cyrillic display names compare too.
pub(crate) fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// `"opt_citrine"` → `"citrine"`; tokens without a known prefix are returned as is.
pub(crate) fn strip_token_prefix(token: &str) -> &str {
    TOKEN_PREFIXES
        .iter()
        .find_map(|p| token.strip_prefix(p))
        .unwrap_or(token)
}

fn check_ids<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), ConfigurationError> {
    let mut seen = HashSet::new();
    for (position, id) in ids.enumerate() {
        let key = normalize(id);
        if key.is_empty() {
            return Err(ConfigurationError::EmptyId { kind, position });
        }
        if !seen.insert(key) {
            return Err(ConfigurationError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

/// Known transliteration slips seen in hand-written answer files.
fn default_typos() -> [(&'static str, &'static str); 14] {
    [
        ("yantar", "amber"),
        ("jantar", "amber"),
        ("shungit", "shungite"),
        ("schungite", "shungite"),
        ("citrin", "citrine"),
        ("tsitrin", "citrine"),
        ("izumrud", "emerald"),
        ("rubin", "ruby"),
        ("granat", "garnet"),
        ("sapfir", "sapphire"),
        ("saphire", "sapphire"),
        ("geliodor", "heliodor"),
        ("heliodore", "heliodor"),
        ("ametist", "amethyst"),
    ]
}
