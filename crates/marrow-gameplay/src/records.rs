//! Grower records: score history, seed bank and lives.
//!
//! The simulation never touches storage. After a harvest it reports through
//! [`HarvestLedger`]; [`GrowerRecord`] is the in-memory implementation the
//! engine persists as part of a [`ScoreBook`].

use std::collections::BTreeMap;

use marrow_common::{GrowerId, SchemaVersion};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::SeedKind;
use crate::lives::LifeLedger;

/// Kind of score reported after a harvest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreKind {
    /// Final potency.
    Potency,
    /// Final weight.
    Yield,
}

/// Sink for harvest outcomes.
pub trait HarvestLedger {
    /// Record a final score. Called once per kind per harvested cycle.
    fn record_score(&mut self, kind: ScoreKind, value: u32);

    /// Add seeds to the grower's bank.
    fn award_seeds(&mut self, seed: SeedKind, count: u32);
}

/// Ledger that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLedger;

impl HarvestLedger for NullLedger {
    fn record_score(&mut self, _kind: ScoreKind, _value: u32) {}

    fn award_seeds(&mut self, _seed: SeedKind, _count: u32) {}
}

/// Everything kept about one grower.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowerRecord {
    /// Every potency score, oldest first.
    pub potency_history: Vec<u32>,
    /// Sum of every yield.
    pub total_yield: u64,
    /// Seeds banked per strain.
    pub seed_bank: BTreeMap<SeedKind, u32>,
    /// Lives and lockout.
    pub lives: LifeLedger,
}

impl Default for GrowerRecord {
    fn default() -> Self {
        Self::new(3)
    }
}

impl GrowerRecord {
    /// Fresh record with `starting_lives`.
    #[must_use]
    pub fn new(starting_lives: u32) -> Self {
        Self {
            potency_history: Vec::new(),
            total_yield: 0,
            seed_bank: BTreeMap::new(),
            lives: LifeLedger::new(starting_lives),
        }
    }

    /// Seeds banked for `seed`.
    #[must_use]
    pub fn seeds_of(&self, seed: SeedKind) -> u32 {
        self.seed_bank.get(&seed).copied().unwrap_or(0)
    }

    /// Best potency ever scored.
    #[must_use]
    pub fn best_potency(&self) -> Option<u32> {
        self.potency_history.iter().copied().max()
    }

    /// Mean potency across harvests.
    #[must_use]
    pub fn average_potency(&self) -> Option<f64> {
        if self.potency_history.is_empty() {
            return None;
        }
        let sum: u64 = self.potency_history.iter().map(|p| u64::from(*p)).sum();
        Some(sum as f64 / self.potency_history.len() as f64)
    }

    /// Number of harvests recorded.
    #[must_use]
    pub fn harvests(&self) -> usize {
        self.potency_history.len()
    }
}

impl HarvestLedger for GrowerRecord {
    fn record_score(&mut self, kind: ScoreKind, value: u32) {
        match kind {
            ScoreKind::Potency => self.potency_history.push(value),
            ScoreKind::Yield => self.total_yield += u64::from(value),
        }
        debug!("Recorded {:?} score {}", kind, value);
    }

    fn award_seeds(&mut self, seed: SeedKind, count: u32) {
        if count == 0 {
            return;
        }
        *self.seed_bank.entry(seed).or_insert(0) += count;
        // Each seed is another attempt
        self.lives.grant(count);
        debug!("Awarded {} {} seed(s)", count, seed.key());
    }
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry<T> {
    /// Grower.
    pub grower: GrowerId,
    /// Ranked value.
    pub value: T,
}

/// All grower records, keyed by grower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBook {
    /// Schema version of the book.
    pub version: SchemaVersion,
    /// Records by grower.
    pub growers: BTreeMap<GrowerId, GrowerRecord>,
}

impl Default for ScoreBook {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreBook {
    /// Empty book at the current schema version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            version: SchemaVersion::SCORE_BOOK,
            growers: BTreeMap::new(),
        }
    }

    /// Record for `grower`, if any.
    #[must_use]
    pub fn get(&self, grower: &GrowerId) -> Option<&GrowerRecord> {
        self.growers.get(grower)
    }

    /// Record for `grower`, created with `starting_lives` on first play.
    pub fn record_mut(&mut self, grower: &GrowerId, starting_lives: u32) -> &mut GrowerRecord {
        self.growers
            .entry(grower.clone())
            .or_insert_with(|| GrowerRecord::new(starting_lives))
    }

    /// Number of growers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.growers.len()
    }

    /// Whether the book is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.growers.is_empty()
    }

    /// Highest single potency scores across all growers, best first.
    #[must_use]
    pub fn top_potency(&self, limit: usize) -> Vec<LeaderboardEntry<u32>> {
        let mut rows: Vec<_> = self
            .growers
            .iter()
            .flat_map(|(grower, record)| {
                record.potency_history.iter().map(move |p| LeaderboardEntry {
                    grower: grower.clone(),
                    value: *p,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.grower.cmp(&b.grower)));
        rows.truncate(limit);
        rows
    }

    /// Growers by total yield, largest first.
    #[must_use]
    pub fn top_yield(&self, limit: usize) -> Vec<LeaderboardEntry<u64>> {
        let mut rows: Vec<_> = self
            .growers
            .iter()
            .filter(|(_, record)| record.total_yield > 0)
            .map(|(grower, record)| LeaderboardEntry {
                grower: grower.clone(),
                value: record.total_yield,
            })
            .collect();
        rows.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.grower.cmp(&b.grower)));
        rows.truncate(limit);
        rows
    }

    /// Growers by average potency, best first.
    #[must_use]
    pub fn top_average_potency(&self, limit: usize) -> Vec<LeaderboardEntry<f64>> {
        let mut rows: Vec<_> = self
            .growers
            .iter()
            .filter_map(|(grower, record)| {
                record.average_potency().map(|value| LeaderboardEntry {
                    grower: grower.clone(),
                    value,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.grower.cmp(&b.grower)));
        rows.truncate(limit);
        rows
    }
}
