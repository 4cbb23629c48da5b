//! Harvest scoring and the post-harvest pipeline.
//!
//! [`score_harvest`] turns a frozen snapshot into final integers. Everything
//! that happens after that (window decay, pollination) is an ordered list
//! of [`HarvestStage`]s, each taking and returning a [`HarvestResult`].

use std::time::Duration;

use marrow_common::CycleId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::SeedKind;
use crate::config::GrowConfig;
use crate::plant::FrozenStats;
use crate::rng::{pick, GrowRng};

/// Longest harvest window accepted, in hours.
pub const MAX_WINDOW_HOURS: u32 = 168;

/// When a matured plant gets scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HarvestPolicy {
    /// Score the moment the plant matures.
    #[default]
    Immediate,
    /// Keep a window open for a manual harvest, decaying per hour.
    Window {
        /// Window length in hours.
        hours: u32,
    },
}

impl HarvestPolicy {
    /// Clamp the window into a usable range.
    #[must_use]
    pub fn validated(self) -> Self {
        match self {
            Self::Immediate | Self::Window { hours: 0 } => Self::Immediate,
            Self::Window { hours } => Self::Window {
                hours: hours.min(MAX_WINDOW_HOURS),
            },
        }
    }

    /// Length of the window, if any.
    #[must_use]
    pub fn window(self) -> Option<Duration> {
        match self {
            Self::Immediate => None,
            Self::Window { hours } => Some(Duration::from_secs(u64::from(hours) * 3600)),
        }
    }
}

/// Final potency and weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HarvestScore {
    /// Potency in [0, 100].
    pub potency: u32,
    /// Weight in grams, in [0, frozen weight].
    pub weight: u32,
}

/// Score a frozen snapshot.
///
/// Pure: the same snapshot always yields the same score.
#[must_use]
pub fn score_harvest(stats: &FrozenStats, potency_scale: f64) -> HarvestScore {
    let avg_health = if stats.health_ticks > 0 {
        stats.health_sum / f64::from(stats.health_ticks) / 100.0
    } else {
        1.0
    };
    let avg_light_efficiency = if stats.light_efficiency_ticks > 0 {
        stats.light_efficiency_sum / f64::from(stats.light_efficiency_ticks)
    } else {
        1.0
    };

    let raw_potency = stats.potency * avg_light_efficiency * stats.potency_boost * stats.pest_penalty;
    let raw_weight = stats.weight * avg_health * stats.raider_penalty;

    let potency = clamp_round(raw_potency * potency_scale, 100.0);
    let weight = clamp_round(raw_weight, stats.weight.max(0.0));
    HarvestScore {
        potency: potency as u32,
        weight: weight as u32,
    }
}

fn clamp_round(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.round().clamp(0.0, max.floor())
}

/// Seeds handed out after a harvest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedAward {
    /// Strain of the seeds.
    pub seed: SeedKind,
    /// Number of seeds.
    pub count: u32,
    /// Whether another strain pollinated the plant.
    pub cross_pollinated: bool,
}

/// Value flowing through the post-harvest pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestResult {
    /// Cycle that was harvested.
    pub cycle: CycleId,
    /// Harvested strain.
    pub seed: SeedKind,
    /// Final potency.
    pub potency: u32,
    /// Final weight in grams.
    pub weight: u32,
    /// Full hours between maturity and harvest.
    pub hours_waited: u64,
    /// Seeds awarded.
    pub seeds: Vec<SeedAward>,
}

impl HarvestResult {
    /// Empty result for a cycle, before any stage ran.
    #[must_use]
    pub fn new(cycle: CycleId, seed: SeedKind) -> Self {
        Self {
            cycle,
            seed,
            potency: 0,
            weight: 0,
            hours_waited: 0,
            seeds: Vec::new(),
        }
    }

    /// Total seeds awarded.
    #[must_use]
    pub fn seed_count(&self) -> u32 {
        self.seeds.iter().map(|award| award.count).sum()
    }
}

/// Inputs shared by the pipeline stages.
pub struct HarvestContext<'a> {
    /// Frozen snapshot of the cycle.
    pub frozen: &'a FrozenStats,
    /// Tuning.
    pub config: &'a GrowConfig,
    /// Randomness for reward rolls.
    pub rng: &'a mut dyn GrowRng,
    /// Time between maturity and harvest.
    pub waited: Duration,
}

/// One post-harvest step.
pub trait HarvestStage: Send + Sync {
    /// Stage name for logging.
    fn name(&self) -> &'static str;

    /// Transform the result.
    fn apply(&self, result: HarvestResult, ctx: &mut HarvestContext<'_>) -> HarvestResult;
}

/// Computes potency and weight from the frozen snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreStage;

impl HarvestStage for ScoreStage {
    fn name(&self) -> &'static str {
        "score"
    }

    fn apply(&self, mut result: HarvestResult, ctx: &mut HarvestContext<'_>) -> HarvestResult {
        let score = score_harvest(ctx.frozen, ctx.config.potency_scale);
        result.potency = score.potency;
        result.weight = score.weight;
        result
    }
}

/// Decays potency and weight for each full hour waited in a harvest window.
///
/// Potency drops by percentage points, weight by a percentage of itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowDecayStage;

impl HarvestStage for WindowDecayStage {
    fn name(&self) -> &'static str {
        "window-decay"
    }

    fn apply(&self, mut result: HarvestResult, ctx: &mut HarvestContext<'_>) -> HarvestResult {
        let hours = ctx.waited.as_secs() / 3600;
        result.hours_waited = hours;
        if hours == 0 {
            return result;
        }
        let hours = hours as f64;
        let potency = f64::from(result.potency) - hours * ctx.config.window_potency_decay;
        let weight = f64::from(result.weight) * (1.0 - hours * ctx.config.window_weight_decay / 100.0);
        result.potency = potency.round().clamp(0.0, 100.0) as u32;
        result.weight = weight.round().clamp(0.0, f64::from(result.weight)) as u32;
        result
    }
}

/// Chance of a seed from the harvested plant, sometimes cross-pollinated.
#[derive(Debug, Clone, Copy, Default)]
pub struct PollinationStage;

impl HarvestStage for PollinationStage {
    fn name(&self) -> &'static str {
        "pollination"
    }

    fn apply(&self, mut result: HarvestResult, ctx: &mut HarvestContext<'_>) -> HarvestResult {
        if !ctx.rng.chance(ctx.config.pollination_chance) {
            return result;
        }
        let mut award = SeedAward {
            seed: result.seed,
            count: 1,
            cross_pollinated: false,
        };
        if ctx.rng.chance(ctx.config.cross_pollination_chance) {
            let others: Vec<SeedKind> = SeedKind::ALL
                .into_iter()
                .filter(|seed| *seed != result.seed)
                .collect();
            if let Some(other) = pick(&others, ctx.rng) {
                award.seed = *other;
                award.cross_pollinated = true;
            }
        }
        result.seeds.push(award);
        result
    }
}

/// Ordered list of post-harvest stages.
pub struct HarvestPipeline {
    stages: Vec<Box<dyn HarvestStage>>,
}

impl Default for HarvestPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for HarvestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.stages.iter().map(|stage| stage.name()))
            .finish()
    }
}

impl HarvestPipeline {
    /// Pipeline with no stages.
    #[must_use]
    pub fn empty() -> Self {
        Self { stages: Vec::new() }
    }

    /// Score, window decay, pollination.
    #[must_use]
    pub fn standard() -> Self {
        Self::empty()
            .with_stage(ScoreStage)
            .with_stage(WindowDecayStage)
            .with_stage(PollinationStage)
    }

    /// Append a stage.
    #[must_use]
    pub fn with_stage(mut self, stage: impl HarvestStage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Stage names, in order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Run every stage in order.
    pub fn run(&self, initial: HarvestResult, ctx: &mut HarvestContext<'_>) -> HarvestResult {
        self.stages.iter().fold(initial, |result, stage| {
            let next = stage.apply(result, ctx);
            debug!(
                "Harvest stage {}: potency {} weight {}",
                stage.name(),
                next.potency,
                next.weight
            );
            next
        })
    }
}
