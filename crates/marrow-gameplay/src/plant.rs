//! Plant state for a single grow cycle.
//!
//! This module provides:
//! - Growth stages with fixed durations
//! - Resource levels clamped to [0, 100]
//! - Running health and light-efficiency accumulators
//! - Multiplicative penalty and boost factors
//! - The frozen snapshot used for harvest scoring

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::{SeedKind, SoilKind};
use crate::feeding::FeedingSchedule;

/// Lowest value any resource level can take.
pub const LEVEL_MIN: f64 = 0.0;
/// Highest value any resource level can take.
pub const LEVEL_MAX: f64 = 100.0;
/// Potency every cycle starts with.
pub const STARTING_POTENCY: f64 = 100.0;
/// Weight every cycle starts with, in grams.
pub const STARTING_WEIGHT: f64 = 1000.0;

fn clamp_level(value: f64) -> f64 {
    if value.is_nan() {
        LEVEL_MIN
    } else {
        value.clamp(LEVEL_MIN, LEVEL_MAX)
    }
}

/// Growth stage of a plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum GrowthStage {
    /// Freshly germinated.
    #[default]
    Sprout,
    /// Leafy growth.
    Vegetative,
    /// Buds forming. Raiders and nutrient boosts show up here.
    Flowering,
    /// Terminal stage, ready to score.
    Harvest,
}

impl GrowthStage {
    /// Stages that have a duration, in order.
    pub const GROWING: [Self; 3] = [Self::Sprout, Self::Vegetative, Self::Flowering];

    /// Get the display name of this stage.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Sprout => "Sprout",
            Self::Vegetative => "Vegetative",
            Self::Flowering => "Flowering",
            Self::Harvest => "Harvest",
        }
    }

    /// Duration of this stage in ticks (seconds at 1x).
    #[must_use]
    pub fn duration(self) -> u32 {
        match self {
            Self::Sprout => 32,
            Self::Vegetative => 48,
            Self::Flowering => 64,
            Self::Harvest => 0,
        }
    }

    /// Ordinal index of this stage.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::Sprout => 0,
            Self::Vegetative => 1,
            Self::Flowering => 2,
            Self::Harvest => 3,
        }
    }

    /// Get the next growth stage. Harvest is terminal.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Sprout => Self::Vegetative,
            Self::Vegetative => Self::Flowering,
            Self::Flowering | Self::Harvest => Self::Harvest,
        }
    }

    /// Check if this is the terminal stage.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Harvest)
    }

    /// Sum of all non-terminal stage durations.
    #[must_use]
    pub fn total_growth_time() -> u32 {
        Self::GROWING.iter().map(|stage| stage.duration()).sum()
    }
}

/// Scoring inputs captured once, when the plant matures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrozenStats {
    /// Sum of per-tick health.
    pub health_sum: f64,
    /// Number of health samples.
    pub health_ticks: u32,
    /// Sum of per-tick light efficiency.
    pub light_efficiency_sum: f64,
    /// Number of light-efficiency samples.
    pub light_efficiency_ticks: u32,
    /// Potency penalty factor.
    pub pest_penalty: f64,
    /// Yield penalty factor.
    pub raider_penalty: f64,
    /// Potency boost factor.
    pub potency_boost: f64,
    /// Weight at maturity.
    pub weight: f64,
    /// Base potency.
    pub potency: f64,
    /// Light level at maturity.
    pub light: f64,
    /// Water level at maturity.
    pub water: f64,
    /// Nutrient level at maturity.
    pub nutrients: f64,
    /// Stress at maturity.
    pub stress: f64,
    /// Optimal light at maturity.
    pub optimal_light: f64,
}

/// Read-only copy of the plant for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlantSnapshot {
    /// Strain.
    pub seed: SeedKind,
    /// Soil.
    pub soil: SoilKind,
    /// Water level.
    pub water: f64,
    /// Light level.
    pub light: f64,
    /// Nutrient level.
    pub nutrients: f64,
    /// Health.
    pub health: f64,
    /// Stress.
    pub stress: f64,
    /// Current stage.
    pub stage: GrowthStage,
    /// Ticks spent in the current stage.
    pub stage_time: u32,
    /// Sum of stage durations.
    pub total_growth_time: u32,
    /// Light the grower should track.
    pub optimal_light: f64,
    /// Potency penalty factor.
    pub pest_penalty: f64,
    /// Yield penalty factor.
    pub raider_penalty: f64,
    /// Potency boost factor.
    pub potency_boost: f64,
    /// Current weight.
    pub weight: f64,
    /// Average health so far, in [0, 100].
    pub average_health: f64,
    /// Average light efficiency so far, in [0, 1].
    pub average_light_efficiency: f64,
    /// Frozen snapshot, once matured.
    pub frozen: Option<FrozenStats>,
}

/// Mutable state of one grow cycle.
///
/// Only the cycle driver mutates it. Resource writes go through setters that
/// clamp to [0, 100]; factors only ever change by multiplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantState {
    seed: SeedKind,
    soil: SoilKind,
    water: f64,
    light: f64,
    nutrients: f64,
    health: f64,
    stress: f64,
    stage: GrowthStage,
    stage_time: u32,
    total_growth_time: u32,
    health_sum: f64,
    health_ticks: u32,
    light_efficiency_sum: f64,
    light_efficiency_ticks: u32,
    pest_penalty: f64,
    raider_penalty: f64,
    potency_boost: f64,
    potency: f64,
    weight: f64,
    optimal_light: f64,
    feeding: FeedingSchedule,
    frozen: Option<FrozenStats>,
    scores_recorded: bool,
}

impl PlantState {
    /// Create a fresh plant with every resource at `initial_level`.
    #[must_use]
    pub fn new(
        seed: SeedKind,
        soil: SoilKind,
        feeding: FeedingSchedule,
        initial_level: f64,
        optimal_light: f64,
    ) -> Self {
        let level = clamp_level(initial_level);
        Self {
            seed,
            soil,
            water: level,
            light: level,
            nutrients: level,
            health: LEVEL_MAX,
            stress: LEVEL_MIN,
            stage: GrowthStage::Sprout,
            stage_time: 0,
            total_growth_time: GrowthStage::total_growth_time(),
            health_sum: 0.0,
            health_ticks: 0,
            light_efficiency_sum: 0.0,
            light_efficiency_ticks: 0,
            pest_penalty: 1.0,
            raider_penalty: 1.0,
            potency_boost: 1.0,
            potency: STARTING_POTENCY,
            weight: STARTING_WEIGHT,
            optimal_light: clamp_level(optimal_light),
            feeding,
            frozen: None,
            scores_recorded: false,
        }
    }

    // ===== Getters =====

    /// Strain.
    #[must_use]
    pub fn seed(&self) -> SeedKind {
        self.seed
    }

    /// Soil.
    #[must_use]
    pub fn soil(&self) -> SoilKind {
        self.soil
    }

    /// Water level.
    #[must_use]
    pub fn water(&self) -> f64 {
        self.water
    }

    /// Light level.
    #[must_use]
    pub fn light(&self) -> f64 {
        self.light
    }

    /// Nutrient level.
    #[must_use]
    pub fn nutrients(&self) -> f64 {
        self.nutrients
    }

    /// Health.
    #[must_use]
    pub fn health(&self) -> f64 {
        self.health
    }

    /// Stress.
    #[must_use]
    pub fn stress(&self) -> f64 {
        self.stress
    }

    /// Current stage.
    #[must_use]
    pub fn stage(&self) -> GrowthStage {
        self.stage
    }

    /// Ticks spent in the current stage.
    #[must_use]
    pub fn stage_time(&self) -> u32 {
        self.stage_time
    }

    /// Sum of all stage durations.
    #[must_use]
    pub fn total_growth_time(&self) -> u32 {
        self.total_growth_time
    }

    /// Health accumulator as `(sum, ticks)`.
    #[must_use]
    pub fn health_samples(&self) -> (f64, u32) {
        (self.health_sum, self.health_ticks)
    }

    /// Light-efficiency accumulator as `(sum, ticks)`.
    #[must_use]
    pub fn light_efficiency_samples(&self) -> (f64, u32) {
        (self.light_efficiency_sum, self.light_efficiency_ticks)
    }

    /// Potency penalty factor.
    #[must_use]
    pub fn pest_penalty(&self) -> f64 {
        self.pest_penalty
    }

    /// Yield penalty factor.
    #[must_use]
    pub fn raider_penalty(&self) -> f64 {
        self.raider_penalty
    }

    /// Potency boost factor.
    #[must_use]
    pub fn potency_boost(&self) -> f64 {
        self.potency_boost
    }

    /// Current weight.
    #[must_use]
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Light the grower should track this stage.
    #[must_use]
    pub fn optimal_light(&self) -> f64 {
        self.optimal_light
    }

    /// Feeding schedule chosen before the cycle started.
    #[must_use]
    pub fn feeding(&self) -> &FeedingSchedule {
        &self.feeding
    }

    /// Frozen snapshot, once the plant has matured.
    #[must_use]
    pub fn frozen(&self) -> Option<&FrozenStats> {
        self.frozen.as_ref()
    }

    /// Whether the harvest score has been recorded.
    #[must_use]
    pub fn scores_recorded(&self) -> bool {
        self.scores_recorded
    }

    /// Light efficiency for the current light level, in [0, 1].
    #[must_use]
    pub fn light_efficiency(&self) -> f64 {
        (1.0 - (self.light - self.optimal_light).abs() / 100.0).max(0.0)
    }

    /// Take a read-only snapshot.
    #[must_use]
    pub fn snapshot(&self) -> PlantSnapshot {
        PlantSnapshot {
            seed: self.seed,
            soil: self.soil,
            water: self.water,
            light: self.light,
            nutrients: self.nutrients,
            health: self.health,
            stress: self.stress,
            stage: self.stage,
            stage_time: self.stage_time,
            total_growth_time: self.total_growth_time,
            optimal_light: self.optimal_light,
            pest_penalty: self.pest_penalty,
            raider_penalty: self.raider_penalty,
            potency_boost: self.potency_boost,
            weight: self.weight,
            average_health: if self.health_ticks > 0 {
                self.health_sum / f64::from(self.health_ticks)
            } else {
                LEVEL_MAX
            },
            average_light_efficiency: if self.light_efficiency_ticks > 0 {
                self.light_efficiency_sum / f64::from(self.light_efficiency_ticks)
            } else {
                1.0
            },
            frozen: self.frozen,
        }
    }

    // ===== Resource levels =====

    pub(crate) fn set_water(&mut self, value: f64) {
        self.water = clamp_level(value);
    }

    pub(crate) fn set_light(&mut self, value: f64) {
        self.light = clamp_level(value);
    }

    pub(crate) fn set_nutrients(&mut self, value: f64) {
        self.nutrients = clamp_level(value);
    }

    pub(crate) fn set_health(&mut self, value: f64) {
        self.health = clamp_level(value);
    }

    pub(crate) fn set_stress(&mut self, value: f64) {
        self.stress = clamp_level(value);
    }

    /// Passive per-tick drain from seed and soil multipliers.
    pub(crate) fn drain(&mut self, base_rate: f64) {
        let seed = self.seed.drain();
        let soil = self.soil.drain();
        self.set_water(self.water - base_rate * seed.water * soil.water);
        self.set_nutrients(self.nutrients - base_rate * seed.nutrients * soil.nutrients);
    }

    /// Recompute health as the mean of water, nutrient and light factors, then stress.
    ///
    /// Returns the new health.
    pub(crate) fn recompute_health(&mut self, light_penalty_scale: f64) -> f64 {
        let light_penalty = (self.light - self.optimal_light).abs() / 100.0 * light_penalty_scale;
        let factors = [self.water / 100.0, 1.0 - light_penalty, self.nutrients / 100.0];
        let mean = factors.iter().sum::<f64>() / factors.len() as f64;
        self.set_health(mean * 100.0);
        self.set_stress(LEVEL_MAX - self.health);
        self.health
    }

    // ===== Accumulators =====

    pub(crate) fn accumulate_health(&mut self) {
        self.health_sum += self.health;
        self.health_ticks += 1;
    }

    pub(crate) fn accumulate_light_efficiency(&mut self) -> f64 {
        let efficiency = self.light_efficiency();
        self.light_efficiency_sum += efficiency;
        self.light_efficiency_ticks += 1;
        efficiency
    }

    pub(crate) fn increment_stage_time(&mut self) {
        self.stage_time += 1;
    }

    /// Whether the current stage has run its full duration.
    #[must_use]
    pub(crate) fn stage_complete(&self) -> bool {
        !self.stage.is_terminal() && self.stage_time >= self.stage.duration()
    }

    /// Move to the next stage and reset the stage timer.
    pub(crate) fn advance_stage(&mut self) -> GrowthStage {
        self.stage = self.stage.next();
        self.stage_time = 0;
        self.stage
    }

    pub(crate) fn set_optimal_light(&mut self, value: f64) {
        self.optimal_light = clamp_level(value);
    }

    // ===== Factors =====

    pub(crate) fn scale_pest_penalty(&mut self, factor: f64) {
        if let Some(value) = scaled(self.pest_penalty, factor, "pest_penalty") {
            self.pest_penalty = value;
        }
    }

    pub(crate) fn scale_raider_penalty(&mut self, factor: f64) {
        if let Some(value) = scaled(self.raider_penalty, factor, "raider_penalty") {
            self.raider_penalty = value;
        }
    }

    pub(crate) fn scale_potency_boost(&mut self, factor: f64) {
        if let Some(value) = scaled(self.potency_boost, factor, "potency_boost") {
            self.potency_boost = value;
        }
    }

    pub(crate) fn scale_weight(&mut self, factor: f64) {
        if let Some(value) = scaled(self.weight, factor, "weight") {
            self.weight = value;
        }
    }

    // ===== Harvest =====

    /// Capture the frozen snapshot. Returns false if it was already taken.
    pub(crate) fn freeze(&mut self) -> bool {
        if self.frozen.is_some() {
            return false;
        }
        self.frozen = Some(FrozenStats {
            health_sum: self.health_sum,
            health_ticks: self.health_ticks,
            light_efficiency_sum: self.light_efficiency_sum,
            light_efficiency_ticks: self.light_efficiency_ticks,
            pest_penalty: self.pest_penalty,
            raider_penalty: self.raider_penalty,
            potency_boost: self.potency_boost,
            weight: self.weight,
            potency: self.potency,
            light: self.light,
            water: self.water,
            nutrients: self.nutrients,
            stress: self.stress,
            optimal_light: self.optimal_light,
        });
        true
    }

    /// Flag the score as recorded. Returns false if it already was.
    pub(crate) fn mark_scores_recorded(&mut self) -> bool {
        !std::mem::replace(&mut self.scores_recorded, true)
    }
}

fn scaled(current: f64, factor: f64, name: &str) -> Option<f64> {
    if factor.is_finite() && factor > 0.0 {
        Some(current * factor)
    } else {
        warn!("Ignoring non-positive {} factor {}", name, factor);
        None
    }
}
