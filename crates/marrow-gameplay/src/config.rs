//! Tuning constants for the grow cycle.
//!
//! Every constant the simulation uses lives in [`GrowConfig`]. The defaults
//! are the shipped game balance; the engine loads overrides from the
//! `[grow]` table of its TOML file.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::harvest::HarvestPolicy;

/// Grow-cycle tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowConfig {
    // ===== Plant =====
    /// Starting water, light and nutrient level.
    pub initial_level: f64,
    /// Base drain per tick before seed and soil multipliers.
    pub base_drain_rate: f64,
    /// Health lost per unit of light distance from optimal, relative to 100.
    pub light_penalty_scale: f64,
    /// Lower bound of the optimal-light draw.
    pub optimal_light_min: u32,
    /// Upper bound of the optimal-light draw.
    pub optimal_light_max: u32,

    // ===== Events =====
    /// Wall-clock delay between an event appearing and resolving.
    pub event_resolution_secs: u64,
    /// Per-tick pest chance outside flowering.
    pub pest_chance: f64,
    /// Per-tick nutrient-boost chance while flowering.
    pub nutrient_event_chance: f64,
    /// Per-tick raider chance while flowering, on top of the boost chance.
    pub raider_chance: f64,
    /// Chance a nutrient boost event pays out.
    pub nutrient_boost_chance: f64,
    /// Smallest potency boost in percent.
    pub nutrient_boost_min: u32,
    /// Largest potency boost in percent.
    pub nutrient_boost_max: u32,

    // ===== Acts of god =====
    /// Earliest act-of-god time as a fraction of total growth time.
    pub act_of_god_window_start: f64,
    /// Latest act-of-god time as a fraction of total growth time.
    pub act_of_god_window_end: f64,
    /// Chance an act of god is deflected.
    pub act_of_god_deflect_chance: f64,
    /// Level an act of god cannot push a resource below.
    pub act_of_god_floor: f64,
    /// Amount an act of god removes.
    pub act_of_god_magnitude: f64,

    // ===== Feeding =====
    /// Seconds between scheduled waterings.
    pub water_interval_secs: u64,
    /// Water added per scheduled watering.
    pub water_step: f64,
    /// Seconds between scheduled feedings.
    pub feed_interval_secs: u64,
    /// Nutrients added per scheduled feeding.
    pub feed_step: f64,
    /// Level at or above which water or nutrients count as saturated.
    pub saturation_threshold: f64,
    /// Seconds of saturation per percent of potency lost.
    pub saturation_window_secs: u64,
    /// Largest potency loss in percent per penalty.
    pub saturation_max_loss: u32,

    // ===== Harvest =====
    /// Potency scale so that perfect play scores 66.
    pub potency_scale: f64,
    /// When scoring happens.
    pub harvest_policy: HarvestPolicy,
    /// Potency lost per hour inside a harvest window, in percent.
    pub window_potency_decay: f64,
    /// Weight lost per hour inside a harvest window, in percent.
    pub window_weight_decay: f64,
    /// Chance a harvest yields a seed.
    pub pollination_chance: f64,
    /// Chance that seed was pollinated by another strain.
    pub cross_pollination_chance: f64,
    /// Chance that looking for seeds finds one.
    pub look_for_seeds_chance: f64,

    // ===== Lives =====
    /// Lives granted on first play and after a lockout.
    pub starting_lives: u32,
    /// Hours a grower is locked out after running out of lives.
    pub lockout_hours: u64,
    /// Number of seed options offered per selection.
    pub seed_option_count: usize,
}

impl Default for GrowConfig {
    fn default() -> Self {
        Self {
            initial_level: 80.0,
            base_drain_rate: 2.0,
            light_penalty_scale: 2.0,
            optimal_light_min: 30,
            optimal_light_max: 90,

            event_resolution_secs: 10,
            pest_chance: 0.20,
            nutrient_event_chance: 0.10,
            raider_chance: 0.15,
            nutrient_boost_chance: 0.5,
            nutrient_boost_min: 5,
            nutrient_boost_max: 15,

            act_of_god_window_start: 0.2,
            act_of_god_window_end: 0.8,
            act_of_god_deflect_chance: 0.3,
            act_of_god_floor: 10.0,
            act_of_god_magnitude: 30.0,

            water_interval_secs: 10,
            water_step: 20.0,
            feed_interval_secs: 30,
            feed_step: 20.0,
            saturation_threshold: 95.0,
            saturation_window_secs: 30,
            saturation_max_loss: 5,

            potency_scale: 0.66,
            harvest_policy: HarvestPolicy::Immediate,
            window_potency_decay: 2.0,
            window_weight_decay: 1.5,
            pollination_chance: 0.70,
            cross_pollination_chance: 0.25,
            look_for_seeds_chance: 0.95,

            starting_lives: 3,
            lockout_hours: 24,
            seed_option_count: 3,
        }
    }
}

impl GrowConfig {
    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.initial_level = self.initial_level.clamp(0.0, 100.0);
        self.base_drain_rate = self.base_drain_rate.clamp(0.0, 100.0);
        self.light_penalty_scale = self.light_penalty_scale.clamp(0.0, 10.0);
        self.optimal_light_max = self.optimal_light_max.min(100);
        self.optimal_light_min = self.optimal_light_min.min(self.optimal_light_max);

        // Probabilities
        for p in [
            &mut self.pest_chance,
            &mut self.nutrient_event_chance,
            &mut self.raider_chance,
            &mut self.nutrient_boost_chance,
            &mut self.act_of_god_deflect_chance,
            &mut self.pollination_chance,
            &mut self.cross_pollination_chance,
            &mut self.look_for_seeds_chance,
        ] {
            *p = p.clamp(0.0, 1.0);
        }
        if self.nutrient_event_chance + self.raider_chance > 1.0 {
            warn!("Flowering event chances exceed 1.0, raider chance reduced");
            self.raider_chance = 1.0 - self.nutrient_event_chance;
        }
        self.nutrient_boost_min = self.nutrient_boost_min.min(self.nutrient_boost_max);

        self.act_of_god_window_end = self.act_of_god_window_end.clamp(0.0, 1.0);
        self.act_of_god_window_start = self.act_of_god_window_start.clamp(0.0, self.act_of_god_window_end);
        self.act_of_god_floor = self.act_of_god_floor.clamp(0.0, 100.0);
        self.act_of_god_magnitude = self.act_of_god_magnitude.clamp(0.0, 100.0);

        self.water_step = self.water_step.clamp(0.0, 100.0);
        self.feed_step = self.feed_step.clamp(0.0, 100.0);
        self.saturation_threshold = self.saturation_threshold.clamp(0.0, 100.0);
        self.saturation_window_secs = self.saturation_window_secs.max(1);
        self.saturation_max_loss = self.saturation_max_loss.min(99);

        self.potency_scale = self.potency_scale.clamp(0.0, 1.0);
        self.window_potency_decay = self.window_potency_decay.clamp(0.0, 100.0);
        self.window_weight_decay = self.window_weight_decay.clamp(0.0, 100.0);
        self.harvest_policy = self.harvest_policy.validated();

        self.starting_lives = self.starting_lives.max(1);
        self.seed_option_count = self.seed_option_count.clamp(1, crate::catalog::SeedKind::ALL.len());
    }

    /// Delay before a triggered event resolves.
    #[must_use]
    pub fn event_resolution_delay(&self) -> Duration {
        Duration::from_secs(self.event_resolution_secs)
    }

    /// Length of a lockout.
    #[must_use]
    pub fn lockout_duration(&self) -> Duration {
        Duration::from_secs(self.lockout_hours * 3600)
    }

    /// Earliest and latest act-of-god offsets in whole seconds.
    #[must_use]
    pub fn act_of_god_bounds(&self, total_growth_time: u32) -> (u64, u64) {
        let total = f64::from(total_growth_time);
        let min = (total * self.act_of_god_window_start).floor() as u64;
        let max = (total * self.act_of_god_window_end).floor() as u64;
        (min, max.max(min))
    }
}
