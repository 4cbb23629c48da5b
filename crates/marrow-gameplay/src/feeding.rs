//! Feeding schedule and saturation tracking.
//!
//! Scheduled watering and feeding run on wall-clock intervals, so they fire
//! at the same real-time rate whatever the game speed.

use marrow_common::Timestamp;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::NutrientMix;
use crate::config::GrowConfig;
use crate::events::{EventLog, Severity};
use crate::plant::{GrowthStage, PlantState};

/// Feeding configuration for one growth stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StageFeeding {
    /// Watering frequency. Zero disables both watering and feeding.
    pub water_times: u32,
    /// Mix applied by scheduled feedings, if any.
    pub mix: Option<NutrientMix>,
}

impl StageFeeding {
    /// Create a stage feeding entry.
    #[must_use]
    pub const fn new(water_times: u32, mix: Option<NutrientMix>) -> Self {
        Self { water_times, mix }
    }
}

/// Per-stage feeding plan, fixed before the cycle starts.
///
/// The default schedule never waters or feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedingSchedule {
    /// Sprout stage.
    pub sprout: StageFeeding,
    /// Vegetative stage.
    pub vegetative: StageFeeding,
    /// Flowering stage.
    pub flowering: StageFeeding,
}

impl FeedingSchedule {
    /// Same entry for every stage.
    #[must_use]
    pub const fn uniform(water_times: u32, mix: Option<NutrientMix>) -> Self {
        let entry = StageFeeding::new(water_times, mix);
        Self {
            sprout: entry,
            vegetative: entry,
            flowering: entry,
        }
    }

    /// Entry for `stage`. The harvest stage has none.
    #[must_use]
    pub fn for_stage(&self, stage: GrowthStage) -> Option<&StageFeeding> {
        match stage {
            GrowthStage::Sprout => Some(&self.sprout),
            GrowthStage::Vegetative => Some(&self.vegetative),
            GrowthStage::Flowering => Some(&self.flowering),
            GrowthStage::Harvest => None,
        }
    }
}

/// Tracks how long a resource has stayed saturated.
#[derive(Debug, Clone, Copy, Default)]
struct Saturation {
    since: Option<Timestamp>,
}

impl Saturation {
    /// Returns the percent loss to apply this tick, if any.
    fn update(
        &mut self,
        level: f64,
        now: Timestamp,
        config: &GrowConfig,
        log: &mut EventLog,
        labels: (&str, &str),
    ) -> Option<u32> {
        if level < config.saturation_threshold {
            self.since = None;
            return None;
        }
        let Some(since) = self.since else {
            self.since = Some(now);
            log.push(format!("Warning: Plant is being {}!", labels.0), Severity::Warning);
            return None;
        };
        let window = config.saturation_window_secs.max(1);
        let elapsed = now.since(since).as_secs();
        if elapsed < window {
            return None;
        }
        let loss = u32::try_from(elapsed / window)
            .unwrap_or(u32::MAX)
            .min(config.saturation_max_loss);
        log.push(
            format!("{} has reduced potency by {}%!", labels.1, loss),
            Severity::Error,
        );
        self.since = Some(now);
        Some(loss)
    }
}

/// Applies scheduled watering and feeding, and penalizes saturation.
#[derive(Debug, Clone)]
pub struct FeedingTracker {
    last_water: Timestamp,
    last_feed: Timestamp,
    over_watered: Saturation,
    over_fed: Saturation,
}

impl FeedingTracker {
    /// Start tracking at `now`. The first watering is one interval away.
    #[must_use]
    pub fn new(now: Timestamp) -> Self {
        Self {
            last_water: now,
            last_feed: now,
            over_watered: Saturation::default(),
            over_fed: Saturation::default(),
        }
    }

    /// Time of the most recent scheduled watering.
    #[must_use]
    pub fn last_water(&self) -> Timestamp {
        self.last_water
    }

    /// Time of the most recent scheduled feeding.
    #[must_use]
    pub fn last_feed(&self) -> Timestamp {
        self.last_feed
    }

    /// Run scheduled watering and feeding for the current stage.
    pub fn apply_schedule(&mut self, plant: &mut PlantState, now: Timestamp, config: &GrowConfig) {
        let Some(entry) = plant.feeding().for_stage(plant.stage()).copied() else {
            return;
        };
        if entry.water_times == 0 {
            return;
        }

        if now.since(self.last_water).as_secs() >= config.water_interval_secs {
            plant.set_water(plant.water() + config.water_step);
            self.last_water = now;
            debug!("Scheduled watering, water now {:.1}", plant.water());
        }

        if let Some(mix) = entry.mix {
            if now.since(self.last_feed).as_secs() >= config.feed_interval_secs {
                plant.set_nutrients(plant.nutrients() + config.feed_step);
                plant.scale_potency_boost(mix.potency());
                plant.scale_weight(mix.yield_factor());
                self.last_feed = now;
                debug!(
                    "Scheduled feeding with {}, nutrients now {:.1}",
                    mix.display_name(),
                    plant.nutrients()
                );
            }
        }
    }

    /// Penalize water or nutrients held at saturation.
    pub fn check_saturation(
        &mut self,
        plant: &mut PlantState,
        now: Timestamp,
        config: &GrowConfig,
        log: &mut EventLog,
    ) {
        if let Some(loss) =
            self.over_watered
                .update(plant.water(), now, config, log, ("over-watered", "Over-watering"))
        {
            plant.scale_pest_penalty(1.0 - f64::from(loss) / 100.0);
        }
        if let Some(loss) =
            self.over_fed
                .update(plant.nutrients(), now, config, log, ("over-fed", "Over-feeding"))
        {
            plant.scale_pest_penalty(1.0 - f64::from(loss) / 100.0);
        }
    }
}
