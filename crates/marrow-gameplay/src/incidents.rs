//! Event engine: pests, raiders, nutrient boosts and acts of god.
//!
//! At most one of pest, raider or nutrient boost is active at a time. Each
//! is announced when rolled and resolved after a wall-clock delay through
//! the task queue. The act of god is a single timer per cycle.

use marrow_common::Timestamp;
use tracing::{debug, info};

use crate::catalog::{ActTarget, Threat, ACTS_OF_GOD, PESTS, RAIDERS};
use crate::config::GrowConfig;
use crate::cycle::CycleTask;
use crate::events::{EventLog, Severity};
use crate::plant::{GrowthStage, PlantState};
use crate::rng::{pick, GrowRng};
use crate::tasks::{TaskHandle, TaskQueue};

/// A timed event waiting to resolve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Incident {
    /// Potency-damaging pest.
    Pest(Threat),
    /// Yield-damaging raider.
    Raider(Threat),
    /// Chance at a potency boost.
    NutrientBoost,
}

impl Incident {
    /// Message logged when the incident appears.
    #[must_use]
    pub fn announcement(&self) -> &'static str {
        match self {
            Self::Pest(threat) | Self::Raider(threat) => threat.message,
            Self::NutrientBoost => "Nutrient boost available!",
        }
    }

    /// Severity of the announcement.
    #[must_use]
    pub fn announcement_severity(&self) -> Severity {
        match self {
            Self::Pest(_) | Self::Raider(_) => Severity::Warning,
            Self::NutrientBoost => Severity::Info,
        }
    }
}

/// What a resolution did to the plant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// Threat repelled, no change.
    Repelled,
    /// Pest damage applied to potency, in percent.
    PotencyLoss(u32),
    /// Raider damage applied to yield, in percent.
    YieldLoss(u32),
    /// Boost applied to potency, in percent.
    Boosted(u32),
    /// Boost missed.
    Missed,
}

/// What the act of god did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActOutcome {
    /// Deflected, the plant is unharmed.
    Deflected,
    /// Applied to the given attribute.
    Struck(ActTarget),
    /// Already fired this cycle.
    AlreadyFired,
}

/// Per-cycle state of the event engine.
#[derive(Debug, Clone, Default)]
pub struct EventEngine {
    active: Option<(Incident, TaskHandle)>,
    act_of_god: Option<TaskHandle>,
    act_of_god_fired: bool,
}

impl EventEngine {
    /// Create an engine with nothing active.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Incident waiting to resolve, if any.
    #[must_use]
    pub fn active(&self) -> Option<&Incident> {
        self.active.as_ref().map(|(incident, _)| incident)
    }

    /// Whether the act of god already fired this cycle.
    #[must_use]
    pub fn act_of_god_fired(&self) -> bool {
        self.act_of_god_fired
    }

    /// Pending act-of-god timer, if scheduled and not yet fired.
    #[must_use]
    pub fn act_of_god_handle(&self) -> Option<TaskHandle> {
        self.act_of_god
    }

    /// Schedule the single act of god at a random offset inside the configured window.
    ///
    /// Returns the due time, or `None` if one is already scheduled or fired.
    pub fn schedule_act_of_god(
        &mut self,
        total_growth_time: u32,
        now: Timestamp,
        rng: &mut dyn GrowRng,
        config: &GrowConfig,
        tasks: &mut TaskQueue<CycleTask>,
    ) -> Option<Timestamp> {
        if self.act_of_god_fired || self.act_of_god.is_some() {
            return None;
        }
        let (min, max) = config.act_of_god_bounds(total_growth_time);
        let offset = (rng.next_f64() * (max - min) as f64).floor() as u64 + min;
        let due = now.after(std::time::Duration::from_secs(offset));
        self.act_of_god = Some(tasks.schedule(due, CycleTask::ActOfGod));
        debug!("Act of god scheduled {}s into the cycle", offset);
        Some(due)
    }

    /// Per-tick roll. Starts at most one incident and queues its resolution.
    pub fn roll(
        &mut self,
        stage: GrowthStage,
        now: Timestamp,
        rng: &mut dyn GrowRng,
        config: &GrowConfig,
        tasks: &mut TaskQueue<CycleTask>,
        log: &mut EventLog,
    ) -> Option<Incident> {
        if self.active.is_some() || stage.is_terminal() {
            return None;
        }

        let incident = if stage == GrowthStage::Flowering {
            let roll = rng.next_f64();
            if roll < config.nutrient_event_chance {
                Some(Incident::NutrientBoost)
            } else if roll < config.nutrient_event_chance + config.raider_chance {
                pick(&RAIDERS, rng).copied().map(Incident::Raider)
            } else {
                None
            }
        } else if rng.chance(config.pest_chance) {
            pick(&PESTS, rng).copied().map(Incident::Pest)
        } else {
            None
        }?;

        log.push(incident.announcement(), incident.announcement_severity());
        let due = now.after(config.event_resolution_delay());
        let handle = tasks.schedule(due, CycleTask::Resolve(incident));
        self.active = Some((incident, handle));
        info!("Incident started: {}", incident.announcement());
        Some(incident)
    }

    /// Resolve an incident whose delay elapsed and clear the active slot.
    pub fn resolve(
        &mut self,
        incident: Incident,
        plant: &mut PlantState,
        rng: &mut dyn GrowRng,
        config: &GrowConfig,
        log: &mut EventLog,
    ) -> Resolution {
        self.active = None;
        let resolution = match incident {
            Incident::Pest(threat) => {
                let resolution = resolve_threat(&threat, rng, log, "potency", Resolution::PotencyLoss);
                if let Resolution::PotencyLoss(damage) = resolution {
                    plant.scale_pest_penalty(1.0 - f64::from(damage) / 100.0);
                }
                resolution
            }
            Incident::Raider(threat) => {
                let resolution = resolve_threat(&threat, rng, log, "yield", Resolution::YieldLoss);
                if let Resolution::YieldLoss(damage) = resolution {
                    plant.scale_raider_penalty(1.0 - f64::from(damage) / 100.0);
                }
                resolution
            }
            Incident::NutrientBoost => {
                if rng.chance(config.nutrient_boost_chance) {
                    let boost = rng.range_inclusive(config.nutrient_boost_min, config.nutrient_boost_max);
                    plant.scale_potency_boost(1.0 + f64::from(boost) / 100.0);
                    log.push(
                        format!("Nutrient boost applied! Potency increased by {boost}%."),
                        Severity::Info,
                    );
                    Resolution::Boosted(boost)
                } else {
                    log.push("Nutrient boost opportunity missed.", Severity::Info);
                    Resolution::Missed
                }
            }
        };
        debug!("Incident resolved: {:?}", resolution);
        resolution
    }

    /// Fire the act of god. Only the first call per cycle has any effect.
    pub fn fire_act_of_god(
        &mut self,
        plant: &mut PlantState,
        rng: &mut dyn GrowRng,
        config: &GrowConfig,
        log: &mut EventLog,
    ) -> ActOutcome {
        self.act_of_god = None;
        if self.act_of_god_fired {
            return ActOutcome::AlreadyFired;
        }
        self.act_of_god_fired = true;

        if rng.chance(config.act_of_god_deflect_chance) {
            log.push(
                "The act of god was deflected by darker powers. Your plant is unharmed.",
                Severity::ActOfGod,
            );
            info!("Act of god deflected");
            return ActOutcome::Deflected;
        }

        let Some(act) = pick(&ACTS_OF_GOD, rng).copied() else {
            return ActOutcome::Deflected;
        };
        let floor = config.act_of_god_floor;
        let hit = config.act_of_god_magnitude;
        match act.target {
            ActTarget::Water => plant.set_water((plant.water() - hit).max(floor)),
            ActTarget::Light => plant.set_light((plant.light() - hit).max(floor)),
            ActTarget::Nutrients => plant.set_nutrients((plant.nutrients() - hit).max(floor)),
            ActTarget::Health => plant.set_health((plant.health() - hit).max(floor)),
            ActTarget::Stress => plant.set_stress((plant.stress() + hit).min(100.0)),
        }
        log.push(format!("Act of God: {}", act.message), Severity::ActOfGod);
        info!("Act of god struck {:?}", act.target);
        ActOutcome::Struck(act.target)
    }

    /// Forget the active incident and the act-of-god timer.
    ///
    /// Called when the task queue is cleared at the end of the growing phase.
    pub fn clear_pending(&mut self) {
        self.active = None;
        self.act_of_god = None;
    }
}

fn resolve_threat(
    threat: &Threat,
    rng: &mut dyn GrowRng,
    log: &mut EventLog,
    stat: &str,
    loss: fn(u32) -> Resolution,
) -> Resolution {
    if rng.chance(threat.success_rate) {
        log.push(format!("{} were successfully repelled!", threat.name), Severity::Info);
        return Resolution::Repelled;
    }
    let damage = rng.range_inclusive(threat.damage.0, threat.damage.1);
    log.push(
        format!("{} reduced {} by {}%.", threat.name, stat, damage),
        Severity::Error,
    );
    loss(damage)
}
