//! One grow cycle from planting to harvest or death.
//!
//! [`GrowCycle`] is the only writer of its [`PlantState`]. The session feeds
//! it ticks and due tasks; everything it schedules goes into the shared
//! [`TaskQueue`] and is cancelled as soon as the growing phase ends.

use std::time::Duration;

use marrow_common::{CycleId, GrowError, GrowResult, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::{SeedKind, SoilKind};
use crate::config::GrowConfig;
use crate::events::{EventLog, Severity};
use crate::feeding::{FeedingSchedule, FeedingTracker};
use crate::harvest::{HarvestContext, HarvestPipeline, HarvestResult};
use crate::incidents::{ActOutcome, EventEngine, Incident, Resolution};
use crate::plant::{GrowthStage, PlantState};
use crate::records::{HarvestLedger, ScoreKind};
use crate::rng::GrowRng;
use crate::tasks::TaskQueue;

/// Deferred work tied to a cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleTask {
    /// Resolve a pest, raider or nutrient boost.
    Resolve(Incident),
    /// Fire the act of god.
    ActOfGod,
    /// Harvest automatically when the window runs out.
    CloseHarvestWindow,
}

/// Where a session is in the cycle lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GrowPhase {
    /// No cycle configured.
    #[default]
    Idle,
    /// Ticking.
    Growing,
    /// Stats frozen, waiting to be harvested.
    Matured,
    /// Scored.
    Harvested,
    /// Health hit zero.
    Failed,
}

impl GrowPhase {
    /// Get the display name of this phase.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Growing => "Growing",
            Self::Matured => "Ready to harvest",
            Self::Harvested => "Harvested",
            Self::Failed => "Dead",
        }
    }

    /// Whether a cycle is in progress and blocks a new one.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Growing | Self::Matured)
    }

    /// Whether the cycle is over.
    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Harvested | Self::Failed)
    }
}

/// What a tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing notable.
    Continued,
    /// The plant entered a new growing stage.
    Advanced(GrowthStage),
    /// The plant reached the harvest stage and its stats were frozen.
    Matured,
    /// Health reached zero.
    Died,
    /// The cycle is not growing; the tick was ignored.
    Inactive,
}

/// What a deferred task did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TaskOutcome {
    /// An incident resolved.
    Resolved(Resolution),
    /// The act of god fired.
    ActOfGod(ActOutcome),
    /// The harvest window closed; the caller should harvest.
    WindowClosed,
    /// The task no longer applies to this cycle.
    Stale,
}

/// Live state of one grow cycle.
#[derive(Debug, Clone)]
pub struct GrowCycle {
    id: CycleId,
    plant: PlantState,
    engine: EventEngine,
    feeding: FeedingTracker,
    phase: GrowPhase,
    started_at: Timestamp,
    matured_at: Option<Timestamp>,
    ticks: u64,
    report: Option<HarvestResult>,
    searched_for_seeds: bool,
}

impl GrowCycle {
    /// Plant a new cycle.
    ///
    /// Resources start at the configured level and optimal light is drawn.
    /// One status update and one accumulation run immediately so the plant
    /// shows real values before the first tick, then the act of god is
    /// scheduled.
    #[allow(clippy::too_many_arguments)]
    pub fn start(
        id: CycleId,
        seed: SeedKind,
        soil: SoilKind,
        feeding: FeedingSchedule,
        now: Timestamp,
        rng: &mut dyn GrowRng,
        config: &GrowConfig,
        tasks: &mut TaskQueue<CycleTask>,
        log: &mut EventLog,
    ) -> Self {
        let optimal = draw_optimal_light(rng, config);
        let plant = PlantState::new(seed, soil, feeding, config.initial_level, optimal);
        let mut cycle = Self {
            id,
            plant,
            engine: EventEngine::new(),
            feeding: FeedingTracker::new(now),
            phase: GrowPhase::Growing,
            started_at: now,
            matured_at: None,
            ticks: 0,
            report: None,
            searched_for_seeds: false,
        };

        cycle.update_status(now, config, log);
        cycle.plant.accumulate_health();
        cycle.plant.accumulate_light_efficiency();

        let total = cycle.plant.total_growth_time();
        cycle
            .engine
            .schedule_act_of_god(total, now, rng, config, tasks);

        info!(
            "Planted {} in {} soil ({}), optimal light {}",
            seed.display_name(),
            soil.key(),
            id,
            optimal
        );
        cycle
    }

    // ===== Accessors =====

    /// Cycle identifier.
    #[must_use]
    pub fn id(&self) -> CycleId {
        self.id
    }

    /// Plant state.
    #[must_use]
    pub fn plant(&self) -> &PlantState {
        &self.plant
    }

    /// Event engine state.
    #[must_use]
    pub fn engine(&self) -> &EventEngine {
        &self.engine
    }

    /// Feeding tracker.
    #[must_use]
    pub fn feeding(&self) -> &FeedingTracker {
        &self.feeding
    }

    /// Lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> GrowPhase {
        self.phase
    }

    /// When the cycle was planted.
    #[must_use]
    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    /// When the plant matured, if it has.
    #[must_use]
    pub fn matured_at(&self) -> Option<Timestamp> {
        self.matured_at
    }

    /// Ticks processed while growing.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Harvest result, once scored.
    #[must_use]
    pub fn report(&self) -> Option<&HarvestResult> {
        self.report.as_ref()
    }

    // ===== Ticking =====

    /// Advance the plant by one tick.
    pub fn tick(
        &mut self,
        now: Timestamp,
        rng: &mut dyn GrowRng,
        config: &GrowConfig,
        tasks: &mut TaskQueue<CycleTask>,
        log: &mut EventLog,
    ) -> TickOutcome {
        if self.phase != GrowPhase::Growing {
            return TickOutcome::Inactive;
        }
        // Death wins over any stage progress this tick
        if self.plant.health() <= 0.0 {
            self.fail(tasks, log);
            return TickOutcome::Died;
        }
        self.ticks += 1;

        self.plant.increment_stage_time();
        self.plant.accumulate_health();
        let efficiency = self.plant.accumulate_light_efficiency();
        debug!(
            "Tick {}: stage {} t={} efficiency {:.3}",
            self.ticks,
            self.plant.stage().display_name(),
            self.plant.stage_time(),
            efficiency
        );

        self.engine
            .roll(self.plant.stage(), now, rng, config, tasks, log);

        let mut outcome = TickOutcome::Continued;
        if self.plant.stage_complete() {
            let stage = self.plant.advance_stage();
            if stage.is_terminal() {
                self.mature(now, tasks, log);
                return TickOutcome::Matured;
            }
            let optimal = draw_optimal_light(rng, config);
            self.plant.set_optimal_light(optimal);
            info!(
                "{} entered {} stage, optimal light {}",
                self.id,
                stage.display_name(),
                optimal
            );
            outcome = TickOutcome::Advanced(stage);
        }

        self.update_status(now, config, log);
        if self.plant.health() <= 0.0 {
            self.fail(tasks, log);
            return TickOutcome::Died;
        }
        outcome
    }

    /// Feeding, saturation, drain and health, in that order.
    fn update_status(&mut self, now: Timestamp, config: &GrowConfig, log: &mut EventLog) {
        self.feeding.apply_schedule(&mut self.plant, now, config);
        self.feeding
            .check_saturation(&mut self.plant, now, config, log);
        self.plant.drain(config.base_drain_rate);
        self.plant.recompute_health(config.light_penalty_scale);
    }

    fn mature(&mut self, now: Timestamp, tasks: &mut TaskQueue<CycleTask>, log: &mut EventLog) {
        self.plant.freeze();
        self.phase = GrowPhase::Matured;
        self.matured_at = Some(now);
        self.cancel_pending(tasks);
        log.push("Your plant is ready for harvest!", Severity::Info);
        info!("{} matured after {} ticks", self.id, self.ticks);
    }

    fn fail(&mut self, tasks: &mut TaskQueue<CycleTask>, log: &mut EventLog) {
        self.phase = GrowPhase::Failed;
        self.cancel_pending(tasks);
        log.push("Your plant died from neglect.", Severity::Error);
        info!("{} died after {} ticks", self.id, self.ticks);
    }

    fn cancel_pending(&mut self, tasks: &mut TaskQueue<CycleTask>) {
        let cancelled = tasks.cancel_all();
        self.engine.clear_pending();
        if cancelled > 0 {
            debug!("Cancelled {} pending task(s) for {}", cancelled, self.id);
        }
    }

    // ===== Deferred tasks =====

    /// Run a task that came due.
    pub fn run_task(
        &mut self,
        task: CycleTask,
        rng: &mut dyn GrowRng,
        config: &GrowConfig,
        log: &mut EventLog,
    ) -> TaskOutcome {
        match (task, self.phase) {
            (CycleTask::Resolve(incident), GrowPhase::Growing) => {
                TaskOutcome::Resolved(self.engine.resolve(incident, &mut self.plant, rng, config, log))
            }
            (CycleTask::ActOfGod, GrowPhase::Growing) => {
                TaskOutcome::ActOfGod(self.engine.fire_act_of_god(&mut self.plant, rng, config, log))
            }
            (CycleTask::CloseHarvestWindow, GrowPhase::Matured) => TaskOutcome::WindowClosed,
            (task, phase) => {
                warn!("Ignoring {:?} for {} in phase {:?}", task, self.id, phase);
                TaskOutcome::Stale
            }
        }
    }

    // ===== Player actions =====

    /// Move the light slider.
    pub fn set_light(&mut self, value: f64) -> GrowResult<()> {
        if !self.phase.is_active() {
            return Err(GrowError::NoActiveCycle);
        }
        self.plant.set_light(value);
        Ok(())
    }

    /// Score the frozen snapshot and report it to the ledger.
    ///
    /// Only the first call records anything; later calls return the same
    /// result.
    #[allow(clippy::too_many_arguments)]
    pub fn harvest(
        &mut self,
        now: Timestamp,
        pipeline: &HarvestPipeline,
        rng: &mut dyn GrowRng,
        config: &GrowConfig,
        ledger: &mut dyn HarvestLedger,
        tasks: &mut TaskQueue<CycleTask>,
        log: &mut EventLog,
    ) -> GrowResult<HarvestResult> {
        match self.phase {
            GrowPhase::Harvested => {
                return self.report.clone().ok_or(GrowError::NotReady);
            }
            GrowPhase::Matured => {}
            GrowPhase::Growing => return Err(GrowError::NotReady),
            GrowPhase::Idle | GrowPhase::Failed => return Err(GrowError::NoActiveCycle),
        }
        let Some(frozen) = self.plant.frozen().copied() else {
            return Err(GrowError::NotReady);
        };

        let waited = self
            .matured_at
            .map_or(Duration::ZERO, |matured| now.since(matured));
        let mut ctx = HarvestContext {
            frozen: &frozen,
            config,
            rng,
            waited,
        };
        let result = pipeline.run(HarvestResult::new(self.id, self.plant.seed()), &mut ctx);

        if self.plant.mark_scores_recorded() {
            ledger.record_score(ScoreKind::Potency, result.potency);
            ledger.record_score(ScoreKind::Yield, result.weight);
            for award in &result.seeds {
                ledger.award_seeds(award.seed, award.count);
                let message = if award.cross_pollinated {
                    format!(
                        "Your plant was cross-pollinated! You got a {} seed.",
                        award.seed.display_name()
                    )
                } else {
                    format!("Your plant produced a {} seed!", award.seed.display_name())
                };
                log.push(message, Severity::Info);
            }
        }

        log.push(
            format!(
                "Harvested {}g at {}% potency.",
                result.weight, result.potency
            ),
            Severity::Info,
        );
        info!(
            "{} harvested: potency {} weight {} after {}h",
            self.id, result.potency, result.weight, result.hours_waited
        );

        self.cancel_pending(tasks);
        self.phase = GrowPhase::Harvested;
        self.report = Some(result.clone());
        Ok(result)
    }

    /// Search the harvested plant for a seed. Once per cycle.
    pub fn look_for_seeds(
        &mut self,
        rng: &mut dyn GrowRng,
        config: &GrowConfig,
        ledger: &mut dyn HarvestLedger,
        log: &mut EventLog,
    ) -> GrowResult<Option<SeedKind>> {
        if self.phase != GrowPhase::Harvested {
            return Err(GrowError::NotReady);
        }
        if std::mem::replace(&mut self.searched_for_seeds, true) {
            return Ok(None);
        }
        let seed = self.plant.seed();
        if rng.chance(config.look_for_seeds_chance) {
            ledger.award_seeds(seed, 1);
            log.push(format!("You found a {} seed!", seed.display_name()), Severity::Info);
            Ok(Some(seed))
        } else {
            log.push("You found no seeds.", Severity::Info);
            Ok(None)
        }
    }

    /// Drop every pending task. Used when the cycle is abandoned.
    pub fn abandon(&mut self, tasks: &mut TaskQueue<CycleTask>) {
        self.cancel_pending(tasks);
    }
}

fn draw_optimal_light(rng: &mut dyn GrowRng, config: &GrowConfig) -> f64 {
    f64::from(rng.range_inclusive(config.optimal_light_min, config.optimal_light_max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::GrowerRecord;
    use crate::rng::ScriptedRng;

    struct Fixture {
        config: GrowConfig,
        tasks: TaskQueue<CycleTask>,
        log: EventLog,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                config: GrowConfig::default(),
                tasks: TaskQueue::new(),
                log: EventLog::default(),
            }
        }

        fn start(&mut self, seed: SeedKind, soil: SoilKind, rng: &mut dyn GrowRng) -> GrowCycle {
            GrowCycle::start(
                CycleId::from_raw(1),
                seed,
                soil,
                FeedingSchedule::default(),
                Timestamp::EPOCH,
                rng,
                &self.config,
                &mut self.tasks,
                &mut self.log,
            )
        }

        fn tick(&mut self, cycle: &mut GrowCycle, secs: u64, rng: &mut dyn GrowRng) -> TickOutcome {
            cycle.tick(
                Timestamp::from_secs(secs),
                rng,
                &self.config,
                &mut self.tasks,
                &mut self.log,
            )
        }
    }

    /// Draws that never trigger an event and land optimal light on 60.
    fn calm() -> ScriptedRng {
        ScriptedRng::constant(0.5)
    }

    #[test]
    fn test_start_primes_plant() {
        let mut fx = Fixture::new();
        let mut rng = calm();
        let cycle = fx.start(SeedKind::CryptCookies, SoilKind::Marrowmoss, &mut rng);

        assert_eq!(cycle.phase(), GrowPhase::Growing);
        // 30 + floor(0.5 * 61)
        assert!((cycle.plant().optimal_light() - 60.0).abs() < f64::EPSILON);
        assert_eq!(cycle.plant().health_samples().1, 1);
        assert_eq!(cycle.plant().light_efficiency_samples().1, 1);
        assert!(cycle.plant().water() < 80.0);
        assert!(cycle.engine().act_of_god_handle().is_some());
        assert_eq!(fx.tasks.len(), 1);
    }

    #[test]
    fn test_full_growth_matures_once() {
        let mut fx = Fixture::new();
        let mut rng = calm();
        let mut cycle = fx.start(SeedKind::BoneBlossom, SoilKind::Ossuary, &mut rng);

        let mut advanced = Vec::new();
        let mut matured_at = None;
        for secs in 1..=200 {
            cycle.set_light(cycle.plant().optimal_light()).expect("light");
            match fx.tick(&mut cycle, secs, &mut rng) {
                TickOutcome::Advanced(stage) => advanced.push(stage),
                TickOutcome::Matured => {
                    matured_at = Some(secs);
                    break;
                }
                TickOutcome::Died => panic!("plant died"),
                _ => {}
            }
        }

        assert_eq!(advanced, vec![GrowthStage::Vegetative, GrowthStage::Flowering]);
        assert_eq!(matured_at, Some(144));
        assert_eq!(cycle.phase(), GrowPhase::Matured);
        assert!(cycle.plant().frozen().is_some());
        assert!(fx.tasks.is_empty());
        assert!(fx.log.contains("ready for harvest"));
        assert_eq!(fx.tick(&mut cycle, 145, &mut rng), TickOutcome::Inactive);
    }

    #[test]
    fn test_optimal_light_not_redrawn_entering_harvest() {
        let mut fx = Fixture::new();
        let mut rng = calm();
        let mut cycle = fx.start(SeedKind::BoneBlossom, SoilKind::Ossuary, &mut rng);

        for secs in 1..=32 {
            fx.tick(&mut cycle, secs, &mut rng);
        }
        assert_eq!(cycle.plant().stage(), GrowthStage::Vegetative);

        // Last draw of the Flowering transition picks 90
        for secs in 33..80 {
            fx.tick(&mut cycle, secs, &mut rng);
        }
        rng.push([0.5, 0.999]);
        assert_eq!(fx.tick(&mut cycle, 80, &mut rng), TickOutcome::Advanced(GrowthStage::Flowering));
        assert!((cycle.plant().optimal_light() - 90.0).abs() < f64::EPSILON);

        for secs in 81..=144 {
            fx.tick(&mut cycle, secs, &mut rng);
        }
        assert_eq!(cycle.plant().stage(), GrowthStage::Harvest);
        assert!((cycle.plant().optimal_light() - 90.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_dead_plant_fails_before_stage_check() {
        let mut fx = Fixture::new();
        let mut rng = calm();
        let mut cycle = fx.start(SeedKind::Rotjaw, SoilKind::Ossuary, &mut rng);
        for secs in 1..32 {
            fx.tick(&mut cycle, secs, &mut rng);
        }
        cycle.plant.set_health(0.0);

        assert_eq!(fx.tick(&mut cycle, 32, &mut rng), TickOutcome::Died);
        assert_eq!(cycle.plant().stage(), GrowthStage::Sprout);
        assert_eq!(cycle.phase(), GrowPhase::Failed);
        assert!(fx.tasks.is_empty());
        assert!(fx.log.contains("died from neglect"));

        let mut record = GrowerRecord::new(3);
        let err = cycle
            .harvest(
                Timestamp::from_secs(40),
                &HarvestPipeline::standard(),
                &mut rng,
                &fx.config,
                &mut record,
                &mut fx.tasks,
                &mut fx.log,
            )
            .expect_err("dead plants cannot be harvested");
        assert_eq!(err, GrowError::NoActiveCycle);
        assert!(record.potency_history.is_empty());
    }

    #[test]
    fn test_starved_plant_dies() {
        let mut fx = Fixture::new();
        fx.config.base_drain_rate = 100.0;
        fx.config.light_penalty_scale = 10.0;
        let mut rng = calm();
        let mut cycle = fx.start(SeedKind::Rotjaw, SoilKind::Ossuary, &mut rng);
        cycle.set_light(0.0).expect("light");

        let outcome = (1..=10)
            .map(|secs| fx.tick(&mut cycle, secs, &mut rng))
            .find(|outcome| *outcome == TickOutcome::Died);
        assert_eq!(outcome, Some(TickOutcome::Died));
        assert!(cycle.plant().frozen().is_none());
    }

    #[test]
    fn test_stale_tasks_are_ignored() {
        let mut fx = Fixture::new();
        let mut rng = calm();
        let mut cycle = fx.start(SeedKind::Rotjaw, SoilKind::Ossuary, &mut rng);
        assert_eq!(
            cycle.run_task(CycleTask::CloseHarvestWindow, &mut rng, &fx.config, &mut fx.log),
            TaskOutcome::Stale
        );
        cycle.abandon(&mut fx.tasks);
        assert!(fx.tasks.is_empty());
        assert!(cycle.engine().act_of_god_handle().is_none());
    }

    #[test]
    fn test_harvest_records_once() {
        let mut fx = Fixture::new();
        let mut rng = calm();
        let mut cycle = fx.start(SeedKind::HellhoundHaze, SoilKind::Graveblend, &mut rng);
        for secs in 1..=144 {
            fx.tick(&mut cycle, secs, &mut rng);
        }
        assert_eq!(cycle.phase(), GrowPhase::Matured);

        let mut record = GrowerRecord::new(3);
        let pipeline = HarvestPipeline::standard();
        let first = cycle
            .harvest(
                Timestamp::from_secs(144),
                &pipeline,
                &mut rng,
                &fx.config,
                &mut record,
                &mut fx.tasks,
                &mut fx.log,
            )
            .expect("harvest");
        let second = cycle
            .harvest(
                Timestamp::from_secs(500),
                &pipeline,
                &mut rng,
                &fx.config,
                &mut record,
                &mut fx.tasks,
                &mut fx.log,
            )
            .expect("repeat harvest");

        assert_eq!(first, second);
        assert_eq!(record.potency_history, vec![first.potency]);
        assert_eq!(record.total_yield, u64::from(first.weight));
        assert_eq!(cycle.phase(), GrowPhase::Harvested);
    }

    #[test]
    fn test_look_for_seeds_once_after_harvest() {
        let mut fx = Fixture::new();
        let mut rng = calm();
        let mut cycle = fx.start(SeedKind::MarrowMint, SoilKind::Graveblend, &mut rng);
        let mut record = GrowerRecord::new(3);

        assert_eq!(
            cycle.look_for_seeds(&mut rng, &fx.config, &mut record, &mut fx.log),
            Err(GrowError::NotReady)
        );

        for secs in 1..=144 {
            fx.tick(&mut cycle, secs, &mut rng);
        }
        cycle
            .harvest(
                Timestamp::from_secs(144),
                &HarvestPipeline::empty(),
                &mut rng,
                &fx.config,
                &mut record,
                &mut fx.tasks,
                &mut fx.log,
            )
            .expect("harvest");

        let found = cycle
            .look_for_seeds(&mut rng, &fx.config, &mut record, &mut fx.log)
            .expect("search");
        assert_eq!(found, Some(SeedKind::MarrowMint));
        assert_eq!(record.seeds_of(SeedKind::MarrowMint), 1);
        assert_eq!(
            cycle.look_for_seeds(&mut rng, &fx.config, &mut record, &mut fx.log),
            Ok(None)
        );
    }
}
