//! Grow session: the single entry point a front end talks to.
//!
//! This module handles:
//! - Seed selection and cycle configuration
//! - Periodic ticks at the current game speed
//! - Deferred tasks on wall-clock time
//! - Harvest, seed search and reset
//!
//! The session never blocks or sleeps. A driver calls [`GrowSession::pump`]
//! (or [`GrowSession::advance_to`] with its own timestamps) and the session
//! catches up on everything that came due, in time order.

use std::sync::Arc;

use crossbeam_channel::Receiver;
use marrow_common::{Clock, CycleId, GrowError, GrowResult, SystemClock, Timestamp};
use tracing::{debug, info, warn};

use crate::catalog::{seed_options, SeedKind, SoilKind};
use crate::config::GrowConfig;
use crate::cycle::{CycleTask, GrowCycle, GrowPhase, TaskOutcome, TickOutcome};
use crate::events::{CycleOutcome, EventLog, GrowNotice, NoticeBus};
use crate::feeding::FeedingSchedule;
use crate::harvest::{HarvestPipeline, HarvestPolicy, HarvestResult};
use crate::plant::PlantSnapshot;
use crate::records::{GrowerRecord, HarvestLedger};
use crate::rng::{FastRng, GrowRng};
use crate::tasks::TaskQueue;
use crate::time::{GameSpeed, TickCadence};

// ============================================================================
// Cycle setup
// ============================================================================

/// Choices made before a cycle starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSetup {
    seed: Option<SeedKind>,
    soil: Option<SoilKind>,
    feeding: FeedingSchedule,
}

impl CycleSetup {
    /// Empty setup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose the strain.
    #[must_use]
    pub fn seed(mut self, seed: SeedKind) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Choose the soil.
    #[must_use]
    pub fn soil(mut self, soil: SoilKind) -> Self {
        self.soil = Some(soil);
        self
    }

    /// Set the feeding schedule. Defaults to never watering or feeding.
    #[must_use]
    pub fn feeding(mut self, feeding: FeedingSchedule) -> Self {
        self.feeding = feeding;
        self
    }

    /// Chosen strain and soil, or the first missing selection.
    pub fn selections(&self) -> GrowResult<(SeedKind, SoilKind)> {
        let seed = self.seed.ok_or(GrowError::MissingSelection("seed"))?;
        let soil = self.soil.ok_or(GrowError::MissingSelection("soil"))?;
        Ok((seed, soil))
    }
}

/// Work done by one call to [`GrowSession::advance_to`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdvanceSummary {
    /// Ticks processed.
    pub ticks: u32,
    /// Deferred tasks run.
    pub tasks: u32,
}

// ============================================================================
// Session
// ============================================================================

/// Owns the clock, randomness, scheduling and the current cycle.
pub struct GrowSession {
    config: GrowConfig,
    clock: Arc<dyn Clock>,
    rng: Box<dyn GrowRng>,
    pipeline: HarvestPipeline,
    tasks: TaskQueue<CycleTask>,
    cadence: TickCadence,
    log: EventLog,
    notices: NoticeBus,
    cycle: Option<GrowCycle>,
}

impl std::fmt::Debug for GrowSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrowSession")
            .field("phase", &self.phase())
            .field("speed", &self.cadence.speed())
            .field("pending_tasks", &self.tasks.len())
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}

impl GrowSession {
    /// Create a session on the system clock with an entropy-seeded generator.
    #[must_use]
    pub fn new(mut config: GrowConfig) -> Self {
        config.validate();
        Self {
            config,
            clock: Arc::new(SystemClock),
            rng: Box::new(FastRng::new()),
            pipeline: HarvestPipeline::standard(),
            tasks: TaskQueue::new(),
            cadence: TickCadence::new(GameSpeed::default()),
            log: EventLog::default(),
            notices: NoticeBus::default(),
            cycle: None,
        }
    }

    /// Use a different clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Use a different random source.
    #[must_use]
    pub fn with_rng(mut self, rng: Box<dyn GrowRng>) -> Self {
        self.rng = rng;
        self
    }

    /// Use a different post-harvest pipeline.
    #[must_use]
    pub fn with_pipeline(mut self, pipeline: HarvestPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    // ===== Read-only state =====

    /// Tuning in effect.
    #[must_use]
    pub fn config(&self) -> &GrowConfig {
        &self.config
    }

    /// Current time on the session clock.
    #[must_use]
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Lifecycle phase of the current cycle.
    #[must_use]
    pub fn phase(&self) -> GrowPhase {
        self.cycle.as_ref().map_or(GrowPhase::Idle, GrowCycle::phase)
    }

    /// Current game speed.
    #[must_use]
    pub fn speed(&self) -> GameSpeed {
        self.cadence.speed()
    }

    /// Current cycle, if any.
    #[must_use]
    pub fn cycle(&self) -> Option<&GrowCycle> {
        self.cycle.as_ref()
    }

    /// Read-only copy of the plant.
    #[must_use]
    pub fn snapshot(&self) -> Option<PlantSnapshot> {
        self.cycle.as_ref().map(|cycle| cycle.plant().snapshot())
    }

    /// Event log, most recent first.
    #[must_use]
    pub fn event_log(&self) -> &EventLog {
        &self.log
    }

    /// Harvest result of the current cycle, once scored.
    #[must_use]
    pub fn report(&self) -> Option<&HarvestResult> {
        self.cycle.as_ref().and_then(GrowCycle::report)
    }

    /// Earliest time anything is due: a tick or a deferred task.
    #[must_use]
    pub fn next_wakeup(&self) -> Option<Timestamp> {
        match (self.cadence.next_due(), self.tasks.next_due()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Drain pending lifecycle notices.
    pub fn notices(&self) -> Vec<GrowNotice> {
        self.notices.drain()
    }

    /// Receiver for consuming notices on another thread.
    #[must_use]
    pub fn subscribe(&self) -> Receiver<GrowNotice> {
        self.notices.subscribe()
    }

    // ===== Setup =====

    /// Random seed options for the selection step, without repeats.
    pub fn seed_options(&mut self) -> Vec<SeedKind> {
        seed_options(self.config.seed_option_count, self.rng.as_mut())
    }

    /// Plant a new cycle.
    ///
    /// Fails without touching any state while a cycle is growing or waiting
    /// for harvest, or when seed or soil has not been chosen.
    pub fn configure_cycle(&mut self, setup: CycleSetup) -> GrowResult<CycleId> {
        if self.phase().is_active() {
            warn!("Rejected new cycle: one is already {}", self.phase().display_name());
            return Err(GrowError::CycleActive);
        }
        let (seed, soil) = match setup.selections() {
            Ok(selections) => selections,
            Err(err) => {
                warn!("Rejected new cycle: {}", err);
                return Err(err);
            }
        };

        let now = self.clock.now();
        self.tasks.cancel_all();
        self.log.clear();
        let mark = self.log.total_pushed();

        let id = CycleId::next();
        let cycle = GrowCycle::start(
            id,
            seed,
            soil,
            setup.feeding,
            now,
            self.rng.as_mut(),
            &self.config,
            &mut self.tasks,
            &mut self.log,
        );
        self.cycle = Some(cycle);
        self.cadence.start(now);

        self.notices.publish(GrowNotice::CycleStarted { cycle: id, seed });
        self.publish_log_since(mark);
        Ok(id)
    }

    /// Spend one of the grower's lives and plant a new cycle.
    ///
    /// The life is refunded if the cycle cannot be configured.
    pub fn start_cycle(&mut self, record: &mut GrowerRecord, setup: CycleSetup) -> GrowResult<CycleId> {
        let now = self.clock.now();
        let left = record.lives.consume(
            now,
            self.config.starting_lives,
            self.config.lockout_duration(),
        )?;
        match self.configure_cycle(setup) {
            Ok(id) => {
                info!("{} started, {} live(s) left", id, left);
                Ok(id)
            }
            Err(err) => {
                record.lives.refund();
                Err(err)
            }
        }
    }

    // ===== Time =====

    /// Run one tick now, regardless of the cadence.
    pub fn tick(&mut self, ledger: &mut dyn HarvestLedger) -> GrowResult<TickOutcome> {
        if self.cycle.is_none() {
            return Err(GrowError::NoActiveCycle);
        }
        let now = self.clock.now();
        Ok(self.tick_at(now, ledger))
    }

    /// Catch up on the session clock.
    pub fn pump(&mut self, ledger: &mut dyn HarvestLedger) -> AdvanceSummary {
        let now = self.clock.now();
        self.advance_to(now, ledger)
    }

    /// Run every tick and task due at or before `now`, in time order.
    ///
    /// Tasks run before a tick due at the same instant. Each item runs at
    /// its own due time, so the result does not depend on how often the
    /// driver calls in.
    pub fn advance_to(&mut self, now: Timestamp, ledger: &mut dyn HarvestLedger) -> AdvanceSummary {
        let mut summary = AdvanceSummary::default();
        loop {
            let task_due = self.tasks.next_due().filter(|due| *due <= now);
            let tick_due = self.cadence.next_due().filter(|due| *due <= now);
            match (task_due, tick_due) {
                (Some(task), Some(tick)) if task <= tick => {
                    self.run_next_task(task, ledger);
                    summary.tasks += 1;
                }
                (Some(task), None) => {
                    self.run_next_task(task, ledger);
                    summary.tasks += 1;
                }
                (_, Some(tick)) => {
                    if let Some(due) = self.cadence.pop_due(tick) {
                        self.tick_at(due, ledger);
                        summary.ticks += 1;
                    }
                }
                (None, None) => break,
            }
        }
        if summary.ticks > 0 || summary.tasks > 0 {
            debug!("Advanced to {}: {} tick(s), {} task(s)", now, summary.ticks, summary.tasks);
        }
        summary
    }

    /// Change the game speed. Only the tick rate changes.
    pub fn set_speed(&mut self, multiplier: u32) -> GrowResult<GameSpeed> {
        let speed = GameSpeed::try_from(multiplier)?;
        self.cadence.restart(self.clock.now(), speed);
        info!("Game speed set to {}", speed);
        Ok(speed)
    }

    fn tick_at(&mut self, now: Timestamp, ledger: &mut dyn HarvestLedger) -> TickOutcome {
        let Some(cycle) = self.cycle.as_mut() else {
            return TickOutcome::Inactive;
        };
        let id = cycle.id();
        let mark = self.log.total_pushed();
        let outcome = cycle.tick(now, self.rng.as_mut(), &self.config, &mut self.tasks, &mut self.log);
        self.publish_log_since(mark);

        match outcome {
            TickOutcome::Advanced(stage) => {
                self.notices.publish(GrowNotice::StageAdvanced { cycle: id, stage });
            }
            TickOutcome::Matured => {
                self.cadence.stop();
                self.notices.publish(GrowNotice::Matured { cycle: id });
                self.on_matured(now, ledger);
            }
            TickOutcome::Died => {
                self.cadence.stop();
                self.notices.publish(GrowNotice::CycleEnded {
                    cycle: id,
                    outcome: CycleOutcome::Died,
                });
            }
            TickOutcome::Continued | TickOutcome::Inactive => {}
        }
        outcome
    }

    fn on_matured(&mut self, now: Timestamp, ledger: &mut dyn HarvestLedger) {
        match self.config.harvest_policy {
            HarvestPolicy::Immediate => {
                if let Err(err) = self.finish_harvest(now, ledger) {
                    warn!("Automatic harvest failed: {}", err);
                }
            }
            policy @ HarvestPolicy::Window { hours } => {
                if let Some(window) = policy.window() {
                    self.tasks.schedule(now.after(window), CycleTask::CloseHarvestWindow);
                    info!("Harvest window open for {}h", hours);
                }
            }
        }
    }

    fn run_next_task(&mut self, due: Timestamp, ledger: &mut dyn HarvestLedger) {
        let Some((due, task)) = self.tasks.pop_due(due) else {
            return;
        };
        let Some(cycle) = self.cycle.as_mut() else {
            return;
        };
        let mark = self.log.total_pushed();
        let outcome = cycle.run_task(task, self.rng.as_mut(), &self.config, &mut self.log);
        self.publish_log_since(mark);

        if outcome == TaskOutcome::WindowClosed {
            info!("Harvest window closed, harvesting automatically");
            if let Err(err) = self.finish_harvest(due, ledger) {
                warn!("Automatic harvest failed: {}", err);
            }
        }
    }

    // ===== Player actions =====

    /// Move the light slider. The value is clamped to [0, 100].
    pub fn set_light(&mut self, value: f64) -> GrowResult<()> {
        self.cycle
            .as_mut()
            .ok_or(GrowError::NoActiveCycle)?
            .set_light(value)
    }

    /// Harvest a matured plant now.
    ///
    /// Inside a harvest window this is the manual harvest. Once harvested,
    /// further calls return the same result without recording anything.
    pub fn harvest_now(&mut self, ledger: &mut dyn HarvestLedger) -> GrowResult<HarvestResult> {
        let now = self.clock.now();
        self.finish_harvest(now, ledger)
    }

    fn finish_harvest(&mut self, now: Timestamp, ledger: &mut dyn HarvestLedger) -> GrowResult<HarvestResult> {
        let cycle = self.cycle.as_mut().ok_or(GrowError::NoActiveCycle)?;
        if let (GrowPhase::Harvested, Some(report)) = (cycle.phase(), cycle.report()) {
            return Ok(report.clone());
        }

        let mark = self.log.total_pushed();
        let result = cycle.harvest(
            now,
            &self.pipeline,
            self.rng.as_mut(),
            &self.config,
            ledger,
            &mut self.tasks,
            &mut self.log,
        )?;
        self.cadence.stop();
        self.publish_log_since(mark);

        for award in &result.seeds {
            self.notices.publish(GrowNotice::SeedsAwarded {
                cycle: result.cycle,
                seed: award.seed,
                count: award.count,
            });
        }
        self.notices.publish(GrowNotice::CycleEnded {
            cycle: result.cycle,
            outcome: CycleOutcome::Harvested {
                potency: result.potency,
                weight: result.weight,
            },
        });
        Ok(result)
    }

    /// Search the harvested plant for a seed. Only the first search counts.
    pub fn look_for_seeds(&mut self, ledger: &mut dyn HarvestLedger) -> GrowResult<Option<SeedKind>> {
        let cycle = self.cycle.as_mut().ok_or(GrowError::NoActiveCycle)?;
        let id = cycle.id();
        let mark = self.log.total_pushed();
        let found = cycle.look_for_seeds(self.rng.as_mut(), &self.config, ledger, &mut self.log)?;
        self.publish_log_since(mark);
        if let Some(seed) = found {
            self.notices.publish(GrowNotice::SeedsAwarded {
                cycle: id,
                seed,
                count: 1,
            });
        }
        Ok(found)
    }

    /// Abandon the current cycle and clear everything it scheduled.
    pub fn reset(&mut self) {
        self.tasks.cancel_all();
        self.cadence.stop();
        self.log.clear();
        if let Some(mut cycle) = self.cycle.take() {
            cycle.abandon(&mut self.tasks);
            if cycle.phase().is_active() {
                info!("{} abandoned", cycle.id());
                self.notices.publish(GrowNotice::CycleEnded {
                    cycle: cycle.id(),
                    outcome: CycleOutcome::Abandoned,
                });
            }
        }
    }

    fn publish_log_since(&self, mark: u64) {
        let Some(cycle) = self.cycle.as_ref().map(GrowCycle::id) else {
            return;
        };
        for entry in self.log.since(mark) {
            self.notices.publish(GrowNotice::Logged { cycle, entry });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plant::GrowthStage;
    use crate::rng::ScriptedRng;
    use marrow_common::ManualClock;
    use std::time::Duration;

    fn session(config: GrowConfig) -> (GrowSession, ManualClock) {
        let clock = ManualClock::new(Timestamp::from_secs(1_000));
        let session = GrowSession::new(config)
            .with_clock(Arc::new(clock.clone()))
            .with_rng(Box::new(ScriptedRng::constant(0.5)));
        (session, clock)
    }

    fn setup() -> CycleSetup {
        CycleSetup::new()
            .seed(SeedKind::SkeleSkittlez)
            .soil(SoilKind::Graveblend)
    }

    #[test]
    fn test_configure_requires_selections() {
        let (mut session, _clock) = session(GrowConfig::default());
        assert_eq!(
            session.configure_cycle(CycleSetup::new().soil(SoilKind::Ossuary)),
            Err(GrowError::MissingSelection("seed"))
        );
        assert_eq!(
            session.configure_cycle(CycleSetup::new().seed(SeedKind::Rotjaw)),
            Err(GrowError::MissingSelection("soil"))
        );
        assert_eq!(session.phase(), GrowPhase::Idle);
        assert!(session.snapshot().is_none());
    }

    #[test]
    fn test_configure_rejected_while_growing() {
        let (mut session, _clock) = session(GrowConfig::default());
        session.configure_cycle(setup()).expect("first cycle");
        assert_eq!(session.configure_cycle(setup()), Err(GrowError::CycleActive));
        let notices = session.notices();
        assert!(matches!(notices[0], GrowNotice::CycleStarted { seed: SeedKind::SkeleSkittlez, .. }));
    }

    #[test]
    fn test_advance_runs_ticks_at_cadence() {
        let (mut session, clock) = session(GrowConfig::default());
        let mut record = GrowerRecord::new(3);
        session.configure_cycle(setup()).expect("cycle");

        let now = clock.advance(Duration::from_millis(10_500));
        let summary = session.advance_to(now, &mut record);
        assert_eq!(summary.ticks, 10);
        let snapshot = session.snapshot().expect("snapshot");
        assert_eq!(snapshot.stage_time, 10);
        assert_eq!(snapshot.stage, GrowthStage::Sprout);
    }

    #[test]
    fn test_speed_change_keeps_progress() {
        let (mut session, clock) = session(GrowConfig::default());
        let mut record = GrowerRecord::new(3);
        session.configure_cycle(setup()).expect("cycle");
        session.advance_to(clock.advance(Duration::from_secs(5)), &mut record);
        let before = session.snapshot().expect("snapshot");

        assert_eq!(session.set_speed(10), Ok(GameSpeed::X10));
        assert_eq!(session.set_speed(4), Err(GrowError::InvalidSpeed(4)));
        let after = session.snapshot().expect("snapshot");
        assert_eq!(before, after);

        // Ten ticks in one second at 10x
        let summary = session.advance_to(clock.advance(Duration::from_secs(1)), &mut record);
        assert_eq!(summary.ticks, 10);
        assert_eq!(session.snapshot().expect("snapshot").stage_time, 15);
    }

    #[test]
    fn test_immediate_harvest_records_score() {
        let (mut session, clock) = session(GrowConfig::default());
        let mut record = GrowerRecord::new(3);
        session.configure_cycle(setup()).expect("cycle");
        session.set_speed(10).expect("speed");

        session.advance_to(clock.advance(Duration::from_secs(20)), &mut record);
        assert_eq!(session.phase(), GrowPhase::Harvested);
        assert_eq!(record.harvests(), 1);
        let report = session.report().cloned().expect("report");

        // Manual harvest afterwards is a no-op
        let again = session.harvest_now(&mut record).expect("repeat");
        assert_eq!(again, report);
        assert_eq!(record.harvests(), 1);
        assert!(session.next_wakeup().is_none());

        let notices = session.notices();
        assert!(notices.iter().any(|n| matches!(n, GrowNotice::Matured { .. })));
        assert!(notices
            .iter()
            .any(|n| matches!(n, GrowNotice::CycleEnded { outcome: CycleOutcome::Harvested { .. }, .. })));
    }

    #[test]
    fn test_harvest_now_before_maturity() {
        let (mut session, _clock) = session(GrowConfig::default());
        let mut record = GrowerRecord::new(3);
        assert_eq!(session.harvest_now(&mut record), Err(GrowError::NoActiveCycle));
        session.configure_cycle(setup()).expect("cycle");
        assert_eq!(session.harvest_now(&mut record), Err(GrowError::NotReady));
    }

    #[test]
    fn test_window_policy_waits_for_manual_harvest() {
        let config = GrowConfig {
            harvest_policy: HarvestPolicy::Window { hours: 24 },
            ..GrowConfig::default()
        };
        let (mut session, clock) = session(config);
        let mut record = GrowerRecord::new(3);
        session.configure_cycle(setup()).expect("cycle");
        session.set_speed(10).expect("speed");
        session.advance_to(clock.advance(Duration::from_secs(20)), &mut record);
        assert_eq!(session.phase(), GrowPhase::Matured);
        assert_eq!(record.harvests(), 0);

        clock.advance(Duration::from_secs(2 * 3600 + 10));
        let result = session.harvest_now(&mut record).expect("harvest");
        assert_eq!(result.hours_waited, 2);
        assert_eq!(record.harvests(), 1);
        assert_eq!(session.phase(), GrowPhase::Harvested);
    }

    #[test]
    fn test_window_closes_automatically() {
        let config = GrowConfig {
            harvest_policy: HarvestPolicy::Window { hours: 1 },
            ..GrowConfig::default()
        };
        let (mut session, clock) = session(config);
        let mut record = GrowerRecord::new(3);
        session.configure_cycle(setup()).expect("cycle");
        session.set_speed(10).expect("speed");
        session.advance_to(clock.advance(Duration::from_secs(20)), &mut record);
        assert_eq!(session.phase(), GrowPhase::Matured);

        let summary = session.advance_to(clock.advance(Duration::from_secs(3600)), &mut record);
        assert_eq!(summary.tasks, 1);
        assert_eq!(session.phase(), GrowPhase::Harvested);
        assert_eq!(session.report().map(|r| r.hours_waited), Some(1));
    }

    #[test]
    fn test_start_cycle_spends_and_refunds_lives() {
        let (mut session, _clock) = session(GrowConfig::default());
        let mut record = GrowerRecord::new(3);
        session.start_cycle(&mut record, setup()).expect("start");
        assert_eq!(record.lives.lives(), 2);

        // Rejected while growing, life comes back
        assert_eq!(session.start_cycle(&mut record, setup()), Err(GrowError::CycleActive));
        assert_eq!(record.lives.lives(), 2);
    }

    #[test]
    fn test_start_cycle_locked_out() {
        let (mut session, _clock) = session(GrowConfig::default());
        let mut record = GrowerRecord::new(0);
        let err = session.start_cycle(&mut record, setup()).expect_err("locked out");
        assert!(matches!(err, GrowError::Lockout(_)));
        assert_eq!(session.phase(), GrowPhase::Idle);
    }

    #[test]
    fn test_reset_cancels_everything() {
        let (mut session, clock) = session(GrowConfig::default());
        let mut record = GrowerRecord::new(3);
        session.configure_cycle(setup()).expect("cycle");
        session.advance_to(clock.advance(Duration::from_secs(3)), &mut record);
        session.notices();

        session.reset();
        assert_eq!(session.phase(), GrowPhase::Idle);
        assert!(session.next_wakeup().is_none());
        assert!(session.event_log().is_empty());
        assert!(matches!(
            session.notices().as_slice(),
            [GrowNotice::CycleEnded { outcome: CycleOutcome::Abandoned, .. }]
        ));
        assert_eq!(session.tick(&mut record), Err(GrowError::NoActiveCycle));
    }

    #[test]
    fn test_seed_options_are_distinct() {
        let (mut session, _clock) = session(GrowConfig::default());
        let options = session.seed_options();
        assert_eq!(options.len(), 3);
        assert_ne!(options[0], options[1]);
        assert_ne!(options[1], options[2]);
        assert_ne!(options[0], options[2]);
    }
}
