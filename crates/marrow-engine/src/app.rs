//! Application lifecycle management.
//!
//! Loads the grower's records, plants one cycle and lets the autopilot
//! play it out, either on the wall clock or fast-forwarded on a manual
//! clock. Results are written back to the score book.

use anyhow::{Context, Result};
use marrow_common::{Clock, CycleId, GrowError, GrowResult, GrowerId, ManualClock, SystemClock, Timestamp};
use marrow_gameplay::{
    CycleSetup, FastRng, FeedingSchedule, GrowCycle, GrowNotice, GrowPhase, GrowSession, GrowerRecord, HarvestResult,
    NutrientMix, ScoreBook, SeedKind, Severity, SoilKind,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::score_store::ScoreStore;

/// How the runner waits for the next due tick or task.
#[derive(Debug, Clone)]
pub enum Pace {
    /// Sleep on the wall clock
    Realtime,
    /// Jump a manual clock straight to the next due time
    FastForward(ManualClock),
}

impl Pace {
    /// Pace for the given configuration.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        if config.realtime {
            Self::Realtime
        } else {
            Self::FastForward(ManualClock::new(SystemClock.now()))
        }
    }

    /// Clock the session should read.
    #[must_use]
    pub fn clock(&self) -> Arc<dyn Clock> {
        match self {
            Self::Realtime => Arc::new(SystemClock),
            Self::FastForward(clock) => Arc::new(clock.clone()),
        }
    }

    /// Block until `due`.
    pub fn wait_until(&self, due: Timestamp) {
        match self {
            Self::Realtime => {
                let wait = due.since(SystemClock.now());
                if !wait.is_zero() {
                    std::thread::sleep(wait);
                }
            },
            Self::FastForward(clock) => clock.set(due),
        }
    }
}

/// What happened to a cycle the autopilot drove.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleSummary {
    /// Cycle that was driven
    pub cycle: CycleId,
    /// Phase when the autopilot stopped
    pub phase: GrowPhase,
    /// Harvest report, if the plant was harvested
    pub report: Option<HarvestResult>,
    /// Seed found by searching the harvested plant
    pub found_seed: Option<SeedKind>,
    /// Ticks run
    pub ticks: u32,
}

/// Plays a grow cycle without a human.
#[derive(Debug, Clone, Copy)]
pub struct Autopilot {
    /// Keep the light on the optimal level
    pub track_light: bool,
    /// Search the harvested plant for a seed
    pub look_for_seeds: bool,
}

impl Autopilot {
    /// Autopilot for the given configuration.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            track_light: config.track_light,
            look_for_seeds: config.look_for_seeds,
        }
    }

    /// Drive the started cycle until it is harvested or dies.
    pub fn drive(&self, session: &mut GrowSession, pace: &Pace, record: &mut GrowerRecord) -> GrowResult<CycleSummary> {
        let cycle = session.cycle().map(GrowCycle::id).ok_or(GrowError::NoActiveCycle)?;
        let mut ticks = 0;

        loop {
            report_notices(session);
            match session.phase() {
                GrowPhase::Growing => self.steer(session)?,
                // Only reachable under a harvest window; pick right away.
                GrowPhase::Matured => {
                    session.harvest_now(record)?;
                    continue;
                },
                GrowPhase::Idle | GrowPhase::Harvested | GrowPhase::Failed => break,
            }

            let Some(due) = session.next_wakeup() else {
                warn!("Nothing scheduled while {} is growing", cycle);
                break;
            };
            pace.wait_until(due);
            ticks += session.pump(record).ticks;
        }

        let found_seed = if self.look_for_seeds && session.phase() == GrowPhase::Harvested {
            session.look_for_seeds(record)?
        } else {
            None
        };
        report_notices(session);

        Ok(CycleSummary {
            cycle,
            phase: session.phase(),
            report: session.report().cloned(),
            found_seed,
            ticks,
        })
    }

    fn steer(&self, session: &mut GrowSession) -> GrowResult<()> {
        if !self.track_light {
            return Ok(());
        }
        if let Some(snapshot) = session.snapshot() {
            if (snapshot.light - snapshot.optimal_light).abs() > f64::EPSILON {
                debug!("Light {:.0} -> {:.0}", snapshot.light, snapshot.optimal_light);
                session.set_light(snapshot.optimal_light)?;
            }
        }
        Ok(())
    }
}

/// Build the cycle setup from the configured keys.
///
/// Without a configured seed the first offered option is planted.
pub fn choose_setup(config: &EngineConfig, session: &mut GrowSession) -> GrowResult<CycleSetup> {
    let options = session.seed_options();
    let names: Vec<&str> = options.iter().map(|seed| seed.display_name()).collect();
    info!("Seed options: {}", names.join(", "));

    let seed = match &config.seed {
        Some(key) => key.parse::<SeedKind>()?,
        None => options.first().copied().ok_or(GrowError::MissingSelection("seed"))?,
    };
    let soil = config.soil.parse::<SoilKind>()?;
    let mix = config
        .nutrient_mix
        .as_deref()
        .map(str::parse::<NutrientMix>)
        .transpose()?;

    Ok(CycleSetup::new()
        .seed(seed)
        .soil(soil)
        .feeding(FeedingSchedule::uniform(config.water_times, mix)))
}

fn report_notices(session: &GrowSession) {
    for notice in session.notices() {
        match notice {
            GrowNotice::Logged { entry, .. } => match entry.severity {
                Severity::Info => info!("{}", entry.message),
                Severity::Warning => warn!("{}", entry.message),
                Severity::Error => error!("{}", entry.message),
                Severity::ActOfGod => warn!("[{}] {}", entry.severity.display_name(), entry.message),
            },
            GrowNotice::StageAdvanced { stage, .. } => info!("Stage: {}", stage.display_name()),
            other => debug!("{:?}", other),
        }
    }
}

fn log_leaderboards(book: &ScoreBook, limit: usize) {
    info!("Top potency:");
    for (rank, entry) in book.top_potency(limit).iter().enumerate() {
        info!("  {}. {} - {}", rank + 1, entry.grower, entry.value);
    }
    info!("Top total yield:");
    for (rank, entry) in book.top_yield(limit).iter().enumerate() {
        info!("  {}. {} - {}g", rank + 1, entry.grower, entry.value);
    }
    info!("Top average potency:");
    for (rank, entry) in book.top_average_potency(limit).iter().enumerate() {
        info!("  {}. {} - {:.1}", rank + 1, entry.grower, entry.value);
    }
}

fn log_summary(grower: &GrowerId, summary: &CycleSummary, record: &GrowerRecord) {
    match (&summary.phase, &summary.report) {
        (GrowPhase::Harvested, Some(report)) => {
            info!(
                "{} harvested {}: potency {}, weight {}g, {} seed(s)",
                grower,
                report.seed.display_name(),
                report.potency,
                report.weight,
                report.seed_count()
            );
        },
        (GrowPhase::Failed, _) => warn!("{} lost the plant after {} ticks", grower, summary.ticks),
        (phase, _) => warn!("{} stopped while {}", summary.cycle, phase.display_name()),
    }
    if let Some(seed) = summary.found_seed {
        info!("Found a {} seed", seed.display_name());
    }
    info!(
        "{}: {} harvest(s), best potency {}, {} total yield",
        grower,
        record.harvests(),
        record.best_potency().unwrap_or(0),
        record.total_yield
    );
}

/// Run one grow cycle for the configured grower.
pub fn run(config_path: Option<PathBuf>) -> Result<()> {
    let path = config_path.unwrap_or_else(EngineConfig::config_path);
    let mut config = EngineConfig::load_from(&path);
    if !path.exists() {
        if let Err(e) = config.save_to(&path) {
            warn!("Failed to write default config: {e}");
        }
    }
    config.validate();

    let grower = GrowerId::new(&config.grower).context("grower name must not be blank")?;
    let store = ScoreStore::new(config.score_book_path());
    let mut book = store
        .load()
        .with_context(|| format!("failed to load score book {}", store.path().display()))?;

    info!("Configuration loaded:");
    info!("  Grower: {}", grower);
    info!("  Speed: {}x", config.speed);
    info!("  Mode: {}", if config.realtime { "realtime" } else { "fast-forward" });
    info!("  Score book: {}", store.path().display());

    let pace = Pace::from_config(&config);
    let mut session = GrowSession::new(config.grow.clone())
        .with_clock(pace.clock())
        .with_rng(Box::new(FastRng::from_optional_seed(config.rng_seed)));
    session.set_speed(config.speed)?;

    let setup = choose_setup(&config, &mut session)?;
    let record = book.record_mut(&grower, config.grow.starting_lives);

    match session.start_cycle(record, setup) {
        Ok(id) => info!("Planted {} for {}", id, grower),
        Err(GrowError::Lockout(lockout)) => {
            warn!("{}: {}", grower, lockout);
            store.save(&book)?;
            return Ok(());
        },
        Err(err) => return Err(err.into()),
    }

    let summary = Autopilot::from_config(&config).drive(&mut session, &pace, record)?;
    log_summary(&grower, &summary, record);

    store.save(&book)?;
    log_leaderboards(&book, config.leaderboard_size);
    Ok(())
}
