//! Integration tests for whole grow cycles driven through the session.
//!
//! Exercises: CycleSetup → ticks and deferred tasks → maturity → harvest
//! pipeline → grower record, plus the lives gate around it.
//!
//! Time is a ManualClock; randomness is a seeded FastRng or a ScriptedRng.

use std::sync::Arc;
use std::time::Duration;

use marrow_common::{Clock, GrowError, ManualClock, Timestamp};
use marrow_gameplay::prelude::*;
use proptest::prelude::*;

// ── Helpers ────────────────────────────────────────────────────────────

const START: Timestamp = Timestamp::from_secs(1_000_000);

fn session_with(config: GrowConfig, rng: Box<dyn GrowRng>) -> (GrowSession, ManualClock) {
    let clock = ManualClock::new(START);
    let session = GrowSession::new(config)
        .with_clock(Arc::new(clock.clone()))
        .with_rng(rng);
    (session, clock)
}

fn seeded(seed: u64) -> (GrowSession, ManualClock) {
    session_with(GrowConfig::default(), Box::new(FastRng::with_seed(seed)))
}

fn setup() -> CycleSetup {
    CycleSetup::new()
        .seed(SeedKind::SkeleSkittlez)
        .soil(SoilKind::Graveblend)
        .feeding(FeedingSchedule::uniform(2, Some(NutrientMix::Basic)))
}

/// Step the clock one second at a time until the cycle stops growing.
fn grow_to_end(session: &mut GrowSession, clock: &ManualClock, ledger: &mut dyn HarvestLedger) -> u32 {
    let mut ticks = 0;
    for _ in 0..400 {
        if let Some(snapshot) = session.snapshot() {
            session.set_light(snapshot.optimal_light).expect("light");
        }
        let now = clock.advance(Duration::from_secs(1));
        ticks += session.advance_to(now, ledger).ticks;
        if !matches!(session.phase(), GrowPhase::Growing) {
            break;
        }
    }
    ticks
}

fn assert_levels_in_range(snapshot: &PlantSnapshot) {
    for (name, value) in [
        ("water", snapshot.water),
        ("light", snapshot.light),
        ("nutrients", snapshot.nutrients),
        ("health", snapshot.health),
        ("stress", snapshot.stress),
    ] {
        assert!((0.0..=100.0).contains(&value), "{name} out of range: {value}");
    }
}

// ── Full cycles ────────────────────────────────────────────────────────

#[test]
fn full_cycle_harvests_and_records_once() {
    let (mut session, clock) = seeded(42);
    let mut record = GrowerRecord::new(3);
    session.start_cycle(&mut record, setup()).expect("start");

    let ticks = grow_to_end(&mut session, &clock, &mut record);
    assert_eq!(session.phase(), GrowPhase::Harvested);
    assert_eq!(ticks, 144);

    let report = session.report().cloned().expect("report");
    assert!(report.potency <= 100);
    assert!(report.weight as f64 <= session.snapshot().expect("snapshot").frozen.expect("frozen").weight);
    assert_eq!(record.potency_history, vec![report.potency]);
    assert_eq!(record.total_yield, u64::from(report.weight));

    // Nothing left to run once harvested
    assert!(session.next_wakeup().is_none());
    let later = clock.advance(Duration::from_secs(3600));
    assert_eq!(session.advance_to(later, &mut record), AdvanceSummary::default());
    assert_eq!(record.harvests(), 1);
}

#[test]
fn same_seed_replays_same_harvest() {
    let mut reports = Vec::new();
    for _ in 0..2 {
        let (mut session, clock) = seeded(2024);
        let mut record = GrowerRecord::new(3);
        session.configure_cycle(setup()).expect("configure");
        grow_to_end(&mut session, &clock, &mut record);
        let report = session.report().cloned().expect("report");
        reports.push((report.potency, report.weight, report.seeds));
    }
    assert_eq!(reports[0], reports[1]);
}

#[test]
fn perfect_light_without_events_scores_near_66() {
    // 0.5 never starts an incident
    let (mut session, clock) = session_with(GrowConfig::default(), Box::new(ScriptedRng::constant(0.5)));
    let mut record = GrowerRecord::new(3);
    session
        .configure_cycle(CycleSetup::new().seed(SeedKind::CryptCookies).soil(SoilKind::Ossuary))
        .expect("configure");
    session.set_light(60.0).expect("light");

    grow_to_end(&mut session, &clock, &mut record);
    let report = session.report().expect("report");
    assert_eq!(report.potency, 66);
}

#[test]
fn passive_drain_matches_seed_and_soil() {
    let config = GrowConfig {
        initial_level: 100.0,
        ..GrowConfig::default()
    };
    let (mut session, clock) = session_with(config, Box::new(ScriptedRng::constant(0.5)));
    let mut ledger = NullLedger;
    session
        .configure_cycle(CycleSetup::new().seed(SeedKind::SkeleSkittlez).soil(SoilKind::Graveblend))
        .expect("configure");

    let before = session.snapshot().expect("snapshot").water;
    let summary = session.advance_to(clock.advance(Duration::from_secs(10)), &mut ledger);
    assert_eq!(summary.ticks, 10);
    let after = session.snapshot().expect("snapshot").water;
    // 2.0 * 0.5 * 0.6 per tick
    assert!((before - after - 6.0).abs() < 1e-9, "drained {}", before - after);
}

#[test]
fn optimal_light_redrawn_only_between_growing_stages() {
    let mut rng = ScriptedRng::constant(0.5);
    // Start draw lands on 30
    rng.push([0.0]);
    let (mut session, clock) = session_with(GrowConfig::default(), Box::new(rng));
    let mut ledger = NullLedger;
    session
        .configure_cycle(CycleSetup::new().seed(SeedKind::Rotjaw).soil(SoilKind::Marrowmoss))
        .expect("configure");
    assert!((session.snapshot().expect("snapshot").optimal_light - 30.0).abs() < f64::EPSILON);

    session.advance_to(clock.advance(Duration::from_secs(32)), &mut ledger);
    let snapshot = session.snapshot().expect("snapshot");
    assert_eq!(snapshot.stage, GrowthStage::Vegetative);
    assert!((snapshot.optimal_light - 60.0).abs() < f64::EPSILON);

    session.advance_to(clock.advance(Duration::from_secs(112)), &mut ledger);
    let snapshot = session.snapshot().expect("snapshot");
    assert_eq!(snapshot.stage, GrowthStage::Harvest);
    assert!((snapshot.optimal_light - 60.0).abs() < f64::EPSILON);
}

// ── Time and speed ─────────────────────────────────────────────────────

#[test]
fn speed_change_preserves_accumulators() {
    let (mut session, clock) = seeded(7);
    let mut ledger = NullLedger;
    session.configure_cycle(setup()).expect("configure");
    session.advance_to(clock.advance(Duration::from_millis(20_500)), &mut ledger);

    let before = session.snapshot().expect("snapshot");
    for multiplier in [2, 3, 10, 1] {
        session.set_speed(multiplier).expect("speed");
    }
    let after = session.snapshot().expect("snapshot");
    assert_eq!(before.stage_time, after.stage_time);
    assert!((before.average_health - after.average_health).abs() < f64::EPSILON);
    assert!((before.average_light_efficiency - after.average_light_efficiency).abs() < f64::EPSILON);
}

#[test]
fn event_delays_ignore_game_speed() {
    // Sprout pest on the first tick, never repelled
    let mut rng = ScriptedRng::constant(0.99);
    rng.push([0.5, 0.0, 0.0]);
    let (mut session, clock) = session_with(GrowConfig::default(), Box::new(rng));
    let mut ledger = NullLedger;
    session
        .configure_cycle(CycleSetup::new().seed(SeedKind::Rotjaw).soil(SoilKind::Ossuary))
        .expect("configure");
    session.set_speed(10).expect("speed");

    // First tick at +100ms starts the pest
    session.advance_to(clock.advance(Duration::from_millis(100)), &mut ledger);
    assert!(session.cycle().expect("cycle").engine().active().is_some());

    // Many ticks later it is still waiting on wall-clock time
    session.advance_to(clock.advance(Duration::from_millis(9_800)), &mut ledger);
    assert!(session.cycle().expect("cycle").engine().active().is_some());

    session.advance_to(clock.advance(Duration::from_millis(200)), &mut ledger);
    assert!(session.cycle().expect("cycle").engine().active().is_none());
    assert!(session.snapshot().expect("snapshot").pest_penalty < 1.0);
}

#[test]
fn coarse_and_fine_pumping_agree() {
    let (mut fine, fine_clock) = seeded(99);
    let (mut coarse, coarse_clock) = seeded(99);
    let mut ledger = NullLedger;
    fine.configure_cycle(setup()).expect("configure");
    coarse.configure_cycle(setup()).expect("configure");

    for _ in 0..90 {
        fine.advance_to(fine_clock.advance(Duration::from_secs(1)), &mut ledger);
    }
    coarse.advance_to(coarse_clock.advance(Duration::from_secs(90)), &mut ledger);

    assert_eq!(fine.snapshot(), coarse.snapshot());
    assert_eq!(fine.event_log().entries(), coarse.event_log().entries());
}

// ── Failure and lives ──────────────────────────────────────────────────

#[test]
fn dying_plant_records_nothing() {
    let config = GrowConfig {
        base_drain_rate: 40.0,
        light_penalty_scale: 10.0,
        ..GrowConfig::default()
    };
    let (mut session, clock) = session_with(config, Box::new(FastRng::with_seed(3)));
    let mut record = GrowerRecord::new(3);
    session.start_cycle(&mut record, setup()).expect("start");
    session.set_light(0.0).expect("light");

    session.advance_to(clock.advance(Duration::from_secs(30)), &mut record);
    assert_eq!(session.phase(), GrowPhase::Failed);
    assert!(record.potency_history.is_empty());
    assert_eq!(record.total_yield, 0);
    assert!(session.event_log().contains("died from neglect"));
    assert!(session.notices().iter().any(|notice| matches!(
        notice,
        GrowNotice::CycleEnded {
            outcome: CycleOutcome::Died,
            ..
        }
    )));
    assert_eq!(session.harvest_now(&mut record), Err(GrowError::NoActiveCycle));

    // A dead cycle does not block the next one
    session.start_cycle(&mut record, setup()).expect("next cycle");
}

#[test]
fn lockout_lasts_a_day() {
    let (mut session, clock) = seeded(11);
    let mut record = GrowerRecord::new(3);
    for _ in 0..3 {
        session.start_cycle(&mut record, setup()).expect("life");
        session.reset();
    }
    let locked_at = clock.now();
    assert_eq!(record.lives.lives(), 0);
    assert_eq!(record.lives.locked_since(), Some(locked_at));

    clock.advance(Duration::from_secs(23 * 3600 + 59 * 60));
    match session.start_cycle(&mut record, setup()) {
        Err(GrowError::Lockout(lockout)) => assert_eq!(lockout.remaining(), Duration::from_secs(60)),
        other => panic!("expected lockout, got {other:?}"),
    }
    assert_eq!(session.phase(), GrowPhase::Idle);

    clock.advance(Duration::from_secs(61));
    session.start_cycle(&mut record, setup()).expect("lockout expired");
    assert_eq!(record.lives.lives(), 2);
}

#[test]
fn seeds_found_after_harvest_extend_lives() {
    let (mut session, clock) = session_with(GrowConfig::default(), Box::new(ScriptedRng::constant(0.5)));
    let mut record = GrowerRecord::new(1);
    session.start_cycle(&mut record, setup()).expect("start");
    assert_eq!(record.lives.lives(), 0);

    grow_to_end(&mut session, &clock, &mut record);
    // Pollination at 0.5 < 0.70 gives one seed of the same strain
    assert_eq!(record.seeds_of(SeedKind::SkeleSkittlez), 1);

    let found = session.look_for_seeds(&mut record).expect("search");
    assert_eq!(found, Some(SeedKind::SkeleSkittlez));
    assert_eq!(record.seeds_of(SeedKind::SkeleSkittlez), 2);
    assert_eq!(record.lives.lives(), 2);
    assert_eq!(record.lives.locked_since(), None);
}

// ── Properties ─────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_levels_stay_in_range(
        seed in any::<u64>(),
        lights in prop::collection::vec(-50.0f64..150.0, 1..12),
        water_times in 0u32..4,
    ) {
        let (mut session, clock) = seeded(seed);
        let mut ledger = NullLedger;
        let setup = CycleSetup::new()
            .seed(SeedKind::MarrowMint)
            .soil(SoilKind::Marrowmoss)
            .feeding(FeedingSchedule::uniform(water_times, Some(NutrientMix::DoomDust)));
        session.configure_cycle(setup).expect("configure");

        for step in 0..160usize {
            let _ = session.set_light(lights[step % lights.len()]);
            session.advance_to(clock.advance(Duration::from_secs(1)), &mut ledger);
            let snapshot = session.snapshot().expect("snapshot");
            assert_levels_in_range(&snapshot);
            prop_assert!(snapshot.pest_penalty > 0.0);
            prop_assert!(snapshot.raider_penalty > 0.0);
            if !session.phase().is_active() {
                break;
            }
        }
    }
}
