//! Car chase tests.
//!
//! Tests cover: nitro cooldown, health that never regenerates, lane
//! clamping, traffic collisions wrecking the car, and the catch.

use barber_core::car_chase::CarChaseEngine;
use barber_core::chase::{BoostRejection, ChaseInput, ChaseKind, ChaseOutcome, ChaseParams, ChaseStatus};
use barber_core::event::GameEvent;
use barber_core::rng::{RngBank, StreamRng, StreamSlot};

const DT: f64 = 0.05;

fn rng() -> StreamRng {
    RngBank::new(0xCA2_C4A5E).for_stream(StreamSlot::CarChase)
}

fn empty_streets() -> ChaseParams {
    ChaseParams {
        hazard_interval: 1.0e6,
        ..ChaseParams::car()
    }
}

fn boost_events(events: &[GameEvent]) -> (usize, usize) {
    let used = events.iter().filter(|e| matches!(e, GameEvent::BoostUsed { .. })).count();
    let cooling = events
        .iter()
        .filter(|e| {
            matches!(
                e,
                GameEvent::BoostRejected { reason: BoostRejection::CoolingDown, .. }
            )
        })
        .count();
    (used, cooling)
}

#[test]
fn nitro_respects_its_cooldown() {
    let mut engine = CarChaseEngine::car(empty_streets());
    let mut rng = rng();
    engine.start(&mut rng);

    let first = engine.tick(DT, &[ChaseInput::Boost], &mut rng);
    assert_eq!(boost_events(&first), (1, 0));
    assert!((engine.state().distance_remaining - (200.0 - 0.15 * DT - 30.0)).abs() < 1e-9);
    assert_eq!(engine.state().gauge, 95.0, "nitro costs health");

    let second = engine.tick(DT, &[ChaseInput::Boost], &mut rng);
    assert_eq!(boost_events(&second), (0, 1));

    // 3 s cooldown from the first boost.
    for _ in 0..60 {
        engine.tick(DT, &[], &mut rng);
    }
    let third = engine.tick(DT, &[ChaseInput::Boost], &mut rng);
    assert_eq!(boost_events(&third), (1, 0));
}

#[test]
fn health_never_regenerates() {
    let params = ChaseParams {
        regen_rate: 50.0,
        ..empty_streets()
    };
    let mut engine = CarChaseEngine::car(params);
    let mut rng = rng();
    engine.start(&mut rng);

    engine.tick(DT, &[ChaseInput::Boost], &mut rng);
    for _ in 0..100 {
        engine.tick(DT, &[], &mut rng);
    }
    assert_eq!(engine.state().gauge, 95.0);
}

#[test]
fn cars_cannot_jump() {
    let mut engine = CarChaseEngine::car(empty_streets());
    let mut rng = rng();
    engine.start(&mut rng);

    let events = engine.tick(DT, &[ChaseInput::Jump], &mut rng);
    assert!(!events.contains(&GameEvent::JumpStarted));
    assert!(!engine.state().is_airborne());
}

#[test]
fn steering_stays_on_the_road() {
    let mut engine = CarChaseEngine::car(empty_streets());
    let mut rng = rng();
    engine.start(&mut rng);
    assert_eq!(engine.state().lane, 1);

    engine.tick(DT, &[ChaseInput::MoveLeft; 4], &mut rng);
    assert_eq!(engine.state().lane, 0);
    engine.tick(DT, &[ChaseInput::MoveRight; 4], &mut rng);
    assert_eq!(engine.state().lane, 2);
    engine.tick(DT, &[ChaseInput::SetLane { lane: 7 }], &mut rng);
    assert_eq!(engine.state().lane, 2, "out-of-range lanes are ignored");
    engine.tick(DT, &[ChaseInput::SetLane { lane: 0 }], &mut rng);
    assert_eq!(engine.state().lane, 0);
}

#[test]
fn traffic_wrecks_a_car_that_never_steers() {
    let params = ChaseParams {
        lane_count: 1,
        start_lane: 0,
        ..ChaseParams::car()
    };
    let mut engine = CarChaseEngine::car(params);
    let mut rng = rng();
    engine.start(&mut rng);

    let mut log = Vec::new();
    for _ in 0..2_000 {
        log.extend(engine.tick(DT, &[], &mut rng));
        if !engine.is_running() {
            break;
        }
    }

    let collisions = log.iter().filter(|e| matches!(e, GameEvent::HazardHit { .. })).count();
    assert_eq!(collisions, 4, "four 25-point collisions empty 100 health");
    assert_eq!(engine.outcome(), Some(ChaseOutcome::Wrecked));
    assert_eq!(engine.status(), ChaseStatus::Lost);
    assert!(engine.state().hazards.is_empty());
    assert!(log.contains(&GameEvent::ChaseEnded {
        kind:    ChaseKind::Vehicular,
        outcome: ChaseOutcome::Wrecked,
    }));
}

#[test]
fn wreck_is_checked_before_escape() {
    let params = ChaseParams {
        lane_count:              1,
        start_lane:              0,
        hazard_distance_penalty: 200.0,
        hazard_gauge_penalty:    100.0,
        ..ChaseParams::car()
    };
    let mut engine = CarChaseEngine::car(params);
    let mut rng = rng();
    engine.start(&mut rng);

    for _ in 0..2_000 {
        engine.tick(DT, &[], &mut rng);
        if !engine.is_running() {
            break;
        }
    }
    assert_eq!(engine.state().distance_remaining, engine.params().escape_distance());
    assert_eq!(engine.outcome(), Some(ChaseOutcome::Wrecked));
}

#[test]
fn nitro_runs_the_suspect_down() {
    let mut engine = CarChaseEngine::car(empty_streets());
    let mut rng = rng();
    engine.start(&mut rng);

    let mut boosts = 0;
    for _ in 0..2_000 {
        let events = engine.tick(DT, &[ChaseInput::Boost], &mut rng);
        boosts += boost_events(&events).0;
        if !engine.is_running() {
            break;
        }
    }
    assert_eq!(engine.outcome(), Some(ChaseOutcome::Caught));
    assert_eq!(boosts, 7, "190 units at 30 per nitro");
    assert!((engine.state().gauge - 65.0).abs() < 1e-9);
}
