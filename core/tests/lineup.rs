//! Suspect assignment tests.
//!
//! Covers: exactly one suspect per lineup, uniform slot selection,
//! clamp vs strict sizing, and degenerate catalogs.

use barber_core::content::ContentCatalog;
use barber_core::error::GameError;
use barber_core::lineup::{LineupPolicy, SuspectAssignment};
use barber_core::rng::{RngBank, StreamSlot};

fn lineup_rng(seed: u64) -> barber_core::rng::StreamRng {
    RngBank::new(seed).for_stream(StreamSlot::Lineup)
}

#[test]
fn every_lineup_has_exactly_one_suspect() {
    let catalog = ContentCatalog::default_test();
    let assignment = SuspectAssignment::new(&catalog, LineupPolicy::Clamp);

    for seed in 0..200u64 {
        let lineup = assignment.generate(5, &mut lineup_rng(seed)).expect("generate lineup");
        assert_eq!(lineup.len(), 5);

        let suspects: Vec<usize> = lineup
            .customers
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_suspect())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(suspects, vec![lineup.suspect_index], "seed {seed}: suspect flag mismatch");

        let bound = lineup.customers[lineup.suspect_index]
            .suspect_profile()
            .expect("suspect carries its profile");
        assert_eq!(bound.codename, lineup.suspect.codename);
    }
}

#[test]
fn lineup_draws_distinct_templates() {
    let catalog = ContentCatalog::default_test();
    let lineup = SuspectAssignment::new(&catalog, LineupPolicy::Clamp)
        .generate(5, &mut lineup_rng(77))
        .expect("generate lineup");

    let mut names: Vec<&str> = lineup.customers.iter().map(|c| c.name()).collect();
    names.sort_unstable();
    names.dedup();
    assert_eq!(names.len(), 5, "a template was used twice in one lineup");
}

#[test]
fn suspect_slot_is_uniform() {
    const RUNS: u64 = 2_000;
    let catalog = ContentCatalog::default_test();
    let assignment = SuspectAssignment::new(&catalog, LineupPolicy::Clamp);

    let mut hits = [0u32; 5];
    for seed in 0..RUNS {
        let lineup = assignment.generate(5, &mut lineup_rng(seed)).expect("generate lineup");
        hits[lineup.suspect_index] += 1;
    }

    let expected = RUNS as f64 / 5.0;
    for (slot, &count) in hits.iter().enumerate() {
        let deviation = (count as f64 - expected).abs() / expected;
        assert!(
            deviation < 0.15,
            "slot {slot} chosen {count} times, expected about {expected:.0}"
        );
    }
}

#[test]
fn every_suspect_profile_gets_drawn() {
    let catalog = ContentCatalog::default_test();
    let assignment = SuspectAssignment::new(&catalog, LineupPolicy::Clamp);

    let mut seen = std::collections::BTreeSet::new();
    for seed in 0..100u64 {
        let lineup = assignment.generate(3, &mut lineup_rng(seed)).expect("generate lineup");
        seen.insert(lineup.suspect.codename.clone());
    }
    assert_eq!(seen.len(), catalog.suspects.len());
}

#[test]
fn clamp_uses_every_template_when_short() {
    let catalog = ContentCatalog::default_test();
    let lineup = SuspectAssignment::new(&catalog, LineupPolicy::Clamp)
        .generate(10, &mut lineup_rng(1))
        .expect("clamped lineup");
    assert_eq!(lineup.len(), catalog.customers.len());
    assert!(lineup.suspect_index < lineup.len());
}

#[test]
fn strict_refuses_when_short() {
    let catalog = ContentCatalog::default_test();
    let err = SuspectAssignment::new(&catalog, LineupPolicy::Strict)
        .generate(10, &mut lineup_rng(1))
        .expect_err("strict lineup must refuse");
    assert!(matches!(
        err,
        GameError::InsufficientTemplates { requested: 10, available: 6 }
    ));
}

#[test]
fn empty_catalogs_are_errors_under_any_policy() {
    let mut no_customers = ContentCatalog::default_test();
    no_customers.customers.clear();
    for policy in [LineupPolicy::Clamp, LineupPolicy::Strict] {
        let err = SuspectAssignment::new(&no_customers, policy)
            .generate(5, &mut lineup_rng(2))
            .expect_err("no templates");
        assert!(matches!(err, GameError::InsufficientTemplates { available: 0, .. }));
    }

    let mut no_suspects = ContentCatalog::default_test();
    no_suspects.suspects.clear();
    let err = SuspectAssignment::new(&no_suspects, LineupPolicy::Clamp)
        .generate(5, &mut lineup_rng(2))
        .expect_err("no suspects");
    assert!(matches!(err, GameError::NoSuspects));
}

#[test]
fn same_seed_same_lineup() {
    let catalog = ContentCatalog::default_test();
    let assignment = SuspectAssignment::new(&catalog, LineupPolicy::Clamp);
    let a = assignment.generate(5, &mut lineup_rng(0xBAD5EED)).expect("lineup a");
    let b = assignment.generate(5, &mut lineup_rng(0xBAD5EED)).expect("lineup b");

    let names = |l: &barber_core::lineup::Lineup| -> Vec<String> {
        l.customers.iter().map(|c| c.name().to_string()).collect()
    };
    assert_eq!(names(&a), names(&b));
    assert_eq!(a.suspect_index, b.suspect_index);
    assert_eq!(a.suspect.codename, b.suspect.codename);
}
