//! Same seed, same session.
//!
//! Tests cover: identical event streams for identical seeds and inputs,
//! divergence across seeds, and the shipped data files.

use barber_core::chase::ChaseInput;
use barber_core::config::GameConfig;
use barber_core::content::ContentCatalog;
use barber_core::dialogue::DialogueCategory;
use barber_core::event::GameEvent;
use barber_core::game::{Game, GameState};

const DT: f64 = 1.0 / 30.0;

/// A fixed script of player actions. Returns every event as JSON,
/// minus the session id which is unique per run.
fn play(seed: u64) -> Vec<serde_json::Value> {
    let mut game = Game::build_test(seed);
    let mut events = game.brief().expect("brief");
    events.extend(game.begin_mission());

    for frame in 0..(240.0 / DT) as usize {
        match game.state() {
            GameState::Barbershop if frame % 15 == 0 => {
                let asked = game
                    .session()
                    .and_then(|s| s.current_customer())
                    .map_or(0, |c| c.dialogue_count);
                if asked < 3 {
                    let category = DialogueCategory::ALL[frame / 15 % 3];
                    events.extend(game.interrogate(category));
                } else if game.session().is_some_and(|s| s.current_index() == Some(s.suspect_index())) {
                    events.extend(game.accuse());
                } else {
                    events.extend(game.next_customer());
                }
            }
            GameState::StreetChase | GameState::CarChase if frame % 10 == 0 => {
                game.chase_input(ChaseInput::Boost);
                game.chase_input(ChaseInput::Jump);
            }
            GameState::Result => break,
            _ => {}
        }
        events.extend(game.update(DT));
    }

    events
        .iter()
        .filter(|e| !matches!(e, GameEvent::SessionInitialized { .. }))
        .map(|e| serde_json::to_value(e).expect("event serializes"))
        .collect()
}

#[test]
fn same_seed_replays_identically() {
    for seed in [1, 42, 9_001] {
        let first = play(seed);
        let second = play(seed);
        assert!(first.len() > 20, "seed {seed} produced only {} events", first.len());
        assert_eq!(first, second, "seed {seed} diverged");
    }
}

#[test]
fn different_seeds_draw_different_sessions() {
    let runs: Vec<_> = (0..6).map(play).collect();
    assert!(
        runs.windows(2).any(|pair| pair[0] != pair[1]),
        "six seeds should not all play out the same"
    );
}

#[test]
fn session_ids_are_unique_per_game() {
    let a = Game::build_test(5);
    let b = Game::build_test(5);
    assert_ne!(a.session_id(), b.session_id());
}

#[test]
fn shipped_data_files_load_and_validate() {
    let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../data");
    let config = GameConfig::load(dir).expect("data/ config loads");
    let catalog = ContentCatalog::load(dir).expect("data/ content loads");

    assert_eq!(config.session.max_customers, 5);
    assert_eq!(catalog.suspects.len(), 3);
    assert!(catalog.customers.len() >= config.session.max_customers);

    let mut game = Game::new(
        config,
        catalog,
        77,
        Box::new(barber_core::chatbot::OfflineBackend),
    );
    game.brief().expect("brief from shipped data");
    assert_eq!(game.state(), GameState::Briefing);
}
