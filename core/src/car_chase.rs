//! Vehicular pursuit — health, nitro with a cooldown, traffic collisions.
//!
//! RULE: Termination order is catch, then wrecked, then escape.
//! Health never regenerates.

use crate::chase::{ChaseEngine, ChaseKind, ChaseOutcome, ChaseParams, ChaseRules, ChaseState};

#[derive(Debug, Clone, Copy, Default)]
pub struct CarChase;

pub type CarChaseEngine = ChaseEngine<CarChase>;

impl ChaseRules for CarChase {
    fn kind(&self) -> ChaseKind {
        ChaseKind::Vehicular
    }

    fn terminal(&self, state: &ChaseState, params: &ChaseParams) -> Option<ChaseOutcome> {
        if state.distance_remaining <= params.catch_distance {
            Some(ChaseOutcome::Caught)
        } else if state.gauge <= 0.0 {
            Some(ChaseOutcome::Wrecked)
        } else if state.distance_remaining >= params.escape_distance() {
            Some(ChaseOutcome::Escaped)
        } else {
            None
        }
    }
}

impl CarChaseEngine {
    pub fn car(params: ChaseParams) -> Self {
        ChaseEngine::new(CarChase, params)
    }
}

impl ChaseParams {
    /// Default vehicular tuning. Nitro costs health and has a 3 s cooldown.
    pub fn car() -> Self {
        Self {
            starting_distance:       200.0,
            catch_distance:          10.0,
            decay_rate:              0.15,
            escape_factor:           1.5,
            gauge_max:               100.0,
            regen_rate:              0.0,
            boost_cost:              5.0,
            boost_amount:            30.0,
            boost_cooldown:          3.0,
            lane_count:              3,
            start_lane:              1,
            hazard_interval:         0.8,
            hazard_jitter_min:       -0.2,
            hazard_jitter_max:       0.3,
            hazard_speed:            15.0,
            hazard_spawn_position:   50.0,
            collision_front:         5.0,
            despawn_position:        -20.0,
            hazard_distance_penalty: 10.0,
            hazard_gauge_penalty:    25.0,
            jumpable_chance:         0.0,
            jump_duration:           0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wreck_is_checked_before_escape() {
        let params = ChaseParams::car();
        let engine = CarChaseEngine::car(params.clone());
        let mut state = engine.state().clone();
        state.gauge = 0.0;
        state.distance_remaining = params.escape_distance();
        assert_eq!(CarChase.terminal(&state, &params), Some(ChaseOutcome::Wrecked));
        state.distance_remaining = params.catch_distance;
        assert_eq!(CarChase.terminal(&state, &params), Some(ChaseOutcome::Caught));
    }

    #[test]
    fn car_never_jumps_or_regenerates() {
        let params = ChaseParams::car();
        let engine = CarChaseEngine::car(params.clone());
        let mut state = engine.state().clone();
        state.gauge = 40.0;
        CarChase.regenerate(&mut state, &params, 10.0);
        assert_eq!(state.gauge, 40.0);
        assert!(!CarChase.allows_jump());
    }

    #[test]
    fn default_tuning_is_valid() {
        assert!(ChaseParams::car().validate("car_chase").is_ok());
    }
}
