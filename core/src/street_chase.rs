//! On-foot pursuit — stamina, sprinting, jumping over obstacles.
//!
//! RULE: Termination order is catch, then escape, then exhaustion.

use crate::{
    chase::{ChaseEngine, ChaseKind, ChaseOutcome, ChaseParams, ChaseRules, ChaseState},
    types::Seconds,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct StreetChase;

pub type StreetChaseEngine = ChaseEngine<StreetChase>;

impl ChaseRules for StreetChase {
    fn kind(&self) -> ChaseKind {
        ChaseKind::OnFoot
    }

    fn regenerate(&self, state: &mut ChaseState, params: &ChaseParams, dt: Seconds) {
        state.gauge = (state.gauge + params.regen_rate * dt).min(params.gauge_max);
    }

    fn allows_jump(&self) -> bool {
        true
    }

    fn terminal(&self, state: &ChaseState, params: &ChaseParams) -> Option<ChaseOutcome> {
        if state.distance_remaining <= params.catch_distance {
            Some(ChaseOutcome::Caught)
        } else if state.distance_remaining >= params.escape_distance() {
            Some(ChaseOutcome::Escaped)
        } else if state.gauge <= 0.0 {
            Some(ChaseOutcome::Exhausted)
        } else {
            None
        }
    }
}

impl StreetChaseEngine {
    pub fn street(params: ChaseParams) -> Self {
        ChaseEngine::new(StreetChase, params)
    }
}

impl ChaseParams {
    /// Default on-foot tuning.
    pub fn street() -> Self {
        Self {
            starting_distance:       100.0,
            catch_distance:          5.0,
            decay_rate:              0.1,
            escape_factor:           1.5,
            gauge_max:               100.0,
            regen_rate:              5.0,
            boost_cost:              20.0,
            boost_amount:            15.0,
            boost_cooldown:          0.0,
            lane_count:              3,
            start_lane:              1,
            hazard_interval:         1.5,
            hazard_jitter_min:       -0.3,
            hazard_jitter_max:       0.5,
            hazard_speed:            10.0,
            hazard_spawn_position:   20.0,
            collision_front:         0.0,
            despawn_position:        -10.0,
            hazard_distance_penalty: 10.0,
            hazard_gauge_penalty:    15.0,
            jumpable_chance:         1.0,
            jump_duration:           0.6,
        }
    }
}
