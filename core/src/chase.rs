//! Chase engine — the shared tick simulation behind both pursuit minigames.
//!
//! RULE: One tick always runs in the same order:
//!   decay → regeneration → inputs → spawn → hazards → clamp → termination.
//! RULE: When a chase ends, its hazards are discarded in that same tick.
//! A stopped engine ignores ticks and inputs; nothing is left running.
//!
//! The on-foot and vehicular chases differ only in their `ChaseRules`
//! (regeneration, jumping, termination order) and their `ChaseParams`.

use crate::{
    clock::sanitize_dt,
    error::{GameError, GameResult},
    event::GameEvent,
    rng::StreamRng,
    types::{Lane, Seconds},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChaseKind {
    OnFoot,
    Vehicular,
}

impl ChaseKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::OnFoot    => "street chase",
            Self::Vehicular => "car chase",
        }
    }

    /// Name of the gauge in player-facing text.
    pub fn gauge_label(&self) -> &'static str {
        match self {
            Self::OnFoot    => "stamina",
            Self::Vehicular => "health",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChaseStatus {
    Idle,
    Running,
    Won,
    Lost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChaseOutcome {
    /// Distance closed to the catch threshold.
    Caught,
    /// Distance opened to the escape threshold.
    Escaped,
    /// Stamina ran out on foot.
    Exhausted,
    /// Vehicle health ran out.
    Wrecked,
}

impl ChaseOutcome {
    pub fn is_win(&self) -> bool {
        matches!(self, Self::Caught)
    }
}

/// One player action, applied during the input step of the next tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "input", rename_all = "snake_case")]
pub enum ChaseInput {
    MoveLeft,
    MoveRight,
    SetLane { lane: Lane },
    Jump,
    Boost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoostRejection {
    InsufficientGauge,
    CoolingDown,
}

/// An obstacle (on foot) or a car in traffic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hazard {
    pub id:        u64,
    pub lane:      Lane,
    /// Distance ahead of the player. Decreases every tick.
    pub position:  f64,
    pub jumpable:  bool,
    /// Set once the hazard has crossed the collision front.
    pub triggered: bool,
}

/// Tuning for one chase variant. Loaded from `tuning.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChaseParams {
    pub starting_distance:       f64,
    pub catch_distance:          f64,
    /// Distance closed per second without any player input.
    pub decay_rate:              f64,
    /// Escape threshold as a multiple of `starting_distance`.
    pub escape_factor:           f64,
    pub gauge_max:               f64,
    /// Gauge regained per second (on-foot rules only).
    pub regen_rate:              f64,
    pub boost_cost:              f64,
    pub boost_amount:            f64,
    pub boost_cooldown:          Seconds,
    pub lane_count:              usize,
    pub start_lane:              Lane,
    pub hazard_interval:         Seconds,
    pub hazard_jitter_min:       Seconds,
    pub hazard_jitter_max:       Seconds,
    pub hazard_speed:            f64,
    pub hazard_spawn_position:   f64,
    pub collision_front:         f64,
    pub despawn_position:        f64,
    pub hazard_distance_penalty: f64,
    pub hazard_gauge_penalty:    f64,
    /// Probability that a spawned hazard can be jumped over.
    pub jumpable_chance:         f64,
    /// Total airborne time of one jump (rise plus fall).
    pub jump_duration:           Seconds,
}

impl ChaseParams {
    pub fn escape_distance(&self) -> f64 {
        self.starting_distance * self.escape_factor
    }

    pub fn validate(&self, name: &str) -> GameResult<()> {
        let fail = |msg: &str| -> GameResult<()> {
            Err(GameError::InvalidConfig(format!("{name}: {msg}")))
        };
        let floats = [
            ("starting_distance", self.starting_distance),
            ("catch_distance", self.catch_distance),
            ("decay_rate", self.decay_rate),
            ("escape_factor", self.escape_factor),
            ("gauge_max", self.gauge_max),
            ("regen_rate", self.regen_rate),
            ("boost_cost", self.boost_cost),
            ("boost_amount", self.boost_amount),
            ("boost_cooldown", self.boost_cooldown),
            ("hazard_interval", self.hazard_interval),
            ("hazard_jitter_min", self.hazard_jitter_min),
            ("hazard_jitter_max", self.hazard_jitter_max),
            ("hazard_speed", self.hazard_speed),
            ("hazard_spawn_position", self.hazard_spawn_position),
            ("collision_front", self.collision_front),
            ("despawn_position", self.despawn_position),
            ("hazard_distance_penalty", self.hazard_distance_penalty),
            ("hazard_gauge_penalty", self.hazard_gauge_penalty),
            ("jumpable_chance", self.jumpable_chance),
            ("jump_duration", self.jump_duration),
        ];
        if let Some((field, _)) = floats.iter().find(|(_, v)| !v.is_finite()) {
            return fail(&format!("{field} must be finite"));
        }
        if self.decay_rate < 0.0 || self.regen_rate < 0.0 {
            return fail("decay_rate and regen_rate must not be negative");
        }
        if self.hazard_distance_penalty < 0.0 || self.hazard_gauge_penalty < 0.0 {
            return fail("hazard penalties must not be negative");
        }
        if self.jump_duration < 0.0 {
            return fail("jump_duration must not be negative");
        }
        if !(self.starting_distance > self.catch_distance && self.catch_distance >= 0.0) {
            return fail("starting_distance must exceed catch_distance >= 0");
        }
        if self.escape_factor <= 1.0 {
            return fail("escape_factor must be greater than 1");
        }
        if self.gauge_max <= 0.0 {
            return fail("gauge_max must be positive");
        }
        if self.boost_cost < 0.0 || self.boost_amount < 0.0 || self.boost_cooldown < 0.0 {
            return fail("boost settings must not be negative");
        }
        if self.lane_count == 0 || self.start_lane >= self.lane_count {
            return fail("start_lane must be inside lane_count");
        }
        if self.hazard_jitter_min > self.hazard_jitter_max {
            return fail("hazard_jitter_min exceeds hazard_jitter_max");
        }
        if self.hazard_interval + self.hazard_jitter_min <= 0.0 {
            return fail("hazard spacing must stay positive");
        }
        if self.hazard_speed <= 0.0 {
            return fail("hazard_speed must be positive");
        }
        if !(self.despawn_position < self.collision_front
            && self.collision_front < self.hazard_spawn_position)
        {
            return fail("positions must satisfy despawn < collision_front < spawn");
        }
        if !(0.0..=1.0).contains(&self.jumpable_chance) {
            return fail("jumpable_chance must be in [0, 1]");
        }
        Ok(())
    }
}

/// Mutable simulation state of a running chase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChaseState {
    pub distance_remaining: f64,
    /// Stamina on foot, vehicle health by car.
    pub gauge:              f64,
    pub lane:               Lane,
    pub elapsed:            Seconds,
    pub airborne_until:     Option<Seconds>,
    pub boost_ready_at:     Seconds,
    pub next_spawn_at:      Seconds,
    pub hazards:            Vec<Hazard>,
    pub next_hazard_id:     u64,
}

impl ChaseState {
    fn fresh(params: &ChaseParams) -> Self {
        Self {
            distance_remaining: params.starting_distance,
            gauge:              params.gauge_max,
            lane:               params.start_lane,
            elapsed:            0.0,
            airborne_until:     None,
            boost_ready_at:     0.0,
            next_spawn_at:      0.0,
            hazards:            Vec::new(),
            next_hazard_id:     1,
        }
    }

    pub fn is_airborne(&self) -> bool {
        self.airborne_until.is_some_and(|until| self.elapsed < until)
    }
}

/// What differs between the chase variants.
pub trait ChaseRules {
    fn kind(&self) -> ChaseKind;

    /// Passive gauge regeneration, run once per tick after decay.
    fn regenerate(&self, _state: &mut ChaseState, _params: &ChaseParams, _dt: Seconds) {}

    fn allows_jump(&self) -> bool {
        false
    }

    /// Checked after clamping. At most one outcome fires per tick.
    fn terminal(&self, state: &ChaseState, params: &ChaseParams) -> Option<ChaseOutcome>;
}

pub struct ChaseEngine<R: ChaseRules> {
    rules:   R,
    params:  ChaseParams,
    status:  ChaseStatus,
    state:   ChaseState,
    outcome: Option<ChaseOutcome>,
}

impl<R: ChaseRules> ChaseEngine<R> {
    pub fn new(rules: R, params: ChaseParams) -> Self {
        let state = ChaseState::fresh(&params);
        Self {
            rules,
            params,
            status: ChaseStatus::Idle,
            state,
            outcome: None,
        }
    }

    pub fn kind(&self) -> ChaseKind {
        self.rules.kind()
    }

    pub fn status(&self) -> ChaseStatus {
        self.status
    }

    pub fn state(&self) -> &ChaseState {
        &self.state
    }

    pub fn params(&self) -> &ChaseParams {
        &self.params
    }

    pub fn outcome(&self) -> Option<ChaseOutcome> {
        self.outcome
    }

    pub fn is_running(&self) -> bool {
        self.status == ChaseStatus::Running
    }

    /// Begin a fresh chase. The first hazard arrives one jittered interval in.
    pub fn start(&mut self, rng: &mut StreamRng) -> Vec<GameEvent> {
        self.state = ChaseState::fresh(&self.params);
        self.state.next_spawn_at = self.next_spawn_delay(rng);
        self.status = ChaseStatus::Running;
        self.outcome = None;

        let kind = self.kind();
        log::info!(
            "{} started: distance {:.1}, {} {:.1}",
            kind.label(),
            self.state.distance_remaining,
            kind.gauge_label(),
            self.state.gauge
        );
        vec![GameEvent::ChaseStarted {
            kind,
            distance: self.state.distance_remaining,
            gauge:    self.state.gauge,
        }]
    }

    /// Stop without an outcome and discard all hazards.
    pub fn abort(&mut self) {
        if self.status == ChaseStatus::Running {
            log::debug!("{} aborted", self.kind().label());
        }
        self.state.hazards.clear();
        self.status = ChaseStatus::Idle;
    }

    /// Back to a pristine idle engine.
    pub fn reset(&mut self) {
        self.state = ChaseState::fresh(&self.params);
        self.status = ChaseStatus::Idle;
        self.outcome = None;
    }

    /// Advance the simulation by `dt` seconds, applying `inputs` in order.
    pub fn tick(&mut self, dt: Seconds, inputs: &[ChaseInput], rng: &mut StreamRng) -> Vec<GameEvent> {
        if self.status != ChaseStatus::Running {
            return Vec::new();
        }
        let dt = sanitize_dt(dt);
        let kind = self.kind();
        let mut events = Vec::new();

        // ── 1. Decay ───────────────────────────────
        self.state.elapsed += dt;
        self.state.distance_remaining -= self.params.decay_rate * dt;

        // ── 2. Regeneration ────────────────────────
        self.rules.regenerate(&mut self.state, &self.params, dt);

        // ── 3. Inputs ──────────────────────────────
        for input in inputs {
            self.apply_input(*input, &mut events);
        }

        // ── 4. Spawner ─────────────────────────────
        if self.state.elapsed >= self.state.next_spawn_at {
            let hazard = self.spawn_hazard(rng);
            log::debug!("{} hazard {} spawned in lane {}", kind.label(), hazard.id, hazard.lane);
            events.push(GameEvent::HazardSpawned {
                kind,
                hazard_id: hazard.id,
                lane:      hazard.lane,
            });
            self.state.hazards.push(hazard);
            self.state.next_spawn_at = self.state.elapsed + self.next_spawn_delay(rng);
        }

        // ── 5. Hazards ─────────────────────────────
        self.advance_hazards(dt, &mut events);

        // ── 6. Clamp and termination ───────────────
        self.state.distance_remaining =
            self.state.distance_remaining.clamp(0.0, self.params.escape_distance());
        self.state.gauge = self.state.gauge.clamp(0.0, self.params.gauge_max);

        events.push(GameEvent::ChaseProgress {
            kind,
            distance: self.state.distance_remaining,
            gauge:    self.state.gauge,
            lane:     self.state.lane,
        });

        if let Some(outcome) = self.rules.terminal(&self.state, &self.params) {
            self.finish(outcome, &mut events);
        }
        events
    }

    fn apply_input(&mut self, input: ChaseInput, events: &mut Vec<GameEvent>) {
        let kind = self.kind();
        match input {
            ChaseInput::MoveLeft => {
                self.state.lane = self.state.lane.saturating_sub(1);
            }
            ChaseInput::MoveRight => {
                self.state.lane = (self.state.lane + 1).min(self.params.lane_count - 1);
            }
            ChaseInput::SetLane { lane } => {
                if lane < self.params.lane_count {
                    self.state.lane = lane;
                }
            }
            ChaseInput::Jump => {
                if self.rules.allows_jump() && !self.state.is_airborne() {
                    self.state.airborne_until = Some(self.state.elapsed + self.params.jump_duration);
                    events.push(GameEvent::JumpStarted);
                }
            }
            ChaseInput::Boost => {
                if self.state.gauge < self.params.boost_cost {
                    events.push(GameEvent::BoostRejected {
                        kind,
                        reason: BoostRejection::InsufficientGauge,
                    });
                } else if self.state.elapsed < self.state.boost_ready_at {
                    events.push(GameEvent::BoostRejected {
                        kind,
                        reason: BoostRejection::CoolingDown,
                    });
                } else {
                    self.state.gauge -= self.params.boost_cost;
                    self.state.distance_remaining -= self.params.boost_amount;
                    self.state.boost_ready_at = self.state.elapsed + self.params.boost_cooldown;
                    events.push(GameEvent::BoostUsed {
                        kind,
                        distance: self.state.distance_remaining,
                        gauge:    self.state.gauge,
                    });
                }
            }
        }
    }

    fn spawn_hazard(&mut self, rng: &mut StreamRng) -> Hazard {
        let id = self.state.next_hazard_id;
        self.state.next_hazard_id += 1;
        let lane = rng.index_below(self.params.lane_count);
        let jumpable = self.rules.allows_jump() && rng.chance(self.params.jumpable_chance);
        Hazard {
            id,
            lane,
            position: self.params.hazard_spawn_position,
            jumpable,
            triggered: false,
        }
    }

    fn next_spawn_delay(&self, rng: &mut StreamRng) -> Seconds {
        self.params.hazard_interval
            + rng.range_f64(self.params.hazard_jitter_min, self.params.hazard_jitter_max)
    }

    fn advance_hazards(&mut self, dt: Seconds, events: &mut Vec<GameEvent>) {
        let kind = self.kind();
        let step = self.params.hazard_speed * dt;
        let airborne = self.state.is_airborne();
        let player_lane = self.state.lane;

        let mut distance_penalty = 0.0;
        let mut gauge_penalty = 0.0;

        for hazard in &mut self.state.hazards {
            hazard.position -= step;
            if hazard.triggered || hazard.position >= self.params.collision_front {
                continue;
            }
            hazard.triggered = true;
            if hazard.lane != player_lane {
                continue;
            }
            if hazard.jumpable && airborne {
                log::debug!("{} hazard {} jumped", kind.label(), hazard.id);
                events.push(GameEvent::HazardDodged { kind, hazard_id: hazard.id });
            } else {
                log::debug!("{} hazard {} hit in lane {}", kind.label(), hazard.id, hazard.lane);
                distance_penalty += self.params.hazard_distance_penalty;
                gauge_penalty += self.params.hazard_gauge_penalty;
                events.push(GameEvent::HazardHit {
                    kind,
                    hazard_id: hazard.id,
                    lane:      hazard.lane,
                });
            }
        }

        self.state.distance_remaining += distance_penalty;
        self.state.gauge -= gauge_penalty;

        let despawn = self.params.despawn_position;
        self.state.hazards.retain(|h| h.position >= despawn);
    }

    fn finish(&mut self, outcome: ChaseOutcome, events: &mut Vec<GameEvent>) {
        let kind = self.kind();
        self.status = if outcome.is_win() { ChaseStatus::Won } else { ChaseStatus::Lost };
        self.outcome = Some(outcome);
        self.state.hazards.clear();
        log::info!(
            "{} ended: {:?} after {:.1}s (distance {:.1}, {} {:.1})",
            kind.label(),
            outcome,
            self.state.elapsed,
            self.state.distance_remaining,
            kind.gauge_label(),
            self.state.gauge
        );
        events.push(GameEvent::ChaseEnded { kind, outcome });
    }
}
