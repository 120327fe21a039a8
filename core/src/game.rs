//! The game — owns every sub-controller and sequences the screens.
//!
//! SCREEN ORDER (fixed):
//!   Title → Briefing → Barbershop → StreetChase → CarChase → Result
//!
//! RULES:
//!   - `Game` is the only owner of session state. No globals, no singletons.
//!   - Every public operation returns the events it produced and
//!     broadcasts them to subscribed observers.
//!   - Narrative pauses are `Beat`s in a deferred queue, fired by `update`.
//!   - All randomness flows through the per-stream RNGs below.

use crate::{
    car_chase::CarChaseEngine,
    chase::{ChaseInput, ChaseKind, ChaseOutcome, ChaseState, ChaseStatus},
    chatbot::{ChatBackend, ChatbotService, OfflineBackend, ReplySource},
    clock::{DeferredQueue, GameClock},
    config::GameConfig,
    content::ContentCatalog,
    deduction::{Accusation, DeductionPhase, DeductionSession, Interrogation},
    dialogue::DialogueCategory,
    error::GameResult,
    event::{GameEvent, GameObserver, Speaker},
    haircut::{HaircutSession, HaircutTool},
    lineup::SuspectAssignment,
    outcome::{SessionFailure, SessionOutcome, SessionResult},
    rng::{RngBank, StreamRng, StreamSlot},
    street_chase::StreetChaseEngine,
    types::{Lane, LineupIndex, Seconds, SessionId},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Title,
    Briefing,
    Barbershop,
    StreetChase,
    CarChase,
    Result,
}

/// A narrative continuation waiting on the clock.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Beat {
    SeatFirstCustomer,
    StartStreetChase,
    StartCarChase,
    ShowResult(SessionResult),
}

struct Streams {
    lineup:   StreamRng,
    dialogue: StreamRng,
    chatbot:  StreamRng,
    street:   StreamRng,
    car:      StreamRng,
    haircut:  StreamRng,
}

impl Streams {
    fn new(bank: &RngBank) -> Self {
        Self {
            lineup:   bank.for_stream(StreamSlot::Lineup),
            dialogue: bank.for_stream(StreamSlot::Dialogue),
            chatbot:  bank.for_stream(StreamSlot::Chatbot),
            street:   bank.for_stream(StreamSlot::StreetChase),
            car:      bank.for_stream(StreamSlot::CarChase),
            haircut:  bank.for_stream(StreamSlot::Haircut),
        }
    }
}

/// Flat view of the game for tooling and UIs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSnapshot {
    pub session_id:       SessionId,
    pub state:            GameState,
    pub elapsed:          Seconds,
    pub reputation:       Option<u8>,
    pub customer_index:   Option<LineupIndex>,
    pub customer_name:    Option<String>,
    pub dialogue_count:   Option<u32>,
    pub suspicion_level:  Option<f64>,
    pub reply_pending:    bool,
    pub haircut_progress: Option<f64>,
    pub chase:            Option<ChaseSnapshot>,
    pub outcome:          Option<SessionOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChaseSnapshot {
    pub kind:     ChaseKind,
    pub status:   ChaseStatus,
    pub distance: f64,
    pub gauge:    f64,
    pub lane:     Lane,
    pub hazards:  usize,
}

pub struct Game {
    config:         GameConfig,
    catalog:        ContentCatalog,
    seed:           u64,
    session_id:     SessionId,
    state:          GameState,
    clock:          GameClock,
    beats:          DeferredQueue<Beat>,
    rng:            Streams,
    session:        Option<DeductionSession>,
    chatbot:        ChatbotService,
    haircut:        Option<HaircutSession>,
    street:         StreetChaseEngine,
    car:            CarChaseEngine,
    pending_inputs: Vec<ChaseInput>,
    outcome:        Option<SessionOutcome>,
    observers:      Vec<Box<dyn GameObserver>>,
}

impl Game {
    pub fn new(
        config: GameConfig,
        catalog: ContentCatalog,
        seed: u64,
        backend: Box<dyn ChatBackend>,
    ) -> Self {
        let bank = RngBank::new(seed);
        let chatbot = ChatbotService::new(
            config.chatbot.clone(),
            backend,
            catalog.script.fallback_replies.clone(),
        );
        Self {
            street:         StreetChaseEngine::street(config.street_chase.clone()),
            car:            CarChaseEngine::car(config.car_chase.clone()),
            rng:            Streams::new(&bank),
            session_id:     uuid::Uuid::new_v4().to_string(),
            state:          GameState::Title,
            clock:          GameClock::new(),
            beats:          DeferredQueue::new(),
            session:        None,
            haircut:        None,
            pending_inputs: Vec::new(),
            outcome:        None,
            observers:      Vec::new(),
            chatbot,
            config,
            catalog,
            seed,
        }
    }

    /// Built-in config and content, offline chatbot.
    pub fn build_test(seed: u64) -> Self {
        Self::new(
            GameConfig::default_test(),
            ContentCatalog::default_test(),
            seed,
            Box::new(OfflineBackend),
        )
    }

    pub fn subscribe(&mut self, observer: Box<dyn GameObserver>) {
        self.observers.push(observer);
    }

    // ── Getters ────────────────────────────────────────

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ContentCatalog {
        &self.catalog
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn session(&self) -> Option<&DeductionSession> {
        self.session.as_ref()
    }

    pub fn haircut(&self) -> Option<&HaircutSession> {
        self.haircut.as_ref()
    }

    pub fn chatbot(&self) -> &ChatbotService {
        &self.chatbot
    }

    pub fn street_chase(&self) -> &StreetChaseEngine {
        &self.street
    }

    pub fn car_chase(&self) -> &CarChaseEngine {
        &self.car
    }

    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    /// Beats still waiting on the clock.
    pub fn pending_beats(&self) -> usize {
        self.beats.len()
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let customer = self.session.as_ref().and_then(|s| s.current_customer());
        let chase = match self.state {
            GameState::StreetChase => Some(chase_snapshot(ChaseKind::OnFoot, self.street.status(), self.street.state())),
            GameState::CarChase    => Some(chase_snapshot(ChaseKind::Vehicular, self.car.status(), self.car.state())),
            _ => None,
        };
        GameSnapshot {
            session_id:       self.session_id.clone(),
            state:            self.state,
            elapsed:          self.clock.elapsed,
            reputation:       self.session.as_ref().map(|s| s.reputation()),
            customer_index:   self.session.as_ref().and_then(|s| s.current_index()),
            customer_name:    customer.map(|c| c.name().to_string()),
            dialogue_count:   customer.map(|c| c.dialogue_count),
            suspicion_level:  customer.map(|c| c.suspicion_level),
            reply_pending:    self.session.as_ref().is_some_and(|s| s.is_reply_pending()),
            haircut_progress: self.haircut.as_ref().map(|h| h.progress()),
            chase,
            outcome:          self.outcome.clone(),
        }
    }

    // ── Screen flow ────────────────────────────────────

    /// Draw the suspect and lineup and show the briefing.
    pub fn brief(&mut self) -> GameResult<Vec<GameEvent>> {
        if self.state != GameState::Title {
            log::debug!("brief() ignored in state {:?}", self.state);
            return Ok(Vec::new());
        }
        let lineup = SuspectAssignment::new(&self.catalog, self.config.session.lineup_policy)
            .generate(self.config.session.max_customers, &mut self.rng.lineup)?;

        let mut events = vec![GameEvent::SessionInitialized {
            session_id: self.session_id.clone(),
            seed:       self.seed,
        }];
        events.push(self.enter(GameState::Briefing));
        events.push(GameEvent::MissionBriefed {
            codename:    lineup.suspect.codename.clone(),
            traits:      lineup.suspect.traits.clone(),
            background:  lineup.suspect.background.clone(),
            lineup_size: lineup.len(),
        });
        log::info!(
            "Mission briefed: suspect '{}', {} customers",
            lineup.suspect.codename,
            lineup.len()
        );
        self.session = Some(DeductionSession::new(lineup, self.config.session.clone()));
        Ok(self.broadcast(events))
    }

    /// Open the shop. The first customer arrives after a short pause.
    pub fn begin_mission(&mut self) -> Vec<GameEvent> {
        if self.state != GameState::Briefing {
            return Vec::new();
        }
        let mut events = vec![self.enter(GameState::Barbershop)];
        self.clock.resume();
        events.push(GameEvent::dialogue(Speaker::System, self.catalog.script.welcome.clone()));
        self.schedule(self.config.session.arrival_delay_secs, Beat::SeatFirstCustomer);
        self.broadcast(events)
    }

    /// Back to the title screen with nothing carried over.
    pub fn restart(&mut self) -> Vec<GameEvent> {
        self.clock.reset();
        self.beats.clear();
        self.session = None;
        self.haircut = None;
        self.street.reset();
        self.car.reset();
        self.pending_inputs.clear();
        self.outcome = None;
        self.chatbot.clear_history();
        self.session_id = uuid::Uuid::new_v4().to_string();
        log::info!("Game restarted: session {}", self.session_id);
        let events = vec![self.enter(GameState::Title)];
        self.broadcast(events)
    }

    // ── Barbershop ─────────────────────────────────────

    pub fn interrogate(&mut self, category: DialogueCategory) -> Vec<GameEvent> {
        if self.state != GameState::Barbershop {
            return Vec::new();
        }
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let script = &self.catalog.script;

        let events = if !self.config.session.use_chatbot {
            session.interrogate(category, script, &mut self.rng.dialogue)
        } else {
            match session.ask(category, script, &mut self.rng.dialogue) {
                Interrogation::Asked { player_line, mut events, .. } => {
                    let local = session
                        .current_customer()
                        .map(|c| c.local_reply(category, &mut self.rng.dialogue))
                        .unwrap_or_default();
                    let reply = self.chatbot.send_or_local(
                        &player_line,
                        category,
                        self.clock.elapsed,
                        &mut self.rng.chatbot,
                        local,
                    );
                    if let ReplySource::Fallback(reason) = reply.source {
                        events.push(GameEvent::ChatbotFallback {
                            category,
                            reason: reason.label().to_string(),
                        });
                    }
                    events.extend(session.receive_reply(reply.text, script, &mut self.rng.dialogue));
                    events
                }
                Interrogation::LimitReached => session.limit_reached(),
                other => {
                    log::debug!("Question ignored: {other:?}");
                    Vec::new()
                }
            }
        };
        self.broadcast(events)
    }

    /// Send the current customer away and seat the next one.
    pub fn next_customer(&mut self) -> Vec<GameEvent> {
        if self.state != GameState::Barbershop {
            return Vec::new();
        }
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        if !matches!(session.phase(), DeductionPhase::Interrogating { .. }) {
            return Vec::new();
        }
        let mut events = session.advance_customer();
        events.extend(self.after_seat_change());
        self.broadcast(events)
    }

    /// Accuse the customer in the chair.
    pub fn accuse(&mut self) -> Vec<GameEvent> {
        if self.state != GameState::Barbershop {
            return Vec::new();
        }
        let Some(session) = self.session.as_mut() else {
            return Vec::new();
        };
        let (verdict, mut events) = session.accuse(&self.catalog.script);
        let beat = self.config.session.accusation_beat_secs;
        match verdict {
            Accusation::Ignored => {}
            Accusation::Correct { .. } => {
                self.haircut = None;
                self.schedule(beat, Beat::StartStreetChase);
            }
            Accusation::CoverBlown { .. } => {
                self.schedule(beat, Beat::ShowResult(SessionResult::Failed(SessionFailure::CoverBlown)));
            }
            Accusation::Wrong { .. } => events.extend(self.after_seat_change()),
        }
        self.broadcast(events)
    }

    pub fn set_tool(&mut self, tool: HaircutTool) -> Vec<GameEvent> {
        if self.state != GameState::Barbershop {
            return Vec::new();
        }
        let events = self
            .haircut
            .as_mut()
            .map(|h| h.set_tool(tool))
            .unwrap_or_default();
        self.broadcast(events)
    }

    /// Cut at a point on the current customer's head.
    pub fn cut_hair(&mut self, x: f64, y: f64) -> Vec<GameEvent> {
        if self.state != GameState::Barbershop {
            return Vec::new();
        }
        let Some(haircut) = self.haircut.as_mut() else {
            return Vec::new();
        };
        let was_complete = haircut.is_complete();
        let mut events = haircut.cut_at(x, y);
        if !was_complete && haircut.is_complete() {
            if let Some(session) = self.session.as_mut() {
                events.extend(session.complete_haircut(&self.catalog.script));
            }
        }
        self.broadcast(events)
    }

    // ── Chases ─────────────────────────────────────────

    /// Queue a chase input for the next `update`.
    pub fn chase_input(&mut self, input: ChaseInput) {
        if matches!(self.state, GameState::StreetChase | GameState::CarChase) {
            self.pending_inputs.push(input);
        }
    }

    /// Advance game time: tick the active chase, then fire due beats.
    pub fn update(&mut self, dt: Seconds) -> Vec<GameEvent> {
        let before = self.clock.elapsed;
        let now = self.clock.advance(dt);
        let step = now - before;
        let mut events = Vec::new();

        if step > 0.0 {
            let inputs = std::mem::take(&mut self.pending_inputs);
            match self.state {
                GameState::StreetChase if self.street.is_running() => {
                    events.extend(self.street.tick(step, &inputs, &mut self.rng.street));
                    if let Some(outcome) = self.street.outcome() {
                        events.extend(self.street_chase_over(outcome));
                    }
                }
                GameState::CarChase if self.car.is_running() => {
                    events.extend(self.car.tick(step, &inputs, &mut self.rng.car));
                    if let Some(outcome) = self.car.outcome() {
                        events.extend(self.car_chase_over(outcome));
                    }
                }
                _ => {}
            }
        }

        for beat in self.beats.drain_due(now) {
            events.extend(self.fire(beat));
        }
        self.broadcast(events)
    }

    // ── Internals ──────────────────────────────────────

    fn fire(&mut self, beat: Beat) -> Vec<GameEvent> {
        log::debug!("Beat fired at {:.2}s: {beat:?}", self.clock.elapsed);
        match beat {
            Beat::SeatFirstCustomer => {
                let Some(session) = self.session.as_mut() else {
                    return Vec::new();
                };
                let mut events = session.start();
                events.extend(self.after_seat_change());
                events
            }
            Beat::StartStreetChase => {
                let mut events = vec![self.enter(GameState::StreetChase)];
                events.extend(self.street.start(&mut self.rng.street));
                events
            }
            Beat::StartCarChase => {
                let mut events = vec![self.enter(GameState::CarChase)];
                events.extend(self.car.start(&mut self.rng.car));
                events
            }
            Beat::ShowResult(result) => self.finish(result),
        }
    }

    /// A new customer sat down, or the lineup ran out.
    fn after_seat_change(&mut self) -> Vec<GameEvent> {
        let Some(session) = self.session.as_ref() else {
            return Vec::new();
        };
        match session.phase() {
            DeductionPhase::Failed { failure } => self.finish(SessionResult::Failed(failure)),
            DeductionPhase::Interrogating { .. } => {
                if let Some(customer) = session.current_customer() {
                    if self.config.session.use_chatbot {
                        self.chatbot.start_conversation(customer);
                    }
                }
                self.haircut = Some(HaircutSession::new(self.config.haircut.clone(), &mut self.rng.haircut));
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn street_chase_over(&mut self, outcome: ChaseOutcome) -> Vec<GameEvent> {
        self.pending_inputs.clear();
        if outcome.is_win() {
            self.schedule(self.config.session.getaway_beat_secs, Beat::StartCarChase);
            vec![GameEvent::dialogue(Speaker::System, self.catalog.script.getaway_notice.clone())]
        } else {
            self.finish(SessionResult::Failed(SessionFailure::EscapedOnFoot))
        }
    }

    fn car_chase_over(&mut self, outcome: ChaseOutcome) -> Vec<GameEvent> {
        self.pending_inputs.clear();
        if outcome.is_win() {
            self.finish(SessionResult::Apprehended)
        } else {
            self.finish(SessionResult::Failed(SessionFailure::EscapedByCar))
        }
    }

    fn finish(&mut self, result: SessionResult) -> Vec<GameEvent> {
        if self.state == GameState::Result {
            return Vec::new();
        }
        self.beats.clear();
        self.street.abort();
        self.car.abort();
        self.pending_inputs.clear();
        self.haircut = None;
        self.clock.pause();

        let outcome = match self.session.as_ref() {
            Some(s) => SessionOutcome::summarize(
                result,
                s.reputation(),
                &s.lineup().suspect.codename,
                s.customers_served(),
                s.caught_correct_suspect(),
                s.false_accusations(),
            ),
            None => SessionOutcome::summarize(result, 0, "", 0, false, 0),
        };
        log::info!("Session over: {} ({})", outcome.headline, outcome.message);

        let events = vec![
            self.enter(GameState::Result),
            GameEvent::GameEnded {
                victory: outcome.victory,
                message: outcome.message.clone(),
            },
        ];
        self.outcome = Some(outcome);
        events
    }

    fn enter(&mut self, state: GameState) -> GameEvent {
        log::info!("State {:?} → {:?}", self.state, state);
        self.state = state;
        GameEvent::StateChanged { state }
    }

    fn schedule(&mut self, delay: Seconds, beat: Beat) {
        log::debug!("Beat scheduled in {delay:.2}s: {beat:?}");
        self.beats.schedule(self.clock.elapsed, delay, beat);
    }

    fn broadcast(&mut self, events: Vec<GameEvent>) -> Vec<GameEvent> {
        for observer in &mut self.observers {
            for event in &events {
                observer.on_event(event);
            }
        }
        events
    }
}

fn chase_snapshot(kind: ChaseKind, status: ChaseStatus, state: &ChaseState) -> ChaseSnapshot {
    ChaseSnapshot {
        kind,
        status,
        distance: state.distance_remaining,
        gauge:    state.gauge,
        lane:     state.lane,
        hazards:  state.hazards.len(),
    }
}
