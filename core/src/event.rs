//! The event stream — everything the core tells the presentation layer.
//!
//! RULE: The core never calls into a presentation layer.
//! Every operation returns the events it produced, and `Game`
//! broadcasts them to any subscribed `GameObserver`.

use crate::{
    chase::{BoostRejection, ChaseKind, ChaseOutcome},
    dialogue::DialogueCategory,
    game::GameState,
    haircut::HaircutTool,
    types::{Lane, LineupIndex, SessionId},
};
use serde::{Deserialize, Serialize};

/// Every event emitted during a session.
/// Variants are appended over time — never removed or reordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    // ── Session events ─────────────────────────
    SessionInitialized {
        session_id: SessionId,
        seed:       u64,
    },
    StateChanged {
        state: GameState,
    },
    MissionBriefed {
        codename:    String,
        traits:      Vec<String>,
        background:  String,
        lineup_size: usize,
    },
    ReputationChanged {
        reputation: u8,
    },
    GameEnded {
        victory: bool,
        message: String,
    },

    // ── Barbershop events ──────────────────────
    CustomerArrived {
        index:  LineupIndex,
        name:   String,
        avatar: String,
    },
    DialogueAdded {
        speaker: Speaker,
        text:    String,
    },
    SuspicionChanged {
        level: f64,
    },
    DialogueLimitReached {
        index: LineupIndex,
    },
    PlayerHunch {
        text: String,
    },
    AccusationMade {
        index:   LineupIndex,
        correct: bool,
    },
    LineupExhausted,
    ChatbotFallback {
        category: DialogueCategory,
        reason:   String,
    },

    // ── Haircut events ─────────────────────────
    ToolChanged {
        tool: HaircutTool,
    },
    HaircutProgressed {
        progress: f64,
    },
    HaircutCompleted {
        index: LineupIndex,
    },

    // ── Chase events ───────────────────────────
    ChaseStarted {
        kind:     ChaseKind,
        distance: f64,
        gauge:    f64,
    },
    ChaseProgress {
        kind:     ChaseKind,
        distance: f64,
        gauge:    f64,
        lane:     Lane,
    },
    HazardSpawned {
        kind:      ChaseKind,
        hazard_id: u64,
        lane:      Lane,
    },
    HazardHit {
        kind:      ChaseKind,
        hazard_id: u64,
        lane:      Lane,
    },
    HazardDodged {
        kind:      ChaseKind,
        hazard_id: u64,
    },
    JumpStarted,
    BoostUsed {
        kind:     ChaseKind,
        distance: f64,
        gauge:    f64,
    },
    BoostRejected {
        kind:   ChaseKind,
        reason: BoostRejection,
    },
    ChaseEnded {
        kind:    ChaseKind,
        outcome: ChaseOutcome,
    },
}

/// Who a dialogue line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Player,
    Customer,
    System,
}

impl GameEvent {
    pub fn dialogue(speaker: Speaker, text: impl Into<String>) -> Self {
        Self::DialogueAdded {
            speaker,
            text: text.into(),
        }
    }

    /// Stable string name of the variant, for logs and tooling.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::SessionInitialized { .. }   => "session_initialized",
            Self::StateChanged { .. }         => "state_changed",
            Self::MissionBriefed { .. }       => "mission_briefed",
            Self::ReputationChanged { .. }    => "reputation_changed",
            Self::GameEnded { .. }            => "game_ended",
            Self::CustomerArrived { .. }      => "customer_arrived",
            Self::DialogueAdded { .. }        => "dialogue_added",
            Self::SuspicionChanged { .. }     => "suspicion_changed",
            Self::DialogueLimitReached { .. } => "dialogue_limit_reached",
            Self::PlayerHunch { .. }          => "player_hunch",
            Self::AccusationMade { .. }       => "accusation_made",
            Self::LineupExhausted             => "lineup_exhausted",
            Self::ChatbotFallback { .. }      => "chatbot_fallback",
            Self::ToolChanged { .. }          => "tool_changed",
            Self::HaircutProgressed { .. }    => "haircut_progressed",
            Self::HaircutCompleted { .. }     => "haircut_completed",
            Self::ChaseStarted { .. }         => "chase_started",
            Self::ChaseProgress { .. }        => "chase_progress",
            Self::HazardSpawned { .. }        => "hazard_spawned",
            Self::HazardHit { .. }            => "hazard_hit",
            Self::HazardDodged { .. }         => "hazard_dodged",
            Self::JumpStarted                 => "jump_started",
            Self::BoostUsed { .. }            => "boost_used",
            Self::BoostRejected { .. }        => "boost_rejected",
            Self::ChaseEnded { .. }           => "chase_ended",
        }
    }
}

/// Subscription seam for presentation layers.
pub trait GameObserver {
    fn on_event(&mut self, event: &GameEvent);
}

/// Observer that forwards every event to the `log` facade.
/// Per-tick chase progress goes to trace level to keep debug output readable.
#[derive(Debug, Default)]
pub struct LogObserver;

impl GameObserver for LogObserver {
    fn on_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::ChaseProgress { .. } => log::trace!("{event:?}"),
            GameEvent::DialogueAdded { speaker, text } => log::debug!("[{speaker:?}] {text}"),
            _ => log::debug!("{}: {event:?}", event.type_name()),
        }
    }
}
