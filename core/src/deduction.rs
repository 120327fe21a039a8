//! Deduction session — the barbershop interrogation state machine.
//!
//! Phases: NotStarted → Interrogating(i) → {next customer | SuspectIdentified(i) | Failed}.
//!
//! RULE: The verdict of an accusation depends only on the customer's
//! suspect flag. Nothing else in the session can change it.
//! RULE: At most one reply is outstanding at a time. A question asked
//! while a reply is pending is a no-op.
//!
//! A question is two-phase so a slow chatbot can answer in between:
//! `ask` applies the player line and suspicion, `receive_reply` applies
//! the customer's answer. `interrogate` does both with a local reply.

use crate::{
    config::SessionConfig,
    content::NarrativeScript,
    customer::CustomerInstance,
    dialogue::DialogueCategory,
    event::{GameEvent, Speaker},
    lineup::Lineup,
    outcome::SessionFailure,
    rng::StreamRng,
    types::LineupIndex,
};
use serde::{Deserialize, Serialize};

/// Suspicion above which the suspect remarks on the questioning.
pub const SUSPICIOUS_REMARK_THRESHOLD: f64 = 50.0;

/// Questions to the suspect before the player starts getting hunches.
pub const HUNCH_MIN_DIALOGUES: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum DeductionPhase {
    NotStarted,
    Interrogating { index: LineupIndex },
    SuspectIdentified { index: LineupIndex },
    Failed { failure: SessionFailure },
}

impl DeductionPhase {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::SuspectIdentified { .. } | Self::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptLine {
    pub speaker: Speaker,
    pub text:    String,
}

/// Result of the first half of a question.
#[derive(Debug, Clone, PartialEq)]
pub enum Interrogation {
    /// No customer in the chair.
    Ignored,
    /// The per-customer question cap is already reached.
    LimitReached,
    /// A previous reply has not arrived yet.
    ReplyPending,
    /// The question went out. Deliver the answer via `receive_reply`.
    Asked {
        category:    DialogueCategory,
        player_line: String,
        events:      Vec<GameEvent>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accusation {
    /// No customer in the chair.
    Ignored,
    Correct { index: LineupIndex },
    /// Wrong customer; the session moved on with this reputation left.
    Wrong { index: LineupIndex, reputation: u8 },
    /// Wrong customer and reputation reached zero.
    CoverBlown { index: LineupIndex },
}

pub struct DeductionSession {
    config:            SessionConfig,
    lineup:            Lineup,
    phase:             DeductionPhase,
    current:           Option<LineupIndex>,
    reputation:        u8,
    caught_correct:    bool,
    false_accusations: u32,
    reply_pending:     bool,
    transcript:        Vec<TranscriptLine>,
}

impl DeductionSession {
    pub fn new(lineup: Lineup, config: SessionConfig) -> Self {
        let reputation = config.starting_reputation.min(config.max_reputation);
        Self {
            config,
            lineup,
            phase:             DeductionPhase::NotStarted,
            current:           None,
            reputation,
            caught_correct:    false,
            false_accusations: 0,
            reply_pending:     false,
            transcript:        Vec::new(),
        }
    }

    // ── Getters ────────────────────────────────────────

    pub fn phase(&self) -> DeductionPhase {
        self.phase
    }

    pub fn reputation(&self) -> u8 {
        self.reputation
    }

    pub fn lineup(&self) -> &Lineup {
        &self.lineup
    }

    pub fn suspect_index(&self) -> LineupIndex {
        self.lineup.suspect_index
    }

    /// Index of the customer in the chair, `None` before the first arrives.
    pub fn current_index(&self) -> Option<LineupIndex> {
        self.current
    }

    pub fn current_customer(&self) -> Option<&CustomerInstance> {
        match self.phase {
            DeductionPhase::Interrogating { index } => self.lineup.customers.get(index),
            _ => None,
        }
    }

    fn current_customer_mut(&mut self) -> Option<&mut CustomerInstance> {
        match self.phase {
            DeductionPhase::Interrogating { index } => self.lineup.customers.get_mut(index),
            _ => None,
        }
    }

    pub fn caught_correct_suspect(&self) -> bool {
        self.caught_correct
    }

    pub fn false_accusations(&self) -> u32 {
        self.false_accusations
    }

    /// Customers who have taken the chair so far.
    pub fn customers_served(&self) -> usize {
        self.current.map_or(0, |i| (i + 1).min(self.lineup.len()))
    }

    pub fn transcript(&self) -> &[TranscriptLine] {
        &self.transcript
    }

    pub fn is_reply_pending(&self) -> bool {
        self.reply_pending
    }

    pub fn can_continue_dialogue(&self) -> bool {
        self.current_customer()
            .is_some_and(|c| c.dialogue_count < self.config.max_dialogues_per_customer)
    }

    pub fn max_dialogues(&self) -> u32 {
        self.config.max_dialogues_per_customer
    }

    // ── Flow ───────────────────────────────────────────

    /// Reset the session and seat the first customer.
    pub fn start(&mut self) -> Vec<GameEvent> {
        self.reputation = self.config.starting_reputation.min(self.config.max_reputation);
        self.current = None;
        self.phase = DeductionPhase::NotStarted;
        self.caught_correct = false;
        self.false_accusations = 0;
        self.reply_pending = false;
        self.transcript.clear();
        for customer in &mut self.lineup.customers {
            customer.reset_turn();
            customer.haircut_complete = false;
        }

        let mut events = vec![GameEvent::ReputationChanged { reputation: self.reputation }];
        events.extend(self.advance_customer());
        events
    }

    /// Seat the next customer, or fail once the lineup is exhausted.
    pub fn advance_customer(&mut self) -> Vec<GameEvent> {
        if self.phase.is_finished() {
            return Vec::new();
        }
        let next = self.current.map_or(0, |i| i + 1);
        self.current = Some(next);
        self.reply_pending = false;
        self.transcript.clear();

        if next >= self.lineup.len() {
            log::info!("Lineup exhausted after {} customers", self.lineup.len());
            self.phase = DeductionPhase::Failed { failure: SessionFailure::SuspectSlippedAway };
            return vec![GameEvent::LineupExhausted];
        }

        self.phase = DeductionPhase::Interrogating { index: next };
        let customer = &mut self.lineup.customers[next];
        customer.reset_turn();
        let name = customer.name().to_string();
        let avatar = customer.template().avatar.clone();
        let greeting = customer.haircut_request().to_string();
        log::debug!("Customer {next} takes the chair: {name}");

        let mut events = vec![GameEvent::CustomerArrived { index: next, name, avatar }];
        self.say(Speaker::Customer, greeting, &mut events);
        events
    }

    /// First half of a question: player line and suspicion.
    pub fn ask(
        &mut self,
        category: DialogueCategory,
        script: &NarrativeScript,
        rng: &mut StreamRng,
    ) -> Interrogation {
        let max = self.config.max_dialogues_per_customer;
        let pending = self.reply_pending;
        let Some(customer) = self.current_customer_mut() else {
            return Interrogation::Ignored;
        };
        if customer.dialogue_count >= max {
            return Interrogation::LimitReached;
        }
        if pending {
            return Interrogation::ReplyPending;
        }

        customer.dialogue_count += 1;
        let level = customer.raise_suspicion(category.suspicion_delta());
        let player_line = script
            .player_lines
            .pick(category, rng)
            .unwrap_or(category.label())
            .to_string();
        self.reply_pending = true;

        let mut events = Vec::new();
        self.say(Speaker::Player, player_line.clone(), &mut events);
        events.push(GameEvent::SuspicionChanged { level });

        Interrogation::Asked {
            category,
            player_line,
            events,
        }
    }

    /// Second half of a question: the customer's answer and what follows it.
    pub fn receive_reply(
        &mut self,
        text: impl Into<String>,
        script: &NarrativeScript,
        rng: &mut StreamRng,
    ) -> Vec<GameEvent> {
        if !self.reply_pending {
            return Vec::new();
        }
        let Some(index) = self.current else {
            return Vec::new();
        };
        let Some(customer) = self.current_customer() else {
            return Vec::new();
        };
        let is_suspect = customer.is_suspect();
        let suspicion = customer.suspicion_level;
        let count = customer.dialogue_count;

        self.reply_pending = false;
        let mut events = Vec::new();
        self.say(Speaker::Customer, text.into(), &mut events);

        if is_suspect && suspicion > SUSPICIOUS_REMARK_THRESHOLD {
            self.say(Speaker::Customer, script.suspicious_remark.clone(), &mut events);
        }

        if is_suspect && count >= HUNCH_MIN_DIALOGUES && rng.chance(self.config.hunch_chance) {
            if let Some(hunch) = rng.pick(&script.hunches) {
                events.push(GameEvent::PlayerHunch { text: hunch.clone() });
            }
        }

        if count >= self.config.max_dialogues_per_customer {
            events.push(GameEvent::DialogueLimitReached { index });
            self.say(Speaker::System, script.limit_notice.clone(), &mut events);
        }
        events
    }

    /// Ask and answer from the customer's own lines in one step.
    pub fn interrogate(
        &mut self,
        category: DialogueCategory,
        script: &NarrativeScript,
        rng: &mut StreamRng,
    ) -> Vec<GameEvent> {
        match self.ask(category, script, rng) {
            Interrogation::Asked { mut events, .. } => {
                let reply = self
                    .current_customer()
                    .map(|c| c.local_reply(category, rng))
                    .unwrap_or_default();
                events.extend(self.receive_reply(reply, script, rng));
                events
            }
            Interrogation::LimitReached => self.limit_reached(),
            other => {
                log::debug!("Question ignored: {other:?}");
                Vec::new()
            }
        }
    }

    /// Re-announce the cap for a question asked past it.
    pub fn limit_reached(&self) -> Vec<GameEvent> {
        log::debug!("Question refused: limit reached for {:?}", self.current);
        self.current
            .map(|index| vec![GameEvent::DialogueLimitReached { index }])
            .unwrap_or_default()
    }

    /// Accuse the customer in the chair.
    pub fn accuse(&mut self, script: &NarrativeScript) -> (Accusation, Vec<GameEvent>) {
        let DeductionPhase::Interrogating { index } = self.phase else {
            return (Accusation::Ignored, Vec::new());
        };
        let correct = self.lineup.customers[index].is_suspect();
        let mut events = Vec::new();

        if correct {
            self.caught_correct = true;
            self.reply_pending = false;
            self.phase = DeductionPhase::SuspectIdentified { index };
            log::info!("Correct accusation: customer {index} is '{}'", self.lineup.suspect.codename);
            self.say(Speaker::Player, script.arrest_shout.clone(), &mut events);
            self.say(Speaker::Customer, script.arrest_reaction.clone(), &mut events);
            events.push(GameEvent::AccusationMade { index, correct });
            return (Accusation::Correct { index }, events);
        }

        self.false_accusations += 1;
        self.reputation = self.reputation.saturating_sub(1);
        log::info!(
            "False accusation against customer {index}; reputation now {}",
            self.reputation
        );
        self.say(Speaker::Player, script.false_arrest_shout.clone(), &mut events);
        self.say(Speaker::Customer, script.false_arrest_reaction.clone(), &mut events);
        self.say(Speaker::System, script.false_arrest_notice.clone(), &mut events);
        events.push(GameEvent::AccusationMade { index, correct });
        events.push(GameEvent::ReputationChanged { reputation: self.reputation });

        if self.reputation == 0 {
            self.reply_pending = false;
            self.phase = DeductionPhase::Failed { failure: SessionFailure::CoverBlown };
            return (Accusation::CoverBlown { index }, events);
        }

        self.say(Speaker::System, script.apology_notice.clone(), &mut events);
        events.extend(self.advance_customer());
        (
            Accusation::Wrong {
                index,
                reputation: self.reputation,
            },
            events,
        )
    }

    /// Mark the current customer's haircut finished. Only the first call counts.
    pub fn complete_haircut(&mut self, script: &NarrativeScript) -> Vec<GameEvent> {
        let Some(index) = self.current else {
            return Vec::new();
        };
        let Some(customer) = self.current_customer_mut() else {
            return Vec::new();
        };
        if customer.haircut_complete {
            return Vec::new();
        }
        customer.haircut_complete = true;

        let mut events = vec![GameEvent::HaircutCompleted { index }];
        self.say(Speaker::System, script.haircut_thanks.clone(), &mut events);
        events
    }

    fn say(&mut self, speaker: Speaker, text: String, events: &mut Vec<GameEvent>) {
        self.transcript.push(TranscriptLine {
            speaker,
            text: text.clone(),
        });
        events.push(GameEvent::dialogue(speaker, text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentCatalog;
    use crate::lineup::{LineupPolicy, SuspectAssignment};
    use crate::rng::{RngBank, StreamSlot};

    fn session(seed: u64) -> (DeductionSession, NarrativeScript, StreamRng) {
        let catalog = ContentCatalog::default_test();
        let bank = RngBank::new(seed);
        let lineup = SuspectAssignment::new(&catalog, LineupPolicy::Clamp)
            .generate(5, &mut bank.for_stream(StreamSlot::Lineup))
            .unwrap();
        let config = SessionConfig::default_test();
        (
            DeductionSession::new(lineup, config),
            catalog.script,
            bank.for_stream(StreamSlot::Dialogue),
        )
    }

    #[test]
    fn start_seats_the_first_customer_with_a_greeting() {
        let (mut s, _, _) = session(1);
        assert_eq!(s.current_index(), None);
        let events = s.start();
        assert_eq!(s.phase(), DeductionPhase::Interrogating { index: 0 });
        assert_eq!(s.reputation(), 3);
        assert!(matches!(events[1], GameEvent::CustomerArrived { index: 0, .. }));
        let greeting = s.lineup().customers[0].haircut_request().to_string();
        assert!(events.contains(&GameEvent::dialogue(Speaker::Customer, greeting)));
    }

    #[test]
    fn ask_while_reply_pending_is_a_noop() {
        let (mut s, script, mut rng) = session(2);
        s.start();
        let first = s.ask(DialogueCategory::Probe, &script, &mut rng);
        assert!(matches!(first, Interrogation::Asked { .. }));
        assert!(s.is_reply_pending());

        let second = s.ask(DialogueCategory::Direct, &script, &mut rng);
        assert_eq!(second, Interrogation::ReplyPending);
        let customer = s.current_customer().unwrap();
        assert_eq!(customer.dialogue_count, 1);
        assert_eq!(customer.suspicion_level, 10.0);

        s.receive_reply("Accounting.", &script, &mut rng);
        assert!(!s.is_reply_pending());
        assert!(s.receive_reply("late duplicate", &script, &mut rng).is_empty());
    }

    #[test]
    fn complete_haircut_counts_once() {
        let (mut s, script, _) = session(3);
        s.start();
        let events = s.complete_haircut(&script);
        assert!(events.contains(&GameEvent::HaircutCompleted { index: 0 }));
        assert!(s.current_customer().unwrap().haircut_complete);
        assert!(s.complete_haircut(&script).is_empty());
    }

    #[test]
    fn nothing_happens_before_start() {
        let (mut s, script, mut rng) = session(4);
        assert_eq!(s.ask(DialogueCategory::SmallTalk, &script, &mut rng), Interrogation::Ignored);
        assert_eq!(s.accuse(&script).0, Accusation::Ignored);
        assert_eq!(s.customers_served(), 0);
    }
}
