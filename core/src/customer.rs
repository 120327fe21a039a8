//! Runtime customer instances — one CustomerTemplate bound into a session.

use crate::{
    content::{CustomerTemplate, SuspectProfile},
    dialogue::{DialogueCategory, DialoguePool},
    rng::StreamRng,
};

/// Probability that the bound suspect answers with a clue line
/// instead of a line from their ordinary pool.
pub const SUSPECT_CLUE_CHANCE: f64 = 0.5;

pub const MAX_SUSPICION: f64 = 100.0;

/// Reply used only if a pool was somehow empty at pick time.
const SILENT_REPLY: &str = "...";

#[derive(Debug, Clone)]
pub struct CustomerInstance {
    template:  CustomerTemplate,
    /// Base pool plus any appended suspect clues.
    responses: DialoguePool,
    suspect:   Option<SuspectProfile>,
    pub suspicion_level:  f64,
    pub dialogue_count:   u32,
    pub haircut_complete: bool,
}

impl CustomerInstance {
    pub fn new(template: CustomerTemplate) -> Self {
        let responses = template.responses.clone();
        Self {
            template,
            responses,
            suspect:          None,
            suspicion_level:  0.0,
            dialogue_count:   0,
            haircut_complete: false,
        }
    }

    /// Bind the suspect profile to this customer and append its clues to
    /// the response pool. Binding happens at most once; a second call is
    /// refused and returns false.
    pub fn bind_suspect(&mut self, profile: SuspectProfile) -> bool {
        if self.suspect.is_some() {
            return false;
        }
        self.responses.append(&profile.clues);
        self.suspect = Some(profile);
        true
    }

    pub fn is_suspect(&self) -> bool {
        self.suspect.is_some()
    }

    pub fn suspect_profile(&self) -> Option<&SuspectProfile> {
        self.suspect.as_ref()
    }

    pub fn template(&self) -> &CustomerTemplate {
        &self.template
    }

    pub fn name(&self) -> &str {
        &self.template.name
    }

    pub fn responses(&self) -> &DialoguePool {
        &self.responses
    }

    /// Greeting line: the suspect's override request if bound, else the template's.
    pub fn haircut_request(&self) -> &str {
        self.suspect
            .as_ref()
            .and_then(SuspectProfile::haircut_override)
            .unwrap_or(&self.template.haircut_request)
    }

    /// Pick a reply from local content (non-AI mode or collaborator fallback).
    pub fn local_reply(&self, category: DialogueCategory, rng: &mut StreamRng) -> String {
        if let Some(profile) = &self.suspect {
            if rng.chance(SUSPECT_CLUE_CHANCE) {
                if let Some(clue) = profile.clue(category, rng) {
                    return clue.to_string();
                }
            }
        }
        self.responses
            .pick(category, rng)
            .unwrap_or(SILENT_REPLY)
            .to_string()
    }

    /// Character context for the chatbot, with the secret identity appended
    /// for the bound suspect.
    pub fn personality_prompt(&self) -> String {
        let mut prompt = self.template.prompt();
        if let Some(profile) = &self.suspect {
            prompt.push_str(&format!(
                "\n\nSECRET: You are actually '{}'. You have these traits that might slip out: {}. \
                 Be subtle but occasionally hint at these traits.",
                profile.codename,
                profile.traits.join(", ")
            ));
        }
        prompt
    }

    /// Add suspicion, clamped to [0, 100]. Returns the new level.
    pub fn raise_suspicion(&mut self, delta: f64) -> f64 {
        self.suspicion_level = (self.suspicion_level + delta).clamp(0.0, MAX_SUSPICION);
        self.suspicion_level
    }

    /// Reset per-customer counters when the customer takes the chair.
    pub fn reset_turn(&mut self) {
        self.dialogue_count = 0;
        self.suspicion_level = 0.0;
    }
}
