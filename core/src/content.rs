//! Static narrative content: suspect profiles, customer templates and the
//! player's script.
//!
//! RULE: Content is immutable once loaded. Per-session mutable state lives
//! on `CustomerInstance` and `DeductionSession`, never here.
//!
//! Files (under the data directory):
//!   suspects.json   — { "suspects":  [SuspectProfile, ..] }
//!   customers.json  — { "customers": [CustomerTemplate, ..] }
//!   script.json     — NarrativeScript

use crate::{
    config::read_json,
    dialogue::{DialogueCategory, DialoguePool},
    error::{GameError, GameResult},
    rng::StreamRng,
};
use serde::{Deserialize, Serialize};

// ── Suspects ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspectProfile {
    pub codename:   String,
    pub traits:     Vec<String>,
    pub background: String,
    /// Clue lines per category. A category may be empty.
    #[serde(default)]
    pub clues:      DialoguePool,
    #[serde(default)]
    pub special_haircut_request: Option<String>,
}

impl SuspectProfile {
    pub fn clue(&self, category: DialogueCategory, rng: &mut StreamRng) -> Option<&str> {
        self.clues.pick(category, rng)
    }

    /// The override greeting, if the profile carries a non-blank one.
    pub fn haircut_override(&self) -> Option<&str> {
        self.special_haircut_request
            .as_deref()
            .filter(|r| !r.trim().is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct SuspectsFile {
    suspects: Vec<SuspectProfile>,
}

// ── Customers ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    Friendly,
    Gruff,
    Nervous,
    Confident,
    Chatty,
    Mysterious,
}

impl Personality {
    fn default_prompt(&self) -> &'static str {
        match self {
            Self::Friendly   => "You are warm and open, happy to chat about anything.",
            Self::Gruff      => "You are short-tempered and give clipped answers. You dislike nosy questions.",
            Self::Nervous    => "You are jumpy and evasive, often trailing off mid-sentence.",
            Self::Confident  => "You are self-assured and talk about business and success.",
            Self::Chatty     => "You are talkative and enthusiastic, and overshare freely.",
            Self::Mysterious => "You are guarded and cryptic, answering questions with questions.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerTemplate {
    pub name:            String,
    #[serde(default)]
    pub avatar:          String,
    pub personality:     Personality,
    pub haircut_request: String,
    pub responses:       DialoguePool,
    #[serde(default)]
    pub personality_prompt: Option<String>,
}

impl CustomerTemplate {
    /// Character context handed to the chatbot collaborator.
    pub fn prompt(&self) -> String {
        match self.personality_prompt.as_deref() {
            Some(p) if !p.trim().is_empty() => p.to_string(),
            _ => format!("Your name is {}. {}", self.name, self.personality.default_prompt()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct CustomersFile {
    customers: Vec<CustomerTemplate>,
}

// ── Player script ──────────────────────────────────────────────────

/// Fixed narrative lines and the player's canned question banks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrativeScript {
    pub player_lines:          DialoguePool,
    /// Category-appropriate replies used when the chatbot cannot answer.
    pub fallback_replies:      DialoguePool,
    pub hunches:               Vec<String>,
    pub suspicious_remark:     String,
    pub welcome:               String,
    pub limit_notice:          String,
    pub arrest_shout:          String,
    pub arrest_reaction:       String,
    pub false_arrest_shout:    String,
    pub false_arrest_reaction: String,
    pub false_arrest_notice:   String,
    pub apology_notice:        String,
    pub haircut_thanks:        String,
    pub getaway_notice:        String,
}

impl Default for NarrativeScript {
    fn default() -> Self {
        use DialogueCategory::*;
        Self {
            player_lines: DialoguePool::new()
                .with(SmallTalk, ["So, nice weather today...", "Catch any good games lately?", "Come here often?"])
                .with(Probe, ["What do you do for work?", "You from around here?", "Family man?"])
                .with(Direct, [
                    "You seem a bit on edge...",
                    "You look familiar. Been in trouble before?",
                    "What brings you to this neighborhood?",
                ]),
            fallback_replies: DialoguePool::new()
                .with(SmallTalk, ["Yeah, nice day isn't it?", "Can't complain, I suppose.", "Mmhmm, sure is."])
                .with(Probe, ["Oh, you know, this and that.", "Nothing too exciting.", "I keep busy."])
                .with(Direct, ["That's a strange question...", "Why do you ask?", "I'd rather not say."]),
            hunches: vec![
                "Hmm, something about this one...".into(),
                "Wait, that matches the briefing...".into(),
                "Could this be our suspect?".into(),
                "That trait seems familiar...".into(),
            ],
            suspicious_remark:     "*eyes narrow* You ask a lot of questions for a barber...".into(),
            welcome:               "Welcome to Clip Joint. Your first customer will arrive shortly...".into(),
            limit_notice:          "Time to make a decision about this customer...".into(),
            arrest_shout:          "FREEZE! Police! You're under arrest!".into(),
            arrest_reaction:       "What?! You're a cop?! *knocks chair over and runs*".into(),
            false_arrest_shout:    "Hold it right there!".into(),
            false_arrest_reaction: "What?! What did I do?!".into(),
            false_arrest_notice:   "This customer is innocent. You've made a mistake...".into(),
            apology_notice:        "Apologize and continue. The real suspect is still out there.".into(),
            haircut_thanks:        "Looking good! Thanks for the cut.".into(),
            getaway_notice:        "Suspect is getting into a vehicle! Get to your car!".into(),
        }
    }
}

impl NarrativeScript {
    pub fn validate(&self) -> GameResult<()> {
        self.player_lines.validate("player_lines")?;
        self.fallback_replies.validate("fallback_replies")?;
        if self.hunches.is_empty() {
            return Err(GameError::InvalidConfig("script has no hunch lines".into()));
        }
        Ok(())
    }
}

// ── Catalog ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ContentCatalog {
    pub suspects:  Vec<SuspectProfile>,
    pub customers: Vec<CustomerTemplate>,
    pub script:    NarrativeScript,
}

impl ContentCatalog {
    /// Load from the data/ directory and validate.
    /// In tests, use ContentCatalog::default_test().
    pub fn load(data_dir: &str) -> GameResult<Self> {
        let suspects: SuspectsFile = read_json(&format!("{data_dir}/suspects.json"))?;
        let customers: CustomersFile = read_json(&format!("{data_dir}/customers.json"))?;
        let script: NarrativeScript = read_json(&format!("{data_dir}/script.json"))?;

        let catalog = Self {
            suspects:  suspects.suspects,
            customers: customers.customers,
            script,
        };
        catalog.validate()?;
        log::info!(
            "Content loaded: {} suspects, {} customer templates",
            catalog.suspects.len(),
            catalog.customers.len()
        );
        Ok(catalog)
    }

    /// Reject content the deduction loop cannot play.
    pub fn validate(&self) -> GameResult<()> {
        if self.suspects.is_empty() {
            return Err(GameError::NoSuspects);
        }
        if self.customers.is_empty() {
            return Err(GameError::InsufficientTemplates { requested: 1, available: 0 });
        }
        for customer in &self.customers {
            customer.responses.validate(&customer.name)?;
        }
        for suspect in &self.suspects {
            if suspect.codename.trim().is_empty() {
                return Err(GameError::InvalidConfig("suspect profile with blank codename".into()));
            }
            if suspect.clues.is_empty() {
                log::warn!("Suspect '{}' has no clue lines at all", suspect.codename);
            }
        }
        self.script.validate()
    }

    /// Small built-in catalog for tests.
    pub fn default_test() -> Self {
        use DialogueCategory::*;

        let suspects = vec![
            SuspectProfile {
                codename:   "The Clipper".into(),
                traits:     vec!["Scar on left cheek".into(), "Tips excessively with cash".into()],
                background: "Runs an underground gambling ring.".into(),
                clues: DialoguePool::new()
                    .with(SmallTalk, ["*touches scar* Got this in the old neighborhood..."])
                    .with(Probe, ["The old neighborhood... different times."])
                    .with(Direct, ["*flinches at a siren* ...What? Nothing."]),
                special_haircut_request: Some("Clean it up. *hands over a wad of cash*".into()),
            },
            SuspectProfile {
                codename:   "Slick Eddie".into(),
                traits:     vec!["Expensive watch".into(), "Constantly checks phone".into()],
                background: "Launders money through local businesses.".into(),
                clues: DialoguePool::new()
                    .with(SmallTalk, ["*checks watch* Time is money."])
                    .with(Probe, ["Business meetings, always business meetings."]),
                special_haircut_request: None,
            },
            SuspectProfile {
                codename:   "The Professor".into(),
                traits:     vec!["Overly formal language".into(), "Avoids eye contact".into()],
                background: "Art theft ring mastermind.".into(),
                clues: DialoguePool::new()
                    .with(SmallTalk, ["This building dates back to 1923. Fascinating."])
                    .with(Probe, ["*avoids eye contact* Academic pursuits, nothing more."])
                    .with(Direct, ["Exactly two inches off the sides. Precisely."]),
                special_haircut_request: Some("Exactly 2 inches off the sides, 1.5 on top.".into()),
            },
        ];

        let customers = vec![
            test_template("Mike Thompson", Personality::Friendly, "Just a trim.",
                "Beautiful weather, eh?", "I work in accounting.", "I'm an open book!"),
            test_template("Tony Deluca", Personality::Gruff, "The usual.",
                "*grunts* Weather's fine.", "Retired. Construction.", "Just cut my hair."),
            test_template("Derek Williams", Personality::Nervous, "Something professional?",
                "Yeah... nice weather.", "I'm... in sales.", "Why would you ask that?"),
            test_template("James Chen", Personality::Confident, "Executive cut.",
                "Perfect day for closing deals!", "Finance. NDAs.", "Everyone has secrets."),
            test_template("Robert Martinez", Personality::Chatty, "Fade on the sides!",
                "Reminds me of my hometown!", "I'm a DJ at Club Velvet!", "Nah man, just vibing!"),
            test_template("Vera Lang", Personality::Mysterious, "Surprise me.",
                "Is it, though?", "Here and there.", "Who's asking?"),
        ];

        Self {
            suspects,
            customers,
            script: NarrativeScript::default(),
        }
    }
}

fn test_template(
    name: &str,
    personality: Personality,
    request: &str,
    small_talk: &str,
    probe: &str,
    direct: &str,
) -> CustomerTemplate {
    CustomerTemplate {
        name:            name.into(),
        avatar:          String::new(),
        personality,
        haircut_request: request.into(),
        responses: DialoguePool::new()
            .with(DialogueCategory::SmallTalk, [small_talk])
            .with(DialogueCategory::Probe, [probe])
            .with(DialogueCategory::Direct, [direct]),
        personality_prompt: None,
    }
}
