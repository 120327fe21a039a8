//! End-of-session aggregation — the result screen's data.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every way a mission can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionFailure {
    /// Every customer was served without a correct accusation.
    SuspectSlippedAway,
    /// Reputation hit zero after false accusations.
    CoverBlown,
    /// Lost the on-foot chase.
    EscapedOnFoot,
    /// Lost the car chase.
    EscapedByCar,
}

impl SessionFailure {
    pub fn message(&self) -> &'static str {
        match self {
            Self::SuspectSlippedAway => "The suspect slipped away. Mission failed.",
            Self::CoverBlown         => "Your cover is blown! Too many false accusations.",
            Self::EscapedOnFoot      => "The suspect escaped on foot!",
            Self::EscapedByCar       => "Your vehicle was too damaged. The suspect escaped!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "result", content = "failure")]
pub enum SessionResult {
    Apprehended,
    Failed(SessionFailure),
}

impl SessionResult {
    pub fn is_victory(&self) -> bool {
        matches!(self, Self::Apprehended)
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Apprehended => "Suspect apprehended! Excellent detective work!",
            Self::Failed(f)   => f.message(),
        }
    }
}

/// Display-ready summary record. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub victory:                bool,
    pub headline:               String,
    pub message:                String,
    pub failure:                Option<SessionFailure>,
    pub suspect_codename:       String,
    pub customers_served:       usize,
    pub final_reputation:       u8,
    pub correct_identification: bool,
    pub false_accusations:      u32,
}

impl SessionOutcome {
    pub fn summarize(
        result: SessionResult,
        final_reputation: u8,
        suspect_codename: &str,
        customers_served: usize,
        correct_identification: bool,
        false_accusations: u32,
    ) -> Self {
        let victory = result.is_victory();
        Self {
            victory,
            headline: if victory { "MISSION COMPLETE" } else { "MISSION FAILED" }.to_string(),
            message: result.message().to_string(),
            failure: match result {
                SessionResult::Failed(f) => Some(f),
                SessionResult::Apprehended => None,
            },
            suspect_codename: suspect_codename.to_string(),
            customers_served,
            final_reputation,
            correct_identification,
            false_accusations,
        }
    }
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== {} ===", self.headline)?;
        writeln!(f, "  {}", self.message)?;
        writeln!(f, "  suspect:            {}", self.suspect_codename)?;
        writeln!(f, "  customers served:   {}", self.customers_served)?;
        writeln!(f, "  final reputation:   {}", "*".repeat(self.final_reputation as usize))?;
        writeln!(f, "  false accusations:  {}", self.false_accusations)?;
        write!(
            f,
            "  correct identification: {}",
            if self.correct_identification { "yes" } else { "no" }
        )
    }
}
