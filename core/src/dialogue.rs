//! Dialogue categories and category-keyed text pools.
//!
//! Every bank of lines in the game (customer replies, suspect clues,
//! the player's canned questions, chatbot fallbacks) is a `DialoguePool`.
//! Pools that must always produce a line are checked with `validate`
//! when content is loaded, never at pick time.

use crate::{
    error::{GameError, GameResult},
    rng::StreamRng,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogueCategory {
    SmallTalk,
    Probe,
    Direct,
}

impl DialogueCategory {
    pub const ALL: [DialogueCategory; 3] = [Self::SmallTalk, Self::Probe, Self::Direct];

    /// How much suspicion one question of this category adds.
    pub fn suspicion_delta(&self) -> f64 {
        match self {
            Self::SmallTalk => 0.0,
            Self::Probe     => 10.0,
            Self::Direct    => 25.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::SmallTalk => "small_talk",
            Self::Probe     => "probe",
            Self::Direct    => "direct",
        }
    }
}

impl fmt::Display for DialogueCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for DialogueCategory {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small_talk" | "smalltalk" => Ok(Self::SmallTalk),
            "probe"                    => Ok(Self::Probe),
            "direct"                   => Ok(Self::Direct),
            other => Err(GameError::InvalidConfig(format!("unknown dialogue category '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DialoguePool {
    lines: BTreeMap<DialogueCategory, Vec<String>>,
}

impl DialoguePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used by tests and built-in content.
    pub fn with<I, S>(mut self, category: DialogueCategory, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines
            .entry(category)
            .or_default()
            .extend(lines.into_iter().map(Into::into));
        self
    }

    pub fn lines(&self, category: DialogueCategory) -> &[String] {
        self.lines.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn push(&mut self, category: DialogueCategory, line: impl Into<String>) {
        self.lines.entry(category).or_default().push(line.into());
    }

    /// Append every line of `other` to the matching category (additive merge).
    pub fn append(&mut self, other: &DialoguePool) {
        for (category, lines) in &other.lines {
            self.lines.entry(*category).or_default().extend(lines.iter().cloned());
        }
    }

    /// Uniform pick within a category. Repeats are allowed.
    pub fn pick(&self, category: DialogueCategory, rng: &mut StreamRng) -> Option<&str> {
        rng.pick(self.lines(category)).map(String::as_str)
    }

    pub fn len(&self, category: DialogueCategory) -> usize {
        self.lines(category).len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.values().all(Vec::is_empty)
    }

    /// Every category must hold at least one non-blank line.
    pub fn validate(&self, owner: &str) -> GameResult<()> {
        for category in DialogueCategory::ALL {
            if !self.lines(category).iter().any(|l| !l.trim().is_empty()) {
                return Err(GameError::EmptyPool {
                    owner: owner.to_string(),
                    category,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{RngBank, StreamSlot};

    fn pool() -> DialoguePool {
        DialoguePool::new()
            .with(DialogueCategory::SmallTalk, ["nice day"])
            .with(DialogueCategory::Probe, ["what do you do?", "where from?"])
            .with(DialogueCategory::Direct, ["you seem on edge"])
    }

    #[test]
    fn append_is_additive() {
        let mut base = pool();
        let clues = DialoguePool::new().with(DialogueCategory::Probe, ["the old neighborhood..."]);
        base.append(&clues);
        assert_eq!(base.len(DialogueCategory::Probe), 3);
        assert_eq!(base.len(DialogueCategory::SmallTalk), 1);
        assert_eq!(base.lines(DialogueCategory::Probe)[2], "the old neighborhood...");
    }

    #[test]
    fn validate_rejects_missing_category() {
        let partial = DialoguePool::new().with(DialogueCategory::SmallTalk, ["hi"]);
        let err = partial.validate("Mike").unwrap_err();
        assert!(matches!(err, GameError::EmptyPool { category: DialogueCategory::Probe, .. }));
        assert!(pool().validate("Mike").is_ok());
    }

    #[test]
    fn pick_stays_within_category() {
        let p = pool();
        let mut rng = RngBank::new(5).for_stream(StreamSlot::Dialogue);
        for _ in 0..50 {
            let line = p.pick(DialogueCategory::Probe, &mut rng).unwrap();
            assert!(p.lines(DialogueCategory::Probe).iter().any(|l| l == line));
        }
        assert!(DialoguePool::new().pick(DialogueCategory::Direct, &mut rng).is_none());
    }

    #[test]
    fn pool_json_uses_category_keys() {
        let json = r#"{"small_talk":["a"],"probe":["b"],"direct":["c"]}"#;
        let p: DialoguePool = serde_json::from_str(json).unwrap();
        assert_eq!(p.lines(DialogueCategory::Direct), ["c".to_string()]);
        assert_eq!("smalltalk".parse::<DialogueCategory>().unwrap(), DialogueCategory::SmallTalk);
    }

    #[test]
    fn suspicion_deltas_escalate() {
        assert_eq!(DialogueCategory::SmallTalk.suspicion_delta(), 0.0);
        assert_eq!(DialogueCategory::Probe.suspicion_delta(), 10.0);
        assert_eq!(DialogueCategory::Direct.suspicion_delta(), 25.0);
    }
}
