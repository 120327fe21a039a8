//! Haircut minigame — cutting strands to build up haircut progress.
//!
//! Strands sit on a semicircle over the customer's head. A cut removes
//! every uncut strand within the current tool's radius.
//!
//! RULE: Progress never decreases and completes exactly once per customer.

use crate::{
    error::{GameError, GameResult},
    event::GameEvent,
    rng::StreamRng,
};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

pub const MAX_PROGRESS: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HaircutTool {
    #[default]
    Scissors,
    Clippers,
    Razor,
}

impl HaircutTool {
    pub const ALL: [HaircutTool; 3] = [Self::Scissors, Self::Clippers, Self::Razor];

    pub fn radius_multiplier(&self) -> f64 {
        match self {
            Self::Scissors => 0.8,
            Self::Clippers => 1.5,
            Self::Razor    => 1.0,
        }
    }
}

impl std::str::FromStr for HaircutTool {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "scissors" => Ok(Self::Scissors),
            "clippers" => Ok(Self::Clippers),
            "razor"    => Ok(Self::Razor),
            other      => Err(GameError::InvalidConfig(format!("unknown haircut tool '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HaircutConfig {
    pub strand_count:     usize,
    pub cut_radius:       f64,
    pub progress_per_cut: f64,
}

impl Default for HaircutConfig {
    fn default() -> Self {
        Self {
            strand_count:     200,
            cut_radius:       0.5,
            progress_per_cut: 0.5,
        }
    }
}

impl HaircutConfig {
    pub fn validate(&self) -> GameResult<()> {
        if self.strand_count == 0 {
            return Err(GameError::InvalidConfig("haircut.strand_count must be positive".into()));
        }
        if self.cut_radius <= 0.0 || self.progress_per_cut < 0.0 {
            return Err(GameError::InvalidConfig(
                "haircut.cut_radius must be positive and progress_per_cut non-negative".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HairStrand {
    pub x:      f64,
    pub y:      f64,
    pub length: f64,
    pub cut:    bool,
}

#[derive(Debug, Clone)]
pub struct HaircutSession {
    config:   HaircutConfig,
    strands:  Vec<HairStrand>,
    tool:     HaircutTool,
    progress: f64,
    complete: bool,
}

impl HaircutSession {
    /// Fresh head of hair for a new customer.
    pub fn new(config: HaircutConfig, rng: &mut StreamRng) -> Self {
        let strands = (0..config.strand_count)
            .map(|_| {
                let angle = rng.range_f64(0.0, PI);
                let radius = rng.range_f64(0.8, 1.2);
                HairStrand {
                    x:      angle.cos() * radius,
                    y:      angle.sin() * radius + 0.3,
                    length: rng.range_f64(0.3, 0.6),
                    cut:    false,
                }
            })
            .collect();
        Self {
            config,
            strands,
            tool:     HaircutTool::default(),
            progress: 0.0,
            complete: false,
        }
    }

    pub fn tool(&self) -> HaircutTool {
        self.tool
    }

    pub fn set_tool(&mut self, tool: HaircutTool) -> Vec<GameEvent> {
        self.tool = tool;
        vec![GameEvent::ToolChanged { tool }]
    }

    pub fn tool_radius(&self) -> f64 {
        self.config.cut_radius * self.tool.radius_multiplier()
    }

    pub fn strands(&self) -> &[HairStrand] {
        &self.strands
    }

    pub fn strands_cut(&self) -> usize {
        self.strands.iter().filter(|s| s.cut).count()
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Cut at a point on the head. Ignored once the haircut is complete.
    pub fn cut_at(&mut self, x: f64, y: f64) -> Vec<GameEvent> {
        if self.complete {
            return Vec::new();
        }
        let radius = self.tool_radius();
        let mut cuts = 0usize;
        for strand in self.strands.iter_mut().filter(|s| !s.cut) {
            if (strand.x - x).hypot(strand.y - y) <= radius {
                strand.cut = true;
                cuts += 1;
            }
        }
        if cuts == 0 {
            return Vec::new();
        }

        let stepped = (self.progress + cuts as f64 * self.config.progress_per_cut).min(MAX_PROGRESS);
        let actual = self.strands_cut() as f64 / self.strands.len() as f64 * MAX_PROGRESS;
        self.progress = stepped.max(actual);
        if self.progress >= MAX_PROGRESS {
            self.complete = true;
        }
        log::trace!("Cut {cuts} strands with {:?}, progress {:.1}", self.tool, self.progress);
        vec![GameEvent::HaircutProgressed { progress: self.progress }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{RngBank, StreamSlot};

    fn session() -> HaircutSession {
        let mut rng = RngBank::new(5).for_stream(StreamSlot::Haircut);
        HaircutSession::new(HaircutConfig::default(), &mut rng)
    }

    #[test]
    fn strands_lie_on_the_head_arc() {
        let s = session();
        assert_eq!(s.strands().len(), 200);
        for strand in s.strands() {
            let r = strand.x.hypot(strand.y - 0.3);
            assert!((0.8..1.2).contains(&r), "strand radius {r} off the arc");
            assert!(strand.y >= 0.3);
        }
    }

    #[test]
    fn clippers_cut_wider_than_scissors() {
        let mut s = session();
        s.set_tool(HaircutTool::Clippers);
        assert_eq!(s.tool_radius(), 0.75);
        s.set_tool(HaircutTool::Scissors);
        assert!((s.tool_radius() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn sweeping_the_head_completes_once() {
        let mut s = session();
        s.set_tool(HaircutTool::Clippers);
        let mut last = 0.0;
        for i in 0..=40 {
            let angle = PI * i as f64 / 40.0;
            s.cut_at(angle.cos(), angle.sin() + 0.3);
            assert!(s.progress() >= last, "progress must not decrease");
            last = s.progress();
        }
        assert!(s.is_complete(), "a full sweep should finish the haircut");
        assert_eq!(s.progress(), 100.0);
        assert!(s.cut_at(0.0, 1.3).is_empty(), "cuts after completion are ignored");
    }

    #[test]
    fn missing_the_head_changes_nothing() {
        let mut s = session();
        assert!(s.cut_at(10.0, 10.0).is_empty());
        assert_eq!(s.progress(), 0.0);
    }
}
