use crate::engine::difficulty::{Difficulty, Transition};
use crate::engine::matrix::SkillMatrix;
use crate::engine::topic::Topic;

pub const DEFAULT_LEVEL_UP: f64 = 0.8;
pub const DEFAULT_LEVEL_DOWN: f64 = 0.4;

/// Zone-of-proximal-development pacing for a single topic.
///
/// Mastery strictly above `level_up` moves one tier harder, strictly below
/// `level_down` moves one tier easier; anything in between (boundaries
/// included) stays put. Missing evidence also stays put.
#[derive(Clone, Debug, PartialEq)]
pub struct DifficultyAdvisor {
    pub level_up: f64,
    pub level_down: f64,
}

impl Default for DifficultyAdvisor {
    fn default() -> Self {
        Self {
            level_up: DEFAULT_LEVEL_UP,
            level_down: DEFAULT_LEVEL_DOWN,
        }
    }
}

impl DifficultyAdvisor {
    pub fn new(level_up: f64, level_down: f64) -> Self {
        Self {
            level_up,
            level_down,
        }
    }

    pub fn decide(&self, mastery: Option<f64>, current: Difficulty) -> Transition {
        match mastery {
            Some(m) if m > self.level_up && !current.is_max() => Transition::LevelUp,
            Some(m) if m < self.level_down && !current.is_min() => Transition::LevelDown,
            _ => Transition::Stay,
        }
    }

    pub fn next_difficulty(
        &self,
        matrix: &SkillMatrix,
        topic: &Topic,
        current: Difficulty,
    ) -> Difficulty {
        match self.decide(matrix.get(topic, current), current) {
            Transition::LevelUp => current.harder(),
            Transition::LevelDown => current.easier(),
            Transition::Stay => current,
        }
    }
}
