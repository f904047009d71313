use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 5;

/// Content difficulty tier, always within 1..=5.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Difficulty(u8);

impl Difficulty {
    pub const BEGINNER: Difficulty = Difficulty(1);
    pub const ELEMENTARY: Difficulty = Difficulty(2);
    pub const INTERMEDIATE: Difficulty = Difficulty(3);
    pub const ADVANCED: Difficulty = Difficulty(4);
    pub const EXPERT: Difficulty = Difficulty(5);

    /// Clamp any integer into the valid range.
    pub fn clamped(level: i64) -> Self {
        Self(level.clamp(MIN_LEVEL as i64, MAX_LEVEL as i64) as u8)
    }

    pub fn new(level: u8) -> Option<Self> {
        (MIN_LEVEL..=MAX_LEVEL).contains(&level).then_some(Self(level))
    }

    pub fn try_from_level(level: i64) -> Option<Self> {
        u8::try_from(level).ok().and_then(Self::new)
    }

    pub fn level(self) -> u8 {
        self.0
    }

    pub fn harder(self) -> Self {
        Self((self.0 + 1).min(MAX_LEVEL))
    }

    pub fn easier(self) -> Self {
        Self((self.0 - 1).max(MIN_LEVEL))
    }

    pub fn is_max(self) -> bool {
        self.0 == MAX_LEVEL
    }

    pub fn is_min(self) -> bool {
        self.0 == MIN_LEVEL
    }

    pub fn name(self) -> &'static str {
        match self.0 {
            1 => "beginner",
            2 => "elementary",
            3 => "intermediate",
            4 => "advanced",
            _ => "expert",
        }
    }

    /// Target vocabulary complexity for generated content at this tier.
    pub fn description(self) -> &'static str {
        match self.0 {
            1 => "foundational concepts using everyday examples",
            2 => "elementary principles with hands-on connections",
            3 => "intermediate ideas with real-world applications",
            4 => "advanced concepts with critical thinking challenges",
            _ => "expert-level exploration with creative problem-solving",
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::ELEMENTARY
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for Difficulty {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.0)
    }
}

// Persisted levels are untrusted; out-of-range values are clamped rather than rejected.
impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Ok(Self::clamped(raw))
    }
}

/// Outcome of one difficulty decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    LevelUp,
    LevelDown,
    Stay,
}

impl Transition {
    pub fn between(from: Difficulty, to: Difficulty) -> Self {
        match to.cmp(&from) {
            std::cmp::Ordering::Greater => Transition::LevelUp,
            std::cmp::Ordering::Less => Transition::LevelDown,
            std::cmp::Ordering::Equal => Transition::Stay,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Transition::LevelUp => "level up",
            Transition::LevelDown => "level down",
            Transition::Stay => "stay",
        }
    }
}
