use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::engine::analyzer::ResponseScores;
use crate::engine::difficulty::Difficulty;
use crate::engine::matrix::SkillMatrix;
use crate::engine::topic::Topic;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// One scored learner response. Fields are read-only once constructed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Assessment {
    timestamp: DateTime<Utc>,
    topic: Topic,
    difficulty: Difficulty,
    comprehension_score: f64,
    curiosity_score: f64,
    confidence_score: f64,
}

impl Assessment {
    pub fn new(
        timestamp: DateTime<Utc>,
        topic: Topic,
        difficulty: Difficulty,
        scores: ResponseScores,
    ) -> Self {
        let scores = scores.clamped();
        Self {
            timestamp,
            topic,
            difficulty,
            comprehension_score: scores.comprehension,
            curiosity_score: scores.curiosity,
            confidence_score: scores.confidence,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn comprehension(&self) -> f64 {
        self.comprehension_score
    }

    pub fn curiosity(&self) -> f64 {
        self.curiosity_score
    }

    pub fn confidence(&self) -> f64 {
        self.confidence_score
    }

    pub fn scores(&self) -> ResponseScores {
        ResponseScores {
            comprehension: self.comprehension_score,
            curiosity: self.curiosity_score,
            confidence: self.confidence_score,
        }
    }
}

/// Most recent assessments, oldest first, bounded by `limit` (FIFO eviction).
#[derive(Clone, Debug)]
pub struct ComprehensionHistory {
    entries: VecDeque<Assessment>,
    limit: usize,
}

impl Default for ComprehensionHistory {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl PartialEq for ComprehensionHistory {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl ComprehensionHistory {
    pub fn with_limit(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            entries: VecDeque::with_capacity(limit),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Shrinking the limit evicts the oldest entries immediately.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        self.evict();
    }

    pub fn push(&mut self, assessment: Assessment) {
        self.entries.push_back(assessment);
        self.evict();
    }

    fn evict(&mut self) {
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Assessment> {
        self.entries.iter()
    }

    pub fn oldest(&self) -> Option<&Assessment> {
        self.entries.front()
    }

    pub fn latest(&self) -> Option<&Assessment> {
        self.entries.back()
    }

    /// The last `n` assessments in insertion order.
    pub fn recent(&self, n: usize) -> Vec<Assessment> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn to_vec(&self) -> Vec<Assessment> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Active difficulty per topic.
#[derive(Clone, Debug, PartialEq)]
pub struct CurrentDifficultyMap {
    levels: BTreeMap<Topic, Difficulty>,
    initial: Difficulty,
}

impl Default for CurrentDifficultyMap {
    fn default() -> Self {
        Self::with_initial(Difficulty::ELEMENTARY)
    }
}

impl CurrentDifficultyMap {
    pub fn with_initial(initial: Difficulty) -> Self {
        Self {
            levels: BTreeMap::new(),
            initial,
        }
    }

    pub fn initial(&self) -> Difficulty {
        self.initial
    }

    pub fn set_initial(&mut self, initial: Difficulty) {
        self.initial = initial;
    }

    /// Current level, recording the initial level on first reference.
    pub fn current(&mut self, topic: &Topic) -> Difficulty {
        *self.levels.entry(topic.clone()).or_insert(self.initial)
    }

    /// Current level without recording a first reference.
    pub fn peek(&self, topic: &Topic) -> Difficulty {
        self.levels.get(topic).copied().unwrap_or(self.initial)
    }

    pub fn get(&self, topic: &Topic) -> Option<Difficulty> {
        self.levels.get(topic).copied()
    }

    pub fn set(&mut self, topic: &Topic, difficulty: Difficulty) {
        self.levels.insert(topic.clone(), difficulty);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Topic, Difficulty)> {
        self.levels.iter().map(|(t, &d)| (t, d))
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn clear(&mut self) {
        self.levels.clear();
    }
}

/// Everything persisted for one learner.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EngineState {
    pub skill_matrix: SkillMatrix,
    pub history: ComprehensionHistory,
    pub difficulties: CurrentDifficultyMap,
}

impl EngineState {
    /// Restore fresh-state defaults, keeping configured limits.
    pub fn reset(&mut self) {
        self.skill_matrix.clear();
        self.history.clear();
        self.difficulties.clear();
    }

    pub fn is_fresh(&self) -> bool {
        self.skill_matrix.is_empty() && self.history.is_empty() && self.difficulties.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn assessment(i: i64, comprehension: f64) -> Assessment {
        Assessment::new(
            Utc.timestamp_opt(1_700_000_000 + i, 0).unwrap(),
            Topic::parse("Math").unwrap(),
            Difficulty::ELEMENTARY,
            ResponseScores {
                comprehension,
                curiosity: 0.5,
                confidence: 0.5,
            },
        )
    }

    #[test]
    fn test_history_evicts_oldest_after_limit() {
        let mut history = ComprehensionHistory::default();
        for i in 0..51 {
            history.push(assessment(i, 0.5));
        }
        assert_eq!(history.len(), 50);
        assert_eq!(history.oldest().unwrap(), &assessment(1, 0.5));
        assert_eq!(history.latest().unwrap(), &assessment(50, 0.5));
    }

    #[test]
    fn test_history_limit_never_zero() {
        let mut history = ComprehensionHistory::with_limit(0);
        history.push(assessment(0, 0.5));
        history.push(assessment(1, 0.5));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_shrinking_limit_evicts() {
        let mut history = ComprehensionHistory::default();
        for i in 0..10 {
            history.push(assessment(i, 0.5));
        }
        history.set_limit(3);
        assert_eq!(history.len(), 3);
        assert_eq!(history.oldest().unwrap(), &assessment(7, 0.5));
    }

    #[test]
    fn test_recent_keeps_order() {
        let mut history = ComprehensionHistory::default();
        for i in 0..6 {
            history.push(assessment(i, i as f64 / 10.0));
        }
        let recent: Vec<f64> = history.recent(3).iter().map(|a| a.comprehension()).collect();
        assert_eq!(recent, vec![0.3, 0.4, 0.5]);
        assert_eq!(history.recent(100).len(), 6);
    }

    #[test]
    fn test_assessment_clamps_scores() {
        let a = assessment(0, 4.0);
        assert_eq!(a.comprehension(), 1.0);
    }

    #[test]
    fn test_difficulty_defaults_to_elementary_on_first_reference() {
        let mut map = CurrentDifficultyMap::default();
        let t = Topic::parse("Oceans").unwrap();
        assert!(map.get(&t).is_none());
        assert_eq!(map.peek(&t), Difficulty::ELEMENTARY);
        assert!(map.is_empty());
        assert_eq!(map.current(&t), Difficulty::ELEMENTARY);
        assert_eq!(map.get(&t), Some(Difficulty::ELEMENTARY));
    }

    #[test]
    fn test_reset_restores_fresh_state() {
        let mut state = EngineState::default();
        let t = Topic::parse("Math").unwrap();
        state.skill_matrix.update(&t, Difficulty::ELEMENTARY, 0.9);
        state.history.push(assessment(0, 0.9));
        state.difficulties.set(&t, Difficulty::ADVANCED);
        assert!(!state.is_fresh());
        state.reset();
        assert!(state.is_fresh());
        assert_eq!(state, EngineState::default());
    }
}
