use std::collections::BTreeMap;

use crate::engine::analyzer::clamp_unit;
use crate::engine::difficulty::Difficulty;
use crate::engine::topic::Topic;

pub const DEFAULT_ALPHA: f64 = 0.3;

/// Composite key of the mastery store.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SkillKey {
    pub topic: Topic,
    pub difficulty: Difficulty,
}

impl SkillKey {
    pub fn new(topic: Topic, difficulty: Difficulty) -> Self {
        Self { topic, difficulty }
    }
}

/// Per (topic, difficulty) mastery, smoothed with an exponential moving average.
///
/// Pairs that were never updated are absent rather than zero.
#[derive(Clone, Debug)]
pub struct SkillMatrix {
    entries: BTreeMap<SkillKey, f64>,
    alpha: f64,
}

impl Default for SkillMatrix {
    fn default() -> Self {
        Self::with_alpha(DEFAULT_ALPHA)
    }
}

// Smoothing is configuration, not state.
impl PartialEq for SkillMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl SkillMatrix {
    pub fn with_alpha(alpha: f64) -> Self {
        let mut matrix = Self {
            entries: BTreeMap::new(),
            alpha: DEFAULT_ALPHA,
        };
        matrix.set_alpha(alpha);
        matrix
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Alpha outside (0, 1] falls back to the default.
    pub fn set_alpha(&mut self, alpha: f64) {
        self.alpha = if alpha.is_finite() && alpha > 0.0 && alpha <= 1.0 {
            alpha
        } else {
            DEFAULT_ALPHA
        };
    }

    /// Fold one performance score into mastery and return the new value.
    pub fn update(&mut self, topic: &Topic, difficulty: Difficulty, performance: f64) -> f64 {
        let performance = clamp_unit(performance);
        let alpha = self.alpha;
        let mastery = self
            .entries
            .entry(SkillKey::new(topic.clone(), difficulty))
            .and_modify(|m| *m = (1.0 - alpha) * *m + alpha * performance)
            .or_insert(performance);
        *mastery = clamp_unit(*mastery);
        *mastery
    }

    pub fn get(&self, topic: &Topic, difficulty: Difficulty) -> Option<f64> {
        self.entries
            .get(&SkillKey::new(topic.clone(), difficulty))
            .copied()
    }

    /// Store a mastery value directly, e.g. when rebuilding persisted state.
    pub fn insert(&mut self, topic: Topic, difficulty: Difficulty, mastery: f64) {
        self.entries
            .insert(SkillKey::new(topic, difficulty), clamp_unit(mastery));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SkillKey, f64)> {
        self.entries.iter().map(|(k, &v)| (k, v))
    }

    /// Distinct topics in canonical-key order.
    pub fn topics(&self) -> Vec<&Topic> {
        let mut topics: Vec<&Topic> = Vec::new();
        for key in self.entries.keys() {
            if topics.last() != Some(&&key.topic) {
                topics.push(&key.topic);
            }
        }
        topics
    }

    pub fn contains_topic(&self, topic: &Topic) -> bool {
        self.entries.keys().any(|k| &k.topic == topic)
    }

    /// Recorded (difficulty, mastery) pairs for one topic, easiest first.
    pub fn levels(&self, topic: &Topic) -> Vec<(Difficulty, f64)> {
        self.entries
            .iter()
            .filter(|(k, _)| &k.topic == topic)
            .map(|(k, &v)| (k.difficulty, v))
            .collect()
    }

    pub fn topic_mean(&self, topic: &Topic) -> Option<f64> {
        let levels = self.levels(topic);
        if levels.is_empty() {
            return None;
        }
        Some(levels.iter().map(|(_, m)| m).sum::<f64>() / levels.len() as f64)
    }

    pub fn topic_min(&self, topic: &Topic) -> Option<f64> {
        self.levels(topic).into_iter().map(|(_, m)| m).reduce(f64::min)
    }

    pub fn highest_level(&self, topic: &Topic) -> Option<Difficulty> {
        self.levels(topic).into_iter().map(|(d, _)| d).max()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
