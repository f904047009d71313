use std::collections::HashSet;

use serde::Serialize;

use crate::engine::difficulty::Difficulty;
use crate::engine::state::EngineState;
use crate::engine::topic::{Topic, canonical_key};

pub const DEFAULT_ZPD_LOWER: f64 = 0.4;
pub const DEFAULT_ZPD_UPPER: f64 = 0.7;
pub const DEFAULT_SEED_TOPIC: &str = "Space";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    TooEasy,
    Zpd,
    TooHard,
}

/// One candidate topic with the evidence behind its rank.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TopicRanking {
    pub topic: Topic,
    pub difficulty: Difficulty,
    pub mastery: f64,
    /// False when the current level has no record and the topic mean was used.
    pub measured_at_current: bool,
    pub zone: Zone,
    pub interest: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TopicRecommender {
    pub zpd_lower: f64,
    pub zpd_upper: f64,
    pub seed_topic: String,
    pub catalog: Vec<String>,
}

impl Default for TopicRecommender {
    fn default() -> Self {
        Self {
            zpd_lower: DEFAULT_ZPD_LOWER,
            zpd_upper: DEFAULT_ZPD_UPPER,
            seed_topic: DEFAULT_SEED_TOPIC.to_string(),
            catalog: Vec::new(),
        }
    }
}

fn key_set(names: &[String]) -> HashSet<String> {
    names
        .iter()
        .map(|n| canonical_key(n))
        .filter(|k| !k.is_empty())
        .collect()
}

impl TopicRecommender {
    pub fn classify(&self, mastery: f64) -> Zone {
        if mastery > self.zpd_upper {
            Zone::TooEasy
        } else if mastery < self.zpd_lower {
            Zone::TooHard
        } else {
            Zone::Zpd
        }
    }

    /// Every tracked topic not in `recent_topics`, best suggestion first.
    ///
    /// In-zone topics the learner is interested in come first, then other
    /// in-zone topics, both in name order. Out-of-zone topics follow, the one
    /// with the weakest recorded level first.
    pub fn rank_topics(
        &self,
        state: &EngineState,
        recent_topics: &[String],
        interests: &[String],
    ) -> Vec<TopicRanking> {
        let recent = key_set(recent_topics);
        let interested = key_set(interests);
        let matrix = &state.skill_matrix;

        let mut ranked: Vec<(TopicRanking, f64)> = matrix
            .topics()
            .into_iter()
            .filter(|t| !recent.contains(t.key()))
            .filter_map(|topic| {
                let difficulty = state.difficulties.peek(topic);
                let (mastery, measured) = match matrix.get(topic, difficulty) {
                    Some(m) => (m, true),
                    None => (matrix.topic_mean(topic)?, false),
                };
                let weakest = matrix.topic_min(topic)?;
                Some((
                    TopicRanking {
                        topic: topic.clone(),
                        difficulty,
                        mastery,
                        measured_at_current: measured,
                        zone: self.classify(mastery),
                        interest: interested.contains(topic.key()),
                    },
                    weakest,
                ))
            })
            .collect();

        ranked.sort_by(|(a, a_min), (b, b_min)| {
            group(a)
                .cmp(&group(b))
                .then_with(|| {
                    if a.zone == Zone::Zpd {
                        std::cmp::Ordering::Equal
                    } else {
                        a_min.total_cmp(b_min)
                    }
                })
                .then_with(|| a.topic.cmp(&b.topic))
        });

        ranked.into_iter().map(|(r, _)| r).collect()
    }

    pub fn suggest_next_topic(
        &self,
        state: &EngineState,
        recent_topics: &[String],
        interests: &[String],
    ) -> Topic {
        if state.skill_matrix.is_empty() {
            return self.seed();
        }

        let ranked = self.rank_topics(state, recent_topics, interests);
        if let Some(best) = ranked.first() {
            if best.zone == Zone::Zpd {
                return best.topic.clone();
            }
            return self.weakest(state, &ranked);
        }

        // Every tracked topic was covered recently: reach for something new.
        let recent = key_set(recent_topics);
        interests
            .iter()
            .chain(self.catalog.iter())
            .filter_map(|name| Topic::parse(name))
            .find(|t| !recent.contains(t.key()))
            .unwrap_or_else(|| self.seed())
    }

    fn weakest(&self, state: &EngineState, ranked: &[TopicRanking]) -> Topic {
        ranked
            .iter()
            .filter_map(|r| {
                state
                    .skill_matrix
                    .topic_min(&r.topic)
                    .map(|m| (m, &r.topic))
            })
            .min_by(|(a, at), (b, bt)| a.total_cmp(b).then_with(|| at.cmp(bt)))
            .map(|(_, t)| t.clone())
            .unwrap_or_else(|| self.seed())
    }

    fn seed(&self) -> Topic {
        Topic::parse_or(&self.seed_topic, DEFAULT_SEED_TOPIC)
    }
}

fn group(r: &TopicRanking) -> u8 {
    match (r.zone, r.interest) {
        (Zone::Zpd, true) => 0,
        (Zone::Zpd, false) => 1,
        _ => 2,
    }
}
