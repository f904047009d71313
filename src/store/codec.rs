use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use crate::config::Config;
use crate::engine::analyzer::{NEUTRAL_SCORE, ResponseScores, clamp_unit};
use crate::engine::difficulty::Difficulty;
use crate::engine::matrix::{DEFAULT_ALPHA, SkillMatrix};
use crate::engine::state::{
    Assessment, ComprehensionHistory, CurrentDifficultyMap, DEFAULT_HISTORY_LIMIT, EngineState,
};
use crate::engine::topic::Topic;
use crate::store::StoreError;
use crate::store::schema::{
    LEGACY_FIELDS, LegacyAssessment, LegacyState, PersistedAssessment, PersistedState,
    STATE_SCHEMA_VERSION,
};

const DEFAULT_FALLBACK_TOPIC: &str = "General Knowledge";

/// Why a blob could not be used and a fresh state was returned instead.
#[derive(Clone, Debug, PartialEq)]
pub enum Recovery {
    Empty,
    Malformed(String),
    UnsupportedVersion(u64),
    ShapeMismatch(String),
}

impl fmt::Display for Recovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recovery::Empty => write!(f, "empty state blob"),
            Recovery::Malformed(e) => write!(f, "malformed state blob: {e}"),
            Recovery::UnsupportedVersion(v) => write!(f, "unsupported schema version {v}"),
            Recovery::ShapeMismatch(e) => write!(f, "unexpected state shape: {e}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Decoded {
    pub state: EngineState,
    pub recovery: Option<Recovery>,
}

/// Converts engine state to and from its persisted JSON form.
///
/// Decoding never fails: unusable blobs produce a fresh state and a
/// [`Recovery`], and individual out-of-range values are repaired.
#[derive(Clone, Debug)]
pub struct StateCodec {
    history_limit: usize,
    alpha: f64,
    initial_difficulty: Difficulty,
    fallback_topic: String,
}

impl Default for StateCodec {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            alpha: DEFAULT_ALPHA,
            initial_difficulty: Difficulty::ELEMENTARY,
            fallback_topic: DEFAULT_FALLBACK_TOPIC.to_string(),
        }
    }
}

impl StateCodec {
    pub fn from_config(config: &Config) -> Self {
        Self {
            history_limit: config.history_limit.max(1),
            alpha: config.smoothing_alpha,
            initial_difficulty: Difficulty::clamped(config.default_difficulty),
            fallback_topic: config.fallback_topic.clone(),
        }
    }

    pub fn encode(&self, state: &EngineState) -> Result<String, StoreError> {
        self.encode_at(state, Utc::now())
    }

    pub fn encode_at(
        &self,
        state: &EngineState,
        saved_at: DateTime<Utc>,
    ) -> Result<String, StoreError> {
        let mut persisted = PersistedState {
            schema_version: STATE_SCHEMA_VERSION,
            saved_at,
            skill_matrix: Default::default(),
            history: Vec::with_capacity(state.history.len()),
            current_difficulty: Default::default(),
        };
        for (key, mastery) in state.skill_matrix.iter() {
            persisted
                .skill_matrix
                .entry(key.topic.label().to_string())
                .or_default()
                .insert(i64::from(key.difficulty.level()), mastery);
        }
        for a in state.history.iter() {
            persisted.history.push(PersistedAssessment {
                timestamp: a.timestamp(),
                topic: a.topic().label().to_string(),
                difficulty: i64::from(a.difficulty().level()),
                comprehension_score: a.comprehension(),
                curiosity_score: a.curiosity(),
                confidence_score: a.confidence(),
            });
        }
        for (topic, difficulty) in state.difficulties.iter() {
            persisted
                .current_difficulty
                .insert(topic.label().to_string(), i64::from(difficulty.level()));
        }
        Ok(serde_json::to_string(&persisted)?)
    }

    pub fn decode(&self, blob: &str) -> Decoded {
        match self.try_decode(blob) {
            Ok(state) => Decoded {
                state,
                recovery: None,
            },
            Err(recovery) => {
                tracing::warn!(reason = %recovery, "discarding persisted state");
                Decoded {
                    state: self.fresh(),
                    recovery: Some(recovery),
                }
            }
        }
    }

    pub fn fresh(&self) -> EngineState {
        EngineState {
            skill_matrix: SkillMatrix::with_alpha(self.alpha),
            history: ComprehensionHistory::with_limit(self.history_limit),
            difficulties: CurrentDifficultyMap::with_initial(self.initial_difficulty),
        }
    }

    fn try_decode(&self, blob: &str) -> Result<EngineState, Recovery> {
        if blob.trim().is_empty() {
            return Err(Recovery::Empty);
        }
        let value: Value =
            serde_json::from_str(blob).map_err(|e| Recovery::Malformed(e.to_string()))?;
        let Value::Object(fields) = &value else {
            return Err(Recovery::ShapeMismatch("expected a JSON object".to_string()));
        };

        let version = fields
            .get("schema_version")
            .map(|v| v.as_u64().ok_or_else(|| v.to_string()));
        // `{}` is what the unversioned writer left behind on failure.
        let legacy_shape =
            fields.is_empty() || LEGACY_FIELDS.iter().any(|k| fields.contains_key(*k));

        match version {
            None if !legacy_shape => Err(Recovery::ShapeMismatch(
                "no schema_version and none of the legacy fields".to_string(),
            )),
            None => {
                let legacy: LegacyState = serde_json::from_value(value)
                    .map_err(|e| Recovery::ShapeMismatch(e.to_string()))?;
                Ok(self.migrate_legacy(legacy))
            }
            Some(Ok(v)) if v == u64::from(STATE_SCHEMA_VERSION) => {
                let persisted: PersistedState = serde_json::from_value(value)
                    .map_err(|e| Recovery::ShapeMismatch(e.to_string()))?;
                Ok(self.restore(persisted))
            }
            Some(Ok(v)) => Err(Recovery::UnsupportedVersion(v)),
            Some(Err(raw)) => Err(Recovery::ShapeMismatch(format!(
                "schema_version is not an unsigned integer: {raw}"
            ))),
        }
    }

    fn topic(&self, raw: &str) -> Topic {
        Topic::parse_or(raw, &self.fallback_topic)
    }

    fn restore(&self, persisted: PersistedState) -> EngineState {
        let mut state = self.fresh();
        let mut repaired = 0usize;

        for (label, levels) in persisted.skill_matrix {
            let Some(topic) = Topic::parse(&label) else {
                repaired += levels.len();
                continue;
            };
            for (level, mastery) in levels {
                match Difficulty::try_from_level(level) {
                    Some(difficulty) => {
                        if !(0.0..=1.0).contains(&mastery) {
                            repaired += 1;
                        }
                        state.skill_matrix.insert(topic.clone(), difficulty, mastery);
                    }
                    None => repaired += 1,
                }
            }
        }

        let skip = persisted.history.len().saturating_sub(self.history_limit);
        for entry in persisted.history.into_iter().skip(skip) {
            let scores = ResponseScores {
                comprehension: entry.comprehension_score,
                curiosity: entry.curiosity_score,
                confidence: entry.confidence_score,
            };
            if scores.clamped() != scores || Difficulty::try_from_level(entry.difficulty).is_none() {
                repaired += 1;
            }
            state.history.push(Assessment::new(
                entry.timestamp,
                self.topic(&entry.topic),
                Difficulty::clamped(entry.difficulty),
                scores,
            ));
        }

        for (label, level) in persisted.current_difficulty {
            match Topic::parse(&label) {
                Some(topic) => {
                    if Difficulty::try_from_level(level).is_none() {
                        repaired += 1;
                    }
                    state.difficulties.set(&topic, Difficulty::clamped(level));
                }
                None => repaired += 1,
            }
        }

        if repaired > 0 {
            tracing::debug!(repaired, "repaired out-of-range entries in persisted state");
        }
        state
    }

    fn migrate_legacy(&self, legacy: LegacyState) -> EngineState {
        let mut state = self.fresh();
        let fallback_time = legacy
            .last_updated
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        let mut dropped = 0usize;

        for (label, levels) in legacy.skill_matrix.unwrap_or_default() {
            let Some(topic) = Topic::parse(&label) else {
                dropped += levels.len();
                continue;
            };
            for (level, mastery) in levels {
                match level.trim().parse::<i64>().ok().and_then(Difficulty::try_from_level) {
                    Some(difficulty) => state.skill_matrix.insert(topic.clone(), difficulty, mastery),
                    None => dropped += 1,
                }
            }
        }

        let history = legacy.comprehension_history.unwrap_or_default();
        let skip = history.len().saturating_sub(self.history_limit);
        for entry in history.into_iter().skip(skip) {
            state.history.push(self.legacy_assessment(entry, fallback_time));
        }

        if dropped > 0 {
            tracing::debug!(dropped, "dropped unusable entries from legacy state");
        }
        tracing::info!(
            topics = state.skill_matrix.topics().len(),
            history = state.history.len(),
            "migrated unversioned state"
        );
        state
    }

    fn legacy_assessment(
        &self,
        entry: LegacyAssessment,
        fallback_time: DateTime<Utc>,
    ) -> Assessment {
        let timestamp = entry
            .timestamp
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(fallback_time);
        let topic = self.topic(entry.topic.as_deref().unwrap_or_default());
        let difficulty = entry
            .difficulty
            .map(Difficulty::clamped)
            .unwrap_or(Difficulty::ELEMENTARY);
        let scores = ResponseScores {
            comprehension: clamp_unit(entry.comprehension_score.unwrap_or(NEUTRAL_SCORE)),
            curiosity: clamp_unit(entry.curiosity_score.unwrap_or(NEUTRAL_SCORE)),
            confidence: clamp_unit(entry.confidence_score.unwrap_or(NEUTRAL_SCORE)),
        };
        Assessment::new(timestamp, topic, difficulty, scores)
    }
}

/// RFC 3339, or a naive ISO timestamp taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
