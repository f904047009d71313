use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const STATE_SCHEMA_VERSION: u32 = 1;

/// Version 1 envelope. Topics are keyed by display label, levels by number.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistedState {
    pub schema_version: u32,
    pub saved_at: DateTime<Utc>,
    #[serde(default)]
    pub skill_matrix: BTreeMap<String, BTreeMap<i64, f64>>,
    #[serde(default)]
    pub history: Vec<PersistedAssessment>,
    #[serde(default)]
    pub current_difficulty: BTreeMap<String, i64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistedAssessment {
    pub timestamp: DateTime<Utc>,
    pub topic: String,
    pub difficulty: i64,
    pub comprehension_score: f64,
    pub curiosity_score: f64,
    pub confidence_score: f64,
}

/// Top-level keys that identify an unversioned blob.
pub const LEGACY_FIELDS: &[&str] = &[
    "skill_matrix",
    "comprehension_history",
    "question_history",
    "last_updated",
];

/// Unversioned blob written before schema versioning existed (version 0).
///
/// Matrix levels were stringified integers and history entries carried
/// only the three scores and a naive ISO timestamp.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LegacyState {
    #[serde(default)]
    pub skill_matrix: Option<BTreeMap<String, BTreeMap<String, f64>>>,
    #[serde(default)]
    pub comprehension_history: Option<Vec<LegacyAssessment>>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LegacyAssessment {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub difficulty: Option<i64>,
    #[serde(default)]
    pub comprehension_score: Option<f64>,
    #[serde(default)]
    pub curiosity_score: Option<f64>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
}
