use serde::{Deserialize, Serialize};

use crate::engine::analyzer::{AssessmentContext, ResponseAnalyzer};
use crate::engine::difficulty::Difficulty;
use crate::engine::matrix::SkillMatrix;
use crate::engine::state::Assessment;
use crate::engine::topic::Topic;
use crate::engine::trend;

const STRENGTH_ABOVE: f64 = 0.7;
const GROWTH_BELOW: f64 = 0.5;
const MAX_STRENGTHS: usize = 3;
const MAX_GROWTH_AREAS: usize = 2;
const FEW_TOPICS: usize = 5;

const CHALLENGE_WINDOW: usize = 3;
const CHALLENGE_COMPREHENSION: f64 = 0.75;
const CHALLENGE_CURIOSITY: f64 = 0.6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightStatus {
    BeginningJourney,
    Progressing,
}

/// Mean mastery of one topic and the hardest level it was practised at.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TopicMastery {
    pub topic: Topic,
    pub level: Difficulty,
    pub mastery: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LearningInsights {
    pub status: InsightStatus,
    pub message: String,
    pub strengths: Vec<TopicMastery>,
    pub growth_areas: Vec<TopicMastery>,
    /// Every tracked topic in name order.
    pub topics: Vec<TopicMastery>,
    pub topics_explored: usize,
    /// Mean of the per-topic means.
    pub average_mastery: Option<f64>,
    pub recommendations: Vec<String>,
}

pub fn insights(matrix: &SkillMatrix, learner_name: &str) -> LearningInsights {
    let name = match learner_name.trim() {
        "" => "This learner",
        n => n,
    };

    if matrix.is_empty() {
        return LearningInsights {
            status: InsightStatus::BeginningJourney,
            message: format!("{name} is just starting their learning adventure!"),
            strengths: Vec::new(),
            growth_areas: Vec::new(),
            topics: Vec::new(),
            topics_explored: 0,
            average_mastery: None,
            recommendations: vec!["Explore diverse topics to discover interests".to_string()],
        };
    }

    let topics: Vec<TopicMastery> = matrix
        .topics()
        .into_iter()
        .filter_map(|topic| {
            Some(TopicMastery {
                topic: topic.clone(),
                level: matrix.highest_level(topic)?,
                mastery: matrix.topic_mean(topic)?,
            })
        })
        .collect();

    let mut strengths: Vec<TopicMastery> = topics
        .iter()
        .filter(|t| t.mastery > STRENGTH_ABOVE)
        .cloned()
        .collect();
    strengths.sort_by(|a, b| b.mastery.total_cmp(&a.mastery).then_with(|| a.topic.cmp(&b.topic)));
    strengths.truncate(MAX_STRENGTHS);

    let mut growth_areas: Vec<TopicMastery> = topics
        .iter()
        .filter(|t| t.mastery < GROWTH_BELOW)
        .cloned()
        .collect();
    growth_areas.sort_by(|a, b| a.mastery.total_cmp(&b.mastery).then_with(|| a.topic.cmp(&b.topic)));
    growth_areas.truncate(MAX_GROWTH_AREAS);

    let mut recommendations = Vec::new();
    if let Some(top) = strengths.first() {
        recommendations.push(format!(
            "Keep exploring {} - you're becoming an expert!",
            top.topic
        ));
    }
    if let Some(focus) = growth_areas.first() {
        recommendations.push(format!(
            "Let's build confidence in {} with fun, hands-on activities",
            focus.topic
        ));
    }
    if topics.len() < FEW_TOPICS {
        recommendations.push("Try exploring new topics to discover hidden talents".to_string());
    }

    let means: Vec<f64> = topics.iter().map(|t| t.mastery).collect();

    LearningInsights {
        status: InsightStatus::Progressing,
        message: format!("{name} has explored {} topics so far.", topics.len()),
        strengths,
        growth_areas,
        topics_explored: topics.len(),
        topics,
        average_mastery: trend::mean(&means),
        recommendations,
    }
}

/// True once the last three responses show solid comprehension and curiosity.
pub fn should_introduce_challenge(recent: &[Assessment]) -> bool {
    if recent.len() < CHALLENGE_WINDOW {
        return false;
    }
    let window = &recent[recent.len() - CHALLENGE_WINDOW..];
    let comprehension: Vec<f64> = window.iter().map(Assessment::comprehension).collect();
    let curiosity: Vec<f64> = window.iter().map(Assessment::curiosity).collect();
    matches!(
        (trend::mean(&comprehension), trend::mean(&curiosity)),
        (Some(c), Some(q)) if c > CHALLENGE_COMPREHENSION && q > CHALLENGE_CURIOSITY
    )
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementLevel {
    High,
    Medium,
    Low,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComprehensionLevel {
    Strong,
    Developing,
    NeedsSupport,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConversationReport {
    pub topic: String,
    pub message_count: usize,
    pub avg_comprehension: f64,
    pub avg_curiosity: f64,
    /// Mean of the last two learner messages minus mean of the first two.
    pub growth_trend: f64,
    pub engagement_level: EngagementLevel,
    pub comprehension_level: ComprehensionLevel,
    pub ready_for_next_level: bool,
    pub needs_reinforcement: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversationAnalysis {
    NoData,
    Analyzed(ConversationReport),
}

pub fn analyze_conversation(
    analyzer: &ResponseAnalyzer,
    messages: &[ConversationMessage],
    topic: &str,
) -> ConversationAnalysis {
    let context = AssessmentContext::for_topic(topic);
    let scores: Vec<_> = messages
        .iter()
        .filter(|m| m.role == Role::User)
        .map(|m| analyzer.assess(&m.content, &context))
        .collect();

    let comprehension: Vec<f64> = scores.iter().map(|s| s.comprehension).collect();
    let curiosity: Vec<f64> = scores.iter().map(|s| s.curiosity).collect();
    let (Some(avg_comprehension), Some(avg_curiosity)) =
        (trend::mean(&comprehension), trend::mean(&curiosity))
    else {
        return ConversationAnalysis::NoData;
    };

    let growth_trend = if comprehension.len() > 1 {
        let early = trend::mean(&comprehension[..2]).unwrap_or(avg_comprehension);
        let late =
            trend::mean(&comprehension[comprehension.len() - 2..]).unwrap_or(avg_comprehension);
        late - early
    } else {
        0.0
    };

    let engagement_level = if avg_curiosity > 0.6 {
        EngagementLevel::High
    } else if avg_curiosity > 0.4 {
        EngagementLevel::Medium
    } else {
        EngagementLevel::Low
    };
    let comprehension_level = if avg_comprehension > 0.7 {
        ComprehensionLevel::Strong
    } else if avg_comprehension > 0.5 {
        ComprehensionLevel::Developing
    } else {
        ComprehensionLevel::NeedsSupport
    };

    ConversationAnalysis::Analyzed(ConversationReport {
        topic: topic.to_string(),
        message_count: scores.len(),
        avg_comprehension,
        avg_curiosity,
        growth_trend,
        engagement_level,
        comprehension_level,
        ready_for_next_level: avg_comprehension > 0.8 && growth_trend >= 0.0,
        needs_reinforcement: avg_comprehension < 0.5 || growth_trend < -0.2,
    })
}
