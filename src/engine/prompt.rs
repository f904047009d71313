use serde::{Deserialize, Serialize};

use crate::engine::difficulty::Difficulty;
use crate::engine::state::Assessment;
use crate::engine::topic::Topic;
use crate::engine::trend::{self, Trend};

const STRUGGLING_BELOW: f64 = 0.5;
const COMFORTABLE_FROM: f64 = 0.7;

const SUPPORT_GUIDANCE: &[&str] = &[
    "Use very simple language and short sentences",
    "Give more examples and everyday analogies",
    "Break each concept into tiny steps",
    "Check understanding after every point",
    "Be extra encouraging and patient",
];

const STEADY_GUIDANCE: &[&str] = &[
    "Use clear, age-appropriate language",
    "Give an example whenever an idea is new",
    "Build on what they already understand",
    "Ask guiding questions",
    "Encourage exploration",
];

const STRETCH_GUIDANCE: &[&str] = &[
    "Introduce more complex concepts",
    "Challenge them with \"what if\" scenarios",
    "Encourage deeper analysis",
    "Connect several concepts together",
    "Celebrate their advanced thinking",
];

/// Who the coach is talking to, as known by the host application.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LearnerProfile {
    pub name: String,
    pub age: Option<u8>,
    pub interests: Option<String>,
    pub dream: Option<String>,
    pub project_goal: Option<String>,
    pub project_tags: Option<String>,
}

fn or_default<'a>(value: &'a Option<String>, fallback: &'a str) -> &'a str {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(fallback)
}

fn display_name(name: &str) -> &str {
    let name = name.trim();
    if name.is_empty() { "the learner" } else { name }
}

/// Renders engine state into instruction text for the downstream generator.
///
/// Output depends only on the arguments, so identical state yields identical
/// text.
#[derive(Clone, Debug, PartialEq)]
pub struct PromptComposer {
    pub trend_window: usize,
    pub trend_sensitivity: f64,
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self {
            trend_window: trend::DEFAULT_TREND_WINDOW,
            trend_sensitivity: trend::DEFAULT_TREND_SENSITIVITY,
        }
    }
}

impl PromptComposer {
    pub fn render(
        &self,
        topic: &Topic,
        difficulty: Difficulty,
        learner_name: &str,
        recent_assessments: &[Assessment],
    ) -> String {
        let window = self.trend_window.max(1);
        let start = recent_assessments.len().saturating_sub(window);
        let scores: Vec<f64> = recent_assessments[start..]
            .iter()
            .map(Assessment::comprehension)
            .collect();

        let (recent, guidance, tone) = match trend::mean(&scores) {
            Some(avg) => {
                let direction =
                    trend::classify(&scores, self.trend_window, self.trend_sensitivity);
                (
                    format!(
                        "{:.0}% ({} over the last {} responses)",
                        avg * 100.0,
                        direction.as_str(),
                        scores.len()
                    ),
                    guidance_for(avg),
                    tone_for(Some(direction)),
                )
            }
            None => (
                "no responses yet, start from a neutral baseline".to_string(),
                STEADY_GUIDANCE,
                tone_for(None),
            ),
        };
        let guidance: String = guidance.iter().map(|line| format!("- {line}\n")).collect();

        format!(
            "Current learning context for {name}:\n\
             - Topic: {topic}\n\
             - Difficulty level: {difficulty}/5 ({tier}: {description})\n\
             - Recent comprehension: {recent}\n\
             \n\
             Adaptive teaching guidance:\n\
             {guidance}\
             \n\
             Tone: {tone}\n\
             \n\
             Stay inside their zone of proximal development: not so easy that they get bored, \
             not so hard that they get frustrated.\n",
            name = display_name(learner_name),
            tier = difficulty.name(),
            description = difficulty.description(),
        )
    }

    /// Persona block describing the coach for one learner and project.
    pub fn persona(&self, profile: &LearnerProfile) -> String {
        let age = match profile.age {
            Some(age) if age > 0 => format!("{age}-year-old"),
            _ => "young explorer".to_string(),
        };
        let interests = or_default(&profile.interests, "curiosity across many topics");
        let dream = or_default(&profile.dream, "still discovering their dream");
        let goal = or_default(&profile.project_goal, "explore and learn with purpose");
        let tags = or_default(&profile.project_tags, "general");

        let mut out = format!(
            "You are a gentle learning coach for a {age} named {}.\n",
            display_name(&profile.name)
        );
        out.push_str("\nMission:\n");
        out.push_str("- Grow curiosity, careful thinking, kindness, health, and care for the planet.\n");
        out.push_str("- Tie every idea back to the learner's dream and this project's goal.\n");
        out.push_str("- Invite teach-backs and \"how could I be wrong?\" moments.\n");
        out.push_str("\nContext:\n");
        out.push_str(&format!("- Interests: {interests}\n"));
        out.push_str(&format!("- Dream: {dream}\n"));
        out.push_str(&format!("- Project goal: {goal}\n"));
        out.push_str(&format!("- Project tags: {tags}\n"));
        out.push_str("\nGuidelines:\n");
        out.push_str("1. Use warm, age-appropriate language in short paragraphs or bullets.\n");
        out.push_str("2. Offer two or three micro-actions of two to five minutes each.\n");
        out.push_str("3. Suggest how facts could be checked or tested.\n");
        out.push_str("4. Celebrate effort, never shame, and end with a small next step and a reflective question.\n");
        out.push_str("5. If safety, privacy, or ethics are at risk, pause and point them to a trusted adult.\n");
        out
    }

    /// Persona block followed by the adaptive block.
    pub fn compose(
        &self,
        profile: &LearnerProfile,
        topic: &Topic,
        difficulty: Difficulty,
        recent_assessments: &[Assessment],
    ) -> String {
        format!(
            "{}\n{}",
            self.persona(profile),
            self.render(topic, difficulty, &profile.name, recent_assessments)
        )
    }
}

fn guidance_for(avg: f64) -> &'static [&'static str] {
    if avg < STRUGGLING_BELOW {
        SUPPORT_GUIDANCE
    } else if avg < COMFORTABLE_FROM {
        STEADY_GUIDANCE
    } else {
        STRETCH_GUIDANCE
    }
}

fn tone_for(direction: Option<Trend>) -> &'static str {
    match direction {
        Some(Trend::Rising) => "celebrate the progress and raise the challenge gradually.",
        Some(Trend::Falling) => {
            "slow down, reassure them, and revisit the last idea before moving on."
        }
        Some(Trend::Stable) => "keep a warm, steady, curious voice.",
        None => "warm and welcoming; open with a question that shows where they are.",
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::engine::analyzer::ResponseScores;

    fn assessments(scores: &[f64]) -> Vec<Assessment> {
        scores
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                Assessment::new(
                    Utc.timestamp_opt(1_700_000_000 + i as i64, 0).unwrap(),
                    Topic::parse("Space").unwrap(),
                    Difficulty::ELEMENTARY,
                    ResponseScores {
                        comprehension: c,
                        curiosity: 0.5,
                        confidence: 0.5,
                    },
                )
            })
            .collect()
    }

    fn space() -> Topic {
        Topic::parse("Space").unwrap()
    }

    #[test]
    fn test_empty_history_uses_baseline() {
        let text = PromptComposer::default().render(&space(), Difficulty::ELEMENTARY, "Ada", &[]);
        assert!(text.contains("Current learning context for Ada:"));
        assert!(text.contains("neutral baseline"));
        assert!(text.contains(STEADY_GUIDANCE[0]));
        assert!(text.contains("2/5 (elementary"));
    }

    #[test]
    fn test_low_comprehension_gets_support() {
        let recent = assessments(&[0.3, 0.2, 0.3]);
        let text = PromptComposer::default().render(&space(), Difficulty::BEGINNER, "Ada", &recent);
        assert!(text.contains(SUPPORT_GUIDANCE[0]));
        assert!(text.contains("Recent comprehension: 27%"));
    }

    #[test]
    fn test_rising_trend_is_reported() {
        let recent = assessments(&[0.6, 0.7, 0.8, 0.9, 1.0]);
        let text = PromptComposer::default().render(&space(), Difficulty::ADVANCED, "Ada", &recent);
        assert!(text.contains("rising over the last 5 responses"));
        assert!(text.contains(STRETCH_GUIDANCE[0]));
        assert!(text.contains("raise the challenge"));
    }

    #[test]
    fn test_only_trailing_window_counts() {
        let mut scores = vec![0.1; 20];
        scores.extend([0.9, 0.9, 0.9, 0.9, 0.9]);
        let text = PromptComposer::default().render(
            &space(),
            Difficulty::ELEMENTARY,
            "Ada",
            &assessments(&scores),
        );
        assert!(text.contains("Recent comprehension: 90% (stable"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let recent = assessments(&[0.4, 0.6]);
        let composer = PromptComposer::default();
        let a = composer.render(&space(), Difficulty::INTERMEDIATE, "Ada", &recent);
        let b = composer.render(&space(), Difficulty::INTERMEDIATE, "Ada", &recent);
        assert_eq!(a, b);
    }

    #[test]
    fn test_blank_name_is_replaced() {
        let text = PromptComposer::default().render(&space(), Difficulty::ELEMENTARY, "  ", &[]);
        assert!(text.contains("for the learner:"));
    }

    #[test]
    fn test_persona_fills_missing_fields() {
        let profile = LearnerProfile {
            name: "Sam".to_string(),
            age: Some(9),
            interests: Some("  ".to_string()),
            ..LearnerProfile::default()
        };
        let text = PromptComposer::default().persona(&profile);
        assert!(text.contains("9-year-old named Sam"));
        assert!(text.contains("curiosity across many topics"));
        assert!(text.contains("still discovering their dream"));
        assert!(text.contains("Project tags: general"));
    }

    #[test]
    fn test_compose_joins_blocks() {
        let profile = LearnerProfile {
            name: "Sam".to_string(),
            ..LearnerProfile::default()
        };
        let text = PromptComposer::default().compose(&profile, &space(), Difficulty::ELEMENTARY, &[]);
        assert!(text.contains("young explorer"));
        assert!(text.contains("Current learning context for Sam:"));
    }
}
