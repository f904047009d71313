pub mod advisor;
pub mod analyzer;
pub mod difficulty;
pub mod insights;
pub mod matrix;
pub mod prompt;
pub mod recommender;
pub mod state;
pub mod topic;
pub mod trend;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::Config;

pub use advisor::DifficultyAdvisor;
pub use analyzer::{AssessmentContext, PerformanceWeights, ResponseAnalyzer, ResponseScores};
pub use difficulty::{Difficulty, Transition};
pub use insights::{ConversationAnalysis, ConversationMessage, LearningInsights};
pub use matrix::SkillMatrix;
pub use prompt::{LearnerProfile, PromptComposer};
pub use recommender::{TopicRanking, TopicRecommender, Zone};
pub use state::{Assessment, EngineState};
pub use topic::Topic;

/// What one learner response did to the engine.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResponseOutcome {
    pub assessment: Assessment,
    pub performance: f64,
    pub mastery: f64,
    pub previous_difficulty: Difficulty,
    pub next_difficulty: Difficulty,
    pub transition: Transition,
}

/// One learner's engine: state plus the components that read and advance it.
///
/// Owned by a single session; nothing here performs I/O.
#[derive(Clone, Debug)]
pub struct LearningEngine {
    state: EngineState,
    analyzer: ResponseAnalyzer,
    advisor: DifficultyAdvisor,
    recommender: TopicRecommender,
    composer: PromptComposer,
    weights: PerformanceWeights,
    fallback_topic: String,
}

impl Default for LearningEngine {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl LearningEngine {
    pub fn from_config(config: &Config) -> Self {
        let mut state = EngineState::default();
        Self::configure_state(&mut state, config);
        Self {
            state,
            analyzer: ResponseAnalyzer::new(),
            advisor: DifficultyAdvisor::new(config.level_up_threshold, config.level_down_threshold),
            recommender: TopicRecommender {
                zpd_lower: config.zpd_lower,
                zpd_upper: config.zpd_upper,
                seed_topic: config.default_topic.clone(),
                catalog: config.topic_catalog.clone(),
            },
            composer: PromptComposer {
                trend_window: config.trend_window,
                trend_sensitivity: config.trend_sensitivity,
            },
            weights: config.performance_weights.clone(),
            fallback_topic: config.fallback_topic.clone(),
        }
    }

    /// Adopt previously persisted state, re-applying configured limits.
    pub fn with_state(config: &Config, mut state: EngineState) -> Self {
        Self::configure_state(&mut state, config);
        let mut engine = Self::from_config(config);
        engine.state = state;
        engine
    }

    fn configure_state(state: &mut EngineState, config: &Config) {
        state.skill_matrix.set_alpha(config.smoothing_alpha);
        state.history.set_limit(config.history_limit);
        state
            .difficulties
            .set_initial(Difficulty::clamped(config.default_difficulty));
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn topic(&self, raw: &str) -> Topic {
        Topic::parse_or(raw, &self.fallback_topic)
    }

    pub fn assess(&self, text: &str, context: &AssessmentContext) -> ResponseScores {
        self.analyzer.assess(text, context)
    }

    /// Fold a direct performance score into mastery.
    pub fn update(&mut self, topic: &str, difficulty: i64, performance: f64) -> f64 {
        let topic = self.topic(topic);
        self.state
            .skill_matrix
            .update(&topic, Difficulty::clamped(difficulty), performance)
    }

    pub fn mastery(&self, topic: &str, difficulty: i64) -> Option<f64> {
        let topic = self.topic(topic);
        self.state
            .skill_matrix
            .get(&topic, Difficulty::clamped(difficulty))
    }

    pub fn current_difficulty(&mut self, topic: &str) -> Difficulty {
        let topic = self.topic(topic);
        self.state.difficulties.current(&topic)
    }

    /// Blank topic names resolve to the fallback topic, as in [`Self::update`].
    pub fn next_difficulty(&self, topic: &str, current: i64) -> Difficulty {
        let topic = self.topic(topic);
        self.advisor
            .next_difficulty(&self.state.skill_matrix, &topic, Difficulty::clamped(current))
    }

    pub fn record_response(&mut self, text: &str, topic: &str) -> ResponseOutcome {
        self.record_response_at(text, topic, &[], Utc::now())
    }

    /// Assess, update mastery at the topic's current level, append to history
    /// and advance the topic's difficulty.
    pub fn record_response_at(
        &mut self,
        text: &str,
        topic: &str,
        vocabulary: &[String],
        timestamp: DateTime<Utc>,
    ) -> ResponseOutcome {
        let topic = self.topic(topic);
        let context =
            AssessmentContext::for_topic(topic.label()).with_vocabulary(vocabulary.iter().cloned());
        let scores = self.analyzer.assess(text, &context);
        self.record_scores_at(&topic, scores, timestamp)
    }

    /// Record scores produced elsewhere, e.g. by a host-side grader.
    pub fn record_scores_at(
        &mut self,
        topic: &Topic,
        scores: ResponseScores,
        timestamp: DateTime<Utc>,
    ) -> ResponseOutcome {
        let current = self.state.difficulties.current(topic);
        let assessment = Assessment::new(timestamp, topic.clone(), current, scores);
        let performance = assessment.scores().performance(&self.weights);
        let mastery = self.state.skill_matrix.update(topic, current, performance);
        self.state.history.push(assessment.clone());

        let next = self
            .advisor
            .next_difficulty(&self.state.skill_matrix, topic, current);
        let transition = Transition::between(current, next);
        if transition != Transition::Stay {
            tracing::debug!(
                topic = %topic,
                from = current.level(),
                to = next.level(),
                mastery,
                "difficulty {}",
                transition.as_str()
            );
        }
        self.state.difficulties.set(topic, next);

        ResponseOutcome {
            assessment,
            performance,
            mastery,
            previous_difficulty: current,
            next_difficulty: next,
            transition,
        }
    }

    pub fn suggest_next_topic(&self, recent_topics: &[String], interests: &[String]) -> Topic {
        self.recommender
            .suggest_next_topic(&self.state, recent_topics, interests)
    }

    pub fn rank_topics(&self, recent_topics: &[String], interests: &[String]) -> Vec<TopicRanking> {
        self.recommender
            .rank_topics(&self.state, recent_topics, interests)
    }

    pub fn recent_assessments(&self) -> Vec<Assessment> {
        self.state.history.recent(self.composer.trend_window)
    }

    pub fn render_prompt(&self, topic: &str, learner_name: &str) -> String {
        let topic = self.topic(topic);
        let difficulty = self.state.difficulties.peek(&topic);
        self.composer
            .render(&topic, difficulty, learner_name, &self.recent_assessments())
    }

    pub fn compose_prompt(&self, profile: &LearnerProfile, topic: &str) -> String {
        let topic = self.topic(topic);
        let difficulty = self.state.difficulties.peek(&topic);
        self.composer
            .compose(profile, &topic, difficulty, &self.recent_assessments())
    }

    pub fn insights(&self, learner_name: &str) -> LearningInsights {
        insights::insights(&self.state.skill_matrix, learner_name)
    }

    pub fn should_introduce_challenge(&self) -> bool {
        insights::should_introduce_challenge(&self.state.history.to_vec())
    }

    pub fn analyze_conversation(
        &self,
        messages: &[ConversationMessage],
        topic: &str,
    ) -> ConversationAnalysis {
        insights::analyze_conversation(&self.analyzer, messages, topic)
    }

    pub fn reset(&mut self) {
        self.state.reset();
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(i: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + i, 0).unwrap()
    }

    #[test]
    fn test_first_response_starts_at_elementary() {
        let mut engine = LearningEngine::default();
        let outcome = engine.record_response_at("Why is the sky blue?", "Space", &[], at(0));
        assert_eq!(outcome.previous_difficulty, Difficulty::ELEMENTARY);
        assert_eq!(outcome.assessment.difficulty(), Difficulty::ELEMENTARY);
        assert_eq!(engine.state().history.len(), 1);
    }

    #[test]
    fn test_strong_answers_level_up() {
        let mut engine = LearningEngine::default();
        let topic = engine.topic("Math");
        let strong = ResponseScores {
            comprehension: 0.95,
            curiosity: 0.5,
            confidence: 0.5,
        };
        let outcome = engine.record_scores_at(&topic, strong, at(0));
        assert_eq!(outcome.transition, Transition::LevelUp);
        assert_eq!(engine.current_difficulty("math"), Difficulty::INTERMEDIATE);
    }

    #[test]
    fn test_weak_answers_level_down() {
        let mut engine = LearningEngine::default();
        let outcome = engine.record_response_at("I'm confused, what? This is hard.", "Math", &[], at(0));
        assert_eq!(outcome.transition, Transition::LevelDown);
        assert_eq!(outcome.next_difficulty, Difficulty::BEGINNER);
    }

    #[test]
    fn test_blank_topic_uses_fallback() {
        let mut engine = LearningEngine::default();
        let outcome = engine.record_response_at("Plants need light.", "   ", &[], at(0));
        assert_eq!(outcome.assessment.topic().label(), "General Knowledge");
    }

    #[test]
    fn test_blank_topic_reads_back_its_own_evidence() {
        let mut engine = LearningEngine::default();
        for _ in 0..5 {
            engine.update("", 2, 0.9);
        }
        assert_eq!(engine.mastery("", 2), engine.mastery("General Knowledge", 2));
        assert!(engine.mastery("  ", 2).is_some());
        assert_eq!(engine.next_difficulty("", 2), Difficulty::INTERMEDIATE);
        assert_eq!(
            engine.next_difficulty("", 2),
            engine.next_difficulty("General Knowledge", 2)
        );
    }

    #[test]
    fn test_next_difficulty_clamps_caller_level() {
        let engine = LearningEngine::default();
        assert_eq!(engine.next_difficulty("Math", -3), Difficulty::BEGINNER);
        assert_eq!(engine.next_difficulty("Math", 99), Difficulty::EXPERT);
        assert_eq!(engine.next_difficulty("", 3), Difficulty::INTERMEDIATE);
    }

    #[test]
    fn test_weights_blend_performance() {
        let config = Config {
            performance_weights: PerformanceWeights {
                comprehension: 0.5,
                curiosity: 0.3,
                confidence: 0.2,
            },
            ..Config::default()
        };
        let mut engine = LearningEngine::from_config(&config);
        let topic = engine.topic("Art");
        let outcome = engine.record_scores_at(
            &topic,
            ResponseScores {
                comprehension: 1.0,
                curiosity: 0.0,
                confidence: 0.0,
            },
            at(0),
        );
        assert!((outcome.performance - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_render_prompt_uses_tracked_difficulty() {
        let mut engine = LearningEngine::default();
        let topic = engine.topic("Space");
        engine.state.difficulties.set(&topic, Difficulty::ADVANCED);
        let text = engine.render_prompt("space", "Ada");
        assert!(text.contains("4/5"));
    }

    #[test]
    fn test_reset_keeps_configuration() {
        let config = Config {
            history_limit: 3,
            smoothing_alpha: 0.5,
            ..Config::default()
        };
        let mut engine = LearningEngine::from_config(&config);
        engine.update("Math", 2, 0.9);
        engine.reset();
        assert!(engine.state().is_fresh());
        assert_eq!(engine.state().history.limit(), 3);
        assert_eq!(engine.state().skill_matrix.alpha(), 0.5);
    }
}
