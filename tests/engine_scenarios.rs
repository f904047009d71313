use chrono::{DateTime, TimeZone, Utc};

use zpd_coach::config::Config;
use zpd_coach::engine::{
    AssessmentContext, Difficulty, LearningEngine, ResponseScores, Transition, Zone,
};

fn at(i: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_720_000_000 + i * 60, 0).unwrap()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn scores(comprehension: f64) -> ResponseScores {
    ResponseScores {
        comprehension,
        curiosity: 0.5,
        confidence: 0.5,
    }
}

#[test]
fn test_understanding_scores_above_confusion() {
    let engine = LearningEngine::default();
    let ctx = AssessmentContext::default();
    let clear = engine.assess("I think I understand how plants make food with sunlight!", &ctx);
    let lost = engine.assess("I'm confused, what? This is hard.", &ctx);
    assert!(clear.comprehension > lost.comprehension);
}

#[test]
fn test_five_strong_updates_level_up_math() {
    let mut engine = LearningEngine::default();
    assert_eq!(engine.mastery("Math", 2), None);
    for _ in 0..5 {
        engine.update("Math", 2, 0.9);
    }
    assert_eq!(engine.next_difficulty("Math", 2), Difficulty::INTERMEDIATE);
}

#[test]
fn test_topic_suggestion_prefers_interesting_zpd_topic() {
    let mut engine = LearningEngine::default();
    engine.update("Space", 2, 0.6);
    engine.update("Space", 3, 0.5);
    engine.update("Math", 1, 0.95);
    engine.update("Math", 2, 0.9);
    engine.update("Physics", 4, 0.3);

    let suggestion = engine.suggest_next_topic(&[], &strings(&["Space", "Robots"]));
    assert_eq!(suggestion.to_string(), "Space");

    let ranking = engine.rank_topics(&[], &strings(&["Space", "Robots"]));
    assert_eq!(ranking[0].zone, Zone::Zpd);
    assert!(ranking[0].interest);
}

#[test]
fn test_empty_matrix_suggests_seed_topic() {
    let engine = LearningEngine::default();
    assert_eq!(engine.suggest_next_topic(&[], &[]).to_string(), "Space");
}

#[test]
fn test_steady_feedback_does_not_oscillate() {
    let mut engine = LearningEngine::default();
    let topic = engine.topic("Chemistry");
    for i in 0..30 {
        let outcome = engine.record_scores_at(&topic, scores(0.6), at(i));
        assert_eq!(outcome.transition, Transition::Stay, "turn {i}");
        assert_eq!(outcome.next_difficulty, Difficulty::ELEMENTARY);
    }
    assert_eq!(engine.next_difficulty("Chemistry", 2), Difficulty::ELEMENTARY);
}

#[test]
fn test_difficulty_walks_up_and_back_down() {
    let mut engine = LearningEngine::default();
    let topic = engine.topic("Physics");

    let up = engine.record_scores_at(&topic, scores(0.95), at(0));
    assert_eq!(up.transition, Transition::LevelUp);
    let up = engine.record_scores_at(&topic, scores(0.95), at(1));
    assert_eq!(up.previous_difficulty, Difficulty::INTERMEDIATE);
    assert_eq!(up.next_difficulty, Difficulty::ADVANCED);

    let down = engine.record_scores_at(&topic, scores(0.1), at(2));
    assert_eq!(down.previous_difficulty, Difficulty::ADVANCED);
    assert_eq!(down.transition, Transition::LevelDown);
    assert_eq!(engine.current_difficulty("physics"), Difficulty::INTERMEDIATE);
}

#[test]
fn test_next_difficulty_always_in_range() {
    let mut engine = LearningEngine::default();
    for level in -10..=10 {
        engine.update("Art", level, if level % 2 == 0 { 1.0 } else { 0.0 });
        let next = engine.next_difficulty("Art", level);
        assert!((1..=5).contains(&next.level()), "level {level} gave {next}");
    }
}

#[test]
fn test_history_keeps_most_recent_fifty() {
    let mut engine = LearningEngine::default();
    let topic = engine.topic("Oceans");
    for i in 0..51 {
        engine.record_scores_at(&topic, scores(0.5), at(i));
    }
    let history = &engine.state().history;
    assert_eq!(history.len(), 50);
    assert_eq!(history.oldest().unwrap().timestamp(), at(1));
    assert_eq!(history.latest().unwrap().timestamp(), at(50));
}

#[test]
fn test_topic_keys_are_case_and_space_insensitive() {
    let mut engine = LearningEngine::default();
    engine.update("  Space ", 2, 0.6);
    engine.update("SPACE", 2, 0.6);
    assert_eq!(engine.state().skill_matrix.len(), 1);
    let mastery = engine.mastery("space", 2).unwrap();
    assert!((mastery - 0.6).abs() < 1e-12);
}

#[test]
fn test_prompt_reflects_recent_struggle() {
    let mut engine = LearningEngine::default();
    for i in 0..3 {
        engine.record_response_at("I'm confused, what? This is hard.", "Math", &[], at(i));
    }
    let text = engine.render_prompt("Math", "Ada");
    assert!(text.contains("Current learning context for Ada:"));
    assert!(text.contains("Difficulty level: 1/5"));
    assert!(text.contains("Use very simple language"));
}

#[test]
fn test_challenge_readiness_after_strong_curious_turns() {
    let mut engine = LearningEngine::default();
    let topic = engine.topic("Robots");
    for i in 0..3 {
        engine.record_scores_at(
            &topic,
            ResponseScores {
                comprehension: 0.9,
                curiosity: 0.8,
                confidence: 0.6,
            },
            at(i),
        );
    }
    assert!(engine.should_introduce_challenge());
}

#[test]
fn test_configured_thresholds_change_pacing() {
    let config = Config {
        level_up_threshold: 0.5,
        ..Config::default()
    };
    let mut engine = LearningEngine::from_config(&config);
    engine.update("Math", 2, 0.6);
    assert_eq!(engine.next_difficulty("Math", 2), Difficulty::INTERMEDIATE);
}
