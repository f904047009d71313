use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use zpd_coach::config::Config;
use zpd_coach::engine::{LearningEngine, ResponseScores};
use zpd_coach::store::{JsonStore, StateCodec, StateStore};

const SEED: u64 = 0x5eed_2024;

const CONFUSED: &[&str] = &[
    "I'm confused, what? This is hard.",
    "huh? I don't get it",
    "I don't understand why that happens",
    "maybe? I'm not sure",
];

const SOLID: &[&str] = &[
    "I understand now. Plants use sunlight to turn water and air into sugar.",
    "That makes sense, the moon reflects light from the sun.",
    "I know this one: gravity pulls everything toward the center of the earth.",
    "Because the ocean absorbs heat, coastal places stay milder in winter.",
];

const CURIOUS: &[&str] = &[
    "Why do stars twinkle? How far away are they?",
    "What if the moon disappeared? What happens to the tides?",
    "That's interesting! Can we build a robot that sorts recycling?",
    "How do bees know where the flowers are?",
];

// ── Helpers ──────────────────────────────────────────────────────────────

fn turn_time(base: DateTime<Utc>, turn: i64) -> DateTime<Utc> {
    base + Duration::minutes(turn * 3)
}

/// Replay `turns` picked responses from `pool` against `topic`.
fn replay(
    engine: &mut LearningEngine,
    rng: &mut SmallRng,
    pool: &[&str],
    topic: &str,
    turns: i64,
    start: &mut i64,
    base: DateTime<Utc>,
) {
    for _ in 0..turns {
        let text = pool.choose(rng).copied().unwrap_or_default();
        engine.record_response_at(text, topic, &[], turn_time(base, *start));
        *start += 1;
    }
}

/// Record noisy direct scores around `center`.
fn drift(
    engine: &mut LearningEngine,
    rng: &mut SmallRng,
    topic: &str,
    center: f64,
    turns: i64,
    start: &mut i64,
    base: DateTime<Utc>,
) {
    let topic = engine.topic(topic);
    for _ in 0..turns {
        let scores = ResponseScores {
            comprehension: center + rng.gen_range(-0.05..0.05),
            curiosity: rng.gen_range(0.3..0.9),
            confidence: rng.gen_range(0.3..0.9),
        };
        engine.record_scores_at(&topic, scores, turn_time(base, *start));
        *start += 1;
    }
}

// ── Sample learners ──────────────────────────────────────────────────────

fn build_01_brand_new(config: &Config) -> LearningEngine {
    LearningEngine::from_config(config)
}

fn build_02_struggling(config: &Config, rng: &mut SmallRng, base: DateTime<Utc>) -> LearningEngine {
    let mut engine = LearningEngine::from_config(config);
    let mut turn = 0;
    replay(&mut engine, rng, CONFUSED, "Math", 6, &mut turn, base);
    replay(&mut engine, rng, SOLID, "Math", 1, &mut turn, base);
    engine
}

fn build_03_in_zone(config: &Config, rng: &mut SmallRng, base: DateTime<Utc>) -> LearningEngine {
    let mut engine = LearningEngine::from_config(config);
    let mut turn = 0;
    drift(&mut engine, rng, "Space", 0.6, 8, &mut turn, base);
    drift(&mut engine, rng, "Oceans", 0.55, 5, &mut turn, base);
    replay(&mut engine, rng, CURIOUS, "Space", 3, &mut turn, base);
    engine
}

fn build_04_multi_topic(config: &Config, rng: &mut SmallRng, base: DateTime<Utc>) -> LearningEngine {
    let mut engine = LearningEngine::from_config(config);
    let mut turn = 0;
    for (topic, center) in [
        ("Physics", 0.9),
        ("Biology", 0.75),
        ("Art", 0.35),
        ("Coding", 0.62),
        ("History", 0.45),
        ("Music", 0.85),
    ] {
        let turns = rng.gen_range(4..12);
        drift(&mut engine, rng, topic, center, turns, &mut turn, base);
    }
    replay(&mut engine, rng, SOLID, "Physics", 5, &mut turn, base);
    engine
}

fn legacy_blob() -> String {
    r#"{
  "skill_matrix": {"Space": {"2": 0.72, "3": 0.41}, "Robots": {"1": 0.9}},
  "comprehension_history": [
    {"comprehension_score": 0.8, "curiosity_score": 0.7, "confidence_score": 0.5,
     "timestamp": "2024-03-01T09:15:00.000000"},
    {"comprehension_score": 0.55, "curiosity_score": 0.9, "confidence_score": 0.4,
     "timestamp": "2024-03-01T09:18:30.500000"}
  ],
  "question_history": [],
  "last_updated": "2024-03-01T09:20:00"
}"#
    .to_string()
}

fn main() -> Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("sample-states"));
    fs::create_dir_all(&out_dir)?;

    let config = Config::default();
    let codec = StateCodec::from_config(&config);
    let mut store = JsonStore::new(&out_dir)?;
    let mut rng = SmallRng::seed_from_u64(SEED);
    let base = Utc.with_ymd_and_hms(2025, 1, 6, 16, 0, 0).single().unwrap_or_default();
    let saved_at = base + Duration::days(1);

    let learners: Vec<(&str, LearningEngine)> = vec![
        ("01-brand-new", build_01_brand_new(&config)),
        ("02-struggling", build_02_struggling(&config, &mut rng, base)),
        ("03-in-zone", build_03_in_zone(&config, &mut rng, base)),
        ("04-multi-topic", build_04_multi_topic(&config, &mut rng, base)),
    ];

    for (id, engine) in &learners {
        let blob = codec.encode_at(engine.state(), saved_at)?;
        store.save(id, &blob)?;
        println!("Wrote {}.json ({} bytes)", id, blob.len());
    }

    let legacy = legacy_blob();
    store.save("05-legacy", &legacy)?;
    println!("Wrote 05-legacy.json ({} bytes)", legacy.len());

    println!(
        "\nGenerated {} sample states in {}.",
        learners.len() + 1,
        out_dir.display()
    );
    Ok(())
}
