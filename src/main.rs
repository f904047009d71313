use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use zpd_coach::config::Config;
use zpd_coach::engine::{AssessmentContext, LearnerProfile};
use zpd_coach::logging;
use zpd_coach::session::{JsonlSink, LearningSession};
use zpd_coach::store::{JsonStore, StateStore};

#[derive(Parser)]
#[command(
    name = "zpd-coach",
    version,
    about = "Adaptive-difficulty learning coach with zone-of-proximal-development pacing"
)]
struct Cli {
    #[arg(short, long, help = "Config file (defaults to the user config directory)")]
    config: Option<PathBuf>,

    #[arg(short, long, default_value = "default", help = "Learner id")]
    learner: String,

    #[arg(long, help = "Override the state directory")]
    data_dir: Option<PathBuf>,

    #[arg(long, help = "Override the log filter")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Score a response without recording it
    Assess {
        text: String,
        #[arg(short, long)]
        topic: Option<String>,
        #[arg(long = "vocab", help = "Topic vocabulary term (repeatable)")]
        vocabulary: Vec<String>,
    },
    /// Record a learner response and advance difficulty
    Respond {
        text: String,
        #[arg(short, long)]
        topic: String,
        #[arg(long = "vocab", help = "Topic vocabulary term (repeatable)")]
        vocabulary: Vec<String>,
        #[arg(long, help = "Append the assessment to this JSON Lines file")]
        audit_log: Option<PathBuf>,
    },
    /// Suggest the next topic to study
    Suggest {
        #[arg(long = "recent", help = "Recently covered topic (repeatable)")]
        recent: Vec<String>,
        #[arg(long = "interest", help = "Learner interest (repeatable)")]
        interests: Vec<String>,
        #[arg(long, help = "Print the full ranking")]
        explain: bool,
    },
    /// Render the instruction prompt for the next generation call
    Prompt {
        #[arg(short, long)]
        topic: String,
        #[arg(short, long, default_value = "")]
        name: String,
        #[arg(long, help = "Learner profile JSON; adds the persona block")]
        profile: Option<PathBuf>,
    },
    /// Summarise strengths and growth areas
    Insights {
        #[arg(short, long, default_value = "")]
        name: String,
    },
    /// Print the learner's persisted state
    Show,
    /// Clear the learner's progress
    Reset,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load()?,
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.to_string_lossy().to_string();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    logging::init_tracing(&config.log_level);

    let store = JsonStore::from_config(&config)?;
    let mut session = LearningSession::open(&cli.learner, &config, store)
        .with_context(|| format!("opening learner {:?}", cli.learner))?;
    if let Some(reason) = session.recovery() {
        eprintln!("warning: stored state was unusable ({reason}); starting fresh");
    }

    match cli.command {
        Command::Assess {
            text,
            topic,
            vocabulary,
        } => {
            let context = match topic {
                Some(t) => AssessmentContext::for_topic(&t),
                None => AssessmentContext::default(),
            }
            .with_vocabulary(vocabulary);
            print_json(&session.engine().assess(&text, &context))?;
        }
        Command::Respond {
            text,
            topic,
            vocabulary,
            audit_log,
        } => {
            if let Some(path) = audit_log {
                session = session.with_sink(JsonlSink::new(path));
            }
            let outcome = session.respond_at(&text, &topic, &vocabulary, chrono::Utc::now());
            print_json(&outcome)?;
            session.close().context("saving learner state")?;
        }
        Command::Suggest {
            recent,
            interests,
            explain,
        } => {
            let engine = session.engine();
            if explain {
                print_json(&engine.rank_topics(&recent, &interests))?;
            }
            println!("{}", engine.suggest_next_topic(&recent, &interests));
        }
        Command::Prompt {
            topic,
            name,
            profile,
        } => {
            let engine = session.engine();
            let text = match profile {
                Some(path) => {
                    let raw = fs::read_to_string(&path)
                        .with_context(|| format!("reading profile {}", path.display()))?;
                    let mut profile: LearnerProfile = serde_json::from_str(&raw)?;
                    if !name.trim().is_empty() {
                        profile.name = name;
                    }
                    engine.compose_prompt(&profile, &topic)
                }
                None => engine.render_prompt(&topic, &name),
            };
            print!("{text}");
        }
        Command::Insights { name } => {
            let engine = session.engine();
            print_json(&engine.insights(&name))?;
            if engine.should_introduce_challenge() {
                eprintln!("ready for a stretch challenge");
            }
        }
        Command::Show => match session.store().load(session.learner_id())? {
            Some(blob) => {
                let value: serde_json::Value = serde_json::from_str(&blob)
                    .context("stored state is not valid JSON")?;
                print_json(&value)?;
            }
            None => println!("no saved state for {}", session.learner_id()),
        },
        Command::Reset => {
            session.reset().context("saving fresh state")?;
            println!("reset {}", session.learner_id());
        }
    }

    Ok(())
}
