pub mod sink;
pub mod turn;

use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::engine::LearningEngine;
use crate::store::{Recovery, StateCodec, StateStore, StoreError};

pub use sink::{AssessmentSink, JsonlSink, NullSink};
pub use turn::{CheckpointStatus, TurnOutcome};

/// One learner's engine for the duration of a conversation.
///
/// State is loaded once at open and written back through the store every
/// `checkpoint_every` turns and on [`LearningSession::checkpoint`].
pub struct LearningSession<S: StateStore> {
    learner_id: String,
    engine: LearningEngine,
    codec: StateCodec,
    store: S,
    sink: Box<dyn AssessmentSink>,
    checkpoint_every: u32,
    turns: u64,
    turns_since_save: u32,
    recovery: Option<Recovery>,
}

impl<S: StateStore> LearningSession<S> {
    /// Load the learner's state. Missing state starts fresh; unreadable state
    /// starts fresh and is reported through [`LearningSession::recovery`].
    pub fn open(learner_id: &str, config: &Config, store: S) -> Result<Self, StoreError> {
        let codec = StateCodec::from_config(config);
        let (state, recovery) = match store.load(learner_id)? {
            Some(blob) => {
                let decoded = codec.decode(&blob);
                (decoded.state, decoded.recovery)
            }
            None => (codec.fresh(), None),
        };
        if let Some(reason) = &recovery {
            tracing::warn!(learner = learner_id, %reason, "starting from fresh state");
        }

        Ok(Self {
            learner_id: learner_id.to_string(),
            engine: LearningEngine::with_state(config, state),
            codec,
            store,
            sink: Box::new(NullSink),
            checkpoint_every: config.checkpoint_every,
            turns: 0,
            turns_since_save: 0,
            recovery,
        })
    }

    pub fn with_sink(mut self, sink: impl AssessmentSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn learner_id(&self) -> &str {
        &self.learner_id
    }

    pub fn engine(&self) -> &LearningEngine {
        &self.engine
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn recovery(&self) -> Option<&Recovery> {
        self.recovery.as_ref()
    }

    pub fn turns(&self) -> u64 {
        self.turns
    }

    pub fn respond(&mut self, text: &str, topic: &str) -> TurnOutcome {
        self.respond_at(text, topic, &[], Utc::now())
    }

    pub fn respond_at(
        &mut self,
        text: &str,
        topic: &str,
        vocabulary: &[String],
        timestamp: DateTime<Utc>,
    ) -> TurnOutcome {
        let response = self
            .engine
            .record_response_at(text, topic, vocabulary, timestamp);
        if let Err(e) = self.sink.export(&self.learner_id, &response.assessment) {
            tracing::warn!(learner = %self.learner_id, error = %e, "assessment export failed");
        }

        self.turns += 1;
        self.turns_since_save += 1;
        let checkpoint = if self.checkpoint_every > 0 && self.turns_since_save >= self.checkpoint_every
        {
            match self.checkpoint() {
                Ok(()) => CheckpointStatus::Saved,
                Err(e) => CheckpointStatus::Failed(e.to_string()),
            }
        } else {
            CheckpointStatus::NotDue
        };

        TurnOutcome {
            turn: self.turns,
            response,
            checkpoint,
        }
    }

    /// Encode and save now. The due-counter restarts whether or not the
    /// save succeeds.
    pub fn checkpoint(&mut self) -> Result<(), StoreError> {
        self.turns_since_save = 0;
        let result = self
            .codec
            .encode(self.engine.state())
            .and_then(|blob| self.store.save(&self.learner_id, &blob));
        match &result {
            Ok(()) => tracing::info!(learner = %self.learner_id, turns = self.turns, "checkpoint saved"),
            Err(e) => tracing::warn!(learner = %self.learner_id, error = %e, "checkpoint failed"),
        }
        result
    }

    pub fn has_unsaved_turns(&self) -> bool {
        self.turns_since_save > 0
    }

    /// Clear the learner's progress and persist the fresh state.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.engine.reset();
        self.checkpoint()
    }

    /// Save any unsaved turns and hand back the store.
    pub fn close(mut self) -> Result<S, StoreError> {
        if self.has_unsaved_turns() {
            self.checkpoint()?;
        }
        Ok(self.store)
    }
}
