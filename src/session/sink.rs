use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::engine::state::Assessment;
use crate::store::StoreError;

/// One-way export of scored responses, e.g. to an audit log.
pub trait AssessmentSink {
    fn export(&mut self, learner_id: &str, assessment: &Assessment) -> Result<(), StoreError>;
}

pub struct NullSink;

impl AssessmentSink for NullSink {
    fn export(&mut self, _learner_id: &str, _assessment: &Assessment) -> Result<(), StoreError> {
        Ok(())
    }
}

#[derive(Serialize)]
struct SinkRecord<'a> {
    learner_id: &'a str,
    #[serde(flatten)]
    assessment: &'a Assessment,
}

/// Append-only JSON Lines file, one assessment per line.
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AssessmentSink for JsonlSink {
    fn export(&mut self, learner_id: &str, assessment: &Assessment) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut line = serde_json::to_string(&SinkRecord {
            learner_id,
            assessment,
        })?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }
}
