pub mod codec;
pub mod json_store;
pub mod schema;

use thiserror::Error;

pub use codec::{Decoded, Recovery, StateCodec};
pub use json_store::{JsonStore, MemoryStore, StateStore};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid learner id: {0:?}")]
    InvalidLearnerId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreError::InvalidLearnerId("../etc".into());
        assert_eq!(err.to_string(), "invalid learner id: \"../etc\"");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: StoreError = io.into();
        assert!(err.to_string().contains("read-only"));
    }
}
