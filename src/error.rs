//! Error handling types for ts-semantic-ls
//!
//! Only infrastructure failures are errors: talking to tsserver and loading
//! configuration. Request outcomes such as staleness or an oversized document
//! are modelled by [`crate::semantic::TokensOutcome`] instead.

use thiserror::Error;

/// Error type for the tsserver bridge and configuration loading
#[derive(Debug, Error)]
pub enum BridgeError {
    /// tsserver could not be started
    #[error("Failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A child process pipe was not available after spawn
    #[error("Failed to obtain {stream} for '{command}'")]
    MissingPipe {
        command: String,
        stream: &'static str,
    },

    /// Malformed message framing or payload from tsserver
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// tsserver went away while a request was pending
    #[error("tsserver exited: {message}")]
    ServerExited { message: String },

    /// Configuration error
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

impl BridgeError {
    /// Create a protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        BridgeError::Protocol {
            message: message.into(),
        }
    }

    /// Create a server exited error
    pub fn server_exited(message: impl Into<String>) -> Self {
        BridgeError::ServerExited {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        BridgeError::Config {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_error_mentions_command() {
        let err = BridgeError::Spawn {
            command: "tsserver".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let message = err.to_string();
        assert!(message.contains("tsserver"), "got: {message}");
        assert!(message.contains("not found"), "got: {message}");
    }

    #[test]
    fn io_error_converts_with_question_mark() {
        fn read() -> BridgeResult<()> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe"))?;
            Ok(())
        }
        assert!(matches!(read(), Err(BridgeError::Io(_))));
    }
}
