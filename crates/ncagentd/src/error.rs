//! Error types for the agent process.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Goal state could not be decoded
    #[error("Invalid goal state: {0}")]
    GoalState(#[from] serde_json::Error),

    /// Logging could not be initialised
    #[error("Logging error: {0}")]
    Logging(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AgentError::Configuration("concurrency_ceiling must be > 0".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: concurrency_ceiling must be > 0"
        );
    }

    #[test]
    fn test_goal_state_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = AgentError::from(json_err);
        assert!(err.to_string().starts_with("Invalid goal state:"));
    }
}
