//! Error types for goal-state programming.
//!
//! Handlers never surface these errors to the engine directly; each one is
//! folded into a [`ReturnCode`] so that the reply classification stays a
//! pure function of the code.

use crate::task::ReturnCode;
use ncagent_types::{OperationType, ParseError, ResourceType};
use thiserror::Error;

/// Cross-reference lookup failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No INFO entry with this ID exists in the batch.
    #[error("{kind} '{id}' not found in goal state")]
    NotFound { kind: ResourceType, id: String },

    /// The entry exists but its reference data cannot be used.
    #[error("{kind} '{id}' has malformed {field}: {message}")]
    Malformed {
        kind: ResourceType,
        id: String,
        field: &'static str,
        message: String,
    },
}

impl ResolveError {
    pub fn not_found(kind: ResourceType, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn malformed(
        kind: ResourceType,
        id: impl Into<String>,
        field: &'static str,
        message: impl ToString,
    ) -> Self {
        Self::Malformed {
            kind,
            id: id.into(),
            field,
            message: message.to_string(),
        }
    }

    pub fn to_code(&self) -> ReturnCode {
        match self {
            ResolveError::NotFound { .. } => ReturnCode::FAILURE,
            ResolveError::Malformed { .. } => ReturnCode::INVALID_ARGUMENT,
        }
    }
}

/// Failures reported by a dataplane or DHCP backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The request was accepted and completes asynchronously.
    #[error("{operation} in progress")]
    InProgress { operation: String },

    #[error("command failed: '{command}' (exit code {exit_code}): {output}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        output: String,
    },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("operation not supported by backend: {operation}")]
    Unsupported { operation: String },

    #[error("internal backend error: {message}")]
    Internal { message: String },
}

impl BackendError {
    pub fn in_progress(operation: impl Into<String>) -> Self {
        Self::InProgress {
            operation: operation.into(),
        }
    }

    pub fn command_failed(command: impl Into<String>, exit_code: i32, output: impl Into<String>) -> Self {
        Self::CommandFailed {
            command: command.into(),
            exit_code,
            output: output.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn to_code(&self) -> ReturnCode {
        match self {
            BackendError::InProgress { .. } => ReturnCode::IN_PROGRESS,
            BackendError::CommandFailed { .. } => ReturnCode::FAILURE,
            BackendError::InvalidArgument { .. } => ReturnCode::INVALID_ARGUMENT,
            BackendError::Unsupported { .. } => ReturnCode::NOT_SUPPORTED,
            BackendError::Internal { .. } => ReturnCode::FAULT,
        }
    }
}

/// Errors raised while turning one resource state into backend calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgrammingError {
    /// Caller-supplied data failed validation before any backend call.
    #[error("invalid {field}: {message}")]
    InvalidArgument { field: String, message: String },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The operation is recognised for this kind but not implemented.
    #[error("{operation} is not implemented for {kind}")]
    NotImplemented {
        kind: ResourceType,
        operation: OperationType,
    },

    #[error("{operation} is not a valid operation for {kind}")]
    UnsupportedOperation {
        kind: ResourceType,
        operation: OperationType,
    },
}

impl ProgrammingError {
    pub fn invalid_argument(field: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            message: message.to_string(),
        }
    }

    pub fn unsupported(kind: ResourceType, operation: OperationType) -> Self {
        Self::UnsupportedOperation { kind, operation }
    }

    pub fn to_code(&self) -> ReturnCode {
        match self {
            ProgrammingError::InvalidArgument { .. } => ReturnCode::INVALID_ARGUMENT,
            ProgrammingError::Resolve(e) => e.to_code(),
            ProgrammingError::Backend(e) => e.to_code(),
            ProgrammingError::NotImplemented { .. } => ReturnCode::NOT_SUPPORTED,
            ProgrammingError::UnsupportedOperation { .. } => ReturnCode::FAILURE,
        }
    }
}

impl From<ParseError> for ProgrammingError {
    fn from(err: ParseError) -> Self {
        let field = match err {
            ParseError::InvalidMacAddress(_) => "mac_address",
            ParseError::InvalidIpAddress(_) => "ip_address",
            ParseError::InvalidCidr(_) => "cidr",
            ParseError::InvalidTunnelId(_) => "tunnel_id",
        };
        Self::invalid_argument(field, err)
    }
}

pub type ProgrammingResult<T> = Result<T, ProgrammingError>;
