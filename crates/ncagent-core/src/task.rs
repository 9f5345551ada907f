//! Handler return codes and per-resource outcomes.

use std::fmt;
use std::time::Duration;

/// Integer status a resource handler returns.
///
/// Zero is success. The negative errno convention of the dataplane tooling
/// is kept so codes can be logged and compared against backend output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReturnCode(i32);

impl ReturnCode {
    pub const SUCCESS: ReturnCode = ReturnCode(0);
    /// Accepted, completion is asynchronous.
    pub const IN_PROGRESS: ReturnCode = ReturnCode(libc::EINPROGRESS);
    pub const INVALID_ARGUMENT: ReturnCode = ReturnCode(-libc::EINVAL);
    /// Generic hard failure (`-EXIT_FAILURE`).
    pub const FAILURE: ReturnCode = ReturnCode(-1);
    /// Unexpected internal fault, including a panicking handler.
    pub const FAULT: ReturnCode = ReturnCode(-libc::EFAULT);
    pub const NOT_SUPPORTED: ReturnCode = ReturnCode(libc::ENOSYS);
    pub const TIMED_OUT: ReturnCode = ReturnCode(-libc::ETIMEDOUT);

    pub const fn new(code: i32) -> Self {
        ReturnCode(code)
    }

    pub const fn get(&self) -> i32 {
        self.0
    }

    pub const fn is_success(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_in_progress(&self) -> bool {
        self.0 == libc::EINPROGRESS
    }

    pub const fn is_invalid_argument(&self) -> bool {
        self.0 == -libc::EINVAL
    }

    fn name(&self) -> Option<&'static str> {
        Some(match *self {
            ReturnCode::SUCCESS => "SUCCESS",
            ReturnCode::IN_PROGRESS => "IN_PROGRESS",
            ReturnCode::INVALID_ARGUMENT => "INVALID_ARGUMENT",
            ReturnCode::FAILURE => "FAILURE",
            ReturnCode::FAULT => "FAULT",
            ReturnCode::NOT_SUPPORTED => "NOT_SUPPORTED",
            ReturnCode::TIMED_OUT => "TIMED_OUT",
            _ => return None,
        })
    }
}

impl Default for ReturnCode {
    fn default() -> Self {
        ReturnCode::SUCCESS
    }
}

impl fmt::Display for ReturnCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({})", name, self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

impl From<ReturnCode> for i32 {
    fn from(code: ReturnCode) -> i32 {
        code.0
    }
}

/// What a handler reports for one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Outcome {
    pub code: ReturnCode,
    pub dataplane_time: Duration,
    pub network_config_time: Duration,
}

impl Outcome {
    pub fn success() -> Self {
        Outcome::default()
    }

    /// An outcome with no timing, for calls that never reached a backend.
    pub fn from_code(code: ReturnCode) -> Self {
        Outcome {
            code,
            ..Outcome::default()
        }
    }

    pub fn with_times(code: ReturnCode, dataplane_time: Duration, network_config_time: Duration) -> Self {
        Outcome {
            code,
            dataplane_time,
            network_config_time,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code.is_success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sentinels() {
        assert_eq!(ReturnCode::SUCCESS.get(), 0);
        assert_eq!(ReturnCode::FAILURE.get(), -1);
        assert_eq!(ReturnCode::INVALID_ARGUMENT.get(), -22);
        assert_eq!(ReturnCode::IN_PROGRESS.get(), libc::EINPROGRESS);
        assert!(ReturnCode::IN_PROGRESS.is_in_progress());
        assert!(ReturnCode::INVALID_ARGUMENT.is_invalid_argument());
        assert!(!ReturnCode::FAULT.is_success());
    }

    #[test]
    fn test_display() {
        assert_eq!(ReturnCode::FAILURE.to_string(), "FAILURE (-1)");
        assert_eq!(ReturnCode::new(-99).to_string(), "-99");
    }

    #[test]
    fn test_outcome_constructors() {
        assert!(Outcome::success().is_success());

        let outcome = Outcome::from_code(ReturnCode::TIMED_OUT);
        assert_eq!(outcome.code, ReturnCode::TIMED_OUT);
        assert_eq!(outcome.dataplane_time, Duration::ZERO);

        let timed = Outcome::with_times(
            ReturnCode::SUCCESS,
            Duration::from_millis(3),
            Duration::from_millis(1),
        );
        assert_eq!(timed.network_config_time, Duration::from_millis(1));
    }
}
