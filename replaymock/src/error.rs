// vim: tw=80
//! Everything that can go wrong while creating, recording, replaying or
//! verifying a mock.
use std::fmt;

use crate::control::LifecycleState;

pub type MockResult<T> = Result<T, MockError>;

#[derive(Clone, Debug, thiserror::Error)]
pub enum MockError {
    /// The type description cannot be intercepted at all, or the requested
    /// method set leaves it in a state that cannot be mocked.
    #[error("{type_name} cannot be mocked: {reason}")]
    UnmockableType {
        type_name: &'static str,
        reason: String,
    },
    /// A restricted method name does not exist on the type.
    #[error("{type_name} has no method named `{method}`")]
    UnknownMethod {
        type_name: &'static str,
        method: String,
    },
    #[error("{operation} is not allowed while the control is in the {state} state")]
    IllegalState {
        operation: &'static str,
        state: LifecycleState,
    },
    #[error("invalid call count range: minimum {min} exceeds maximum {max}")]
    InvalidRange {
        min: usize,
        max: usize,
    },
    /// A recorded call to a method with a return value never got one.
    #[error("missing behavior definition for the recorded call {call}: \
             use and_return, and_answer or and_panic")]
    MissingBehavior { call: String },
    #[error("{0}")]
    UnexpectedCall(UnexpectedCall),
    #[error("{0}")]
    Verification(VerificationFailure),
}

impl MockError {
    pub(crate) fn illegal_state(operation: &'static str, state: LifecycleState)
        -> Self
    {
        MockError::IllegalState { operation, state }
    }
}

/// A replay-time call that no expectation accepted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnexpectedCall {
    /// The attempted call, formatted like `List.add(5)`
    pub call: String,
    /// The expectation queue at the moment of the call
    pub queue: Vec<String>,
    /// Why the closest candidate rejected the arguments, if there was one
    pub explanation: Option<String>,
}

impl fmt::Display for UnexpectedCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unexpected call {}", self.call)?;
        if self.queue.is_empty() {
            write!(f, "\n  (no expectations recorded)")?;
        }
        for line in &self.queue {
            write!(f, "\n  {line}")?;
        }
        if let Some(explanation) = &self.explanation {
            write!(f, "\nClosest expectation didn't match arguments:\n{explanation}")?;
        }
        Ok(())
    }
}

/// Aggregate of everything `verify` found wrong.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VerificationFailure {
    /// Expectations called fewer times than their minimum
    pub unmet: Vec<String>,
    /// Unexpected calls remembered during replay
    pub unexpected: Vec<UnexpectedCall>,
}

impl VerificationFailure {
    pub fn is_empty(&self) -> bool {
        self.unmet.is_empty() && self.unexpected.is_empty()
    }
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expectation failure on verify:")?;
        for line in &self.unmet {
            write!(f, "\n  {line}")?;
        }
        for unexpected in &self.unexpected {
            write!(f, "\n  Unexpected call {}", unexpected.call)?;
        }
        Ok(())
    }
}
