// vim: tw=80
//! The three mock flavors and the rules each one implies.
use std::fmt;

/// How a mock treats call order and calls nobody expected.
///
/// | Mode      | Ordering enforced | Unmatched call in replay          |
/// |-----------|-------------------|-----------------------------------|
/// | `Default` | unordered         | fatal mismatch                    |
/// | `Nice`    | unordered         | returns default value, no failure |
/// | `Strict`  | strict FIFO       | fatal mismatch                    |
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum BehaviorMode {
    #[default]
    Default,
    Nice,
    Strict,
}

/// Which expectations are eligible for an incoming call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CallOrdering {
    /// Any expectation with calls left, in recording order of preference
    Unordered,
    /// Only the oldest expectation that still requires calls, or one after it
    /// once the earlier ones are satisfied
    Strict,
}

/// What happens to a replayed call that no expectation accepts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnmatchedCall {
    /// Hand back the return type's default value
    ReturnDefault,
    /// Fail at the call site and again at verify time
    Fail,
}

impl BehaviorMode {
    pub fn ordering(self) -> CallOrdering {
        match self {
            BehaviorMode::Default | BehaviorMode::Nice =>
                CallOrdering::Unordered,
            BehaviorMode::Strict => CallOrdering::Strict,
        }
    }

    pub fn on_unmatched(self) -> UnmatchedCall {
        match self {
            BehaviorMode::Nice => UnmatchedCall::ReturnDefault,
            BehaviorMode::Default | BehaviorMode::Strict => UnmatchedCall::Fail,
        }
    }
}

impl fmt::Display for BehaviorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BehaviorMode::Default => write!(f, "default"),
            BehaviorMode::Nice => write!(f, "nice"),
            BehaviorMode::Strict => write!(f, "strict"),
        }
    }
}

#[cfg(test)]
mod t {
    use super::*;

    #[test]
    fn policy_table() {
        let table = [
            (BehaviorMode::Default, CallOrdering::Unordered, UnmatchedCall::Fail),
            (BehaviorMode::Nice, CallOrdering::Unordered,
             UnmatchedCall::ReturnDefault),
            (BehaviorMode::Strict, CallOrdering::Strict, UnmatchedCall::Fail),
        ];
        for (mode, ordering, unmatched) in table {
            assert_eq!(ordering, mode.ordering(), "{mode}");
            assert_eq!(unmatched, mode.on_unmatched(), "{mode}");
        }
    }
}
