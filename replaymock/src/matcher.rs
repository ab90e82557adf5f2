// vim: tw=80
//! Argument matchers and the expectation matching rules.
use predicates::prelude::{predicate, Predicate};
use predicates_tree::CaseTreeExt;
use std::{fmt, marker::PhantomData, sync::Arc};

use crate::{
    behavior::CallOrdering,
    expectation::{Expectation, Matchers},
    interceptor::MethodSignature,
    value::Argument,
};

/// Decides whether one argument of an intercepted call is acceptable.
///
/// The default matcher for a recorded argument is equality with the recorded
/// value.  Any [`Predicate`] can be used instead through
/// [`ExpectationBuilder::with`](crate::ExpectationBuilder::with).
pub trait ArgumentMatcher: fmt::Display + Send + Sync {
    fn matches(&self, value: &dyn Argument) -> bool;

    /// Describe why `value` fails this matcher, or `None` if it doesn't.
    fn explain(&self, value: &dyn Argument) -> Option<String> {
        if self.matches(value) {
            None
        } else {
            Some(format!("{self} rejected {value:?}"))
        }
    }
}

/// Adapts a typed [`Predicate`] to the type-erased [`ArgumentMatcher`].  A
/// value of any other type never matches.
pub struct PredicateMatcher<T, P> {
    predicate: P,
    _t: PhantomData<fn(&T)>,
}

impl<T, P> PredicateMatcher<T, P>
    where T: Argument, P: Predicate<T> + Send + Sync
{
    pub fn new(predicate: P) -> Self {
        PredicateMatcher { predicate, _t: PhantomData }
    }
}

impl<T, P> fmt::Display for PredicateMatcher<T, P>
    where P: Predicate<T>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.predicate, f)
    }
}

impl<T, P> ArgumentMatcher for PredicateMatcher<T, P>
    where T: Argument, P: Predicate<T> + Send + Sync
{
    fn matches(&self, value: &dyn Argument) -> bool {
        value.downcast_ref::<T>()
            .map(|v| self.predicate.eval(v))
            .unwrap_or(false)
    }

    fn explain(&self, value: &dyn Argument) -> Option<String> {
        match value.downcast_ref::<T>() {
            Ok(v) => self.predicate.find_case(false, v)
                .map(|case| case.tree().to_string()),
            Err(_) => Some(format!("{} expected a {}, got {value:?}",
                                   self.predicate,
                                   std::any::type_name::<T>())),
        }
    }
}

/// Matches any value of type `T`.
pub fn any<T: Argument>() -> Box<dyn ArgumentMatcher> {
    Box::new(PredicateMatcher::<T, _>::new(predicate::always()))
}

/// Do all of `args` satisfy `matchers`, pairwise?
pub(crate) fn matches_all(matchers: &[Arc<dyn ArgumentMatcher>],
                          args: &[&dyn Argument]) -> bool
{
    matchers.len() == args.len() &&
        matchers.iter().zip(args).all(|(m, a)| m.matches(*a))
}

/// Explain every argument of `args` that `matchers` rejects.
pub(crate) fn explain_all(matchers: &[Arc<dyn ArgumentMatcher>],
                          args: &[&dyn Argument]) -> String
{
    if matchers.len() != args.len() {
        return format!("expected {} arguments, got {}",
                       matchers.len(), args.len());
    }
    matchers.iter()
        .zip(args)
        .enumerate()
        .filter_map(|(i, (m, a))| m.explain(*a)
            .map(|why| format!("argument #{i}: {why}")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The matchers of every expectation for `sig` that still has calls left,
/// with their positions in the queue.
pub(crate) fn candidates(queue: &[Expectation], sig: &MethodSignature)
    -> Vec<(usize, Matchers)>
{
    queue.iter()
        .enumerate()
        .filter(|(_, e)| e.signature() == sig && !e.is_exhausted())
        .map(|(i, e)| (i, e.matchers().clone()))
        .collect()
}

/// Positions of the candidates whose matchers accept `args`.  Matchers may
/// be user code, so this runs without the control's lock.
pub(crate) fn accepting(candidates: &[(usize, Matchers)],
                        args: &[&dyn Argument]) -> Vec<usize>
{
    candidates.iter()
        .filter(|(_, matchers)| matches_all(matchers, args))
        .map(|(i, _)| *i)
        .collect()
}

/// Pick the expectation that should answer a call, given the positions of
/// the expectations whose matchers `accepted` its arguments.
///
/// Under [`CallOrdering::Unordered`] the first accepting expectation that
/// still has calls left is used.  Under [`CallOrdering::Strict`] the search
/// starts at `cursor`, and an expectation that doesn't match may only be
/// skipped once its minimum call count has been reached.  Stubs are never
/// ordered, and are only consulted once the ordinary expectations fail.
pub(crate) fn find_match(queue: &[Expectation],
                         sig: &MethodSignature,
                         accepted: &[usize],
                         ordering: CallOrdering,
                         cursor: usize) -> Option<usize>
{
    let eligible = |i: usize, e: &Expectation| {
        e.signature() == sig && !e.is_exhausted() && accepted.contains(&i)
    };
    let ordinary = match ordering {
        CallOrdering::Unordered => queue.iter()
            .enumerate()
            .position(|(i, e)| !e.is_stub() && eligible(i, e)),
        CallOrdering::Strict => {
            let mut found = None;
            for (i, e) in queue.iter().enumerate().skip(cursor) {
                if e.is_stub() {
                    continue;
                }
                if eligible(i, e) {
                    found = Some(i);
                    break;
                }
                if !e.is_satisfied() {
                    break;
                }
            }
            found
        }
    };
    ordinary.or_else(|| queue.iter()
        .enumerate()
        .position(|(i, e)| e.is_stub() && eligible(i, e)))
}

/// Find the expectation whose matchers best explain why a call was rejected:
/// the first one for the same method that still has calls left.
pub(crate) fn closest_candidate(queue: &[Expectation],
                                sig: &MethodSignature,
                                ordering: CallOrdering,
                                cursor: usize) -> Option<usize>
{
    let start = match ordering {
        CallOrdering::Unordered => 0,
        CallOrdering::Strict => cursor,
    };
    queue.iter()
        .enumerate()
        .skip(start)
        .find(|(_, e)| e.signature() == sig && !e.is_exhausted())
        .map(|(i, _)| i)
}

#[cfg(test)]
mod t {
    use super::*;

    #[test]
    fn predicate_matcher_eq() {
        let m = PredicateMatcher::<i32, _>::new(predicate::eq(5));
        assert!(m.matches(&5i32));
        assert!(!m.matches(&6i32));
        assert!(m.explain(&5i32).is_none());
        assert!(m.explain(&6i32).is_some());
    }

    #[test]
    fn predicate_matcher_wrong_type() {
        let m = PredicateMatcher::<i32, _>::new(predicate::eq(5));
        assert!(!m.matches(&5u64));
        let why = m.explain(&5u64).unwrap();
        assert!(why.contains("i32"), "{why}");
    }

    #[test]
    fn any_matches_everything_of_its_type() {
        let m = any::<String>();
        assert!(m.matches(&String::from("x")));
        assert!(!m.matches(&1u8));
    }

    #[test]
    fn arity_mismatch() {
        let matchers: Matchers = vec![Arc::from(any::<u8>())];
        assert!(!matches_all(&matchers, &[]));
        assert_eq!("expected 1 arguments, got 0", explain_all(&matchers, &[]));
    }
}
