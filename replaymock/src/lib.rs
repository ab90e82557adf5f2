// vim: tw=80
//! A record/replay mock object library.
//!
//! Replaymock creates stand-ins for traits.  A stand-in starts out recording:
//! every call made on it registers an expectation instead of doing anything.
//! After [`replay`] the same stand-in answers calls from the recorded
//! expectations, and [`verify`] checks that everything expected actually
//! happened.
//!
//! # User Guide
//!
//! * [`Getting started`](#getting-started)
//! * [`Behavior modes`](#behavior-modes)
//! * [`Responses`](#responses)
//! * [`Matching arguments`](#matching-arguments)
//! * [`Call counts`](#call-counts)
//! * [`Partial mocks`](#partial-mocks)
//! * [`Sharing a control`](#sharing-a-control)
//! * [`Errors`](#errors)
//!
//! ## Getting Started
//! ```
//! use replaymock::*;
//!
//! #[stand_in]
//! trait List {
//!     fn add(&mut self, item: u32) -> bool;
//!     fn size(&self) -> usize;
//! }
//!
//! let mut mock = create_mock::<MockList>();
//! // Record: each call becomes an expectation.
//! expect(&mut mock, |m| m.add(5)).and_return(true);
//! expect(&mut mock, |m| m.size()).and_return(1);
//! replay(&mock);
//!
//! // Replay: the code under test sees the recorded responses.
//! assert!(mock.add(5));
//! assert_eq!(1, mock.size());
//! verify(&mock);
//! ```
//!
//! `#[stand_in]` generates a struct named after the trait with `Mock`
//! prepended.  A call on a method returning `()` can be recorded by simply
//! making it; every other method needs a response, or [`replay`] will fail.
//!
//! ## Behavior Modes
//!
//! | Mode      | Ordering enforced | Unmatched call in replay          |
//! |-----------|-------------------|-----------------------------------|
//! | default   | unordered         | panics, and `verify` fails        |
//! | nice      | unordered         | returns a default value           |
//! | strict    | strict FIFO       | panics, and `verify` fails        |
//!
//! Default values come from the [`DefaultReturn`] trait: `false`, zero, empty
//! strings and collections, `None`, and `Ok` of the success type's default.
//! ```
//! # use replaymock::*;
//! #[stand_in]
//! trait Counter {
//!     fn count(&self) -> u64;
//!     fn name(&self) -> String;
//! }
//!
//! let mock = create_nice_mock::<MockCounter>();
//! replay(&mock);
//! assert_eq!(0, mock.count());
//! assert_eq!("", mock.name());
//! verify(&mock);
//! ```
//!
//! ## Responses
//!
//! * [`and_return`](ExpectationBuilder::and_return) returns a fixed value.
//! * [`and_answer`](ExpectationBuilder::and_answer) computes it from the
//!   call's [`Arguments`].
//! * [`and_panic`](ExpectationBuilder::and_panic) unwinds at the call site.
//!   Methods returning `Result` should use `and_return(Err(..))` instead.
//! * [`and_stub_return`](ExpectationBuilder::and_stub_return) answers any
//!   number of calls, outside of any ordering.
//!
//! ```
//! # use replaymock::*;
//! #[stand_in]
//! trait Doubler {
//!     fn double(&self, x: i32) -> i32;
//! }
//!
//! let mut mock = create_mock::<MockDoubler>();
//! expect(&mut mock, |m| m.double(0))
//!     .with_any::<i32>(0)
//!     .and_answer(|args| 2 * args.get::<i32>(0).unwrap())
//!     .times(1, 2);
//! replay(&mock);
//! assert_eq!(8, mock.double(4));
//! verify(&mock);
//! ```
//!
//! ## Matching Arguments
//!
//! By default a recorded argument must be equal to the value it was recorded
//! with.  [`with`](ExpectationBuilder::with) replaces that with any
//! [`Predicate`], [`withf`](ExpectationBuilder::withf) with a closure, and
//! [`with_any`](ExpectationBuilder::with_any) accepts anything.
//!
//! ## Call Counts
//!
//! Every expectation is for exactly one call unless told otherwise, with
//! [`times`](ExpectationBuilder::times),
//! [`times_exactly`](ExpectationBuilder::times_exactly),
//! [`at_least_once`](ExpectationBuilder::at_least_once) or
//! [`any_times`](ExpectationBuilder::any_times).
//!
//! ## Partial Mocks
//!
//! Default method bodies are real implementations.  A partial mock
//! intercepts only the named methods and runs every other method's body.
//! ```
//! # use replaymock::*;
//! #[stand_in(class)]
//! trait Widget {
//!     fn foo(&self) -> i32 { 10 }
//!     fn method(&self) -> i32 { 20 }
//! }
//!
//! let mut mock = create_partial_mock::<MockWidget>(&["method"]);
//! expect(&mut mock, |m| m.method()).and_return(30);
//! replay(&mock);
//! assert_eq!(10, mock.foo());
//! assert_eq!(30, mock.method());
//! verify(&mock);
//! ```
//!
//! ## Sharing a Control
//!
//! Each `create_*` function gives its stand-in a control of its own.  To
//! check the order of calls across several stand-ins, create them all from
//! one [`MockControl`]:
//! ```
//! # use replaymock::*;
//! #[stand_in]
//! trait Sink {
//!     fn put(&self, x: u8);
//! }
//!
//! let control = MockControl::new(BehaviorMode::Strict);
//! let first = control.create_mock::<MockSink>().unwrap();
//! let second = control.create_mock::<MockSink>().unwrap();
//! first.put(1);
//! second.put(2);
//! control.replay().unwrap();
//! first.put(1);
//! second.put(2);
//! control.verify().unwrap();
//! ```
//!
//! ## Errors
//!
//! The functions at the crate root are meant for tests, and panic on misuse
//! or failed verification.  The same operations on [`MockControl`] return a
//! [`MockError`] instead.

// Generated code names this crate by path, including in its own unit tests
extern crate self as replaymock;

mod behavior;
mod builder;
mod control;
mod error;
mod expectation;
mod interceptor;
mod matcher;
mod times;
mod type_desc;
mod value;

pub use crate::behavior::{BehaviorMode, CallOrdering, UnmatchedCall};
pub use crate::builder::ExpectationBuilder;
pub use crate::control::{LifecycleState, MockControl};
pub use crate::error::{
    MockError, MockResult, UnexpectedCall, VerificationFailure
};
pub use crate::expectation::{Answer, Outcome, Response};
pub use crate::interceptor::{
    Interceptor, InterceptorId, MethodSignature, Mock, StandIn
};
pub use crate::matcher::{any, ArgumentMatcher, PredicateMatcher};
pub use crate::times::Times;
pub use crate::type_desc::{
    MethodDescriptor, MethodKind, TypeDescription, TypeKind
};
pub use crate::value::{Argument, Arguments, DefaultReturn, ReturnKind};
pub use predicates::prelude::{predicate, Predicate};
pub use replaymock_derive::stand_in;

#[track_caller]
fn check<T>(result: MockResult<T>) -> T {
    match result {
        Ok(t) => t,
        Err(e) => panic!("{e}")
    }
}

/// Create a stand-in of type `M` together with the new control that owns it.
///
/// With `restricted`, only the named methods are intercepted.
pub fn create_stand_in<M: StandIn>(mode: BehaviorMode,
                                   restricted: Option<&[&str]>)
    -> MockResult<(M, MockControl)>
{
    let control = MockControl::new(mode);
    let mock = match restricted {
        Some(methods) => control.create_partial_mock(methods)?,
        None => control.create_mock()?,
    };
    Ok((mock, control))
}

#[track_caller]
fn create<M: StandIn>(mode: BehaviorMode, restricted: Option<&[&str]>) -> M {
    check(create_stand_in(mode, restricted)).0
}

/// Create a default-mode stand-in: calls may come in any order, and an
/// unexpected call panics.
#[track_caller]
pub fn create_mock<M: StandIn>() -> M {
    create(BehaviorMode::Default, None)
}

/// Create a stand-in that answers unexpected calls with default values.
#[track_caller]
pub fn create_nice_mock<M: StandIn>() -> M {
    create(BehaviorMode::Nice, None)
}

/// Create a stand-in that also checks the order of calls.
#[track_caller]
pub fn create_strict_mock<M: StandIn>() -> M {
    create(BehaviorMode::Strict, None)
}

/// Create a default-mode stand-in that intercepts only `methods`.
///
/// # Panics
///
/// If a method doesn't exist, can't be overridden, or if the type has an
/// abstract method that isn't in `methods`.
#[track_caller]
pub fn create_partial_mock<M: StandIn>(methods: &[&str]) -> M {
    create(BehaviorMode::Default, Some(methods))
}

#[track_caller]
pub fn create_nice_partial_mock<M: StandIn>(methods: &[&str]) -> M {
    create(BehaviorMode::Nice, Some(methods))
}

#[track_caller]
pub fn create_strict_partial_mock<M: StandIn>(methods: &[&str]) -> M {
    create(BehaviorMode::Strict, Some(methods))
}

/// Record one expected call and return a builder to configure it.
///
/// `f` must make exactly one call to an intercepted method of `mock`.  The
/// value it returns is the record-time placeholder and is discarded.
///
/// # Panics
///
/// If `mock` isn't recording, or if `f` records no call or more than one.
#[track_caller]
pub fn expect<M, R, F>(mock: &mut M, f: F) -> ExpectationBuilder<R>
    where M: Mock,
          F: FnOnce(&mut M) -> R,
          R: 'static
{
    let control = mock.interceptor().control().clone();
    let state = control.state();
    if state != LifecycleState::Record {
        let e = MockError::illegal_state("recording an expectation", state);
        panic!("{e}");
    }
    let generation = control.generation();
    let before = control.expectation_count();
    f(mock);
    let recorded = control.expectation_count().saturating_sub(before);
    assert!(recorded == 1,
        "expect needs exactly one call to an intercepted method, but {recorded} \
         were recorded");
    ExpectationBuilder::new(control, generation, before)
}

/// Switch `mock`'s control from record to replay.
#[track_caller]
pub fn replay<M: Mock + ?Sized>(mock: &M) {
    check(control_of(mock).replay())
}

/// Check that every expectation of `mock`'s control was met, and that it got
/// no unexpected calls.
#[track_caller]
pub fn verify<M: Mock + ?Sized>(mock: &M) {
    check(control_of(mock).verify())
}

/// Forget everything recorded on `mock`'s control and start recording again.
pub fn reset<M: Mock + ?Sized>(mock: &M) {
    control_of(mock).reset()
}

/// The distinct controls behind `mocks`, in order of first appearance.
fn distinct_controls<'a>(mocks: &[&'a dyn Mock]) -> Vec<&'a MockControl> {
    let mut controls: Vec<&MockControl> = Vec::with_capacity(mocks.len());
    for mock in mocks {
        let control = control_of(*mock);
        if !controls.iter().any(|c| c.same_as(control)) {
            controls.push(control);
        }
    }
    controls
}

/// [`replay`] every mock.  A control shared by several of them is switched
/// only once.
#[track_caller]
pub fn replay_all(mocks: &[&dyn Mock]) {
    for control in distinct_controls(mocks) {
        check(control.replay());
    }
}

/// [`verify`] every mock.  A control shared by several of them is checked
/// only once.
#[track_caller]
pub fn verify_all(mocks: &[&dyn Mock]) {
    for control in distinct_controls(mocks) {
        check(control.verify());
    }
}

pub fn control_of<M: Mock + ?Sized>(mock: &M) -> &MockControl {
    mock.interceptor().control()
}

pub fn mode_of<M: Mock + ?Sized>(mock: &M) -> BehaviorMode {
    control_of(mock).mode()
}

pub fn interceptor_of<M: Mock + ?Sized>(mock: &M) -> &Interceptor {
    mock.interceptor()
}
