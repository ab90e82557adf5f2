// vim: tw=80
//! Fluent configuration of the most recently recorded call.
use predicates::prelude::{predicate, Predicate};
use std::marker::PhantomData;

use crate::{
    control::MockControl,
    expectation::{Expectation, Response},
    matcher::{self, ArgumentMatcher, PredicateMatcher},
    times::Times,
    value::{Argument, Arguments},
};

/// Configures one recorded expectation.  Returned by [`expect`](crate::expect).
///
/// `R` is the return type of the recorded method.  Every method panics if the
/// control has left the record state, or has been reset, since the builder was
/// created.
pub struct ExpectationBuilder<R> {
    control: MockControl,
    generation: u64,
    index: usize,
    _r: PhantomData<fn() -> R>,
}

impl<R: 'static> ExpectationBuilder<R> {
    pub(crate) fn new(control: MockControl, generation: u64, index: usize)
        -> Self
    {
        ExpectationBuilder { control, generation, index, _r: PhantomData }
    }

    /// Position of the expectation in its control's queue
    pub fn index(&self) -> usize {
        self.index
    }

    #[track_caller]
    fn amend<T, F>(&mut self, f: F) -> T
        where F: FnOnce(&mut Expectation) -> T
    {
        match self.control.amend(self.generation, self.index, f) {
            Ok(t) => t,
            Err(e) => panic!("{e}")
        }
    }

    /// Return a clone of `value` for every matching call.
    #[track_caller]
    pub fn and_return(&mut self, value: R) -> &mut Self
        where R: Clone + Send
    {
        self.amend(|e| e.set_response(Response::returning(value)));
        self
    }

    /// Panic with `msg` at the call site for every matching call.
    #[track_caller]
    pub fn and_panic(&mut self, msg: impl Into<String>) -> &mut Self {
        let response = Response::panicking(msg);
        self.amend(|e| e.set_response(response));
        self
    }

    /// Compute the return value from the call's arguments.
    ///
    /// The closure runs after the control has released its lock, so it may
    /// call other methods of the mock.  An answer that ends up calling its own
    /// expectation again panics instead of recursing.
    #[track_caller]
    pub fn and_answer<F>(&mut self, f: F) -> &mut Self
        where F: FnMut(Arguments<'_>) -> R + Send + 'static,
              R: Send
    {
        self.amend(|e| e.set_response(Response::answering(f)));
        self
    }

    /// Single-threaded version of [`and_answer`](#method.and_answer), for
    /// closures that aren't `Send`.  Calling the mock method from a different
    /// thread than the one that set the answer is a runtime error.
    #[track_caller]
    pub fn and_answer_st<F>(&mut self, f: F) -> &mut Self
        where F: FnMut(Arguments<'_>) -> R + 'static,
              R: Send
    {
        self.amend(|e| e.set_response(Response::answering_st(f)));
        self
    }

    /// Return `value` for any number of matching calls, including none.
    ///
    /// Stubs never take part in strict ordering, and are only consulted once
    /// no ordinary expectation matches.
    #[track_caller]
    pub fn and_stub_return(&mut self, value: R) -> &mut Self
        where R: Clone + Send
    {
        self.amend(|e| {
            e.set_response(Response::returning(value));
            e.set_times(Times::any());
            e.set_stub(true);
        });
        self
    }

    /// Expect between `min` and `max` calls, inclusive.
    #[track_caller]
    pub fn times(&mut self, min: usize, max: usize) -> &mut Self {
        let times = Times::new(min, max);
        self.amend(|e| e.set_times(times));
        self
    }

    #[track_caller]
    pub fn once(&mut self) -> &mut Self {
        self.amend(|e| e.set_times(Times::once()));
        self
    }

    #[track_caller]
    pub fn times_exactly(&mut self, n: usize) -> &mut Self {
        self.amend(|e| e.set_times(Times::exactly(n)));
        self
    }

    #[track_caller]
    pub fn at_least_once(&mut self) -> &mut Self {
        self.amend(|e| e.set_times(Times::at_least(1)));
        self
    }

    /// Allow any number of calls, including none.
    #[track_caller]
    pub fn any_times(&mut self) -> &mut Self {
        self.amend(|e| e.set_times(Times::any()));
        self
    }

    #[track_caller]
    fn set_matcher(&mut self, index: usize, m: Box<dyn ArgumentMatcher>) {
        let (found, call) = self.amend(|e| {
            (e.set_matcher(index, m), e.signature().to_string())
        });
        assert!(found, "{call} has no argument #{index}");
    }

    /// Match argument number `index` with a [`Predicate`] instead of
    /// equality.
    ///
    /// # Examples
    /// ```
    /// # use replaymock::*;
    /// #[stand_in]
    /// trait Scale {
    ///     fn weigh(&self, grams: u32) -> bool;
    /// }
    ///
    /// let mut mock = create_mock::<MockScale>();
    /// expect(&mut mock, |m| m.weigh(0))
    ///     .with::<u32, _>(0, predicate::gt(100u32))
    ///     .and_return(true);
    /// replay(&mock);
    /// assert!(mock.weigh(250));
    /// verify(&mock);
    /// ```
    #[track_caller]
    pub fn with<T, P>(&mut self, index: usize, predicate: P) -> &mut Self
        where T: Argument,
              P: Predicate<T> + Send + Sync + 'static
    {
        let m = PredicateMatcher::<T, P>::new(predicate);
        self.set_matcher(index, Box::new(m));
        self
    }

    /// Match argument number `index` with a closure.
    ///
    /// Matchers run without the control's lock, so the closure may call other
    /// mocks, even ones sharing this mock's control.
    #[track_caller]
    pub fn withf<T, F>(&mut self, index: usize, f: F) -> &mut Self
        where T: Argument + Send + Sync,
              F: Fn(&T) -> bool + Send + Sync + 'static
    {
        self.with::<T, _>(index, predicate::function(f))
    }

    /// Accept any value of type `T` for argument number `index`.
    #[track_caller]
    pub fn with_any<T: Argument>(&mut self, index: usize) -> &mut Self {
        self.set_matcher(index, matcher::any::<T>());
        self
    }
}
