// vim: tw=80
//! The record/replay state machine behind every stand-in.
use std::{
    fmt,
    mem,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing::{debug, trace, warn};

use crate::{
    behavior::{BehaviorMode, CallOrdering, UnmatchedCall},
    error::{MockError, MockResult, UnexpectedCall, VerificationFailure},
    expectation::{Expectation, Outcome, Response, Snapshot},
    interceptor::{Interceptor, MethodSignature, StandIn},
    matcher::{self, ArgumentMatcher},
    times::Times,
    value::{Argument, Arguments},
};

/// Lifecycle of a control.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LifecycleState {
    /// Calls on the stand-ins register expectations
    Record,
    /// Calls on the stand-ins are matched against the expectations
    Replay,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleState::Record => write!(f, "record"),
            LifecycleState::Replay => write!(f, "replay"),
        }
    }
}

struct ControlState {
    state: LifecycleState,
    expectations: Vec<Expectation>,
    /// Index of the last ordinary expectation matched in strict mode
    cursor: usize,
    unexpected: Vec<UnexpectedCall>,
    /// Bumped by every reset, so builders can't reach across one
    generation: u64,
}

impl ControlState {
    fn require(&self, state: LifecycleState, operation: &'static str)
        -> MockResult<()>
    {
        if self.state == state {
            Ok(())
        } else {
            Err(MockError::illegal_state(operation, self.state))
        }
    }

    fn unmet(&self) -> Vec<Snapshot> {
        self.expectations.iter()
            .filter(|e| !e.is_satisfied())
            .map(Expectation::snapshot)
            .collect()
    }

    fn mismatch(&self, sig: &MethodSignature, ordering: CallOrdering)
        -> Mismatch
    {
        // In strict mode, point at the call that was due
        let due = match ordering {
            CallOrdering::Strict => self.expectations.iter()
                .enumerate()
                .skip(self.cursor)
                .find(|(_, e)| !e.is_stub() && !e.is_satisfied())
                .map(|(i, _)| i),
            CallOrdering::Unordered => None,
        };
        let closest = matcher::closest_candidate(&self.expectations, sig,
                                                 ordering, self.cursor);
        let queue = self.expectations.iter()
            .map(Expectation::snapshot)
            .collect();
        Mismatch {
            queue,
            due,
            closest,
        }
    }

    /// Count a call matched by expectation `index`, unless a reset got in
    /// between.
    fn settle(&mut self, generation: u64, index: usize, ordering: CallOrdering)
    {
        if self.generation != generation {
            return;
        }
        let Some(e) = self.expectations.get_mut(index) else { return };
        if e.count_call() && ordering == CallOrdering::Strict && !e.is_stub() {
            self.cursor = index;
        }
    }

    fn remember(&mut self, generation: u64, unexpected: UnexpectedCall) {
        if self.generation == generation {
            self.unexpected.push(unexpected);
        }
    }
}

/// The queue as an unexpected call found it.
struct Mismatch {
    queue: Vec<Snapshot>,
    due: Option<usize>,
    closest: Option<usize>,
}

impl Mismatch {
    fn describe(&self, sig: &MethodSignature, args: &[&dyn Argument])
        -> UnexpectedCall
    {
        let queue = self.queue.iter()
            .enumerate()
            .map(|(i, e)| {
                let marker = if Some(i) == self.due { "-> " } else { "" };
                format!("{marker}{e}")
            }).collect();
        let explanation = self.closest
            .map(|i| self.queue[i].explain(args))
            .filter(|why| !why.is_empty());
        UnexpectedCall {
            call: format!("{sig}{:?}", Arguments::new(args)),
            queue,
            explanation,
        }
    }
}

struct Shared {
    mode: BehaviorMode,
    state: Mutex<ControlState>,
}

/// Owns the expectations of one or more stand-ins and drives them through
/// record, replay and verify.
///
/// `MockControl` is a handle: clones refer to the same control.  Each
/// stand-in's interceptor holds one, so a stand-in keeps its control alive.
/// Controls are `Send + Sync`, but a single control is meant to be driven
/// from one test thread at a time.
#[derive(Clone)]
pub struct MockControl {
    shared: Arc<Shared>,
}

impl MockControl {
    pub fn new(mode: BehaviorMode) -> Self {
        let state = ControlState {
            state: LifecycleState::Record,
            expectations: Vec::new(),
            cursor: 0,
            unexpected: Vec::new(),
            generation: 0,
        };
        MockControl {
            shared: Arc::new(Shared { mode, state: Mutex::new(state) })
        }
    }

    pub fn mode(&self) -> BehaviorMode {
        self.shared.mode
    }

    pub fn state(&self) -> LifecycleState {
        self.lock().state
    }

    /// Are `self` and `other` handles to the same control?
    pub fn same_as(&self, other: &MockControl) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    pub fn expectation_count(&self) -> usize {
        self.lock().expectations.len()
    }

    fn lock(&self) -> MutexGuard<'_, ControlState> {
        // No update leaves the state half done, so a lock poisoned by user
        // code unwinding, such as a `Drop` of a replaced response, is still
        // safe to use.
        self.shared.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a stand-in of type `M` bound to this control, intercepting all
    /// of its overridable methods.
    pub fn create_mock<M: StandIn>(&self) -> MockResult<M> {
        self.create(None)
    }

    /// Create a stand-in of type `M` bound to this control that intercepts
    /// only `methods`.  Every other method runs its real implementation.
    pub fn create_partial_mock<M: StandIn>(&self, methods: &[&str])
        -> MockResult<M>
    {
        self.create(Some(methods))
    }

    fn create<M: StandIn>(&self, restricted: Option<&[&str]>) -> MockResult<M>
    {
        self.lock().require(LifecycleState::Record, "creating a mock")?;
        let ty = M::type_description();
        let intercepted = ty.select_methods(restricted)?;
        let interceptor = Interceptor::new(self.clone(), ty, intercepted);
        debug!(type_name = ty.name(), id = %interceptor.id(),
               mode = %self.mode(), partial = restricted.is_some(),
               "created stand-in");
        Ok(M::from_interceptor(interceptor))
    }

    /// Append an expectation.  Returns its position in the queue.
    pub fn record(&self,
                  sig: MethodSignature,
                  matchers: Vec<Box<dyn ArgumentMatcher>>,
                  response: Response,
                  min_calls: usize,
                  max_calls: usize) -> MockResult<usize>
    {
        if min_calls > max_calls {
            return Err(MockError::InvalidRange {
                min: min_calls,
                max: max_calls,
            });
        }
        let times = Times::new(min_calls, max_calls);
        let mut st = self.lock();
        st.require(LifecycleState::Record, "recording an expectation")?;
        trace!(%sig, ?response, min_calls, max_calls, "recorded expectation");
        st.expectations.push(Expectation::new(sig, matchers, response, times));
        Ok(st.expectations.len() - 1)
    }

    /// Record a call made on a stand-in: each argument must equal the one
    /// given, exactly once, with no response yet.
    fn record_call(&self, sig: MethodSignature, args: &[&dyn Argument])
        -> MockResult<usize>
    {
        let matchers = args.iter().map(|a| a.to_matcher()).collect();
        self.record(sig, matchers, Response::Void, 1, 1)
    }

    /// Switch from record to replay.
    pub fn replay(&self) -> MockResult<()> {
        let mut st = self.lock();
        st.require(LifecycleState::Record, "replay")?;
        let missing = st.expectations.iter()
            .find(|e| e.lacks_behavior())
            .map(Expectation::snapshot);
        if let Some(e) = missing {
            drop(st);
            return Err(MockError::MissingBehavior { call: e.to_string() });
        }
        st.state = LifecycleState::Replay;
        st.cursor = 0;
        debug!(mode = %self.mode(), expectations = st.expectations.len(),
               "switched to replay");
        Ok(())
    }

    /// Answer a replayed call.
    ///
    /// Matchers and fixed return values may run user code, so they are
    /// evaluated without the lock.  A call is counted only once its outcome
    /// has been produced.
    pub fn invoke(&self, sig: MethodSignature, args: &[&dyn Argument])
        -> MockResult<Outcome>
    {
        const OPERATION: &str = "invoking a mocked method";
        let (generation, candidates) = {
            let st = self.lock();
            st.require(LifecycleState::Replay, OPERATION)?;
            (st.generation, matcher::candidates(&st.expectations, &sig))
        };
        let accepted = matcher::accepting(&candidates, args);
        let ordering = self.mode().ordering();
        let mut st = self.lock();
        st.require(LifecycleState::Replay, OPERATION)?;
        if st.generation != generation {
            return Err(MockError::illegal_state(
                "matching a call across a reset", st.state));
        }
        let found = matcher::find_match(&st.expectations, &sig, &accepted,
                                        ordering, st.cursor);
        if let Some(i) = found {
            let response = st.expectations[i].response().clone();
            drop(st);
            let outcome = response.outcome(&sig, args);
            self.lock().settle(generation, i, ordering);
            trace!(%sig, args = ?Arguments::new(args), expectation = i,
                   "matched call");
            return Ok(outcome);
        }
        match self.mode().on_unmatched() {
            UnmatchedCall::ReturnDefault => {
                drop(st);
                trace!(%sig, args = ?Arguments::new(args),
                       returns = ?sig.method().returns(),
                       "unexpected call answered with a default value");
                Ok(Outcome::Default)
            }
            UnmatchedCall::Fail => {
                let mismatch = st.mismatch(&sig, ordering);
                drop(st);
                let unexpected = mismatch.describe(&sig, args);
                warn!(call = %unexpected.call, mode = %self.mode(),
                      "unexpected call");
                self.lock().remember(generation, unexpected.clone());
                Err(MockError::UnexpectedCall(unexpected))
            }
        }
    }

    /// Route a call from a stand-in: recorded while recording, matched while
    /// replaying.
    pub fn dispatch(&self, sig: MethodSignature, args: &[&dyn Argument])
        -> MockResult<Outcome>
    {
        match self.state() {
            LifecycleState::Record => {
                self.record_call(sig, args)?;
                Ok(Outcome::Recorded)
            }
            LifecycleState::Replay => self.invoke(sig, args),
        }
    }

    /// Check that every expectation got its minimum number of calls, and
    /// that no unexpected call happened.
    pub fn verify(&self) -> MockResult<()> {
        self.check("verify", true, true)
    }

    /// Like [`verify`](#method.verify), but only checks call counts.
    pub fn verify_recording(&self) -> MockResult<()> {
        self.check("verify_recording", true, false)
    }

    /// Like [`verify`](#method.verify), but only checks for unexpected calls.
    pub fn verify_unexpected_calls(&self) -> MockResult<()> {
        self.check("verify_unexpected_calls", false, true)
    }

    fn check(&self, operation: &'static str, counts: bool, unexpected: bool)
        -> MockResult<()>
    {
        let (unmet, calls) = {
            let st = self.lock();
            st.require(LifecycleState::Replay, operation)?;
            let unmet = if counts { st.unmet() } else { Vec::new() };
            let calls = if unexpected {
                st.unexpected.clone()
            } else {
                Vec::new()
            };
            (unmet, calls)
        };
        let failure = VerificationFailure {
            unmet: unmet.iter().map(|e| e.to_string()).collect(),
            unexpected: calls,
        };
        if failure.is_empty() {
            debug!(operation, "verified");
            Ok(())
        } else {
            debug!(operation, unmet = failure.unmet.len(),
                   unexpected = failure.unexpected.len(),
                   "verification failed");
            Err(MockError::Verification(failure))
        }
    }

    /// Forget every expectation and remembered failure and go back to
    /// recording.  The behavior mode is kept.
    pub fn reset(&self) {
        let expectations = {
            let mut st = self.lock();
            st.unexpected.clear();
            st.cursor = 0;
            st.state = LifecycleState::Record;
            st.generation += 1;
            mem::take(&mut st.expectations)
        };
        // Dropping responses and matchers may run user code
        drop(expectations);
        debug!(mode = %self.mode(), "reset");
    }

    pub(crate) fn generation(&self) -> u64 {
        self.lock().generation
    }

    /// Modify a recorded expectation.  Only allowed while recording, and only
    /// for expectations recorded since the last reset.
    pub(crate) fn amend<F, T>(&self, generation: u64, index: usize, f: F)
        -> MockResult<T>
        where F: FnOnce(&mut Expectation) -> T
    {
        let mut st = self.lock();
        st.require(LifecycleState::Record, "modifying an expectation")?;
        if st.generation != generation {
            return Err(MockError::illegal_state(
                "modifying an expectation recorded before the last reset",
                st.state));
        }
        Ok(f(&mut st.expectations[index]))
    }
}

impl fmt::Debug for MockControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.lock();
        f.debug_struct("MockControl")
            .field("mode", &self.mode())
            .field("state", &st.state)
            .field("expectations", &st.expectations.len())
            .field("unexpected", &st.unexpected.len())
            .finish()
    }
}
