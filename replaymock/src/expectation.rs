// vim: tw=80
//! Recorded expectations and the responses they produce.
use fragile::Fragile;
use std::{
    any,
    fmt,
    sync::{Arc, Mutex, TryLockError},
};

use crate::{
    interceptor::MethodSignature,
    matcher::{self, ArgumentMatcher},
    times::Times,
    value::{Argument, Arguments, ReturnKind},
};

pub(crate) type AnyBox = Box<dyn any::Any + Send>;

type AnswerFn = dyn for<'a> FnMut(Arguments<'a>) -> AnyBox + Send;

/// A shareable answer closure.  It's cloned out of the control before being
/// called, so the answer may call into the mock, though not back into itself.
#[derive(Clone)]
pub struct Answer(Arc<Mutex<Box<AnswerFn>>>);

impl Answer {
    fn new<F>(f: F) -> Self
        where F: for<'a> FnMut(Arguments<'a>) -> AnyBox + Send + 'static
    {
        let boxed: Box<AnswerFn> = Box::new(f);
        Answer(Arc::new(Mutex::new(boxed)))
    }

    /// Run the closure for a call to `sig`.
    ///
    /// # Panics
    ///
    /// If the closure is already running, i.e. it called `sig` again.
    #[track_caller]
    pub(crate) fn call(&self, sig: &MethodSignature, args: Arguments<'_>)
        -> AnyBox
    {
        let mut f = match self.0.try_lock() {
            Ok(f) => f,
            Err(TryLockError::Poisoned(e)) => e.into_inner(),
            Err(TryLockError::WouldBlock) =>
                panic!("the response for {sig} called itself recursively"),
        };
        (*f)(args)
    }
}

impl fmt::Debug for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Answer")
    }
}

/// What a matched expectation does.
#[derive(Clone)]
pub enum Response {
    /// Return the unit value.  The only valid response for methods returning
    /// `()`, and the placeholder for everything else until a real response is
    /// supplied.
    Void,
    /// Return a clone of a fixed value
    Return(Answer),
    /// Compute the return value from the call's arguments
    Answer(Answer),
    /// Unwind at the call site with this message
    Panic(String),
}

impl Response {
    pub fn returning<R>(value: R) -> Self
        where R: Clone + Send + 'static
    {
        Response::Return(Answer::new(move |_| -> AnyBox {
            Box::new(value.clone())
        }))
    }

    pub fn answering<R, F>(mut f: F) -> Self
        where F: FnMut(Arguments<'_>) -> R + Send + 'static,
              R: Send + 'static
    {
        Response::Answer(Answer::new(move |args: Arguments<'_>| -> AnyBox {
            Box::new(f(args))
        }))
    }

    /// Single-threaded version of [`answering`](#method.answering).  The
    /// closure need not be `Send`, but it is a runtime error to call the mock
    /// method from a different thread than the one that supplied it.
    pub fn answering_st<R, F>(f: F) -> Self
        where F: FnMut(Arguments<'_>) -> R + 'static,
              R: Send + 'static
    {
        let mut fragile = Fragile::new(f);
        Response::answering(move |args| (fragile.get_mut())(args))
    }

    pub fn panicking(msg: impl Into<String>) -> Self {
        Response::Panic(msg.into())
    }

    /// Turn the response into the outcome of one call.  Fixed return values
    /// are cloned here, so this must run without the control's lock.
    pub(crate) fn outcome(&self,
                          sig: &MethodSignature,
                          args: &[&dyn Argument]) -> Outcome
    {
        match self {
            Response::Void => Outcome::Void,
            Response::Return(value) =>
                Outcome::Value(value.call(sig, Arguments::new(args))),
            Response::Answer(answer) => Outcome::Answer(answer.clone()),
            Response::Panic(msg) => Outcome::Panic(msg.clone()),
        }
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Void => write!(f, "Void"),
            Response::Return(_) => write!(f, "Return"),
            Response::Answer(_) => write!(f, "Answer"),
            Response::Panic(msg) => write!(f, "Panic({msg:?})"),
        }
    }
}

/// The result of dispatching a call to a control, before it is turned into
/// the method's return type.
#[derive(Debug)]
pub enum Outcome {
    /// The call was recorded, not replayed
    Recorded,
    /// A nice mock didn't expect the call
    Default,
    Void,
    Value(AnyBox),
    Answer(Answer),
    Panic(String),
}

pub(crate) type Matchers = Vec<Arc<dyn ArgumentMatcher>>;

pub(crate) struct Expectation {
    sig: MethodSignature,
    matchers: Matchers,
    response: Response,
    times: Times,
    stub: bool,
}

impl Expectation {
    pub fn new(sig: MethodSignature,
               matchers: Vec<Box<dyn ArgumentMatcher>>,
               response: Response,
               times: Times) -> Self
    {
        let matchers = matchers.into_iter()
            .map(Arc::<dyn ArgumentMatcher>::from)
            .collect();
        Expectation { sig, matchers, response, times, stub: false }
    }

    pub fn signature(&self) -> &MethodSignature {
        &self.sig
    }

    pub fn matchers(&self) -> &Matchers {
        &self.matchers
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn is_stub(&self) -> bool {
        self.stub
    }

    pub fn is_exhausted(&self) -> bool {
        self.times.is_exhausted()
    }

    pub fn is_satisfied(&self) -> bool {
        self.times.is_satisfied()
    }

    /// Does this expectation still lack a response it needs?
    pub fn lacks_behavior(&self) -> bool {
        matches!(self.response, Response::Void) &&
            self.sig.method().returns() != ReturnKind::Unit
    }

    /// Count one matched call.  Returns false if the expectation has no calls
    /// left.
    pub fn count_call(&mut self) -> bool {
        if self.times.is_exhausted() {
            return false;
        }
        self.times.call();
        true
    }

    /// Replace the matcher for argument `index`.  Returns false if the method
    /// has no such argument.
    pub fn set_matcher(&mut self, index: usize, m: Box<dyn ArgumentMatcher>)
        -> bool
    {
        match self.matchers.get_mut(index) {
            Some(slot) => {
                *slot = Arc::from(m);
                true
            }
            None => false
        }
    }

    pub fn set_response(&mut self, response: Response) {
        self.response = response;
    }

    pub fn set_times(&mut self, times: Times) {
        self.times = times;
    }

    pub fn set_stub(&mut self, stub: bool) {
        self.stub = stub;
    }

    /// Copy what's needed to describe this expectation once the control's
    /// lock is released.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            sig: self.sig,
            matchers: self.matchers.clone(),
            times: self.times.clone(),
            stub: self.stub,
        }
    }
}

/// An expectation as it was at some moment, detached from its control.
/// Rendering it runs the matchers' `Display`, which may be user code.
#[derive(Clone)]
pub(crate) struct Snapshot {
    sig: MethodSignature,
    matchers: Matchers,
    times: Times,
    stub: bool,
}

impl Snapshot {
    pub fn explain(&self, args: &[&dyn Argument]) -> String {
        matcher::explain_all(&self.matchers, args)
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.sig)?;
        for (i, m) in self.matchers.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{m}")?;
        }
        write!(f, "): {}", self.times)?;
        if self.stub {
            write!(f, " (stub)")?;
        }
        Ok(())
    }
}
