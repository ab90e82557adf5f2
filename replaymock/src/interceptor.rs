// vim: tw=80
//! The glue between a generated stand-in and its control.
use std::{
    any,
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::{
    control::MockControl,
    expectation::Outcome,
    type_desc::{MethodDescriptor, TypeDescription},
    value::{Argument, Arguments, DefaultReturn},
};

/// Process-unique identity of one stand-in's interceptor.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct InterceptorId(u64);

impl InterceptorId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        InterceptorId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for InterceptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One method of one particular stand-in.
///
/// The same method on two stand-ins of the same type are two different
/// signatures.
#[derive(Clone, Copy)]
pub struct MethodSignature {
    mock: InterceptorId,
    ty: &'static TypeDescription,
    index: usize,
}

impl MethodSignature {
    pub fn mock(&self) -> InterceptorId {
        self.mock
    }

    pub fn type_description(&self) -> &'static TypeDescription {
        self.ty
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn method(&self) -> &'static MethodDescriptor {
        &self.ty.methods()[self.index]
    }
}

impl PartialEq for MethodSignature {
    fn eq(&self, other: &Self) -> bool {
        self.mock == other.mock && self.index == other.index
    }
}

impl Eq for MethodSignature {}

impl fmt::Debug for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}.{}", self.ty.name(), self.mock, self.method().name())
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.ty.name(), self.method().name())
    }
}

/// Anything that owns an [`Interceptor`].  Object safe, so that several
/// stand-ins of different types can be replayed or verified together.
pub trait Mock {
    fn interceptor(&self) -> &Interceptor;
}

/// A generated stand-in type.  Usually implemented by
/// [`#[stand_in]`](crate::stand_in).
pub trait StandIn: Mock + Sized {
    fn type_description() -> &'static TypeDescription;

    /// Wrap a freshly created interceptor.  Use one of the `create_*`
    /// functions rather than calling this directly.
    fn from_interceptor(interceptor: Interceptor) -> Self;
}

/// The per-stand-in call router.
///
/// Every stand-in owns exactly one interceptor, created together with it.
/// The interceptor knows which of the type's methods are intercepted and
/// forwards those calls to its control; it has no matching logic of its own.
pub struct Interceptor {
    id: InterceptorId,
    control: MockControl,
    ty: &'static TypeDescription,
    intercepted: Box<[bool]>,
}

impl Interceptor {
    pub(crate) fn new(control: MockControl,
                      ty: &'static TypeDescription,
                      intercepted: Box<[bool]>) -> Self
    {
        debug_assert_eq!(ty.methods().len(), intercepted.len());
        Interceptor { id: InterceptorId::next(), control, ty, intercepted }
    }

    pub fn id(&self) -> InterceptorId {
        self.id
    }

    pub fn control(&self) -> &MockControl {
        &self.control
    }

    pub fn type_description(&self) -> &'static TypeDescription {
        self.ty
    }

    /// Should calls to method number `method` go through [`on_invoke`]?  If
    /// not, the stand-in runs the method's real implementation.
    ///
    /// [`on_invoke`]: #method.on_invoke
    pub fn intercepts(&self, method: usize) -> bool {
        self.intercepted.get(method).copied().unwrap_or(false)
    }

    pub fn signature(&self, method: usize) -> MethodSignature {
        assert!(method < self.ty.methods().len(),
            "{} has no method #{method}", self.ty.name());
        MethodSignature { mock: self.id, ty: self.ty, index: method }
    }

    /// Route an intercepted call to the control and turn its verdict into a
    /// return value.
    ///
    /// Panics at the call site if the call is unexpected, if the matched
    /// expectation was told to panic, or if the control is misused.
    #[track_caller]
    pub fn on_invoke<R>(&self, method: usize, args: &[&dyn Argument]) -> R
        where R: DefaultReturn + 'static
    {
        let sig = self.signature(method);
        let outcome = match self.control.dispatch(sig, args) {
            Ok(outcome) => outcome,
            Err(e) => panic!("{e}"),
        };
        match outcome {
            Outcome::Recorded | Outcome::Default | Outcome::Void =>
                R::default_return(),
            Outcome::Value(value) => downcast_return(sig, value),
            Outcome::Answer(answer) =>
                downcast_return(sig, answer.call(&sig, Arguments::new(args))),
            Outcome::Panic(msg) => panic!("{msg}"),
        }
    }
}

#[track_caller]
fn downcast_return<R: 'static>(sig: MethodSignature,
                               value: Box<dyn any::Any + Send>) -> R
{
    match value.downcast::<R>() {
        Ok(r) => *r,
        Err(_) => panic!("{sig} was given a response of the wrong type; \
                          expected {}", any::type_name::<R>()),
    }
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interceptor")
            .field("id", &self.id)
            .field("type", &self.ty.name())
            .field("mode", &self.control.mode())
            .finish()
    }
}

impl PartialEq for Interceptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Interceptor {}
