// vim: tw=80
//! Values crossing the interception boundary: call arguments going in and
//! default values coming out.
use downcast::{downcast, Any};
use predicates::prelude::predicate;
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque},
    fmt,
    rc::Rc,
    sync::Arc,
};

use crate::matcher::{ArgumentMatcher, PredicateMatcher};

/// A single argument of an intercepted call.
///
/// Implemented for every `'static` type that is `Clone`, `PartialEq`, `Debug`,
/// `Send` and `Sync`.  Recording a call captures each argument by value, and
/// the captured value becomes the argument's default equality matcher.
pub trait Argument: Any + fmt::Debug + 'static {
    /// Build the matcher used when this value is recorded without an explicit
    /// matcher.
    fn to_matcher(&self) -> Box<dyn ArgumentMatcher>;
}
downcast!(dyn Argument);

impl<T> Argument for T
    where T: Any + fmt::Debug + Clone + PartialEq + Send + Sync
{
    fn to_matcher(&self) -> Box<dyn ArgumentMatcher> {
        Box::new(PredicateMatcher::<T, _>::new(predicate::eq(self.clone())))
    }
}

/// The arguments of an intercepted call, as seen by an answer closure.
#[derive(Clone, Copy)]
pub struct Arguments<'a> {
    args: &'a [&'a dyn Argument],
}

impl<'a> Arguments<'a> {
    pub fn new(args: &'a [&'a dyn Argument]) -> Self {
        Arguments { args }
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Fetch argument `index` as a `T`.  Returns `None` if there is no such
    /// argument or it has a different type.
    pub fn get<T: Argument>(&self, index: usize) -> Option<&'a T> {
        let arg: &'a dyn Argument = *self.args.get(index)?;
        arg.downcast_ref::<T>().ok()
    }
}

impl fmt::Debug for Arguments<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{arg:?}")?;
        }
        write!(f, ")")
    }
}

/// Category of a method's declared return type.  Determines the value a nice
/// mock hands back for a call nobody expected.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ReturnKind {
    /// `()`
    Unit,
    /// `false`
    Bool,
    /// `0` of any integer or float type
    Numeric,
    /// `'\0'`
    Char,
    /// The empty string
    Text,
    /// An empty container
    Collection,
    /// `None`
    Optional,
    /// `Ok` wrapping the success type's default
    Fallible,
    /// A user type registered with [`default_return!`](crate::default_return)
    Custom,
    /// The method is never intercepted, so its return type is never
    /// synthesized.
    Opaque,
}

/// Types that an interceptable method may return.
///
/// The stand-in needs a value of the return type in two situations: while
/// recording, where the call only registers an expectation, and when a nice
/// mock receives a call nobody expected.
pub trait DefaultReturn: Sized {
    const KIND: ReturnKind;

    fn default_return() -> Self;
}

/// Implement [`DefaultReturn`] for user types via their `Default` impl.
///
/// # Examples
/// ```
/// # use replaymock::*;
/// #[derive(Clone, Debug, Default, PartialEq)]
/// struct Config {
///     retries: u32,
/// }
/// default_return!(Config);
///
/// assert_eq!(Config::default(), <Config as DefaultReturn>::default_return());
/// ```
#[macro_export]
macro_rules! default_return {
    ($($t:ty),+ $(,)?) => {
        $(
            impl $crate::DefaultReturn for $t {
                const KIND: $crate::ReturnKind = $crate::ReturnKind::Custom;

                fn default_return() -> Self {
                    <$t as ::std::default::Default>::default()
                }
            }
        )+
    };
}

macro_rules! zero_valued {
    ($kind:ident: $($t:ty),+) => {
        $(
            impl DefaultReturn for $t {
                const KIND: ReturnKind = ReturnKind::$kind;

                fn default_return() -> Self {
                    <$t>::default()
                }
            }
        )+
    };
}

zero_valued!(Unit: ());
zero_valued!(Bool: bool);
zero_valued!(Numeric: i8, i16, i32, i64, i128, isize,
                      u8, u16, u32, u64, u128, usize, f32, f64);
zero_valued!(Char: char);
zero_valued!(Text: String, &'static str);

impl<T> DefaultReturn for Vec<T> {
    const KIND: ReturnKind = ReturnKind::Collection;

    fn default_return() -> Self {
        Vec::new()
    }
}

impl<T> DefaultReturn for VecDeque<T> {
    const KIND: ReturnKind = ReturnKind::Collection;

    fn default_return() -> Self {
        VecDeque::new()
    }
}

impl<K, V> DefaultReturn for HashMap<K, V> {
    const KIND: ReturnKind = ReturnKind::Collection;

    fn default_return() -> Self {
        HashMap::new()
    }
}

impl<T> DefaultReturn for HashSet<T> {
    const KIND: ReturnKind = ReturnKind::Collection;

    fn default_return() -> Self {
        HashSet::new()
    }
}

impl<K, V> DefaultReturn for BTreeMap<K, V> {
    const KIND: ReturnKind = ReturnKind::Collection;

    fn default_return() -> Self {
        BTreeMap::new()
    }
}

impl<T> DefaultReturn for BTreeSet<T> {
    const KIND: ReturnKind = ReturnKind::Collection;

    fn default_return() -> Self {
        BTreeSet::new()
    }
}

impl<T> DefaultReturn for Option<T> {
    const KIND: ReturnKind = ReturnKind::Optional;

    fn default_return() -> Self {
        None
    }
}

impl<T: DefaultReturn, E> DefaultReturn for Result<T, E> {
    const KIND: ReturnKind = ReturnKind::Fallible;

    fn default_return() -> Self {
        Ok(T::default_return())
    }
}

impl<T: DefaultReturn> DefaultReturn for Box<T> {
    const KIND: ReturnKind = T::KIND;

    fn default_return() -> Self {
        Box::new(T::default_return())
    }
}

impl<T: DefaultReturn> DefaultReturn for Arc<T> {
    const KIND: ReturnKind = T::KIND;

    fn default_return() -> Self {
        Arc::new(T::default_return())
    }
}

impl<T: DefaultReturn> DefaultReturn for Rc<T> {
    const KIND: ReturnKind = T::KIND;

    fn default_return() -> Self {
        Rc::new(T::default_return())
    }
}

#[cfg(test)]
mod t {
    use super::*;

    #[test]
    fn arguments_get_by_type() {
        let x = 5u32;
        let s = String::from("five");
        let raw: [&dyn Argument; 2] = [&x, &s];
        let args = Arguments::new(&raw);
        assert_eq!(Some(&5u32), args.get::<u32>(0));
        assert_eq!(Some(&s), args.get::<String>(1));
        assert_eq!(None, args.get::<i64>(0));
        assert_eq!(None, args.get::<u32>(2));
        assert_eq!("(5, \"five\")", format!("{args:?}"));
    }

    #[test]
    fn kinds() {
        assert_eq!(ReturnKind::Unit, <() as DefaultReturn>::KIND);
        assert_eq!(ReturnKind::Numeric, <f64 as DefaultReturn>::KIND);
        assert_eq!(ReturnKind::Text, <&str as DefaultReturn>::KIND);
        assert_eq!(ReturnKind::Optional, <Box<Option<u8>> as DefaultReturn>::KIND);
        assert_eq!(ReturnKind::Fallible,
                   <Result<u8, String> as DefaultReturn>::KIND);
    }
}
