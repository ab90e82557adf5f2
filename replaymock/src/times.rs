// vim: tw=80
use std::{fmt, ops::RangeInclusive};

/// Call-count bookkeeping for one expectation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Times {
    /// How many times has the expectation already been called?
    count: usize,
    range: RangeInclusive<usize>,
}

impl Times {
    /// Require between `min` and `max` calls, inclusive.
    pub fn new(min: usize, max: usize) -> Self {
        assert!(min <= max,
            "Minimum call count {min} exceeds maximum call count {max}");
        Times { count: 0, range: min..=max }
    }

    pub fn once() -> Self {
        Times::new(1, 1)
    }

    pub fn exactly(n: usize) -> Self {
        Times::new(n, n)
    }

    pub fn at_least(n: usize) -> Self {
        Times::new(n, usize::MAX)
    }

    pub fn any() -> Self {
        Times::new(0, usize::MAX)
    }

    /// Count one more call.  Callers must check [`is_exhausted`] first.
    ///
    /// [`is_exhausted`]: #method.is_exhausted
    pub(crate) fn call(&mut self) {
        debug_assert!(!self.is_exhausted(), "{self}");
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn min(&self) -> usize {
        *self.range.start()
    }

    pub fn max(&self) -> usize {
        *self.range.end()
    }

    /// Has this expectation already been called the maximum allowed number of
    /// times?
    pub fn is_exhausted(&self) -> bool {
        self.count >= self.max()
    }

    /// Has this expectation already been called the minimum required number of
    /// times?
    pub fn is_satisfied(&self) -> bool {
        self.count >= self.min()
    }
}

impl Default for Times {
    fn default() -> Self {
        Times::once()
    }
}

impl fmt::Display for Times {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let expected = match (self.min(), self.max()) {
            (min, max) if min == max => format!("{min}"),
            (0, usize::MAX) => "any".to_string(),
            (min, usize::MAX) => format!("at least {min}"),
            (min, max) => format!("between {min} and {max}"),
        };
        write!(f, "expected: {expected}, actual: {}", self.count)
    }
}

#[cfg(test)]
mod t {
    use super::*;

    #[test]
    fn once() {
        let mut t = Times::once();
        assert!(!t.is_satisfied());
        assert!(!t.is_exhausted());
        t.call();
        assert!(t.is_satisfied());
        assert!(t.is_exhausted());
    }

    #[test]
    fn range() {
        let mut t = Times::new(1, 3);
        t.call();
        assert!(t.is_satisfied());
        assert!(!t.is_exhausted());
        t.call();
        t.call();
        assert!(t.is_exhausted());
        assert_eq!(3, t.count());
    }

    #[test]
    fn never_is_born_exhausted() {
        let t = Times::exactly(0);
        assert!(t.is_satisfied());
        assert!(t.is_exhausted());
    }

    #[test]
    #[should_panic(expected = "exceeds maximum")]
    fn inverted_range() {
        Times::new(2, 1);
    }

    #[test]
    fn display() {
        assert_eq!("expected: 1, actual: 0", Times::once().to_string());
        assert_eq!("expected: any, actual: 0", Times::any().to_string());
        assert_eq!("expected: at least 1, actual: 0",
                   Times::at_least(1).to_string());
        assert_eq!("expected: between 1 and 3, actual: 0",
                   Times::new(1, 3).to_string());
    }
}
