//! Length limits applied when resolving descriptors from untrusted data.

use crate::Error;
use core::ops::{Bound, RangeBounds};

/// Range of lengths a fixable descriptor accepts when it reads a length prefix
/// from a byte span.
///
/// Limits are only consulted on the data path: a value supplied by the caller
/// is already in memory and is never rejected for its size.
///
/// # Examples
///
/// ```
/// use commonware_beet::RangeCfg;
///
/// let cfg = RangeCfg::new(0..=1024);
/// assert!(cfg.contains(500));
/// assert!(!cfg.contains(2000));
///
/// // Unbounded by default
/// assert!(RangeCfg::default().contains(usize::MAX));
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct RangeCfg {
    start: Bound<usize>,
    end: Bound<usize>,
}

impl Default for RangeCfg {
    fn default() -> Self {
        Self::new(..)
    }
}

impl RangeCfg {
    /// Creates a new `RangeCfg` from any range of lengths.
    pub fn new(r: impl RangeBounds<usize>) -> Self {
        Self {
            start: r.start_bound().cloned(),
            end: r.end_bound().cloned(),
        }
    }

    /// Creates a `RangeCfg` that only accepts exactly `len`.
    pub fn exact(len: usize) -> Self {
        Self {
            start: Bound::Included(len),
            end: Bound::Included(len),
        }
    }

    /// Returns true if `len` is within this range.
    pub fn contains(&self, len: usize) -> bool {
        match self.start {
            Bound::Included(s) if len < s => return false,
            Bound::Excluded(s) if len <= s => return false,
            _ => {}
        }
        match self.end {
            Bound::Included(e) if len > e => return false,
            Bound::Excluded(e) if len >= e => return false,
            _ => {}
        }
        true
    }

    /// Returns `len` if it is within this range, otherwise [Error::InvalidLength].
    pub fn check(&self, len: usize) -> Result<usize, Error> {
        if !self.contains(len) {
            return Err(Error::InvalidLength(len));
        }
        Ok(len)
    }
}

impl<R: RangeBounds<usize>> From<R> for RangeCfg {
    fn from(r: R) -> Self {
        Self::new(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        let cfg = RangeCfg::new(2..5);
        assert!(!cfg.contains(1));
        assert!(cfg.contains(2));
        assert!(cfg.contains(4));
        assert!(!cfg.contains(5));

        let cfg: RangeCfg = (..=3).into();
        assert!(cfg.contains(0));
        assert!(cfg.contains(3));
        assert!(!cfg.contains(4));

        let cfg = RangeCfg::new((Bound::Excluded(1), Bound::Unbounded));
        assert!(!cfg.contains(1));
        assert!(cfg.contains(2));
    }

    #[test]
    fn test_exact() {
        let cfg = RangeCfg::exact(7);
        assert!(cfg.contains(7));
        assert!(!cfg.contains(6));
        assert!(!cfg.contains(8));
    }

    #[test]
    fn test_check() {
        let cfg = RangeCfg::new(..10);
        assert_eq!(cfg.check(9), Ok(9));
        assert_eq!(cfg.check(10), Err(Error::InvalidLength(10)));
    }
}
