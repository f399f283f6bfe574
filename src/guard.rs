//! Value-count ceiling for decoders.
//!
//! Decoders call [`ValueGuard::tick`] once for every node they produce (each
//! scalar and each container). Exceeding the ceiling aborts decoding with
//! [`Error::ResourceLimit`] before any later stage sees the tree.

use crate::{Error, Result};

#[derive(Clone, Debug)]
pub struct ValueGuard {
    limit: Option<u64>,
    count: u64,
}

impl ValueGuard {
    /// Zero or negative `max_values` means unlimited.
    #[must_use]
    pub fn new(max_values: i64) -> Self {
        ValueGuard {
            limit: u64::try_from(max_values).ok().filter(|n| *n > 0),
            count: 0,
        }
    }

    #[must_use]
    pub fn unlimited() -> Self {
        ValueGuard {
            limit: None,
            count: 0,
        }
    }

    #[inline]
    pub fn tick(&mut self) -> Result<()> {
        self.charge(1)
    }

    /// Accounts for `n` values at once, e.g. a whole aliased subtree.
    pub fn charge(&mut self, n: u64) -> Result<()> {
        self.count = self.count.saturating_add(n);
        match self.limit {
            Some(limit) if self.count > limit => {
                tracing::warn!(limit, count = self.count, "value ceiling exceeded");
                Err(Error::ResourceLimit { limit })
            }
            _ => Ok(()),
        }
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    #[must_use]
    pub fn limit(&self) -> Option<u64> {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceiling_is_inclusive() {
        let mut guard = ValueGuard::new(3);
        assert!(guard.tick().is_ok());
        assert!(guard.tick().is_ok());
        assert!(guard.tick().is_ok());
        assert!(matches!(guard.tick(), Err(Error::ResourceLimit { limit: 3 })));
    }

    #[test]
    fn test_non_positive_is_unlimited() {
        assert_eq!(ValueGuard::new(0).limit(), None);
        assert_eq!(ValueGuard::new(-1).limit(), None);

        let mut guard = ValueGuard::new(-1);
        assert!(guard.charge(u64::MAX).is_ok());
        assert!(guard.tick().is_ok());
        assert_eq!(guard.count(), u64::MAX);
    }

    #[test]
    fn test_charge() {
        let mut guard = ValueGuard::new(10);
        assert!(guard.charge(10).is_ok());
        assert!(guard.charge(1).is_err());
    }
}
