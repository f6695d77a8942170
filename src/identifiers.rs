//! Type-safe identifiers.
//!
//! Newtype wrappers prevent mixing connection generations with plain
//! counters at compile time.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// Generation
// ============================================================================

/// Identity of one transport instance.
///
/// Every `connect()` allocates the next generation. Transport signals carry
/// the generation they were produced by, so callbacks from a superseded
/// transport can be recognised and ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// Creates a generation from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the generation that follows this one.
    #[inline]
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen-{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_is_monotonic() {
        let first = Generation::default();
        let second = first.next();
        assert!(second > first);
        assert_eq!(second.get(), 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(Generation::new(7).to_string(), "gen-7");
    }
}
