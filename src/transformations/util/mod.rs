//! Utility functions for transformations.
//!
//! Helpers shared by handlers: get-or-create lookups, follow bookkeeping,
//! activity emission and content summaries.

pub mod effects;
pub mod entities;
pub mod follows;
pub mod summary;

/// Add one to a counter.
pub fn increment(counter: &mut u32) {
    *counter = counter.saturating_add(1);
}

/// Subtract one from a counter, stopping at zero.
pub fn decrement(counter: &mut u32) {
    *counter = counter.saturating_sub(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_never_go_negative() {
        let mut count = 1;
        decrement(&mut count);
        decrement(&mut count);
        assert_eq!(count, 0);
        increment(&mut count);
        assert_eq!(count, 1);
    }
}
