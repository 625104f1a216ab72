//! Atomic add on a single floating-point cell component.
//!
//! The Esirkepov depositor's `W` build is the one phase with write-write
//! contention: multiple particles may target the same cell component on the
//! same step. Hardware atomic float add isn't universally available, so
//! this is a CAS loop over the `f64`'s raw bit pattern rather than a mutex —
//! the contended path stays lock-free under `rayon`'s work-stealing.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::Float;

/// A single `Float` cell that supports lock-free concurrent accumulation.
/// Bit-for-bit equivalent to a plain `Float` at rest; `AtomicF64` only
/// changes how writes during a parallel deposition pass are serialised.
#[derive(Debug)]
#[repr(transparent)]
pub struct AtomicF64(AtomicU64);

impl AtomicF64 {
    pub fn new(value: Float) -> AtomicF64 {
        AtomicF64(AtomicU64::new(value.to_bits()))
    }

    pub fn load(&self) -> Float {
        Float::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn store(&self, value: Float) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }

    /// `atomic_add(cell_component, value)`: adds `value` to the current
    /// contents, retrying the compare-and-swap until it is not raced.
    pub fn atomic_add(&self, value: Float) {
        let mut current = self.0.load(Ordering::Relaxed);
        loop {
            let new = (Float::from_bits(current) + value).to_bits();
            match self
                .0
                .compare_exchange_weak(current, new, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return,
                Err(observed) => current = observed,
            }
        }
    }
}

impl Clone for AtomicF64 {
    fn clone(&self) -> AtomicF64 {
        AtomicF64::new(self.load())
    }
}

impl Default for AtomicF64 {
    fn default() -> AtomicF64 {
        AtomicF64::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn add_accumulates_sequentially() {
        let cell = AtomicF64::new(1.0);
        cell.atomic_add(2.5);
        assert_eq!(cell.load(), 3.5);
    }

    #[test]
    fn add_is_race_free_under_contention() {
        let cell = AtomicF64::new(0.0);
        (0..10_000).into_par_iter().for_each(|_| cell.atomic_add(1.0));
        assert_eq!(cell.load(), 10_000.0);
    }
}
