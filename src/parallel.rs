//! The parallel loop driver: dispatches a functor over the indices of an
//! output array. Every per-step phase, over either all cells or all
//! particles of one species, goes through one of these, so a future swap of
//! the underlying scheduler touches only this module; every hot loop is
//! driven through `rayon::prelude::*`'s `par_iter_mut`/`par_iter`.

use rayon::prelude::*;

/// Runs `f(index, &mut out[index])` for every index of `out`, in parallel,
/// with no ordering guarantee between indices — the algorithms this backs
/// are commutative under summation where they accumulate.
pub fn for_each_indexed<T, F>(out: &mut [T], f: F)
where
    T: Send,
    F: Fn(usize, &mut T) + Sync,
{
    out.par_iter_mut().enumerate().for_each(|(i, slot)| f(i, slot));
}

/// Runs `f(item)` over every element of `items`, in parallel. Used for the
/// mover/pusher phases, which iterate one species' particle array.
pub fn for_each<T, F>(items: &mut [T], f: F)
where
    T: Send,
    F: Fn(&mut T) + Sync,
{
    items.par_iter_mut().for_each(f);
}

/// Read-only parallel dispatch, for phases that only gather from shared
/// state (the depositor's `W` build reads particles but writes through
/// [`crate::atomic::AtomicF64`], so it goes through this form instead of
/// `for_each`).
pub fn for_each_ref<T, F>(items: &[T], f: F)
where
    T: Sync,
    F: Fn(&T) + Sync,
{
    items.par_iter().for_each(f);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_each_indexed_visits_every_slot() {
        let mut out = vec![0i64; 100];
        for_each_indexed(&mut out, |i, slot| *slot = i as i64);
        assert_eq!(out, (0..100).collect::<Vec<i64>>());
    }

    #[test]
    fn for_each_mutates_every_item() {
        let mut items = vec![1, 2, 3];
        for_each(&mut items, |x| *x *= 10);
        assert_eq!(items, vec![10, 20, 30]);
    }
}
