//! Arena allocator for AST nodes.
//!
//! Uses `bumpalo` for bump allocation of immutable AST nodes. The whole
//! tree for one compilation unit lives in a single arena and is torn down
//! in one operation when the run ends; nodes hold plain `&'a` references
//! into it, so there are no ownership cycles to reason about.

use bumpalo::Bump;
use std::cell::UnsafeCell;

/// Arena allocator for one compilation unit.
///
/// SAFETY: single-threaded by design (UnsafeCell). One parser/pipeline
/// instance owns one arena; independent compilations use independent
/// arenas.
pub struct Arena {
    inner: UnsafeCell<Bump>,
}

impl Arena {
    /// Create a new, empty arena.
    pub fn new() -> Self {
        Arena {
            inner: UnsafeCell::new(Bump::new()),
        }
    }

    /// Allocate a value in the arena.
    pub fn alloc<T>(&self, value: T) -> &T {
        unsafe { (*self.inner.get()).alloc(value) }
    }

    /// Allocate a string in the arena.
    pub fn alloc_str(&self, s: &str) -> &str {
        unsafe { (*self.inner.get()).alloc_str(s) }
    }

    /// Allocate a vector of non-Copy items as a slice.
    pub fn alloc_slice_vec<T>(&self, vec: Vec<T>) -> &[T] {
        let bump = unsafe { &mut *self.inner.get() };
        bump.alloc_slice_fill_iter(vec)
    }

    /// Allocate any exact-size iterator of items as a slice (works with
    /// SmallVec, Vec, etc).
    pub fn alloc_slice_iter<T, I>(&self, iter: I) -> &[T]
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let bump = unsafe { &mut *self.inner.get() };
        bump.alloc_slice_fill_iter(iter)
    }

    /// Total bytes allocated so far (for diagnostics).
    pub fn allocated_bytes(&self) -> usize {
        unsafe { (*self.inner.get()).allocated_bytes() }
    }

    /// Reset the arena, freeing all allocations. The arena can be reused
    /// for another compilation afterwards.
    pub fn reset(&mut self) {
        unsafe {
            (*self.inner.get()).reset();
        }
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_alloc() {
        let arena = Arena::new();
        let val = arena.alloc(42);
        assert_eq!(*val, 42);
    }

    #[test]
    fn test_arena_slice() {
        let arena = Arena::new();
        let slice = arena.alloc_slice_vec(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(slice.len(), 2);
        assert_eq!(slice[1], "b");
    }
}
