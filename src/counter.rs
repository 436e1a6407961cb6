//! The counter record shared by every handle in one ownership group.
//!
//! A record is born with one strong owner and no weak observers, lives in its
//! own heap allocation next to (not inside) the pointee, and is freed exactly
//! once by whichever handle observes both counts at zero.
use alloc::boxed::Box;
use core::{cell::Cell, ptr::NonNull};

pub(crate) struct Counter {
    strong: Cell<usize>,
    weak: Cell<usize>,
}

impl Counter {
    /// Allocates a record for a freshly owned pointee: strong=1, weak=0.
    pub(crate) fn alloc() -> NonNull<Counter> {
        let b = Box::new(Counter {
            strong: Cell::new(1),
            weak: Cell::new(0),
        });
        NonNull::from(Box::leak(b))
    }

    /// # Safety
    /// `ptr` must come from [`Counter::alloc`], both counts must be zero and
    /// no handle may touch the record afterwards.
    pub(crate) unsafe fn free(ptr: NonNull<Counter>) {
        debug_assert_eq!(ptr.as_ref().strong.get(), 0);
        debug_assert_eq!(ptr.as_ref().weak.get(), 0);
        log::trace!("freeing counter record {:p}", ptr);
        drop(Box::from_raw(ptr.as_ptr()));
    }

    pub(crate) fn strong(&self) -> usize {
        self.strong.get()
    }

    pub(crate) fn weak(&self) -> usize {
        self.weak.get()
    }

    pub(crate) fn inc_strong(&self) {
        self.strong.set(self.strong.get() + 1);
    }

    /// Increments the strong count unless it is already zero. Returns whether
    /// the increment happened.
    pub(crate) fn inc_strong_if_nonzero(&self) -> bool {
        let s = self.strong.get();
        if s == 0 {
            return false;
        }
        self.strong.set(s + 1);
        true
    }

    /// Returns the new strong count.
    pub(crate) fn dec_strong(&self) -> usize {
        let s = self.strong.get() - 1;
        self.strong.set(s);
        s
    }

    pub(crate) fn inc_weak(&self) {
        self.weak.set(self.weak.get() + 1);
    }

    /// Returns the new weak count.
    pub(crate) fn dec_weak(&self) -> usize {
        let w = self.weak.get() - 1;
        self.weak.set(w);
        w
    }

    pub(crate) fn is_dead(&self) -> bool {
        self.strong.get() == 0 && self.weak.get() == 0
    }
}

/// Pointee and counter record of a non-empty handle. Keeping them together
/// makes "null pointer iff null counter" hold by construction.
pub(crate) struct Raw<T: ?Sized> {
    pub(crate) ptr: NonNull<T>,
    pub(crate) counter: NonNull<Counter>,
}

impl<T: ?Sized> Clone for Raw<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Raw<T> {}

impl<T: ?Sized> Raw<T> {
    /// Takes ownership of a boxed pointee and gives it a fresh record.
    pub(crate) fn from_box(value: Box<T>) -> Raw<T> {
        Raw {
            ptr: NonNull::from(Box::leak(value)),
            counter: Counter::alloc(),
        }
    }

    pub(crate) fn counter(&self) -> &Counter {
        // Safety: the record outlives every handle registered on it, and a
        // `Raw` is only reachable through such a handle.
        unsafe { self.counter.as_ref() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_record() {
        let p = Counter::alloc();
        let c = unsafe { p.as_ref() };
        assert_eq!((c.strong(), c.weak()), (1, 0));
        assert!(!c.is_dead());
        assert_eq!(c.dec_strong(), 0);
        assert!(c.is_dead());
        unsafe { Counter::free(p) };
    }

    #[test]
    fn test_inc_if_nonzero() {
        let p = Counter::alloc();
        let c = unsafe { p.as_ref() };
        assert!(c.inc_strong_if_nonzero());
        assert_eq!(c.strong(), 2);
        c.dec_strong();
        c.dec_strong();
        c.inc_weak();
        assert!(!c.inc_strong_if_nonzero());
        assert_eq!((c.strong(), c.weak()), (0, 1));
        assert_eq!(c.dec_weak(), 0);
        unsafe { Counter::free(p) };
    }
}
