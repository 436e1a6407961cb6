//! `Weak<T>`, the non-owning handle.
//!
//! A `Weak` keeps the counter record alive but never the pointee, and never
//! drops the pointee. The only way to reach the pointee is to promote it,
//! either with [`Weak::lock`] or [`Sh::from_weak`].
use crate::{
    counter::{Counter, Raw},
    sh::Sh,
};
use core::{fmt, mem};

/// A nullable, single-threaded observer of a pointee owned by [`Sh`]s.
pub struct Weak<T: ?Sized> {
    pub(crate) raw: Option<Raw<T>>,
}

impl<T: ?Sized> Weak<T> {
    /// An empty weak handle, observing nothing. It is always expired.
    pub const fn new() -> Weak<T> {
        Weak { raw: None }
    }

    pub(crate) fn with_raw(raw: Option<Raw<T>>) -> Weak<T> {
        Weak { raw }
    }

    /// Moves the contents out, leaving `self` empty. No count changes.
    pub fn take(&mut self) -> Weak<T> {
        mem::take(self)
    }

    /// Makes `self` observe what `source` observes. Does nothing if they
    /// already observe the same group (or are both empty).
    pub fn assign(&mut self, source: &Weak<T>) {
        if self.ptr_eq(source) {
            return;
        }
        *self = source.clone();
    }

    /// Moves `source` into `self`, leaving `source` empty.
    ///
    /// If both already observe the same group, `self` keeps its registration
    /// and the one held by `source` is given up, so the weak count drops by
    /// one.
    pub fn assign_move(&mut self, source: &mut Weak<T>) {
        if !self.ptr_eq(source) {
            *self = source.take();
            return;
        }
        if let Some(raw) = source.raw.take() {
            let w = raw.counter().dec_weak();
            debug_assert!(w >= 1);
        }
    }

    /// Exchanges the contents of two handles. No count changes.
    pub fn swap(&mut self, other: &mut Weak<T>) {
        mem::swap(&mut self.raw, &mut other.raw);
    }

    /// Releases this observer and becomes empty.
    pub fn reset(&mut self) {
        drop(self.take());
    }

    /// Number of strong owners of the observed pointee; 0 if empty or
    /// expired.
    pub fn use_count(&self) -> usize {
        self.raw.map_or(0, |raw| raw.counter().strong())
    }

    /// Number of weak handles (this one included) observing the group; 0 if
    /// empty.
    pub fn weak_count(&self) -> usize {
        self.raw.map_or(0, |raw| raw.counter().weak())
    }

    /// Returns true if the pointee has been dropped (or this handle is
    /// empty). Once true, it stays true.
    pub fn expired(&self) -> bool {
        self.use_count() == 0
    }

    /// Returns a new strong handle to the pointee, or an empty one if it has
    /// already been dropped.
    pub fn lock(&self) -> Sh<T> {
        Sh::promote(self).unwrap_or_default()
    }

    /// Returns true if both handles observe the same group, or both are
    /// empty.
    pub fn ptr_eq(&self, other: &Weak<T>) -> bool {
        match (self.raw, other.raw) {
            (None, None) => true,
            (Some(a), Some(b)) => a.counter == b.counter,
            _ => false,
        }
    }
}

impl<T: ?Sized> Drop for Weak<T> {
    fn drop(&mut self) {
        let Some(raw) = self.raw.take() else {
            return;
        };
        let c = raw.counter();
        c.dec_weak();
        if c.is_dead() {
            // Safety: no strong or weak handle is left to observe the record.
            unsafe { Counter::free(raw.counter) }
        }
    }
}

impl<T: ?Sized> Clone for Weak<T> {
    fn clone(&self) -> Self {
        if let Some(raw) = self.raw {
            raw.counter().inc_weak();
        }
        Weak::with_raw(self.raw)
    }

    fn clone_from(&mut self, source: &Self) {
        self.assign(source);
    }
}

impl<T: ?Sized> Default for Weak<T> {
    fn default() -> Self {
        Weak::new()
    }
}

impl<T: ?Sized> From<&Sh<T>> for Weak<T> {
    fn from(sh: &Sh<T>) -> Self {
        Sh::downgrade(sh)
    }
}

impl<T: ?Sized> fmt::Debug for Weak<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(Weak)")
    }
}
