//! `Sh<T>`, the strong (owning) handle.
//!
//! Unlike `std::rc::Rc<T>`, an `Sh<T>` may be empty, and the counts live in a
//! separate allocation from the pointee, the way C++'s `shared_ptr` does it
//! when constructed from a raw pointer.
//!
//! Because `Sh<T>` dereferences to `T`, its own operations are associated
//! functions: `Sh::use_count(&p)` rather than `p.use_count()`.
use crate::{
    counter::{Counter, Raw},
    error::BadWeakReference,
    weak::Weak,
};
use alloc::boxed::Box;
use core::{borrow, fmt, marker::PhantomData, mem, ops::Deref, ptr::NonNull};

/// A nullable, single-threaded, reference-counted owning pointer.
///
/// The pointee is dropped when the last `Sh` of its group is released. The
/// counter record is freed when, in addition, no [`Weak`] refers to it.
///
/// `Sh` is neither `Send` nor `Sync`:
///
/// ```compile_fail
/// fn needs_send<T: Send>(_: T) {}
/// needs_send(shrc::Sh::new(1));
/// ```
pub struct Sh<T: ?Sized> {
    pub(crate) raw: Option<Raw<T>>,
    phantom: PhantomData<T>,
}

impl<T> Sh<T> {
    /// Moves `value` to the heap and returns its sole owner
    /// (`use_count() == 1`).
    pub fn new(value: T) -> Sh<T> {
        Sh::from_box(Box::new(value))
    }
}

impl<T: ?Sized> Sh<T> {
    /// An empty handle: no pointee, no counter record.
    pub const fn empty() -> Sh<T> {
        Sh {
            raw: None,
            phantom: PhantomData,
        }
    }

    /// Takes ownership of a boxed value, allocating a new counter record for
    /// it. The box is reused as-is; the counts live in a separate allocation.
    pub fn from_box(value: Box<T>) -> Sh<T> {
        Sh::with_raw(Some(Raw::from_box(value)))
    }

    /// Takes ownership of a raw pointer. A null pointer gives an empty handle.
    ///
    /// # Safety
    /// A non-null `ptr` must come from [`Box::into_raw`] and must not be owned
    /// by anything else.
    pub unsafe fn from_raw(ptr: *mut T) -> Sh<T> {
        match NonNull::new(ptr) {
            None => Sh::empty(),
            Some(p) => Sh::from_box(Box::from_raw(p.as_ptr())),
        }
    }

    pub(crate) fn with_raw(raw: Option<Raw<T>>) -> Sh<T> {
        Sh {
            raw,
            phantom: PhantomData,
        }
    }

    /// Promotes a weak handle, failing with [`BadWeakReference`] if it is
    /// empty or expired. On failure `weak` is left as it was.
    ///
    /// See [`Weak::lock`] for the non-failing version that returns an empty
    /// handle instead.
    pub fn from_weak(weak: &Weak<T>) -> Result<Sh<T>, BadWeakReference> {
        match Sh::promote(weak) {
            Some(sh) => Ok(sh),
            None => {
                log::debug!("promotion of an expired weak reference");
                Err(BadWeakReference)
            }
        }
    }

    pub(crate) fn promote(weak: &Weak<T>) -> Option<Sh<T>> {
        let raw = weak.raw?;
        if raw.counter().inc_strong_if_nonzero() {
            Some(Sh::with_raw(Some(raw)))
        } else {
            None
        }
    }

    /// Returns a [`Weak`] observing the same pointee. Downgrading an empty
    /// handle gives an empty `Weak`.
    pub fn downgrade(this: &Sh<T>) -> Weak<T> {
        if let Some(raw) = this.raw {
            raw.counter().inc_weak();
        }
        Weak::with_raw(this.raw)
    }

    /// Moves the contents out, leaving `this` empty. No count changes.
    pub fn take(this: &mut Sh<T>) -> Sh<T> {
        mem::take(this)
    }

    /// Makes `this` share ownership with `source`. Does nothing if they
    /// already belong to the same group (or are both empty).
    pub fn assign(this: &mut Sh<T>, source: &Sh<T>) {
        if Sh::ptr_eq(this, source) {
            return;
        }
        *this = source.clone();
    }

    /// Moves `source` into `this`, leaving `source` empty.
    ///
    /// If both already belong to the same group, `this` keeps its
    /// registration and the one held by `source` is given up, so the strong
    /// count drops by one.
    pub fn assign_move(this: &mut Sh<T>, source: &mut Sh<T>) {
        if !Sh::ptr_eq(this, source) {
            *this = Sh::take(source);
            return;
        }
        if let Some(raw) = source.raw.take() {
            // `this` still holds a registration, so this can't reach zero
            let s = raw.counter().dec_strong();
            debug_assert!(s >= 1);
        }
    }

    /// Releases the current pointee (if any), then takes ownership of `value`
    /// with a fresh counter record, or becomes empty for `None`.
    ///
    /// Weak handles into the old group never observe the new pointee.
    pub fn assign_box(this: &mut Sh<T>, value: Option<Box<T>>) {
        Sh::reset(this);
        this.raw = value.map(Raw::from_box);
    }

    /// Releases the current pointee (if any) and becomes empty.
    pub fn reset(this: &mut Sh<T>) {
        drop(Sh::take(this));
    }

    /// Releases the current pointee (if any) and takes ownership of `value`
    /// with a fresh counter record.
    pub fn reset_with(this: &mut Sh<T>, value: Box<T>) {
        Sh::assign_box(this, Some(value));
    }

    /// Exchanges the contents of two handles. No count changes.
    pub fn swap(this: &mut Sh<T>, other: &mut Sh<T>) {
        mem::swap(&mut this.raw, &mut other.raw);
    }

    /// Borrows the pointee, or `None` if empty.
    pub fn get(this: &Sh<T>) -> Option<&T> {
        // Safety: while we hold a strong registration the pointee is alive.
        this.raw.as_ref().map(|raw| unsafe { raw.ptr.as_ref() })
    }

    /// The raw pointee address, or `None` if empty. Ownership is not
    /// transferred.
    pub fn as_ptr(this: &Sh<T>) -> Option<NonNull<T>> {
        this.raw.map(|raw| raw.ptr)
    }

    /// Returns a mutable reference into the given `Sh`, if there are no
    /// other `Sh` or `Weak` handles to the same pointee.
    pub fn get_mut(this: &mut Sh<T>) -> Option<&mut T> {
        match this.raw {
            Some(raw) if raw.counter().strong() == 1 && raw.counter().weak() == 0 => {
                // Safety: we are the only handle of any kind.
                Some(unsafe { &mut *raw.ptr.as_ptr() })
            }
            _ => None,
        }
    }

    /// Number of strong handles sharing this pointee; 0 if empty.
    pub fn use_count(this: &Sh<T>) -> usize {
        this.raw.map_or(0, |raw| raw.counter().strong())
    }

    /// Number of weak handles observing this pointee; 0 if empty.
    pub fn weak_count(this: &Sh<T>) -> usize {
        this.raw.map_or(0, |raw| raw.counter().weak())
    }

    pub fn is_empty(this: &Sh<T>) -> bool {
        this.raw.is_none()
    }

    pub fn is_some(this: &Sh<T>) -> bool {
        this.raw.is_some()
    }

    /// Returns true if both handles share a counter record, or both are
    /// empty.
    pub fn ptr_eq(this: &Sh<T>, other: &Sh<T>) -> bool {
        match (this.raw, other.raw) {
            (None, None) => true,
            (Some(a), Some(b)) => a.counter == b.counter,
            _ => false,
        }
    }
}

/// Allocates `value` and wraps it in its sole owning handle. Same as
/// [`Sh::new`].
pub fn make_shared<T>(value: T) -> Sh<T> {
    Sh::new(value)
}

// Drops one strong registration. The last one drops the pointee, and frees
// the record too if no weak handles are left.
unsafe fn release_strong<T: ?Sized>(raw: Raw<T>) {
    let c = raw.counter();
    if c.dec_strong() != 0 {
        return;
    }
    // The pointee may own weak handles into its own group; keep the record
    // registered until its destructor has finished.
    c.inc_weak();
    log::trace!("dropping pointee {:p}", raw.ptr);
    drop(Box::from_raw(raw.ptr.as_ptr()));
    if c.dec_weak() == 0 {
        Counter::free(raw.counter);
    }
}

impl<T: ?Sized> Drop for Sh<T> {
    fn drop(&mut self) {
        if let Some(raw) = self.raw.take() {
            // Safety: `raw` was our own registration and is now forgotten.
            unsafe { release_strong(raw) }
        }
    }
}

impl<T: ?Sized> Clone for Sh<T> {
    fn clone(&self) -> Self {
        if let Some(raw) = self.raw {
            raw.counter().inc_strong();
        }
        Sh::with_raw(self.raw)
    }

    fn clone_from(&mut self, source: &Self) {
        Sh::assign(self, source);
    }
}

impl<T: ?Sized> Default for Sh<T> {
    fn default() -> Self {
        Sh::empty()
    }
}

impl<T: ?Sized> Deref for Sh<T> {
    type Target = T;

    /// # Panics
    /// If the handle is empty.
    #[track_caller]
    fn deref(&self) -> &T {
        match Sh::get(self) {
            Some(v) => v,
            None => empty_deref(),
        }
    }
}

#[cold]
#[track_caller]
fn empty_deref() -> ! {
    panic!("dereferenced an empty Sh")
}

impl<T: ?Sized> AsRef<T> for Sh<T> {
    fn as_ref(&self) -> &T {
        self
    }
}

impl<T: ?Sized> borrow::Borrow<T> for Sh<T> {
    fn borrow(&self) -> &T {
        self
    }
}

impl<T> From<T> for Sh<T> {
    fn from(value: T) -> Self {
        Sh::new(value)
    }
}

impl<T: ?Sized> From<Box<T>> for Sh<T> {
    fn from(value: Box<T>) -> Self {
        Sh::from_box(value)
    }
}

impl<T: ?Sized> From<Option<Box<T>>> for Sh<T> {
    fn from(value: Option<Box<T>>) -> Self {
        value.map_or_else(Sh::empty, Sh::from_box)
    }
}

impl<T: ?Sized> TryFrom<&Weak<T>> for Sh<T> {
    type Error = BadWeakReference;

    fn try_from(weak: &Weak<T>) -> Result<Self, Self::Error> {
        Sh::from_weak(weak)
    }
}

impl<T: ?Sized + fmt::Display> fmt::Display for Sh<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Sh::get(self) {
            Some(v) => fmt::Display::fmt(v, f),
            None => f.write_str("(empty)"),
        }
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Sh<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Sh::get(self) {
            Some(v) => fmt::Debug::fmt(v, f),
            None => f.write_str("(empty)"),
        }
    }
}

impl<T: ?Sized> fmt::Pointer for Sh<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = Sh::as_ptr(self).map_or(core::ptr::null(), |p| p.as_ptr() as *const ());
        fmt::Pointer::fmt(&p, f)
    }
}
