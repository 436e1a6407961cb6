//! Counts heap allocations per thread to check that pointees and counter
//! records are each freed exactly once.
use shrc::{make_shared, Sh, Weak};
use std::{
    alloc::{GlobalAlloc, Layout, System},
    cell::Cell,
};

struct Counting;

thread_local! {
    static ALLOCS: Cell<usize> = const { Cell::new(0) };
    static FREES: Cell<usize> = const { Cell::new(0) };
}

unsafe impl GlobalAlloc for Counting {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let _ = ALLOCS.try_with(|n| n.set(n.get() + 1));
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        let _ = FREES.try_with(|n| n.set(n.get() + 1));
        System.dealloc(ptr, layout)
    }
}

#[global_allocator]
static GLOBAL: Counting = Counting;

/// (allocations, frees) on this thread so far.
fn counts() -> (usize, usize) {
    (ALLOCS.with(Cell::get), FREES.with(Cell::get))
}

/// Allocation and free counts made by `f` on this thread.
fn measure(f: impl FnOnce()) -> (usize, usize) {
    let (a0, f0) = counts();
    f();
    let (a1, f1) = counts();
    (a1 - a0, f1 - f0)
}

struct Payload(#[allow(dead_code)] u64);

#[test]
fn test_owned_then_dropped() {
    // pointee + counter record
    assert_eq!(measure(|| drop(make_shared(Payload(1)))), (2, 2));
}

#[test]
fn test_copies_share_one_record() {
    let (allocs, frees) = measure(|| {
        let a = Sh::new(Payload(1));
        let b = a.clone();
        let c = b.clone();
        assert_eq!(Sh::use_count(&c), 3);
        drop((a, b, c));
    });
    assert_eq!((allocs, frees), (2, 2));
}

#[test]
fn test_weak_keeps_record_not_pointee() {
    let mut frees_at_strong_drop = 0;
    let (allocs, frees) = measure(|| {
        let (_, f0) = counts();
        let a = Sh::new(Payload(1));
        let w = Sh::downgrade(&a);
        let w2 = w.clone();
        drop(a);
        frees_at_strong_drop = counts().1 - f0;
        assert!(w.expired());
        drop(w);
        drop(w2);
    });
    // only the pointee goes with the last strong handle
    assert_eq!(frees_at_strong_drop, 1);
    assert_eq!((allocs, frees), (2, 2));
}

#[test]
fn test_weak_dropped_first() {
    let (allocs, frees) = measure(|| {
        let a = Sh::new(Payload(1));
        let w = Sh::downgrade(&a);
        drop(w);
        drop(a);
    });
    assert_eq!((allocs, frees), (2, 2));
}

#[test]
fn test_empty_handles_allocate_nothing() {
    let (allocs, frees) = measure(|| {
        let e: Sh<Payload> = Sh::empty();
        let w = Sh::downgrade(&e);
        assert!(Sh::is_empty(&w.lock()));
        let w2: Weak<Payload> = Weak::new();
        drop((e, w, w2));
    });
    assert_eq!((allocs, frees), (0, 0));
}

#[test]
fn test_failed_promotion_leaks_nothing() {
    let (allocs, frees) = measure(|| {
        let a = Sh::new(Payload(1));
        let w = Sh::downgrade(&a);
        drop(a);
        assert!(Sh::from_weak(&w).is_err());
        assert!(Sh::is_empty(&w.lock()));
        drop(w);
    });
    assert_eq!((allocs, frees), (2, 2));
}

#[test]
fn test_assign_box_allocates_fresh_record() {
    let (allocs, frees) = measure(|| {
        let mut a = Sh::new(Payload(1));
        let w = Sh::downgrade(&a);
        // old pointee freed; old record kept by `w`; new pointee and record
        Sh::assign_box(&mut a, Some(Box::new(Payload(2))));
        assert!(w.expired());
        drop(w);
        drop(a);
    });
    assert_eq!((allocs, frees), (4, 4));
}

#[test]
fn test_reset_and_move_assign() {
    let (allocs, frees) = measure(|| {
        let mut a = Sh::new(Payload(1));
        let mut b = a.clone();
        Sh::assign_move(&mut a, &mut b);
        assert_eq!(Sh::use_count(&a), 1);
        Sh::reset(&mut a);
        Sh::reset(&mut b);
    });
    assert_eq!((allocs, frees), (2, 2));
}
