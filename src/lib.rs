/*!
This crate provides [`Sh<T>`] and [`Weak<T>`], single-threaded reference-counted
pointers with the observable behavior of C++'s
[`shared_ptr`](https://en.cppreference.com/w/cpp/memory/shared_ptr) and
[`weak_ptr`](https://en.cppreference.com/w/cpp/memory/weak_ptr): both handles
may be empty, strong and weak counts are exact and queryable, and a weak
handle promotes to a strong one only while the pointee is alive.

```rust
    use shrc::{make_shared, Sh, Weak};

    let mut s1 = make_shared(42);
    assert_eq!(Sh::use_count(&s1), 1);

    let mut s2 = s1.clone();
    assert_eq!(Sh::use_count(&s1), 2);
    assert_eq!(Sh::use_count(&s2), 2);

    let w: Weak<i32> = Sh::downgrade(&s1);
    assert!(!w.expired());
    assert_eq!(w.use_count(), 2);

    Sh::reset(&mut s1);
    Sh::reset(&mut s2);
    assert!(w.expired());
    assert!(Sh::is_empty(&w.lock()));
```

# Ownership model

Every non-empty handle belongs to one *ownership group*: a pointee plus a
separately allocated counter record holding a strong and a weak count.

- Each [`Sh`] is one strong registration. The pointee is dropped exactly once,
  when the strong count goes to zero, even if weak handles remain.
- Each [`Weak`] is one weak registration. It keeps the counter record alive,
  never the pointee.
- The counter record is freed exactly once, by whichever handle leaves both
  counts at zero.

Once the strong count reaches zero it never goes back up: [`Weak::expired`]
stays true, [`Weak::lock`] returns an empty `Sh`, and [`Sh::from_weak`] fails.

# Promotion

There are two ways to turn a `Weak` into an `Sh`:

```rust
    use shrc::{BadWeakReference, Sh};

    let s = Sh::new(String::from("x"));
    let w = Sh::downgrade(&s);

    // `lock` never fails; an expired handle gives an empty `Sh`.
    assert_eq!(*w.lock(), "x");

    // `from_weak` reports an expired handle as an error.
    drop(s);
    assert_eq!(Sh::from_weak(&w).err(), Some(BadWeakReference));
    assert!(Sh::is_empty(&w.lock()));
```

# Assignment

Rust assignment (`a = b`) already releases the old value and moves the new one
in, and `Clone` covers copies. The C++-style operations are also available
explicitly, with their count semantics:

- [`Sh::assign`] (also [`Clone::clone_from`]) copies, and does nothing when
  both handles are already in the same group.
- [`Sh::assign_move`] moves and leaves the source empty. When both handles are
  already in the same group, the duplicate registration is given up.
- [`Sh::assign_box`], [`Sh::reset_with`] and [`Sh::from_box`] always create a
  fresh counter record for the new pointee, so weak handles into the old group
  never see it.

```rust
    use shrc::Sh;

    let a = Sh::new(1);
    let mut b = a.clone();
    let w = Sh::downgrade(&b);

    Sh::assign_box(&mut b, Some(Box::new(2)));
    assert_eq!(Sh::use_count(&a), 1);
    assert_eq!(Sh::use_count(&b), 1);
    assert_eq!(w.use_count(), 1);
    assert_eq!(*w.lock(), 1);
```

# Differences from `std::rc::Rc`

`Sh<T>` can be empty, like `Option<Rc<T>>` folded into the pointer.
Dereferencing an empty `Sh` panics; use [`Sh::get`] to check first.

The counts live in their own allocation, next to the pointee rather than in
front of it. [`Sh::from_box`] therefore takes a box over as-is, including
unsized ones like `Box<str>` or `Box<dyn Trait>`, and allocates only the
counter record.

`Rc::weak_count` hides an implicit weak reference owned by the strong ones;
here there is none, and [`Sh::weak_count`] is the number of live `Weak`s.

There are no comparison operators and no atomic variant; handles are neither
`Send` nor `Sync`.

# Logging

Pointee drops and counter record frees are logged at `trace` level, and
failed promotions at `debug` level, through the [`log`] facade.
*/
#![no_std]
#[cfg(test)]
extern crate std;

extern crate alloc;

mod counter;
mod error;
pub mod sh;
pub mod weak;

pub use self::error::BadWeakReference;
pub use self::sh::{make_shared, Sh};
pub use self::weak::Weak;
