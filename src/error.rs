use core::fmt;

/// Returned by [`Sh::from_weak`][crate::Sh::from_weak] when the weak handle
/// is empty or its pointee has already been dropped.
///
/// The weak handle passed in is left untouched, and no strong handle is
/// created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BadWeakReference;

impl fmt::Display for BadWeakReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("bad weak reference: the pointee has already been dropped")
    }
}

impl core::error::Error for BadWeakReference {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{boxed::Box, error::Error, string::ToString};

    #[test]
    fn test_display() {
        assert_eq!(
            BadWeakReference.to_string(),
            "bad weak reference: the pointee has already been dropped"
        );
    }

    #[test]
    fn test_boxed() {
        let e: Box<dyn Error> = Box::new(BadWeakReference);
        assert!(e.source().is_none());
        assert!(e.downcast_ref::<BadWeakReference>().is_some());
    }
}
