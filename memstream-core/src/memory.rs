//! Fallible allocation that reports failure as an [`Exception`].

use std::vec::Vec;

use crate::Exception;

/// Allocate `n` zeroed bytes.
///
/// If the allocation cannot be satisfied, `on_failure` is called with a
/// [`BadAlloc`](crate::ExceptionKind::BadAlloc) exception before that
/// exception is returned. The hook is how an embedding environment (a crash
/// logger, an out-of-memory policy) learns about the failure; this crate
/// installs no global handler.
///
/// ```
/// use memstream_core::{ExceptionKind, memory};
///
/// let region = memory::try_alloc(64, |_| unreachable!()).unwrap();
/// assert_eq!(region.len(), 64);
///
/// let mut seen = None;
/// let err = memory::try_alloc(usize::MAX, |e| seen = Some(e.format())).unwrap_err();
/// assert_eq!(seen, Some(err.format()));
/// assert!(matches!(err.kind(), ExceptionKind::BadAlloc { .. }));
/// ```
pub fn try_alloc<F>(n: usize, on_failure: F) -> Result<Vec<u8>, Exception>
where
    F: FnOnce(&Exception),
{
    let mut region = Vec::new();
    if region.try_reserve_exact(n).is_err() {
        tracing::warn!(bytes = n, "allocation failed");
        let err = Exception::bad_alloc(n);
        on_failure(&err);
        return Err(err);
    }
    region.resize(n, 0);
    Ok(region)
}
