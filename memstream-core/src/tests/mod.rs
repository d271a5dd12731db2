//! Tests for memstream-core.

mod ostream;


#[cfg(feature = "std")]
mod exception;
