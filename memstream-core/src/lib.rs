//! Core implementation for memstream.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

#[cfg(feature = "alloc")]
extern crate alloc;
#[cfg(all(test, not(feature = "std")))]
extern crate std;

mod error;
mod impls;
mod istream;
mod ostream;
mod traits;

#[cfg(feature = "std")]
mod backtrace;
#[cfg(feature = "std")]
mod exception;
#[cfg(feature = "std")]
pub mod memory;

#[cfg(test)]
mod tests;

pub use error::{ErrorPolicy, Result, StreamError};
pub use istream::IStream;
pub use ostream::{OStream, SeekDir};
pub use traits::{DEFAULT_ALIGNMENT, Pod, StreamRead, StreamWrite, align_up};

#[cfg(feature = "std")]
pub use crate::backtrace::{Backtrace, MAX_FRAMES};
#[cfg(feature = "std")]
pub use exception::{Exception, ExceptionKind, Format, format};
