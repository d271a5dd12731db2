//! Aligned binary streams over borrowed memory.
//!
//! An [`OStream`] writes packed binary data into a byte region the caller
//! owns; an [`IStream`] reads it back in the same order. Plain-old-data
//! values are copied directly; structured values implement [`StreamWrite`]
//! and [`StreamRead`] (or derive them with the `macros` feature). Typed
//! access must be aligned to the value's natural alignment, relative to the
//! start of the region.
//!
//! # Streams
//!
//! ```
//! use memstream::{IStream, OStream};
//!
//! let mut region = [0u8; 16];
//! let mut os = OStream::new(&mut region);
//! os.put(&true).unwrap();
//! os.align(4).unwrap();
//! os.put(&1234u32).unwrap().put("hi").unwrap();
//! assert_eq!(os.pos(), 11);
//!
//! let mut is = IStream::new(&region);
//! assert!(is.get::<bool>().unwrap());
//! is.align(4).unwrap();
//! assert_eq!(is.get::<u32>().unwrap(), 1234);
//! assert_eq!(is.read_strz().unwrap(), "hi");
//! ```
//!
//! # Faults
//!
//! Running past the end of the region is a data fault: it is returned as a
//! [`StreamError`] or panics, depending on the stream's [`ErrorPolicy`].
//! Misaligned typed access and using a detached stream are programming
//! faults and always panic.
//!
//! ```
//! use memstream::{ErrorPolicy, OStream};
//!
//! let mut region = [0u8; 4];
//! let mut os = OStream::with_policy(&mut region, ErrorPolicy::Report);
//! let err = os.put(&0u64).unwrap_err();
//! assert_eq!((err.requested(), err.remaining()), (Some(8), Some(4)));
//! ```
//!
//! # Exceptions
//!
//! With the `std` feature, [`Exception`] records a [`Backtrace`] when it is
//! created and can be streamed like any other value, which makes it suitable
//! for crash logs kept in preallocated memory.
//!
//! ```
//! # #[cfg(feature = "std")] {
//! use memstream::{Exception, IStream, OStream, StreamWrite};
//!
//! let err = Exception::bad_cast();
//! let mut region = vec![0u8; err.stream_size()];
//! OStream::new(&mut region).put(&err).unwrap();
//!
//! let back: Exception = IStream::new(&region).get().unwrap();
//! assert_eq!(back.what(), "bad cast");
//! assert_eq!(back.backtrace(), err.backtrace());
//! # }
//! ```

#![no_std]
#![warn(missing_docs)]

pub use memstream_core::*;

#[cfg(feature = "macros")]
pub use memstream_macros::{StreamRead as DeriveStreamRead, StreamWrite as DeriveStreamWrite};
