//! Serialization traits.
//!
//! Values reach a stream by one of two statically selected paths:
//!
//! - [`Pod`] types are copied bit for bit with [`OStream::iwrite`] and
//!   [`IStream::iread`]. Every `Pod` gets [`StreamWrite`] and [`StreamRead`]
//!   through blanket impls.
//! - Everything else implements [`StreamWrite`] and [`StreamRead`] itself,
//!   usually by writing its fields in order.
//!
//! Both paths share one call syntax: [`OStream::put`] and [`IStream::get`].

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{IStream, OStream, Result};

/// Alignment used by `align_default`: the native pointer alignment.
pub const DEFAULT_ALIGNMENT: usize = core::mem::align_of::<usize>();

/// Round `n` up to the next multiple of `grain`, which must be a power of two.
#[inline]
#[must_use]
pub const fn align_up(n: usize, grain: usize) -> usize {
    (n + grain - 1) & !(grain - 1)
}

/// Plain old data, written and read by direct memory copy.
///
/// Implemented for every primitive number and for arrays of `Pod`. A
/// `#[repr(C)]` struct with no padding can opt in by deriving the zerocopy
/// traits:
///
/// ```
/// use memstream_core::{OStream, IStream, Pod};
/// use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
///
/// #[derive(FromBytes, IntoBytes, Immutable, KnownLayout, Clone, Copy, Debug, PartialEq)]
/// #[repr(C)]
/// struct Point { x: i32, y: i32 }
///
/// impl Pod for Point {}
///
/// let mut buf = [0u8; 8];
/// OStream::new(&mut buf).put(&Point { x: 1, y: -1 }).unwrap();
/// let p: Point = IStream::new(&buf).get().unwrap();
/// assert_eq!(p, Point { x: 1, y: -1 });
/// ```
pub trait Pod: IntoBytes + FromBytes + Immutable + KnownLayout + Copy {}

/// A value that can write itself into an [`OStream`].
pub trait StreamWrite {
    /// Alignment the cursor must have before `write` is called.
    const ALIGN: usize = 1;

    /// Write the value at the current cursor.
    fn write(&self, os: &mut OStream<'_>) -> Result<()>;

    /// Exact number of bytes `write` emits, assuming the cursor starts
    /// aligned to [`ALIGN`](Self::ALIGN).
    fn stream_size(&self) -> usize;
}

/// A value that can be reconstructed from an [`IStream`].
pub trait StreamRead: Sized {
    /// Alignment the cursor must have before `read` is called.
    const ALIGN: usize = 1;

    /// Read a value from the current cursor.
    fn read(is: &mut IStream<'_>) -> Result<Self>;
}

impl<T: Pod> StreamWrite for T {
    const ALIGN: usize = core::mem::align_of::<T>();

    #[inline]
    fn write(&self, os: &mut OStream<'_>) -> Result<()> {
        os.iwrite(self)
    }

    #[inline]
    fn stream_size(&self) -> usize {
        core::mem::size_of::<T>()
    }
}

impl<T: Pod> StreamRead for T {
    const ALIGN: usize = core::mem::align_of::<T>();

    #[inline]
    fn read(is: &mut IStream<'_>) -> Result<Self> {
        is.iread()
    }
}
