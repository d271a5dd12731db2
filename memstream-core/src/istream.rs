//! Input stream over a caller-owned byte region.

use core::any::type_name;

use crate::error::{InvalidDataSnafu, UnderrunSnafu};
use crate::{DEFAULT_ALIGNMENT, ErrorPolicy, Pod, Result, SeekDir, StreamRead, align_up};

/// Reads packed binary data out of a borrowed byte region.
///
/// The read-side mirror of [`OStream`](crate::OStream): the same alignment
/// contract for typed reads, and running past the end is an underrun handled
/// according to the stream's [`ErrorPolicy`].
#[derive(Debug, Clone, Default)]
pub struct IStream<'a> {
    region: Option<&'a [u8]>,
    pos: usize,
    policy: ErrorPolicy,
}

impl<'a> IStream<'a> {
    /// Link a new stream to `region` with the default policy.
    #[must_use]
    pub fn new(region: &'a [u8]) -> Self {
        Self::with_policy(region, ErrorPolicy::default())
    }

    /// Link a new stream to `region` with an explicit policy.
    #[must_use]
    pub fn with_policy(region: &'a [u8], policy: ErrorPolicy) -> Self {
        Self {
            region: Some(region),
            pos: 0,
            policy,
        }
    }

    /// Create a stream with no region attached.
    #[must_use]
    pub fn detached(policy: ErrorPolicy) -> Self {
        Self {
            region: None,
            pos: 0,
            policy,
        }
    }

    /// Attach to `region`, resetting the cursor to 0.
    pub fn link(&mut self, region: &'a [u8]) {
        self.region = Some(region);
        self.pos = 0;
    }

    /// Attach to a different region, resetting the cursor to 0.
    pub fn relink(&mut self, region: &'a [u8]) {
        self.link(region);
    }

    /// Detach from the current region and hand it back.
    pub fn unlink(&mut self) -> Option<&'a [u8]> {
        self.pos = 0;
        self.region.take()
    }

    /// Whether a region is attached.
    #[inline]
    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.region.is_some()
    }

    /// The fault policy chosen at construction.
    #[inline]
    #[must_use]
    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// Current read offset.
    #[inline]
    #[must_use]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Length of the attached region (0 when detached).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.region.map_or(0, <[u8]>::len)
    }

    /// Whether the attached region has zero length.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes left between the cursor and the end of the region.
    #[inline]
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.len() - self.pos
    }

    /// Whether the cursor is a multiple of `grain`.
    #[inline]
    #[must_use]
    pub fn aligned(&self, grain: usize) -> bool {
        self.pos % grain == 0
    }

    /// Padding bytes `align(grain)` would skip.
    #[inline]
    #[must_use]
    pub fn align_size(&self, grain: usize) -> usize {
        align_up(self.pos, grain) - self.pos
    }

    /// The bytes not read yet.
    #[must_use]
    pub fn unread(&self) -> &'a [u8] {
        match self.region {
            Some(region) => &region[self.pos..],
            None => &[],
        }
    }

    #[track_caller]
    fn region(&self) -> &'a [u8] {
        match self.region {
            Some(region) => region,
            None => panic!("operation on a detached input stream"),
        }
    }

    /// Check that `n` more bytes are available, raising an underrun otherwise.
    #[track_caller]
    pub fn verify_remaining(&self, op: &'static str, type_name: &'static str, n: usize) -> Result<()> {
        assert!(self.is_linked(), "operation on a detached input stream");
        let remaining = self.remaining();
        if n <= remaining {
            return Ok(());
        }
        self.policy.raise(
            UnderrunSnafu {
                op,
                type_name,
                requested: n,
                position: self.pos,
                remaining,
            }
            .build(),
        )
    }

    /// Raise an [`InvalidData`](crate::StreamError::InvalidData) fault at the
    /// cursor under this stream's policy.
    #[track_caller]
    pub fn invalid<T>(&self, message: &'static str) -> Result<T> {
        self.policy.raise(
            InvalidDataSnafu {
                message,
                position: self.pos,
            }
            .build(),
        )
    }

    /// Move the cursor to `pos`.
    #[track_caller]
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        assert!(self.is_linked(), "operation on a detached input stream");
        if pos > self.len() {
            return self.policy.raise(
                UnderrunSnafu {
                    op: "seek",
                    type_name: "byte",
                    requested: pos,
                    position: self.pos,
                    remaining: self.len(),
                }
                .build(),
            );
        }
        self.pos = pos;
        Ok(())
    }

    /// Advance the cursor by `n` bytes.
    #[track_caller]
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.seek(self.pos.saturating_add(n))
    }

    /// Move the cursor relative to `dir`.
    #[track_caller]
    pub fn seek_by(&mut self, offset: isize, dir: SeekDir) -> Result<()> {
        let target = match dir {
            SeekDir::Begin => usize::try_from(offset).ok(),
            SeekDir::Current => self.pos.checked_add_signed(offset),
            SeekDir::End => offset
                .checked_neg()
                .and_then(|back| self.len().checked_add_signed(back)),
        };
        self.seek(target.unwrap_or(usize::MAX))
    }

    /// Fill `buf` from the cursor.
    #[track_caller]
    pub fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        let bytes = self.read_bytes(buf.len())?;
        buf.copy_from_slice(bytes);
        Ok(())
    }

    /// Borrow the next `n` bytes without copying.
    #[track_caller]
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.verify_remaining("read", "binary data", n)?;
        let bytes = &self.region()[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    /// Read a `T` by direct memory copy.
    ///
    /// # Panics
    ///
    /// If the cursor is not aligned to `align_of::<T>()`.
    #[track_caller]
    pub fn iread<T: Pod>(&mut self) -> Result<T> {
        assert!(
            self.aligned(core::mem::align_of::<T>()),
            "misaligned read of {} at offset {}",
            type_name::<T>(),
            self.pos
        );
        let size = core::mem::size_of::<T>();
        self.verify_remaining("read", type_name::<T>(), size)?;
        let bytes = &self.region()[self.pos..self.pos + size];
        match T::read_from_bytes(bytes) {
            Ok(value) => {
                self.pos += size;
                Ok(value)
            }
            Err(_) => self.invalid("size mismatch in direct read"),
        }
    }

    /// Skip up to the next multiple of `grain`.
    ///
    /// # Panics
    ///
    /// If `grain` is not a power of two.
    #[track_caller]
    pub fn align(&mut self, grain: usize) -> Result<&mut Self> {
        assert!(grain.is_power_of_two(), "alignment grain {grain} is not a power of two");
        let nb = self.align_size(grain);
        self.verify_remaining("align", "padding", nb)?;
        self.pos += nb;
        Ok(self)
    }

    /// Align to [`DEFAULT_ALIGNMENT`].
    #[track_caller]
    pub fn align_default(&mut self) -> Result<&mut Self> {
        self.align(DEFAULT_ALIGNMENT)
    }

    /// Read a NUL-terminated string, consuming the terminator.
    #[track_caller]
    pub fn read_strz(&mut self) -> Result<&'a str> {
        let unread = &self.region()[self.pos..];
        let Some(len) = unread.iter().position(|&b| b == 0) else {
            return self.policy.raise(
                UnderrunSnafu {
                    op: "read_strz",
                    type_name: "string",
                    requested: unread.len() + 1,
                    position: self.pos,
                    remaining: unread.len(),
                }
                .build(),
            );
        };
        let Ok(s) = core::str::from_utf8(&unread[..len]) else {
            return self.invalid("string is not valid UTF-8");
        };
        self.pos += len + 1;
        Ok(s)
    }

    /// Read any [`StreamRead`] value; `Pod` values take the direct path.
    #[track_caller]
    pub fn get<T: StreamRead>(&mut self) -> Result<T> {
        T::read(self)
    }
}
