//! Output stream over a caller-owned byte region.

use core::any::type_name;

use zerocopy::IntoBytes;

use crate::error::{InvalidDataSnafu, OverrunSnafu};
use crate::{DEFAULT_ALIGNMENT, ErrorPolicy, Pod, Result, StreamWrite, align_up};

/// Origin for [`OStream::seek_by`] and [`IStream::seek_by`](crate::IStream::seek_by).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekDir {
    /// Offset from the start of the region.
    Begin,
    /// Offset from the cursor.
    Current,
    /// Offset backwards from the end of the region.
    End,
}

/// Writes packed binary data into a borrowed byte region.
///
/// The stream never allocates: it holds a cursor into a region the caller
/// owns. Typed writes ([`iwrite`](Self::iwrite), [`put`](Self::put) for
/// [`Pod`] values) require the cursor to be aligned for the type; use
/// [`align`](Self::align) between heterogeneous fields. A misaligned typed
/// write panics. Running out of room is a data fault handled according to
/// the stream's [`ErrorPolicy`].
///
/// ```
/// use memstream_core::{OStream, IStream};
///
/// let mut buf = [0u8; 16];
/// let mut os = OStream::new(&mut buf);
/// os.put(&true)?.align(4)?;
/// os.put(&42u32)?.put(&1.5f32)?;
/// os.write(b"raw")?;
/// assert_eq!(os.pos(), 15);
///
/// let mut is = IStream::new(&buf);
/// assert!(is.get::<bool>()?);
/// is.align(4)?;
/// assert_eq!(is.get::<u32>()?, 42);
/// # Ok::<(), memstream_core::StreamError>(())
/// ```
#[derive(Debug, Default)]
pub struct OStream<'a> {
    region: Option<&'a mut [u8]>,
    pos: usize,
    policy: ErrorPolicy,
}

impl<'a> OStream<'a> {
    /// Link a new stream to `region` with the default policy.
    #[must_use]
    pub fn new(region: &'a mut [u8]) -> Self {
        Self::with_policy(region, ErrorPolicy::default())
    }

    /// Link a new stream to `region` with an explicit policy.
    #[must_use]
    pub fn with_policy(region: &'a mut [u8], policy: ErrorPolicy) -> Self {
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
    pub fn link(&mut self, region: &'a mut [u8]) {
        self.region = Some(region);
        self.pos = 0;
    }

    /// Attach to a different region, resetting the cursor to 0.
    pub fn relink(&mut self, region: &'a mut [u8]) {
        self.link(region);
    }

    /// Detach from the current region and hand it back.
    pub fn unlink(&mut self) -> Option<&'a mut [u8]> {
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

    /// Current write offset.
    #[inline]
    #[must_use]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Length of the attached region (0 when detached).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.region.as_deref().map_or(0, <[u8]>::len)
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

    /// Padding bytes `align(grain)` would emit.
    #[inline]
    #[must_use]
    pub fn align_size(&self, grain: usize) -> usize {
        align_up(self.pos, grain) - self.pos
    }

    /// Bytes written so far, i.e. the cursor.
    #[inline]
    #[must_use]
    pub fn stream_size(&self) -> usize {
        self.pos
    }

    /// The written prefix of the region.
    #[must_use]
    pub fn written(&self) -> &[u8] {
        match self.region.as_deref() {
            Some(region) => &region[..self.pos],
            None => &[],
        }
    }

    #[track_caller]
    fn region_mut(&mut self) -> &mut [u8] {
        match self.region.as_deref_mut() {
            Some(region) => region,
            None => panic!("operation on a detached output stream"),
        }
    }

    /// Check that `n` more bytes fit, raising an overrun otherwise.
    #[track_caller]
    pub fn verify_remaining(&self, op: &'static str, type_name: &'static str, n: usize) -> Result<()> {
        assert!(self.is_linked(), "operation on a detached output stream");
        let remaining = self.remaining();
        if n <= remaining {
            return Ok(());
        }
        self.policy.raise(
            OverrunSnafu {
                op,
                type_name,
                requested: n,
                position: self.pos,
                remaining,
            }
            .build(),
        )
    }

    /// Move the cursor to `pos`.
    #[track_caller]
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        assert!(self.is_linked(), "operation on a detached output stream");
        if pos > self.len() {
            return self.policy.raise(
                OverrunSnafu {
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

    /// Advance the cursor by `n` bytes without writing.
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

    /// Copy `bytes` in at the cursor.
    #[track_caller]
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.verify_remaining("write", "binary data", bytes.len())?;
        let pos = self.pos;
        self.region_mut()[pos..pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    /// Write `value` by direct memory copy.
    ///
    /// # Panics
    ///
    /// If the cursor is not aligned to `align_of::<T>()`.
    #[track_caller]
    pub fn iwrite<T: Pod>(&mut self, value: &T) -> Result<()> {
        assert!(
            self.aligned(core::mem::align_of::<T>()),
            "misaligned write of {} at offset {}",
            type_name::<T>(),
            self.pos
        );
        let bytes = value.as_bytes();
        self.verify_remaining("write", type_name::<T>(), bytes.len())?;
        let pos = self.pos;
        self.region_mut()[pos..pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    /// Write a slice of `Pod` values back to back.
    ///
    /// # Panics
    ///
    /// If the cursor is not aligned to `align_of::<T>()`.
    #[track_caller]
    pub fn iwrite_slice<T: Pod>(&mut self, values: &[T]) -> Result<()> {
        assert!(
            self.aligned(core::mem::align_of::<T>()),
            "misaligned write of [{}] at offset {}",
            type_name::<T>(),
            self.pos
        );
        let bytes = values.as_bytes();
        self.verify_remaining("write", type_name::<[T]>(), bytes.len())?;
        let pos = self.pos;
        self.region_mut()[pos..pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(())
    }

    /// Zero-fill up to the next multiple of `grain`.
    ///
    /// # Panics
    ///
    /// If `grain` is not a power of two.
    #[track_caller]
    pub fn align(&mut self, grain: usize) -> Result<&mut Self> {
        assert!(grain.is_power_of_two(), "alignment grain {grain} is not a power of two");
        let nb = self.align_size(grain);
        self.verify_remaining("align", "padding", nb)?;
        let pos = self.pos;
        self.region_mut()[pos..pos + nb].fill(0);
        self.pos += nb;
        Ok(self)
    }

    /// Align to [`DEFAULT_ALIGNMENT`].
    #[track_caller]
    pub fn align_default(&mut self) -> Result<&mut Self> {
        self.align(DEFAULT_ALIGNMENT)
    }

    /// Write `s` followed by a single NUL byte.
    ///
    /// A string containing NUL cannot be read back intact, so it is an
    /// [`InvalidData`](crate::StreamError::InvalidData) fault.
    #[track_caller]
    pub fn write_strz(&mut self, s: &str) -> Result<()> {
        if let Some(nul) = s.bytes().position(|b| b == 0) {
            return self.policy.raise(
                InvalidDataSnafu {
                    message: "string contains an interior NUL",
                    position: self.pos + nul,
                }
                .build(),
            );
        }
        self.verify_remaining("write_strz", "string", s.len() + 1)?;
        let pos = self.pos;
        let region = self.region_mut();
        region[pos..pos + s.len()].copy_from_slice(s.as_bytes());
        region[pos + s.len()] = 0;
        self.pos += s.len() + 1;
        Ok(())
    }

    /// Write any [`StreamWrite`] value; `Pod` values take the direct path.
    #[track_caller]
    pub fn put<T: StreamWrite + ?Sized>(&mut self, value: &T) -> Result<&mut Self> {
        value.write(self)?;
        Ok(self)
    }

    /// Open a zero-filled gap of `n` bytes at `pos`, shifting the written
    /// tail right. The cursor moves by `n` if it lies at or after `pos`.
    #[track_caller]
    pub fn insert(&mut self, pos: usize, n: usize) -> Result<()> {
        assert!(self.is_linked(), "operation on a detached output stream");
        let len = self.len();
        let end = self.pos;
        if end < pos {
            // Nothing written past `pos` yet, so there is no tail to move.
            if pos <= len {
                return Ok(());
            }
            return self.policy.raise(
                OverrunSnafu {
                    op: "insert",
                    type_name: "gap",
                    requested: pos,
                    position: end,
                    remaining: len,
                }
                .build(),
            );
        }
        self.verify_remaining("insert", "gap", n)?;
        let region = self.region_mut();
        region.copy_within(pos..end, pos + n);
        region[pos..pos + n].fill(0);
        self.pos += n;
        Ok(())
    }

    /// Remove `n` bytes at `pos`, shifting the written tail left.
    #[track_caller]
    pub fn erase(&mut self, pos: usize, n: usize) -> Result<()> {
        assert!(self.is_linked(), "operation on a detached output stream");
        let len = self.len();
        if pos.checked_add(n).is_none_or(|gap_end| gap_end > len) {
            return self.policy.raise(
                OverrunSnafu {
                    op: "erase",
                    type_name: "gap",
                    requested: n,
                    position: pos,
                    remaining: len.saturating_sub(pos),
                }
                .build(),
            );
        }
        let end = self.pos;
        let gap_end = pos + n;
        let new_end = if end >= gap_end {
            end - n
        } else {
            end.min(pos)
        };
        let region = self.region_mut();
        if gap_end < end {
            region.copy_within(gap_end..end, pos);
        }
        if new_end < end {
            region[new_end..end].fill(0);
        }
        self.pos = new_end;
        Ok(())
    }
}
