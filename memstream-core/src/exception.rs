//! Exceptions that carry their backtrace and serialize themselves.
//!
//! An [`Exception`] is a closed set of error kinds plus the backtrace of the
//! point where it was created. Its binary form starts with a format tag, so
//! a reader can rebuild the right kind:
//!
//! ```text
//! u32 format tag | u32 total size | kind fields | backtrace block
//! ```
//!
//! Tags this build does not know are kept as [`ExceptionKind::Unknown`],
//! with the rest of the record preserved verbatim.

use std::fmt::{self, Write as _};
use std::string::String;
use std::vec::Vec;

use crate::{Backtrace, IStream, OStream, Result, StreamRead, StreamWrite};

/// Format tag identifying an exception's kind on the wire.
pub type Format = u32;

/// Known format tags.
pub mod format {
    use super::Format;

    /// [`ExceptionKind::Generic`](super::ExceptionKind::Generic).
    pub const EXCEPTION: Format = 0;
    /// [`ExceptionKind::BadAlloc`](super::ExceptionKind::BadAlloc).
    pub const BAD_ALLOC: Format = 1;
    /// [`ExceptionKind::BadCast`](super::ExceptionKind::BadCast).
    pub const BAD_CAST: Format = 2;
    /// [`ExceptionKind::BadTypeid`](super::ExceptionKind::BadTypeid).
    pub const BAD_TYPEID: Format = 3;

    /// Whether `tag` names a kind this build decodes.
    #[must_use]
    pub const fn is_known(tag: Format) -> bool {
        tag <= BAD_TYPEID
    }
}

const HEADER_SIZE: usize = 8;

const fn max_align(a: usize, b: usize) -> usize {
    if a > b { a } else { b }
}

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExceptionKind {
    /// An unspecified error.
    Generic,
    /// A failed downcast.
    BadCast,
    /// A type identity lookup on something that has none.
    BadTypeid,
    /// A memory allocation that could not be satisfied.
    BadAlloc {
        /// Size of the failed request.
        bytes_requested: u64,
    },
    /// A record written with a tag this build does not know. The tag is
    /// never one of the [`format`] constants.
    Unknown {
        /// The tag as read.
        format: Format,
        /// Everything after the header, kept verbatim.
        payload: Vec<u8>,
    },
}

impl ExceptionKind {
    /// The wire tag of this kind.
    #[must_use]
    pub fn format(&self) -> Format {
        match self {
            Self::Generic => format::EXCEPTION,
            Self::BadCast => format::BAD_CAST,
            Self::BadTypeid => format::BAD_TYPEID,
            Self::BadAlloc { .. } => format::BAD_ALLOC,
            Self::Unknown { format, .. } => *format,
        }
    }

    /// Short description.
    #[must_use]
    pub fn what(&self) -> &'static str {
        match self {
            Self::Generic => "error",
            Self::BadCast => "bad cast",
            Self::BadTypeid => "bad typeid",
            Self::BadAlloc { .. } => "memory allocation failed",
            Self::Unknown { .. } => "unknown error",
        }
    }

    fn default_template(&self) -> &'static str {
        match self {
            Self::BadAlloc { .. } => "failed to allocate {bytes} bytes",
            Self::Unknown { .. } => "{what} (format {format})",
            _ => "{what}",
        }
    }

    fn fields_size(&self) -> usize {
        match self {
            Self::BadAlloc { .. } => core::mem::size_of::<u64>(),
            _ => 0,
        }
    }
}

/// An error value with the backtrace of its construction point.
///
/// Every constructor walks the stack, so build exceptions where they are
/// raised, not speculatively. Symbol names are only looked up when the
/// backtrace is rendered as text.
///
/// ```
/// use memstream_core::{Exception, IStream, OStream, StreamWrite};
///
/// let err = Exception::bad_alloc(4096);
/// let mut buf = vec![0u8; err.stream_size()];
///
/// OStream::new(&mut buf).put(&err).unwrap();
/// let back: Exception = IStream::new(&buf).get().unwrap();
/// assert_eq!(back.to_string(), "failed to allocate 4096 bytes");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exception {
    kind: ExceptionKind,
    backtrace: Backtrace,
}

impl Exception {
    /// A generic error.
    #[must_use]
    pub fn new() -> Self {
        Self::from_kind(ExceptionKind::Generic)
    }

    /// A failed downcast.
    #[must_use]
    pub fn bad_cast() -> Self {
        Self::from_kind(ExceptionKind::BadCast)
    }

    /// A failed type identity lookup.
    #[must_use]
    pub fn bad_typeid() -> Self {
        Self::from_kind(ExceptionKind::BadTypeid)
    }

    /// A failed allocation of `bytes_requested` bytes.
    #[must_use]
    pub fn bad_alloc(bytes_requested: usize) -> Self {
        Self::from_kind(ExceptionKind::BadAlloc {
            bytes_requested: bytes_requested as u64,
        })
    }

    /// An exception of the given kind, capturing the current backtrace.
    ///
    /// # Panics
    ///
    /// If `kind` is [`ExceptionKind::Unknown`] with a known format tag; such
    /// a record would decode as the known kind and fail its size check.
    #[must_use]
    pub fn from_kind(kind: ExceptionKind) -> Self {
        if let ExceptionKind::Unknown { format: tag, .. } = &kind {
            assert!(
                !format::is_known(*tag),
                "format tag {tag} belongs to a known exception kind"
            );
        }
        Self {
            kind,
            backtrace: Backtrace::capture(),
        }
    }

    /// The kind of error.
    #[must_use]
    pub fn kind(&self) -> &ExceptionKind {
        &self.kind
    }

    /// The wire tag, used to pick a message template or rebuild the kind.
    #[must_use]
    pub fn format(&self) -> Format {
        self.kind.format()
    }

    /// Short description.
    #[must_use]
    pub fn what(&self) -> &'static str {
        self.kind.what()
    }

    /// Where the exception was created.
    #[must_use]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Append a human-readable message to `buf`.
    ///
    /// `template` replaces the kind's default message. It may reference
    /// `{what}`, `{format}` and, for allocation failures, `{bytes}`. Any
    /// other brace group is copied through unchanged.
    pub fn info(&self, buf: &mut String, template: Option<&str>) {
        let mut rest = template.unwrap_or_else(|| self.kind.default_template());
        while let Some(open) = rest.find('{') {
            buf.push_str(&rest[..open]);
            let tail = &rest[open..];
            let Some(close) = tail.find('}') else {
                rest = tail;
                break;
            };
            let placeholder = &tail[..=close];
            let _ = match (&tail[1..close], &self.kind) {
                ("what", _) => buf.write_str(self.what()),
                ("format", _) => write!(buf, "{}", self.format()),
                ("bytes", ExceptionKind::BadAlloc { bytes_requested }) => {
                    write!(buf, "{bytes_requested}")
                }
                _ => buf.write_str(placeholder),
            };
            rest = &tail[close + 1..];
        }
        buf.push_str(rest);
    }

    /// Write the default message into `out`.
    pub fn text_write<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        let mut msg = String::new();
        self.info(&mut msg, None);
        out.write_str(&msg)
    }
}

impl Default for Exception {
    fn default() -> Self {
        Self::new()
    }
}

/// The message; `{:#}` appends the backtrace, one frame per line.
impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.text_write(f)?;
        if f.alternate() {
            f.write_char('\n')?;
            self.backtrace.text_write(f)?;
        }
        Ok(())
    }
}

impl std::error::Error for Exception {}

impl StreamWrite for Exception {
    const ALIGN: usize = max_align(
        core::mem::align_of::<u64>(),
        <Backtrace as StreamWrite>::ALIGN,
    );

    fn write(&self, os: &mut OStream<'_>) -> Result<()> {
        assert!(
            os.aligned(<Self as StreamWrite>::ALIGN),
            "exception must be written at an offset aligned to {}",
            <Self as StreamWrite>::ALIGN
        );
        os.iwrite(&self.format())?;
        os.iwrite(&(self.stream_size() as u32))?;
        match &self.kind {
            ExceptionKind::BadAlloc { bytes_requested } => os.iwrite(bytes_requested)?,
            ExceptionKind::Unknown { payload, .. } => return os.write(payload),
            _ => {}
        }
        self.backtrace.write(os)
    }

    fn stream_size(&self) -> usize {
        match &self.kind {
            ExceptionKind::Unknown { payload, .. } => HEADER_SIZE + payload.len(),
            kind => HEADER_SIZE + kind.fields_size() + self.backtrace.stream_size(),
        }
    }
}

impl StreamRead for Exception {
    const ALIGN: usize = <Self as StreamWrite>::ALIGN;

    fn read(is: &mut IStream<'_>) -> Result<Self> {
        assert!(
            is.aligned(<Self as StreamRead>::ALIGN),
            "exception must be read at an offset aligned to {}",
            <Self as StreamRead>::ALIGN
        );
        let start = is.pos();
        let tag = is.iread::<Format>()?;
        let size = is.iread::<u32>()? as usize;
        if size < HEADER_SIZE {
            return is.invalid("exception size is smaller than its header");
        }
        let kind = match tag {
            format::EXCEPTION => ExceptionKind::Generic,
            format::BAD_CAST => ExceptionKind::BadCast,
            format::BAD_TYPEID => ExceptionKind::BadTypeid,
            format::BAD_ALLOC => ExceptionKind::BadAlloc {
                bytes_requested: is.iread()?,
            },
            other => {
                let payload = is.read_bytes(size - HEADER_SIZE)?.to_vec();
                return Ok(Self {
                    kind: ExceptionKind::Unknown {
                        format: other,
                        payload,
                    },
                    backtrace: Backtrace::empty(),
                });
            }
        };
        let backtrace = is.get::<Backtrace>()?;
        if is.pos() - start != size {
            return is.invalid("exception size does not match its contents");
        }
        Ok(Self { kind, backtrace })
    }
}
