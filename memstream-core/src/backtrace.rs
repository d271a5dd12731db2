//! Call-stack capture with lazy symbol resolution.

use std::fmt::{self, Write as _};
use std::string::String;
use std::sync::OnceLock;

use crate::{IStream, OStream, Result, StreamRead, StreamWrite, align_up};

/// Maximum number of frames a [`Backtrace`] records.
pub const MAX_FRAMES: usize = 64;

const ADDRESS_SIZE: usize = core::mem::size_of::<usize>();
const ADDRESS_ALIGN: usize = core::mem::align_of::<usize>();

/// The call stack at the point of construction.
///
/// Capturing only walks the stack and records return addresses. Symbol
/// names are resolved on first text rendering and cached. The binary form
/// carries the symbol text only when it was already resolved at write time;
/// reading restores the addresses alone, since they belong to the writer's
/// process image.
///
/// Cloning copies the addresses but not the symbol cache: a clone resolves
/// again on demand.
pub struct Backtrace {
    addresses: [usize; MAX_FRAMES],
    frames: u32,
    symbols: OnceLock<String>,
}

impl Backtrace {
    /// Capture the current call stack, up to [`MAX_FRAMES`] frames.
    #[inline(never)]
    #[must_use]
    pub fn capture() -> Self {
        let mut addresses = [0usize; MAX_FRAMES];
        let mut frames = 0usize;
        ::backtrace::trace(|frame| {
            addresses[frames] = frame.ip() as usize;
            frames += 1;
            frames < MAX_FRAMES
        });
        Self {
            addresses,
            frames: frames as u32,
            symbols: OnceLock::new(),
        }
    }

    /// A backtrace with no frames.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            addresses: [0; MAX_FRAMES],
            frames: 0,
            symbols: OnceLock::new(),
        }
    }

    /// The captured return addresses, innermost first.
    #[must_use]
    pub fn addresses(&self) -> &[usize] {
        &self.addresses[..self.frames as usize]
    }

    /// Number of captured frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames as usize
    }

    /// Whether no frames were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    /// Whether symbol names have been resolved yet.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.symbols.get().is_some()
    }

    /// Size of the resolved symbol text, 0 until resolved.
    #[must_use]
    pub fn symbols_size(&self) -> usize {
        self.symbols.get().map_or(0, String::len)
    }

    /// Symbol text, one line per frame, resolving on first call.
    pub fn symbols(&self) -> &str {
        self.symbols.get_or_init(|| self.resolve())
    }

    /// Render one line per frame into `out`.
    pub fn text_write<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        for line in self.symbols().lines() {
            writeln!(out, "{line}")?;
        }
        Ok(())
    }

    // Lookup failures degrade to the bare address; they are never reported.
    fn resolve(&self) -> String {
        let mut blob = String::new();
        let mut unresolved = 0usize;
        for &ip in self.addresses() {
            let mut line = None;
            ::backtrace::resolve(ip as *mut core::ffi::c_void, |symbol| {
                if line.is_some() {
                    return;
                }
                if let Some(name) = symbol.name() {
                    let offset = symbol
                        .addr()
                        .map_or(0, |addr| ip.wrapping_sub(addr as usize));
                    line = Some(format!("{name}+{offset:#x}"));
                }
            });
            let _ = match line {
                Some(line) => writeln!(blob, "{line}"),
                None => {
                    unresolved += 1;
                    writeln!(blob, "{ip:#x}")
                }
            };
        }
        tracing::trace!(
            frames = self.frames,
            unresolved,
            bytes = blob.len(),
            "resolved backtrace symbols"
        );
        blob
    }
}

impl Default for Backtrace {
    fn default() -> Self {
        Self::capture()
    }
}

impl Clone for Backtrace {
    fn clone(&self) -> Self {
        // Symbol cache invalidates on copy.
        Self {
            addresses: self.addresses,
            frames: self.frames,
            symbols: OnceLock::new(),
        }
    }
}

impl PartialEq for Backtrace {
    fn eq(&self, other: &Self) -> bool {
        self.addresses() == other.addresses()
    }
}

impl Eq for Backtrace {}

impl fmt::Debug for Backtrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backtrace")
            .field("frames", &self.frames)
            .field("resolved", &self.is_resolved())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Backtrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.text_write(f)
    }
}

// Layout: u32 frame count, pad, addresses, u32 symbol size, symbol bytes, pad.
impl StreamWrite for Backtrace {
    const ALIGN: usize = ADDRESS_ALIGN;

    fn write(&self, os: &mut OStream<'_>) -> Result<()> {
        assert!(
            os.aligned(ADDRESS_ALIGN),
            "backtrace contains pointers and must be written at a pointer-aligned offset"
        );
        let symbols = self.symbols.get().map_or("", String::as_str);
        os.iwrite(&self.frames)?;
        os.align(ADDRESS_ALIGN)?;
        os.iwrite_slice(self.addresses())?;
        os.iwrite(&(symbols.len() as u32))?;
        os.write(symbols.as_bytes())?;
        os.align(ADDRESS_ALIGN)?;
        Ok(())
    }

    fn stream_size(&self) -> usize {
        let header = align_up(4, ADDRESS_ALIGN);
        align_up(
            header + self.len() * ADDRESS_SIZE + 4 + self.symbols_size(),
            ADDRESS_ALIGN,
        )
    }
}

impl StreamRead for Backtrace {
    const ALIGN: usize = ADDRESS_ALIGN;

    fn read(is: &mut IStream<'_>) -> Result<Self> {
        assert!(
            is.aligned(ADDRESS_ALIGN),
            "backtrace contains pointers and must be read at a pointer-aligned offset"
        );
        let frames = is.iread::<u32>()?;
        if frames as usize > MAX_FRAMES {
            return is.invalid("backtrace frame count exceeds 64");
        }
        is.align(ADDRESS_ALIGN)?;
        let mut addresses = [0usize; MAX_FRAMES];
        for slot in &mut addresses[..frames as usize] {
            *slot = is.iread()?;
        }
        // The writer's symbol text is meaningless against this process image.
        let symbols_size = is.iread::<u32>()?;
        is.read_bytes(symbols_size as usize)?;
        is.align(ADDRESS_ALIGN)?;
        Ok(Self {
            addresses,
            frames,
            symbols: OnceLock::new(),
        })
    }
}
