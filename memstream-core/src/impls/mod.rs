mod macros;

#[cfg(feature = "alloc")]
pub mod alloc;

use crate::{IStream, OStream, Result, StreamRead, StreamWrite};

// bool: one byte, strictly 0 or 1
impl StreamWrite for bool {
    #[inline]
    fn write(&self, os: &mut OStream<'_>) -> Result<()> {
        os.iwrite(&u8::from(*self))
    }

    #[inline]
    fn stream_size(&self) -> usize {
        1
    }
}

impl StreamRead for bool {
    #[inline]
    fn read(is: &mut IStream<'_>) -> Result<Self> {
        match is.iread::<u8>()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => is.invalid("bool must be 0 or 1"),
        }
    }
}

// char: the scalar value as a u32
impl StreamWrite for char {
    const ALIGN: usize = core::mem::align_of::<u32>();

    #[inline]
    fn write(&self, os: &mut OStream<'_>) -> Result<()> {
        os.iwrite(&u32::from(*self))
    }

    #[inline]
    fn stream_size(&self) -> usize {
        4
    }
}

impl StreamRead for char {
    const ALIGN: usize = core::mem::align_of::<u32>();

    #[inline]
    fn read(is: &mut IStream<'_>) -> Result<Self> {
        let code = is.iread::<u32>()?;
        match char::from_u32(code) {
            Some(c) => Ok(c),
            None => is.invalid("invalid char codepoint"),
        }
    }
}

// str: bytes then a NUL terminator, no length prefix
impl StreamWrite for str {
    #[inline]
    fn write(&self, os: &mut OStream<'_>) -> Result<()> {
        os.write_strz(self)
    }

    #[inline]
    fn stream_size(&self) -> usize {
        self.len() + 1
    }
}
