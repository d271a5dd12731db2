use alloc::{string::String, vec::Vec};

use crate::{IStream, OStream, Result, StreamRead, StreamWrite, align_up};

const fn max_align(a: usize, b: usize) -> usize {
    if a > b { a } else { b }
}

impl StreamWrite for String {
    #[inline]
    fn write(&self, os: &mut OStream<'_>) -> Result<()> {
        os.write_strz(self)
    }

    #[inline]
    fn stream_size(&self) -> usize {
        self.len() + 1
    }
}

impl StreamRead for String {
    #[inline]
    fn read(is: &mut IStream<'_>) -> Result<Self> {
        is.read_strz().map(String::from)
    }
}

// Vec<T>: u32 count, padding up to T's alignment, the elements, then padding
// up to the vector's own alignment so the next value starts aligned.
impl<T: StreamWrite> StreamWrite for Vec<T> {
    const ALIGN: usize = max_align(core::mem::align_of::<u32>(), T::ALIGN);

    fn write(&self, os: &mut OStream<'_>) -> Result<()> {
        let Ok(count) = u32::try_from(self.len()) else {
            return os.verify_remaining("write", "vector", usize::MAX);
        };
        os.iwrite(&count)?;
        os.align(T::ALIGN)?;
        for item in self {
            item.write(os)?;
        }
        os.align(<Self as StreamWrite>::ALIGN)?;
        Ok(())
    }

    fn stream_size(&self) -> usize {
        let items: usize = self.iter().map(StreamWrite::stream_size).sum();
        align_up(align_up(4, T::ALIGN) + items, <Self as StreamWrite>::ALIGN)
    }
}

impl<T: StreamRead> StreamRead for Vec<T> {
    const ALIGN: usize = max_align(core::mem::align_of::<u32>(), T::ALIGN);

    fn read(is: &mut IStream<'_>) -> Result<Self> {
        let count = is.iread::<u32>()? as usize;
        is.align(T::ALIGN)?;
        // Every element occupies at least one byte unless it is zero-sized,
        // so cap the preallocation by what the region can hold.
        let mut items = Vec::with_capacity(count.min(is.remaining()));
        for _ in 0..count {
            items.push(T::read(is)?);
        }
        is.align(<Self as StreamRead>::ALIGN)?;
        Ok(items)
    }
}
