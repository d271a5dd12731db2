use crate::Pod;

// Every primitive number is plain old data: written by direct copy.
macro_rules! impl_pod {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Pod for $ty {}
        )+
    };
}

impl_pod!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64,
);

impl<T: Pod, const N: usize> Pod for [T; N] {}
