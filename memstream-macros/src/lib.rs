//! Derive macros for memstream.

use proc_macro::TokenStream;
mod stream;

/// Derive `StreamWrite`.
#[proc_macro_derive(StreamWrite, attributes(stream))]
pub fn derive_stream_write(input: TokenStream) -> TokenStream {
    stream::derive_stream_write(input)
}

/// Derive `StreamRead`.
#[proc_macro_derive(StreamRead, attributes(stream))]
pub fn derive_stream_read(input: TokenStream) -> TokenStream {
    stream::derive_stream_read(input)
}
