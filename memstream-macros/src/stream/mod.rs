//! Derive macros for memstream.
//!
//! Generated impls write fields in declaration order. Before each field the
//! cursor is padded to that field's `ALIGN`, and after the last one to the
//! type's own `ALIGN`, which is the largest alignment among its fields (and
//! discriminant, for enums).

mod read;
mod write;

use proc_macro2::TokenStream as TokenStream2;
use quote::quote;

pub use read::derive_stream_read;
pub use write::derive_stream_write;

/// Extract the discriminant type from `#[repr(uN)]` on an enum.
/// Returns `None` if no repr or a non-integer repr is used (defaults to u8).
pub fn repr_int_type(attrs: &[syn::Attribute]) -> Option<syn::Ident> {
    for attr in attrs {
        if !attr.path().is_ident("repr") {
            continue;
        }
        let mut found = None;
        let _ = attr.parse_nested_meta(|meta| {
            if let Some(ident) = meta.path.get_ident() {
                if let "u8" | "u16" | "u32" | "u64" | "i8" | "i16" | "i32" | "i64" =
                    ident.to_string().as_str()
                {
                    found = Some(ident.clone());
                }
            }
            Ok(())
        });
        if found.is_some() {
            return found;
        }
    }
    None
}

/// The discriminant type for an enum, `u8` unless a `#[repr]` says otherwise.
pub fn disc_type(attrs: &[syn::Attribute]) -> syn::Ident {
    repr_int_type(attrs).unwrap_or_else(|| syn::Ident::new("u8", proc_macro2::Span::call_site()))
}

/// Return the max number of variants a discriminant type can hold.
///
/// Variants are numbered from 0, so signed types only use their positive half.
pub fn disc_capacity(disc_type: &str) -> usize {
    match disc_type {
        "u8" => 256,
        "i8" => 128,
        "u16" => 65536,
        "i16" => 32768,
        _ => usize::MAX, // u32/u64/i32/i64, effectively unlimited
    }
}

/// Reject enums with more variants than the discriminant can number.
pub fn check_capacity(
    input: &syn::DeriveInput,
    data: &syn::DataEnum,
    disc: &syn::Ident,
) -> syn::Result<()> {
    let max_variants = disc_capacity(&disc.to_string());
    if data.variants.len() > max_variants {
        return Err(syn::Error::new_spanned(
            input,
            format!(
                "enum has {} variants but discriminant type `{}` supports at most {}. \
                 Add #[repr(u16)], #[repr(u32)], etc. to increase capacity.",
                data.variants.len(),
                disc,
                max_variants,
            ),
        ));
    }
    Ok(())
}

/// Check if a field has `#[stream(skip)]`.
pub fn has_skip_attr(field: &syn::Field) -> bool {
    field.attrs.iter().any(|attr| {
        if !attr.path().is_ident("stream") {
            return false;
        }
        let mut found = false;
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                found = true;
            }
            Ok(())
        });
        found
    })
}

/// Binding name for the `i`th field in generated code.
pub fn field_binding(i: usize) -> syn::Ident {
    syn::Ident::new(&format!("field_{i}"), proc_macro2::Span::call_site())
}

/// A const expression for the largest of `aligns`, at least 1.
pub fn max_align(aligns: &[TokenStream2]) -> TokenStream2 {
    quote! {
        {
            let mut align = 1usize;
            #(
                if #aligns > align {
                    align = #aligns;
                }
            )*
            align
        }
    }
}
