//! StreamRead derive macro implementation.

use super::{check_capacity, disc_type, field_binding, has_skip_attr, max_align};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, parse_macro_input};

/// Derive the `StreamRead` trait for a struct or enum.
pub fn derive_stream_read(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match derive_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn derive_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let (align, body) = match &input.data {
        Data::Struct(data) => {
            let aligns: Vec<_> = data
                .fields
                .iter()
                .filter(|f| !has_skip_attr(f))
                .map(|f| field_align(&f.ty))
                .collect();
            let reads = read_fields(&data.fields, true);
            let constructor = construct(&quote! { #name }, &data.fields);
            (
                max_align(&aligns),
                quote! {
                    #reads
                    #constructor
                },
            )
        }
        Data::Enum(data) => {
            let disc = disc_type(&input.attrs);
            check_capacity(input, data, &disc)?;
            let mut aligns = vec![quote! { core::mem::align_of::<#disc>() }];
            for variant in &data.variants {
                aligns.extend(variant.fields.iter().map(|f| field_align(&f.ty)));
            }
            (max_align(&aligns), generate_enum(data, &disc))
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "StreamRead derive is not supported for unions.",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics ::memstream::StreamRead for #name #ty_generics #where_clause {
            const ALIGN: usize = #align;

            fn read(is: &mut ::memstream::IStream<'_>) -> ::memstream::Result<Self> {
                let value = { #body };
                is.align(<Self as ::memstream::StreamRead>::ALIGN)?;
                Ok(value)
            }
        }
    })
}

fn field_align(ty: &syn::Type) -> TokenStream2 {
    quote! { <#ty as ::memstream::StreamRead>::ALIGN }
}

/// Read every field into `field_N`. Skipped fields take their default when
/// `honor_skip` is set.
fn read_fields(fields: &Fields, honor_skip: bool) -> TokenStream2 {
    let reads = fields.iter().enumerate().map(|(i, f)| {
        let binding = field_binding(i);
        let ty = &f.ty;
        if honor_skip && has_skip_attr(f) {
            quote! {
                let #binding: #ty = ::core::default::Default::default();
            }
        } else {
            quote! {
                is.align(<#ty as ::memstream::StreamRead>::ALIGN)?;
                let #binding = <#ty as ::memstream::StreamRead>::read(is)?;
            }
        }
    });
    quote! { #(#reads)* }
}

/// Build `path` from the `field_N` bindings.
fn construct(path: &TokenStream2, fields: &Fields) -> TokenStream2 {
    let bindings: Vec<_> = (0..fields.len()).map(field_binding).collect();
    match fields {
        Fields::Unit => quote! { #path },
        Fields::Unnamed(_) => quote! { #path(#(#bindings),*) },
        Fields::Named(named) => {
            let names = named.named.iter().map(|f| &f.ident);
            quote! { #path { #(#names: #bindings),* } }
        }
    }
}

// Enum deserialization

fn generate_enum(data: &syn::DataEnum, disc_type: &syn::Ident) -> TokenStream2 {
    let match_arms: Vec<_> = data
        .variants
        .iter()
        .enumerate()
        .map(|(idx, variant)| {
            let variant_name = &variant.ident;
            let idx_lit =
                syn::LitInt::new(&format!("{idx}{disc_type}"), proc_macro2::Span::call_site());
            let reads = read_fields(&variant.fields, false);
            let constructor = construct(&quote! { Self::#variant_name }, &variant.fields);

            quote! {
                #idx_lit => {
                    #reads
                    #constructor
                }
            }
        })
        .collect();

    quote! {
        let discriminant = is.iread::<#disc_type>()?;
        match discriminant {
            #(#match_arms,)*
            _ => return is.invalid("unknown enum discriminant"),
        }
    }
}
