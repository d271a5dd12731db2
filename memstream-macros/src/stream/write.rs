//! StreamWrite derive macro implementation.

use super::{check_capacity, disc_type, field_binding, has_skip_attr, max_align};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, parse_macro_input};

/// Derive the `StreamWrite` trait for a struct or enum.
pub fn derive_stream_write(input: TokenStream) -> TokenStream {
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

    let (align, body, size_body) = match &input.data {
        Data::Struct(data) => {
            let fields = struct_fields(&data.fields);
            let aligns: Vec<_> = fields.iter().map(|(_, ty)| field_align(ty)).collect();
            let writes: Vec<_> = fields
                .iter()
                .map(|(access, ty)| write_field(&quote! { &self.#access }, ty))
                .collect();
            let sizes: Vec<_> = fields
                .iter()
                .map(|(access, ty)| size_field(&quote! { &self.#access }, ty))
                .collect();
            (
                max_align(&aligns),
                quote! { #(#writes)* },
                quote! {
                    #[allow(unused_mut)]
                    let mut size = 0usize;
                    #(#sizes)*
                    size
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
            (
                max_align(&aligns),
                generate_enum(data, &disc),
                generate_size_enum(data, &disc),
            )
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "StreamWrite derive is not supported for unions.",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics ::memstream::StreamWrite for #name #ty_generics #where_clause {
            const ALIGN: usize = #align;

            fn write(&self, os: &mut ::memstream::OStream<'_>) -> ::memstream::Result<()> {
                #body
                os.align(<Self as ::memstream::StreamWrite>::ALIGN)?;
                Ok(())
            }

            fn stream_size(&self) -> usize {
                let size = { #size_body };
                ::memstream::align_up(size, <Self as ::memstream::StreamWrite>::ALIGN)
            }
        }
    })
}

/// Accessors and types of the struct fields that are written.
fn struct_fields(fields: &Fields) -> Vec<(TokenStream2, &syn::Type)> {
    fields
        .iter()
        .enumerate()
        .filter(|(_, f)| !has_skip_attr(f))
        .map(|(i, f)| match &f.ident {
            Some(ident) => (quote! { #ident }, &f.ty),
            None => {
                let index = syn::Index::from(i);
                (quote! { #index }, &f.ty)
            }
        })
        .collect()
}

fn field_align(ty: &syn::Type) -> TokenStream2 {
    quote! { <#ty as ::memstream::StreamWrite>::ALIGN }
}

fn write_field(value: &TokenStream2, ty: &syn::Type) -> TokenStream2 {
    quote! {
        os.align(<#ty as ::memstream::StreamWrite>::ALIGN)?;
        <#ty as ::memstream::StreamWrite>::write(#value, os)?;
    }
}

fn size_field(value: &TokenStream2, ty: &syn::Type) -> TokenStream2 {
    quote! {
        size = ::memstream::align_up(size, <#ty as ::memstream::StreamWrite>::ALIGN)
            + <#ty as ::memstream::StreamWrite>::stream_size(#value);
    }
}

// Enum serialization

/// Pattern binding every field of `variant` to `field_N`.
fn variant_pattern(variant: &syn::Variant) -> TokenStream2 {
    let variant_name = &variant.ident;
    let bindings: Vec<_> = (0..variant.fields.len()).map(field_binding).collect();
    match &variant.fields {
        Fields::Unit => quote! { Self::#variant_name },
        Fields::Unnamed(_) => quote! { Self::#variant_name(#(#bindings),*) },
        Fields::Named(named) => {
            let names = named.named.iter().map(|f| &f.ident);
            quote! { Self::#variant_name { #(#names: #bindings),* } }
        }
    }
}

fn generate_enum(data: &syn::DataEnum, disc_type: &syn::Ident) -> TokenStream2 {
    let match_arms: Vec<_> = data
        .variants
        .iter()
        .enumerate()
        .map(|(idx, variant)| {
            let pattern = variant_pattern(variant);
            let idx_lit =
                syn::LitInt::new(&format!("{idx}{disc_type}"), proc_macro2::Span::call_site());
            let writes: Vec<_> = variant
                .fields
                .iter()
                .enumerate()
                .map(|(i, f)| {
                    let binding = field_binding(i);
                    write_field(&quote! { #binding }, &f.ty)
                })
                .collect();

            quote! {
                #pattern => {
                    os.iwrite(&#idx_lit)?;
                    #(#writes)*
                }
            }
        })
        .collect();

    if match_arms.is_empty() {
        return quote! { match *self {} };
    }
    quote! {
        match self {
            #(#match_arms)*
        }
    }
}

fn generate_size_enum(data: &syn::DataEnum, disc_type: &syn::Ident) -> TokenStream2 {
    let match_arms: Vec<_> = data
        .variants
        .iter()
        .map(|variant| {
            let pattern = variant_pattern(variant);
            let sizes: Vec<_> = variant
                .fields
                .iter()
                .enumerate()
                .map(|(i, f)| {
                    let binding = field_binding(i);
                    size_field(&quote! { #binding }, &f.ty)
                })
                .collect();

            quote! {
                #pattern => {
                    #[allow(unused_mut)]
                    let mut size = core::mem::size_of::<#disc_type>();
                    #(#sizes)*
                    size
                }
            }
        })
        .collect();

    if match_arms.is_empty() {
        return quote! { match *self {} };
    }
    quote! {
        match self {
            #(#match_arms)*
        }
    }
}
