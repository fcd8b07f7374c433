//! Code generation for `#[derive(Record)]`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{parse_quote, Data, DeriveInput, Fields, GenericParam};

pub fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "#[derive(Record)] requires a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "#[derive(Record)] only supports structs",
            ))
        }
    };

    if let Some(lifetime) = input.generics.lifetimes().next() {
        return Err(syn::Error::new_spanned(
            lifetime,
            "records are built from owned data and cannot borrow; remove the lifetime parameter",
        ));
    }

    let name = &input.ident;
    let mut generics = input.generics.clone();
    // Type parameters only: a bound on field types cycles for recursive records.
    for param in generics.params.iter_mut() {
        if let GenericParam::Type(ty) = param {
            ty.bounds.push(parse_quote!(::seedjson_core::Reconstruct));
        }
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let mut params = Vec::with_capacity(fields.len());
    let mut takes = Vec::with_capacity(fields.len());
    for field in fields {
        // Named fields always carry an identifier.
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let ty = &field.ty;
        let key = ident.unraw().to_string();
        params.push(quote! {
            ::seedjson_core::Param::new::<#ty>(#key)
        });
        takes.push(quote! {
            #ident: args.take::<#ty>(#key)?
        });
    }

    Ok(quote! {
        impl #impl_generics ::seedjson_core::Record for #name #ty_generics #where_clause {
            fn parameters() -> ::std::vec::Vec<::seedjson_core::Param> {
                ::std::vec![#(#params),*]
            }

            #[allow(unused_variables)]
            fn construct(
                args: &mut ::seedjson_core::Arguments,
            ) -> ::seedjson_core::Result<Self> {
                ::std::result::Result::Ok(Self {
                    #(#takes),*
                })
            }
        }

        impl #impl_generics ::seedjson_core::Reconstruct for #name #ty_generics #where_clause {
            fn declared_type() -> ::seedjson_core::DeclaredType {
                ::seedjson_core::DeclaredType::record::<Self>()
            }
        }
    })
}
