//! Manejar derive macros: form models without boilerplate.
//!
//! A form model is a flat mapping of field names to values, typed into a
//! page in one declared operation. Deriving `FormModel` turns a plain struct
//! into one:
//!
//! ```ignore
//! use manejar::FormModel;
//!
//! #[derive(FormModel)]
//! struct Credentials {
//!     username: String,
//!     #[manejar(rename = "pass")]
//!     password: String,
//!     #[manejar(skip)]
//!     remember_me: bool,
//! }
//! ```
//!
//! Fields are reported in declaration order. `#[manejar(rename = "...")]`
//! overrides the locator suffix a field maps to; `#[manejar(skip)]` leaves a
//! field out entirely. Every kept field's value renders through `ToString`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Ident, Lit, Meta};

/// Derive macro for form model value types.
///
/// Generates the `FormModel` trait implementation, reporting the struct's
/// named fields in declaration order as name/value pairs.
///
/// # Attributes
///
/// - `#[manejar(rename = "custom_name")]` - Override a field's reported name
/// - `#[manejar(skip)]` - Leave a field out of the model
#[proc_macro_derive(FormModel, attributes(manejar))]
pub fn derive_form_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match named_fields(&input.data) {
        Ok(fields) => fields,
        Err(message) => {
            return syn::Error::new_spanned(&input.ident, message)
                .to_compile_error()
                .into()
        }
    };

    let entries = fields.iter().filter(|f| !has_skip(&f.attrs)).map(|field| {
        let ident = field.ident.as_ref().expect("named fields carry idents");
        let reported = extract_rename(&field.attrs).unwrap_or_else(|| ident.to_string());
        quote! {
            ::manejar::FormField::new(#reported, self.#ident.to_string())
        }
    });

    let expanded = quote! {
        impl #impl_generics ::manejar::FormModel for #name #ty_generics #where_clause {
            fn fields(&self) -> ::std::vec::Vec<::manejar::FormField> {
                ::std::vec![#(#entries),*]
            }
        }
    };

    TokenStream::from(expanded)
}

fn named_fields(data: &Data) -> Result<Vec<syn::Field>, &'static str> {
    match data {
        Data::Struct(data_struct) => match &data_struct.fields {
            Fields::Named(fields) => Ok(fields.named.iter().cloned().collect()),
            Fields::Unnamed(_) | Fields::Unit => {
                Err("FormModel can only be derived for structs with named fields")
            }
        },
        Data::Enum(_) | Data::Union(_) => {
            Err("FormModel can only be derived for structs with named fields")
        }
    }
}

fn extract_rename(attrs: &[Attribute]) -> Option<String> {
    for attr in attrs {
        if attr.path().is_ident("manejar") {
            if let Ok(Meta::NameValue(nv)) = attr.parse_args::<Meta>() {
                if nv.path.is_ident("rename") {
                    if let syn::Expr::Lit(syn::ExprLit {
                        lit: Lit::Str(s), ..
                    }) = &nv.value
                    {
                        return Some(s.value());
                    }
                }
            }
        }
    }
    None
}

fn has_skip(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| {
        attr.path().is_ident("manejar")
            && attr
                .parse_args::<Ident>()
                .map(|ident| ident == "skip")
                .unwrap_or(false)
    })
}
