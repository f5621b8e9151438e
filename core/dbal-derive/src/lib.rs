//! DBAL Derive - procedural macros for the DBAL query layer.
//!
//! Provides `#[derive(Table)]` for typed row mapping.

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, parse_macro_input};

/// Derive macro for typed table rows.
///
/// # Example
///
/// ```ignore
/// #[derive(Table)]
/// #[dbal(table_name = "users")]
/// pub struct User {
///     pub id: i64,
///     #[dbal(column = "user_name")]
///     pub name: String,
///     pub email: Option<String>,
/// }
/// ```
///
/// Generates:
/// - `TABLE_NAME` constant (defaults to the lowercased struct name)
/// - `COLUMNS` constant, in field order
/// - `FromRow` trait implementation looking each field up by column name
#[proc_macro_derive(Table, attributes(dbal))]
pub fn derive_table(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let table_name = match dbal_attr(&input.attrs, "table_name")? {
        Some(table_name) => table_name,
        None => name.to_string().to_lowercase(),
    };

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Table can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Table can only be derived for structs",
            ));
        }
    };

    let mut columns = Vec::with_capacity(fields.len());
    let mut from_row_fields = Vec::with_capacity(fields.len());

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let field_type = &field.ty;
        let column = match dbal_attr(&field.attrs, "column")? {
            Some(column) => column,
            None => ident.to_string(),
        };

        from_row_fields.push(quote! {
            #ident: <#field_type as dbal_core::api::FromScalar>::from_scalar(row.value(#column)?)?
        });
        columns.push(column);
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            pub const TABLE_NAME: &'static str = #table_name;

            pub const COLUMNS: &'static [&'static str] = &[#(#columns),*];
        }

        impl #impl_generics dbal_core::api::FromRow for #name #ty_generics #where_clause {
            fn from_row(row: &dbal_core::api::Row) -> dbal_core::error::DbalResult<Self> {
                Ok(Self {
                    #(#from_row_fields),*
                })
            }
        }
    })
}

/// Value of `#[dbal(key = "...")]`, if present.
fn dbal_attr(attrs: &[syn::Attribute], key: &str) -> syn::Result<Option<String>> {
    let mut found = None;
    for attr in attrs {
        if !attr.path().is_ident("dbal") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident(key) {
                let value: LitStr = meta.value()?.parse()?;
                found = Some(value.value());
            } else {
                // 다른 키는 무시 (값이 있으면 소비)
                if meta.input.peek(syn::Token![=]) {
                    let _: syn::Expr = meta.value()?.parse()?;
                }
            }
            Ok(())
        })?;
    }
    Ok(found)
}
