use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Ident, LitStr};

use crate::crate_path::tabula_core_path;

pub fn expand(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match generate(&input) {
        Ok(output) => output.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Parsed information about a single mapped field.
struct FieldInfo {
    ident: Ident,
    /// Explicit column name from `#[column(name = "...")]`.
    column: Option<String>,
    /// `#[id]` or `#[column(primary_key)]`.
    primary_key: bool,
}

/// Parsed field-level markers.
#[derive(Default)]
struct FieldAttrs {
    column: Option<String>,
    primary_key: bool,
    transient: bool,
}

/// Extract the `#[entity(table = "...")]` override from the struct.
fn extract_table(input: &DeriveInput) -> syn::Result<Option<String>> {
    let mut table = None;
    for attr in &input.attrs {
        if attr.path().is_ident("entity") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("table") {
                    let lit: LitStr = meta.value()?.parse()?;
                    table = Some(lit.value());
                    Ok(())
                } else {
                    Err(meta.error("expected `table` in #[entity(table = \"...\")]"))
                }
            })?;
        }
    }
    Ok(table)
}

/// Extract `#[id]`, `#[transient]` and `#[column(name = "...", primary_key, transient)]`.
fn extract_field_attrs(attrs: &[syn::Attribute]) -> syn::Result<FieldAttrs> {
    let mut result = FieldAttrs::default();
    for attr in attrs {
        if attr.path().is_ident("id") {
            attr.meta.require_path_only()?;
            result.primary_key = true;
        } else if attr.path().is_ident("transient") {
            attr.meta.require_path_only()?;
            result.transient = true;
        } else if attr.path().is_ident("column") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let lit: LitStr = meta.value()?.parse()?;
                    result.column = Some(lit.value());
                    Ok(())
                } else if meta.path.is_ident("primary_key") {
                    result.primary_key = true;
                    Ok(())
                } else if meta.path.is_ident("transient") {
                    result.transient = true;
                    Ok(())
                } else {
                    Err(meta.error(
                        "expected `name`, `primary_key`, or `transient` in #[column(...)]",
                    ))
                }
            })?;
        }
    }
    Ok(result)
}

fn generate(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let name_str = name.to_string();
    let krate = tabula_core_path();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "#[derive(Entity)] only works on structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "#[derive(Entity)] only works on structs",
            ))
        }
    };

    let table = extract_table(input)?;

    // Transient fields are left out of the shape entirely, so their types
    // need no value conversions.
    let mut field_infos = Vec::new();
    for field in fields {
        let attrs = extract_field_attrs(&field.attrs)?;
        if attrs.transient {
            if attrs.primary_key {
                return Err(syn::Error::new_spanned(
                    field,
                    "a transient field cannot be the primary key",
                ));
            }
            continue;
        }
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        field_infos.push(FieldInfo {
            ident,
            column: attrs.column,
            primary_key: attrs.primary_key,
        });
    }

    let table_call = match &table {
        Some(t) => quote! { .table(#t) },
        None => quote! {},
    };

    let field_defs: Vec<TokenStream2> = field_infos
        .iter()
        .map(|f| {
            let ident = &f.ident;
            let field_str = ident.to_string();
            let column_call = match &f.column {
                Some(c) => quote! { .column(#c) },
                None => quote! {},
            };
            let pk_call = if f.primary_key {
                quote! { .primary_key() }
            } else {
                quote! {}
            };
            quote! {
                .field(
                    #krate::FieldDef::new(
                        #field_str,
                        |__entity: &Self| -> #krate::Value {
                            #krate::ToValue::to_value(&__entity.#ident)
                        },
                        |__entity: &mut Self,
                         __value: #krate::Value|
                         -> ::core::result::Result<(), #krate::ValueError> {
                            __entity.#ident = #krate::FromValue::from_value(__value)?;
                            ::core::result::Result::Ok(())
                        },
                    )
                    #column_call
                    #pk_call
                )
            }
        })
        .collect();

    Ok(quote! {
        impl #impl_generics #krate::Entity for #name #ty_generics #where_clause {
            fn shape() -> #krate::EntityShape<Self> {
                #krate::EntityShape::new(#name_str)
                    #table_call
                    #(#field_defs)*
            }
        }
    })
}
