//! Record derive macro implementation

mod attrs;

use crate::common::syn_types::{FieldKind, field_kind};
use proc_macro2::TokenStream;
use quote::quote;
use std::collections::HashMap;
use syn::{Data, DeriveInput, Fields, Result};

struct MappedField {
    ident: syn::Ident,
    column: String,
    generated: bool,
    kind: FieldKind,
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Record can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Record can only be derived for structs",
            ));
        }
    };

    let struct_attr = attrs::struct_attr(&input.attrs)?;

    let mut mapped: Vec<MappedField> = Vec::new();
    let mut seen: HashMap<String, syn::Ident> = HashMap::new();
    for field in fields {
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let attr = attrs::field_attr(&field.attrs)?;
        if attr.skip {
            if attr.column.is_some() || attr.generated {
                return Err(syn::Error::new_spanned(
                    field,
                    "#[db(skip)] cannot be combined with other tags",
                ));
            }
            continue;
        }
        let Some(column) = attr.column else {
            return Err(syn::Error::new_spanned(
                field,
                format!(
                    "field `{ident}` has no #[db(column = \"...\")] tag; \
                     add one or mark the field #[db(skip)]"
                ),
            ));
        };
        if let Some(first) = seen.get(&column) {
            return Err(syn::Error::new_spanned(
                field,
                format!("column \"{column}\" is already mapped by field `{first}`"),
            ));
        }
        seen.insert(column.clone(), ident.clone());
        mapped.push(MappedField {
            ident,
            column,
            generated: attr.generated,
            kind: field_kind(&field.ty),
        });
    }

    if mapped.is_empty() {
        return Err(syn::Error::new_spanned(
            &input,
            "Record must map at least one column",
        ));
    }

    let generated: Vec<&MappedField> = mapped.iter().filter(|f| f.generated).collect();
    if generated.len() > 1 {
        return Err(syn::Error::new_spanned(
            &generated[1].ident,
            "only one field can be marked #[db(generated)]",
        ));
    }
    let generated_key = match (struct_attr.generated_key, generated.first()) {
        (Some(key), Some(field)) if key != field.column => {
            return Err(syn::Error::new_spanned(
                &field.ident,
                format!(
                    "generated_key \"{key}\" conflicts with generated field column \"{}\"",
                    field.column
                ),
            ));
        }
        (Some(key), _) => Some(key),
        (None, Some(field)) => Some(field.column.clone()),
        (None, None) => None,
    };

    let type_name = name.to_string();
    let column_defs = mapped.iter().map(|f| {
        let column = &f.column;
        let field = f.ident.to_string();
        let generated = f.generated;
        quote! {
            ::roledb::ColumnDef {
                name: #column,
                field: #field,
                generated: #generated,
            }
        }
    });
    let generated_key = match generated_key {
        Some(key) => quote! { ::core::option::Option::Some(#key) },
        None => quote! { ::core::option::Option::None },
    };

    let decode_arms = mapped.iter().map(|f| {
        let ident = &f.ident;
        let column = &f.column;
        let decode = match f.kind {
            FieldKind::Flag => quote! { ::roledb::row::decode_flag(row, idx)? },
            FieldKind::OptionalFlag => quote! { ::roledb::row::decode_opt_flag(row, idx)? },
            FieldKind::Plain => quote! { ::roledb::row::decode_column(row, idx)? },
        };
        quote! { #column => record.#ident = #decode, }
    });

    let values = mapped.iter().filter(|f| !f.generated).map(|f| {
        let ident = &f.ident;
        let value = match f.kind {
            FieldKind::Flag => quote! { ::roledb::Flag(self.#ident) },
            FieldKind::OptionalFlag => quote! { self.#ident.map(::roledb::Flag) },
            FieldKind::Plain => quote! { ::core::clone::Clone::clone(&self.#ident) },
        };
        quote! { ::roledb::param(#value) }
    });

    Ok(quote! {
        impl #impl_generics ::roledb::record::Record for #name #ty_generics #where_clause {
            fn descriptor() -> &'static ::roledb::RecordDescriptor {
                static DESCRIPTOR: ::roledb::RecordDescriptor = ::roledb::RecordDescriptor {
                    type_name: #type_name,
                    columns: &[#(#column_defs),*],
                    generated_key: #generated_key,
                };
                &DESCRIPTOR
            }

            fn from_row(row: &::roledb::Row) -> ::roledb::DbResult<Self> {
                let mut record: Self = ::core::default::Default::default();
                for (idx, column) in row.columns().iter().enumerate() {
                    match column.name() {
                        #(#decode_arms)*
                        _ => {}
                    }
                }
                ::core::result::Result::Ok(record)
            }

            fn values(&self) -> ::std::vec::Vec<::roledb::Param> {
                ::std::vec![#(#values),*]
            }
        }
    })
}
