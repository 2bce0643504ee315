//! Attribute parsing for the Record derive macro.
//!
//! Handles struct-level and field-level `#[db(...)]` attributes.

use crate::sql_ident::parse_column_name;
use syn::{Attribute, Result};

/// Parsed field-level `#[db(...)]`.
#[derive(Default)]
pub(super) struct FieldAttr {
    pub column: Option<String>,
    pub generated: bool,
    pub skip: bool,
}

/// Parsed struct-level `#[db(...)]`.
#[derive(Default)]
pub(super) struct StructAttr {
    pub generated_key: Option<String>,
}

pub(super) fn field_attr(attrs: &[Attribute]) -> Result<FieldAttr> {
    let mut out = FieldAttr::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("db")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("column") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                if out.column.is_some() {
                    return Err(meta.error("duplicate `column` tag"));
                }
                out.column = Some(parse_column_name(&lit.value(), lit.span(), "column")?);
                Ok(())
            } else if meta.path.is_ident("generated") {
                out.generated = true;
                Ok(())
            } else if meta.path.is_ident("skip") {
                out.skip = true;
                Ok(())
            } else {
                Err(meta.error("expected `column = \"...\"`, `generated` or `skip`"))
            }
        })?;
    }
    Ok(out)
}

pub(super) fn struct_attr(attrs: &[Attribute]) -> Result<StructAttr> {
    let mut out = StructAttr::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("db")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("generated_key") {
                let lit: syn::LitStr = meta.value()?.parse()?;
                out.generated_key =
                    Some(parse_column_name(&lit.value(), lit.span(), "generated_key")?);
                Ok(())
            } else {
                Err(meta.error("expected `generated_key = \"...\"`"))
            }
        })?;
    }
    Ok(out)
}
