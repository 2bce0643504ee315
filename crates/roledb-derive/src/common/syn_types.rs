//! Type helper utilities for syn type analysis.

/// Extract the inner type T from Option<T>, or return None if not an Option type.
///
/// Recognizes `Option<T>`, `std::option::Option<T>`, and `core::option::Option<T>`.
pub fn option_inner(ty: &syn::Type) -> Option<&syn::Type> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    let seg = type_path.path.segments.last()?;
    if seg.ident != "Option" {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &seg.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    let syn::GenericArgument::Type(inner) = args.args.first()? else {
        return None;
    };
    Some(inner)
}

fn is_bool(ty: &syn::Type) -> bool {
    let syn::Type::Path(type_path) = ty else {
        return false;
    };
    type_path.qself.is_none() && type_path.path.is_ident("bool")
}

/// How a field's value travels to and from its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// `bool`: decoded from BOOL or integer columns, bound as `Flag`.
    Flag,
    /// `Option<bool>`
    OptionalFlag,
    /// Anything else: plain `FromSql` / `ToSql`.
    Plain,
}

pub fn field_kind(ty: &syn::Type) -> FieldKind {
    if is_bool(ty) {
        FieldKind::Flag
    } else if option_inner(ty).is_some_and(is_bool) {
        FieldKind::OptionalFlag
    } else {
        FieldKind::Plain
    }
}
