//! Derive macro for roledb
//!
//! Provides `#[derive(Record)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod common;
mod record;
mod sql_ident;

/// Derive `Record` for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use roledb::Record;
///
/// #[derive(Debug, Default, Record)]
/// struct Token {
///     #[db(column = "token_id", generated)]
///     id: i64,
///     #[db(column = "token_hash")]
///     hash: String,
///     #[db(column = "token_revoked")]
///     revoked: bool,
///     #[db(skip)]
///     note: String,
/// }
/// ```
///
/// The struct must implement `Default`: mapped columns missing from a result row
/// leave their field at the default value.
///
/// # Attributes
///
/// - `#[db(column = "name")]` - Column for this field (required, lower_snake_case)
/// - `#[db(generated)]` - Column is generated by the store; not written on insert
///   and returned as the insert key
/// - `#[db(skip)]` - Field is not mapped
/// - `#[db(generated_key = "name")]` (struct) - Key column returned on insert when
///   the struct has no generated field
///
/// `bool` fields accept `BOOL` and integer `0`/`1` columns and are written as
/// whatever the target column expects.
#[proc_macro_derive(Record, attributes(db))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
