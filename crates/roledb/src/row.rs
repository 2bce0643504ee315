//! Column decoding helpers used by `#[derive(Record)]`.

use crate::error::{DbError, DbResult};
use bytes::BytesMut;
use std::error::Error;
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, IsNull, ToSql, Type, to_sql_checked};

/// Decode column `idx` of `row` as `T`, mapping failures to [`DbError::Decode`].
pub fn decode_column<T>(row: &Row, idx: usize) -> DbResult<T>
where
    T: for<'a> FromSql<'a>,
{
    row.try_get(idx)
        .map_err(|e| DbError::decode(column_name(row, idx), e.to_string()))
}

/// Decode a boolean column.
///
/// Accepts native `BOOL` columns as well as integer columns storing `0`/`1`
/// (any non-zero value is `true`).
pub fn decode_flag(row: &Row, idx: usize) -> DbResult<bool> {
    decode_opt_flag(row, idx)?
        .ok_or_else(|| DbError::decode(column_name(row, idx), "unexpected NULL"))
}

/// Nullable variant of [`decode_flag`].
pub fn decode_opt_flag(row: &Row, idx: usize) -> DbResult<Option<bool>> {
    let ty = column_type(row, idx)?;
    if *ty == Type::BOOL {
        decode_column::<Option<bool>>(row, idx)
    } else if *ty == Type::INT2 {
        Ok(decode_column::<Option<i16>>(row, idx)?.map(|v| v != 0))
    } else if *ty == Type::INT4 {
        Ok(decode_column::<Option<i32>>(row, idx)?.map(|v| v != 0))
    } else if *ty == Type::INT8 {
        Ok(decode_column::<Option<i64>>(row, idx)?.map(|v| v != 0))
    } else {
        Err(DbError::decode(
            column_name(row, idx),
            format!("cannot decode {ty} as a boolean"),
        ))
    }
}

/// Decode the generated key returned by `INSERT ... RETURNING <key>`.
///
/// Integer keys are widened to `i64`; text keys must parse as an integer.
pub fn decode_generated_key(row: &Row) -> DbResult<i64> {
    let ty = column_type(row, 0)?;
    if *ty == Type::INT8 {
        decode_column::<i64>(row, 0)
    } else if *ty == Type::INT4 {
        decode_column::<i32>(row, 0).map(i64::from)
    } else if *ty == Type::INT2 {
        decode_column::<i16>(row, 0).map(i64::from)
    } else if *ty == Type::TEXT || *ty == Type::VARCHAR {
        let raw = decode_column::<String>(row, 0)?;
        raw.trim()
            .parse()
            .map_err(|_| DbError::decode(column_name(row, 0), format!("non-numeric key '{raw}'")))
    } else {
        Err(DbError::decode(
            column_name(row, 0),
            format!("unsupported generated key type {ty}"),
        ))
    }
}

fn column_type(row: &Row, idx: usize) -> DbResult<&Type> {
    row.columns()
        .get(idx)
        .map(|c| c.type_())
        .ok_or_else(|| DbError::decode(format!("#{idx}"), "column index out of range"))
}

fn column_name(row: &Row, idx: usize) -> String {
    row.columns()
        .get(idx)
        .map(|c| c.name().to_string())
        .unwrap_or_else(|| format!("#{idx}"))
}

/// A boolean parameter that binds to `BOOL` or integer columns.
///
/// Integer targets receive `0`/`1`, so boolean record fields round-trip through
/// stores that model flags as small integers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flag(pub bool);

impl From<bool> for Flag {
    fn from(value: bool) -> Self {
        Self(value)
    }
}

impl From<Flag> for bool {
    fn from(flag: Flag) -> Self {
        flag.0
    }
}

impl ToSql for Flag {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        if *ty == Type::INT2 {
            ToSql::to_sql(&i16::from(self.0), ty, out)
        } else if *ty == Type::INT4 {
            ToSql::to_sql(&i32::from(self.0), ty, out)
        } else if *ty == Type::INT8 {
            ToSql::to_sql(&i64::from(self.0), ty, out)
        } else {
            ToSql::to_sql(&self.0, ty, out)
        }
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::BOOL || *ty == Type::INT2 || *ty == Type::INT4 || *ty == Type::INT8
    }

    to_sql_checked!();
}
