//! Row decoding.
//!
//! Turns a cursor into typed rows. Text-format cells are sniffed for numbers:
//! a column holding `"12345"` (a zip code, say) comes out as the integer
//! 12345, not the string.

use std::sync::Arc;

use crate::db::{Cursor, RawValue, ResultSet, Row, Value};
use crate::error::{EnvelopeError, Result};

/// Consumes `cursor` and decodes every row, in cursor order.
///
/// Stops at the first scan failure, unsupported column type, or terminal
/// cursor error; rows decoded before the failure are dropped. The cursor is
/// not closed here.
pub async fn decode_rows(cursor: &mut (dyn Cursor + '_)) -> Result<ResultSet> {
    let columns: Arc<[String]> = cursor.columns()?.into();
    let mut rows = Vec::new();

    while cursor.advance().await {
        let raw = cursor.scan()?;
        rows.push(decode_row(&columns, raw)?);
    }

    if let Some(error) = cursor.take_error() {
        return Err(error);
    }

    Ok(rows)
}

/// Coerces one scanned row and keys it by the shared column list.
fn decode_row(columns: &Arc<[String]>, raw: Vec<RawValue>) -> Result<Row> {
    let scanned = raw.len();
    let values = raw
        .into_iter()
        .map(coerce_value)
        .collect::<Result<Vec<_>>>()?;

    Row::new(Arc::clone(columns), values).ok_or_else(|| {
        EnvelopeError::decode(format!(
            "row has {scanned} values but the result has {} columns",
            columns.len()
        ))
    })
}

/// Applies the coercion policy to one cell.
///
/// Byte cells become an integer if the whole text is a base-10 integer, else
/// a finite float if it parses as one, else text. Spellings like `nan` or
/// `Infinity` stay text. Native values pass through.
pub fn coerce_value(raw: RawValue) -> Result<Value> {
    match raw {
        RawValue::Null => Ok(Value::Null),
        RawValue::Int(i) => Ok(Value::Integer(i)),
        RawValue::Float(f) => Ok(Value::Float(f)),
        RawValue::Text(s) => Ok(Value::Text(s)),
        RawValue::Bytes(bytes) => Ok(sniff_text(&String::from_utf8_lossy(&bytes))),
        other @ RawValue::Other(_) => Err(EnvelopeError::unsupported_type(other.type_name())),
    }
}

fn sniff_text(text: &str) -> Value {
    if let Ok(i) = text.parse::<i64>() {
        Value::Integer(i)
    } else if let Some(f) = text.parse::<f64>().ok().filter(|f| f.is_finite()) {
        Value::Float(f)
    } else {
        Value::Text(text.to_string())
    }
}
