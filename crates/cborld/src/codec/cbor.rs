//! Bridge between JSON values and CBOR values, and CBOR byte I/O.
//!
//! Used directly for uncompressed payloads and `@json` literals, and as the
//! fallback for primitives no value codec claims.

use ciborium::value::Value as CborValue;
use serde_json::{Map, Number, Value as JsonValue};

use crate::error::Error;

/// Converts a JSON value to CBOR with no term or value substitution.
pub fn json_to_cbor(value: &JsonValue) -> Result<CborValue, Error> {
    Ok(match value {
        JsonValue::Null => CborValue::Null,
        JsonValue::Bool(b) => CborValue::Bool(*b),
        JsonValue::Number(n) => number_to_cbor(n)?,
        JsonValue::String(s) => CborValue::Text(s.clone()),
        JsonValue::Array(items) => CborValue::Array(items.iter().map(json_to_cbor).collect::<Result<_, _>>()?),
        JsonValue::Object(map) => CborValue::Map(
            map.iter()
                .map(|(k, v)| Ok((CborValue::Text(k.clone()), json_to_cbor(v)?)))
                .collect::<Result<_, Error>>()?,
        ),
    })
}

fn number_to_cbor(n: &Number) -> Result<CborValue, Error> {
    if let Some(u) = n.as_u64() {
        Ok(CborValue::Integer(u.into()))
    } else if let Some(i) = n.as_i64() {
        Ok(CborValue::Integer(i.into()))
    } else if let Some(f) = n.as_f64() {
        Ok(CborValue::Float(f))
    } else {
        Err(Error::InvalidEncodedValue(format!("number {n} has no CBOR representation")))
    }
}

/// Converts a CBOR value to JSON. Fails on values JSON cannot hold: byte
/// strings, tags, non-text map keys, non-finite floats and integers outside
/// the 64-bit range.
pub fn cbor_to_json(value: &CborValue) -> Result<JsonValue, Error> {
    Ok(match value {
        CborValue::Null => JsonValue::Null,
        CborValue::Bool(b) => JsonValue::Bool(*b),
        CborValue::Integer(i) => integer_to_json(*i)?,
        CborValue::Float(f) => Number::from_f64(*f)
            .map(JsonValue::Number)
            .ok_or_else(|| Error::InvalidEncodedValue(format!("non-finite float {f}")))?,
        CborValue::Text(s) => JsonValue::String(s.clone()),
        CborValue::Array(items) => JsonValue::Array(items.iter().map(cbor_to_json).collect::<Result<_, _>>()?),
        CborValue::Map(entries) => {
            let mut map = Map::new();
            for (k, v) in entries {
                let CborValue::Text(key) = k else {
                    return Err(Error::InvalidEncodedValue(format!(
                        "map key {k:?} is not a string in uncompressed data"
                    )));
                };
                map.insert(key.clone(), cbor_to_json(v)?);
            }
            JsonValue::Object(map)
        }
        CborValue::Bytes(b) => {
            return Err(Error::InvalidEncodedValue(format!(
                "unexpected {}-byte string",
                b.len()
            )));
        }
        CborValue::Tag(tag, _) => {
            return Err(Error::InvalidEncodedValue(format!("unexpected tag {tag}")));
        }
        other => {
            return Err(Error::InvalidEncodedValue(format!("unsupported CBOR value {other:?}")));
        }
    })
}

/// Converts a CBOR integer to a JSON number.
pub fn integer_to_json(i: ciborium::value::Integer) -> Result<JsonValue, Error> {
    let wide = i128::from(i);
    if let Ok(u) = u64::try_from(wide) {
        Ok(JsonValue::from(u))
    } else if let Ok(s) = i64::try_from(wide) {
        Ok(JsonValue::from(s))
    } else {
        Err(Error::InvalidEncodedValue(format!("integer {wide} out of range")))
    }
}

/// Returns the value of a CBOR integer that fits in `i64`.
pub fn as_i64(value: &CborValue) -> Option<i64> {
    match value {
        CborValue::Integer(i) => i64::try_from(i128::from(*i)).ok(),
        _ => None,
    }
}

/// Returns the value of a non-negative CBOR integer.
pub fn as_u64(value: &CborValue) -> Option<u64> {
    match value {
        CborValue::Integer(i) => u64::try_from(*i).ok(),
        _ => None,
    }
}

/// Serializes a CBOR value.
pub fn to_bytes(value: &CborValue) -> Result<Vec<u8>, Error> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(value, &mut buf).map_err(|e| Error::Cbor(e.to_string()))?;
    Ok(buf)
}

/// Parses exactly one CBOR value from `bytes`.
pub fn from_bytes(bytes: &[u8]) -> Result<CborValue, Error> {
    let mut reader = bytes;
    let value: CborValue = ciborium::de::from_reader(&mut reader).map_err(|e| Error::Cbor(e.to_string()))?;
    if !reader.is_empty() {
        return Err(Error::Cbor(format!("{} trailing bytes after CBOR value", reader.len())));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_cbor_roundtrip() {
        let doc = json!({
            "a": [1, -2, 3.5, true, null],
            "b": {"c": "text"},
            "big": 18446744073709551615u64
        });
        let cbor = json_to_cbor(&doc).unwrap();
        assert_eq!(cbor_to_json(&cbor).unwrap(), doc);
    }

    #[test]
    fn test_bytes_have_no_json_form() {
        let err = cbor_to_json(&CborValue::Bytes(vec![1, 2])).unwrap_err();
        assert!(matches!(err, Error::InvalidEncodedValue(_)));
    }

    #[test]
    fn test_integer_keys_rejected() {
        let map = CborValue::Map(vec![(CborValue::Integer(100.into()), CborValue::Null)]);
        assert!(cbor_to_json(&map).is_err());
    }

    #[test]
    fn test_byte_io() {
        let value = CborValue::Tag(0x0601, Box::new(CborValue::Map(vec![])));
        let bytes = to_bytes(&value).unwrap();
        assert_eq!(bytes, vec![0xd9, 0x06, 0x01, 0xa0]);
        assert_eq!(from_bytes(&bytes).unwrap(), value);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        assert!(matches!(from_bytes(&[0xa0, 0x00]), Err(Error::Cbor(_))));
    }
}
