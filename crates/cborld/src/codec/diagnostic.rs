//! CBOR diagnostic notation (RFC 8949 section 8) for debugging output.

use std::fmt::Write;

use ciborium::value::Value as CborValue;

/// Renders a CBOR value in diagnostic notation, e.g.
/// `1537({0: 32768, 101: [h'4d010203']})`.
pub fn to_diagnostic(value: &CborValue) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &CborValue) {
    match value {
        CborValue::Integer(i) => {
            let _ = write!(out, "{}", i128::from(*i));
        }
        CborValue::Float(f) => {
            if f.is_nan() {
                out.push_str("NaN");
            } else if f.is_infinite() {
                out.push_str(if *f > 0.0 { "Infinity" } else { "-Infinity" });
            } else if f.fract() == 0.0 && f.abs() < 1e16 {
                let _ = write!(out, "{:.1}", f);
            } else {
                let _ = write!(out, "{}", f);
            }
        }
        CborValue::Bytes(bytes) => {
            out.push_str("h'");
            for b in bytes {
                let _ = write!(out, "{:02x}", b);
            }
            out.push('\'');
        }
        CborValue::Text(s) => {
            // JSON string escaping matches diagnostic notation for text.
            out.push_str(&serde_json::Value::String(s.clone()).to_string());
        }
        CborValue::Bool(b) => {
            let _ = write!(out, "{}", b);
        }
        CborValue::Null => out.push_str("null"),
        CborValue::Tag(tag, inner) => {
            let _ = write!(out, "{}(", tag);
            write_value(out, inner);
            out.push(')');
        }
        CborValue::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item);
            }
            out.push(']');
        }
        CborValue::Map(entries) => {
            out.push('{');
            for (i, (k, v)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, k);
                out.push_str(": ");
                write_value(out, v);
            }
            out.push('}');
        }
        _ => out.push_str("undefined"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic() {
        let value = CborValue::Tag(
            0x0601,
            Box::new(CborValue::Map(vec![
                (CborValue::Integer(0.into()), CborValue::Integer(0x8000.into())),
                (
                    CborValue::Integer(101.into()),
                    CborValue::Array(vec![CborValue::Bytes(vec![0x4d, 1, 2, 3])]),
                ),
                (CborValue::Text("x\"y".into()), CborValue::Float(1.5)),
                (CborValue::Integer((-3).into()), CborValue::Null),
            ])),
        );
        assert_eq!(
            to_diagnostic(&value),
            r#"1537({0: 32768, 101: [h'4d010203'], "x\"y": 1.5, -3: null})"#
        );
    }

    #[test]
    fn test_float_forms() {
        assert_eq!(to_diagnostic(&CborValue::Float(2.0)), "2.0");
        assert_eq!(to_diagnostic(&CborValue::Float(f64::NAN)), "NaN");
    }
}
