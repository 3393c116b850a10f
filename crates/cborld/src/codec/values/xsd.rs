//! `xsd:date` and `xsd:dateTime` literals as epoch seconds.

use ciborium::value::Value as CborValue;

use crate::codec::cbor::as_i64;
use crate::util::{
    SECONDS_PER_DAY, UtcDateTime, format_xsd_date, format_xsd_datetime, parse_xsd_date,
    parse_xsd_datetime,
};

pub const XSD_DATE: &str = "http://www.w3.org/2001/XMLSchema#date";
pub const XSD_DATETIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";

/// `YYYY-MM-DD` as seconds since epoch at midnight UTC.
pub fn encode_date(value: &str) -> Option<CborValue> {
    let days = parse_xsd_date(value).ok()?;
    Some(CborValue::Integer((days * SECONDS_PER_DAY).into()))
}

pub fn decode_date(value: &CborValue) -> Option<String> {
    let seconds = as_i64(value)?;
    if seconds % SECONDS_PER_DAY != 0 {
        return None;
    }
    format_xsd_date(seconds / SECONDS_PER_DAY)
}

/// A UTC dateTime as seconds, or `[seconds, milliseconds]` when the string
/// carries milliseconds.
pub fn encode_datetime(value: &str) -> Option<CborValue> {
    let datetime = parse_xsd_datetime(value).ok()?;
    let seconds = CborValue::Integer(datetime.seconds.into());
    Some(match datetime.millis {
        None => seconds,
        Some(ms) => CborValue::Array(vec![seconds, CborValue::Integer(ms.into())]),
    })
}

pub fn decode_datetime(value: &CborValue) -> Option<String> {
    let datetime = match value {
        CborValue::Integer(_) => UtcDateTime {
            seconds: as_i64(value)?,
            millis: None,
        },
        CborValue::Array(items) => match items.as_slice() {
            [seconds, millis] => UtcDateTime {
                seconds: as_i64(seconds)?,
                millis: Some(u16::try_from(as_i64(millis)?).ok()?),
            },
            _ => return None,
        },
        _ => return None,
    };
    format_xsd_datetime(datetime)
}
