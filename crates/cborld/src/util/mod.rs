//! Utility functions for CBOR-LD value codecs.

pub mod datetime;

pub use datetime::{
    DateTimeParseError, SECONDS_PER_DAY, UtcDateTime, format_xsd_date, format_xsd_datetime,
    parse_xsd_date, parse_xsd_datetime,
};
