//! Type tables: per-type bidirectional value/code maps supplied by the caller.
//!
//! A [`TypeTable`] always carries the three reserved categories `context`,
//! `url` and `none`, plus any number of tables keyed by a type IRI. Each
//! [`ValueTable`] declares how its codes are written on the wire; byte-string
//! codes let a decoder tell a table code apart from a native integer the
//! document held at the same position.

use ciborium::value::Value as CborValue;
use rustc_hash::FxHashMap;
use serde_json::Value as JsonValue;

use crate::error::Error;
use crate::limits::MAX_TABLE_CODE;

/// Name of the reserved table for context URLs.
pub const CONTEXT_TABLE: &str = "context";

/// Name of the reserved table for URL-valued positions.
pub const URL_TABLE: &str = "url";

/// Name of the reserved table for untyped positions.
pub const NONE_TABLE: &str = "none";

/// How a table writes its codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CodeEncoding {
    /// Codes are CBOR unsigned integers.
    #[default]
    Integer,
    /// Codes are big-endian byte strings of 1, 2, 4 or 8 bytes.
    Bytes,
}

/// A bidirectional map between literal values and integer codes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueTable {
    encoding: CodeEncoding,
    values: FxHashMap<String, u64>,
    codes: FxHashMap<u64, String>,
}

impl ValueTable {
    /// Creates an empty table with the given code encoding.
    pub fn new(encoding: CodeEncoding) -> Self {
        Self {
            encoding,
            values: FxHashMap::default(),
            codes: FxHashMap::default(),
        }
    }

    /// Builds a table from `(value, code)` pairs.
    ///
    /// Code range is checked when the table is added to a [`TypeTable`].
    pub fn from_entries<S: Into<String>>(
        encoding: CodeEncoding,
        entries: impl IntoIterator<Item = (S, u64)>,
    ) -> Result<Self, Error> {
        let mut table = Self::new(encoding);
        for (value, code) in entries {
            table.insert(value, code)?;
        }
        Ok(table)
    }

    /// Adds one entry. A value or code may appear only once.
    pub fn insert(&mut self, value: impl Into<String>, code: u64) -> Result<(), Error> {
        let value = value.into();
        if self.values.contains_key(&value) || self.codes.contains_key(&code) {
            return Err(Error::InvalidArgument("duplicate entry in value table"));
        }
        self.codes.insert(code, value.clone());
        self.values.insert(value, code);
        Ok(())
    }

    pub fn encoding(&self) -> CodeEncoding {
        self.encoding
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the code for a value.
    pub fn code(&self, value: &str) -> Option<u64> {
        self.values.get(value).copied()
    }

    /// Returns the value for a code.
    pub fn value(&self, code: u64) -> Option<&str> {
        self.codes.get(&code).map(String::as_str)
    }

    fn max_code(&self) -> Option<u64> {
        self.codes.keys().copied().max()
    }

    /// Writes a code in this table's encoding.
    pub fn encode_code(&self, code: u64) -> CborValue {
        match self.encoding {
            CodeEncoding::Integer => CborValue::Integer(code.into()),
            CodeEncoding::Bytes => CborValue::Bytes(code_bytes(code)),
        }
    }

    /// Reads a wire value as a code of this table.
    ///
    /// Returns `None` when the value does not have the shape of a code in
    /// this encoding. A byte string of an unsupported width is an error.
    pub fn read_code(&self, value: &CborValue) -> Result<Option<u64>, Error> {
        match (self.encoding, value) {
            (CodeEncoding::Integer, CborValue::Integer(i)) => Ok(u64::try_from(*i).ok()),
            (CodeEncoding::Bytes, CborValue::Bytes(bytes)) => bytes_code(bytes).map(Some),
            _ => Ok(None),
        }
    }

    /// Returns true if reading `value` back would yield a code this table
    /// knows. Used to keep built-in codec output from being mistaken for a
    /// table code.
    pub fn claims(&self, value: &CborValue) -> bool {
        matches!(self.read_code(value), Ok(Some(code)) if self.codes.contains_key(&code))
    }

    /// Returns true if this table reads CBOR integers as codes.
    pub fn reads_integers(&self) -> bool {
        self.encoding == CodeEncoding::Integer
    }
}

/// Smallest big-endian representation of a code in 1, 2, 4 or 8 bytes.
fn code_bytes(code: u64) -> Vec<u8> {
    if code <= u8::MAX as u64 {
        vec![code as u8]
    } else if code <= u16::MAX as u64 {
        (code as u16).to_be_bytes().to_vec()
    } else if code <= u32::MAX as u64 {
        (code as u32).to_be_bytes().to_vec()
    } else {
        code.to_be_bytes().to_vec()
    }
}

fn bytes_code(bytes: &[u8]) -> Result<u64, Error> {
    match bytes.len() {
        1 | 2 | 4 | 8 => Ok(bytes.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64)),
        len => Err(Error::UnrecognizedBytes { len }),
    }
}

// =============================================================================
// TYPE TABLE
// =============================================================================

/// All value tables for one registry entry.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeTable {
    context: ValueTable,
    url: ValueTable,
    none: ValueTable,
    typed: FxHashMap<String, ValueTable>,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    /// Creates a type table with empty reserved categories.
    pub fn new() -> Self {
        Self {
            context: ValueTable::new(CodeEncoding::Integer),
            url: ValueTable::new(CodeEncoding::Integer),
            none: ValueTable::new(CodeEncoding::Bytes),
            typed: FxHashMap::default(),
        }
    }

    /// Adds or replaces the table for a type name.
    ///
    /// Keyword types (`@id`, `@vocab`, `@json`, ...) never carry a table,
    /// and every code must stay within the interoperable integer range.
    pub fn insert(&mut self, type_name: impl Into<String>, table: ValueTable) -> Result<(), Error> {
        let type_name = type_name.into();
        if type_name.starts_with('@') {
            return Err(Error::UnsupportedLiteralType { type_name });
        }
        if let Some(code) = table.max_code() {
            if code > MAX_TABLE_CODE {
                return Err(Error::CompressionValueTooLarge {
                    table: type_name,
                    code,
                    max: MAX_TABLE_CODE,
                });
            }
        }
        match type_name.as_str() {
            CONTEXT_TABLE => self.context = table,
            URL_TABLE => self.url = table,
            NONE_TABLE => self.none = table,
            _ => {
                self.typed.insert(type_name, table);
            }
        }
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert), using the default encoding
    /// for the type name.
    pub fn with_table<S: Into<String>>(
        mut self,
        type_name: &str,
        entries: impl IntoIterator<Item = (S, u64)>,
    ) -> Result<Self, Error> {
        let table = ValueTable::from_entries(default_encoding(type_name), entries)?;
        self.insert(type_name, table)?;
        Ok(self)
    }

    /// Parses a table from JSON of the form
    /// `{"context": {"https://...": 32768}, "https://type": {"value": 1}}`.
    pub fn from_json(json: &JsonValue) -> Result<Self, Error> {
        let categories = json
            .as_object()
            .ok_or(Error::InvalidArgument("type table must be a JSON object"))?;
        let mut table = Self::new();
        for (type_name, entries) in categories {
            let entries = entries
                .as_object()
                .ok_or(Error::InvalidArgument("value table must be a JSON object"))?;
            let mut values = ValueTable::new(default_encoding(type_name));
            for (value, code) in entries {
                let code = code
                    .as_u64()
                    .ok_or(Error::InvalidArgument("value table code must be an unsigned integer"))?;
                values.insert(value.clone(), code)?;
            }
            table.insert(type_name.clone(), values)?;
        }
        Ok(table)
    }

    pub fn context(&self) -> &ValueTable {
        &self.context
    }

    pub fn url(&self) -> &ValueTable {
        &self.url
    }

    pub fn none(&self) -> &ValueTable {
        &self.none
    }

    /// Returns the table for a type IRI, if one was supplied.
    pub fn typed(&self, type_name: &str) -> Option<&ValueTable> {
        self.typed.get(type_name)
    }
}

fn default_encoding(type_name: &str) -> CodeEncoding {
    if type_name == NONE_TABLE {
        CodeEncoding::Bytes
    } else {
        CodeEncoding::Integer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reserved_tables_always_present() {
        let table = TypeTable::new();
        assert!(table.context().is_empty());
        assert!(table.url().is_empty());
        assert_eq!(table.none().encoding(), CodeEncoding::Bytes);
        assert!(table.typed("https://example.com/t").is_none());
    }

    #[test]
    fn test_with_table() {
        let table = TypeTable::new()
            .with_table(CONTEXT_TABLE, [("urn:foo", 0x8000)])
            .unwrap();
        assert_eq!(table.context().code("urn:foo"), Some(0x8000));
        assert_eq!(table.context().value(0x8000), Some("urn:foo"));
    }

    #[test]
    fn test_keyword_type_rejected() {
        let err = TypeTable::new().with_table("@vocab", [("a", 1)]).unwrap_err();
        assert_eq!(
            err,
            Error::UnsupportedLiteralType {
                type_name: "@vocab".to_string()
            }
        );
    }

    #[test]
    fn test_code_too_large() {
        let err = TypeTable::new()
            .with_table("https://example.com/t", [("a", MAX_TABLE_CODE + 1)])
            .unwrap_err();
        assert!(matches!(err, Error::CompressionValueTooLarge { .. }));
        assert!(TypeTable::new()
            .with_table("https://example.com/t", [("a", MAX_TABLE_CODE)])
            .is_ok());
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let err = ValueTable::from_entries(CodeEncoding::Integer, [("a", 1), ("b", 1)]).unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_bytes_widths() {
        let table = ValueTable::new(CodeEncoding::Bytes);
        assert_eq!(table.encode_code(1), CborValue::Bytes(vec![1]));
        assert_eq!(table.encode_code(0x1234), CborValue::Bytes(vec![0x12, 0x34]));
        assert_eq!(table.encode_code(0x10000), CborValue::Bytes(vec![0, 1, 0, 0]));
        assert_eq!(table.encode_code(1 << 40).as_bytes().map(Vec::len), Some(8));

        assert_eq!(table.read_code(&CborValue::Bytes(vec![0, 1, 0, 0])), Ok(Some(0x10000)));
        assert_eq!(
            table.read_code(&CborValue::Bytes(vec![1, 2, 3])),
            Err(Error::UnrecognizedBytes { len: 3 })
        );
        assert_eq!(table.read_code(&CborValue::Integer(5.into())), Ok(None));
    }

    #[test]
    fn test_claims() {
        let table = ValueTable::from_entries(CodeEncoding::Integer, [("a", 7)]).unwrap();
        assert!(table.claims(&CborValue::Integer(7.into())));
        assert!(!table.claims(&CborValue::Integer(8.into())));
        assert!(!table.claims(&CborValue::Text("a".into())));
    }

    #[test]
    fn test_from_json() {
        let table = TypeTable::from_json(&json!({
            "context": {"https://www.w3.org/2018/credentials/v1": 0x8000},
            "none": {"secret": 1},
            "https://example.com/Status": {"active": 1, "revoked": 2}
        }))
        .unwrap();
        assert_eq!(
            table.context().code("https://www.w3.org/2018/credentials/v1"),
            Some(0x8000)
        );
        assert_eq!(table.none().encode_code(1), CborValue::Bytes(vec![1]));
        assert_eq!(
            table.typed("https://example.com/Status").and_then(|t| t.value(2)),
            Some("revoked")
        );
        assert!(TypeTable::from_json(&json!([1])).is_err());
    }
}
