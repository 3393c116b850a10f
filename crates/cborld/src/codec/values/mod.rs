//! Value codecs, selected by the value type of the term being converted.
//!
//! Dispatch order for a string value:
//! 1. the value table for the type (`context`, `url`, `none` or a type IRI)
//! 2. a built-in codec for the type IRI (dates, multibase) or URL compaction
//! 3. the string as CBOR text
//!
//! Arrays and objects are declined so the converter can recurse into them.

pub mod multibase;
pub mod url;
pub mod xsd;

use ciborium::value::Value as CborValue;
use serde_json::Value as JsonValue;

use crate::codec::cbor::{as_u64, cbor_to_json, json_to_cbor};
use crate::context::ActiveContext;
use crate::error::Error;
use crate::registry::TermRegistry;
use crate::type_table::{NONE_TABLE, TypeTable, ValueTable};

/// Normalized value type of a term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    /// Entries of `@context`.
    Context,
    /// `@id`, `@type` and terms typed `@id` or `@vocab`. At vocabulary
    /// positions registered terms are substituted by their codes.
    Url { vocab: bool },
    /// `@json` literals, written as plain CBOR.
    Json,
    /// Untyped terms.
    None,
    /// Terms typed with an IRI.
    Typed(String),
}

impl ValueType {
    /// Resolves the value type of `term` in `active`.
    pub fn for_term(active: &ActiveContext, term: &str, is_type_term: bool) -> Self {
        if is_type_term {
            return ValueType::Url { vocab: true };
        }
        if active.is_id_term(term) {
            return ValueType::Url { vocab: false };
        }
        match active.term(term).and_then(|def| def.type_.as_deref()) {
            Some("@id") => ValueType::Url { vocab: false },
            Some("@vocab") => ValueType::Url { vocab: true },
            Some("@json") => ValueType::Json,
            Some(type_iri) if !type_iri.starts_with('@') => ValueType::Typed(type_iri.to_string()),
            _ => ValueType::None,
        }
    }
}

/// Shared state of the value codecs for one conversion.
#[derive(Debug, Clone, Copy)]
pub struct CodecContext<'a> {
    pub type_table: &'a TypeTable,
    /// Payload uses a legacy framing; enables the legacy term fallback.
    pub legacy: bool,
}

impl<'a> CodecContext<'a> {
    pub fn new(type_table: &'a TypeTable, legacy: bool) -> Self {
        Self { type_table, legacy }
    }

    fn table(&self, value_type: &ValueType) -> Option<&'a ValueTable> {
        match value_type {
            ValueType::Context => Some(self.type_table.context()),
            ValueType::Url { .. } => Some(self.type_table.url()),
            ValueType::None => Some(self.type_table.none()),
            ValueType::Json => None,
            ValueType::Typed(iri) => self.type_table.typed(iri),
        }
    }

    /// Returns true if a decoder would read a CBOR integer at this position
    /// as a code rather than as the number itself.
    fn reads_integers(&self, value_type: &ValueType) -> bool {
        match value_type {
            ValueType::Context | ValueType::Url { .. } => true,
            ValueType::Json => false,
            ValueType::Typed(iri) if iri == xsd::XSD_DATE || iri == xsd::XSD_DATETIME => true,
            _ => self.table(value_type).is_some_and(ValueTable::reads_integers),
        }
    }

    // =========================================================================
    // ENCODING
    // =========================================================================

    /// Encodes a non-null JSON value. Returns `None` for arrays and objects.
    pub fn encode_value(
        &self,
        value: &JsonValue,
        value_type: &ValueType,
        registry: &TermRegistry,
    ) -> Result<Option<CborValue>, Error> {
        if *value_type == ValueType::Json {
            return json_to_cbor(value).map(Some);
        }
        match value {
            JsonValue::Array(_) | JsonValue::Object(_) => Ok(None),
            JsonValue::String(s) => Ok(Some(self.encode_string(s, value_type, registry))),
            JsonValue::Number(n) if (n.is_u64() || n.is_i64()) && self.reads_integers(value_type) => {
                Err(Error::InvalidEncodedValue(format!(
                    "integer literal {n} at a position whose integers are read as table codes"
                )))
            }
            other => json_to_cbor(other).map(Some),
        }
    }

    /// Encodes one entry of a node's `@context`. URLs go through the context
    /// table; inline contexts and `null` are written as plain CBOR.
    pub fn encode_context(&self, value: &JsonValue) -> Result<CborValue, Error> {
        match value {
            JsonValue::String(url) => {
                let table = self.type_table.context();
                Ok(match table.code(url) {
                    Some(code) => table.encode_code(code),
                    None => CborValue::Text(url.clone()),
                })
            }
            other => json_to_cbor(other),
        }
    }

    fn encode_string(&self, value: &str, value_type: &ValueType, registry: &TermRegistry) -> CborValue {
        let table = self.table(value_type);
        if let ValueType::Url { vocab } = value_type {
            return url::encode(value, *vocab, self.type_table.url(), registry);
        }
        if let Some(table) = table {
            if let Some(code) = table.code(value) {
                return table.encode_code(code);
            }
        }
        if let ValueType::Typed(iri) = value_type {
            if let Some(encoded) = encode_builtin(iri, value) {
                if !table.is_some_and(|t| t.claims(&encoded)) {
                    return encoded;
                }
            }
        }
        CborValue::Text(value.to_string())
    }

    // =========================================================================
    // DECODING
    // =========================================================================

    /// Decodes a non-null wire value. Returns `None` for arrays and maps no
    /// codec claims.
    pub fn decode_value(
        &self,
        value: &CborValue,
        value_type: &ValueType,
        registry: &TermRegistry,
    ) -> Result<Option<JsonValue>, Error> {
        match value_type {
            ValueType::Json => cbor_to_json(value).map(Some),
            ValueType::Context => self.decode_context(value).map(Some),
            ValueType::Url { vocab } => {
                match url::decode(value, *vocab, self.legacy, self.type_table.url(), registry)? {
                    Some(url) => Ok(Some(JsonValue::String(url))),
                    None => passthrough(value),
                }
            }
            ValueType::None => self.decode_untyped(value),
            ValueType::Typed(iri) => self.decode_typed(iri, value, registry),
        }
    }

    fn decode_context(&self, value: &CborValue) -> Result<JsonValue, Error> {
        match value {
            CborValue::Integer(_) => {
                let code = as_u64(value).ok_or_else(|| {
                    Error::InvalidEncodedValue("negative context code".to_string())
                })?;
                self.type_table
                    .context()
                    .value(code)
                    .map(|url| JsonValue::String(url.to_string()))
                    .ok_or(Error::UndefinedCompressedContext { code })
            }
            other => cbor_to_json(other),
        }
    }

    fn decode_untyped(&self, value: &CborValue) -> Result<Option<JsonValue>, Error> {
        let table = self.type_table.none();
        if let Some(code) = table.read_code(value)? {
            return match table.value(code) {
                Some(v) => Ok(Some(JsonValue::String(v.to_string()))),
                None => Err(Error::UnknownCompressedValue {
                    table: NONE_TABLE.to_string(),
                    code,
                }),
            };
        }
        passthrough(value)
    }

    fn decode_typed(&self, iri: &str, value: &CborValue, registry: &TermRegistry) -> Result<Option<JsonValue>, Error> {
        let table = self.type_table.typed(iri);
        let mut failure = None;
        if let Some(table) = table {
            match table.read_code(value) {
                Ok(Some(code)) => match table.value(code) {
                    Some(v) => return Ok(Some(JsonValue::String(v.to_string()))),
                    None => {
                        failure = Some(Error::UnknownCompressedValue {
                            table: iri.to_string(),
                            code,
                        })
                    }
                },
                Ok(None) => {}
                Err(e) => failure = Some(e),
            }
        }

        if let Some(decoded) = decode_builtin(iri, value) {
            return Ok(Some(JsonValue::String(decoded)));
        }

        match failure {
            Some(Error::UnknownCompressedValue { code, .. }) if self.legacy && value.is_integer() => {
                match registry.lookup(code) {
                    Some(term) => Ok(Some(JsonValue::String(term.to_string()))),
                    None => Err(Error::UnknownCompressedValue {
                        table: iri.to_string(),
                        code,
                    }),
                }
            }
            Some(e) => Err(e),
            None => passthrough(value),
        }
    }
}

fn encode_builtin(iri: &str, value: &str) -> Option<CborValue> {
    match iri {
        xsd::XSD_DATE => xsd::encode_date(value),
        xsd::XSD_DATETIME => xsd::encode_datetime(value),
        multibase::MULTIBASE => multibase::encode(value).map(CborValue::Bytes),
        _ => None,
    }
}

fn decode_builtin(iri: &str, value: &CborValue) -> Option<String> {
    match iri {
        xsd::XSD_DATE => xsd::decode_date(value),
        xsd::XSD_DATETIME => xsd::decode_datetime(value),
        multibase::MULTIBASE => match value {
            CborValue::Bytes(bytes) => multibase::decode(bytes),
            _ => None,
        },
        _ => None,
    }
}

/// Primitives convert as plain CBOR; arrays and maps are left to the
/// converter.
fn passthrough(value: &CborValue) -> Result<Option<JsonValue>, Error> {
    match value {
        CborValue::Array(_) | CborValue::Map(_) => Ok(None),
        other => cbor_to_json(other).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_table::{CONTEXT_TABLE, CodeEncoding};
    use serde_json::json;

    fn codec(table: &TypeTable) -> CodecContext<'_> {
        CodecContext::new(table, false)
    }

    #[test]
    fn test_context_codes() {
        let table = TypeTable::new().with_table(CONTEXT_TABLE, [("urn:foo", 0x8000)]).unwrap();
        let registry = TermRegistry::new();
        let c = codec(&table);

        let encoded = c.encode_value(&json!("urn:foo"), &ValueType::Context, &registry).unwrap();
        assert_eq!(encoded, Some(CborValue::Integer(0x8000.into())));
        let decoded = c.decode_value(&CborValue::Integer(0x8000.into()), &ValueType::Context, &registry);
        assert_eq!(decoded.unwrap(), Some(json!("urn:foo")));

        let err = c
            .decode_value(&CborValue::Integer(7.into()), &ValueType::Context, &registry)
            .unwrap_err();
        assert_eq!(err, Error::UndefinedCompressedContext { code: 7 });
    }

    #[test]
    fn test_untyped_bytes_codes() {
        let table = TypeTable::new().with_table(NONE_TABLE, [("secret", 1)]).unwrap();
        let registry = TermRegistry::new();
        let c = codec(&table);

        let encoded = c.encode_value(&json!("secret"), &ValueType::None, &registry).unwrap();
        assert_eq!(encoded, Some(CborValue::Bytes(vec![1])));
        // Native integers are untouched at untyped positions.
        let encoded = c.encode_value(&json!(1), &ValueType::None, &registry).unwrap();
        assert_eq!(encoded, Some(CborValue::Integer(1.into())));

        let decoded = c.decode_value(&CborValue::Bytes(vec![1]), &ValueType::None, &registry);
        assert_eq!(decoded.unwrap(), Some(json!("secret")));
        let decoded = c.decode_value(&CborValue::Integer(1.into()), &ValueType::None, &registry);
        assert_eq!(decoded.unwrap(), Some(json!(1)));

        let err = c
            .decode_value(&CborValue::Bytes(vec![1, 2, 3]), &ValueType::None, &registry)
            .unwrap_err();
        assert_eq!(err, Error::UnrecognizedBytes { len: 3 });
    }

    #[test]
    fn test_typed_table_strict_miss() {
        let status = ValueType::Typed("https://example.com/Status".to_string());
        let table = TypeTable::new()
            .with_table("https://example.com/Status", [("active", 1)])
            .unwrap();
        let mut registry = TermRegistry::new();
        registry.register("Thing");

        let encoded = codec(&table).encode_value(&json!("active"), &status, &registry).unwrap();
        assert_eq!(encoded, Some(CborValue::Integer(1.into())));

        let miss = CborValue::Integer(100.into());
        let err = codec(&table).decode_value(&miss, &status, &registry).unwrap_err();
        assert!(matches!(err, Error::UnknownCompressedValue { code: 100, .. }));

        // Legacy payloads resolve the miss through the term registry.
        let legacy = CodecContext::new(&table, true);
        assert_eq!(legacy.decode_value(&miss, &status, &registry).unwrap(), Some(json!("Thing")));
        let err = legacy
            .decode_value(&CborValue::Integer(200.into()), &status, &registry)
            .unwrap_err();
        assert!(matches!(err, Error::UnknownCompressedValue { code: 200, .. }));
    }

    #[test]
    fn test_builtin_declined_when_table_claims_output() {
        let date = ValueType::Typed(xsd::XSD_DATE.to_string());
        // 86400 is 1970-01-02 as epoch seconds, and also a table code.
        let table = TypeTable::new()
            .with_table(xsd::XSD_DATE, [("someday", 86400)])
            .unwrap();
        let registry = TermRegistry::new();
        let c = codec(&table);

        let encoded = c.encode_value(&json!("1970-01-02"), &date, &registry).unwrap();
        assert_eq!(encoded, Some(CborValue::Text("1970-01-02".into())));
        let encoded = c.encode_value(&json!("1970-01-03"), &date, &registry).unwrap();
        assert_eq!(encoded, Some(CborValue::Integer((2 * 86400).into())));
        let decoded = c.decode_value(&CborValue::Integer((2 * 86400).into()), &date, &registry);
        assert_eq!(decoded.unwrap(), Some(json!("1970-01-03")));
    }

    #[test]
    fn test_integer_rejected_where_codes_are_integers() {
        let table = TypeTable::new();
        let registry = TermRegistry::new();
        let err = codec(&table)
            .encode_value(&json!(5), &ValueType::Url { vocab: false }, &registry)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidEncodedValue(_)));
        assert!(!err.is_config_error());
        assert!(codec(&table)
            .encode_value(&json!(5.5), &ValueType::Url { vocab: false }, &registry)
            .is_ok());
    }

    #[test]
    fn test_json_literal() {
        let table = TypeTable::new();
        let registry = TermRegistry::new();
        let value = json!({"nested": [1, {"a": "b"}]});
        let c = codec(&table);
        let encoded = c.encode_value(&value, &ValueType::Json, &registry).unwrap().unwrap();
        assert_eq!(c.decode_value(&encoded, &ValueType::Json, &registry).unwrap(), Some(value));
    }

    #[test]
    fn test_structures_declined() {
        let table = TypeTable::new();
        let registry = TermRegistry::new();
        let c = codec(&table);
        assert_eq!(c.encode_value(&json!({"a": 1}), &ValueType::None, &registry).unwrap(), None);
        assert_eq!(c.encode_value(&json!([1]), &ValueType::None, &registry).unwrap(), None);
        assert_eq!(
            c.decode_value(&CborValue::Map(vec![]), &ValueType::None, &registry).unwrap(),
            None
        );
    }

    #[test]
    fn test_bytes_encoded_typed_table() {
        let kind = ValueType::Typed("https://example.com/kind".to_string());
        let mut table = TypeTable::new();
        table
            .insert(
                "https://example.com/kind",
                ValueTable::from_entries(CodeEncoding::Bytes, [("big", 0x1_0000)]).unwrap(),
            )
            .unwrap();
        let registry = TermRegistry::new();
        let c = codec(&table);
        let encoded = c.encode_value(&json!("big"), &kind, &registry).unwrap().unwrap();
        assert_eq!(encoded, CborValue::Bytes(vec![0, 1, 0, 0]));
        assert_eq!(c.decode_value(&encoded, &kind, &registry).unwrap(), Some(json!("big")));
        // Native integers pass through since the table reads byte strings.
        let encoded = c.encode_value(&json!(7), &kind, &registry).unwrap().unwrap();
        assert_eq!(c.decode_value(&encoded, &kind, &registry).unwrap(), Some(json!(7)));
    }
}
