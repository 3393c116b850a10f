//! Document-level encoding and decoding.
//!
//! [`encode`] turns a JSON-LD document into CBOR-LD bytes and [`decode`]
//! reverses it. Both build a fresh term registry per call; the only state
//! shared between calls is what the caller passes in through the options.

use std::borrow::Cow;
use std::fmt;

use ciborium::value::Value as CborValue;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::codec::cbor::{cbor_to_json, from_bytes, json_to_cbor, to_bytes};
use crate::codec::compress::Compressor;
use crate::codec::converter::Converter;
use crate::codec::decompress::Decompressor;
use crate::codec::diagnostic::to_diagnostic;
use crate::codec::framing::{Format, Header, frame, unframe};
use crate::codec::values::CodecContext;
use crate::context::{DocumentLoader, TypeTableLoader};
use crate::error::Error;
use crate::type_table::TypeTable;

/// Receives the CBOR diagnostic notation of the framed value.
pub type Diagnose<'a> = &'a dyn Fn(&str);

// =============================================================================
// OPTIONS
// =============================================================================

/// Options for [`encode`].
#[derive(Clone, Copy)]
pub struct EncodeOptions<'a> {
    /// Wire format of the tag and header.
    pub format: Format,
    /// Registry entry id written in the header. `0` writes the document
    /// uncompressed.
    pub registry_entry_id: u64,
    /// Type table to compress with. Mutually exclusive with
    /// `type_table_loader`.
    pub type_table: Option<&'a TypeTable>,
    pub type_table_loader: Option<&'a dyn TypeTableLoader>,
    pub document_loader: &'a dyn DocumentLoader,
    pub diagnose: Option<Diagnose<'a>>,
}

impl<'a> EncodeOptions<'a> {
    /// Creates options for the current format and registry entry 1.
    pub fn new(document_loader: &'a dyn DocumentLoader) -> Self {
        Self {
            format: Format::Current,
            registry_entry_id: 1,
            type_table: None,
            type_table_loader: None,
            document_loader,
            diagnose: None,
        }
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn registry_entry_id(mut self, registry_entry_id: u64) -> Self {
        self.registry_entry_id = registry_entry_id;
        self
    }

    pub fn type_table(mut self, type_table: &'a TypeTable) -> Self {
        self.type_table = Some(type_table);
        self
    }

    pub fn type_table_loader(mut self, loader: &'a dyn TypeTableLoader) -> Self {
        self.type_table_loader = Some(loader);
        self
    }

    pub fn diagnose(mut self, diagnose: Diagnose<'a>) -> Self {
        self.diagnose = Some(diagnose);
        self
    }
}

impl fmt::Debug for EncodeOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodeOptions")
            .field("format", &self.format)
            .field("registry_entry_id", &self.registry_entry_id)
            .field("type_table", &self.type_table.is_some())
            .field("type_table_loader", &self.type_table_loader.is_some())
            .field("diagnose", &self.diagnose.is_some())
            .finish()
    }
}

/// Options for [`decode`]. The format and registry entry id come from the
/// header.
#[derive(Clone, Copy)]
pub struct DecodeOptions<'a> {
    pub type_table: Option<&'a TypeTable>,
    pub type_table_loader: Option<&'a dyn TypeTableLoader>,
    pub document_loader: &'a dyn DocumentLoader,
    pub diagnose: Option<Diagnose<'a>>,
}

impl<'a> DecodeOptions<'a> {
    pub fn new(document_loader: &'a dyn DocumentLoader) -> Self {
        Self {
            type_table: None,
            type_table_loader: None,
            document_loader,
            diagnose: None,
        }
    }

    pub fn type_table(mut self, type_table: &'a TypeTable) -> Self {
        self.type_table = Some(type_table);
        self
    }

    pub fn type_table_loader(mut self, loader: &'a dyn TypeTableLoader) -> Self {
        self.type_table_loader = Some(loader);
        self
    }

    pub fn diagnose(mut self, diagnose: Diagnose<'a>) -> Self {
        self.diagnose = Some(diagnose);
        self
    }
}

impl fmt::Debug for DecodeOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeOptions")
            .field("type_table", &self.type_table.is_some())
            .field("type_table_loader", &self.type_table_loader.is_some())
            .field("diagnose", &self.diagnose.is_some())
            .finish()
    }
}

fn check_table_sources(
    type_table: Option<&TypeTable>,
    loader: Option<&dyn TypeTableLoader>,
) -> Result<(), Error> {
    if type_table.is_some() && loader.is_some() {
        return Err(Error::InvalidArgument(
            "type_table and type_table_loader are mutually exclusive",
        ));
    }
    Ok(())
}

fn select_type_table<'t>(
    type_table: Option<&'t TypeTable>,
    loader: Option<&dyn TypeTableLoader>,
    registry_entry_id: u64,
) -> Result<Cow<'t, TypeTable>, Error> {
    if let Some(table) = type_table {
        debug!(registry_entry_id, "using supplied type table");
        return Ok(Cow::Borrowed(table));
    }
    let table = loader
        .and_then(|loader| loader.load_type_table(registry_entry_id))
        .ok_or(Error::NoTypeTable { registry_entry_id })?;
    debug!(registry_entry_id, "loaded type table");
    Ok(Cow::Owned(table))
}

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes a JSON-LD document (an object or an array of objects).
pub fn encode(document: &JsonValue, options: &EncodeOptions<'_>) -> Result<Vec<u8>, Error> {
    check_table_sources(options.type_table, options.type_table_loader)?;
    let header = Header::new(options.format, options.registry_entry_id)?;

    let payload = if header.payload_compressed {
        let type_table = select_type_table(
            options.type_table,
            options.type_table_loader,
            header.type_table_id(),
        )?;
        let codec = CodecContext::new(&type_table, header.is_legacy());
        Converter::new(Compressor, options.document_loader, codec).convert(document)?
    } else {
        check_uncompressed_root(document)?;
        json_to_cbor(document)?
    };

    let framed = frame(&header, payload);
    if let Some(diagnose) = options.diagnose {
        diagnose(&to_diagnostic(&framed));
    }
    to_bytes(&framed)
}

fn check_uncompressed_root(document: &JsonValue) -> Result<(), Error> {
    let valid = match document {
        JsonValue::Object(_) => true,
        JsonValue::Array(items) => items.iter().all(JsonValue::is_object),
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidArgument(
            "document must be an object or an array of objects",
        ))
    }
}

// =============================================================================
// DECODING
// =============================================================================

/// Decodes CBOR-LD bytes into a JSON-LD document.
pub fn decode(bytes: &[u8], options: &DecodeOptions<'_>) -> Result<JsonValue, Error> {
    check_table_sources(options.type_table, options.type_table_loader)?;
    let value = from_bytes(bytes)?;
    if let Some(diagnose) = options.diagnose {
        diagnose(&to_diagnostic(&value));
    }
    let (header, payload) = unframe(value)?;

    if !header.payload_compressed {
        check_uncompressed_payload(&payload)?;
        return cbor_to_json(&payload);
    }

    let type_table = select_type_table(
        options.type_table,
        options.type_table_loader,
        header.type_table_id(),
    )?;
    let codec = CodecContext::new(&type_table, header.is_legacy());
    Converter::new(Decompressor, options.document_loader, codec).convert(&payload)
}

fn check_uncompressed_payload(payload: &CborValue) -> Result<(), Error> {
    let valid = match payload {
        CborValue::Map(_) => true,
        CborValue::Array(items) => items.iter().all(CborValue::is_map),
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidEncodedValue(
            "payload must be a map or an array of maps".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StaticDocumentLoader;
    use serde_json::json;
    use std::cell::RefCell;

    #[test]
    fn test_empty_document_bytes() {
        let documents = StaticDocumentLoader::new();
        let table = TypeTable::new();
        let options = EncodeOptions::new(&documents).type_table(&table);

        let bytes = encode(&json!({}), &options).unwrap();
        assert_eq!(bytes, vec![0xd9, 0xcb, 0x1d, 0x82, 0x01, 0xa0]);

        let legacy = options.format(Format::LegacyRange);
        assert_eq!(encode(&json!({}), &legacy).unwrap(), vec![0xd9, 0x06, 0x01, 0xa0]);
        let uncompressed = legacy.registry_entry_id(0);
        assert_eq!(encode(&json!({}), &uncompressed).unwrap(), vec![0xd9, 0x06, 0x00, 0xa0]);
    }

    #[test]
    fn test_table_sources() {
        let documents = StaticDocumentLoader::new();
        let table = TypeTable::new();
        let loader = |_: u64| Some(TypeTable::new());

        let both = EncodeOptions::new(&documents).type_table(&table).type_table_loader(&loader);
        let err = encode(&json!({}), &both).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(err.is_config_error());

        let neither = EncodeOptions::new(&documents);
        assert_eq!(
            encode(&json!({}), &neither).unwrap_err(),
            Error::NoTypeTable { registry_entry_id: 1 }
        );
        // Uncompressed payloads need no table.
        assert!(encode(&json!({}), &neither.registry_entry_id(0)).is_ok());

        let missing = |_: u64| -> Option<TypeTable> { None };
        let options = EncodeOptions::new(&documents).type_table_loader(&missing);
        assert_eq!(
            encode(&json!({}), &options).unwrap_err(),
            Error::NoTypeTable { registry_entry_id: 1 }
        );
    }

    #[test]
    fn test_uncompressed_roundtrip() {
        let documents = StaticDocumentLoader::new();
        let doc = json!({"@context": "urn:unloaded", "a": [1, "b", null]});
        let options = EncodeOptions::new(&documents).registry_entry_id(0);
        let bytes = encode(&doc, &options).unwrap();
        assert_eq!(decode(&bytes, &DecodeOptions::new(&documents)).unwrap(), doc);

        assert!(matches!(
            encode(&json!(5), &options),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_diagnose_sink() {
        let documents = StaticDocumentLoader::new();
        let table = TypeTable::new();
        let seen = RefCell::new(Vec::new());
        let sink = |text: &str| seen.borrow_mut().push(text.to_string());

        let options = EncodeOptions::new(&documents).type_table(&table).diagnose(&sink);
        let bytes = encode(&json!({}), &options).unwrap();
        let decode_options = DecodeOptions::new(&documents).type_table(&table).diagnose(&sink);
        decode(&bytes, &decode_options).unwrap();

        assert_eq!(*seen.borrow(), vec!["51997([1, {}])".to_string(); 2]);
    }

    #[test]
    fn test_decode_rejects_non_cborld() {
        let documents = StaticDocumentLoader::new();
        let options = DecodeOptions::new(&documents);
        assert_eq!(decode(&[0xa0], &options).unwrap_err(), Error::Untagged);
        assert!(matches!(
            decode(&[0xd9, 0x12, 0x34, 0xa0], &options),
            Err(Error::UnknownTag { tag: 0x1234 })
        ));
    }
}
