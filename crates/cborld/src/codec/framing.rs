//! CBOR-LD framing: the tag and wrapper around the payload.
//!
//! | Format | Tag | Payload |
//! |---|---|---|
//! | current | `0xcb1d` | `[registryEntryId, document]` |
//! | legacy-range | `0x0600 + first varint byte` | `document`, or `[rest bytes, document]` for ids >= 128 |
//! | legacy-singleton | `0x0500` (uncompressed) / `0x0501` (compressed) | `document` |

use ciborium::value::Value as CborValue;
use tracing::debug;

use crate::codec::cbor::{as_u64, from_bytes};
use crate::codec::primitives::{decode_exact_varint, encode_varint};
use crate::error::Error;
use crate::limits::{
    CBORLD_TAG, LEGACY_RANGE_END, LEGACY_RANGE_INLINE_MAX, LEGACY_RANGE_START,
    LEGACY_SINGLETON_COMPRESSED, LEGACY_SINGLETON_REGISTRY_ENTRY_ID, LEGACY_SINGLETON_UNCOMPRESSED,
    MAX_REGISTRY_VARINT_BYTES, UNCOMPRESSED_REGISTRY_ENTRY_ID,
};

/// Wire format variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Current,
    LegacyRange,
    LegacySingleton,
}

/// Parsed CBOR-LD header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub format: Format,
    /// Absent for the legacy-singleton format.
    pub registry_entry_id: Option<u64>,
    pub payload_compressed: bool,
}

impl Header {
    /// Builds the header for encoding `registry_entry_id` in `format`.
    ///
    /// The legacy-singleton format can only say "compressed" (id 1) or
    /// "uncompressed" (id 0).
    pub fn new(format: Format, registry_entry_id: u64) -> Result<Self, Error> {
        let payload_compressed = registry_entry_id != UNCOMPRESSED_REGISTRY_ENTRY_ID;
        match format {
            Format::Current | Format::LegacyRange => Ok(Self {
                format,
                registry_entry_id: Some(registry_entry_id),
                payload_compressed,
            }),
            Format::LegacySingleton if registry_entry_id <= LEGACY_SINGLETON_REGISTRY_ENTRY_ID => Ok(Self {
                format,
                registry_entry_id: None,
                payload_compressed,
            }),
            Format::LegacySingleton => Err(Error::InvalidArgument(
                "legacy-singleton format only supports registry entry ids 0 and 1",
            )),
        }
    }

    /// Returns true for both legacy formats.
    pub fn is_legacy(&self) -> bool {
        self.format != Format::Current
    }

    /// Registry entry id used to select a type table.
    pub fn type_table_id(&self) -> u64 {
        self.registry_entry_id.unwrap_or(LEGACY_SINGLETON_REGISTRY_ENTRY_ID)
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Wraps a payload in the tag and wrapper for `header`.
pub fn frame(header: &Header, payload: CborValue) -> CborValue {
    debug!(format = ?header.format, registry_entry_id = ?header.registry_entry_id, "framing payload");
    match header.format {
        Format::Current => {
            let id = header.registry_entry_id.unwrap_or(UNCOMPRESSED_REGISTRY_ENTRY_ID);
            CborValue::Tag(
                CBORLD_TAG,
                Box::new(CborValue::Array(vec![CborValue::Integer(id.into()), payload])),
            )
        }
        Format::LegacyRange => {
            let id = header.registry_entry_id.unwrap_or(UNCOMPRESSED_REGISTRY_ENTRY_ID);
            if id < LEGACY_RANGE_INLINE_MAX {
                return CborValue::Tag(LEGACY_RANGE_START + id, Box::new(payload));
            }
            let varint = encode_varint(id);
            let (first, rest) = varint.split_at(1);
            CborValue::Tag(
                LEGACY_RANGE_START + first[0] as u64,
                Box::new(CborValue::Array(vec![CborValue::Bytes(rest.to_vec()), payload])),
            )
        }
        Format::LegacySingleton => {
            let tag = if header.payload_compressed {
                LEGACY_SINGLETON_COMPRESSED
            } else {
                LEGACY_SINGLETON_UNCOMPRESSED
            };
            CborValue::Tag(tag, Box::new(payload))
        }
    }
}

// =============================================================================
// DECODING
// =============================================================================

/// Splits a tagged CBOR-LD value into its header and payload.
pub fn unframe(value: CborValue) -> Result<(Header, CborValue), Error> {
    let CborValue::Tag(tag, payload) = value else {
        return Err(Error::Untagged);
    };
    let (header, payload) = match tag {
        CBORLD_TAG => unframe_current(*payload)?,
        LEGACY_RANGE_START..LEGACY_RANGE_END => unframe_legacy_range(tag - LEGACY_RANGE_START, *payload)?,
        LEGACY_SINGLETON_UNCOMPRESSED | LEGACY_SINGLETON_COMPRESSED => (
            Header {
                format: Format::LegacySingleton,
                registry_entry_id: None,
                payload_compressed: tag == LEGACY_SINGLETON_COMPRESSED,
            },
            *payload,
        ),
        _ => return Err(Error::UnknownTag { tag }),
    };
    debug!(
        format = ?header.format,
        registry_entry_id = ?header.registry_entry_id,
        compressed = header.payload_compressed,
        "parsed header"
    );
    Ok((header, payload))
}

fn unframe_current(payload: CborValue) -> Result<(Header, CborValue), Error> {
    let CborValue::Array(items) = payload else {
        return Err(Error::MalformedHeader { context: "current-format wrapper" });
    };
    let [id, document]: [CborValue; 2] = items
        .try_into()
        .map_err(|_| Error::MalformedHeader { context: "current-format wrapper" })?;
    let id = as_u64(&id).ok_or(Error::MalformedHeader { context: "registry entry id" })?;
    let header = Header {
        format: Format::Current,
        registry_entry_id: Some(id),
        payload_compressed: id != UNCOMPRESSED_REGISTRY_ENTRY_ID,
    };
    Ok((header, document))
}

fn unframe_legacy_range(offset: u64, payload: CborValue) -> Result<(Header, CborValue), Error> {
    let (id, document) = if offset < LEGACY_RANGE_INLINE_MAX {
        (offset, payload)
    } else {
        let CborValue::Array(items) = payload else {
            return Err(Error::MalformedHeader { context: "legacy-range wrapper" });
        };
        let [rest, document]: [CborValue; 2] = items
            .try_into()
            .map_err(|_| Error::MalformedHeader { context: "legacy-range wrapper" })?;
        let CborValue::Bytes(rest) = rest else {
            return Err(Error::MalformedHeader { context: "legacy-range varint bytes" });
        };
        let len = rest.len() + 1;
        if len > MAX_REGISTRY_VARINT_BYTES {
            return Err(Error::VarintTooLong {
                len,
                max: MAX_REGISTRY_VARINT_BYTES,
            });
        }
        let mut varint = Vec::with_capacity(len);
        varint.push(offset as u8);
        varint.extend_from_slice(&rest);
        (decode_exact_varint(&varint)?, document)
    };
    let header = Header {
        format: Format::LegacyRange,
        registry_entry_id: Some(id),
        payload_compressed: id != UNCOMPRESSED_REGISTRY_ENTRY_ID,
    };
    Ok((header, document))
}

/// Parses only the header of an encoded CBOR-LD document.
pub fn inspect(bytes: &[u8]) -> Result<Header, Error> {
    unframe(from_bytes(bytes)?).map(|(header, _)| header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::cbor::to_bytes;

    fn empty() -> CborValue {
        CborValue::Map(vec![])
    }

    fn roundtrip(format: Format, id: u64) -> Header {
        let header = Header::new(format, id).unwrap();
        let (parsed, payload) = unframe(frame(&header, empty())).unwrap();
        assert_eq!(payload, empty());
        assert_eq!(parsed, header);
        parsed
    }

    #[test]
    fn test_current_bytes() {
        let header = Header::new(Format::Current, 1).unwrap();
        let bytes = to_bytes(&frame(&header, empty())).unwrap();
        assert_eq!(bytes, vec![0xd9, 0xcb, 0x1d, 0x82, 0x01, 0xa0]);
    }

    #[test]
    fn test_legacy_range_bytes() {
        let header = Header::new(Format::LegacyRange, 1).unwrap();
        assert_eq!(to_bytes(&frame(&header, empty())).unwrap(), vec![0xd9, 0x06, 0x01, 0xa0]);

        let header = Header::new(Format::LegacyRange, 0).unwrap();
        assert!(!header.payload_compressed);
        assert_eq!(to_bytes(&frame(&header, empty())).unwrap(), vec![0xd9, 0x06, 0x00, 0xa0]);

        // 128 = varint 0x80 0x01
        let header = Header::new(Format::LegacyRange, 128).unwrap();
        assert_eq!(
            to_bytes(&frame(&header, empty())).unwrap(),
            vec![0xd9, 0x06, 0x80, 0x82, 0x41, 0x01, 0xa0]
        );
    }

    #[test]
    fn test_legacy_singleton() {
        let header = roundtrip(Format::LegacySingleton, 1);
        assert!(header.payload_compressed);
        assert_eq!(header.type_table_id(), 1);
        let header = roundtrip(Format::LegacySingleton, 0);
        assert!(!header.payload_compressed);
        assert!(Header::new(Format::LegacySingleton, 2).is_err());
    }

    #[test]
    fn test_roundtrips() {
        for id in [0u64, 1, 127, 128, 300, 1 << 20, u64::MAX] {
            roundtrip(Format::Current, id);
            roundtrip(Format::LegacyRange, id);
        }
    }

    #[test]
    fn test_unknown_tag() {
        let err = unframe(CborValue::Tag(0x0700, Box::new(empty()))).unwrap_err();
        assert_eq!(err, Error::UnknownTag { tag: 0x0700 });
        assert_eq!(unframe(empty()).unwrap_err(), Error::Untagged);
    }

    #[test]
    fn test_malformed_wrappers() {
        let bad_current = CborValue::Tag(CBORLD_TAG, Box::new(CborValue::Array(vec![empty()])));
        assert!(matches!(unframe(bad_current), Err(Error::MalformedHeader { .. })));

        let bad_range = CborValue::Tag(LEGACY_RANGE_START + 0x80, Box::new(empty()));
        assert!(matches!(unframe(bad_range), Err(Error::MalformedHeader { .. })));
    }

    #[test]
    fn test_oversized_varint() {
        let payload = CborValue::Array(vec![CborValue::Bytes(vec![0x80; 23]), empty()]);
        let err = unframe(CborValue::Tag(LEGACY_RANGE_START + 0x80, Box::new(payload))).unwrap_err();
        assert_eq!(err, Error::VarintTooLong { len: 24, max: 23 });
    }

    #[test]
    fn test_trailing_varint_bytes() {
        // 0x80 0x01 is complete; the extra 0x00 must not be ignored.
        let payload = CborValue::Array(vec![CborValue::Bytes(vec![0x01, 0x00]), empty()]);
        let err = unframe(CborValue::Tag(LEGACY_RANGE_START + 0x80, Box::new(payload))).unwrap_err();
        assert_eq!(err, Error::MalformedVarint);
        assert_eq!(err.code().as_str(), "ERR_NOT_CBORLD");
    }

    #[test]
    fn test_inspect() {
        let header = inspect(&[0xd9, 0xcb, 0x1d, 0x82, 0x00, 0xa0]).unwrap();
        assert_eq!(header.format, Format::Current);
        assert_eq!(header.registry_entry_id, Some(0));
        assert!(!header.payload_compressed);
    }
}
