//! URL compaction.
//!
//! URLs missing from the `url` table are shortened by scheme:
//!
//! | Scheme | Wire form |
//! |---|---|
//! | `http://rest` | `[1, "rest"]` |
//! | `https://rest` | `[2, "rest"]` |
//! | `urn:uuid:<lowercase uuid>` | `[3, h'16 bytes']` |
//! | `urn:uuid:<other>` | `[3, "other"]` |
//! | `did:v1:nym:z<base58>` | `[1024, h'bytes']` |
//! | `did:key:z<base58>[#z<base58>]` | `[1025, h'bytes'(, h'fragment')]` |

use ciborium::value::Value as CborValue;
use uuid::Uuid;

use crate::codec::cbor::as_u64;
use crate::error::Error;
use crate::registry::TermRegistry;
use crate::type_table::{URL_TABLE, ValueTable};

const HTTP: u64 = 1;
const HTTPS: u64 = 2;
const URN_UUID: u64 = 3;
const DID_V1_NYM: u64 = 1024;
const DID_KEY: u64 = 1025;

const HTTP_PREFIX: &str = "http://";
const HTTPS_PREFIX: &str = "https://";
const URN_UUID_PREFIX: &str = "urn:uuid:";
const DID_V1_NYM_PREFIX: &str = "did:v1:nym:";
const DID_KEY_PREFIX: &str = "did:key:";

/// Encodes a URL-valued string. At vocabulary positions a registered term
/// is written as its term code, unless that code is also a `url` table code.
pub fn encode(value: &str, vocab: bool, table: &ValueTable, registry: &TermRegistry) -> CborValue {
    if let Some(code) = table.code(value) {
        return table.encode_code(code);
    }
    if vocab {
        if let Some(id) = registry.get_id(value) {
            if table.value(id).is_none() {
                return CborValue::Integer(id.into());
            }
        }
    }
    compact(value).unwrap_or_else(|| CborValue::Text(value.to_string()))
}

/// Decodes a URL-valued wire value. Integers resolve through the `url`
/// table, then through the term registry at vocabulary positions or in
/// legacy payloads.
pub fn decode(
    value: &CborValue,
    vocab: bool,
    legacy: bool,
    table: &ValueTable,
    registry: &TermRegistry,
) -> Result<Option<String>, Error> {
    match value {
        CborValue::Text(s) => Ok(Some(s.clone())),
        CborValue::Integer(_) | CborValue::Bytes(_) => {
            let table_code = table.read_code(value)?;
            if let Some(url) = table_code.and_then(|code| table.value(code)) {
                return Ok(Some(url.to_string()));
            }
            let Some(code) = as_u64(value).or(table_code) else {
                return Ok(None);
            };
            if vocab || legacy {
                if let Some(term) = as_u64(value).and_then(|id| registry.lookup(id)) {
                    return Ok(Some(term.to_string()));
                }
            }
            Err(Error::UnknownCompressedValue {
                table: URL_TABLE.to_string(),
                code,
            })
        }
        CborValue::Array(items) => expand(items),
        _ => Ok(None),
    }
}

fn compact(value: &str) -> Option<CborValue> {
    let (scheme, rest) = if let Some(rest) = value.strip_prefix(HTTPS_PREFIX) {
        (HTTPS, CborValue::Text(rest.to_string()))
    } else if let Some(rest) = value.strip_prefix(HTTP_PREFIX) {
        (HTTP, CborValue::Text(rest.to_string()))
    } else if let Some(rest) = value.strip_prefix(URN_UUID_PREFIX) {
        (URN_UUID, compact_uuid(rest))
    } else if let Some(rest) = value.strip_prefix(DID_V1_NYM_PREFIX) {
        (DID_V1_NYM, CborValue::Bytes(base58_multibase_bytes(rest)?))
    } else if let Some(rest) = value.strip_prefix(DID_KEY_PREFIX) {
        return compact_did_key(rest);
    } else {
        return None;
    };
    Some(CborValue::Array(vec![CborValue::Integer(scheme.into()), rest]))
}

fn compact_uuid(rest: &str) -> CborValue {
    match Uuid::parse_str(rest) {
        Ok(uuid) if uuid.hyphenated().to_string() == rest => CborValue::Bytes(uuid.as_bytes().to_vec()),
        _ => CborValue::Text(rest.to_string()),
    }
}

fn compact_did_key(rest: &str) -> Option<CborValue> {
    let mut items = vec![CborValue::Integer(DID_KEY.into())];
    match rest.split_once('#') {
        Some((key, fragment)) => {
            items.push(CborValue::Bytes(base58_multibase_bytes(key)?));
            items.push(CborValue::Bytes(base58_multibase_bytes(fragment)?));
        }
        None => items.push(CborValue::Bytes(base58_multibase_bytes(rest)?)),
    }
    Some(CborValue::Array(items))
}

/// Bytes of a `z`-prefixed base58btc string that re-encodes exactly.
fn base58_multibase_bytes(value: &str) -> Option<Vec<u8>> {
    let body = value.strip_prefix('z')?;
    let bytes = bs58::decode(body).into_vec().ok()?;
    (bs58::encode(&bytes).into_string() == body).then_some(bytes)
}

fn base58_multibase_string(bytes: &[u8]) -> String {
    format!("z{}", bs58::encode(bytes).into_string())
}

fn expand(items: &[CborValue]) -> Result<Option<String>, Error> {
    let Some((first, rest)) = items.split_first() else {
        return Ok(None);
    };
    let Some(scheme) = as_u64(first) else {
        return Ok(None);
    };
    let malformed = || Error::InvalidEncodedValue(format!("malformed compressed URL with scheme {scheme}"));
    let url = match (scheme, rest) {
        (HTTP, [CborValue::Text(s)]) => format!("{HTTP_PREFIX}{s}"),
        (HTTPS, [CborValue::Text(s)]) => format!("{HTTPS_PREFIX}{s}"),
        (URN_UUID, [CborValue::Text(s)]) => format!("{URN_UUID_PREFIX}{s}"),
        (URN_UUID, [CborValue::Bytes(b)]) => {
            let uuid = Uuid::from_slice(b).map_err(|_| malformed())?;
            format!("{URN_UUID_PREFIX}{}", uuid.hyphenated())
        }
        (DID_V1_NYM, [CborValue::Bytes(b)]) => format!("{DID_V1_NYM_PREFIX}{}", base58_multibase_string(b)),
        (DID_KEY, [CborValue::Bytes(key)]) => format!("{DID_KEY_PREFIX}{}", base58_multibase_string(key)),
        (DID_KEY, [CborValue::Bytes(key), CborValue::Bytes(fragment)]) => format!(
            "{DID_KEY_PREFIX}{}#{}",
            base58_multibase_string(key),
            base58_multibase_string(fragment)
        ),
        (HTTP | HTTPS | URN_UUID | DID_V1_NYM | DID_KEY, _) => return Err(malformed()),
        (code, _) => {
            return Err(Error::UnknownCompressedValue {
                table: URL_TABLE.to_string(),
                code,
            });
        }
    };
    Ok(Some(url))
}
