//! CBOR-LD to JSON-LD.

use ciborium::value::Value as CborValue;
use serde_json::{Map, Value as JsonValue};

use crate::codec::cbor::as_u64;
use crate::codec::strategy::{Entry, Strategy, sort_entries};
use crate::codec::values::{CodecContext, ValueType};
use crate::error::Error;
use crate::registry::{CONTEXT_TERM_ID, CONTEXT_TERM_ID_PLURAL, TermKey, TermRegistry};

const CONTEXT_KEY: &str = "@context";

/// Resolves term codes back to terms and table codes back to values.
#[derive(Debug, Default, Clone, Copy)]
pub struct Decompressor;

/// Returns true if `key` is the wire key for `term` in the given plurality.
fn key_matches(key: &CborValue, term_key: TermKey<'_>) -> bool {
    match (key, term_key) {
        (CborValue::Integer(_), TermKey::Id(id)) => as_u64(key) == Some(id),
        (CborValue::Text(s), TermKey::Term(term)) => s == term,
        _ => false,
    }
}

fn is_context_key(key: &CborValue) -> Option<bool> {
    match key {
        CborValue::Integer(_) => match as_u64(key) {
            Some(CONTEXT_TERM_ID) => Some(false),
            Some(CONTEXT_TERM_ID_PLURAL) => Some(true),
            _ => None,
        },
        CborValue::Text(s) if s == CONTEXT_KEY => Some(false),
        _ => None,
    }
}

impl Strategy for Decompressor {
    type Input = CborValue;
    type Output = JsonValue;
    type Node = [(CborValue, CborValue)];
    type Container = Map<String, JsonValue>;
    type Key = String;

    fn as_node<'v>(&self, value: &'v CborValue) -> Option<&'v Self::Node> {
        match value {
            CborValue::Map(entries) => Some(entries.as_slice()),
            _ => None,
        }
    }

    fn as_list<'v>(&self, value: &'v CborValue) -> Option<&'v [CborValue]> {
        match value {
            CborValue::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    fn is_null(&self, value: &CborValue) -> bool {
        value.is_null()
    }

    fn null_output(&self) -> JsonValue {
        JsonValue::Null
    }

    fn create_container(&self) -> Self::Container {
        Map::new()
    }

    fn convert_contexts(
        &self,
        node: &Self::Node,
        codec: &CodecContext<'_>,
        registry: &TermRegistry,
        out: &mut Self::Container,
    ) -> Result<Option<JsonValue>, Error> {
        let Some((plural, value)) = node
            .iter()
            .find_map(|(key, value)| is_context_key(key).map(|plural| (plural, value)))
        else {
            return Ok(None);
        };
        let decoded = match (plural, value) {
            (true, CborValue::Array(items)) => JsonValue::Array(
                items
                    .iter()
                    .map(|item| decode_context(codec, item, registry))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            (true, _) => {
                return Err(Error::InvalidEncodedValue(
                    "plural @context value is not an array".to_string(),
                ));
            }
            (false, single) => decode_context(codec, single, registry)?,
        };
        out.insert(CONTEXT_KEY.to_string(), decoded.clone());
        Ok(Some(decoded))
    }

    fn object_types(
        &self,
        node: &Self::Node,
        type_terms: &[String],
        codec: &CodecContext<'_>,
        registry: &TermRegistry,
    ) -> Result<Vec<String>, Error> {
        let vocab = ValueType::Url { vocab: true };
        let mut types = Vec::new();
        for term in type_terms {
            for (key, value) in node {
                let values: Vec<&CborValue> = if key_matches(key, registry.id_for(term, false)) {
                    vec![value]
                } else if key_matches(key, registry.id_for(term, true)) {
                    match value {
                        CborValue::Array(items) => items.iter().collect(),
                        _ => continue,
                    }
                } else {
                    continue;
                };
                for value in values {
                    if let Some(JsonValue::String(t)) = codec.decode_value(value, &vocab, registry)? {
                        types.push(t);
                    }
                }
            }
        }
        Ok(types)
    }

    fn locate_entries<'v>(
        &self,
        node: &'v Self::Node,
        registry: &TermRegistry,
    ) -> Result<Vec<Entry<'v, CborValue, String>>, Error> {
        let mut entries = Vec::with_capacity(node.len());
        for (key, value) in node {
            if is_context_key(key).is_some() {
                continue;
            }
            let (term, plural) = match key {
                CborValue::Integer(_) => {
                    let id = as_u64(key).ok_or_else(|| {
                        Error::InvalidEncodedValue("negative term id".to_string())
                    })?;
                    let info = registry.term_for(id)?;
                    (info.term, info.plural)
                }
                CborValue::Text(term) => (term.clone(), value.is_array()),
                _ => {
                    return Err(Error::InvalidEncodedValue(
                        "map key is neither a term id nor a term".to_string(),
                    ));
                }
            };
            let values = match (plural, value) {
                (true, CborValue::Array(items)) => items.iter().collect(),
                (true, _) => {
                    return Err(Error::InvalidEncodedValue(format!(
                        "plural term {term:?} does not hold an array"
                    )));
                }
                (false, single) => vec![single],
            };
            entries.push(Entry {
                key: term.clone(),
                term,
                plural,
                values,
            });
        }
        sort_entries(&mut entries);
        Ok(entries)
    }

    fn try_code_value(
        &self,
        value: &CborValue,
        value_type: &ValueType,
        codec: &CodecContext<'_>,
        registry: &TermRegistry,
    ) -> Result<Option<JsonValue>, Error> {
        codec.decode_value(value, value_type, registry)
    }

    fn assign_entry(&self, out: &mut Self::Container, key: String, plural: bool, values: Vec<JsonValue>) {
        let value = if plural {
            JsonValue::Array(values)
        } else {
            values.into_iter().next().unwrap_or(JsonValue::Null)
        };
        out.insert(key, value);
    }

    fn list_output(&self, items: Vec<JsonValue>) -> JsonValue {
        JsonValue::Array(items)
    }

    fn node_output(&self, container: Self::Container) -> JsonValue {
        JsonValue::Object(container)
    }

    fn invalid_root(&self, reason: &'static str) -> Error {
        Error::InvalidEncodedValue(reason.to_string())
    }

    fn invalid_value(&self, reason: &'static str) -> Error {
        Error::InvalidEncodedValue(reason.to_string())
    }
}

fn decode_context(codec: &CodecContext<'_>, value: &CborValue, registry: &TermRegistry) -> Result<JsonValue, Error> {
    Ok(codec
        .decode_value(value, &ValueType::Context, registry)?
        .unwrap_or(JsonValue::Null))
}
