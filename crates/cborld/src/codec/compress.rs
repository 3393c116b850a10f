//! JSON-LD to CBOR-LD.

use ciborium::value::Value as CborValue;
use serde_json::{Map, Value as JsonValue};

use crate::codec::strategy::{Entry, Strategy, sort_entries};
use crate::codec::values::{CodecContext, ValueType};
use crate::error::Error;
use crate::registry::{TermKey, TermRegistry};

const CONTEXT_KEY: &str = "@context";

/// Writes term codes for keys and table codes for values.
#[derive(Debug, Default, Clone, Copy)]
pub struct Compressor;

fn entry_key(key: TermKey<'_>) -> CborValue {
    match key {
        TermKey::Id(id) => CborValue::Integer(id.into()),
        TermKey::Term(term) => CborValue::Text(term.to_string()),
    }
}

impl Strategy for Compressor {
    type Input = JsonValue;
    type Output = CborValue;
    type Node = Map<String, JsonValue>;
    type Container = Vec<(CborValue, CborValue)>;
    type Key = CborValue;

    fn as_node<'v>(&self, value: &'v JsonValue) -> Option<&'v Self::Node> {
        value.as_object()
    }

    fn as_list<'v>(&self, value: &'v JsonValue) -> Option<&'v [JsonValue]> {
        value.as_array().map(Vec::as_slice)
    }

    fn is_null(&self, value: &JsonValue) -> bool {
        value.is_null()
    }

    fn null_output(&self) -> CborValue {
        CborValue::Null
    }

    fn create_container(&self) -> Self::Container {
        Vec::new()
    }

    fn convert_contexts(
        &self,
        node: &Self::Node,
        codec: &CodecContext<'_>,
        registry: &TermRegistry,
        out: &mut Self::Container,
    ) -> Result<Option<JsonValue>, Error> {
        let Some(context) = node.get(CONTEXT_KEY) else {
            return Ok(None);
        };
        let (plural, encoded) = match context {
            JsonValue::Array(items) => {
                let encoded = items
                    .iter()
                    .map(|item| codec.encode_context(item))
                    .collect::<Result<Vec<_>, _>>()?;
                (true, CborValue::Array(encoded))
            }
            single => (false, codec.encode_context(single)?),
        };
        out.push((entry_key(registry.id_for(CONTEXT_KEY, plural)), encoded));
        Ok(Some(context.clone()))
    }

    fn object_types(
        &self,
        node: &Self::Node,
        type_terms: &[String],
        _codec: &CodecContext<'_>,
        _registry: &TermRegistry,
    ) -> Result<Vec<String>, Error> {
        let mut types = Vec::new();
        for term in type_terms {
            match node.get(term) {
                Some(JsonValue::String(t)) => types.push(t.clone()),
                Some(JsonValue::Array(items)) => {
                    types.extend(items.iter().filter_map(JsonValue::as_str).map(str::to_string));
                }
                _ => {}
            }
        }
        Ok(types)
    }

    fn locate_entries<'v>(
        &self,
        node: &'v Self::Node,
        registry: &TermRegistry,
    ) -> Result<Vec<Entry<'v, JsonValue, CborValue>>, Error> {
        let mut entries: Vec<_> = node
            .iter()
            .filter(|(key, _)| key.as_str() != CONTEXT_KEY)
            .map(|(term, value)| {
                let (plural, values) = match value {
                    JsonValue::Array(items) => (true, items.iter().collect()),
                    single => (false, vec![single]),
                };
                Entry {
                    term: term.clone(),
                    key: entry_key(registry.id_for(term, plural)),
                    plural,
                    values,
                }
            })
            .collect();
        sort_entries(&mut entries);
        Ok(entries)
    }

    fn try_code_value(
        &self,
        value: &JsonValue,
        value_type: &ValueType,
        codec: &CodecContext<'_>,
        registry: &TermRegistry,
    ) -> Result<Option<CborValue>, Error> {
        codec.encode_value(value, value_type, registry)
    }

    fn assign_entry(&self, out: &mut Self::Container, key: CborValue, plural: bool, values: Vec<CborValue>) {
        let value = if plural {
            CborValue::Array(values)
        } else {
            values.into_iter().next().unwrap_or(CborValue::Null)
        };
        out.push((key, value));
    }

    fn list_output(&self, items: Vec<CborValue>) -> CborValue {
        CborValue::Array(items)
    }

    fn node_output(&self, container: Self::Container) -> CborValue {
        CborValue::Map(container)
    }

    fn invalid_root(&self, reason: &'static str) -> Error {
        Error::InvalidArgument(reason)
    }

    fn invalid_value(&self, reason: &'static str) -> Error {
        Error::InvalidEncodedValue(reason.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_table::TypeTable;
    use serde_json::json;

    #[test]
    fn test_entries_sorted_without_context() {
        let doc = json!({"b": 1, "@context": "urn:x", "a": [1, 2], "@id": "urn:y"});
        let node = doc.as_object().unwrap();
        let entries = Compressor.locate_entries(node, &TermRegistry::new()).unwrap();
        let terms: Vec<_> = entries.iter().map(|e| (e.term.as_str(), e.plural, e.values.len())).collect();
        assert_eq!(terms, vec![("@id", false, 1), ("a", true, 2), ("b", false, 1)]);
    }

    #[test]
    fn test_context_key() {
        let table = TypeTable::new();
        let codec = CodecContext::new(&table, false);
        let registry = TermRegistry::new();

        let doc = json!({"@context": ["urn:a", {"x": "ex:x"}]});
        let mut out = Vec::new();
        let context = Compressor
            .convert_contexts(doc.as_object().unwrap(), &codec, &registry, &mut out)
            .unwrap();
        assert_eq!(context, Some(json!(["urn:a", {"x": "ex:x"}])));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].0, CborValue::Integer(1.into()));
    }

    #[test]
    fn test_error_classes() {
        assert!(Compressor.invalid_root("root").is_config_error());
        assert!(!Compressor.invalid_value("value").is_config_error());
    }

    #[test]
    fn test_keys_resolved_when_located() {
        let mut registry = TermRegistry::new();
        let doc = json!({"unknown": true, "@id": "urn:x", "later": [1]});
        let entries = Compressor.locate_entries(doc.as_object().unwrap(), &registry).unwrap();

        // Registering afterwards does not change keys already located.
        assert_eq!(registry.register("later"), 100);
        let keys: Vec<_> = entries.iter().map(|e| e.key.clone()).collect();
        assert!(matches!(keys[0], CborValue::Integer(_)));
        assert_eq!(keys[1], CborValue::Text("later".into()));
        assert_eq!(keys[2], CborValue::Text("unknown".into()));

        let mut out = Vec::new();
        Compressor.assign_entry(&mut out, keys[1].clone(), true, vec![CborValue::Integer(1.into())]);
        assert_eq!(out, vec![(CborValue::Text("later".into()), CborValue::Array(vec![CborValue::Integer(1.into())]))]);
    }
}
