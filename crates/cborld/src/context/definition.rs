//! Term definitions, as written in a context and as resolved into an
//! active context.

use std::rc::Rc;

use serde_json::{Map, Value as JsonValue};

use crate::error::Error;

/// A term definition whose IRIs have been fully expanded.
#[derive(Debug, Clone, PartialEq)]
pub struct TermDefinition {
    /// Expanded IRI, or a keyword when the term is a keyword alias.
    pub id: String,
    /// Expanded type IRI, or one of `@id`, `@vocab`, `@json`.
    pub type_: Option<String>,
    pub protected: bool,
    /// Unset until the definition is merged into an active context.
    pub propagate: Option<bool>,
    /// Scoped context to apply to values of this term (or to nodes of this
    /// type, when the term names a type).
    pub context: Option<Rc<JsonValue>>,
}

impl TermDefinition {
    /// Returns true if this definition stays active in descendant nodes.
    pub fn propagates(&self) -> bool {
        self.propagate.unwrap_or(true)
    }

    /// Structural equality ignoring the `protected` and `propagate` flags.
    pub fn same_definition(&self, other: &TermDefinition) -> bool {
        self.id == other.id && self.type_ == other.type_ && self.context == other.context
    }
}

/// A term definition as written in a context, before IRI expansion.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalDefinition {
    pub id: Option<String>,
    pub type_: Option<String>,
    pub protected: Option<bool>,
    pub context: Option<Rc<JsonValue>>,
}

impl LocalDefinition {
    /// Parses one entry of a context object. `Ok(None)` is an explicit null.
    pub fn parse(term: &str, value: &JsonValue) -> Result<Option<Self>, Error> {
        match value {
            JsonValue::Null => Ok(None),
            JsonValue::String(id) => Ok(Some(Self {
                id: Some(id.clone()),
                type_: None,
                protected: None,
                context: None,
            })),
            JsonValue::Object(map) => Self::parse_expanded(term, map),
            _ => Err(Error::invalid_term(term, "definition must be a string, object or null")),
        }
    }

    fn parse_expanded(term: &str, map: &Map<String, JsonValue>) -> Result<Option<Self>, Error> {
        let id = match map.get("@id") {
            None => None,
            Some(JsonValue::Null) => return Ok(None),
            Some(JsonValue::String(id)) => Some(id.clone()),
            Some(_) => return Err(Error::invalid_term(term, "@id must be a string")),
        };
        let type_ = match map.get("@type") {
            None => None,
            Some(JsonValue::String(t)) => Some(t.clone()),
            Some(_) => return Err(Error::invalid_term(term, "@type must be a string")),
        };
        let protected = match map.get("@protected") {
            None => None,
            Some(JsonValue::Bool(b)) => Some(*b),
            Some(_) => return Err(Error::invalid_term(term, "@protected must be a boolean")),
        };
        let context = map.get("@context").map(|c| Rc::new(c.clone()));
        Ok(Some(Self {
            id,
            type_,
            protected,
            context,
        }))
    }
}

/// A parsed context object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadedContext {
    /// Term entries sorted by term; `None` marks an explicit null.
    pub terms: Vec<(String, Option<LocalDefinition>)>,
    /// `Some(None)` when the context sets `@vocab: null`.
    pub vocab: Option<Option<String>>,
    pub protected: bool,
    pub propagate: Option<bool>,
}

impl LoadedContext {
    /// Parses a context object. Keyword keys other than the context-level
    /// settings are ignored.
    pub fn parse(map: &Map<String, JsonValue>) -> Result<Self, Error> {
        let mut ctx = LoadedContext::default();
        for (key, value) in map {
            match key.as_str() {
                "@vocab" => {
                    ctx.vocab = match value {
                        JsonValue::Null => Some(None),
                        JsonValue::String(v) => Some(Some(v.clone())),
                        _ => return Err(Error::invalid_context("@vocab must be a string or null")),
                    }
                }
                "@protected" => {
                    ctx.protected = value
                        .as_bool()
                        .ok_or_else(|| Error::invalid_context("@protected must be a boolean"))?
                }
                "@propagate" => {
                    ctx.propagate = Some(
                        value
                            .as_bool()
                            .ok_or_else(|| Error::invalid_context("@propagate must be a boolean"))?,
                    )
                }
                _ if key.starts_with('@') => {}
                _ => ctx.terms.push((key.clone(), LocalDefinition::parse(key, value)?)),
            }
        }
        ctx.terms.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(ctx)
    }

    /// Returns the local entry for a term: `Some(None)` for an explicit null.
    pub fn definition(&self, term: &str) -> Option<Option<&LocalDefinition>> {
        self.terms
            .binary_search_by(|(t, _)| t.as_str().cmp(term))
            .ok()
            .map(|i| self.terms[i].1.as_ref())
    }

    /// Terms to register, in registration order.
    pub fn registered_terms(&self) -> impl Iterator<Item = &str> {
        self.terms
            .iter()
            .filter(|(_, def)| def.is_some())
            .map(|(t, _)| t.as_str())
    }

    /// Nested scoped contexts, in term order.
    pub fn scoped_contexts(&self) -> impl Iterator<Item = &Rc<JsonValue>> {
        self.terms
            .iter()
            .filter_map(|(_, def)| def.as_ref().and_then(|d| d.context.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: JsonValue) -> LoadedContext {
        match value {
            JsonValue::Object(map) => LoadedContext::parse(&map).unwrap(),
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_terms_sorted() {
        let ctx = parse(json!({"zeta": "ex:z", "alpha": "ex:a", "@version": 1.1}));
        let terms: Vec<_> = ctx.registered_terms().collect();
        assert_eq!(terms, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_null_definition() {
        let ctx = parse(json!({"a": null, "b": {"@id": null}, "c": "ex:c"}));
        assert_eq!(ctx.definition("a"), Some(None));
        assert_eq!(ctx.definition("b"), Some(None));
        assert!(ctx.definition("c").unwrap().is_some());
        assert_eq!(ctx.definition("d"), None);
        assert_eq!(ctx.registered_terms().collect::<Vec<_>>(), vec!["c"]);
    }

    #[test]
    fn test_context_flags() {
        let ctx = parse(json!({"@protected": true, "@propagate": false, "@vocab": null}));
        assert!(ctx.protected);
        assert_eq!(ctx.propagate, Some(false));
        assert_eq!(ctx.vocab, Some(None));
    }

    #[test]
    fn test_expanded_definition() {
        let ctx = parse(json!({
            "Thing": {"@id": "ex:Thing", "@protected": true, "@context": {"x": "ex:x"}}
        }));
        let def = ctx.definition("Thing").unwrap().unwrap();
        assert_eq!(def.id.as_deref(), Some("ex:Thing"));
        assert_eq!(def.protected, Some(true));
        assert_eq!(ctx.scoped_contexts().count(), 1);
    }

    #[test]
    fn test_invalid_definition() {
        let map = json!({"a": 5});
        let err = LoadedContext::parse(map.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, Error::InvalidTermDefinition { .. }));
    }

    #[test]
    fn test_same_definition_ignores_flags() {
        let a = TermDefinition {
            id: "ex:a".into(),
            type_: None,
            protected: true,
            propagate: Some(false),
            context: None,
        };
        let mut b = a.clone();
        b.protected = false;
        b.propagate = Some(true);
        assert!(a.same_definition(&b));
        b.type_ = Some("@id".into());
        assert!(!a.same_definition(&b));
    }
}
