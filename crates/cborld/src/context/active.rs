//! Active contexts: immutable snapshots of the term definitions in force at
//! one position of a document.
//!
//! Every scoping operation returns a new snapshot whose `parent` is the one
//! it was derived from. The parent chain is only walked to revert terms that
//! do not propagate when entering a property-scoped value.

use std::rc::Rc;

use rustc_hash::FxHashMap;
use serde_json::Value as JsonValue;
use tracing::trace;

use crate::context::definition::{LoadedContext, LocalDefinition, TermDefinition};
use crate::context::loader::{ContextLoader, ResolvedContext};
use crate::error::Error;
use crate::limits::MAX_CONTEXT_DEPTH;

type TermMap = FxHashMap<String, Rc<TermDefinition>>;

/// The term definitions in force at one document position.
#[derive(Debug, Clone, Default)]
pub struct ActiveContext {
    terms: TermMap,
    vocab: Option<String>,
    parent: Option<Rc<ActiveContext>>,
}

/// How a merged context treats the terms it defines.
#[derive(Debug, Clone, Copy)]
struct MergeMode {
    default_propagate: bool,
    allow_protected_override: bool,
}

const EMBEDDED: MergeMode = MergeMode {
    default_propagate: true,
    allow_protected_override: false,
};

const TYPE_SCOPED: MergeMode = MergeMode {
    default_propagate: false,
    allow_protected_override: false,
};

const PROPERTY_SCOPED: MergeMode = MergeMode {
    default_propagate: true,
    allow_protected_override: true,
};

impl ActiveContext {
    /// An empty root context.
    pub fn empty() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Returns the definition of a term.
    pub fn term(&self, term: &str) -> Option<&TermDefinition> {
        self.terms.get(term).map(Rc::as_ref)
    }

    pub fn vocab(&self) -> Option<&str> {
        self.vocab.as_deref()
    }

    /// `@type` plus every term aliased to it, sorted.
    pub fn type_terms(&self) -> Vec<String> {
        let mut terms: Vec<String> = std::iter::once("@type".to_string())
            .chain(
                self.terms
                    .iter()
                    .filter(|(_, def)| def.id == "@type")
                    .map(|(term, _)| term.clone()),
            )
            .collect();
        terms.sort();
        terms
    }

    /// Returns true if `term` is `@id` or an alias of it.
    pub fn is_id_term(&self, term: &str) -> bool {
        term == "@id" || self.term(term).is_some_and(|def| def.id == "@id")
    }

    // =========================================================================
    // Scoping operations
    // =========================================================================

    /// Applies a node's own `@context` value.
    pub fn apply_embedded(
        self: &Rc<Self>,
        loader: &mut ContextLoader<'_>,
        context: Option<&JsonValue>,
    ) -> Result<Rc<Self>, Error> {
        let Some(context) = context else {
            return Ok(Rc::clone(self));
        };
        let resolved = loader.load(context)?;
        let mut next = self.derive(self.terms.clone());
        for step in resolved.iter() {
            next.merge(step, EMBEDDED)?;
        }
        Ok(Rc::new(next))
    }

    /// Applies the scoped contexts of a node's types, in sorted order.
    pub fn apply_type_scoped(
        self: &Rc<Self>,
        loader: &mut ContextLoader<'_>,
        types: &[String],
    ) -> Result<Rc<Self>, Error> {
        let mut sorted: Vec<&String> = types.iter().collect();
        sorted.sort();
        sorted.dedup();

        // Each type is looked up in the context left by the types before it.
        let mut next: Option<ActiveContext> = None;
        for type_value in sorted {
            let current = next.as_ref().map_or(&self.terms, |ctx| &ctx.terms);
            let Some(scoped) = current.get(type_value).and_then(|d| d.context.clone()) else {
                continue;
            };
            trace!(type_value = type_value.as_str(), "applying type-scoped context");
            let resolved = loader.load(&scoped)?;
            let ctx = next.get_or_insert_with(|| self.derive(self.terms.clone()));
            for step in resolved.iter() {
                ctx.merge(step, TYPE_SCOPED)?;
            }
        }
        Ok(next.map_or_else(|| Rc::clone(self), Rc::new))
    }

    /// Computes the context for the values of `term`: non-propagating terms
    /// are reverted, then the term's own scoped context is applied.
    pub fn apply_property_scoped(
        self: &Rc<Self>,
        loader: &mut ContextLoader<'_>,
        term: &str,
    ) -> Result<Rc<Self>, Error> {
        let scoped = self.terms.get(term).and_then(|d| d.context.clone());
        let has_transient = self.terms.values().any(|d| !d.propagates());
        if scoped.is_none() && !has_transient {
            return Ok(Rc::clone(self));
        }

        let mut next = self.derive(self.reverted_terms());
        if let Some(scoped) = scoped {
            trace!(term, "applying property-scoped context");
            let resolved = loader.load(&scoped)?;
            for step in resolved.iter() {
                next.merge(step, PROPERTY_SCOPED)?;
            }
        }
        Ok(Rc::new(next))
    }

    fn derive(self: &Rc<Self>, terms: TermMap) -> ActiveContext {
        ActiveContext {
            terms,
            vocab: self.vocab.clone(),
            parent: Some(Rc::clone(self)),
        }
    }

    /// Replaces each non-propagating term with the nearest propagating
    /// definition up the parent chain, dropping it if there is none.
    fn reverted_terms(&self) -> TermMap {
        let mut terms = TermMap::default();
        for (term, def) in &self.terms {
            if def.propagates() {
                terms.insert(term.clone(), Rc::clone(def));
                continue;
            }
            let mut ancestor = self.parent.as_deref();
            while let Some(ctx) = ancestor {
                if let Some(prev) = ctx.terms.get(term) {
                    if prev.propagates() {
                        terms.insert(term.clone(), Rc::clone(prev));
                        break;
                    }
                }
                ancestor = ctx.parent.as_deref();
            }
        }
        terms
    }

    // =========================================================================
    // Merging
    // =========================================================================

    fn merge(&mut self, step: &ResolvedContext, mode: MergeMode) -> Result<(), Error> {
        match step {
            ResolvedContext::Reset => self.reset(mode),
            ResolvedContext::Definitions(local) => self.merge_definitions(local, mode),
        }
    }

    fn reset(&mut self, mode: MergeMode) -> Result<(), Error> {
        if !mode.allow_protected_override {
            let mut protected: Vec<&String> = self
                .terms
                .iter()
                .filter(|(_, def)| def.protected)
                .map(|(term, _)| term)
                .collect();
            protected.sort();
            if let Some(term) = protected.first() {
                return Err(Error::ProtectedTermRedefinition {
                    term: (*term).clone(),
                });
            }
        }
        self.terms.clear();
        self.vocab = None;
        Ok(())
    }

    fn merge_definitions(&mut self, local: &LoadedContext, mode: MergeMode) -> Result<(), Error> {
        let vocab = match &local.vocab {
            Some(Some(v)) => {
                let resolver = IriResolver {
                    local,
                    active: &self.terms,
                    vocab: self.vocab.as_deref(),
                };
                Some(resolver.expand(v)?.unwrap_or_else(|| v.clone()))
            }
            Some(None) => None,
            None => self.vocab.clone(),
        };

        let resolver = IriResolver {
            local,
            active: &self.terms,
            vocab: vocab.as_deref(),
        };
        let mut updates = Vec::with_capacity(local.terms.len());
        for (term, def) in &local.terms {
            let resolved = match def {
                Some(def) => Some(resolver.resolve(term, def, mode)?),
                None => None,
            };
            updates.push((term, resolved));
        }

        for (term, resolved) in updates {
            if let Some(existing) = self.terms.get(term.as_str()) {
                if existing.protected && !mode.allow_protected_override {
                    match &resolved {
                        Some(def) if existing.same_definition(def) => continue,
                        _ => {
                            return Err(Error::ProtectedTermRedefinition { term: term.clone() });
                        }
                    }
                }
            }
            match resolved {
                Some(def) => {
                    self.terms.insert(term.clone(), Rc::new(def));
                }
                None => {
                    self.terms.remove(term.as_str());
                }
            }
        }
        self.vocab = vocab;
        Ok(())
    }
}

// =============================================================================
// IRI RESOLUTION
// =============================================================================

/// Expands terms, compact IRIs and vocabulary-relative names against the
/// context being merged and the active term map.
struct IriResolver<'a> {
    local: &'a LoadedContext,
    active: &'a TermMap,
    vocab: Option<&'a str>,
}

impl IriResolver<'_> {
    fn resolve(
        &self,
        term: &str,
        def: &LocalDefinition,
        mode: MergeMode,
    ) -> Result<TermDefinition, Error> {
        let id = self
            .local_term_iri(term, def, 0)?
            .ok_or_else(|| Error::invalid_term(term, "cannot be resolved to an IRI"))?;
        let type_ = match &def.type_ {
            Some(t) => Some(self.expand(t)?.unwrap_or_else(|| t.clone())),
            None => None,
        };
        Ok(TermDefinition {
            id,
            type_,
            protected: def.protected.unwrap_or(self.local.protected),
            propagate: Some(self.local.propagate.unwrap_or(mode.default_propagate)),
            context: def.context.clone(),
        })
    }

    fn expand(&self, value: &str) -> Result<Option<String>, Error> {
        self.expand_at(value, 0)
    }

    fn expand_at(&self, value: &str, depth: usize) -> Result<Option<String>, Error> {
        if depth > MAX_CONTEXT_DEPTH {
            return Err(Error::invalid_term(value, "IRI expansion does not terminate"));
        }
        if value.starts_with('@') {
            return Ok(Some(value.to_string()));
        }
        if value.contains(':') {
            return self.expand_compact(value, depth);
        }
        if let Some(iri) = self.term_iri(value, depth + 1)? {
            return Ok(Some(iri));
        }
        Ok(self.vocab.map(|v| format!("{v}{value}")))
    }

    /// Expands `prefix:suffix`; an undefined prefix leaves an absolute IRI.
    fn expand_compact(&self, value: &str, depth: usize) -> Result<Option<String>, Error> {
        let Some((prefix, suffix)) = value.split_once(':') else {
            return Ok(Some(value.to_string()));
        };
        if suffix.starts_with("//") {
            return Ok(Some(value.to_string()));
        }
        match self.term_iri(prefix, depth + 1)? {
            Some(iri) => Ok(Some(format!("{iri}{suffix}"))),
            None => Ok(Some(value.to_string())),
        }
    }

    /// IRI of a term as seen while merging: local definitions shadow active
    /// ones. An explicitly nulled local term has none.
    fn term_iri(&self, term: &str, depth: usize) -> Result<Option<String>, Error> {
        match self.local.definition(term) {
            Some(Some(def)) => self.local_term_iri(term, def, depth),
            Some(None) => Ok(None),
            None => Ok(self.active.get(term).map(|def| def.id.clone())),
        }
    }

    fn local_term_iri(&self, term: &str, def: &LocalDefinition, depth: usize) -> Result<Option<String>, Error> {
        if depth > MAX_CONTEXT_DEPTH {
            return Err(Error::invalid_term(term, "IRI expansion does not terminate"));
        }
        match def.id.as_deref() {
            Some(id) if id != term => self.expand_at(id, depth + 1),
            _ if term.contains(':') => self.expand_compact(term, depth + 1),
            _ => Ok(self.vocab.map(|v| format!("{v}{term}"))),
        }
    }
}
