//! Context loading: document fetching, per-conversion caching and eager
//! term registration.

use std::rc::Rc;
use std::sync::{Arc, Mutex, OnceLock};

use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::context::definition::LoadedContext;
use crate::error::{Error, LoaderError};
use crate::limits::MAX_CONTEXT_DEPTH;
use crate::registry::TermRegistry;
use crate::type_table::TypeTable;

// =============================================================================
// COLLABORATORS
// =============================================================================

/// Resolves a context URL to the JSON document that holds it.
pub trait DocumentLoader {
    fn load_document(&self, url: &str) -> Result<JsonValue, LoaderError>;
}

impl<F> DocumentLoader for F
where
    F: Fn(&str) -> Result<JsonValue, LoaderError>,
{
    fn load_document(&self, url: &str) -> Result<JsonValue, LoaderError> {
        self(url)
    }
}

/// Supplies the type table for a registry entry id.
pub trait TypeTableLoader {
    fn load_type_table(&self, registry_entry_id: u64) -> Option<TypeTable>;
}

impl<F> TypeTableLoader for F
where
    F: Fn(u64) -> Option<TypeTable>,
{
    fn load_type_table(&self, registry_entry_id: u64) -> Option<TypeTable> {
        self(registry_entry_id)
    }
}

/// In-memory document loader.
#[derive(Debug, Clone, Default)]
pub struct StaticDocumentLoader {
    documents: FxHashMap<String, JsonValue>,
}

impl StaticDocumentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a document, returning the loader for chaining.
    pub fn with(mut self, url: impl Into<String>, document: JsonValue) -> Self {
        self.insert(url, document);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, document: JsonValue) {
        self.documents.insert(url.into(), document);
    }
}

impl DocumentLoader for StaticDocumentLoader {
    fn load_document(&self, url: &str) -> Result<JsonValue, LoaderError> {
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| LoaderError::new(format!("no document for {url}")))
    }
}

type CachedDocument = Arc<OnceLock<Result<Arc<JsonValue>, LoaderError>>>;

/// Memoizing wrapper around another loader, safe to share across threads.
///
/// Concurrent requests for the same URL wait on a single fetch. Failed
/// fetches are not cached.
#[derive(Debug)]
pub struct CachingDocumentLoader<L> {
    inner: L,
    entries: Mutex<FxHashMap<String, CachedDocument>>,
}

impl<L: DocumentLoader> CachingDocumentLoader<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            entries: Mutex::new(FxHashMap::default()),
        }
    }

    /// Number of cached documents, including fetches still in flight.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<L: DocumentLoader> DocumentLoader for CachingDocumentLoader<L> {
    fn load_document(&self, url: &str) -> Result<JsonValue, LoaderError> {
        let cell = {
            let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(entries.entry(url.to_string()).or_default())
        };

        let result = cell.get_or_init(|| {
            debug!(url, "fetching document");
            self.inner.load_document(url).map(Arc::new)
        });

        match result {
            Ok(document) => Ok(JsonValue::clone(document)),
            Err(e) => {
                let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
                if entries.get(url).is_some_and(|c| Arc::ptr_eq(c, &cell)) {
                    entries.remove(url);
                }
                Err(e.clone())
            }
        }
    }
}

// =============================================================================
// CONTEXT LOADER
// =============================================================================

/// One step of context processing.
#[derive(Debug, Clone)]
pub enum ResolvedContext {
    /// `@context: null`: clear all non-protected terms.
    Reset,
    Definitions(Rc<LoadedContext>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ContextKey {
    Url(String),
    Inline(String),
}

/// Loads and caches contexts for one conversion, registering their terms
/// on first load.
pub struct ContextLoader<'a> {
    documents: &'a dyn DocumentLoader,
    registry: TermRegistry,
    cache: FxHashMap<ContextKey, Rc<Vec<ResolvedContext>>>,
    in_progress: FxHashSet<String>,
}

impl<'a> ContextLoader<'a> {
    pub fn new(documents: &'a dyn DocumentLoader) -> Self {
        Self {
            documents,
            registry: TermRegistry::new(),
            cache: FxHashMap::default(),
            in_progress: FxHashSet::default(),
        }
    }

    pub fn registry(&self) -> &TermRegistry {
        &self.registry
    }

    /// Resolves a context value (URL, object, null or array of these) into
    /// the ordered steps it stands for.
    pub fn load(&mut self, value: &JsonValue) -> Result<Rc<Vec<ResolvedContext>>, Error> {
        self.load_at(value, 0)
    }

    fn load_at(&mut self, value: &JsonValue, depth: usize) -> Result<Rc<Vec<ResolvedContext>>, Error> {
        if depth > MAX_CONTEXT_DEPTH {
            return Err(Error::invalid_context(format!(
                "context nesting exceeds {MAX_CONTEXT_DEPTH} levels"
            )));
        }
        match value {
            JsonValue::Null => Ok(Rc::new(vec![ResolvedContext::Reset])),
            JsonValue::String(url) => self.load_url(url, depth),
            JsonValue::Object(map) => {
                let key = ContextKey::Inline(value.to_string());
                if let Some(cached) = self.cache.get(&key) {
                    return Ok(Rc::clone(cached));
                }
                let ctx = LoadedContext::parse(map)?;
                for term in ctx.registered_terms() {
                    self.registry.register(term);
                }
                for scoped in ctx.scoped_contexts() {
                    self.preload(scoped, depth + 1)?;
                }
                let resolved = Rc::new(vec![ResolvedContext::Definitions(Rc::new(ctx))]);
                self.cache.insert(key, Rc::clone(&resolved));
                Ok(resolved)
            }
            JsonValue::Array(items) => {
                let mut resolved = Vec::new();
                for item in items {
                    if item.is_array() {
                        return Err(Error::invalid_context("nested context arrays are not allowed"));
                    }
                    resolved.extend(self.load_at(item, depth)?.iter().cloned());
                }
                Ok(Rc::new(resolved))
            }
            _ => Err(Error::invalid_context(
                "context must be a URL, an object, null or an array of these",
            )),
        }
    }

    fn load_url(&mut self, url: &str, depth: usize) -> Result<Rc<Vec<ResolvedContext>>, Error> {
        let key = ContextKey::Url(url.to_string());
        if let Some(cached) = self.cache.get(&key) {
            return Ok(Rc::clone(cached));
        }
        debug!(url, "loading context");
        let document = self
            .documents
            .load_document(url)
            .map_err(|e| Error::DocumentLoad {
                url: url.to_string(),
                message: e.message,
            })?;
        let context = document
            .get("@context")
            .ok_or_else(|| Error::invalid_context(format!("document at {url} has no @context")))?;

        self.in_progress.insert(url.to_string());
        let resolved = self.load_at(context, depth + 1);
        self.in_progress.remove(url);

        let resolved = resolved?;
        self.cache.insert(key, Rc::clone(&resolved));
        Ok(resolved)
    }

    /// Loads a scoped context ahead of use so its terms are registered in
    /// context order. A URL already being loaded further up is skipped.
    fn preload(&mut self, value: &JsonValue, depth: usize) -> Result<(), Error> {
        if let JsonValue::String(url) = value {
            if self.in_progress.contains(url) {
                return Ok(());
            }
        }
        self.load_at(value, depth).map(|_| ())
    }
}
