//! Term registry: integer codes for JSON-LD keywords and context terms.
//!
//! Keyword codes are a fixed table shared by every CBOR-LD implementation.
//! Custom terms get codes on first sight, starting at
//! [`CUSTOM_TERM_ID_START`] and stepping by two so that `code + 1` can mark
//! the plural (array-valued) form of the same term.

use lazy_static::lazy_static;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::error::Error;
use crate::limits::CUSTOM_TERM_ID_START;

/// JSON-LD keywords in code order; the code of `KEYWORDS[i]` is `2 * i`.
pub const KEYWORDS: [&str; 28] = [
    "@context",
    "@type",
    "@id",
    "@value",
    "@direction",
    "@graph",
    "@included",
    "@index",
    "@json",
    "@language",
    "@list",
    "@nest",
    "@reverse",
    "@base",
    "@container",
    "@default",
    "@embed",
    "@explicit",
    "@none",
    "@omitDefault",
    "@prefix",
    "@preserve",
    "@protected",
    "@requireAll",
    "@set",
    "@version",
    "@vocab",
    "@propagate",
];

/// Code of `@context`.
pub const CONTEXT_TERM_ID: u64 = 0;

/// Code of `@context` holding an array of contexts.
pub const CONTEXT_TERM_ID_PLURAL: u64 = CONTEXT_TERM_ID + 1;

lazy_static! {
    static ref KEYWORD_IDS: FxHashMap<&'static str, u64> = KEYWORDS
        .iter()
        .enumerate()
        .map(|(i, k)| (*k, (i as u64) * 2))
        .collect();
}

/// Returns true if `term` is one of the fixed JSON-LD keywords.
pub fn is_keyword(term: &str) -> bool {
    KEYWORD_IDS.contains_key(term)
}

/// Key of an entry on the wire: an integer code, or the term itself when it
/// was never registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermKey<'a> {
    Id(u64),
    Term(&'a str),
}

/// A term resolved from a wire code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermInfo {
    pub term: String,
    pub plural: bool,
}

/// Bidirectional term/code table for one conversion.
#[derive(Debug, Clone)]
pub struct TermRegistry {
    term_to_id: FxHashMap<String, u64>,
    id_to_term: FxHashMap<u64, String>,
    next_id: u64,
}

impl Default for TermRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TermRegistry {
    /// Creates a registry seeded with the keyword table.
    pub fn new() -> Self {
        let mut term_to_id = FxHashMap::default();
        let mut id_to_term = FxHashMap::default();
        for (term, id) in KEYWORD_IDS.iter() {
            term_to_id.insert((*term).to_string(), *id);
            id_to_term.insert(*id, (*term).to_string());
        }
        Self {
            term_to_id,
            id_to_term,
            next_id: CUSTOM_TERM_ID_START,
        }
    }

    /// Registers a term, returning its code. Idempotent.
    pub fn register(&mut self, term: &str) -> u64 {
        if let Some(&id) = self.term_to_id.get(term) {
            return id;
        }
        let id = self.next_id;
        self.next_id += 2;
        self.term_to_id.insert(term.to_string(), id);
        self.id_to_term.insert(id, term.to_string());
        trace!(term, id, "registered term");
        id
    }

    /// Returns the singular code of a registered term.
    pub fn get_id(&self, term: &str) -> Option<u64> {
        self.term_to_id.get(term).copied()
    }

    /// Returns the wire key for a term: its code (plus one when plural), or
    /// the term itself when unregistered.
    pub fn id_for<'t>(&self, term: &'t str, plural: bool) -> TermKey<'t> {
        match self.term_to_id.get(term) {
            Some(&id) if plural => TermKey::Id(id + 1),
            Some(&id) => TermKey::Id(id),
            None => TermKey::Term(term),
        }
    }

    /// Resolves a wire code to its term and plurality.
    pub fn term_for(&self, id: u64) -> Result<TermInfo, Error> {
        let plural = id % 2 == 1;
        let base = id - (id % 2);
        match self.id_to_term.get(&base) {
            Some(term) => Ok(TermInfo {
                term: term.clone(),
                plural,
            }),
            None => Err(Error::UnknownTermId { id }),
        }
    }

    /// Returns the term registered at exactly `id` (singular codes only).
    pub fn lookup(&self, id: u64) -> Option<&str> {
        self.id_to_term.get(&id).map(String::as_str)
    }

    /// Number of registered custom terms.
    pub fn custom_len(&self) -> usize {
        ((self.next_id - CUSTOM_TERM_ID_START) / 2) as usize
    }
}
