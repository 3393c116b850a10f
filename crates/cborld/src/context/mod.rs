//! JSON-LD context processing.
//!
//! Contexts are loaded through a [`ContextLoader`], which registers their
//! terms in the conversion's [`TermRegistry`](crate::registry::TermRegistry)
//! the first time each one is seen, and applied through the scoping
//! operations on [`ActiveContext`].

mod active;
mod definition;
mod loader;

pub use active::ActiveContext;
pub use definition::{LoadedContext, LocalDefinition, TermDefinition};
pub use loader::{
    CachingDocumentLoader, ContextLoader, DocumentLoader, ResolvedContext, StaticDocumentLoader,
    TypeTableLoader,
};
