//! CBOR-LD: a compact binary encoding of JSON-LD documents.
//!
//! CBOR-LD replaces the terms of a document's contexts with small integer
//! codes and compresses values through type tables and per-type codecs
//! (URLs, dates, multibase strings). Encoder and decoder derive the same
//! term codes independently from the contexts, so no dictionary travels
//! with the data.
//!
//! # Quick Start
//!
//! ```rust
//! use cborld::{DecodeOptions, EncodeOptions, StaticDocumentLoader, TypeTable, decode, encode};
//! use serde_json::json;
//!
//! let documents = StaticDocumentLoader::new().with(
//!     "https://example.com/v1",
//!     json!({"@context": {"name": "https://schema.org/name"}}),
//! );
//! let table = TypeTable::new()
//!     .with_table("context", [("https://example.com/v1", 0x8000)])
//!     .unwrap();
//!
//! let doc = json!({"@context": "https://example.com/v1", "name": "Alice"});
//! let bytes = encode(&doc, &EncodeOptions::new(&documents).type_table(&table)).unwrap();
//! let decoded = decode(&bytes, &DecodeOptions::new(&documents).type_table(&table)).unwrap();
//! assert_eq!(decoded, doc);
//! ```
//!
//! # Modules
//!
//! - [`codec`]: encode/decode, framing and value codecs
//! - [`context`]: context loading and active contexts
//! - [`registry`]: term codes
//! - [`type_table`]: value tables per type
//! - [`error`]: error types
//! - [`limits`]: wire constants and processing bounds
//!
//! # Wire Format
//!
//! A CBOR-LD document is a tagged CBOR value:
//! - Current: tag `0xcb1d` over `[registryEntryId, payload]`
//! - Legacy range: tags `0x0600..0x0700`, the registry entry id spread
//!   between the tag and a wrapper array
//! - Legacy singleton: tag `0x0501` (compressed) or `0x0500`
//!
//! Registry entry id `0` marks a payload written without compression.

pub mod codec;
pub mod context;
pub mod error;
pub mod limits;
pub mod registry;
pub mod type_table;
pub mod util;

// Re-export commonly used types at crate root
pub use codec::{DecodeOptions, EncodeOptions, Format, Header, decode, encode, inspect};
pub use context::{
    CachingDocumentLoader, DocumentLoader, StaticDocumentLoader, TypeTableLoader,
};
pub use error::{Error, ErrorCode, LoaderError};
pub use registry::TermRegistry;
pub use type_table::{CodeEncoding, TypeTable, ValueTable};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
