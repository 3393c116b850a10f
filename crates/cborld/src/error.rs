//! Error types for CBOR-LD encoding, decoding, and context processing.

use thiserror::Error;

/// Stable machine-readable error codes.
///
/// Every [`Error`] maps onto exactly one code; the string form is shared with
/// other CBOR-LD implementations so callers can match on it across languages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Unrecognized tag, malformed or oversized varint, malformed wrapper.
    NotCborLd,
    /// A context is structurally invalid (wrong value type, nesting too deep).
    InvalidContext,
    /// A term definition could not be resolved to an IRI.
    InvalidTermDefinition,
    /// A protected term was redefined with a different definition.
    ProtectedTermRedefinition,
    /// An integer term id on the wire has no registered term.
    UnknownTermId,
    /// An integer context code is missing from the context table.
    UndefinedCompressedContext,
    /// A compressed value is missing from its value table.
    UnknownCompressedValue,
    /// A value table code exceeds the interoperable integer range.
    CompressionValueTooLarge,
    /// A byte-encoded table code has an unsupported width.
    UnrecognizedBytes,
    /// A value table was supplied for a type that cannot carry one.
    UnsupportedLiteralType,
    /// No type table is available for a compressed payload.
    NoTypeTable,
    /// Mutually exclusive or otherwise invalid arguments.
    InvalidArgument,
    /// The document loader failed.
    DocumentLoad,
    /// A document value has no valid encoding, or the decoded structure does
    /// not have the expected shape.
    InvalidEncodedValue,
    /// The underlying CBOR reader/writer failed.
    Cbor,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "ERR_NOT_CBORLD").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotCborLd => "ERR_NOT_CBORLD",
            ErrorCode::InvalidContext => "ERR_INVALID_CONTEXT",
            ErrorCode::InvalidTermDefinition => "ERR_INVALID_TERM_DEFINITION",
            ErrorCode::ProtectedTermRedefinition => "ERR_PROTECTED_TERM_REDEFINITION",
            ErrorCode::UnknownTermId => "ERR_UNKNOWN_CBORLD_TERM_ID",
            ErrorCode::UndefinedCompressedContext => "ERR_UNDEFINED_COMPRESSED_CONTEXT",
            ErrorCode::UnknownCompressedValue => "ERR_UNKNOWN_COMPRESSED_VALUE",
            ErrorCode::CompressionValueTooLarge => "ERR_COMPRESSION_VALUE_TOO_LARGE",
            ErrorCode::UnrecognizedBytes => "ERR_UNRECOGNIZED_BYTES",
            ErrorCode::UnsupportedLiteralType => "ERR_UNSUPPORTED_LITERAL_TYPE",
            ErrorCode::NoTypeTable => "ERR_NO_TYPETABLE",
            ErrorCode::InvalidArgument => "ERR_INVALID_ARGUMENT",
            ErrorCode::DocumentLoad => "ERR_DOCUMENT_LOAD",
            ErrorCode::InvalidEncodedValue => "ERR_INVALID_ENCODED_VALUE",
            ErrorCode::Cbor => "ERR_CBOR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised by any CBOR-LD operation.
///
/// All errors are fatal to the conversion that raised them; no partial
/// output is ever returned alongside one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    // === Framing ===
    #[error("[ERR_NOT_CBORLD] input is not a tagged CBOR value")]
    Untagged,

    #[error("[ERR_NOT_CBORLD] unrecognized CBOR-LD tag {tag:#06x}")]
    UnknownTag { tag: u64 },

    #[error("[ERR_NOT_CBORLD] malformed {context}")]
    MalformedHeader { context: &'static str },

    #[error("[ERR_NOT_CBORLD] registry entry varint length {len} exceeds maximum {max}")]
    VarintTooLong { len: usize, max: usize },

    #[error("[ERR_NOT_CBORLD] malformed registry entry varint")]
    MalformedVarint,

    // === Contexts ===
    #[error("[ERR_INVALID_CONTEXT] {reason}")]
    InvalidContext { reason: String },

    #[error("[ERR_INVALID_TERM_DEFINITION] invalid definition for term {term:?}: {reason}")]
    InvalidTermDefinition { term: String, reason: String },

    #[error("[ERR_PROTECTED_TERM_REDEFINITION] protected term {term:?} cannot be redefined")]
    ProtectedTermRedefinition { term: String },

    #[error("[ERR_DOCUMENT_LOAD] failed to load {url:?}: {message}")]
    DocumentLoad { url: String, message: String },

    // === Term ids ===
    #[error("[ERR_UNKNOWN_CBORLD_TERM_ID] unknown term id {id}")]
    UnknownTermId { id: u64 },

    // === Values ===
    #[error("[ERR_UNDEFINED_COMPRESSED_CONTEXT] undefined compressed context {code}")]
    UndefinedCompressedContext { code: u64 },

    #[error("[ERR_UNKNOWN_COMPRESSED_VALUE] compressed value {code} not found in {table:?} table")]
    UnknownCompressedValue { table: String, code: u64 },

    #[error("[ERR_COMPRESSION_VALUE_TOO_LARGE] code {code} in {table:?} table exceeds maximum {max}")]
    CompressionValueTooLarge { table: String, code: u64, max: u64 },

    #[error("[ERR_UNRECOGNIZED_BYTES] unrecognized {len}-byte value encoding")]
    UnrecognizedBytes { len: usize },

    #[error("[ERR_UNSUPPORTED_LITERAL_TYPE] type {type_name:?} cannot have a value table")]
    UnsupportedLiteralType { type_name: String },

    #[error("[ERR_INVALID_ENCODED_VALUE] {0}")]
    InvalidEncodedValue(String),

    // === Configuration ===
    #[error("[ERR_NO_TYPETABLE] no type table available for registry entry {registry_entry_id}")]
    NoTypeTable { registry_entry_id: u64 },

    #[error("[ERR_INVALID_ARGUMENT] {0}")]
    InvalidArgument(&'static str),

    // === CBOR ===
    #[error("[ERR_CBOR] {0}")]
    Cbor(String),
}

impl Error {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Untagged
            | Error::UnknownTag { .. }
            | Error::MalformedHeader { .. }
            | Error::VarintTooLong { .. }
            | Error::MalformedVarint => ErrorCode::NotCborLd,
            Error::InvalidContext { .. } => ErrorCode::InvalidContext,
            Error::InvalidTermDefinition { .. } => ErrorCode::InvalidTermDefinition,
            Error::ProtectedTermRedefinition { .. } => ErrorCode::ProtectedTermRedefinition,
            Error::DocumentLoad { .. } => ErrorCode::DocumentLoad,
            Error::UnknownTermId { .. } => ErrorCode::UnknownTermId,
            Error::UndefinedCompressedContext { .. } => ErrorCode::UndefinedCompressedContext,
            Error::UnknownCompressedValue { .. } => ErrorCode::UnknownCompressedValue,
            Error::CompressionValueTooLarge { .. } => ErrorCode::CompressionValueTooLarge,
            Error::UnrecognizedBytes { .. } => ErrorCode::UnrecognizedBytes,
            Error::UnsupportedLiteralType { .. } => ErrorCode::UnsupportedLiteralType,
            Error::InvalidEncodedValue(_) => ErrorCode::InvalidEncodedValue,
            Error::NoTypeTable { .. } => ErrorCode::NoTypeTable,
            Error::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Error::Cbor(_) => ErrorCode::Cbor,
        }
    }

    /// Returns true for argument-validation errors, as opposed to errors
    /// caused by the content of the document being converted.
    pub fn is_config_error(&self) -> bool {
        matches!(self.code(), ErrorCode::InvalidArgument | ErrorCode::NoTypeTable)
    }

    pub(crate) fn invalid_term(term: &str, reason: impl Into<String>) -> Self {
        Error::InvalidTermDefinition {
            term: term.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_context(reason: impl Into<String>) -> Self {
        Error::InvalidContext {
            reason: reason.into(),
        }
    }
}

/// Error returned by a [`DocumentLoader`](crate::context::DocumentLoader).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct LoaderError {
    pub message: String,
}

impl LoaderError {
    /// Creates a loader error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framing_errors_share_code() {
        let errors = [
            Error::Untagged,
            Error::UnknownTag { tag: 0x1234 },
            Error::MalformedHeader { context: "payload" },
            Error::VarintTooLong { len: 24, max: 23 },
            Error::MalformedVarint,
        ];
        for e in errors {
            assert_eq!(e.code(), ErrorCode::NotCborLd);
            assert_eq!(e.code().as_str(), "ERR_NOT_CBORLD");
        }
    }

    #[test]
    fn test_message_carries_code() {
        let e = Error::UnknownTermId { id: 102 };
        assert_eq!(e.to_string(), "[ERR_UNKNOWN_CBORLD_TERM_ID] unknown term id 102");
    }

    #[test]
    fn test_config_errors() {
        assert!(Error::InvalidArgument("x").is_config_error());
        assert!(Error::NoTypeTable { registry_entry_id: 1 }.is_config_error());
        assert!(!Error::UnknownTermId { id: 1 }.is_config_error());
    }
}
