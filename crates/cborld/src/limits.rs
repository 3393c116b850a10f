//! Wire constants and decoding limits.

/// Tag for the current format: payload is `[registryEntryId, document]`.
pub const CBORLD_TAG: u64 = 0xcb1d;

/// First tag of the legacy-range band (inclusive).
pub const LEGACY_RANGE_START: u64 = 0x0600;

/// End of the legacy-range band (exclusive).
pub const LEGACY_RANGE_END: u64 = 0x0700;

/// Legacy-singleton tag for a payload without term/value substitution.
pub const LEGACY_SINGLETON_UNCOMPRESSED: u64 = 0x0500;

/// Legacy-singleton tag for a compressed payload.
pub const LEGACY_SINGLETON_COMPRESSED: u64 = 0x0501;

/// Registry entry id implied by a compressed legacy-singleton payload.
pub const LEGACY_SINGLETON_REGISTRY_ENTRY_ID: u64 = 1;

/// Registry entry id marking an uncompressed payload.
pub const UNCOMPRESSED_REGISTRY_ENTRY_ID: u64 = 0;

/// Legacy-range ids below this value live entirely in the tag.
pub const LEGACY_RANGE_INLINE_MAX: u64 = 128;

/// Maximum assembled length of a legacy-range registry entry varint.
pub const MAX_REGISTRY_VARINT_BYTES: usize = 23;

/// Maximum bytes of an unsigned LEB128 varint holding a u64.
pub const MAX_VARINT_BYTES: usize = 10;

/// First integer code handed out to a custom (non-keyword) term.
pub const CUSTOM_TERM_ID_START: u64 = 100;

/// Maximum depth of nested context references and IRI expansion steps.
pub const MAX_CONTEXT_DEPTH: usize = 32;

/// Largest value table code (2^53 - 1, the interoperable integer range).
pub const MAX_TABLE_CODE: u64 = (1 << 53) - 1;
