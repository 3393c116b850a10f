//! CBOR-LD encoding and decoding.
//!
//! [`encode`] and [`decode`] are the entry points. The tree walk lives in
//! [`converter`], with the direction-specific halves in [`compress`] and
//! [`decompress`]; [`values`] holds the value codecs and [`framing`] the
//! tag and header.

pub mod cbor;
pub mod compress;
pub mod converter;
pub mod decompress;
pub mod diagnostic;
pub mod document;
pub mod framing;
pub mod primitives;
pub mod strategy;
pub mod values;

pub use diagnostic::to_diagnostic;
pub use document::{DecodeOptions, Diagnose, EncodeOptions, decode, encode};
pub use framing::{Format, Header, inspect};
pub use primitives::{Reader, Writer, decode_exact_varint, encode_varint};
pub use values::{CodecContext, ValueType};
