//! Multibase strings as byte strings.
//!
//! A value is written as its multibase prefix character followed by the
//! decoded bytes. Only base58btc (`z`), base64 padded (`M`) and base64url
//! unpadded (`u`) are compressed, and only when re-encoding the bytes gives
//! back the input exactly.

use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};

/// Type IRI of multibase-encoded literals.
pub const MULTIBASE: &str = "https://w3id.org/security#multibase";

const BASE58_BTC: u8 = b'z';
const BASE64_PAD: u8 = b'M';
const BASE64_URL: u8 = b'u';

/// Compresses a multibase string, or returns `None` if it cannot be
/// restored exactly.
pub fn encode(value: &str) -> Option<Vec<u8>> {
    let prefix = *value.as_bytes().first()?;
    let body = value.get(1..)?;
    let decoded = match prefix {
        BASE58_BTC => bs58::decode(body).into_vec().ok()?,
        BASE64_PAD => STANDARD.decode(body).ok()?,
        BASE64_URL => URL_SAFE_NO_PAD.decode(body).ok()?,
        _ => return None,
    };
    if encode_body(prefix, &decoded) != body {
        return None;
    }
    let mut out = Vec::with_capacity(decoded.len() + 1);
    out.push(prefix);
    out.extend_from_slice(&decoded);
    Some(out)
}

/// Restores a multibase string from its compressed bytes.
pub fn decode(bytes: &[u8]) -> Option<String> {
    let (&prefix, data) = bytes.split_first()?;
    match prefix {
        BASE58_BTC | BASE64_PAD | BASE64_URL => {
            let mut out = String::with_capacity(data.len() * 2 + 1);
            out.push(prefix as char);
            out.push_str(&encode_body(prefix, data));
            Some(out)
        }
        _ => None,
    }
}

fn encode_body(prefix: u8, data: &[u8]) -> String {
    match prefix {
        BASE58_BTC => bs58::encode(data).into_string(),
        BASE64_PAD => STANDARD.encode(data),
        _ => URL_SAFE_NO_PAD.encode(data),
    }
}
