//! Simple tool to inspect CBOR-LD files.
//!
//! Prints the header and the CBOR diagnostic notation of the payload.
//! Contexts are not fetched, so term codes are shown as-is.

use std::fs;

use cborld::Format;
use cborld::codec::cbor::from_bytes;
use cborld::codec::framing::unframe;
use cborld::codec::to_diagnostic;

fn format_name(format: Format) -> &'static str {
    match format {
        Format::Current => "current (0xcb1d)",
        Format::LegacyRange => "legacy-range (0x0600..0x0700)",
        Format::LegacySingleton => "legacy-singleton (0x0500/0x0501)",
    }
}

fn main() {
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: inspect <file.cborld>");
        std::process::exit(2);
    };

    println!("Reading: {}", path);

    let data = fs::read(&path).expect("Failed to read file");
    println!("File size: {} bytes", data.len());

    let value = from_bytes(&data).expect("Failed to parse CBOR");
    let (header, payload) = unframe(value).expect("Failed to parse CBOR-LD header");

    println!("\n=== Header ===");
    println!("Format: {}", format_name(header.format));
    match header.registry_entry_id {
        Some(id) => println!("Registry entry: {}", id),
        None => println!("Registry entry: (implied) {}", header.type_table_id()),
    }
    println!("Compressed: {}", header.payload_compressed);

    println!("\n=== Payload ===");
    println!("{}", to_diagnostic(&payload));
}
