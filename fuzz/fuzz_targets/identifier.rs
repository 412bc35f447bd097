#![no_main]

use flatread_wire::identifier::{has_identifier, read_identifier};
use libfuzzer_sys::fuzz_target;

// Fuzz target: file identifier checks with arbitrary buffers and
// arbitrary candidate identifiers.
//
// Catches bugs in:
// - Short buffer handling
// - Identifier length validation (bytes, not characters)
fuzz_target!(|input: (&[u8], &str)| {
    let (buf, ident) = input;
    let matched = has_identifier(buf, 0, ident);
    if let Ok(true) = matched {
        assert_eq!(read_identifier(buf, 0).unwrap().as_bytes(), ident.as_bytes());
    }
    if ident.len() != 4 {
        assert!(matched.is_err());
    }
});
