#![no_main]

use flatread_reader::utf8::{decode_lossy, decode_strict, decode_utf16};
use libfuzzer_sys::fuzz_target;

// Fuzz target: valid UTF-8 decodes back to itself.
//
// Takes an arbitrary Rust string, decodes its bytes through every
// decoder, and asserts the result matches what std produces.
fuzz_target!(|text: &str| {
    let bytes = text.as_bytes();
    assert_eq!(decode_lossy(bytes), text);
    assert_eq!(decode_strict(bytes, 0).as_deref(), Ok(text));
    assert_eq!(decode_utf16(bytes), text.encode_utf16().collect::<Vec<_>>());
});
