#![no_main]

use flatread_reader::{Reader, ReaderOptions, Utf8Mode};
use libfuzzer_sys::fuzz_target;

// Fuzz target: string decoding at every offset of arbitrary bytes, in
// permissive, strict and UTF-16 form.
//
// Catches bugs in:
// - Length prefixes that run past the buffer
// - Truncated multi-byte sequences at the end of a string
// - Disagreement between the permissive and strict decoders
fuzz_target!(|data: &[u8]| {
    let permissive = Reader::new(data);
    let strict = Reader::with_options(
        data,
        ReaderOptions {
            utf8: Utf8Mode::Strict,
            ..ReaderOptions::default()
        },
    );
    for offset in 0..data.len().min(32) {
        let lenient = permissive.string(offset);
        if let Ok(text) = strict.string(offset) {
            // Valid input decodes identically either way.
            assert_eq!(lenient.as_deref(), Ok(text.as_str()));
        }
        let _ = permissive.string_utf16(offset);
    }
});
