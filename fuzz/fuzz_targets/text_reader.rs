#![no_main]

use flatread_text::TextReader;
use libfuzzer_sys::fuzz_target;
use serde_json::Value;

fn walk(reader: &TextReader, value: &Value, depth: usize) {
    if depth > 8 {
        return;
    }
    let _ = reader.value::<u64>(Some(value), 0);
    let _ = reader.value::<String>(Some(value), String::new());
    let _ = reader.typed_array::<f32>(Some(value));
    if let Ok(items) = reader.array(Some(value)) {
        for item in items {
            walk(reader, item, depth + 1);
        }
    }
    if let Value::Object(fields) = value {
        for field in fields.values() {
            let _ = reader.object(Some(field), |r, v| {
                walk(r, v, depth + 1);
                Ok(())
            });
        }
    }
}

// Fuzz target: TextReader::open plus every accessor over the parsed tree.
//
// Catches bugs in:
// - Malformed text handling
// - Conversion of out-of-range numbers
// - Non-array values passed to array accessors
fuzz_target!(|data: &str| {
    let Ok(reader) = TextReader::open(data) else {
        return;
    };
    walk(&reader, reader.root(), 0);
});
