//! Hostile and degenerate input.
//!
//! The reader must never panic on bytes it did not write: truncated
//! buffers, flipped bits, lengths that claim more than the buffer holds.
//! Every such case has to come back as an `Err`, or at worst as a wrong but
//! harmless `Ok`.

use flatread_reader::{FlatError, Reader};
use flatread_tests::builder::{Builder, Field};
use flatread_tests::fixtures::tiny_model;
use flatread_tests::schema::Model;
use flatread_text::TextReader;

#[test]
fn every_truncation_fails_cleanly() {
    let buf = tiny_model();
    for end in 0..buf.len() {
        let _ = Model::open(&buf[..end]);
    }
}

#[test]
fn short_prefix_is_out_of_range() {
    let buf = tiny_model();
    assert!(matches!(
        Model::open(&buf[..3]),
        Err(FlatError::OutOfRange { .. })
    ));
    assert!(matches!(Model::open(&[]), Err(FlatError::OutOfRange { .. })));
}

#[test]
fn every_byte_flip_fails_cleanly() {
    let original = tiny_model();
    for i in 0..original.len() {
        let mut buf = original.clone();
        buf[i] ^= 0xFF;
        let _ = Model::open(&buf);
    }
}

#[test]
fn root_offset_before_buffer_start() {
    let buf = (-8i32).to_le_bytes();
    assert_eq!(
        Reader::new(&buf).root(),
        Err(FlatError::OffsetOverflow { base: 0, delta: -8 })
    );
}

#[test]
fn vector_length_past_end() {
    let mut b = Builder::new();
    let values = b.i32s(&[1, 2]);
    let table = b.table(&[(4, Field::Ref(values))]);
    let mut buf = b.finish(table);
    // Claim a billion elements.
    buf[values..values + 4].copy_from_slice(&1_000_000_000u32.to_le_bytes());

    let reader = Reader::new(&buf);
    assert!(matches!(
        reader.scalars_field::<i32>(table, 4),
        Err(FlatError::OutOfRange { .. })
    ));
    assert!(matches!(
        reader.table_array(table, 4, |_, p| Ok(p)),
        Err(FlatError::OutOfRange { .. })
    ));
}

#[test]
fn vtable_longer_than_buffer() {
    let mut b = Builder::new();
    let table = b.table(&[(4, Field::u32(1))]);
    let mut buf = b.finish(table);
    let vtable = Reader::new(&buf).vtable(table).unwrap().position();
    // Declare far more slots than were written.
    buf[vtable..vtable + 2].copy_from_slice(&0xFFF0u16.to_le_bytes());

    let reader = Reader::new(&buf);
    assert!(matches!(
        reader.uint32_field(table, 0x1000, 0),
        Err(FlatError::OutOfRange { .. })
    ));
}

#[test]
fn text_array_of_wrong_shape() {
    let text = TextReader::open(r#"{ "subgraphs": { "name": "not a list" } }"#).unwrap();
    assert_eq!(
        Model::decode_text(&text, text.root()),
        Err(FlatError::InvalidArray { kind: "object" })
    );
}

#[test]
fn text_null_fields_are_absent() {
    let text = TextReader::open(
        r#"{ "version": null, "description": null, "buffers": null, "feature_flags": null }"#,
    )
    .unwrap();
    assert_eq!(
        Model::decode_text(&text, text.root()).unwrap(),
        Model::default()
    );
}
