//! Whole-model decoding through the sample schema.
//!
//! The same model is decoded from its binary buffer and from its text form;
//! both must land on the same value. A rendered summary is pinned with an
//! inline insta snapshot so layout regressions show up as a readable diff.

use flatread_reader::{Reader, ReaderOptions, StringEncoding};
use flatread_tests::builder::Builder;
use flatread_tests::fixtures::{tiny_model, tiny_model_json, tiny_model_value};
use flatread_tests::schema::{self, FILE_IDENTIFIER, Model, QuantizationDetails, TensorType};
use flatread_text::TextReader;
use insta::assert_snapshot;

#[test]
fn binary_model_decodes() {
    let buf = tiny_model();
    assert!(Reader::new(&buf).identifier(FILE_IDENTIFIER).unwrap());
    assert_eq!(Model::open(&buf).unwrap(), tiny_model_value());
}

#[test]
fn text_model_decodes() {
    let reader = TextReader::from_value(tiny_model_json());
    let model = Model::decode_text(&reader, reader.root()).unwrap();
    assert_eq!(model, tiny_model_value());
}

#[test]
fn text_and_binary_agree() {
    let text = TextReader::open(&tiny_model_json().to_string()).unwrap();
    let from_text = Model::decode_text(&text, text.root()).unwrap();
    let from_binary = Model::open(&tiny_model()).unwrap();
    assert_eq!(from_text, from_binary);
}

#[test]
fn nested_fields_reach_the_leaves() {
    let model = Model::open(&tiny_model()).unwrap();
    let output = &model.subgraphs[0].tensors[1];
    assert_eq!(output.tensor_type, TensorType::Int8);
    let quantization = output.quantization.as_ref().unwrap();
    assert_eq!(quantization.zero_point, vec![-3]);
    assert!(matches!(
        &quantization.details,
        QuantizationDetails::Custom(custom) if custom.custom == [1, 2, 3]
    ));
    assert_eq!(output.range.unwrap().max, 1.0);
    assert_eq!(model.buffers[2].chunk_sizes, vec![8, 8]);
}

#[test]
fn defaults_survive_both_encodings() {
    let model = Model::open(&tiny_model()).unwrap();
    let input = &model.subgraphs[0].tensors[0];
    assert_eq!(input.tensor_type, TensorType::Float32);
    assert!(!input.is_variable);
    assert_eq!(input.quantization, None);
    assert_eq!(input.range, None);
    assert_eq!(model.operator_codes[0].version, 1);
}

#[test]
fn empty_model_equals_default() {
    let mut b = Builder::with_identifier(b"TFL3");
    let root = b.table(&[]);
    let buf = b.finish(root);
    assert_eq!(Model::open(&buf).unwrap(), Model::default());

    let text = TextReader::open("{}").unwrap();
    assert_eq!(Model::decode_text(&text, text.root()).unwrap(), Model::default());
}

#[test]
fn raw_description_bytes() {
    let buf = tiny_model();
    let reader = Reader::with_options(
        &buf,
        ReaderOptions {
            encoding: StringEncoding::Raw,
            ..ReaderOptions::default()
        },
    );
    let root = reader.root().unwrap();
    let description = reader
        .string_value_field(root, Model::DESCRIPTION)
        .unwrap()
        .unwrap();
    assert_eq!(description.as_bytes(), b"tiny");
}

#[test]
fn size_prefixed_model() {
    let plain = tiny_model();
    let mut buf = u32::try_from(plain.len()).unwrap().to_le_bytes().to_vec();
    buf.extend_from_slice(&plain);

    let reader = Reader::size_prefixed(&buf).unwrap();
    let model = Model::decode(&reader, reader.root().unwrap()).unwrap();
    assert_eq!(model, tiny_model_value());
}

#[test]
fn unknown_enum_name_in_text_is_an_error() {
    let text = TextReader::open(r#"{ "subgraphs": [{ "tensors": [{ "type": "COMPLEX256" }] }] }"#)
        .unwrap();
    assert!(Model::decode_text(&text, text.root()).is_err());
}

#[test]
fn rendered_summary() {
    let model = Model::open(&tiny_model()).unwrap();
    assert_snapshot!(schema::render(&model).trim_end(), @r#"
    model v3 "tiny"
    op builtin=0 custom=None v1
    op builtin=32 custom=Some("TinyOp") v2
    subgraph "main" in=[0] out=[1]
      tensor "input" FLOAT32 shape=[1, 4] buffer=1
      tensor "output" INT8 shape=[1, 2] buffer=2
    buffer 0 bytes=0
    buffer 1 bytes=4
    buffer 2 bytes=0
    "#);
}
