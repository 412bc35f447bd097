//! One small model, three ways: as a binary buffer, as its text form, and
//! as the value both should decode to.

use serde_json::{Value, json};

use crate::builder::{Builder, Field};
use crate::schema::{
    Buffer, CustomQuantization, Model, OperatorCode, Quantization, QuantizationDetails, SubGraph,
    Tensor, TensorType, ValueRange,
};

fn value_range(min: f32, max: f32) -> Field {
    let mut bytes = min.to_le_bytes().to_vec();
    bytes.extend_from_slice(&max.to_le_bytes());
    Field::Inline(bytes)
}

/// Binary encoding of [`tiny_model_value`], identifier `TFL3`.
pub fn tiny_model() -> Vec<u8> {
    let mut b = Builder::with_identifier(b"TFL3");

    let description = b.string("tiny");

    let add = b.table(&[(OperatorCode::BUILTIN_CODE, Field::i8(0))]);
    let custom_code = b.string("TinyOp");
    let tiny_op = b.table(&[
        (OperatorCode::BUILTIN_CODE, Field::i8(32)),
        (OperatorCode::CUSTOM_CODE, Field::Ref(custom_code)),
        (OperatorCode::VERSION, Field::i32(2)),
    ]);
    let operator_codes = b.refs(&[add, tiny_op]);

    // Tensor "input": type left at its default.
    let input_shape = b.i32s(&[1, 4]);
    let input_name = b.string("input");
    let input = b.table(&[
        (Tensor::SHAPE, Field::Ref(input_shape)),
        (Tensor::BUFFER, Field::u32(1)),
        (Tensor::NAME, Field::Ref(input_name)),
    ]);

    // Tensor "output": every field set.
    let custom = b.u8s(&[1, 2, 3]);
    let details = b.table(&[(CustomQuantization::CUSTOM, Field::Ref(custom))]);
    let scale = b.f32s(&[0.5]);
    let zero_point = b.i64s(&[-3]);
    let quantization = b.table(&[
        (Quantization::SCALE, Field::Ref(scale)),
        (Quantization::ZERO_POINT, Field::Ref(zero_point)),
        (
            Quantization::DETAILS_TYPE,
            Field::u8(QuantizationDetails::CUSTOM_QUANTIZATION),
        ),
        (Quantization::DETAILS, Field::Ref(details)),
        (Quantization::QUANTIZED_DIMENSION, Field::i32(1)),
    ]);
    let output_shape = b.i32s(&[1, 2]);
    let output_name = b.string("output");
    let shape_signature = b.i64s(&[-1, 2]);
    let output = b.table(&[
        (Tensor::SHAPE, Field::Ref(output_shape)),
        (Tensor::TYPE, Field::u8(9)),
        (Tensor::BUFFER, Field::u32(2)),
        (Tensor::NAME, Field::Ref(output_name)),
        (Tensor::QUANTIZATION, Field::Ref(quantization)),
        (Tensor::IS_VARIABLE, Field::bool(true)),
        (Tensor::SHAPE_SIGNATURE, Field::Ref(shape_signature)),
        (Tensor::RANGE, value_range(-1.0, 1.0)),
    ]);

    let tensors = b.refs(&[input, output]);
    let inputs = b.i32s(&[0]);
    let outputs = b.i32s(&[1]);
    let graph_name = b.string("main");
    let graph = b.table(&[
        (SubGraph::TENSORS, Field::Ref(tensors)),
        (SubGraph::INPUTS, Field::Ref(inputs)),
        (SubGraph::OUTPUTS, Field::Ref(outputs)),
        (SubGraph::NAME, Field::Ref(graph_name)),
    ]);
    let subgraphs = b.refs(&[graph]);

    let empty_buffer = b.table(&[]);
    let data = b.u8s(&[1, 2, 3, 4]);
    let data_buffer = b.table(&[(Buffer::DATA, Field::Ref(data))]);
    let chunk_sizes = b.u64s(&[8, 8]);
    let external_buffer = b.table(&[
        (Buffer::OFFSET, Field::u64(64)),
        (Buffer::SIZE, Field::u64(16)),
        (Buffer::CHUNK_SIZES, Field::Ref(chunk_sizes)),
    ]);
    let buffers = b.refs(&[empty_buffer, data_buffer, external_buffer]);

    let metadata_buffer = b.i32s(&[0]);
    let signature_keys = b.strings(&["serving_default"]);
    let feature_flags = b.bools(&[true, false, true]);

    let model = b.table(&[
        (Model::VERSION, Field::u32(3)),
        (Model::DESCRIPTION, Field::Ref(description)),
        (Model::OPERATOR_CODES, Field::Ref(operator_codes)),
        (Model::SUBGRAPHS, Field::Ref(subgraphs)),
        (Model::BUFFERS, Field::Ref(buffers)),
        (Model::METADATA_BUFFER, Field::Ref(metadata_buffer)),
        (Model::SIGNATURE_KEYS, Field::Ref(signature_keys)),
        (Model::FEATURE_FLAGS, Field::Ref(feature_flags)),
    ]);
    b.finish(model)
}

/// Text encoding of [`tiny_model_value`]. Absent fields are left out or
/// written as `null`.
pub fn tiny_model_json() -> Value {
    json!({
        "version": 3,
        "description": "tiny",
        "operator_codes": [
            { "builtin_code": 0 },
            { "builtin_code": 32, "custom_code": "TinyOp", "version": 2 }
        ],
        "subgraphs": [{
            "tensors": [
                { "shape": [1, 4], "buffer": 1, "name": "input", "quantization": null },
                {
                    "shape": [1, 2],
                    "type": "INT8",
                    "buffer": 2,
                    "name": "output",
                    "quantization": {
                        "scale": [0.5],
                        "zero_point": [-3],
                        "details_type": "CustomQuantization",
                        "details": { "custom": [1, 2, 3] },
                        "quantized_dimension": 1
                    },
                    "is_variable": true,
                    "shape_signature": [-1, 2],
                    "range": { "min": -1.0, "max": 1.0 }
                }
            ],
            "inputs": [0],
            "outputs": [1],
            "name": "main"
        }],
        "buffers": [
            {},
            { "data": [1, 2, 3, 4] },
            { "offset": 64, "size": 16, "chunk_sizes": [8, 8] }
        ],
        "metadata_buffer": [0],
        "signature_keys": ["serving_default"],
        "feature_flags": [true, false, true]
    })
}

/// What [`tiny_model`] and [`tiny_model_json`] decode to.
pub fn tiny_model_value() -> Model {
    Model {
        version: 3,
        description: Some("tiny".into()),
        operator_codes: vec![
            OperatorCode::default(),
            OperatorCode {
                builtin_code: 32,
                custom_code: Some("TinyOp".into()),
                version: 2,
            },
        ],
        subgraphs: vec![SubGraph {
            tensors: vec![
                Tensor {
                    shape: vec![1, 4],
                    buffer: 1,
                    name: Some("input".into()),
                    ..Tensor::default()
                },
                Tensor {
                    shape: vec![1, 2],
                    tensor_type: TensorType::Int8,
                    buffer: 2,
                    name: Some("output".into()),
                    quantization: Some(Quantization {
                        scale: vec![0.5],
                        zero_point: vec![-3],
                        details: QuantizationDetails::Custom(CustomQuantization {
                            custom: vec![1, 2, 3],
                        }),
                        quantized_dimension: 1,
                    }),
                    is_variable: true,
                    shape_signature: vec![-1, 2],
                    range: Some(ValueRange {
                        min: -1.0,
                        max: 1.0,
                    }),
                },
            ],
            inputs: vec![0],
            outputs: vec![1],
            name: Some("main".into()),
        }],
        buffers: vec![
            Buffer::default(),
            Buffer {
                data: vec![1, 2, 3, 4],
                ..Buffer::default()
            },
            Buffer {
                offset: 64,
                size: 16,
                chunk_sizes: vec![8, 8],
                ..Buffer::default()
            },
        ],
        metadata_buffer: vec![0],
        signature_keys: vec!["serving_default".into()],
        feature_flags: vec![true, false, true],
    }
}
