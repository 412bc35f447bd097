//! A small model-file schema decoded the way generated code would do it.
//!
//! ```text
//! file_identifier "TFL3";
//!
//! table Model          { version:uint; description:string; operator_codes:[OperatorCode];
//!                        subgraphs:[SubGraph]; buffers:[Buffer]; metadata_buffer:[int];
//!                        signature_keys:[string]; feature_flags:[bool]; }
//! table OperatorCode   { builtin_code:byte; custom_code:string; version:int = 1; }
//! table SubGraph       { tensors:[Tensor]; inputs:[int]; outputs:[int]; name:string; }
//! table Tensor         { shape:[int]; type:TensorType; buffer:uint; name:string;
//!                        quantization:Quantization; is_variable:bool;
//!                        shape_signature:[long]; range:ValueRange; }
//! struct ValueRange    { min:float; max:float; }
//! table Quantization   { scale:[float]; zero_point:[long]; details:QuantizationDetails;
//!                        quantized_dimension:int; }
//! union QuantizationDetails { CustomQuantization }
//! table CustomQuantization { custom:[ubyte]; }
//! table Buffer         { data:[ubyte]; offset:ulong; size:ulong; chunk_sizes:[ulong]; }
//! ```
//!
//! Each type decodes from both encodings: `decode` from a binary buffer,
//! `decode_text` from the JSON text form, where enums and union types are
//! spelled by name.

use flatread_reader::{FlatError, Reader, slot_offset};
use flatread_text::TextReader;
use serde_json::Value;

pub const FILE_IDENTIFIER: &str = "TFL3";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Model {
    pub version: u32,
    pub description: Option<String>,
    pub operator_codes: Vec<OperatorCode>,
    pub subgraphs: Vec<SubGraph>,
    pub buffers: Vec<Buffer>,
    pub metadata_buffer: Vec<i32>,
    pub signature_keys: Vec<String>,
    pub feature_flags: Vec<bool>,
}

impl Model {
    pub const VERSION: u16 = slot_offset(0);
    pub const DESCRIPTION: u16 = slot_offset(1);
    pub const OPERATOR_CODES: u16 = slot_offset(2);
    pub const SUBGRAPHS: u16 = slot_offset(3);
    pub const BUFFERS: u16 = slot_offset(4);
    pub const METADATA_BUFFER: u16 = slot_offset(5);
    pub const SIGNATURE_KEYS: u16 = slot_offset(6);
    pub const FEATURE_FLAGS: u16 = slot_offset(7);

    /// Decode the root table of a model buffer.
    pub fn open(buf: &[u8]) -> Result<Self, FlatError> {
        let reader = Reader::new(buf);
        Self::decode(&reader, reader.root()?)
    }

    pub fn decode(reader: &Reader<'_>, position: usize) -> Result<Self, FlatError> {
        Ok(Self {
            version: reader.uint32_field(position, Self::VERSION, 0)?,
            description: reader.string_field(position, Self::DESCRIPTION, None)?,
            operator_codes: reader.table_array(
                position,
                Self::OPERATOR_CODES,
                OperatorCode::decode,
            )?,
            subgraphs: reader.table_array(position, Self::SUBGRAPHS, SubGraph::decode)?,
            buffers: reader.table_array(position, Self::BUFFERS, Buffer::decode)?,
            metadata_buffer: reader.typed_array::<i32>(position, Self::METADATA_BUFFER)?.to_vec(),
            signature_keys: reader.strings_field(position, Self::SIGNATURE_KEYS)?,
            feature_flags: reader.bools_field(position, Self::FEATURE_FLAGS)?,
        })
    }

    pub fn decode_text(reader: &TextReader, json: &Value) -> Result<Self, FlatError> {
        Ok(Self {
            version: reader.value(json.get("version"), 0)?,
            description: reader.value(json.get("description"), None)?,
            operator_codes: reader
                .object_array(json.get("operator_codes"), OperatorCode::decode_text)?,
            subgraphs: reader.object_array(json.get("subgraphs"), SubGraph::decode_text)?,
            buffers: reader.object_array(json.get("buffers"), Buffer::decode_text)?,
            metadata_buffer: reader.typed_array(json.get("metadata_buffer"))?,
            signature_keys: reader.typed_array(json.get("signature_keys"))?,
            feature_flags: reader.typed_array(json.get("feature_flags"))?,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OperatorCode {
    pub builtin_code: i8,
    pub custom_code: Option<String>,
    pub version: i32,
}

impl Default for OperatorCode {
    fn default() -> Self {
        Self {
            builtin_code: 0,
            custom_code: None,
            version: 1,
        }
    }
}

impl OperatorCode {
    pub const BUILTIN_CODE: u16 = slot_offset(0);
    pub const CUSTOM_CODE: u16 = slot_offset(1);
    pub const VERSION: u16 = slot_offset(2);

    pub fn decode(reader: &Reader<'_>, position: usize) -> Result<Self, FlatError> {
        Ok(Self {
            builtin_code: reader.int8_field(position, Self::BUILTIN_CODE, 0)?,
            custom_code: reader.string_field(position, Self::CUSTOM_CODE, None)?,
            version: reader.int32_field(position, Self::VERSION, 1)?,
        })
    }

    pub fn decode_text(reader: &TextReader, json: &Value) -> Result<Self, FlatError> {
        Ok(Self {
            builtin_code: reader.value(json.get("builtin_code"), 0)?,
            custom_code: reader.value(json.get("custom_code"), None)?,
            version: reader.value(json.get("version"), 1)?,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubGraph {
    pub tensors: Vec<Tensor>,
    pub inputs: Vec<i32>,
    pub outputs: Vec<i32>,
    pub name: Option<String>,
}

impl SubGraph {
    pub const TENSORS: u16 = slot_offset(0);
    pub const INPUTS: u16 = slot_offset(1);
    pub const OUTPUTS: u16 = slot_offset(2);
    pub const NAME: u16 = slot_offset(3);

    pub fn decode(reader: &Reader<'_>, position: usize) -> Result<Self, FlatError> {
        Ok(Self {
            tensors: reader.table_array(position, Self::TENSORS, Tensor::decode)?,
            inputs: reader.scalars_field(position, Self::INPUTS)?,
            outputs: reader.scalars_field(position, Self::OUTPUTS)?,
            name: reader.string_field(position, Self::NAME, None)?,
        })
    }

    pub fn decode_text(reader: &TextReader, json: &Value) -> Result<Self, FlatError> {
        Ok(Self {
            tensors: reader.object_array(json.get("tensors"), Tensor::decode_text)?,
            inputs: reader.typed_array(json.get("inputs"))?,
            outputs: reader.typed_array(json.get("outputs"))?,
            name: reader.value(json.get("name"), None)?,
        })
    }
}

/// Element type of a tensor. Unknown wire values are kept, not rejected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TensorType {
    #[default]
    Float32,
    Float16,
    Int32,
    Uint8,
    Int64,
    String,
    Bool,
    Int16,
    Int8,
    Unknown(u8),
}

impl TensorType {
    pub fn from_wire(value: u8) -> Self {
        match value {
            0 => Self::Float32,
            1 => Self::Float16,
            2 => Self::Int32,
            3 => Self::Uint8,
            4 => Self::Int64,
            5 => Self::String,
            6 => Self::Bool,
            7 => Self::Int16,
            9 => Self::Int8,
            other => Self::Unknown(other),
        }
    }

    pub fn from_name(name: &str) -> Result<Self, FlatError> {
        Ok(match name {
            "FLOAT32" => Self::Float32,
            "FLOAT16" => Self::Float16,
            "INT32" => Self::Int32,
            "UINT8" => Self::Uint8,
            "INT64" => Self::Int64,
            "STRING" => Self::String,
            "BOOL" => Self::Bool,
            "INT16" => Self::Int16,
            "INT8" => Self::Int8,
            other => {
                return Err(FlatError::InvalidValue(format!("unknown TensorType {other}")));
            }
        })
    }

    pub fn name(self) -> String {
        match self {
            Self::Float32 => "FLOAT32".into(),
            Self::Float16 => "FLOAT16".into(),
            Self::Int32 => "INT32".into(),
            Self::Uint8 => "UINT8".into(),
            Self::Int64 => "INT64".into(),
            Self::String => "STRING".into(),
            Self::Bool => "BOOL".into(),
            Self::Int16 => "INT16".into(),
            Self::Int8 => "INT8".into(),
            Self::Unknown(v) => format!("UNKNOWN({v})"),
        }
    }
}

/// Inline `struct ValueRange { min: float; max: float; }`, 8 bytes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    pub fn decode(reader: &Reader<'_>, position: usize) -> Result<Self, FlatError> {
        Ok(Self {
            min: reader.float32(position)?,
            max: reader.float32(position + 4)?,
        })
    }

    pub fn decode_text(reader: &TextReader, json: &Value) -> Result<Self, FlatError> {
        Ok(Self {
            min: reader.value(json.get("min"), 0.0)?,
            max: reader.value(json.get("max"), 0.0)?,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tensor {
    pub shape: Vec<i32>,
    pub tensor_type: TensorType,
    pub buffer: u32,
    pub name: Option<String>,
    pub quantization: Option<Quantization>,
    pub is_variable: bool,
    pub shape_signature: Vec<i64>,
    pub range: Option<ValueRange>,
}

impl Tensor {
    pub const SHAPE: u16 = slot_offset(0);
    pub const TYPE: u16 = slot_offset(1);
    pub const BUFFER: u16 = slot_offset(2);
    pub const NAME: u16 = slot_offset(3);
    pub const QUANTIZATION: u16 = slot_offset(4);
    pub const IS_VARIABLE: u16 = slot_offset(5);
    pub const SHAPE_SIGNATURE: u16 = slot_offset(6);
    pub const RANGE: u16 = slot_offset(7);

    pub fn decode(reader: &Reader<'_>, position: usize) -> Result<Self, FlatError> {
        Ok(Self {
            shape: reader.typed_array::<i32>(position, Self::SHAPE)?.to_vec(),
            tensor_type: TensorType::from_wire(reader.uint8_field(position, Self::TYPE, 0)?),
            buffer: reader.uint32_field(position, Self::BUFFER, 0)?,
            name: reader.string_field(position, Self::NAME, None)?,
            quantization: reader.table(position, Self::QUANTIZATION, Quantization::decode)?,
            is_variable: reader.bool_field(position, Self::IS_VARIABLE, false)?,
            shape_signature: reader.int64s_field(position, Self::SHAPE_SIGNATURE)?,
            range: reader.struct_field(position, Self::RANGE, ValueRange::decode)?,
        })
    }

    pub fn decode_text(reader: &TextReader, json: &Value) -> Result<Self, FlatError> {
        let type_name: String = reader.value(json.get("type"), "FLOAT32".to_owned())?;
        Ok(Self {
            shape: reader.typed_array(json.get("shape"))?,
            tensor_type: TensorType::from_name(&type_name)?,
            buffer: reader.value(json.get("buffer"), 0)?,
            name: reader.value(json.get("name"), None)?,
            quantization: reader.object(json.get("quantization"), Quantization::decode_text)?,
            is_variable: reader.value(json.get("is_variable"), false)?,
            shape_signature: reader.typed_array(json.get("shape_signature"))?,
            range: reader.object(json.get("range"), ValueRange::decode_text)?,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Quantization {
    pub scale: Vec<f32>,
    pub zero_point: Vec<i64>,
    pub details: QuantizationDetails,
    pub quantized_dimension: i32,
}

impl Quantization {
    pub const SCALE: u16 = slot_offset(0);
    pub const ZERO_POINT: u16 = slot_offset(1);
    pub const DETAILS_TYPE: u16 = slot_offset(2);
    pub const DETAILS: u16 = slot_offset(3);
    pub const QUANTIZED_DIMENSION: u16 = slot_offset(4);

    pub fn decode(reader: &Reader<'_>, position: usize) -> Result<Self, FlatError> {
        Ok(Self {
            scale: reader.typed_array::<f32>(position, Self::SCALE)?.to_vec(),
            zero_point: reader.int64s_field(position, Self::ZERO_POINT)?,
            details: reader
                .union(position, Self::DETAILS_TYPE, QuantizationDetails::decode)?
                .unwrap_or_default(),
            quantized_dimension: reader.int32_field(position, Self::QUANTIZED_DIMENSION, 0)?,
        })
    }

    pub fn decode_text(reader: &TextReader, json: &Value) -> Result<Self, FlatError> {
        let details_type: String = reader.value(json.get("details_type"), "NONE".to_owned())?;
        Ok(Self {
            scale: reader.typed_array(json.get("scale"))?,
            zero_point: reader.typed_array(json.get("zero_point"))?,
            details: QuantizationDetails::decode_text(reader, json.get("details"), &details_type)?,
            quantized_dimension: reader.value(json.get("quantized_dimension"), 0)?,
        })
    }
}

/// `union QuantizationDetails { CustomQuantization }`.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum QuantizationDetails {
    #[default]
    None,
    Custom(CustomQuantization),
    Unknown(u8),
}

impl QuantizationDetails {
    pub const CUSTOM_QUANTIZATION: u8 = 1;

    pub fn decode(reader: &Reader<'_>, position: usize, tag: u8) -> Result<Self, FlatError> {
        Ok(match tag {
            0 => Self::None,
            Self::CUSTOM_QUANTIZATION => {
                Self::Custom(CustomQuantization::decode(reader, position)?)
            }
            other => Self::Unknown(other),
        })
    }

    pub fn decode_text(
        reader: &TextReader,
        json: Option<&Value>,
        type_name: &str,
    ) -> Result<Self, FlatError> {
        match type_name {
            "NONE" => Ok(Self::None),
            "CustomQuantization" => Ok(reader
                .object(json, CustomQuantization::decode_text)?
                .map_or(Self::None, Self::Custom)),
            other => Err(FlatError::InvalidValue(format!(
                "unknown QuantizationDetails {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CustomQuantization {
    pub custom: Vec<u8>,
}

impl CustomQuantization {
    pub const CUSTOM: u16 = slot_offset(0);

    pub fn decode(reader: &Reader<'_>, position: usize) -> Result<Self, FlatError> {
        Ok(Self {
            custom: reader.typed_array::<u8>(position, Self::CUSTOM)?.to_vec(),
        })
    }

    pub fn decode_text(reader: &TextReader, json: &Value) -> Result<Self, FlatError> {
        Ok(Self {
            custom: reader.typed_array(json.get("custom"))?,
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Buffer {
    pub data: Vec<u8>,
    pub offset: u64,
    pub size: u64,
    pub chunk_sizes: Vec<u64>,
}

impl Buffer {
    pub const DATA: u16 = slot_offset(0);
    pub const OFFSET: u16 = slot_offset(1);
    pub const SIZE: u16 = slot_offset(2);
    pub const CHUNK_SIZES: u16 = slot_offset(3);

    pub fn decode(reader: &Reader<'_>, position: usize) -> Result<Self, FlatError> {
        Ok(Self {
            data: reader.typed_array::<u8>(position, Self::DATA)?.to_vec(),
            offset: reader.uint64_field(position, Self::OFFSET, 0)?,
            size: reader.uint64_field(position, Self::SIZE, 0)?,
            chunk_sizes: reader.uint64s_field(position, Self::CHUNK_SIZES)?,
        })
    }

    pub fn decode_text(reader: &TextReader, json: &Value) -> Result<Self, FlatError> {
        Ok(Self {
            data: reader.typed_array(json.get("data"))?,
            offset: reader.value(json.get("offset"), 0)?,
            size: reader.value(json.get("size"), 0)?,
            chunk_sizes: reader.typed_array(json.get("chunk_sizes"))?,
        })
    }
}

/// One line per interesting fact, for snapshot tests.
pub fn render(model: &Model) -> String {
    use std::fmt::Write as _;

    let mut out = String::new();
    let _ = writeln!(
        out,
        "model v{} {:?}",
        model.version,
        model.description.as_deref().unwrap_or("")
    );
    for op in &model.operator_codes {
        let _ = writeln!(
            out,
            "op builtin={} custom={:?} v{}",
            op.builtin_code, op.custom_code, op.version
        );
    }
    for graph in &model.subgraphs {
        let _ = writeln!(
            out,
            "subgraph {:?} in={:?} out={:?}",
            graph.name.as_deref().unwrap_or(""),
            graph.inputs,
            graph.outputs
        );
        for tensor in &graph.tensors {
            let _ = writeln!(
                out,
                "  tensor {:?} {} shape={:?} buffer={}",
                tensor.name.as_deref().unwrap_or(""),
                tensor.tensor_type.name(),
                tensor.shape,
                tensor.buffer
            );
        }
    }
    for (i, buffer) in model.buffers.iter().enumerate() {
        let _ = writeln!(out, "buffer {i} bytes={}", buffer.data.len());
    }
    out
}
