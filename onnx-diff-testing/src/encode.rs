//! Protocol Buffers encoder for ONNX messages.
//!
//! This covers the same fields as the decoder in `onnx-diff-proto`, so that
//! fixtures survive an encode/decode round trip.

use onnx_diff_proto::onnx::{
    AttributeProto, Dimension, GraphProto, ModelProto, NodeProto, OperatorSetIdProto,
    StringStringEntryProto, TensorProto, TensorShapeProto, TypeProto, TypeProtoSequence,
    TypeProtoTensor, ValueInfoProto,
};
use onnx_diff_proto::protobuf::varint::encode_varint;

const WIRE_VARINT: u64 = 0;
const WIRE_LEN: u64 = 2;
const WIRE_I32: u64 = 5;

#[derive(Default)]
struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn tag(&mut self, number: u64, wire_type: u64) {
        self.buf.extend(encode_varint((number << 3) | wire_type));
    }

    fn varint(&mut self, number: u64, value: Option<u64>) {
        if let Some(value) = value {
            self.tag(number, WIRE_VARINT);
            self.buf.extend(encode_varint(value));
        }
    }

    fn int64(&mut self, number: u64, value: Option<i64>) {
        self.varint(number, value.map(|v| v as u64));
    }

    fn enumeration(&mut self, number: u64, value: Option<i32>) {
        // Negative values are sign-extended to 64 bits.
        self.varint(number, value.map(|v| v as i64 as u64));
    }

    fn float(&mut self, number: u64, value: Option<f32>) {
        if let Some(value) = value {
            self.tag(number, WIRE_I32);
            self.buf.extend(value.to_le_bytes());
        }
    }

    fn bytes(&mut self, number: u64, data: &[u8]) {
        self.tag(number, WIRE_LEN);
        self.buf.extend(encode_varint(data.len() as u64));
        self.buf.extend(data);
    }

    fn string(&mut self, number: u64, value: Option<&str>) {
        if let Some(value) = value {
            self.bytes(number, value.as_bytes());
        }
    }

    fn message<M: EncodeMessage>(&mut self, number: u64, msg: &M) {
        let mut inner = Writer::default();
        msg.encode_fields(&mut inner);
        self.bytes(number, &inner.buf);
    }

    fn messages<M: EncodeMessage>(&mut self, number: u64, msgs: &[M]) {
        for msg in msgs {
            self.message(number, msg);
        }
    }

    fn packed(&mut self, number: u64, data: Vec<u8>) {
        if !data.is_empty() {
            self.bytes(number, &data);
        }
    }

    fn packed_int64(&mut self, number: u64, values: &[i64]) {
        self.packed(
            number,
            values.iter().flat_map(|&v| encode_varint(v as u64)).collect(),
        );
    }

    fn packed_int32(&mut self, number: u64, values: &[i32]) {
        self.packed(
            number,
            values
                .iter()
                .flat_map(|&v| encode_varint(v as i64 as u64))
                .collect(),
        );
    }

    fn packed_uint64(&mut self, number: u64, values: &[u64]) {
        self.packed(number, values.iter().flat_map(|&v| encode_varint(v)).collect());
    }

    fn packed_float(&mut self, number: u64, values: &[f32]) {
        self.packed(number, values.iter().flat_map(|v| v.to_le_bytes()).collect());
    }

    fn packed_double(&mut self, number: u64, values: &[f64]) {
        self.packed(number, values.iter().flat_map(|v| v.to_le_bytes()).collect());
    }

    fn repeated_bytes(&mut self, number: u64, values: &[Vec<u8>]) {
        for value in values {
            self.bytes(number, value);
        }
    }

    fn repeated_string(&mut self, number: u64, values: &[String]) {
        for value in values {
            self.bytes(number, value.as_bytes());
        }
    }
}

trait EncodeMessage {
    fn encode_fields(&self, w: &mut Writer);
}

impl EncodeMessage for AttributeProto {
    fn encode_fields(&self, w: &mut Writer) {
        w.string(1, self.name.as_deref());
        w.float(2, self.f);
        w.int64(3, self.i);
        if let Some(s) = &self.s {
            w.bytes(4, s);
        }
        if let Some(t) = &self.t {
            w.message(5, t);
        }
        if let Some(g) = &self.g {
            w.message(6, g);
        }
        w.packed_float(7, &self.floats);
        w.packed_int64(8, &self.ints);
        w.repeated_bytes(9, &self.strings);
        w.messages(10, &self.tensors);
        w.messages(11, &self.graphs);
        w.enumeration(20, self.r#type.map(|t| t.0));
    }
}

impl EncodeMessage for NodeProto {
    fn encode_fields(&self, w: &mut Writer) {
        w.repeated_string(1, &self.input);
        w.repeated_string(2, &self.output);
        w.string(3, self.name.as_deref());
        w.string(4, self.op_type.as_deref());
        w.messages(5, &self.attribute);
        w.string(7, self.domain.as_deref());
    }
}

impl EncodeMessage for TensorProto {
    fn encode_fields(&self, w: &mut Writer) {
        w.packed_int64(1, &self.dims);
        w.enumeration(2, self.data_type.map(|t| t.0));
        w.packed_float(4, &self.float_data);
        w.packed_int32(5, &self.int32_data);
        w.repeated_bytes(6, &self.string_data);
        w.packed_int64(7, &self.int64_data);
        w.string(8, self.name.as_deref());
        if let Some(raw_data) = &self.raw_data {
            w.bytes(9, raw_data);
        }
        w.packed_double(10, &self.double_data);
        w.packed_uint64(11, &self.uint64_data);
        w.messages(13, &self.external_data);
        w.enumeration(14, self.data_location.map(|l| l.0));
    }
}

impl EncodeMessage for Dimension {
    fn encode_fields(&self, w: &mut Writer) {
        w.int64(1, self.dim_value);
        w.string(2, self.dim_param.as_deref());
    }
}

impl EncodeMessage for StringStringEntryProto {
    fn encode_fields(&self, w: &mut Writer) {
        w.string(1, self.key.as_deref());
        w.string(2, self.value.as_deref());
    }
}

impl EncodeMessage for TensorShapeProto {
    fn encode_fields(&self, w: &mut Writer) {
        w.messages(1, &self.dim);
    }
}

impl EncodeMessage for TypeProtoTensor {
    fn encode_fields(&self, w: &mut Writer) {
        w.enumeration(1, self.elem_type.map(|t| t.0));
        if let Some(shape) = &self.shape {
            w.message(2, shape);
        }
    }
}

impl EncodeMessage for TypeProtoSequence {
    fn encode_fields(&self, w: &mut Writer) {
        if let Some(elem_type) = &self.elem_type {
            w.message(1, elem_type);
        }
    }
}

impl EncodeMessage for TypeProto {
    fn encode_fields(&self, w: &mut Writer) {
        if let Some(tensor_type) = &self.tensor_type {
            w.message(1, tensor_type);
        }
        if let Some(sequence_type) = &self.sequence_type {
            w.message(4, sequence_type.as_ref());
        }
    }
}

impl EncodeMessage for ValueInfoProto {
    fn encode_fields(&self, w: &mut Writer) {
        w.string(1, self.name.as_deref());
        if let Some(value_type) = &self.r#type {
            w.message(2, value_type);
        }
    }
}

impl EncodeMessage for GraphProto {
    fn encode_fields(&self, w: &mut Writer) {
        w.messages(1, &self.node);
        w.string(2, self.name.as_deref());
        w.messages(5, &self.initializer);
        w.messages(11, &self.input);
        w.messages(12, &self.output);
        w.messages(13, &self.value_info);
    }
}

impl EncodeMessage for OperatorSetIdProto {
    fn encode_fields(&self, w: &mut Writer) {
        w.string(1, self.domain.as_deref());
        w.int64(2, self.version);
    }
}

impl EncodeMessage for ModelProto {
    fn encode_fields(&self, w: &mut Writer) {
        w.int64(1, self.ir_version);
        w.string(2, self.producer_name.as_deref());
        w.string(3, self.producer_version.as_deref());
        w.string(4, self.domain.as_deref());
        w.int64(5, self.model_version);
        w.string(6, self.doc_string.as_deref());
        if let Some(graph) = &self.graph {
            w.message(7, graph);
        }
        w.messages(8, &self.opset_import);
        w.messages(14, &self.metadata_props);
    }
}

/// Encode a model in Protocol Buffers binary format.
pub fn encode_model(model: &ModelProto) -> Vec<u8> {
    let mut writer = Writer::default();
    model.encode_fields(&mut writer);
    writer.buf
}
