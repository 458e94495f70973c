//! Conversion of decoded ONNX messages into the normalized [`Model`] form.

use onnx_diff_proto::onnx::{
    AttributeProto, AttributeType, DataLocation, Dimension, GraphProto, ModelProto, NodeProto,
    TensorProto, TypeProto, ValueInfoProto,
};
use tracing::debug;

use crate::model::{
    AttrValue, Attribute, Dim, ElementType, Graph, Initializer, MetadataProp, Model, ModelInfo,
    ModelMetadata, Node, OpsetImport, Shape, TensorSpec, TensorValue, ValueType,
};

/// Convert a decoded model into normalized form.
///
/// This never fails. Missing or malformed parts of the model are replaced
/// with sentinel values (empty names, [`Dim::Unknown`], empty shapes).
pub fn normalize_model(model: &ModelProto) -> Model {
    let info = ModelInfo {
        ir_version: model.ir_version,
        producer_name: model.producer_name.clone(),
        producer_version: model.producer_version.clone(),
        domain: model.domain.clone(),
        model_version: model.model_version,
    };

    let metadata = ModelMetadata {
        props: model
            .metadata_props
            .iter()
            .map(|entry| MetadataProp {
                key: entry.key.clone().unwrap_or_default(),
                value: entry.value.clone().unwrap_or_default(),
            })
            .collect(),
        opset_imports: model
            .opset_import
            .iter()
            .map(|opset| OpsetImport {
                domain: opset.domain.clone().unwrap_or_default(),
                version: opset.version,
            })
            .collect(),
    };

    Model {
        info,
        graph: model.graph.as_ref().map(normalize_graph),
        metadata,
    }
}

/// Convert a decoded graph into normalized form.
pub fn normalize_graph(graph: &GraphProto) -> Graph {
    Graph::new(
        graph.name.clone(),
        graph
            .node
            .iter()
            .enumerate()
            .map(|(i, node)| normalize_node(i, node))
            .collect(),
        graph.input.iter().map(normalize_value_info).collect(),
        graph.output.iter().map(normalize_value_info).collect(),
        graph.initializer.iter().map(normalize_initializer).collect(),
        graph.value_info.iter().map(normalize_value_info).collect(),
    )
}

fn normalize_dim(dim: &Dimension) -> Dim {
    match (dim.dim_value, dim.dim_param.as_deref()) {
        (Some(size), _) => Dim::Numeric(size),
        (None, Some(name)) if !name.is_empty() => Dim::Symbolic(name.to_string()),
        _ => Dim::Unknown,
    }
}

fn normalize_type(value_type: &TypeProto) -> ValueType {
    if let Some(tensor_type) = &value_type.tensor_type {
        let elem_type = tensor_type
            .elem_type
            .map(|dtype| ElementType::from_code(dtype.0));
        let shape: Shape = tensor_type
            .shape
            .as_ref()
            .map(|shape| shape.dim.iter().map(normalize_dim).collect())
            .unwrap_or_default();
        ValueType::Tensor { elem_type, shape }
    } else if let Some(sequence_type) = &value_type.sequence_type {
        let item = sequence_type
            .elem_type
            .as_ref()
            .map(normalize_type)
            .unwrap_or(ValueType::Unknown);
        ValueType::Sequence {
            item: Box::new(item),
        }
    } else {
        ValueType::Unknown
    }
}

fn normalize_value_info(value: &ValueInfoProto) -> TensorSpec {
    TensorSpec {
        name: value.name.clone().unwrap_or_default(),
        value_type: value
            .r#type
            .as_ref()
            .map(normalize_type)
            .unwrap_or(ValueType::Unknown),
    }
}

/// Return the size in bytes of a tensor's payload.
///
/// This is the length of `raw_data` if present, otherwise the size of the
/// typed data fields, otherwise the `length` recorded for externally stored
/// data.
fn payload_len(tensor: &TensorProto) -> Option<usize> {
    if let Some(raw_data) = &tensor.raw_data {
        return Some(raw_data.len());
    }

    let typed_len = tensor.float_data.len() * size_of::<f32>()
        + tensor.int32_data.len() * size_of::<i32>()
        + tensor.int64_data.len() * size_of::<i64>()
        + tensor.double_data.len() * size_of::<f64>()
        + tensor.uint64_data.len() * size_of::<u64>()
        + tensor.string_data.iter().map(|s| s.len()).sum::<usize>();
    if typed_len > 0 {
        return Some(typed_len);
    }

    if tensor.data_location == Some(DataLocation::EXTERNAL) {
        return tensor
            .external_data_entry("length")
            .and_then(|len| len.parse().ok());
    }

    None
}

fn normalize_initializer(tensor: &TensorProto) -> Initializer {
    Initializer {
        name: tensor.name.clone().unwrap_or_default(),
        dims: tensor.dims.iter().copied().collect(),
        data_type: tensor.data_type.map(|dtype| ElementType::from_code(dtype.0)),
        payload_len: payload_len(tensor),
    }
}

/// Encode the elements of a tensor in a canonical byte form, so that tensors
/// can be compared regardless of which field stores their data.
fn tensor_content(tensor: &TensorProto) -> Vec<u8> {
    if let Some(raw_data) = &tensor.raw_data {
        return raw_data.clone();
    }

    let mut content = Vec::new();
    content.extend(tensor.float_data.iter().flat_map(|x| x.to_le_bytes()));
    content.extend(tensor.int32_data.iter().flat_map(|x| x.to_le_bytes()));
    content.extend(tensor.int64_data.iter().flat_map(|x| x.to_le_bytes()));
    content.extend(tensor.double_data.iter().flat_map(|x| x.to_le_bytes()));
    content.extend(tensor.uint64_data.iter().flat_map(|x| x.to_le_bytes()));
    for s in &tensor.string_data {
        content.extend((s.len() as u64).to_le_bytes());
        content.extend(s);
    }
    for entry in &tensor.external_data {
        for part in [&entry.key, &entry.value] {
            let part = part.as_deref().unwrap_or_default();
            content.extend((part.len() as u64).to_le_bytes());
            content.extend(part.as_bytes());
        }
    }
    content
}

fn normalize_tensor_value(tensor: &TensorProto) -> TensorValue {
    TensorValue {
        name: tensor.name.clone(),
        dims: tensor.dims.iter().copied().collect(),
        data_type: tensor.data_type.map(|dtype| ElementType::from_code(dtype.0)),
        payload_len: payload_len(tensor),
        content: tensor_content(tensor),
    }
}

fn bytes_to_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Infer the type of an attribute which has no `type` field from the value
/// fields which are populated.
///
/// Lists are checked before scalars.
fn infer_attribute_type(attr: &AttributeProto) -> AttributeType {
    if !attr.ints.is_empty() {
        AttributeType::INTS
    } else if !attr.floats.is_empty() {
        AttributeType::FLOATS
    } else if !attr.strings.is_empty() {
        AttributeType::STRINGS
    } else if !attr.tensors.is_empty() {
        AttributeType::TENSORS
    } else if !attr.graphs.is_empty() {
        AttributeType::GRAPHS
    } else if attr.f.is_some() {
        AttributeType::FLOAT
    } else if attr.i.is_some() {
        AttributeType::INT
    } else if attr.s.is_some() {
        AttributeType::STRING
    } else if attr.t.is_some() {
        AttributeType::TENSOR
    } else if attr.g.is_some() {
        AttributeType::GRAPH
    } else {
        AttributeType::UNDEFINED
    }
}

/// Convert an attribute into normalized form.
///
/// The value is read from the field that corresponds to the declared type.
/// Other populated fields are ignored. A missing scalar takes the Protocol
/// Buffers default value.
fn normalize_attribute(attr: &AttributeProto) -> Attribute {
    let name = attr.name.clone().unwrap_or_default();
    let attr_type = match attr.r#type {
        Some(attr_type) if attr_type != AttributeType::UNDEFINED => attr_type,
        _ => {
            let inferred = infer_attribute_type(attr);
            debug!(
                attribute = name.as_str(),
                inferred = inferred.0,
                "attribute has no declared type"
            );
            inferred
        }
    };

    let value = match attr_type {
        AttributeType::FLOAT => AttrValue::Float(attr.f.unwrap_or_default()),
        AttributeType::INT => AttrValue::Int(attr.i.unwrap_or_default()),
        AttributeType::STRING => {
            AttrValue::String(attr.s.as_deref().map(bytes_to_string).unwrap_or_default())
        }
        AttributeType::TENSOR => AttrValue::Tensor(normalize_tensor_value(
            attr.t.as_ref().unwrap_or(&TensorProto::default()),
        )),
        AttributeType::GRAPH => AttrValue::Graph(Box::new(
            attr.g.as_ref().map(normalize_graph).unwrap_or_default(),
        )),
        AttributeType::FLOATS => AttrValue::Floats(attr.floats.clone()),
        AttributeType::INTS => AttrValue::Ints(attr.ints.clone()),
        AttributeType::STRINGS => {
            AttrValue::Strings(attr.strings.iter().map(|s| bytes_to_string(s)).collect())
        }
        AttributeType::TENSORS => {
            AttrValue::Tensors(attr.tensors.iter().map(normalize_tensor_value).collect())
        }
        AttributeType::GRAPHS => AttrValue::Graphs(attr.graphs.iter().map(normalize_graph).collect()),
        AttributeType::UNDEFINED => AttrValue::Unset,
        AttributeType(code) => AttrValue::Unsupported(code),
    };

    Attribute { name, value }
}

/// Return the key used to match a node against nodes in another graph.
fn node_key(index: usize, node: &NodeProto) -> String {
    if let Some(name) = node.name.as_deref().filter(|name| !name.is_empty()) {
        return name.to_string();
    }
    if let Some(output) = node.output.first().filter(|output| !output.is_empty()) {
        return output.clone();
    }
    format!(
        "{}#{}",
        node.op_type.as_deref().unwrap_or_default(),
        index
    )
}

fn normalize_node(index: usize, node: &NodeProto) -> Node {
    Node {
        key: node_key(index, node),
        name: node.name.clone().filter(|name| !name.is_empty()),
        op_type: node.op_type.clone().unwrap_or_default(),
        domain: node.domain.clone().unwrap_or_default(),
        inputs: node.input.clone(),
        outputs: node.output.clone(),
        attributes: node.attribute.iter().map(normalize_attribute).collect(),
    }
}
