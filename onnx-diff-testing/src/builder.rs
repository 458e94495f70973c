use onnx_diff_proto::onnx::{
    DataType, Dimension, GraphProto, ModelProto, NodeProto, OperatorSetIdProto,
    StringStringEntryProto, TensorProto, TensorShapeProto, TypeProto, TypeProtoSequence,
    TypeProtoTensor, ValueInfoProto,
};

use crate::encode::encode_model;

/// Create a dimension with a fixed size.
pub fn dim_value(size: i64) -> Dimension {
    Dimension {
        dim_value: Some(size),
        dim_param: None,
    }
}

/// Create a dimension with a symbolic name.
pub fn dim_param(name: &str) -> Dimension {
    Dimension {
        dim_value: None,
        dim_param: Some(name.to_string()),
    }
}

/// Create a value info with a tensor type.
pub fn value_info(name: &str, elem_type: DataType, dims: Vec<Dimension>) -> ValueInfoProto {
    ValueInfoProto {
        name: Some(name.to_string()),
        r#type: Some(TypeProto {
            tensor_type: Some(TypeProtoTensor {
                elem_type: Some(elem_type),
                shape: Some(TensorShapeProto { dim: dims }),
            }),
            sequence_type: None,
        }),
    }
}

/// Create a value info whose type is a sequence of tensors.
pub fn sequence_value_info(
    name: &str,
    elem_type: DataType,
    dims: Vec<Dimension>,
) -> ValueInfoProto {
    let item = value_info(name, elem_type, dims).r#type;
    ValueInfoProto {
        name: Some(name.to_string()),
        r#type: Some(TypeProto {
            tensor_type: None,
            sequence_type: Some(Box::new(TypeProtoSequence { elem_type: item })),
        }),
    }
}

/// Create an initializer whose `raw_data` is `payload_len` zero bytes.
pub fn initializer(name: &str, data_type: DataType, dims: &[i64], payload_len: usize) -> TensorProto {
    TensorProto {
        name: Some(name.to_string()),
        dims: dims.to_vec(),
        data_type: Some(data_type),
        raw_data: Some(vec![0; payload_len]),
        ..Default::default()
    }
}

/// Constructors for node attributes.
pub mod attr {
    use onnx_diff_proto::onnx::{AttributeProto, AttributeType, GraphProto, TensorProto};

    fn named(name: &str, attr_type: AttributeType) -> AttributeProto {
        AttributeProto {
            name: Some(name.to_string()),
            r#type: Some(attr_type),
            ..Default::default()
        }
    }

    pub fn float(name: &str, value: f32) -> AttributeProto {
        AttributeProto {
            f: Some(value),
            ..named(name, AttributeType::FLOAT)
        }
    }

    pub fn int(name: &str, value: i64) -> AttributeProto {
        AttributeProto {
            i: Some(value),
            ..named(name, AttributeType::INT)
        }
    }

    pub fn string(name: &str, value: &str) -> AttributeProto {
        AttributeProto {
            s: Some(value.as_bytes().to_vec()),
            ..named(name, AttributeType::STRING)
        }
    }

    pub fn tensor(name: &str, value: TensorProto) -> AttributeProto {
        AttributeProto {
            t: Some(value),
            ..named(name, AttributeType::TENSOR)
        }
    }

    pub fn graph(name: &str, value: GraphProto) -> AttributeProto {
        AttributeProto {
            g: Some(value),
            ..named(name, AttributeType::GRAPH)
        }
    }

    pub fn floats(name: &str, values: &[f32]) -> AttributeProto {
        AttributeProto {
            floats: values.to_vec(),
            ..named(name, AttributeType::FLOATS)
        }
    }

    pub fn ints(name: &str, values: &[i64]) -> AttributeProto {
        AttributeProto {
            ints: values.to_vec(),
            ..named(name, AttributeType::INTS)
        }
    }

    pub fn strings(name: &str, values: &[&str]) -> AttributeProto {
        AttributeProto {
            strings: values.iter().map(|s| s.as_bytes().to_vec()).collect(),
            ..named(name, AttributeType::STRINGS)
        }
    }
}

/// Builder for a graph node.
#[derive(Clone, Debug)]
pub struct NodeBuilder {
    node: NodeProto,
}

impl NodeBuilder {
    pub fn new(op_type: &str) -> NodeBuilder {
        NodeBuilder {
            node: NodeProto {
                op_type: Some(op_type.to_string()),
                ..Default::default()
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.node.name = Some(name.to_string());
        self
    }

    pub fn domain(mut self, domain: &str) -> Self {
        self.node.domain = Some(domain.to_string());
        self
    }

    pub fn inputs(mut self, inputs: &[&str]) -> Self {
        self.node.input = inputs.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn outputs(mut self, outputs: &[&str]) -> Self {
        self.node.output = outputs.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn attr(mut self, attr: onnx_diff_proto::onnx::AttributeProto) -> Self {
        self.node.attribute.push(attr);
        self
    }

    pub fn build(self) -> NodeProto {
        self.node
    }
}

/// Builder for `ModelProto` fixtures.
///
/// A new builder has IR version 8 and an empty graph named "main".
#[derive(Clone, Debug)]
pub struct ModelBuilder {
    model: ModelProto,
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelBuilder {
    pub fn new() -> ModelBuilder {
        ModelBuilder {
            model: ModelProto {
                ir_version: Some(8),
                graph: Some(GraphProto {
                    name: Some("main".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            },
        }
    }

    fn graph_mut(&mut self) -> &mut GraphProto {
        self.model.graph.get_or_insert_with(GraphProto::default)
    }

    pub fn ir_version(mut self, version: i64) -> Self {
        self.model.ir_version = Some(version);
        self
    }

    pub fn producer(mut self, name: &str, version: &str) -> Self {
        self.model.producer_name = Some(name.to_string());
        self.model.producer_version = Some(version.to_string());
        self
    }

    pub fn domain(mut self, domain: &str) -> Self {
        self.model.domain = Some(domain.to_string());
        self
    }

    pub fn model_version(mut self, version: i64) -> Self {
        self.model.model_version = Some(version);
        self
    }

    pub fn opset(mut self, domain: &str, version: i64) -> Self {
        self.model.opset_import.push(OperatorSetIdProto {
            domain: Some(domain.to_string()),
            version: Some(version),
        });
        self
    }

    pub fn metadata_prop(mut self, key: &str, value: &str) -> Self {
        self.model.metadata_props.push(StringStringEntryProto {
            key: Some(key.to_string()),
            value: Some(value.to_string()),
        });
        self
    }

    pub fn input(mut self, name: &str, elem_type: DataType, dims: Vec<Dimension>) -> Self {
        self.graph_mut()
            .input
            .push(value_info(name, elem_type, dims));
        self
    }

    /// Add a graph input with an arbitrary type.
    pub fn input_info(mut self, value: ValueInfoProto) -> Self {
        self.graph_mut().input.push(value);
        self
    }

    pub fn output(mut self, name: &str, elem_type: DataType, dims: Vec<Dimension>) -> Self {
        self.graph_mut()
            .output
            .push(value_info(name, elem_type, dims));
        self
    }

    pub fn value_info(mut self, name: &str, elem_type: DataType, dims: Vec<Dimension>) -> Self {
        self.graph_mut()
            .value_info
            .push(value_info(name, elem_type, dims));
        self
    }

    /// Add an initializer, replacing any existing one with the same name.
    pub fn initializer(mut self, tensor: TensorProto) -> Self {
        let initializers = &mut self.graph_mut().initializer;
        match initializers.iter_mut().find(|t| t.name == tensor.name) {
            Some(existing) => *existing = tensor,
            None => initializers.push(tensor),
        }
        self
    }

    pub fn node(self, node: NodeBuilder) -> Self {
        self.node_proto(node.build())
    }

    pub fn node_proto(mut self, node: NodeProto) -> Self {
        self.graph_mut().node.push(node);
        self
    }

    /// Replace the node which has the same name as `node`.
    ///
    /// Panics if there is no such node.
    pub fn replace_node(mut self, node: NodeBuilder) -> Self {
        let node = node.build();
        let existing = self
            .graph_mut()
            .node
            .iter_mut()
            .find(|n| n.name.is_some() && n.name == node.name)
            .expect("no node with matching name");
        *existing = node;
        self
    }

    pub fn remove_node(mut self, name: &str) -> Self {
        self.graph_mut()
            .node
            .retain(|n| n.name.as_deref() != Some(name));
        self
    }

    /// Change the name of a node.
    ///
    /// Panics if there is no node called `old_name`.
    pub fn rename_node(mut self, old_name: &str, new_name: &str) -> Self {
        let node = self
            .graph_mut()
            .node
            .iter_mut()
            .find(|n| n.name.as_deref() == Some(old_name))
            .expect("no node with matching name");
        node.name = Some(new_name.to_string());
        self
    }

    pub fn without_graph(mut self) -> Self {
        self.model.graph = None;
        self
    }

    pub fn build(self) -> ModelProto {
        self.model
    }

    /// Build the model and encode it in Protocol Buffers format.
    pub fn encode(self) -> Vec<u8> {
        encode_model(&self.model)
    }
}
