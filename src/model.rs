//! Normalized, comparable representation of an ONNX model.
//!
//! Types in this module are produced from decoded Protocol Buffers messages by
//! [`normalize_model`](crate::normalize_model). Unlike the raw messages, every
//! field has a single canonical form: dimensions are resolved to
//! [`Dim`] values, element type codes to [`ElementType`] and attribute payloads
//! to a tagged [`AttrValue`].

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Serialize, Serializer};
use smallvec::SmallVec;

/// Size of one axis of a tensor type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum Dim {
    /// Dimension with a fixed size.
    Numeric(i64),

    /// Dimension whose size is given by a named parameter, eg. "batch".
    Symbolic(String),

    /// Dimension with neither a size nor a name.
    Unknown,
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Numeric(size) => write!(f, "{}", size),
            Dim::Symbolic(name) => write!(f, "{}", name),
            Dim::Unknown => write!(f, "?"),
        }
    }
}

/// Shape of a graph input, output or value annotation.
pub type Shape = SmallVec<[Dim; 4]>;

/// Dimensions of an initializer.
pub type Dims = SmallVec<[i64; 4]>;

/// Element type of a tensor.
///
/// Codes which are not part of the table used by ONNX at the time of writing
/// are preserved as [`ElementType::Other`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementType {
    Float,
    UInt8,
    Int8,
    UInt16,
    Int16,
    Int32,
    Int64,
    String,
    Bool,
    Float16,
    Double,
    UInt32,
    UInt64,
    Complex64,
    Complex128,
    BFloat16,
    Other(i32),
}

impl ElementType {
    /// Map an ONNX `DataType` code to an element type.
    pub fn from_code(code: i32) -> ElementType {
        match code {
            1 => ElementType::Float,
            2 => ElementType::UInt8,
            3 => ElementType::Int8,
            4 => ElementType::UInt16,
            5 => ElementType::Int16,
            6 => ElementType::Int32,
            7 => ElementType::Int64,
            8 => ElementType::String,
            9 => ElementType::Bool,
            10 => ElementType::Float16,
            11 => ElementType::Double,
            12 => ElementType::UInt32,
            13 => ElementType::UInt64,
            14 => ElementType::Complex64,
            15 => ElementType::Complex128,
            16 => ElementType::BFloat16,
            code => ElementType::Other(code),
        }
    }

    /// Return the ONNX `DataType` code for this element type.
    pub fn code(self) -> i32 {
        match self {
            ElementType::Float => 1,
            ElementType::UInt8 => 2,
            ElementType::Int8 => 3,
            ElementType::UInt16 => 4,
            ElementType::Int16 => 5,
            ElementType::Int32 => 6,
            ElementType::Int64 => 7,
            ElementType::String => 8,
            ElementType::Bool => 9,
            ElementType::Float16 => 10,
            ElementType::Double => 11,
            ElementType::UInt32 => 12,
            ElementType::UInt64 => 13,
            ElementType::Complex64 => 14,
            ElementType::Complex128 => 15,
            ElementType::BFloat16 => 16,
            ElementType::Other(code) => code,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ElementType::Float => "Float",
            ElementType::UInt8 => "UInt8",
            ElementType::Int8 => "Int8",
            ElementType::UInt16 => "UInt16",
            ElementType::Int16 => "Int16",
            ElementType::Int32 => "Int32",
            ElementType::Int64 => "Int64",
            ElementType::String => "String",
            ElementType::Bool => "Bool",
            ElementType::Float16 => "Float16",
            ElementType::Double => "Double",
            ElementType::UInt32 => "UInt32",
            ElementType::UInt64 => "UInt64",
            ElementType::Complex64 => "Complex64",
            ElementType::Complex128 => "Complex128",
            ElementType::BFloat16 => "BFloat16",
            ElementType::Other(code) => return write!(f, "Type({})", code),
        };
        f.write_str(name)
    }
}

impl Serialize for ElementType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Declared type of a graph input, output or intermediate value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ValueType {
    #[serde(rename_all = "camelCase")]
    Tensor {
        elem_type: Option<ElementType>,

        /// Shape. This is empty if the type has no shape information.
        shape: Shape,
    },

    /// Sequence of values of the `item` type.
    Sequence { item: Box<ValueType> },

    /// Missing type, or a kind of type that is not represented (maps,
    /// optionals, sparse tensors).
    Unknown,
}

impl ValueType {
    /// Return the element type of the tensor type, looking through
    /// sequences.
    pub fn elem_type(&self) -> Option<ElementType> {
        match self {
            ValueType::Tensor { elem_type, .. } => *elem_type,
            ValueType::Sequence { item } => item.elem_type(),
            ValueType::Unknown => None,
        }
    }

    /// Return the shape of the tensor type, looking through sequences.
    pub fn shape(&self) -> &[Dim] {
        match self {
            ValueType::Tensor { shape, .. } => shape.as_slice(),
            ValueType::Sequence { item } => item.shape(),
            ValueType::Unknown => &[],
        }
    }
}

/// Name and declared type of a graph input, output or intermediate value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TensorSpec {
    pub name: String,
    pub value_type: ValueType,
}

/// A named constant tensor (weights) stored in the graph.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Initializer {
    pub name: String,
    pub dims: Dims,
    pub data_type: Option<ElementType>,

    /// Size of the tensor's payload in bytes, if it could be determined.
    pub payload_len: Option<usize>,
}

/// Tensor value of an attribute, eg. the `value` of a `Constant` operator.
///
/// Unlike [`Initializer`]s, attribute tensors are compared by content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TensorValue {
    pub name: Option<String>,
    pub dims: Dims,
    pub data_type: Option<ElementType>,
    pub payload_len: Option<usize>,

    /// Canonical little-endian encoding of the tensor's elements, or the
    /// external data location entries if the data is stored externally.
    #[serde(skip)]
    pub(crate) content: Vec<u8>,
}

/// Value of an operator attribute.
///
/// The variant is chosen by the attribute's declared type.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum AttrValue {
    Float(f32),
    Int(i64),
    String(String),
    Tensor(TensorValue),
    Graph(Box<Graph>),
    Floats(Vec<f32>),
    Ints(Vec<i64>),
    Strings(Vec<String>),
    Tensors(Vec<TensorValue>),
    Graphs(Vec<Graph>),

    /// A declared type that is not represented in detail (sparse tensors,
    /// type protos). Holds the `AttributeProto.type` code.
    Unsupported(i32),

    /// The attribute has no type and no populated value.
    Unset,
}

impl AttrValue {
    /// Return the name of the value kind, eg. "int" or "floats".
    pub fn kind(&self) -> &'static str {
        match self {
            AttrValue::Float(_) => "float",
            AttrValue::Int(_) => "int",
            AttrValue::String(_) => "string",
            AttrValue::Tensor(_) => "tensor",
            AttrValue::Graph(_) => "graph",
            AttrValue::Floats(_) => "floats",
            AttrValue::Ints(_) => "ints",
            AttrValue::Strings(_) => "strings",
            AttrValue::Tensors(_) => "tensors",
            AttrValue::Graphs(_) => "graphs",
            AttrValue::Unsupported(_) => "unsupported",
            AttrValue::Unset => "unset",
        }
    }
}

/// Compare floats by bit pattern, so that a NaN attribute equals itself.
fn floats_eq(a: &[f32], b: &[f32]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_bits() == y.to_bits())
}

impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        use AttrValue::*;
        match (self, other) {
            (Float(a), Float(b)) => a.to_bits() == b.to_bits(),
            (Int(a), Int(b)) => a == b,
            (String(a), String(b)) => a == b,
            (Tensor(a), Tensor(b)) => a == b,
            (Graph(a), Graph(b)) => a == b,
            (Floats(a), Floats(b)) => floats_eq(a, b),
            (Ints(a), Ints(b)) => a == b,
            (Strings(a), Strings(b)) => a == b,
            (Tensors(a), Tensors(b)) => a == b,
            (Graphs(a), Graphs(b)) => a == b,
            (Unsupported(a), Unsupported(b)) => a == b,
            (Unset, Unset) => true,
            _ => false,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
            write!(f, "[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", item)?;
            }
            write!(f, "]")
        }

        match self {
            AttrValue::Float(x) => write!(f, "{}", x),
            AttrValue::Int(x) => write!(f, "{}", x),
            AttrValue::String(s) => write!(f, "\"{}\"", s),
            AttrValue::Tensor(t) => write!(f, "tensor {:?}", t.dims.as_slice()),
            AttrValue::Graph(g) => write!(f, "graph ({} nodes)", g.nodes.len()),
            AttrValue::Floats(xs) => list(f, xs),
            AttrValue::Ints(xs) => list(f, xs),
            AttrValue::Strings(xs) => {
                let quoted: Vec<_> = xs.iter().map(|s| format!("\"{}\"", s)).collect();
                list(f, &quoted)
            }
            AttrValue::Tensors(ts) => write!(f, "{} tensors", ts.len()),
            AttrValue::Graphs(gs) => write!(f, "{} graphs", gs.len()),
            AttrValue::Unsupported(code) => write!(f, "<attribute type {}>", code),
            AttrValue::Unset => write!(f, "N/A"),
        }
    }
}

/// A named operator parameter.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Attribute {
    pub name: String,
    pub value: AttrValue,
}

/// An operator instance in a graph.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Key used to match this node against nodes in another graph.
    ///
    /// This is the node's name if it has one, otherwise the name of its first
    /// output, otherwise `"{op_type}#{index}"` where `index` is the node's
    /// position in the graph.
    pub key: String,
    pub name: Option<String>,
    pub op_type: String,
    pub domain: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    pub attributes: Vec<Attribute>,
}

impl Node {
    /// Find an attribute by name. If there are several with the same name,
    /// the last is returned.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().rev().find(|attr| attr.name == name)
    }
}

/// Name to position maps for each entity category of a graph.
#[derive(Clone, Debug, Default, PartialEq)]
struct GraphIndex {
    inputs: FxHashMap<String, usize>,
    outputs: FxHashMap<String, usize>,
    initializers: FxHashMap<String, usize>,
    value_info: FxHashMap<String, usize>,
}

/// Build a name to position map. Later entries replace earlier ones with the
/// same name.
fn index_by_name<T>(items: &[T], name: impl Fn(&T) -> &str) -> FxHashMap<String, usize> {
    let mut map = FxHashMap::default();
    for (i, item) in items.iter().enumerate() {
        map.insert(name(item).to_string(), i);
    }
    map
}

/// A computation graph.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Graph {
    pub name: Option<String>,
    pub nodes: Vec<Node>,
    pub inputs: Vec<TensorSpec>,
    pub outputs: Vec<TensorSpec>,
    pub initializers: Vec<Initializer>,

    /// Declared types of intermediate values.
    pub value_info: Vec<TensorSpec>,

    #[serde(skip)]
    index: GraphIndex,
}

impl Graph {
    pub fn new(
        name: Option<String>,
        nodes: Vec<Node>,
        inputs: Vec<TensorSpec>,
        outputs: Vec<TensorSpec>,
        initializers: Vec<Initializer>,
        value_info: Vec<TensorSpec>,
    ) -> Graph {
        let index = GraphIndex {
            inputs: index_by_name(&inputs, |s| &s.name),
            outputs: index_by_name(&outputs, |s| &s.name),
            initializers: index_by_name(&initializers, |init| &init.name),
            value_info: index_by_name(&value_info, |s| &s.name),
        };
        Graph {
            name,
            nodes,
            inputs,
            outputs,
            initializers,
            value_info,
            index,
        }
    }

    /// Look up a graph input by name.
    pub fn input(&self, name: &str) -> Option<&TensorSpec> {
        self.index.inputs.get(name).map(|&i| &self.inputs[i])
    }

    /// Look up a graph output by name.
    pub fn output(&self, name: &str) -> Option<&TensorSpec> {
        self.index.outputs.get(name).map(|&i| &self.outputs[i])
    }

    /// Look up an initializer by name.
    pub fn initializer(&self, name: &str) -> Option<&Initializer> {
        self.index
            .initializers
            .get(name)
            .map(|&i| &self.initializers[i])
    }

    /// Look up the value annotation for an intermediate value by name.
    pub fn value_info(&self, name: &str) -> Option<&TensorSpec> {
        self.index.value_info.get(name).map(|&i| &self.value_info[i])
    }

    /// Return the shape of a value referenced by name.
    ///
    /// Graph inputs are searched first, then outputs, value annotations and
    /// finally initializers.
    pub fn shape_of(&self, name: &str) -> Option<Shape> {
        self.input(name)
            .or_else(|| self.output(name))
            .or_else(|| self.value_info(name))
            .map(|spec| spec.value_type.shape().iter().cloned().collect::<Shape>())
            .or_else(|| {
                self.initializer(name)
                    .map(|init| init.dims.iter().map(|&d| Dim::Numeric(d)).collect())
            })
    }
}

/// Model-level fields of a `ModelProto`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub ir_version: Option<i64>,
    pub producer_name: Option<String>,
    pub producer_version: Option<String>,
    pub domain: Option<String>,
    pub model_version: Option<i64>,
}

/// Entry from a model's `metadata_props`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetadataProp {
    pub key: String,
    pub value: String,
}

/// Operator set version imported by a model.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OpsetImport {
    /// Operator set domain. The empty string is the default ONNX domain.
    pub domain: String,
    pub version: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetadata {
    pub props: Vec<MetadataProp>,
    pub opset_imports: Vec<OpsetImport>,
}

/// A normalized model.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Model {
    pub info: ModelInfo,
    pub graph: Option<Graph>,
    pub metadata: ModelMetadata,
}
