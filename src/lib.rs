//! onnx-diff compares the structure of two [ONNX](https://onnx.ai) models.
//!
//! # Comparing models
//!
//! The basic workflow is:
//!
//! 1. Load both models using [`load_model_file`] or [`decode_model`].
//! 2. Call [`compare`] to normalize the models and compute the differences.
//! 3. Inspect the resulting [`ModelDiff`], serialize it (all result types
//!    implement `serde::Serialize`) or render it as text.
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use onnx_diff::{compare, load_model_file};
//!
//! let model1 = load_model_file("model-v1.onnx")?;
//! let model2 = load_model_file("model-v2.onnx")?;
//! let comparison = compare(&model1, &model2);
//!
//! if let Some(graph) = comparison.diff.graphs.diff() {
//!     for node in graph.nodes.changes() {
//!         println!("node {} changed", node.key);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # What is compared
//!
//! - Model-level fields: IR version, producer name and version, domain and
//!   model version.
//! - The main graph's nodes, inputs, outputs and initializers. Entities are
//!   matched by name. Nodes without a name are matched by their first output.
//! - Metadata properties and operator set imports.
//!
//! Comparison is structural. Initializer data is not compared element-wise,
//! only by size, and changes inside subgraphs (eg. the branches of an `If`
//! operator) are reported as a change of the attribute which holds the
//! subgraph. Renaming a node is reported as a removal plus an addition.
//!
//! # Normalized models
//!
//! Before comparison, decoded models are converted into a normalized
//! [`Model`] by [`normalize_model`]. This resolves dimensions into [`Dim`]
//! values, element type codes into [`ElementType`] and attributes into
//! [`AttrValue`]s. Normalized graphs provide name lookups, such as
//! [`Graph::shape_of`], which are useful when presenting a diff.

mod compare;
mod diff;
mod load;
mod matcher;
mod model;
mod normalize;

pub use compare::{
    compare_attribute, compare_attributes, compare_graphs, compare_initializer, compare_io,
    compare_metadata, compare_model_info, compare_models, compare_node, compare_sequences,
};
pub use diff::{
    AttributeChange, CategoryDiff, DuplicateKey, EntityDiff, EntryStatus, FieldDiff, GraphComparison,
    GraphDiff, IndexDiff, InitializerDiff, InitializersDiff, IoDiff, IosDiff, MetadataDiff,
    MissingGraph, ModelDiff, ModelInfoDiff, NodeDiff, NodesDiff, SequenceDiff, Side, StatusCounts,
};
pub use load::{LoadError, LoadErrorKind, decode_model, load_model_file};
pub use matcher::match_entities;
pub use model::{
    AttrValue, Attribute, Dim, Dims, ElementType, Graph, Initializer, MetadataProp, Model,
    ModelInfo, ModelMetadata, Node, OpsetImport, Shape, TensorSpec, TensorValue, ValueType,
};
pub use normalize::{normalize_graph, normalize_model};

use onnx_diff_proto::onnx::ModelProto;

/// Result of [`compare`].
///
/// This holds the normalized models alongside the diff, so that entities
/// referenced by name in the diff can be resolved, eg. to look up the shape
/// of a node's inputs.
#[derive(Clone, Debug)]
pub struct Comparison {
    pub model1: Model,
    pub model2: Model,
    pub diff: ModelDiff,
}

/// Normalize two decoded models and compare them.
pub fn compare(model1: &ModelProto, model2: &ModelProto) -> Comparison {
    let model1 = normalize_model(model1);
    let model2 = normalize_model(model2);
    let diff = compare_models(&model1, &model2);
    Comparison {
        model1,
        model2,
        diff,
    }
}
