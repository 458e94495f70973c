//! Types describing the differences between two models.
//!
//! A [`ModelDiff`] is a tree of per-category results. It is plain data: it
//! can be inspected programmatically, serialized to JSON with field names in
//! camelCase, or rendered as text.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::model::{
    AttrValue, Attribute, ElementType, Initializer, MetadataProp, Node, OpsetImport, Shape,
    TensorSpec, ValueType,
};

/// Identifies one of the two models being compared.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Side {
    Model1,
    Model2,
}

/// Comparison of a single field between the two models.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDiff<T> {
    pub model1: T,
    pub model2: T,
    pub is_different: bool,
}

impl<T: PartialEq> FieldDiff<T> {
    pub fn new(model1: T, model2: T) -> Self {
        let is_different = model1 != model2;
        FieldDiff {
            model1,
            model2,
            is_different,
        }
    }
}

/// Difference at one position of two sequences.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct IndexDiff {
    pub index: usize,

    /// Element of the first sequence, or `None` if it is shorter.
    pub model1: Option<String>,

    /// Element of the second sequence, or `None` if it is shorter.
    pub model2: Option<String>,
}

/// Positional comparison of two sequences, eg. the inputs of two nodes.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceDiff {
    pub is_different: bool,

    /// Differing positions in ascending order.
    pub details: Vec<IndexDiff>,
}

/// Outcome of matching an entity by key.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", content = "details", rename_all = "lowercase")]
pub enum EntryStatus<T, D> {
    /// Key present only in the second model.
    Added(T),

    /// Key present only in the first model.
    Removed(T),

    /// Key present in both models, with differences.
    Modified(D),

    /// Key present in both models, without differences.
    Unchanged,
}

/// Result of comparing the entities with a given key.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EntityDiff<T, D> {
    pub key: String,

    #[serde(flatten)]
    pub status: EntryStatus<T, D>,
}

/// A key which appeared more than once in one model's collection.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DuplicateKey {
    pub side: Side,
    pub key: String,
}

/// Tallies of entry statuses in a [`CategoryDiff`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub added: usize,
    pub removed: usize,
    pub modified: usize,
    pub unchanged: usize,
}

/// Comparison of one entity category, eg. nodes or initializers.
///
/// Entries are ordered by the first appearance of their key in model 1,
/// followed by keys only present in model 2 in their order of appearance.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDiff<T, D> {
    /// Number of items in the first model, including duplicates.
    pub model1_count: usize,

    /// Number of items in the second model, including duplicates.
    pub model2_count: usize,

    pub entries: Vec<EntityDiff<T, D>>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub duplicates: Vec<DuplicateKey>,
}

impl<T, D> CategoryDiff<T, D> {
    /// Find the entry for a key.
    pub fn get(&self, key: &str) -> Option<&EntryStatus<T, D>> {
        self.entries
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| &entry.status)
    }

    /// Iterate over entries which are not [`EntryStatus::Unchanged`].
    pub fn changes(&self) -> impl Iterator<Item = &EntityDiff<T, D>> {
        self.entries
            .iter()
            .filter(|entry| !matches!(entry.status, EntryStatus::Unchanged))
    }

    pub fn has_changes(&self) -> bool {
        self.changes().next().is_some()
    }

    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for entry in &self.entries {
            match entry.status {
                EntryStatus::Added(_) => counts.added += 1,
                EntryStatus::Removed(_) => counts.removed += 1,
                EntryStatus::Modified(_) => counts.modified += 1,
                EntryStatus::Unchanged => counts.unchanged += 1,
            }
        }
        counts
    }
}

/// Differences between two attributes with the same name.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeChange {
    pub model1: AttrValue,
    pub model2: AttrValue,

    /// True if the attributes have different value kinds, eg. "int" vs "ints".
    pub kind_changed: bool,
}

/// Differences between two nodes with the same key.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDiff {
    pub op_type: FieldDiff<String>,
    pub inputs: SequenceDiff,
    pub outputs: SequenceDiff,
    pub attributes: CategoryDiff<Attribute, AttributeChange>,
}

/// Differences between two graph inputs or outputs with the same name.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IoDiff {
    /// Complete type descriptors. The values differ if these differ.
    pub value_type: FieldDiff<ValueType>,

    /// Element types of the tensor types, looking through sequences.
    pub elem_type: FieldDiff<Option<ElementType>>,

    /// Shapes of the tensor types, looking through sequences.
    pub shape: FieldDiff<Shape>,
}

/// Differences between two initializers with the same name.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializerDiff {
    pub data_type: FieldDiff<Option<ElementType>>,
    pub dims: SequenceDiff,
    pub payload_len: FieldDiff<Option<usize>>,

    /// True if the payload sizes differ. Tensor data is not compared
    /// element-wise.
    pub content_different: bool,
}

/// Comparison of model-level fields.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfoDiff {
    pub ir_version: FieldDiff<Option<i64>>,
    pub producer_name: FieldDiff<Option<String>>,
    pub producer_version: FieldDiff<Option<String>>,
    pub domain: FieldDiff<Option<String>>,
    pub model_version: FieldDiff<Option<i64>>,
}

impl ModelInfoDiff {
    pub fn has_changes(&self) -> bool {
        self.ir_version.is_different
            || self.producer_name.is_different
            || self.producer_version.is_different
            || self.domain.is_different
            || self.model_version.is_different
    }
}

pub type NodesDiff = CategoryDiff<Node, NodeDiff>;
pub type IosDiff = CategoryDiff<TensorSpec, IoDiff>;
pub type InitializersDiff = CategoryDiff<Initializer, InitializerDiff>;

/// Comparison of the main graphs of two models.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GraphDiff {
    pub nodes: NodesDiff,
    pub inputs: IosDiff,
    pub outputs: IosDiff,
    pub initializers: InitializersDiff,
}

impl GraphDiff {
    pub fn has_changes(&self) -> bool {
        self.nodes.has_changes()
            || self.inputs.has_changes()
            || self.outputs.has_changes()
            || self.initializers.has_changes()
    }
}

/// Marker recorded when at least one model has no graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MissingGraph {
    pub model1_has_graph: bool,
    pub model2_has_graph: bool,
}

impl MissingGraph {
    pub const MESSAGE: &'static str = "One or both models don't have a graph";
}

impl Serialize for MissingGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("MissingGraph", 3)?;
        state.serialize_field("error", Self::MESSAGE)?;
        state.serialize_field("model1HasGraph", &self.model1_has_graph)?;
        state.serialize_field("model2HasGraph", &self.model2_has_graph)?;
        state.end()
    }
}

/// Result of comparing the graphs of two models.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum GraphComparison {
    Compared(GraphDiff),
    Missing(MissingGraph),
}

impl GraphComparison {
    /// Return the graph diff, if both models have a graph.
    pub fn diff(&self) -> Option<&GraphDiff> {
        match self {
            GraphComparison::Compared(diff) => Some(diff),
            GraphComparison::Missing(_) => None,
        }
    }

    /// Return true if the graphs differ.
    ///
    /// A model with no graph differs from one with a graph. Two models
    /// without graphs are considered equal.
    pub fn has_changes(&self) -> bool {
        match self {
            GraphComparison::Compared(diff) => diff.has_changes(),
            GraphComparison::Missing(missing) => {
                missing.model1_has_graph != missing.model2_has_graph
            }
        }
    }
}

/// Comparison of model metadata.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDiff {
    /// Entries of `metadata_props`, matched by key.
    pub props: CategoryDiff<MetadataProp, FieldDiff<String>>,

    /// Operator set imports, matched by domain.
    pub opset_imports: CategoryDiff<OpsetImport, FieldDiff<Option<i64>>>,
}

impl MetadataDiff {
    pub fn has_changes(&self) -> bool {
        self.props.has_changes() || self.opset_imports.has_changes()
    }
}

/// Structural differences between two models.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDiff {
    pub model_info: ModelInfoDiff,
    pub graphs: GraphComparison,
    pub metadata: MetadataDiff,
}

impl ModelDiff {
    /// Return true if any difference was found.
    pub fn has_changes(&self) -> bool {
        self.model_info.has_changes() || self.graphs.has_changes() || self.metadata.has_changes()
    }
}
