//! Comparison of normalized models.

mod attribute;
mod node;
mod tensor;

pub use attribute::{compare_attribute, compare_attributes};
pub use node::{compare_node, compare_sequences};
pub use tensor::{compare_initializer, compare_io};

use crate::diff::{
    FieldDiff, GraphComparison, GraphDiff, MetadataDiff, MissingGraph, ModelDiff, ModelInfoDiff,
};
use crate::matcher::match_entities;
use crate::model::{Graph, MetadataProp, Model, ModelInfo, ModelMetadata, OpsetImport};

/// Compare the model-level fields of two models.
pub fn compare_model_info(info1: &ModelInfo, info2: &ModelInfo) -> ModelInfoDiff {
    ModelInfoDiff {
        ir_version: FieldDiff::new(info1.ir_version, info2.ir_version),
        producer_name: FieldDiff::new(info1.producer_name.clone(), info2.producer_name.clone()),
        producer_version: FieldDiff::new(
            info1.producer_version.clone(),
            info2.producer_version.clone(),
        ),
        domain: FieldDiff::new(info1.domain.clone(), info2.domain.clone()),
        model_version: FieldDiff::new(info1.model_version, info2.model_version),
    }
}

/// Compare the nodes, inputs, outputs and initializers of two graphs.
pub fn compare_graphs(graph1: &Graph, graph2: &Graph) -> GraphDiff {
    GraphDiff {
        nodes: match_entities(
            "node",
            &graph1.nodes,
            &graph2.nodes,
            |node| node.key.as_str(),
            compare_node,
        ),
        inputs: match_entities(
            "input",
            &graph1.inputs,
            &graph2.inputs,
            |spec| spec.name.as_str(),
            compare_io,
        ),
        outputs: match_entities(
            "output",
            &graph1.outputs,
            &graph2.outputs,
            |spec| spec.name.as_str(),
            compare_io,
        ),
        initializers: match_entities(
            "initializer",
            &graph1.initializers,
            &graph2.initializers,
            |init| init.name.as_str(),
            compare_initializer,
        ),
    }
}

/// Compare the metadata properties and operator set imports of two models.
pub fn compare_metadata(meta1: &ModelMetadata, meta2: &ModelMetadata) -> MetadataDiff {
    let props = match_entities(
        "metadata",
        &meta1.props,
        &meta2.props,
        |prop: &MetadataProp| prop.key.as_str(),
        |prop1, prop2| {
            let value = FieldDiff::new(prop1.value.clone(), prop2.value.clone());
            value.is_different.then_some(value)
        },
    );
    let opset_imports = match_entities(
        "opset import",
        &meta1.opset_imports,
        &meta2.opset_imports,
        |opset: &OpsetImport| opset.domain.as_str(),
        |opset1, opset2| {
            let version = FieldDiff::new(opset1.version, opset2.version);
            version.is_different.then_some(version)
        },
    );
    MetadataDiff {
        props,
        opset_imports,
    }
}

/// Compare two normalized models.
///
/// This is a pure function of its inputs. If either model has no graph, the
/// graph comparison is replaced by a [`MissingGraph`] marker and the other
/// sections are still compared.
pub fn compare_models(model1: &Model, model2: &Model) -> ModelDiff {
    let graphs = match (&model1.graph, &model2.graph) {
        (Some(graph1), Some(graph2)) => GraphComparison::Compared(compare_graphs(graph1, graph2)),
        (graph1, graph2) => GraphComparison::Missing(MissingGraph {
            model1_has_graph: graph1.is_some(),
            model2_has_graph: graph2.is_some(),
        }),
    };

    ModelDiff {
        model_info: compare_model_info(&model1.info, &model2.info),
        graphs,
        metadata: compare_metadata(&model1.metadata, &model2.metadata),
    }
}
