//! Text rendering of model comparisons.

use std::fmt::{Display, Write};

use onnx_diff::{
    AttributeChange, CategoryDiff, Comparison, Dim, ElementType, EntityDiff, EntryStatus,
    FieldDiff, Graph, GraphComparison, Initializer, InitializerDiff, IoDiff, ModelInfoDiff, Node,
    NodeDiff, SequenceDiff, StatusCounts, TensorSpec, ValueType,
};

/// Options that control what is included in a text report.
#[derive(Clone, Debug, Default)]
pub struct ReportOptions {
    /// Include entities which are the same in both models.
    pub show_unchanged: bool,

    /// Print only the per-category counts.
    pub summary_only: bool,
}

/// Format a shape as a `[dim0, dim1, ...]` string, where each dimension is
/// represented by its fixed size, symbolic name or `?` if unknown.
fn format_shape(shape: &[Dim]) -> String {
    let dims = shape
        .iter()
        .map(|dim| dim.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{}]", dims)
}

fn format_elem_type(elem_type: Option<ElementType>) -> String {
    elem_type
        .map(|t| t.to_string())
        .unwrap_or_else(|| "?".to_string())
}

fn format_value_type(value_type: &ValueType) -> String {
    match value_type {
        ValueType::Tensor { elem_type, shape } => {
            format!("{} {}", format_elem_type(*elem_type), format_shape(shape))
        }
        ValueType::Sequence { item } => format!("sequence<{}>", format_value_type(item)),
        ValueType::Unknown => "?".to_string(),
    }
}

fn format_opt<T: Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

fn format_counts(counts: StatusCounts) -> String {
    let parts: Vec<String> = [
        (counts.added, "added"),
        (counts.removed, "removed"),
        (counts.modified, "modified"),
    ]
    .into_iter()
    .filter(|(n, _)| *n > 0)
    .map(|(n, label)| format!("{} {}", n, label))
    .collect();

    if parts.is_empty() {
        "no changes".to_string()
    } else {
        parts.join(", ")
    }
}

fn format_initializer(init: &Initializer) -> String {
    format!(
        "{} {:?}, {} bytes",
        format_elem_type(init.data_type),
        init.dims.as_slice(),
        format_opt(init.payload_len)
    )
}

/// Format a node's operator and its inputs, with the shape of each input if
/// it is known.
///
/// Inputs which are initializers are listed after the data inputs as
/// parameters.
fn format_node(node: &Node, graph: Option<&Graph>) -> String {
    let format_input = |name: &String| match graph.and_then(|g| g.shape_of(name)) {
        Some(shape) => format!("{} {}", name, format_shape(&shape)),
        None => name.clone(),
    };
    let (params, data): (Vec<&String>, Vec<&String>) = node
        .inputs
        .iter()
        .partition(|name| graph.is_some_and(|g| g.initializer(name).is_some()));

    let join = |names: Vec<&String>| {
        names
            .into_iter()
            .map(|name| format_input(name))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mut inputs = join(data);
    if !params.is_empty() {
        if !inputs.is_empty() {
            inputs.push_str("; ");
        }
        inputs.push_str("params: ");
        inputs.push_str(&join(params));
    }
    format!("{}({}) -> {}", node.op_type, inputs, node.outputs.join(", "))
}

fn count_info_changes(info: &ModelInfoDiff) -> usize {
    [
        info.ir_version.is_different,
        info.producer_name.is_different,
        info.producer_version.is_different,
        info.domain.is_different,
        info.model_version.is_different,
    ]
    .into_iter()
    .filter(|&changed| changed)
    .count()
}

/// Writes a report into a string.
struct ReportWriter<'a> {
    out: String,
    opts: &'a ReportOptions,
}

impl ReportWriter<'_> {
    fn line(&mut self, indent: usize, text: impl Display) {
        // Writing to a `String` cannot fail.
        let _ = writeln!(self.out, "{:indent$}{}", "", text, indent = indent * 2);
    }

    fn field<T: Display>(&mut self, indent: usize, label: &str, diff: &FieldDiff<T>) {
        if diff.is_different {
            self.line(indent, format!("{}: {} -> {}", label, diff.model1, diff.model2));
        }
    }

    fn opt_field<T: Display>(&mut self, indent: usize, label: &str, diff: &FieldDiff<Option<T>>) {
        if diff.is_different {
            self.line(
                indent,
                format!(
                    "{}: {} -> {}",
                    label,
                    format_opt(diff.model1.as_ref()),
                    format_opt(diff.model2.as_ref())
                ),
            );
        }
    }

    fn sequence(&mut self, indent: usize, label: &str, diff: &SequenceDiff) {
        for detail in &diff.details {
            self.line(
                indent,
                format!(
                    "{} {}: {} -> {}",
                    label,
                    detail.index,
                    format_opt(detail.model1.as_deref()),
                    format_opt(detail.model2.as_deref())
                ),
            );
        }
    }

    /// Write the header and entries for one entity category.
    ///
    /// `entry` writes the description of a single entity.
    fn category<T, D>(
        &mut self,
        title: &str,
        diff: &CategoryDiff<T, D>,
        mut entry: impl FnMut(&mut Self, &EntityDiff<T, D>),
    ) {
        self.line(
            0,
            format!(
                "{} ({} -> {}): {}",
                title,
                diff.model1_count,
                diff.model2_count,
                format_counts(diff.counts())
            ),
        );
        if self.opts.summary_only {
            return;
        }
        for dup in &diff.duplicates {
            self.line(1, format!("! duplicate key \"{}\" in {:?}", dup.key, dup.side));
        }
        for item in &diff.entries {
            if matches!(item.status, EntryStatus::Unchanged) && !self.opts.show_unchanged {
                continue;
            }
            entry(self, item);
        }
    }

    fn model_info(&mut self, info: &ModelInfoDiff) {
        self.line(
            0,
            format!("Model info: {} fields changed", count_info_changes(info)),
        );
        if self.opts.summary_only {
            return;
        }
        self.opt_field(1, "IR version", &info.ir_version);
        self.opt_field(1, "producer name", &info.producer_name);
        self.opt_field(1, "producer version", &info.producer_version);
        self.opt_field(1, "domain", &info.domain);
        self.opt_field(1, "model version", &info.model_version);
    }

    fn node_diff(&mut self, diff: &NodeDiff) {
        self.field(2, "op type", &diff.op_type);
        self.sequence(2, "input", &diff.inputs);
        self.sequence(2, "output", &diff.outputs);
        for attr in diff.attributes.changes() {
            match &attr.status {
                EntryStatus::Added(a) => {
                    self.line(2, format!("+ attribute {} = {}", attr.key, a.value))
                }
                EntryStatus::Removed(a) => {
                    self.line(2, format!("- attribute {} = {}", attr.key, a.value))
                }
                EntryStatus::Modified(AttributeChange {
                    model1,
                    model2,
                    kind_changed,
                }) => {
                    let kinds = if *kind_changed {
                        format!(" ({} -> {})", model1.kind(), model2.kind())
                    } else {
                        String::new()
                    };
                    self.line(
                        2,
                        format!("~ attribute {}: {} -> {}{}", attr.key, model1, model2, kinds),
                    )
                }
                EntryStatus::Unchanged => {}
            }
        }
    }

    fn io_entry(&mut self, item: &EntityDiff<TensorSpec, IoDiff>) {
        match &item.status {
            EntryStatus::Added(spec) => self.line(
                1,
                format!("+ {}: {}", item.key, format_value_type(&spec.value_type)),
            ),
            EntryStatus::Removed(spec) => self.line(
                1,
                format!("- {}: {}", item.key, format_value_type(&spec.value_type)),
            ),
            EntryStatus::Modified(diff) => self.line(
                1,
                format!(
                    "~ {}: {} -> {}",
                    item.key,
                    format_value_type(&diff.value_type.model1),
                    format_value_type(&diff.value_type.model2),
                ),
            ),
            EntryStatus::Unchanged => self.line(1, format!("  {}", item.key)),
        }
    }

    fn initializer_diff(&mut self, diff: &InitializerDiff) {
        self.opt_field(2, "data type", &diff.data_type);
        self.sequence(2, "dim", &diff.dims);
        if diff.content_different {
            self.line(
                2,
                format!(
                    "content size: {} -> {} bytes",
                    format_opt(diff.payload_len.model1),
                    format_opt(diff.payload_len.model2)
                ),
            );
        }
    }
}

/// Count the differences in a comparison.
///
/// Each changed model info field and each added, removed or modified entity
/// counts as one difference. A missing graph counts as one difference if only
/// one model has a graph.
pub fn count_differences(comparison: &Comparison) -> usize {
    fn changed<T, D>(diff: &CategoryDiff<T, D>) -> usize {
        diff.changes().count()
    }

    let diff = &comparison.diff;
    let mut count = count_info_changes(&diff.model_info);

    count += match &diff.graphs {
        GraphComparison::Compared(graph) => {
            changed(&graph.nodes)
                + changed(&graph.inputs)
                + changed(&graph.outputs)
                + changed(&graph.initializers)
        }
        GraphComparison::Missing(_) => diff.graphs.has_changes() as usize,
    };
    count + changed(&diff.metadata.props) + changed(&diff.metadata.opset_imports)
}

/// Render a comparison as human-readable text.
pub fn render_report(comparison: &Comparison, opts: &ReportOptions) -> String {
    let mut w = ReportWriter {
        out: String::new(),
        opts,
    };
    let graph1 = comparison.model1.graph.as_ref();
    let graph2 = comparison.model2.graph.as_ref();

    w.model_info(&comparison.diff.model_info);

    match &comparison.diff.graphs {
        GraphComparison::Compared(graphs) => {
            w.category("Nodes", &graphs.nodes, |w, item| match &item.status {
                EntryStatus::Added(node) => {
                    w.line(1, format!("+ {}: {}", item.key, format_node(node, graph2)))
                }
                EntryStatus::Removed(node) => {
                    w.line(1, format!("- {}: {}", item.key, format_node(node, graph1)))
                }
                EntryStatus::Modified(diff) => {
                    w.line(1, format!("~ {} ({})", item.key, diff.op_type.model1));
                    w.node_diff(diff);
                }
                EntryStatus::Unchanged => w.line(1, format!("  {}", item.key)),
            });
            w.category("Inputs", &graphs.inputs, |w, item| w.io_entry(item));
            w.category("Outputs", &graphs.outputs, |w, item| w.io_entry(item));
            w.category("Initializers", &graphs.initializers, |w, item| {
                match &item.status {
                    EntryStatus::Added(init) => {
                        w.line(1, format!("+ {}: {}", item.key, format_initializer(init)))
                    }
                    EntryStatus::Removed(init) => {
                        w.line(1, format!("- {}: {}", item.key, format_initializer(init)))
                    }
                    EntryStatus::Modified(diff) => {
                        w.line(1, format!("~ {}", item.key));
                        w.initializer_diff(diff);
                    }
                    EntryStatus::Unchanged => w.line(1, format!("  {}", item.key)),
                }
            });
        }
        GraphComparison::Missing(missing) => {
            let has_graph = |present: bool| if present { "has a graph" } else { "has no graph" };
            w.line(
                0,
                format!(
                    "Graph: model 1 {}, model 2 {}",
                    has_graph(missing.model1_has_graph),
                    has_graph(missing.model2_has_graph)
                ),
            );
        }
    }

    let metadata = &comparison.diff.metadata;
    w.category("Metadata", &metadata.props, |w, item| match &item.status {
        EntryStatus::Added(prop) => w.line(1, format!("+ {} = {}", item.key, prop.value)),
        EntryStatus::Removed(prop) => w.line(1, format!("- {} = {}", item.key, prop.value)),
        EntryStatus::Modified(value) => w.line(
            1,
            format!("~ {}: {} -> {}", item.key, value.model1, value.model2),
        ),
        EntryStatus::Unchanged => w.line(1, format!("  {}", item.key)),
    });
    w.category("Opset imports", &metadata.opset_imports, |w, item| {
        let domain = if item.key.is_empty() {
            "ai.onnx"
        } else {
            item.key.as_str()
        };
        match &item.status {
            EntryStatus::Added(opset) => {
                w.line(1, format!("+ {} {}", domain, format_opt(opset.version)))
            }
            EntryStatus::Removed(opset) => {
                w.line(1, format!("- {} {}", domain, format_opt(opset.version)))
            }
            EntryStatus::Modified(version) => w.line(
                1,
                format!(
                    "~ {}: {} -> {}",
                    domain,
                    format_opt(version.model1),
                    format_opt(version.model2)
                ),
            ),
            EntryStatus::Unchanged => w.line(1, format!("  {}", domain)),
        }
    });

    let count = count_differences(comparison);
    w.line(
        0,
        if count == 0 {
            "No differences found".to_string()
        } else {
            format!("{} differences found", count)
        },
    );

    w.out
}

#[cfg(test)]
mod tests {
    use onnx_diff::{Dim, compare};
    use onnx_diff_proto::onnx::DataType;
    use onnx_diff_testing::{
        ModelBuilder, NodeBuilder, TestCases, attr, dim_param, dim_value, initializer,
        sequence_value_info,
    };

    use super::{ReportOptions, count_differences, format_shape, render_report};

    fn conv_model() -> ModelBuilder {
        ModelBuilder::new()
            .producer("pytorch", "2.1.0")
            .input(
                "X",
                DataType::FLOAT,
                vec![dim_param("batch"), dim_value(3), dim_value(224), dim_value(224)],
            )
            .initializer(initializer("W1", DataType::FLOAT, &[64, 3, 3, 3], 6912))
            .node(
                NodeBuilder::new("Conv")
                    .name("Conv_0")
                    .inputs(&["X", "W1"])
                    .outputs(&["Y"])
                    .attr(attr::int("group", 1)),
            )
    }

    #[test]
    fn test_format_shape() {
        #[derive(Debug)]
        struct Case {
            shape: Vec<Dim>,
            expected: &'static str,
        }

        let cases = [
            Case {
                shape: vec![],
                expected: "[]",
            },
            Case {
                shape: vec![Dim::Symbolic("batch".into()), Dim::Numeric(3)],
                expected: "[batch, 3]",
            },
            Case {
                shape: vec![Dim::Unknown, Dim::Numeric(1)],
                expected: "[?, 1]",
            },
        ];

        cases.test_each(|case| {
            assert_eq!(format_shape(&case.shape), case.expected);
        });
    }

    #[test]
    fn test_report_identical_models() {
        let model = conv_model().build();
        let comparison = compare(&model, &model);

        let report = render_report(&comparison, &ReportOptions::default());
        assert!(report.contains("Nodes (1 -> 1): no changes"));
        assert!(report.ends_with("No differences found\n"));
        assert!(!report.contains("Conv_0"));

        let report = render_report(
            &comparison,
            &ReportOptions {
                show_unchanged: true,
                summary_only: false,
            },
        );
        assert!(report.contains("  Conv_0\n"));
        assert_eq!(count_differences(&comparison), 0);
    }

    #[test]
    fn test_report_changes() {
        let model1 = conv_model().build();
        let model2 = conv_model()
            .producer("pytorch", "2.2.0")
            .initializer(initializer("W1", DataType::FLOAT, &[64, 3, 3, 3], 6916))
            .replace_node(
                NodeBuilder::new("Conv")
                    .name("Conv_0")
                    .inputs(&["X", "W1"])
                    .outputs(&["Y"])
                    .attr(attr::int("group", 2)),
            )
            .node(NodeBuilder::new("Relu").inputs(&["Y"]).outputs(&["Z"]))
            .build();

        let comparison = compare(&model1, &model2);
        let report = render_report(&comparison, &ReportOptions::default());

        assert!(report.contains("producer version: 2.1.0 -> 2.2.0"));
        assert!(report.contains("Nodes (1 -> 2): 1 added, 1 modified"));
        assert!(report.contains("~ Conv_0 (Conv)"));
        assert!(report.contains("~ attribute group: 1 -> 2"));
        assert!(report.contains("+ Z: Relu(Y) -> Z"));
        assert!(report.contains("content size: 6912 -> 6916 bytes"));
        assert!(report.ends_with("4 differences found\n"));
        assert_eq!(count_differences(&comparison), 4);
    }

    #[test]
    fn test_report_removed_node_shows_input_shapes() {
        let model1 = conv_model().build();
        let model2 = conv_model().remove_node("Conv_0").build();

        let comparison = compare(&model1, &model2);
        let report = render_report(&comparison, &ReportOptions::default());
        assert!(report.contains(
            "- Conv_0: Conv(X [batch, 3, 224, 224]; params: W1 [64, 3, 3, 3]) -> Y"
        ));
    }

    #[test]
    fn test_report_sequence_input() {
        let model = |elem_type| {
            conv_model()
                .input_info(sequence_value_info("S", elem_type, vec![dim_param("n")]))
                .build()
        };
        let comparison = compare(&model(DataType::FLOAT), &model(DataType::INT64));
        let report = render_report(&comparison, &ReportOptions::default());

        assert!(report.contains("Inputs (2 -> 2): 1 modified"));
        assert!(report.contains("~ S: sequence<Float [n]> -> sequence<Int64 [n]>"));
        assert_eq!(count_differences(&comparison), 1);
    }

    #[test]
    fn test_report_summary_only() {
        let model1 = conv_model().build();
        let model2 = conv_model().remove_node("Conv_0").build();

        let comparison = compare(&model1, &model2);
        let report = render_report(
            &comparison,
            &ReportOptions {
                show_unchanged: false,
                summary_only: true,
            },
        );
        assert!(report.contains("Nodes (1 -> 0): 1 removed"));
        assert!(!report.contains("Conv_0"));
    }

    #[test]
    fn test_report_missing_graph() {
        let model1 = conv_model().build();
        let model2 = conv_model().without_graph().build();

        let comparison = compare(&model1, &model2);
        let report = render_report(&comparison, &ReportOptions::default());
        assert!(report.contains("Graph: model 1 has a graph, model 2 has no graph"));
        assert_eq!(count_differences(&comparison), 1);
    }
}
