use std::fmt::Display;

use crate::compare::attribute::compare_attributes;
use crate::diff::{FieldDiff, IndexDiff, NodeDiff, SequenceDiff};
use crate::model::Node;

/// Compare two sequences position by position.
///
/// If the sequences have different lengths, positions past the end of the
/// shorter sequence are reported as differences with a missing value.
pub fn compare_sequences<T: PartialEq + Display>(seq1: &[T], seq2: &[T]) -> SequenceDiff {
    let len = seq1.len().max(seq2.len());
    let details: Vec<IndexDiff> = (0..len)
        .filter_map(|index| {
            let item1 = seq1.get(index);
            let item2 = seq2.get(index);
            (item1 != item2).then(|| IndexDiff {
                index,
                model1: item1.map(|x| x.to_string()),
                model2: item2.map(|x| x.to_string()),
            })
        })
        .collect();

    SequenceDiff {
        is_different: !details.is_empty(),
        details,
    }
}

/// Compare two nodes with the same key.
///
/// A change of operator type does not stop the comparison. The inputs,
/// outputs and attributes are still compared and included in the result.
pub fn compare_node(node1: &Node, node2: &Node) -> Option<NodeDiff> {
    let op_type = FieldDiff::new(node1.op_type.clone(), node2.op_type.clone());
    let inputs = compare_sequences(&node1.inputs, &node2.inputs);
    let outputs = compare_sequences(&node1.outputs, &node2.outputs);
    let attributes = compare_attributes(&node1.attributes, &node2.attributes);

    let modified = op_type.is_different
        || inputs.is_different
        || outputs.is_different
        || attributes.has_changes();

    modified.then_some(NodeDiff {
        op_type,
        inputs,
        outputs,
        attributes,
    })
}

#[cfg(test)]
mod tests {
    use onnx_diff_testing::TestCases;

    use super::{compare_node, compare_sequences};
    use crate::diff::{EntryStatus, IndexDiff};
    use crate::model::{AttrValue, Attribute, Node};

    fn node(op_type: &str, inputs: &[&str], outputs: &[&str], attrs: Vec<Attribute>) -> Node {
        Node {
            key: "n".into(),
            name: Some("n".into()),
            op_type: op_type.into(),
            domain: String::new(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
            attributes: attrs,
        }
    }

    #[test]
    fn test_compare_sequences() {
        #[derive(Debug)]
        struct Case {
            seq1: Vec<&'static str>,
            seq2: Vec<&'static str>,
            expected: Vec<(usize, Option<&'static str>, Option<&'static str>)>,
        }

        let cases = [
            Case {
                seq1: vec!["a", "b"],
                seq2: vec!["a", "b"],
                expected: vec![],
            },
            Case {
                seq1: vec!["a", "b"],
                seq2: vec!["b", "a"],
                expected: vec![(0, Some("a"), Some("b")), (1, Some("b"), Some("a"))],
            },
            Case {
                seq1: vec!["a"],
                seq2: vec!["a", "b", "c"],
                expected: vec![(1, None, Some("b")), (2, None, Some("c"))],
            },
            Case {
                seq1: vec!["a", ""],
                seq2: vec!["a"],
                expected: vec![(1, Some(""), None)],
            },
            Case {
                seq1: vec![],
                seq2: vec![],
                expected: vec![],
            },
        ];

        cases.test_each(|case| {
            let diff = compare_sequences(&case.seq1, &case.seq2);
            let expected: Vec<_> = case
                .expected
                .iter()
                .map(|&(index, model1, model2)| IndexDiff {
                    index,
                    model1: model1.map(|s| s.to_string()),
                    model2: model2.map(|s| s.to_string()),
                })
                .collect();
            assert_eq!(diff.details, expected);
            assert_eq!(diff.is_different, !expected.is_empty());
        });
    }

    #[test]
    fn test_compare_node_unchanged() {
        let conv = node(
            "Conv",
            &["X", "W"],
            &["Y"],
            vec![Attribute {
                name: "group".into(),
                value: AttrValue::Int(1),
            }],
        );
        assert_eq!(compare_node(&conv, &conv.clone()), None);
    }

    #[test]
    fn test_compare_node_swapped_inputs() {
        let add1 = node("Add", &["a", "b"], &["c"], vec![]);
        let add2 = node("Add", &["b", "a"], &["c"], vec![]);

        let diff = compare_node(&add1, &add2).unwrap();
        assert!(diff.inputs.is_different);
        assert_eq!(diff.inputs.details.len(), 2);
        assert!(!diff.outputs.is_different);
        assert!(!diff.op_type.is_different);
    }

    #[test]
    fn test_compare_node_op_type_change_keeps_details() {
        let attr = |value| Attribute {
            name: "alpha".into(),
            value: AttrValue::Float(value),
        };
        let relu = node("LeakyRelu", &["x"], &["y"], vec![attr(0.1)]);
        let elu = node("Elu", &["x"], &["y", "z"], vec![attr(1.0)]);

        let diff = compare_node(&relu, &elu).unwrap();
        assert!(diff.op_type.is_different);
        assert_eq!(diff.op_type.model1, "LeakyRelu");
        assert_eq!(diff.op_type.model2, "Elu");
        assert!(diff.outputs.is_different);
        assert!(matches!(
            diff.attributes.get("alpha"),
            Some(EntryStatus::Modified(_))
        ));
    }
}
