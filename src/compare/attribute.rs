use crate::diff::{AttributeChange, CategoryDiff};
use crate::matcher::match_entities;
use crate::model::Attribute;

/// Compare two attributes with the same name.
///
/// Values are equal only if they have the same kind and the same contents.
/// Tensor and graph values are compared as a whole, so a change inside a
/// subgraph is reported as a change of the attribute.
pub fn compare_attribute(attr1: &Attribute, attr2: &Attribute) -> Option<AttributeChange> {
    if attr1.value == attr2.value {
        return None;
    }
    Some(AttributeChange {
        model1: attr1.value.clone(),
        model2: attr2.value.clone(),
        kind_changed: attr1.value.kind() != attr2.value.kind(),
    })
}

/// Match the attributes of two nodes by name and compare them.
pub fn compare_attributes(
    attrs1: &[Attribute],
    attrs2: &[Attribute],
) -> CategoryDiff<Attribute, AttributeChange> {
    match_entities(
        "attribute",
        attrs1,
        attrs2,
        |attr| attr.name.as_str(),
        compare_attribute,
    )
}

#[cfg(test)]
mod tests {
    use onnx_diff_testing::TestCases;

    use super::{compare_attribute, compare_attributes};
    use crate::diff::EntryStatus;
    use crate::model::{AttrValue, Attribute, Graph};

    fn attr(name: &str, value: AttrValue) -> Attribute {
        Attribute {
            name: name.to_string(),
            value,
        }
    }

    #[test]
    fn test_compare_attribute() {
        #[derive(Debug)]
        struct Case {
            value1: AttrValue,
            value2: AttrValue,
            changed: bool,
            kind_changed: bool,
        }

        let cases = [
            Case {
                value1: AttrValue::Int(1),
                value2: AttrValue::Int(1),
                changed: false,
                kind_changed: false,
            },
            Case {
                value1: AttrValue::Int(1),
                value2: AttrValue::Int(2),
                changed: true,
                kind_changed: false,
            },
            Case {
                value1: AttrValue::Int(1),
                value2: AttrValue::Ints(vec![1]),
                changed: true,
                kind_changed: true,
            },
            Case {
                value1: AttrValue::Float(0.5),
                value2: AttrValue::Float(0.5),
                changed: false,
                kind_changed: false,
            },
            Case {
                value1: AttrValue::Strings(vec!["a".into(), "b".into()]),
                value2: AttrValue::Strings(vec!["b".into(), "a".into()]),
                changed: true,
                kind_changed: false,
            },
            // An empty list differs from an unset value.
            Case {
                value1: AttrValue::Ints(Vec::new()),
                value2: AttrValue::Unset,
                changed: true,
                kind_changed: true,
            },
            Case {
                value1: AttrValue::Graph(Box::default()),
                value2: AttrValue::Graph(Box::new(Graph::new(
                    Some("body".into()),
                    Vec::new(),
                    Vec::new(),
                    Vec::new(),
                    Vec::new(),
                    Vec::new(),
                ))),
                changed: true,
                kind_changed: false,
            },
        ];

        cases.test_each(|case| {
            let attr1 = attr("x", case.value1.clone());
            let attr2 = attr("x", case.value2.clone());
            let change = compare_attribute(&attr1, &attr2);
            assert_eq!(change.is_some(), case.changed);
            if let Some(change) = change {
                assert_eq!(change.kind_changed, case.kind_changed);
                assert_eq!(change.model1, case.value1);
                assert_eq!(change.model2, case.value2);
            }
        });
    }

    #[test]
    fn test_compare_attributes_single_change() {
        let attrs1 = [
            attr("kernel_shape", AttrValue::Ints(vec![3, 3])),
            attr("group", AttrValue::Int(1)),
            attr("auto_pad", AttrValue::String("NOTSET".into())),
        ];
        let attrs2 = [
            attr("kernel_shape", AttrValue::Ints(vec![3, 3])),
            attr("group", AttrValue::Int(2)),
            attr("auto_pad", AttrValue::String("NOTSET".into())),
        ];

        let diff = compare_attributes(&attrs1, &attrs2);
        let changed: Vec<_> = diff.changes().map(|e| e.key.as_str()).collect();
        assert_eq!(changed, ["group"]);
        assert_eq!(diff.get("kernel_shape"), Some(&EntryStatus::Unchanged));
        assert_eq!(diff.get("auto_pad"), Some(&EntryStatus::Unchanged));
    }

    #[test]
    fn test_compare_attributes_added_removed() {
        let attrs1 = [attr("alpha", AttrValue::Float(0.1))];
        let attrs2 = [attr("beta", AttrValue::Float(0.1))];

        let diff = compare_attributes(&attrs1, &attrs2);
        assert!(matches!(diff.get("alpha"), Some(EntryStatus::Removed(_))));
        assert!(matches!(diff.get("beta"), Some(EntryStatus::Added(_))));
    }
}
