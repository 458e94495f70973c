use crate::compare::node::compare_sequences;
use crate::diff::{FieldDiff, InitializerDiff, IoDiff};
use crate::model::{Initializer, TensorSpec};

/// Compare the types of two graph inputs or outputs with the same name.
///
/// The values differ if their type descriptors differ. This covers the kind
/// of type (tensor or sequence) as well as the element type and shape.
pub fn compare_io(spec1: &TensorSpec, spec2: &TensorSpec) -> Option<IoDiff> {
    let (type1, type2) = (&spec1.value_type, &spec2.value_type);
    let value_type = FieldDiff::new(type1.clone(), type2.clone());
    if !value_type.is_different {
        return None;
    }

    Some(IoDiff {
        elem_type: FieldDiff::new(type1.elem_type(), type2.elem_type()),
        shape: FieldDiff::new(
            type1.shape().iter().cloned().collect(),
            type2.shape().iter().cloned().collect(),
        ),
        value_type,
    })
}

/// Compare two initializers with the same name.
///
/// Tensor data is not compared. The payloads are considered different if
/// their sizes differ, including when only one size is known.
pub fn compare_initializer(init1: &Initializer, init2: &Initializer) -> Option<InitializerDiff> {
    let data_type = FieldDiff::new(init1.data_type, init2.data_type);
    let dims = compare_sequences(&init1.dims, &init2.dims);
    let payload_len = FieldDiff::new(init1.payload_len, init2.payload_len);
    let content_different = payload_len.is_different;

    (data_type.is_different || dims.is_different || content_different).then_some(
        InitializerDiff {
            data_type,
            dims,
            payload_len,
            content_different,
        },
    )
}

#[cfg(test)]
mod tests {
    use onnx_diff_testing::TestCases;

    use super::{compare_initializer, compare_io};
    use crate::diff::IndexDiff;
    use crate::model::{Dim, ElementType, Initializer, TensorSpec, ValueType};

    fn tensor(elem_type: Option<ElementType>, shape: &[Dim]) -> ValueType {
        ValueType::Tensor {
            elem_type,
            shape: shape.iter().cloned().collect(),
        }
    }

    fn spec(elem_type: Option<ElementType>, shape: &[Dim]) -> TensorSpec {
        TensorSpec {
            name: "X".into(),
            value_type: tensor(elem_type, shape),
        }
    }

    fn sequence_spec(item: ValueType) -> TensorSpec {
        TensorSpec {
            name: "S".into(),
            value_type: ValueType::Sequence {
                item: Box::new(item),
            },
        }
    }

    fn init(data_type: ElementType, dims: &[i64], payload_len: Option<usize>) -> Initializer {
        Initializer {
            name: "W1".into(),
            dims: dims.iter().copied().collect(),
            data_type: Some(data_type),
            payload_len,
        }
    }

    #[test]
    fn test_compare_io() {
        #[derive(Debug)]
        struct Case {
            spec1: TensorSpec,
            spec2: TensorSpec,
            elem_type_changed: Option<bool>,
            shape_changed: Option<bool>,
        }

        let image = [
            Dim::Numeric(1),
            Dim::Numeric(3),
            Dim::Numeric(224),
            Dim::Numeric(224),
        ];

        let cases = [
            Case {
                spec1: spec(Some(ElementType::Float), &image),
                spec2: spec(Some(ElementType::Float), &image),
                elem_type_changed: None,
                shape_changed: None,
            },
            Case {
                spec1: spec(Some(ElementType::Float), &image),
                spec2: spec(Some(ElementType::Double), &image),
                elem_type_changed: Some(true),
                shape_changed: Some(false),
            },
            Case {
                spec1: spec(Some(ElementType::Float), &[Dim::Symbolic("batch".into())]),
                spec2: spec(Some(ElementType::Float), &[Dim::Numeric(1)]),
                elem_type_changed: Some(false),
                shape_changed: Some(true),
            },
            Case {
                spec1: spec(Some(ElementType::Float), &[Dim::Unknown]),
                spec2: spec(Some(ElementType::Float), &[]),
                elem_type_changed: Some(false),
                shape_changed: Some(true),
            },
            Case {
                spec1: spec(None, &[]),
                spec2: spec(Some(ElementType::Other(42)), &[]),
                elem_type_changed: Some(true),
                shape_changed: Some(false),
            },
            Case {
                spec1: sequence_spec(tensor(Some(ElementType::Float), &[])),
                spec2: sequence_spec(tensor(Some(ElementType::Int64), &[])),
                elem_type_changed: Some(true),
                shape_changed: Some(false),
            },
            Case {
                spec1: sequence_spec(tensor(Some(ElementType::Float), &[])),
                spec2: sequence_spec(tensor(Some(ElementType::Float), &[])),
                elem_type_changed: None,
                shape_changed: None,
            },
            // Same element type and shape, different kind of type.
            Case {
                spec1: spec(Some(ElementType::Float), &[Dim::Numeric(2)]),
                spec2: sequence_spec(tensor(Some(ElementType::Float), &[Dim::Numeric(2)])),
                elem_type_changed: Some(false),
                shape_changed: Some(false),
            },
            Case {
                spec1: sequence_spec(ValueType::Unknown),
                spec2: spec(None, &[]),
                elem_type_changed: Some(false),
                shape_changed: Some(false),
            },
        ];

        cases.test_each(|case| {
            let diff = compare_io(&case.spec1, &case.spec2);
            assert!(diff.as_ref().is_none_or(|d| d.value_type.is_different));
            assert_eq!(
                diff.as_ref().map(|d| d.elem_type.is_different),
                case.elem_type_changed
            );
            assert_eq!(
                diff.as_ref().map(|d| d.shape.is_different),
                case.shape_changed
            );
        });
    }

    #[test]
    fn test_compare_io_records_types() {
        let diff = compare_io(
            &spec(Some(ElementType::Float), &[Dim::Numeric(1)]),
            &spec(Some(ElementType::Double), &[Dim::Numeric(1)]),
        )
        .unwrap();
        assert_eq!(diff.elem_type.model1.unwrap().to_string(), "Float");
        assert_eq!(diff.elem_type.model2.unwrap().to_string(), "Double");
    }

    #[test]
    fn test_compare_initializer() {
        #[derive(Debug)]
        struct Case {
            init1: Initializer,
            init2: Initializer,
            modified: bool,
            content_different: bool,
        }

        let conv_dims = [64, 3, 3, 3];
        let cases = [
            Case {
                init1: init(ElementType::Float, &conv_dims, Some(2304)),
                init2: init(ElementType::Float, &conv_dims, Some(2304)),
                modified: false,
                content_different: false,
            },
            Case {
                init1: init(ElementType::Float, &conv_dims, Some(2304)),
                init2: init(ElementType::Float, &conv_dims, Some(2308)),
                modified: true,
                content_different: true,
            },
            Case {
                init1: init(ElementType::Float, &conv_dims, Some(2304)),
                init2: init(ElementType::Float, &conv_dims, None),
                modified: true,
                content_different: true,
            },
            Case {
                init1: init(ElementType::Float, &conv_dims, None),
                init2: init(ElementType::Float, &conv_dims, None),
                modified: false,
                content_different: false,
            },
            Case {
                init1: init(ElementType::Float, &conv_dims, Some(2304)),
                init2: init(ElementType::Float16, &conv_dims, Some(2304)),
                modified: true,
                content_different: false,
            },
            Case {
                init1: init(ElementType::Float, &[64, 3, 3, 3], Some(2304)),
                init2: init(ElementType::Float, &[64, 3, 9], Some(2304)),
                modified: true,
                content_different: false,
            },
        ];

        cases.test_each(|case| {
            let diff = compare_initializer(&case.init1, &case.init2);
            assert_eq!(diff.is_some(), case.modified);
            if let Some(diff) = diff {
                assert_eq!(diff.content_different, case.content_different);
            }
        });
    }

    #[test]
    fn test_compare_initializer_dims_detail() {
        let diff = compare_initializer(
            &init(ElementType::Float, &[64, 3, 3, 3], Some(2304)),
            &init(ElementType::Float, &[64, 3, 9], Some(2304)),
        )
        .unwrap();

        assert!(!diff.data_type.is_different);
        assert!(diff.dims.is_different);
        assert_eq!(
            diff.dims.details,
            [
                IndexDiff {
                    index: 2,
                    model1: Some("3".into()),
                    model2: Some("9".into()),
                },
                IndexDiff {
                    index: 3,
                    model1: Some("3".into()),
                    model2: None,
                },
            ]
        );
    }
}
