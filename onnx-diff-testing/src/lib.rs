//! Internal testing utilities for the onnx-diff crates.
//!
//! - [`TestCases`] runs table-driven tests.
//! - [`ModelBuilder`] and [`NodeBuilder`] create `ModelProto` fixtures, which
//!   can be encoded to bytes with [`encode_model`].

use std::fmt::Debug;
use std::panic::{RefUnwindSafe, UnwindSafe};

mod builder;
mod encode;

pub use builder::{
    ModelBuilder, NodeBuilder, attr, dim_param, dim_value, initializer, sequence_value_info,
    value_info,
};
pub use encode::encode_model;

/// Utility for creating parametrized (aka. table-driven) tests.
///
/// Create a collection of test cases, conventionally an array of a `Case`
/// struct which implements `Debug`, and call `test_each` with the test
/// function. Every case is run, even if earlier ones fail. If any case
/// panics, `test_each` panics afterwards with the count and debug
/// representations of the failing cases.
///
/// ```
/// use onnx_diff_testing::TestCases;
///
/// #[derive(Debug)]
/// struct Case {
///     a: i32,
///     b: i32,
///     expected: i32,
/// }
///
/// let cases = [Case { a: 3, b: 5, expected: 15 }];
///
/// cases.test_each(|&Case { a, b, expected }| {
///     assert_eq!(a * b, expected);
/// });
/// ```
///
/// Test cases and the values captured by the test function must be
/// [unwind safe](std::panic::UnwindSafe). Wrap values that are not with
/// [`AssertUnwindSafe`](std::panic::AssertUnwindSafe).
pub trait TestCases {
    /// The data for a single test case.
    type Case;

    /// Call `test` with a reference to each case, catching any panics.
    fn test_each(self, test: impl Fn(&Self::Case) + RefUnwindSafe)
    where
        Self::Case: Debug + RefUnwindSafe;

    /// Variant of [`test_each`](TestCases::test_each) which passes cases to
    /// the test function by value.
    ///
    /// Each case is formatted before the test function is called, so that it
    /// can be reported if the test fails.
    fn test_each_value(self, test: impl Fn(Self::Case) + RefUnwindSafe)
    where
        Self::Case: Debug + UnwindSafe;
}

fn check_failures(failures: &[String]) {
    assert!(
        failures.is_empty(),
        "{} test cases failed: [{}]",
        failures.len(),
        failures.join(", ")
    );
}

impl<I: IntoIterator> TestCases for I {
    type Case = I::Item;

    fn test_each(self, test: impl Fn(&I::Item) + RefUnwindSafe)
    where
        Self::Case: Debug + RefUnwindSafe,
    {
        let failures: Vec<String> = self
            .into_iter()
            .enumerate()
            .filter(|(_, case)| std::panic::catch_unwind(|| test(case)).is_err())
            .map(|(i, case)| format!("#{} {:?}", i, case))
            .collect();
        check_failures(&failures);
    }

    fn test_each_value(self, test: impl Fn(I::Item) + RefUnwindSafe)
    where
        Self::Case: Debug + UnwindSafe,
    {
        let test = &test;
        let failures: Vec<String> = self
            .into_iter()
            .enumerate()
            .filter_map(|(i, case)| {
                let case_str = format!("#{} {:?}", i, case);
                std::panic::catch_unwind(move || test(case))
                    .is_err()
                    .then_some(case_str)
            })
            .collect();
        check_failures(&failures);
    }
}
