//! Assertion macros for interception results.
//!
//! - [`crate::assert_result_ok!`]: assert `Ok` and extract the value
//! - [`crate::assert_result_err!`]: assert `Err` and extract the error
//! - [`crate::assert_contains_error!`]: assert the error message contains a pattern
//! - [`crate::assert_validation_failure!`]: assert an [`InterposeError`](crate::InterposeError)
//!   carries a count mismatch for a given path
//! - [`crate::assert_failure_count!`]: assert how many validation failures an
//!   error carries
//!
//! ```rust
//! use interpose::testkit::fixtures::sample_runtime;
//! use interpose::{assert_validation_failure, CountBound, Interposer, Target};
//!
//! let sample = sample_runtime();
//! let wp = Interposer::new(sample.runtime.clone());
//! let ix = wp.intercept(Target::path("os.cpu_count")).unwrap().expect_once();
//!
//! assert_validation_failure!(ix.exit(), "os.cpu_count", CountBound::Exactly(1), 0);
//! ```

/// Assert that a Result is Ok and extract the value.
#[macro_export]
macro_rules! assert_result_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!(
                "Expected Ok, got Err: {}\n  at {}:{}:{}",
                e,
                file!(),
                line!(),
                column!()
            ),
        }
    };
    ($result:expr, $($msg:tt)+) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!(
                "{}: Expected Ok, got Err: {}\n  at {}:{}:{}",
                format!($($msg)+),
                e,
                file!(),
                line!(),
                column!()
            ),
        }
    };
}

/// Assert that a Result is Err and extract the error.
#[macro_export]
macro_rules! assert_result_err {
    ($result:expr) => {
        match $result {
            Ok(value) => panic!(
                "Expected Err, got Ok: {:?}\n  at {}:{}:{}",
                value,
                file!(),
                line!(),
                column!()
            ),
            Err(e) => e,
        }
    };
}

/// Assert that the error's Display output contains `pattern`. Returns the
/// error.
#[macro_export]
macro_rules! assert_contains_error {
    ($result:expr, $pattern:expr) => {{
        let err = $crate::assert_result_err!($result);
        let err_str = err.to_string();
        assert!(
            err_str.contains($pattern),
            "Error '{}' does not contain '{}'\n  at {}:{}:{}",
            err_str,
            $pattern,
            file!(),
            line!(),
            column!()
        );
        err
    }};
}

/// Assert that a `Result<_, InterposeError>` failed validation for `path`
/// with the given bound and actual count. Returns the error.
#[macro_export]
macro_rules! assert_validation_failure {
    ($result:expr, $path:expr, $bound:expr, $actual:expr) => {{
        let err: $crate::InterposeError = $crate::assert_result_err!($result);
        let found = err
            .validation_failures()
            .into_iter()
            .any(|f| f.path == $path && f.bound == $bound && f.actual == $actual);
        assert!(
            found,
            "No failure for {} with bound {} and actual {} in:\n{}\n  at {}:{}:{}",
            $path,
            $bound,
            $actual,
            err,
            file!(),
            line!(),
            column!()
        );
        err
    }};
}

/// Assert that a `Result<_, InterposeError>` carries exactly `count`
/// validation failures. Returns the error.
#[macro_export]
macro_rules! assert_failure_count {
    ($result:expr, $count:expr) => {{
        let err: $crate::InterposeError = $crate::assert_result_err!($result);
        let actual = err.validation_failures().len();
        assert_eq!(
            actual,
            $count,
            "Expected {} validation failures, got {}:\n{}\n  at {}:{}:{}",
            $count,
            actual,
            err,
            file!(),
            line!(),
            column!()
        );
        err
    }};
}

#[cfg(test)]
mod tests {
    use crate::errors::InterposeError;
    use crate::expectation::{CountBound, ValidationFailure};

    fn failure(path: &str, actual: usize) -> InterposeError {
        InterposeError::from(ValidationFailure {
            path: path.to_string(),
            expected_call: "ANY".to_string(),
            bound: CountBound::Exactly(1),
            actual,
            recorded: Vec::new(),
        })
    }

    #[test]
    fn test_assert_result_ok_extracts_value() {
        let result: Result<i32, InterposeError> = Ok(42);
        assert_eq!(assert_result_ok!(result), 42);
    }

    #[test]
    #[should_panic(expected = "Expected Ok, got Err")]
    fn test_assert_result_ok_panics_on_err() {
        let result: Result<i32, InterposeError> = Err(failure("m.f", 0));
        assert_result_ok!(result);
    }

    #[test]
    fn test_assert_contains_error() {
        let result: Result<(), InterposeError> = Err(failure("m.f", 3));
        assert_contains_error!(result, "actual: 3");
    }

    #[test]
    fn test_assert_validation_failure_in_group() {
        let result: Result<(), InterposeError> =
            Err(InterposeError::Group(vec![failure("m.f", 0), failure("m.g", 2)]));
        assert_validation_failure!(result, "m.g", CountBound::Exactly(1), 2);
    }

    #[test]
    #[should_panic(expected = "No failure for m.h")]
    fn test_assert_validation_failure_panics_on_other_path() {
        let result: Result<(), InterposeError> = Err(failure("m.f", 0));
        assert_validation_failure!(result, "m.h", CountBound::Exactly(1), 0);
    }

    #[test]
    fn test_assert_failure_count() {
        let result: Result<(), InterposeError> =
            Err(InterposeError::Group(vec![failure("m.f", 0), failure("m.g", 2)]));
        assert_failure_count!(result, 2);
    }
}
