//! Error types and error-indicator helpers.

use pyo3::exceptions::{PyIndexError, PyTypeError};
use pyo3::prelude::*;
use pyo3::{PyErr, PyTypeInfo};

/// Errors raised while converting between native values and interpreter objects.
///
/// Every variant maps onto the exception the interpreter would raise for the
/// same mistake, so a `MarshalError` can be returned straight from a
/// `#[pyfunction]` via `?`.
#[derive(Debug, thiserror::Error)]
pub enum MarshalError {
    /// The object has the wrong type for the requested native value.
    #[error("expected {expected}, got {found}")]
    TypeMismatch {
        /// Name of the expected kind of value.
        expected: &'static str,
        /// Type name of the object actually passed.
        found: String,
    },

    /// The object does not support the sequence protocol.
    #[error("expected a sequence, got {found}")]
    NotASequence {
        /// Type name of the object actually passed.
        found: String,
    },

    /// The sequence has a different number of items than requested.
    #[error("expected a sequence of length {expected}, got length {found}")]
    SequenceLength {
        /// Number of items requested.
        expected: usize,
        /// Number of items in the sequence.
        found: usize,
    },

    /// An item of the sequence could not be converted.
    #[error("sequence item {index}: {source}")]
    SequenceItem {
        /// Position of the offending item.
        index: usize,
        /// Why the item was rejected.
        #[source]
        source: Box<MarshalError>,
    },

    /// An index fell outside `0..len`.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange {
        /// The index that was requested.
        index: isize,
        /// The length of the container.
        len: isize,
    },

    /// A structured value could not be converted through serde.
    #[error(transparent)]
    Serde(#[from] pythonize::PythonizeError),

    /// The interpreter raised while we were inspecting an object.
    #[error(transparent)]
    Python(#[from] PyErr),
}

impl From<MarshalError> for PyErr {
    fn from(err: MarshalError) -> Self {
        match err {
            MarshalError::IndexOutOfRange { .. } => PyIndexError::new_err(err.to_string()),
            MarshalError::Serde(e) => e.into(),
            MarshalError::Python(e) => e,
            _ => PyTypeError::new_err(err.to_string()),
        }
    }
}

/// Errors from booting the embedded interpreter.
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    /// A command-line argument contains a NUL byte and cannot cross the C API.
    #[error("argument {index} contains an interior NUL byte")]
    InteriorNul {
        /// Position of the argument in argv.
        index: usize,
    },

    /// The interpreter's locale decoder rejected an argument.
    #[error("argument {index} could not be decoded to a wide string")]
    Decode {
        /// Position of the argument in argv.
        index: usize,
    },

    /// Built-in modules can only be registered before the interpreter starts.
    #[error("the interpreter is already running")]
    AlreadyInitialized,

    /// A built-in module name is empty, not an identifier, or registered twice.
    #[error("invalid built-in module name {0:?}")]
    InvalidModuleName(String),

    /// More arguments than a C `int` can count.
    #[error("too many arguments: {0}")]
    TooManyArguments(usize),
}

/// Set the interpreter's error indicator to exception type `E` with `message`.
///
/// Any previously set error is replaced.
pub fn set_python_error<E: PyTypeInfo>(py: Python<'_>, message: impl Into<String>) {
    PyErr::new::<E, _>(message.into()).restore(py);
}

/// Read and clear the interpreter's error indicator.
///
/// Returns `str(exception)`, or `None` when no error is set.
pub fn take_error_message(py: Python<'_>) -> Option<String> {
    let err = PyErr::take(py)?;
    let message = err
        .value(py)
        .str()
        .map(|s| s.to_string())
        .unwrap_or_else(|_| "Error converting exception to string".to_string());
    Some(message)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use pyo3::exceptions::{PyIndexError, PyKeyError, PyTypeError, PyValueError};

    use super::*;

    #[test]
    fn index_errors_become_index_error() {
        Python::attach(|py| {
            let err: PyErr = MarshalError::IndexOutOfRange { index: 5, len: 3 }.into();
            assert!(err.is_instance_of::<PyIndexError>(py));
            assert_eq!(
                err.value(py).str().unwrap().to_string(),
                "index 5 out of range for length 3"
            );
        });
    }

    #[test]
    fn conversion_errors_become_type_error() {
        Python::attach(|py| {
            let err: PyErr = MarshalError::TypeMismatch {
                expected: "str",
                found: "int".to_string(),
            }
            .into();
            assert!(err.is_instance_of::<PyTypeError>(py));

            let nested = MarshalError::SequenceItem {
                index: 1,
                source: Box::new(MarshalError::TypeMismatch {
                    expected: "float",
                    found: "str".to_string(),
                }),
            };
            assert_eq!(nested.to_string(), "sequence item 1: expected float, got str");
            let err: PyErr = nested.into();
            assert!(err.is_instance_of::<PyTypeError>(py));
        });
    }

    #[test]
    fn wrapped_python_errors_pass_through() {
        Python::attach(|py| {
            let err: PyErr = MarshalError::Python(PyKeyError::new_err("missing")).into();
            assert!(err.is_instance_of::<PyKeyError>(py));
        });
    }

    #[test]
    fn error_indicator_round_trip() {
        Python::attach(|py| {
            assert_eq!(take_error_message(py), None);

            set_python_error::<PyValueError>(py, "bad value");
            assert!(PyErr::occurred(py));
            assert_eq!(take_error_message(py).as_deref(), Some("bad value"));
            assert!(!PyErr::occurred(py));
        });
    }
}
