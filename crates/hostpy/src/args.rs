//! Helpers for the arguments native functions receive.

use pyo3::prelude::*;
use pyo3::types::PyTuple;

use crate::error::MarshalError;

/// Unwrap a single-item argument tuple.
///
/// Varargs functions receive their positional arguments as a tuple; when it
/// holds exactly one object that object is returned, otherwise `arg` itself.
pub fn remove_argument_tuple<'py>(arg: &Bound<'py, PyAny>) -> Bound<'py, PyAny> {
    if let Ok(tuple) = arg.downcast::<PyTuple>()
        && tuple.len() == 1
        && let Ok(item) = tuple.get_item(0)
    {
        return item;
    }
    arg.clone()
}

/// Check that `index` addresses an element of a container of length `len`.
///
/// Negative indices are rejected; normalise Python-style negative indices
/// before calling this.
pub fn check_index(index: isize, len: isize) -> Result<(), MarshalError> {
    if (0..len).contains(&index) {
        Ok(())
    } else {
        Err(MarshalError::IndexOutOfRange { index, len })
    }
}
