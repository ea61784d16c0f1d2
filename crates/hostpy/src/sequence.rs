//! Iterating interpreter sequences and copying them into native slices.

use pyo3::prelude::*;
use pyo3::types::PySequence;

use crate::convert::Marshal;
use crate::error::MarshalError;
use crate::introspect::type_name;

fn as_sequence<'a, 'py>(
    seq: &'a Bound<'py, PyAny>,
) -> Result<&'a Bound<'py, PySequence>, MarshalError> {
    seq.downcast::<PySequence>()
        .map_err(|_| MarshalError::NotASequence {
            found: type_name(seq),
        })
}

/// Visit every item of the sequence `seq` in order.
///
/// Fails with a `TypeError` if `seq` does not support the sequence protocol,
/// and forwards any error raised while fetching an item. If `f` returns
/// `false` the iteration stops early and `Ok(false)` is returned; otherwise
/// the result is `Ok(true)`.
pub fn iterate_sequence<'py, F>(seq: &Bound<'py, PyAny>, mut f: F) -> PyResult<bool>
where
    F: FnMut(&Bound<'py, PyAny>) -> bool,
{
    let seq = as_sequence(seq)?;
    for index in 0..seq.len()? {
        let item = seq.get_item(index)?;
        if !f(&item) {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Copy exactly `out.len()` items of `seq` into `out`.
///
/// Returns `false` if `seq` is not a sequence, has a different length, or an
/// item is not convertible. The interpreter's error indicator is never left
/// set. On failure `out` may have been partially written.
pub fn from_python_sequence<T: Marshal>(seq: &Bound<'_, PyAny>, out: &mut [T]) -> bool {
    fill(seq, out).is_ok()
}

/// Copy exactly `out.len()` items of `seq` into `out`, describing the first
/// problem found.
///
/// On failure `out` may have been partially written.
pub fn expect_from_python_sequence<T: Marshal>(
    seq: &Bound<'_, PyAny>,
    out: &mut [T],
) -> Result<(), MarshalError> {
    fill(seq, out)
}

fn fill<T: Marshal>(seq: &Bound<'_, PyAny>, out: &mut [T]) -> Result<(), MarshalError> {
    let seq = as_sequence(seq)?;
    let len = seq.len()?;
    if len != out.len() {
        return Err(MarshalError::SequenceLength {
            expected: out.len(),
            found: len,
        });
    }

    let mut failure = None;
    let mut slots = out.iter_mut().enumerate();
    iterate_sequence(seq.as_any(), |item| {
        let Some((index, slot)) = slots.next() else {
            return false;
        };
        match T::expect_from_python(item) {
            Ok(value) => {
                *slot = value;
                true
            }
            Err(source) => {
                failure = Some(MarshalError::SequenceItem {
                    index,
                    source: Box::new(source),
                });
                false
            }
        }
    })?;

    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
