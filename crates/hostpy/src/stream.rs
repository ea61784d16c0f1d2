//! A small text builder for messages handed to the interpreter.

use std::convert::Infallible;
use std::fmt::{self, Display, Write};

use pyo3::prelude::*;
use pyo3::types::PyString;

/// Accumulates displayable values and converts into a `String` or a Python
/// `str`.
///
/// ```
/// use hostpy::TextStream;
///
/// let msg: String = TextStream::new()
///     .push("Invalid argument ")
///     .push(42)
///     .push(" to constructor")
///     .into();
/// assert_eq!(msg, "Invalid argument 42 to constructor");
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TextStream {
    buf: String,
}

impl TextStream {
    /// Create an empty stream.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the `Display` form of `value`.
    #[must_use]
    pub fn push(mut self, value: impl Display) -> Self {
        // Writing into a String cannot fail.
        let _ = write!(self.buf, "{value}");
        self
    }

    /// The text accumulated so far.
    pub fn as_str(&self) -> &str {
        &self.buf
    }
}

impl Write for TextStream {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buf.push_str(s);
        Ok(())
    }
}

impl Display for TextStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.buf)
    }
}

impl From<TextStream> for String {
    fn from(stream: TextStream) -> Self {
        stream.buf
    }
}

impl<'py> IntoPyObject<'py> for TextStream {
    type Target = PyString;
    type Output = Bound<'py, PyString>;
    type Error = Infallible;

    fn into_pyobject(self, py: Python<'py>) -> Result<Self::Output, Self::Error> {
        Ok(PyString::new(py, &self.buf))
    }
}
