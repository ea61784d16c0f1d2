//! Conversions between native values and interpreter objects.
//!
//! [`Marshal`] covers the scalar kinds the helper layer has always supported:
//! text, signed integers, floating point and booleans. Each kind has a lenient
//! conversion ([`Marshal::from_python`]) that only reports success, and a strict
//! one ([`Marshal::expect_from_python`]) that produces the `TypeError` the
//! interpreter would raise.
//!
//! Structured values go through serde instead, see [`to_python_value`] and
//! [`from_python_value`].

use pyo3::IntoPyObjectExt;
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyFloat, PyInt, PyString};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::MarshalError;
use crate::introspect::type_name;

/// A native value with a direct interpreter counterpart.
pub trait Marshal: Sized {
    /// Human-readable name of the accepted Python kind, used in error messages.
    const KIND: &'static str;

    /// Convert to a new interpreter object.
    fn to_python<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyAny>>;

    /// Convert from an interpreter object, returning `None` if the object is
    /// not of an accepted kind.
    ///
    /// Never leaves the interpreter's error indicator set.
    fn from_python(obj: &Bound<'_, PyAny>) -> Option<Self>;

    /// Convert from an interpreter object, failing with
    /// [`MarshalError::TypeMismatch`] if the object is not of an accepted kind.
    fn expect_from_python(obj: &Bound<'_, PyAny>) -> Result<Self, MarshalError> {
        Self::from_python(obj).ok_or_else(|| MarshalError::TypeMismatch {
            expected: Self::KIND,
            found: type_name(obj),
        })
    }
}

impl Marshal for String {
    const KIND: &'static str = "str";

    fn to_python<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyAny>> {
        Ok(PyString::new(py, self).into_any())
    }

    fn from_python(obj: &Bound<'_, PyAny>) -> Option<Self> {
        let s = obj.downcast::<PyString>().ok()?;
        s.to_str().ok().map(str::to_owned)
    }
}

impl Marshal for i64 {
    const KIND: &'static str = "int";

    fn to_python<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyAny>> {
        self.into_bound_py_any(py)
    }

    // `bool` is an `int` subtype in Python and is accepted here as well.
    fn from_python(obj: &Bound<'_, PyAny>) -> Option<Self> {
        if !obj.is_instance_of::<PyInt>() {
            return None;
        }
        obj.extract::<i64>().ok()
    }
}

impl Marshal for f64 {
    const KIND: &'static str = "float";

    fn to_python<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyAny>> {
        Ok(PyFloat::new(py, *self).into_any())
    }

    fn from_python(obj: &Bound<'_, PyAny>) -> Option<Self> {
        if !(obj.is_instance_of::<PyFloat>() || obj.is_instance_of::<PyInt>()) {
            return None;
        }
        obj.extract::<f64>().ok()
    }
}

impl Marshal for bool {
    const KIND: &'static str = "bool";

    fn to_python<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyAny>> {
        Ok(PyBool::new(py, *self).to_owned().into_any())
    }

    fn from_python(obj: &Bound<'_, PyAny>) -> Option<Self> {
        obj.downcast::<PyBool>().ok().map(|b| b.is_true())
    }
}

/// Convert any serializable native value into interpreter objects
/// (dicts, lists, and the scalar kinds).
pub fn to_python_value<'py, T>(
    py: Python<'py>,
    value: &T,
) -> Result<Bound<'py, PyAny>, MarshalError>
where
    T: Serialize + ?Sized,
{
    Ok(pythonize::pythonize(py, value)?)
}

/// Convert interpreter objects into a deserializable native value.
pub fn from_python_value<T>(obj: &Bound<'_, PyAny>) -> Result<T, MarshalError>
where
    T: DeserializeOwned,
{
    Ok(pythonize::depythonize(obj)?)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use std::collections::BTreeMap;

    use pyo3::types::{PyDict, PyList};

    use super::*;

    fn eval<'py>(py: Python<'py>, code: &std::ffi::CStr) -> Bound<'py, PyAny> {
        py.eval(code, None, None).unwrap()
    }

    #[test]
    fn scalars_to_python() {
        Python::attach(|py| {
            let s = "hello".to_string().to_python(py).unwrap();
            assert!(s.is_instance_of::<PyString>());
            assert_eq!(s.extract::<String>().unwrap(), "hello");

            let i = 42_i64.to_python(py).unwrap();
            assert!(i.is_instance_of::<PyInt>());
            assert_eq!(i.extract::<i64>().unwrap(), 42);

            let f = 444.0_f64.to_python(py).unwrap();
            assert!(f.is_instance_of::<PyFloat>());
            assert_eq!(f.extract::<f64>().unwrap(), 444.0);

            let b = true.to_python(py).unwrap();
            assert!(b.is_instance_of::<PyBool>());
            assert!(b.is_truthy().unwrap());
        });
    }

    #[test]
    fn lenient_conversion_rejects_other_kinds() {
        Python::attach(|py| {
            let text = eval(py, c"'abc'");
            let int = eval(py, c"7");
            let float = eval(py, c"2.5");
            let flag = eval(py, c"True");

            assert_eq!(String::from_python(&text).as_deref(), Some("abc"));
            assert_eq!(String::from_python(&int), None);

            assert_eq!(i64::from_python(&int), Some(7));
            assert_eq!(i64::from_python(&flag), Some(1));
            assert_eq!(i64::from_python(&float), None);
            assert_eq!(i64::from_python(&text), None);

            assert_eq!(f64::from_python(&float), Some(2.5));
            assert_eq!(f64::from_python(&int), Some(7.0));
            assert_eq!(f64::from_python(&text), None);

            assert_eq!(bool::from_python(&flag), Some(true));
            assert_eq!(bool::from_python(&int), None);

            assert!(!PyErr::occurred(py));
        });
    }

    #[test]
    fn integer_overflow_is_not_an_int64() {
        Python::attach(|py| {
            let huge = eval(py, c"2 ** 80");
            assert_eq!(i64::from_python(&huge), None);
            assert!(!PyErr::occurred(py));
        });
    }

    #[test]
    fn strict_conversion_names_both_types() {
        Python::attach(|py| {
            let list = eval(py, c"[1, 2]");
            let err = f64::expect_from_python(&list).unwrap_err();
            assert_eq!(err.to_string(), "expected float, got list");

            let err = String::expect_from_python(&eval(py, c"None")).unwrap_err();
            assert_eq!(err.to_string(), "expected str, got NoneType");
        });
    }

    #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
    struct Point {
        name: String,
        coords: Vec<f64>,
    }

    #[test]
    fn structured_values_via_serde() {
        Python::attach(|py| {
            let point = Point {
                name: "origin".to_string(),
                coords: vec![0.0, 1.5],
            };
            let obj = to_python_value(py, &point).unwrap();
            let dict = obj.downcast::<PyDict>().unwrap();
            assert_eq!(
                dict.get_item("name").unwrap().unwrap().extract::<String>().unwrap(),
                "origin"
            );
            let coords = dict.get_item("coords").unwrap().unwrap();
            assert!(coords.downcast::<PyList>().is_ok());

            let back: Point = from_python_value(&obj).unwrap();
            assert_eq!(back, point);

            let map: BTreeMap<String, i64> =
                from_python_value(&eval(py, c"{'a': 1, 'b': 2}")).unwrap();
            assert_eq!(map.get("b"), Some(&2));

            let err = from_python_value::<Point>(&eval(py, c"42")).unwrap_err();
            assert!(matches!(err, MarshalError::Serde(_)));
        });
    }
}
