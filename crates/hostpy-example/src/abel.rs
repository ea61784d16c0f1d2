//! `Abel` and its derived class `Kain`.

use hostpy::{Marshal, TextStream, remove_argument_tuple, type_name};
use pyo3::PyTypeInfo;
use pyo3::exceptions::PyTypeError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyTuple, PyType};
use tracing::{debug, info};

const DEFAULT_JUSTICE: i64 = 23;

/// Whether `cls` is `T` itself rather than a Python subclass of it.
fn is_exactly<T: PyTypeInfo>(cls: &Bound<'_, PyType>) -> bool {
    cls.as_ptr() == cls.py().get_type::<T>().as_ptr()
}

/// Content for `Abel(*args)`: nothing, or a single string.
fn parse_content(args: &Bound<'_, PyTuple>) -> PyResult<String> {
    let arg = remove_argument_tuple(args.as_any());
    if let Some(data) = String::from_python(&arg) {
        return Ok(data);
    }
    if arg.downcast::<PyTuple>().is_ok_and(|t| t.is_empty()) {
        return Ok(String::new());
    }
    let msg = TextStream::new()
        .push("Invalid argument ")
        .push(type_name(&arg))
        .push(" to Abel() constructor");
    Err(PyTypeError::new_err(String::from(msg)))
}

/// A string holder that can be subclassed from Python.
///
/// Abel()        -> empty content
/// Abel(string)  -> content set to string
///
/// The argument rules are only enforced for `Abel` itself. Python subclasses
/// may define an `__init__` with their own signature; their instances start
/// with the content the arguments would give, or empty if they don't fit.
#[pyclass(subclass, module = "example")]
#[derive(Debug)]
pub struct Abel {
    data: String,
    justice: i64,
}

impl Abel {
    fn with_data(data: String) -> Self {
        debug!(data = %data, "new Abel");
        Self {
            data,
            justice: DEFAULT_JUSTICE,
        }
    }

    /// The string content.
    pub fn data(&self) -> &str {
        &self.data
    }

    fn duplicate(&self) -> Self {
        let mut copy = Self::with_data(self.data.clone());
        copy.justice = self.justice;
        copy
    }
}

impl Drop for Abel {
    fn drop(&mut self) {
        debug!(data = %self.data, "free Abel");
    }
}

#[pymethods]
impl Abel {
    #[new]
    #[classmethod]
    #[pyo3(signature = (*args, **kwargs))]
    fn new(
        cls: &Bound<'_, PyType>,
        args: &Bound<'_, PyTuple>,
        kwargs: Option<&Bound<'_, PyDict>>,
    ) -> PyResult<Self> {
        let strict = is_exactly::<Abel>(cls);
        match parse_content(args) {
            Ok(data) if !strict || kwargs.is_none_or(|kw| kw.is_empty()) => {
                Ok(Self::with_data(data))
            }
            Ok(_) => Err(PyTypeError::new_err("Abel() takes no keyword arguments")),
            Err(_) if !strict => Ok(Self::with_data(String::new())),
            Err(err) => Err(err),
        }
    }

    /// get() -> string
    ///
    /// Returns the contents as string.
    fn get(&self) -> String {
        self.data.clone()
    }

    /// set(string) -> self
    ///
    /// Sets the contents of the object.
    fn set<'py>(slf: Bound<'py, Self>, arg: &Bound<'py, PyAny>) -> PyResult<Bound<'py, Self>> {
        let data = String::expect_from_python(arg)?;
        slf.borrow_mut().data = data;
        Ok(slf)
    }

    /// copy() -> Abel
    ///
    /// Returns a copy of the object.
    fn copy(&self) -> Self {
        self.duplicate()
    }

    /// Spawn a new Kain holding on to this Abel.
    fn spawn(slf: &Bound<'_, Self>) -> PyResult<Py<Kain>> {
        let data = format!("from_{}", slf.borrow().data);
        let init = PyClassInitializer::from(Abel::with_data(data)).add_subclass(Kain {
            abel: Some(slf.clone().unbind()),
        });
        Py::new(slf.py(), init)
    }

    /// A property derived from the object's address.
    #[getter]
    fn wisdom(slf: &Bound<'_, Self>) -> i64 {
        (slf.as_ptr() as usize % 23) as i64
    }

    #[getter]
    fn justice(&self) -> i64 {
        self.justice
    }

    #[setter]
    fn set_justice(&mut self, value: &Bound<'_, PyAny>) -> PyResult<()> {
        self.justice = i64::expect_from_python(value)?;
        Ok(())
    }

    /// Test for equality of content.
    fn __eq__(&self, other: &Bound<'_, PyAny>) -> PyResult<bool> {
        let other = other.downcast::<Abel>().map_err(|_| {
            PyTypeError::new_err(format!("Expected Abel(), got {}", type_name(other)))
        })?;
        Ok(self.data == other.borrow().data)
    }

    fn __repr__(slf: &Bound<'_, Self>) -> String {
        format!("{}()@{:p}", type_name(slf.as_any()), slf.as_ptr())
    }

    fn __str__(slf: &Bound<'_, Self>) -> String {
        format!("{}(\"{}\")", type_name(slf.as_any()), slf.borrow().data)
    }
}

/// A derived class that may hold on to an Abel.
///
/// Kain(data=None, abel=None)
///
/// As with `Abel`, Python subclasses are free to take other arguments;
/// arguments that don't fit are ignored for them.
#[pyclass(extends = Abel, subclass, module = "example")]
#[derive(Debug)]
pub struct Kain {
    abel: Option<Py<Abel>>,
}

#[pymethods]
impl Kain {
    #[new]
    #[classmethod]
    #[pyo3(signature = (data = None, abel = None, *args, **kwargs))]
    fn new(
        cls: &Bound<'_, PyType>,
        data: Option<&Bound<'_, PyAny>>,
        abel: Option<&Bound<'_, PyAny>>,
        args: &Bound<'_, PyTuple>,
        kwargs: Option<&Bound<'_, PyDict>>,
    ) -> PyResult<PyClassInitializer<Self>> {
        let strict = is_exactly::<Kain>(cls);
        if strict && (!args.is_empty() || kwargs.is_some_and(|kw| !kw.is_empty())) {
            return Err(PyTypeError::new_err(
                "Kain() takes at most the arguments (data, abel)",
            ));
        }

        let data = match data.map(String::expect_from_python).transpose() {
            Ok(data) => data.unwrap_or_default(),
            Err(err) if strict => return Err(err.into()),
            Err(_) => String::new(),
        };
        let abel = match abel {
            None => None,
            Some(obj) => match obj.downcast::<Abel>() {
                Ok(abel) => Some(abel.clone().unbind()),
                Err(_) if strict => {
                    return Err(PyTypeError::new_err(format!(
                        "Invalid argument {}",
                        type_name(obj)
                    )));
                }
                Err(_) => None,
            },
        };
        Ok(PyClassInitializer::from(Abel::with_data(data)).add_subclass(Self { abel }))
    }

    /// The Abel this Kain holds, if any.
    #[getter]
    fn abel(&self, py: Python<'_>) -> Option<Py<Abel>> {
        self.abel.as_ref().map(|a| a.clone_ref(py))
    }

    /// Slays Abel.
    fn slay(slf: PyRef<'_, Self>) -> String {
        let py = slf.py();
        let victim = slf
            .abel
            .as_ref()
            .map(|a| a.borrow(py).data.clone())
            .unwrap_or_default();
        let msg = format!("Kain({}) slew Abel({victim})", slf.as_super().data);
        info!("{msg}");
        msg
    }

    /// Spawn a new instance of an Abel.
    fn spawn(slf: PyRef<'_, Self>) -> PyResult<Py<Abel>> {
        let data = format!("from_{}", slf.as_super().data);
        Py::new(slf.py(), Abel::with_data(data))
    }

    /// copy() -> Kain
    ///
    /// Returns a copy holding the same Abel.
    fn copy(slf: PyRef<'_, Self>) -> PyResult<Py<Kain>> {
        let py = slf.py();
        let init = PyClassInitializer::from(slf.as_super().duplicate()).add_subclass(Kain {
            abel: slf.abel.as_ref().map(|a| a.clone_ref(py)),
        });
        Py::new(py, init)
    }
}
