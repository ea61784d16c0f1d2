//! The `example` built-in module.
//!
//! Compiled into the `hostpy` executable and importable as `import example`.
//! It shows the marshalling helpers from [`hostpy`] in use:
//!
//! ```python
//! import example
//!
//! example.func_add(2, 3)          # 5.0
//! a = example.Abel("Python")
//! k = a.spawn()                   # Kain("from_Python") holding a
//! k.slay()                        # 'Kain(from_Python) slew Abel(Python)'
//! v = example.vec3((1, 2, 3))
//! v.dot((4, 5, 6))                # 32.0
//! ```

mod abel;
mod vec3;

use hostpy::{Marshal, describe_object, to_python_value};
use pyo3::prelude::*;

pub use abel::{Abel, Kain};
pub use vec3::Vec3;

/// Import name of the module.
pub const MODULE_NAME: &str = "example";

/// Returns 444.
#[pyfunction]
fn func_a() -> f64 {
    444.0
}

/// func_add(float, float) -> float
///
/// Adds two numbers.
#[pyfunction]
fn func_add(a: &Bound<'_, PyAny>, b: &Bound<'_, PyAny>) -> PyResult<f64> {
    let a = f64::expect_from_python(a)?;
    let b = f64::expect_from_python(b)?;
    Ok(a + b)
}

/// describe(obj, introspect=False) -> dict
///
/// Type name, repr, reference count and (with `introspect`) the attributes of
/// any object.
#[pyfunction]
#[pyo3(signature = (obj, introspect = false))]
fn describe<'py>(obj: &Bound<'py, PyAny>, introspect: bool) -> PyResult<Bound<'py, PyAny>> {
    let dump = describe_object(obj, introspect)?;
    Ok(to_python_value(obj.py(), &dump)?)
}

/// Populate `module` with the contents of `example`.
pub fn init_module(module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add("__doc__", "Example module to demonstrate hostpy")?;
    module.add("CONSTANT1", 1)?;
    module.add("CONSTANT2", 2)?;
    module.add_function(wrap_pyfunction!(func_a, module)?)?;
    module.add_function(wrap_pyfunction!(func_add, module)?)?;
    module.add_function(wrap_pyfunction!(describe, module)?)?;
    module.add_class::<Abel>()?;
    module.add_class::<Kain>()?;
    module.add_class::<Vec3>()?;
    Ok(())
}

#[pymodule]
#[pyo3(name = "example")]
fn example_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    init_module(m)
}

/// Append `example` to the interpreter's inittab.
///
/// # Panics
///
/// If an interpreter is already running in this process.
pub fn register() {
    pyo3::append_to_inittab!(example_module);
}

/// The module as a [`hostpy::BuiltinModule`], ready for
/// [`hostpy::Embedder::with_module`].
pub fn builtin() -> hostpy::BuiltinModule {
    hostpy::BuiltinModule::new(MODULE_NAME, register)
}
