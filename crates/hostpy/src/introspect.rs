//! Object introspection: type names and object dumps.

use std::fmt;

use pyo3::prelude::*;
use serde::Serialize;

/// The interpreter's name for the type of `obj` (`"int"`, `"list"`, ...).
///
/// Returns `"<unknown>"` if the type refuses to report its name; the error is
/// swallowed.
pub fn type_name(obj: &Bound<'_, PyAny>) -> String {
    obj.get_type()
        .name()
        .map(|name| name.to_string())
        .unwrap_or_else(|_| "<unknown>".to_string())
}

/// One attribute of an introspected object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeInfo {
    /// Attribute name as listed by `dir()`.
    pub name: String,
    /// Type name of the attribute's value, or `"<error>"` if reading it raised.
    pub type_name: String,
}

/// Snapshot of an object's internals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectDump {
    /// Type name of the object.
    pub type_name: String,
    /// `repr(obj)`.
    pub repr: String,
    /// Reference count at the time of the dump (including our own reference).
    pub refcount: isize,
    /// Attributes from `dir(obj)`, empty unless introspection was requested.
    pub attributes: Vec<AttributeInfo>,
}

/// Collect type, repr, reference count and, if `introspect` is set, every
/// attribute of `obj`.
///
/// Attributes whose getter raises are recorded with type `"<error>"` and the
/// raised exception is discarded.
pub fn describe_object(obj: &Bound<'_, PyAny>, introspect: bool) -> PyResult<ObjectDump> {
    let repr = obj.repr()?.to_string();
    let attributes = if introspect {
        obj.dir()?
            .iter()
            .map(|name| {
                let name = name.to_string();
                let type_name = match obj.getattr(name.as_str()) {
                    Ok(value) => type_name(&value),
                    Err(_) => "<error>".to_string(),
                };
                AttributeInfo { name, type_name }
            })
            .collect()
    } else {
        Vec::new()
    };

    Ok(ObjectDump {
        type_name: type_name(obj),
        repr,
        refcount: obj.get_refcnt(),
        attributes,
    })
}

/// Print [`describe_object`] to stdout.
pub fn dump_object(obj: &Bound<'_, PyAny>, introspect: bool) -> PyResult<()> {
    let dump = describe_object(obj, introspect)?;
    println!("{dump}");
    Ok(())
}

impl fmt::Display for ObjectDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "type:     {}", self.type_name)?;
        writeln!(f, "repr:     {}", self.repr)?;
        write!(f, "refcount: {}", self.refcount)?;
        for attr in &self.attributes {
            write!(f, "\n  {:<24} {}", attr.name, attr.type_name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use pyo3::types::PyDict;

    use super::*;

    #[test]
    fn type_names() {
        Python::attach(|py| {
            assert_eq!(type_name(&py.eval(c"1", None, None).unwrap()), "int");
            assert_eq!(type_name(&py.eval(c"[]", None, None).unwrap()), "list");
            assert_eq!(type_name(&py.eval(c"{}", None, None).unwrap()), "dict");
            assert_eq!(type_name(&py.None().into_bound(py)), "NoneType");
        });
    }

    #[test]
    fn describe_without_introspection() {
        Python::attach(|py| {
            let obj = py.eval(c"[1, 2, 3]", None, None).unwrap();
            let dump = describe_object(&obj, false).unwrap();
            assert_eq!(dump.type_name, "list");
            assert_eq!(dump.repr, "[1, 2, 3]");
            assert!(dump.refcount >= 1);
            assert!(dump.attributes.is_empty());
        });
    }

    #[test]
    fn describe_records_failing_attributes() {
        Python::attach(|py| {
            let globals = PyDict::new(py);
            py.run(
                c"
class Touchy:
    value = 3
    @property
    def broken(self):
        raise RuntimeError('nope')
obj = Touchy()
",
                Some(&globals),
                None,
            )
            .unwrap();
            let obj = globals.get_item("obj").unwrap().unwrap();

            let dump = describe_object(&obj, true).unwrap();
            assert_eq!(dump.type_name, "Touchy");

            let find = |name: &str| {
                dump.attributes
                    .iter()
                    .find(|a| a.name == name)
                    .map(|a| a.type_name.clone())
            };
            assert_eq!(find("value").as_deref(), Some("int"));
            assert_eq!(find("broken").as_deref(), Some("<error>"));
            assert!(!PyErr::occurred(py));

            let text = dump.to_string();
            assert!(text.starts_with("type:     Touchy\n"));
            assert!(text.contains("broken"));
        });
    }

    #[test]
    fn dump_serializes_to_json() {
        Python::attach(|py| {
            let obj = py.eval(c"'x'", None, None).unwrap();
            let dump = describe_object(&obj, false).unwrap();
            let json = serde_json::to_value(&dump).unwrap();
            assert_eq!(json["type_name"], "str");
            assert_eq!(json["repr"], "'x'");
            assert_eq!(json["attributes"], serde_json::json!([]));
        });
    }
}
