//! # hostpy
//!
//! Helpers for hosting a CPython interpreter inside a native executable.
//!
//! The crate is a thin layer over the interpreter's C API (reached through
//! [`pyo3`]):
//!
//! - **Marshalling** - [`Marshal`] converts native values (`String`, `i64`,
//!   `f64`, `bool`) to interpreter objects and back, leniently or strictly
//! - **Sequences** - iterate any Python sequence or copy it into a native slice
//! - **Errors** - [`MarshalError`] maps onto `TypeError` / `IndexError`, and the
//!   interpreter's error indicator can be set or read directly
//! - **Introspection** - type names and object dumps
//! - **Embedding** - [`Embedder`] registers built-in modules and hands the
//!   process arguments to the interpreter's main routine
//!
//! ## Quick Start
//!
//! ```no_run
//! use hostpy::Embedder;
//!
//! fn register_mymod() {
//!     // pyo3::append_to_inittab!(mymod);
//! }
//!
//! fn main() -> Result<(), hostpy::EmbedError> {
//!     let status = Embedder::new()
//!         .with_builtin("mymod", register_mymod)
//!         .run(std::env::args_os())?;
//!     std::process::exit(status);
//! }
//! ```

// Only the embedding entry point talks to the raw C API.
#![deny(unsafe_code)]

pub mod args;
pub mod convert;
pub mod embed;
mod error;
pub mod introspect;
pub mod sequence;
pub mod stream;

pub use args::{check_index, remove_argument_tuple};
pub use convert::{Marshal, from_python_value, to_python_value};
pub use embed::{BuiltinModule, Embedder, WideArgs};
pub use error::{EmbedError, MarshalError, set_python_error, take_error_message};
pub use introspect::{AttributeInfo, ObjectDump, describe_object, dump_object, type_name};
pub use sequence::{expect_from_python_sequence, from_python_sequence, iterate_sequence};
pub use stream::TextStream;
