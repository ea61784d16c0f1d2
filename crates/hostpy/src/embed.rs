//! Booting the embedded interpreter.
//!
//! [`Embedder`] collects the built-in modules to register, converts the
//! process arguments to the interpreter's wide-string form ([`WideArgs`]) and
//! hands control to `Py_Main`, returning its exit status.
//!
//! Built-in modules have to be appended to the interpreter's inittab before
//! the interpreter starts, so [`Embedder::run`] refuses to do anything once an
//! interpreter is already running in the process.

use std::ffi::{OsStr, c_int};

use libc::wchar_t;
use pyo3::ffi;
use tracing::{debug, info};

use crate::error::EmbedError;

// Entry points outside the limited API, declared here rather than relying on
// pyo3::ffi's cfg-dependent exports.
#[allow(unsafe_code)]
unsafe extern "C" {
    fn Py_Main(argc: c_int, argv: *mut *mut wchar_t) -> c_int;

    #[cfg(unix)]
    fn Py_DecodeLocale(arg: *const std::ffi::c_char, size: *mut libc::size_t) -> *mut wchar_t;

    #[cfg(unix)]
    fn PyMem_RawFree(ptr: *mut std::ffi::c_void);
}

/// A module compiled into the executable and registered under `name`.
///
/// `register` appends the module to the interpreter's inittab, typically by
/// calling `pyo3::append_to_inittab!` on a `#[pymodule]`. `name` must match
/// the name the module registers itself under.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinModule {
    name: &'static str,
    register: fn(),
}

impl BuiltinModule {
    /// Describe a built-in module.
    pub const fn new(name: &'static str, register: fn()) -> Self {
        Self { name, register }
    }

    /// The import name of the module.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Builder for an interpreter run with extra built-in modules.
#[derive(Debug, Default)]
pub struct Embedder {
    builtins: Vec<BuiltinModule>,
}

impl Embedder {
    /// An embedder that registers no extra modules.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a built-in module by name and registration function.
    #[must_use]
    pub fn with_builtin(self, name: &'static str, register: fn()) -> Self {
        self.with_module(BuiltinModule::new(name, register))
    }

    /// Register a built-in module.
    #[must_use]
    pub fn with_module(mut self, module: BuiltinModule) -> Self {
        self.builtins.push(module);
        self
    }

    /// Names of the registered built-in modules, in registration order.
    pub fn builtin_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.builtins.iter().map(BuiltinModule::name)
    }

    /// Check that every module name is a dotted identifier and appears once.
    pub fn validate(&self) -> Result<(), EmbedError> {
        for (i, module) in self.builtins.iter().enumerate() {
            if !is_module_name(module.name)
                || self.builtins[..i].iter().any(|m| m.name == module.name)
            {
                return Err(EmbedError::InvalidModuleName(module.name.to_string()));
            }
        }
        Ok(())
    }

    /// Register the built-in modules and run the interpreter's main routine
    /// with `args` (including the program name in position 0).
    ///
    /// Returns the interpreter's exit status. The interpreter is finalized
    /// when this returns and cannot be restarted with new built-ins.
    pub fn run<I, S>(self, args: I) -> Result<i32, EmbedError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.validate()?;
        if interpreter_running() {
            return Err(EmbedError::AlreadyInitialized);
        }

        use_environment_locale();
        let mut args = WideArgs::from_args(args)?;
        let argc =
            c_int::try_from(args.len()).map_err(|_| EmbedError::TooManyArguments(args.len()))?;

        for module in &self.builtins {
            (module.register)();
            debug!(module = module.name, "registered built-in module");
        }

        let mut argv = args.argv();
        info!(argc, "starting interpreter");
        let status = run_main(argc, &mut argv);
        info!(status, "interpreter exited");
        Ok(status)
    }
}

fn is_module_name(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
                && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        })
}

#[allow(unsafe_code)]
fn interpreter_running() -> bool {
    // SAFETY: Py_IsInitialized may be called at any time.
    unsafe { ffi::Py_IsInitialized() != 0 }
}

#[allow(unsafe_code)]
fn run_main(argc: c_int, argv: &mut [*mut wchar_t]) -> i32 {
    // SAFETY: argv holds argc NUL-terminated wide strings (plus a trailing
    // null pointer) that outlive the call; Py_Main copies what it keeps.
    unsafe { Py_Main(argc, argv.as_mut_ptr()) }
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn use_environment_locale() {
    // SAFETY: called before the interpreter starts any threads; the locale
    // string is a valid C string.
    unsafe {
        libc::setlocale(libc::LC_CTYPE, c"".as_ptr());
    }
}

#[cfg(not(unix))]
fn use_environment_locale() {}

/// Command-line arguments converted to NUL-terminated wide strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WideArgs {
    args: Vec<Vec<wchar_t>>,
}

impl WideArgs {
    /// Convert every argument.
    ///
    /// On unix the interpreter's locale decoder is used, so bytes that are not
    /// valid in the current locale survive as surrogate escapes. On Windows
    /// the native UTF-16 form is taken as is.
    pub fn from_args<I, S>(args: I) -> Result<Self, EmbedError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args = args
            .into_iter()
            .enumerate()
            .map(|(index, arg)| encode_arg(index, arg.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = args.len(), "decoded command-line arguments");
        Ok(Self { args })
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Whether there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Argument `index` as text; unrepresentable code units become U+FFFD.
    pub fn to_string_lossy(&self, index: usize) -> Option<String> {
        let wide = self.args.get(index)?;
        let units = wide.strip_suffix(&[0]).unwrap_or(wide);
        Some(decode_wide(units))
    }

    /// Pointers suitable for a C `argv`, terminated by a null pointer.
    ///
    /// The pointers borrow from `self`.
    fn argv(&mut self) -> Vec<*mut wchar_t> {
        self.args
            .iter_mut()
            .map(|arg| arg.as_mut_ptr())
            .chain(std::iter::once(std::ptr::null_mut()))
            .collect()
    }
}

#[cfg(unix)]
#[allow(unsafe_code)]
fn encode_arg(index: usize, arg: &OsStr) -> Result<Vec<wchar_t>, EmbedError> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let bytes = CString::new(arg.as_bytes()).map_err(|_| EmbedError::InteriorNul { index })?;
    let mut len: libc::size_t = 0;

    // SAFETY: `bytes` is NUL-terminated. On success Py_DecodeLocale returns a
    // buffer of `len` wide chars plus a terminator, allocated with
    // PyMem_RawMalloc, which we copy and release.
    unsafe {
        let raw = Py_DecodeLocale(bytes.as_ptr(), &mut len);
        if raw.is_null() {
            return Err(EmbedError::Decode { index });
        }
        let mut wide = std::slice::from_raw_parts(raw, len).to_vec();
        PyMem_RawFree(raw.cast());
        wide.push(0);
        Ok(wide)
    }
}

#[cfg(windows)]
fn encode_arg(index: usize, arg: &OsStr) -> Result<Vec<wchar_t>, EmbedError> {
    use std::os::windows::ffi::OsStrExt;

    let mut wide: Vec<wchar_t> = arg.encode_wide().collect();
    if wide.contains(&0) {
        return Err(EmbedError::InteriorNul { index });
    }
    wide.push(0);
    Ok(wide)
}

#[cfg(windows)]
fn decode_wide(units: &[wchar_t]) -> String {
    String::from_utf16_lossy(units)
}

#[cfg(not(windows))]
fn decode_wide(units: &[wchar_t]) -> String {
    units
        .iter()
        .map(|&c| char::from_u32(c as u32).unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use std::ffi::OsString;

    use pyo3::prelude::*;

    use super::*;

    fn noop() {}

    fn must_not_register() {
        panic!("registration must not happen once the interpreter is running");
    }

    #[test]
    fn builtin_names_keep_order() {
        let embedder = Embedder::new()
            .with_builtin("example", noop)
            .with_module(BuiltinModule::new("pkg.native", noop));
        let names: Vec<_> = embedder.builtin_names().collect();
        assert_eq!(names, vec!["example", "pkg.native"]);
        assert!(embedder.validate().is_ok());
    }

    #[test]
    fn invalid_names_are_rejected() {
        for name in ["", "1abc", "a-b", "a..b", "trailing."] {
            let err = Embedder::new().with_builtin(name, noop).validate().unwrap_err();
            assert!(
                matches!(&err, EmbedError::InvalidModuleName(n) if n == name),
                "{name:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = Embedder::new()
            .with_builtin("example", noop)
            .with_builtin("example", noop)
            .validate()
            .unwrap_err();
        assert!(matches!(err, EmbedError::InvalidModuleName(_)));
    }

    #[test]
    fn refuses_to_run_inside_a_live_interpreter() {
        Python::attach(|_py| {});
        let err = Embedder::new()
            .with_builtin("late", must_not_register)
            .run(["hostpy", "-c", "pass"])
            .unwrap_err();
        assert!(matches!(err, EmbedError::AlreadyInitialized));
    }

    #[test]
    fn arguments_become_wide_strings() {
        Python::attach(|_py| {});
        let args = WideArgs::from_args(["hostpy", "-c", "print(1 + 2)"]).unwrap();
        assert_eq!(args.len(), 3);
        assert!(!args.is_empty());
        assert_eq!(args.to_string_lossy(0).as_deref(), Some("hostpy"));
        assert_eq!(args.to_string_lossy(2).as_deref(), Some("print(1 + 2)"));
        assert_eq!(args.to_string_lossy(3), None);
    }

    #[test]
    fn argv_is_null_terminated() {
        Python::attach(|_py| {});
        let mut args = WideArgs::from_args(["a", "bc"]).unwrap();
        let argv = args.argv();
        assert_eq!(argv.len(), 3);
        assert!(argv[..2].iter().all(|p| !p.is_null()));
        assert!(argv[2].is_null());
    }

    #[test]
    fn interior_nul_is_rejected() {
        Python::attach(|_py| {});
        let args = vec![OsString::from("ok"), OsString::from("bad\0arg")];
        let err = WideArgs::from_args(&args).unwrap_err();
        assert!(matches!(err, EmbedError::InteriorNul { index: 1 }));
    }

    #[cfg(unix)]
    #[test]
    fn undecodable_bytes_become_surrogates() {
        use std::os::unix::ffi::OsStrExt;

        Python::attach(|_py| {});
        let args = WideArgs::from_args([OsStr::from_bytes(b"\xff\xfeok")]).unwrap();
        assert_eq!(
            args.args[0],
            [0xDCFF, 0xDCFE, 'o' as wchar_t, 'k' as wchar_t, 0]
        );
        assert_eq!(
            args.to_string_lossy(0).as_deref(),
            Some("\u{FFFD}\u{FFFD}ok")
        );
    }

    #[test]
    fn no_arguments_is_fine() {
        let args = WideArgs::from_args(Vec::<OsString>::new()).unwrap();
        assert!(args.is_empty());
    }
}
