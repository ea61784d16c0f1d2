//! `hostpy`: the Python interpreter with the `example` module built in.
//!
//! Every argument is handed to the interpreter untouched, so
//! `hostpy -c "import example; print(example.func_a())"` behaves like
//! `python3 -c ...` with one more importable module.
//!
//! Logging goes to stderr and is configured with `HOSTPY_LOG`
//! (e.g. `HOSTPY_LOG=hostpy=debug`), default `warn`.

use std::process::ExitCode;

use anyhow::{Context, Result};
use hostpy::Embedder;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "HOSTPY_LOG";

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<i32> {
    Embedder::new()
        .with_module(hostpy_example::builtin())
        .run(std::env::args_os())
        .context("failed to start the interpreter")
}

fn main() -> ExitCode {
    init_logging();

    match run() {
        // Exit statuses outside 0..=255 are truncated the same way the OS does.
        Ok(status) => ExitCode::from(status as u8),
        Err(err) => {
            eprintln!("hostpy: {err:#}");
            ExitCode::FAILURE
        }
    }
}
