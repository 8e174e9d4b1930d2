//! Source adapters: the three read-only views the resolver queries.
//!
//! Each adapter answers one question for one declaration: did this source
//! produce a value, and if so which one. The adapters are:
//! - `cli`: the parsed argument vector (delegated to clap)
//! - `env`: environment-variable lookup with prefixing and expansion
//! - `file`: registered INI configuration files

pub(crate) mod cli;
pub(crate) mod env;
pub(crate) mod file;
