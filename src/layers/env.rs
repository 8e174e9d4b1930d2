//! Environment source adapter.
//!
//! # Naming Convention
//!
//! Given a program invoked as `myapp`:
//! - `default.port`    → `MYAPP_PORT`
//! - `database.port`   → `MYAPP_DATABASE_PORT`
//!
//! Rules:
//! - All SCREAMING_SNAKE_CASE, `.` and `-` become `_`
//! - The group segment is omitted for the `default` group
//! - The leading segment comes from the declaration's prefix mode: the
//!   program's invocation name (the default), a fixed custom prefix, or
//!   nothing at all
//!
//! Raw values undergo shell-style `$VAR`/`${VAR}` expansion against the
//! same environment before being handed to the resolver.

use heck::ToShoutySnakeCase;

use crate::context::Context;
use crate::declaration::{Declaration, EnvPrefix};
use crate::expand::expand;

/// Compute the environment-variable name for a declaration.
pub(crate) fn variable_name(declaration: &Declaration, program: &str) -> String {
    let mut segments: Vec<String> = Vec::new();
    match declaration.env_prefix() {
        // The program name is uppercased verbatim, not case-split; `myApp`
        // prefixes as `MYAPP`, never `MY_APP`.
        EnvPrefix::Invocation => segments.push(program.to_uppercase().replace('-', "_")),
        EnvPrefix::Custom(prefix) => segments.push(prefix.clone()),
        EnvPrefix::None => {}
    }
    if declaration.group() != "default" {
        segments.push(declaration.group().to_shouty_snake_case());
    }
    segments.push(declaration.local_name().to_shouty_snake_case());
    segments.join("_")
}

/// Look the declaration up in the context's environment, expanding any
/// variable references in the raw value.
pub(crate) fn lookup(declaration: &Declaration, context: &Context) -> Option<String> {
    let name = variable_name(declaration, context.program());
    let raw = context.env().get(&name)?;
    tracing::debug!(variable = %name, "environment hit");
    Some(expand(&raw, context.env()).into_owned())
}
