//! Argument source adapter.
//!
//! The argument grammar itself is delegated to clap: this module builds a
//! `clap::Command` from the registered declarations at parse time, and
//! extracts per-declaration values from the resulting `ArgMatches`.
//!
//! Whether a value was actually supplied on the command line (as opposed to
//! being a clap-side default) is decided with `ArgMatches::value_source`;
//! that is the per-source Found/NotFound signal the resolver's precedence
//! passes rely on.

use clap::builder::PossibleValuesParser;
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use indexmap::IndexMap;

use crate::declaration::{Action, Declaration, Source};
use crate::value::Value;

/// Build a command from every declaration currently bound to the argument
/// source. `permissive` enables clap's lenient mode so leftover unexpected
/// input does not abort the parse; the only-known parse uses it after
/// filtering unregistered options out of the argument vector.
pub(crate) fn build_command(
    program: &str,
    description: Option<&str>,
    declarations: &IndexMap<String, Declaration>,
    claimed_options: &IndexMap<String, String>,
    claimed_ids: &IndexMap<String, String>,
    permissive: bool,
) -> Command {
    let mut command = Command::new(program.to_string()).no_binary_name(true);
    if let Some(description) = description {
        command = command.about(description.to_string());
    }
    if permissive {
        command = command.ignore_errors(true);
    }
    for declaration in declarations.values() {
        if !declaration.only().contains(Source::Argument) {
            continue;
        }
        // Under the resolve conflict policy a later declaration may have
        // stolen this one's binding; only emit what it still owns.
        if claimed_ids.get(declaration.argument_id()).map(String::as_str)
            != Some(declaration.qualified_name())
        {
            continue;
        }
        let Some(arg) = bind(declaration, claimed_options) else {
            continue;
        };
        command = command.arg(arg);
    }
    command
}

/// Build the clap argument for one declaration, or `None` when every option
/// string has been claimed away from it.
fn bind(declaration: &Declaration, claimed_options: &IndexMap<String, String>) -> Option<Arg> {
    let mut arg = Arg::new(declaration.argument_id().to_string());
    let mut bound = false;

    for option in declaration.options() {
        if claimed_options.get(option).map(String::as_str) != Some(declaration.qualified_name()) {
            continue;
        }
        if let Some(long) = option.strip_prefix("--") {
            arg = arg.long(long.to_string());
            bound = true;
        } else if let Some(short) = option.strip_prefix('-') {
            if let Some(c) = short.chars().next() {
                arg = arg.short(c);
                bound = true;
            }
        } else {
            // No leading dash: positional argument.
            arg = arg.value_name(option.to_uppercase());
            bound = true;
        }
    }
    if !bound {
        return None;
    }

    arg = match declaration.action() {
        Action::Store => arg.action(ArgAction::Set),
        Action::StoreConst(constant) => arg
            .action(ArgAction::Set)
            .num_args(0)
            .default_missing_value(constant.clone()),
        Action::StoreTrue => arg.action(ArgAction::SetTrue),
        Action::StoreFalse => arg.action(ArgAction::SetFalse),
        Action::Append => arg.action(ArgAction::Append),
        Action::AppendConst(constant) => arg
            .action(ArgAction::Append)
            .num_args(0)
            .default_missing_value(constant.clone()),
        Action::Count => arg.action(ArgAction::Count),
    };

    if !declaration.choices().is_empty() {
        arg = arg.value_parser(PossibleValuesParser::new(declaration.choices().to_vec()));
    }
    if declaration.required() {
        arg = arg.required(true);
    }
    if let Some(help) = declaration.help() {
        arg = arg.help(help.to_string());
    }
    if let Some(metavar) = declaration.metavar() {
        arg = arg.value_name(metavar.to_string());
    }
    Some(arg)
}

/// The value the argument vector supplied for this declaration, or `None`
/// when the declaration's binding was absent from the command line (or is
/// not part of the last parse at all, for late registrations).
pub(crate) fn value_for(matches: &ArgMatches, declaration: &Declaration) -> Option<Value> {
    let id = declaration.argument_id();
    if matches.try_contains_id(id).is_err() {
        return None;
    }
    if matches.value_source(id) != Some(ValueSource::CommandLine) {
        return None;
    }
    let value = match declaration.action() {
        Action::Store | Action::StoreConst(_) => Value::Str(matches.get_one::<String>(id)?.clone()),
        Action::StoreTrue | Action::StoreFalse => Value::Bool(matches.get_flag(id)),
        Action::Append | Action::AppendConst(_) => {
            Value::List(matches.get_many::<String>(id)?.cloned().collect())
        }
        Action::Count => Value::Int(i64::from(matches.get_count(id))),
    };
    Some(value)
}
