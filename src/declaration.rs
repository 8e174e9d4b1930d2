//! Parameter declarations: the caller-facing [`Parameter`] input and the
//! stored [`Declaration`] the registry derives from it.
//!
//! # Naming
//!
//! Every declaration gets a *qualified name* of the form `group.local_name`.
//! The local name is derived from the longest option string (stripped of
//! leading dashes) unless an explicit `dest` override is supplied; `-` and
//! `_` are treated as equivalent and normalized to `_`. Parameters without
//! an explicit group land in the `default` group.

use crate::error::{Error, Result};
use crate::value::Value;

/// One of the three live lookup sources, in descending precedence order.
/// The static default is always consulted last and is not a member.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Source {
    /// The parsed argument vector.
    Argument,
    /// Registered INI configuration files.
    Configuration,
    /// Environment variables.
    Environment,
}

/// The subset of sources a parameter participates in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sources {
    argument: bool,
    configuration: bool,
    environment: bool,
}

impl Sources {
    /// All three sources (the default).
    pub const ALL: Self = Self {
        argument: true,
        configuration: true,
        environment: true,
    };

    /// Restrict to exactly the given sources.
    pub fn only<I>(sources: I) -> Self
    where
        I: IntoIterator<Item = Source>,
    {
        let mut set = Self {
            argument: false,
            configuration: false,
            environment: false,
        };
        for source in sources {
            match source {
                Source::Argument => set.argument = true,
                Source::Configuration => set.configuration = true,
                Source::Environment => set.environment = true,
            }
        }
        set
    }

    /// Whether the given source participates.
    pub fn contains(&self, source: Source) -> bool {
        match source {
            Source::Argument => self.argument,
            Source::Configuration => self.configuration,
            Source::Environment => self.environment,
        }
    }
}

impl Default for Sources {
    fn default() -> Self {
        Self::ALL
    }
}

/// The action kind for a parameter, governing argument arity and the derived
/// default value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Action {
    /// Store the supplied value (the default action).
    #[default]
    Store,
    /// Store the given constant when the flag is present; the constant is
    /// also the derived default.
    StoreConst(String),
    /// A flag that stores `true` when present; defaults to `false`.
    StoreTrue,
    /// A flag that stores `false` when present; defaults to `true`.
    StoreFalse,
    /// Collect every occurrence's value into a list; defaults to empty.
    Append,
    /// Append the given constant on every occurrence; defaults to empty.
    AppendConst(String),
    /// Count occurrences; defaults to `0`.
    Count,
}

impl Action {
    /// Derive the default value for this action, honoring an explicit
    /// default where the action admits one.
    pub(crate) fn default_value(&self, explicit: Option<&Value>) -> Value {
        match self {
            Action::Store => explicit.cloned().unwrap_or_default(),
            Action::StoreConst(constant) => explicit
                .cloned()
                .unwrap_or_else(|| Value::Str(constant.clone())),
            Action::StoreTrue => Value::Bool(false),
            Action::StoreFalse => Value::Bool(true),
            Action::Append | Action::AppendConst(_) => Value::List(Vec::new()),
            Action::Count => Value::Int(0),
        }
    }
}

/// How the environment-variable name for a parameter is prefixed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum EnvPrefix {
    /// Prefix with the invoking program's name, upper-cased with `-` → `_`.
    #[default]
    Invocation,
    /// Prefix with a fixed string (upper-cased at registration).
    Custom(String),
    /// No prefix at all.
    None,
}

/// Caller-facing declaration input, consumed by
/// [`Registry::register`](crate::Registry::register).
#[derive(Clone, Debug)]
pub struct Parameter {
    pub(crate) options: Vec<String>,
    pub(crate) group: Option<String>,
    pub(crate) only: Sources,
    pub(crate) action: Action,
    pub(crate) default: Option<Value>,
    pub(crate) choices: Vec<String>,
    pub(crate) required: bool,
    pub(crate) help: Option<String>,
    pub(crate) metavar: Option<String>,
    pub(crate) dest: Option<String>,
    pub(crate) env_prefix: EnvPrefix,
}

impl Parameter {
    /// Start a declaration with its accepted option strings. Options
    /// beginning with `--` become long flags, `-x` becomes a short flag,
    /// and a bare name becomes a positional argument.
    pub fn new<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            options: options.into_iter().map(Into::into).collect(),
            group: None,
            only: Sources::ALL,
            action: Action::Store,
            default: None,
            choices: Vec::new(),
            required: false,
            help: None,
            metavar: None,
            dest: None,
            env_prefix: EnvPrefix::Invocation,
        }
    }

    /// Set the owning group (configuration-file section, CLI option prefix).
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Restrict the parameter to a subset of sources.
    pub fn only<I>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = Source>,
    {
        self.only = Sources::only(sources);
        self
    }

    /// Set the action kind.
    pub fn action(mut self, action: Action) -> Self {
        self.action = action;
        self
    }

    /// Set an explicit default value.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Constrain accepted argument values to the given choices.
    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    /// Mark the argument as required on the command line.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the help text shown in usage messages.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Set the value placeholder name shown in usage messages.
    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar = Some(metavar.into());
        self
    }

    /// Override the derived local name.
    pub fn dest(mut self, dest: impl Into<String>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    /// Use a fixed environment-variable prefix instead of the program name.
    pub fn environment_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = EnvPrefix::Custom(prefix.into());
        self
    }

    /// Derive environment-variable names without any prefix.
    pub fn no_environment_prefix(mut self) -> Self {
        self.env_prefix = EnvPrefix::None;
        self
    }
}

/// A registered parameter: the stored form of a [`Parameter`], with derived
/// names, default value, and argument binding.
#[derive(Clone, Debug)]
pub struct Declaration {
    qualified_name: String,
    group: String,
    local_name: String,
    options: Vec<String>,
    only: Sources,
    action: Action,
    default: Value,
    env_prefix: EnvPrefix,
    argument_id: String,
    choices: Vec<String>,
    required: bool,
    help: Option<String>,
    metavar: Option<String>,
}

impl Declaration {
    pub(crate) fn build(parameter: Parameter, group_prefix: bool) -> Result<Self> {
        let Some(longest) = parameter
            .options
            .iter()
            .max_by_key(|option| option.len())
            .cloned()
        else {
            return Err(Error::NoOptions);
        };

        let local = parameter
            .dest
            .clone()
            .unwrap_or_else(|| longest.trim_start_matches('-').to_string());
        let group = parameter
            .group
            .clone()
            .unwrap_or_else(|| "default".to_string())
            .replace('-', "_");
        let local_name = local.replace('-', "_");
        let qualified_name = format!("{group}.{local_name}");

        let mut options = parameter.options;
        if group_prefix
            && group != "default"
            && parameter.only.contains(Source::Argument)
            && let Some(position) = options.iter().position(|option| *option == longest)
            && longest.starts_with("--")
        {
            let prefix = format!("--{}-", group.replace('_', "-"));
            options[position] = longest.replacen("--", &prefix, 1);
        }

        let env_prefix = match parameter.env_prefix {
            EnvPrefix::Custom(prefix) => {
                EnvPrefix::Custom(prefix.to_uppercase().replace('-', "_"))
            }
            other => other,
        };

        let default = parameter.action.default_value(parameter.default.as_ref());

        let argument_id = if group_prefix {
            let id = qualified_name.replacen('.', "_", 1);
            id.strip_prefix("default_")
                .map(str::to_string)
                .unwrap_or(id)
        } else {
            local_name.clone()
        };

        Ok(Self {
            qualified_name,
            group,
            local_name,
            options,
            only: parameter.only,
            action: parameter.action,
            default,
            env_prefix,
            argument_id,
            choices: parameter.choices,
            required: parameter.required,
            help: parameter.help,
            metavar: parameter.metavar,
        })
    }

    /// The unique `group.local_name` key.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// The owning group.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// The local (group-stripped) name.
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// The accepted option strings, after any group-prefix rewrite.
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// The sources this parameter participates in.
    pub fn only(&self) -> Sources {
        self.only
    }

    /// The action kind.
    pub fn action(&self) -> &Action {
        &self.action
    }

    /// The derived default value.
    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// The environment-variable prefix mode.
    pub fn env_prefix(&self) -> &EnvPrefix {
        &self.env_prefix
    }

    pub(crate) fn argument_id(&self) -> &str {
        &self.argument_id
    }

    pub(crate) fn choices(&self) -> &[String] {
        &self.choices
    }

    pub(crate) fn required(&self) -> bool {
        self.required
    }

    pub(crate) fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    pub(crate) fn metavar(&self) -> Option<&str> {
        self.metavar.as_deref()
    }
}
