//! Parameter registry and resolver.
//!
//! A [`Registry`] accumulates parameter declarations, knows where each one
//! may come from, and answers queries by overlaying the sources in
//! precedence order: command-line argument over configuration file over
//! environment variable over declared default.
//!
//! Lower-precedence sources are consulted first and higher-precedence
//! sources overwrite, so a source only wins when it actually produced a
//! value. "Actually produced" is decided per source: for arguments it is
//! clap's report that the value came from the command line, for files and
//! the environment it is the presence of the key at all.

use camino::{Utf8Path, Utf8PathBuf};
use clap::ArgMatches;
use indexmap::{IndexMap, IndexSet};

use crate::context::Context;
use crate::declaration::{Declaration, Parameter, Source};
use crate::error::{Error, Result};
use crate::layers::file::FileLayer;
use crate::layers::{cli, env};
use crate::value::{FromValue, Value};

// ============================================================================
// Conflict policy
// ============================================================================

/// What to do when a registration collides with an earlier one on a
/// qualified name, an option string, or an argument binding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Reject the new registration with an error.
    #[default]
    Error,
    /// Accept it; the later registration takes over the contested name or
    /// option.
    Resolve,
}

// ============================================================================
// Registry
// ============================================================================

/// The central declaration store and resolver.
pub struct Registry {
    context: Context,
    declarations: IndexMap<String, Declaration>,
    groups: IndexSet<String>,
    grouped: IndexMap<String, Vec<String>>,
    files: Vec<FileLayer>,
    matches: Option<ArgMatches>,
    parsed: bool,
    group_prefix: bool,
    conflict_policy: ConflictPolicy,
    description: Option<String>,
    // Arbitration tables for the argument surface. clap aborts on duplicate
    // option strings or ids, so ownership is settled here before a command
    // is ever built: option string -> qualified name, argument id ->
    // qualified name.
    claimed_options: IndexMap<String, String>,
    claimed_ids: IndexMap<String, String>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create a registry reading the real process environment and argv.
    pub fn new() -> Self {
        Self::with_context(Context::from_process())
    }

    /// Create a registry over an explicit context. Tests and embedders use
    /// this to control the program name, arguments and environment.
    pub fn with_context(context: Context) -> Self {
        Self {
            context,
            declarations: IndexMap::new(),
            groups: IndexSet::new(),
            grouped: IndexMap::new(),
            files: Vec::new(),
            matches: None,
            parsed: false,
            group_prefix: true,
            conflict_policy: ConflictPolicy::default(),
            description: None,
            claimed_options: IndexMap::new(),
            claimed_ids: IndexMap::new(),
        }
    }

    /// Enable or disable long-option group prefixing. When on (the
    /// default), a long option declared in group `logging` is rewritten
    /// from `--verbose` to `--logging-verbose` on the command line.
    #[must_use]
    pub fn group_prefix(mut self, enabled: bool) -> Self {
        self.group_prefix = enabled;
        self
    }

    /// Set the policy for colliding registrations.
    #[must_use]
    pub fn conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }

    /// Set the program description shown in `--help` output.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a parameter declaration.
    ///
    /// Fails when the declaration has no options, or when it collides with
    /// an earlier registration under [`ConflictPolicy::Error`]. A failed
    /// registration leaves the registry untouched.
    pub fn register(&mut self, parameter: Parameter) -> Result<()> {
        let declaration = Declaration::build(parameter, self.group_prefix)?;
        let qualified = declaration.qualified_name().to_string();

        if self.parsed {
            tracing::warn!(
                parameter = %qualified,
                "registered after arguments were parsed; its argument source takes effect on the next parse"
            );
        }

        // Validate everything before touching any table.
        if self.conflict_policy == ConflictPolicy::Error && self.declarations.contains_key(&qualified)
        {
            return Err(Error::DuplicateParameter(qualified));
        }
        if declaration.only().contains(Source::Argument) {
            for option in declaration.options() {
                if option == "-h" || option == "--help" {
                    return Err(Error::DuplicateOption {
                        option: option.clone(),
                        parameter: "help".to_string(),
                    });
                }
                if let Some(owner) = self.claimed_options.get(option)
                    && owner != &qualified
                    && self.conflict_policy == ConflictPolicy::Error
                {
                    return Err(Error::DuplicateOption {
                        option: option.clone(),
                        parameter: owner.clone(),
                    });
                }
            }
            if let Some(owner) = self.claimed_ids.get(declaration.argument_id())
                && owner != &qualified
                && self.conflict_policy == ConflictPolicy::Error
            {
                return Err(Error::DuplicateOption {
                    option: declaration.options()[0].clone(),
                    parameter: owner.clone(),
                });
            }
        }

        if declaration.only().contains(Source::Argument) {
            for option in declaration.options() {
                self.claimed_options
                    .insert(option.clone(), qualified.clone());
            }
            self.claimed_ids
                .insert(declaration.argument_id().to_string(), qualified.clone());
        }
        self.groups.insert(declaration.group().to_string());
        let members = self
            .grouped
            .entry(declaration.group().to_string())
            .or_default();
        if !members.contains(&qualified) {
            members.push(qualified.clone());
        }
        tracing::debug!(parameter = %qualified, "registered");
        self.declarations.insert(qualified, declaration);
        Ok(())
    }

    // ========================================================================
    // Configuration files
    // ========================================================================

    /// Register a configuration file.
    ///
    /// The file is read immediately. An unreadable or unparsable file is
    /// logged and skipped; it contributes no values until a later re-read
    /// succeeds. Registering an already-registered path re-reads it
    /// instead of adding it twice.
    ///
    /// When several registered files define the same key, the file
    /// registered last wins.
    pub fn add_configuration_file(&mut self, path: impl Into<Utf8PathBuf>) {
        let path = path.into();
        if let Some(layer) = self.files.iter().find(|layer| layer.path() == path) {
            layer.reload();
            return;
        }
        match FileLayer::open(path.clone()) {
            Ok(layer) => {
                tracing::debug!(path = %path, "configuration file registered");
                self.files.push(layer);
            }
            Err(error) => {
                tracing::warn!(path = %path, %error, "configuration file unreadable, skipping");
            }
        }
    }

    /// Re-read every registered configuration file from disk.
    pub fn read_configuration_files(&self) {
        for layer in &self.files {
            layer.reload();
        }
    }

    /// Paths of the registered configuration files, in registration order.
    pub fn configuration_files(&self) -> impl Iterator<Item = &Utf8Path> {
        self.files.iter().map(FileLayer::path)
    }

    #[cfg(feature = "watch")]
    pub(crate) fn file_layers(&self) -> &[FileLayer] {
        &self.files
    }

    // ========================================================================
    // Parsing
    // ========================================================================

    /// Parse the context's command line against the registered argument
    /// surface. Unknown arguments are an error, reported the way the
    /// program's users expect (usage message and exit).
    pub fn parse(&mut self) {
        self.parse_inner(false);
    }

    /// Parse the command line leniently: unknown arguments are skipped, and
    /// help requests are ignored rather than acted on. Used by programs
    /// that register parameters in stages and parse between stages.
    pub fn parse_only_known(&mut self) {
        self.parse_inner(true);
    }

    fn parse_inner(&mut self, only_known: bool) {
        // A lenient parse does not count as the real one.
        self.parsed = !only_known || self.parsed;
        let command = cli::build_command(
            self.context.program(),
            self.description.as_deref(),
            &self.declarations,
            &self.claimed_options,
            &self.claimed_ids,
            only_known,
        );
        let argv: Vec<&str> = if only_known {
            self.known_arguments(self.context.argv())
        } else {
            self.context.argv().iter().map(String::as_str).collect()
        };
        let matches = match command.try_get_matches_from(argv) {
            Ok(matches) => matches,
            Err(error) => error.exit(),
        };
        self.matches = Some(matches);
    }

    /// Strip help flags, unregistered options, and the value each unknown
    /// option appears to take from the argument vector. clap's lenient mode
    /// stops binding at the first token it cannot place, so the lenient
    /// parse must never see one; known arguments after an unknown token
    /// still bind this way.
    fn known_arguments<'a>(&self, argv: &'a [String]) -> Vec<&'a str> {
        let mut kept = Vec::with_capacity(argv.len());
        let mut tokens = argv.iter().map(String::as_str).peekable();
        while let Some(token) = tokens.next() {
            if is_help_flag(token) {
                continue;
            }
            if let Some(rest) = token.strip_prefix("--") {
                let name = rest.split_once('=').map_or(rest, |(name, _)| name);
                if self.claimed_options.contains_key(&format!("--{name}")) {
                    kept.push(token);
                } else if !token.contains('=')
                    && let Some(next) = tokens.peek()
                    && !next.starts_with('-')
                {
                    tokens.next();
                }
            } else if token.len() > 1 && token.starts_with('-') {
                // Short option, possibly combined or with an attached value.
                if self.claimed_options.contains_key(&token[..2]) {
                    kept.push(token);
                } else if token.len() == 2
                    && let Some(next) = tokens.peek()
                    && !next.starts_with('-')
                {
                    tokens.next();
                }
            } else {
                kept.push(token);
            }
        }
        kept
    }

    /// Whether a full (non-lenient) parse has happened.
    pub fn is_parsed(&self) -> bool {
        self.parsed
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Resolve the effective value of a parameter by name.
    ///
    /// The name may be qualified (`group.name`) or bare; a bare name is
    /// looked up in the `default` group. Hyphens and underscores are
    /// interchangeable.
    pub fn resolve(&self, name: &str) -> Result<Value> {
        let declaration = self
            .lookup(name)
            .ok_or_else(|| Error::UnknownParameter(unqualified(name)))?;
        if !self.parsed {
            tracing::warn!(
                parameter = %declaration.qualified_name(),
                "resolved before arguments were parsed; argument values are unavailable"
            );
        }

        let mut value = declaration.default_value().clone();

        if declaration.only().contains(Source::Environment)
            && let Some(raw) = env::lookup(declaration, &self.context)
        {
            value = Value::Str(raw);
        }

        if declaration.only().contains(Source::Configuration) {
            let mut from_file = None;
            for layer in &self.files {
                if let Some(raw) = layer.get(declaration.group(), declaration.local_name()) {
                    from_file = Some(raw);
                }
            }
            if let Some(raw) = from_file {
                value = Value::Str(raw);
            }
        }

        if declaration.only().contains(Source::Argument)
            && let Some(matches) = &self.matches
            && let Some(from_argv) = cli::value_for(matches, declaration)
        {
            value = from_argv;
        }

        Ok(value)
    }

    /// Resolve a parameter and coerce it to `T`.
    ///
    /// Returns `Ok(None)` when the parameter resolved to no value at all
    /// (no source produced one and no default was declared).
    pub fn resolve_as<T: FromValue>(&self, name: &str) -> Result<Option<T>> {
        let value = self.resolve(name)?;
        if value.is_absent() {
            return Ok(None);
        }
        T::from_value(&value)
            .map(Some)
            .map_err(|source| Error::Coercion {
                parameter: unqualified(name),
                source,
            })
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// The declaration behind a (possibly bare) parameter name.
    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.lookup(name)
    }

    /// Every group with at least one registered parameter, in first-seen
    /// order.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(String::as_str)
    }

    /// Qualified names of every parameter registered under `group`, in
    /// registration order.
    pub fn group_members(&self, group: &str) -> &[String] {
        self.grouped.get(group).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The context this registry reads arguments and environment from.
    pub fn context(&self) -> &Context {
        &self.context
    }

    fn lookup(&self, name: &str) -> Option<&Declaration> {
        let name = name.replace('-', "_");
        self.declarations
            .get(&name)
            .or_else(|| self.declarations.get(&format!("default.{name}")))
    }
}

fn is_help_flag(arg: &str) -> bool {
    arg == "-h" || arg == "--help" || arg.starts_with("--help=")
}

/// Strip the implicit `default.` group from a name destined for an error
/// message, so callers see the form they asked with.
fn unqualified(name: &str) -> String {
    let name = name.replace('-', "_");
    match name.strip_prefix("default.") {
        Some(bare) => bare.to_string(),
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MockEnv;

    fn registry(argv: &[&str]) -> Registry {
        Registry::with_context(Context::new("testprog", argv.iter().copied()))
    }

    #[test]
    fn default_is_absent_when_undeclared() {
        let mut registry = registry(&[]);
        registry.register(Parameter::new(["--port"])).unwrap();
        registry.parse();
        assert!(registry.resolve("port").unwrap().is_absent());
    }

    #[test]
    fn argument_overrides_default() {
        let mut registry = registry(&["--port", "8080"]);
        registry
            .register(Parameter::new(["--port"]).default("3000"))
            .unwrap();
        registry.parse();
        assert_eq!(registry.resolve("port").unwrap(), Value::Str("8080".into()));
    }

    #[test]
    fn environment_overrides_default() {
        let context = Context::new("testprog", [] as [&str; 0])
            .with_env(MockEnv::from_pairs([("TESTPROG_PORT", "9090")]));
        let mut registry = Registry::with_context(context);
        registry
            .register(Parameter::new(["--port"]).default("3000"))
            .unwrap();
        registry.parse();
        assert_eq!(registry.resolve("port").unwrap(), Value::Str("9090".into()));
    }

    #[test]
    fn argument_overrides_environment() {
        let context = Context::new("testprog", ["--port", "8080"])
            .with_env(MockEnv::from_pairs([("TESTPROG_PORT", "9090")]));
        let mut registry = Registry::with_context(context);
        registry.register(Parameter::new(["--port"])).unwrap();
        registry.parse();
        assert_eq!(registry.resolve("port").unwrap(), Value::Str("8080".into()));
    }

    #[test]
    fn unknown_parameter_reports_bare_name() {
        let registry = registry(&[]);
        match registry.resolve("default.missing") {
            Err(Error::UnknownParameter(name)) => assert_eq!(name, "missing"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn bare_and_qualified_names_are_interchangeable() {
        let mut registry = registry(&["--port", "8080"]);
        registry.register(Parameter::new(["--port"])).unwrap();
        registry.parse();
        assert_eq!(
            registry.resolve("port").unwrap(),
            registry.resolve("default.port").unwrap()
        );
    }

    #[test]
    fn hyphens_and_underscores_are_interchangeable() {
        let mut registry = registry(&["--log-level", "debug"]);
        registry.register(Parameter::new(["--log-level"])).unwrap();
        registry.parse();
        assert_eq!(
            registry.resolve("log-level").unwrap(),
            Value::Str("debug".into())
        );
        assert_eq!(
            registry.resolve("log_level").unwrap(),
            Value::Str("debug".into())
        );
    }

    #[test]
    fn duplicate_name_rejected_by_default() {
        let mut registry = registry(&[]);
        registry.register(Parameter::new(["--port"])).unwrap();
        match registry.register(Parameter::new(["--port"])) {
            Err(Error::DuplicateParameter(name)) => assert_eq!(name, "default.port"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn duplicate_option_rejected_by_default() {
        let mut registry = registry(&[]);
        registry
            .register(Parameter::new(["--port", "-p"]))
            .unwrap();
        match registry.register(Parameter::new(["--parallel", "-p"])) {
            Err(Error::DuplicateOption { option, parameter }) => {
                assert_eq!(option, "-p");
                assert_eq!(parameter, "default.port");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn resolve_policy_lets_later_registration_win() {
        let mut registry = Registry::with_context(Context::new("testprog", ["-p", "x"]))
            .conflict_policy(ConflictPolicy::Resolve);
        registry.register(Parameter::new(["--port", "-p"])).unwrap();
        registry
            .register(Parameter::new(["--parallel", "-p"]))
            .unwrap();
        registry.parse();
        assert_eq!(
            registry.resolve("parallel").unwrap(),
            Value::Str("x".into())
        );
        // The earlier declaration no longer owns -p.
        assert!(registry.resolve("port").unwrap().is_absent());
    }

    #[test]
    fn help_options_are_reserved() {
        let mut registry = registry(&[]);
        match registry.register(Parameter::new(["--help"])) {
            Err(Error::DuplicateOption { parameter, .. }) => assert_eq!(parameter, "help"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn source_restriction_disables_other_sources() {
        let context = Context::new("testprog", ["--port", "8080"])
            .with_env(MockEnv::from_pairs([("TESTPROG_PORT", "9090")]));
        let mut registry = Registry::with_context(context);
        registry
            .register(
                Parameter::new(["--port"])
                    .only([Source::Environment])
                    .default("3000"),
            )
            .unwrap();
        registry.parse_only_known();
        assert_eq!(registry.resolve("port").unwrap(), Value::Str("9090".into()));
    }

    #[test]
    fn only_known_parse_binds_arguments_after_unknown_tokens() {
        let mut registry = registry(&["--mystery", "x", "--port", "8080"]);
        registry.register(Parameter::new(["--port"])).unwrap();
        registry.parse_only_known();
        assert_eq!(registry.resolve("port").unwrap(), Value::Str("8080".into()));
    }

    #[test]
    fn resolve_as_coerces() {
        let mut registry = registry(&["--port", "8080"]);
        registry.register(Parameter::new(["--port"])).unwrap();
        registry.parse();
        assert_eq!(registry.resolve_as::<u16>("port").unwrap(), Some(8080));
    }

    #[test]
    fn resolve_as_absent_is_none() {
        let mut registry = registry(&[]);
        registry.register(Parameter::new(["--port"])).unwrap();
        registry.parse();
        assert_eq!(registry.resolve_as::<u16>("port").unwrap(), None);
    }

    #[test]
    fn resolve_as_reports_coercion_failure() {
        let mut registry = registry(&["--port", "not-a-number"]);
        registry.register(Parameter::new(["--port"])).unwrap();
        registry.parse();
        match registry.resolve_as::<u16>("port") {
            Err(Error::Coercion { parameter, .. }) => assert_eq!(parameter, "port"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn groups_and_members_are_introspectable() {
        let mut registry = registry(&[]);
        registry.register(Parameter::new(["--port"])).unwrap();
        registry
            .register(Parameter::new(["--host"]).group("database"))
            .unwrap();
        let groups: Vec<_> = registry.groups().collect();
        assert_eq!(groups, ["default", "database"]);
        assert_eq!(registry.group_members("database"), ["database.host"]);
    }
}
