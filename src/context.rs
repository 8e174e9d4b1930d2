//! The injected execution context: program name, argument vector, and
//! environment.
//!
//! The registry never reads `std::env` implicitly. A [`Context`] is captured
//! once (or constructed by hand in tests) and handed to the registry at
//! construction time, which keeps resolution pure with respect to process
//! state and removes test-isolation hazards.

use core::fmt;
use std::path::Path;

use indexmap::IndexMap;

/// Trait for abstracting over environment variable sources.
///
/// This allows testing without modifying the actual environment.
pub trait EnvSource {
    /// Get the value of an environment variable by name.
    fn get(&self, name: &str) -> Option<String>;
}

/// Environment source that reads from the actual process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdEnv;

impl EnvSource for StdEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Environment source backed by a map (for testing).
#[derive(Debug, Clone, Default)]
pub struct MockEnv {
    vars: IndexMap<String, String>,
}

impl MockEnv {
    /// Create a new empty mock environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock environment from an iterator of key-value pairs.
    pub fn from_pairs<I, K, V>(iter: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Set an environment variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }
}

impl EnvSource for MockEnv {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// The execution context a registry resolves against: the invoking program's
/// name, the argument vector (without the program name), and an environment.
pub struct Context {
    program: String,
    argv: Vec<String>,
    env: Box<dyn EnvSource>,
}

impl Context {
    /// Capture the real process context: `argv[0]`'s basename as the program
    /// name, the remaining arguments, and the process environment.
    pub fn from_process() -> Self {
        let mut args = std::env::args();
        let argv0 = args.next().unwrap_or_default();
        let program = Path::new(&argv0)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("program")
            .to_string();
        Self {
            program,
            argv: args.collect(),
            env: Box::new(StdEnv),
        }
    }

    /// Build a context with an explicit program name and argument vector,
    /// reading the real process environment.
    pub fn new<I, S>(program: impl Into<String>, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            argv: argv.into_iter().map(Into::into).collect(),
            env: Box::new(StdEnv),
        }
    }

    /// Replace the environment source (for testing).
    pub fn with_env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Box::new(env);
        self
    }

    /// The invoking program's name.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The argument vector, not including the program name.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub(crate) fn env(&self) -> &dyn EnvSource {
        self.env.as_ref()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::from_process()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("program", &self.program)
            .field("argv", &self.argv)
            .finish_non_exhaustive()
    }
}
