//! Shell-style variable expansion for raw environment values.
//!
//! Supports `$VAR` and `${VAR}` references, looked up against the injected
//! environment source. Expansion is tolerant: a reference to an unset
//! variable, or a malformed reference, is left verbatim rather than failing
//! the resolution.

use std::borrow::Cow;

use crate::context::EnvSource;

fn is_name_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

fn is_name_char(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

/// Expand `$VAR` / `${VAR}` references in `input`.
///
/// Returns `Cow::Borrowed(input)` when no substitution occurred.
pub(crate) fn expand<'a>(input: &'a str, env: &dyn EnvSource) -> Cow<'a, str> {
    // Quick check: if there's no $ in the string, no expansion possible.
    if !input.contains('$') {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut modified = false;

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        match chars.peek() {
            // ${VAR}
            Some('{') => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                while let Some(&ch) = chars.peek() {
                    if ch == '}' {
                        chars.next();
                        closed = true;
                        break;
                    }
                    name.push(ch);
                    chars.next();
                }
                if !closed {
                    // Unclosed brace, keep the reference verbatim.
                    result.push_str("${");
                    result.push_str(&name);
                    continue;
                }
                match env.get(&name) {
                    Some(value) => {
                        result.push_str(&value);
                        modified = true;
                    }
                    None => {
                        result.push_str("${");
                        result.push_str(&name);
                        result.push('}');
                    }
                }
            }
            // $VAR
            Some(&ch) if is_name_start(ch) => {
                let mut name = String::new();
                while let Some(&ch) = chars.peek() {
                    if !is_name_char(ch) {
                        break;
                    }
                    name.push(ch);
                    chars.next();
                }
                match env.get(&name) {
                    Some(value) => {
                        result.push_str(&value);
                        modified = true;
                    }
                    None => {
                        result.push('$');
                        result.push_str(&name);
                    }
                }
            }
            // Stray $, keep as literal.
            _ => result.push('$'),
        }
    }

    if modified {
        Cow::Owned(result)
    } else {
        Cow::Borrowed(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MockEnv;

    #[test]
    fn no_expansion() {
        let env = MockEnv::new();
        let result = expand("hello world", &env);
        assert_eq!(result, "hello world");
        assert!(matches!(result, Cow::Borrowed(_)));
    }

    #[test]
    fn braced_reference() {
        let env = MockEnv::from_pairs([("FOO", "foo")]);
        assert_eq!(expand("${FOO}", &env), "foo");
        assert_eq!(expand("${FOO}/data", &env), "foo/data");
    }

    #[test]
    fn bare_reference() {
        let env = MockEnv::from_pairs([("BASE", "/var/app")]);
        assert_eq!(expand("$BASE/data", &env), "/var/app/data");
    }

    #[test]
    fn multiple_references() {
        let env = MockEnv::from_pairs([("A", "1"), ("B", "2")]);
        assert_eq!(expand("$A:${B}", &env), "1:2");
    }

    #[test]
    fn unset_variable_stays_verbatim() {
        let env = MockEnv::new();
        assert_eq!(expand("${MISSING}", &env), "${MISSING}");
        assert_eq!(expand("$MISSING/tail", &env), "$MISSING/tail");
    }

    #[test]
    fn unclosed_brace_stays_verbatim() {
        let env = MockEnv::from_pairs([("X", "x")]);
        assert_eq!(expand("${UNCLOSED", &env), "${UNCLOSED");
    }

    #[test]
    fn bare_dollar_is_literal() {
        let env = MockEnv::new();
        assert_eq!(expand("$5.00", &env), "$5.00");
        assert_eq!(expand("trailing$", &env), "trailing$");
    }
}
