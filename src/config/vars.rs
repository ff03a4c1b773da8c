//! `${name}` / `$env{NAME}` placeholder expansion for connection parameters.

use crate::core::{CorpusError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    static ref PLACEHOLDER: Regex =
        Regex::new(r"\$(env)?\{([^{}$]*)\}").expect("placeholder pattern is valid");
    static ref OPENING: Regex = Regex::new(r"\$(env)?\{").expect("opening pattern is valid");
}

/// Replace every placeholder in `template`.
///
/// `${name}` is looked up in `vars`, `$env{NAME}` in the process environment.
/// Unknown names, empty names and unterminated placeholders are configuration
/// errors.
pub fn expand(template: &str, vars: &HashMap<String, String>) -> Result<String> {
    let mut expanded = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(template) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        check_literal(&template[last..whole.start()], template)?;
        expanded.push_str(&template[last..whole.start()]);

        let name = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
        if name.is_empty() {
            return Err(CorpusError::Configuration(format!(
                "empty placeholder in '{}'",
                template
            )));
        }

        let value = if caps.get(1).is_some() {
            std::env::var(name).map_err(|_| {
                CorpusError::Configuration(format!("environment variable '{}' is not set", name))
            })?
        } else {
            vars.get(name).cloned().ok_or_else(|| {
                CorpusError::Configuration(format!("unknown placeholder '${{{}}}'", name))
            })?
        };
        expanded.push_str(&value);
        last = whole.end();
    }

    check_literal(&template[last..], template)?;
    expanded.push_str(&template[last..]);
    Ok(expanded)
}

fn check_literal(segment: &str, template: &str) -> Result<()> {
    if OPENING.is_match(segment) {
        return Err(CorpusError::Configuration(format!(
            "malformed placeholder in '{}'",
            template
        )));
    }
    Ok(())
}

/// Literal (non-regex) replacement of `${key}` for each pair, used for SQL
/// templates where the values are identifiers, not configuration variables.
pub fn substitute_literal(template: &str, pairs: &[(&str, &str)]) -> String {
    pairs.iter().fold(template.to_string(), |acc, (key, value)| {
        acc.replace(&format!("${{{}}}", key), value)
    })
}
