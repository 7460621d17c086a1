//! Substitution marks.
//!
//! Two styles share one walker:
//! - permissive (`_@name_@`, `{{name}}`): target configuration values, missing
//!   keys are left in place
//! - strict (`_#name_#`, `_{name}_`, bare `_#name`): `with` entries, missing
//!   keys are an error
//!
//! Numbers and booleans always land as text. A string leaf that is exactly
//! one mark may take a list, mapping or null value with its YAML type; marks
//! embedded in text render scalars as text.

use regex::{Captures, Regex};
use serde_yaml::{Mapping, Value};
use std::sync::LazyLock;
use tracing::debug;

use crate::catalog::WITH_KEY;
use crate::error::{ApogeeError, Result};

static PERMISSIVE_MARK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"_@(\w+?)_@|\{\{\s*(\w+)\s*\}\}").expect("permissive mark pattern")
});

static STRICT_MARK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"_#(\w+?)_#|_\{(\w+)\}_|_#(\w+)").expect("strict mark pattern")
});

static REFERENCE_MARK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_&([A-Za-z]+::.+?)_&").expect("reference mark pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Permissive,
    Strict,
    /// Strict pass inside a nested `with` template: unknown keys belong to the
    /// inner expansion
    Deferring,
}

fn mark_name<'t>(caps: &Captures<'t>) -> &'t str {
    caps.iter()
        .skip(1)
        .flatten()
        .next()
        .map(|m| m.as_str())
        .unwrap_or_default()
}

/// Text form of a scalar, `None` for lists and mappings
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => None,
    }
}

/// Substitute the marks of one string. `None` when nothing changed.
fn substitute_str(
    text: &str,
    pattern: &Regex,
    values: &Mapping,
    mode: Mode,
    path: &str,
) -> Result<Option<Value>> {
    let missing = |key: &str| -> Result<()> {
        match mode {
            Mode::Strict => Err(ApogeeError::MissingSubstitutionKey {
                key: key.to_string(),
                path: path.to_string(),
            }),
            Mode::Permissive => {
                debug!(key = %key, path = %path, "Substitution key not configured");
                Ok(())
            }
            Mode::Deferring => Ok(()),
        }
    };

    if let Some(caps) = pattern.captures(text) {
        let whole = caps.get(0).map(|m| m.start() == 0 && m.end() == text.len());
        if whole == Some(true) {
            let key = mark_name(&caps);
            return match values.get(key) {
                Some(value @ (Value::Bool(_) | Value::Number(_))) => {
                    Ok(scalar_text(value).map(Value::String))
                }
                Some(value) => Ok(Some(value.clone())),
                None => missing(key).map(|_| None),
            };
        }
    } else {
        return Ok(None);
    }

    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut changed = false;

    for caps in pattern.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        let key = mark_name(&caps);
        out.push_str(&text[last..m.start()]);
        last = m.end();

        match values.get(key) {
            Some(value) => match scalar_text(value) {
                Some(rendered) => {
                    out.push_str(&rendered);
                    changed = true;
                }
                None if mode == Mode::Permissive => out.push_str(m.as_str()),
                None => {
                    return Err(ApogeeError::InvalidSubstitution {
                        key: key.to_string(),
                        path: path.to_string(),
                        message: "a list or mapping cannot be embedded in text".to_string(),
                    })
                }
            },
            None => {
                missing(key)?;
                out.push_str(m.as_str());
            }
        }
    }
    out.push_str(&text[last..]);

    Ok(changed.then_some(Value::String(out)))
}

fn key_label(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => scalar_text(other).unwrap_or_else(|| "?".to_string()),
    }
}

fn walk(node: &mut Value, pattern: &Regex, values: &Mapping, mode: Mode, path: &str) -> Result<()> {
    match node {
        Value::String(s) => {
            if let Some(replacement) = substitute_str(s, pattern, values, mode, path)? {
                *node = replacement;
            }
        }
        Value::Sequence(items) => {
            for (i, item) in items.iter_mut().enumerate() {
                walk(item, pattern, values, mode, &format!("{}[{}]", path, i))?;
            }
        }
        Value::Mapping(map) => {
            let mode = if mode == Mode::Strict && map.contains_key(WITH_KEY) {
                Mode::Deferring
            } else {
                mode
            };
            for (key, value) in map.iter_mut() {
                walk(value, pattern, values, mode, &format!("{}.{}", path, key_label(key)))?;
            }
        }
        Value::Tagged(tagged) => walk(&mut tagged.value, pattern, values, mode, path)?,
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
    Ok(())
}

/// Style A over a whole tree. Never fails; unknown keys stay literal.
pub fn substitute_permissive(node: &mut Value, values: &Mapping) -> Result<()> {
    walk(node, &PERMISSIVE_MARK, values, Mode::Permissive, "$")
}

/// Style B over a whole tree, as done for one `with` entry. `path` locates
/// the template in error messages.
pub fn substitute_strict(node: &mut Value, values: &Mapping, path: &str) -> Result<()> {
    walk(node, &STRICT_MARK, values, Mode::Strict, path)
}

/// Style A over free text such as snippet files
pub fn template(text: &str, values: &Mapping) -> String {
    match substitute_str(text, &PERMISSIVE_MARK, values, Mode::Permissive, "text") {
        Ok(Some(Value::String(s))) => s,
        Ok(Some(other)) => scalar_text(&other).unwrap_or_else(|| text.to_string()),
        _ => text.to_string(),
    }
}

/// Style A keys still present in a tree after substitution
pub fn unresolved_marks(node: &Value) -> Vec<String> {
    let mut found = Vec::new();
    collect_marks(node, &mut found);
    found.sort();
    found.dedup();
    found
}

fn collect_marks(node: &Value, found: &mut Vec<String>) {
    match node {
        Value::String(s) => {
            found.extend(PERMISSIVE_MARK.captures_iter(s).map(|c| mark_name(&c).to_string()))
        }
        Value::Sequence(items) => items.iter().for_each(|i| collect_marks(i, found)),
        Value::Mapping(map) => map.values().for_each(|v| collect_marks(v, found)),
        Value::Tagged(tagged) => collect_marks(&tagged.value, found),
        _ => {}
    }
}

/// Replace `_&<Type>::<name>_&` tokens in every string leaf with the text
/// returned by `lookup`, normally the referenced object's name
pub fn resolve_references<F>(node: &mut Value, lookup: &F) -> Result<()>
where
    F: Fn(&str) -> Result<String>,
{
    match node {
        Value::String(s) => {
            if REFERENCE_MARK.is_match(s) {
                let mut out = String::with_capacity(s.len());
                let mut last = 0;
                for caps in REFERENCE_MARK.captures_iter(s) {
                    let (Some(m), Some(id)) = (caps.get(0), caps.get(1)) else {
                        continue;
                    };
                    out.push_str(&s[last..m.start()]);
                    out.push_str(&lookup(id.as_str())?);
                    last = m.end();
                }
                out.push_str(&s[last..]);
                *s = out;
            }
        }
        Value::Sequence(items) => {
            for item in items {
                resolve_references(item, lookup)?;
            }
        }
        Value::Mapping(map) => {
            for (_, value) in map.iter_mut() {
                resolve_references(value, lookup)?;
            }
        }
        Value::Tagged(tagged) => resolve_references(&mut tagged.value, lookup)?,
        _ => {}
    }
    Ok(())
}
