//! `with` macro expansion.
//!
//! A mapping carrying a `with` list is a template: it is removed from its
//! sequence and one copy per `with` entry, with that entry's strict marks
//! substituted, is appended to the same sequence. The cursor stays on the
//! removal point so the copies are examined again further on, which expands
//! `with` clauses nested inside them.

use serde_yaml::Value;
use tracing::trace;

use crate::catalog::{marks, CatalogNode, WITH_KEY};
use crate::error::{ApogeeError, Result};

/// Expand every `with` clause of a tree
pub fn expand(mut node: CatalogNode) -> Result<CatalogNode> {
    expand_in_place(&mut node)?;
    Ok(node)
}

pub fn expand_in_place(node: &mut CatalogNode) -> Result<()> {
    expand_node(node, "$")
}

fn expand_node(node: &mut Value, path: &str) -> Result<()> {
    match node {
        Value::Sequence(items) => expand_sequence(items, path),
        Value::Mapping(map) => {
            if map.contains_key(WITH_KEY) {
                return Err(ApogeeError::WithOutsideSequence {
                    path: path.to_string(),
                });
            }
            for (key, value) in map.iter_mut() {
                let label = key.as_str().unwrap_or("?");
                expand_node(value, &format!("{}.{}", path, label))?;
            }
            Ok(())
        }
        Value::Tagged(tagged) => expand_node(&mut tagged.value, path),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => Ok(()),
    }
}

fn expand_sequence(items: &mut Vec<Value>, path: &str) -> Result<()> {
    let mut cursor = 0;

    while cursor < items.len() {
        let item_path = format!("{}[{}]", path, cursor);
        let with = match &mut items[cursor] {
            Value::Mapping(map) => map.remove(WITH_KEY),
            _ => None,
        };

        let Some(with) = with else {
            expand_node(&mut items[cursor], &item_path)?;
            cursor += 1;
            continue;
        };

        let template = items.remove(cursor);
        let entries = match with {
            Value::Sequence(entries) => entries,
            other => {
                return Err(ApogeeError::InvalidWith {
                    path: item_path,
                    message: format!("expected a list of mappings, found {}", describe(&other)),
                })
            }
        };

        trace!(path = %item_path, copies = entries.len(), "Expanding with clause");

        for (n, entry) in entries.into_iter().enumerate() {
            let values = match entry {
                Value::Mapping(values) => values,
                other => {
                    return Err(ApogeeError::InvalidWith {
                        path: item_path,
                        message: format!("entry {} is {}, expected a mapping", n, describe(&other)),
                    })
                }
            };

            let mut copy = template.clone();
            marks::substitute_strict(&mut copy, &values, &format!("{}.with[{}]", item_path, n))?;
            items.push(copy);
        }
    }

    Ok(())
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}
