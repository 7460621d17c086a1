use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Component, Path};
use tracing::{debug, info};

use crate::catalog::CatalogNode;
use crate::error::{ApogeeError, Result};

/// Name of the target used when the substitution document defines none
pub const DEFAULT_TARGET: &str = "default";

/// One output target: its name and the merged substitution values
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    pub name: String,
    pub values: Mapping,
}

impl Target {
    pub fn new(name: impl Into<String>, values: Mapping) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SubstitutionDocument {
    #[serde(default)]
    globals: Option<Mapping>,
    #[serde(default)]
    targets: Option<Mapping>,
}

/// Read and parse a catalog file
pub fn load_catalog(path: &Path) -> Result<CatalogNode> {
    let text = fs::read_to_string(path).map_err(|e| ApogeeError::read_failed(path, e))?;
    let catalog = parse_catalog(&text, path)?;

    info!(path = %path.display(), "Loaded catalog");
    Ok(catalog)
}

pub fn parse_catalog(text: &str, path: &Path) -> Result<CatalogNode> {
    serde_yaml::from_str(text).map_err(|e| ApogeeError::catalog_parse(path, &e))
}

/// Read the substitution document. A missing file yields the single
/// `default` target with no values.
pub fn load_substitutions(path: &Path) -> Result<Vec<Target>> {
    if !path.exists() {
        debug!(path = %path.display(), "No substitution document, using the default target");
        return Ok(vec![Target::new(DEFAULT_TARGET, Mapping::new())]);
    }

    let text = fs::read_to_string(path).map_err(|e| ApogeeError::read_failed(path, e))?;
    let targets = parse_substitutions(&text, path)?;

    info!(
        path = %path.display(),
        targets = targets.len(),
        "Loaded substitution document"
    );
    Ok(targets)
}

/// Parse a substitution document into targets, in document order. Each
/// target's values are the globals overridden by its own mapping.
pub fn parse_substitutions(text: &str, path: &Path) -> Result<Vec<Target>> {
    let document: SubstitutionDocument = if text.trim().is_empty() {
        SubstitutionDocument::default()
    } else {
        serde_yaml::from_str(text).map_err(|e| ApogeeError::config_parse(path, &e))?
    };

    let globals = document.globals.unwrap_or_default();
    let Some(targets) = document.targets else {
        return Ok(vec![Target::new(DEFAULT_TARGET, globals)]);
    };

    let mut result = Vec::with_capacity(targets.len());
    for (name, values) in targets {
        let name = match name {
            Value::String(s) => s,
            other => {
                return Err(ApogeeError::Configuration(format!(
                    "target names must be strings, found {:?} in {}",
                    other,
                    path.display()
                )))
            }
        };
        if !is_plain_name(&name) {
            return Err(ApogeeError::Configuration(format!(
                "target name '{}' in {} must be a plain directory name",
                name,
                path.display()
            )));
        }
        let own = match values {
            Value::Mapping(m) => m,
            Value::Null => Mapping::new(),
            _ => {
                return Err(ApogeeError::Configuration(format!(
                    "target '{}' in {} must be a mapping",
                    name,
                    path.display()
                )))
            }
        };

        let mut merged = globals.clone();
        for (key, value) in own {
            merged.insert(key, value);
        }
        result.push(Target::new(name, merged));
    }

    if result.is_empty() {
        return Err(ApogeeError::Configuration(format!(
            "{} defines an empty targets mapping",
            path.display()
        )));
    }

    Ok(result)
}

/// Target names become directories below the output directory
fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Keep only the targets named in `selected`; all of them when empty
pub fn select_targets(targets: Vec<Target>, selected: &[String]) -> Result<Vec<Target>> {
    if selected.is_empty() {
        return Ok(targets);
    }

    if let Some(unknown) = selected.iter().find(|s| !targets.iter().any(|t| &t.name == *s)) {
        return Err(ApogeeError::UnknownTarget(unknown.clone()));
    }

    Ok(targets
        .into_iter()
        .filter(|t| selected.contains(&t.name))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn parse(text: &str) -> Result<Vec<Target>> {
        parse_substitutions(text, Path::new("apogeeconf.yml"))
    }

    #[test]
    fn test_targets_merge_globals() {
        let targets = parse(indoc! {"
            globals:
              host: localhost
              port: 5432
            targets:
              test:
                db: catastro_test
              prod:
                db: catastro
                host: db.example.org
        "})
        .unwrap();

        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].name, "test");
        assert_eq!(targets[0].values.get("host"), Some(&Value::String("localhost".into())));
        assert_eq!(targets[0].values.get("db"), Some(&Value::String("catastro_test".into())));
        assert_eq!(targets[1].name, "prod");
        assert_eq!(targets[1].values.get("host"), Some(&Value::String("db.example.org".into())));
    }

    #[test]
    fn test_globals_only_gives_default_target() {
        let targets = parse("globals:\n  db: x\n").unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].name, DEFAULT_TARGET);
        assert_eq!(targets[0].values.get("db"), Some(&Value::String("x".into())));

        let empty = parse("").unwrap();
        assert_eq!(empty[0].name, DEFAULT_TARGET);
        assert!(empty[0].values.is_empty());
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            parse("globals: [unclosed"),
            Err(ApogeeError::ConfigParse { .. })
        ));
        assert!(matches!(
            parse("targets:\n  dev: 3\n"),
            Err(ApogeeError::Configuration(_))
        ));
        assert!(matches!(
            parse("unknown: 1\n"),
            Err(ApogeeError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_target_names_must_be_plain() {
        for name in ["../escaped", "/abs", "a/b", ".", "''"] {
            let doc = format!("targets:\n  {}:\n    db: x\n", name);
            assert!(
                matches!(parse(&doc), Err(ApogeeError::Configuration(ref m)) if m.contains("plain directory name")),
                "target {} was accepted",
                name
            );
        }
        assert_eq!(parse("targets:\n  dev_1: {}\n").unwrap()[0].name, "dev_1");
    }

    #[test]
    fn test_missing_file_is_default_target() {
        let targets = load_substitutions(Path::new("/nonexistent/apogeeconf.yml")).unwrap();
        assert_eq!(targets, vec![Target::new(DEFAULT_TARGET, Mapping::new())]);
    }

    #[test]
    fn test_select_targets() {
        let targets = vec![
            Target::new("a", Mapping::new()),
            Target::new("b", Mapping::new()),
        ];

        let picked = select_targets(targets.clone(), &["b".to_string()]).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].name, "b");

        assert!(matches!(
            select_targets(targets, &["c".to_string()]),
            Err(ApogeeError::UnknownTarget(ref t)) if t == "c"
        ));
    }

    #[test]
    fn test_catalog_parse_error_names_file() {
        let err = parse_catalog("- id: [", Path::new("catalog.yml")).unwrap_err();
        assert!(matches!(err, ApogeeError::CatalogParse { .. }));
    }
}
