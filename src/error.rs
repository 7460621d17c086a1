use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::sql::ObjectKind;

/// Main error type for apogee
#[derive(Error, Debug)]
pub enum ApogeeError {
    // Document Errors
    #[error("Malformed catalog {}: {message}", .path.display())]
    CatalogParse {
        path: PathBuf,
        message: String,
        line: Option<usize>,
        column: Option<usize>,
    },

    #[error("Malformed configuration {}: {message}", .path.display())]
    ConfigParse {
        path: PathBuf,
        message: String,
        line: Option<usize>,
        column: Option<usize>,
    },

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    // Object Definition Errors
    #[error("Object lacks id:\n{object}")]
    MissingId { object: String },

    #[error("Invalid object id '{0}', expected <Type>::<name>")]
    InvalidObjectId(String),

    #[error("Unknown type {kind} in object {id}")]
    UnknownObjectType { kind: String, id: String },

    #[error("Duplicate object id {0}")]
    DuplicateId(String),

    #[error("Object {id} is invalid: {message}")]
    InvalidSpec { id: String, message: String },

    #[error("Object {0} still carries a 'with' clause; expand the catalog before resolving it")]
    UnexpandedWith(String),

    // Expansion Errors
    #[error("'with' clause at {path} is not an element of a sequence")]
    WithOutsideSequence { path: String },

    #[error("Invalid 'with' clause at {path}: {message}")]
    InvalidWith { path: String, message: String },

    #[error("Substitution key '{key}' not found at {path}")]
    MissingSubstitutionKey { key: String, path: String },

    #[error("Cannot substitute '{key}' at {path}: {message}")]
    InvalidSubstitution {
        key: String,
        path: String,
        message: String,
    },

    // Resolution Errors
    #[error("Object {0} not found in catalog")]
    ObjectNotFound(String),

    #[error("Object {id} is a {found}, expected {expected}")]
    WrongKind {
        id: String,
        expected: String,
        found: ObjectKind,
    },

    #[error("{kind} objects do not support action '{action}'")]
    UnsupportedAction { kind: ObjectKind, action: String },

    #[error("Action '{action}' requires argument '{argument}'")]
    MissingArgument { action: String, argument: String },

    #[error("{0} is not listed by any schema and no schema was given")]
    MissingSchema(String),

    #[error("Script {id} has an invalid file path: {path}")]
    InvalidScriptPath { id: String, path: String },

    #[error("Snippet {} has no block tagged '{tag}'", .file.display())]
    SnippetTagNotFound { file: PathBuf, tag: String },

    #[error("Unknown target: {0}")]
    UnknownTarget(String),

    #[error("Output file {} is produced twice", .0.display())]
    DuplicateOutput(PathBuf),

    #[error("Refusing to replace output directory {}: it contains {}", .path.display(), .contains.display())]
    UnsafeOutputDir { path: PathBuf, contains: PathBuf },

    // File System Errors
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("Failed to read {}: {message}", .path.display())]
    FileRead {
        path: PathBuf,
        message: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {message}", .path.display())]
    FileWrite {
        path: PathBuf,
        message: String,
        #[source]
        source: std::io::Error,
    },

    // Configuration Errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to load configuration from {}: {message}", .path.display())]
    ConfigLoad { path: PathBuf, message: String },

    // General Errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApogeeError {
    /// Classify an I/O failure that happened while reading `path`
    pub fn read_failed(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => ApogeeError::FileNotFound(path),
            std::io::ErrorKind::PermissionDenied => ApogeeError::PermissionDenied(path),
            _ => ApogeeError::FileRead {
                path,
                message: err.to_string(),
                source: err,
            },
        }
    }

    /// Classify an I/O failure that happened while writing `path`
    pub fn write_failed(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => ApogeeError::PermissionDenied(path),
            _ => ApogeeError::FileWrite {
                path,
                message: err.to_string(),
                source: err,
            },
        }
    }

    /// Build a catalog parse error carrying the YAML location, if any
    pub fn catalog_parse(path: &Path, err: &serde_yaml::Error) -> Self {
        let location = err.location();
        ApogeeError::CatalogParse {
            path: path.to_path_buf(),
            message: err.to_string(),
            line: location.as_ref().map(|l| l.line()),
            column: location.as_ref().map(|l| l.column()),
        }
    }

    /// Build a configuration parse error carrying the YAML location, if any
    pub fn config_parse(path: &Path, err: &serde_yaml::Error) -> Self {
        let location = err.location();
        ApogeeError::ConfigParse {
            path: path.to_path_buf(),
            message: err.to_string(),
            line: location.as_ref().map(|l| l.line()),
            column: location.as_ref().map(|l| l.column()),
        }
    }
}

/// Result type alias for apogee operations
pub type Result<T> = std::result::Result<T, ApogeeError>;

/// Helper function to format error with all its causes
pub fn format_error_chain(err: &ApogeeError) -> String {
    use std::error::Error;

    let mut output = format!("Error: {}", err);

    let mut current_err: &dyn Error = err;
    while let Some(source) = current_err.source() {
        output.push_str(&format!("\n  Caused by: {}", source));
        current_err = source;
    }

    output
}

/// Helper function to suggest fixes for common errors
pub fn suggest_fix(err: &ApogeeError) -> Option<String> {
    match err {
        ApogeeError::FileNotFound(path) => Some(format!(
            "File not found: {}\n\
             - Check if the path is correct\n\
             - Ensure you're running apogee from the right directory",
            path.display()
        )),
        ApogeeError::PermissionDenied(path) => Some(format!(
            "Permission denied for: {}\n\
             - Check file permissions",
            path.display()
        )),
        ApogeeError::CatalogParse {
            path, line, column, ..
        } => Some(match (line, column) {
            (Some(line), Some(column)) => format!(
                "YAML syntax error in {} at line {}, column {}\n\
                 - Check indentation and quoting around that position",
                path.display(),
                line,
                column
            ),
            _ => format!(
                "YAML syntax error in {}\n\
                 - Check indentation and quoting",
                path.display()
            ),
        }),
        ApogeeError::UnknownObjectType { kind, .. } => Some(format!(
            "'{}' is not an object type.\n\
             - Known types: {}",
            kind,
            ObjectKind::PRECEDENCE
                .iter()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )),
        ApogeeError::ObjectNotFound(id) => Some(format!(
            "Object '{}' is referenced before it exists.\n\
             - Ensure '{}' is defined in the catalog\n\
             - Objects may only reference types constructed earlier: {}\n\
             - Within one type, define the referenced object first",
            id,
            id,
            ObjectKind::PRECEDENCE
                .iter()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(" -> ")
        )),
        ApogeeError::MissingSubstitutionKey { key, .. } => Some(format!(
            "Every entry of the enclosing 'with' list must define '{}'.\n\
             - Use _#{}_# or _{{{}}}_ when the mark is followed by word characters",
            key, key, key
        )),
        ApogeeError::UnsafeOutputDir { path, .. } => Some(format!(
            "The output directory is removed and rewritten on every build.\n\
             - Point --output-dir at a dedicated directory instead of {}",
            path.display()
        )),
        ApogeeError::WithOutsideSequence { .. } => Some(
            "'with' clauses expand into sibling objects, so the object carrying it must be \
             an item of a list"
                .to_string(),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_failed_classifies_kind() {
        let err = ApogeeError::read_failed(
            "catalog.yml",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, ApogeeError::FileNotFound(ref p) if p == Path::new("catalog.yml")));

        let err = ApogeeError::read_failed(
            "catalog.yml",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "no"),
        );
        assert!(matches!(err, ApogeeError::PermissionDenied(_)));

        let err = ApogeeError::read_failed(
            "catalog.yml",
            std::io::Error::new(std::io::ErrorKind::InvalidData, "bad bytes"),
        );
        assert!(matches!(err, ApogeeError::FileRead { .. }));
    }

    #[test]
    fn test_catalog_parse_keeps_location() {
        let yaml_err = serde_yaml::from_str::<serde_yaml::Value>("a: [1, 2\nb: c").unwrap_err();
        let err = ApogeeError::catalog_parse(Path::new("catalog.yml"), &yaml_err);

        match &err {
            ApogeeError::CatalogParse { line, .. } => assert!(line.is_some()),
            other => panic!("unexpected error {:?}", other),
        }
        assert!(err.to_string().starts_with("Malformed catalog catalog.yml"));
    }
}
