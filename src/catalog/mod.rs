//! Catalog documents: loading, `with` expansion and mark substitution.

pub mod expand;
pub mod loader;
pub mod marks;

/// A parsed catalog or substitution document
pub type CatalogNode = serde_yaml::Value;

/// Key of the macro clause on catalog mappings
pub const WITH_KEY: &str = "with";

pub use expand::{expand, expand_in_place};
pub use loader::{
    load_catalog, load_substitutions, parse_catalog, parse_substitutions, select_targets, Target,
    DEFAULT_TARGET,
};
