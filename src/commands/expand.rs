use std::path::Path;

use crate::catalog::CatalogNode;
use crate::error::{ApogeeError, Result};
use crate::expand_catalog;

#[derive(Debug)]
pub struct ExpandResult {
    pub catalog: CatalogNode,
    pub yaml: String,
}

/// Expand the `with` clauses of a catalog and serialize the result
pub fn execute_expand(catalog_path: &Path) -> Result<ExpandResult> {
    let catalog = expand_catalog(catalog_path)?;
    let yaml = serde_yaml::to_string(&catalog)
        .map_err(|e| ApogeeError::Internal(format!("cannot serialize expanded catalog: {}", e)))?;

    Ok(ExpandResult { catalog, yaml })
}

#[cfg(feature = "cli")]
pub fn print_expand_summary(result: &ExpandResult) {
    print!("{}", result.yaml);
}
