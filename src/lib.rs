pub mod analysis;
pub mod catalog;
#[cfg(feature = "cli")]
pub mod cli;
pub mod commands;
pub mod config;
pub mod docs;
pub mod error;
pub mod logging;
pub mod output;
pub mod registry;
pub mod sql;
pub mod writer;

use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub use analysis::ReferenceGraph;
pub use catalog::{CatalogNode, Target};
pub use config::ApogeeConfig;
pub use error::{ApogeeError, Result};
pub use output::{LibraryOutputHandler, OutputHandler, SilentOutputHandler};
pub use registry::Registry;
pub use writer::OutputTree;

pub use commands::{execute_build, execute_check, BuildResult, CheckResult};

/// A target whose catalog has been substituted and resolved
#[derive(Debug)]
pub struct ResolvedTarget {
    pub target: Target,
    pub registry: Registry,
    /// Style A marks with no configured value, left in place
    pub unresolved: Vec<String>,
}

/// One rendered script file
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedScript {
    pub file: String,
    pub content: String,
}

/// Load a catalog and expand its `with` clauses
pub fn expand_catalog(path: &Path) -> Result<CatalogNode> {
    let catalog = catalog::load_catalog(path)?;
    catalog::expand(catalog)
}

/// Apply a target's values to an expanded catalog and resolve its objects
pub fn resolve_target(expanded: &CatalogNode, target: Target) -> Result<ResolvedTarget> {
    let mut node = expanded.clone();
    catalog::marks::substitute_permissive(&mut node, &target.values)?;
    let unresolved = catalog::marks::unresolved_marks(&node);

    let registry = Registry::build(&node)?;
    info!(
        target_name = %target.name,
        objects = registry.len(),
        "Resolved target"
    );

    Ok(ResolvedTarget {
        target,
        registry,
        unresolved,
    })
}

/// Render every script of a resolved target, in catalog order
pub fn render_scripts(
    resolved: &ResolvedTarget,
    snippets_dir: Option<&Path>,
) -> Result<Vec<RenderedScript>> {
    let ctx = sql::RenderContext::new(&resolved.registry, &resolved.target.values)
        .with_snippets_dir(snippets_dir);

    resolved
        .registry
        .scripts()
        .map(|script| {
            debug!(script = %script.id, file = %script.file, "Rendering script");
            Ok(RenderedScript {
                file: script.file.clone(),
                content: script.render(&ctx)?,
            })
        })
        .collect()
}

/// Render every selected target into one output tree without touching disk
pub fn render_output(
    config: &ApogeeConfig,
    targets: &[String],
    output: &dyn OutputHandler,
) -> Result<(OutputTree, Vec<ResolvedTarget>)> {
    let expanded = expand_catalog(&config.catalog_path())?;
    let all_targets = catalog::load_substitutions(&config.substitutions_path())?;
    let selected = catalog::select_targets(all_targets, targets)?;

    let mut tree = OutputTree::new();
    let mut resolved_targets = Vec::with_capacity(selected.len());

    for target in selected {
        output.heading(&format!("Target {}", target.name));
        crate::log_target!(target.name.as_str(), "rendering");

        let resolved = resolve_target(&expanded, target)?;
        for mark in &resolved.unresolved {
            output.warning(&format!("No value configured for mark '{}'", mark));
        }

        let target_dir = PathBuf::from(&resolved.target.name);
        for script in render_scripts(&resolved, config.snippets_dir.as_deref())? {
            output.status("Rendered", &script.file);
            tree.add(target_dir.join(&script.file), script.content)?;
        }

        if config.docs_enabled() {
            let site = docs::build_site(&resolved.registry, config.site_name(), &resolved.target.name)?;
            site.write_to(&mut tree, &target_dir.join("docs"))?;
            output.status("Documented", &resolved.target.name);
        }

        resolved_targets.push(resolved);
    }

    Ok((tree, resolved_targets))
}

/// Run the whole pipeline and write the output directory
pub fn generate(config: &ApogeeConfig, targets: &[String]) -> Result<BuildResult> {
    execute_build(config, targets, &SilentOutputHandler)
}

/// Expand, substitute and resolve every selected target without writing
pub fn check_catalog(config: &ApogeeConfig, targets: &[String]) -> Result<CheckResult> {
    execute_check(config, targets, &SilentOutputHandler)
}
