use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

use crate::analysis::ReferenceGraph;
use crate::config::ApogeeConfig;
use crate::error::{ApogeeError, Result};
use crate::output::OutputHandler;
use crate::render_output;

#[derive(Debug)]
pub struct TargetSummary {
    pub name: String,
    pub objects: usize,
    pub scripts: usize,
    pub unresolved: Vec<String>,
}

#[derive(Debug)]
pub struct BuildResult {
    pub output_dir: PathBuf,
    pub targets: Vec<TargetSummary>,
    pub files_written: Vec<PathBuf>,
    pub graph_files: Vec<PathBuf>,
    pub duration: Duration,
}

/// Render every selected target, then replace the output directory
pub fn execute_build(
    config: &ApogeeConfig,
    targets: &[String],
    output: &dyn OutputHandler,
) -> Result<BuildResult> {
    let start_time = Instant::now();

    let (tree, resolved) = render_output(config, targets, output)?;

    let output_dir = config.output_path();
    let mut inputs = vec![config.catalog_path(), config.substitutions_path()];
    inputs.extend(config.snippets_dir.clone());
    let files_written = tree.flush(&output_dir, &inputs)?;
    output.success(&format!(
        "Wrote {} files to {}",
        files_written.len(),
        output_dir.display()
    ));

    let mut graph_files = Vec::new();
    if let Some(graph_path) = &config.output_graph {
        for target in &resolved {
            let graph = ReferenceGraph::build_from_registry(&target.registry)?;
            let path = graph_path_for(graph_path, &target.target.name, resolved.len());
            write_graph(&path, &graph)?;
            output.status("Graph", &path.display().to_string());
            graph_files.push(path);
        }
    }

    let targets = resolved
        .iter()
        .map(|r| TargetSummary {
            name: r.target.name.clone(),
            objects: r.registry.len(),
            scripts: r.registry.scripts().count(),
            unresolved: r.unresolved.clone(),
        })
        .collect();

    info!(
        files = files_written.len(),
        duration_ms = start_time.elapsed().as_millis() as u64,
        "Build complete"
    );

    Ok(BuildResult {
        output_dir,
        targets,
        files_written,
        graph_files,
        duration: start_time.elapsed(),
    })
}

/// `graph.dot` for a single target, `graph.<target>.dot` for several
fn graph_path_for(base: &Path, target: &str, target_count: usize) -> PathBuf {
    if target_count <= 1 {
        return base.to_path_buf();
    }

    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "graph".to_string());
    let file = match base.extension() {
        Some(ext) => format!("{}.{}.{}", stem, target, ext.to_string_lossy()),
        None => format!("{}.{}", stem, target),
    };
    base.with_file_name(file)
}

fn write_graph(path: &Path, graph: &ReferenceGraph) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ApogeeError::write_failed(parent, e))?;
    }
    fs::write(path, graph.to_graphviz()).map_err(|e| ApogeeError::write_failed(path, e))
}

#[cfg(feature = "cli")]
pub fn print_build_summary(result: &BuildResult) {
    use crate::logging::format_duration;
    use owo_colors::OwoColorize;

    println!("\n{}", "=== Apogee Build Summary ===".bold().blue());

    for target in &result.targets {
        println!(
            "\n{} {}",
            "Target:".bold(),
            target.name.cyan()
        );
        println!("  {} {}", "Objects:".bold(), target.objects);
        println!("  {} {}", "Scripts:".bold(), target.scripts);
        if !target.unresolved.is_empty() {
            println!(
                "  {} {}",
                "Unresolved marks:".bold().yellow(),
                target.unresolved.join(", ").yellow()
            );
        }
    }

    println!(
        "\n{} {} files in {}",
        "✓".green().bold(),
        result.files_written.len(),
        result.output_dir.display().to_string().dimmed()
    );
    for path in &result.graph_files {
        println!("  {} {}", "Graph:".bold(), path.display().to_string().dimmed());
    }
    println!("  {} {}", "Duration:".bold(), format_duration(result.duration));
}
