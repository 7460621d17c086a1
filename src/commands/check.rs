use std::time::{Duration, Instant};

use crate::analysis::ReferenceGraph;
use crate::commands::build::TargetSummary;
use crate::config::ApogeeConfig;
use crate::error::Result;
use crate::output::OutputHandler;
use crate::render_output;

#[derive(Debug)]
pub struct CheckResult {
    pub targets: Vec<TargetSummary>,
    pub files_rendered: usize,
    pub references: usize,
    pub duration: Duration,
}

impl CheckResult {
    pub fn has_warnings(&self) -> bool {
        self.targets.iter().any(|t| !t.unresolved.is_empty())
    }
}

/// Run the whole pipeline in memory. Nothing is written.
pub fn execute_check(
    config: &ApogeeConfig,
    targets: &[String],
    output: &dyn OutputHandler,
) -> Result<CheckResult> {
    let start_time = Instant::now();

    let (tree, resolved) = render_output(config, targets, output)?;

    let mut references = 0;
    let mut summaries = Vec::with_capacity(resolved.len());
    for target in &resolved {
        references += ReferenceGraph::build_from_registry(&target.registry)?.edge_count();

        summaries.push(TargetSummary {
            name: target.target.name.clone(),
            objects: target.registry.len(),
            scripts: target.registry.scripts().count(),
            unresolved: target.unresolved.clone(),
        });
    }

    output.success(&format!("{} targets resolved", summaries.len()));

    Ok(CheckResult {
        targets: summaries,
        files_rendered: tree.len(),
        references,
        duration: start_time.elapsed(),
    })
}

#[cfg(feature = "cli")]
pub fn print_check_summary(result: &CheckResult) {
    use owo_colors::OwoColorize;

    println!();
    println!("{}", "Check Summary".bold().bright_blue());
    println!("{}", "=".repeat(50).bright_black());

    if result.has_warnings() {
        println!("{} {} Unresolved marks found", "⚠️ ".yellow(), "WARNING".yellow().bold());
    } else {
        println!("{} {} Catalog is consistent", "✅".green(), "SUCCESS".green().bold());
    }

    println!();
    for target in &result.targets {
        println!(
            "{} {}: {} objects, {} scripts",
            "→".cyan(),
            target.name.bold(),
            target.objects,
            target.scripts
        );
        for mark in &target.unresolved {
            println!("  {} {}", "⚠".yellow(), mark.yellow());
        }
    }

    println!("{} {} files rendered, {} references", "→".cyan(), result.files_rendered, result.references);
    println!("{} Check duration: {:.2?}", "⏱".bright_black(), result.duration);
    println!();
}
