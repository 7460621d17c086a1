use std::path::{Path, PathBuf};

use crate::config::ApogeeConfig;
use crate::error::Result;

#[derive(Debug)]
pub struct InitResult {
    pub config_path: PathBuf,
}

pub fn execute_init(dir: &Path) -> Result<InitResult> {
    let config_path = ApogeeConfig::write_sample_config(dir)?;
    Ok(InitResult { config_path })
}

#[cfg(feature = "cli")]
pub fn print_init_summary(result: &InitResult) {
    use owo_colors::OwoColorize;

    println!(
        "{} Created sample configuration: {}",
        "✓".green().bold(),
        result.config_path.display().to_string().cyan()
    );
    println!(
        "  {}",
        "Rename it to apogee.toml and adjust the paths to your catalog.".dimmed()
    );
}
