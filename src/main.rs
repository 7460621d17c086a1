use std::path::Path;
use std::process::ExitCode;

use apogee::cli::{Cli, Commands};
use apogee::commands::{
    execute_build, execute_check, execute_expand, execute_init, print_build_summary,
    print_check_summary, print_expand_summary, print_init_summary,
};
use apogee::config::{ApogeeConfig, CONFIG_FILE};
use apogee::error::{format_error_chain, suggest_fix, ApogeeError};
use apogee::logging::{self, output};
use apogee::output::CliOutputHandler;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            apogee::log_error!(err);
            output::error(format_error_chain(&err));
            if let Some(suggestion) = suggest_fix(&err) {
                output::hint(suggestion);
            }
            ExitCode::FAILURE
        }
    }
}

/// Project settings from `apogee.toml` in the working directory, if present
fn project_config() -> Result<Option<ApogeeConfig>, ApogeeError> {
    ApogeeConfig::load_from_file(Path::new(CONFIG_FILE))
}

fn run(cli: Cli) -> Result<(), ApogeeError> {
    match cli.command {
        Commands::Init { dir } => {
            let result = execute_init(&dir)?;
            print_init_summary(&result);
        }
        Commands::Build {
            catalog,
            substitutions,
            output_dir,
            targets,
            docs,
            output_graph,
        } => {
            let config = ApogeeConfig::merge_with_cli(
                project_config()?,
                catalog,
                substitutions,
                output_dir,
                output_graph,
                docs,
            );
            let result = execute_build(&config, &targets, &CliOutputHandler)?;
            print_build_summary(&result);
        }
        Commands::Check {
            catalog,
            substitutions,
            targets,
        } => {
            let config = ApogeeConfig::merge_with_cli(
                project_config()?,
                catalog,
                substitutions,
                None,
                None,
                false,
            );
            let result = execute_check(&config, &targets, &CliOutputHandler)?;
            print_check_summary(&result);
        }
        Commands::Expand { catalog } => {
            let config =
                ApogeeConfig::merge_with_cli(project_config()?, catalog, None, None, None, false);
            let result = execute_expand(&config.catalog_path())?;
            print_expand_summary(&result);
        }
    }

    Ok(())
}
