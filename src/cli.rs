use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Clone)]
#[command(name = "apogee")]
#[command(about = "PostgreSQL script generator driven by YAML catalogs")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Increase verbosity level (can be used multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Generate a sample configuration file
    Init {
        /// Directory to write apogee.toml.example into
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },

    /// Generate the scripts of every target into the output directory
    Build {
        /// YAML catalog of database objects
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// YAML document with globals and per-target substitution values
        #[arg(long = "config", visible_alias = "substitutions")]
        substitutions: Option<PathBuf>,

        /// Directory receiving one subdirectory per target (replaced on success)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Only build these targets (repeatable)
        #[arg(long = "target")]
        targets: Vec<String>,

        /// Also generate MkDocs documentation for each target
        #[arg(long)]
        docs: bool,

        /// Output the reference graph in Graphviz DOT format to the specified file
        #[arg(long)]
        output_graph: Option<PathBuf>,
    },

    /// Expand, substitute and resolve the catalog without writing anything
    Check {
        /// YAML catalog of database objects
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// YAML document with globals and per-target substitution values
        #[arg(long = "config", visible_alias = "substitutions")]
        substitutions: Option<PathBuf>,

        /// Only check these targets (repeatable)
        #[arg(long = "target")]
        targets: Vec<String>,
    },

    /// Print the catalog with its `with` clauses expanded
    Expand {
        /// YAML catalog of database objects
        #[arg(long)]
        catalog: Option<PathBuf>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
