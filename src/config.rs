use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ApogeeError, Result};

pub const CONFIG_FILE: &str = "apogee.toml";
pub const SAMPLE_CONFIG_FILE: &str = "apogee.toml.example";
pub const DEFAULT_CATALOG: &str = "catalog.yml";
pub const DEFAULT_SUBSTITUTIONS: &str = "apogeeconf.yml";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_SITE_NAME: &str = "Database catalog";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApogeeConfig {
    /// YAML catalog of database objects
    pub catalog: Option<PathBuf>,

    /// YAML document with the globals and per-target substitution values
    pub substitutions: Option<PathBuf>,

    /// Directory receiving one subdirectory of scripts per target
    pub output_dir: Option<PathBuf>,

    /// Directory searched by `snippet` script items
    pub snippets_dir: Option<PathBuf>,

    /// Path to output the reference graph in Graphviz DOT format
    pub output_graph: Option<PathBuf>,

    /// Generate an MkDocs documentation tree for each target
    pub docs: Option<bool>,

    /// Title of the generated documentation site
    pub site_name: Option<String>,
}

impl ApogeeConfig {
    /// Load configuration from a TOML file. A missing file is not an error.
    pub fn load_from_file(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|e| ApogeeError::read_failed(path, e))?;
        let config: ApogeeConfig = toml::from_str(&content).map_err(|e| ApogeeError::ConfigLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(Some(config))
    }

    /// Merge CLI arguments with config file values
    /// CLI arguments take precedence over config file values
    pub fn merge_with_cli(
        config_file: Option<Self>,
        cli_catalog: Option<PathBuf>,
        cli_substitutions: Option<PathBuf>,
        cli_output_dir: Option<PathBuf>,
        cli_output_graph: Option<PathBuf>,
        cli_docs: bool,
    ) -> Self {
        let base_config = config_file.unwrap_or_default();

        Self {
            catalog: cli_catalog.or(base_config.catalog),
            substitutions: cli_substitutions.or(base_config.substitutions),
            output_dir: cli_output_dir.or(base_config.output_dir),
            snippets_dir: base_config.snippets_dir,
            output_graph: cli_output_graph.or(base_config.output_graph),
            docs: if cli_docs { Some(true) } else { base_config.docs },
            site_name: base_config.site_name,
        }
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.catalog.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG))
    }

    pub fn substitutions_path(&self) -> PathBuf {
        self.substitutions
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SUBSTITUTIONS))
    }

    pub fn output_path(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR))
    }

    pub fn docs_enabled(&self) -> bool {
        self.docs.unwrap_or(false)
    }

    pub fn site_name(&self) -> &str {
        self.site_name.as_deref().unwrap_or(DEFAULT_SITE_NAME)
    }

    /// Write a sample configuration file into `dir`, returning its path
    pub fn write_sample_config(dir: &Path) -> Result<PathBuf> {
        let sample_config = ApogeeConfig {
            catalog: Some(PathBuf::from(DEFAULT_CATALOG)),
            substitutions: Some(PathBuf::from(DEFAULT_SUBSTITUTIONS)),
            output_dir: Some(PathBuf::from(DEFAULT_OUTPUT_DIR)),
            snippets_dir: Some(PathBuf::from("snippets")),
            output_graph: None,
            docs: Some(false),
            site_name: Some(DEFAULT_SITE_NAME.to_string()),
        };

        let content = toml::to_string_pretty(&sample_config)
            .map_err(|e| ApogeeError::Internal(format!("cannot serialize sample configuration: {}", e)))?;
        let path = dir.join(SAMPLE_CONFIG_FILE);
        fs::write(&path, content).map_err(|e| ApogeeError::write_failed(&path, e))?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_serialization() {
        let config = ApogeeConfig {
            catalog: Some(PathBuf::from("catalog.yml")),
            substitutions: Some(PathBuf::from("targets.yml")),
            output_dir: Some(PathBuf::from("out")),
            snippets_dir: Some(PathBuf::from("snippets")),
            output_graph: Some(PathBuf::from("graph.dot")),
            docs: Some(true),
            site_name: Some("Catastro".to_string()),
        };

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: ApogeeConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config, parsed);
    }

    #[test]
    fn test_config_merge_cli_precedence() {
        let config_file = ApogeeConfig {
            catalog: Some(PathBuf::from("config_catalog.yml")),
            substitutions: Some(PathBuf::from("config_subs.yml")),
            output_dir: Some(PathBuf::from("config_out")),
            snippets_dir: Some(PathBuf::from("config_snippets")),
            output_graph: Some(PathBuf::from("config_graph.dot")),
            docs: Some(false),
            site_name: None,
        };

        let merged = ApogeeConfig::merge_with_cli(
            Some(config_file),
            Some(PathBuf::from("cli_catalog.yml")),
            None,
            Some(PathBuf::from("cli_out")),
            None,
            true,
        );

        assert_eq!(merged.catalog, Some(PathBuf::from("cli_catalog.yml")));
        assert_eq!(merged.substitutions, Some(PathBuf::from("config_subs.yml")));
        assert_eq!(merged.output_dir, Some(PathBuf::from("cli_out")));
        assert_eq!(merged.snippets_dir, Some(PathBuf::from("config_snippets")));
        assert_eq!(merged.output_graph, Some(PathBuf::from("config_graph.dot")));
        assert!(merged.docs_enabled());
    }

    #[test]
    fn test_defaults() {
        let config = ApogeeConfig::default();
        assert_eq!(config.catalog_path(), PathBuf::from("catalog.yml"));
        assert_eq!(config.substitutions_path(), PathBuf::from("apogeeconf.yml"));
        assert_eq!(config.output_path(), PathBuf::from("output"));
        assert!(!config.docs_enabled());
        assert_eq!(config.site_name(), DEFAULT_SITE_NAME);
    }

    #[test]
    fn test_config_load_nonexistent_file() {
        let temp_dir = tempdir().unwrap();
        let result = ApogeeConfig::load_from_file(&temp_dir.path().join(CONFIG_FILE)).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_config_load_from_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE);

        let config_content = r#"
catalog = "db/catalog.yml"
output_dir = "build"
docs = true
"#;
        fs::write(&config_path, config_content).unwrap();

        let loaded_config = ApogeeConfig::load_from_file(&config_path).unwrap().unwrap();

        assert_eq!(loaded_config.catalog, Some(PathBuf::from("db/catalog.yml")));
        assert_eq!(loaded_config.output_dir, Some(PathBuf::from("build")));
        assert_eq!(loaded_config.docs, Some(true));
        assert_eq!(loaded_config.substitutions, None);
        assert_eq!(loaded_config.output_graph, None);
    }

    #[test]
    fn test_config_load_rejects_unknown_keys() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join(CONFIG_FILE);
        fs::write(&config_path, "connection_string = \"postgres://x\"\n").unwrap();

        assert!(matches!(
            ApogeeConfig::load_from_file(&config_path),
            Err(ApogeeError::ConfigLoad { .. })
        ));
    }

    #[test]
    fn test_write_sample_config() {
        let temp_dir = tempdir().unwrap();

        let sample_path = ApogeeConfig::write_sample_config(temp_dir.path()).unwrap();
        assert_eq!(sample_path, temp_dir.path().join(SAMPLE_CONFIG_FILE));

        let content = fs::read_to_string(&sample_path).unwrap();
        assert!(content.contains("catalog"));
        assert!(content.contains("substitutions"));
        assert!(content.contains("output_dir"));

        let reparsed: ApogeeConfig = toml::from_str(&content).unwrap();
        assert_eq!(reparsed.catalog, Some(PathBuf::from(DEFAULT_CATALOG)));
    }
}
