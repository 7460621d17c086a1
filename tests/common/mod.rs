#![allow(dead_code)]

pub mod fixtures;

use apogee::ApogeeConfig;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Temporary project directory with a catalog, a substitution document and
/// an output directory
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub catalog_path: PathBuf,
    pub substitutions_path: PathBuf,
    pub snippets_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let root = temp_dir.path().to_path_buf();
        let snippets_dir = root.join("snippets");
        fs::create_dir_all(&snippets_dir).expect("create snippets dir");

        Self {
            catalog_path: root.join("catalog.yml"),
            substitutions_path: root.join("apogeeconf.yml"),
            output_dir: root.join("output"),
            snippets_dir,
            temp_dir,
        }
    }

    pub fn with_catalog(catalog: &str) -> Self {
        let env = Self::new();
        env.write_catalog(catalog);
        env
    }

    pub fn write_catalog(&self, content: &str) {
        fs::write(&self.catalog_path, content).expect("write catalog");
    }

    pub fn write_substitutions(&self, content: &str) {
        fs::write(&self.substitutions_path, content).expect("write substitutions");
    }

    pub fn write_snippet(&self, name: &str, content: &str) {
        fs::write(self.snippets_dir.join(name), content).expect("write snippet");
    }

    pub fn config(&self) -> ApogeeConfig {
        ApogeeConfig {
            catalog: Some(self.catalog_path.clone()),
            substitutions: Some(self.substitutions_path.clone()),
            output_dir: Some(self.output_dir.clone()),
            snippets_dir: Some(self.snippets_dir.clone()),
            ..ApogeeConfig::default()
        }
    }

    pub fn output_file(&self, target: &str, file: &str) -> PathBuf {
        self.output_dir.join(target).join(file)
    }

    pub fn read_output(&self, target: &str, file: &str) -> String {
        let path = self.output_file(target, file);
        fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {}: {}", path.display(), e))
    }
}

/// Assert that `needles` occur in `haystack` in the given order
pub fn assert_in_order(haystack: &str, needles: &[&str]) {
    let mut from = 0;
    for needle in needles {
        match haystack[from..].find(needle) {
            Some(pos) => from += pos + needle.len(),
            None => panic!("'{}' not found in order in:\n{}", needle, haystack),
        }
    }
}
