//! Analysis session configuration

use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Load stdlib declarations from the on-disk signature cache
    pub use_signature_cache: bool,
    /// File extensions collected by `add_workspace`
    pub extensions: Vec<String>,
    /// Directory names skipped by `add_workspace`
    pub exclude_dirs: Vec<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            use_signature_cache: true,
            extensions: vec!["rb".to_string()],
            exclude_dirs: ["vendor", "node_modules", ".git", "tmp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ServiceConfig {
    pub fn is_source_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e == ext))
    }

    pub fn is_excluded_dir(&self, name: &str) -> bool {
        self.exclude_dirs.iter().any(|dir| dir == name)
    }
}
