//! shoal.toml configuration parser.
//!
//! Only the planner section is read by this workspace; every field has a
//! default so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CoreError, CoreResult};

/// Default number of offers held back between cycles.
pub const DEFAULT_MAX_STOCK: usize = 16;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShoalConfig {
    #[serde(default)]
    pub planner: PlannerConfig,
}

/// Which planning strategy to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlannerKind {
    #[default]
    Naive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default)]
    pub kind: PlannerKind,
    /// Whether jobs requesting GPUs may be scheduled at all.
    #[serde(default)]
    pub gpu_enabled: bool,
    /// Upper bound on offers held in stock after a cycle.
    #[serde(default = "default_max_stock")]
    pub max_stock: usize,
    /// Unix user for applications that do not name one.
    #[serde(default)]
    pub run_as_user: Option<String>,
}

fn default_max_stock() -> usize {
    DEFAULT_MAX_STOCK
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            kind: PlannerKind::Naive,
            gpu_enabled: false,
            max_stock: DEFAULT_MAX_STOCK,
            run_as_user: None,
        }
    }
}

impl ShoalConfig {
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CoreError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> CoreResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> CoreResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_config_uses_defaults() {
        let config = ShoalConfig::from_toml_str("").unwrap();
        assert_eq!(config.planner.kind, PlannerKind::Naive);
        assert!(!config.planner.gpu_enabled);
        assert_eq!(config.planner.max_stock, DEFAULT_MAX_STOCK);
        assert!(config.planner.run_as_user.is_none());
    }

    #[test]
    fn parses_planner_section() {
        let toml_str = r#"
[planner]
kind = "naive"
gpu_enabled = true
max_stock = 4
run_as_user = "batch"
"#;
        let config = ShoalConfig::from_toml_str(toml_str).unwrap();
        assert!(config.planner.gpu_enabled);
        assert_eq!(config.planner.max_stock, 4);
        assert_eq!(config.planner.run_as_user.as_deref(), Some("batch"));
    }

    #[test]
    fn rejects_unknown_planner_kind() {
        let err = ShoalConfig::from_toml_str("[planner]\nkind = \"fair\"\n").unwrap_err();
        assert!(matches!(err, CoreError::ConfigParse(_)));
    }

    #[test]
    fn round_trips_through_toml() {
        let mut config = ShoalConfig::default();
        config.planner.run_as_user = Some("batch".to_string());
        let rendered = config.to_toml_string().unwrap();
        assert!(rendered.contains("run_as_user = \"batch\""));
        assert_eq!(ShoalConfig::from_toml_str(&rendered).unwrap(), config);
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[planner]\nmax_stock = 2").unwrap();

        let config = ShoalConfig::from_file(file.path()).unwrap();
        assert_eq!(config.planner.max_stock, 2);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ShoalConfig::from_file(Path::new("/nonexistent/shoal.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/shoal.toml"));
    }
}
