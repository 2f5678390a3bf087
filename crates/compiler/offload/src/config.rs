use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cost::CostTable;

/// Names of the runtime entry points the rewriter emits calls to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RuntimeSymbols {
    /// `init(subloop_index, range_start, range_end)`
    pub init: String,
    /// `run(subloop_index, index_value)`
    pub run: String,
}

impl Default for RuntimeSymbols {
    fn default() -> Self {
        Self {
            init: "pim_init_subregion".to_string(),
            run: "pim_run_subregion".to_string(),
        }
    }
}

/// Offload pass configuration, usually read from an `autopim.toml`
///
/// ```toml
/// [costs]
/// mul = 20000
///
/// [runtime]
/// run = "pim_run_kernel"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OffloadConfig {
    pub costs: CostTable,
    pub runtime: RuntimeSymbols,
}

impl OffloadConfig {
    /// Load configuration from a file path
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_file_content(&content)
    }

    pub fn from_file_content(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            tracing::error!("Failed to parse TOML: {}", e);
            e
        })?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = OffloadConfig::from_file_content("").unwrap();
        assert_eq!(config, OffloadConfig::default());
        assert_eq!(config.runtime.init, "pim_init_subregion");
        assert_eq!(config.costs.mul, 16066);
    }

    #[test]
    fn test_partial_cost_table() {
        let config = OffloadConfig::from_file_content(
            r#"
            [costs]
            mul = 20000
            shift = 7

            [runtime]
            run = "pim_run_kernel"
            "#,
        )
        .unwrap();

        assert_eq!(config.costs.mul, 20000);
        assert_eq!(config.costs.shift, 7);
        assert_eq!(config.costs.add, 1187);
        assert_eq!(config.runtime.init, "pim_init_subregion");
        assert_eq!(config.runtime.run, "pim_run_kernel");
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        assert!(OffloadConfig::from_file_content("[costs]\nmul = \"lots\"").is_err());
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[costs]\ncompare = 200").unwrap();

        let config = OffloadConfig::from_path(file.path()).unwrap();
        assert_eq!(config.costs.compare, 200);
        assert!(OffloadConfig::from_path(&file.path().with_extension("missing")).is_err());
    }
}
