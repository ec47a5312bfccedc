use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_FREQUENCY_REPORT: &str = "frequencyTable.xlsx";
pub const DEFAULT_REFERENCE_TABLE: &str = "referenceTable.xlsx";

/// Every output destination and loading option of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Annotated copy of the source document (annotate only)
    pub annotated_document: Option<PathBuf>,
    /// Line frequency report written by annotate
    pub frequency_report: PathBuf,
    /// Classified reference table written by classify
    pub reference_table: PathBuf,
    /// Memory-map sources instead of buffered reads
    pub use_mmap: bool,
    /// Show a progress bar while processing lines
    pub progress: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            annotated_document: None,
            frequency_report: PathBuf::from(DEFAULT_FREQUENCY_REPORT),
            reference_table: PathBuf::from(DEFAULT_REFERENCE_TABLE),
            use_mmap: false,
            progress: true,
        }
    }
}

/// Values given on the command line; `None` leaves the file or default value
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub annotated_document: Option<PathBuf>,
    pub frequency_report: Option<PathBuf>,
    pub reference_table: Option<PathBuf>,
    pub use_mmap: bool,
    pub no_progress: bool,
}

impl RunConfig {
    /// Parse a TOML configuration document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid configuration")
    }

    /// Load a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Defaults, then the optional file, then command-line values
    pub fn resolve(file: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let base = match file {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        Ok(base.with_overrides(overrides))
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(path) = overrides.annotated_document {
            self.annotated_document = Some(path);
        }
        if let Some(path) = overrides.frequency_report {
            self.frequency_report = path;
        }
        if let Some(path) = overrides.reference_table {
            self.reference_table = path;
        }
        if overrides.use_mmap {
            self.use_mmap = true;
        }
        if overrides.no_progress {
            self.progress = false;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_keep_fixed_names() {
        let config = RunConfig::default();
        assert_eq!(config.frequency_report, PathBuf::from("frequencyTable.xlsx"));
        assert_eq!(config.reference_table, PathBuf::from("referenceTable.xlsx"));
        assert!(config.annotated_document.is_none());
        assert!(config.progress);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config = RunConfig::from_toml_str("frequency_report = \"out/freq.xlsx\"\nuse_mmap = true\n").unwrap();
        assert_eq!(config.frequency_report, PathBuf::from("out/freq.xlsx"));
        assert_eq!(config.reference_table, PathBuf::from(DEFAULT_REFERENCE_TABLE));
        assert!(config.use_mmap);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(RunConfig::from_toml_str("frequncy_report = \"typo.xlsx\"").is_err());
    }

    #[test]
    fn test_overrides_win_over_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("redline.toml");
        std::fs::write(&path, "reference_table = \"from_file.xlsx\"\nprogress = true\n").unwrap();

        let overrides = ConfigOverrides {
            reference_table: Some(PathBuf::from("from_cli.xlsx")),
            no_progress: true,
            ..Default::default()
        };
        let config = RunConfig::resolve(Some(&path), overrides).unwrap();

        assert_eq!(config.reference_table, PathBuf::from("from_cli.xlsx"));
        assert!(!config.progress);
    }

    #[test]
    fn test_missing_file_errors() {
        let temp_dir = TempDir::new().unwrap();
        let result = RunConfig::resolve(Some(&temp_dir.path().join("absent.toml")), ConfigOverrides::default());
        assert!(result.is_err());
    }
}
