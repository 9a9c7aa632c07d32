//! Campaign configuration.
//!
//! ```json
//! {
//!   "campaign": "EEC2024",
//!   "output_dir": "out",
//!   "options": { "nesting": "recursive", "partition_size": 5000 },
//!   "output": { "delimiter": ";" },
//!   "modes": [
//!     { "name": "WEB", "metadata": "web/metadata.json", "answers": "web/answers.csv",
//!       "paradata": "web/paradata" }
//!   ]
//! }
//! ```
//!
//! Relative paths are resolved against the configuration file's directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use svy_model::{ProcessingOptions, ROOT_IDENTIFIER_NAME};

/// Name of the dataset stacking every mode.
pub const MULTIMODE_DATASET: &str = "MULTIMODE";

#[derive(Debug, Clone, Deserialize)]
pub struct CampaignConfig {
    pub campaign: String,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    #[serde(default)]
    pub options: ProcessingOptions,
    #[serde(default)]
    pub output: OutputSettings,
    pub modes: Vec<ModeConfig>,
    /// Also write the stacked multimode dataset.
    #[serde(default = "default_true")]
    pub multimode: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub delimiter: String,
    /// Write booleans as `1`/`0`.
    pub numeric_booleans: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            delimiter: ";".to_string(),
            numeric_booleans: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModeConfig {
    pub name: String,
    pub metadata: PathBuf,
    pub answers: PathBuf,
    /// Directory of per-respondent paradata documents.
    #[serde(default)]
    pub paradata: Option<PathBuf>,
    #[serde(default = "default_identifier")]
    pub identifier_column: String,
    /// Delimiter of the answer file.
    #[serde(default = "default_input_delimiter")]
    pub input_delimiter: String,
}

fn default_true() -> bool {
    true
}

fn default_identifier() -> String {
    ROOT_IDENTIFIER_NAME.to_string()
}

fn default_input_delimiter() -> String {
    ",".to_string()
}

impl CampaignConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let mut config: CampaignConfig =
            serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.resolve_paths(base);
        config.validate()?;
        Ok(config)
    }

    fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        if let Some(dir) = self.output_dir.as_mut() {
            resolve(dir);
        }
        for mode in &mut self.modes {
            resolve(&mut mode.metadata);
            resolve(&mut mode.answers);
            if let Some(dir) = mode.paradata.as_mut() {
                resolve(dir);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.modes.is_empty() {
            bail!("campaign {} declares no modes", self.campaign);
        }
        let mut seen = Vec::with_capacity(self.modes.len());
        for mode in &self.modes {
            if mode.name.trim().is_empty() {
                bail!("campaign {} has a mode without a name", self.campaign);
            }
            if mode.name == MULTIMODE_DATASET {
                bail!("mode name {MULTIMODE_DATASET} is reserved");
            }
            if seen.contains(&mode.name.as_str()) {
                bail!("mode {} is declared twice", mode.name);
            }
            seen.push(mode.name.as_str());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use svy_model::NestingMode;

    #[test]
    fn partial_configuration_uses_defaults() {
        let config: CampaignConfig = serde_json::from_str(
            r#"{
                "campaign": "C1",
                "options": {"nesting": "single_level"},
                "modes": [{"name": "WEB", "metadata": "m.json", "answers": "a.csv"}]
            }"#,
        )
        .unwrap();
        assert_eq!(config.options.nesting, NestingMode::SingleLevel);
        assert_eq!(config.options.partition_size, 10_000);
        assert_eq!(config.output.delimiter, ";");
        assert!(config.multimode);
        assert_eq!(config.modes[0].identifier_column, ROOT_IDENTIFIER_NAME);
        assert!(config.modes[0].paradata.is_none());
    }

    #[test]
    fn relative_paths_follow_the_file() {
        let mut config: CampaignConfig = serde_json::from_str(
            r#"{"campaign": "C1", "modes": [
                {"name": "WEB", "metadata": "m.json", "answers": "/abs/a.csv", "paradata": "p"}
            ]}"#,
        )
        .unwrap();
        config.resolve_paths(Path::new("/data/c1"));
        let mode = &config.modes[0];
        assert_eq!(mode.metadata, PathBuf::from("/data/c1/m.json"));
        assert_eq!(mode.answers, PathBuf::from("/abs/a.csv"));
        assert_eq!(mode.paradata.as_deref(), Some(Path::new("/data/c1/p")));
    }

    #[test]
    fn duplicate_and_reserved_modes_are_rejected() {
        let config: CampaignConfig = serde_json::from_str(
            r#"{"campaign": "C1", "modes": [
                {"name": "WEB", "metadata": "m", "answers": "a"},
                {"name": "WEB", "metadata": "m", "answers": "a"}
            ]}"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config: CampaignConfig = serde_json::from_str(
            r#"{"campaign": "C1", "modes": [
                {"name": "MULTIMODE", "metadata": "m", "answers": "a"}
            ]}"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}
