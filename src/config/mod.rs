mod defaults;
mod types;

pub use types::*;

use crate::error::ConfigError;
use crate::workflow::MAX_DESIGN_PAGES;
use defaults::*;
use std::path::Path;
use tracing::info;

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            projects_root: default_projects_root(),
            model: ModelConfig::default(),
            providers: ProvidersConfig::default(),
            workflow: WorkflowConfig::default(),
            git: GitConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load config if the file exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            info!("No config at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.workflow.quality_threshold;
        if !(1.0..=10.0).contains(&threshold) {
            return Err(ConfigError::ThresholdOutOfRange(threshold));
        }

        let max_pages = self.workflow.max_pages;
        if !(1..=MAX_DESIGN_PAGES).contains(&max_pages) {
            return Err(ConfigError::MaxPagesOutOfRange(max_pages));
        }

        if self.model.provider == Provider::Custom && self.model.base_url.is_none() {
            return Err(ConfigError::MissingBaseUrl);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_workflow_constants() {
        let config = Config::default();
        assert_eq!(config.workflow.quality_threshold, 7.0);
        assert_eq!(config.workflow.max_pages, 8);
        assert_eq!(config.workflow.retry_gate, RetryGate::PerPage);
        assert_eq!(config.model.provider, Provider::Anthropic);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
projects_root: /srv/projects
model:
  provider: custom
  model: qwen2.5-coder
  base_url: http://localhost:11434/v1
workflow:
  retry_gate: overall_score
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.projects_root, Path::new("/srv/projects"));
        assert_eq!(config.model.provider, Provider::Custom);
        assert_eq!(config.workflow.retry_gate, RetryGate::OverallScore);
        assert_eq!(config.workflow.max_pages, 8);
        assert_eq!(config.git.user_name, "Canvas");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_custom_provider_needs_base_url() {
        let mut config = Config::default();
        config.model.provider = Provider::Custom;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingBaseUrl)
        ));
    }

    #[test]
    fn test_threshold_range_is_checked() {
        let mut config = Config::default();
        config.workflow.quality_threshold = 11.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ThresholdOutOfRange(_))
        ));
    }

    #[test]
    fn test_max_pages_is_capped_at_eight() {
        let mut config = Config::default();
        config.workflow.max_pages = 9;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MaxPagesOutOfRange(9))
        ));

        config.workflow.max_pages = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MaxPagesOutOfRange(0))
        ));

        config.workflow.max_pages = 8;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("canvasgen.yaml")).unwrap();
        assert_eq!(config.workflow.commit_message, default_commit_message());
    }
}
