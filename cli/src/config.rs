//! CLI configuration, loaded from TOML.
//!
//! ```toml
//! provider = "gemini"
//! store_path = "gold/samples.json"
//!
//! [pipeline]
//! top_k = 5
//! retention = { mode = "max_generated", keep = 200 }
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use inkwell_rag::PipelineConfig;
use serde::{Deserialize, Serialize};

/// Directory name under the platform config/data directories.
const APP_DIR: &str = "inkwell";

/// Which generation backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Gemini,
    #[serde(rename = "openai")]
    OpenAi,
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InkwellConfig {
    /// Generation backend.
    pub provider: ProviderKind,

    /// JSON snapshot backing the sample store.
    pub store_path: PathBuf,

    /// Override for the provider's API base URL.
    pub base_url: Option<String>,

    /// Override for the generation (chat) model.
    pub generation_model: Option<String>,

    /// Override for the embedding model.
    pub embedding_model: Option<String>,

    /// Orchestrator settings.
    pub pipeline: PipelineConfig,
}

impl Default for InkwellConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            store_path: default_store_path(),
            base_url: None,
            generation_model: None,
            embedding_model: None,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl InkwellConfig {
    /// Load configuration.
    ///
    /// An explicit `path` must exist. Without one, the platform config file
    /// (`~/.config/inkwell/config.toml` on Linux) is used when present and
    /// the defaults otherwise.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Parse a TOML config file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config
            .pipeline
            .validate()
            .with_context(|| format!("invalid pipeline settings in {}", path.display()))?;
        Ok(config)
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("samples.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkwell_rag::RetentionPolicy;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = InkwellConfig::default();
        assert_eq!(config.provider, ProviderKind::Gemini);
        assert!(config.store_path.ends_with("inkwell/samples.json"));
        assert_eq!(config.pipeline.top_k, 3);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
provider = "openai"
store_path = "gold/samples.json"

[pipeline]
top_k = 5
retention = { mode = "max_generated", keep = 200 }
"#,
        )
        .unwrap();

        let config = InkwellConfig::load(Some(&path)).unwrap();

        assert_eq!(config.provider, ProviderKind::OpenAi);
        assert_eq!(config.store_path, PathBuf::from("gold/samples.json"));
        assert_eq!(config.pipeline.top_k, 5);
        assert_eq!(
            config.pipeline.retention,
            RetentionPolicy::MaxGenerated { keep: 200 }
        );
        assert_eq!(config.pipeline.min_sample_chars, 10);
        assert_eq!(config.generation_model, None);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let err = InkwellConfig::load(Some(&temp_dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }

    #[test]
    fn test_invalid_pipeline_settings_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[pipeline]\ntop_k = 0\n").unwrap();

        let err = InkwellConfig::load(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("invalid pipeline settings"));
    }

    #[test]
    fn test_provider_names() {
        let config: InkwellConfig = toml::from_str(r#"provider = "gemini""#).unwrap();
        assert_eq!(config.provider, ProviderKind::Gemini);

        let config: InkwellConfig = toml::from_str(r#"provider = "openai""#).unwrap();
        assert_eq!(config.provider, ProviderKind::OpenAi);

        assert!(toml::from_str::<InkwellConfig>(r#"provider = "open_ai""#).is_err());
    }
}
