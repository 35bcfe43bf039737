use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Ollama,
}

impl ProviderKind {
    pub fn display_name(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OPENAI",
            ProviderKind::Ollama => "OLLAMA",
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Ollama => "http://localhost:11434",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "gpt-4o-mini",
            ProviderKind::Ollama => "llama2",
        }
    }

    pub fn requires_api_key(self) -> bool {
        matches!(self, ProviderKind::OpenAi)
    }
}

/// Resolved once at startup and read-only afterwards. The uppercase aliases
/// keep existing config.json files from the previous deployment readable.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProviderConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default, alias = "OPENAI_API_KEY")]
    pub api_key: Option<String>,
    #[serde(default, alias = "OPENAI_ORG_ID")]
    pub org_id: Option<String>,
    #[serde(default)]
    pub base_url: String,
    #[serde(default, alias = "model")]
    pub model_name: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            api_key: None,
            org_id: None,
            base_url: String::new(),
            model_name: String::new(),
        }
    }
}

impl ProviderConfig {
    pub fn builtin(provider: ProviderKind, api_key: Option<String>) -> Self {
        Self {
            provider,
            api_key,
            org_id: None,
            base_url: provider.default_base_url().to_string(),
            model_name: provider.default_model().to_string(),
        }
    }

    pub fn normalized(mut self) -> Self {
        if self.base_url.trim().is_empty() {
            self.base_url = self.provider.default_base_url().to_string();
        }
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();

        if self.model_name.trim().is_empty() {
            self.model_name = self.provider.default_model().to_string();
        } else {
            self.model_name = self.model_name.trim().to_string();
        }

        self.api_key = clean_optional(self.api_key.take());
        self.org_id = clean_optional(self.org_id.take());

        self
    }

    pub fn has_credentials(&self) -> bool {
        !self.provider.requires_api_key() || self.api_key.is_some()
    }

    pub fn default_path() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Could not find config directory")?
            .join("datawizzy")
            .join("config.json"))
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Configuration file {} not found", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Configuration file {} contains invalid JSON", path.display()))?;
        Ok(config.normalized())
    }

    pub fn from_env() -> Self {
        let provider = match std::env::var("DATAWIZZY_PROVIDER").ok().as_deref() {
            Some(value) if value.eq_ignore_ascii_case("ollama") => ProviderKind::Ollama,
            _ => ProviderKind::OpenAi,
        };

        let base_url = match provider {
            ProviderKind::Ollama => std::env::var("OLLAMA_BASE_URL").unwrap_or_default(),
            ProviderKind::OpenAi => String::new(),
        };

        Self {
            provider,
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            org_id: std::env::var("OPENAI_ORG_ID").ok(),
            base_url,
            model_name: std::env::var("DATAWIZZY_MODEL").unwrap_or_default(),
        }
        .normalized()
    }

    /// File first, environment second. An explicit path must exist; the
    /// default path is optional and silently falls back to the environment.
    pub async fn resolve(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path).await;
        }

        let default_path = Self::default_path()?;
        if default_path.exists() {
            return Self::load(&default_path).await;
        }

        Ok(Self::from_env())
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).await?;
        Ok(())
    }
}

fn clean_optional(input: Option<String>) -> Option<String> {
    input.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn normalized_fills_provider_defaults() {
        let config = ProviderConfig {
            provider: ProviderKind::Ollama,
            ..Default::default()
        }
        .normalized();

        assert_eq!(config.base_url, "http://localhost:11434");
        assert_eq!(config.model_name, "llama2");
        assert!(config.has_credentials());
    }

    #[test]
    fn normalized_trims_and_drops_blank_secrets() {
        let config = ProviderConfig {
            provider: ProviderKind::OpenAi,
            api_key: Some("  ".to_string()),
            org_id: Some(" org-123 ".to_string()),
            base_url: "https://api.openai.com/v1/".to_string(),
            model_name: " gpt-4o-mini ".to_string(),
        }
        .normalized();

        assert_eq!(config.api_key, None);
        assert_eq!(config.org_id.as_deref(), Some("org-123"));
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.model_name, "gpt-4o-mini");
        assert!(!config.has_credentials());
    }

    #[tokio::test]
    async fn load_accepts_legacy_uppercase_keys() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"OPENAI_API_KEY": "sk-test", "OPENAI_ORG_ID": "org-1"}"#,
        )
        .await?;

        let config = ProviderConfig::load(&path).await?;
        assert_eq!(config.provider, ProviderKind::OpenAi);
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.org_id.as_deref(), Some("org-1"));
        assert_eq!(config.model_name, "gpt-4o-mini");
        Ok(())
    }

    #[tokio::test]
    async fn load_rejects_invalid_json() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").await?;

        assert!(ProviderConfig::load(&path).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("config.json");

        let config = ProviderConfig::builtin(ProviderKind::OpenAi, Some("sk-test".to_string()));
        config.save(&path).await?;

        let loaded = ProviderConfig::load(&path).await?;
        assert_eq!(loaded.provider, ProviderKind::OpenAi);
        assert_eq!(loaded.api_key.as_deref(), Some("sk-test"));
        Ok(())
    }
}
