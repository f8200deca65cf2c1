use cadre_llm::ModelConfig;
use cadre_memory::MemoryConfig;
use cadre_orchestrator::ReasoningConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Contents of `cadre.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct CadreConfig {
    /// Required for `cadre run`.
    pub model: Option<ModelConfig>,
    /// Engine tunables.
    #[serde(default)]
    pub reasoning: ReasoningConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    /// Conversation buffer and store.
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// The `[dispatch]` section.
#[derive(Debug, Deserialize)]
pub struct DispatchConfig {
    /// Per-dispatch deadline. Unset means capabilities may run indefinitely.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    /// Input format advertised in the agent catalogue.
    #[serde(default = "default_input_type")]
    pub expected_input_type: String,
}

fn default_input_type() -> String {
    "JSON".to_string()
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            expected_input_type: default_input_type(),
        }
    }
}

impl DispatchConfig {
    /// `timeout_ms` as a [`Duration`].
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl CadreConfig {
    /// Parse TOML text.
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Read `path`, falling back to defaults when the file does not exist.
    pub async fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "Config file not found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                anyhow::bail!("Failed to read config file '{}': {}", path.display(), e)
            }
        };
        Self::parse(&raw)
    }

    /// The model section with `api_key` filled from `OPENAI_API_KEY` when
    /// left empty in the file.
    pub fn resolved_model(&self) -> anyhow::Result<ModelConfig> {
        let mut model = self
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("No [model] section in config; `run` needs one"))?;
        if model.api_key.is_empty() {
            if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                model.api_key = key;
            }
        }
        if model.api_key.is_empty() {
            anyhow::bail!("No API key: set model.api_key or OPENAI_API_KEY");
        }
        Ok(model)
    }
}
