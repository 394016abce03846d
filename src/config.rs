use eyre::{Context, Result, bail};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use draftgate::llm::GroqConfig;
use draftgate::llm::groq::{DEFAULT_MODEL, DEFAULT_TEMPERATURE, GROQ_API_KEY_ENV};
use draftgate::prompt::DEFAULT_ACCEPTANCE_TOKEN;
use draftgate::runner::{DEFAULT_MAX_ITERATIONS, LoopRunnerConfig};
use draftgate::search::tavily::TAVILY_API_KEY_ENV;
use draftgate::search::{DEFAULT_MAX_RESULTS, DuckDuckGoSearch, SearchClient, TavilySearch};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub review: ReviewConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub base_url: Option<String>,
    pub api_key_env: String,
    /// Unset means no timeout
    pub timeout_ms: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            base_url: None,
            api_key_env: GROQ_API_KEY_ENV.to_string(),
            timeout_ms: None,
        }
    }
}

impl LlmConfig {
    pub fn to_groq_config(&self) -> GroqConfig {
        GroqConfig {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            base_url: self.base_url.clone(),
            timeout: self.timeout_ms.map(Duration::from_millis),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchProvider {
    Duckduckgo,
    Tavily,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub provider: SearchProvider,
    pub max_results: usize,
    pub api_key_env: String,
    pub timeout_ms: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            provider: SearchProvider::Duckduckgo,
            max_results: DEFAULT_MAX_RESULTS,
            api_key_env: TAVILY_API_KEY_ENV.to_string(),
            timeout_ms: None,
        }
    }
}

impl SearchConfig {
    /// Construct the configured search provider
    pub fn build(&self) -> Result<Arc<dyn SearchClient>> {
        let timeout = self.timeout_ms.map(Duration::from_millis);
        let client: Arc<dyn SearchClient> = match self.provider {
            SearchProvider::Duckduckgo => Arc::new(DuckDuckGoSearch::new(self.max_results, timeout)?),
            SearchProvider::Tavily => {
                Arc::new(TavilySearch::from_env(&self.api_key_env, self.max_results, timeout)?)
            }
        };
        Ok(client)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    pub max_iterations: u32,
    pub acceptance_token: String,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            acceptance_token: DEFAULT_ACCEPTANCE_TOKEN.to_string(),
        }
    }
}

impl ReviewConfig {
    pub fn runner_config(&self) -> LoopRunnerConfig {
        LoopRunnerConfig {
            max_iterations: self.max_iterations,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8501)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            llm: LlmConfig::default(),
            search: SearchConfig::default(),
            review: ReviewConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Logging level from `log_level`, defaulting to info
    pub fn log_filter(&self) -> Result<LevelFilter> {
        let level = self.log_level.as_deref().unwrap_or("info");
        level
            .parse::<LevelFilter>()
            .context(format!("Invalid log_level: {}", level))
    }

    /// Reject values the loop cannot run with
    pub fn validate(&self) -> Result<()> {
        self.log_filter()?;
        if self.review.max_iterations == 0 {
            bail!("review.max_iterations must be at least 1");
        }
        if self.review.acceptance_token.trim().is_empty() {
            bail!("review.acceptance_token must not be empty");
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            bail!("llm.temperature must be between 0.0 and 2.0, got {}", self.llm.temperature);
        }
        if self.search.max_results == 0 {
            bail!("search.max_results must be at least 1");
        }
        Ok(())
    }
}
