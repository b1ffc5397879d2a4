use eyre::{Context, Result};
use postrank::domain::CriteriaSet;
use postrank::gateway::GatewayOptions;
use postrank::rating::{AnthropicConfig, GeminiConfig, ProviderKind, RatingConfig};
use postrank::scheduler::SchedulerSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides the API key for any provider
pub const API_KEY_ENV: &str = "POSTRANK_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>,
    pub rating: RatingSection,
    pub scheduler: SchedulerSection,
    pub display: DisplaySection,
    pub cache: CacheSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingSection {
    pub model: String,
    pub api_key: String,
    pub criteria: CriteriaSet,
    pub gemini_base_url: String,
    pub anthropic_url: String,
    pub max_tokens: u32,
}

impl Default for RatingSection {
    fn default() -> Self {
        let anthropic = AnthropicConfig::default();
        Self {
            model: "gemini-1.5-flash-latest".to_string(),
            api_key: String::new(),
            criteria: CriteriaSet::default(),
            gemini_base_url: GeminiConfig::default().base_url,
            anthropic_url: anthropic.url,
            max_tokens: anthropic.max_tokens,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSection {
    pub retry_delay_ms: u64,
    pub call_timeout_ms: u64,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            retry_delay_ms: 5000,
            call_timeout_ms: 60000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySection {
    /// Hide posts rated at or below this; 0 shows everything
    pub hide_low_rank: i64,
    pub colorful_ranks: bool,
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            hide_low_rank: 1,
            colorful_ranks: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    pub enabled: bool,
    pub capacity: usize,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: postrank::cache::DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: Some("info".to_string()),
            rating: RatingSection::default(),
            scheduler: SchedulerSection::default(),
            display: DisplaySection::default(),
            cache: CacheSection::default(),
        }
    }
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file_chain(config_path)?;
        config.rating.api_key = config.resolve_api_key(|name| std::env::var(name).ok());
        Ok(config)
    }

    fn load_file_chain(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        if let Some(config_dir) = dirs::config_dir() {
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
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// `POSTRANK_API_KEY` wins; the provider's own variable only fills an empty key
    pub fn resolve_api_key(&self, lookup: impl Fn(&str) -> Option<String>) -> String {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty(API_KEY_ENV) {
            return key;
        }
        if !self.rating.api_key.trim().is_empty() {
            return self.rating.api_key.clone();
        }
        non_empty(self.provider_kind().key_env_var()).unwrap_or_default()
    }

    pub fn provider_kind(&self) -> ProviderKind {
        ProviderKind::for_model(&self.rating.model)
    }

    pub fn rating_config(&self) -> RatingConfig {
        RatingConfig::new(
            self.rating.api_key.clone(),
            self.rating.model.clone(),
            self.rating.criteria.clone(),
        )
    }

    pub fn gemini_config(&self) -> GeminiConfig {
        GeminiConfig {
            base_url: self.rating.gemini_base_url.clone(),
            timeout: Duration::from_millis(self.scheduler.call_timeout_ms),
        }
    }

    pub fn anthropic_config(&self) -> AnthropicConfig {
        AnthropicConfig {
            url: self.rating.anthropic_url.clone(),
            max_tokens: self.rating.max_tokens,
            timeout: Duration::from_millis(self.scheduler.call_timeout_ms),
        }
    }

    pub fn gateway_options(&self) -> GatewayOptions {
        GatewayOptions {
            scheduler: SchedulerSettings::default()
                .with_retry_delay(Duration::from_millis(self.scheduler.retry_delay_ms))
                .with_call_timeout(Duration::from_millis(self.scheduler.call_timeout_ms)),
            cache_capacity: self.cache.enabled.then_some(self.cache.capacity),
        }
    }

    /// Copy safe to print: the API key is masked
    pub fn masked(&self) -> Self {
        let mut copy = self.clone();
        copy.rating.api_key = mask_key(&self.rating.api_key);
        copy
    }
}

/// Keep the first and last four characters of long keys, hide the rest
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    match chars.len() {
        0 => String::new(),
        n if n <= 8 => "*".repeat(n),
        n => {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[n - 4..].iter().collect();
            format!("{}{}{}", head, "*".repeat(n - 8), tail)
        }
    }
}
