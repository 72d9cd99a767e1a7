use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CleanupError, Result};

/// Environment variable holding extra comma-separated whitelist entries
pub const WHITELIST_ENV_VAR: &str = "WHITELISTED_EMAILS";

static SIZE_QUERY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[kKmM]?$").unwrap());
static AGE_QUERY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[dmy]$").unwrap());

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub drive: DriveConfig,
    #[serde(default)]
    pub gmail: GmailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Directory holding one token cache file per scope set
    #[serde(default = "default_token_dir")]
    pub token_dir: PathBuf,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_dir: default_token_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriveConfig {
    #[serde(default = "default_drive_page_size")]
    pub page_size: u32,
    /// Stop listing after this many pages; absent means follow every page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<usize>,
    /// Number of rows shown by the "largest" and "recent" menu entries
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            page_size: default_drive_page_size(),
            max_pages: None,
            list_limit: default_list_limit(),
        }
    }
}

/// What to do with a message that lacks a `From` header
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    #[default]
    Skip,
    Abort,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GmailConfig {
    #[serde(default = "default_gmail_page_size")]
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_pages: Option<usize>,
    #[serde(default = "default_spam_senders")]
    pub spam_senders: Vec<String>,
    /// Argument of the `larger:` search operator
    #[serde(default = "default_large_threshold")]
    pub large_threshold: String,
    /// Argument of the `older_than:` search operator
    #[serde(default = "default_older_than")]
    pub older_than: String,
    /// Sender substrings that are never staged; merged with WHITELISTED_EMAILS
    #[serde(default)]
    pub whitelist: Vec<String>,
    #[serde(default = "default_deduplicate")]
    pub deduplicate: bool,
    #[serde(default)]
    pub malformed_policy: MalformedPolicy,
    #[serde(default = "default_staging_file")]
    pub staging_file: PathBuf,
    #[serde(default = "default_stats_file")]
    pub stats_file: PathBuf,
}

impl Default for GmailConfig {
    fn default() -> Self {
        Self {
            page_size: default_gmail_page_size(),
            max_pages: None,
            spam_senders: default_spam_senders(),
            large_threshold: default_large_threshold(),
            older_than: default_older_than(),
            whitelist: Vec::new(),
            deduplicate: default_deduplicate(),
            malformed_policy: MalformedPolicy::default(),
            staging_file: default_staging_file(),
            stats_file: default_stats_file(),
        }
    }
}

fn default_token_dir() -> PathBuf {
    PathBuf::from(".google-cleanup")
}

fn default_drive_page_size() -> u32 {
    1000
}

fn default_list_limit() -> usize {
    10
}

fn default_gmail_page_size() -> u32 {
    100
}

fn default_spam_senders() -> Vec<String> {
    [
        "jobs-listings@linkedin.com",
        "jobalerts-noreply@linkedin.com",
        "team@datacamp.com",
        "newsletters@biospace.com",
        "FromYouFlowers@email.fromyouflowers.com",
        "newsletters@medium.com",
        "biospace_noreply@biospace.com",
        "jobs@alerts.jobot.com",
        "alert@notification.bebee.com",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_large_threshold() -> String {
    "5M".to_string()
}

fn default_older_than() -> String {
    "2y".to_string()
}

fn default_deduplicate() -> bool {
    true
}

fn default_staging_file() -> PathBuf {
    PathBuf::from("emails_to_delete.json")
}

fn default_stats_file() -> PathBuf {
    PathBuf::from("deletion_stats.txt")
}

/// Split a comma-separated whitelist, dropping blank entries.
///
/// An unset variable yields `""`, which would otherwise become an empty
/// entry matching every sender.
pub fn parse_whitelist(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    pub async fn load(path: &Path) -> Result<Self> {
        // If file doesn't exist, return default config with warning
        if !path.exists() {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CleanupError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| CleanupError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                CleanupError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| CleanupError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        tokio::fs::write(path, content)
            .await
            .map_err(|e| CleanupError::ConfigError(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.drive.page_size == 0 || self.drive.page_size > 1000 {
            return Err(CleanupError::ConfigError(
                "drive.page_size must be between 1 and 1000".to_string(),
            ));
        }
        if self.drive.max_pages == Some(0) {
            return Err(CleanupError::ConfigError(
                "drive.max_pages must be at least 1 when set".to_string(),
            ));
        }
        if self.drive.list_limit == 0 {
            return Err(CleanupError::ConfigError(
                "drive.list_limit must be greater than 0".to_string(),
            ));
        }

        if self.gmail.page_size == 0 || self.gmail.page_size > 500 {
            return Err(CleanupError::ConfigError(
                "gmail.page_size must be between 1 and 500".to_string(),
            ));
        }
        if self.gmail.max_pages == Some(0) {
            return Err(CleanupError::ConfigError(
                "gmail.max_pages must be at least 1 when set".to_string(),
            ));
        }
        if !SIZE_QUERY.is_match(&self.gmail.large_threshold) {
            return Err(CleanupError::ConfigError(format!(
                "Invalid gmail.large_threshold: '{}'. Expected a number with optional K or M suffix",
                self.gmail.large_threshold
            )));
        }
        if !AGE_QUERY.is_match(&self.gmail.older_than) {
            return Err(CleanupError::ConfigError(format!(
                "Invalid gmail.older_than: '{}'. Expected a number followed by d, m or y",
                self.gmail.older_than
            )));
        }
        for sender in &self.gmail.spam_senders {
            if sender.trim().is_empty() || sender.contains(char::is_whitespace) {
                return Err(CleanupError::ConfigError(format!(
                    "gmail.spam_senders contains an invalid address: '{}'",
                    sender
                )));
            }
        }
        if self.gmail.whitelist.iter().any(|w| w.trim().is_empty()) {
            return Err(CleanupError::ConfigError(
                "gmail.whitelist cannot contain empty strings".to_string(),
            ));
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Whitelist from the config file merged with `WHITELISTED_EMAILS`
    pub fn whitelist_with_env(&self) -> Vec<String> {
        let from_env = std::env::var(WHITELIST_ENV_VAR).unwrap_or_default();
        self.merged_whitelist(&from_env)
    }

    fn merged_whitelist(&self, raw_env: &str) -> Vec<String> {
        let mut entries = self.gmail.whitelist.clone();
        for entry in parse_whitelist(raw_env) {
            if !entries.contains(&entry) {
                entries.push(entry);
            }
        }
        entries
    }

    /// Create an example configuration file
    pub async fn create_example(path: &Path) -> Result<()> {
        let config = Self::default();
        config.save(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.auth.token_dir, PathBuf::from(".google-cleanup"));

        assert_eq!(config.drive.page_size, 1000);
        assert_eq!(config.drive.max_pages, None);
        assert_eq!(config.drive.list_limit, 10);

        assert_eq!(config.gmail.page_size, 100);
        assert_eq!(config.gmail.spam_senders.len(), 9);
        assert!(config
            .gmail
            .spam_senders
            .contains(&"newsletters@medium.com".to_string()));
        assert_eq!(config.gmail.large_threshold, "5M");
        assert_eq!(config.gmail.older_than, "2y");
        assert!(config.gmail.deduplicate);
        assert_eq!(config.gmail.malformed_policy, MalformedPolicy::Skip);
        assert_eq!(config.gmail.staging_file, PathBuf::from("emails_to_delete.json"));
        assert_eq!(config.gmail.stats_file, PathBuf::from("deletion_stats.txt"));
    }

    #[test]
    fn test_config_validation_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_drive_page_size() {
        let mut config = Config::default();
        config.drive.page_size = 0;
        assert!(config.validate().is_err());

        config.drive.page_size = 1001;
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("between 1 and 1000"));

        config.drive.page_size = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_max_pages_zero() {
        let mut config = Config::default();
        config.gmail.max_pages = Some(0);
        assert!(config.validate().is_err());

        config.gmail.max_pages = Some(3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_query_fragments() {
        let mut config = Config::default();

        for valid in ["5M", "500k", "1048576"] {
            config.gmail.large_threshold = valid.to_string();
            assert!(config.validate().is_ok(), "{} should be valid", valid);
        }
        config.gmail.large_threshold = "5 MB".to_string();
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("Invalid gmail.large_threshold"));

        config.gmail.large_threshold = "5M".to_string();
        for valid in ["2y", "6m", "30d"] {
            config.gmail.older_than = valid.to_string();
            assert!(config.validate().is_ok(), "{} should be valid", valid);
        }
        config.gmail.older_than = "two years".to_string();
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("Invalid gmail.older_than"));
    }

    #[test]
    fn test_config_validation_bad_sender() {
        let mut config = Config::default();
        config.gmail.spam_senders.push("not an address".to_string());
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("spam_senders"));
    }

    #[test]
    fn test_config_validation_empty_whitelist_entry() {
        let mut config = Config::default();
        config.gmail.whitelist.push("  ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_whitelist() {
        assert!(parse_whitelist("").is_empty());
        assert_eq!(
            parse_whitelist("boss@work.com, ,family.org,"),
            vec!["boss@work.com".to_string(), "family.org".to_string()]
        );
    }

    #[test]
    fn test_merged_whitelist_dedupes() {
        let mut config = Config::default();
        config.gmail.whitelist = vec!["boss@work.com".to_string()];

        let merged = config.merged_whitelist("boss@work.com,friend@home.net");
        assert_eq!(
            merged,
            vec!["boss@work.com".to_string(), "friend@home.net".to_string()]
        );
    }

    #[tokio::test]
    async fn test_config_load_save_roundtrip() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path();

        let mut config = Config::default();
        config.gmail.max_pages = Some(4);
        config.gmail.malformed_policy = MalformedPolicy::Abort;
        config.save(path).await.unwrap();

        let loaded = Config::load(path).await.unwrap();
        assert_eq!(loaded.gmail.max_pages, Some(4));
        assert_eq!(loaded.gmail.malformed_policy, MalformedPolicy::Abort);
        assert_eq!(loaded.gmail.spam_senders, config.gmail.spam_senders);
        assert_eq!(loaded.drive.page_size, config.drive.page_size);
    }

    #[tokio::test]
    async fn test_config_load_nonexistent_returns_default() {
        let path = Path::new("/tmp/nonexistent-google-cleanup-config-12345.toml");
        let config = Config::load(path).await.unwrap();
        assert_eq!(config.drive.page_size, 1000);
    }

    #[tokio::test]
    async fn test_config_load_invalid_toml() {
        let temp_file = NamedTempFile::new().unwrap();
        tokio::fs::write(temp_file.path(), "this is not valid toml {[}]")
            .await
            .unwrap();

        let result = Config::load(temp_file.path()).await;
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to parse config file"));
    }

    #[tokio::test]
    async fn test_config_partial_with_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        let partial_config = r#"
[drive]
list_limit = 25

[gmail]
older_than = "1y"
whitelist = ["family.org"]
malformed_policy = "abort"
"#;
        tokio::fs::write(temp_file.path(), partial_config)
            .await
            .unwrap();

        let config = Config::load(temp_file.path()).await.unwrap();
        assert_eq!(config.drive.list_limit, 25);
        assert_eq!(config.gmail.older_than, "1y");
        assert_eq!(config.gmail.whitelist, vec!["family.org".to_string()]);
        assert_eq!(config.gmail.malformed_policy, MalformedPolicy::Abort);

        assert_eq!(config.drive.page_size, 1000);
        assert_eq!(config.gmail.large_threshold, "5M");
        assert!(config.gmail.deduplicate);
    }

    #[tokio::test]
    async fn test_config_create_example() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        Config::create_example(&path).await.unwrap();
        assert!(path.exists());

        let config = Config::load(&path).await.unwrap();
        assert_eq!(config.gmail.older_than, "2y");
    }
}
