use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub cluster: ClusterConfig,
    pub logging: LoggingConfig,
}

/// Connection settings for the search cluster that serves explain calls
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Base URL of a cluster node, e.g. `http://localhost:9200`
    pub url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

impl Config {
    /// Load configuration with environment variable override support
    ///
    /// Loading order:
    /// 1. Load from the explicit path, or the first config.toml found
    /// 2. Override with environment variables (prefixed with APP_)
    /// 3. Validate the final configuration
    pub fn load(explicit_path: Option<&str>) -> Result<Self, anyhow::Error> {
        let mut config = match explicit_path {
            Some(path) => Self::from_toml(path)?,
            None => {
                if let Some(config_path) = Self::find_config_file() {
                    Self::from_toml(&config_path)?
                } else {
                    tracing::warn!("Configuration file not found, using defaults");
                    Config::default()
                }
            },
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - APP_CLUSTER_URL: Cluster base URL (default: http://localhost:9200)
    /// - APP_CLUSTER_USERNAME: Basic auth user
    /// - APP_CLUSTER_PASSWORD: Basic auth password
    /// - APP_CLUSTER_TIMEOUT: Request timeout (accepts "30", "30s", "2m")
    /// - APP_LOG_LEVEL: Logging level (e.g., "info,search_explain=debug")
    /// - APP_LOG_FILE: Log file path
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("APP_CLUSTER_URL") {
            self.cluster.url = url;
            tracing::info!("Override cluster.url from env: {}", self.cluster.url);
        }

        if let Some(username) = lookup("APP_CLUSTER_USERNAME") {
            self.cluster.username = Some(username);
            tracing::info!("Override cluster.username from env");
        }

        if let Some(password) = lookup("APP_CLUSTER_PASSWORD") {
            self.cluster.password = Some(password);
            tracing::info!("Override cluster.password from env");
        }

        if let Some(timeout) = lookup("APP_CLUSTER_TIMEOUT") {
            match parse_duration_to_secs(&timeout) {
                Ok(val) => {
                    self.cluster.timeout_secs = val;
                    tracing::info!(
                        "Override cluster.timeout_secs from env: {}",
                        self.cluster.timeout_secs
                    );
                },
                Err(e) => tracing::warn!(
                    "Invalid APP_CLUSTER_TIMEOUT '{}': {} (keep {})",
                    timeout,
                    e,
                    self.cluster.timeout_secs
                ),
            }
        }

        if let Some(level) = lookup("APP_LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("Override logging.level from env: {}", self.logging.level);
        }

        if let Some(file) = lookup("APP_LOG_FILE") {
            self.logging.file = if file.is_empty() { None } else { Some(file) };
        }
    }

    /// Validate configuration
    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.cluster.url.is_empty() {
            anyhow::bail!("cluster.url cannot be empty");
        }
        if !self.cluster.url.starts_with("http://") && !self.cluster.url.starts_with("https://") {
            anyhow::bail!("cluster.url must start with http:// or https://");
        }
        if self.cluster.timeout_secs == 0 {
            anyhow::bail!("cluster.timeout_secs must be > 0");
        }
        if self.cluster.password.is_some() && self.cluster.username.is_none() {
            anyhow::bail!("cluster.password is set but cluster.username is missing");
        }

        Ok(())
    }

    fn find_config_file() -> Option<String> {
        let possible_paths = ["conf/config.toml", "config.toml"];

        for path in &possible_paths {
            if Path::new(path).exists() {
                return Some(path.to_string());
            }
        }
        None
    }

    fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, anyhow::Error> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_string(),
            username: None,
            password: None,
            timeout_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info,search_explain=debug".to_string(), file: None }
    }
}

// =========================
// Helpers for parsing values
// =========================

fn parse_duration_to_secs(input: &str) -> Result<u64, String> {
    // Accept plain numbers (treated as seconds)
    if let Ok(val) = input.parse::<u64>() {
        return Ok(val);
    }

    let s = input.trim().to_lowercase();
    let (num_str, unit) = s.split_at(s.chars().take_while(|c| c.is_ascii_digit()).count());
    if num_str.is_empty() || unit.is_empty() {
        return Err("missing number or unit".into());
    }
    let n: u64 = num_str.parse().map_err(|_| "invalid number".to_string())?;
    let multiplier: u64 = match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hour" | "hours" => 60 * 60,
        _ => return Err(format!("unsupported unit: {}", unit)),
    };
    n.checked_mul(multiplier).ok_or_else(|| "duration too large".to_string())
}

// Accepts either a number of seconds or a human-friendly string
fn deserialize_duration_secs<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct Visitor;
    impl<'de> serde::de::Visitor<'de> for Visitor {
        type Value = u64;
        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a number of seconds or a string like '30s', '5m', '1h'")
        }
        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v)
        }
        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if v >= 0 { Ok(v as u64) } else { Err(E::custom("negative not allowed")) }
        }
        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            parse_duration_to_secs(v).map_err(E::custom)
        }
    }
    deserializer.deserialize_any(Visitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_duration_to_secs() {
        assert_eq!(parse_duration_to_secs("45"), Ok(45));
        assert_eq!(parse_duration_to_secs("10s"), Ok(10));
        assert_eq!(parse_duration_to_secs("2m"), Ok(120));
        assert_eq!(parse_duration_to_secs("1h"), Ok(3600));
        assert!(parse_duration_to_secs("soon").is_err());
        assert!(parse_duration_to_secs("3d").is_err());
    }

    #[test]
    fn test_parse_duration_overflow() {
        assert_eq!(
            parse_duration_to_secs("99999999999999999h"),
            Err("duration too large".to_string())
        );
        assert_eq!(parse_duration_to_secs("99999999999999999999s"), Err("invalid number".to_string()));
    }

    #[test]
    fn test_overflowing_timeout_override_keeps_value() {
        let mut config = Config::default();
        config.apply_overrides(|key| {
            (key == "APP_CLUSTER_TIMEOUT").then(|| "99999999999999999h".to_string())
        });
        assert_eq!(config.cluster.timeout_secs, 30);
    }

    #[test]
    fn test_from_toml_str() {
        let config = Config::from_toml_str(
            r#"
            [cluster]
            url = "https://search.internal:9200"
            username = "elastic"
            password = "changeme"
            timeout_secs = "1m"

            [logging]
            level = "debug"
            file = "logs/explain.log"
            "#,
        )
        .unwrap();

        assert_eq!(config.cluster.url, "https://search.internal:9200");
        assert_eq!(config.cluster.username.as_deref(), Some("elastic"));
        assert_eq!(config.cluster.timeout_secs, 60);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file.as_deref(), Some("logs/explain.log"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.cluster.url, "http://localhost:9200");
        assert_eq!(config.cluster.timeout_secs, 30);
        assert!(config.logging.file.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("APP_CLUSTER_URL", "http://10.0.0.5:9200"),
            ("APP_CLUSTER_USERNAME", "reader"),
            ("APP_CLUSTER_TIMEOUT", "5s"),
            ("APP_LOG_FILE", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.logging.file = Some("logs/old.log".to_string());
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.cluster.url, "http://10.0.0.5:9200");
        assert_eq!(config.cluster.username.as_deref(), Some("reader"));
        assert_eq!(config.cluster.timeout_secs, 5);
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn test_invalid_timeout_override_keeps_value() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == "APP_CLUSTER_TIMEOUT").then(|| "later".to_string()));
        assert_eq!(config.cluster.timeout_secs, 30);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.cluster.url = "localhost:9200".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.cluster.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.cluster.password = Some("secret".to_string());
        assert!(config.validate().is_err());
    }
}
