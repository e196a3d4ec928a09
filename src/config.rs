use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

/// Top-level configuration for the watcher.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Network identifier (e.g., mainnet, hoodi). Default: "mainnet".
    #[serde(default = "default_network")]
    pub network: String,

    /// Beacon node HTTP endpoint. Default: "http://localhost:5052".
    #[serde(default = "default_beacon_url")]
    pub beacon_url: String,

    /// Beacon request timeout in seconds. Default: 90.
    #[serde(default = "default_beacon_timeout_sec")]
    pub beacon_timeout_sec: u64,

    /// Port the metrics/health server listens on. Default: 8000.
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Validators to watch, each with its label set.
    #[serde(default)]
    pub watched_keys: Vec<WatchedKey>,

    /// Slack credentials, reserved for alerting integrations.
    #[serde(default)]
    pub slack_token: Option<String>,

    #[serde(default)]
    pub slack_channel: Option<String>,

    /// Replay window start (unix seconds). Enables replay mode when set.
    #[serde(default)]
    pub replay_start_at_ts: Option<u64>,

    /// Replay window end (unix seconds).
    #[serde(default)]
    pub replay_end_at_ts: Option<u64>,

    /// Load the full network validator set for network-wide comparison.
    /// Default: true.
    #[serde(default)]
    pub load_all_validators: Option<bool>,
}

/// One watched validator from the configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchedKey {
    /// BLS public key, 0x-prefixed hex (98 characters total).
    pub public_key: String,

    /// Free-form grouping labels.
    #[serde(default)]
    pub labels: Vec<String>,
}

// --- Default value functions ---

fn default_network() -> String {
    "mainnet".to_string()
}

fn default_beacon_url() -> String {
    "http://localhost:5052".to_string()
}

fn default_beacon_timeout_sec() -> u64 {
    90
}

fn default_metrics_port() -> u16 {
    8000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: default_network(),
            beacon_url: default_beacon_url(),
            beacon_timeout_sec: default_beacon_timeout_sec(),
            metrics_port: default_metrics_port(),
            watched_keys: Vec::new(),
            slack_token: None,
            slack_channel: None,
            replay_start_at_ts: None,
            replay_end_at_ts: None,
            load_all_validators: None,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file, validate it, and apply
    /// environment-variable overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;

        let mut cfg = Self::from_yaml(&data)
            .with_context(|| format!("parsing config file {}", path.display()))?;

        cfg.apply_env_overrides();

        Ok(cfg)
    }

    /// Parse and validate configuration from YAML text.
    pub fn from_yaml(data: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(data).context("parsing YAML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate required fields and well-formedness of watched keys.
    pub fn validate(&self) -> Result<()> {
        if self.network.is_empty() {
            bail!("network is required");
        }

        if self.beacon_url.is_empty() {
            bail!("beacon_url is required");
        }

        if self.metrics_port == 0 {
            bail!("metrics_port must be between 1 and 65535");
        }

        if self.beacon_timeout_sec == 0 {
            bail!("beacon_timeout_sec must be positive");
        }

        for (i, key) in self.watched_keys.iter().enumerate() {
            if key.public_key.is_empty() {
                bail!("watched_keys[{i}]: public_key is required");
            }

            let well_formed = key.public_key.len() == 98
                && key.public_key.starts_with("0x")
                && key.public_key[2..].chars().all(|c| c.is_ascii_hexdigit());

            if !well_formed {
                bail!("watched_keys[{i}]: public_key must be a 0x-prefixed 48-byte hex BLS key");
            }
        }

        Ok(())
    }

    /// Override selected fields from the environment.
    fn apply_env_overrides(&mut self) {
        if let Ok(network) = std::env::var("ETH_WATCHER_NETWORK") {
            if !network.is_empty() {
                self.network = network;
            }
        }
        if let Ok(url) = std::env::var("ETH_WATCHER_BEACON_URL") {
            if !url.is_empty() {
                self.beacon_url = url;
            }
        }
        if let Ok(token) = std::env::var("ETH_WATCHER_SLACK_TOKEN") {
            if !token.is_empty() {
                self.slack_token = Some(token);
            }
        }
        if let Ok(channel) = std::env::var("ETH_WATCHER_SLACK_CHANNEL") {
            if !channel.is_empty() {
                self.slack_channel = Some(channel);
            }
        }
    }

    /// Beacon request timeout as a `Duration`.
    pub fn beacon_timeout(&self) -> Duration {
        Duration::from_secs(self.beacon_timeout_sec)
    }

    /// Whether the full validator set should be loaded (default true).
    pub fn should_load_all_validators(&self) -> bool {
        self.load_all_validators.unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pubkey(fill: char) -> String {
        format!("0x{}", String::from(fill).repeat(96))
    }

    #[test]
    fn test_default_config_values() {
        let cfg = Config::default();
        assert_eq!(cfg.network, "mainnet");
        assert_eq!(cfg.beacon_url, "http://localhost:5052");
        assert_eq!(cfg.beacon_timeout_sec, 90);
        assert_eq!(cfg.metrics_port, 8000);
        assert!(cfg.should_load_all_validators());
    }

    #[test]
    fn test_from_yaml_minimal() {
        let cfg = Config::from_yaml("network: hoodi\nbeacon_url: http://beacon:5052\n")
            .expect("should parse");
        assert_eq!(cfg.network, "hoodi");
        assert_eq!(cfg.beacon_url, "http://beacon:5052");
        assert_eq!(cfg.metrics_port, 8000);
        assert!(cfg.watched_keys.is_empty());
    }

    #[test]
    fn test_from_yaml_watched_keys() {
        let yaml = format!(
            "network: mainnet\nwatched_keys:\n  - public_key: \"{}\"\n    labels: [operator:a, region:eu]\n",
            sample_pubkey('a'),
        );

        let cfg = Config::from_yaml(&yaml).expect("should parse");
        assert_eq!(cfg.watched_keys.len(), 1);
        assert_eq!(
            cfg.watched_keys[0].labels,
            vec!["operator:a".to_string(), "region:eu".to_string()],
        );
    }

    #[test]
    fn test_validate_rejects_empty_network() {
        let cfg = Config {
            network: String::new(),
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("network"));
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let cfg = Config {
            metrics_port: 0,
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("metrics_port"));
    }

    #[test]
    fn test_validate_rejects_short_pubkey() {
        let cfg = Config {
            watched_keys: vec![WatchedKey {
                public_key: "0xabcd".to_string(),
                labels: Vec::new(),
            }],
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("watched_keys[0]"));
    }

    #[test]
    fn test_validate_rejects_non_hex_pubkey() {
        let cfg = Config {
            watched_keys: vec![WatchedKey {
                public_key: format!("0x{}", "z".repeat(96)),
                labels: Vec::new(),
            }],
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_well_formed_pubkey() {
        let cfg = Config {
            watched_keys: vec![WatchedKey {
                public_key: sample_pubkey('b'),
                labels: vec!["operator:x".to_string()],
            }],
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_replay_window_parsed() {
        let cfg = Config::from_yaml(
            "network: mainnet\nreplay_start_at_ts: 1606824023\nreplay_end_at_ts: 1606825000\n",
        )
        .expect("should parse");
        assert_eq!(cfg.replay_start_at_ts, Some(1_606_824_023));
        assert_eq!(cfg.replay_end_at_ts, Some(1_606_825_000));
    }

    #[test]
    fn test_load_all_validators_opt_out() {
        let cfg = Config::from_yaml("network: mainnet\nload_all_validators: false\n")
            .expect("should parse");
        assert!(!cfg.should_load_all_validators());
    }
}
