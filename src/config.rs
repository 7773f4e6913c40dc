//! Application configuration, loaded from `config/{env}.yaml`.

use std::fs;
use std::time::Duration;

use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core_types::AccountRef;
use crate::ledger::Account;
use crate::transfer::WorkerConfig;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub worker: WorkerSettings,
    /// Accounts seeded into the ledger at startup. Registration itself is
    /// an external collaborator; this stands in for it.
    #[serde(default)]
    pub accounts: Vec<AccountSeed>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "./logs".to_string(),
            log_file: "payflow.log".to_string(),
            use_json: false,
            rotation: "daily".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct QueueConfig {
    /// Transfer topic capacity; publish fails fast when full.
    pub capacity: usize,
    /// Worker -> notifier push-event queue capacity.
    pub push_capacity: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            push_capacity: 1024,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RetentionConfig {
    /// Status/history TTL, 24h by default.
    pub ttl_secs: u64,
    /// Per-owner history cap.
    pub history_cap: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 24 * 60 * 60,
            history_cap: 100,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WorkerSettings {
    /// Consumer-group size.
    pub instances: usize,
    pub poll_timeout_ms: u64,
    pub error_backoff_ms: u64,
    pub processing_delay_ms: u64,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            instances: 1,
            poll_timeout_ms: 1000,
            error_backoff_ms: 500,
            processing_delay_ms: 0,
        }
    }
}

impl WorkerSettings {
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig {
            poll_timeout: Duration::from_millis(self.poll_timeout_ms),
            error_backoff: Duration::from_millis(self.error_backoff_ms),
            processing_delay: Duration::from_millis(self.processing_delay_ms),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccountSeed {
    pub owner: String,
    pub display_name: String,
    pub routing_id: String,
    pub account_number: String,
    pub balance: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "BRL".to_string()
}

impl AccountSeed {
    pub fn into_account(self) -> Account {
        Account {
            account: AccountRef::new(self.routing_id, self.account_number),
            owner: self.owner,
            display_name: self.display_name,
            balance: self.balance,
            currency: self.currency,
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> anyhow::Result<Self> {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read config file: {config_path}"))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config yaml: {config_path}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.retention.ttl_secs, 86_400);
        assert_eq!(config.retention.history_cap, 100);
        assert_eq!(config.worker.instances, 1);
        assert!(config.accounts.is_empty());
    }

    #[test]
    fn test_account_seed_parsing() {
        let yaml = r#"
accounts:
  - owner: alice@example.com
    display_name: Alice
    routing_id: "001"
    account_number: "1000-1"
    balance: "1000.50"
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        let account = config.accounts[0].clone().into_account();
        assert_eq!(account.owner, "alice@example.com");
        assert_eq!(account.currency, "BRL");
        assert_eq!(account.balance.to_string(), "1000.50");
    }
}
