use oasis_shared::CapacityTable;
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub transport: TransportConfig,
    pub business_rules: BusinessRules,
    #[serde(default)]
    pub capacity: CapacityTable,
    pub bootstrap_operator: BootstrapOperator,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    #[serde(default = "default_queue_capacity")]
    pub notice_queue_capacity: usize,
}

fn default_queue_capacity() -> usize {
    256
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

/// Where inbound updates come from and outbound messages go.
#[derive(Debug, Deserialize, Clone)]
pub struct TransportConfig {
    /// Relay endpoint outbound messages are POSTed to.
    pub api_url: String,
    /// Bearer token for the relay.
    pub api_token: String,
    /// Shared secret the relay must present on inbound updates.
    pub webhook_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    pub price_per_person: i64,
    pub currency: String,
    pub merchant_phone: String,
    #[serde(default = "default_code_prefix")]
    pub code_prefix: String,
}

fn default_code_prefix() -> String {
    "OASIS".to_string()
}

/// Seeded into the operator directory when it is empty at startup, so a
/// fresh deployment always has exactly one operator who can promote the
/// rest. Configurable, never hardcoded.
#[derive(Debug, Deserialize, Clone)]
pub struct BootstrapOperator {
    pub identity: String,
    pub username: Option<String>,
    pub full_name: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Add in the current environment file
            // Default to 'development' env
            // Note that this file is _optional_
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked in to git
            .add_source(config::File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of OASIS)
            // Eg.. `OASIS__SERVER__PORT=9090` would set the server port
            .add_source(config::Environment::with_prefix("OASIS").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
