//! Configuration management with validation and defaults
//!
//! A game is deployed from a [`GuessGameConfig`]: owner, fee, range and the
//! coordinator parameters. [`ConfigLoader`] reads it from TOML, applies
//! `GUESS_GAME_*` environment overrides and validates the result.

use crate::common::types::{Address, Amount};
use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_GUESS_RANGE: u64 = 256;
pub const DEFAULT_ENTRANCE_FEE: Amount = 3;
pub const DEFAULT_CALLBACK_GAS_LIMIT: u32 = 500_000;
pub const DEFAULT_REQUEST_CONFIRMATIONS: u16 = 3;
pub const DEFAULT_NUM_WORDS: u32 = 1;

/// Gas lane used by the local development coordinator
pub const DEFAULT_KEY_HASH: &str =
    "0x79d3d8832d904592c0bf9818b621522c988bb8b0c05cdc3b15aea1b6e8db0c15";

// Well-known local development accounts
const DEV_DEPLOYER: Address = Address::new([
    0xf3, 0x9f, 0xd6, 0xe5, 0x1a, 0xad, 0x88, 0xf6, 0xf4, 0xce, 0x6a, 0xb8, 0x82, 0x72, 0x79, 0xcf,
    0xff, 0xb9, 0x22, 0x66,
]);
const DEV_COORDINATOR: Address = Address::new([
    0x5f, 0xbd, 0xb2, 0x31, 0x56, 0x78, 0xaf, 0xec, 0xb3, 0x67, 0xf0, 0x32, 0xd9, 0x3f, 0x64, 0x2f,
    0x64, 0x18, 0x0a, 0xa3,
]);
const DEV_GAME: Address = Address::new([
    0xe7, 0xf1, 0x72, 0x5e, 0x77, 0x34, 0xce, 0x28, 0x8f, 0x83, 0x67, 0xe1, 0xbb, 0x14, 0x3e, 0x90,
    0xbb, 0x3f, 0x05, 0x12,
]);

/// Complete deployment configuration for one game
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GuessGameConfig {
    pub game: GameConfig,
    pub oracle: OracleConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
}

/// Game parameters fixed at deployment (range stays owner-mutable)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub owner: Address,
    /// The game's own identity, registered as an oracle consumer
    pub address: Address,
    pub entrance_fee: Amount,
    #[serde(default = "default_guess_range")]
    pub guess_range: u64,
}

fn default_guess_range() -> u64 {
    DEFAULT_GUESS_RANGE
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            owner: DEV_DEPLOYER,
            address: DEV_GAME,
            entrance_fee: DEFAULT_ENTRANCE_FEE,
            guess_range: DEFAULT_GUESS_RANGE,
        }
    }
}

/// Randomness coordinator connection parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// The only identity allowed to deliver randomness
    pub coordinator: Address,
    pub subscription_id: u64,
    pub key_hash: String,
    #[serde(default = "default_callback_gas_limit")]
    pub callback_gas_limit: u32,
    #[serde(default = "default_request_confirmations")]
    pub request_confirmations: u16,
    #[serde(default = "default_num_words")]
    pub num_words: u32,
}

fn default_callback_gas_limit() -> u32 {
    DEFAULT_CALLBACK_GAS_LIMIT
}

fn default_request_confirmations() -> u16 {
    DEFAULT_REQUEST_CONFIRMATIONS
}

fn default_num_words() -> u32 {
    DEFAULT_NUM_WORDS
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            coordinator: DEV_COORDINATOR,
            subscription_id: 1,
            key_hash: DEFAULT_KEY_HASH.to_string(),
            callback_gas_limit: DEFAULT_CALLBACK_GAS_LIMIT,
            request_confirmations: DEFAULT_REQUEST_CONFIRMATIONS,
            num_words: DEFAULT_NUM_WORDS,
        }
    }
}

/// Logging and metrics configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enable_metrics: bool,
    pub log_level: LogLevel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            enable_metrics: true,
            log_level: LogLevel::Info,
        }
    }
}

impl GuessGameConfig {
    /// Configuration for a local chain: verbose logs, subscription 1
    pub fn local_development() -> Self {
        Self {
            monitoring: MonitoringConfig {
                enable_metrics: true,
                log_level: LogLevel::Debug,
            },
            ..Default::default()
        }
    }

    /// Validate configuration for logical consistency
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.game.guess_range == 0 {
            return Err(invalid("game.guess_range", "0", "guess range must be > 0"));
        }

        if self.game.entrance_fee == 0 {
            return Err(invalid("game.entrance_fee", "0", "entrance fee must be > 0"));
        }

        if self.game.owner.is_zero() {
            return Err(invalid(
                "game.owner",
                &self.game.owner.to_string(),
                "owner must not be the zero address",
            ));
        }

        if self.oracle.coordinator.is_zero() {
            return Err(invalid(
                "oracle.coordinator",
                &self.oracle.coordinator.to_string(),
                "coordinator must not be the zero address",
            ));
        }

        if self.game.owner == self.oracle.coordinator {
            return Err(ConfigurationError::ValidationFailed(
                "owner and coordinator must be different identities".to_string(),
            ));
        }

        let key_hash = self.oracle.key_hash.trim_start_matches("0x");
        match hex::decode(key_hash) {
            Ok(bytes) if bytes.len() == 32 => {}
            _ => {
                return Err(invalid(
                    "oracle.key_hash",
                    &self.oracle.key_hash,
                    "key hash must be 32 bytes of hex",
                ))
            }
        }

        if self.oracle.num_words == 0 {
            return Err(invalid("oracle.num_words", "0", "at least one word is required"));
        }

        if self.oracle.request_confirmations == 0 {
            return Err(invalid(
                "oracle.request_confirmations",
                "0",
                "at least one confirmation is required",
            ));
        }

        if self.oracle.callback_gas_limit == 0 {
            return Err(invalid("oracle.callback_gas_limit", "0", "gas limit must be > 0"));
        }

        Ok(())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigurationError> {
        toml::from_str(content).map_err(|e| {
            ConfigurationError::LoadFailed(format!("Failed to parse TOML: {}", e))
        })
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigurationError> {
        toml::to_string_pretty(self).map_err(|e| {
            ConfigurationError::SaveFailed(format!("Failed to serialize config: {}", e))
        })
    }
}

fn invalid(field: &str, value: &str, reason: &str) -> ConfigurationError {
    ConfigurationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Loads configuration from an optional TOML file plus environment overrides
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> Result<GuessGameConfig, ConfigurationError> {
        self.load_with(|key| env::var(key).ok())
    }

    /// Same as [`load`](Self::load) with an explicit variable lookup
    pub fn load_with<F>(&self, lookup: F) -> Result<GuessGameConfig, ConfigurationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match self.config_path {
            Some(ref path) => Self::load_from_file(path)?,
            None => GuessGameConfig::default(),
        };

        apply_overrides(&mut config, lookup)?;
        config.validate()?;

        tracing::debug!(
            owner = %config.game.owner,
            guess_range = config.game.guess_range,
            entrance_fee = config.game.entrance_fee,
            "Loaded guess game configuration"
        );

        Ok(config)
    }

    fn load_from_file(path: &Path) -> Result<GuessGameConfig, ConfigurationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path.display(), e))
        })?;

        GuessGameConfig::from_toml_str(&content)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(
        config: &GuessGameConfig,
        path: P,
    ) -> Result<(), ConfigurationError> {
        let toml_string = config.to_toml_string()?;

        std::fs::write(path.as_ref(), toml_string).map_err(|e| {
            ConfigurationError::SaveFailed(format!(
                "Failed to write to {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }
}

fn apply_overrides<F>(config: &mut GuessGameConfig, lookup: F) -> Result<(), ConfigurationError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup("GUESS_GAME_OWNER") {
        config.game.owner = parse_var("GUESS_GAME_OWNER", value)?;
    }
    if let Some(value) = lookup("GUESS_GAME_ADDRESS") {
        config.game.address = parse_var("GUESS_GAME_ADDRESS", value)?;
    }
    if let Some(value) = lookup("GUESS_GAME_ENTRANCE_FEE") {
        config.game.entrance_fee = parse_var("GUESS_GAME_ENTRANCE_FEE", value)?;
    }
    if let Some(value) = lookup("GUESS_GAME_GUESS_RANGE") {
        config.game.guess_range = parse_var("GUESS_GAME_GUESS_RANGE", value)?;
    }
    if let Some(value) = lookup("GUESS_GAME_COORDINATOR") {
        config.oracle.coordinator = parse_var("GUESS_GAME_COORDINATOR", value)?;
    }
    if let Some(value) = lookup("GUESS_GAME_SUBSCRIPTION_ID") {
        config.oracle.subscription_id = parse_var("GUESS_GAME_SUBSCRIPTION_ID", value)?;
    }
    if let Some(value) = lookup("GUESS_GAME_KEY_HASH") {
        config.oracle.key_hash = value;
    }
    if let Some(value) = lookup("GUESS_GAME_LOG_LEVEL") {
        config.monitoring.log_level = LogLevel::parse(&value)
            .ok_or_else(|| invalid("GUESS_GAME_LOG_LEVEL", &value, "unknown log level"))?;
    }

    Ok(())
}

fn parse_var<T: std::str::FromStr>(field: &str, value: String) -> Result<T, ConfigurationError> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(field, &value, "could not parse value"))
}
