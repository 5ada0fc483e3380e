//! Configuration for the remittance ledger

use crate::fees::MAX_FEE_BPS;
use serde::{Deserialize, Serialize};

/// Remittance ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Initial governance parameters
    pub governance: GovernanceConfig,

    /// Actor configuration
    pub actor: ActorConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "remittance-core".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            governance: GovernanceConfig::default(),
            actor: ActorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Governance parameters applied at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    /// Timeout window in blocks
    pub default_timeout_blocks: u64,

    /// Fee in basis points (out of 10000)
    pub fee_percentage: u32,

    /// Authority principal to install at startup, if any
    pub authority_contract: Option<String>,

    /// Members of the verified authority set
    pub authorities: Vec<String>,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            default_timeout_blocks: 144, // ~1 day at 10 min blocks
            fee_percentage: 50,          // 0.5%
            authority_contract: None,
            authorities: Vec::new(),
        }
    }
}

/// Actor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Bounded mailbox size (backpressure)
    pub mailbox_capacity: usize,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1000,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(timeout) = std::env::var("REMITTANCE_DEFAULT_TIMEOUT_BLOCKS") {
            config.governance.default_timeout_blocks = timeout.parse().map_err(|_| {
                crate::Error::Config(format!("Invalid REMITTANCE_DEFAULT_TIMEOUT_BLOCKS: {}", timeout))
            })?;
        }

        if let Ok(fee) = std::env::var("REMITTANCE_FEE_BPS") {
            config.governance.fee_percentage = fee
                .parse()
                .map_err(|_| crate::Error::Config(format!("Invalid REMITTANCE_FEE_BPS: {}", fee)))?;
        }

        if let Ok(authority) = std::env::var("REMITTANCE_AUTHORITY") {
            config.governance.authority_contract = Some(authority);
        }

        if let Ok(filter) = std::env::var("REMITTANCE_LOG") {
            config.logging.filter = filter;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check parameter bounds
    pub fn validate(&self) -> crate::Result<()> {
        if self.governance.default_timeout_blocks == 0 {
            return Err(crate::Error::Config(
                "default_timeout_blocks must be positive".to_string(),
            ));
        }

        if self.governance.fee_percentage > MAX_FEE_BPS {
            return Err(crate::Error::Config(format!(
                "fee_percentage {} exceeds maximum {}",
                self.governance.fee_percentage, MAX_FEE_BPS
            )));
        }

        if self.actor.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "mailbox_capacity must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service_name, "remittance-core");
        assert_eq!(config.governance.default_timeout_blocks, 144);
        assert_eq!(config.governance.fee_percentage, 50);
        assert!(config.governance.authority_contract.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_partial() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
service_name = "remittance-test"

[governance]
fee_percentage = 100
authority_contract = "ST2TEST"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.service_name, "remittance-test");
        assert_eq!(config.governance.fee_percentage, 100);
        assert_eq!(config.governance.default_timeout_blocks, 144);
        assert_eq!(config.governance.authority_contract.as_deref(), Some("ST2TEST"));
    }

    // The only test touching REMITTANCE_* variables; tests share the process env.
    #[test]
    fn test_from_env_overrides() {
        const VARS: [&str; 4] = [
            "REMITTANCE_DEFAULT_TIMEOUT_BLOCKS",
            "REMITTANCE_FEE_BPS",
            "REMITTANCE_AUTHORITY",
            "REMITTANCE_LOG",
        ];
        let clear = || VARS.iter().for_each(|var| std::env::remove_var(var));

        clear();
        std::env::set_var("REMITTANCE_DEFAULT_TIMEOUT_BLOCKS", "72");
        std::env::set_var("REMITTANCE_FEE_BPS", "100");
        std::env::set_var("REMITTANCE_AUTHORITY", "ST2TEST");
        std::env::set_var("REMITTANCE_LOG", "remittance_core=debug");

        let config = Config::from_env().unwrap();
        assert_eq!(config.governance.default_timeout_blocks, 72);
        assert_eq!(config.governance.fee_percentage, 100);
        assert_eq!(config.governance.authority_contract.as_deref(), Some("ST2TEST"));
        assert_eq!(config.logging.filter, "remittance_core=debug");

        std::env::set_var("REMITTANCE_FEE_BPS", "2000");
        assert_eq!(
            Config::from_env().unwrap_err(),
            crate::Error::Config("fee_percentage 2000 exceeds maximum 1000".to_string())
        );

        std::env::set_var("REMITTANCE_FEE_BPS", "fifty");
        assert!(matches!(Config::from_env(), Err(crate::Error::Config(_))));

        clear();
        assert_eq!(Config::from_env().unwrap().governance.fee_percentage, 50);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut config = Config::default();
        config.governance.fee_percentage = 1001;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.governance.default_timeout_blocks = 0;
        assert!(config.validate().is_err());
    }
}
