//! Runtime configuration for the supply flow.

use lendbook_domain::Token;
use lendbook_domain::registry;
use std::time::Duration;
use tracing::warn;

/// Environment variable overriding the confirmation timeout.
pub const ENV_CONFIRMATION_TIMEOUT_SECS: &str = "LENDBOOK_CONFIRMATION_TIMEOUT_SECS";

/// Environment variable overriding the loan token contract address.
pub const ENV_LOAN_TOKEN_ADDRESS: &str = "LENDBOOK_LOAN_TOKEN_ADDRESS";

/// Configuration for wallet balance reads and supply execution.
#[derive(Debug, Clone)]
pub struct SupplyConfig {
    /// Token supplied into pools and shown as the wallet balance.
    pub loan_token: Token,
    /// Maximum time to wait for each transaction confirmation.
    pub confirmation_timeout_secs: u64,
}

impl Default for SupplyConfig {
    fn default() -> Self {
        Self {
            loan_token: registry::loan_token(),
            confirmation_timeout_secs: 120,
        }
    }
}

impl SupplyConfig {
    /// Builds the default configuration with environment overrides applied.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = lookup(ENV_CONFIRMATION_TIMEOUT_SECS) {
            match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => self.confirmation_timeout_secs = secs,
                _ => warn!(
                    key = ENV_CONFIRMATION_TIMEOUT_SECS,
                    value = %value,
                    "Ignoring invalid confirmation timeout"
                ),
            }
        }

        if let Some(address) = lookup(ENV_LOAN_TOKEN_ADDRESS) {
            let address = address.trim();
            if address.is_empty() {
                warn!(key = ENV_LOAN_TOKEN_ADDRESS, "Ignoring empty loan token address");
            } else {
                self.loan_token.address = address.to_string();
            }
        }

        self
    }

    /// Confirmation timeout as a [`Duration`].
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = SupplyConfig::default();
        assert_eq!(config.loan_token.symbol, "USDC");
        assert_eq!(config.loan_token.decimals, 6);
        assert_eq!(config.confirmation_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_CONFIRMATION_TIMEOUT_SECS, "30"),
            (ENV_LOAN_TOKEN_ADDRESS, "0xabc"),
        ]
        .into_iter()
        .collect();

        let config =
            SupplyConfig::default().with_overrides(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.confirmation_timeout_secs, 30);
        assert_eq!(config.loan_token.address, "0xabc");
    }

    #[test]
    fn test_invalid_overrides_are_ignored() {
        let config = SupplyConfig::default().with_overrides(|k| match k {
            ENV_CONFIRMATION_TIMEOUT_SECS => Some("soon".to_string()),
            ENV_LOAN_TOKEN_ADDRESS => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(config.confirmation_timeout_secs, 120);
        assert_eq!(config.loan_token.address, registry::LOAN_TOKEN_ADDRESS);
    }
}
