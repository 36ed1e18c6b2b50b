//! Named network definitions.
//!
//! Each `[networks.<name>]` table describes an RPC endpoint, its chain id and
//! optionally where signing material comes from. Key material is never
//! validated here; it is handed to the external build framework as-is.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::ConfigError;

/// Default HD derivation path for mnemonic-based accounts.
pub const DEFAULT_HD_PATH: &str = "m/44'/60'/0'/0";

fn default_hd_path() -> String {
    DEFAULT_HD_PATH.into()
}

/// Source of signing accounts for a network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum AccountsConfig {
    /// HD wallet derived from a mnemonic phrase.
    Mnemonic {
        mnemonic: String,
        #[serde(default = "default_hd_path")]
        path: String,
    },
    /// A single private key read from the named environment variable.
    PrivateKeyEnv { private_key_env: String },
}

/// One named network target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint (`http(s)://` or `ws(s)://`).
    pub url: String,

    /// EIP-155 chain identifier.
    pub chain_id: u64,

    /// Signing accounts. Absent means the node's own accounts are used.
    #[serde(default)]
    pub accounts: Option<AccountsConfig>,

    /// Private keys resolved from `private_key_env` (populated by
    /// `resolve_env_vars`). Empty when the variable is unset.
    #[serde(skip)]
    pub private_keys: Vec<String>,
}

const URL_SCHEMES: &[&str] = &["http://", "https://", "ws://", "wss://"];

impl NetworkConfig {
    /// Resolve `private_key_env` into [`Self::private_keys`].
    ///
    /// An unset or empty variable yields an empty key list rather than an
    /// error, so networks that are never selected do not need keys.
    pub fn resolve_keys(&mut self, name: &str) {
        self.private_keys = match &self.accounts {
            Some(AccountsConfig::PrivateKeyEnv { private_key_env }) => {
                match std::env::var(private_key_env) {
                    Ok(val) if !val.is_empty() => {
                        debug!(network = name, env_name = private_key_env.as_str(), "resolved private key");
                        vec![val]
                    }
                    _ => {
                        warn!(
                            network = name,
                            env_name = private_key_env.as_str(),
                            "private key env var not set; network has no accounts"
                        );
                        Vec::new()
                    }
                }
            }
            _ => Vec::new(),
        };
    }

    /// Validate this network's endpoint and account settings.
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if !URL_SCHEMES.iter().any(|s| self.url.starts_with(s)) {
            return Err(ConfigError::InvalidValue {
                field: format!("networks.{name}.url"),
                detail: format!(
                    "'{}' must start with one of {}",
                    self.url,
                    URL_SCHEMES.join(", ")
                ),
            });
        }
        if self.chain_id == 0 {
            return Err(ConfigError::InvalidValue {
                field: format!("networks.{name}.chain_id"),
                detail: "chain id must be > 0".into(),
            });
        }
        if let Some(AccountsConfig::PrivateKeyEnv { private_key_env }) = &self.accounts {
            if private_key_env.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("networks.{name}.accounts.private_key_env"),
                    detail: "environment variable name must not be empty".into(),
                });
            }
        }
        Ok(())
    }

    /// Short description of where accounts come from, without key material.
    pub fn accounts_summary(&self) -> String {
        match &self.accounts {
            None => "node accounts".to_string(),
            Some(AccountsConfig::Mnemonic { path, .. }) => format!("mnemonic ({path})"),
            Some(AccountsConfig::PrivateKeyEnv { private_key_env }) => {
                if self.private_keys.is_empty() {
                    format!("${private_key_env} (not set)")
                } else {
                    format!("${private_key_env}")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> NetworkConfig {
        toml::from_str(toml_str).expect("failed to parse network")
    }

    #[test]
    fn test_parse_mnemonic_accounts_with_default_path() {
        let net = parse(
            r#"
url = "http://127.0.0.1:8545"
chain_id = 595
accounts = { mnemonic = "test test test" }
"#,
        );
        assert_eq!(
            net.accounts,
            Some(AccountsConfig::Mnemonic {
                mnemonic: "test test test".into(),
                path: DEFAULT_HD_PATH.into(),
            })
        );
        assert_eq!(net.accounts_summary(), "mnemonic (m/44'/60'/0'/0)");
    }

    #[test]
    fn test_parse_private_key_env_accounts() {
        let net = parse(
            r#"
url = "https://eth-rpc-acala.aca-api.network"
chain_id = 787
accounts = { private_key_env = "KEY" }
"#,
        );
        assert_eq!(
            net.accounts,
            Some(AccountsConfig::PrivateKeyEnv {
                private_key_env: "KEY".into()
            })
        );
    }

    #[test]
    fn test_resolve_keys_from_env() {
        std::env::set_var("SOLPREP_TEST_NET_KEY", "0xabc");
        let mut net = parse(
            r#"
url = "https://rpc.example.com"
chain_id = 686
accounts = { private_key_env = "SOLPREP_TEST_NET_KEY" }
"#,
        );
        net.resolve_keys("karura");
        assert_eq!(net.private_keys, vec!["0xabc".to_string()]);
        assert_eq!(net.accounts_summary(), "$SOLPREP_TEST_NET_KEY");
        std::env::remove_var("SOLPREP_TEST_NET_KEY");
    }

    #[test]
    fn test_resolve_keys_unset_yields_empty() {
        let mut net = parse(
            r#"
url = "https://rpc.example.com"
chain_id = 686
accounts = { private_key_env = "SOLPREP_TEST_DEFINITELY_UNSET" }
"#,
        );
        net.resolve_keys("karura");
        assert!(net.private_keys.is_empty());
        assert_eq!(
            net.accounts_summary(),
            "$SOLPREP_TEST_DEFINITELY_UNSET (not set)"
        );
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let net = parse(
            r#"
url = "127.0.0.1:8545"
chain_id = 595
"#,
        );
        assert!(matches!(
            net.validate("mandala"),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "networks.mandala.url"
        ));
    }

    #[test]
    fn test_validate_rejects_zero_chain_id() {
        let net = parse(
            r#"
url = "ws://127.0.0.1:8546"
chain_id = 0
"#,
        );
        assert!(matches!(
            net.validate("local"),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "networks.local.chain_id"
        ));
    }

    #[test]
    fn test_no_accounts_summary() {
        let net = parse(
            r#"
url = "http://localhost:8545"
chain_id = 31337
"#,
        );
        assert!(net.validate("local").is_ok());
        assert_eq!(net.accounts_summary(), "node accounts");
    }
}
