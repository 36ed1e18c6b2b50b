//! TOML-based build configuration for solprep.
//!
//! A [`BuildConfig`] is loaded once at startup and passed explicitly to the
//! components that need it. Relative paths are resolved against the directory
//! holding the config file. Private keys are referenced by environment
//! variable name and resolved at runtime via
//! [`BuildConfig::resolve_env_vars`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;
use crate::network::NetworkConfig;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level build configuration loaded from `solprep.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Compiler version and optimizer settings.
    #[serde(default)]
    pub solidity: SolidityConfig,

    /// Named network targets.
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkConfig>,

    /// Source, cache and output directories.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Import remapping preprocessor settings.
    #[serde(default)]
    pub preprocess: PreprocessConfig,

    /// Test-runner settings.
    #[serde(default)]
    pub test: TestConfig,

    /// Documentation generator settings.
    #[serde(default)]
    pub docs: DocsConfig,

    /// Directory relative paths are resolved against (not serialized).
    #[serde(skip)]
    pub root: PathBuf,
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            solidity: SolidityConfig::default(),
            networks: BTreeMap::new(),
            paths: PathsConfig::default(),
            preprocess: PreprocessConfig::default(),
            test: TestConfig::default(),
            docs: DocsConfig::default(),
            root: PathBuf::from("."),
        }
    }
}

// ---------------------------------------------------------------------------
// Solidity compiler
// ---------------------------------------------------------------------------

/// Compiler version pin and optimizer settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SolidityConfig {
    /// Exact compiler version, `MAJOR.MINOR.PATCH`.
    #[serde(default = "default_solc_version")]
    pub version: String,

    #[serde(default)]
    pub optimizer: OptimizerConfig,
}

fn default_solc_version() -> String {
    "0.8.17".into()
}

impl Default for SolidityConfig {
    fn default() -> Self {
        Self {
            version: default_solc_version(),
            optimizer: OptimizerConfig::default(),
        }
    }
}

impl SolidityConfig {
    /// The `settings` fragment of a solc standard-JSON input.
    pub fn solc_settings(&self) -> serde_json::Value {
        serde_json::json!({
            "optimizer": {
                "enabled": self.optimizer.enabled,
                "runs": self.optimizer.runs,
            }
        })
    }
}

/// Optimizer settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OptimizerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Expected number of contract executions the optimizer tunes for.
    #[serde(default = "default_optimizer_runs")]
    pub runs: u32,
}

fn default_true() -> bool {
    true
}
fn default_optimizer_runs() -> u32 {
    200
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            runs: default_optimizer_runs(),
        }
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Directory layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathsConfig {
    /// Contract sources (default `./src`).
    #[serde(default = "default_sources")]
    pub sources: PathBuf,

    /// Build cache (default `./cache_hardhat`).
    #[serde(default = "default_cache")]
    pub cache: PathBuf,

    /// Where preprocessed sources are written. Defaults to
    /// `<cache>/preprocessed`.
    #[serde(default)]
    pub preprocessed: Option<PathBuf>,
}

fn default_sources() -> PathBuf {
    PathBuf::from("./src")
}
fn default_cache() -> PathBuf {
    PathBuf::from("./cache_hardhat")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            cache: default_cache(),
            preprocessed: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Preprocess
// ---------------------------------------------------------------------------

/// When the remappings file is read during a preprocessing pass.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReloadMode {
    /// Re-read for every import line; edits apply mid-pass.
    #[default]
    PerLine,
    /// Read once when the pass starts.
    PerPass,
}

/// Import remapping preprocessor settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreprocessConfig {
    /// Remappings file (default `remappings.txt`).
    #[serde(default = "default_remappings_file")]
    pub remappings_file: PathBuf,

    #[serde(default)]
    pub reload: ReloadMode,

    /// Glob patterns selecting source artifacts, relative to `paths.sources`.
    #[serde(default = "default_include")]
    pub include: Vec<String>,

    /// Glob patterns excluded even when included.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_remappings_file() -> PathBuf {
    PathBuf::from("remappings.txt")
}
fn default_include() -> Vec<String> {
    vec!["**/*.sol".into()]
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            remappings_file: default_remappings_file(),
            reload: ReloadMode::default(),
            include: default_include(),
            exclude: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Test runner & docs
// ---------------------------------------------------------------------------

/// Test-runner settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestConfig {
    /// Per-test timeout in milliseconds (default 10 minutes).
    #[serde(default = "default_test_timeout")]
    pub timeout_ms: u64,
}

fn default_test_timeout() -> u64 {
    600_000
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_test_timeout(),
        }
    }
}

/// Documentation output settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocsConfig {
    #[serde(default = "default_docs_dir")]
    pub output_dir: PathBuf,
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from("./docs")
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_docs_dir(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

fn version_pattern() -> &'static Regex {
    static VERSION_RE: OnceLock<Regex> = OnceLock::new();
    VERSION_RE.get_or_init(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("version pattern is valid"))
}

impl BuildConfig {
    /// Parse a config from TOML text. `root` is used to resolve relative
    /// paths.
    pub fn from_toml_str(contents: &str, root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let mut config: BuildConfig =
            toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.root = root.into();
        Ok(config)
    }

    /// Load a [`BuildConfig`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let root = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let config = Self::from_toml_str(&contents, root)?;

        debug!(networks = config.networks.len(), "configuration parsed successfully");
        Ok(config)
    }

    /// Load `.env` next to the config file (if present) and resolve every
    /// network's `private_key_env`.
    ///
    /// Missing variables are logged, not treated as errors.
    pub fn resolve_env_vars(&mut self) -> Result<(), ConfigError> {
        info!("resolving environment variable references in config");

        let dotenv = self.root.join(".env");
        if dotenv.exists() {
            match dotenvy::from_path(&dotenv) {
                Ok(()) => debug!(path = %dotenv.display(), "loaded .env file"),
                Err(e) => warn!(path = %dotenv.display(), error = %e, "failed to load .env file"),
            }
        }

        for (name, network) in self.networks.iter_mut() {
            network.resolve_keys(name);
        }

        debug!("environment variable resolution complete");
        Ok(())
    }

    /// Validate that all fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !version_pattern().is_match(&self.solidity.version) {
            return Err(ConfigError::InvalidValue {
                field: "solidity.version".into(),
                detail: format!(
                    "'{}' must be an exact MAJOR.MINOR.PATCH version",
                    self.solidity.version
                ),
            });
        }
        if self.preprocess.remappings_file.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "preprocess.remappings_file".into(),
                detail: "remappings file must not be empty".into(),
            });
        }
        if self.preprocess.include.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "preprocess.include".into(),
                detail: "at least one include pattern is required".into(),
            });
        }
        if self.test.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "test.timeout_ms".into(),
                detail: "timeout must be > 0".into(),
            });
        }
        for (name, network) in &self.networks {
            network.validate(name)?;
        }

        Ok(())
    }

    /// Convenience: load, resolve, and validate in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.resolve_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Look up a network by name.
    pub fn network(&self, name: &str) -> Result<&NetworkConfig, ConfigError> {
        self.networks
            .get(name)
            .ok_or_else(|| ConfigError::UnknownNetwork {
                name: name.to_string(),
                available: self.network_names().join(", "),
            })
    }

    /// Network names in sorted order.
    pub fn network_names(&self) -> Vec<&str> {
        self.networks.keys().map(String::as_str).collect()
    }

    /// Resolve a configured path against [`Self::root`].
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn sources_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.sources)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.cache)
    }

    /// Output directory for preprocessed sources.
    pub fn preprocessed_dir(&self) -> PathBuf {
        match &self.paths.preprocessed {
            Some(p) => self.resolve_path(p),
            None => self.cache_dir().join("preprocessed"),
        }
    }

    pub fn remappings_path(&self) -> PathBuf {
        self.resolve_path(&self.preprocess.remappings_file)
    }

    pub fn docs_dir(&self) -> PathBuf {
        self.resolve_path(&self.docs.output_dir)
    }

    /// Generate a default TOML config template string.
    pub fn default_template() -> &'static str {
        r#"# solprep build configuration

log_level = "warn"

[solidity]
version = "0.8.17"

[solidity.optimizer]
enabled = true
runs = 200

[paths]
sources = "./src"
cache = "./cache_hardhat"
# preprocessed = "./cache_hardhat/preprocessed"

[preprocess]
remappings_file = "remappings.txt"
reload = "per_line"     # or "per_pass"
include = ["**/*.sol"]
# exclude = ["test/**"]

[test]
timeout_ms = 600000     # 10 min

[docs]
output_dir = "./docs"

[networks.local]
url = "http://127.0.0.1:8545"
chain_id = 31337
accounts = { mnemonic = "test test test test test test test test test test test junk", path = "m/44'/60'/0'/0" }

# [networks.mainnet]
# url = "https://rpc.example.com"
# chain_id = 1
# accounts = { private_key_env = "KEY" }
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::AccountsConfig;
    use std::io::Write;

    fn sample_toml() -> &'static str {
        r#"
log_level = "debug"

[solidity]
version = "0.8.17"

[solidity.optimizer]
enabled = true
runs = 200

[networks.mandala]
url = "http://127.0.0.1:8545"
chain_id = 595
accounts = { mnemonic = "fox sight canyon orphan hotel grow hedgehog build bless august weather swarm", path = "m/44'/60'/0'/0" }

[networks.karuraTestnet]
url = "https://eth-rpc-karura-testnet.aca-staging.network"
chain_id = 596
accounts = { mnemonic = "fox sight canyon orphan hotel grow hedgehog build bless august weather swarm" }

[networks.karura]
url = "https://eth-rpc-karura.aca-api.network"
chain_id = 686
accounts = { private_key_env = "KEY" }

[networks.acala]
url = "https://eth-rpc-acala.aca-api.network"
chain_id = 787
accounts = { private_key_env = "KEY" }

[paths]
sources = "./src"
cache = "./cache_hardhat"

[preprocess]
remappings_file = "remappings.txt"
reload = "per_pass"
exclude = ["test/**"]

[test]
timeout_ms = 600000

[docs]
output_dir = "./docs"
"#
    }

    #[test]
    fn test_parse_full_config() {
        let config = BuildConfig::from_toml_str(sample_toml(), "/project").unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.solidity.version, "0.8.17");
        assert!(config.solidity.optimizer.enabled);
        assert_eq!(config.solidity.optimizer.runs, 200);
        assert_eq!(config.networks.len(), 4);
        assert_eq!(config.networks["acala"].chain_id, 787);
        assert_eq!(config.preprocess.reload, ReloadMode::PerPass);
        assert_eq!(config.preprocess.include, vec!["**/*.sol"]);
        assert_eq!(config.preprocess.exclude, vec!["test/**"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config = BuildConfig::from_toml_str("", ".").unwrap();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.solidity.version, "0.8.17");
        assert_eq!(config.solidity.optimizer.runs, 200);
        assert_eq!(config.paths.sources, PathBuf::from("./src"));
        assert_eq!(config.preprocess.reload, ReloadMode::PerLine);
        assert_eq!(config.test.timeout_ms, 600_000);
        assert_eq!(config.docs.output_dir, PathBuf::from("./docs"));
        assert!(config.networks.is_empty());
    }

    #[test]
    fn test_default_template_parses_and_validates() {
        let config = BuildConfig::from_toml_str(BuildConfig::default_template(), ".").unwrap();
        assert!(config.validate().is_ok());
        assert!(matches!(
            config.networks["local"].accounts,
            Some(AccountsConfig::Mnemonic { .. })
        ));
    }

    #[test]
    fn test_load_from_file_sets_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solprep.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(sample_toml().as_bytes()).unwrap();

        let config = BuildConfig::load_from_file(&path).expect("load_from_file failed");
        assert_eq!(config.root, dir.path());
        assert_eq!(config.remappings_path(), dir.path().join("remappings.txt"));
        assert_eq!(
            config.preprocessed_dir(),
            dir.path().join("./cache_hardhat").join("preprocessed")
        );
    }

    #[test]
    fn test_file_not_found() {
        let result = BuildConfig::load_from_file("/nonexistent/solprep.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_parse_error() {
        let result = BuildConfig::from_toml_str("[solidity\nversion = ", ".");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validate_rejects_bad_version() {
        let mut config = BuildConfig::from_toml_str(sample_toml(), ".").unwrap();
        config.solidity.version = "^0.8.0".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "solidity.version"
        ));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = BuildConfig::from_toml_str(sample_toml(), ".").unwrap();
        config.test.timeout_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "test.timeout_ms"
        ));
    }

    #[test]
    fn test_validate_rejects_empty_include() {
        let mut config = BuildConfig::from_toml_str(sample_toml(), ".").unwrap();
        config.preprocess.include.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "preprocess.include"
        ));
    }

    #[test]
    fn test_network_lookup() {
        let config = BuildConfig::from_toml_str(sample_toml(), ".").unwrap();
        assert_eq!(config.network("mandala").unwrap().chain_id, 595);
        assert_eq!(
            config.network_names(),
            vec!["acala", "karura", "karuraTestnet", "mandala"]
        );

        let err = config.network("mainnet").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownNetwork { ref name, .. } if name == "mainnet"));
        assert!(err.to_string().contains("acala, karura, karuraTestnet, mandala"));
    }

    #[test]
    fn test_resolve_env_vars_reads_dotenv() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".env"),
            "SOLPREP_TEST_DOTENV_KEY=0xfeed\n",
        )
        .unwrap();

        let toml_str = r#"
[networks.acala]
url = "https://eth-rpc-acala.aca-api.network"
chain_id = 787
accounts = { private_key_env = "SOLPREP_TEST_DOTENV_KEY" }
"#;
        let mut config = BuildConfig::from_toml_str(toml_str, dir.path()).unwrap();
        config.resolve_env_vars().unwrap();
        assert_eq!(config.networks["acala"].private_keys, vec!["0xfeed"]);

        std::env::remove_var("SOLPREP_TEST_DOTENV_KEY");
    }

    #[test]
    fn test_solc_settings_json() {
        let solidity = SolidityConfig {
            version: "0.8.17".into(),
            optimizer: OptimizerConfig {
                enabled: false,
                runs: 1000,
            },
        };
        assert_eq!(
            solidity.solc_settings(),
            serde_json::json!({"optimizer": {"enabled": false, "runs": 1000}})
        );
    }

    #[test]
    fn test_absolute_paths_are_not_rebased() {
        let mut config = BuildConfig::from_toml_str("", "/project").unwrap();
        config.paths.sources = PathBuf::from("/abs/src");
        assert_eq!(config.sources_dir(), PathBuf::from("/abs/src"));
        assert_eq!(config.docs_dir(), PathBuf::from("/project/./docs"));
    }
}
