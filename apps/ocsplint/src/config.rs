//! Configuration discovery and effective settings resolution.
//!
//! ocsplint reads `ocsplint.toml|yaml|yml` from the working directory (or
//! closest ancestor) and merges it with CLI flags to produce an `Effective`
//! config. Defaults:
//! - `output`: `human`
//! - `verbose`: false
//! - `cert_class`: `subscriber`
//! - `method`: `post`
//! - `hash`: `sha256`
//! - `ocsp_url`, `dir`: unset
//! - `no_staple`: false
//! - `timeout_secs`: 20
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::error::ConfigError;
use crate::models::{CertClass, HashAlgorithm};
use crate::transport::RequestMethod;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const CONFIG_NAMES: [&str; 3] = ["ocsplint.toml", "ocsplint.yaml", "ocsplint.yml"];
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Default, Deserialize, Clone, PartialEq, Eq)]
/// Root configuration loaded from `ocsplint.toml|yaml`.
pub struct OcsplintConfig {
    pub output: Option<String>,
    pub verbose: Option<bool>,
    pub cert_class: Option<String>,
    pub method: Option<String>,
    pub hash: Option<String>,
    pub ocsp_url: Option<String>,
    /// Relative paths resolve against the config file's directory
    pub dir: Option<String>,
    pub no_staple: Option<bool>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "human" => Ok(OutputFormat::Human),
            "json" => Ok(OutputFormat::Json),
            other => Err(other.to_string()),
        }
    }
}

/// Values given on the command line; `None` means "not given".
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub output: Option<OutputFormat>,
    pub verbose: Option<bool>,
    pub cert_class: Option<CertClass>,
    pub method: Option<RequestMethod>,
    pub hash: Option<HashAlgorithm>,
    pub ocsp_url: Option<String>,
    pub dir: Option<PathBuf>,
    pub no_staple: Option<bool>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub root: PathBuf,
    pub config_file: Option<PathBuf>,
    pub output: OutputFormat,
    pub verbose: bool,
    pub cert_class: CertClass,
    pub method: RequestMethod,
    pub hash: HashAlgorithm,
    pub ocsp_url: Option<String>,
    pub dir: Option<PathBuf>,
    pub no_staple: bool,
    pub timeout: Duration,
}

/// Walk upward from `start` to find the directory holding the config.
///
/// Stops when an `ocsplint.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_config_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_NAMES.iter().any(|n| cur.join(n).exists()) || cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load the config file in `root`, if any. TOML wins over YAML.
pub fn load_config(root: &Path) -> Result<Option<(PathBuf, OcsplintConfig)>, ConfigError> {
    for name in CONFIG_NAMES {
        let path = root.join(name);
        if !path.exists() {
            continue;
        }
        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let cfg = if name.ends_with(".toml") {
            toml::from_str(&text).map_err(|source| ConfigError::Toml {
                path: path.clone(),
                source,
            })?
        } else {
            serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
                path: path.clone(),
                source,
            })?
        };
        return Ok(Some((path, cfg)));
    }
    Ok(None)
}

fn parse_value<T: FromStr>(key: &'static str, value: Option<&str>) -> Result<Option<T>, ConfigError> {
    value
        .map(|v| {
            v.parse::<T>().map_err(|_| ConfigError::InvalidValue {
                key,
                value: v.to_string(),
            })
        })
        .transpose()
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(start: Option<&Path>, cli: &Overrides) -> Result<Effective, ConfigError> {
    let start = start.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    let root = detect_config_root(&start);
    let (config_file, cfg) = match load_config(&root)? {
        Some((path, cfg)) => (Some(path), cfg),
        None => (None, OcsplintConfig::default()),
    };

    let output = match cli.output {
        Some(o) => o,
        None => parse_value("output", cfg.output.as_deref())?.unwrap_or_default(),
    };
    let cert_class = match cli.cert_class {
        Some(c) => c,
        None => parse_value("cert_class", cfg.cert_class.as_deref())?.unwrap_or_default(),
    };
    let method = match cli.method {
        Some(m) => m,
        None => parse_value("method", cfg.method.as_deref())?.unwrap_or_default(),
    };
    let hash = match cli.hash {
        Some(h) => h,
        None => parse_value("hash", cfg.hash.as_deref())?.unwrap_or(HashAlgorithm::Sha256),
    };

    let timeout_secs = cli
        .timeout_secs
        .or(cfg.timeout_secs)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(ConfigError::InvalidValue {
            key: "timeout_secs",
            value: "0".into(),
        });
    }

    let dir = cli
        .dir
        .clone()
        .or_else(|| cfg.dir.as_ref().map(|d| root.join(d)));

    Ok(Effective {
        config_file,
        output,
        verbose: cli.verbose.or(cfg.verbose).unwrap_or(false),
        cert_class,
        method,
        hash,
        ocsp_url: cli.ocsp_url.clone().or(cfg.ocsp_url),
        dir,
        no_staple: cli.no_staple.or(cfg.no_staple).unwrap_or(false),
        timeout: Duration::from_secs(timeout_secs),
        root,
    })
}
