//! Run configuration, loaded from a YAML file.
//!
//! Every field has a default so a missing or partial file degrades to a
//! usable configuration; only the database credentials genuinely need to be
//! supplied in practice.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const KILO: u64 = 10u64.pow(3);
pub const MEGA: u64 = 10u64.pow(6);
pub const GIGA: u64 = 10u64.pow(9);

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    pub database: DatabaseConfig,
    pub weathermap: WeathermapConfig,
    pub autoplace: AutoplaceConfig,
    pub links: LinkConfig,
    pub domain: DomainConfig,
}

impl MapConfig {
    /// Loads config from `path`. A missing file yields the defaults; an
    /// unreadable or malformed file is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(Error::ConfigRead {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub schema: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            hostname: "localhost".to_string(),
            port: 3306,
            username: "observium".to_string(),
            password: String::new(),
            schema: "observium".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WeathermapConfig {
    /// Template document supplying globals and operator-curated attributes.
    pub header: PathBuf,
    /// Where the merged document is written.
    pub output: PathBuf,
    /// Base directory of the RRD files referenced by link TARGET attributes.
    pub rrd_base: String,
}

impl Default for WeathermapConfig {
    fn default() -> Self {
        Self {
            header: PathBuf::from("weathermap-header.conf"),
            output: PathBuf::from("weathermap.conf"),
            rrd_base: "/opt/observium/rrd".to_string(),
        }
    }
}

/// One row of the icon classification table: first rule whose `contains`
/// substring matches the short hostname wins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IconRule {
    pub contains: String,
    pub icon: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AutoplaceConfig {
    pub enabled: bool,
    /// Short-name prefixes eligible for auto-placement. Empty means all.
    pub include_prefixes: Vec<String>,
    /// Short-name prefixes excluded even when included above.
    pub exclude_prefixes: Vec<String>,
    pub start_x: i64,
    pub start_y: i64,
    /// Grid cell size, in map pixels, for both axes.
    pub spacing: i64,
    /// Column position beyond which placement wraps to the next row.
    pub wrap_limit: i64,
    /// POSITION value template; `{x}` and `{y}` are substituted.
    pub position_format: String,
    /// LABEL template; `{host}` is substituted with the short hostname.
    pub label_format: String,
    /// ICON value template; `{icon}` is substituted with the table result.
    pub icon_format: String,
    /// Icon used when no rule matches.
    pub default_icon: String,
    pub icon_rules: Vec<IconRule>,
}

impl AutoplaceConfig {
    fn default_icon_rules() -> Vec<IconRule> {
        [
            ("swt-z9000", "network-switch-qsfp-128"),
            ("swt-s4810", "network-switch-sfp-96"),
            ("s60", "network-switch-utp-96"),
            ("stack", "network-switch-stack-64"),
            ("rtr", "network-router-blue-64"),
        ]
        .into_iter()
        .map(|(contains, icon)| IconRule {
            contains: contains.to_string(),
            icon: icon.to_string(),
        })
        .collect()
    }
}

impl Default for AutoplaceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            include_prefixes: vec!["swt".to_string(), "rtr".to_string()],
            exclude_prefixes: Vec::new(),
            start_x: 50,
            start_y: 50,
            spacing: 150,
            wrap_limit: 1800,
            position_format: "{x} {y}".to_string(),
            label_format: "{host} (auto placed)".to_string(),
            icon_format: "images/{icon}.png".to_string(),
            default_icon: "network-hub-generic".to_string(),
            icon_rules: Self::default_icon_rules(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LinkConfig {
    /// Observations slower than this (bits/sec) are dropped.
    pub min_speed: u64,
    /// Speed of a width-1 link; WIDTH scales linearly above it.
    pub base_speed: u64,
    /// Remote-host domain suffixes whose links are dropped.
    pub excluded_domains: Vec<String>,
    /// Local port name prefixes treated as management interfaces.
    pub management_patterns: Vec<String>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            min_speed: MEGA,
            base_speed: 10 * GIGA,
            excluded_domains: Vec::new(),
            management_patterns: vec!["ManagementEthernet".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DomainConfig {
    /// Appended to hostnames that carry no domain of their own. Empty leaves
    /// short names as-is.
    pub default_suffix: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_partial_config() {
        let config: MapConfig = serde_yaml::from_str(
            "database:\n  hostname: db.example.net\n  password: s3cret\nlinks:\n  min_speed: 1000000000\n",
        )
        .unwrap();
        assert_eq!(config.database.hostname, "db.example.net");
        assert_eq!(config.database.schema, "observium");
        assert_eq!(config.links.min_speed, GIGA);
        assert_eq!(config.links.base_speed, 10 * GIGA);
        assert!(config.autoplace.enabled);
        assert_eq!(config.autoplace.icon_rules.len(), 5);
    }

    #[test]
    fn icon_rules_can_be_replaced_wholesale() {
        let config: MapConfig = serde_yaml::from_str(
            "autoplace:\n  icon_rules:\n    - contains: core\n      icon: network-router-red-64\n",
        )
        .unwrap();
        assert_eq!(config.autoplace.icon_rules.len(), 1);
        assert_eq!(config.autoplace.icon_rules[0].contains, "core");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = MapConfig::load(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, MapConfig::default());
    }
}
