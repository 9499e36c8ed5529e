//! Metadata files of a dev release checkout: `config/dev.yml`,
//! `config/final.yml`, and `dev_releases/<name>/index.yml`.

use crate::SchemaError;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct DevReleaseConfig {
    #[serde(default)]
    pub dev_name: Option<String>,
    #[serde(default)]
    pub final_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl DevReleaseConfig {
    pub fn parse(input: &str) -> Result<Self, SchemaError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        let parsed: Option<Self> = serde_yaml::from_str(input)?;
        Ok(parsed.unwrap_or_default())
    }

    /// First non-empty of `dev_name`, `final_name`, `name`.
    pub fn release_name(&self) -> Option<&str> {
        [&self.dev_name, &self.final_name, &self.name]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|n| !n.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct DevReleaseIndex {
    #[serde(default)]
    pub builds: BTreeMap<String, DevBuild>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DevBuild {
    #[serde(deserialize_with = "scalar_string")]
    pub version: String,
}

impl DevReleaseIndex {
    pub fn parse(input: &str) -> Result<Self, SchemaError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        let parsed: Option<Self> = serde_yaml::from_str(input)?;
        Ok(parsed.unwrap_or_default())
    }

    pub fn latest_version(&self) -> Option<&str> {
        self.builds
            .values()
            .map(|b| b.version.as_str())
            .max_by(|a, b| compare_release_versions(a, b))
    }
}

fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a version scalar, got {other:?}"
        ))),
    }
}

/// Order release versions such as `2`, `2+dev.3`, `2+dev.10`.
///
/// Versions are split on `.`, `+` and `-`; segments that are both numeric
/// compare numerically, others lexically. A version that is a prefix of
/// another sorts first.
pub fn compare_release_versions(a: &str, b: &str) -> Ordering {
    let split = |s: &str| -> Vec<String> {
        s.split(['.', '+', '-'])
            .map(str::to_owned)
            .collect::<Vec<_>>()
    };
    let (left, right) = (split(a), split(b));

    for (l, r) in left.iter().zip(right.iter()) {
        let ord = match (l.parse::<u64>(), r.parse::<u64>()) {
            (Ok(x), Ok(y)) => x.cmp(&y),
            _ => l.cmp(r),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    left.len().cmp(&right.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_name_wins_over_final_name() {
        let cfg = DevReleaseConfig::parse("dev_name: ntp-dev\nfinal_name: ntp\n").unwrap();
        assert_eq!(cfg.release_name(), Some("ntp-dev"));
    }

    #[test]
    fn falls_back_to_final_name_then_name() {
        let cfg = DevReleaseConfig::parse("final_name: ntp\n").unwrap();
        assert_eq!(cfg.release_name(), Some("ntp"));
        let cfg = DevReleaseConfig::parse("name: ntp\n").unwrap();
        assert_eq!(cfg.release_name(), Some("ntp"));
        let cfg = DevReleaseConfig::parse("").unwrap();
        assert_eq!(cfg.release_name(), None);
    }

    #[test]
    fn index_picks_highest_dev_version() {
        let index = DevReleaseIndex::parse(
            r"
builds:
  1a2b:
    version: 2+dev.3
  3c4d:
    version: 2+dev.10
  5e6f:
    version: 2+dev.9
",
        )
        .unwrap();
        assert_eq!(index.latest_version(), Some("2+dev.10"));
    }

    #[test]
    fn numeric_versions_are_read_as_text() {
        let index = DevReleaseIndex::parse("builds:\n  aa:\n    version: 3\n").unwrap();
        assert_eq!(index.latest_version(), Some("3"));
    }

    #[test]
    fn empty_index_has_no_latest() {
        assert_eq!(DevReleaseIndex::parse("builds: {}\n").unwrap().latest_version(), None);
    }

    #[test]
    fn version_ordering() {
        assert_eq!(compare_release_versions("2+dev.3", "2+dev.10"), Ordering::Less);
        assert_eq!(compare_release_versions("10", "9"), Ordering::Greater);
        assert_eq!(compare_release_versions("2", "2+dev.1"), Ordering::Less);
        assert_eq!(compare_release_versions("1.0", "1.0"), Ordering::Equal);
    }
}
