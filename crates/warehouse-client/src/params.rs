//! Call parameters and their canonical form.
//!
//! Callers pass loosely-typed parameter records (`package` or `pkg`,
//! `environment` or `env`, `v` or `version`). Each resource normalizes them
//! into a canonical query record, which is also what the caches key on.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{WarehouseError, WarehouseResult};

/// Default locale for build and asset lookups.
pub const DEFAULT_LOCALE: &str = "en-US";

/// Deployment environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Dev,
    Test,
    Prod,
}

impl Environment {
    /// Normalize an environment name; unknown or missing names map to `dev`.
    pub fn normalize(name: Option<&str>) -> Self {
        name.and_then(|n| n.parse().ok()).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Test => "test",
            Self::Prod => "prod",
        }
    }
}

impl FromStr for Environment {
    type Err = WarehouseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" | "dev" => Ok(Self::Dev),
            "staging" | "testing" | "test" => Ok(Self::Test),
            "production" | "dist" | "prod" => Ok(Self::Prod),
            other => Err(WarehouseError::Config {
                message: format!("unknown environment: {}", other),
            }),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters for build lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildParams {
    #[serde(alias = "package")]
    pub pkg: Option<String>,
    #[serde(alias = "environment")]
    pub env: Option<String>,
    #[serde(alias = "v")]
    pub version: Option<String>,
    pub locale: Option<String>,
    pub meta: bool,
    /// Skip the cache for this call.
    #[serde(alias = "bypassCache")]
    pub bypass_cache: bool,
}

impl BuildParams {
    pub fn new(pkg: impl Into<String>) -> Self {
        Self {
            pkg: Some(pkg.into()),
            ..Default::default()
        }
    }

    pub fn env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn meta(mut self, meta: bool) -> Self {
        self.meta = meta;
        self
    }

    pub fn bypass_cache(mut self, bypass: bool) -> Self {
        self.bypass_cache = bypass;
        self
    }

    /// Canonical build query; `pkg` is required.
    pub fn normalize(&self) -> WarehouseResult<BuildQuery> {
        Ok(BuildQuery {
            pkg: required_pkg(self.pkg.as_deref())?,
            env: Environment::normalize(self.env.as_deref()),
            version: non_empty(self.version.as_deref()),
            locale: locale_or_default(self.locale.as_deref()),
            meta: self.meta,
        })
    }
}

/// Canonical build query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildQuery {
    pub pkg: String,
    pub env: Environment,
    pub version: Option<String>,
    pub locale: String,
    pub meta: bool,
}

/// Parameters for asset lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetParams {
    #[serde(alias = "package")]
    pub pkg: Option<String>,
    #[serde(alias = "environment")]
    pub env: Option<String>,
    #[serde(alias = "v")]
    pub version: Option<String>,
    pub locale: Option<String>,
    pub filter: Option<String>,
    #[serde(alias = "bypassCache")]
    pub bypass_cache: bool,
}

impl AssetParams {
    pub fn new(pkg: impl Into<String>) -> Self {
        Self {
            pkg: Some(pkg.into()),
            ..Default::default()
        }
    }

    pub fn env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn bypass_cache(mut self, bypass: bool) -> Self {
        self.bypass_cache = bypass;
        self
    }

    /// Canonical asset query; `pkg` is required.
    pub fn normalize(&self) -> WarehouseResult<AssetQuery> {
        Ok(AssetQuery {
            pkg: required_pkg(self.pkg.as_deref())?,
            env: Environment::normalize(self.env.as_deref()),
            version: non_empty(self.version.as_deref()),
            locale: locale_or_default(self.locale.as_deref()),
            filter: non_empty(self.filter.as_deref()),
        })
    }
}

/// Canonical asset query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetQuery {
    pub pkg: String,
    pub env: Environment,
    pub version: Option<String>,
    pub locale: String,
    pub filter: Option<String>,
}

/// Parameters for status, status-events and progress lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusParams {
    #[serde(alias = "package")]
    pub pkg: Option<String>,
    pub env: Option<String>,
    pub version: Option<String>,
}

impl StatusParams {
    pub fn new(pkg: impl Into<String>, env: impl Into<String>) -> Self {
        Self {
            pkg: Some(pkg.into()),
            env: Some(env.into()),
            version: None,
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Both `pkg` and `env` are required; `env` is passed through verbatim.
    pub(crate) fn require(&self) -> WarehouseResult<(&str, &str, Option<&str>)> {
        let pkg = self
            .pkg
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or(WarehouseError::MissingParameter { name: "pkg" })?;
        let env = self
            .env
            .as_deref()
            .filter(|e| !e.is_empty())
            .ok_or(WarehouseError::MissingParameter { name: "env" })?;
        Ok((pkg, env, self.version.as_deref().filter(|v| !v.is_empty())))
    }
}

/// Parameters for build head listing and verify.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadParams {
    #[serde(alias = "package")]
    pub pkg: Option<String>,
    #[serde(alias = "environment")]
    pub env: Option<String>,
}

impl HeadParams {
    pub fn new(pkg: impl Into<String>) -> Self {
        Self {
            pkg: Some(pkg.into()),
            env: None,
        }
    }

    pub fn env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    pub(crate) fn normalize(&self) -> WarehouseResult<(String, Environment)> {
        Ok((
            required_pkg(self.pkg.as_deref())?,
            Environment::normalize(self.env.as_deref()),
        ))
    }
}

fn required_pkg(pkg: Option<&str>) -> WarehouseResult<String> {
    non_empty(pkg).ok_or(WarehouseError::MissingParameter { name: "pkg" })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(String::from)
}

fn locale_or_default(locale: Option<&str>) -> String {
    non_empty(locale).unwrap_or_else(|| DEFAULT_LOCALE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_aliases() {
        let cases = [
            ("development", Environment::Dev),
            ("dev", Environment::Dev),
            ("staging", Environment::Test),
            ("testing", Environment::Test),
            ("test", Environment::Test),
            ("production", Environment::Prod),
            ("dist", Environment::Prod),
            ("prod", Environment::Prod),
        ];
        for (name, expected) in cases {
            assert_eq!(Environment::normalize(Some(name)), expected, "{}", name);
        }
        assert_eq!(Environment::normalize(Some("moon")), Environment::Dev);
        assert_eq!(Environment::normalize(None), Environment::Dev);
    }

    #[test]
    fn test_build_params_defaults() {
        let query = BuildParams::new("some-pkg").normalize().unwrap();
        assert_eq!(query.pkg, "some-pkg");
        assert_eq!(query.env, Environment::Dev);
        assert_eq!(query.version, None);
        assert_eq!(query.locale, "en-US");
        assert!(!query.meta);
    }

    #[test]
    fn test_build_params_missing_pkg() {
        let err = BuildParams::default().normalize().unwrap_err();
        assert!(matches!(err, WarehouseError::MissingParameter { name: "pkg" }));

        let err = BuildParams::new("").normalize().unwrap_err();
        assert!(matches!(err, WarehouseError::MissingParameter { name: "pkg" }));
    }

    #[test]
    fn test_loose_aliases_deserialize() {
        let params: BuildParams = serde_json::from_str(
            r#"{"package": "@scope/pkg", "environment": "production", "v": "1.2.3", "bypassCache": true}"#,
        )
        .unwrap();
        assert_eq!(params.pkg.as_deref(), Some("@scope/pkg"));
        assert!(params.bypass_cache);

        let query = params.normalize().unwrap();
        assert_eq!(query.env, Environment::Prod);
        assert_eq!(query.version.as_deref(), Some("1.2.3"));
    }

    #[test]
    fn test_asset_params_filter() {
        let query = AssetParams::new("pkg")
            .env("staging")
            .filter("*.js")
            .normalize()
            .unwrap();
        assert_eq!(query.env, Environment::Test);
        assert_eq!(query.filter.as_deref(), Some("*.js"));
    }

    #[test]
    fn test_status_params_required() {
        let missing_env = StatusParams {
            pkg: Some("pkg".into()),
            ..Default::default()
        };
        assert!(matches!(
            missing_env.require(),
            Err(WarehouseError::MissingParameter { name: "env" })
        ));

        let missing_pkg = StatusParams {
            env: Some("dev".into()),
            ..Default::default()
        };
        assert!(matches!(
            missing_pkg.require(),
            Err(WarehouseError::MissingParameter { name: "pkg" })
        ));

        let ok = StatusParams::new("pkg", "dev").version("1.0.0");
        assert_eq!(ok.require().unwrap(), ("pkg", "dev", Some("1.0.0")));
    }

    #[test]
    fn test_environment_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Environment::Prod).unwrap(),
            "\"prod\""
        );
    }
}
