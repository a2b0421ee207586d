//! Match configuration ("grammar properties").
//!
//! A [`Config`] tells the matcher how to interpret a pattern:
//! - injective: whether distinct pattern nodes must map to distinct host nodes
//!   (value nodes are always exempt).
//! - dedupe: whether a search session suppresses matches whose relevant
//!   bindings repeat an earlier match.
//! - algebra: the family interpreting constants and operators.
//! - rare_labels / common_labels: label priorities for plan ordering.
//!
//! ```ignore
//! use gramatch_common::{Config, DedupeMode};
//! let cfg = Config::builder()
//!     .injective(false)
//!     .dedupe(DedupeMode::None)
//!     .rare_labels(["owner"])
//!     .build();
//! ```

use serde::{Deserialize, Serialize};

use crate::algebra::AlgebraFamily;
use crate::error::ConfigError;

/// Control how matches of one search session are deduplicated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DedupeMode {
    /// Report every match the search produces.
    None,
    /// Suppress matches whose relevant bindings equal an earlier match.
    #[default]
    Relevant,
}

/// Global matching configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Distinct pattern nodes map to distinct host nodes.
    pub injective: bool,
    /// Deduplication of successive matches.
    pub dedupe: DedupeMode,
    /// Algebra family for constants and operators.
    pub algebra: AlgebraFamily,
    /// Labels matched as early as possible, most preferred first.
    pub rare_labels: Vec<String>,
    /// Labels matched as late as possible, least preferred last.
    pub common_labels: Vec<String>,
    /// Verify that every image written during search exists in the host graph.
    pub check_invariants: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            injective: true,
            dedupe: DedupeMode::default(),
            algebra: AlgebraFamily::default(),
            rare_labels: Vec::new(),
            common_labels: Vec::new(),
            check_invariants: cfg!(debug_assertions),
        }
    }
}

impl Config {
    /// Start from the default configuration.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder {
            config: Self::default(),
        }
    }

    /// Load a configuration from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        if let Some(label) = config
            .rare_labels
            .iter()
            .find(|label| config.common_labels.contains(label))
        {
            return Err(ConfigError::ConflictingPriority(label.clone()));
        }
        Ok(config)
    }

    /// Serialize to JSON.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Builder for [`Config`].
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set injective matching.
    pub fn injective(mut self, injective: bool) -> Self {
        self.config.injective = injective;
        self
    }

    /// Set the deduplication mode.
    pub fn dedupe(mut self, dedupe: DedupeMode) -> Self {
        self.config.dedupe = dedupe;
        self
    }

    /// Set the algebra family.
    pub fn algebra(mut self, algebra: AlgebraFamily) -> Self {
        self.config.algebra = algebra;
        self
    }

    /// Set the labels to match early.
    pub fn rare_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.rare_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Set the labels to match late.
    pub fn common_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.common_labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable image presence checks.
    pub fn check_invariants(mut self, check: bool) -> Self {
        self.config.check_invariants = check;
        self
    }

    /// Finish the configuration.
    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_injective_and_deduplicating() {
        let cfg = Config::default();
        assert!(cfg.injective);
        assert_eq!(cfg.dedupe, DedupeMode::Relevant);
        assert_eq!(cfg.algebra, AlgebraFamily::Default);
    }

    #[test]
    fn json_fills_in_missing_fields() {
        let cfg = Config::from_json_str(r#"{ "injective": false, "rare_labels": ["owner"] }"#).unwrap();
        assert!(!cfg.injective);
        assert_eq!(cfg.rare_labels, vec!["owner".to_owned()]);
        assert_eq!(cfg.dedupe, DedupeMode::Relevant);
    }

    #[test]
    fn json_round_trips() {
        let cfg = Config::builder()
            .dedupe(DedupeMode::None)
            .algebra(AlgebraFamily::Point)
            .common_labels(["next"])
            .build();
        let json = cfg.to_json_string().unwrap();
        assert_eq!(Config::from_json_str(&json).unwrap(), cfg);
    }

    #[test]
    fn conflicting_priorities_are_rejected() {
        let err = Config::from_json_str(r#"{ "rare_labels": ["a"], "common_labels": ["a"] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingPriority(_)));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(Config::from_json_str("{"), Err(ConfigError::Json(_))));
    }
}
