use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Error;

/// Width of the bit vectors used by the matcher; the longest pattern it accepts.
pub const MATCH_MAX_BITS: usize = 32;

/// Controls how diffs are computed.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct DiffConfig {
    /// When `false`, texts over 100 units on both sides are diffed line by line
    /// first. Faster, slightly less optimal.
    pub(crate) high_quality: bool,
    /// `None` searches until the optimal diff is found.
    #[cfg_attr(feature = "serde", serde(deserialize_with = "unbounded_when_zero"))]
    pub(crate) time_limit: Option<Duration>,
    /// Cost of an empty edit operation in terms of edit characters.
    pub(crate) edit_cost: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            high_quality: true,
            time_limit: None,
            edit_cost: 4,
        }
    }
}

impl DiffConfig {
    pub fn high_quality(&self) -> bool {
        self.high_quality
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    pub fn edit_cost(&self) -> usize {
        self.edit_cost
    }

    pub fn with_high_quality(mut self, high_quality: bool) -> Self {
        self.high_quality = high_quality;
        self
    }

    /// A zero duration means no limit.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = (!limit.is_zero()).then_some(limit);
        self
    }

    pub fn with_edit_cost(mut self, edit_cost: usize) -> Self {
        self.edit_cost = edit_cost;
        self
    }
}

// Settings files spell "no limit" as a zero duration too.
#[cfg(feature = "serde")]
fn unbounded_when_zero<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let limit = Option::<Duration>::deserialize(deserializer)?;
    Ok(limit.filter(|limit| !limit.is_zero()))
}

/// Controls the fuzzy matcher.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct MatchConfig {
    /// At what point no match is declared (0.0 = perfection, 1.0 = very loose).
    pub(crate) threshold: f32,
    /// How far to search for a match (0 = exact location, 1000+ = broad match).
    /// A match this many units away from the expected location adds 1.0 to its score.
    pub(crate) distance: usize,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            distance: 1000,
        }
    }
}

impl MatchConfig {
    pub fn new(threshold: f32, distance: usize) -> Result<Self, Error> {
        let config = Self {
            threshold,
            distance,
        };
        config.validate()?;

        Ok(config)
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn distance(&self) -> usize {
        self.distance
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        unit_interval("match threshold", self.threshold)
    }
}

/// Controls patch construction and application.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct PatchConfig {
    /// Units of context kept around every edit.
    pub(crate) margin: u8,
    /// When deleting a large block of text, how close the contents have to match
    /// the expected contents (0.0 = perfection, 1.0 = very loose).
    pub(crate) delete_threshold: f32,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            margin: 4,
            delete_threshold: 0.5,
        }
    }
}

impl PatchConfig {
    pub fn new(margin: u8, delete_threshold: f32) -> Result<Self, Error> {
        let config = Self {
            margin,
            delete_threshold,
        };
        config.validate()?;

        Ok(config)
    }

    pub fn margin(&self) -> u8 {
        self.margin
    }

    pub fn delete_threshold(&self) -> f32 {
        self.delete_threshold
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.margin == 0 || 2 * self.margin as usize >= MATCH_MAX_BITS {
            return Err(Error::InvalidConfig(format!(
                "patch margin must be in 1..{}, got {}",
                MATCH_MAX_BITS / 2,
                self.margin
            )));
        }

        unit_interval("delete threshold", self.delete_threshold)
    }
}

/// Every knob of the engine in one place, e.g. for loading from a settings file.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct Config {
    pub diff: DiffConfig,
    pub matching: MatchConfig,
    pub patch: PatchConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), Error> {
        self.matching.validate()?;
        self.patch.validate()
    }
}

fn unit_interval(name: &str, value: f32) -> Result<(), Error> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!(
            "{name} must be within [0, 1], got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.diff.high_quality());
        assert_eq!(None, config.diff.time_limit());
        assert_eq!(4, config.diff.edit_cost());
        assert_eq!(0.5, config.matching.threshold());
        assert_eq!(1000, config.matching.distance());
        assert_eq!(4, config.patch.margin());
        assert_eq!(0.5, config.patch.delete_threshold());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_time_limit_zero_is_unbounded() {
        let config = DiffConfig::default().with_time_limit(Duration::ZERO);
        assert_eq!(None, config.time_limit());

        let config = config.with_time_limit(Duration::from_millis(250));
        assert_eq!(Some(Duration::from_millis(250)), config.time_limit());
    }

    #[test]
    fn test_validation() {
        assert!(MatchConfig::new(0.0, 0).is_ok());
        assert!(MatchConfig::new(1.0, 10).is_ok());
        assert!(matches!(
            MatchConfig::new(1.5, 10),
            Err(Error::InvalidConfig(_))
        ));
        assert!(MatchConfig::new(f32::NAN, 10).is_err());

        assert!(PatchConfig::new(15, 0.5).is_ok());
        assert!(PatchConfig::new(16, 0.5).is_err());
        assert!(PatchConfig::new(0, 0.5).is_err());
        assert!(PatchConfig::new(4, -0.1).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_config_from_json() -> Result<(), Box<dyn std::error::Error>> {
        let config: Config = serde_json::from_str(
            r#"{ "diff": { "high_quality": false }, "matching": { "threshold": 0.8 } }"#,
        )?;
        assert!(!config.diff.high_quality());
        assert_eq!(0.8, config.matching.threshold());
        assert_eq!(1000, config.matching.distance());
        assert_eq!(PatchConfig::default(), config.patch);

        let config: Config = serde_json::from_str(r#"{ "patch": { "margin": 20 } }"#)?;
        assert!(config.validate().is_err());

        // A zero limit is no limit, the same as `with_time_limit`
        let config: Config =
            serde_json::from_str(r#"{ "diff": { "time_limit": { "secs": 0, "nanos": 0 } } }"#)?;
        assert_eq!(None, config.diff.time_limit());

        let config: Config =
            serde_json::from_str(r#"{ "diff": { "time_limit": { "secs": 2, "nanos": 0 } } }"#)?;
        assert_eq!(Some(Duration::from_secs(2)), config.diff.time_limit());

        let config: Config = serde_json::from_str(r#"{ "diff": { "time_limit": null } }"#)?;
        assert_eq!(None, config.diff.time_limit());

        Ok(())
    }
}
