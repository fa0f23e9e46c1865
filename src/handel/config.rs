use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HandelError;

/// Tunables of a Handel run. None of them affects correctness, only how fast
/// and with how much traffic the run converges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Period between two rounds of sending the current aggregates.
    pub update_period: Duration,
    /// Time after which a level that is still incomplete stops blocking the
    /// next one.
    pub level_timeout: Duration,
    /// Number of peers contacted per level at each round.
    pub candidate_count: usize,
    /// Number of contributors the final aggregate must reach. Defaults to all
    /// registered participants.
    pub contributions: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            update_period: Duration::from_millis(50),
            level_timeout: Duration::from_millis(100),
            candidate_count: 10,
            contributions: None,
        }
    }
}

impl Config {
    /// Check the configuration against a registry of `size` participants.
    pub fn validate(&self, size: usize) -> Result<(), HandelError> {
        if self.update_period.is_zero() {
            return Err(HandelError::InvalidConfig(
                "update period must be positive".to_string(),
            ));
        }
        if self.candidate_count == 0 {
            return Err(HandelError::InvalidConfig(
                "candidate count must be positive".to_string(),
            ));
        }
        match self.contributions {
            Some(contributions) if contributions == 0 || contributions > size => {
                Err(HandelError::InvalidConfig(format!(
                    "contributions must be in 1..={size}, got {contributions}"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Number of contributors required before emitting the final aggregate.
    pub fn threshold(&self, size: usize) -> usize {
        self.contributions.unwrap_or(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(Config::default().validate(8).is_ok());

        let config = Config {
            contributions: Some(9),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(8),
            Err(HandelError::InvalidConfig(_))
        ));

        let config = Config {
            contributions: Some(0),
            ..Config::default()
        };
        assert!(config.validate(8).is_err());

        let config = Config {
            update_period: Duration::ZERO,
            ..Config::default()
        };
        assert!(config.validate(8).is_err());

        let config = Config {
            candidate_count: 0,
            ..Config::default()
        };
        assert!(config.validate(8).is_err());
    }

    #[test]
    fn test_threshold() {
        assert_eq!(Config::default().threshold(8), 8);
        let config = Config {
            contributions: Some(5),
            ..Config::default()
        };
        assert_eq!(config.threshold(8), 5);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: Config =
            serde_json::from_str(r#"{"candidate_count": 3, "contributions": 6}"#).unwrap();
        assert_eq!(config.candidate_count, 3);
        assert_eq!(config.contributions, Some(6));
        assert_eq!(config.update_period, Config::default().update_period);

        let encoded = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<Config>(&encoded).unwrap(), config);
    }
}
