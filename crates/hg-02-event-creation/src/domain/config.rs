//! Event creation configuration.

use super::errors::{EventCreationError, Result};
use serde::Deserialize;
use std::time::Duration;

/// Parameters of the standard rule set.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EventCreationConfig {
    /// Events per second. Zero or negative disables rate limiting.
    pub max_creation_rate: f64,
    /// Creation stops while the intake queue holds this many events or more.
    pub event_intake_throttle: usize,
    /// Creation stops once the node has been unhealthy for longer than this.
    pub maximum_permissible_unhealthy_duration_ms: u64,
}

impl Default for EventCreationConfig {
    fn default() -> Self {
        Self {
            max_creation_rate: 20.0,
            event_intake_throttle: 1024,
            maximum_permissible_unhealthy_duration_ms: 1000,
        }
    }
}

impl EventCreationConfig {
    pub fn maximum_permissible_unhealthy_duration(&self) -> Duration {
        Duration::from_millis(self.maximum_permissible_unhealthy_duration_ms)
    }

    /// # Errors
    /// `InvalidCreationRate` for NaN, `ZeroIntakeThrottle` for a zero throttle.
    pub fn validate(&self) -> Result<()> {
        if self.max_creation_rate.is_nan() {
            return Err(EventCreationError::InvalidCreationRate(self.max_creation_rate));
        }
        if self.event_intake_throttle == 0 {
            return Err(EventCreationError::ZeroIntakeThrottle);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EventCreationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.maximum_permissible_unhealthy_duration(),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn test_validation() {
        let nan = EventCreationConfig {
            max_creation_rate: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            nan.validate(),
            Err(EventCreationError::InvalidCreationRate(_))
        ));

        let zero = EventCreationConfig {
            event_intake_throttle: 0,
            ..Default::default()
        };
        assert_eq!(zero.validate(), Err(EventCreationError::ZeroIntakeThrottle));

        let unlimited = EventCreationConfig {
            max_creation_rate: -1.0,
            ..Default::default()
        };
        assert!(unlimited.validate().is_ok());
    }

    #[test]
    fn test_from_json() {
        let config: EventCreationConfig =
            serde_json::from_str(r#"{ "max_creation_rate": 5.5 }"#).unwrap();
        assert_eq!(config.max_creation_rate, 5.5);
        assert_eq!(config.event_intake_throttle, 1024);
    }
}
