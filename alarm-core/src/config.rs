//! Policy constants and the alarm configuration shared by firmware and host targets.
//!
//! Timings follow the camper installation: a five second exit countdown after
//! pressing the arming key, five seconds to enter the passphrase after the entry
//! door opens, and three five-second siren bursts before the relay gives up and
//! only the indicator keeps flashing.

use core::{fmt, time::Duration};

use crate::passphrase::MismatchPolicy;

/// Indicator toggle period while armed.
pub const ARMED_BLINK_PERIOD: Duration = Duration::from_millis(500);
/// Indicator toggle period while waiting for the passphrase or after the relay gave up.
pub const DISARMING_BLINK_PERIOD: Duration = Duration::from_millis(150);
/// Length of one siren burst.
pub const ALARM_DURATION: Duration = Duration::from_millis(5_000);
/// Exit countdown between pressing the arming key and the system arming.
pub const ARM_COUNTDOWN: Duration = Duration::from_millis(5_000);
/// Time allowed to enter the passphrase after the entry door opens.
pub const ENTRY_DELAY: Duration = Duration::from_millis(5_000);
/// Number of siren bursts before the relay is left off.
pub const ALARM_RETRIES: u8 = 3;

/// Key that starts the exit countdown.
pub const ARMING_KEY: char = '#';
/// Key that discards partial passphrase input.
pub const RESET_KEY: char = '*';
/// Factory passphrase.
pub const DEFAULT_PASSPHRASE: [char; 4] = ['1', '2', '3', '4'];

/// Minimum time a raw input level must hold before it is trusted.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(20);
/// Settle time after an encoder phase edge before sampling the pin.
pub const ENCODER_SETTLE: Duration = Duration::from_millis(10);
/// Main loop period.
pub const POLL_PERIOD: Duration = Duration::from_millis(10);

/// Display backlight stays on this long after the last menu interaction.
pub const BACKLIGHT_TIMEOUT: Duration = Duration::from_millis(15_000);
/// Temperature conversions are slow; refresh rarely.
pub const TEMPERATURE_REFRESH: Duration = Duration::from_millis(15_000);
/// Battery voltage and current refresh period.
pub const ANALOG_REFRESH: Duration = Duration::from_millis(100);

/// Main battery voltage above which the auxiliary battery may charge.
pub const CHARGE_THRESHOLD_VOLTS: f32 = 4.51;
/// Main battery must stay above the threshold this long before the charge relay closes.
pub const CHARGE_DELAY: Duration = Duration::from_millis(5_000);

/// Reason an [`AlarmConfig`] was rejected.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// A blink period of zero would toggle the indicator every cycle.
    ZeroBlinkPeriod,
    /// Arming and reset must be distinct keys.
    KeyCollision(char),
    /// Control keys must not be passphrase digits.
    DigitControlKey(char),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroBlinkPeriod => f.write_str("blink period must be non-zero"),
            ConfigError::KeyCollision(key) => {
                write!(f, "arming and reset keys both bound to `{key}`")
            }
            ConfigError::DigitControlKey(key) => {
                write!(f, "control key `{key}` collides with passphrase digits")
            }
        }
    }
}

/// Alarm sequencing policy.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AlarmConfig {
    pub arm_countdown: Duration,
    pub entry_delay: Duration,
    pub alarm_duration: Duration,
    pub armed_blink: Duration,
    pub disarming_blink: Duration,
    pub retry_limit: u8,
    pub arming_key: char,
    pub reset_key: char,
    /// Accept the passphrase while armed, before the entry door opens.
    pub disarm_while_armed: bool,
    pub mismatch: MismatchPolicy,
}

impl AlarmConfig {
    pub const DEFAULT: Self = Self {
        arm_countdown: ARM_COUNTDOWN,
        entry_delay: ENTRY_DELAY,
        alarm_duration: ALARM_DURATION,
        armed_blink: ARMED_BLINK_PERIOD,
        disarming_blink: DISARMING_BLINK_PERIOD,
        retry_limit: ALARM_RETRIES,
        arming_key: ARMING_KEY,
        reset_key: RESET_KEY,
        disarm_while_armed: true,
        mismatch: MismatchPolicy::Retain,
    };

    #[must_use]
    pub const fn with_entry_delay(mut self, entry_delay: Duration) -> Self {
        self.entry_delay = entry_delay;
        self
    }

    #[must_use]
    pub const fn with_arm_countdown(mut self, arm_countdown: Duration) -> Self {
        self.arm_countdown = arm_countdown;
        self
    }

    #[must_use]
    pub const fn with_alarm_duration(mut self, alarm_duration: Duration) -> Self {
        self.alarm_duration = alarm_duration;
        self
    }

    #[must_use]
    pub const fn with_retry_limit(mut self, retry_limit: u8) -> Self {
        self.retry_limit = retry_limit;
        self
    }

    #[must_use]
    pub const fn with_disarm_while_armed(mut self, enabled: bool) -> Self {
        self.disarm_while_armed = enabled;
        self
    }

    #[must_use]
    pub const fn with_mismatch_policy(mut self, mismatch: MismatchPolicy) -> Self {
        self.mismatch = mismatch;
        self
    }

    /// Checks the policy for combinations the state machine cannot honour.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.armed_blink.is_zero() || self.disarming_blink.is_zero() {
            return Err(ConfigError::ZeroBlinkPeriod);
        }
        if self.arming_key == self.reset_key {
            return Err(ConfigError::KeyCollision(self.arming_key));
        }
        for key in [self.arming_key, self.reset_key] {
            if key.is_ascii_digit() {
                return Err(ConfigError::DigitControlKey(key));
            }
        }
        Ok(())
    }
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_valid() {
        assert_eq!(AlarmConfig::default().validate(), Ok(()));
        assert_eq!(AlarmConfig::DEFAULT.retry_limit, ALARM_RETRIES);
    }

    #[test]
    fn rejects_colliding_control_keys() {
        let mut config = AlarmConfig::DEFAULT;
        config.reset_key = config.arming_key;
        assert_eq!(config.validate(), Err(ConfigError::KeyCollision('#')));

        config.reset_key = '5';
        assert_eq!(config.validate(), Err(ConfigError::DigitControlKey('5')));
    }

    #[test]
    fn rejects_zero_blink_period() {
        let mut config = AlarmConfig::DEFAULT;
        config.disarming_blink = Duration::ZERO;
        assert_eq!(config.validate(), Err(ConfigError::ZeroBlinkPeriod));
    }
}
