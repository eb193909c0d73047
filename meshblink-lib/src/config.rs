//! Startup configuration for the indicator
//!
//! [`IndicatorSettings`] is what the board or stored configuration provides;
//! it may hold anything. [`IndicatorConfig`] is the validated form the rest
//! of the crate runs on: it is built once and every value is clamped into
//! its documented range.

use std::fmt;

use log::debug;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};

pub const MIN_LED_COUNT: usize = 1;
/// Limited for power reasons
pub const MAX_LED_COUNT: usize = 10;
pub const MIN_BLINK_DURATION_MS: u32 = 100;
pub const MAX_BLINK_DURATION_MS: u32 = 5000;
pub const MIN_BRIGHTNESS: u8 = 1;

/// Per-class alert enable flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)] // Independent switches, one per alert class
pub struct AlertFlags {
    pub text_messages: bool,
    pub position: bool,
    pub admin: bool,
    pub telemetry: bool,
    pub duplicates: bool,
    pub others: bool,
}

impl Default for AlertFlags {
    fn default() -> Self {
        Self {
            text_messages: true,
            position: true,
            admin: true,
            telemetry: true,
            duplicates: true,
            others: true,
        }
    }
}

/// Raw indicator options as provided by the board or stored configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct IndicatorSettings {
    /// Master switch; when false the module never schedules itself
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Strip data pin; opaque to the library
    #[serde(default = "default_data_pin")]
    pub data_pin: u8,
    #[serde(default = "default_led_count", deserialize_with = "saturating_int")]
    pub led_count: i64,
    #[serde(default = "default_blink_duration_ms", deserialize_with = "saturating_int")]
    pub blink_duration_ms: i64,
    #[serde(default = "default_brightness", deserialize_with = "saturating_int")]
    pub brightness: i64,
    #[serde(default = "default_true")]
    pub alert_text_messages: bool,
    #[serde(default = "default_true")]
    pub alert_position: bool,
    #[serde(default = "default_true")]
    pub alert_admin: bool,
    #[serde(default = "default_true")]
    pub alert_telemetry: bool,
    #[serde(default = "default_true")]
    pub alert_duplicates: bool,
    #[serde(default = "default_true")]
    pub alert_others: bool,
}

const fn default_true() -> bool {
    true
}

const fn default_data_pin() -> u8 {
    12
}

const fn default_led_count() -> i64 {
    1
}

const fn default_blink_duration_ms() -> i64 {
    500
}

/// 25% to avoid excessive power draw
const fn default_brightness() -> i64 {
    64
}

/// Accept any JSON number for the numeric settings, saturating at the `i64`
/// bounds, so every stored value reaches clamping instead of failing the
/// whole document.
fn saturating_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    struct SaturatingInt;

    impl Visitor<'_> for SaturatingInt {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            Ok(i64::try_from(v).unwrap_or(i64::MAX))
        }

        // Float to int casts saturate, NaN becomes 0
        #[allow(clippy::cast_possible_truncation)]
        fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
            Ok(v as i64)
        }
    }

    deserializer.deserialize_i64(SaturatingInt)
}

/// Clamp a raw setting into `[min, max]`, including values that don't fit `T`.
fn clamp_setting<T>(name: &str, value: i64, min: T, max: T) -> T
where
    T: Copy + Ord + fmt::Display + TryFrom<i64>,
{
    let clamped = match T::try_from(value) {
        Ok(v) => v.clamp(min, max),
        Err(_) if value < 0 => min,
        Err(_) => max,
    };
    if T::try_from(value).ok() != Some(clamped) {
        debug!("Clamping {name} from {value} to {clamped}");
    }
    clamped
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            data_pin: default_data_pin(),
            led_count: default_led_count(),
            blink_duration_ms: default_blink_duration_ms(),
            brightness: default_brightness(),
            alert_text_messages: true,
            alert_position: true,
            alert_admin: true,
            alert_telemetry: true,
            alert_duplicates: true,
            alert_others: true,
        }
    }
}

impl IndicatorSettings {
    #[must_use]
    pub const fn alert_flags(&self) -> AlertFlags {
        AlertFlags {
            text_messages: self.alert_text_messages,
            position: self.alert_position,
            admin: self.alert_admin,
            telemetry: self.alert_telemetry,
            duplicates: self.alert_duplicates,
            others: self.alert_others,
        }
    }
}

/// Validated, immutable indicator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorConfig {
    pub enabled: bool,
    pub data_pin: u8,
    /// In `[1, 10]`
    pub led_count: usize,
    /// In `[100, 5000]`
    pub blink_duration_ms: u32,
    /// In `[1, 255]`
    pub brightness: u8,
    pub alerts: AlertFlags,
}

impl IndicatorConfig {
    /// Clamp raw settings into range. Never fails.
    #[must_use]
    pub fn from_settings(settings: &IndicatorSettings) -> Self {
        let led_count =
            clamp_setting("led_count", settings.led_count, MIN_LED_COUNT, MAX_LED_COUNT);
        let blink_duration_ms = clamp_setting(
            "blink_duration_ms",
            settings.blink_duration_ms,
            MIN_BLINK_DURATION_MS,
            MAX_BLINK_DURATION_MS,
        );
        let brightness = clamp_setting("brightness", settings.brightness, MIN_BRIGHTNESS, u8::MAX);

        Self {
            enabled: settings.enabled,
            data_pin: settings.data_pin,
            led_count,
            blink_duration_ms,
            brightness,
            alerts: settings.alert_flags(),
        }
    }
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self::from_settings(&IndicatorSettings::default())
    }
}
