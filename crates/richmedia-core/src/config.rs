// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

/// Longest calendar event the bridge will create: one leap year.
pub const MAX_EVENT_DURATION_MINUTES: i64 = 366 * 24 * 60;

/// Host-supplied settings for one bridge instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Provider-level opt-in for location services. Even with OS permission
    /// granted, location stays unavailable to the creative while this is false.
    pub allow_location_services: bool,
    /// OS API level reported by the host (Android `Build.VERSION.SDK_INT`).
    pub host_api_level: u32,
    /// Lowest API level that uses the `com.android.calendar` URI family.
    pub calendar_modern_min_api: u32,
    /// Highest API level that uses the `com.android.calendar` URI family.
    /// `None` means unbounded.
    pub calendar_modern_max_api: Option<u32>,
    /// Minutes before the event start at which the reminder fires.
    pub reminder_minutes: i64,
    /// Duration of a created calendar event.
    pub default_event_duration_minutes: i64,
    /// Sampling interval requested from the sensor source.
    pub sensor_interval_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            allow_location_services: false,
            host_api_level: 8,
            calendar_modern_min_api: 8,
            calendar_modern_max_api: Some(8),
            reminder_minutes: 15,
            default_event_duration_minutes: 60,
            sensor_interval_ms: 1000,
        }
    }
}

impl BridgeConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Reject settings that would make scheduling meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.default_event_duration_minutes <= 0 {
            return Err(BridgeError::Config(
                "default_event_duration_minutes must be positive".into(),
            ));
        }
        if self.default_event_duration_minutes > MAX_EVENT_DURATION_MINUTES {
            return Err(BridgeError::Config(format!(
                "default_event_duration_minutes must not exceed {MAX_EVENT_DURATION_MINUTES}"
            )));
        }
        if self.sensor_interval_ms == 0 {
            return Err(BridgeError::Config("sensor_interval_ms must be positive".into()));
        }
        if !(0..=MAX_EVENT_DURATION_MINUTES).contains(&self.reminder_minutes) {
            return Err(BridgeError::Config(format!(
                "reminder_minutes must lie within 0..={MAX_EVENT_DURATION_MINUTES}"
            )));
        }
        if let Some(max) = self.calendar_modern_max_api {
            if max < self.calendar_modern_min_api {
                return Err(BridgeError::Config(format!(
                    "calendar API range is empty ({}..={max})",
                    self.calendar_modern_min_api
                )));
            }
        }
        Ok(())
    }

    /// Whether the host API level selects the `com.android.calendar` URIs.
    pub fn uses_modern_calendar(&self) -> bool {
        let level = self.host_api_level;
        level >= self.calendar_modern_min_api
            && self.calendar_modern_max_api.is_none_or(|max| level <= max)
    }
}
