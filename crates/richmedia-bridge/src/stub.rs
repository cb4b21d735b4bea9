// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub host for desktop/CI builds where no mobile OS is underneath.
//
// Nothing is granted, and every host action returns `PlatformUnavailable`.

use uuid::Uuid;

use richmedia_core::error::{BridgeError, Result};
use richmedia_core::types::Permission;

use crate::calendar::{CalendarInfo, CalendarPicker, CalendarStore, EventRecord, ReminderRecord};
use crate::host::HostIntents;
use crate::permissions::PermissionOracle;

/// No-op host returned on non-mobile platforms.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubHost;

impl PermissionOracle for StubHost {
    fn is_granted(&self, _permission: Permission) -> bool {
        false
    }
}

impl HostIntents for StubHost {
    fn send_sms(&self, _recipient: &str, _body: &str) -> Result<()> {
        tracing::warn!("HostIntents::send_sms called on stub host");
        Err(BridgeError::PlatformUnavailable)
    }

    fn send_mail(&self, _recipient: &str, _subject: &str, _body: &str) -> Result<()> {
        tracing::warn!("HostIntents::send_mail called on stub host");
        Err(BridgeError::PlatformUnavailable)
    }

    fn dial(&self, _tel_url: &str) -> Result<()> {
        tracing::warn!("HostIntents::dial called on stub host");
        Err(BridgeError::PlatformUnavailable)
    }
}

impl CalendarStore for StubHost {
    fn calendars(&self, _uri: &str) -> Result<Vec<CalendarInfo>> {
        tracing::warn!("CalendarStore::calendars called on stub host");
        Err(BridgeError::PlatformUnavailable)
    }

    fn insert_event(&self, _uri: &str, _event: &EventRecord) -> Result<Option<i64>> {
        Err(BridgeError::PlatformUnavailable)
    }

    fn insert_reminder(&self, _uri: &str, _reminder: &ReminderRecord) -> Result<()> {
        Err(BridgeError::PlatformUnavailable)
    }
}

impl CalendarPicker for StubHost {
    fn present(&self, _request: Uuid, _calendars: &[CalendarInfo]) -> Result<()> {
        tracing::warn!("CalendarPicker::present called on stub host");
        Err(BridgeError::PlatformUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::MODERN_CALENDAR_URIS;

    #[test]
    fn stub_grants_nothing() {
        assert!(StubHost.snapshot().iter().next().is_none());
    }

    #[test]
    fn stub_actions_are_unavailable() {
        assert!(matches!(
            StubHost.send_sms("5551234", "hi"),
            Err(BridgeError::PlatformUnavailable)
        ));
        assert!(matches!(StubHost.dial("tel:5551234"), Err(BridgeError::PlatformUnavailable)));
        assert!(matches!(
            StubHost.calendars(MODERN_CALENDAR_URIS.calendars),
            Err(BridgeError::PlatformUnavailable)
        ));
    }
}
