// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host actions launched on behalf of the creative: SMS, mail and calls.
//
// Everything here crosses a trust boundary. Arguments come from a remote
// creative and are validated before the host sees them.

use std::sync::Arc;

use richmedia_core::error::{BridgeError, Result};

use crate::calendar::{CalendarPicker, CalendarStore};
use crate::permissions::PermissionOracle;
use crate::stub::StubHost;

/// Intent-style actions performed by the host OS.
pub trait HostIntents: Send + Sync {
    /// Open the messaging app with a prefilled message.
    fn send_sms(&self, recipient: &str, body: &str) -> Result<()>;

    /// Open the mail composer with a prefilled message.
    fn send_mail(&self, recipient: &str, subject: &str, body: &str) -> Result<()>;

    /// Place a call to a `tel:` URL.
    fn dial(&self, tel_url: &str) -> Result<()>;
}

/// Everything the coordinator needs from the host besides capability sources.
#[derive(Clone)]
pub struct HostServices {
    pub permissions: Arc<dyn PermissionOracle>,
    pub intents: Arc<dyn HostIntents>,
    pub calendar: Arc<dyn CalendarStore>,
    pub picker: Arc<dyn CalendarPicker>,
    /// OS API level read from the device. Takes precedence over
    /// `BridgeConfig::host_api_level` when present.
    pub api_level: Option<u32>,
}

impl HostServices {
    /// Services with nothing granted and no host actions available.
    pub fn stub() -> Self {
        let stub = Arc::new(StubHost);
        Self {
            permissions: stub.clone(),
            intents: stub.clone(),
            calendar: stub.clone(),
            picker: stub,
            api_level: None,
        }
    }

    pub fn with_permissions(mut self, permissions: Arc<dyn PermissionOracle>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn with_intents(mut self, intents: Arc<dyn HostIntents>) -> Self {
        self.intents = intents;
        self
    }

    pub fn with_calendar(mut self, calendar: Arc<dyn CalendarStore>) -> Self {
        self.calendar = calendar;
        self
    }

    pub fn with_picker(mut self, picker: Arc<dyn CalendarPicker>) -> Self {
        self.picker = picker;
        self
    }

    pub fn with_api_level(mut self, api_level: u32) -> Self {
        self.api_level = Some(api_level);
        self
    }
}

/// Message shown to the creative for an unusable phone number.
pub const BAD_PHONE_NUMBER: &str = "Bad Phone Number";

/// Build a `tel:` URL from a creative-supplied number.
///
/// Accepts digits and the usual dialling punctuation; at least one digit is
/// required.
pub fn tel_url(number: &str) -> Result<String> {
    let number = number.trim();
    let allowed = |c: char| c.is_ascii_digit() || "+-. ()*#".contains(c);
    if number.is_empty()
        || !number.chars().all(allowed)
        || !number.chars().any(|c| c.is_ascii_digit())
    {
        return Err(BridgeError::validation("makeCall", BAD_PHONE_NUMBER));
    }
    Ok(format!("tel:{number}"))
}

/// Minimal shape check for a mail recipient: one `@` with text on both sides.
pub fn validate_mail_recipient(recipient: &str) -> Result<()> {
    let mut parts = recipient.split('@');
    let valid = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && !domain.is_empty() && !recipient.chars().any(char::is_whitespace)
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(BridgeError::validation("sendMail", "Bad Email Address"))
    }
}
