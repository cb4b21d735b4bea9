// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Calendar event creation requested by the creative.
//
// The host's calendar content provider is reached through `CalendarStore`.
// With several calendars on the device the user has to pick one first, so
// the draft is parked under a request id until the host reports the choice.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use richmedia_core::config::BridgeConfig;
use richmedia_core::error::{BridgeError, Result};

use crate::listener::lock;

/// Content URIs of one calendar provider generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarUris {
    pub calendars: &'static str,
    pub events: &'static str,
    pub reminders: &'static str,
}

pub const MODERN_CALENDAR_URIS: CalendarUris = CalendarUris {
    calendars: "content://com.android.calendar/calendars",
    events: "content://com.android.calendar/events",
    reminders: "content://com.android.calendar/reminders",
};

pub const LEGACY_CALENDAR_URIS: CalendarUris = CalendarUris {
    calendars: "content://calendar/calendars",
    events: "content://calendar/events",
    reminders: "content://calendar/reminders",
};

impl CalendarUris {
    /// URI family for the host API level in `config`.
    pub fn for_config(config: &BridgeConfig) -> Self {
        if config.uses_modern_calendar() {
            MODERN_CALENDAR_URIS
        } else {
            LEGACY_CALENDAR_URIS
        }
    }
}

/// A calendar available on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarInfo {
    pub id: i64,
    pub display_name: String,
    pub account: Option<String>,
}

/// Row inserted into the events table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub calendar_id: i64,
    pub title: String,
    pub description: String,
    pub dtstart: DateTime<Utc>,
    pub dtend: DateTime<Utc>,
    pub has_alarm: bool,
}

/// Reminder delivery method; the provider stores it as an integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderMethod {
    Alert,
}

impl ReminderMethod {
    pub fn provider_value(&self) -> i32 {
        match self {
            Self::Alert => 1,
        }
    }
}

/// Row inserted into the reminders table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderRecord {
    pub event_id: i64,
    pub method: ReminderMethod,
    pub minutes: i64,
}

/// Host calendar content provider.
pub trait CalendarStore: Send + Sync {
    fn calendars(&self, uri: &str) -> Result<Vec<CalendarInfo>>;

    /// Insert an event. Returns the new event id when the provider reports one.
    fn insert_event(&self, uri: &str, event: &EventRecord) -> Result<Option<i64>>;

    fn insert_reminder(&self, uri: &str, reminder: &ReminderRecord) -> Result<()>;
}

/// Host UI that lets the user choose among several calendars.
///
/// The host answers later through [`CalendarService::select_calendar`] with
/// the same request id.
pub trait CalendarPicker: Send + Sync {
    fn present(&self, request: Uuid, calendars: &[CalendarInfo]) -> Result<()>;
}

/// Event details supplied by the creative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub start: DateTime<Utc>,
    pub title: String,
    pub body: String,
}

impl EventDraft {
    /// Validate raw creative input. `start_ms` is milliseconds since the epoch.
    pub fn new(start_ms: i64, title: &str, body: &str) -> Result<Self> {
        let start = DateTime::<Utc>::from_timestamp_millis(start_ms)
            .ok_or_else(|| BridgeError::validation("createEvent", "date out of range"))?;
        if title.trim().is_empty() {
            return Err(BridgeError::validation("createEvent", "title must not be empty"));
        }
        Ok(Self {
            start,
            title: title.trim().to_string(),
            body: body.to_string(),
        })
    }
}

/// Result of a create-event request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// No calendar on the device; nothing was inserted.
    NoCalendar,
    /// Inserted; the id is absent when the provider did not report one.
    Created { event_id: Option<i64> },
    /// Waiting for the user to choose a calendar.
    AwaitingSelection(Uuid),
}

/// Calendar choices that may be open at once.
const PENDING_LIMIT: usize = 1;

struct PendingEvent {
    calendars: Vec<CalendarInfo>,
    draft: EventDraft,
}

pub struct CalendarService {
    store: Arc<dyn CalendarStore>,
    picker: Arc<dyn CalendarPicker>,
    uris: CalendarUris,
    event_duration: TimeDelta,
    reminder_minutes: i64,
    pending: Mutex<HashMap<Uuid, PendingEvent>>,
}

impl CalendarService {
    pub fn new(
        store: Arc<dyn CalendarStore>,
        picker: Arc<dyn CalendarPicker>,
        config: &BridgeConfig,
    ) -> Result<Self> {
        let event_duration = TimeDelta::try_minutes(config.default_event_duration_minutes)
            .ok_or_else(|| {
                BridgeError::Config(format!(
                    "default_event_duration_minutes out of range: {}",
                    config.default_event_duration_minutes
                ))
            })?;
        Ok(Self {
            store,
            picker,
            uris: CalendarUris::for_config(config),
            event_duration,
            reminder_minutes: config.reminder_minutes,
            pending: Mutex::new(HashMap::new()),
        })
    }

    pub fn uris(&self) -> CalendarUris {
        self.uris
    }

    /// Create an event, asking the user for a calendar when there are several.
    ///
    /// Only one choice is open at a time; further requests that need a
    /// choice fail until the host answers or cancels it.
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub fn create_event(&self, draft: EventDraft) -> Result<EventOutcome> {
        self.end_of(&draft)?;
        let calendars = self.store.calendars(self.uris.calendars)?;
        match calendars.len() {
            0 => {
                warn!("no calendar available, event not created");
                Ok(EventOutcome::NoCalendar)
            }
            1 => self.insert(calendars[0].id, &draft),
            count => {
                let request = Uuid::new_v4();
                {
                    let mut pending = lock(&self.pending);
                    if pending.len() >= PENDING_LIMIT {
                        warn!(open = pending.len(), "calendar choice already open");
                        return Err(BridgeError::validation(
                            "createEvent",
                            "calendar choice already open",
                        ));
                    }
                    pending.insert(
                        request,
                        PendingEvent {
                            calendars: calendars.clone(),
                            draft,
                        },
                    );
                }
                info!(%request, count, "several calendars, asking the user to choose");
                if let Err(e) = self.picker.present(request, &calendars) {
                    lock(&self.pending).remove(&request);
                    return Err(e);
                }
                Ok(EventOutcome::AwaitingSelection(request))
            }
        }
    }

    /// Complete a pending request with the calendar at `index` in the list
    /// that was presented.
    #[instrument(skip(self))]
    pub fn select_calendar(&self, request: Uuid, index: usize) -> Result<EventOutcome> {
        let pending = lock(&self.pending)
            .remove(&request)
            .ok_or_else(|| BridgeError::Calendar(format!("no pending calendar choice {request}")))?;
        let Some(calendar) = pending.calendars.get(index) else {
            let count = pending.calendars.len();
            // Keep the request so the host can retry with a valid index.
            lock(&self.pending).insert(request, pending);
            return Err(BridgeError::Calendar(format!(
                "calendar index {index} out of range ({count} presented)"
            )));
        };
        let calendar_id = calendar.id;
        self.insert(calendar_id, &pending.draft)
    }

    /// Drop a pending request the user dismissed.
    pub fn cancel_selection(&self, request: Uuid) -> bool {
        lock(&self.pending).remove(&request).is_some()
    }

    pub fn pending_selections(&self) -> usize {
        lock(&self.pending).len()
    }

    fn end_of(&self, draft: &EventDraft) -> Result<DateTime<Utc>> {
        draft
            .start
            .checked_add_signed(self.event_duration)
            .ok_or_else(|| BridgeError::validation("createEvent", "date out of range"))
    }

    fn insert(&self, calendar_id: i64, draft: &EventDraft) -> Result<EventOutcome> {
        let record = EventRecord {
            calendar_id,
            title: draft.title.clone(),
            description: draft.body.clone(),
            dtstart: draft.start,
            dtend: self.end_of(draft)?,
            has_alarm: true,
        };
        let event_id = self.store.insert_event(self.uris.events, &record)?;
        if let Some(event_id) = event_id {
            let reminder = ReminderRecord {
                event_id,
                method: ReminderMethod::Alert,
                minutes: self.reminder_minutes,
            };
            self.store.insert_reminder(self.uris.reminders, &reminder)?;
        }
        info!(calendar_id, ?event_id, "event added to calendar");
        Ok(EventOutcome::Created { event_id })
    }
}
