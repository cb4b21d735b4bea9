// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Simulated host: logs intents, keeps calendar rows in memory and queues
// calendar chooser requests for the session to answer.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use tracing::info;
use uuid::Uuid;

use richmedia_core::error::Result;

use richmedia_bridge::calendar::{
    CalendarInfo, CalendarPicker, CalendarStore, EventRecord, ReminderRecord,
};
use richmedia_bridge::host::HostIntents;
use richmedia_bridge::listener::lock;

pub struct SimulatedHost {
    calendars: Vec<CalendarInfo>,
    next_event_id: AtomicI64,
    events: Mutex<Vec<EventRecord>>,
    reminders: Mutex<Vec<ReminderRecord>>,
    pending: Mutex<Vec<Uuid>>,
    actions: Mutex<Vec<String>>,
}

impl SimulatedHost {
    pub fn new(calendar_names: &[&str]) -> Self {
        let calendars = calendar_names
            .iter()
            .zip(1..)
            .map(|(name, id)| CalendarInfo {
                id,
                display_name: (*name).to_string(),
                account: Some(format!("{}@device.local", name.to_lowercase())),
            })
            .collect();
        Self {
            calendars,
            next_event_id: AtomicI64::new(100),
            events: Mutex::new(Vec::new()),
            reminders: Mutex::new(Vec::new()),
            pending: Mutex::new(Vec::new()),
            actions: Mutex::new(Vec::new()),
        }
    }

    /// Chooser requests not yet answered.
    pub fn take_pending(&self) -> Vec<Uuid> {
        std::mem::take(&mut *lock(&self.pending))
    }

    pub fn actions(&self) -> Vec<String> {
        lock(&self.actions).clone()
    }

    pub fn events(&self) -> Vec<EventRecord> {
        lock(&self.events).clone()
    }

    pub fn reminders(&self) -> Vec<ReminderRecord> {
        lock(&self.reminders).clone()
    }

    fn record(&self, action: String) {
        info!(%action, "simulated host action");
        lock(&self.actions).push(action);
    }
}

impl HostIntents for SimulatedHost {
    fn send_sms(&self, recipient: &str, body: &str) -> Result<()> {
        self.record(format!("sms to {recipient}: {body}"));
        Ok(())
    }

    fn send_mail(&self, recipient: &str, subject: &str, _body: &str) -> Result<()> {
        self.record(format!("mail to {recipient}: {subject}"));
        Ok(())
    }

    fn dial(&self, tel_url: &str) -> Result<()> {
        self.record(format!("dial {tel_url}"));
        Ok(())
    }
}

impl CalendarStore for SimulatedHost {
    fn calendars(&self, _uri: &str) -> Result<Vec<CalendarInfo>> {
        Ok(self.calendars.clone())
    }

    fn insert_event(&self, uri: &str, event: &EventRecord) -> Result<Option<i64>> {
        let id = self.next_event_id.fetch_add(1, Ordering::SeqCst);
        info!(uri, id, title = %event.title, "simulated calendar insert");
        lock(&self.events).push(event.clone());
        Ok(Some(id))
    }

    fn insert_reminder(&self, _uri: &str, reminder: &ReminderRecord) -> Result<()> {
        lock(&self.reminders).push(*reminder);
        Ok(())
    }
}

impl CalendarPicker for SimulatedHost {
    fn present(&self, request: Uuid, calendars: &[CalendarInfo]) -> Result<()> {
        info!(%request, count = calendars.len(), "simulated calendar chooser shown");
        lock(&self.pending).push(request);
        Ok(())
    }
}
