// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Device location, behind a provider-level consent flag.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;
use tracing::info;

use richmedia_core::error::{BridgeError, Result};
use richmedia_core::types::{CapabilityEvent, Location};

use super::{CapabilityProvider, ProviderSnapshot, unserved};
use crate::listener::ListenerSlot;
use crate::protocol::ScriptMessage;
use crate::router::LocationConsent;
use crate::sources::{LocationSource, Sink};
use crate::surface::ContentChannel;

const EVENTS: &[CapabilityEvent] = &[CapabilityEvent::LocationChange];
const OPERATIONS: &[&str] = &["getLocation"];

pub struct LocationProvider {
    source: Arc<dyn LocationSource>,
    channel: Arc<ContentChannel>,
    updates: ListenerSlot,
    allow_location_services: AtomicBool,
}

impl LocationProvider {
    pub fn new(
        source: Arc<dyn LocationSource>,
        channel: Arc<ContentChannel>,
        allow_location_services: bool,
    ) -> Self {
        Self {
            source,
            channel,
            updates: ListenerSlot::new("location-change"),
            allow_location_services: AtomicBool::new(allow_location_services),
        }
    }

    /// Opt in or out of location services at runtime.
    ///
    /// Withdrawing consent does not stop an active stream; the creative
    /// deactivates it, or teardown does.
    pub fn set_allow_location_services(&self, allow: bool) {
        info!(allow, "location services consent changed");
        self.allow_location_services.store(allow, Ordering::SeqCst);
    }

    /// Last known fix, withheld without consent.
    pub fn location(&self) -> Option<Location> {
        if !self.allows_location_services() {
            return None;
        }
        self.source.last_known()
    }

    fn sink(&self) -> Sink<Location> {
        let gate = self.updates.gate();
        let channel = Arc::clone(&self.channel);
        Arc::new(move |location: Location| {
            gate.deliver("location-change", || {
                channel.deliver(ScriptMessage::location(location))
            });
        })
    }
}

impl LocationConsent for LocationProvider {
    fn allows_location_services(&self) -> bool {
        self.allow_location_services.load(Ordering::SeqCst)
    }
}

impl CapabilityProvider for LocationProvider {
    fn name(&self) -> &'static str {
        "location"
    }

    fn events(&self) -> &'static [CapabilityEvent] {
        EVENTS
    }

    fn start(&self, event: CapabilityEvent) -> Result<()> {
        if event != CapabilityEvent::LocationChange {
            return Err(unserved(self.name(), event));
        }
        self.updates
            .start(|| self.source.subscribe(self.sink()))
            .map(|_| ())
    }

    /// Location has a single stream, so stopping it is a full stop.
    fn stop(&self, event: CapabilityEvent) -> Result<()> {
        if event != CapabilityEvent::LocationChange {
            return Err(unserved(self.name(), event));
        }
        self.stop_all()
    }

    fn stop_all(&self) -> Result<()> {
        self.updates.stop(|| self.source.unsubscribe());
        Ok(())
    }

    fn is_active(&self, event: CapabilityEvent) -> bool {
        event == CapabilityEvent::LocationChange && self.updates.is_active()
    }

    fn snapshot(&self) -> ProviderSnapshot {
        ProviderSnapshot::Location(self.location())
    }

    fn operations(&self) -> &'static [&'static str] {
        OPERATIONS
    }

    fn invoke(&self, operation: &str, _args: &[Value]) -> Result<Option<Value>> {
        match operation {
            "getLocation" => Ok(Some(serde_json::to_value(self.location())?)),
            _ => Err(BridgeError::OperationNotAllowed {
                channel: self.name().to_string(),
                operation: operation.to_string(),
            }),
        }
    }
}
