// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Motion sensors: shake, tilt and heading.
//
// The three sub-streams are controlled independently but share one sensor
// source. The source is subscribed while at least one sub-stream is active.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use richmedia_core::error::{BridgeError, Result};
use richmedia_core::types::{CapabilityEvent, Tilt, heading_degrees};

use super::{CapabilityProvider, ProviderSnapshot, unserved};
use crate::listener::{ListenerSlot, SharedSubscription, lock};
use crate::protocol::ScriptMessage;
use crate::sources::{SensorReading, SensorSource, Sink};
use crate::surface::ContentChannel;

const EVENTS: &[CapabilityEvent] = &[
    CapabilityEvent::Shake,
    CapabilityEvent::TiltChange,
    CapabilityEvent::HeadingChange,
];
const OPERATIONS: &[&str] = &["getTilt", "getHeading"];

/// Last readings seen from the source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SensorSnapshot {
    pub tilt: Tilt,
    /// Heading in whole degrees, once the compass has reported.
    pub heading: Option<i32>,
}

pub struct SensorProvider {
    source: Arc<dyn SensorSource>,
    channel: Arc<ContentChannel>,
    interval: Duration,
    subscription: SharedSubscription,
    shake: ListenerSlot,
    tilt: ListenerSlot,
    heading: ListenerSlot,
    last: Arc<Mutex<SensorSnapshot>>,
}

impl SensorProvider {
    pub fn new(
        source: Arc<dyn SensorSource>,
        channel: Arc<ContentChannel>,
        interval: Duration,
    ) -> Self {
        Self {
            source,
            channel,
            interval,
            subscription: SharedSubscription::default(),
            shake: ListenerSlot::new("shake"),
            tilt: ListenerSlot::new("tilt-change"),
            heading: ListenerSlot::new("heading-change"),
            last: Arc::new(Mutex::new(SensorSnapshot::default())),
        }
    }

    pub fn tilt(&self) -> Tilt {
        lock(&self.last).tilt
    }

    pub fn heading(&self) -> Option<i32> {
        lock(&self.last).heading
    }

    /// Number of active sub-streams holding the source.
    pub fn source_holders(&self) -> usize {
        self.subscription.holders()
    }

    fn slot(&self, event: CapabilityEvent) -> Result<&ListenerSlot> {
        match event {
            CapabilityEvent::Shake => Ok(&self.shake),
            CapabilityEvent::TiltChange => Ok(&self.tilt),
            CapabilityEvent::HeadingChange => Ok(&self.heading),
            other => Err(unserved(self.name(), other)),
        }
    }

    /// One callback for the shared source, fanning out to the sub-streams.
    fn sink(&self) -> Sink<SensorReading> {
        let shake = self.shake.gate();
        let tilt = self.tilt.gate();
        let heading = self.heading.gate();
        let channel = Arc::clone(&self.channel);
        let last = Arc::clone(&self.last);
        Arc::new(move |reading: SensorReading| match reading {
            SensorReading::Acceleration(value) => {
                lock(&last).tilt = value;
                tilt.deliver("tilt-change", || channel.deliver(ScriptMessage::tilt(value)));
            }
            SensorReading::Heading(radians) => {
                let degrees = heading_degrees(radians);
                lock(&last).heading = Some(degrees);
                heading.deliver("heading-change", || {
                    channel.deliver(ScriptMessage::heading(degrees))
                });
            }
            SensorReading::Shake => {
                shake.deliver("shake", || channel.deliver(ScriptMessage::Shake));
            }
        })
    }

    fn release_source(&self) {
        self.subscription.release(|| self.source.unsubscribe());
    }
}

impl CapabilityProvider for SensorProvider {
    fn name(&self) -> &'static str {
        "sensor"
    }

    fn events(&self) -> &'static [CapabilityEvent] {
        EVENTS
    }

    fn start(&self, event: CapabilityEvent) -> Result<()> {
        let slot = self.slot(event)?;
        slot.start(|| {
            self.subscription
                .acquire(|| self.source.subscribe(self.interval, self.sink()))
        })
        .map(|_| ())
    }

    fn stop(&self, event: CapabilityEvent) -> Result<()> {
        let slot = self.slot(event)?;
        slot.stop(|| self.release_source());
        Ok(())
    }

    fn stop_all(&self) -> Result<()> {
        for slot in [&self.shake, &self.tilt, &self.heading] {
            slot.stop(|| self.release_source());
        }
        // Drop any holder left behind by an inconsistent sub-stream.
        if self.subscription.holders() > 0 {
            debug!(holders = self.subscription.holders(), "resetting sensor subscription");
        }
        self.subscription.reset(|| self.source.unsubscribe());
        Ok(())
    }

    fn is_active(&self, event: CapabilityEvent) -> bool {
        self.slot(event).map(ListenerSlot::is_active).unwrap_or(false)
    }

    fn snapshot(&self) -> ProviderSnapshot {
        ProviderSnapshot::Sensor(*lock(&self.last))
    }

    fn operations(&self) -> &'static [&'static str] {
        OPERATIONS
    }

    fn invoke(&self, operation: &str, _args: &[Value]) -> Result<Option<Value>> {
        match operation {
            "getTilt" => Ok(Some(serde_json::to_value(self.tilt())?)),
            "getHeading" => Ok(Some(serde_json::to_value(self.heading())?)),
            _ => Err(BridgeError::OperationNotAllowed {
                channel: self.name().to_string(),
                operation: operation.to_string(),
            }),
        }
    }
}
