// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Network connectivity classification.

use std::sync::Arc;

use serde_json::Value;

use richmedia_core::error::{BridgeError, Result};
use richmedia_core::types::{CapabilityEvent, NetworkType};

use super::{CapabilityProvider, ProviderSnapshot, unserved};
use crate::listener::ListenerSlot;
use crate::protocol::ScriptMessage;
use crate::sources::{NetworkSource, Sink};
use crate::surface::ContentChannel;

const EVENTS: &[CapabilityEvent] = &[CapabilityEvent::NetworkChange];
const OPERATIONS: &[&str] = &["getNetwork"];

pub struct NetworkProvider {
    source: Arc<dyn NetworkSource>,
    channel: Arc<ContentChannel>,
    connectivity: ListenerSlot,
}

impl NetworkProvider {
    pub fn new(source: Arc<dyn NetworkSource>, channel: Arc<ContentChannel>) -> Self {
        Self {
            source,
            channel,
            connectivity: ListenerSlot::new("network-change"),
        }
    }

    pub fn network(&self) -> NetworkType {
        self.source.current()
    }

    fn sink(&self) -> Sink<NetworkType> {
        let gate = self.connectivity.gate();
        let channel = Arc::clone(&self.channel);
        Arc::new(move |network: NetworkType| {
            gate.deliver("network-change", || {
                channel.deliver(ScriptMessage::network(network))
            });
        })
    }
}

impl CapabilityProvider for NetworkProvider {
    fn name(&self) -> &'static str {
        "network"
    }

    fn events(&self) -> &'static [CapabilityEvent] {
        EVENTS
    }

    fn start(&self, event: CapabilityEvent) -> Result<()> {
        if event != CapabilityEvent::NetworkChange {
            return Err(unserved(self.name(), event));
        }
        self.connectivity
            .start(|| self.source.subscribe(self.sink()))
            .map(|_| ())
    }

    fn stop(&self, event: CapabilityEvent) -> Result<()> {
        if event != CapabilityEvent::NetworkChange {
            return Err(unserved(self.name(), event));
        }
        self.connectivity.stop(|| self.source.unsubscribe());
        Ok(())
    }

    fn stop_all(&self) -> Result<()> {
        self.connectivity.stop(|| self.source.unsubscribe());
        Ok(())
    }

    fn is_active(&self, event: CapabilityEvent) -> bool {
        event == CapabilityEvent::NetworkChange && self.connectivity.is_active()
    }

    fn snapshot(&self) -> ProviderSnapshot {
        ProviderSnapshot::Network(self.network())
    }

    fn operations(&self) -> &'static [&'static str] {
        OPERATIONS
    }

    fn invoke(&self, operation: &str, _args: &[Value]) -> Result<Option<Value>> {
        match operation {
            "getNetwork" => Ok(Some(Value::from(self.network().as_str()))),
            _ => Err(BridgeError::OperationNotAllowed {
                channel: self.name().to_string(),
                operation: operation.to_string(),
            }),
        }
    }
}
