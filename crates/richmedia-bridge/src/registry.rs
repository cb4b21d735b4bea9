// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge registry: the named channels a creative can call into.
//
// Each channel is bound to one provider together with the operations that
// provider whitelists. Nothing outside the whitelist is reachable.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use richmedia_core::error::{BridgeError, Result};

use crate::providers::CapabilityProvider;

/// One registered channel.
pub struct BridgeChannel {
    provider: Arc<dyn CapabilityProvider>,
    operations: &'static [&'static str],
}

impl BridgeChannel {
    pub fn allows(&self, operation: &str) -> bool {
        self.operations.contains(&operation)
    }

    pub fn operations(&self) -> &'static [&'static str] {
        self.operations
    }
}

#[derive(Default)]
pub struct BridgeRegistry {
    channels: BTreeMap<String, BridgeChannel>,
}

impl BridgeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `provider` and its operation whitelist.
    pub fn register(&mut self, name: &str, provider: Arc<dyn CapabilityProvider>) -> Result<()> {
        if self.channels.contains_key(name) {
            return Err(BridgeError::DuplicateChannel(name.to_string()));
        }
        let operations = provider.operations();
        debug!(channel = name, provider = provider.name(), ?operations, "channel registered");
        self.channels.insert(
            name.to_string(),
            BridgeChannel {
                provider,
                operations,
            },
        );
        Ok(())
    }

    /// Forward a creative call to the provider bound to `channel`.
    pub fn dispatch(&self, channel: &str, operation: &str, args: &[Value]) -> Result<Option<Value>> {
        let bound = self
            .channels
            .get(channel)
            .ok_or_else(|| BridgeError::UnknownChannel(channel.to_string()))?;
        if !bound.allows(operation) {
            return Err(BridgeError::OperationNotAllowed {
                channel: channel.to_string(),
                operation: operation.to_string(),
            });
        }
        debug!(channel, operation, args = args.len(), "dispatching");
        bound.provider.invoke(operation, args)
    }

    pub fn channel(&self, name: &str) -> Option<&BridgeChannel> {
        self.channels.get(name)
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.channels.keys().map(String::as_str)
    }
}
