// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Best-effort teardown across every provider.
//
// A provider that fails or panics while stopping is logged and skipped;
// the remaining providers are still stopped.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{info, warn};

use richmedia_core::error::BridgeError;

use crate::providers::CapabilityProvider;

/// Outcome of one teardown pass.
#[derive(Debug, Default)]
pub struct TeardownReport {
    /// Providers that stopped cleanly.
    pub stopped: Vec<&'static str>,
    /// `ProviderTeardown` errors for the ones that did not.
    pub failed: Vec<BridgeError>,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct Lifecycle {
    providers: Vec<Arc<dyn CapabilityProvider>>,
}

impl Lifecycle {
    pub fn new(providers: Vec<Arc<dyn CapabilityProvider>>) -> Self {
        Self { providers }
    }

    /// Stop every provider's listeners. Never fails and never panics.
    pub fn stop_all_listeners(&self) -> TeardownReport {
        let mut report = TeardownReport::default();
        for provider in &self.providers {
            let name = provider.name();
            let reason = match panic::catch_unwind(AssertUnwindSafe(|| provider.stop_all())) {
                Ok(Ok(())) => {
                    report.stopped.push(name);
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
            };
            warn!(provider = name, %reason, "provider teardown failed, continuing");
            report.failed.push(BridgeError::ProviderTeardown {
                provider: name.to_string(),
                reason,
            });
        }
        info!(
            stopped = report.stopped.len(),
            failed = report.failed.len(),
            "listeners stopped"
        );
        report
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
