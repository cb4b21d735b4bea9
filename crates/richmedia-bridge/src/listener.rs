// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Listener bookkeeping shared by every capability provider.
//
// A `ListenerSlot` is the inactive/active state machine of one notification
// stream. Its `DeliveryGate` is held for the whole duration of a delivery,
// and `stop` closes the gate before returning, so nothing from the stream
// reaches the content surface once `stop` has returned.
//
// Lock order: slot registration → shared subscription → gate → content
// channel. A delivery callback must never start or stop its own stream.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use richmedia_core::error::Result;

/// Lock a mutex, recovering the data if a previous holder panicked.
///
/// Teardown must complete even after a provider panicked mid-update.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Admission gate for notifications of one stream.
#[derive(Debug, Default)]
pub struct DeliveryGate {
    open: Mutex<bool>,
}

impl DeliveryGate {
    /// Run `deliver` if the stream is active. Returns whether it ran.
    ///
    /// The gate stays locked while `deliver` runs.
    pub fn deliver(&self, label: &str, deliver: impl FnOnce() -> Result<()>) -> bool {
        let open = lock(&self.open);
        if !*open {
            debug!(stream = label, "notification dropped, stream inactive");
            return false;
        }
        if let Err(e) = deliver() {
            warn!(stream = label, error = %e, "notification delivery failed");
        }
        true
    }

    pub fn is_open(&self) -> bool {
        *lock(&self.open)
    }

    fn set_open(&self, open: bool) {
        *lock(&self.open) = open;
    }
}

/// Registration state of one notification stream.
#[derive(Debug)]
pub struct ListenerSlot {
    label: &'static str,
    registered: Mutex<bool>,
    gate: Arc<DeliveryGate>,
}

impl ListenerSlot {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            registered: Mutex::new(false),
            gate: Arc::new(DeliveryGate::default()),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Gate to capture in the source callback.
    pub fn gate(&self) -> Arc<DeliveryGate> {
        Arc::clone(&self.gate)
    }

    /// Activate the stream, calling `register` only on the inactive → active
    /// transition. Returns `Ok(false)` when the stream was already active.
    pub fn start(&self, register: impl FnOnce() -> Result<()>) -> Result<bool> {
        let mut registered = lock(&self.registered);
        if *registered {
            debug!(stream = self.label, "already active");
            return Ok(false);
        }
        // Open first: sources may emit synchronously while subscribing.
        self.gate.set_open(true);
        if let Err(e) = register() {
            self.gate.set_open(false);
            return Err(e);
        }
        *registered = true;
        debug!(stream = self.label, "activated");
        Ok(true)
    }

    /// Deactivate the stream, calling `unregister` only on the active →
    /// inactive transition. Returns whether the stream was active.
    pub fn stop(&self, unregister: impl FnOnce()) -> bool {
        let mut registered = lock(&self.registered);
        if !*registered {
            return false;
        }
        // Waits for an in-flight delivery to finish.
        self.gate.set_open(false);
        unregister();
        *registered = false;
        debug!(stream = self.label, "deactivated");
        true
    }

    pub fn is_active(&self) -> bool {
        *lock(&self.registered)
    }
}

/// Reference-counted subscription to a source shared by several streams.
///
/// The source is subscribed when the first holder arrives and unsubscribed
/// when the last one leaves.
#[derive(Debug, Default)]
pub struct SharedSubscription {
    holders: Mutex<usize>,
}

impl SharedSubscription {
    pub fn acquire(&self, subscribe: impl FnOnce() -> Result<()>) -> Result<()> {
        let mut holders = lock(&self.holders);
        if *holders == 0 {
            subscribe()?;
        }
        *holders += 1;
        Ok(())
    }

    pub fn release(&self, unsubscribe: impl FnOnce()) {
        let mut holders = lock(&self.holders);
        match *holders {
            0 => warn!("shared subscription released without a holder"),
            1 => {
                unsubscribe();
                *holders = 0;
            }
            _ => *holders -= 1,
        }
    }

    /// Drop every holder, unsubscribing if anyone still held the source.
    pub fn reset(&self, unsubscribe: impl FnOnce()) {
        let mut holders = lock(&self.holders);
        if *holders > 0 {
            unsubscribe();
        }
        *holders = 0;
    }

    pub fn holders(&self) -> usize {
        *lock(&self.holders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use richmedia_core::error::BridgeError;
    use std::cell::Cell;

    #[test]
    fn start_registers_once() {
        let slot = ListenerSlot::new("network");
        let calls = Cell::new(0);
        assert!(slot.start(|| { calls.set(calls.get() + 1); Ok(()) }).unwrap());
        assert!(!slot.start(|| { calls.set(calls.get() + 1); Ok(()) }).unwrap());
        assert_eq!(calls.get(), 1);
        assert!(slot.is_active());
    }

    #[test]
    fn stop_when_inactive_is_a_no_op() {
        let slot = ListenerSlot::new("tilt");
        let calls = Cell::new(0);
        assert!(!slot.stop(|| calls.set(calls.get() + 1)));
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn failed_registration_leaves_slot_inactive() {
        let slot = ListenerSlot::new("location");
        let result = slot.start(|| Err(BridgeError::Source("no provider".into())));
        assert!(result.is_err());
        assert!(!slot.is_active());
        assert!(!slot.gate().is_open());
    }

    #[test]
    fn gate_closes_on_stop() {
        let slot = ListenerSlot::new("heading");
        let gate = slot.gate();
        slot.start(|| Ok(())).unwrap();
        assert!(gate.deliver("heading", || Ok(())));

        slot.stop(|| {});
        let delivered = Cell::new(false);
        assert!(!gate.deliver("heading", || {
            delivered.set(true);
            Ok(())
        }));
        assert!(!delivered.get());
    }

    #[test]
    fn shared_subscription_counts_holders() {
        let sub = SharedSubscription::default();
        let subscribes = Cell::new(0);
        let unsubscribes = Cell::new(0);

        sub.acquire(|| { subscribes.set(subscribes.get() + 1); Ok(()) }).unwrap();
        sub.acquire(|| { subscribes.set(subscribes.get() + 1); Ok(()) }).unwrap();
        assert_eq!(subscribes.get(), 1);
        assert_eq!(sub.holders(), 2);

        sub.release(|| unsubscribes.set(unsubscribes.get() + 1));
        assert_eq!(unsubscribes.get(), 0);
        sub.release(|| unsubscribes.set(unsubscribes.get() + 1));
        assert_eq!(unsubscribes.get(), 1);

        // Extra release is tolerated.
        sub.release(|| unsubscribes.set(unsubscribes.get() + 1));
        assert_eq!(unsubscribes.get(), 1);
    }

    #[test]
    fn reset_unsubscribes_only_when_held() {
        let sub = SharedSubscription::default();
        let unsubscribes = Cell::new(0);
        sub.reset(|| unsubscribes.set(unsubscribes.get() + 1));
        assert_eq!(unsubscribes.get(), 0);

        sub.acquire(|| Ok(())).unwrap();
        sub.reset(|| unsubscribes.set(unsubscribes.get() + 1));
        assert_eq!(unsubscribes.get(), 1);
        assert_eq!(sub.holders(), 0);
    }
}
