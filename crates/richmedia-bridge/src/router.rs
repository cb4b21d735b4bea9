// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Event router: maps change-notification streams to the provider serving
// them.
//
// Activation of `location-change` is gated on consent and permission.
// Deactivation is never gated, so a stream can always be torn down.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use richmedia_core::error::{BridgeError, Result};
use richmedia_core::types::CapabilityEvent;

use crate::permissions::PermissionOracle;
use crate::providers::CapabilityProvider;

/// Provider-level opt-in to location services.
pub trait LocationConsent: Send + Sync {
    fn allows_location_services(&self) -> bool;
}

pub struct EventRouter {
    routes: HashMap<CapabilityEvent, Arc<dyn CapabilityProvider>>,
    permissions: Arc<dyn PermissionOracle>,
    consent: Arc<dyn LocationConsent>,
}

impl EventRouter {
    /// Build the routing table from the events each provider declares.
    pub fn new(
        providers: &[Arc<dyn CapabilityProvider>],
        permissions: Arc<dyn PermissionOracle>,
        consent: Arc<dyn LocationConsent>,
    ) -> Self {
        let mut routes: HashMap<CapabilityEvent, Arc<dyn CapabilityProvider>> = HashMap::new();
        for provider in providers {
            for event in provider.events() {
                if let Some(previous) = routes.insert(*event, Arc::clone(provider)) {
                    warn!(
                        %event,
                        previous = previous.name(),
                        provider = provider.name(),
                        "event claimed twice, last provider wins"
                    );
                }
            }
        }
        Self {
            routes,
            permissions,
            consent,
        }
    }

    /// Start the stream for `event`. A gated `location-change` is a silent no-op.
    pub fn activate(&self, event: CapabilityEvent) -> Result<()> {
        let provider = self.route(event)?;
        if event == CapabilityEvent::LocationChange && !self.location_allowed() {
            debug!(%event, "activation refused, location not permitted");
            return Ok(());
        }
        info!(%event, provider = provider.name(), "activating");
        provider.start(event)
    }

    pub fn deactivate(&self, event: CapabilityEvent) -> Result<()> {
        let provider = self.route(event)?;
        debug!(%event, provider = provider.name(), "deactivating");
        provider.stop(event)
    }

    /// Activate by wire name. Unknown names are ignored.
    pub fn activate_named(&self, name: &str) -> Result<()> {
        match CapabilityEvent::parse(name) {
            Some(event) => self.activate(event),
            None => {
                debug!(event = name, "ignoring activation of unknown event");
                Ok(())
            }
        }
    }

    /// Deactivate by wire name. Unknown names are ignored.
    pub fn deactivate_named(&self, name: &str) -> Result<()> {
        match CapabilityEvent::parse(name) {
            Some(event) => self.deactivate(event),
            None => {
                debug!(event = name, "ignoring deactivation of unknown event");
                Ok(())
            }
        }
    }

    pub fn is_active(&self, event: CapabilityEvent) -> bool {
        self.routes
            .get(&event)
            .is_some_and(|provider| provider.is_active(event))
    }

    /// Consent given and at least one location permission granted.
    pub fn location_allowed(&self) -> bool {
        self.consent.allows_location_services() && self.permissions.snapshot().has_any_location()
    }

    fn route(&self, event: CapabilityEvent) -> Result<&Arc<dyn CapabilityProvider>> {
        self.routes
            .get(&event)
            .ok_or_else(|| BridgeError::UnknownEvent(format!("{event} has no provider")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manual::{ManualLocation, ManualNetwork};
    use crate::permissions::GrantedPermissions;
    use crate::protocol::ScriptMessage;
    use crate::providers::{LocationProvider, NetworkProvider};
    use crate::surface::{ContentChannel, RecordingSurface};
    use richmedia_core::types::{NetworkType, Permission, PermissionSet, Rect};

    struct Fixture {
        network: Arc<ManualNetwork>,
        location: Arc<ManualLocation>,
        location_provider: Arc<LocationProvider>,
        permissions: Arc<GrantedPermissions>,
        router: EventRouter,
    }

    fn fixture(allow_location: bool) -> Fixture {
        let surface = Arc::new(RecordingSurface::new(Rect::default()));
        let channel = Arc::new(ContentChannel::new(surface));
        channel.deliver_initial(&ScriptMessage::Ready).unwrap();

        let network = Arc::new(ManualNetwork::new(NetworkType::Wifi));
        let location = Arc::new(ManualLocation::new());
        let location_provider = Arc::new(LocationProvider::new(
            location.clone(),
            channel.clone(),
            allow_location,
        ));
        let providers: Vec<Arc<dyn CapabilityProvider>> = vec![
            Arc::new(NetworkProvider::new(network.clone(), channel)),
            location_provider.clone(),
        ];
        let permissions = Arc::new(GrantedPermissions::default());
        let router = EventRouter::new(&providers, permissions.clone(), location_provider.clone());
        Fixture {
            network,
            location,
            location_provider,
            permissions,
            router,
        }
    }

    #[test]
    fn activating_twice_registers_once() {
        let f = fixture(false);
        f.router.activate(CapabilityEvent::NetworkChange).unwrap();
        f.router.activate(CapabilityEvent::NetworkChange).unwrap();
        assert_eq!(f.network.feed().subscribe_count(), 1);
        assert!(f.router.is_active(CapabilityEvent::NetworkChange));
    }

    #[test]
    fn deactivating_never_activated_event_is_a_no_op() {
        let f = fixture(false);
        f.router.deactivate(CapabilityEvent::NetworkChange).unwrap();
        assert_eq!(f.network.feed().unsubscribe_count(), 0);
    }

    #[test]
    fn unknown_names_are_ignored() {
        let f = fixture(false);
        f.router.activate_named("keyboard-change").unwrap();
        f.router.deactivate_named("").unwrap();
        f.router.activate_named("Network_Change").unwrap();
        assert!(f.router.is_active(CapabilityEvent::NetworkChange));
    }

    #[test]
    fn events_without_a_provider_are_silent_errors() {
        let f = fixture(false);
        let err = f.router.activate(CapabilityEvent::Shake).unwrap_err();
        assert!(err.is_silent());
        assert!(!f.router.is_active(CapabilityEvent::Shake));
    }

    #[test]
    fn location_needs_consent_and_permission() {
        let f = fixture(false);
        f.permissions.grant(Permission::FineLocation);
        f.router.activate(CapabilityEvent::LocationChange).unwrap();
        assert_eq!(f.location.feed().subscribe_count(), 0);

        f.location_provider.set_allow_location_services(true);
        f.permissions.replace(PermissionSet::new());
        f.router.activate(CapabilityEvent::LocationChange).unwrap();
        assert_eq!(f.location.feed().subscribe_count(), 0);

        f.permissions.grant(Permission::CoarseLocation);
        f.router.activate(CapabilityEvent::LocationChange).unwrap();
        assert_eq!(f.location.feed().subscribe_count(), 1);
    }

    #[test]
    fn location_deactivation_is_not_gated() {
        let f = fixture(true);
        f.permissions.grant(Permission::FineLocation);
        f.router.activate(CapabilityEvent::LocationChange).unwrap();
        assert!(f.location.feed().is_subscribed());

        f.location_provider.set_allow_location_services(false);
        f.permissions.replace(PermissionSet::new());
        f.router.deactivate(CapabilityEvent::LocationChange).unwrap();
        assert!(!f.location.feed().is_subscribed());
    }
}
