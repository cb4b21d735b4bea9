// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Coordinator: owns the providers for one content surface and wires them to
// the registry, the router, the synchroniser and teardown.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use richmedia_core::config::BridgeConfig;
use richmedia_core::error::{BridgeError, Result};
use richmedia_core::types::FeatureSet;

use crate::calendar::{CalendarService, EventOutcome};
use crate::host::HostServices;
use crate::lifecycle::{Lifecycle, TeardownReport};
use crate::protocol::ScriptMessage;
use crate::providers::{
    CapabilityProvider, DisplayProvider, LocationProvider, NetworkProvider, ProviderSnapshot,
    SensorProvider, UtilityProvider,
};
use crate::registry::BridgeRegistry;
use crate::router::EventRouter;
use crate::sources::CapabilitySources;
use crate::surface::{ContentChannel, ContentSurface};
use crate::sync::StateSynchronizer;

pub struct Coordinator {
    channel: Arc<ContentChannel>,
    display: Arc<DisplayProvider>,
    network: Arc<NetworkProvider>,
    location: Arc<LocationProvider>,
    sensor: Arc<SensorProvider>,
    utility: Arc<UtilityProvider>,
    router: Arc<EventRouter>,
    registry: BridgeRegistry,
    sync: StateSynchronizer,
    lifecycle: Lifecycle,
    torn_down: AtomicBool,
}

impl Coordinator {
    /// Build the providers over `sources` and register their channels.
    pub fn new(
        surface: Arc<dyn ContentSurface>,
        sources: CapabilitySources,
        host: HostServices,
        config: &BridgeConfig,
    ) -> Result<Self> {
        config.validate()?;
        let mut config = config.clone();
        if let Some(level) = host.api_level {
            debug!(level, configured = config.host_api_level, "using device API level");
            config.host_api_level = level;
        }
        let channel = Arc::new(ContentChannel::new(surface));

        let display = Arc::new(DisplayProvider::new(sources.display, Arc::clone(&channel)));
        let network = Arc::new(NetworkProvider::new(sources.network, Arc::clone(&channel)));
        let location = Arc::new(LocationProvider::new(
            sources.location,
            Arc::clone(&channel),
            config.allow_location_services,
        ));
        let sensor = Arc::new(SensorProvider::new(
            sources.sensor,
            Arc::clone(&channel),
            Duration::from_millis(config.sensor_interval_ms),
        ));

        let streaming: Vec<Arc<dyn CapabilityProvider>> = vec![
            display.clone(),
            network.clone(),
            location.clone(),
            sensor.clone(),
        ];
        let router = Arc::new(EventRouter::new(
            &streaming,
            Arc::clone(&host.permissions),
            location.clone(),
        ));

        let calendar = CalendarService::new(host.calendar, host.picker, &config)?;
        let utility = Arc::new(UtilityProvider::new(
            Arc::clone(&router),
            Arc::clone(&display),
            host.intents,
            calendar,
        ));

        let mut registry = BridgeRegistry::new();
        registry.register("display", display.clone())?;
        registry.register("network", network.clone())?;
        registry.register("location", location.clone())?;
        registry.register("sensor", sensor.clone())?;
        registry.register("utility", utility.clone())?;

        let sync = StateSynchronizer::new(
            Arc::clone(&channel),
            Arc::clone(&display),
            Arc::clone(&network),
            host.permissions,
            location.clone(),
        );

        let mut providers = streaming;
        providers.push(utility.clone());
        let lifecycle = Lifecycle::new(providers);

        info!(
            api_level = config.host_api_level,
            calendar = utility.calendar().uris().events,
            location_consent = config.allow_location_services,
            "coordinator ready"
        );
        Ok(Self {
            channel,
            display,
            network,
            location,
            sensor,
            utility,
            router,
            registry,
            sync,
            lifecycle,
            torn_down: AtomicBool::new(false),
        })
    }

    /// Push the initial state. Call once the content has loaded.
    pub fn init(&self, scale: f32) -> Result<()> {
        if self.is_torn_down() {
            debug!("init ignored after teardown");
            return Ok(());
        }
        self.sync.deliver_initial_state(scale)
    }

    /// Push `setState` and the ready signal. Fails before [`Self::init`].
    pub fn ready(&self) -> Result<()> {
        if self.is_torn_down() {
            debug!("ready ignored after teardown");
            return Ok(());
        }
        self.sync.deliver_ready_state()
    }

    /// Entry point for `channel.operation(args…)` calls from the creative.
    ///
    /// Unknown channels and events are ignored; every other failure is
    /// reported back to the creative as one `fireError`.
    pub fn handle_call(&self, channel: &str, operation: &str, args: &[Value]) -> Option<Value> {
        if self.is_torn_down() {
            debug!(channel, operation, "call ignored after teardown");
            return None;
        }
        match self.registry.dispatch(channel, operation, args) {
            Ok(value) => value,
            Err(e) => {
                self.report(operation, &e);
                None
            }
        }
    }

    /// Host-side activation of a stream by wire name.
    pub fn activate(&self, event: &str) {
        self.handle_call("utility", "activate", &[Value::from(event)]);
    }

    pub fn deactivate(&self, event: &str) {
        self.handle_call("utility", "deactivate", &[Value::from(event)]);
    }

    pub fn set_allow_location_services(&self, allow: bool) {
        self.location.set_allow_location_services(allow);
    }

    /// Host callback with the calendar the user chose.
    pub fn select_calendar(&self, request: Uuid, index: usize) -> Result<EventOutcome> {
        if self.is_torn_down() {
            debug!(%request, "calendar selection ignored after teardown");
            self.utility.cancel_calendar_selection(request);
            return Err(BridgeError::Calendar(format!(
                "calendar choice {request} arrived after teardown"
            )));
        }
        let outcome = self.utility.select_calendar(request, index);
        if let Err(e) = &outcome {
            self.report("createEvent", e);
        }
        outcome
    }

    pub fn cancel_calendar_selection(&self, request: Uuid) -> bool {
        self.utility.cancel_calendar_selection(request)
    }

    /// Current feature advertisement.
    pub fn supports(&self) -> FeatureSet {
        self.sync.supports()
    }

    /// Snapshot of every provider, keyed by channel name.
    pub fn snapshots(&self) -> Vec<(&'static str, ProviderSnapshot)> {
        vec![
            ("display", self.display.snapshot()),
            ("network", self.network.snapshot()),
            ("location", self.location.snapshot()),
            ("sensor", self.sensor.snapshot()),
        ]
    }

    /// Stop every listener of every provider. Safe to repeat; from then on
    /// calls from content are ignored.
    pub fn stop_all_listeners(&self) -> TeardownReport {
        if self.torn_down.swap(true, Ordering::SeqCst) {
            debug!("listeners already stopped");
        }
        self.lifecycle.stop_all_listeners()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    pub fn channel(&self) -> &Arc<ContentChannel> {
        &self.channel
    }

    pub fn display(&self) -> &Arc<DisplayProvider> {
        &self.display
    }

    pub fn network(&self) -> &Arc<NetworkProvider> {
        &self.network
    }

    pub fn location(&self) -> &Arc<LocationProvider> {
        &self.location
    }

    pub fn sensor(&self) -> &Arc<SensorProvider> {
        &self.sensor
    }

    pub fn router(&self) -> &Arc<EventRouter> {
        &self.router
    }

    pub fn registry(&self) -> &BridgeRegistry {
        &self.registry
    }

    fn report(&self, operation: &str, error: &BridgeError) {
        if error.is_silent() {
            debug!(operation, error = %error, "ignoring call");
            return;
        }
        let (operation, message) = error.content_signal(operation);
        warn!(%operation, %message, "reporting error to content");
        if let Err(e) = self.channel.deliver(ScriptMessage::error(operation, message)) {
            warn!(error = %e, "could not report error to content");
        }
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        if !self.is_torn_down() {
            self.stop_all_listeners();
        }
    }
}
