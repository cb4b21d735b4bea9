// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// State synchroniser: pushes the initial snapshot and the ready signal into
// the content surface.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use richmedia_core::error::{BridgeError, Result};
use richmedia_core::types::{ConsentFlags, FeatureSet, SessionState};

use crate::features::compute_advertisement;
use crate::permissions::PermissionOracle;
use crate::protocol::{ChangeProperties, ScriptMessage};
use crate::providers::{DisplayProvider, NetworkProvider};
use crate::router::LocationConsent;
use crate::surface::ContentChannel;

pub struct StateSynchronizer {
    channel: Arc<ContentChannel>,
    display: Arc<DisplayProvider>,
    network: Arc<NetworkProvider>,
    permissions: Arc<dyn PermissionOracle>,
    consent: Arc<dyn LocationConsent>,
    initialized: AtomicBool,
}

impl StateSynchronizer {
    pub fn new(
        channel: Arc<ContentChannel>,
        display: Arc<DisplayProvider>,
        network: Arc<NetworkProvider>,
        permissions: Arc<dyn PermissionOracle>,
        consent: Arc<dyn LocationConsent>,
    ) -> Self {
        Self {
            channel,
            display,
            network,
            permissions,
            consent,
            initialized: AtomicBool::new(false),
        }
    }

    /// Feature advertisement for the permissions granted right now.
    pub fn supports(&self) -> FeatureSet {
        let consent = ConsentFlags {
            allow_location_services: self.consent.allows_location_services(),
        };
        compute_advertisement(&self.permissions.snapshot(), &consent)
    }

    /// The one change event carrying the full initial state.
    ///
    /// `scale` converts the content bounds from device pixels into the
    /// default position reported to the creative.
    pub fn build_initial_state(&self, scale: f32) -> Result<ScriptMessage> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(BridgeError::validation(
                "initialize",
                format!("scale must be positive, got {scale}"),
            ));
        }
        Ok(ScriptMessage::change(ChangeProperties {
            state: Some(SessionState::Default),
            network: Some(self.network.network()),
            size: Some(self.display.size()),
            max_size: Some(self.display.max_size()),
            screen_size: Some(self.display.screen_size()),
            default_position: Some(self.channel.bounds().to_dips(scale)),
            orientation: Some(self.display.orientation()),
            supports: Some(self.supports()),
            ..Default::default()
        }))
    }

    /// `setState` with the current state, then the ready signal.
    pub fn build_ready_state(&self) -> [ScriptMessage; 2] {
        [
            ScriptMessage::SetState(self.channel.session_state()),
            ScriptMessage::Ready,
        ]
    }

    pub fn deliver_initial_state(&self, scale: f32) -> Result<()> {
        let message = self.build_initial_state(scale)?;
        self.channel.deliver_initial(&message)?;
        if self.initialized.swap(true, Ordering::SeqCst) {
            debug!("initial state delivered again");
        } else {
            info!(scale, "initial state delivered");
        }
        Ok(())
    }

    /// Fails with `SyncOrder` until the initial state has gone out.
    pub fn deliver_ready_state(&self) -> Result<()> {
        if !self.is_initialized() {
            return Err(BridgeError::SyncOrder(
                "ready state requested before initial state".into(),
            ));
        }
        self.channel.deliver_sequence(&self.build_ready_state())?;
        info!("ready state delivered");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }
}
