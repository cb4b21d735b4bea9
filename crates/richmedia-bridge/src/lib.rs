// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>

//! Richmedia: capability bridge between creative content running in an
//! embedded web view and native device capabilities.
//!
//! The [`Coordinator`] owns five capability providers, exposes them to the
//! creative through a channel registry, routes activation requests for the
//! change-notification streams, and synchronises native state into the
//! content surface as injected script.

pub mod calendar;
pub mod coordinator;
pub mod features;
pub mod host;
pub mod lifecycle;
pub mod listener;
pub mod manual;
pub mod permissions;
pub mod protocol;
pub mod providers;
pub mod registry;
pub mod router;
pub mod sources;
pub mod stub;
pub mod surface;
pub mod sync;

#[cfg(target_os = "android")]
pub mod android;

pub use coordinator::Coordinator;
pub use features::compute_advertisement;
pub use host::HostServices;
pub use surface::{ContentChannel, ContentSurface};

/// Host services for the target operating system.
///
/// The calendar picker is UI chrome, so every platform starts with the stub
/// picker; hosts that can present a chooser replace it with
/// [`HostServices::with_picker`].
pub fn platform_host() -> HostServices {
    #[cfg(target_os = "android")]
    {
        // Android: JNI into the hosting Activity for permissions, intents
        // and the calendar content provider.
        let host = std::sync::Arc::new(android::AndroidHost::new());
        let api_level = match host.api_level() {
            Ok(level) => Some(level),
            Err(e) => {
                tracing::warn!(error = %e, "could not read the device API level");
                None
            }
        };
        HostServices {
            permissions: host.clone(),
            intents: host.clone(),
            calendar: host,
            picker: std::sync::Arc::new(stub::StubHost),
            api_level,
        }
    }
    #[cfg(not(target_os = "android"))]
    {
        // DESKTOP/CI: nothing is granted and every host action is unavailable.
        HostServices::stub()
    }
}
