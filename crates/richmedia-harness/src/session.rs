// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scripted bridge session: initial state, ready, stream activation, source
// activity from background tasks, creative calls, teardown.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use richmedia_core::config::BridgeConfig;
use richmedia_core::error::{BridgeError, Result};
use richmedia_core::types::{Location, NetworkType, Orientation, PermissionSet, Rect, Size, Tilt};

use richmedia_bridge::manual::{ManualDisplay, ManualLocation, ManualNetwork, ManualSensor};
use richmedia_bridge::permissions::GrantedPermissions;
use richmedia_bridge::sources::CapabilitySources;
use richmedia_bridge::{Coordinator, platform_host};

use crate::host::SimulatedHost;
use crate::surface::ConsoleSurface;

/// Streams activated at the start of every session.
const STREAMS: [&str; 6] = [
    "networkChange",
    "orientationChange",
    "locationChange",
    "shake",
    "tiltChange",
    "headingChange",
];

/// 2026-01-01T00:00:00Z in milliseconds.
const EVENT_START_MS: i64 = 1_767_225_600_000;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Device pixels per dip passed to the initial state.
    pub scale: f32,
    /// Content bounds in device pixels.
    pub bounds: Rect,
    /// Screen size in device pixels.
    pub screen: Size,
    /// Number of updates each simulated source emits.
    pub ticks: u32,
    /// Pause between simulated updates.
    pub tick: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            scale: 2.0,
            bounds: Rect::new(0, 0, 640, 100),
            screen: Size::new(720, 1280),
            ticks: 3,
            tick: Duration::from_millis(50),
        }
    }
}

/// What happened during a session.
#[derive(Debug, Clone, Default)]
pub struct SessionSummary {
    pub scripts: usize,
    pub stopped: Vec<&'static str>,
    pub teardown_failures: usize,
    pub host_actions: Vec<String>,
    pub events_created: usize,
    pub reminders_created: usize,
    pub scripts_after_teardown: usize,
}

struct Sources {
    display: Arc<ManualDisplay>,
    network: Arc<ManualNetwork>,
    location: Arc<ManualLocation>,
    sensor: Arc<ManualSensor>,
}

impl Sources {
    fn new(options: &SessionOptions) -> Self {
        Self {
            display: Arc::new(ManualDisplay::new(options.screen, options.scale)),
            network: Arc::new(ManualNetwork::new(NetworkType::Wifi)),
            location: Arc::new(ManualLocation::new()),
            sensor: Arc::new(ManualSensor::new()),
        }
    }

    fn capability_sources(&self) -> CapabilitySources {
        CapabilitySources {
            display: self.display.clone(),
            network: self.network.clone(),
            location: self.location.clone(),
            sensor: self.sensor.clone(),
        }
    }
}

pub async fn run_session(
    config: &BridgeConfig,
    surface: Arc<ConsoleSurface>,
    options: SessionOptions,
) -> Result<SessionSummary> {
    let sources = Sources::new(&options);
    let host = Arc::new(SimulatedHost::new(&["Personal", "Work"]));
    // Desktop hosts grant nothing, so the session grants everything itself.
    let services = platform_host()
        .with_permissions(Arc::new(GrantedPermissions::new(PermissionSet::all())))
        .with_intents(host.clone())
        .with_calendar(host.clone())
        .with_picker(host.clone());

    let coordinator = Coordinator::new(
        surface.clone(),
        sources.capability_sources(),
        services,
        config,
    )?;
    info!(supports = ?coordinator.supports().tags(), "session starting");

    coordinator.init(options.scale)?;
    coordinator.ready()?;
    for stream in STREAMS {
        coordinator.activate(stream);
    }

    drive_sources(&sources, &options).await?;
    creative_calls(&coordinator, &host);

    let report = coordinator.stop_all_listeners();
    let scripts = surface.count();

    // Nothing may reach the content once listeners are stopped.
    sources.network.set(NetworkType::Offline);
    sources.sensor.shake();
    let scripts_after_teardown = surface.count() - scripts;
    if scripts_after_teardown > 0 {
        warn!(scripts_after_teardown, "content received scripts after teardown");
    }

    Ok(SessionSummary {
        scripts,
        stopped: report.stopped,
        teardown_failures: report.failed.len(),
        host_actions: host.actions(),
        events_created: host.events().len(),
        reminders_created: host.reminders().len(),
        scripts_after_teardown,
    })
}

/// Feed every manual source from its own task, as OS callbacks would.
async fn drive_sources(sources: &Sources, options: &SessionOptions) -> Result<()> {
    let ticks = options.ticks;
    let tick = options.tick;

    let network = sources.network.clone();
    let network_task: JoinHandle<()> = tokio::spawn(async move {
        let cycle = [NetworkType::Cell, NetworkType::Offline, NetworkType::Wifi];
        for step in 0..ticks {
            tokio::time::sleep(tick).await;
            network.set(cycle[step as usize % cycle.len()]);
        }
    });

    let sensor = sources.sensor.clone();
    let sensor_task: JoinHandle<()> = tokio::spawn(async move {
        for step in 0..ticks {
            tokio::time::sleep(tick).await;
            let lean = step as f32 * 0.5;
            sensor.tilt(Tilt {
                x: lean,
                y: -lean,
                z: 9.81,
            });
            sensor.heading(step as f32 * 0.75);
            if step % 2 == 0 {
                sensor.shake();
            }
        }
    });

    let display = sources.display.clone();
    let screen = options.screen;
    let display_task: JoinHandle<()> = tokio::spawn(async move {
        for step in 0..ticks {
            tokio::time::sleep(tick).await;
            let orientation = Orientation::from_quarter_turns(step as i32 + 1);
            let rotated = match orientation {
                Orientation::Deg90 | Orientation::Deg270 => Size::new(screen.height, screen.width),
                _ => screen,
            };
            display.rotate(orientation, rotated);
        }
    });

    let location = sources.location.clone();
    let location_task: JoinHandle<()> = tokio::spawn(async move {
        for step in 0..ticks {
            tokio::time::sleep(tick).await;
            location.fix(Location {
                lat: 51.5072 + f64::from(step) * 0.001,
                lon: -0.1276,
                acc: 25.0,
            });
        }
    });

    tokio::try_join!(network_task, sensor_task, display_task, location_task)
        .map_err(|e| BridgeError::Source(format!("simulated source task failed: {e}")))?;
    Ok(())
}

/// Calls a creative would make through the bridge.
fn creative_calls(coordinator: &Coordinator, host: &SimulatedHost) {
    let calls: [(&str, &str, Vec<Value>); 7] = [
        ("display", "getSize", vec![]),
        ("display", "setMaxSize", vec![json!(300), json!(500)]),
        ("utility", "makeCall", vec![json!("+44 20 7946 0000")]),
        ("utility", "makeCall", vec![json!("not a number")]),
        ("utility", "sendMail", vec![json!("offers@example.com"), json!("Your coupon")]),
        ("utility", "sendSMS", vec![json!("5550100"), json!("STOP")]),
        ("assets", "list", vec![]),
    ];
    for (channel, operation, args) in calls {
        let value = coordinator.handle_call(channel, operation, &args);
        info!(channel, operation, ?value, "creative call");
    }

    // Two calendars on the simulated device: the chooser is answered with
    // the first one.
    let request = coordinator.handle_call(
        "utility",
        "createEvent",
        &[json!(EVENT_START_MS), json!("Product launch"), json!("Doors at 7")],
    );
    info!(?request, "createEvent");
    for pending in host.take_pending() {
        answer_chooser(coordinator, pending);
    }
}

fn answer_chooser(coordinator: &Coordinator, request: Uuid) {
    match coordinator.select_calendar(request, 0) {
        Ok(outcome) => info!(%request, ?outcome, "calendar chosen"),
        Err(e) => warn!(%request, error = %e, "calendar selection failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick() -> SessionOptions {
        SessionOptions {
            ticks: 4,
            tick: Duration::from_millis(1),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn scripted_session_runs_end_to_end() {
        let surface = Arc::new(ConsoleSurface::new(Rect::new(0, 0, 640, 100), false));
        let config = BridgeConfig {
            allow_location_services: true,
            ..Default::default()
        };
        let summary = run_session(&config, surface.clone(), quick()).await.unwrap();

        let scripts = surface.scripts();
        assert!(scripts[0].starts_with("window.ormmaview.fireChangeEvent({\"state\":\"default\""));
        assert!(scripts[0].contains(r#""supports":["level-1","level-2","screen","orientation","network","location","sms","phone","calendar","video","audio","map","email"]"#));
        assert_eq!(scripts[1], r#"Ormma.setState("default");"#);
        assert_eq!(scripts[2], "ORMMAReady();");
        assert!(scripts.iter().any(|s| s == "Ormma.gotShake();"));
        assert!(scripts.iter().any(|s| s.contains(r#""location":{"lat":51.5072"#)));
        assert_eq!(
            scripts
                .iter()
                .filter(|s| s.as_str() == r#"Ormma.fireError("makeCall","Bad Phone Number");"#)
                .count(),
            1
        );

        assert_eq!(summary.stopped.len(), 5);
        assert_eq!(summary.teardown_failures, 0);
        assert_eq!(summary.scripts_after_teardown, 0);
        assert_eq!(summary.events_created, 1);
        assert_eq!(summary.reminders_created, 1);
        assert_eq!(
            summary.host_actions,
            vec![
                "dial tel:+44 20 7946 0000",
                "mail to offers@example.com: Your coupon",
                "sms to 5550100: STOP",
            ]
        );
    }

    #[tokio::test]
    async fn location_stays_off_without_consent() {
        let surface = Arc::new(ConsoleSurface::new(Rect::new(0, 0, 640, 100), false));
        run_session(&BridgeConfig::default(), surface.clone(), quick())
            .await
            .unwrap();
        let scripts = surface.scripts();
        assert!(!scripts[0].contains(r#""location""#));
        assert!(!scripts.iter().any(|s| s.contains(r#""location":{"#)));
    }
}
