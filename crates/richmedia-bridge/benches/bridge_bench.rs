// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for feature advertisement, initial-state rendering
// and creative call dispatch in the richmedia-bridge crate.

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;

use richmedia_bridge::manual::{ManualDisplay, ManualLocation, ManualNetwork, ManualSensor};
use richmedia_bridge::permissions::GrantedPermissions;
use richmedia_bridge::sources::CapabilitySources;
use richmedia_bridge::surface::RecordingSurface;
use richmedia_bridge::{Coordinator, HostServices, compute_advertisement};
use richmedia_core::config::BridgeConfig;
use richmedia_core::types::{ConsentFlags, NetworkType, PermissionSet, Rect, Size};

/// A coordinator over manual sources with every permission granted.
fn coordinator(surface: Arc<RecordingSurface>) -> Coordinator {
    let sources = CapabilitySources {
        display: Arc::new(ManualDisplay::new(Size::new(1080, 1920), 2.625)),
        network: Arc::new(ManualNetwork::new(NetworkType::Wifi)),
        location: Arc::new(ManualLocation::new()),
        sensor: Arc::new(ManualSensor::new()),
    };
    let host =
        HostServices::stub().with_permissions(Arc::new(GrantedPermissions::new(PermissionSet::all())));
    let config = BridgeConfig {
        allow_location_services: true,
        ..Default::default()
    };
    match Coordinator::new(surface, sources, host, &config) {
        Ok(coordinator) => coordinator,
        Err(e) => panic!("coordinator construction failed: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Advertisement with nothing granted and with everything granted.
fn bench_compute_advertisement(c: &mut Criterion) {
    let none = PermissionSet::new();
    let all = PermissionSet::all();
    let consent = ConsentFlags {
        allow_location_services: true,
    };

    c.bench_function("compute_advertisement (no permissions)", |b| {
        b.iter(|| compute_advertisement(black_box(&none), black_box(&consent)));
    });
    c.bench_function("compute_advertisement (all permissions)", |b| {
        b.iter(|| compute_advertisement(black_box(&all), black_box(&consent)));
    });
}

/// Build and inject the initial state into a recording surface.
fn bench_initial_state(c: &mut Criterion) {
    let surface = Arc::new(RecordingSurface::new(Rect::new(0, 0, 1080, 131)));
    let coordinator = coordinator(surface.clone());

    c.bench_function("init (initial state render + inject)", |b| {
        b.iter(|| {
            coordinator.init(black_box(2.625)).unwrap();
            surface.take();
        });
    });
}

/// Dispatch a getter through the registry.
fn bench_dispatch(c: &mut Criterion) {
    let surface = Arc::new(RecordingSurface::new(Rect::new(0, 0, 1080, 131)));
    let coordinator = coordinator(surface);

    c.bench_function("handle_call display.getScreenSize", |b| {
        b.iter(|| coordinator.handle_call(black_box("display"), "getScreenSize", &[]));
    });
    c.bench_function("handle_call utility.activate (already active)", |b| {
        let args = [json!("networkChange")];
        b.iter(|| coordinator.handle_call("utility", "activate", black_box(&args)));
    });
}

criterion_group!(
    benches,
    bench_compute_advertisement,
    bench_initial_state,
    bench_dispatch
);
criterion_main!(benches);
