// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Narrow contracts for the host's capability sources.
//
// Sources wrap the actual OS integration (display metrics, connectivity
// broadcasts, location updates, accelerometer and compass). They call their
// sink on whatever thread the OS delivers on; providers take care of
// marshalling the result onto the content channel.

use std::sync::Arc;
use std::time::Duration;

use richmedia_core::error::Result;
use richmedia_core::types::{Location, NetworkType, Orientation, Size, Tilt};

/// Callback a source invokes for every update.
pub type Sink<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Screen configuration change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayChange {
    pub orientation: Orientation,
    /// Screen size in device pixels after the change.
    pub screen_size: Size,
}

/// A single reading from the motion sensors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorReading {
    Acceleration(Tilt),
    /// Compass heading in radians.
    Heading(f32),
    Shake,
}

pub trait DisplaySource: Send + Sync {
    /// Device pixels per device-independent unit.
    fn density(&self) -> f32;
    /// Screen size in device pixels.
    fn screen_size(&self) -> Size;
    fn orientation(&self) -> Orientation;
    fn subscribe(&self, sink: Sink<DisplayChange>) -> Result<()>;
    fn unsubscribe(&self);
}

pub trait NetworkSource: Send + Sync {
    fn current(&self) -> NetworkType;
    fn subscribe(&self, sink: Sink<NetworkType>) -> Result<()>;
    fn unsubscribe(&self);
}

pub trait LocationSource: Send + Sync {
    fn last_known(&self) -> Option<Location>;
    fn subscribe(&self, sink: Sink<Location>) -> Result<()>;
    fn unsubscribe(&self);
}

pub trait SensorSource: Send + Sync {
    fn subscribe(&self, interval: Duration, sink: Sink<SensorReading>) -> Result<()>;
    fn unsubscribe(&self);
}

/// Every source a coordinator needs, supplied by the host.
#[derive(Clone)]
pub struct CapabilitySources {
    pub display: Arc<dyn DisplaySource>,
    pub network: Arc<dyn NetworkSource>,
    pub location: Arc<dyn LocationSource>,
    pub sensor: Arc<dyn SensorSource>,
}
