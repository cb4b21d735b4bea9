// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Manually driven capability sources.
//
// Desktop builds and tests have no sensors or connectivity broadcasts; these
// sources hold their state in memory and emit whatever the caller feeds
// them, on the caller's thread.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use richmedia_core::error::{BridgeError, Result};
use richmedia_core::types::{Location, NetworkType, Orientation, Size, Tilt};

use crate::listener::lock;
use crate::sources::{
    DisplayChange, DisplaySource, LocationSource, NetworkSource, SensorReading, SensorSource, Sink,
};

/// Subscription bookkeeping for one manual source.
pub struct ManualFeed<T> {
    sink: Mutex<Option<Sink<T>>>,
    subscribes: AtomicUsize,
    unsubscribes: AtomicUsize,
    refuse: AtomicBool,
}

impl<T> Default for ManualFeed<T> {
    fn default() -> Self {
        Self {
            sink: Mutex::new(None),
            subscribes: AtomicUsize::new(0),
            unsubscribes: AtomicUsize::new(0),
            refuse: AtomicBool::new(false),
        }
    }
}

impl<T> ManualFeed<T> {
    /// Push a value to the current subscriber. Returns whether anyone listened.
    pub fn emit(&self, value: T) -> bool {
        // Clone out so the sink runs without the feed lock held.
        let sink = lock(&self.sink).clone();
        match sink {
            Some(sink) => {
                sink(value);
                true
            }
            None => false,
        }
    }

    /// Make the next subscriptions fail, as a source with no hardware would.
    pub fn refuse_subscriptions(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    pub fn subscribe_count(&self) -> usize {
        self.subscribes.load(Ordering::SeqCst)
    }

    pub fn unsubscribe_count(&self) -> usize {
        self.unsubscribes.load(Ordering::SeqCst)
    }

    pub fn is_subscribed(&self) -> bool {
        lock(&self.sink).is_some()
    }

    fn subscribe(&self, sink: Sink<T>) -> Result<()> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(BridgeError::Source("source unavailable".into()));
        }
        self.subscribes.fetch_add(1, Ordering::SeqCst);
        *lock(&self.sink) = Some(sink);
        Ok(())
    }

    fn unsubscribe(&self) {
        self.unsubscribes.fetch_add(1, Ordering::SeqCst);
        *lock(&self.sink) = None;
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

pub struct ManualDisplay {
    screen_size: Mutex<Size>,
    orientation: Mutex<Orientation>,
    density: f32,
    feed: ManualFeed<DisplayChange>,
}

impl ManualDisplay {
    pub fn new(screen_size: Size, density: f32) -> Self {
        Self {
            screen_size: Mutex::new(screen_size),
            orientation: Mutex::new(Orientation::Deg0),
            density,
            feed: ManualFeed::default(),
        }
    }

    /// Rotate the screen and notify the subscriber.
    pub fn rotate(&self, orientation: Orientation, screen_size: Size) -> bool {
        *lock(&self.orientation) = orientation;
        *lock(&self.screen_size) = screen_size;
        self.feed.emit(DisplayChange {
            orientation,
            screen_size,
        })
    }

    pub fn feed(&self) -> &ManualFeed<DisplayChange> {
        &self.feed
    }
}

impl DisplaySource for ManualDisplay {
    fn density(&self) -> f32 {
        self.density
    }

    fn screen_size(&self) -> Size {
        *lock(&self.screen_size)
    }

    fn orientation(&self) -> Orientation {
        *lock(&self.orientation)
    }

    fn subscribe(&self, sink: Sink<DisplayChange>) -> Result<()> {
        self.feed.subscribe(sink)
    }

    fn unsubscribe(&self) {
        self.feed.unsubscribe();
    }
}

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

pub struct ManualNetwork {
    current: Mutex<NetworkType>,
    feed: ManualFeed<NetworkType>,
}

impl ManualNetwork {
    pub fn new(current: NetworkType) -> Self {
        Self {
            current: Mutex::new(current),
            feed: ManualFeed::default(),
        }
    }

    pub fn set(&self, network: NetworkType) -> bool {
        *lock(&self.current) = network;
        self.feed.emit(network)
    }

    pub fn feed(&self) -> &ManualFeed<NetworkType> {
        &self.feed
    }
}

impl NetworkSource for ManualNetwork {
    fn current(&self) -> NetworkType {
        *lock(&self.current)
    }

    fn subscribe(&self, sink: Sink<NetworkType>) -> Result<()> {
        self.feed.subscribe(sink)
    }

    fn unsubscribe(&self) {
        self.feed.unsubscribe();
    }
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct ManualLocation {
    last: Mutex<Option<Location>>,
    feed: ManualFeed<Location>,
}

impl ManualLocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fix(&self, location: Location) -> bool {
        *lock(&self.last) = Some(location);
        self.feed.emit(location)
    }

    pub fn feed(&self) -> &ManualFeed<Location> {
        &self.feed
    }
}

impl LocationSource for ManualLocation {
    fn last_known(&self) -> Option<Location> {
        *lock(&self.last)
    }

    fn subscribe(&self, sink: Sink<Location>) -> Result<()> {
        self.feed.subscribe(sink)
    }

    fn unsubscribe(&self) {
        self.feed.unsubscribe();
    }
}

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct ManualSensor {
    interval: Mutex<Option<Duration>>,
    feed: ManualFeed<SensorReading>,
}

impl ManualSensor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tilt(&self, tilt: Tilt) -> bool {
        self.feed.emit(SensorReading::Acceleration(tilt))
    }

    pub fn heading(&self, radians: f32) -> bool {
        self.feed.emit(SensorReading::Heading(radians))
    }

    pub fn shake(&self) -> bool {
        self.feed.emit(SensorReading::Shake)
    }

    /// Sampling interval requested by the last subscriber.
    pub fn interval(&self) -> Option<Duration> {
        *lock(&self.interval)
    }

    pub fn feed(&self) -> &ManualFeed<SensorReading> {
        &self.feed
    }
}

impl SensorSource for ManualSensor {
    fn subscribe(&self, interval: Duration, sink: Sink<SensorReading>) -> Result<()> {
        self.feed.subscribe(sink)?;
        *lock(&self.interval) = Some(interval);
        Ok(())
    }

    fn unsubscribe(&self) {
        self.feed.unsubscribe();
    }
}
