// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Display geometry and orientation.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use richmedia_core::error::{BridgeError, Result};
use richmedia_core::types::{CapabilityEvent, Orientation, Size};

use super::{CapabilityProvider, ProviderSnapshot, arg_i64, unserved};
use crate::listener::{ListenerSlot, lock};
use crate::protocol::{ChangeProperties, ScriptMessage};
use crate::sources::{DisplayChange, DisplaySource, Sink};
use crate::surface::ContentChannel;

const EVENTS: &[CapabilityEvent] = &[CapabilityEvent::OrientationChange];
const OPERATIONS: &[&str] = &[
    "setMaxSize",
    "getSize",
    "getMaxSize",
    "getScreenSize",
    "getOrientation",
];

/// Geometry in device-independent units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySnapshot {
    pub size: Size,
    pub max_size: Size,
    pub screen_size: Size,
    pub orientation: Orientation,
}

pub struct DisplayProvider {
    source: Arc<dyn DisplaySource>,
    channel: Arc<ContentChannel>,
    configuration: ListenerSlot,
    /// Maximum size set by the creative, in dips.
    max_size: Mutex<Option<Size>>,
}

impl DisplayProvider {
    pub fn new(source: Arc<dyn DisplaySource>, channel: Arc<ContentChannel>) -> Self {
        Self {
            source,
            channel,
            configuration: ListenerSlot::new("orientation-change"),
            max_size: Mutex::new(None),
        }
    }

    /// Current content size in dips.
    pub fn size(&self) -> Size {
        self.channel.bounds().size().to_dips(self.density())
    }

    /// Largest size the creative may grow to; the screen unless overridden.
    pub fn max_size(&self) -> Size {
        lock(&self.max_size).unwrap_or_else(|| self.screen_size())
    }

    pub fn screen_size(&self) -> Size {
        self.source.screen_size().to_dips(self.density())
    }

    pub fn orientation(&self) -> Orientation {
        self.source.orientation()
    }

    pub fn set_max_size(&self, width: i64, height: i64) -> Result<()> {
        let to_dim = |v: i64, name: &str| {
            i32::try_from(v).ok().filter(|v| *v > 0).ok_or_else(|| {
                BridgeError::validation("setMaxSize", format!("{name} must be positive"))
            })
        };
        let size = Size::new(to_dim(width, "width")?, to_dim(height, "height")?);
        info!(width = size.width, height = size.height, "max size set by creative");
        *lock(&self.max_size) = Some(size);
        Ok(())
    }

    fn density(&self) -> f32 {
        let density = self.source.density();
        if density.is_finite() && density > 0.0 {
            density
        } else {
            1.0
        }
    }

    fn sink(&self) -> Sink<DisplayChange> {
        let gate = self.configuration.gate();
        let channel = Arc::clone(&self.channel);
        let density = self.density();
        Arc::new(move |change: DisplayChange| {
            gate.deliver("orientation-change", || {
                channel.deliver(ScriptMessage::change(ChangeProperties {
                    orientation: Some(change.orientation),
                    screen_size: Some(change.screen_size.to_dips(density)),
                    ..Default::default()
                }))
            });
        })
    }
}

impl CapabilityProvider for DisplayProvider {
    fn name(&self) -> &'static str {
        "display"
    }

    fn events(&self) -> &'static [CapabilityEvent] {
        EVENTS
    }

    fn start(&self, event: CapabilityEvent) -> Result<()> {
        if event != CapabilityEvent::OrientationChange {
            return Err(unserved(self.name(), event));
        }
        self.configuration
            .start(|| self.source.subscribe(self.sink()))
            .map(|_| ())
    }

    fn stop(&self, event: CapabilityEvent) -> Result<()> {
        if event != CapabilityEvent::OrientationChange {
            return Err(unserved(self.name(), event));
        }
        self.configuration.stop(|| self.source.unsubscribe());
        Ok(())
    }

    fn stop_all(&self) -> Result<()> {
        if self.configuration.stop(|| self.source.unsubscribe()) {
            debug!("display listener stopped");
        }
        Ok(())
    }

    fn is_active(&self, event: CapabilityEvent) -> bool {
        event == CapabilityEvent::OrientationChange && self.configuration.is_active()
    }

    fn snapshot(&self) -> ProviderSnapshot {
        ProviderSnapshot::Display(DisplaySnapshot {
            size: self.size(),
            max_size: self.max_size(),
            screen_size: self.screen_size(),
            orientation: self.orientation(),
        })
    }

    fn operations(&self) -> &'static [&'static str] {
        OPERATIONS
    }

    fn invoke(&self, operation: &str, args: &[Value]) -> Result<Option<Value>> {
        match operation {
            "setMaxSize" => {
                let width = arg_i64(operation, args, 0, "width")?;
                let height = arg_i64(operation, args, 1, "height")?;
                self.set_max_size(width, height)?;
                Ok(None)
            }
            "getSize" => Ok(Some(serde_json::to_value(self.size())?)),
            "getMaxSize" => Ok(Some(serde_json::to_value(self.max_size())?)),
            "getScreenSize" => Ok(Some(serde_json::to_value(self.screen_size())?)),
            "getOrientation" => Ok(Some(serde_json::to_value(self.orientation())?)),
            _ => Err(BridgeError::OperationNotAllowed {
                channel: self.name().to_string(),
                operation: operation.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manual::ManualDisplay;
    use crate::surface::RecordingSurface;
    use richmedia_core::types::Rect;
    use serde_json::json;

    fn provider() -> (Arc<ManualDisplay>, Arc<RecordingSurface>, DisplayProvider) {
        let source = Arc::new(ManualDisplay::new(Size::new(640, 960), 2.0));
        let surface = Arc::new(RecordingSurface::new(Rect::new(0, 0, 640, 100)));
        let channel = Arc::new(ContentChannel::new(surface.clone()));
        channel.deliver_initial(&ScriptMessage::Ready).unwrap();
        surface.take();
        let provider = DisplayProvider::new(source.clone(), channel);
        (source, surface, provider)
    }

    #[test]
    fn geometry_is_reported_in_dips() {
        let (_source, _surface, provider) = provider();
        assert_eq!(provider.size(), Size::new(320, 50));
        assert_eq!(provider.screen_size(), Size::new(320, 480));
        assert_eq!(provider.max_size(), Size::new(320, 480));
    }

    #[test]
    fn set_max_size_validates_dimensions() {
        let (_source, _surface, provider) = provider();
        provider.invoke("setMaxSize", &[json!(300), json!("400")]).unwrap();
        assert_eq!(provider.max_size(), Size::new(300, 400));

        assert!(provider.invoke("setMaxSize", &[json!(0), json!(400)]).is_err());
        assert!(provider.invoke("setMaxSize", &[json!(-5), json!(400)]).is_err());
        assert!(provider.invoke("setMaxSize", &[json!(300)]).is_err());
        assert!(provider.invoke("setMaxSize", &[json!(300), json!(1i64 << 40)]).is_err());
        assert_eq!(provider.max_size(), Size::new(300, 400));
    }

    #[test]
    fn orientation_changes_reach_content_only_while_active() {
        let (source, surface, provider) = provider();
        source.rotate(Orientation::Deg90, Size::new(960, 640));
        assert!(surface.scripts().is_empty());

        provider.start(CapabilityEvent::OrientationChange).unwrap();
        provider.start(CapabilityEvent::OrientationChange).unwrap();
        assert_eq!(source.feed().subscribe_count(), 1);

        source.rotate(Orientation::Deg270, Size::new(960, 640));
        assert_eq!(
            surface.take(),
            vec![r#"window.ormmaview.fireChangeEvent({"screenSize":{"width":480,"height":320},"orientation":270});"#]
        );

        provider.stop(CapabilityEvent::OrientationChange).unwrap();
        source.rotate(Orientation::Deg0, Size::new(640, 960));
        assert!(surface.scripts().is_empty());
        assert!(!source.feed().is_subscribed());
    }

    #[test]
    fn rejects_events_it_does_not_serve() {
        let (_source, _surface, provider) = provider();
        assert!(matches!(
            provider.start(CapabilityEvent::Shake),
            Err(BridgeError::UnknownEvent(_))
        ));
    }
}
