// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the capability bridge.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Change-notification streams a creative can activate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityEvent {
    NetworkChange,
    LocationChange,
    Shake,
    TiltChange,
    HeadingChange,
    OrientationChange,
}

impl CapabilityEvent {
    pub const ALL: [CapabilityEvent; 6] = [
        Self::NetworkChange,
        Self::LocationChange,
        Self::Shake,
        Self::TiltChange,
        Self::HeadingChange,
        Self::OrientationChange,
    ];

    /// Wire name of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkChange => "network-change",
            Self::LocationChange => "location-change",
            Self::Shake => "shake",
            Self::TiltChange => "tilt-change",
            Self::HeadingChange => "heading-change",
            Self::OrientationChange => "orientation-change",
        }
    }

    /// Parse an event name sent by a creative.
    ///
    /// Matching ignores case and separators, so `networkChange`,
    /// `NetworkChange` and `network-change` all resolve to the same event.
    pub fn parse(name: &str) -> Option<Self> {
        let folded: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match folded.as_str() {
            "networkchange" => Some(Self::NetworkChange),
            "locationchange" => Some(Self::LocationChange),
            "shake" => Some(Self::Shake),
            "tiltchange" => Some(Self::TiltChange),
            "headingchange" => Some(Self::HeadingChange),
            "orientationchange" => Some(Self::OrientationChange),
            _ => None,
        }
    }
}

impl fmt::Display for CapabilityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OS-level permissions that gate advertised features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Permission {
    CoarseLocation,
    FineLocation,
    SendSms,
    CallPhone,
    ReadCalendar,
    WriteCalendar,
}

impl Permission {
    pub const ALL: [Permission; 6] = [
        Self::CoarseLocation,
        Self::FineLocation,
        Self::SendSms,
        Self::CallPhone,
        Self::ReadCalendar,
        Self::WriteCalendar,
    ];

    /// Android manifest permission string.
    pub fn manifest_name(&self) -> &'static str {
        match self {
            Self::CoarseLocation => "android.permission.ACCESS_COARSE_LOCATION",
            Self::FineLocation => "android.permission.ACCESS_FINE_LOCATION",
            Self::SendSms => "android.permission.SEND_SMS",
            Self::CallPhone => "android.permission.CALL_PHONE",
            Self::ReadCalendar => "android.permission.READ_CALENDAR",
            Self::WriteCalendar => "android.permission.WRITE_CALENDAR",
        }
    }
}

/// Snapshot of granted permissions at the moment it was taken.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    granted: BTreeSet<Permission>,
}

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every known permission granted.
    pub fn all() -> Self {
        Permission::ALL.into_iter().collect()
    }

    pub fn grant(&mut self, permission: Permission) {
        self.granted.insert(permission);
    }

    pub fn contains(&self, permission: Permission) -> bool {
        self.granted.contains(&permission)
    }

    /// Coarse or fine location granted.
    pub fn has_any_location(&self) -> bool {
        self.contains(Permission::CoarseLocation) || self.contains(Permission::FineLocation)
    }

    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.granted.iter().copied()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self {
            granted: iter.into_iter().collect(),
        }
    }
}

/// Provider-level opt-ins that sit on top of OS permissions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsentFlags {
    pub allow_location_services: bool,
}

/// Capability tags reported to the creative in `supports`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feature {
    #[serde(rename = "level-1")]
    Level1,
    #[serde(rename = "level-2")]
    Level2,
    #[serde(rename = "screen")]
    Screen,
    #[serde(rename = "orientation")]
    Orientation,
    #[serde(rename = "network")]
    Network,
    #[serde(rename = "location")]
    Location,
    #[serde(rename = "sms")]
    Sms,
    #[serde(rename = "phone")]
    Phone,
    #[serde(rename = "calendar")]
    Calendar,
    #[serde(rename = "video")]
    Video,
    #[serde(rename = "audio")]
    Audio,
    #[serde(rename = "map")]
    Map,
    #[serde(rename = "email")]
    Email,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Level1 => "level-1",
            Self::Level2 => "level-2",
            Self::Screen => "screen",
            Self::Orientation => "orientation",
            Self::Network => "network",
            Self::Location => "location",
            Self::Sms => "sms",
            Self::Phone => "phone",
            Self::Calendar => "calendar",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Map => "map",
            Self::Email => "email",
        }
    }
}

/// Ordered feature advertisement. Order matters to the consumer's parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSet(Vec<Feature>);

impl FeatureSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tag, keeping insertion order. Duplicates are ignored.
    pub fn push(&mut self, feature: Feature) {
        if !self.0.contains(&feature) {
            self.0.push(feature);
        }
    }

    pub fn contains(&self, feature: Feature) -> bool {
        self.0.contains(&feature)
    }

    pub fn tags(&self) -> Vec<&'static str> {
        self.0.iter().map(Feature::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        self.0.iter().copied()
    }
}

/// Network classification reported to the creative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Offline,
    Wifi,
    Cell,
    Unknown,
}

impl NetworkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Offline => "offline",
            Self::Wifi => "wifi",
            Self::Cell => "cell",
            Self::Unknown => "unknown",
        }
    }
}

/// Width and height in a single unit (device pixels or dips).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Convert device pixels to device-independent units.
    pub fn to_dips(self, scale: f32) -> Self {
        Self {
            width: px_to_dips(self.width, scale),
            height: px_to_dips(self.height, scale),
        }
    }
}

/// Position and dimensions of the content surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Convert device pixels to device-independent units, truncating.
    pub fn to_dips(self, scale: f32) -> Self {
        Self {
            x: px_to_dips(self.x, scale),
            y: px_to_dips(self.y, scale),
            width: px_to_dips(self.width, scale),
            height: px_to_dips(self.height, scale),
        }
    }
}

fn px_to_dips(px: i32, scale: f32) -> i32 {
    (px as f32 / scale) as i32
}

/// Screen rotation as reported to the creative, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i32", from = "i32")]
pub enum Orientation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
    Unknown,
}

impl Orientation {
    /// From the number of clockwise quarter turns reported by the display.
    pub fn from_quarter_turns(turns: i32) -> Self {
        match turns.rem_euclid(4) {
            0 => Self::Deg0,
            1 => Self::Deg90,
            2 => Self::Deg180,
            _ => Self::Deg270,
        }
    }

    pub fn degrees(&self) -> i32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
            Self::Unknown => -1,
        }
    }
}

impl From<Orientation> for i32 {
    fn from(value: Orientation) -> Self {
        value.degrees()
    }
}

impl From<i32> for Orientation {
    fn from(value: i32) -> Self {
        match value {
            0 => Self::Deg0,
            90 => Self::Deg90,
            180 => Self::Deg180,
            270 => Self::Deg270,
            _ => Self::Unknown,
        }
    }
}

/// Accelerometer reading in m/s².
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Tilt {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// Device location fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
    /// Horizontal accuracy in metres.
    pub acc: f32,
}

/// Compass heading in radians, as produced by orientation sensors.
pub fn heading_degrees(radians: f32) -> i32 {
    (radians * (180.0 / std::f32::consts::PI)) as i32
}

/// Display state of the creative.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Default,
    Expanded,
    Resized,
    Hidden,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Expanded => "expanded",
            Self::Resized => "resized",
            Self::Hidden => "hidden",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_parsing_ignores_case_and_separators() {
        assert_eq!(
            CapabilityEvent::parse("networkChange"),
            Some(CapabilityEvent::NetworkChange)
        );
        assert_eq!(
            CapabilityEvent::parse("TILT-CHANGE"),
            Some(CapabilityEvent::TiltChange)
        );
        assert_eq!(CapabilityEvent::parse("shake"), Some(CapabilityEvent::Shake));
        assert_eq!(CapabilityEvent::parse("keyboardChange"), None);
        assert_eq!(CapabilityEvent::parse(""), None);
    }

    #[test]
    fn every_event_parses_from_its_wire_name() {
        for event in CapabilityEvent::ALL {
            assert_eq!(CapabilityEvent::parse(event.as_str()), Some(event));
        }
    }

    #[test]
    fn rect_converts_to_dips_by_truncation() {
        let rect = Rect::new(10, 20, 300, 50).to_dips(2.0);
        assert_eq!(rect, Rect::new(5, 10, 150, 25));

        let odd = Rect::new(3, 3, 301, 51).to_dips(1.5);
        assert_eq!(odd, Rect::new(2, 2, 200, 34));
    }

    #[test]
    fn orientation_serializes_as_degrees() {
        assert_eq!(serde_json::to_string(&Orientation::Deg90).unwrap(), "90");
        assert_eq!(serde_json::to_string(&Orientation::Unknown).unwrap(), "-1");
        assert_eq!(Orientation::from_quarter_turns(3), Orientation::Deg270);
        assert_eq!(Orientation::from_quarter_turns(-1), Orientation::Deg270);
    }

    #[test]
    fn feature_set_serializes_tags_in_order() {
        let mut set = FeatureSet::new();
        set.push(Feature::Level1);
        set.push(Feature::Sms);
        set.push(Feature::Level1);
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["level-1","sms"]"#);
    }

    #[test]
    fn heading_converts_radians_to_whole_degrees() {
        assert_eq!(heading_degrees(1.0), 57);
        assert_eq!(heading_degrees(3.0), 171);
        assert_eq!(heading_degrees(-1.0), -57);
        assert_eq!(heading_degrees(0.0), 0);
    }
}
