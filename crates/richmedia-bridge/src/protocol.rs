// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Script-injection protocol consumed by the creative's bridge script.
//
// The function names are fixed by the script side and must not change.
// Payloads are rendered through serde_json so every string is escaped and
// every object is a valid script literal.

use serde::Serialize;

use richmedia_core::error::Result;
use richmedia_core::types::{
    FeatureSet, Location, NetworkType, Orientation, Rect, SessionState, Size, Tilt,
};

const FIRE_CHANGE_EVENT: &str = "window.ormmaview.fireChangeEvent";
const SET_STATE: &str = "Ormma.setState";
const READY: &str = "ORMMAReady";
const FIRE_ERROR: &str = "Ormma.fireError";
const GOT_SHAKE: &str = "Ormma.gotShake";

/// Properties carried by a change event. Absent fields are omitted.
///
/// Field order is the order the creative's parser expects for the initial
/// state message.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<SessionState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screen_size: Option<Size>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_position: Option<Rect>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supports: Option<FeatureSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tilt: Option<Tilt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// One message injected into the content surface.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptMessage {
    Change(Box<ChangeProperties>),
    SetState(SessionState),
    Ready,
    Error { operation: String, message: String },
    Shake,
}

impl ScriptMessage {
    pub fn change(properties: ChangeProperties) -> Self {
        Self::Change(Box::new(properties))
    }

    pub fn network(network: NetworkType) -> Self {
        Self::change(ChangeProperties {
            network: Some(network),
            ..Default::default()
        })
    }

    pub fn tilt(tilt: Tilt) -> Self {
        Self::change(ChangeProperties {
            tilt: Some(tilt),
            ..Default::default()
        })
    }

    pub fn heading(degrees: i32) -> Self {
        Self::change(ChangeProperties {
            heading: Some(degrees),
            ..Default::default()
        })
    }

    pub fn location(location: Location) -> Self {
        Self::change(ChangeProperties {
            location: Some(location),
            ..Default::default()
        })
    }

    pub fn error(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Render the message as a script statement.
    pub fn to_script(&self) -> Result<String> {
        let script = match self {
            Self::Change(properties) => {
                format!("{FIRE_CHANGE_EVENT}({});", serde_json::to_string(properties)?)
            }
            Self::SetState(state) => {
                format!("{SET_STATE}({});", serde_json::to_string(state.as_str())?)
            }
            Self::Ready => format!("{READY}();"),
            Self::Error { operation, message } => format!(
                "{FIRE_ERROR}({},{});",
                serde_json::to_string(operation)?,
                serde_json::to_string(message)?
            ),
            Self::Shake => format!("{GOT_SHAKE}();"),
        };
        Ok(script)
    }
}
