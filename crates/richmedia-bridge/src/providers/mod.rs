// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capability providers: one per device-feature domain.
//
// Every provider owns its source exclusively and exposes the same contract
// to the router, the registry and the lifecycle coordinator.

pub mod display;
pub mod location;
pub mod network;
pub mod sensor;
pub mod utility;

use serde::Serialize;
use serde_json::Value;

use richmedia_core::error::{BridgeError, Result};
use richmedia_core::types::{CapabilityEvent, Location, NetworkType};

pub use display::{DisplayProvider, DisplaySnapshot};
pub use location::LocationProvider;
pub use network::NetworkProvider;
pub use sensor::{SensorProvider, SensorSnapshot};
pub use utility::UtilityProvider;

/// Contract shared by all capability providers.
pub trait CapabilityProvider: Send + Sync {
    /// Short name used in logs and teardown reports.
    fn name(&self) -> &'static str;

    /// Events this provider serves.
    fn events(&self) -> &'static [CapabilityEvent];

    /// Begin emitting notifications for `event`. Safe when already started.
    fn start(&self, event: CapabilityEvent) -> Result<()>;

    /// End notifications for `event`. Safe when already stopped.
    fn stop(&self, event: CapabilityEvent) -> Result<()>;

    /// Stop every stream this provider owns.
    fn stop_all(&self) -> Result<()>;

    fn is_active(&self, event: CapabilityEvent) -> bool;

    /// Current state, without side effects.
    fn snapshot(&self) -> ProviderSnapshot;

    /// Operations the creative may invoke on this provider's channel.
    fn operations(&self) -> &'static [&'static str] {
        &[]
    }

    /// Invoke a whitelisted operation with untrusted arguments.
    fn invoke(&self, operation: &str, _args: &[Value]) -> Result<Option<Value>> {
        Err(BridgeError::OperationNotAllowed {
            channel: self.name().to_string(),
            operation: operation.to_string(),
        })
    }
}

/// State returned by [`CapabilityProvider::snapshot`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProviderSnapshot {
    Display(DisplaySnapshot),
    Network(NetworkType),
    Location(Option<Location>),
    Sensor(SensorSnapshot),
    Empty,
}

/// Reject an event the provider does not serve.
pub(crate) fn unserved(provider: &str, event: CapabilityEvent) -> BridgeError {
    BridgeError::UnknownEvent(format!("{event} is not served by {provider}"))
}

// ---------------------------------------------------------------------------
// Argument validation for calls arriving from the creative
// ---------------------------------------------------------------------------

/// A string argument, trimmed. Missing or non-string values are rejected.
pub(crate) fn arg_str<'a>(
    operation: &str,
    args: &'a [Value],
    index: usize,
    name: &str,
) -> Result<&'a str> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s.trim()),
        Some(_) => Err(BridgeError::validation(operation, format!("{name} must be a string"))),
        None => Err(BridgeError::validation(operation, format!("missing {name}"))),
    }
}

/// A string argument that must not be blank.
pub(crate) fn arg_required<'a>(
    operation: &str,
    args: &'a [Value],
    index: usize,
    name: &str,
) -> Result<&'a str> {
    let value = arg_str(operation, args, index, name)?;
    if value.is_empty() {
        return Err(BridgeError::validation(operation, format!("{name} must not be empty")));
    }
    Ok(value)
}

/// An optional string argument; absent or null becomes empty.
pub(crate) fn arg_optional<'a>(
    operation: &str,
    args: &'a [Value],
    index: usize,
    name: &str,
) -> Result<&'a str> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(""),
        Some(_) => arg_str(operation, args, index, name),
    }
}

/// An integer argument, given either as a JSON number or a numeric string.
pub(crate) fn arg_i64(operation: &str, args: &[Value], index: usize, name: &str) -> Result<i64> {
    let invalid = || BridgeError::validation(operation, format!("{name} must be an integer"));
    match args.get(index) {
        Some(Value::Number(n)) => n.as_i64().ok_or_else(invalid),
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| invalid()),
        Some(_) => Err(invalid()),
        None => Err(BridgeError::validation(operation, format!("missing {name}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_arguments_are_trimmed_and_checked() {
        let args = vec![json!("  5551234 "), json!(42), json!("   ")];
        assert_eq!(arg_str("makeCall", &args, 0, "number").unwrap(), "5551234");
        assert!(matches!(
            arg_str("makeCall", &args, 1, "number"),
            Err(BridgeError::Validation { .. })
        ));
        assert!(arg_required("makeCall", &args, 2, "number").is_err());
        assert!(arg_required("makeCall", &args, 3, "number").is_err());
    }

    #[test]
    fn integers_accept_numbers_and_numeric_strings() {
        let args = vec![
            json!(1_700_000_000_000i64),
            json!("1700000000000"),
            json!("soon"),
            json!(1.5),
        ];
        assert_eq!(arg_i64("createEvent", &args, 0, "date").unwrap(), 1_700_000_000_000);
        assert_eq!(arg_i64("createEvent", &args, 1, "date").unwrap(), 1_700_000_000_000);
        assert!(arg_i64("createEvent", &args, 2, "date").is_err());
        assert!(arg_i64("createEvent", &args, 3, "date").is_err());
    }

    #[test]
    fn optional_strings_default_to_empty() {
        let args = vec![json!(null)];
        assert_eq!(arg_optional("sendSMS", &args, 0, "body").unwrap(), "");
        assert_eq!(arg_optional("sendSMS", &args, 1, "body").unwrap(), "");
    }
}
