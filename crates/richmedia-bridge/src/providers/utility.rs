// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Utility channel: stream control plus host actions (SMS, mail, calls and
// calendar events). It serves no notification streams of its own.

use std::sync::Arc;

use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use richmedia_core::error::{BridgeError, Result};
use richmedia_core::types::CapabilityEvent;

use super::{
    CapabilityProvider, DisplayProvider, ProviderSnapshot, arg_i64, arg_optional, arg_required,
    arg_str, unserved,
};
use crate::calendar::{CalendarService, EventDraft, EventOutcome};
use crate::host::{BAD_PHONE_NUMBER, HostIntents, tel_url, validate_mail_recipient};
use crate::router::EventRouter;

const OPERATIONS: &[&str] = &[
    "activate",
    "deactivate",
    "sendSMS",
    "sendMail",
    "makeCall",
    "createEvent",
    "setMaxSize",
];

pub struct UtilityProvider {
    router: Arc<EventRouter>,
    display: Arc<DisplayProvider>,
    intents: Arc<dyn HostIntents>,
    calendar: CalendarService,
}

impl UtilityProvider {
    pub fn new(
        router: Arc<EventRouter>,
        display: Arc<DisplayProvider>,
        intents: Arc<dyn HostIntents>,
        calendar: CalendarService,
    ) -> Self {
        Self {
            router,
            display,
            intents,
            calendar,
        }
    }

    pub fn send_sms(&self, recipient: &str, body: &str) -> Result<()> {
        info!(recipient, "sending SMS");
        self.intents.send_sms(recipient, body)
    }

    pub fn send_mail(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        validate_mail_recipient(recipient)?;
        info!(recipient, "composing mail");
        self.intents.send_mail(recipient, subject, body)
    }

    /// Dial `number`. A malformed number aborts before the host is involved.
    pub fn make_call(&self, number: &str) -> Result<()> {
        let url = tel_url(number)?;
        info!(%url, "placing call");
        self.intents.dial(&url)
    }

    pub fn create_event(&self, draft: EventDraft) -> Result<EventOutcome> {
        self.calendar.create_event(draft)
    }

    /// Host callback once the user picked a calendar.
    pub fn select_calendar(&self, request: Uuid, index: usize) -> Result<EventOutcome> {
        self.calendar.select_calendar(request, index)
    }

    /// Host callback when the user dismissed the calendar chooser.
    pub fn cancel_calendar_selection(&self, request: Uuid) -> bool {
        self.calendar.cancel_selection(request)
    }

    pub fn calendar(&self) -> &CalendarService {
        &self.calendar
    }
}

impl CapabilityProvider for UtilityProvider {
    fn name(&self) -> &'static str {
        "utility"
    }

    fn events(&self) -> &'static [CapabilityEvent] {
        &[]
    }

    fn start(&self, event: CapabilityEvent) -> Result<()> {
        Err(unserved(self.name(), event))
    }

    fn stop(&self, event: CapabilityEvent) -> Result<()> {
        Err(unserved(self.name(), event))
    }

    fn stop_all(&self) -> Result<()> {
        Ok(())
    }

    fn is_active(&self, _event: CapabilityEvent) -> bool {
        false
    }

    fn snapshot(&self) -> ProviderSnapshot {
        ProviderSnapshot::Empty
    }

    fn operations(&self) -> &'static [&'static str] {
        OPERATIONS
    }

    fn invoke(&self, operation: &str, args: &[Value]) -> Result<Option<Value>> {
        match operation {
            "activate" => {
                self.router.activate_named(arg_str(operation, args, 0, "event")?)?;
                Ok(None)
            }
            "deactivate" => {
                self.router.deactivate_named(arg_str(operation, args, 0, "event")?)?;
                Ok(None)
            }
            "sendSMS" => {
                let recipient = arg_required(operation, args, 0, "recipient")?;
                let body = arg_optional(operation, args, 1, "body")?;
                self.send_sms(recipient, body)?;
                Ok(None)
            }
            "sendMail" => {
                let recipient = arg_required(operation, args, 0, "recipient")?;
                let subject = arg_optional(operation, args, 1, "subject")?;
                let body = arg_optional(operation, args, 2, "body")?;
                self.send_mail(recipient, subject, body)?;
                Ok(None)
            }
            "makeCall" => {
                let number = arg_str(operation, args, 0, "number")
                    .map_err(|_| BridgeError::validation(operation, BAD_PHONE_NUMBER))?;
                self.make_call(number)?;
                Ok(None)
            }
            "createEvent" => {
                let date = arg_i64(operation, args, 0, "date")?;
                let title = arg_required(operation, args, 1, "title")?;
                let body = arg_optional(operation, args, 2, "body")?;
                match self.create_event(EventDraft::new(date, title, body)?)? {
                    EventOutcome::AwaitingSelection(request) => {
                        Ok(Some(Value::from(request.to_string())))
                    }
                    EventOutcome::Created { .. } | EventOutcome::NoCalendar => Ok(None),
                }
            }
            "setMaxSize" => self.display.invoke(operation, args),
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
    use std::sync::Mutex;

    use serde_json::json;

    use crate::calendar::{CalendarInfo, CalendarPicker, CalendarStore, EventRecord, ReminderRecord};
    use crate::listener::lock;
    use crate::manual::{ManualDisplay, ManualLocation};
    use crate::permissions::GrantedPermissions;
    use crate::protocol::ScriptMessage;
    use crate::providers::LocationProvider;
    use crate::surface::{ContentChannel, RecordingSurface};
    use richmedia_core::config::BridgeConfig;
    use richmedia_core::types::{Rect, Size};

    #[derive(Default)]
    struct FakeHost {
        actions: Mutex<Vec<String>>,
        events: Mutex<Vec<EventRecord>>,
    }

    impl HostIntents for FakeHost {
        fn send_sms(&self, recipient: &str, body: &str) -> Result<()> {
            lock(&self.actions).push(format!("sms {recipient} {body}"));
            Ok(())
        }

        fn send_mail(&self, recipient: &str, subject: &str, _body: &str) -> Result<()> {
            lock(&self.actions).push(format!("mail {recipient} {subject}"));
            Ok(())
        }

        fn dial(&self, tel_url: &str) -> Result<()> {
            lock(&self.actions).push(format!("dial {tel_url}"));
            Ok(())
        }
    }

    impl CalendarStore for FakeHost {
        fn calendars(&self, _uri: &str) -> Result<Vec<CalendarInfo>> {
            Ok(vec![CalendarInfo {
                id: 3,
                display_name: "Personal".into(),
                account: None,
            }])
        }

        fn insert_event(&self, _uri: &str, event: &EventRecord) -> Result<Option<i64>> {
            lock(&self.events).push(event.clone());
            Ok(Some(77))
        }

        fn insert_reminder(&self, _uri: &str, _reminder: &ReminderRecord) -> Result<()> {
            Ok(())
        }
    }

    impl CalendarPicker for FakeHost {
        fn present(&self, _request: Uuid, _calendars: &[CalendarInfo]) -> Result<()> {
            Ok(())
        }
    }

    fn utility() -> (Arc<FakeHost>, Arc<DisplayProvider>, UtilityProvider) {
        let surface = Arc::new(RecordingSurface::new(Rect::new(0, 0, 320, 50)));
        let channel = Arc::new(ContentChannel::new(surface));
        channel.deliver_initial(&ScriptMessage::Ready).unwrap();

        let display = Arc::new(DisplayProvider::new(
            Arc::new(ManualDisplay::new(Size::new(320, 480), 1.0)),
            channel.clone(),
        ));
        let location = Arc::new(LocationProvider::new(
            Arc::new(ManualLocation::new()),
            channel,
            false,
        ));
        let providers: Vec<Arc<dyn CapabilityProvider>> = vec![display.clone(), location.clone()];
        let router = Arc::new(EventRouter::new(
            &providers,
            Arc::new(GrantedPermissions::default()),
            location,
        ));

        let host = Arc::new(FakeHost::default());
        let calendar = CalendarService::new(host.clone(), host.clone(), &BridgeConfig::default()).unwrap();
        let utility = UtilityProvider::new(router, display.clone(), host.clone(), calendar);
        (host, display, utility)
    }

    #[test]
    fn bad_phone_number_aborts_the_call() {
        let (host, _display, utility) = utility();
        for args in [vec![json!("call me")], vec![json!(5551234)], vec![]] {
            match utility.invoke("makeCall", &args) {
                Err(BridgeError::Validation { operation, message }) => {
                    assert_eq!(operation, "makeCall");
                    assert_eq!(message, "Bad Phone Number");
                }
                other => panic!("expected validation failure, got {other:?}"),
            }
        }
        assert!(lock(&host.actions).is_empty());

        utility.invoke("makeCall", &[json!("555-1234")]).unwrap();
        assert_eq!(lock(&host.actions).as_slice(), &["dial tel:555-1234"]);
    }

    #[test]
    fn sms_and_mail_validate_recipients() {
        let (host, _display, utility) = utility();
        assert!(utility.invoke("sendSMS", &[json!(" "), json!("hi")]).is_err());
        assert!(utility.invoke("sendMail", &[json!("nobody"), json!("s")]).is_err());

        utility.invoke("sendSMS", &[json!("5551234"), json!("hi")]).unwrap();
        utility.invoke("sendMail", &[json!("ads@example.com"), json!("Offer")]).unwrap();
        assert_eq!(
            lock(&host.actions).as_slice(),
            &["sms 5551234 hi", "mail ads@example.com Offer"]
        );
    }

    #[test]
    fn create_event_validates_and_inserts() {
        let (host, _display, utility) = utility();
        assert!(utility.invoke("createEvent", &[json!("tomorrow"), json!("Sale")]).is_err());
        assert!(utility.invoke("createEvent", &[json!(1_700_000_000_000i64), json!("")]).is_err());
        assert!(lock(&host.events).is_empty());

        let result = utility
            .invoke("createEvent", &[json!("1700000000000"), json!("Sale"), json!("50% off")])
            .unwrap();
        assert_eq!(result, None);
        let events = lock(&host.events);
        assert_eq!(events[0].calendar_id, 3);
        assert_eq!(events[0].title, "Sale");
        assert_eq!(events[0].description, "50% off");
    }

    #[test]
    fn set_max_size_is_forwarded_to_display() {
        let (_host, display, utility) = utility();
        utility.invoke("setMaxSize", &[json!(200), json!(300)]).unwrap();
        assert_eq!(display.max_size(), Size::new(200, 300));
    }

    #[test]
    fn activate_goes_through_the_router() {
        let (_host, display, utility) = utility();
        utility.invoke("activate", &[json!("orientationChange")]).unwrap();
        assert!(display.is_active(CapabilityEvent::OrientationChange));
        utility.invoke("deactivate", &[json!("orientation-change")]).unwrap();
        assert!(!display.is_active(CapabilityEvent::OrientationChange));

        // Unknown names are ignored, and gated location is a silent no-op.
        utility.invoke("activate", &[json!("keyboard")]).unwrap();
        utility.invoke("activate", &[json!("location-change")]).unwrap();
    }
}
