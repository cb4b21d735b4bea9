// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Android host services via JNI.
//
// Requires the Android NDK and targets `aarch64-linux-android` or
// `armv7-linux-androideabi`. Every call goes through the hosting Activity:
// permission checks, intents for SMS/mail/calls, and the calendar content
// provider through its `ContentResolver`.
//
// The calendar chooser is UI and stays on the Java side; the host Activity
// presents it and reports the choice back through
// `Coordinator::select_calendar`.

#![cfg(target_os = "android")]

use std::sync::OnceLock;

use jni::objects::{JObject, JString, JValue};
use jni::{JNIEnv, JavaVM};

use richmedia_core::error::{BridgeError, Result};
use richmedia_core::types::Permission;

use crate::calendar::{CalendarInfo, CalendarStore, EventRecord, ReminderRecord};
use crate::host::HostIntents;
use crate::permissions::PermissionOracle;

/// `PackageManager.PERMISSION_GRANTED`.
const PERMISSION_GRANTED: i32 = 0;

/// `Intent.FLAG_ACTIVITY_NEW_TASK`; intents are started from a non-Activity
/// context when the bridge runs on a source thread.
const FLAG_ACTIVITY_NEW_TASK: i32 = 0x1000_0000;

/// Columns read from the calendars table.
const CALENDAR_COLUMNS: [&str; 3] = ["_id", "displayName", "_sync_account"];

static JAVA_VM: OnceLock<JavaVM> = OnceLock::new();

// ---------------------------------------------------------------------------
// JNI bootstrap helpers
// ---------------------------------------------------------------------------

/// The process-wide `JavaVM`, taken from the NDK context on first use.
fn java_vm() -> Result<&'static JavaVM> {
    if let Some(vm) = JAVA_VM.get() {
        return Ok(vm);
    }
    let ctx = ndk_context::android_context();
    // SAFETY: `ctx.vm()` returns the `JavaVM*` set by the NDK glue code.
    // The pointer is valid for the lifetime of the process.
    let vm = unsafe { JavaVM::from_raw(ctx.vm().cast()) }
        .map_err(|e| BridgeError::Host(format!("failed to obtain JavaVM: {e}")))?;
    Ok(JAVA_VM.get_or_init(|| vm))
}

/// Attach the calling thread. Source callbacks arrive on arbitrary threads,
/// so attachment is permanent.
fn jni_env() -> Result<JNIEnv<'static>> {
    java_vm()?
        .attach_current_thread_permanently()
        .map_err(|e| BridgeError::Host(format!("failed to attach JNI thread: {e}")))
}

/// The hosting `Activity`.
fn activity() -> Result<JObject<'static>> {
    let ctx = ndk_context::android_context();
    let ptr = ctx.context();
    if ptr.is_null() {
        return Err(BridgeError::Host(
            "Android context is null, native activity not initialised".into(),
        ));
    }
    // SAFETY: the NDK guarantees this pointer is a valid global jobject for
    // the hosting Activity.
    Ok(unsafe { JObject::from_raw(ptr.cast()) })
}

fn jni_err(context: &str, e: jni::errors::Error) -> BridgeError {
    BridgeError::Host(format!("{context}: {e}"))
}

// ---------------------------------------------------------------------------
// Host struct
// ---------------------------------------------------------------------------

/// Android implementation of the host services.
///
/// Zero-sized; all state lives on the Java side.
#[derive(Debug, Default)]
pub struct AndroidHost;

impl AndroidHost {
    /// Does not touch JNI; the first call happens lazily.
    pub fn new() -> Self {
        Self
    }

    /// `Build.VERSION.SDK_INT` of the running OS.
    pub fn api_level(&self) -> Result<u32> {
        let mut env = jni_env()?;
        let level = env
            .get_static_field("android/os/Build$VERSION", "SDK_INT", "I")
            .map_err(|e| jni_err("Build.VERSION.SDK_INT", e))?
            .i()
            .map_err(|e| jni_err("SDK_INT->i", e))?;
        u32::try_from(level).map_err(|_| BridgeError::Host(format!("invalid SDK_INT {level}")))
    }
}

// ---------------------------------------------------------------------------
// PermissionOracle: Context.checkCallingOrSelfPermission
// ---------------------------------------------------------------------------

impl PermissionOracle for AndroidHost {
    fn is_granted(&self, permission: Permission) -> bool {
        match check_permission(permission) {
            Ok(granted) => granted,
            Err(e) => {
                tracing::warn!(
                    permission = permission.manifest_name(),
                    error = %e,
                    "Android: permission check failed, treating as denied"
                );
                false
            }
        }
    }
}

fn check_permission(permission: Permission) -> Result<bool> {
    let mut env = jni_env()?;
    let activity = activity()?;
    let j_name = new_string(&mut env, permission.manifest_name())?;
    let result = env
        .call_method(
            &activity,
            "checkCallingOrSelfPermission",
            "(Ljava/lang/String;)I",
            &[JValue::Object(&j_name)],
        )
        .map_err(|e| jni_err("checkCallingOrSelfPermission", e))?
        .i()
        .map_err(|e| jni_err("checkCallingOrSelfPermission->i", e))?;
    Ok(result == PERMISSION_GRANTED)
}

// ---------------------------------------------------------------------------
// HostIntents: SMS composer, mail composer, dialler
// ---------------------------------------------------------------------------

impl HostIntents for AndroidHost {
    fn send_sms(&self, recipient: &str, body: &str) -> Result<()> {
        let mut env = jni_env()?;
        let activity = activity()?;

        let intent = new_intent(&mut env, "android.intent.action.VIEW")?;
        put_string_extra(&mut env, &intent, "address", recipient)?;
        put_string_extra(&mut env, &intent, "sms_body", body)?;
        let j_type = new_string(&mut env, "vnd.android-dir/mms-sms")?;
        env.call_method(
            &intent,
            "setType",
            "(Ljava/lang/String;)Landroid/content/Intent;",
            &[JValue::Object(&j_type)],
        )
        .map_err(|e| jni_err("setType(sms)", e))?;

        start_activity(&mut env, &activity, &intent, "sms")?;
        tracing::info!("Android: SMS composer launched");
        Ok(())
    }

    fn send_mail(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        let mut env = jni_env()?;
        let activity = activity()?;

        let intent = new_intent(&mut env, "android.intent.action.SEND")?;
        let j_type = new_string(&mut env, "plain/text")?;
        env.call_method(
            &intent,
            "setType",
            "(Ljava/lang/String;)Landroid/content/Intent;",
            &[JValue::Object(&j_type)],
        )
        .map_err(|e| jni_err("setType(mail)", e))?;

        // EXTRA_EMAIL takes a String[]
        let j_recipient = new_string(&mut env, recipient)?;
        let recipients = env
            .new_object_array(1, "java/lang/String", &j_recipient)
            .map_err(|e| jni_err("new_object_array(recipients)", e))?;
        let j_key = new_string(&mut env, "android.intent.extra.EMAIL")?;
        env.call_method(
            &intent,
            "putExtra",
            "(Ljava/lang/String;[Ljava/lang/String;)Landroid/content/Intent;",
            &[JValue::Object(&j_key), JValue::Object(&recipients)],
        )
        .map_err(|e| jni_err("putExtra(EXTRA_EMAIL)", e))?;
        put_string_extra(&mut env, &intent, "android.intent.extra.SUBJECT", subject)?;
        put_string_extra(&mut env, &intent, "android.intent.extra.TEXT", body)?;

        start_activity(&mut env, &activity, &intent, "mail")?;
        tracing::info!("Android: mail composer launched");
        Ok(())
    }

    fn dial(&self, tel_url: &str) -> Result<()> {
        let mut env = jni_env()?;
        let activity = activity()?;

        let uri = parse_uri(&mut env, tel_url)?;
        let j_action = new_string(&mut env, "android.intent.action.CALL")?;
        let intent = env
            .new_object(
                "android/content/Intent",
                "(Ljava/lang/String;Landroid/net/Uri;)V",
                &[JValue::Object(&j_action), JValue::Object(&uri)],
            )
            .map_err(|e| jni_err("new Intent(CALL)", e))?;

        start_activity(&mut env, &activity, &intent, "call")?;
        tracing::info!("Android: call placed");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CalendarStore: ContentResolver against the calendar provider
// ---------------------------------------------------------------------------

impl CalendarStore for AndroidHost {
    fn calendars(&self, uri: &str) -> Result<Vec<CalendarInfo>> {
        let mut env = jni_env()?;
        let activity = activity()?;
        let resolver = content_resolver(&mut env, &activity)?;
        let j_uri = parse_uri(&mut env, uri)?;

        let empty = new_string(&mut env, "")?;
        let projection = env
            .new_object_array(CALENDAR_COLUMNS.len() as i32, "java/lang/String", &empty)
            .map_err(|e| jni_err("new_object_array(projection)", e))?;
        for (index, column) in CALENDAR_COLUMNS.iter().enumerate() {
            let j_column = new_string(&mut env, column)?;
            env.set_object_array_element(&projection, index as i32, &j_column)
                .map_err(|e| jni_err("set_object_array_element", e))?;
        }

        let null = JObject::null();
        let cursor = env
            .call_method(
                &resolver,
                "query",
                "(Landroid/net/Uri;[Ljava/lang/String;Ljava/lang/String;[Ljava/lang/String;Ljava/lang/String;)Landroid/database/Cursor;",
                &[
                    JValue::Object(&j_uri),
                    JValue::Object(&projection),
                    JValue::Object(&null),
                    JValue::Object(&null),
                    JValue::Object(&null),
                ],
            )
            .map_err(|e| jni_err("ContentResolver.query(calendars)", e))?
            .l()
            .map_err(|e| jni_err("query->l", e))?;
        if cursor.is_null() {
            tracing::warn!(uri, "Android: calendar provider returned no cursor");
            return Ok(Vec::new());
        }

        let mut calendars = Vec::new();
        loop {
            let has_row = env
                .call_method(&cursor, "moveToNext", "()Z", &[])
                .map_err(|e| jni_err("Cursor.moveToNext", e))?
                .z()
                .map_err(|e| jni_err("moveToNext->z", e))?;
            if !has_row {
                break;
            }
            let id = env
                .call_method(&cursor, "getLong", "(I)J", &[JValue::Int(0)])
                .map_err(|e| jni_err("Cursor.getLong", e))?
                .j()
                .map_err(|e| jni_err("getLong->j", e))?;
            let display_name = cursor_string(&mut env, &cursor, 1)?.unwrap_or_default();
            let account = cursor_string(&mut env, &cursor, 2)?;
            calendars.push(CalendarInfo {
                id,
                display_name,
                account,
            });
        }
        env.call_method(&cursor, "close", "()V", &[])
            .map_err(|e| jni_err("Cursor.close", e))?;

        tracing::debug!(uri, count = calendars.len(), "Android: calendars listed");
        Ok(calendars)
    }

    fn insert_event(&self, uri: &str, event: &EventRecord) -> Result<Option<i64>> {
        let mut env = jni_env()?;
        let activity = activity()?;
        let resolver = content_resolver(&mut env, &activity)?;

        let values = new_content_values(&mut env)?;
        put_long(&mut env, &values, "calendar_id", event.calendar_id)?;
        put_string(&mut env, &values, "title", &event.title)?;
        put_string(&mut env, &values, "description", &event.description)?;
        put_long(&mut env, &values, "dtstart", event.dtstart.timestamp_millis())?;
        put_int(&mut env, &values, "hasAlarm", i32::from(event.has_alarm))?;
        put_long(&mut env, &values, "dtend", event.dtend.timestamp_millis())?;

        let inserted = insert(&mut env, &resolver, uri, &values)?;
        if inserted.is_null() {
            return Ok(None);
        }
        let segment = env
            .call_method(&inserted, "getLastPathSegment", "()Ljava/lang/String;", &[])
            .map_err(|e| jni_err("Uri.getLastPathSegment", e))?
            .l()
            .map_err(|e| jni_err("getLastPathSegment->l", e))?;
        let Some(segment) = java_string(&mut env, segment)? else {
            return Ok(None);
        };
        Ok(segment.parse::<i64>().ok())
    }

    fn insert_reminder(&self, uri: &str, reminder: &ReminderRecord) -> Result<()> {
        let mut env = jni_env()?;
        let activity = activity()?;
        let resolver = content_resolver(&mut env, &activity)?;

        let values = new_content_values(&mut env)?;
        put_long(&mut env, &values, "event_id", reminder.event_id)?;
        put_int(&mut env, &values, "method", reminder.method.provider_value())?;
        put_long(&mut env, &values, "minutes", reminder.minutes)?;
        insert(&mut env, &resolver, uri, &values)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn new_string<'a>(env: &mut JNIEnv<'a>, value: &str) -> Result<JString<'a>> {
    env.new_string(value).map_err(|e| jni_err("new_string", e))
}

/// Convert a possibly-null `java.lang.String` reference.
fn java_string(env: &mut JNIEnv<'_>, obj: JObject<'_>) -> Result<Option<String>> {
    if obj.is_null() {
        return Ok(None);
    }
    let value: String = env
        .get_string(&JString::from(obj))
        .map_err(|e| jni_err("get_string", e))?
        .into();
    Ok(Some(value))
}

fn cursor_string(env: &mut JNIEnv<'_>, cursor: &JObject<'_>, column: i32) -> Result<Option<String>> {
    let obj = env
        .call_method(cursor, "getString", "(I)Ljava/lang/String;", &[JValue::Int(column)])
        .map_err(|e| jni_err("Cursor.getString", e))?
        .l()
        .map_err(|e| jni_err("getString->l", e))?;
    java_string(env, obj)
}

fn parse_uri<'a>(env: &mut JNIEnv<'a>, uri: &str) -> Result<JObject<'a>> {
    let j_uri = new_string(env, uri)?;
    env.call_static_method(
        "android/net/Uri",
        "parse",
        "(Ljava/lang/String;)Landroid/net/Uri;",
        &[JValue::Object(&j_uri)],
    )
    .map_err(|e| jni_err("Uri.parse", e))?
    .l()
    .map_err(|e| jni_err("Uri.parse->l", e))
}

fn content_resolver<'a>(env: &mut JNIEnv<'a>, activity: &JObject<'_>) -> Result<JObject<'a>> {
    env.call_method(
        activity,
        "getContentResolver",
        "()Landroid/content/ContentResolver;",
        &[],
    )
    .map_err(|e| jni_err("getContentResolver", e))?
    .l()
    .map_err(|e| jni_err("getContentResolver->l", e))
}

fn insert<'a>(
    env: &mut JNIEnv<'a>,
    resolver: &JObject<'_>,
    uri: &str,
    values: &JObject<'_>,
) -> Result<JObject<'a>> {
    let j_uri = parse_uri(env, uri)?;
    env.call_method(
        resolver,
        "insert",
        "(Landroid/net/Uri;Landroid/content/ContentValues;)Landroid/net/Uri;",
        &[JValue::Object(&j_uri), JValue::Object(values)],
    )
    .map_err(|e| jni_err("ContentResolver.insert", e))?
    .l()
    .map_err(|e| jni_err("insert->l", e))
}

fn new_intent<'a>(env: &mut JNIEnv<'a>, action: &str) -> Result<JObject<'a>> {
    let j_action = new_string(env, action)?;
    env.new_object(
        "android/content/Intent",
        "(Ljava/lang/String;)V",
        &[JValue::Object(&j_action)],
    )
    .map_err(|e| jni_err("new Intent", e))
}

fn put_string_extra(env: &mut JNIEnv<'_>, intent: &JObject<'_>, key: &str, value: &str) -> Result<()> {
    let j_key = new_string(env, key)?;
    let j_value = new_string(env, value)?;
    env.call_method(
        intent,
        "putExtra",
        "(Ljava/lang/String;Ljava/lang/String;)Landroid/content/Intent;",
        &[JValue::Object(&j_key), JValue::Object(&j_value)],
    )
    .map_err(|e| jni_err("Intent.putExtra", e))?;
    Ok(())
}

fn start_activity(
    env: &mut JNIEnv<'_>,
    activity: &JObject<'_>,
    intent: &JObject<'_>,
    label: &str,
) -> Result<()> {
    env.call_method(
        intent,
        "addFlags",
        "(I)Landroid/content/Intent;",
        &[JValue::Int(FLAG_ACTIVITY_NEW_TASK)],
    )
    .map_err(|e| jni_err("addFlags", e))?;
    env.call_method(
        activity,
        "startActivity",
        "(Landroid/content/Intent;)V",
        &[JValue::Object(intent)],
    )
    .map_err(|e| jni_err(&format!("startActivity({label})"), e))?;
    Ok(())
}

fn new_content_values<'a>(env: &mut JNIEnv<'a>) -> Result<JObject<'a>> {
    env.new_object("android/content/ContentValues", "()V", &[])
        .map_err(|e| jni_err("new ContentValues", e))
}

fn put_string(env: &mut JNIEnv<'_>, values: &JObject<'_>, key: &str, value: &str) -> Result<()> {
    let j_key = new_string(env, key)?;
    let j_value = new_string(env, value)?;
    env.call_method(
        values,
        "put",
        "(Ljava/lang/String;Ljava/lang/String;)V",
        &[JValue::Object(&j_key), JValue::Object(&j_value)],
    )
    .map_err(|e| jni_err("ContentValues.put(String)", e))?;
    Ok(())
}

fn put_long(env: &mut JNIEnv<'_>, values: &JObject<'_>, key: &str, value: i64) -> Result<()> {
    let j_key = new_string(env, key)?;
    let boxed = env
        .call_static_method(
            "java/lang/Long",
            "valueOf",
            "(J)Ljava/lang/Long;",
            &[JValue::Long(value)],
        )
        .map_err(|e| jni_err("Long.valueOf", e))?
        .l()
        .map_err(|e| jni_err("Long.valueOf->l", e))?;
    env.call_method(
        values,
        "put",
        "(Ljava/lang/String;Ljava/lang/Long;)V",
        &[JValue::Object(&j_key), JValue::Object(&boxed)],
    )
    .map_err(|e| jni_err("ContentValues.put(Long)", e))?;
    Ok(())
}

fn put_int(env: &mut JNIEnv<'_>, values: &JObject<'_>, key: &str, value: i32) -> Result<()> {
    let j_key = new_string(env, key)?;
    let boxed = env
        .call_static_method(
            "java/lang/Integer",
            "valueOf",
            "(I)Ljava/lang/Integer;",
            &[JValue::Int(value)],
        )
        .map_err(|e| jni_err("Integer.valueOf", e))?
        .l()
        .map_err(|e| jni_err("Integer.valueOf->l", e))?;
    env.call_method(
        values,
        "put",
        "(Ljava/lang/String;Ljava/lang/Integer;)V",
        &[JValue::Object(&j_key), JValue::Object(&boxed)],
    )
    .map_err(|e| jni_err("ContentValues.put(Integer)", e))?;
    Ok(())
}
