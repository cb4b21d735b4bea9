// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The content surface (embedded web view) and the serialised channel that
// every provider and the synchroniser write through.
//
// Notifications produced before the initial state has been delivered are
// held in a backlog and flushed right after it, so the creative always sees
// the initial state first.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use richmedia_core::error::Result;
use richmedia_core::types::{Rect, SessionState};

use crate::listener::lock;
use crate::protocol::ScriptMessage;

/// Maximum number of notifications held before the initial state.
const BACKLOG_LIMIT: usize = 256;

/// The embedded web view hosting the creative.
pub trait ContentSurface: Send + Sync {
    /// Execute a script statement in the creative's context.
    fn inject_script(&self, script: &str) -> Result<()>;

    /// Bounds of the view in device pixels.
    fn bounds(&self) -> Rect;

    /// Current display state of the creative.
    fn state(&self) -> SessionState {
        SessionState::Default
    }
}

#[derive(Debug, Default)]
struct ChannelState {
    synced: bool,
    backlog: VecDeque<ScriptMessage>,
}

/// Mutex-serialised writer over a [`ContentSurface`].
pub struct ContentChannel {
    surface: Arc<dyn ContentSurface>,
    state: Mutex<ChannelState>,
}

impl ContentChannel {
    pub fn new(surface: Arc<dyn ContentSurface>) -> Self {
        Self {
            surface,
            state: Mutex::new(ChannelState::default()),
        }
    }

    /// Deliver an event-driven message, or hold it until the initial state
    /// has gone out.
    pub fn deliver(&self, message: ScriptMessage) -> Result<()> {
        let mut state = lock(&self.state);
        if !state.synced {
            if state.backlog.len() >= BACKLOG_LIMIT {
                warn!("content backlog full, dropping oldest notification");
                state.backlog.pop_front();
            }
            state.backlog.push_back(message);
            return Ok(());
        }
        self.inject(&message)
    }

    /// Deliver the initial-state message, then flush the backlog.
    pub fn deliver_initial(&self, message: &ScriptMessage) -> Result<()> {
        let mut state = lock(&self.state);
        self.inject(message)?;
        state.synced = true;
        let backlog: Vec<ScriptMessage> = state.backlog.drain(..).collect();
        if !backlog.is_empty() {
            debug!(count = backlog.len(), "flushing notifications held before initial state");
        }
        for held in backlog {
            if let Err(e) = self.inject(&held) {
                warn!(error = %e, "failed to flush held notification");
            }
        }
        Ok(())
    }

    /// Deliver messages back to back with no other write in between.
    pub fn deliver_sequence(&self, messages: &[ScriptMessage]) -> Result<()> {
        let _state = lock(&self.state);
        for message in messages {
            self.inject(message)?;
        }
        Ok(())
    }

    pub fn is_synced(&self) -> bool {
        lock(&self.state).synced
    }

    pub fn backlog_len(&self) -> usize {
        lock(&self.state).backlog.len()
    }

    pub fn bounds(&self) -> Rect {
        self.surface.bounds()
    }

    pub fn session_state(&self) -> SessionState {
        self.surface.state()
    }

    fn inject(&self, message: &ScriptMessage) -> Result<()> {
        let script = message.to_script()?;
        self.surface.inject_script(&script)
    }
}

/// Surface that records every injected script. Used by the harness and by
/// hosts' own tests.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    bounds: Rect,
    scripts: Mutex<Vec<String>>,
}

impl RecordingSurface {
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            scripts: Mutex::new(Vec::new()),
        }
    }

    pub fn scripts(&self) -> Vec<String> {
        lock(&self.scripts).clone()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *lock(&self.scripts))
    }
}

impl ContentSurface for RecordingSurface {
    fn inject_script(&self, script: &str) -> Result<()> {
        lock(&self.scripts).push(script.to_string());
        Ok(())
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use richmedia_core::types::NetworkType;

    fn channel() -> (Arc<RecordingSurface>, ContentChannel) {
        let surface = Arc::new(RecordingSurface::new(Rect::new(0, 0, 320, 50)));
        let channel = ContentChannel::new(surface.clone());
        (surface, channel)
    }

    #[test]
    fn notifications_wait_for_initial_state() {
        let (surface, channel) = channel();
        channel.deliver(ScriptMessage::network(NetworkType::Cell)).unwrap();
        assert!(surface.scripts().is_empty());
        assert_eq!(channel.backlog_len(), 1);

        channel.deliver_initial(&ScriptMessage::Ready).unwrap();
        let scripts = surface.scripts();
        assert_eq!(scripts.len(), 2);
        assert_eq!(scripts[0], "ORMMAReady();");
        assert!(scripts[1].contains(r#""network":"cell""#));
        assert_eq!(channel.backlog_len(), 0);
    }

    #[test]
    fn notifications_after_sync_go_straight_through() {
        let (surface, channel) = channel();
        channel.deliver_initial(&ScriptMessage::Ready).unwrap();
        channel.deliver(ScriptMessage::Shake).unwrap();
        assert_eq!(surface.scripts().last().unwrap(), "Ormma.gotShake();");
    }

    #[test]
    fn backlog_is_bounded() {
        let (_surface, channel) = channel();
        for _ in 0..(BACKLOG_LIMIT + 10) {
            channel.deliver(ScriptMessage::Shake).unwrap();
        }
        assert_eq!(channel.backlog_len(), BACKLOG_LIMIT);
    }

    #[test]
    fn concurrent_writers_never_interleave() {
        let (surface, channel) = channel();
        let channel = Arc::new(channel);
        channel.deliver_initial(&ScriptMessage::Ready).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let channel = Arc::clone(&channel);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        channel.deliver(ScriptMessage::Shake).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let scripts = surface.scripts();
        assert_eq!(scripts.len(), 201);
        assert!(scripts[1..].iter().all(|s| s == "Ormma.gotShake();"));
    }
}
