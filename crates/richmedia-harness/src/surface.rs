// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Content surface that prints every injected script.

use std::sync::Mutex;

use richmedia_core::error::Result;
use richmedia_core::types::Rect;

use richmedia_bridge::ContentSurface;
use richmedia_bridge::listener::lock;

pub struct ConsoleSurface {
    bounds: Rect,
    echo: bool,
    scripts: Mutex<Vec<String>>,
}

impl ConsoleSurface {
    /// `echo` prints each script to stdout as it arrives.
    pub fn new(bounds: Rect, echo: bool) -> Self {
        Self {
            bounds,
            echo,
            scripts: Mutex::new(Vec::new()),
        }
    }

    pub fn scripts(&self) -> Vec<String> {
        lock(&self.scripts).clone()
    }

    pub fn count(&self) -> usize {
        lock(&self.scripts).len()
    }
}

impl ContentSurface for ConsoleSurface {
    fn inject_script(&self, script: &str) -> Result<()> {
        let mut scripts = lock(&self.scripts);
        if self.echo {
            println!("[{:>3}] {script}", scripts.len());
        }
        scripts.push(script.to_string());
        Ok(())
    }

    fn bounds(&self) -> Rect {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_recording_after_a_writer_panicked() {
        let surface = ConsoleSurface::new(Rect::default(), false);
        surface.inject_script("ORMMAReady();").unwrap();

        let poisoned = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = surface.scripts.lock().unwrap();
            panic!("writer died holding the lock");
        }));
        assert!(poisoned.is_err());
        assert!(surface.scripts.is_poisoned());

        surface.inject_script("Ormma.gotShake();").unwrap();
        assert_eq!(surface.count(), 2);
        assert_eq!(surface.scripts()[1], "Ormma.gotShake();");
    }
}
