use eframe::egui;
use std::sync::{Arc, Mutex};
use std::thread;

type ResultSlot<T> = Arc<Mutex<Option<T>>>;

/// One background job whose result the UI picks up on a later frame.
pub struct BackgroundTask<T> {
    // Background thread result (set to Some when finished)
    slot: ResultSlot<T>,
    running: bool,
}

impl<T> Default for BackgroundTask<T> {
    fn default() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            running: false,
        }
    }
}

impl<T: Send + 'static> BackgroundTask<T> {
    /// Start `job` unless one is already running. Returns whether it started.
    pub fn start<F>(&mut self, ctx: &egui::Context, name: &str, job: F) -> bool
    where
        F: FnOnce() -> T + Send + 'static,
    {
        if self.running {
            return false;
        }
        // Fresh slot so a late result from an abandoned job cannot leak in.
        let slot: ResultSlot<T> = Arc::new(Mutex::new(None));
        self.slot = slot.clone();
        let ctx = ctx.clone();
        let spawned = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let value = job();
                if let Ok(mut guard) = slot.lock() {
                    *guard = Some(value);
                }
                ctx.request_repaint();
            });
        match spawned {
            Ok(_) => {
                self.running = true;
                true
            }
            Err(e) => {
                tracing::error!("failed to start {}: {}", name, e);
                false
            }
        }
    }

    /// The finished result, once.
    pub fn take(&mut self) -> Option<T> {
        if !self.running {
            return None;
        }
        let value = self.slot.lock().ok().and_then(|mut g| g.take());
        if value.is_some() {
            self.running = false;
        }
        value
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}
