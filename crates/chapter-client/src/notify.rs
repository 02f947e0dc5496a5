use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::modal::ModalStack;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

/// A transient, non-blocking message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

/// Collects what the user should be told. Toasts queue up until drained by
/// the view; blocking notices go on the modal stack.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    toasts: Arc<Mutex<Vec<Notification>>>,
    modals: ModalStack,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self, message: impl Into<String>) {
        let message = message.into();
        info!(%message, "notify");
        self.push(Level::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "notify");
        self.push(Level::Error, message);
    }

    pub fn modal(&self, message: impl Into<String>) {
        self.modals.open(message);
    }

    pub fn modals(&self) -> &ModalStack {
        &self.modals
    }

    /// Takes every queued toast, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.toasts.lock().unwrap_or_else(|e| e.into_inner()))
    }

    fn push(&self, level: Level, message: String) {
        self.toasts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Notification { level, message });
    }
}
