use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Owns the page scroll lock and the stack of open modals.
///
/// The lock is reference counted: each open modal, and anything else that
/// calls `acquire_scroll_lock`, holds a `ScrollLock` guard, and scrolling
/// comes back only once every guard has been dropped. Nested modals
/// therefore never unlock the page underneath each other.
#[derive(Debug, Clone, Default)]
pub struct ModalStack {
    holders: Arc<AtomicUsize>,
    modals: Arc<Mutex<Vec<Modal>>>,
}

#[derive(Debug)]
struct Modal {
    message: String,
    _lock: ScrollLock,
}

/// Releases its share of the scroll lock on drop.
#[derive(Debug)]
#[must_use = "the scroll lock is released as soon as the guard is dropped"]
pub struct ScrollLock {
    holders: Arc<AtomicUsize>,
}

impl Drop for ScrollLock {
    fn drop(&mut self) {
        self.holders.fetch_sub(1, Ordering::AcqRel);
    }
}

impl ModalStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire_scroll_lock(&self) -> ScrollLock {
        self.holders.fetch_add(1, Ordering::AcqRel);
        ScrollLock {
            holders: Arc::clone(&self.holders),
        }
    }

    pub fn is_scroll_locked(&self) -> bool {
        self.holders.load(Ordering::Acquire) > 0
    }

    /// Opens a modal on top of the stack. Returns the new depth.
    pub fn open(&self, message: impl Into<String>) -> usize {
        let modal = Modal {
            message: message.into(),
            _lock: self.acquire_scroll_lock(),
        };
        let mut modals = self.modals.lock().unwrap_or_else(|e| e.into_inner());
        modals.push(modal);
        modals.len()
    }

    /// Closes the topmost modal and returns its message.
    pub fn dismiss(&self) -> Option<String> {
        let modal = self.modals.lock().unwrap_or_else(|e| e.into_inner()).pop();
        modal.map(|m| m.message)
    }

    pub fn top(&self) -> Option<String> {
        self.modals
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .map(|m| m.message.clone())
    }

    pub fn depth(&self) -> usize {
        self.modals.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
