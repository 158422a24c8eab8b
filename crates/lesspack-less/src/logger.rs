/*
 * logger.rs
 * Copyright (c) 2025 Lesspack Contributors
 *
 * Process-wide compiler logger.
 *
 * Less exposes one shared logger that implementations and plugins write
 * to and embedders listen on. Listeners are scoped: attaching returns a
 * guard that detaches on drop, so a listener never outlives the
 * compilation it was registered for, error paths included.
 */

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Log channel, lowest to highest severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

/// Receiver for compiler log lines.
pub trait LogListener: Send + Sync {
    fn log(&self, level: Level, message: &str);
}

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(0);
static LISTENERS: Mutex<Vec<(u64, Arc<dyn LogListener>)>> = Mutex::new(Vec::new());

/// Attach a listener to the shared logger.
///
/// The listener receives every line emitted until the returned guard is
/// dropped.
#[must_use = "dropping the guard detaches the listener"]
pub fn add_listener(listener: Arc<dyn LogListener>) -> ListenerGuard {
    let id = NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed);
    LISTENERS.lock().unwrap().push((id, listener));
    ListenerGuard { id }
}

/// Number of currently attached listeners.
pub fn listener_count() -> usize {
    LISTENERS.lock().unwrap().len()
}

/// Detaches its listener on drop.
pub struct ListenerGuard {
    id: u64,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        LISTENERS.lock().unwrap().retain(|(id, _)| *id != self.id);
    }
}

/// Emit a line to every attached listener.
pub fn emit(level: Level, message: &str) {
    // Snapshot so listeners can attach or detach while being called.
    let listeners: Vec<Arc<dyn LogListener>> = LISTENERS
        .lock()
        .unwrap()
        .iter()
        .map(|(_, listener)| listener.clone())
        .collect();

    for listener in listeners {
        listener.log(level, message);
    }
}

pub fn debug(message: &str) {
    emit(Level::Debug, message);
}

pub fn info(message: &str) {
    emit(Level::Info, message);
}

pub fn warn(message: &str) {
    emit(Level::Warn, message);
}

pub fn error(message: &str) {
    emit(Level::Error, message);
}
