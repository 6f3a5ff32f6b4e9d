use crate::events::Event;
use std::collections::VecDeque;
use std::sync::Mutex;

/// An interceptor invoked in registration order for every event before it is
/// queued.
///
/// Middleware may rewrite the event or drop it by returning `None`. This is
/// the supported way to observe or filter the event stream; the client's
/// methods themselves are never patched at runtime.
pub trait Middleware: Send + Sync {
    fn process(&self, event: Event) -> Option<Event>;
}

/// Keeps the most recent events in a bounded in-memory ring for debug
/// inspection, newest first. Events pass through unchanged.
pub struct RecordingMiddleware {
    capacity: usize,
    events: Mutex<VecDeque<Event>>,
}

impl RecordingMiddleware {
    pub const DEFAULT_CAPACITY: usize = 50;

    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            events: Mutex::new(VecDeque::new()),
        }
    }

    /// The recorded events, newest first.
    pub fn recent(&self) -> Vec<Event> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<Event>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for RecordingMiddleware {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl Middleware for RecordingMiddleware {
    fn process(&self, event: Event) -> Option<Event> {
        let mut events = self.lock();
        events.push_front(event.clone());
        events.truncate(self.capacity);
        drop(events);
        Some(event)
    }
}
