//! Event bus for internal, cross-component notifications.
//!
//! Used for things nobody blocks on: a source got marked degraded, a
//! session was evicted, a bridge anchor was created. Request/response flow
//! (batch assembly, detail lookups) does not go through here — this is for
//! observers (logging, metrics, admin tooling) to subscribe to without the
//! assembler itself depending on them.
//!
//! # Example
//!
//! ```
//! use boonscroll::signal::{EventBus, EngineEvent};
//!
//! let bus = EventBus::new();
//! let rx = bus.subscribe::<EngineEvent>();
//!
//! bus.emit(EngineEvent::SourceDegraded { source: "reddit".into(), reason: "timeout".into() });
//!
//! if let Ok(event) = rx.try_recv() {
//!     println!("engine event: {:?}", event);
//! }
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender, unbounded};

/// Central event bus.
#[derive(Debug, Clone)]
pub struct EventBus {
  inner: Arc<Mutex<HashMap<TypeId, Box<dyn Any + Send>>>>,
}

impl EventBus {
  pub fn new() -> Self {
    Self {
      inner: Arc::new(Mutex::new(HashMap::new())),
    }
  }

  /// Subscribe to events of a specific type.
  pub fn subscribe<T: Event + 'static>(&self) -> Receiver<T> {
    let mut inner = self.inner.lock().unwrap();
    let type_id = TypeId::of::<T>();

    let senders: &mut Vec<Sender<T>> = inner
      .entry(type_id)
      .or_insert_with(|| Box::new(Vec::<Sender<T>>::new()))
      .downcast_mut()
      .expect("type mismatch in event bus");

    let (tx, rx) = unbounded();
    senders.push(tx);
    rx
  }

  /// Emit an event to all subscribers, dropping senders whose receiver is gone.
  pub fn emit<T: Event + 'static>(&self, event: T) {
    let mut inner = self.inner.lock().unwrap();
    let type_id = TypeId::of::<T>();

    if let Some(senders) = inner.get_mut(&type_id) {
      let senders: &mut Vec<Sender<T>> =
        senders.downcast_mut().expect("type mismatch in event bus");
      senders.retain(|tx| tx.send(event.clone()).is_ok());
    }
  }
}

impl Default for EventBus {
  fn default() -> Self {
    Self::new()
  }
}

/// Marker trait for anything that can travel over the bus.
pub trait Event: Clone + Send + std::fmt::Debug {}
impl<T> Event for T where T: Clone + Send + std::fmt::Debug {}

/// Engine-level notifications, useful for an embedder's admin/metrics surface.
#[derive(Debug, Clone)]
pub enum EngineEvent {
  /// A source's poll/fetch degraded for the remainder of a session.
  SourceDegraded { source: String, reason: String },

  /// A user's session was evicted (idle timeout or explicit reset).
  SessionEvicted { user: String, reason: EvictionReason },

  /// A bridge anchor was created for an external item.
  BridgeAnchorCreated { item_id: String, anchor_id: String },

  /// A batch was assembled via the tier path (not a filtered path).
  BatchAssembled {
    user: String,
    batch_number: u32,
    item_count: usize,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
  IdleTimeout,
  ExplicitReset,
  NoCache,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn emits_and_receives() {
    let bus = EventBus::new();
    let rx = bus.subscribe::<EngineEvent>();

    bus.emit(EngineEvent::SourceDegraded {
      source: "reddit".into(),
      reason: "timeout".into(),
    });

    let received = rx.try_recv().unwrap();
    match received {
      EngineEvent::SourceDegraded { source, .. } => assert_eq!(source, "reddit"),
      _ => panic!("wrong event type"),
    }
  }

  #[test]
  fn drops_disconnected_subscribers_silently() {
    let bus = EventBus::new();
    {
      let _rx = bus.subscribe::<EngineEvent>();
    }
    // receiver dropped; emit should not panic
    bus.emit(EngineEvent::SessionEvicted {
      user: "alice".into(),
      reason: EvictionReason::IdleTimeout,
    });
  }
}
