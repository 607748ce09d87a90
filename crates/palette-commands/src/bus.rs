//! Event bus for palette state changes
//!
//! The palette never renders anything itself. A presentation layer
//! subscribes here and re-reads [`crate::PaletteView`] when told something
//! changed.
//!
//! # Example
//!
//! ```rust
//! use palette_commands::bus::{PaletteBus, PaletteEvent};
//!
//! # tokio_test::block_on(async {
//! let bus = PaletteBus::new();
//! let mut subscriber = bus.subscribe();
//! bus.publish(PaletteEvent::Closed);
//! assert_eq!(subscriber.recv().await.unwrap(), PaletteEvent::Closed);
//! # });
//! ```

use tokio::sync::broadcast;

/// Channel capacity for broadcast events
const CHANNEL_CAPACITY: usize = 256;

/// Palette lifecycle events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteEvent {
    /// First results of an opening palette were applied
    Opened { seq: u64 },
    ResultsChanged {
        seq: u64,
        namespace: String,
        count: usize,
    },
    NamespaceChanged { namespace: String },
    /// A nested configuration was pushed
    Drilled { depth: usize },
    /// The previous level was restored
    Popped { depth: usize },
    /// Closed through the cancel path; always followed by `Closed`
    Dismissed,
    Closed,
    /// A superseded resolution finished and was discarded
    StaleDropped { seq: u64 },
}

/// Broadcast bus for [`PaletteEvent`]s.
///
/// Clones share the same channel.
#[derive(Clone, Debug)]
pub struct PaletteBus {
    sender: broadcast::Sender<PaletteEvent>,
}

impl PaletteBus {
    pub fn new() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: PaletteEvent) {
        // No subscribers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PaletteEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for PaletteBus {
    fn default() -> Self {
        Self::new()
    }
}
