use std::collections::VecDeque;

use super::types::RawEvent;

/// How long a pump may wait for the platform.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Wait {
    /// Collect what has already been delivered; never suspends.
    Pending,
    /// Suspend until the platform delivers something (or wakes spuriously).
    Block,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PumpStatus {
    Connected,
    /// The display connection is gone; no further events will arrive.
    Disconnected,
}

/// Source of raw platform events.
///
/// Implementations append in delivery order and never reorder or drop;
/// coalescing belongs to the translator.
pub trait EventPump {
    fn pump(&mut self, wait: Wait, queue: &mut VecDeque<RawEvent>) -> PumpStatus;
}

/// Scripted event source for tests and headless hosts.
///
/// Each delivered batch models one wake-up of the platform. A `Pending` pump
/// takes the front batch if one is queued; a `Block` pump also takes the front
/// batch, and an empty batch stands for a spurious wake. Once the script is
/// exhausted a `Block` pump reports a lost connection instead of hanging.
#[derive(Debug, Default)]
pub struct ScriptedPump {
    batches: VecDeque<Vec<RawEvent>>,
    waits: usize,
}

impl ScriptedPump {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues one batch of events delivered together.
    pub fn deliver(&mut self, events: impl IntoIterator<Item = RawEvent>) {
        self.batches.push_back(events.into_iter().collect());
    }

    /// Queues a wake-up that carries no events.
    pub fn spurious_wake(&mut self) {
        self.batches.push_back(Vec::new());
    }

    /// Number of `Block` pumps served so far.
    pub fn waits(&self) -> usize {
        self.waits
    }
}

impl EventPump for ScriptedPump {
    fn pump(&mut self, wait: Wait, queue: &mut VecDeque<RawEvent>) -> PumpStatus {
        if wait == Wait::Block {
            self.waits += 1;
        }

        match (wait, self.batches.pop_front()) {
            (_, Some(batch)) => {
                queue.extend(batch);
                PumpStatus::Connected
            }
            (Wait::Pending, None) => PumpStatus::Connected,
            (Wait::Block, None) => PumpStatus::Disconnected,
        }
    }
}
