//! Host-driven timer queue with cancellable handles.
//!
//! Every delayed action (feedback auto-hide, viewport correction retries) is
//! scheduled here and the handle is kept by the state record that owns the
//! action, so exit and detach can cancel what they scheduled. Timers only
//! fire when the host advances the clock.

use std::collections::{BTreeMap, HashMap};

use crate::dom::NodeId;
use crate::overlay::FeedbackSlot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTask {
    /// Hide a feedback label of `surface`.
    HideFeedback { surface: NodeId, slot: FeedbackSlot },
    /// Re-apply viewport correction while `surface` is in fake fullscreen.
    ViewportCorrection { surface: NodeId },
}

impl TimerTask {
    pub fn surface(&self) -> NodeId {
        match *self {
            TimerTask::HideFeedback { surface, .. } => surface,
            TimerTask::ViewportCorrection { surface } => surface,
        }
    }
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    pending: BTreeMap<(u64, TimerId), TimerTask>,
    deadlines: HashMap<TimerId, u64>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now_ms: u64, delay_ms: u64, task: TimerTask) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let deadline = now_ms.saturating_add(delay_ms);
        self.pending.insert((deadline, id), task);
        self.deadlines.insert(id, deadline);
        id
    }

    /// Cancel a pending timer. Returns false if it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.deadlines.remove(&id) {
            Some(deadline) => self.pending.remove(&(deadline, id)).is_some(),
            None => false,
        }
    }

    /// Cancel every pending timer that targets `surface`.
    pub fn cancel_surface(&mut self, surface: NodeId) -> usize {
        let ids: Vec<TimerId> = self
            .pending
            .iter()
            .filter(|(_, task)| task.surface() == surface)
            .map(|(&(_, id), _)| id)
            .collect();
        ids.iter().filter(|&&id| self.cancel(id)).count()
    }

    /// Next timer due at or before `now_ms`, earliest deadline first and
    /// insertion order among equal deadlines.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(u64, TimerTask)> {
        let (&(deadline, id), _) = self.pending.iter().next()?;
        if deadline > now_ms {
            return None;
        }
        self.deadlines.remove(&id);
        let task = self.pending.remove(&(deadline, id))?;
        Some((deadline, task))
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
