//! Task model: control blocks, per-role scratch state, and the registry.

use tracing::error;

use crate::packet::PacketId;
use crate::types::{Priority, StateFlags, TaskId};

/// Per-role scratch state, the tagged rendition of the two general-purpose
/// registers each task carries. The variant is fixed at construction and
/// selects which behavior the dispatcher invokes; only the fields mutate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorState {
    /// Idle generator: `pattern` follows a shift/XOR recurrence and picks
    /// which device to release; `countdown` is the remaining cycle budget
    /// that sizes the whole run.
    Idle { pattern: u32, countdown: i64 },
    /// Work producer: `dest` alternates between the two handlers; `seq`
    /// is the rotating 1..=26 cursor that refills packet buffers.
    Work { dest: TaskId, seq: i32 },
    /// Packet handler: internal queues of pending work and device packets.
    Handler {
        work_q: Option<PacketId>,
        dev_q: Option<PacketId>,
    },
    /// Device driver: at most one parked packet awaiting forwarding.
    Device { pending: Option<PacketId> },
}

/// Task control block. Registry membership is fixed after initialization;
/// only field values mutate.
#[derive(Debug)]
pub struct Tcb {
    pub id: TaskId,
    pub priority: Priority,
    /// Head of the pending-packet chain for this task.
    pub queue: Option<PacketId>,
    pub state: StateFlags,
    pub behavior: BehaviorState,
    /// Next task in the static registration-order chain
    /// (most-recently-created first). Scan traversal only, never
    /// consulted for priority.
    pub link: Option<TaskId>,
}

/// The fixed set of task control blocks, indexed by small-integer id.
///
/// Slots `1..=TaskId::TABLE_CAPACITY` are addressable; lookups outside the
/// registered set report the bad id and return nothing, letting callers
/// degrade to "no destination task" instead of aborting the run.
#[derive(Debug)]
pub struct TaskTable {
    slots: Vec<Option<Tcb>>,
    /// Head of the static chain: the most recently registered task.
    newest: Option<TaskId>,
}

impl TaskTable {
    pub fn new() -> Self {
        TaskTable {
            slots: (0..=TaskId::TABLE_CAPACITY).map(|_| None).collect(),
            newest: None,
        }
    }

    /// Register a task, linking it ahead of every previously registered
    /// one in the static chain.
    ///
    /// # Panics
    /// Panics if the id is out of table range or already registered;
    /// scenario construction is the only caller and its configurations
    /// are fixed.
    pub fn register(
        &mut self,
        id: TaskId,
        priority: Priority,
        queue: Option<PacketId>,
        state: StateFlags,
        behavior: BehaviorState,
    ) {
        assert!(
            (1..=TaskId::TABLE_CAPACITY).contains(&id.0),
            "task id {} out of table range",
            id.0
        );
        let slot = id.0 as usize;
        assert!(self.slots[slot].is_none(), "task id {} registered twice", id.0);

        self.slots[slot] = Some(Tcb {
            id,
            priority,
            queue,
            state,
            behavior,
            link: self.newest,
        });
        self.newest = Some(id);
    }

    /// The most recently registered task, where dispatch starts.
    pub fn newest(&self) -> Option<TaskId> {
        self.newest
    }

    /// Look up a task by id. Out-of-range or unregistered ids are reported
    /// and yield `None`.
    pub fn find(&self, id: TaskId) -> Option<&Tcb> {
        match self.slots.get(id.0 as usize).and_then(|s| s.as_ref()) {
            Some(tcb) => Some(tcb),
            None => {
                error!(id = id.0, "unknown task id");
                None
            }
        }
    }

    /// Mutable lookup with the same failure reporting as [`find`].
    ///
    /// [`find`]: TaskTable::find
    pub fn find_mut(&mut self, id: TaskId) -> Option<&mut Tcb> {
        match self.slots.get_mut(id.0 as usize).and_then(|s| s.as_mut()) {
            Some(tcb) => Some(tcb),
            None => {
                error!(id = id.0, "unknown task id");
                None
            }
        }
    }

    /// Direct access to a registered task. Unlike [`find`], this is for
    /// engine-internal access to tasks already known to exist.
    ///
    /// # Panics
    /// Panics if the id was never registered.
    ///
    /// [`find`]: TaskTable::find
    pub fn tcb(&self, id: TaskId) -> &Tcb {
        self.slots[id.0 as usize]
            .as_ref()
            .unwrap_or_else(|| panic!("task id {} not registered", id.0))
    }

    /// Mutable counterpart of [`tcb`].
    ///
    /// [`tcb`]: TaskTable::tcb
    pub fn tcb_mut(&mut self, id: TaskId) -> &mut Tcb {
        self.slots[id.0 as usize]
            .as_mut()
            .unwrap_or_else(|| panic!("task id {} not registered", id.0))
    }

    /// Ids of all registered tasks, in id order.
    pub fn ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.slots.iter().filter_map(|s| s.as_ref().map(|t| t.id))
    }
}

impl Default for TaskTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle_state() -> BehaviorState {
        BehaviorState::Idle {
            pattern: 1,
            countdown: 1,
        }
    }

    #[test]
    fn test_static_chain_is_most_recent_first() {
        let mut table = TaskTable::new();
        table.register(TaskId(1), 0, None, StateFlags::RUN, idle_state());
        table.register(TaskId(2), 100, None, StateFlags::RUN, idle_state());
        table.register(TaskId(3), 200, None, StateFlags::RUN, idle_state());

        assert_eq!(table.newest(), Some(TaskId(3)));
        assert_eq!(table.tcb(TaskId(3)).link, Some(TaskId(2)));
        assert_eq!(table.tcb(TaskId(2)).link, Some(TaskId(1)));
        assert_eq!(table.tcb(TaskId(1)).link, None);
    }

    #[test]
    fn test_find_unknown_id_degrades() {
        let mut table = TaskTable::new();
        table.register(TaskId(1), 0, None, StateFlags::RUN, idle_state());

        assert!(table.find(TaskId(7)).is_none());
        assert!(table.find(TaskId(99)).is_none());
        assert!(table.find_mut(TaskId(0)).is_none());
        assert!(table.find(TaskId(1)).is_some());
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn test_double_register_panics() {
        let mut table = TaskTable::new();
        table.register(TaskId(1), 0, None, StateFlags::RUN, idle_state());
        table.register(TaskId(1), 0, None, StateFlags::RUN, idle_state());
    }
}
