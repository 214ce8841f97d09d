//! The dispatch loop and task behaviors.
//!
//! This is the core of the benchmark. [`Simulator`] owns every task
//! control block and packet, selects the current task, classifies its
//! state bits into "invoke behavior" or "scan past", and threads control
//! to whichever task each behavior designates next. The run ends when no
//! task is current, and the two counters it leaves behind are the
//! benchmark's entire output.

use tracing::{info, trace};

use crate::packet::{PacketId, PacketKind, PacketPool};
use crate::scenario::{Scenario, Workload};
use crate::task::{BehaviorState, TaskTable};
use crate::trace::Trace;
use crate::types::{StateFlags, TaskId, BUFSIZE, PACKET_BUF_LEN, PATTERN_MASK, PATTERN_XOR};

/// Final counters of one run, plus the diagnostic trace when one was
/// collected. The counters are the result contract: a faithful
/// implementation reproduces them exactly for each workload scale.
#[derive(Debug)]
pub struct SimulationResult {
    /// Packets successfully handed to a destination task.
    pub queued_packets: u64,
    /// Holds performed across the run.
    pub holds: u64,
    pub trace: Option<Trace>,
}

impl SimulationResult {
    /// Check the counters against the expected constants for `workload`.
    ///
    /// A mismatch is a hard correctness failure: the dispatch core is not
    /// faithful, and there is no recovery path.
    pub fn verify(&self, workload: Workload) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.queued_packets == workload.expected_queued()
                && self.holds == workload.expected_holds(),
            "results incorrect: queued_packets={} holds={}, expected queued_packets={} holds={}",
            self.queued_packets,
            self.holds,
            workload.expected_queued(),
            workload.expected_holds(),
        );
        Ok(())
    }
}

/// The cooperative kernel: task registry, packet arena, and scheduler
/// state for a single run.
pub struct Simulator {
    tasks: TaskTable,
    pool: PacketPool,
    /// The task dispatch is looking at, or `None` once the run is over.
    current: Option<TaskId>,
    /// Id of the task whose behavior is executing; stamped into every
    /// packet it sends.
    active: TaskId,
    queued_packets: u64,
    holds: u64,
    trace: Option<Trace>,
}

impl Simulator {
    /// Build a simulator from an initial configuration. Dispatch starts
    /// at the most recently registered task.
    pub fn new(scenario: Scenario) -> Self {
        let mut tasks = TaskTable::new();
        let mut pool = PacketPool::new();

        for def in scenario.tasks {
            let mut queue = None;
            for packet in def.packets {
                let id = pool.alloc(packet);
                pool.enqueue_tail(&mut queue, id);
            }
            tasks.register(def.id, def.priority, queue, def.state, def.behavior);
        }

        let current = tasks.newest();
        Simulator {
            tasks,
            pool,
            current,
            active: TaskId(0),
            queued_packets: 0,
            holds: 0,
            trace: None,
        }
    }

    /// Collect the diagnostic character trace during the run.
    pub fn with_trace(mut self) -> Self {
        self.trace = Some(Trace::new());
        self
    }

    /// Run the dispatch loop to completion.
    pub fn run(mut self) -> SimulationResult {
        while let Some(cur) = self.current {
            let state = self.tasks.tcb(cur).state;
            let mut pkt = None;

            // A waiting task with a queued packet transitions back to
            // runnable by consuming its queue head. The other runnable
            // states invoke the behavior without a packet; a queued
            // packet outside the waiting state stays queued.
            if state.is_waiting_for_packet() {
                let mut queue = self.tasks.tcb(cur).queue;
                pkt = self.pool.dequeue_head(&mut queue);
                let tcb = self.tasks.tcb_mut(cur);
                tcb.queue = queue;
                tcb.state = if queue.is_none() {
                    StateFlags::RUN
                } else {
                    StateFlags::PACKET
                };
            }

            // Classification of the pre-dequeue state is total: every
            // non-runnable combination is a scan step along the static
            // chain.
            if state.is_runnable() {
                self.active = cur;
                trace!(task = cur.0, state = state.raw(), "invoke");
                if let Some(t) = self.trace.as_mut() {
                    t.record(cur.trace_char());
                }

                let mut behavior = self.tasks.tcb(cur).behavior;
                let next = self.invoke(cur, &mut behavior, pkt);
                self.tasks.tcb_mut(cur).behavior = behavior;
                self.current = next;
            } else {
                trace!(task = cur.0, state = state.raw(), "scan");
                self.current = self.tasks.tcb(cur).link;
            }
        }

        info!(
            queued_packets = self.queued_packets,
            holds = self.holds,
            "simulation finished"
        );

        SimulationResult {
            queued_packets: self.queued_packets,
            holds: self.holds,
            trace: self.trace,
        }
    }

    /// Dispatch to the behavior selected by the task's scratch-state
    /// variant. The state was moved out of the TCB by the caller and is
    /// written back afterwards, so behaviors mutate it freely while the
    /// registry stays borrowable.
    fn invoke(
        &mut self,
        cur: TaskId,
        behavior: &mut BehaviorState,
        pkt: Option<PacketId>,
    ) -> Option<TaskId> {
        match behavior {
            BehaviorState::Idle { pattern, countdown } => self.idle(cur, pattern, countdown),
            BehaviorState::Work { dest, seq } => self.work(cur, dest, seq, pkt),
            BehaviorState::Handler { work_q, dev_q } => self.handler(cur, work_q, dev_q, pkt),
            BehaviorState::Device { pending } => self.device(cur, pending, pkt),
        }
    }

    /// Suspend the current task until a packet arrives. The task stays
    /// current; the dispatcher's classification keeps it from running
    /// until the waiting bit clears.
    fn wait(&mut self, cur: TaskId) -> Option<TaskId> {
        self.tasks.tcb_mut(cur).state.insert(StateFlags::WAITING);
        Some(cur)
    }

    /// Hold the current task and relinquish control to its static-chain
    /// successor.
    fn hold(&mut self, cur: TaskId) -> Option<TaskId> {
        self.holds += 1;
        let tcb = self.tasks.tcb_mut(cur);
        tcb.state.insert(StateFlags::HELD);
        tcb.link
    }

    /// Release a held task. The released task preempts the current one
    /// only on strictly greater priority.
    fn release(&mut self, id: TaskId, cur: TaskId) -> Option<TaskId> {
        let cur_priority = self.tasks.tcb(cur).priority;
        let target = self.tasks.find_mut(id)?;
        target.state.remove(StateFlags::HELD);
        if target.priority > cur_priority {
            Some(id)
        } else {
            Some(cur)
        }
    }

    /// Send a packet to the task its `id` field names, stamping the
    /// sender's id into the packet. An empty destination queue gains the
    /// packet as its head (setting the packet bit, and preempting on
    /// strictly greater priority); a non-empty queue takes it at the
    /// tail with no preemption.
    fn queue_packet(&mut self, pkt: PacketId, cur: TaskId) -> Option<TaskId> {
        let dest = self.pool.get(pkt).id;
        let (dest_priority, dest_queue) = {
            let target = self.tasks.find(dest)?;
            (target.priority, target.queue)
        };

        self.queued_packets += 1;

        let packet = self.pool.get_mut(pkt);
        packet.link = None;
        packet.id = self.active;

        if dest_queue.is_none() {
            let cur_priority = self.tasks.tcb(cur).priority;
            let target = self.tasks.tcb_mut(dest);
            target.queue = Some(pkt);
            target.state.insert(StateFlags::PACKET);
            if dest_priority > cur_priority {
                return Some(dest);
            }
        } else {
            let mut queue = dest_queue;
            self.pool.enqueue_tail(&mut queue, pkt);
            self.tasks.tcb_mut(dest).queue = queue;
        }

        Some(cur)
    }

    /// Idle generator: burns one countdown cycle per invocation, holding
    /// itself when the budget is gone. The pattern register decides which
    /// device to release and evolves by shift (even) or shift-and-XOR
    /// (odd). Ignores any packet.
    fn idle(&mut self, cur: TaskId, pattern: &mut u32, countdown: &mut i64) -> Option<TaskId> {
        *countdown -= 1;
        if *countdown == 0 {
            return self.hold(cur);
        }
        if *pattern & 1 == 0 {
            *pattern = (*pattern >> 1) & PATTERN_MASK;
            self.release(TaskId::DEVICE_A, cur)
        } else {
            *pattern = ((*pattern >> 1) & PATTERN_MASK) ^ PATTERN_XOR;
            self.release(TaskId::DEVICE_B, cur)
        }
    }

    /// Work producer: recirculates each returned work packet to the other
    /// handler, refilling its buffer from the rotating alphabet cursor
    /// and resetting its processing cursor.
    fn work(
        &mut self,
        cur: TaskId,
        dest: &mut TaskId,
        seq: &mut i32,
        pkt: Option<PacketId>,
    ) -> Option<TaskId> {
        let Some(pkt) = pkt else {
            return self.wait(cur);
        };

        *dest = if *dest == TaskId::HANDLER_A {
            TaskId::HANDLER_B
        } else {
            TaskId::HANDLER_A
        };

        let packet = self.pool.get_mut(pkt);
        packet.id = *dest;
        packet.datum = 0;
        for slot in 0..PACKET_BUF_LEN {
            *seq += 1;
            if *seq > 26 {
                *seq = 1;
            }
            packet.buffer[slot] = b'A' + (*seq as u8 - 1);
        }

        self.queue_packet(pkt, cur)
    }

    /// Packet handler: files incoming packets into its work or device
    /// queue by kind, then pairs the head work packet with device packets
    /// one buffer byte at a time. A fully consumed work packet goes back
    /// to its producer; each filled device packet goes to its device.
    fn handler(
        &mut self,
        cur: TaskId,
        work_q: &mut Option<PacketId>,
        dev_q: &mut Option<PacketId>,
        pkt: Option<PacketId>,
    ) -> Option<TaskId> {
        if let Some(incoming) = pkt {
            match self.pool.get(incoming).kind {
                PacketKind::Work => self.pool.enqueue_tail(work_q, incoming),
                PacketKind::Device => self.pool.enqueue_tail(dev_q, incoming),
            }
        }

        if let Some(work_pkt) = *work_q {
            let cursor = self.pool.get(work_pkt).datum;

            if cursor > BUFSIZE as i32 {
                *work_q = self.pool.get(work_pkt).link;
                return self.queue_packet(work_pkt, cur);
            }

            if let Some(dev_pkt) = self.pool.dequeue_head(dev_q) {
                let byte = self.pool.get(work_pkt).buffer[cursor as usize];
                self.pool.get_mut(dev_pkt).datum = byte as i32;
                self.pool.get_mut(work_pkt).datum = cursor + 1;
                return self.queue_packet(dev_pkt, cur);
            }
        }

        self.wait(cur)
    }

    /// Device driver: parks one packet per delivery and holds; once
    /// rescheduled with no packet, forwards the parked one back to the
    /// handler that sent it.
    fn device(
        &mut self,
        cur: TaskId,
        pending: &mut Option<PacketId>,
        pkt: Option<PacketId>,
    ) -> Option<TaskId> {
        match pkt {
            None => match pending.take() {
                Some(parked) => self.queue_packet(parked, cur),
                None => self.wait(cur),
            },
            Some(incoming) => {
                *pending = Some(incoming);
                if let Some(t) = self.trace.as_mut() {
                    let datum = self.pool.get(incoming).datum;
                    t.record((datum as u8) as char);
                }
                self.hold(cur)
            }
        }
    }
}
