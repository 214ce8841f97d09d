//! Scenario definition and builder API.
//!
//! A scenario is the initial configuration of a run: the tasks in
//! registration order, each with its priority, starting state bits,
//! behavior state, and seeded packet queue. [`Scenario::benchmark`]
//! produces the fixed six-task workload whose final counters the
//! benchmark verifies.

use clap::ValueEnum;

use crate::packet::{Packet, PacketKind};
use crate::task::BehaviorState;
use crate::types::{Priority, StateFlags, TaskId};

/// Workload scale selector: the only external configuration surface.
///
/// Each scale fixes the idle task's cycle budget and the exact counter
/// values a faithful implementation must produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Workload {
    /// 10k idle cycles.
    #[default]
    Small,
    /// 100x the small workload.
    Large,
}

impl Workload {
    /// The idle task's cycle countdown, which sizes the whole run.
    pub fn idle_cycles(self) -> i64 {
        match self {
            Workload::Small => 10_000,
            Workload::Large => 1_000_000,
        }
    }

    /// Exact number of packet sends a faithful run performs.
    pub fn expected_queued(self) -> u64 {
        match self {
            Workload::Small => 23_246,
            Workload::Large => 2_326_410,
        }
    }

    /// Exact number of holds a faithful run performs.
    pub fn expected_holds(self) -> u64 {
        match self {
            Workload::Small => 9_297,
            Workload::Large => 930_563,
        }
    }
}

/// Definition of one task for scenario creation.
#[derive(Debug, Clone)]
pub struct TaskDef {
    pub id: TaskId,
    pub priority: Priority,
    /// Starting state bits.
    pub state: StateFlags,
    pub behavior: BehaviorState,
    /// Initial pending-packet queue contents, head first.
    pub packets: Vec<Packet>,
}

/// A complete initial configuration. Tasks are listed in registration
/// order; dispatch starts at the last one.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub tasks: Vec<TaskDef>,
}

/// Builder for constructing scenarios.
#[derive(Default)]
pub struct ScenarioBuilder {
    tasks: Vec<TaskDef>,
}

impl Scenario {
    pub fn builder() -> ScenarioBuilder {
        ScenarioBuilder::default()
    }

    /// The benchmark configuration: an idle generator, a work producer
    /// with two seeded work packets, two handlers with three seeded
    /// device packets each, and two device drivers, at strictly
    /// increasing priorities.
    pub fn benchmark(workload: Workload) -> Scenario {
        let work_packet = || Packet::new(TaskId(0), PacketKind::Work);
        let device_packet = |dev: TaskId| Packet::new(dev, PacketKind::Device);

        Scenario::builder()
            .task(TaskDef {
                id: TaskId::IDLE,
                priority: 0,
                state: StateFlags::RUN,
                behavior: BehaviorState::Idle {
                    pattern: 1,
                    countdown: workload.idle_cycles(),
                },
                packets: Vec::new(),
            })
            .task(TaskDef {
                id: TaskId::WORK,
                priority: 1000,
                state: StateFlags::WAIT_PACKET,
                behavior: BehaviorState::Work {
                    dest: TaskId::HANDLER_A,
                    seq: 0,
                },
                packets: vec![work_packet(), work_packet()],
            })
            .task(TaskDef {
                id: TaskId::HANDLER_A,
                priority: 2000,
                state: StateFlags::WAIT_PACKET,
                behavior: BehaviorState::Handler {
                    work_q: None,
                    dev_q: None,
                },
                packets: vec![
                    device_packet(TaskId::DEVICE_A),
                    device_packet(TaskId::DEVICE_A),
                    device_packet(TaskId::DEVICE_A),
                ],
            })
            .task(TaskDef {
                id: TaskId::HANDLER_B,
                priority: 3000,
                state: StateFlags::WAIT_PACKET,
                behavior: BehaviorState::Handler {
                    work_q: None,
                    dev_q: None,
                },
                packets: vec![
                    device_packet(TaskId::DEVICE_B),
                    device_packet(TaskId::DEVICE_B),
                    device_packet(TaskId::DEVICE_B),
                ],
            })
            .task(TaskDef {
                id: TaskId::DEVICE_A,
                priority: 4000,
                state: StateFlags::WAITING,
                behavior: BehaviorState::Device { pending: None },
                packets: Vec::new(),
            })
            .task(TaskDef {
                id: TaskId::DEVICE_B,
                priority: 5000,
                state: StateFlags::WAITING,
                behavior: BehaviorState::Device { pending: None },
                packets: Vec::new(),
            })
            .build()
    }
}

impl ScenarioBuilder {
    /// Add a task. Registration order is dispatch-chain order, newest
    /// first.
    pub fn task(mut self, def: TaskDef) -> Self {
        self.tasks.push(def);
        self
    }

    /// Build the scenario.
    pub fn build(self) -> Scenario {
        assert!(
            !self.tasks.is_empty(),
            "scenario must have at least one task"
        );
        Scenario { tasks: self.tasks }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benchmark_shape() {
        let scenario = Scenario::benchmark(Workload::Small);
        assert_eq!(scenario.tasks.len(), 6);

        // Registration order is idle-first, so dispatch starts at device B.
        assert_eq!(scenario.tasks[0].id, TaskId::IDLE);
        assert_eq!(scenario.tasks[5].id, TaskId::DEVICE_B);

        // Strictly increasing priorities.
        for pair in scenario.tasks.windows(2) {
            assert!(pair[0].priority < pair[1].priority);
        }

        // Seeded queues: two work packets, three device packets per handler.
        assert_eq!(scenario.tasks[1].packets.len(), 2);
        assert_eq!(scenario.tasks[2].packets.len(), 3);
        assert_eq!(scenario.tasks[3].packets.len(), 3);
        assert!(scenario.tasks[4].packets.is_empty());
        assert!(scenario.tasks[5].packets.is_empty());
    }

    #[test]
    fn test_workload_constants() {
        assert_eq!(Workload::Small.idle_cycles() * 100, Workload::Large.idle_cycles());
        assert_ne!(
            Workload::Small.expected_queued(),
            Workload::Large.expected_queued()
        );
    }

    #[test]
    #[should_panic(expected = "at least one task")]
    fn test_empty_scenario_panics() {
        let _ = Scenario::builder().build();
    }
}
