//! schedbench - Deterministic cooperative-kernel scheduler benchmark.
//!
//! A fixed population of six tasks exchanges packets through ready queues
//! under priority-based dispatch until a predetermined amount of simulated
//! work is consumed. The run is bit-for-bit reproducible, and its two
//! final counters (packets queued, holds performed) must match fixed
//! expected values; the whole program is a correctness oracle for the
//! dispatch core.
//!
//! # Architecture
//!
//! - **Engine**: the dispatch loop that classifies task state bits,
//!   invokes behaviors, and threads control between tasks
//! - **Tasks**: control blocks with priority, state bitmask, and tagged
//!   per-role scratch state
//! - **Packets**: arena-allocated message records chained into
//!   singly-linked queues
//! - **Scenario**: initial configuration builder and the canned
//!   benchmark workload
//! - **Trace**: optional diagnostic character stream, the determinism
//!   oracle
//!
//! # Usage
//!
//! ```rust
//! use schedbench::{Scenario, Simulator, Workload};
//!
//! let result = Simulator::new(Scenario::benchmark(Workload::Small)).run();
//! result.verify(Workload::Small).unwrap();
//! ```

pub mod engine;
pub mod packet;
pub mod scenario;
pub mod task;
pub mod trace;
pub mod types;

// Re-export the main public types for convenience.
pub use engine::{SimulationResult, Simulator};
pub use packet::{Packet, PacketId, PacketKind, PacketPool};
pub use scenario::{Scenario, ScenarioBuilder, TaskDef, Workload};
pub use task::{BehaviorState, TaskTable, Tcb};
pub use trace::Trace;
pub use types::{Priority, StateFlags, TaskId};
