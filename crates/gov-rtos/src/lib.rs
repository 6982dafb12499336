#![forbid(unsafe_code)]

//! Scheduling contracts shared by every task in the loop.
//!
//! Two kinds of work exist and they are kept apart at the type level:
//! [`PeriodicTask`]s own `&mut self`, may wait on queues, and suspend once
//! per cycle; [`EdgeHandler`]s are called through `&self` from interrupt
//! context and must only use non-blocking operations.

mod sim;
mod threaded;

pub use sim::{CaptureSink, Dial, PinTrace, ProbePin, SimClock, SimExecutor};
pub use threaded::{TaskHandle, ThreadedExecutor};

/// Higher value runs first when two tasks are released together.
pub type Priority = u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSpec {
    pub name: &'static str,
    pub priority: Priority,
    pub period_ms: u64,
    /// Offset of the first release from executor start.
    pub phase_ms: u64,
}

/// When the task wants to run next, measured from its previous release
/// (absolute, so late cycles do not accumulate drift).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    NextPeriod,
    After(u64),
}

impl Release {
    /// Never zero, otherwise a task could starve everything below it.
    pub fn delay_ms(self, period_ms: u64) -> u64 {
        let ms = match self {
            Release::NextPeriod => period_ms,
            Release::After(ms) => ms,
        };
        ms.max(1)
    }
}

pub trait PeriodicTask: Send {
    fn spec(&self) -> TaskSpec;

    /// One full cycle body. Returns at the task's suspension point.
    fn run_cycle(&mut self) -> Release;
}

/// Asynchronous edge-triggered event producer (a GPIO interrupt).
/// INVARIANT: Must be Non-Blocking.
pub trait EdgeHandler: Send + Sync {
    fn on_edge(&self);
}

/// Deadline accounting for one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleStats {
    pub cycles: u64,
    /// Cycles whose body finished after the following release.
    pub overruns: u64,
    pub worst_case_ms: u64,
}

impl CycleStats {
    pub fn record(&mut self, started_ms: u64, finished_ms: u64, next_release_ms: u64) {
        self.cycles += 1;

        let busy = finished_ms.saturating_sub(started_ms);
        if busy > self.worst_case_ms {
            self.worst_case_ms = busy;
        }

        if finished_ms > next_release_ms {
            self.overruns += 1;
        }
    }
}
