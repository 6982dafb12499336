use std::cmp::{Ordering as CmpOrdering, Reverse};
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, Ordering};
use std::sync::Arc;

use gov_core::Distance;
use gov_hal::{AnalogInput, DigitalOutput, PlatformClock, TelemetrySink};
use log::trace;
use spin::Mutex;

use crate::{CycleStats, EdgeHandler, PeriodicTask, TaskSpec};

/// Virtual millisecond clock. Only the executor (or a test) moves it.
#[derive(Debug, Default)]
pub struct SimClock {
    now_ms: AtomicU64,
}

impl SimClock {
    pub fn new(start_ms: u64) -> Arc<Self> {
        Arc::new(Self { now_ms: AtomicU64::new(start_ms) })
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }

    /// Moves forward only.
    fn set(&self, ms: u64) {
        self.now_ms.fetch_max(ms, Ordering::SeqCst);
    }
}

impl PlatformClock for SimClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// An interrupt waiting to fire. Ordered so that the BinaryHeap (a max-heap)
/// pops the earliest edge first, FIFO among equal timestamps.
struct ScheduledEdge {
    at_ms: u64,
    seq: u64,
    handler: Arc<dyn EdgeHandler>,
}

impl ScheduledEdge {
    fn key(&self) -> Reverse<(u64, u64)> {
        Reverse((self.at_ms, self.seq))
    }
}

impl PartialEq for ScheduledEdge {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}
impl Eq for ScheduledEdge {}

impl PartialOrd for ScheduledEdge {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}
impl Ord for ScheduledEdge {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.key().cmp(&other.key())
    }
}

struct Slot {
    task: Box<dyn PeriodicTask>,
    spec: TaskSpec,
    next_release_ms: u64,
    stats: CycleStats,
}

/// Deterministic single-threaded executor over virtual time.
///
/// At each instant: due edges fire first (interrupts preempt everything),
/// then due tasks run to completion one at a time, highest priority first,
/// registration order breaking ties. Time only moves between events.
pub struct SimExecutor {
    clock: Arc<SimClock>,
    slots: Vec<Slot>,
    edges: BinaryHeap<ScheduledEdge>,
    seq: u64,
}

impl SimExecutor {
    pub fn new(clock: Arc<SimClock>) -> Self {
        Self { clock, slots: Vec::new(), edges: BinaryHeap::new(), seq: 0 }
    }

    pub fn clock(&self) -> &Arc<SimClock> {
        &self.clock
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// First release is `now + phase`.
    pub fn spawn(&mut self, task: Box<dyn PeriodicTask>) {
        let spec = task.spec();
        let next_release_ms = self.clock.now_ms() + spec.phase_ms;
        self.slots.push(Slot { task, spec, next_release_ms, stats: CycleStats::default() });
    }

    /// Schedule a rising edge. Edges in the past fire at the next step.
    pub fn raise_edge(&mut self, at_ms: u64, handler: Arc<dyn EdgeHandler>) {
        self.seq += 1;
        self.edges.push(ScheduledEdge { at_ms, seq: self.seq, handler });
    }

    pub fn stats(&self, name: &str) -> Option<CycleStats> {
        self.slots.iter().find(|s| s.spec.name == name).map(|s| s.stats)
    }

    /// Process every event up to and including `end_ms`, then park the
    /// clock at `end_ms`.
    pub fn run_until(&mut self, end_ms: u64) {
        loop {
            let next_edge = self.edges.peek().map(|e| e.at_ms);
            let next_task = self.slots.iter().map(|s| s.next_release_ms).min();

            let next = match (next_edge, next_task) {
                (Some(e), Some(t)) => e.min(t),
                (Some(e), None) => e,
                (None, Some(t)) => t,
                (None, None) => break,
            };
            if next > end_ms {
                break;
            }
            self.clock.set(next);
            let now = self.clock.now_ms();

            while self.edges.peek().map_or(false, |e| e.at_ms <= now) {
                if let Some(edge) = self.edges.pop() {
                    trace!("[SIM] t={} edge #{}", now, edge.seq);
                    edge.handler.on_edge();
                }
            }

            if let Some(idx) = self.due_slot(now) {
                self.run_slot(idx, now);
            }
        }
        self.clock.set(end_ms);
    }

    /// Advance by `ms` from the current instant.
    pub fn run_for(&mut self, ms: u64) {
        let end = self.clock.now_ms() + ms;
        self.run_until(end);
    }

    fn due_slot(&self, now: u64) -> Option<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.next_release_ms <= now)
            .max_by_key(|(i, s)| (s.spec.priority, Reverse(*i)))
            .map(|(i, _)| i)
    }

    fn run_slot(&mut self, idx: usize, now: u64) {
        let slot = &mut self.slots[idx];
        trace!("[SIM] t={} run {}", now, slot.spec.name);

        let release = slot.task.run_cycle();
        slot.next_release_ms += release.delay_ms(slot.spec.period_ms);

        let finished = self.clock.now_ms();
        slot.stats.record(now, finished, slot.next_release_ms);
    }
}

/// Output level history of one [`ProbePin`].
#[derive(Debug, Default)]
pub struct PinTrace {
    level: AtomicBool,
    transitions: Mutex<Vec<(u64, bool)>>,
}

impl PinTrace {
    pub fn level(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }

    /// `(time_ms, new_level)` for every change of level.
    pub fn transitions(&self) -> Vec<(u64, bool)> {
        self.transitions.lock().clone()
    }

    /// Completed high pulses as `(rise_ms, fall_ms)`.
    pub fn pulses(&self) -> Vec<(u64, u64)> {
        let mut out = Vec::new();
        let mut rise = None;
        for &(t, high) in self.transitions.lock().iter() {
            match (high, rise) {
                (true, None) => rise = Some(t),
                (false, Some(r)) => {
                    out.push((r, t));
                    rise = None;
                }
                _ => {}
            }
        }
        out
    }
}

/// Simulated LED that timestamps its transitions.
#[derive(Clone)]
pub struct ProbePin {
    clock: Arc<dyn PlatformClock>,
    trace: Arc<PinTrace>,
}

impl ProbePin {
    pub fn new(clock: Arc<dyn PlatformClock>) -> Self {
        Self { clock, trace: Arc::new(PinTrace::default()) }
    }

    pub fn trace(&self) -> Arc<PinTrace> {
        self.trace.clone()
    }

    pub fn is_high(&self) -> bool {
        self.trace.level()
    }
}

impl DigitalOutput for ProbePin {
    fn set_level(&mut self, high: bool) {
        let prev = self.trace.level.swap(high, Ordering::SeqCst);
        if prev != high {
            self.trace.transitions.lock().push((self.clock.now_ms(), high));
        }
    }
}

/// Simulated analog input that a test turns by hand.
#[derive(Clone, Debug, Default)]
pub struct Dial(Arc<AtomicI32>);

impl Dial {
    pub fn new(value: Distance) -> Self {
        Self(Arc::new(AtomicI32::new(value)))
    }

    pub fn set(&self, value: Distance) {
        self.0.store(value, Ordering::SeqCst);
    }
}

impl AnalogInput for Dial {
    fn read(&mut self) -> Distance {
        self.0.load(Ordering::SeqCst)
    }
}

/// Telemetry sink that keeps every line.
#[derive(Clone, Default)]
pub struct CaptureSink(Arc<Mutex<Vec<String>>>);

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

impl TelemetrySink for CaptureSink {
    fn write_line(&mut self, line: &str) {
        self.0.lock().push(line.to_string());
    }
}
