use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use gov_hal::PlatformClock;
use log::{info, warn};
use spin::Mutex;

use crate::{CycleStats, PeriodicTask};

/// Running task. Tasks never return, so the join handle is only kept to
/// tie the thread's lifetime to the executor's owner.
pub struct TaskHandle {
    pub name: &'static str,
    stats: Arc<Mutex<CycleStats>>,
    _join: JoinHandle<()>,
}

impl TaskHandle {
    pub fn stats(&self) -> CycleStats {
        *self.stats.lock()
    }
}

/// Real-time executor: one OS thread per task, absolute-deadline sleeping.
///
/// OS thread priorities are not applied. Ordering between tasks released
/// at the same instant is settled by the bounded queue waits instead.
pub struct ThreadedExecutor {
    clock: Arc<dyn PlatformClock>,
    epoch_ms: u64,
    core: Option<core_affinity::CoreId>,
    handles: Vec<TaskHandle>,
}

impl ThreadedExecutor {
    pub fn new(clock: Arc<dyn PlatformClock>) -> Self {
        let epoch_ms = clock.now_ms();
        Self { clock, epoch_ms, core: None, handles: Vec::new() }
    }

    /// Confine every task thread to one core, like the single-core board.
    pub fn pin_to_core(mut self, core: core_affinity::CoreId) -> Self {
        self.core = Some(core);
        self
    }

    pub fn spawn(&mut self, mut task: Box<dyn PeriodicTask>) -> std::io::Result<()> {
        let spec = task.spec();
        let clock = self.clock.clone();
        let core = self.core;
        let stats = Arc::new(Mutex::new(CycleStats::default()));
        let shared = stats.clone();
        let first_release = self.epoch_ms + spec.phase_ms;

        let join = thread::Builder::new().name(spec.name.to_string()).spawn(move || {
            if let Some(core) = core {
                if !core_affinity::set_for_current(core) {
                    warn!("[{}] could not pin to core {:?}", spec.name, core.id);
                }
            }

            let mut release = first_release;
            loop {
                sleep_until(clock.as_ref(), release);

                let started = clock.now_ms();
                let delay = task.run_cycle().delay_ms(spec.period_ms);
                release += delay;
                let finished = clock.now_ms();

                shared.lock().record(started, finished, release);
                if finished > release {
                    warn!("[{}] overran its release by {}ms", spec.name, finished - release);
                }
            }
        })?;

        info!("Task {} started (prio {}, period {}ms)", spec.name, spec.priority, spec.period_ms);
        self.handles.push(TaskHandle { name: spec.name, stats, _join: join });
        Ok(())
    }

    pub fn tasks(&self) -> &[TaskHandle] {
        &self.handles
    }
}

fn sleep_until(clock: &dyn PlatformClock, release_ms: u64) {
    let now = clock.now_ms();
    if release_ms > now {
        thread::sleep(Duration::from_millis(release_ms - now));
    }
}
