use gov_core::{tasks, GovernorConfig, TelemetryRecord};
use gov_hal::TelemetrySink;
use gov_queue::Consumer;
use gov_rtos::{PeriodicTask, Release, TaskSpec};

/// Drains at most one telemetry record per period onto the operator console.
pub struct TelemetryReporter {
    rx: Consumer<TelemetryRecord>,
    sink: Box<dyn TelemetrySink>,
    period_ms: u64,
    recv_wait_ms: u64,
}

impl TelemetryReporter {
    pub fn new(rx: Consumer<TelemetryRecord>, sink: Box<dyn TelemetrySink>, config: &GovernorConfig) -> Self {
        Self {
            rx,
            sink,
            period_ms: config.report_period_ms,
            recv_wait_ms: config.waits.telemetry_recv_ms,
        }
    }

    /// Returns whether a record was rendered.
    pub fn report(&mut self) -> bool {
        match self.rx.recv(self.recv_wait_ms) {
            Ok(record) => {
                self.sink.write_line(&record.to_string());
                true
            }
            Err(_) => false,
        }
    }
}

impl PeriodicTask for TelemetryReporter {
    fn spec(&self) -> TaskSpec {
        TaskSpec {
            name: tasks::REPORTER,
            priority: tasks::REPORTER_PRIORITY,
            period_ms: self.period_ms,
            phase_ms: 0,
        }
    }

    fn run_cycle(&mut self) -> Release {
        self.report();
        Release::NextPeriod
    }
}
