use gov_core::{tasks, Distance, GovernorConfig};
use gov_hal::AnalogInput;
use gov_queue::Producer;
use gov_rtos::{PeriodicTask, Release, TaskSpec};
use log::debug;

/// Reads the proximity sensor once per period and publishes the value.
pub struct DistanceSampler {
    sensor: Box<dyn AnalogInput>,
    tx: Producer<Distance>,
    period_ms: u64,
    send_wait_ms: u64,
}

impl DistanceSampler {
    pub fn new(sensor: Box<dyn AnalogInput>, tx: Producer<Distance>, config: &GovernorConfig) -> Self {
        Self {
            sensor,
            tx,
            period_ms: config.sample_period_ms,
            send_wait_ms: config.waits.sample_send_ms,
        }
    }
}

impl PeriodicTask for DistanceSampler {
    fn spec(&self) -> TaskSpec {
        TaskSpec {
            name: tasks::SAMPLER,
            priority: tasks::SAMPLER_PRIORITY,
            period_ms: self.period_ms,
            phase_ms: 0,
        }
    }

    fn run_cycle(&mut self) -> Release {
        let reading = self.sensor.read();
        // One bounded attempt, no retry.
        if let Err(e) = self.tx.send(reading, self.send_wait_ms) {
            debug!("[SAMPLER] reading {} not delivered: {}", reading, e);
        }
        Release::NextPeriod
    }
}
