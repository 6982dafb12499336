use crate::*;

/// Bounded wait for every queue operation a periodic task performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueWaits {
    pub sample_send_ms: u64,
    pub distance_recv_ms: u64,
    pub delta_recv_ms: u64,
    pub telemetry_send_ms: u64,
    pub telemetry_recv_ms: u64,
}

impl QueueWaits {
    /// Every operation becomes a try. Used under virtual time, where nothing
    /// else can run while a task is waiting.
    pub const NONE: Self = Self {
        sample_send_ms: 0,
        distance_recv_ms: 0,
        delta_recv_ms: 0,
        telemetry_send_ms: 0,
        telemetry_recv_ms: 0,
    };
}

impl Default for QueueWaits {
    fn default() -> Self {
        Self {
            sample_send_ms: SAMPLE_SEND_WAIT_MS,
            distance_recv_ms: DISTANCE_RECV_WAIT_MS,
            delta_recv_ms: DELTA_RECV_WAIT_MS,
            telemetry_send_ms: TELEMETRY_SEND_WAIT_MS,
            telemetry_recv_ms: TELEMETRY_RECV_WAIT_MS,
        }
    }
}

/// Timing profile of the whole loop. `Default` is the reference board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GovernorConfig {
    pub sample_period_ms: u64,
    pub arbitrate_period_ms: u64,
    pub report_period_ms: u64,
    pub brake_light_tick_ms: u64,
    pub hazard_hold_ms: u64,
    pub debounce_window_ms: u64,
    pub queue_capacity: usize,
    pub waits: QueueWaits,
}

impl GovernorConfig {
    pub fn virtual_time() -> Self {
        Self { waits: QueueWaits::NONE, ..Self::default() }
    }
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            sample_period_ms: SAMPLE_PERIOD_MS,
            arbitrate_period_ms: ARBITRATE_PERIOD_MS,
            report_period_ms: REPORT_PERIOD_MS,
            brake_light_tick_ms: BRAKE_LIGHT_TICK_MS,
            hazard_hold_ms: HAZARD_HOLD_MS,
            debounce_window_ms: DEBOUNCE_WINDOW_MS,
            queue_capacity: QUEUE_CAPACITY,
            waits: QueueWaits::default(),
        }
    }
}
