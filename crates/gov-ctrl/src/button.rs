use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use gov_core::SpeedDelta;
use gov_hal::PlatformClock;
use gov_queue::IsrProducer;
use gov_rtos::EdgeHandler;

/// What happened to one rising edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Press {
    Accepted,
    /// Inside the debounce window; discarded.
    Bounced,
    /// Outside the window but the delta queue was full.
    Dropped,
}

/// Rising-edge handler for one physical button.
///
/// Runs in interrupt context: it only reads the clock, touches its own
/// timestamp, and tries a non-blocking send. The timestamp starts at zero,
/// so edges inside the first window after boot are ignored.
pub struct DebouncedButton {
    label: &'static str,
    delta: SpeedDelta,
    window_ms: u64,
    last_accepted_ms: AtomicU64,
    clock: Arc<dyn PlatformClock>,
    tx: IsrProducer<SpeedDelta>,
}

impl DebouncedButton {
    pub fn new(
        label: &'static str,
        delta: SpeedDelta,
        window_ms: u64,
        clock: Arc<dyn PlatformClock>,
        tx: IsrProducer<SpeedDelta>,
    ) -> Self {
        Self { label, delta, window_ms, last_accepted_ms: AtomicU64::new(0), clock, tx }
    }

    pub fn brake(window_ms: u64, clock: Arc<dyn PlatformClock>, tx: IsrProducer<SpeedDelta>) -> Self {
        Self::new("brake", SpeedDelta::Brake, window_ms, clock, tx)
    }

    pub fn accelerate(window_ms: u64, clock: Arc<dyn PlatformClock>, tx: IsrProducer<SpeedDelta>) -> Self {
        Self::new("accelerate", SpeedDelta::Accelerate, window_ms, clock, tx)
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn press(&self) -> Press {
        let now = self.clock.now_ms();
        let last = self.last_accepted_ms.load(Ordering::Relaxed);
        if now.saturating_sub(last) < self.window_ms {
            return Press::Bounced;
        }

        // The window restarts even if the queue turns the delta away.
        self.last_accepted_ms.store(now, Ordering::Relaxed);
        match self.tx.send_from_isr(self.delta) {
            Ok(()) => Press::Accepted,
            Err(nb::Error::WouldBlock) | Err(nb::Error::Other(_)) => Press::Dropped,
        }
    }
}

impl EdgeHandler for DebouncedButton {
    fn on_edge(&self) {
        let _ = self.press();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gov_queue::Queue;

    struct MockClock(AtomicU64);
    impl MockClock {
        fn set(&self, ms: u64) {
            self.0.store(ms, Ordering::SeqCst);
        }
    }
    impl PlatformClock for MockClock {
        fn now_ms(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn rig(capacity: usize) -> (Arc<MockClock>, DebouncedButton, gov_queue::Consumer<SpeedDelta>) {
        let clock = Arc::new(MockClock(AtomicU64::new(1_000)));
        let q = Queue::bounded("delta", capacity);
        let button = DebouncedButton::accelerate(200, clock.clone(), q.isr_producer());
        (clock, button, q.consumer())
    }

    #[test]
    fn bounce_inside_window() {
        let (clock, button, rx) = rig(10);

        assert_eq!(button.press(), Press::Accepted);
        clock.set(1_199);
        assert_eq!(button.press(), Press::Bounced);

        assert_eq!(rx.len(), 1);
        assert_eq!(rx.recv(0), Ok(SpeedDelta::Accelerate));
    }

    #[test]
    fn window_boundary_accepts() {
        let (clock, button, rx) = rig(10);

        assert_eq!(button.press(), Press::Accepted);
        clock.set(1_200);
        assert_eq!(button.press(), Press::Accepted);
        assert_eq!(rx.len(), 2);
    }

    #[test]
    fn bounce_does_not_extend_window() {
        let (clock, button, _rx) = rig(10);

        assert_eq!(button.press(), Press::Accepted);
        clock.set(1_150);
        assert_eq!(button.press(), Press::Bounced);
        // Measured from the accepted edge at 1000, not the bounce at 1150.
        clock.set(1_210);
        assert_eq!(button.press(), Press::Accepted);
    }

    #[test]
    fn ignored_right_after_boot() {
        let (clock, button, rx) = rig(10);
        clock.set(150);
        assert_eq!(button.press(), Press::Bounced);
        assert!(rx.is_empty());
    }

    #[test]
    fn full_queue_drops_silently() {
        let (clock, button, rx) = rig(1);

        assert_eq!(button.press(), Press::Accepted);
        clock.set(1_500);
        assert_eq!(button.press(), Press::Dropped);
        // A dropped press still restarts the window.
        clock.set(1_600);
        assert_eq!(button.press(), Press::Bounced);
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn buttons_are_independent() {
        let clock = Arc::new(MockClock(AtomicU64::new(1_000)));
        let q = Queue::bounded("delta", 10);
        let brake = DebouncedButton::brake(200, clock.clone(), q.isr_producer());
        let acc = DebouncedButton::accelerate(200, clock.clone(), q.isr_producer());
        let rx = q.consumer();

        assert_eq!(brake.press(), Press::Accepted);
        assert_eq!(acc.press(), Press::Accepted);
        assert_eq!(rx.recv(0), Ok(SpeedDelta::Brake));
        assert_eq!(rx.recv(0), Ok(SpeedDelta::Accelerate));
    }
}
