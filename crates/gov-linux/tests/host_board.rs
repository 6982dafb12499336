use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use gov_core::ANALOG_MAX;
use gov_hal::{AnalogInput, PlatformClock};
use gov_linux::{Keypad, LinuxClock, Potentiometer};
use gov_rtos::EdgeHandler;

struct Count(AtomicU32);
impl EdgeHandler for Count {
    fn on_edge(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_clock_is_monotonic() {
    let clock = LinuxClock::new();
    let a = clock.now_ms();
    std::thread::sleep(std::time::Duration::from_millis(5));
    assert!(clock.now_ms() >= a + 5);
}

#[test]
fn test_fixed_pot() {
    let mut pot = Potentiometer::fixed(444);
    assert_eq!(pot.read(), 444);
    assert_eq!(pot.read(), 444);
}

#[test]
fn test_wander_stays_in_adc_range() {
    let mut pot = Potentiometer::wandering(1000, 64, 7);
    let mut prev = 1000;
    for _ in 0..500 {
        let v = pot.read();
        assert!((0..=ANALOG_MAX).contains(&v));
        assert!((v - prev).abs() <= 64);
        prev = v;
    }
}

#[test]
fn test_wander_is_reproducible() {
    let mut a = Potentiometer::wandering(512, 30, 42);
    let mut b = Potentiometer::wandering(512, 30, 42);
    for _ in 0..50 {
        assert_eq!(a.read(), b.read());
    }
}

#[test]
fn test_keypad_mapping() {
    let brake = Arc::new(Count(AtomicU32::new(0)));
    let acc = Arc::new(Count(AtomicU32::new(0)));
    let keypad = Keypad::new(brake.clone(), acc.clone());

    assert!(keypad.dispatch('a'));
    assert!(keypad.dispatch('+'));
    assert!(keypad.dispatch('b'));
    assert!(!keypad.dispatch('x'));

    assert_eq!(acc.0.load(Ordering::SeqCst), 2);
    assert_eq!(brake.0.load(Ordering::SeqCst), 1);
}
