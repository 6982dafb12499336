use colored::{Color, Colorize};
use gov_hal::DigitalOutput;
use log::info;

/// LED rendered as a log line on every change of level.
pub struct PanelLed {
    label: &'static str,
    pin: u8,
    color: Color,
    level: bool,
}

impl PanelLed {
    pub fn new(label: &'static str, pin: u8, color: Color) -> Self {
        Self { label, pin, color, level: false }
    }
}

impl DigitalOutput for PanelLed {
    fn set_level(&mut self, high: bool) {
        if high == self.level {
            return;
        }
        self.level = high;
        let state = if high { "ON ".color(self.color).bold() } else { "off".dimmed() };
        info!("[LED {:<7} D{}] {}", self.label, self.pin, state);
    }
}
