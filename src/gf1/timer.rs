//! GF1 millisecond timers
//!
//! Two countdown timers modelled on the AdLib pair: timer 1 counts in
//! 80 µs ticks, timer 2 in 320 µs ticks. A timer's period is
//! `(256 - value) * tick`; firing sets `reached` (unless masked) and may
//! raise an IRQ status bit. Rescheduling is controlled solely by
//! `running`.

/// One programmable countdown timer.
#[derive(Debug, Clone)]
pub struct GusTimer {
    /// Seconds per count
    tick: f64,
    /// Programmed 8-bit count value
    pub value: u8,
    /// Current period in seconds
    pub delay: f64,
    /// Expired flag, visible in the AdLib status byte
    pub reached: bool,
    /// Fire raises the timer's IRQ status bit
    pub raise_irq: bool,
    /// Masked timers do not set `reached`
    pub masked: bool,
    /// Reschedules itself while set
    pub running: bool,
}

impl GusTimer {
    /// Create a timer with the given tick length in seconds.
    pub fn new(tick: f64) -> Self {
        let mut timer = GusTimer {
            tick,
            value: 0,
            delay: 0.0,
            reached: false,
            raise_irq: false,
            masked: false,
            running: false,
        };
        timer.reset();
        timer
    }

    /// Return to the post-reset state: stopped, cleared, shortest period.
    pub fn reset(&mut self) {
        self.reached = false;
        self.raise_irq = false;
        self.running = false;
        self.set_value(0xff);
    }

    /// Program the count value and derive the period.
    pub fn set_value(&mut self, value: u8) {
        self.value = value;
        self.delay = f64::from(0x100 - u16::from(value)) * self.tick;
    }
}
