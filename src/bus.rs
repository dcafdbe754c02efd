//! Host collaborator traits
//!
//! The GF1 core never talks to real hardware; every outward interaction
//! goes through these traits so different hosts (a full machine emulator,
//! a test harness, an offline renderer) can be plugged in interchangeably.
//! All callbacks are dispatched serially by the host: the core is
//! single-threaded cooperative and finishes each call before the next.

/// Transfer width hint for a port access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoWidth {
    /// 8-bit access
    Byte,
    /// 16-bit access
    Word,
}

/// Services the card requires from its host machine.
///
/// Covers the PIC (edge IRQ requests plus the delayed-event scheduler the
/// timers run on) and the output mixer's control surface. The host must
/// deliver a scheduled event by calling back into
/// [`Gf1::timer_event`](crate::Gf1::timer_event) with the same tag after
/// the requested delay.
pub trait GusBus {
    /// Request an edge on the given IRQ line.
    fn activate_irq(&mut self, line: u8);

    /// Schedule a timer event `delay_secs` from now, tagged with the
    /// timer index.
    fn add_event(&mut self, delay_secs: f64, timer: usize);

    /// Reprogram the mixer's output sample rate in Hz.
    fn set_output_rate(&mut self, rate: u32);

    /// Enable or disable the card's mixer channel.
    fn enable_output(&mut self, enabled: bool);

    /// Per-side mixer gain scalars, used only for the playback statistics
    /// report. Hosts without a volume control can keep the default.
    fn output_gains(&self) -> (f32, f32) {
        (1.0, 1.0)
    }
}

/// One host DMA channel, handed to the core when the channel is unmasked.
///
/// Counts are in channel words: a 16-bit channel moves two bytes per
/// word. `read` moves data from the host into `buf`; `write` moves data
/// from `buf` out to the host. Both return the number of words actually
/// transferred.
pub trait DmaChannel {
    /// Value of the channel's transfer-count register (one less than the
    /// number of words to move).
    fn transfer_count(&self) -> u16;

    /// Whether this is a 16-bit channel.
    fn is_16bit(&self) -> bool;

    /// Transfer `words` from the host into `buf`.
    fn read(&mut self, words: usize, buf: &mut [u8]) -> usize;

    /// Transfer `words` from `buf` out to the host.
    fn write(&mut self, words: usize, buf: &[u8]) -> usize;
}

/// Bus that drops every request, used while constructing the device
/// before a host is attached.
pub(crate) struct NullBus;

impl GusBus for NullBus {
    fn activate_irq(&mut self, _line: u8) {}
    fn add_event(&mut self, _delay_secs: f64, _timer: usize) {}
    fn set_output_rate(&mut self, _rate: u32) {}
    fn enable_output(&mut self, _enabled: bool) {}
}
