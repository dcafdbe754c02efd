//! GF1 Hardware Constants
//!
//! Shared constants used across the synthesizer components. The wave
//! accumulator carries 9 fractional bits, extending the native GF1
//! precision so that low playback rates keep their inter-sample detail.

/// Fractional bits carried by the wave and address accumulators.
pub const WAVE_FRACT: u32 = 9;

/// Mask selecting the fractional part of a wave accumulator.
pub const WAVE_FRACT_MASK: u32 = (1 << WAVE_FRACT) - 1;

/// Mask selecting the LSW half of a 32-bit wave address.
pub const WAVE_MSW_MASK: u32 = (1 << 16) - 1;

/// Mask selecting the MSW half of a 32-bit wave address.
pub const WAVE_LSW_MASK: u32 = 0xffff_ffff ^ WAVE_MSW_MASK;

/// Fewest voices the card will run with; requests below are clamped up.
pub const MIN_VOICES: u32 = 14;

/// Most voices the card supports.
pub const MAX_VOICES: u32 = 32;

/// Largest stereo block the render callback will be handed.
pub const BUFFER_FRAMES: usize = 64;

/// Pan positions: 0 face-left, 7 face-forward, 15 face-right.
pub const PAN_POSITIONS: usize = 16;

/// Envelope index range of the logarithmic volume table.
pub const VOLUME_POSITIONS: usize = 4096;

/// Per-step divisor of the volume table, 0.0235 dB increments.
///
/// Also reused by the soft-limiter as its per-block release constant,
/// so the literal must stay exact to match reference recordings.
pub const VOLUME_SCALE_DIV: f64 = 1.002709201;

/// Sample RAM size: 1 MiB, byte addressable.
pub const GUS_RAM_SIZE: usize = 1_048_576;

/// Seconds per timer-1 count (80 microseconds).
pub const TIMER_1_TICK: f64 = 80e-6;

/// Seconds per timer-2 count (320 microseconds).
pub const TIMER_2_TICK: f64 = 320e-6;

/// Per-voice period factor of the synthesis clock: the output rate is
/// `round(1_000_000 / (VOICE_CLOCK_FACTOR * active_voices))`, which lands
/// on 44100 Hz with the minimum 14 voices active.
pub const VOICE_CLOCK_FACTOR: f64 = 1.619695497;

/// IRQ lines selectable through the mix-control latch; zero keeps the
/// previous assignment.
pub const IRQ_LINES: [u8; 8] = [0, 2, 5, 3, 7, 11, 12, 15];

/// DMA channels selectable through the mix-control latch; zero keeps the
/// previous assignment.
pub const DMA_LINES: [u8; 8] = [0, 1, 3, 5, 6, 7, 0, 0];
