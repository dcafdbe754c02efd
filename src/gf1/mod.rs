//! GF1 Wavetable Synthesizer Core
//!
//! The Gravis UltraSound's GF1 ASIC: 32 wavetable voices reading a
//! 1 MiB sample RAM through fixed-point accumulators, per-voice volume
//! ramps, constant-power panning, two AdLib-compatible square-wave
//! timers, a DMA engine for sample uploads and an IRQ aggregator.
//!
//! Register access goes through the selector protocol on the 0x3xx port
//! block ([`Gf1::write`] / [`Gf1::read`]); audio comes out of
//! [`Gf1::render_block`] as interleaved stereo `i16` frames.

pub mod chip;
pub mod constants;
mod dma;
mod registers;
pub mod tables;
pub mod timer;
pub mod voice;

pub use chip::Gf1;
pub use tables::StereoFrame;
pub use timer::GusTimer;
pub use voice::{SampleWidth, Voice, VoiceCtrl};
