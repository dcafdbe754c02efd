//! GF1 Wavetable Synthesizer Emulator
//!
//! An emulator of the Gravis UltraSound's GF1 ASIC: 32 wavetable voices
//! sampling a 1 MiB on-card RAM, per-voice volume ramps with a
//! logarithmic 4096-entry volume table, 16-position constant-power
//! panning, two AdLib-compatible countdown timers, a DMA upload engine
//! and the card's IRQ aggregation logic.
//!
//! # Features
//! - Selector-addressed global register file on the 0x3xx port block
//! - 8-bit and 16-bit sample playback with linear interpolation
//! - Loop, bidirectional and IRQ wave-end modes per voice
//! - Block renderer with an adaptive soft limiter
//! - Host integration through traits: IRQ/event scheduling, mixer
//!   control and DMA channels are all supplied by the embedder
//!
//! # Quick start
//! ```no_run
//! use gf1::{Gf1, GusBus, GusConfig, IoWidth};
//!
//! struct Host;
//! impl GusBus for Host {
//!     fn activate_irq(&mut self, _line: u8) {}
//!     fn add_event(&mut self, _delay_secs: f64, _timer: usize) {}
//!     fn set_output_rate(&mut self, _rate: u32) {}
//!     fn enable_output(&mut self, _enabled: bool) {}
//! }
//!
//! let mut host = Host;
//! let mut chip = Gf1::new(&GusConfig::default());
//! // Program 14 active voices (sets the 44100 Hz output rate)
//! chip.write(&mut host, 0x343, 0x0e, IoWidth::Byte);
//! chip.write(&mut host, 0x345, 0x0d, IoWidth::Byte);
//! let mut frames = [[0i16; 2]; 64];
//! chip.render_block(&mut host, &mut frames);
//! ```

#![warn(missing_docs)]

pub mod bus;
pub mod config;
pub mod gf1;
pub mod util;

/// Error types for GF1 emulator operations
#[derive(thiserror::Error, Debug)]
pub enum Gf1Error {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// IO error from filesystem or device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<String> for Gf1Error {
    /// Converts a String into `Gf1Error::Other`.
    fn from(msg: String) -> Self {
        Gf1Error::Other(msg)
    }
}

impl From<&str> for Gf1Error {
    /// Converts a string slice into `Gf1Error::Other`.
    fn from(msg: &str) -> Self {
        Gf1Error::Other(msg.to_string())
    }
}

/// Result type for emulator operations
pub type Result<T> = std::result::Result<T, Gf1Error>;

// Public API exports
pub use bus::{DmaChannel, GusBus, IoWidth};
pub use config::GusConfig;
pub use gf1::{Gf1, GusTimer, SampleWidth, StereoFrame, Voice, VoiceCtrl};
