//! Card configuration and environment wiring
//!
//! Holds the port base, DMA/IRQ assignments and the `ULTRADIR` sample
//! directory, and emits the exact `SET ULTRASND=` / `SET ULTRADIR=`
//! autoexec lines DOS-era software probes for. Out-of-range DMA or IRQ
//! values silently fall back to the conventional 3 and 5.

use crate::{Gf1Error, Result};

/// Fallback DMA channel for out-of-range configuration values.
const DEFAULT_DMA: u8 = 3;

/// Fallback IRQ line for out-of-range configuration values.
const DEFAULT_IRQ: u8 = 5;

/// Static configuration of one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GusConfig {
    /// I/O port base the card is decoded at (0x200-aligned, e.g. 0x240)
    pub port_base: u16,
    /// Configured DMA channel; values outside 0..=255 fall back to 3
    pub dma: i32,
    /// Configured IRQ line; values outside 0..=255 fall back to 5
    pub irq: i32,
    /// Directory advertised through `SET ULTRADIR=`
    pub ultradir: String,
}

impl Default for GusConfig {
    fn default() -> Self {
        GusConfig {
            port_base: 0x240,
            dma: i32::from(DEFAULT_DMA),
            irq: i32::from(DEFAULT_IRQ),
            ultradir: "C:\\ULTRASND".to_string(),
        }
    }
}

impl GusConfig {
    /// Effective DMA channel after the out-of-range fallback.
    pub fn dma_line(&self) -> u8 {
        u8::try_from(self.dma).unwrap_or(DEFAULT_DMA)
    }

    /// Effective IRQ line after the out-of-range fallback.
    pub fn irq_line(&self) -> u8 {
        u8::try_from(self.irq).unwrap_or(DEFAULT_IRQ)
    }

    /// Render the two autoexec lines for this card.
    ///
    /// The ULTRASND format is `port,dma1,dma2,irq1,irq2` with the port in
    /// lowercase three-digit hex; both DMA slots and both IRQ slots carry
    /// the single configured line.
    pub fn autoexec_lines(&self) -> [String; 2] {
        let (dma, irq) = (self.dma_line(), self.irq_line());
        [
            format!(
                "SET ULTRASND={:03x},{},{},{},{}",
                self.port_base, dma, dma, irq, irq
            ),
            format!("SET ULTRADIR={}", self.ultradir),
        ]
    }

    /// Parse a `SET ULTRASND=port,dma1,dma2,irq1,irq2` line back into a
    /// configuration (the second DMA/IRQ slots are accepted and ignored).
    pub fn from_ultrasnd(line: &str) -> Result<Self> {
        let value = line
            .trim()
            .strip_prefix("SET ULTRASND=")
            .ok_or_else(|| Gf1Error::ConfigError(format!("not an ULTRASND line: {line:?}")))?;
        let fields: Vec<&str> = value.split(',').collect();
        if fields.len() != 5 {
            return Err(Gf1Error::ConfigError(format!(
                "ULTRASND wants 5 fields, got {}",
                fields.len()
            )));
        }
        let port_base = u16::from_str_radix(fields[0], 16)
            .map_err(|e| Gf1Error::ConfigError(format!("bad port {:?}: {e}", fields[0])))?;
        let dma = fields[1]
            .parse::<i32>()
            .map_err(|e| Gf1Error::ConfigError(format!("bad dma {:?}: {e}", fields[1])))?;
        let irq = fields[3]
            .parse::<i32>()
            .map_err(|e| Gf1Error::ConfigError(format!("bad irq {:?}: {e}", fields[3])))?;
        Ok(GusConfig {
            port_base,
            dma,
            irq,
            ..GusConfig::default()
        })
    }
}
