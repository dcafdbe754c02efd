//! DMA engine
//!
//! Fills sample RAM from (or drains it to) a host DMA channel. A
//! transfer is armed by bit 0 of selector 0x41 or 0x49 and runs exactly
//! once when the host reports the channel unmasked. Transfers cannot
//! cross 256 KiB boundaries on the hardware, so the start address is
//! resolved once and the block runs linearly from there.

use super::chip::Gf1;
use super::constants::GUS_RAM_SIZE;
use crate::bus::{DmaChannel, GusBus};

impl Gf1 {
    /// DMA unmask callback.
    ///
    /// No-op unless a transfer is armed. DMA-control bit 2 selects the
    /// 16-bit address translation, bit 1 the direction (clear = host to
    /// RAM), bit 7 post-inverts each sample's MSB to turn two's
    /// complement into offset binary (stride by bit 6's data width), and
    /// bit 5 raises the terminal-count IRQ on completion.
    pub fn dma_event(&mut self, bus: &mut impl GusBus, chan: &mut dyn DmaChannel) {
        if !self.dma_armed {
            return;
        }

        let dma_addr = usize::from(self.dma_addr);
        let start = if self.dma_control & 0x4 != 0 {
            (((dma_addr & 0x1fff) << 1) | (dma_addr & 0xc000)) << 4
        } else {
            dma_addr << 4
        };
        let start = start.min(GUS_RAM_SIZE);
        let words = usize::from(chan.transfer_count()) + 1;
        let word_bytes = if chan.is_16bit() { 2 } else { 1 };

        if self.dma_control & 0x2 == 0 {
            // Host to sample RAM
            let limit = GUS_RAM_SIZE.min(start + words * word_bytes);
            let moved = chan.read(words, &mut self.ram[start..limit]);
            let end = GUS_RAM_SIZE.min(start + moved * word_bytes);
            if self.dma_control & 0x80 != 0 {
                if self.dma_control & 0x40 == 0 {
                    // 8-bit data: every byte is a sample MSB
                    for byte in &mut self.ram[start..end] {
                        *byte ^= 0x80;
                    }
                } else {
                    // 16-bit data: the MSB is every second byte
                    let mut i = start + 1;
                    while i < end {
                        self.ram[i] ^= 0x80;
                        i += 2;
                    }
                }
            }
        } else {
            // Sample RAM to host
            let limit = GUS_RAM_SIZE.min(start + words * word_bytes);
            chan.write(words, &self.ram[start..limit]);
        }

        if self.dma_control & 0x20 != 0 {
            self.irq_status |= 0x80;
            self.check_irq(bus);
        }
        // One transfer per unmask
        self.dma_armed = false;
    }
}
