//! Selector-addressed register file
//!
//! The GF1 exposes its register file through a selector port (0x303) and
//! a 16-bit data latch (0x304/0x305). Selectors below 0x0F address the
//! voice named by the channel port (0x302); selectors from 0x41 up
//! address global state. Several reads carry acknowledge side effects:
//! 0x41 clears the DMA terminal-count bit and 0x8F clears the cursor
//! voice's pending bits.

use log::debug;

use super::chip::Gf1;
use super::constants::{MAX_VOICES, MIN_VOICES, VOICE_CLOCK_FACTOR, WAVE_LSW_MASK, WAVE_MSW_MASK};
use crate::bus::GusBus;

impl Gf1 {
    /// Write the current voice's wave control byte and maintain the wave
    /// IRQ bitset: writing bits 7+5 together forces the voice's pending
    /// bit, anything else clears it.
    pub(super) fn write_wave_ctrl(&mut self, bus: &mut impl GusBus, voice: usize, val: u8) {
        let old = self.wave_irq;
        let irq_mask = self.voices[voice].irq_mask;
        self.voices[voice].set_wave_ctrl(val);
        if val & 0xa0 == 0xa0 {
            self.wave_irq |= irq_mask;
        } else {
            self.wave_irq &= !irq_mask;
        }
        if old != self.wave_irq {
            self.check_voice_irq(bus);
        }
    }

    /// Ramp-side counterpart of [`write_wave_ctrl`](Gf1::write_wave_ctrl).
    pub(super) fn write_ramp_ctrl(&mut self, bus: &mut impl GusBus, voice: usize, val: u8) {
        let old = self.ramp_irq;
        let irq_mask = self.voices[voice].irq_mask;
        self.voices[voice].set_ramp_ctrl(val);
        if val & 0xa0 == 0xa0 {
            self.ramp_irq |= irq_mask;
        } else {
            self.ramp_irq &= !irq_mask;
        }
        if old != self.ramp_irq {
            self.check_voice_irq(bus);
        }
    }

    /// Wave control read: stored bits plus the live IRQ-pending bit 7.
    fn read_wave_ctrl(&self, voice: usize) -> u8 {
        let mut ret = self.voices[voice].wave_ctrl.bits();
        if self.wave_irq & self.voices[voice].irq_mask != 0 {
            ret |= 0x80;
        }
        ret
    }

    /// Ramp control read, same composition as the wave side.
    fn read_ramp_ctrl(&self, voice: usize) -> u8 {
        let mut ret = self.voices[voice].ramp_ctrl.bits();
        if self.ramp_irq & self.voices[voice].irq_mask != 0 {
            ret |= 0x80;
        }
        ret
    }

    /// Execute a data-port read for the selected register.
    pub(super) fn execute_reg_read(&mut self, bus: &mut impl GusBus) -> u16 {
        let voice = self.cur_voice;
        match self.reg_select {
            // DMA control; reading acknowledges the terminal-count IRQ
            0x41 => {
                let mut ret = self.dma_control & 0xbf;
                ret |= (self.irq_status & 0x80) >> 1;
                self.irq_status &= 0x7f;
                u16::from(ret) << 8
            }
            0x42 => self.dma_addr,
            0x45 => u16::from(self.timer_control) << 8,
            // DMA sampling control mirrors 0x41 without the acknowledge
            0x49 => {
                let mut ret = self.dma_control & 0xbf;
                ret |= (self.irq_status & 0x80) >> 1;
                u16::from(ret) << 8
            }
            0x80 => u16::from(self.read_wave_ctrl(voice)) << 8,
            0x82 => (self.voices[voice].wave_start >> 16) as u16,
            0x83 => self.voices[voice].wave_start as u16,
            0x89 => (self.voices[voice].current_vol_idx << 4) as u16,
            0x8a => (self.voices[voice].wave_addr >> 16) as u16,
            0x8b => self.voices[voice].wave_addr as u16,
            0x8d => u16::from(self.read_ramp_ctrl(voice)) << 8,
            // General voice IRQ status; reading acknowledges the cursor
            // voice and advances the cursor
            0x8f => {
                let mut ret = self.irq_chan as u8 | 0x20;
                let mask = 1u32 << self.irq_chan;
                if self.ramp_irq & mask == 0 {
                    ret |= 0x40;
                }
                if self.wave_irq & mask == 0 {
                    ret |= 0x80;
                }
                self.ramp_irq &= !mask;
                self.wave_irq &= !mask;
                self.check_voice_irq(bus);
                u16::from(ret) << 8
            }
            other => {
                debug!("GUS: read from unimplemented register {other:#x}");
                self.reg_data
            }
        }
    }

    /// Execute a data-port write for the selected register.
    pub(super) fn execute_reg_write(&mut self, bus: &mut impl GusBus) {
        let voice = self.cur_voice;
        let data = self.reg_data;
        match self.reg_select {
            0x0 => self.write_wave_ctrl(bus, voice, (data >> 8) as u8),
            0x1 => self.voices[voice].set_wave_freq(data),
            0x2 => {
                let addr = u32::from(data & 0x1fff) << 16;
                let v = &mut self.voices[voice];
                v.wave_start = (v.wave_start & WAVE_MSW_MASK) | addr;
            }
            0x3 => {
                let v = &mut self.voices[voice];
                v.wave_start = (v.wave_start & WAVE_LSW_MASK) | u32::from(data);
            }
            0x4 => {
                let addr = u32::from(data & 0x1fff) << 16;
                let v = &mut self.voices[voice];
                v.wave_end = (v.wave_end & WAVE_MSW_MASK) | addr;
            }
            0x5 => {
                let v = &mut self.voices[voice];
                v.wave_end = (v.wave_end & WAVE_LSW_MASK) | u32::from(data);
            }
            0x6 => self.voices[voice].set_ramp_rate((data >> 8) as u8),
            0x7 => self.voices[voice].start_vol_idx = u32::from((data >> 8) as u8) << 4,
            0x8 => self.voices[voice].end_vol_idx = u32::from((data >> 8) as u8) << 4,
            0x9 => self.voices[voice].current_vol_idx = u32::from(data >> 4),
            0xa => {
                let addr = u32::from(data & 0x1fff) << 16;
                let v = &mut self.voices[voice];
                v.wave_addr = (v.wave_addr & WAVE_MSW_MASK) | addr;
            }
            0xb => {
                let v = &mut self.voices[voice];
                v.wave_addr = (v.wave_addr & WAVE_LSW_MASK) | u32::from(data);
            }
            0xc => self.voices[voice].set_pan_pot((data >> 8) as u8),
            0xd => self.write_ramp_ctrl(bus, voice, (data >> 8) as u8),
            0xe => self.write_active_voices(bus),
            // Undocumented register poked by Fast Tracker 2
            0x10 => {}
            0x41 => {
                self.dma_control = (data >> 8) as u8;
                self.dma_armed = self.dma_control & 0x1 != 0;
            }
            0x42 => self.dma_addr = data,
            0x43 => {
                self.dram_addr = (self.dram_addr & 0xff_0000) | u32::from(data);
            }
            0x44 => {
                self.dram_addr = (self.dram_addr & 0xffff) | (u32::from(data >> 8) << 16);
            }
            0x45 => {
                self.timer_control = (data >> 8) as u8;
                self.timers[0].raise_irq = self.timer_control & 0x04 != 0;
                if !self.timers[0].raise_irq {
                    self.irq_status &= !0x04;
                }
                self.timers[1].raise_irq = self.timer_control & 0x08 != 0;
                if !self.timers[1].raise_irq {
                    self.irq_status &= !0x08;
                }
            }
            0x46 => self.timers[0].set_value((data >> 8) as u8),
            0x47 => self.timers[1].set_value((data >> 8) as u8),
            0x49 => {
                self.samp_control = (data >> 8) as u8;
                self.dma_armed = self.samp_control & 0x1 != 0;
            }
            0x4c => self.device_reset(bus),
            other => {
                debug!("GUS: write to unimplemented register {other:#x} with {data:#x}");
            }
        }
    }

    /// Selector 0x0E: set the active voice count.
    ///
    /// Quirk kept from the hardware: the written byte also overwrites
    /// the register selector itself (JAZZ Jackrabbit depends on it).
    /// The count is clamped into 14..=32 and the synthesis rate follows
    /// it, so every active voice re-derives its stepping increments.
    fn write_active_voices(&mut self, bus: &mut impl GusBus) {
        self.reg_select = (self.reg_data >> 8) as u8;
        let requested = (1 + ((self.reg_data >> 8) & 63) as u32).clamp(MIN_VOICES, MAX_VOICES);
        if requested != self.active_voices {
            self.active_voices = requested;
            self.active_mask = 0xffff_ffff >> (32 - requested);
            self.base_freq =
                (0.5 + 1_000_000.0 / (VOICE_CLOCK_FACTOR * f64::from(requested))) as u32;
            bus.set_output_rate(self.base_freq);
            log::info!(
                "GUS: Activated {} voices running at {} Hz",
                self.active_voices,
                self.base_freq
            );
        }
        // Always re-apply the stepping rates, they can change elsewhere
        for voice in self.voices.iter_mut().take(self.active_voices as usize) {
            voice.refresh_rates();
        }
        bus.enable_output(true);
    }
}
