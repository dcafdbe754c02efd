//! GF1 device core
//!
//! Owns the sample RAM, the 32 voices, both timers and the whole global
//! register file, and exposes the card to its host as port I/O plus three
//! callbacks (render block, timer event, DMA unmask). All host-visible
//! behavior routes through [`Gf1::read`], [`Gf1::write`],
//! [`Gf1::render_block`], [`Gf1::timer_event`] and
//! [`Gf1::dma_event`](Gf1::dma_event).

use log::{debug, info};

use super::constants::{
    BUFFER_FRAMES, DMA_LINES, GUS_RAM_SIZE, IRQ_LINES, PAN_POSITIONS, TIMER_1_TICK, TIMER_2_TICK,
    VOLUME_POSITIONS, VOLUME_SCALE_DIV,
};
use super::tables::{pan_scalars, volume_scalars, StereoFrame};
use super::timer::GusTimer;
use super::voice::Voice;
use crate::bus::{GusBus, IoWidth, NullBus};
use crate::config::GusConfig;
use crate::util::ceil_udivide;

/// The GF1 synthesizer, one card's worth of state.
pub struct Gf1 {
    pub(super) ram: Box<[u8; GUS_RAM_SIZE]>,
    pub(super) voices: Vec<Voice>,
    pub(super) vol_scalars: Box<[f32; VOLUME_POSITIONS]>,
    pub(super) pan_scalars: [StereoFrame; PAN_POSITIONS],
    pub(super) timers: [GusTimer; 2],

    // Selector protocol state
    pub(super) reg_select: u8,
    pub(super) reg_data: u16,
    pub(super) cur_voice: usize,
    pub(super) dram_addr: u32,

    // Global control registers
    pub(super) dma_control: u8,
    pub(super) dma_addr: u16,
    pub(super) timer_control: u8,
    pub(super) samp_control: u8,
    pub(super) mix_control: u8,
    pub(super) active_voices: u32,
    pub(super) active_mask: u32,
    pub(super) base_freq: u32,

    // IRQ aggregation
    pub(super) irq_status: u8,
    pub(super) irq_chan: u32,
    pub(super) wave_irq: u32,
    pub(super) ramp_irq: u32,
    pub(super) irq_enabled: bool,
    pub(super) change_irq_dma: bool,

    pub(super) adlib_command: u8,
    pub(super) dma_armed: bool,
    pub(super) peak_amplitude: StereoFrame,

    // Wiring
    port_base: u16,
    pub(super) dma1: u8,
    dma2: u8,
    pub(super) irq1: u8,
    irq2: u8,
}

impl Gf1 {
    /// Cold-init a card from its configuration: build the tables, create
    /// the 32 voices with zeroed sample RAM, and run the power-on reset
    /// cycle (reset asserted, then deasserted).
    pub fn new(config: &GusConfig) -> Self {
        let dma = config.dma_line();
        let irq = config.irq_line();
        let mut chip = Gf1 {
            ram: vec![0u8; GUS_RAM_SIZE]
                .into_boxed_slice()
                .try_into()
                .expect("sample RAM allocation"),
            voices: (0..super::constants::MAX_VOICES as u8).map(Voice::new).collect(),
            vol_scalars: volume_scalars(),
            pan_scalars: pan_scalars(),
            timers: [GusTimer::new(TIMER_1_TICK), GusTimer::new(TIMER_2_TICK)],
            reg_select: 0,
            reg_data: 0,
            cur_voice: 0,
            dram_addr: 0,
            dma_control: 0,
            dma_addr: 0,
            timer_control: 0,
            samp_control: 0,
            mix_control: 0,
            active_voices: 0,
            active_mask: 0,
            base_freq: 0,
            irq_status: 0,
            irq_chan: 0,
            wave_irq: 0,
            ramp_irq: 0,
            irq_enabled: false,
            change_irq_dma: false,
            adlib_command: 0,
            dma_armed: false,
            peak_amplitude: StereoFrame { left: 1.0, right: 1.0 },
            port_base: config.port_base.wrapping_sub(0x200),
            dma1: dma,
            dma2: dma,
            irq1: irq,
            irq2: irq,
        };
        chip.reg_data = 0x1;
        chip.device_reset(&mut NullBus);
        chip.reg_data = 0x0;
        chip
    }

    /// Host port read at an absolute port address.
    ///
    /// Ports the card does not decode read as 0xFF.
    pub fn read(&mut self, bus: &mut impl GusBus, port: u16, width: IoWidth) -> u16 {
        match port.wrapping_sub(self.port_base) {
            0x206 => u16::from(self.irq_status),
            0x208 => {
                let mut status = 0u8;
                if self.timers[0].reached {
                    status |= 1 << 6;
                }
                if self.timers[1].reached {
                    status |= 1 << 5;
                }
                if status & 0x60 != 0 {
                    status |= 1 << 7;
                }
                if self.irq_status & 0x04 != 0 {
                    status |= 1 << 2;
                }
                if self.irq_status & 0x08 != 0 {
                    status |= 1 << 1;
                }
                u16::from(status)
            }
            0x20a => u16::from(self.adlib_command),
            0x302 => self.cur_voice as u16,
            0x303 => u16::from(self.reg_select),
            0x304 => match width {
                IoWidth::Word => self.execute_reg_read(bus),
                IoWidth::Byte => self.execute_reg_read(bus) & 0xff,
            },
            0x305 => self.execute_reg_read(bus) >> 8,
            0x307 => {
                if (self.dram_addr as usize) < GUS_RAM_SIZE {
                    u16::from(self.ram[self.dram_addr as usize])
                } else {
                    0
                }
            }
            offset => {
                debug!("GUS: read from undecoded port offset {offset:#x}");
                0xff
            }
        }
    }

    /// Host port write at an absolute port address.
    pub fn write(&mut self, bus: &mut impl GusBus, port: u16, val: u16, width: IoWidth) {
        match port.wrapping_sub(self.port_base) {
            0x200 => {
                self.mix_control = val as u8;
                self.change_irq_dma = true;
            }
            0x208 => self.adlib_command = val as u8,
            0x209 => self.write_timer_control(bus, val as u8),
            0x20b => self.write_irq_dma_latch(val as u8),
            0x302 => {
                self.cur_voice = (val & 31) as usize;
            }
            0x303 => {
                self.reg_select = val as u8;
                self.reg_data = 0;
            }
            0x304 => {
                self.reg_data = val;
                if width == IoWidth::Word {
                    self.execute_reg_write(bus);
                }
            }
            0x305 => {
                self.reg_data = (self.reg_data & 0x00ff) | (val << 8);
                self.execute_reg_write(bus);
            }
            0x307 => {
                if (self.dram_addr as usize) < GUS_RAM_SIZE {
                    self.ram[self.dram_addr as usize] = val as u8;
                }
            }
            offset => {
                debug!("GUS: write {val:#x} to undecoded port offset {offset:#x}");
            }
        }
    }

    /// AdLib-style timer control port (offset 0x209).
    fn write_timer_control(&mut self, bus: &mut impl GusBus, val: u8) {
        if val & 0x80 != 0 {
            self.timers[0].reached = false;
            self.timers[1].reached = false;
            return;
        }
        self.timers[0].masked = val & 0x40 != 0;
        self.timers[1].masked = val & 0x20 != 0;
        for (index, start_bit) in [(0usize, 0x01u8), (1, 0x02)] {
            if val & start_bit != 0 {
                if !self.timers[index].running {
                    bus.add_event(self.timers[index].delay, index);
                    self.timers[index].running = true;
                }
            } else {
                self.timers[index].running = false;
            }
        }
    }

    /// IRQ/DMA selection latch (offset 0x20B), armed by a mix-control
    /// write. Encoded values index fixed line tables; zero entries keep
    /// the current assignment.
    fn write_irq_dma_latch(&mut self, val: u8) {
        if !self.change_irq_dma {
            return;
        }
        self.change_irq_dma = false;
        if self.mix_control & 0x40 != 0 {
            let line = IRQ_LINES[(val & 0x7) as usize];
            if line != 0 {
                self.irq1 = line;
                debug!("GUS: assigned to IRQ {line}");
            }
        } else {
            let line = DMA_LINES[(val & 0x7) as usize];
            if line != 0 {
                self.dma1 = line;
                debug!("GUS: assigned to DMA {line}");
            }
        }
    }

    /// Delayed-event callback for timer `index`, scheduled through
    /// [`GusBus::add_event`].
    pub fn timer_event(&mut self, bus: &mut impl GusBus, index: usize) {
        if !self.timers[index].masked {
            self.timers[index].reached = true;
        }
        if self.timers[index].raise_irq {
            self.irq_status |= 0x4 << index;
            self.check_irq(bus);
        }
        if self.timers[index].running {
            bus.add_event(self.timers[index].delay, index);
        }
    }

    /// Raise the output line if anything is pending and line IRQs are
    /// enabled through the mix control.
    pub(super) fn check_irq(&mut self, bus: &mut impl GusBus) {
        if self.irq_status != 0 && self.mix_control & 0x08 != 0 {
            bus.activate_irq(self.irq1);
        }
    }

    /// Fold the per-voice wave/ramp bitsets into the status byte, raise
    /// the line if warranted, and park the IRQ cursor on the next pending
    /// voice.
    pub(super) fn check_voice_irq(&mut self, bus: &mut impl GusBus) {
        self.irq_status &= 0x9f;
        let totalmask = (self.ramp_irq | self.wave_irq) & self.active_mask;
        if totalmask == 0 {
            return;
        }
        if self.ramp_irq != 0 {
            self.irq_status |= 0x40;
        }
        if self.wave_irq != 0 {
            self.irq_status |= 0x20;
        }
        self.check_irq(bus);
        loop {
            let check = 1u32 << self.irq_chan;
            if totalmask & check != 0 {
                return;
            }
            self.irq_chan += 1;
            if self.irq_chan >= self.active_voices {
                self.irq_chan = 0;
            }
        }
    }

    /// Mixer callback: render up to 64 stereo frames into `out`.
    ///
    /// Accumulates all active voices into a stack-local float buffer,
    /// soft-limits if the tracked peak has reached the 16-bit ceiling,
    /// and converts to interleaved i16. Voice IRQs raised while stepping
    /// become visible when this returns.
    pub fn render_block(&mut self, bus: &mut impl GusBus, out: &mut [[i16; 2]]) {
        debug_assert!(out.len() <= BUFFER_FRAMES);
        let len = out.len().min(BUFFER_FRAMES);
        let mut accumulator = [[0.0f32; 2]; BUFFER_FRAMES];

        let active = self.active_voices as usize;
        for voice in self.voices.iter_mut().take(active) {
            voice.generate(
                &self.ram,
                &self.vol_scalars,
                &self.pan_scalars,
                &mut accumulator[..len],
                &mut self.peak_amplitude,
                &mut self.wave_irq,
                &mut self.ramp_irq,
            );
        }

        if !self.soft_limit(&accumulator, out, len) {
            for (frame, acc) in out.iter_mut().zip(accumulator.iter()).take(len) {
                frame[0] = acc[0] as i16;
                frame[1] = acc[1] as i16;
            }
        }
        self.check_voice_irq(bus);
    }

    /// Scale the block down when the running peak has hit the i16
    /// ceiling, then release the limit by one volume-table step per
    /// block (about 0.235%). Returns false when no limiting was needed.
    fn soft_limit(
        &mut self,
        accumulator: &[[f32; 2]; BUFFER_FRAMES],
        out: &mut [[i16; 2]],
        len: usize,
    ) -> bool {
        const MAX_ALLOWED: f32 = (i16::MAX - 1) as f32;
        if self.peak_amplitude.left < MAX_ALLOWED && self.peak_amplitude.right < MAX_ALLOWED {
            return false;
        }

        // One side may still be under the ceiling; cap its ratio at unity
        let ratio = StereoFrame {
            left: (MAX_ALLOWED / self.peak_amplitude.left).min(1.0),
            right: (MAX_ALLOWED / self.peak_amplitude.right).min(1.0),
        };
        for (frame, acc) in out.iter_mut().zip(accumulator.iter()).take(len) {
            frame[0] = (acc[0] * ratio.left) as i16;
            frame[1] = (acc[1] * ratio.right) as i16;
        }

        let release_amount = MAX_ALLOWED * (VOLUME_SCALE_DIV as f32 - 1.0);
        if self.peak_amplitude.left > MAX_ALLOWED {
            self.peak_amplitude.left -= release_amount;
        }
        if self.peak_amplitude.right > MAX_ALLOWED {
            self.peak_amplitude.right -= release_amount;
        }
        true
    }

    /// Soft reset, reached through selector 0x4C.
    ///
    /// Data bit 0 asserts the master reset: stop and re-park every voice,
    /// clear both timers and the IRQ machinery, and log the playback
    /// statistics gathered since the last reset. Data bit 2 gates the
    /// card's IRQ output.
    pub(super) fn device_reset(&mut self, bus: &mut impl GusBus) {
        if self.reg_data & 0x1 == 0x1 {
            self.log_stats(bus);

            self.adlib_command = 85;
            self.irq_status = 0;
            self.timers[0].reset();
            self.timers[1].reset();
            self.change_irq_dma = false;
            self.mix_control = 0x0b; // latches enabled, LINEs disabled

            for i in 0..self.voices.len() {
                self.voices[i].current_vol_idx = 0;
                self.write_wave_ctrl(bus, i, 0x1);
                self.write_ramp_ctrl(bus, i, 0x1);
                self.voices[i].set_pan_pot(0x7);
                self.voices[i].clear_stats();
            }
            self.irq_chan = 0;
            self.peak_amplitude = StereoFrame { left: 1.0, right: 1.0 };
        }
        self.irq_enabled = self.reg_data & 0x4 != 0;
    }

    /// Characterize the audio played since the previous reset.
    ///
    /// Skipped when less than ten seconds were generated or the peak
    /// never moved, so quiet probe-and-exit programs stay silent in the
    /// logs.
    fn log_stats(&self, bus: &impl GusBus) {
        let mut combined_8bit_ms = 0u32;
        let mut combined_16bit_ms = 0u32;
        let mut used_8bit_voices = 0u32;
        let mut used_16bit_voices = 0u32;
        for voice in &self.voices {
            if voice.generated_8bit_ms > 0 {
                combined_8bit_ms += voice.generated_8bit_ms;
                used_8bit_voices += 1;
            }
            if voice.generated_16bit_ms > 0 {
                combined_16bit_ms += voice.generated_16bit_ms;
                used_16bit_voices += 1;
            }
        }
        let combined_ms = combined_8bit_ms + combined_16bit_ms;
        if combined_ms < 10_000
            || (self.peak_amplitude.left + self.peak_amplitude.right) < 10.0
            || used_8bit_voices + used_16bit_voices == 0
        {
            return;
        }

        if used_16bit_voices == 0 {
            info!("GUS: Audio comprised of 8-bit samples from {used_8bit_voices} voices");
        } else if used_8bit_voices == 0 {
            info!("GUS: Audio comprised of 16-bit samples from {used_16bit_voices} voices");
        } else {
            let ratio_8bit = ceil_udivide(100 * combined_8bit_ms, combined_ms);
            let ratio_16bit = ceil_udivide(100 * combined_16bit_ms, combined_ms);
            info!(
                "GUS: Audio was made up of {ratio_8bit}% 8-bit {used_8bit_voices}-voice and \
                 {ratio_16bit}% 16-bit {used_16bit_voices}-voice samples"
            );
        }

        let (gain_left, gain_right) = bus.output_gains();
        let mixer_scalar = gain_left.max(gain_right);
        let peak_ratio = f64::from(
            mixer_scalar * self.peak_amplitude.left.max(self.peak_amplitude.right)
                / f32::from(i16::MAX),
        )
        .min(1.0);
        info!("GUS: Peak amplitude reached {:.0}% of max", 100.0 * peak_ratio);

        if peak_ratio < 0.6 {
            let multiplier = (100.0 * f64::from(mixer_scalar) / peak_ratio) as u16;
            info!(
                "GUS: If it should be louder, {} {multiplier}",
                if (mixer_scalar - 1.0).abs() > 0.01 {
                    "adjust mixer gus to"
                } else {
                    "use: mixer gus"
                }
            );
        }
    }

    // --- inspection helpers ---

    /// Borrow a voice for inspection.
    pub fn voice(&self, index: usize) -> &Voice {
        &self.voices[index]
    }

    /// The per-voice wave boundary IRQ bitset.
    pub fn wave_irq_bits(&self) -> u32 {
        self.wave_irq
    }

    /// The per-voice ramp boundary IRQ bitset.
    pub fn ramp_irq_bits(&self) -> u32 {
        self.ramp_irq
    }

    /// Number of currently active voices.
    pub fn active_voices(&self) -> u32 {
        self.active_voices
    }

    /// Current synthesis rate in Hz (zero until voices are activated).
    pub fn base_freq(&self) -> u32 {
        self.base_freq
    }

    /// Borrow the sample RAM.
    pub fn ram(&self) -> &[u8] {
        &self.ram[..]
    }

    /// Copy `data` into sample RAM at `addr`, truncating at the end of
    /// RAM. Convenience for hosts that sidestep the peek/poke port.
    pub fn load_ram(&mut self, addr: usize, data: &[u8]) {
        if addr >= GUS_RAM_SIZE {
            return;
        }
        let end = GUS_RAM_SIZE.min(addr + data.len());
        self.ram[addr..end].copy_from_slice(&data[..end - addr]);
    }
}

impl std::fmt::Debug for Gf1 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gf1")
            .field("active_voices", &self.active_voices)
            .field("base_freq", &self.base_freq)
            .field("irq_status", &self.irq_status)
            .field("mix_control", &self.mix_control)
            .field("dma_control", &self.dma_control)
            .finish()
    }
}
