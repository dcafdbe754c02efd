//! GF1 voice synthesis unit
//!
//! Each voice steps a 32-bit fixed-point address (9 fractional bits)
//! through shared sample RAM, scales the fetched sample by its volume
//! ramp position, and pans the result into the stereo accumulator. Wave
//! and ramp stepping share the same control-bit layout and the same
//! loop / bidirectional / boundary-IRQ rules.

use bitflags::bitflags;

use super::constants::{
    GUS_RAM_SIZE, PAN_POSITIONS, VOLUME_POSITIONS, WAVE_FRACT, WAVE_FRACT_MASK,
};
use super::tables::StereoFrame;
use crate::util::ceil_udivide;

bitflags! {
    /// Control bits shared by the wave and ramp state machines.
    ///
    /// Bit 2 is dual-purpose: in wave control it selects 16-bit samples,
    /// in ramp control it gates boundary handling off (rollover mode).
    /// Bit 7 is never stored; reads compose it from the IRQ bitsets.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct VoiceCtrl: u8 {
        /// Voice is stopped (set by host or latched at a one-shot boundary)
        const STOPPED = 0x01;
        /// Stop at the next boundary
        const STOP = 0x02;
        /// Wave control: fetch 16-bit samples
        const WIDTH_16BIT = 0x04;
        /// Ramp control: boundary rolls the address over without looping
        const ROLLOVER = 0x04;
        /// Reflect or wrap at the boundary instead of stopping
        const LOOP = 0x08;
        /// With LOOP: reverse direction at each boundary
        const BIDIRECTIONAL = 0x10;
        /// Raise the per-voice IRQ bit at the boundary
        const RAISE_IRQ = 0x20;
        /// Step downward
        const DECREASING = 0x40;
    }
}

impl VoiceCtrl {
    /// Both halt bits; a state machine with either set does not step.
    const HALTED: VoiceCtrl = VoiceCtrl::STOPPED.union(VoiceCtrl::STOP);
}

/// Sample width of a voice, selected by wave-control bit 2.
///
/// Modelled as a tagged variant rather than a per-fetch indirect call;
/// the render loop dispatches once per block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleWidth {
    /// Signed 8-bit samples, linearly addressed
    Eight,
    /// 16-bit samples through the banked address translation
    Sixteen,
}

/// One of the 32 wavetable voices.
#[derive(Debug, Clone)]
pub struct Voice {
    /// Loop start, 32-bit fixed point with 9 fractional bits
    pub wave_start: u32,
    /// Loop end, same format
    pub wave_end: u32,
    /// Current playback position, same format
    pub wave_addr: u32,
    /// Position increment per output frame
    pub wave_add: u32,
    /// Wave state-machine control bits
    pub wave_ctrl: VoiceCtrl,
    /// Latched 16-bit frequency register backing `wave_add`
    pub wave_freq: u16,

    /// Ramp start index into the volume table
    pub start_vol_idx: u32,
    /// Ramp end index
    pub end_vol_idx: u32,
    /// Current ramp position, always within the volume table (0..4096)
    pub current_vol_idx: u32,
    /// Ramp increment per output frame
    pub incr_vol_idx: u32,

    /// Latched 8-bit ramp-rate register backing `incr_vol_idx`
    pub ramp_rate: u8,
    /// Ramp state-machine control bits
    pub ramp_ctrl: VoiceCtrl,

    /// Pan position, 0 (left) through 15 (right)
    pub pan_pot: u8,
    /// Immutable voice number
    pub index: u8,
    /// `1 << index`, the voice's bit in the IRQ bitsets
    pub irq_mask: u32,

    width: SampleWidth,

    /// Blocks of 8-bit audio generated since the last reset
    pub generated_8bit_ms: u32,
    /// Blocks of 16-bit audio generated since the last reset
    pub generated_16bit_ms: u32,
}

impl Voice {
    /// Create voice number `index` in its stopped power-on state.
    pub fn new(index: u8) -> Self {
        Voice {
            wave_start: 0,
            wave_end: 0,
            wave_addr: 0,
            wave_add: 0,
            wave_ctrl: VoiceCtrl::HALTED,
            wave_freq: 0,
            start_vol_idx: 0,
            end_vol_idx: 0,
            current_vol_idx: 0,
            incr_vol_idx: 0,
            ramp_rate: 0,
            ramp_ctrl: VoiceCtrl::HALTED,
            pan_pot: 7,
            index,
            irq_mask: 1 << index,
            width: SampleWidth::Eight,
            generated_8bit_ms: 0,
            generated_16bit_ms: 0,
        }
    }

    /// Zero the per-width generation counters.
    pub fn clear_stats(&mut self) {
        self.generated_8bit_ms = 0;
        self.generated_16bit_ms = 0;
    }

    /// Current sample width, as selected by the last wave-control write.
    pub fn width(&self) -> SampleWidth {
        self.width
    }

    /// Store the wave control bits and pick the matching sample width.
    ///
    /// Bit 7 is discarded; the caller owns the IRQ bitset side effects.
    pub fn set_wave_ctrl(&mut self, val: u8) {
        self.wave_ctrl = VoiceCtrl::from_bits_retain(val & 0x7f);
        self.width = if self.wave_ctrl.contains(VoiceCtrl::WIDTH_16BIT) {
            SampleWidth::Sixteen
        } else {
            SampleWidth::Eight
        };
    }

    /// Store the ramp control bits. Same caveats as [`set_wave_ctrl`].
    ///
    /// [`set_wave_ctrl`]: Voice::set_wave_ctrl
    pub fn set_ramp_ctrl(&mut self, val: u8) {
        self.ramp_ctrl = VoiceCtrl::from_bits_retain(val & 0x7f);
    }

    /// Latch the frequency register and derive the per-frame increment.
    pub fn set_wave_freq(&mut self, val: u16) {
        self.wave_freq = val;
        self.wave_add = ceil_udivide(u32::from(val), 2);
    }

    /// Latch the ramp-rate register and derive the per-frame increment.
    ///
    /// The divider is an 8-bit quantity on the hardware: the top rate
    /// setting shifts `1` past eight bits, truncates to zero, and stalls
    /// the ramp entirely.
    pub fn set_ramp_rate(&mut self, val: u8) {
        self.ramp_rate = val;
        let scale = u32::from(val & 63);
        let divider = u32::from((1u32 << (3 * (val >> 6))) as u8);
        self.incr_vol_idx = if scale == 0 || divider == 0 {
            0
        } else {
            ceil_udivide(scale, divider)
        };
    }

    /// Re-derive both stepping increments from the latched registers.
    ///
    /// Called when the active-voice count (and with it the frame rate)
    /// changes.
    pub fn refresh_rates(&mut self) {
        self.set_wave_freq(self.wave_freq);
        self.set_ramp_rate(self.ramp_rate);
    }

    /// Set the pan position, clamped to the highest (full right) slot.
    pub fn set_pan_pot(&mut self, pos: u8) {
        self.pan_pot = pos.min(PAN_POSITIONS as u8 - 1);
    }

    /// Fetch the sample at `wave_addr` as an 8-bit voice.
    ///
    /// The byte is sign-extended, optionally blended with the next byte
    /// when oversampling (increment below one integer step), and scaled
    /// up so the result spans the signed 16-bit range.
    #[inline]
    fn sample8(&self, ram: &[u8; GUS_RAM_SIZE]) -> f32 {
        let use_addr = ((self.wave_addr >> WAVE_FRACT) as usize) & (GUS_RAM_SIZE - 1);
        let mut w1 = f32::from(ram[use_addr] as i8);
        if self.wave_add < (1 << WAVE_FRACT) {
            let next_addr = (use_addr + 1) & (GUS_RAM_SIZE - 1);
            let w2 = f32::from(ram[next_addr] as i8);
            let scale = (self.wave_addr & WAVE_FRACT_MASK) as f32 / (1 << WAVE_FRACT) as f32;
            w1 += (w2 - w1) * scale;
        }
        w1 * 256.0
    }

    /// Fetch the sample at `wave_addr` as a 16-bit voice.
    ///
    /// 16-bit data lives in a banked layout: the top two address bits
    /// select a 256 KiB bank and the low 17 bits double into it. The
    /// current word is read with an unsigned low byte and sign-extended
    /// high byte, while the interpolation word sign-extends both bytes;
    /// both asymmetries are observable hardware semantics and kept as-is.
    #[inline]
    fn sample16(&self, ram: &[u8; GUS_RAM_SIZE]) -> f32 {
        const RAM_MASK: usize = GUS_RAM_SIZE - 1;
        let base = (self.wave_addr >> WAVE_FRACT) as usize;
        let hold_addr = base & 0xc0000;
        let use_addr = hold_addr | ((base & 0x1ffff) << 1);

        let lo = i32::from(ram[use_addr & RAM_MASK]);
        let hi = i32::from(ram[(use_addr + 1) & RAM_MASK] as i8);
        let mut w1 = (lo | (hi << 8)) as f32;

        if self.wave_add < (1 << WAVE_FRACT) {
            let lo2 = i32::from(ram[(use_addr + 2) & RAM_MASK] as i8);
            let hi2 = i32::from(ram[(use_addr + 3) & RAM_MASK] as i8);
            let w2 = (lo2 | (hi2 << 8)) as f32;
            let scale = (self.wave_addr & WAVE_FRACT_MASK) as f32 / (1 << WAVE_FRACT) as f32;
            w1 += (w2 - w1) * scale;
        }
        w1
    }

    /// Advance the wave address one frame and handle boundary crossings.
    #[inline]
    fn wave_update(&mut self, wave_irq: &mut u32) {
        if self.wave_ctrl.intersects(VoiceCtrl::HALTED) {
            return;
        }
        let overshoot: i32;
        if self.wave_ctrl.contains(VoiceCtrl::DECREASING) {
            self.wave_addr = self.wave_addr.wrapping_sub(self.wave_add);
            overshoot = self.wave_start.wrapping_sub(self.wave_addr) as i32;
        } else {
            self.wave_addr = self.wave_addr.wrapping_add(self.wave_add);
            overshoot = self.wave_addr.wrapping_sub(self.wave_end) as i32;
        }
        // Not yet at a boundary
        if overshoot < 0 {
            return;
        }
        if self.wave_ctrl.contains(VoiceCtrl::RAISE_IRQ) {
            *wave_irq |= self.irq_mask;
        }
        // Rollover gate: the ramp control keeps the address running past
        // the boundary (PCM streaming mode)
        if self.ramp_ctrl.contains(VoiceCtrl::ROLLOVER) {
            return;
        }
        if self.wave_ctrl.contains(VoiceCtrl::LOOP) {
            if self.wave_ctrl.contains(VoiceCtrl::BIDIRECTIONAL) {
                self.wave_ctrl.toggle(VoiceCtrl::DECREASING);
            }
            self.wave_addr = if self.wave_ctrl.contains(VoiceCtrl::DECREASING) {
                self.wave_end.wrapping_sub(overshoot as u32)
            } else {
                self.wave_start.wrapping_add(overshoot as u32)
            };
        } else {
            // One-shot: latch stopped and park at the boundary
            self.wave_ctrl.insert(VoiceCtrl::STOPPED);
            self.wave_addr = if self.wave_ctrl.contains(VoiceCtrl::DECREASING) {
                self.wave_start
            } else {
                self.wave_end
            };
        }
    }

    /// Advance the volume ramp one frame and handle boundary crossings.
    ///
    /// Mirrors [`wave_update`] over the volume indices; boundary results
    /// are clamped into the table so the current index never escapes it.
    ///
    /// [`wave_update`]: Voice::wave_update
    #[inline]
    fn ramp_update(&mut self, ramp_irq: &mut u32) {
        if self.ramp_ctrl.intersects(VoiceCtrl::HALTED) {
            return;
        }
        let remaining: i32;
        if self.ramp_ctrl.contains(VoiceCtrl::DECREASING) {
            self.current_vol_idx = self.current_vol_idx.wrapping_sub(self.incr_vol_idx);
            remaining = self.start_vol_idx.wrapping_sub(self.current_vol_idx) as i32;
        } else {
            self.current_vol_idx = self.current_vol_idx.wrapping_add(self.incr_vol_idx);
            remaining = self.current_vol_idx.wrapping_sub(self.end_vol_idx) as i32;
        }
        if remaining < 0 {
            return;
        }
        if self.ramp_ctrl.contains(VoiceCtrl::RAISE_IRQ) {
            *ramp_irq |= self.irq_mask;
        }
        let clamped = |idx: i64| idx.clamp(0, VOLUME_POSITIONS as i64 - 1) as u32;
        if self.ramp_ctrl.contains(VoiceCtrl::LOOP) {
            if self.ramp_ctrl.contains(VoiceCtrl::BIDIRECTIONAL) {
                self.ramp_ctrl.toggle(VoiceCtrl::DECREASING);
            }
            self.current_vol_idx = if self.ramp_ctrl.contains(VoiceCtrl::DECREASING) {
                clamped(i64::from(self.end_vol_idx) - i64::from(remaining))
            } else {
                clamped(i64::from(self.start_vol_idx) + i64::from(remaining))
            };
        } else {
            self.ramp_ctrl.insert(VoiceCtrl::STOPPED);
            self.current_vol_idx = if self.ramp_ctrl.contains(VoiceCtrl::DECREASING) {
                clamped(i64::from(self.start_vol_idx))
            } else {
                clamped(i64::from(self.end_vol_idx))
            };
        }
    }

    /// Mix this voice into `accum` and track the running per-side peak.
    ///
    /// Silent when both state machines are halted on a common bit. The
    /// peak is measured on the accumulated signal after this voice is
    /// added, not on the voice in isolation.
    #[allow(clippy::too_many_arguments)]
    pub fn generate(
        &mut self,
        ram: &[u8; GUS_RAM_SIZE],
        vol_scalars: &[f32; VOLUME_POSITIONS],
        pan_scalars: &[StereoFrame; PAN_POSITIONS],
        accum: &mut [[f32; 2]],
        peak: &mut StereoFrame,
        wave_irq: &mut u32,
        ramp_irq: &mut u32,
    ) {
        if (self.ramp_ctrl & self.wave_ctrl).intersects(VoiceCtrl::HALTED) {
            return;
        }
        match self.width {
            SampleWidth::Eight => {
                self.mix(Self::sample8, ram, vol_scalars, pan_scalars, accum, peak, wave_irq, ramp_irq);
                self.generated_8bit_ms += 1;
            }
            SampleWidth::Sixteen => {
                self.mix(Self::sample16, ram, vol_scalars, pan_scalars, accum, peak, wave_irq, ramp_irq);
                self.generated_16bit_ms += 1;
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    #[inline]
    fn mix(
        &mut self,
        fetch: impl Fn(&Self, &[u8; GUS_RAM_SIZE]) -> f32,
        ram: &[u8; GUS_RAM_SIZE],
        vol_scalars: &[f32; VOLUME_POSITIONS],
        pan_scalars: &[StereoFrame; PAN_POSITIONS],
        accum: &mut [[f32; 2]],
        peak: &mut StereoFrame,
        wave_irq: &mut u32,
        ramp_irq: &mut u32,
    ) {
        let pan = pan_scalars[self.pan_pot as usize];
        for frame in accum.iter_mut() {
            let sample = fetch(self, ram) * vol_scalars[self.current_vol_idx as usize];
            frame[0] += sample * pan.left;
            frame[1] += sample * pan.right;
            peak.left = peak.left.max(frame[0].abs());
            peak.right = peak.right.max(frame[1].abs());
            self.wave_update(wave_irq);
            self.ramp_update(ramp_irq);
        }
    }
}
