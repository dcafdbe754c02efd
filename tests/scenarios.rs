//! End-to-end scenarios driving the chip the way DOS software does:
//! through the port surface, the host callbacks and the DMA unmask path.

use gf1::{DmaChannel, Gf1, GusBus, GusConfig, IoWidth, VoiceCtrl};

#[derive(Default)]
struct MockBus {
    irqs: Vec<u8>,
    events: Vec<(f64, usize)>,
    rate: Option<u32>,
    enabled: bool,
}

impl GusBus for MockBus {
    fn activate_irq(&mut self, line: u8) {
        self.irqs.push(line);
    }
    fn add_event(&mut self, delay_secs: f64, timer: usize) {
        self.events.push((delay_secs, timer));
    }
    fn set_output_rate(&mut self, rate: u32) {
        self.rate = Some(rate);
    }
    fn enable_output(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

struct MockDma {
    data: Vec<u8>,
    wide: bool,
}

impl DmaChannel for MockDma {
    fn transfer_count(&self) -> u16 {
        (self.data.len() / if self.wide { 2 } else { 1 } - 1) as u16
    }
    fn is_16bit(&self) -> bool {
        self.wide
    }
    fn read(&mut self, words: usize, buf: &mut [u8]) -> usize {
        let bytes = (words * if self.wide { 2 } else { 1 })
            .min(self.data.len())
            .min(buf.len());
        buf[..bytes].copy_from_slice(&self.data[..bytes]);
        bytes / if self.wide { 2 } else { 1 }
    }
    fn write(&mut self, _words: usize, _buf: &[u8]) -> usize {
        0
    }
}

fn write_reg(chip: &mut Gf1, bus: &mut MockBus, select: u8, data: u16) {
    chip.write(bus, 0x343, u16::from(select), IoWidth::Byte);
    chip.write(bus, 0x344, data, IoWidth::Word);
}

fn read_reg(chip: &mut Gf1, bus: &mut MockBus, select: u8) -> u16 {
    chip.write(bus, 0x343, u16::from(select), IoWidth::Byte);
    chip.read(bus, 0x344, IoWidth::Word)
}

fn select_voice(chip: &mut Gf1, bus: &mut MockBus, voice: u8) {
    chip.write(bus, 0x342, u16::from(voice), IoWidth::Byte);
}

/// Bring the card up with 14 active voices at 44100 Hz.
fn powered_chip(bus: &mut MockBus) -> Gf1 {
    let mut chip = Gf1::new(&GusConfig::default());
    write_reg(&mut chip, bus, 0x0e, 0x0d00);
    assert_eq!(chip.active_voices(), 14);
    assert_eq!(chip.base_freq(), 44_100);
    chip
}

/// Program voice 0 to play the 64-byte span at 0x80 one byte per frame.
fn program_ramp_voice(chip: &mut Gf1, bus: &mut MockBus, wave_ctrl: u16) {
    let wave: Vec<u8> = (0..64).collect();
    chip.load_ram(0x80, &wave);
    select_voice(chip, bus, 0);
    // Fixed-point addresses: byte 0x80 is 0x80 << 9 = 0x10000
    write_reg(chip, bus, 0x2, 0x0001); // start MSW
    write_reg(chip, bus, 0x3, 0x0000); // start LSW
    write_reg(chip, bus, 0x4, 0x0001); // end MSW (byte 0xC0 = 0x18000)
    write_reg(chip, bus, 0x5, 0x8000); // end LSW
    write_reg(chip, bus, 0xa, 0x0001); // position = start
    write_reg(chip, bus, 0xb, 0x0000);
    write_reg(chip, bus, 0x1, 0x0400); // one integer step per frame
    write_reg(chip, bus, 0x9, 0xfff0); // full volume
    write_reg(chip, bus, 0xd, 0x0300); // ramp halted
    write_reg(chip, bus, 0x0, wave_ctrl);
}

#[test]
fn one_shot_voice_plays_raises_irq_and_stops() {
    let mut bus = MockBus::default();
    let mut chip = powered_chip(&mut bus);
    program_ramp_voice(&mut chip, &mut bus, 0x2000); // running, IRQ at end

    let mut frames = [[0i16; 2]; 64];
    chip.render_block(&mut bus, &mut frames);

    // The rising sample ramp comes through monotonically on both sides
    for pair in frames.windows(2) {
        assert!(pair[1][0] >= pair[0][0]);
        assert!(pair[1][1] >= pair[0][1]);
    }
    assert!(frames[63][0] > 0);

    // The voice crossed its end: IRQ pending, stopped, parked at the end
    assert_eq!(chip.wave_irq_bits(), 1);
    assert!(chip.voice(0).wave_ctrl.contains(VoiceCtrl::STOPPED));
    assert_eq!(chip.voice(0).wave_addr, chip.voice(0).wave_end);
    assert_eq!(chip.read(&mut bus, 0x246, IoWidth::Byte) & 0x20, 0x20);
    assert_eq!(bus.irqs, vec![5]);

    // Control read composes the live pending bit
    select_voice(&mut chip, &mut bus, 0);
    assert_eq!(read_reg(&mut chip, &mut bus, 0x80) >> 8, 0xa1);

    // Voice IRQ status read acknowledges voice 0 (inverted-sense flags)
    assert_eq!(read_reg(&mut chip, &mut bus, 0x8f) >> 8, 0x60);
    assert_eq!(chip.wave_irq_bits(), 0);

    // Stopped voice contributes silence from here on
    let mut tail = [[0i16; 2]; 64];
    chip.render_block(&mut bus, &mut tail);
    assert!(tail.iter().all(|f| f[0] == 0 && f[1] == 0));
}

#[test]
fn bidirectional_loop_reflects_without_irq() {
    let mut bus = MockBus::default();
    let mut chip = powered_chip(&mut bus);
    program_ramp_voice(&mut chip, &mut bus, 0x1800); // loop + bidirectional

    let mut frames = [[0i16; 2]; 64];
    chip.render_block(&mut bus, &mut frames);

    // Reflected at the end: now stepping downward, no IRQ raised
    assert!(chip.voice(0).wave_ctrl.contains(VoiceCtrl::DECREASING));
    assert_eq!(chip.wave_irq_bits(), 0);
    assert!(bus.irqs.is_empty());

    chip.render_block(&mut bus, &mut frames);
    // Still inside the loop span after walking back down
    let addr = chip.voice(0).wave_addr;
    assert!(addr >= chip.voice(0).wave_start && addr <= chip.voice(0).wave_end);
    assert!(!chip.voice(0).wave_ctrl.contains(VoiceCtrl::STOPPED));
}

#[test]
fn dma_load_converts_signed_samples() {
    let mut bus = MockBus::default();
    let mut chip = Gf1::new(&GusConfig::default());
    write_reg(&mut chip, &mut bus, 0x42, 0x0020); // RAM start 0x200
    write_reg(&mut chip, &mut bus, 0x41, 0x8100); // read + 8-bit invert + arm
    let mut chan = MockDma {
        data: vec![0x00, 0x80, 0xff, 0x7f],
        wide: false,
    };
    chip.dma_event(&mut bus, &mut chan);
    assert_eq!(&chip.ram()[0x200..0x204], &[0x80, 0x00, 0x7f, 0xff]);
    // TC IRQ was off (bit 5 clear)
    assert!(bus.irqs.is_empty());
    assert_eq!(chip.read(&mut bus, 0x246, IoWidth::Byte) & 0x80, 0);
}

#[test]
fn timer_fires_raises_irq_and_reschedules() {
    let mut bus = MockBus::default();
    let mut chip = Gf1::new(&GusConfig::default());
    write_reg(&mut chip, &mut bus, 0x46, 0xf600); // period = 10 ticks
    write_reg(&mut chip, &mut bus, 0x45, 0x0400); // timer 0 raises IRQ
    chip.write(&mut bus, 0x249, 0x01, IoWidth::Byte); // start, unmasked

    assert_eq!(bus.events.len(), 1);
    let (delay, index) = bus.events[0];
    assert_eq!(index, 0);
    assert!((delay - 800e-6).abs() < 1e-9);

    chip.timer_event(&mut bus, 0);
    // Reached + IRQ status bit 0x04, line raised, next event scheduled
    assert_eq!(chip.read(&mut bus, 0x246, IoWidth::Byte) & 0x04, 0x04);
    assert_eq!(bus.irqs, vec![5]);
    let status = chip.read(&mut bus, 0x248, IoWidth::Byte);
    assert_eq!(status & 0xc4, 0xc4);
    assert_eq!(bus.events.len(), 2);

    // Bit 7 clears both reached flags; the IRQ status bit survives
    chip.write(&mut bus, 0x249, 0x80, IoWidth::Byte);
    assert_eq!(chip.read(&mut bus, 0x248, IoWidth::Byte), 0x04);
}

#[test]
fn masked_timer_never_sets_reached() {
    let mut bus = MockBus::default();
    let mut chip = Gf1::new(&GusConfig::default());
    write_reg(&mut chip, &mut bus, 0x47, 0xff00);
    chip.write(&mut bus, 0x249, 0x22, IoWidth::Byte); // start t1 masked
    chip.timer_event(&mut bus, 1);
    assert_eq!(chip.read(&mut bus, 0x248, IoWidth::Byte) & 0x20, 0);
}

#[test]
fn active_voice_change_reprograms_rate() {
    let mut bus = MockBus::default();
    let mut chip = powered_chip(&mut bus);
    assert_eq!(bus.rate, Some(44_100));
    assert!(bus.enabled);

    // All 32 voices lowers the per-voice rate
    write_reg(&mut chip, &mut bus, 0x0e, 0x1f00);
    assert_eq!(chip.active_voices(), 32);
    assert_eq!(chip.base_freq(), 19_294);
    assert_eq!(bus.rate, Some(19_294));
    // Selector quirk: the write replaced the selector with its data byte
    assert_eq!(chip.read(&mut bus, 0x343, IoWidth::Byte), 0x1f);
}

#[test]
fn voice_irq_cursor_walks_pending_voices() {
    let mut bus = MockBus::default();
    let mut chip = powered_chip(&mut bus);
    for voice in [1u8, 3] {
        select_voice(&mut chip, &mut bus, voice);
        write_reg(&mut chip, &mut bus, 0x0, 0xa000);
    }
    // Each read acknowledges the cursor voice and advances to the next
    assert_eq!(read_reg(&mut chip, &mut bus, 0x8f) >> 8, 0x61);
    assert_eq!(read_reg(&mut chip, &mut bus, 0x8f) >> 8, 0x63);
    // Nothing pending anymore: both inverted-sense flags read clear
    assert_eq!(read_reg(&mut chip, &mut bus, 0x8f) >> 8, 0xe3);
}

#[test]
fn soft_reset_reparks_every_voice() {
    let mut bus = MockBus::default();
    let mut chip = powered_chip(&mut bus);
    program_ramp_voice(&mut chip, &mut bus, 0x2000);
    let mut frames = [[0i16; 2]; 64];
    chip.render_block(&mut bus, &mut frames);
    assert_ne!(chip.wave_irq_bits(), 0);

    // Assert then release the master reset, as the init sequence does
    write_reg(&mut chip, &mut bus, 0x4c, 0x0001);
    write_reg(&mut chip, &mut bus, 0x4c, 0x0000);

    assert_eq!(chip.wave_irq_bits(), 0);
    assert_eq!(chip.read(&mut bus, 0x246, IoWidth::Byte), 0);
    for i in 0..32 {
        let v = chip.voice(i);
        assert!(v.wave_ctrl.contains(VoiceCtrl::STOPPED));
        assert!(v.ramp_ctrl.contains(VoiceCtrl::STOPPED));
        assert_eq!(v.current_vol_idx, 0);
        assert_eq!(v.pan_pot, 7);
    }
    // AdLib compatibility command register comes back as 85
    assert_eq!(chip.read(&mut bus, 0x24a, IoWidth::Byte), 85);

    // The card renders silence until voices are reprogrammed
    let mut tail = [[0i16; 2]; 64];
    chip.render_block(&mut bus, &mut tail);
    assert!(tail.iter().all(|f| f[0] == 0 && f[1] == 0));
}

/// Everything a host can see without disturbing it: IRQ status, the
/// AdLib status and command ports, and every voice's control, volume
/// and pan state.
fn observable_state(chip: &mut Gf1, bus: &mut MockBus) -> Vec<u16> {
    let mut state = vec![
        chip.read(bus, 0x246, IoWidth::Byte),
        chip.read(bus, 0x248, IoWidth::Byte),
        chip.read(bus, 0x24a, IoWidth::Byte),
    ];
    for voice in 0..32u8 {
        select_voice(chip, bus, voice);
        state.push(read_reg(chip, bus, 0x80)); // wave control
        state.push(read_reg(chip, bus, 0x8d)); // ramp control
        state.push(read_reg(chip, bus, 0x89)); // current volume
        state.push(u16::from(chip.voice(usize::from(voice)).pan_pot));
    }
    state
}

#[test]
fn repeated_soft_reset_yields_identical_state() {
    let mut bus = MockBus::default();
    let mut chip = powered_chip(&mut bus);
    program_ramp_voice(&mut chip, &mut bus, 0x2000);
    let mut frames = [[0i16; 2]; 64];
    chip.render_block(&mut bus, &mut frames);

    write_reg(&mut chip, &mut bus, 0x4c, 0x0001);
    write_reg(&mut chip, &mut bus, 0x4c, 0x0000);
    let first = observable_state(&mut chip, &mut bus);

    // A second reset cycle must land on exactly the same surface
    write_reg(&mut chip, &mut bus, 0x4c, 0x0001);
    write_reg(&mut chip, &mut bus, 0x4c, 0x0000);
    assert_eq!(observable_state(&mut chip, &mut bus), first);
}

#[test]
fn sixteen_bit_voice_plays_through_banked_layout() {
    let mut bus = MockBus::default();
    let mut chip = powered_chip(&mut bus);
    // Constant full-positive words at 16-bit sample indices 0x40..0x80
    let mut pcm = Vec::new();
    for _ in 0..0x40 {
        pcm.extend_from_slice(&[0xfe, 0x7f]);
    }
    chip.load_ram(0x80, &pcm);

    select_voice(&mut chip, &mut bus, 0);
    write_reg(&mut chip, &mut bus, 0x2, 0x0000); // start: sample index 0x40
    write_reg(&mut chip, &mut bus, 0x3, 0x8000);
    write_reg(&mut chip, &mut bus, 0x4, 0x0001); // end: sample index 0x80
    write_reg(&mut chip, &mut bus, 0x5, 0x0000);
    write_reg(&mut chip, &mut bus, 0xa, 0x0000);
    write_reg(&mut chip, &mut bus, 0xb, 0x8000);
    write_reg(&mut chip, &mut bus, 0x1, 0x0400);
    write_reg(&mut chip, &mut bus, 0x9, 0xfff0);
    write_reg(&mut chip, &mut bus, 0xd, 0x0300);
    write_reg(&mut chip, &mut bus, 0x0, 0x0c00); // 16-bit, loop

    let mut frames = [[0i16; 2]; 64];
    chip.render_block(&mut bus, &mut frames);
    // Constant input scaled by center pan on both sides
    let expected = (32766.0f32 * std::f32::consts::FRAC_1_SQRT_2) as i16;
    for frame in &frames {
        assert!((frame[0] - expected).abs() <= 1);
        assert!((frame[1] - expected).abs() <= 1);
    }
    assert_eq!(chip.voice(0).generated_16bit_ms, 1);
}

#[test]
fn soft_limit_tames_a_hot_mix() {
    let mut bus = MockBus::default();
    let mut chip = powered_chip(&mut bus);
    // Eight voices all playing the same full-scale 8-bit sample
    chip.load_ram(0, &[0x7f; 0x100]);
    for voice in 0..8u8 {
        select_voice(&mut chip, &mut bus, voice);
        write_reg(&mut chip, &mut bus, 0x2, 0x0000);
        write_reg(&mut chip, &mut bus, 0x3, 0x0000);
        write_reg(&mut chip, &mut bus, 0x4, 0x0000); // end at byte 0x20
        write_reg(&mut chip, &mut bus, 0x5, 0x4000);
        write_reg(&mut chip, &mut bus, 0xa, 0x0000);
        write_reg(&mut chip, &mut bus, 0xb, 0x0000);
        write_reg(&mut chip, &mut bus, 0x1, 0x0400);
        write_reg(&mut chip, &mut bus, 0x9, 0xfff0);
        write_reg(&mut chip, &mut bus, 0xd, 0x0300);
        write_reg(&mut chip, &mut bus, 0x0, 0x0800); // loop
    }
    let mut frames = [[0i16; 2]; 64];
    chip.render_block(&mut bus, &mut frames);
    // 8 voices at full scale would clip badly unlimited; every frame
    // must still fit and the loudest cannot exceed the ceiling
    for frame in &frames {
        assert!(frame[0] > 0 && frame[1] > 0);
        assert!(frame[0] <= i16::MAX - 1 && frame[1] <= i16::MAX - 1);
    }
}
