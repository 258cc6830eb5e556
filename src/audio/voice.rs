// The voice bank: one synthesized percussion voice per instrument kind.
// Each voice is a tiny fixed synthesis model dispatched over the closed
// enum, with its own insert chain, dB gain stage, and send tap levels.

use super::fx::InsertChain;
use crate::shared::InstrumentKind;

const TAU: f32 = std::f32::consts::TAU;

// xorshift noise, deterministic and allocation-free
#[derive(Clone, Copy, Debug)]
struct NoiseSource {
    state: u32,
}

impl NoiseSource {
    fn new(seed: u32) -> Self {
        Self {
            state: seed.max(1),
        }
    }

    #[inline]
    fn next(&mut self) -> f32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        (x as f32 / u32::MAX as f32) * 2.0 - 1.0
    }
}

pub fn gain_to_db(gain: f32) -> f32 {
    20.0 * gain.max(1e-5).log10()
}

pub fn db_to_gain(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

// inharmonic partial sets for the metallic voices
const HAT_PARTIALS: [f32; 6] = [3500.0, 4890.0, 6400.0, 7250.0, 8100.0, 9600.0];
const PERC_PARTIALS: [f32; 2] = [810.0, 1353.0];

pub struct DrumVoice {
    kind: InstrumentKind,
    sample_rate: f32,
    inv_sr: f32,

    gain_db: f32,
    reverb_send: f32,
    delay_send: f32,
    insert: InsertChain,

    active: bool,
    t: f32, // seconds since trigger
    velocity: f32,
    phase: f32,
    partial_phases: [f32; 6],
    noise: NoiseSource,
    noise_lp: f32, // one-pole state for shaping noise
}

// noise-based voices get a small default reverb tap
fn default_reverb_send(kind: InstrumentKind) -> f32 {
    match kind {
        InstrumentKind::Snare | InstrumentKind::Clap => 0.15,
        InstrumentKind::Hihat => 0.06,
        InstrumentKind::Openhat => 0.12,
        _ => 0.0,
    }
}

impl DrumVoice {
    fn new(kind: InstrumentKind, sample_rate: f32, default_gain: f32) -> Self {
        let reverb_send = default_reverb_send(kind);
        Self {
            kind,
            sample_rate,
            inv_sr: 1.0 / sample_rate,
            gain_db: gain_to_db(default_gain),
            reverb_send,
            delay_send: 0.0,
            insert: InsertChain::new(sample_rate),
            active: false,
            t: 0.0,
            velocity: 0.0,
            phase: 0.0,
            partial_phases: [0.0; 6],
            noise: NoiseSource::new(kind.index() as u32 * 7919 + 1),
            noise_lp: 0.0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Retrigger: resets phase and envelope. Mono per instrument, like a
    /// drum machine channel.
    pub fn trigger(&mut self, velocity: f32) {
        // the metallic voices run hot; scale them down at the trigger,
        // everything else takes the velocity as-is
        let scale = match self.kind {
            InstrumentKind::Hihat | InstrumentKind::Openhat => 0.3,
            _ => 1.0,
        };
        self.velocity = velocity.clamp(0.0, 1.0) * scale;
        self.t = 0.0;
        self.phase = 0.0;
        self.partial_phases = [0.0; 6];
        self.noise_lp = 0.0;
        self.active = true;
    }

    pub fn silence(&mut self) {
        self.active = false;
    }

    /// Linear gain in, dB domain internally, applied at this voice's own
    /// gain stage (independent of send levels).
    pub fn set_gain(&mut self, linear: f32) {
        self.gain_db = gain_to_db(linear.clamp(0.0, 1.0));
    }

    pub fn set_reverb_send(&mut self, level: f32) {
        self.reverb_send = level.clamp(0.0, 1.0);
    }

    pub fn reverb_send(&self) -> f32 {
        self.reverb_send
    }

    pub fn set_delay_send(&mut self, level: f32) {
        self.delay_send = level.clamp(0.0, 1.0);
    }

    pub fn delay_send(&self) -> f32 {
        self.delay_send
    }

    pub fn insert_mut(&mut self) -> &mut InsertChain {
        &mut self.insert
    }

    /// Insert chain back to transparent, send taps back to voice defaults.
    pub fn reset_effects(&mut self) {
        self.insert.reset();
        self.reverb_send = default_reverb_send(self.kind);
        self.delay_send = 0.0;
    }

    /// Post-insert, post-gain output sample. Zero when idle.
    #[inline]
    pub fn next_sample(&mut self) -> f32 {
        if !self.active {
            return 0.0;
        }
        let raw = self.synthesize();
        self.t += self.inv_sr;
        if self.t > self.tail_secs() {
            self.active = false;
        }
        let shaped = self.insert.process(raw * self.velocity);
        shaped * db_to_gain(self.gain_db)
    }

    // how long each model is allowed to ring before the slot frees up
    fn tail_secs(&self) -> f32 {
        match self.kind {
            InstrumentKind::Kick => 0.6,
            InstrumentKind::Snare => 0.35,
            InstrumentKind::Hihat => 0.12,
            InstrumentKind::Openhat => 0.7,
            InstrumentKind::Clap => 0.3,
            InstrumentKind::Perc => 0.25,
            InstrumentKind::Synth => 0.9,
            InstrumentKind::Bass => 1.2,
        }
    }

    #[inline]
    fn synthesize(&mut self) -> f32 {
        let t = self.t;
        match self.kind {
            InstrumentKind::Kick => {
                // membrane tone: pitch drops 165Hz -> 45Hz, plus a short
                // filtered click for the transient
                let freq = 45.0 + 120.0 * (-t * 35.0).exp();
                self.phase = (self.phase + freq * self.inv_sr).fract();
                let body = (self.phase * TAU).sin() + 0.15 * (self.phase * TAU * 2.0).sin();
                let env = if t < 0.004 {
                    (t / 0.004).powf(0.3)
                } else {
                    (-t * 8.0).exp()
                };
                let click = if t < 0.008 {
                    let n = self.noise.next();
                    self.noise_lp += 0.3 * (n - self.noise_lp);
                    self.noise_lp * (1.0 - t / 0.008) * 1.2
                } else {
                    0.0
                };
                body * env * 0.9 + click * 0.5
            }
            InstrumentKind::Bass => {
                // longer sub membrane tone
                let freq = 38.0 + 45.0 * (-t * 18.0).exp();
                self.phase = (self.phase + freq * self.inv_sr).fract();
                (self.phase * TAU).sin() * (-t * 3.5).exp() * 0.9
            }
            InstrumentKind::Snare => {
                let body_freq = 120.0 + 200.0 * (-t * 15.0).exp();
                self.phase = (self.phase + body_freq * self.inv_sr).fract();
                let body = (self.phase * TAU).sin() * (-t * 25.0).exp();
                let n = self.noise.next();
                self.noise_lp += 0.5 * (n - self.noise_lp);
                let bright = n - self.noise_lp; // crude highpass
                let noise_env = if t < 0.003 {
                    t / 0.003
                } else {
                    (-t * 20.0).exp()
                };
                body * 0.5 + bright * noise_env * 1.4
            }
            InstrumentKind::Clap => {
                // three fast noise bursts then a looser decay
                let env = if t < 0.03 {
                    (-(t % 0.01) * 400.0).exp()
                } else {
                    (-(t - 0.03) * 18.0).exp() * 0.7
                };
                let n = self.noise.next();
                self.noise_lp += 0.4 * (n - self.noise_lp);
                (n - self.noise_lp) * env * 1.5
            }
            InstrumentKind::Hihat => self.metallic(&HAT_PARTIALS, 60.0),
            InstrumentKind::Openhat => self.metallic(&HAT_PARTIALS, 9.0),
            InstrumentKind::Perc => {
                let mut s = 0.0;
                for (phase, freq) in self.partial_phases.iter_mut().zip(PERC_PARTIALS) {
                    *phase = (*phase + freq * self.inv_sr).fract();
                    s += (*phase * TAU).sin();
                }
                let n = self.noise.next() * 0.2;
                (s * 0.5 + n) * (-t * 28.0).exp()
            }
            InstrumentKind::Synth => {
                // saw pluck through a closing lowpass
                let freq = 220.0;
                self.phase = (self.phase + freq * self.inv_sr).fract();
                let saw = self.phase * 2.0 - 1.0;
                let coef = (0.05 + 0.4 * (-t * 10.0).exp()).min(1.0);
                self.noise_lp += coef * (saw - self.noise_lp);
                self.noise_lp * (-t * 6.0).exp() * 0.8
            }
        }
    }

    // shared model for the hat pair: inharmonic partials, highpassed
    #[inline]
    fn metallic(&mut self, partials: &[f32; 6], decay: f32) -> f32 {
        let mut s = 0.0;
        for (phase, freq) in self.partial_phases.iter_mut().zip(partials.iter().copied()) {
            *phase = (*phase + freq * self.inv_sr).fract();
            s += (*phase * TAU).sin();
        }
        s /= partials.len() as f32;
        self.noise_lp += 0.6 * (s - self.noise_lp);
        (s - self.noise_lp) * (-self.t * decay).exp() * 2.0
    }
}

pub struct VoiceBank {
    voices: [DrumVoice; InstrumentKind::COUNT],
}

impl VoiceBank {
    pub fn new(sample_rate: f32, default_gain: f32) -> Self {
        Self {
            voices: InstrumentKind::ALL.map(|kind| DrumVoice::new(kind, sample_rate, default_gain)),
        }
    }

    pub fn trigger(&mut self, instrument: InstrumentKind, velocity: f32) {
        self.voices[instrument.index()].trigger(velocity);
    }

    pub fn voice_mut(&mut self, instrument: InstrumentKind) -> &mut DrumVoice {
        &mut self.voices[instrument.index()]
    }

    pub fn silence_all(&mut self) {
        for voice in &mut self.voices {
            voice.silence();
        }
    }

    pub fn reset_effects(&mut self) {
        for voice in &mut self.voices {
            voice.reset_effects();
        }
    }

    /// One mixed sample plus the accumulated send taps for the bus.
    #[inline]
    pub fn next_sample(&mut self) -> (f32, f32, f32) {
        let mut dry = 0.0;
        let mut reverb_in = 0.0;
        let mut delay_in = 0.0;
        for voice in &mut self.voices {
            if !voice.is_active() {
                continue;
            }
            let s = voice.next_sample();
            dry += s;
            reverb_in += s * voice.reverb_send;
            delay_in += s * voice.delay_send;
        }
        (dry, reverb_in, delay_in)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 44_100.0;

    fn peak_of(voice: &mut DrumVoice, samples: usize) -> f32 {
        let mut peak = 0.0f32;
        for _ in 0..samples {
            peak = peak.max(voice.next_sample().abs());
        }
        peak
    }

    #[test]
    fn every_voice_speaks_when_triggered() {
        for kind in InstrumentKind::ALL {
            let mut voice = DrumVoice::new(kind, SR, 1.0);
            voice.trigger(1.0);
            let peak = peak_of(&mut voice, 2000);
            assert!(peak > 0.01, "{:?} was silent (peak {peak})", kind);
        }
    }

    #[test]
    fn voices_decay_to_silence() {
        for kind in InstrumentKind::ALL {
            let mut voice = DrumVoice::new(kind, SR, 1.0);
            voice.trigger(1.0);
            // render well past the longest tail
            for _ in 0..(SR as usize * 2) {
                voice.next_sample();
            }
            assert!(!voice.is_active(), "{:?} never went idle", kind);
            assert_eq!(voice.next_sample(), 0.0);
        }
    }

    #[test]
    fn velocity_scales_amplitude() {
        let mut soft = DrumVoice::new(InstrumentKind::Kick, SR, 1.0);
        let mut hard = DrumVoice::new(InstrumentKind::Kick, SR, 1.0);
        soft.trigger(0.2);
        hard.trigger(1.0);
        assert!(peak_of(&mut hard, 2000) > peak_of(&mut soft, 2000));
    }

    #[test]
    fn velocity_clamps_to_unit_range() {
        let mut over = DrumVoice::new(InstrumentKind::Snare, SR, 1.0);
        let mut full = DrumVoice::new(InstrumentKind::Snare, SR, 1.0);
        over.trigger(4.0);
        full.trigger(1.0);
        let a = peak_of(&mut over, 2000);
        let b = peak_of(&mut full, 2000);
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn gain_is_monotonic_through_the_db_stage() {
        let mut quiet = DrumVoice::new(InstrumentKind::Kick, SR, 1.0);
        let mut loud = DrumVoice::new(InstrumentKind::Kick, SR, 1.0);
        quiet.set_gain(0.3);
        loud.set_gain(0.9);
        quiet.trigger(1.0);
        loud.trigger(1.0);
        assert!(peak_of(&mut loud, 2000) > peak_of(&mut quiet, 2000));
    }

    #[test]
    fn idle_voice_outputs_zero() {
        let mut voice = DrumVoice::new(InstrumentKind::Perc, SR, 1.0);
        assert_eq!(voice.next_sample(), 0.0);
    }

    #[test]
    fn send_taps_only_feed_their_bus() {
        let mut bank = VoiceBank::new(SR, 1.0);
        bank.voice_mut(InstrumentKind::Kick).set_reverb_send(0.0);
        bank.voice_mut(InstrumentKind::Kick).set_delay_send(0.5);
        bank.trigger(InstrumentKind::Kick, 1.0);
        let mut saw_delay = false;
        for _ in 0..2000 {
            let (dry, reverb_in, delay_in) = bank.next_sample();
            assert_eq!(reverb_in, 0.0);
            if delay_in != 0.0 {
                assert!((delay_in - dry * 0.5).abs() < 1e-6);
                saw_delay = true;
            }
        }
        assert!(saw_delay);
    }

    #[test]
    fn noise_voices_default_to_a_reverb_tap() {
        let bank = VoiceBank::new(SR, 1.0);
        let snare = &bank.voices[InstrumentKind::Snare.index()];
        let kick = &bank.voices[InstrumentKind::Kick.index()];
        assert!(snare.reverb_send() > 0.0);
        assert_eq!(kick.reverb_send(), 0.0);
    }
}
