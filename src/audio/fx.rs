// Effect processors for the routing graph: a Freeverb-style reverb
// (parallel combs into series allpasses), a circular-buffer feedback delay,
// and a one-pole lowpass. All buffers are pre-allocated at construction so
// nothing mallocs inside the audio callback.

/// One-pole lowpass, used as the insert-chain filter stage.
#[derive(Clone, Copy, Debug)]
pub struct OnePoleLowpass {
    coef: f32,
    state: f32,
    cutoff: f32,
    sample_rate: f32,
}

impl OnePoleLowpass {
    pub const OPEN_HZ: f32 = 20_000.0;

    pub fn new(sample_rate: f32) -> Self {
        let mut lp = Self {
            coef: 1.0,
            state: 0.0,
            cutoff: Self::OPEN_HZ,
            sample_rate,
        };
        lp.set_cutoff(Self::OPEN_HZ);
        lp
    }

    pub fn set_cutoff(&mut self, hz: f32) {
        self.cutoff = hz.clamp(20.0, Self::OPEN_HZ);
        let x = (-std::f32::consts::TAU * self.cutoff / self.sample_rate).exp();
        self.coef = 1.0 - x;
    }

    /// Fully open filters pass the signal untouched.
    pub fn is_open(&self) -> bool {
        self.cutoff >= Self::OPEN_HZ
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.state += self.coef * (input - self.state);
        self.state
    }

    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}

// comb with damped feedback, one of the parallel reverb stages
struct Comb {
    buffer: Vec<f32>,
    index: usize,
    feedback: f32,
    damping: f32,
    filter_state: f32,
}

impl Comb {
    fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len.max(1)],
            index: 0,
            feedback: 0.8,
            damping: 0.25,
            filter_state: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let out = self.buffer[self.index];
        self.filter_state = out * (1.0 - self.damping) + self.filter_state * self.damping;
        self.buffer[self.index] = input + self.filter_state * self.feedback;
        self.index = (self.index + 1) % self.buffer.len();
        out
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
        self.filter_state = 0.0;
    }
}

struct Allpass {
    buffer: Vec<f32>,
    index: usize,
}

impl Allpass {
    fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len.max(1)],
            index: 0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let buffered = self.buffer[self.index];
        let out = -input + buffered;
        self.buffer[self.index] = input + buffered * 0.5;
        self.index = (self.index + 1) % self.buffer.len();
        out
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.index = 0;
    }
}

/// Mono Freeverb-style reverb. `decay` is exposed in seconds and mapped onto
/// comb feedback; `wet` is the output mix (0 = bypass, 1 = fully wet).
pub struct Reverb {
    combs: Vec<Comb>,
    allpasses: Vec<Allpass>,
    decay_secs: f32,
    wet: f32,
    gain: f32,
}

impl Reverb {
    // Freeverb tunings, in samples at 44.1kHz, scaled to the actual rate.
    const COMB_TUNINGS: [usize; 4] = [1116, 1188, 1277, 1356];
    const ALLPASS_TUNINGS: [usize; 2] = [556, 441];

    pub const MIN_DECAY: f32 = 0.1;
    pub const MAX_DECAY: f32 = 10.0;

    pub fn new(sample_rate: f32, decay_secs: f32, wet: f32) -> Self {
        let scale = sample_rate / 44_100.0;
        let combs = Self::COMB_TUNINGS
            .iter()
            .map(|&t| Comb::new((t as f32 * scale) as usize))
            .collect();
        let allpasses = Self::ALLPASS_TUNINGS
            .iter()
            .map(|&t| Allpass::new((t as f32 * scale) as usize))
            .collect();
        let mut reverb = Self {
            combs,
            allpasses,
            decay_secs: 0.0,
            wet: wet.clamp(0.0, 1.0),
            gain: 0.75,
        };
        reverb.set_decay(decay_secs);
        reverb
    }

    /// Decay in seconds, clamped to [0.1, 10].
    pub fn set_decay(&mut self, secs: f32) {
        self.decay_secs = secs.clamp(Self::MIN_DECAY, Self::MAX_DECAY);
        // longer decay = more comb feedback, kept below 1 for stability
        let feedback = 0.70 + 0.28 * (self.decay_secs / Self::MAX_DECAY);
        for comb in &mut self.combs {
            comb.feedback = feedback;
        }
    }

    pub fn decay(&self) -> f32 {
        self.decay_secs
    }

    pub fn set_wet(&mut self, wet: f32) {
        self.wet = wet.clamp(0.0, 1.0);
    }

    pub fn wet(&self) -> f32 {
        self.wet
    }

    pub fn is_bypassed(&self) -> bool {
        self.wet == 0.0
    }

    pub fn reset(&mut self) {
        for comb in &mut self.combs {
            comb.clear();
        }
        for allpass in &mut self.allpasses {
            allpass.clear();
        }
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        if self.is_bypassed() {
            return input;
        }
        let mut acc = 0.0;
        for comb in &mut self.combs {
            acc += comb.process(input);
        }
        let mut wet_sig = acc * self.gain / self.combs.len() as f32;
        for allpass in &mut self.allpasses {
            wet_sig = allpass.process(wet_sig);
        }
        input * (1.0 - self.wet) + wet_sig * self.wet
    }
}

/// Feedback delay on a pre-allocated circular buffer. Feedback is clamped to
/// 0.95; anything closer to 1 self-oscillates.
pub struct FeedbackDelay {
    buffer: Vec<f32>,
    write_pos: usize,
    delay_samples: usize,
    time_secs: f32,
    feedback: f32,
    wet: f32,
    sample_rate: f32,
}

impl FeedbackDelay {
    pub const MAX_FEEDBACK: f32 = 0.95;
    const MAX_SECS: f32 = 2.0;

    pub fn new(sample_rate: f32, time_secs: f32, feedback: f32, wet: f32) -> Self {
        let max_samples = (Self::MAX_SECS * sample_rate) as usize + 1;
        let mut delay = Self {
            buffer: vec![0.0; max_samples],
            write_pos: 0,
            delay_samples: 1,
            time_secs: 0.0,
            feedback: 0.0,
            wet: wet.clamp(0.0, 1.0),
            sample_rate,
        };
        delay.set_time(time_secs);
        delay.set_feedback(feedback);
        delay
    }

    pub fn set_time(&mut self, secs: f32) {
        self.time_secs = secs.clamp(0.001, Self::MAX_SECS);
        let samples = (self.time_secs * self.sample_rate) as usize;
        self.delay_samples = samples.clamp(1, self.buffer.len() - 1);
    }

    pub fn time(&self) -> f32 {
        self.time_secs
    }

    pub fn set_feedback(&mut self, amount: f32) {
        self.feedback = amount.clamp(0.0, Self::MAX_FEEDBACK);
    }

    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    pub fn set_wet(&mut self, wet: f32) {
        self.wet = wet.clamp(0.0, 1.0);
    }

    pub fn wet(&self) -> f32 {
        self.wet
    }

    pub fn is_bypassed(&self) -> bool {
        self.wet == 0.0
    }

    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        if self.is_bypassed() {
            return input;
        }
        let read_pos = if self.write_pos >= self.delay_samples {
            self.write_pos - self.delay_samples
        } else {
            self.buffer.len() + self.write_pos - self.delay_samples
        };
        let delayed = self.buffer[read_pos];
        // clamp the loop signal so high feedback can't run away
        self.buffer[self.write_pos] = (input + delayed * self.feedback).clamp(-2.0, 2.0);
        self.write_pos = (self.write_pos + 1) % self.buffer.len();
        input * (1.0 - self.wet) + delayed * self.wet
    }
}

/// Per-voice insert chain: filter -> delay -> reverb -> gain. Every stage
/// defaults to bypass (open filter, zero wet), so an untouched chain is
/// transparent apart from the gain stage.
pub struct InsertChain {
    pub filter: OnePoleLowpass,
    pub delay: FeedbackDelay,
    pub reverb: Reverb,
    gain: f32,
}

impl InsertChain {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            filter: OnePoleLowpass::new(sample_rate),
            delay: FeedbackDelay::new(sample_rate, 0.25, 0.3, 0.0),
            reverb: Reverb::new(sample_rate, 2.5, 0.0),
            gain: 1.0,
        }
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.max(0.0);
    }

    /// Back to transparent: open filter, dry delay and reverb, unity gain.
    pub fn reset(&mut self) {
        self.filter.set_cutoff(OnePoleLowpass::OPEN_HZ);
        self.filter.reset();
        self.delay.set_wet(0.0);
        self.delay.reset();
        self.reverb.set_wet(0.0);
        self.reverb.reset();
        self.gain = 1.0;
    }

    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let mut s = input;
        if !self.filter.is_open() {
            s = self.filter.process(s);
        }
        if !self.delay.is_bypassed() {
            s = self.delay.process(s);
        }
        if !self.reverb.is_bypassed() {
            s = self.reverb.process(s);
        }
        s * self.gain
    }
}
