// Shared send/return bus: one long reverb and one tempo-synced delay, each
// run fully wet and fed by per-voice tap gains. The returns are mixed back
// into the master output at a fixed ratio scaled by the global mix controls.

use super::fx::{FeedbackDelay, Reverb};

const REVERB_RETURN: f32 = 0.3;
const DELAY_RETURN: f32 = 0.2;

pub struct SendBus {
    reverb: Reverb,
    delay: FeedbackDelay,
    reverb_mix: f32,
    delay_mix: f32,
}

impl SendBus {
    pub fn new(sample_rate: f32) -> Self {
        Self {
            // 100% wet: the dry path never goes through the bus
            reverb: Reverb::new(sample_rate, 4.0, 1.0),
            delay: FeedbackDelay::new(sample_rate, 0.25, 0.3, 1.0),
            reverb_mix: 1.0,
            delay_mix: 1.0,
        }
    }

    pub fn set_reverb_mix(&mut self, amount: f32) {
        self.reverb_mix = amount.clamp(0.0, 1.0);
    }

    pub fn reverb_mix(&self) -> f32 {
        self.reverb_mix
    }

    pub fn set_reverb_decay(&mut self, secs: f32) {
        self.reverb.set_decay(secs);
    }

    pub fn reverb_decay(&self) -> f32 {
        self.reverb.decay()
    }

    pub fn set_delay_mix(&mut self, amount: f32) {
        self.delay_mix = amount.clamp(0.0, 1.0);
    }

    pub fn delay_mix(&self) -> f32 {
        self.delay_mix
    }

    pub fn set_delay_time(&mut self, secs: f32) {
        self.delay.set_time(secs);
    }

    pub fn delay_time(&self) -> f32 {
        self.delay.time()
    }

    pub fn set_delay_feedback(&mut self, amount: f32) {
        self.delay.set_feedback(amount);
    }

    pub fn delay_feedback(&self) -> f32 {
        self.delay.feedback()
    }

    pub fn reset(&mut self) {
        self.reverb.reset();
        self.delay.reset();
    }

    /// Feed one sample of accumulated send taps, get the summed returns.
    #[inline]
    pub fn process(&mut self, reverb_in: f32, delay_in: f32) -> f32 {
        self.reverb.process(reverb_in) * REVERB_RETURN * self.reverb_mix
            + self.delay.process(delay_in) * DELAY_RETURN * self.delay_mix
    }
}
