// The audio-thread half of the sequencer. Commands arrive with absolute
// audio-clock times; the engine parks them in a sorted pending queue and
// fires each one at its exact frame inside the render loop, so trigger
// timing does not depend on when the control thread got around to
// scheduling. Step cues come back out as notices at the same exact frame.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::Sender;

use super::bus::SendBus;
use super::frame::StereoFrame;
use super::voice::{VoiceBank, db_to_gain, gain_to_db};
use crate::audio_api::{AudioCommand, StepNotice};
use crate::shared::{DEFAULT_VOLUME, InstrumentKind};

enum PendingEvent {
    Fire { instrument: InstrumentKind, velocity: f32 },
    Cue { step: usize },
}

struct Pending {
    at: u64, // frame index
    event: PendingEvent,
}

pub struct Engine {
    sample_rate: f32,
    frames: u64,
    clock: Arc<AtomicU64>,
    bank: VoiceBank,
    bus: SendBus,
    master_db: f32,
    pending: Vec<Pending>, // sorted ascending by `at`
    notice_tx: Option<Sender<StepNotice>>,
}

impl Engine {
    pub fn new(sample_rate: f32, clock: Arc<AtomicU64>) -> Self {
        Self {
            sample_rate,
            frames: 0,
            clock,
            bank: VoiceBank::new(sample_rate, DEFAULT_VOLUME),
            bus: SendBus::new(sample_rate),
            master_db: gain_to_db(DEFAULT_VOLUME),
            pending: Vec::with_capacity(256),
            notice_tx: None,
        }
    }

    pub fn set_notice_tx(&mut self, tx: Sender<StepNotice>) {
        self.notice_tx = Some(tx);
    }

    fn secs_to_frame(&self, secs: f64) -> u64 {
        (secs.max(0.0) * self.sample_rate as f64).round() as u64
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::Trigger(t) => {
                let at = self.secs_to_frame(t.time);
                self.schedule(Pending {
                    at,
                    event: PendingEvent::Fire {
                        instrument: t.instrument,
                        velocity: t.velocity,
                    },
                });
            }
            AudioCommand::StepCue { step, time } => {
                let at = self.secs_to_frame(time);
                self.schedule(Pending {
                    at,
                    event: PendingEvent::Cue { step },
                });
            }
            // stop means silence now: drop what's scheduled, choke ringing
            // voices, and clear the bus tails
            AudioCommand::CancelPending => {
                self.pending.clear();
                self.bank.silence_all();
                self.bus.reset();
            }
            AudioCommand::SetVoiceGain { instrument, gain } => {
                self.bank.voice_mut(instrument).set_gain(gain);
            }
            AudioCommand::SetVoiceReverbSend { instrument, level } => {
                self.bank.voice_mut(instrument).set_reverb_send(level);
            }
            AudioCommand::SetVoiceDelaySend { instrument, level } => {
                self.bank.voice_mut(instrument).set_delay_send(level);
            }
            AudioCommand::SetMasterGain { gain } => {
                self.master_db = gain_to_db(gain.clamp(0.0, 1.0));
            }
            AudioCommand::SetVoiceFilterCutoff { instrument, cutoff_hz } => {
                self.bank
                    .voice_mut(instrument)
                    .insert_mut()
                    .filter
                    .set_cutoff(cutoff_hz);
            }
            AudioCommand::SetVoiceInsertDelay { instrument, time, feedback, mix } => {
                let delay = &mut self.bank.voice_mut(instrument).insert_mut().delay;
                delay.set_time(time);
                delay.set_feedback(feedback);
                delay.set_wet(mix);
            }
            AudioCommand::SetVoiceInsertReverb { instrument, decay, mix } => {
                let reverb = &mut self.bank.voice_mut(instrument).insert_mut().reverb;
                reverb.set_decay(decay);
                reverb.set_wet(mix);
            }
            AudioCommand::SetVoiceInsertGain { instrument, gain } => {
                self.bank.voice_mut(instrument).insert_mut().set_gain(gain);
            }
            AudioCommand::ResetVoiceEffects => self.bank.reset_effects(),
            AudioCommand::SetReverbMix(v) => self.bus.set_reverb_mix(v),
            AudioCommand::SetReverbDecay(v) => self.bus.set_reverb_decay(v),
            AudioCommand::SetDelayMix(v) => self.bus.set_delay_mix(v),
            AudioCommand::SetDelayTime(v) => self.bus.set_delay_time(v),
            AudioCommand::SetDelayFeedback(v) => self.bus.set_delay_feedback(v),
        }
    }

    // keep the queue sorted; scheduling order is already nearly sorted so
    // this walks at most a couple of slots from the back
    fn schedule(&mut self, pending: Pending) {
        let pos = self
            .pending
            .iter()
            .rposition(|p| p.at <= pending.at)
            .map(|i| i + 1)
            .unwrap_or(0);
        self.pending.insert(pos, pending);
    }

    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn render_block(&mut self, out: &mut [StereoFrame]) {
        for frame in out.iter_mut() {
            while self
                .pending
                .first()
                .is_some_and(|p| p.at <= self.frames)
            {
                let due = self.pending.remove(0);
                match due.event {
                    PendingEvent::Fire { instrument, velocity } => {
                        self.bank.trigger(instrument, velocity);
                    }
                    PendingEvent::Cue { step } => {
                        if let Some(tx) = &self.notice_tx {
                            let _ = tx.try_send(StepNotice {
                                step,
                                time: due.at as f64 / self.sample_rate as f64,
                            });
                        }
                    }
                }
            }

            let (dry, reverb_in, delay_in) = self.bank.next_sample();
            let wet = self.bus.process(reverb_in, delay_in);
            let s = (dry + wet) * db_to_gain(self.master_db);
            *frame = StereoFrame::mono(s);
            self.frames += 1;
        }
        self.clock.store(self.frames, Ordering::Release);
    }
}
