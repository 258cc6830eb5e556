// The engine facade. Owns the pattern bank and the transport, exclusively,
// on the control thread; every operation returns the batch of AudioCommands
// the caller forwards to the audio handle. Control operations never fail:
// invalid state and bad indices are no-ops, out-of-domain parameters clamp.

use chrono::Utc;

use crate::audio_api::{AudioCommand, TriggerParams};
use crate::sequencer::pattern::{EffectDesc, Pattern, effective_mute};
use crate::sequencer::persistence::PatternBank;
use crate::sequencer::transport::{Transport, TransportState};
use crate::shared::{DEFAULT_VOLUME, DisplayState, InputEvent, InstrumentKind, TrackView};

pub type StepObserver = Box<dyn FnMut(usize)>;

pub struct Sequencer {
    patterns: Vec<Pattern>,
    current: usize,
    transport: Transport,
    master_volume: f32,
    reverb_mix: f32,
    reverb_decay: f32,
    delay_mix: f32,
    delay_feedback: f32,
    playing_step: Option<usize>,
    on_step: Option<StepObserver>,
}

impl Sequencer {
    pub fn with_bank(bank: Option<PatternBank>) -> Self {
        let bank = bank.unwrap_or_default();
        let patterns = if bank.patterns.is_empty() {
            vec![Pattern::seed("pattern-1", "Pattern 1")]
        } else {
            bank.patterns
        };
        let current = bank
            .current
            .and_then(|id| patterns.iter().position(|p| p.id == id))
            .unwrap_or(0);
        let mut seq = Self::with_patterns(patterns);
        seq.current = current;
        seq.apply_pattern_tempo();
        seq
    }

    fn with_patterns(patterns: Vec<Pattern>) -> Self {
        Self {
            patterns,
            current: 0,
            transport: Transport::new(),
            master_volume: DEFAULT_VOLUME,
            reverb_mix: 1.0,
            reverb_decay: 4.0,
            delay_mix: 1.0,
            delay_feedback: 0.3,
            playing_step: None,
            on_step: None,
        }
    }

    pub fn pattern(&self) -> Option<&Pattern> {
        self.patterns.get(self.current)
    }

    fn pattern_mut(&mut self) -> Option<&mut Pattern> {
        self.patterns.get_mut(self.current)
    }

    pub fn transport_state(&self) -> TransportState {
        self.transport.state()
    }

    /// Everything the audio side needs to reflect current control state:
    /// per-voice gains, insert effects, master gain, and the tempo-synced
    /// delay time. Sent once at startup and again when the active pattern
    /// changes.
    pub fn init_commands(&self) -> Vec<AudioCommand> {
        let mut cmds = vec![
            AudioCommand::SetMasterGain {
                gain: self.master_volume,
            },
            AudioCommand::ResetVoiceEffects,
        ];
        if let Some(p) = self.pattern() {
            for track in &p.tracks {
                cmds.push(AudioCommand::SetVoiceGain {
                    instrument: track.instrument,
                    gain: track.volume,
                });
                for effect in track.effects.iter().filter(|e| e.enabled) {
                    cmds.extend(insert_command(track.instrument, effect));
                }
            }
        }
        cmds.push(self.delay_sync_command());
        cmds
    }

    // the shared delay follows the tempo at an eighth note
    fn delay_sync_command(&self) -> AudioCommand {
        AudioCommand::SetDelayTime((60.0 / self.transport.bpm() / 2.0) as f32)
    }

    // ── transport ─────────────────────────────────────────────────

    /// No-op when there is no pattern or we are already playing.
    pub fn play(&mut self, now: f64) {
        if self.patterns.is_empty() {
            return;
        }
        self.transport.play(now);
    }

    pub fn pause(&mut self) {
        self.transport.pause();
    }

    /// Cancels everything scheduled and re-syncs observers to step 0.
    pub fn stop(&mut self) -> Vec<AudioCommand> {
        if !self.transport.stop() {
            return Vec::new();
        }
        self.playing_step = None;
        self.notify_step(0);
        vec![AudioCommand::CancelPending]
    }

    pub fn play_pause(&mut self, now: f64) {
        match self.transport.state() {
            TransportState::Playing => self.pause(),
            TransportState::Stopped | TransportState::Paused => self.play(now),
        }
    }

    pub fn set_bpm(&mut self, bpm: f32) -> Vec<AudioCommand> {
        self.transport.set_bpm(bpm);
        let clamped = self.transport.bpm();
        if let Some(p) = self.pattern_mut() {
            p.bpm = clamped;
            p.touch();
        }
        vec![self.delay_sync_command()]
    }

    pub fn bpm(&self) -> f32 {
        self.transport.bpm()
    }

    pub fn set_swing(&mut self, swing: f32) {
        self.transport.set_swing(swing);
        if let Some(p) = self.pattern_mut() {
            p.swing = swing;
            p.touch();
        }
    }

    pub fn swing(&self) -> f32 {
        self.transport.swing()
    }

    /// One lookahead pass: turn due steps into exact-time triggers plus a
    /// UI cue per step, all on the audio clock.
    pub fn tick(&mut self, now: f64) -> Vec<AudioCommand> {
        let Some(pattern) = self.patterns.get(self.current) else {
            return Vec::new();
        };
        let mut cmds = Vec::new();
        for step in self.transport.schedule(now, pattern) {
            cmds.push(AudioCommand::StepCue {
                step: step.step,
                time: step.time,
            });
            for trig in step.triggers {
                cmds.push(AudioCommand::Trigger(TriggerParams {
                    instrument: trig.instrument,
                    velocity: trig.velocity,
                    time: step.time,
                }));
            }
        }
        cmds
    }

    // ── pattern edits ─────────────────────────────────────────────

    pub fn toggle_step(&mut self, track: usize, step: usize) {
        if let Some(p) = self.pattern_mut() {
            if p.toggle_step(track, step) {
                p.touch();
            }
        }
    }

    pub fn toggle_mute(&mut self, track: usize) {
        if let Some(t) = self.pattern_mut().and_then(|p| p.tracks.get_mut(track)) {
            t.muted = !t.muted;
        }
    }

    pub fn toggle_solo(&mut self, track: usize) {
        if let Some(t) = self.pattern_mut().and_then(|p| p.tracks.get_mut(track)) {
            t.solo = !t.solo;
        }
    }

    pub fn clear_pattern(&mut self) {
        if let Some(p) = self.pattern_mut() {
            p.clear_steps();
            p.touch();
        }
    }

    pub fn rename_pattern(&mut self, name: &str) {
        if let Some(p) = self.pattern_mut() {
            p.name = name.to_string();
            p.touch();
        }
    }

    // ── volumes and sends ─────────────────────────────────────────

    /// Track lookup is by id; unknown ids are a no-op.
    pub fn set_track_volume(&mut self, track_id: &str, gain: f32) -> Vec<AudioCommand> {
        let Some(track) = self
            .pattern_mut()
            .and_then(|p| p.tracks.iter_mut().find(|t| t.id == track_id))
        else {
            return Vec::new();
        };
        track.volume = gain.clamp(0.0, 1.0);
        let cmd = AudioCommand::SetVoiceGain {
            instrument: track.instrument,
            gain: track.volume,
        };
        vec![cmd]
    }

    pub fn adjust_track_volume(&mut self, track: usize, delta: f32) -> Vec<AudioCommand> {
        let Some(track) = self.pattern().and_then(|p| p.tracks.get(track)) else {
            return Vec::new();
        };
        let id = track.id.clone();
        let gain = track.volume + delta;
        self.set_track_volume(&id, gain)
    }

    pub fn set_master_volume(&mut self, gain: f32) -> Vec<AudioCommand> {
        self.master_volume = gain.clamp(0.0, 1.0);
        vec![AudioCommand::SetMasterGain {
            gain: self.master_volume,
        }]
    }

    // ── global effects ────────────────────────────────────────────

    pub fn set_global_reverb_mix(&mut self, amount: f32) -> Vec<AudioCommand> {
        self.reverb_mix = amount.clamp(0.0, 1.0);
        vec![AudioCommand::SetReverbMix(self.reverb_mix)]
    }

    // local copies mirror the engine clamps so relative adjustments and the
    // display agree with what the bus is actually doing
    pub fn set_global_reverb_decay(&mut self, secs: f32) -> Vec<AudioCommand> {
        self.reverb_decay = secs.clamp(0.1, 10.0);
        vec![AudioCommand::SetReverbDecay(self.reverb_decay)]
    }

    pub fn set_global_delay_mix(&mut self, amount: f32) -> Vec<AudioCommand> {
        self.delay_mix = amount.clamp(0.0, 1.0);
        vec![AudioCommand::SetDelayMix(self.delay_mix)]
    }

    pub fn set_global_delay_feedback(&mut self, amount: f32) -> Vec<AudioCommand> {
        self.delay_feedback = amount.clamp(0.0, 0.95);
        vec![AudioCommand::SetDelayFeedback(self.delay_feedback)]
    }

    // ── bank management ───────────────────────────────────────────

    pub fn new_pattern(&mut self) -> Vec<AudioCommand> {
        let id = format!("pattern-{}", Utc::now().timestamp_millis());
        let name = format!("Pattern {}", self.patterns.len() + 1);
        self.patterns.push(Pattern::seed(&id, &name));
        self.switch_to(self.patterns.len() - 1)
    }

    pub fn next_pattern(&mut self) -> Vec<AudioCommand> {
        if self.patterns.len() < 2 {
            return Vec::new();
        }
        let next = (self.current + 1) % self.patterns.len();
        self.switch_to(next)
    }

    pub fn load_pattern(&mut self, id: &str) -> Vec<AudioCommand> {
        match self.patterns.iter().position(|p| p.id == id) {
            Some(index) => self.switch_to(index),
            None => Vec::new(),
        }
    }

    /// The last pattern never deletes; there must always be something to
    /// play.
    pub fn delete_pattern(&mut self, id: &str) -> Vec<AudioCommand> {
        if self.patterns.len() <= 1 {
            return Vec::new();
        }
        let Some(index) = self.patterns.iter().position(|p| p.id == id) else {
            return Vec::new();
        };
        self.patterns.remove(index);
        let next = self.current.min(self.patterns.len() - 1);
        self.switch_to(next)
    }

    pub fn duplicate_pattern(&mut self) -> Vec<AudioCommand> {
        let Some(src) = self.pattern() else {
            return Vec::new();
        };
        let mut copy = src.clone();
        copy.id = format!("pattern-{}", Utc::now().timestamp_millis());
        copy.name = format!("{} (Copy)", src.name);
        copy.created = Utc::now();
        copy.modified = copy.created;
        self.patterns.push(copy);
        self.switch_to(self.patterns.len() - 1)
    }

    // switching patterns stops playback and re-applies tempo + voice gains
    fn switch_to(&mut self, index: usize) -> Vec<AudioCommand> {
        let mut cmds = self.stop();
        self.current = index;
        self.apply_pattern_tempo();
        cmds.extend(self.init_commands());
        cmds
    }

    fn apply_pattern_tempo(&mut self) {
        if let Some(p) = self.patterns.get(self.current) {
            let (bpm, swing) = (p.bpm, p.swing);
            self.transport.set_bpm(bpm);
            self.transport.set_swing(swing);
        }
    }

    pub fn to_bank(&self) -> PatternBank {
        PatternBank {
            patterns: self.patterns.clone(),
            current: self.pattern().map(|p| p.id.clone()),
        }
    }

    // ── observer + display ────────────────────────────────────────

    /// Single observer slot; the last registration wins.
    pub fn on_step(&mut self, observer: StepObserver) {
        self.on_step = Some(observer);
    }

    /// Called when a step notice arrives from the audio thread (or locally
    /// on stop): advances the playhead and fans out to the observer.
    pub fn notify_step(&mut self, step: usize) {
        if self.transport_state() == TransportState::Playing {
            self.playing_step = Some(step);
        }
        if let Some(observer) = &mut self.on_step {
            observer(step);
        }
    }

    pub fn handle_input(&mut self, event: InputEvent, now: f64) -> Vec<AudioCommand> {
        match event {
            InputEvent::PlayPause => {
                self.play_pause(now);
                Vec::new()
            }
            InputEvent::Stop => self.stop(),
            InputEvent::ToggleStep { track, step } => {
                self.toggle_step(track, step);
                Vec::new()
            }
            InputEvent::ToggleMute(track) => {
                self.toggle_mute(track);
                Vec::new()
            }
            InputEvent::ToggleSolo(track) => {
                self.toggle_solo(track);
                Vec::new()
            }
            InputEvent::AdjustBpm(delta) => {
                let bpm = self.bpm() + delta;
                self.set_bpm(bpm)
            }
            InputEvent::AdjustSwing(delta) => {
                let swing = (self.swing() + delta).clamp(0.0, 0.99);
                self.set_swing(swing);
                Vec::new()
            }
            InputEvent::AdjustTrackVolume { track, delta } => {
                self.adjust_track_volume(track, delta)
            }
            InputEvent::AdjustMasterVolume(delta) => {
                let gain = self.master_volume + delta;
                self.set_master_volume(gain)
            }
            InputEvent::AdjustReverbMix(delta) => {
                let amount = self.reverb_mix + delta;
                self.set_global_reverb_mix(amount)
            }
            InputEvent::AdjustDelayMix(delta) => {
                let amount = self.delay_mix + delta;
                self.set_global_delay_mix(amount)
            }
            InputEvent::AdjustReverbDecay(delta) => {
                let secs = self.reverb_decay + delta;
                self.set_global_reverb_decay(secs)
            }
            InputEvent::AdjustDelayFeedback(delta) => {
                let amount = self.delay_feedback + delta;
                self.set_global_delay_feedback(amount)
            }
            InputEvent::ClearPattern => {
                self.clear_pattern();
                Vec::new()
            }
            InputEvent::NextPattern => self.next_pattern(),
            InputEvent::NewPattern => self.new_pattern(),
            InputEvent::DuplicatePattern => self.duplicate_pattern(),
            InputEvent::DeletePattern => {
                let Some(id) = self.pattern().map(|p| p.id.clone()) else {
                    return Vec::new();
                };
                self.delete_pattern(&id)
            }
            // handled by the outer loop; they touch the filesystem
            InputEvent::SharePattern | InputEvent::Save | InputEvent::Quit => Vec::new(),
        }
    }

    pub fn display_state(&self) -> DisplayState {
        let playing = self.transport_state() == TransportState::Playing;
        let paused = self.transport_state() == TransportState::Paused;
        let (name, length, tracks) = match self.pattern() {
            Some(p) => {
                let any_solo = p.any_solo();
                let tracks = p
                    .tracks
                    .iter()
                    .map(|t| TrackView {
                        name: t.name.clone(),
                        steps: t.steps.iter().map(|s| s.active).collect(),
                        volume: t.volume,
                        muted: t.muted,
                        solo: t.solo,
                        audible: !effective_mute(t, any_solo),
                    })
                    .collect();
                (p.name.clone(), p.length, tracks)
            }
            None => (String::new(), 0, Vec::new()),
        };
        DisplayState {
            pattern_name: name,
            bpm: self.bpm(),
            swing: self.swing(),
            playing,
            paused,
            playing_step: if playing { self.playing_step } else { None },
            length,
            tracks,
            master_volume: self.master_volume,
            reverb_mix: self.reverb_mix,
            reverb_decay: self.reverb_decay,
            delay_mix: self.delay_mix,
            delay_feedback: self.delay_feedback,
        }
    }

    /// Stop everything; safe to call more than once.
    pub fn dispose(&mut self) -> Vec<AudioCommand> {
        self.stop()
    }
}

// Map a stored effect descriptor onto a voice insert stage. Unknown kinds
// are carried in the pattern for round-trip fidelity but configure nothing.
fn insert_command(instrument: InstrumentKind, effect: &EffectDesc) -> Option<AudioCommand> {
    let param = |key: &str, default: f32| effect.params.get(key).copied().unwrap_or(default);
    match effect.kind.as_str() {
        "filter" => Some(AudioCommand::SetVoiceFilterCutoff {
            instrument,
            cutoff_hz: param("cutoff", 1000.0),
        }),
        "delay" => Some(AudioCommand::SetVoiceInsertDelay {
            instrument,
            time: param("time", 0.25),
            feedback: param("feedback", 0.3),
            mix: param("mix", 0.5),
        }),
        "reverb" => Some(AudioCommand::SetVoiceInsertReverb {
            instrument,
            decay: param("decay", 2.5),
            mix: param("mix", 0.5),
        }),
        "gain" => Some(AudioCommand::SetVoiceInsertGain {
            instrument,
            gain: param("gain", 1.0),
        }),
        "send-reverb" => Some(AudioCommand::SetVoiceReverbSend {
            instrument,
            level: param("level", 0.2),
        }),
        "send-delay" => Some(AudioCommand::SetVoiceDelaySend {
            instrument,
            level: param("level", 0.2),
        }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::InstrumentKind;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn sequencer() -> Sequencer {
        let mut seq = Sequencer::with_bank(None);
        seq.toggle_step(0, 0);
        seq.toggle_step(0, 4);
        seq
    }

    fn trigger_count(cmds: &[AudioCommand]) -> usize {
        cmds.iter()
            .filter(|c| matches!(c, AudioCommand::Trigger(_)))
            .count()
    }

    #[test]
    fn play_with_no_pattern_is_a_noop() {
        let mut seq = Sequencer::with_patterns(Vec::new());
        seq.play(0.0);
        assert_eq!(seq.transport_state(), TransportState::Stopped);
        assert!(seq.tick(0.0).is_empty());
    }

    #[test]
    fn tick_emits_cues_and_snapshotted_triggers() {
        let mut seq = sequencer();
        seq.play(0.0);
        let cmds = seq.tick(0.0);
        // step 0 is due inside the first window: one cue plus one trigger
        assert!(matches!(cmds[0], AudioCommand::StepCue { step: 0, .. }));
        assert_eq!(trigger_count(&cmds), 1);
    }

    #[test]
    fn stop_cancels_and_resyncs_observer_to_zero() {
        let mut seq = sequencer();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        seq.on_step(Box::new(move |s| sink.borrow_mut().push(s)));

        seq.play(0.0);
        let _ = seq.tick(0.0); // lookahead has scheduled ahead
        let cmds = seq.stop();
        assert!(matches!(cmds[0], AudioCommand::CancelPending));
        assert_eq!(*seen.borrow(), vec![0]);
        // stop while stopped stays quiet
        assert!(seq.stop().is_empty());
    }

    #[test]
    fn last_observer_registration_wins() {
        let mut seq = sequencer();
        let first = Rc::new(RefCell::new(0usize));
        let second = Rc::new(RefCell::new(0usize));
        let a = first.clone();
        let b = second.clone();
        seq.on_step(Box::new(move |_| *a.borrow_mut() += 1));
        seq.on_step(Box::new(move |_| *b.borrow_mut() += 1));
        seq.notify_step(3);
        assert_eq!(*first.borrow(), 0);
        assert_eq!(*second.borrow(), 1);
    }

    #[test]
    fn set_bpm_clamps_and_tags_the_pattern() {
        let mut seq = sequencer();
        let cmds = seq.set_bpm(500.0);
        assert_eq!(seq.bpm(), 200.0);
        assert_eq!(seq.pattern().unwrap().bpm, 200.0);
        // delay re-syncs to the new tempo (an eighth note at 200bpm)
        assert!(matches!(cmds[0], AudioCommand::SetDelayTime(t) if (t - 0.15).abs() < 1e-6));
    }

    #[test]
    fn track_volume_by_unknown_id_is_a_noop() {
        let mut seq = sequencer();
        assert!(seq.set_track_volume("track-99", 0.5).is_empty());
        let cmds = seq.set_track_volume("track-0", 0.5);
        assert!(matches!(
            cmds[0],
            AudioCommand::SetVoiceGain {
                instrument: InstrumentKind::Kick,
                gain
            } if gain == 0.5
        ));
        assert_eq!(seq.pattern().unwrap().tracks[0].volume, 0.5);
    }

    #[test]
    fn muting_a_track_silences_its_next_occurrences_only() {
        let mut seq = sequencer();
        seq.play(0.0);
        let before = seq.tick(0.0);
        assert_eq!(trigger_count(&before), 1);
        seq.toggle_mute(0);
        // walk a full loop; the muted track never fires again
        let mut now = 0.025;
        let mut later = Vec::new();
        for _ in 0..200 {
            later.extend(seq.tick(now));
            now += 0.025;
        }
        assert_eq!(trigger_count(&later), 0);
    }

    #[test]
    fn pattern_switching_stops_and_reapplies_state() {
        let mut seq = sequencer();
        seq.play(0.0);
        let cmds = seq.new_pattern();
        assert_eq!(seq.transport_state(), TransportState::Stopped);
        assert!(matches!(cmds[0], AudioCommand::CancelPending));
        assert!(cmds.iter().any(|c| matches!(c, AudioCommand::SetMasterGain { .. })));
        assert_eq!(seq.to_bank().patterns.len(), 2);
    }

    #[test]
    fn the_last_pattern_cannot_be_deleted() {
        let mut seq = sequencer();
        let id = seq.pattern().unwrap().id.clone();
        assert!(seq.delete_pattern(&id).is_empty());
        assert_eq!(seq.to_bank().patterns.len(), 1);

        seq.new_pattern();
        let second = seq.pattern().unwrap().id.clone();
        let cmds = seq.delete_pattern(&second);
        assert!(!cmds.is_empty());
        assert_eq!(seq.to_bank().patterns.len(), 1);
    }

    #[test]
    fn bank_round_trip_keeps_the_current_pattern() {
        let mut seq = sequencer();
        seq.new_pattern();
        let current = seq.pattern().unwrap().id.clone();
        let bank = seq.to_bank();
        let restored = Sequencer::with_bank(Some(bank));
        assert_eq!(restored.pattern().unwrap().id, current);
    }

    #[test]
    fn duplicate_copies_steps_under_a_new_id() {
        let mut seq = sequencer();
        let src_id = seq.pattern().unwrap().id.clone();
        seq.duplicate_pattern();
        let copy = seq.pattern().unwrap();
        assert_ne!(copy.id, src_id);
        assert!(copy.name.ends_with("(Copy)"));
        assert!(copy.tracks[0].steps[0].active);
        assert!(copy.tracks[0].steps[4].active);
    }

    #[test]
    fn load_pattern_switches_by_id() {
        let mut seq = sequencer();
        let first = seq.pattern().unwrap().id.clone();
        seq.new_pattern();
        assert_ne!(seq.pattern().unwrap().id, first);
        let cmds = seq.load_pattern(&first);
        assert_eq!(seq.pattern().unwrap().id, first);
        assert!(!cmds.is_empty());
        assert!(seq.load_pattern("no-such-id").is_empty());
    }

    #[test]
    fn swing_rides_on_the_pattern() {
        let mut seq = sequencer();
        seq.set_swing(0.3);
        assert_eq!(seq.pattern().unwrap().swing, 0.3);

        let bank = seq.to_bank();
        let restored = Sequencer::with_bank(Some(bank));
        assert_eq!(restored.swing(), 0.3);
    }

    #[test]
    fn rename_updates_the_modified_stamp() {
        let mut seq = sequencer();
        let before = seq.pattern().unwrap().modified;
        seq.rename_pattern("Renamed");
        let p = seq.pattern().unwrap();
        assert_eq!(p.name, "Renamed");
        assert!(p.modified >= before);
    }

    #[test]
    fn bus_parameter_adjustments_clamp_like_the_engine() {
        let mut seq = sequencer();
        let cmds = seq.set_global_reverb_decay(99.0);
        assert!(matches!(cmds[0], AudioCommand::SetReverbDecay(d) if d == 10.0));
        let cmds = seq.set_global_delay_feedback(2.0);
        assert!(matches!(cmds[0], AudioCommand::SetDelayFeedback(f) if f == 0.95));
        assert_eq!(seq.display_state().reverb_decay, 10.0);
        assert_eq!(seq.display_state().delay_feedback, 0.95);
    }

    #[test]
    fn dispose_is_idempotent() {
        let mut seq = sequencer();
        seq.play(0.0);
        assert!(!seq.dispose().is_empty());
        assert!(seq.dispose().is_empty());
    }

    #[test]
    fn enabled_track_effects_become_insert_commands() {
        let mut seq = sequencer();
        let mut filter = EffectDesc {
            kind: "filter".into(),
            params: std::collections::HashMap::from([("cutoff".to_string(), 800.0)]),
            enabled: true,
        };
        seq.pattern_mut().unwrap().tracks[0].effects.push(filter.clone());
        filter.enabled = false;
        seq.pattern_mut().unwrap().tracks[1].effects.push(filter);

        let cmds = seq.init_commands();
        assert!(matches!(cmds[1], AudioCommand::ResetVoiceEffects));
        let cutoffs: Vec<_> = cmds
            .iter()
            .filter_map(|c| match c {
                AudioCommand::SetVoiceFilterCutoff { instrument, cutoff_hz } => {
                    Some((*instrument, *cutoff_hz))
                }
                _ => None,
            })
            .collect();
        // the disabled copy on the snare track configures nothing
        assert_eq!(cutoffs, vec![(InstrumentKind::Kick, 800.0)]);
    }

    #[test]
    fn unknown_effect_kinds_configure_nothing() {
        let effect = EffectDesc {
            kind: "bitcrush".into(),
            params: Default::default(),
            enabled: true,
        };
        assert!(insert_command(InstrumentKind::Kick, &effect).is_none());
    }

    #[test]
    fn master_volume_clamps() {
        let mut seq = sequencer();
        seq.set_master_volume(1.8);
        assert_eq!(seq.display_state().master_volume, 1.0);
    }
}
