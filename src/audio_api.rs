// The command surface between the control thread and the audio callback.
// Commands carry everything the engine needs, including absolute fire times
// in seconds on the audio clock; the engine never reads control-side state.

use crate::shared::InstrumentKind;

#[derive(Clone, Copy, Debug)]
pub struct TriggerParams {
    pub instrument: InstrumentKind,
    pub velocity: f32,
    /// Absolute audio-clock time in seconds. The engine converts this to a
    /// frame index and fires at exactly that frame.
    pub time: f64,
}

#[derive(Clone, Copy, Debug)]
pub enum AudioCommand {
    Trigger(TriggerParams),

    // Step-advance cue for the UI, scheduled at the same audio time as the
    // step's triggers so visual feedback lines up with sound.
    StepCue { step: usize, time: f64 },

    // Drops every scheduled-but-unfired event. Sent on stop().
    CancelPending,

    // Voice-level controls. Gains are linear; the voice converts to dB.
    SetVoiceGain { instrument: InstrumentKind, gain: f32 },
    SetVoiceReverbSend { instrument: InstrumentKind, level: f32 },
    SetVoiceDelaySend { instrument: InstrumentKind, level: f32 },
    SetMasterGain { gain: f32 },

    // Per-voice insert stages, driven by a track's stored effect list.
    // ResetVoiceEffects returns every chain to transparent and every send
    // tap to its voice default before the next pattern's effects apply.
    SetVoiceFilterCutoff { instrument: InstrumentKind, cutoff_hz: f32 },
    SetVoiceInsertDelay { instrument: InstrumentKind, time: f32, feedback: f32, mix: f32 },
    SetVoiceInsertReverb { instrument: InstrumentKind, decay: f32, mix: f32 },
    SetVoiceInsertGain { instrument: InstrumentKind, gain: f32 },
    ResetVoiceEffects,

    // Shared send/return bus controls, clamped by the graph.
    SetReverbMix(f32),
    SetReverbDecay(f32),
    SetDelayMix(f32),
    SetDelayTime(f32),
    SetDelayFeedback(f32),
}

/// Emitted by the engine at the exact frame a step cue comes due; drained on
/// the control thread to drive the step observer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepNotice {
    pub step: usize,
    pub time: f64,
}
