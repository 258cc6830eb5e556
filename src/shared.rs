// Types and constants shared between the control layer, the audio layer,
// and the TUI. The TUI only ever sees `InputEvent` (in) and `DisplayState`
// (out); everything musical lives behind the facade.

use serde::{Deserialize, Serialize};

pub const MIN_BPM: f32 = 60.0;
pub const MAX_BPM: f32 = 200.0;
pub const DEFAULT_BPM: f32 = 120.0;
pub const DEFAULT_SWING: f32 = 0.0;
pub const DEFAULT_VOLUME: f32 = 0.75;
pub const DEFAULT_VELOCITY: f32 = 0.8;

// Lookahead scheduling: schedule anything due within the next 100ms,
// re-checking every control tick. The scheduling decision can be late by
// one poll interval; the fire time never is.
pub const LOOKAHEAD_SECS: f64 = 0.1;
pub const SCHEDULE_INTERVAL_MS: u64 = 25;

pub const DEFAULT_STEP_COUNT: usize = 16;
pub const VALID_STEP_COUNTS: [usize; 3] = [16, 32, 64];

/// The closed set of synthesized voices. Adding one is a compile-time
/// exercise: every match over this enum is exhaustive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentKind {
    Kick,
    Snare,
    Hihat,
    Openhat,
    Clap,
    Perc,
    Synth,
    Bass,
}

impl InstrumentKind {
    pub const COUNT: usize = 8;

    pub const ALL: [InstrumentKind; Self::COUNT] = [
        InstrumentKind::Kick,
        InstrumentKind::Snare,
        InstrumentKind::Hihat,
        InstrumentKind::Openhat,
        InstrumentKind::Clap,
        InstrumentKind::Perc,
        InstrumentKind::Synth,
        InstrumentKind::Bass,
    ];

    /// Stable slot index into the voice bank.
    pub fn index(self) -> usize {
        match self {
            InstrumentKind::Kick => 0,
            InstrumentKind::Snare => 1,
            InstrumentKind::Hihat => 2,
            InstrumentKind::Openhat => 3,
            InstrumentKind::Clap => 4,
            InstrumentKind::Perc => 5,
            InstrumentKind::Synth => 6,
            InstrumentKind::Bass => 7,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            InstrumentKind::Kick => "kick",
            InstrumentKind::Snare => "snare",
            InstrumentKind::Hihat => "hihat",
            InstrumentKind::Openhat => "openhat",
            InstrumentKind::Clap => "clap",
            InstrumentKind::Perc => "perc",
            InstrumentKind::Synth => "synth",
            InstrumentKind::Bass => "bass",
        }
    }

    /// Parse a persisted/shared tag. Unknown tags are the caller's problem
    /// (skip the track, don't fail the load).
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }

    pub fn label(self) -> &'static str {
        match self {
            InstrumentKind::Kick => "Kick",
            InstrumentKind::Snare => "Snare",
            InstrumentKind::Hihat => "HiHat",
            InstrumentKind::Openhat => "OpenHat",
            InstrumentKind::Clap => "Clap",
            InstrumentKind::Perc => "Perc",
            InstrumentKind::Synth => "Synth",
            InstrumentKind::Bass => "Bass",
        }
    }
}

// semantic events resolved by the tui, consumed by the facade
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    PlayPause,
    Stop,
    ToggleStep { track: usize, step: usize },
    ToggleMute(usize),
    ToggleSolo(usize),
    AdjustBpm(f32),
    AdjustSwing(f32),
    AdjustTrackVolume { track: usize, delta: f32 },
    AdjustMasterVolume(f32),
    AdjustReverbMix(f32),
    AdjustReverbDecay(f32),
    AdjustDelayMix(f32),
    AdjustDelayFeedback(f32),
    ClearPattern,
    NextPattern,
    NewPattern,
    DuplicatePattern,
    DeletePattern,
    SharePattern,
    Save,
    Quit,
}

/// Per-track row of the display snapshot.
#[derive(Clone, Debug)]
pub struct TrackView {
    pub name: String,
    pub steps: Vec<bool>,
    pub volume: f32,
    pub muted: bool,
    pub solo: bool,
    pub audible: bool, // effective mute already resolved
}

/// Everything the TUI needs to draw one frame. The view renders this and
/// nothing else.
#[derive(Clone, Debug)]
pub struct DisplayState {
    pub pattern_name: String,
    pub bpm: f32,
    pub swing: f32,
    pub playing: bool,
    pub paused: bool,
    pub playing_step: Option<usize>,
    pub length: usize,
    pub tracks: Vec<TrackView>,
    pub master_volume: f32,
    pub reverb_mix: f32,
    pub reverb_decay: f32,
    pub delay_mix: f32,
    pub delay_feedback: f32,
}
