// The persisted data model: a pattern is a named, tempo-tagged loop of
// tracks, one per voice assignment, each a row of steps. Also home of the
// step processor, which resolves what fires on a given step index under
// mute/solo precedence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::shared::{
    DEFAULT_BPM, DEFAULT_STEP_COUNT, DEFAULT_SWING, DEFAULT_VELOCITY, DEFAULT_VOLUME,
    InstrumentKind, VALID_STEP_COUNTS,
};

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Step {
    pub active: bool,
    pub velocity: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f32>,
}

impl Default for Step {
    fn default() -> Self {
        Self {
            active: false,
            velocity: DEFAULT_VELOCITY,
            pitch: None,
            duration: None,
        }
    }
}

/// Effect descriptors ride along for round-trip fidelity; the engine only
/// consumes send levels, not these.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EffectDesc {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub params: HashMap<String, f32>,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub instrument: InstrumentKind,
    pub steps: Vec<Step>,
    pub volume: f32,
    #[serde(default)]
    pub effects: Vec<EffectDesc>,
    // `muted` is explicit user intent only. Solo precedence is resolved per
    // tick and never written back, so clearing a solo restores the stored
    // mutes untouched.
    pub muted: bool,
    pub solo: bool,
}

impl Track {
    pub fn new(index: usize, instrument: InstrumentKind, length: usize) -> Self {
        Self {
            id: format!("track-{index}"),
            name: instrument.label().to_string(),
            instrument,
            steps: vec![Step::default(); length],
            volume: DEFAULT_VOLUME,
            effects: Vec::new(),
            muted: false,
            solo: false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Pattern {
    pub id: String,
    pub name: String,
    pub bpm: f32,
    #[serde(default)]
    pub swing: f32,
    pub tracks: Vec<Track>,
    pub length: usize,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "userId")]
    pub user_id: Option<String>,
}

impl Pattern {
    /// The default seed pattern: four empty drum tracks, 16 steps.
    pub fn seed(id: &str, name: &str) -> Self {
        let instruments = [
            InstrumentKind::Kick,
            InstrumentKind::Snare,
            InstrumentKind::Hihat,
            InstrumentKind::Openhat,
        ];
        let now = Utc::now();
        Self {
            id: id.to_string(),
            name: name.to_string(),
            bpm: DEFAULT_BPM,
            swing: DEFAULT_SWING,
            tracks: instruments
                .iter()
                .enumerate()
                .map(|(i, &kind)| Track::new(i, kind, DEFAULT_STEP_COUNT))
                .collect(),
            length: DEFAULT_STEP_COUNT,
            created: now,
            modified: now,
            user_id: None,
        }
    }

    pub fn touch(&mut self) {
        self.modified = Utc::now();
    }

    /// Length must be one of the supported step counts and every track must
    /// agree with it. Violations are a data-corruption condition: the loader
    /// rejects illegal lengths and repairs disagreeing tracks.
    pub fn has_valid_length(&self) -> bool {
        VALID_STEP_COUNTS.contains(&self.length)
    }

    pub fn is_consistent(&self) -> bool {
        self.has_valid_length() && self.tracks.iter().all(|t| t.steps.len() == self.length)
    }

    /// Resize every track's step row to the pattern length, padding with
    /// inactive steps. Only meaningful when the length itself is legal.
    pub fn repair(&mut self) {
        for track in &mut self.tracks {
            track.steps.resize(self.length, Step::default());
        }
    }

    /// Flip a step's active flag. Out-of-range indices are a silent no-op.
    pub fn toggle_step(&mut self, track_index: usize, step_index: usize) -> bool {
        let Some(step) = self
            .tracks
            .get_mut(track_index)
            .and_then(|t| t.steps.get_mut(step_index))
        else {
            return false;
        };
        step.active = !step.active;
        true
    }

    pub fn clear_steps(&mut self) {
        for track in &mut self.tracks {
            for step in &mut track.steps {
                step.active = false;
            }
        }
    }

    pub fn any_solo(&self) -> bool {
        self.tracks.iter().any(|t| t.solo)
    }
}

/// Solo precedence: while any track is soloed, only soloed tracks are
/// audible regardless of their stored mute flag; otherwise the mute flag
/// decides.
pub fn effective_mute(track: &Track, any_solo: bool) -> bool {
    if any_solo { !track.solo } else { track.muted }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepTrigger {
    pub instrument: InstrumentKind,
    pub velocity: f32,
}

/// Resolve what fires on `step_index`, in track order. Velocity passes
/// through unmodified; scaling is the voice's business.
pub fn triggers_at(pattern: &Pattern, step_index: usize) -> Vec<StepTrigger> {
    let any_solo = pattern.any_solo();
    pattern
        .tracks
        .iter()
        .filter(|track| !effective_mute(track, any_solo))
        .filter_map(|track| {
            let step = track.steps.get(step_index)?;
            step.active.then_some(StepTrigger {
                instrument: track.instrument,
                velocity: step.velocity,
            })
        })
        .collect()
}
