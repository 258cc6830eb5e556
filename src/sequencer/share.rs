// Pattern sharing codec: a compact projection of a pattern (name, bpm, per
// track the instrument tag, an active-step bitstring, rounded volume and
// the mute flag) serialized to JSON and wrapped in URL-safe base64 without
// padding. The token format is the sharing contract; anything malformed
// decodes to None.

use base64::Engine as _;
use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::pattern::{Pattern, Step, Track};
use crate::shared::{DEFAULT_STEP_COUNT, DEFAULT_VELOCITY, InstrumentKind};

#[derive(Serialize, Deserialize)]
struct SharedTrack {
    i: String, // instrument tag
    s: String, // active steps as a bitstring, "0100…"
    v: u8,     // volume as a rounded percentage
    m: u8,     // mute flag
}

#[derive(Serialize, Deserialize)]
struct SharedPattern {
    n: String,
    b: f32,
    t: Vec<SharedTrack>,
}

pub fn encode_pattern(pattern: &Pattern) -> String {
    let shared = SharedPattern {
        n: pattern.name.clone(),
        b: pattern.bpm,
        t: pattern
            .tracks
            .iter()
            .map(|track| SharedTrack {
                i: track.instrument.tag().to_string(),
                s: track
                    .steps
                    .iter()
                    .map(|s| if s.active { '1' } else { '0' })
                    .collect(),
                v: (track.volume * 100.0).round() as u8,
                m: track.muted as u8,
            })
            .collect(),
    };
    // serializing a plain struct of strings and numbers can't fail
    let json = serde_json::to_string(&shared).unwrap_or_default();
    BASE64_URL_SAFE_NO_PAD.encode(json)
}

/// Rebuild a playable pattern from a token. Unknown instrument tags skip
/// that track; any structural problem yields `None`.
pub fn decode_pattern(token: &str) -> Option<Pattern> {
    let json = BASE64_URL_SAFE_NO_PAD.decode(token).ok()?;
    let shared: SharedPattern = serde_json::from_slice(&json).ok()?;

    let now = Utc::now();
    let tracks: Vec<Track> = shared
        .t
        .iter()
        .filter_map(|st| {
            let instrument = InstrumentKind::from_tag(&st.i)?;
            let mut steps: Vec<Step> = st
                .s
                .chars()
                .map(|c| Step {
                    active: c == '1',
                    velocity: DEFAULT_VELOCITY,
                    ..Step::default()
                })
                .collect();
            steps.resize(DEFAULT_STEP_COUNT, Step::default());
            steps.truncate(DEFAULT_STEP_COUNT);
            Some(Track {
                id: format!("track-{}", instrument.tag()),
                name: instrument.label().to_string(),
                instrument,
                steps,
                volume: f32::from(st.v) / 100.0,
                effects: Vec::new(),
                muted: st.m == 1,
                solo: false,
            })
        })
        .collect();

    if tracks.is_empty() {
        return None;
    }

    Some(Pattern {
        id: format!("shared-{}", now.timestamp_millis()),
        name: shared.n,
        bpm: shared.b,
        swing: 0.0,
        tracks,
        length: DEFAULT_STEP_COUNT,
        created: now,
        modified: now,
        user_id: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_the_projection() {
        let mut p = Pattern::seed("p1", "My Beat");
        p.bpm = 140.0;
        p.tracks[0].steps[0].active = true;
        p.tracks[0].steps[4].active = true;
        p.tracks[1].muted = true;
        p.tracks[2].volume = 0.5;

        let token = encode_pattern(&p);
        // url safety: no '+', '/' or '='
        assert!(!token.contains(['+', '/', '=']));

        let back = decode_pattern(&token).expect("token should decode");
        assert_eq!(back.name, "My Beat");
        assert_eq!(back.bpm, 140.0);
        assert_eq!(back.length, 16);
        assert_eq!(back.tracks.len(), p.tracks.len());
        assert!(back.tracks[0].steps[0].active);
        assert!(back.tracks[0].steps[4].active);
        assert!(!back.tracks[0].steps[1].active);
        assert!(back.tracks[1].muted);
        assert!((back.tracks[2].volume - 0.5).abs() < 0.01);
    }

    #[test]
    fn malformed_tokens_decode_to_none() {
        assert!(decode_pattern("not base64 ***").is_none());
        let not_json = BASE64_URL_SAFE_NO_PAD.encode("hello");
        assert!(decode_pattern(&not_json).is_none());
    }

    #[test]
    fn unknown_instrument_tags_are_skipped() {
        let shared = SharedPattern {
            n: "X".into(),
            b: 120.0,
            t: vec![
                SharedTrack {
                    i: "cowbell".into(),
                    s: "1".repeat(16),
                    v: 75,
                    m: 0,
                },
                SharedTrack {
                    i: "kick".into(),
                    s: "1000100010001000".into(),
                    v: 75,
                    m: 0,
                },
            ],
        };
        let token = BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_string(&shared).unwrap());
        let back = decode_pattern(&token).unwrap();
        assert_eq!(back.tracks.len(), 1);
        assert_eq!(back.tracks[0].instrument, InstrumentKind::Kick);
    }

    #[test]
    fn all_unknown_tracks_is_a_rejected_token() {
        let shared = SharedPattern {
            n: "X".into(),
            b: 120.0,
            t: vec![SharedTrack {
                i: "theremin".into(),
                s: "0".repeat(16),
                v: 75,
                m: 0,
            }],
        };
        let token = BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_string(&shared).unwrap());
        assert!(decode_pattern(&token).is_none());
    }

    #[test]
    fn short_bitstrings_pad_to_a_full_row() {
        let shared = SharedPattern {
            n: "X".into(),
            b: 120.0,
            t: vec![SharedTrack {
                i: "snare".into(),
                s: "101".into(),
                v: 75,
                m: 0,
            }],
        };
        let token = BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_string(&shared).unwrap());
        let back = decode_pattern(&token).unwrap();
        assert_eq!(back.tracks[0].steps.len(), 16);
        assert!(back.tracks[0].steps[0].active);
        assert!(!back.tracks[0].steps[1].active);
        assert!(back.tracks[0].steps[2].active);
        assert!(back.is_consistent());
    }
}
