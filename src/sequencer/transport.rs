// The transport: a small state machine plus the lookahead scheduler. Each
// control tick it emits every step whose target time falls inside the
// lookahead window ahead of the audio clock; the audio engine then fires
// them at the exact scheduled time. Scheduling can be late by one poll
// interval, the trigger time never is.

use super::pattern::{Pattern, StepTrigger, triggers_at};
use crate::shared::{DEFAULT_BPM, DEFAULT_SWING, LOOKAHEAD_SECS, MAX_BPM, MIN_BPM};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Playing,
    Paused,
}

/// One scheduled step: its index, its exact audio-clock fire time, and the
/// trigger set snapshotted at scheduling time. Pattern edits after this
/// point affect only the step's next occurrence.
#[derive(Clone, Debug)]
pub struct ScheduledStep {
    pub step: usize,
    pub time: f64,
    pub triggers: Vec<StepTrigger>,
}

pub struct Transport {
    state: TransportState,
    cursor: usize,
    next_step_time: f64,
    bpm: f32,
    swing: f32, // stored raw; outside [0,1) it acts as 0
    lookahead: f64,
}

impl Transport {
    pub fn new() -> Self {
        Self {
            state: TransportState::Stopped,
            cursor: 0,
            next_step_time: 0.0,
            bpm: DEFAULT_BPM,
            swing: DEFAULT_SWING,
            lookahead: LOOKAHEAD_SECS,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_bpm(&mut self, bpm: f32) {
        self.bpm = bpm.clamp(MIN_BPM, MAX_BPM);
    }

    pub fn bpm(&self) -> f32 {
        self.bpm
    }

    pub fn set_swing(&mut self, swing: f32) {
        self.swing = swing;
    }

    pub fn swing(&self) -> f32 {
        self.swing
    }

    fn effective_swing(&self) -> f64 {
        if (0.0..1.0).contains(&self.swing) {
            self.swing as f64
        } else {
            0.0
        }
    }

    /// Sixteenth-note grid interval in seconds.
    pub fn step_interval(&self) -> f64 {
        60.0 / self.bpm as f64 / 4.0
    }

    /// Start or resume. From Stopped the cursor resets to 0; from Paused it
    /// resumes where it froze. Either way the step clock re-bases on `now`
    /// so pause gaps don't produce a burst of overdue steps. No-op while
    /// already playing.
    pub fn play(&mut self, now: f64) -> bool {
        match self.state {
            TransportState::Playing => false,
            TransportState::Stopped => {
                self.cursor = 0;
                self.next_step_time = now;
                self.state = TransportState::Playing;
                true
            }
            TransportState::Paused => {
                self.next_step_time = now;
                self.state = TransportState::Playing;
                true
            }
        }
    }

    /// Freeze the clock, keep the cursor. Only valid from Playing.
    pub fn pause(&mut self) -> bool {
        if self.state != TransportState::Playing {
            return false;
        }
        self.state = TransportState::Paused;
        true
    }

    /// Valid from any state; resets the cursor. Returns true if there was
    /// anything to stop (the caller then cancels pending audio events and
    /// re-syncs observers to step 0).
    pub fn stop(&mut self) -> bool {
        let was_running = self.state != TransportState::Stopped;
        self.state = TransportState::Stopped;
        self.cursor = 0;
        was_running
    }

    /// One lookahead pass: emit every step due before `now + lookahead`,
    /// snapshotting each step's trigger set from the pattern. Wraparound
    /// goes through the same path as any other advance, so the loop seam
    /// has no timing discontinuity.
    pub fn schedule(&mut self, now: f64, pattern: &Pattern) -> Vec<ScheduledStep> {
        let mut out = Vec::new();
        if self.state != TransportState::Playing || pattern.length == 0 {
            return out;
        }
        let interval = self.step_interval();
        while self.next_step_time < now + self.lookahead {
            // odd steps get pushed late by the swing fraction of a step
            let mut time = self.next_step_time;
            if self.cursor % 2 == 1 {
                time += self.effective_swing() * interval;
            }
            out.push(ScheduledStep {
                step: self.cursor,
                time,
                triggers: triggers_at(pattern, self.cursor),
            });
            self.next_step_time += interval;
            self.cursor = (self.cursor + 1) % pattern.length;
        }
        out
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::InstrumentKind;

    fn kick_four_on_floor() -> Pattern {
        let mut p = Pattern::seed("p1", "Pattern 1");
        for step in [0, 4, 8, 12] {
            p.tracks[0].steps[step].active = true;
        }
        p
    }

    /// Drive the scheduler with an advancing synthetic clock until `steps`
    /// step events have been emitted.
    fn run(transport: &mut Transport, pattern: &Pattern, steps: usize) -> Vec<ScheduledStep> {
        let mut out = Vec::new();
        let mut now = 0.0;
        while out.len() < steps {
            out.extend(transport.schedule(now, pattern));
            now += 0.025;
        }
        out.truncate(steps);
        out
    }

    #[test]
    fn bpm_clamps_to_valid_range() {
        let mut t = Transport::new();
        t.set_bpm(500.0);
        assert_eq!(t.bpm(), 200.0);
        t.set_bpm(10.0);
        assert_eq!(t.bpm(), 60.0);
        t.set_bpm(128.0);
        assert_eq!(t.bpm(), 128.0);
    }

    #[test]
    fn play_requires_stopped_or_paused() {
        let mut t = Transport::new();
        assert!(t.play(0.0));
        assert!(!t.play(1.0)); // double play is a no-op
        assert!(t.pause());
        assert!(!t.pause()); // double pause too
        assert!(t.play(2.0));
        assert_eq!(t.state(), TransportState::Playing);
    }

    #[test]
    fn stop_resets_cursor_from_any_state() {
        let mut t = Transport::new();
        let p = kick_four_on_floor();
        t.play(0.0);
        run(&mut t, &p, 5);
        assert_ne!(t.cursor(), 0);
        assert!(t.stop());
        assert_eq!(t.cursor(), 0);
        assert_eq!(t.state(), TransportState::Stopped);
        assert!(!t.stop()); // already stopped
    }

    #[test]
    fn pause_preserves_cursor_and_resume_continues() {
        let mut t = Transport::new();
        let p = kick_four_on_floor();
        t.play(0.0);
        run(&mut t, &p, 5);
        let cursor = t.cursor();
        t.pause();
        assert_eq!(t.cursor(), cursor);
        t.play(100.0);
        let next = t.schedule(100.0, &p);
        assert_eq!(next[0].step, cursor);
        // resumed steps are based on the resume-time clock, not the old one
        assert!(next[0].time >= 100.0);
    }

    #[test]
    fn cursor_walks_every_index_in_order_with_wrap() {
        let mut t = Transport::new();
        let p = kick_four_on_floor();
        t.play(0.0);
        let steps = run(&mut t, &p, 33);
        for (n, s) in steps.iter().enumerate() {
            assert_eq!(s.step, n % 16, "skipped or repeated index at {n}");
        }
    }

    #[test]
    fn kick_at_120bpm_lands_on_half_seconds() {
        let mut t = Transport::new();
        t.set_bpm(120.0);
        let p = kick_four_on_floor();
        t.play(0.0);
        let steps = run(&mut t, &p, 16);
        let fire_times: Vec<f64> = steps
            .iter()
            .filter(|s| !s.triggers.is_empty())
            .map(|s| s.time)
            .collect();
        let expected = [0.0, 0.5, 1.0, 1.5];
        assert_eq!(fire_times.len(), expected.len());
        for (got, want) in fire_times.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "got {got}, want {want}");
        }
        for s in &steps {
            for trig in &s.triggers {
                assert_eq!(trig.instrument, InstrumentKind::Kick);
            }
        }
    }

    #[test]
    fn swing_delays_odd_steps_by_swing_times_interval() {
        let mut t = Transport::new();
        t.set_bpm(120.0); // interval 0.125s
        t.set_swing(0.4);
        let p = kick_four_on_floor();
        t.play(0.0);
        let steps = run(&mut t, &p, 4);
        assert!((steps[0].time - 0.0).abs() < 1e-9);
        assert!((steps[1].time - (0.125 + 0.4 * 0.125)).abs() < 1e-9);
        assert!((steps[2].time - 0.25).abs() < 1e-9);
        assert!((steps[3].time - (0.375 + 0.4 * 0.125)).abs() < 1e-9);
    }

    #[test]
    fn swing_outside_unit_interval_is_disabled() {
        for bad in [-0.3, 1.0, 2.5] {
            let mut t = Transport::new();
            t.set_bpm(120.0);
            t.set_swing(bad);
            let p = kick_four_on_floor();
            t.play(0.0);
            let steps = run(&mut t, &p, 4);
            assert!((steps[1].time - 0.125).abs() < 1e-9, "swing {bad} leaked in");
        }
    }

    #[test]
    fn scheduled_times_are_strictly_increasing() {
        let mut t = Transport::new();
        t.set_swing(0.9); // extreme but legal swing must stay monotonic
        let p = kick_four_on_floor();
        t.play(0.0);
        let steps = run(&mut t, &p, 64);
        for pair in steps.windows(2) {
            assert!(pair[0].time < pair[1].time);
        }
    }

    #[test]
    fn nothing_schedules_while_stopped_or_paused() {
        let mut t = Transport::new();
        let p = kick_four_on_floor();
        assert!(t.schedule(0.0, &p).is_empty());
        t.play(0.0);
        t.pause();
        assert!(t.schedule(1.0, &p).is_empty());
    }

    #[test]
    fn trigger_set_is_snapshotted_at_scheduling_time() {
        let mut t = Transport::new();
        let mut p = kick_four_on_floor();
        t.play(0.0);
        let first = t.schedule(0.0, &p);
        assert!(!first[0].triggers.is_empty());
        // toggling after the pass changes nothing already emitted, and shows
        // up on the step's next occurrence
        p.tracks[0].steps[0].active = false;
        let mut now = 0.025;
        let mut second_lap = Vec::new();
        while second_lap.len() < 17 {
            second_lap.extend(t.schedule(now, &p));
            now += 0.025;
        }
        let wrapped = second_lap.iter().find(|s| s.step == 0).unwrap();
        assert!(wrapped.triggers.is_empty());
    }
}
