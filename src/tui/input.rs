use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use std::time::Duration;

use super::mode::TuiState;
use crate::shared::InputEvent;

// poll for input from the tui, move the edit cursor in tuistate, and
// resolve everything else to semantic input events for the facade
pub fn poll_input(timeout: Duration, ts: &mut TuiState) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(vec![]);
        }
        return Ok(handle_key(key.code, ts));
    }
    Ok(vec![])
}

fn handle_key(code: KeyCode, ts: &mut TuiState) -> Vec<InputEvent> {
    match code {
        KeyCode::Esc => vec![InputEvent::Quit],
        KeyCode::Char(' ') => vec![InputEvent::PlayPause],
        KeyCode::Backspace => vec![InputEvent::Stop],

        // cursor moves stay local to the tui
        KeyCode::Up | KeyCode::Char('k') => {
            ts.move_up();
            vec![]
        }
        KeyCode::Down | KeyCode::Char('j') => {
            ts.move_down();
            vec![]
        }
        KeyCode::Left | KeyCode::Char('h') => {
            ts.move_left();
            vec![]
        }
        KeyCode::Right | KeyCode::Char('l') => {
            ts.move_right();
            vec![]
        }
        KeyCode::Enter => vec![InputEvent::ToggleStep {
            track: ts.cursor_track,
            step: ts.cursor_step,
        }],

        KeyCode::Char('m') => vec![InputEvent::ToggleMute(ts.cursor_track)],
        KeyCode::Char('o') => vec![InputEvent::ToggleSolo(ts.cursor_track)],

        // tempo and feel, lowercase pairs = down/up
        KeyCode::Char('-') => vec![InputEvent::AdjustBpm(-1.0)],
        KeyCode::Char('=') => vec![InputEvent::AdjustBpm(1.0)],
        KeyCode::Char('_') => vec![InputEvent::AdjustBpm(-5.0)],
        KeyCode::Char('+') => vec![InputEvent::AdjustBpm(5.0)],
        KeyCode::Char('[') => vec![InputEvent::AdjustSwing(-0.05)],
        KeyCode::Char(']') => vec![InputEvent::AdjustSwing(0.05)],

        // mixer: cursor track, master, and the two shared returns
        KeyCode::Char(',') => vec![InputEvent::AdjustTrackVolume {
            track: ts.cursor_track,
            delta: -0.05,
        }],
        KeyCode::Char('.') => vec![InputEvent::AdjustTrackVolume {
            track: ts.cursor_track,
            delta: 0.05,
        }],
        KeyCode::Char('<') => vec![InputEvent::AdjustMasterVolume(-0.05)],
        KeyCode::Char('>') => vec![InputEvent::AdjustMasterVolume(0.05)],
        KeyCode::Char('r') => vec![InputEvent::AdjustReverbMix(-0.05)],
        KeyCode::Char('R') => vec![InputEvent::AdjustReverbMix(0.05)],
        KeyCode::Char('t') => vec![InputEvent::AdjustReverbDecay(-0.5)],
        KeyCode::Char('T') => vec![InputEvent::AdjustReverbDecay(0.5)],
        KeyCode::Char('d') => vec![InputEvent::AdjustDelayMix(-0.05)],
        KeyCode::Char('D') => vec![InputEvent::AdjustDelayMix(0.05)],
        KeyCode::Char('f') => vec![InputEvent::AdjustDelayFeedback(-0.05)],
        KeyCode::Char('F') => vec![InputEvent::AdjustDelayFeedback(0.05)],

        KeyCode::Char('c') => vec![InputEvent::ClearPattern],
        KeyCode::Char('n') => vec![InputEvent::NextPattern],
        KeyCode::Char('N') => vec![InputEvent::NewPattern],
        KeyCode::Char('P') => vec![InputEvent::DuplicatePattern],
        KeyCode::Char('X') => vec![InputEvent::DeletePattern],
        KeyCode::Char('x') => vec![InputEvent::SharePattern],
        KeyCode::Char('s') => vec![InputEvent::Save],
        KeyCode::Char('q') => vec![InputEvent::Quit],

        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> TuiState {
        let mut ts = TuiState::default();
        ts.sync(4, 16, false);
        ts
    }

    #[test]
    fn enter_toggles_the_step_under_the_cursor() {
        let mut ts = ts();
        ts.cursor_track = 2;
        ts.cursor_step = 7;
        assert_eq!(
            handle_key(KeyCode::Enter, &mut ts),
            vec![InputEvent::ToggleStep { track: 2, step: 7 }]
        );
    }

    #[test]
    fn cursor_keys_move_without_emitting_events() {
        let mut ts = ts();
        assert!(handle_key(KeyCode::Right, &mut ts).is_empty());
        assert!(handle_key(KeyCode::Down, &mut ts).is_empty());
        assert_eq!(ts.cursor_step, 1);
        assert_eq!(ts.cursor_track, 1);
    }

    #[test]
    fn mute_and_solo_target_the_cursor_track() {
        let mut ts = ts();
        ts.cursor_track = 3;
        assert_eq!(
            handle_key(KeyCode::Char('m'), &mut ts),
            vec![InputEvent::ToggleMute(3)]
        );
        assert_eq!(
            handle_key(KeyCode::Char('o'), &mut ts),
            vec![InputEvent::ToggleSolo(3)]
        );
    }

    #[test]
    fn unbound_keys_emit_nothing() {
        let mut ts = ts();
        assert!(handle_key(KeyCode::Char('z'), &mut ts).is_empty());
        assert!(handle_key(KeyCode::Tab, &mut ts).is_empty());
    }

    #[test]
    fn transport_and_tempo_bindings() {
        let mut ts = ts();
        assert_eq!(
            handle_key(KeyCode::Char(' '), &mut ts),
            vec![InputEvent::PlayPause]
        );
        assert_eq!(
            handle_key(KeyCode::Backspace, &mut ts),
            vec![InputEvent::Stop]
        );
        assert_eq!(
            handle_key(KeyCode::Char('+'), &mut ts),
            vec![InputEvent::AdjustBpm(5.0)]
        );
        assert_eq!(
            handle_key(KeyCode::Char('['), &mut ts),
            vec![InputEvent::AdjustSwing(-0.05)]
        );
    }
}
