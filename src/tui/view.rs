use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use super::mode::TuiState;
use crate::shared::DisplayState;

const NAME_COL: usize = 9;

pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState, ts: &TuiState, blink_on: bool) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),                          // header
            Constraint::Length(state.tracks.len() as u16 + 2), // step grid
            Constraint::Length(3),                          // mixer
            Constraint::Min(1),                             // help
        ])
        .split(area);

    draw_header(frame, sections[0], state, blink_on);
    draw_grid(frame, sections[1], state, ts);
    draw_mixer(frame, sections[2], state);
    draw_help(frame, sections[3]);
}

fn draw_header(frame: &mut Frame, area: Rect, state: &DisplayState, blink_on: bool) {
    let transport = if state.playing {
        Span::styled("▶ PLAY", Style::default().fg(Color::Green))
    } else if state.paused {
        let style = if blink_on {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Span::styled("⏸ PAUSE", style)
    } else {
        Span::styled("■ STOP", Style::default().fg(Color::DarkGray))
    };

    let line = Line::from(vec![
        Span::styled(
            state.pattern_name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        transport,
        Span::raw(format!(
            "  {:>3.0} bpm  swing {:>2.0}%",
            state.bpm,
            state.swing * 100.0
        )),
    ]);
    let block = Block::default().borders(Borders::ALL).title(" gridbeat ");
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_grid(frame: &mut Frame, area: Rect, state: &DisplayState, ts: &TuiState) {
    let mut lines = Vec::with_capacity(state.tracks.len());
    for (row, track) in state.tracks.iter().enumerate() {
        let mut spans = Vec::with_capacity(state.length + 2);

        let flag = if track.solo {
            Span::styled("S", Style::default().fg(Color::Yellow))
        } else if track.muted {
            Span::styled("M", Style::default().fg(Color::Red))
        } else {
            Span::raw(" ")
        };
        spans.push(flag);
        spans.push(Span::raw(format!(" {:<width$}", track.name, width = NAME_COL)));

        for (col, &active) in track.steps.iter().enumerate() {
            let symbol = if active { "■" } else { "·" };
            let mut style = if !track.audible {
                Style::default().fg(Color::DarkGray)
            } else if active {
                Style::default().fg(Color::Magenta)
            } else {
                Style::default().fg(Color::Gray)
            };
            // the playhead column lights up while playing
            if state.playing_step == Some(col) {
                style = style.bg(Color::DarkGray).fg(Color::White);
            }
            if row == ts.cursor_track && col == ts.cursor_step {
                style = style.add_modifier(Modifier::REVERSED);
            }
            spans.push(Span::styled(symbol, style));
            // a gap every beat keeps long rows readable
            spans.push(Span::raw(if (col + 1) % 4 == 0 { "  " } else { " " }));
        }
        lines.push(Line::from(spans));
    }
    let block = Block::default().borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_mixer(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let track_vol = state
        .tracks
        .first()
        .map(|_| {
            state
                .tracks
                .iter()
                .map(|t| format!("{:>3.0}", t.volume * 100.0))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();
    let line = Line::from(vec![
        Span::raw(format!("vol {track_vol}  ")),
        Span::raw(format!("master {:>3.0}  ", state.master_volume * 100.0)),
        Span::styled(
            format!(
                "rev {:>3.0} ({:.1}s)  ",
                state.reverb_mix * 100.0,
                state.reverb_decay
            ),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!(
                "dly {:>3.0} (fb {:>2.0})",
                state.delay_mix * 100.0,
                state.delay_feedback * 100.0
            ),
            Style::default().fg(Color::Cyan),
        ),
    ]);
    let block = Block::default().borders(Borders::ALL).title(" mix ");
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Line::from(Span::styled(
        "space play/pause  bksp stop  arrows move  enter step  m mute  o solo  \
         -/= bpm  [/] swing  ,/. vol  r/R rev  t/T decay  d/D dly  f/F fb  \
         c clear  n/N pattern  P dup  X del  x share  s save  q quit",
        Style::default().fg(Color::DarkGray),
    ));
    frame.render_widget(Paragraph::new(help), area);
}
