mod audio;
mod audio_api;
mod facade;
mod sequencer;
mod shared;
mod tui;

use std::path::PathBuf;
use std::time::Instant;

use crossterm::terminal;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use facade::Sequencer;
use sequencer::{persistence, share};
use shared::InputEvent;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    terminal::enable_raw_mode()?;
    let _guard = RawModeGuard; // auto drops when out of scope
    let audio = audio::start_audio()?;

    // gridbeat [project_dir] [--import TOKEN]
    let mut project_dir: PathBuf = std::env::current_dir().unwrap_or_default();
    let mut import_token: Option<String> = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--import" {
            import_token = args.next();
        } else {
            project_dir = PathBuf::from(arg);
        }
    }

    let mut bank = persistence::load_bank(&project_dir).unwrap_or_default();
    if let Some(token) = import_token {
        match share::decode_pattern(&token) {
            Some(p) => {
                bank.current = Some(p.id.clone());
                bank.patterns.push(p);
            }
            None => eprintln!("ignoring malformed share token"),
        }
    }
    let mut seq = Sequencer::with_bank(Some(bank));

    // push control state (voice gains, master, delay sync) to the engine
    for cmd in seq.init_commands() {
        audio.send(cmd);
    }

    let backend = CrosstermBackend::new(std::io::stdout());
    let mut term = Terminal::new(backend)?;
    term.clear()?;

    let tick_rate = std::time::Duration::from_millis(16); // ~60fps
    let schedule_interval = std::time::Duration::from_millis(shared::SCHEDULE_INTERVAL_MS);
    let blink_start = Instant::now();
    let mut last_schedule: Option<Instant> = None;
    let mut tui_state = tui::mode::TuiState::default();

    loop {
        let blink_on = (blink_start.elapsed().as_millis() / 250) % 2 == 0;

        // step cues come back from the audio thread at their exact fire time
        while let Some(notice) = audio.poll_step_notice() {
            seq.notify_step(notice.step);
        }

        let ds = seq.display_state();
        tui_state.sync(ds.tracks.len(), ds.length, ds.playing);

        term.draw(|frame| {
            tui::view::render(frame, frame.area(), &ds, &tui_state, blink_on);
        })?;

        let events = tui::input::poll_input(tick_rate, &mut tui_state)?;
        for event in events {
            match event {
                InputEvent::Quit => {
                    for cmd in seq.dispose() {
                        audio.send(cmd);
                    }
                    persistence::save_bank(&project_dir, &seq.to_bank())?;
                    drop(term);
                    drop(audio);
                    return Ok(());
                }
                InputEvent::Save => {
                    persistence::save_bank(&project_dir, &seq.to_bank())?;
                }
                InputEvent::SharePattern => {
                    if let Some(pattern) = seq.pattern() {
                        let token = share::encode_pattern(pattern);
                        persistence::save_share_token(&project_dir, &token)?;
                    }
                }
                event => {
                    for cmd in seq.handle_input(event, audio.clock_secs()) {
                        audio.send(cmd);
                    }
                }
            }
        }

        // one lookahead pass against the audio clock; the ui redraws faster
        // than the scheduler needs to run
        if last_schedule.is_none_or(|t| t.elapsed() >= schedule_interval) {
            last_schedule = Some(Instant::now());
            for cmd in seq.tick(audio.clock_secs()) {
                audio.send(cmd);
            }
        }
    }
}

struct RawModeGuard;
impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}
