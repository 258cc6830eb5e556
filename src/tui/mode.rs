// State local to the tui: the edit cursor over the step grid. Grid bounds
// (track count, pattern length) and the transport flag are synced from
// DisplayState each frame, so cursor moves always wrap against the pattern
// actually on screen.
#[derive(Clone, Debug)]
pub struct TuiState {
    pub cursor_track: usize,
    pub cursor_step: usize,
    // synced from DisplayState each frame
    pub playing: bool,
    pub tracks: usize,
    pub length: usize,
}

impl Default for TuiState {
    fn default() -> Self {
        Self {
            cursor_track: 0,
            cursor_step: 0,
            playing: false,
            tracks: 1,
            length: 16,
        }
    }
}

impl TuiState {
    pub fn sync(&mut self, tracks: usize, length: usize, playing: bool) {
        self.tracks = tracks.max(1);
        self.length = length.max(1);
        self.playing = playing;
        self.cursor_track = self.cursor_track.min(self.tracks - 1);
        self.cursor_step = self.cursor_step.min(self.length - 1);
    }

    pub fn move_up(&mut self) {
        self.cursor_track = (self.cursor_track + self.tracks - 1) % self.tracks;
    }

    pub fn move_down(&mut self) {
        self.cursor_track = (self.cursor_track + 1) % self.tracks;
    }

    pub fn move_left(&mut self) {
        self.cursor_step = (self.cursor_step + self.length - 1) % self.length;
    }

    pub fn move_right(&mut self) {
        self.cursor_step = (self.cursor_step + 1) % self.length;
    }
}
