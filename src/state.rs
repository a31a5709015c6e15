use crate::piano_roll::PianoRoll;

/// What the main panel frame currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    Empty,
    PluginsInUse,
    Mixer,
    Playlist,
    Browser,
    ChannelRack,
    Recording,
    StoppedRecording,
}

/// One line of panel text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelLine {
    pub text: String,
    pub heading: bool,
    /// Drawn in the alert color instead of white.
    pub alert: bool,
}

impl PanelLine {
    fn heading(text: &str) -> Self {
        Self { text: text.to_string(), heading: true, alert: false }
    }

    fn plain(text: &str) -> Self {
        Self { text: text.to_string(), heading: false, alert: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    OpenPianoRoll,
    Show(Panel),
    AddTrack,
}

/// Toolbar buttons, left to right.
pub const TOOLBAR: [(&str, ToolbarAction); 9] = [
    ("🎹 Piano Roll", ToolbarAction::OpenPianoRoll),
    ("🔌 Plugins", ToolbarAction::Show(Panel::PluginsInUse)),
    ("🎚 Mixer", ToolbarAction::Show(Panel::Mixer)),
    ("📋 Playlist", ToolbarAction::Show(Panel::Playlist)),
    ("📁 Browser", ToolbarAction::Show(Panel::Browser)),
    ("🎛 Channel Rack", ToolbarAction::Show(Panel::ChannelRack)),
    ("● Record", ToolbarAction::Show(Panel::Recording)),
    ("■ Stop", ToolbarAction::Show(Panel::StoppedRecording)),
    ("➕ Add Track", ToolbarAction::AddTrack),
];

/// An open piano-roll window and the sequence it owns.
#[derive(Debug)]
pub struct PianoRollWindow {
    pub id: u64,
    pub open: bool,
    pub roll: PianoRoll,
}

/// Everything the UI shows, owned by the app controller.
#[derive(Debug, Default)]
pub struct AppState {
    pub panel: Panel,
    /// Track file paths in the order they were added. Never opened.
    pub tracks: Vec<String>,
    pub piano_rolls: Vec<PianoRollWindow>,
    next_piano_roll_id: u64,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn show(&mut self, panel: Panel) {
        self.panel = panel;
    }

    /// Opens a fresh piano roll with an empty sequence and returns its id.
    pub fn open_piano_roll(&mut self) -> u64 {
        let id = self.next_piano_roll_id;
        self.next_piano_roll_id += 1;
        self.piano_rolls.push(PianoRollWindow {
            id,
            open: true,
            roll: PianoRoll::new(),
        });
        id
    }

    /// Drops the sequences of windows the user closed.
    pub fn discard_closed_piano_rolls(&mut self) {
        self.piano_rolls.retain(|window| window.open);
    }

    pub fn add_track(&mut self, path: String) {
        self.tracks.push(path);
        self.show(Panel::Playlist);
    }

    /// Panel contents as a function of the current state.
    pub fn panel_lines(&self) -> Vec<PanelLine> {
        match self.panel {
            Panel::Empty => vec![],
            Panel::PluginsInUse => vec![PanelLine::heading("Plugins In Use")],
            Panel::Mixer => vec![PanelLine::heading("Mixer")],
            // headed like every other panel, even before any track is added
            Panel::Playlist => std::iter::once(PanelLine::heading("Playlist"))
                .chain(self.tracks.iter().map(|track| PanelLine::plain(track)))
                .collect(),
            Panel::Browser => vec![PanelLine::heading("Browser")],
            Panel::ChannelRack => vec![PanelLine::heading("Channel Rack")],
            Panel::Recording => vec![PanelLine {
                alert: true,
                ..PanelLine::heading("Recording...")
            }],
            Panel::StoppedRecording => vec![PanelLine::heading("Stopped Recording")],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NotePlayer;

    struct Silent;

    impl NotePlayer for Silent {
        fn play_note(&self, _pitch: &str) {}
    }

    #[test]
    fn starts_empty() {
        let state = AppState::new();
        assert_eq!(state.panel, Panel::Empty);
        assert!(state.panel_lines().is_empty());
        assert!(state.piano_rolls.is_empty());
    }

    #[test]
    fn toolbar_switches_panels() {
        let mut state = AppState::new();
        for (label, action) in TOOLBAR {
            if let ToolbarAction::Show(panel) = action {
                state.show(panel);
                let lines = state.panel_lines();
                assert!(lines[0].heading, "{label}");
            }
        }
        assert_eq!(state.panel, Panel::StoppedRecording);
        assert_eq!(state.panel_lines()[0].text, "Stopped Recording");
    }

    #[test]
    fn recording_is_highlighted() {
        let mut state = AppState::new();
        state.show(Panel::Recording);
        assert_eq!(
            state.panel_lines(),
            vec![PanelLine { text: "Recording...".into(), heading: true, alert: true }]
        );
    }

    #[test]
    fn adding_tracks_shows_playlist() {
        let mut state = AppState::new();
        state.show(Panel::Mixer);
        state.add_track("/music/kick.wav".into());
        state.add_track("/music/loop.mp3".into());

        assert_eq!(state.panel, Panel::Playlist);
        let texts: Vec<_> = state.panel_lines().into_iter().map(|line| line.text).collect();
        assert_eq!(texts, vec!["Playlist", "/music/kick.wav", "/music/loop.mp3"]);
    }

    #[test]
    fn empty_playlist_still_has_heading() {
        let mut state = AppState::new();
        state.show(Panel::Playlist);
        assert_eq!(state.panel_lines(), vec![PanelLine::heading("Playlist")]);
    }

    #[test]
    fn each_piano_roll_is_independent() {
        let mut state = AppState::new();
        let first = state.open_piano_roll();
        let second = state.open_piano_roll();
        assert_ne!(first, second);

        state.piano_rolls[0].roll.draw_note(10.0, 10.0, &Silent);
        assert_eq!(state.piano_rolls[0].roll.notes().len(), 1);
        assert!(state.piano_rolls[1].roll.notes().is_empty());
    }

    #[test]
    fn closing_discards_sequence() {
        let mut state = AppState::new();
        state.open_piano_roll();
        state.piano_rolls[0].roll.draw_note(10.0, 10.0, &Silent);
        state.piano_rolls[0].open = false;
        state.discard_closed_piano_rolls();
        assert!(state.piano_rolls.is_empty());

        state.open_piano_roll();
        assert!(state.piano_rolls[0].roll.notes().is_empty());
    }
}
