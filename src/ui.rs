use std::time::{Duration, Instant};
use eframe::{App, CreationContext};
use egui::{
    Align2, CentralPanel, Color32, Context, FontId, Frame, Margin, Painter, Pos2, Rect, RichText,
    Rounding, Sense, Stroke, TopBottomPanel, Vec2,
};
use egui_plot::{Line, Plot, PlotBounds, PlotPoints};
use tracing::{debug, info};
use crate::{
    audio::{AudioHandle, NotePlayer},
    piano_roll::{self, PianoRoll},
    pitch,
    scheduler::PlaybackQueue,
    state::{AppState, Panel, PanelLine, ToolbarAction, TOOLBAR},
    Settings,
};

const WINDOW_BG: Color32 = Color32::from_rgb(0x17, 0x20, 0x2a);
const PANEL_BG: Color32 = Color32::from_rgb(0x14, 0x1d, 0x25);
const CANVAS_BG: Color32 = Color32::from_rgb(0xd3, 0xd3, 0xd3);
const NOTE_FILL: Color32 = Color32::BLUE;
const PLAY_BUTTON: Color32 = Color32::from_rgb(0x00, 0x80, 0x00);

const KEY_WIDTH: f32 = 20.0;
const KEY_HEIGHT: f32 = 40.0;
const BLACK_KEYS: [&str; 5] = ["C#", "D#", "F#", "G#", "A#"];

/// The main P-Studio window.
pub struct StudioApp {
    state: AppState,
    queue: PlaybackQueue,
    audio: AudioHandle,
    settings: Settings,
}

impl StudioApp {
    pub fn new(cc: &CreationContext<'_>, audio: AudioHandle, settings: Settings) -> Self {
        cc.egui_ctx.style_mut(|style| {
            style.visuals.panel_fill = WINDOW_BG;
            style.interaction.selectable_labels = false;
        });
        Self {
            state: AppState::new(),
            queue: PlaybackQueue::new(),
            audio,
            settings,
        }
    }

    /// Fires every deferred note that is due and wakes up for the next one.
    fn pump_playback(&mut self, ctx: &Context) {
        let now = Instant::now();
        if let Some(wait) = fire_due_notes(&mut self.queue, &self.audio, now) {
            ctx.request_repaint_after(wait);
        }
    }

    fn toolbar(&mut self, ctx: &Context) {
        TopBottomPanel::top("toolbar")
            .exact_height(50.0)
            .frame(Frame::none().fill(WINDOW_BG).inner_margin(Margin::same(8.0)))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    for (label, action) in TOOLBAR {
                        let button = egui::Button::new(
                            RichText::new(label).size(12.0).color(Color32::WHITE),
                        )
                        .fill(Color32::BLACK);
                        if ui.add(button).clicked() {
                            self.apply(action);
                        }
                        ui.add_space(5.0);
                    }
                });
            });
    }

    fn apply(&mut self, action: ToolbarAction) {
        match action {
            ToolbarAction::OpenPianoRoll => {
                let id = self.state.open_piano_roll();
                info!("Opened piano roll {}", id);
            }
            ToolbarAction::Show(panel) => self.state.show(panel),
            ToolbarAction::AddTrack => {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Audio Files", &["mp3", "wav"])
                    .pick_file()
                {
                    info!("Added track {}", path.display());
                    self.state.add_track(path.display().to_string());
                } else {
                    debug!("Add track cancelled");
                }
            }
        }
    }

    fn panel(&self, ctx: &Context) {
        CentralPanel::default()
            .frame(Frame::none().fill(WINDOW_BG).inner_margin(Margin::same(10.0)))
            .show(ctx, |ui| {
                Frame::none()
                    .fill(PANEL_BG)
                    .inner_margin(Margin::same(10.0))
                    .show(ui, |ui| {
                        ui.set_min_size(ui.available_size());
                        ui.vertical_centered(|ui| {
                            for line in self.state.panel_lines() {
                                ui.label(panel_text(&line));
                            }
                            if self.state.panel == Panel::Mixer {
                                self.output_scope(ui);
                                ctx.request_repaint();
                            }
                        });
                    });
            });
    }

    /// Master output waveform, from the engine's last rendered buffer.
    fn output_scope(&self, ui: &mut egui::Ui) {
        let buffer = self.audio.waveform();
        let points: Vec<_> = buffer
            .iter()
            .enumerate()
            .map(|(i, &v)| [i as f64, v as f64])
            .collect();
        let len = buffer.len() as f64;

        Plot::new("output_scope")
            .view_aspect(4.0)
            .show_axes([false, true])
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                plot_ui.set_plot_bounds(PlotBounds::from_min_max([0.0, -1.1], [len, 1.1]));
                plot_ui.line(Line::new(PlotPoints::from(points)));
            });
    }

    fn piano_rolls(&mut self, ctx: &Context) {
        let time_unit = self.settings.time_unit;
        for window in &mut self.state.piano_rolls {
            let roll = &mut window.roll;
            let queue = &mut self.queue;
            let audio = &self.audio;
            egui::Window::new("Piano Roll")
                .id(egui::Id::new(("piano_roll", window.id)))
                .open(&mut window.open)
                .resizable(false)
                .collapsible(false)
                .frame(Frame::window(&ctx.style()).fill(PANEL_BG))
                .show(ctx, |ui| {
                    piano_roll_canvas(ui, roll, audio);
                    ui.add_space(10.0);
                    ui.vertical_centered(|ui| {
                        let play = egui::Button::new(
                            RichText::new("Play Notes").size(12.0).color(Color32::WHITE),
                        )
                        .fill(PLAY_BUTTON);
                        if ui.add(play).clicked() {
                            roll.play_recorded_notes(queue, Instant::now(), time_unit);
                        }
                    });
                });
        }
        self.state.discard_closed_piano_rolls();
    }
}

impl App for StudioApp {
    fn update(&mut self, ctx: &Context, _: &mut eframe::Frame) {
        self.toolbar(ctx);
        self.panel(ctx);
        self.piano_rolls(ctx);
        self.pump_playback(ctx);
    }
}

/// Plays every queued note due at `now`. Returns how long until the next one.
fn fire_due_notes(queue: &mut PlaybackQueue, player: &impl NotePlayer, now: Instant) -> Option<Duration> {
    for pitch in queue.pop_due(now) {
        player.play_note(pitch);
    }
    queue
        .next_due()
        .map(|next| next.saturating_duration_since(now))
}

fn panel_text(line: &PanelLine) -> RichText {
    let color = if line.alert { Color32::RED } else { Color32::WHITE };
    let text = RichText::new(&line.text).color(color);
    if line.heading {
        text.size(16.0)
    } else {
        text
    }
}

/// Draws the grid and records clicks on it.
fn piano_roll_canvas(ui: &mut egui::Ui, roll: &mut PianoRoll, player: &impl NotePlayer) {
    let size = Vec2::new(piano_roll::CANVAS_WIDTH, piano_roll::CANVAS_HEIGHT);
    let (response, painter) = ui.allocate_painter(size, Sense::click());
    let origin = response.rect.min;

    if response.clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            let local = pos - origin;
            roll.draw_note(local.x, local.y, player);
        }
    }

    painter.rect_filled(response.rect, Rounding::ZERO, CANVAS_BG);
    draw_keys(&painter, origin);
    draw_time_grid(&painter, origin);

    let outline = Stroke::new(1.0, Color32::BLACK);
    for note in roll.notes() {
        let Some(row) = note.row() else { continue };
        let min = origin
            + Vec2::new(
                note.time_slot as f32 * piano_roll::CELL_WIDTH,
                row as f32 * piano_roll::CELL_HEIGHT,
            );
        let cell = Rect::from_min_size(
            min,
            Vec2::new(note.duration as f32 * piano_roll::CELL_WIDTH, piano_roll::CELL_HEIGHT),
        );
        painter.rect(cell, Rounding::ZERO, NOTE_FILL, outline);
    }
}

fn draw_keys(painter: &Painter, origin: Pos2) {
    let outline = Stroke::new(1.0, Color32::BLACK);
    let font = FontId::proportional(10.0);

    for (i, key) in pitch::PITCH_NAMES.iter().enumerate() {
        let x1 = i as f32 * KEY_WIDTH * 2.0;
        let rect = Rect::from_min_max(
            origin + Vec2::new(x1, 0.0),
            origin + Vec2::new(x1 + KEY_WIDTH * 2.0, KEY_HEIGHT),
        );
        painter.rect(rect, Rounding::ZERO, Color32::WHITE, outline);
        painter.text(
            Pos2::new(rect.center().x, rect.max.y + 5.0),
            Align2::CENTER_CENTER,
            *key,
            font.clone(),
            Color32::BLACK,
        );
    }

    for (i, key) in BLACK_KEYS.iter().enumerate() {
        let x1 = i as f32 * KEY_WIDTH * 2.0 + KEY_WIDTH;
        let rect = Rect::from_min_max(
            origin + Vec2::new(x1, 0.0),
            origin + Vec2::new(x1 + KEY_WIDTH, KEY_HEIGHT / 2.0),
        );
        painter.rect(rect, Rounding::ZERO, Color32::BLACK, outline);
        painter.text(
            Pos2::new(rect.center().x, rect.max.y + 5.0),
            Align2::CENTER_CENTER,
            *key,
            font.clone(),
            Color32::WHITE,
        );
    }
}

fn draw_time_grid(painter: &Painter, origin: Pos2) {
    let stroke = Stroke::new(1.0, Color32::BLACK);
    for i in 1..20 {
        let x = i as f32 * piano_roll::CELL_WIDTH;
        painter.line_segment(
            [origin + Vec2::new(x, 0.0), origin + Vec2::new(x, piano_roll::CANVAS_HEIGHT)],
            stroke,
        );
    }
}

/// Opens the main window and runs the event loop until it closes.
pub fn run_ui(audio: AudioHandle, settings: Settings) -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1360.0, 680.0]),
        ..Default::default()
    };
    eframe::run_native(
        "P-Studio",
        options,
        Box::new(move |cc: &CreationContext| Ok(Box::new(StudioApp::new(cc, audio, settings)))),
    )
}
