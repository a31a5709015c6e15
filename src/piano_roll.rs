//! Note capture and sequence playback for the piano roll.
//!
//! The grid is a fixed 800x400 canvas of 40x40 cells. Columns are time slots and
//! the first seven rows are the natural notes C to B.

use std::time::{Duration, Instant};
use tracing::{debug, info};
use crate::{audio::NotePlayer, pitch, scheduler::PlaybackQueue};

pub const CANVAS_WIDTH: f32 = 800.0;
pub const CANVAS_HEIGHT: f32 = 400.0;
pub const CELL_WIDTH: f32 = 40.0;
pub const CELL_HEIGHT: f32 = 40.0;

/// A note on the grid. Duration is always one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    pub time_slot: u32,
    pub duration: u32,
    pub pitch: &'static str,
}

impl Note {
    pub fn new(time_slot: u32, pitch: &'static str) -> Self {
        Self {
            time_slot,
            duration: 1,
            pitch,
        }
    }

    /// Row of this note on the grid.
    pub fn row(&self) -> Option<usize> {
        pitch::PITCH_NAMES.iter().position(|name| *name == self.pitch)
    }
}

/// Grid cell under a canvas position, if it maps to a slot and a pitch row.
pub fn locate(x: f32, y: f32) -> Option<(u32, usize)> {
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    let row = (y / CELL_HEIGHT).floor();
    if row < 0.0 || row >= pitch::PITCH_NAMES.len() as f32 {
        return None;
    }
    let slot = (x / CELL_WIDTH).floor();
    if slot < 0.0 {
        return None;
    }
    Some((slot as u32, row as usize))
}

/// Delay of a note relative to the previous note's slot.
/// A slot earlier than the previous one fires immediately.
pub fn slot_delay(previous_slot: u32, time_slot: u32, time_unit: Duration) -> Duration {
    time_unit * time_slot.saturating_sub(previous_slot)
}

/// One piano-roll sequence. Lives exactly as long as its window.
#[derive(Debug, Default)]
pub struct PianoRoll {
    notes: Vec<Note>,
}

impl PianoRoll {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notes in click order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Records a click at canvas position (x, y) and sounds the note.
    /// Clicks outside the pitch rows or left of the grid are ignored.
    pub fn draw_note(&mut self, x: f32, y: f32, player: &impl NotePlayer) -> Option<Note> {
        let (time_slot, row) = locate(x, y)?;
        let note = Note::new(time_slot, pitch::pitch_for_row(row)?);
        debug!("Note {} at slot {}", note.pitch, note.time_slot);

        self.notes.push(note);
        player.play_note(note.pitch);
        Some(note)
    }

    /// Schedules every note for playback, relative to `now`.
    ///
    /// Each delay is measured from the previous note's slot, not from the start
    /// of the sequence, and all delays start counting at `now`.
    pub fn play_recorded_notes(&self, queue: &mut PlaybackQueue, now: Instant, time_unit: Duration) {
        info!("Playing back {} notes", self.notes.len());
        let mut previous_slot = 0;
        for note in &self.notes {
            let delay = slot_delay(previous_slot, note.time_slot, time_unit);
            queue.schedule(now + delay, note.pitch);
            previous_slot = note.time_slot;
        }
    }
}
