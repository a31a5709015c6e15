use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    Sample, Stream, StreamConfig,
};
use tokio::{runtime::Handle, sync::oneshot, task::JoinHandle};
use tracing::{debug, error, info, warn};
use crate::{error::AudioError, pitch, Settings};

const WAVEFORM_LEN: usize = 1024;

/// Anything that can sound a pitch symbol without blocking.
pub trait NotePlayer {
    fn play_note(&self, pitch: &str);
}

/// A single sine tone in flight.
#[derive(Debug)]
pub struct Voice {
    frequency: f32,
    phase: f32,
    /// frames rendered so far
    frames: u64,
    duration: Duration,
}

impl Voice {
    pub fn new(frequency: f32, duration: Duration) -> Self {
        Self {
            frequency,
            phase: 0.0,
            frames: 0,
            duration,
        }
    }

    pub fn is_finished(&self, sample_rate: f32) -> bool {
        let duration_frames = (self.duration.as_secs_f64() * sample_rate as f64) as u64;
        self.frames >= duration_frames
    }

    /// Advances by one frame and returns the sample for it.
    fn next_sample(&mut self, sample_rate: f32) -> f32 {
        let sample = (2.0 * std::f32::consts::PI * self.phase).sin();
        self.phase = (self.phase + self.frequency / sample_rate) % 1.0;
        self.frames += 1;
        sample
    }
}

/// State shared between the UI thread and the output stream callback.
#[derive(Debug)]
struct EngineState {
    voices: Mutex<Vec<Voice>>,
    /// The last rendered buffer, for the mixer scope.
    waveform_buffer: Mutex<Vec<f32>>,
    note_duration: Duration,
    volume: f32,
}

/// Cheap, cloneable access to the running engine.
#[derive(Debug, Clone)]
pub struct AudioHandle {
    state: Arc<EngineState>,
}

impl AudioHandle {
    fn new(settings: &Settings) -> Self {
        Self {
            state: Arc::new(EngineState {
                voices: Mutex::new(Vec::new()),
                waveform_buffer: Mutex::new(vec![0.0; WAVEFORM_LEN]),
                note_duration: settings.note_duration,
                volume: settings.volume,
            }),
        }
    }

    #[cfg(test)]
    fn active_voices(&self) -> usize {
        self.state.voices.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn waveform(&self) -> Vec<f32> {
        self.state
            .waveform_buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fills an interleaved output buffer from the active voices.
    fn render(&self, data: &mut [f32], channels: usize, sample_rate: f32) {
        let mut voices = self.state.voices.lock().unwrap_or_else(PoisonError::into_inner);
        let mut waveform_buffer = self
            .state
            .waveform_buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        waveform_buffer.fill(0.0);

        for (index, frame) in data.chunks_mut(channels.max(1)).enumerate() {
            let mut sample_value: f32 = 0.0;
            for voice in voices.iter_mut().filter(|voice| !voice.is_finished(sample_rate)) {
                sample_value += voice.next_sample(sample_rate) * self.state.volume;
            }
            sample_value = sample_value.clamp(-1.0, 1.0);

            for sample in frame.iter_mut() {
                *sample = Sample::from_sample(sample_value);
            }
            if let Some(slot) = waveform_buffer.get_mut(index) {
                *slot = sample_value;
            }
        }

        voices.retain(|voice| !voice.is_finished(sample_rate));
    }
}

impl NotePlayer for AudioHandle {
    fn play_note(&self, pitch: &str) {
        let Some(frequency) = pitch::frequency_of(pitch) else {
            debug!("Ignoring unknown pitch {:?}", pitch);
            return;
        };
        debug!("Playing {} ({} Hz)", pitch, frequency);
        self.state
            .voices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Voice::new(frequency, self.state.note_duration));
    }
}

/// Owns the output stream task. Created once in `main` and shut down on exit.
pub struct AudioEngine {
    handle: AudioHandle,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl AudioEngine {
    /// Spawns the output stream task on the given runtime.
    pub fn start(runtime: &Handle, settings: &Settings) -> Self {
        let handle = AudioHandle::new(settings);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = runtime.spawn(run_audio_output(handle.clone(), shutdown_rx));
        Self {
            handle,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    pub fn handle(&self) -> AudioHandle {
        self.handle.clone()
    }

    /// Stops the stream and waits for its task to finish.
    pub fn shutdown(mut self, runtime: &Handle) {
        if let Some(shutdown) = self.shutdown.take() {
            // the task may already be gone if the device never opened
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = runtime.block_on(task) {
                error!("Audio task ended abnormally: {}", e);
            }
        }
        info!("Audio engine shut down");
    }
}

/// Runs the output stream until a shutdown signal arrives.
async fn run_audio_output(handle: AudioHandle, shutdown: oneshot::Receiver<()>) {
    let result = tokio::task::spawn_blocking(move || {
        let stream = match open_output_stream(handle) {
            Ok(stream) => stream,
            Err(e) => {
                error!("{}", e);
                warn!("Continuing without audio output");
                return;
            }
        };

        // Keep the stream alive until the application closes
        let _ = shutdown.blocking_recv();
        drop(stream);
        info!("Audio stream stopped");
    })
    .await;

    if let Err(e) = result {
        error!("Audio task panicked: {}", e);
    }
}

fn open_output_stream(handle: AudioHandle) -> Result<Stream, AudioError> {
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or(AudioError::NoOutputDevice)?;
    info!(
        "Default output device found: {}",
        device.name().unwrap_or_else(|_| "Unknown".to_string())
    );

    let supported_config = device.default_output_config()?;
    let config = StreamConfig {
        channels: supported_config.channels(),
        sample_rate: supported_config.sample_rate(),
        buffer_size: cpal::BufferSize::Default,
    };
    info!("Audio stream configuration: {:?}", config);

    let channels = config.channels as usize;
    let sample_rate = config.sample_rate.0 as f32;
    let stream = device.build_output_stream(
        &config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            handle.render(data, channels, sample_rate);
        },
        |err| {
            error!("An error occurred on the audio stream: {}", err);
        },
        None,
    )?;

    info!("Starting audio stream...");
    stream.play()?;
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> Settings {
        Settings {
            time_unit: Duration::from_millis(1000),
            note_duration: Duration::from_millis(500),
            volume: 0.5,
        }
    }

    #[test]
    fn play_note_adds_voice() {
        let handle = AudioHandle::new(&settings());
        handle.play_note("A");
        handle.play_note("C2");
        assert_eq!(handle.active_voices(), 2);
    }

    #[test]
    fn unknown_pitch_is_ignored() {
        let handle = AudioHandle::new(&settings());
        handle.play_note("X#");
        assert_eq!(handle.active_voices(), 0);
    }

    #[test]
    fn voice_finishes_after_duration() {
        let sample_rate = 1000.0;
        let mut voice = Voice::new(440.0, Duration::from_millis(500));
        for _ in 0..499 {
            voice.next_sample(sample_rate);
        }
        assert!(!voice.is_finished(sample_rate));
        voice.next_sample(sample_rate);
        assert!(voice.is_finished(sample_rate));
    }

    #[test]
    fn long_voice_still_finishes() {
        let sample_rate = 48_000.0;
        let mut voice = Voice::new(440.0, Duration::from_secs(520));
        let duration_frames = 520 * 48_000;
        for _ in 0..duration_frames - 1 {
            voice.next_sample(sample_rate);
        }
        assert!(!voice.is_finished(sample_rate));
        voice.next_sample(sample_rate);
        assert!(voice.is_finished(sample_rate));
    }

    #[test]
    fn render_drops_finished_voices() {
        let handle = AudioHandle::new(&settings());
        handle.play_note("A");
        let mut data = vec![0.0; 2 * 300];
        // 600 frames at 1 kHz is longer than the 500 ms note
        handle.render(&mut data, 1, 1000.0);
        assert_eq!(handle.active_voices(), 0);
    }

    #[test]
    fn render_clamps_and_fills_every_channel() {
        let handle = AudioHandle::new(&Settings { volume: 1.0, ..settings() });
        for _ in 0..8 {
            handle.play_note("C");
        }
        let mut data = vec![0.0; 2 * 64];
        handle.render(&mut data, 2, 44100.0);

        assert!(data.iter().all(|s| (-1.0..=1.0).contains(s)));
        assert!(data.chunks(2).all(|frame| frame[0] == frame[1]));
        assert!(data.iter().any(|s| *s != 0.0));
        assert_eq!(handle.waveform()[5], data[10]);
    }

    #[test]
    fn silence_without_voices() {
        let handle = AudioHandle::new(&settings());
        let mut data = vec![1.0; 32];
        handle.render(&mut data, 2, 44100.0);
        assert!(data.iter().all(|s| *s == 0.0));
    }
}
