mod audio;
mod error;
mod piano_roll;
mod pitch;
mod scheduler;
mod state;
mod ui;

use std::time::Duration;
use clap::Parser;
use tracing::{info, Level};
use crate::{audio::AudioEngine, error::StudioError};

/// A toy music studio with a click-to-place piano roll.
#[derive(Debug, Parser)]
#[command(name = "p-studio", version)]
struct Args {
    /// Playback delay per grid slot, in milliseconds
    #[arg(long, default_value_t = 1000)]
    time_unit_ms: u64,

    /// Length of each played note, in milliseconds
    #[arg(long, default_value_t = 500)]
    note_duration_ms: u64,

    /// Amplitude of each sine voice
    #[arg(long, default_value_t = 0.5, value_parser = parse_volume)]
    volume: f32,

    /// Maximum log level (trace, debug, info, warn, error)
    #[arg(long, default_value_t = Level::INFO)]
    log_level: Level,
}

fn parse_volume(raw: &str) -> Result<f32, String> {
    let volume: f32 = raw.parse().map_err(|e| format!("{e}"))?;
    if volume.is_finite() {
        Ok(volume)
    } else {
        Err(format!("volume must be a finite number, got {raw}"))
    }
}

/// Runtime settings shared by the UI and the audio engine.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub time_unit: Duration,
    pub note_duration: Duration,
    pub volume: f32,
}

impl From<&Args> for Settings {
    fn from(args: &Args) -> Self {
        Self {
            time_unit: Duration::from_millis(args.time_unit_ms),
            note_duration: Duration::from_millis(args.note_duration_ms),
            volume: args.volume.clamp(0.0, 1.0),
        }
    }
}

fn main() -> Result<(), StudioError> {
    let args = Args::parse();
    tracing_subscriber::fmt().with_max_level(args.log_level).init();

    let settings = Settings::from(&args);
    info!("Starting P-Studio with {:?}", settings);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let engine = AudioEngine::start(runtime.handle(), &settings);

    let result = ui::run_ui(engine.handle(), settings);

    engine.shutdown(runtime.handle());
    result?;
    info!("P-Studio closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_timing() {
        let args = Args::parse_from(["p-studio"]);
        let settings = Settings::from(&args);
        assert_eq!(settings.time_unit, Duration::from_millis(1000));
        assert_eq!(settings.note_duration, Duration::from_millis(500));
        assert_eq!(settings.volume, 0.5);
        assert_eq!(args.log_level, Level::INFO);
    }

    #[test]
    fn overrides_are_parsed() {
        let args = Args::parse_from([
            "p-studio",
            "--time-unit-ms",
            "250",
            "--volume",
            "3.0",
            "--log-level",
            "debug",
        ]);
        let settings = Settings::from(&args);
        assert_eq!(settings.time_unit, Duration::from_millis(250));
        assert_eq!(settings.volume, 1.0);
        assert_eq!(args.log_level, Level::DEBUG);
    }

    #[test]
    fn non_finite_volume_is_rejected() {
        for raw in ["NaN", "inf", "-inf"] {
            assert!(Args::try_parse_from(["p-studio", "--volume", raw]).is_err(), "{raw}");
        }
        assert!(Args::try_parse_from(["p-studio", "--volume", "loud"]).is_err());
    }

    #[test]
    fn args_are_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
