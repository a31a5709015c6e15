use thiserror::Error;

/// Failures while opening the output device. The engine logs these and stays silent.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no output device found")]
    NoOutputDevice,
    #[error("failed to get default output config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),
    #[error("failed to build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),
    #[error("failed to play audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),
}

#[derive(Debug, Error)]
pub enum StudioError {
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("ui error: {0}")]
    Ui(#[from] eframe::Error),
}
