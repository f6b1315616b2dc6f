use thiserror::Error;

use crate::frame::FramePhase;

/// Every failure in this crate is fatal: callers propagate it to `main`,
/// which logs it and exits. Nothing is retried.
#[derive(Error, Debug)]
pub enum Error {
    #[cfg(windows)]
    #[error(transparent)]
    Windows(#[from] windows::core::Error),

    #[error("failed to create the fence event: {0}")]
    EventCreation(String),

    #[error("no suitable adapter: {0}")]
    Device(String),

    #[error("shader compilation failed: {0}")]
    Shader(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// Usage errors, and the `--help` and `--version` output.
    #[error(transparent)]
    Cli(#[from] clap::Error),

    #[error("command recorder is closed")]
    RecorderClosed,

    #[error("command recorder is still recording")]
    RecorderNotClosed,

    #[error("command recorder is still in flight (submitted at {submitted}, completed {completed})")]
    RecorderInFlight { submitted: u64, completed: u64 },

    #[error("backbuffer index {index} is out of range for {count} images")]
    ImageIndexOutOfRange { index: usize, count: usize },

    #[error("no render target view for backbuffer {0}")]
    MissingRenderTargetView(usize),

    #[error("frame driver is {actual:?}, expected {expected:?}")]
    InvalidPhase {
        expected: FramePhase,
        actual: FramePhase,
    },

    #[error("GPU failure: {0}")]
    Gpu(String),

    #[error("the windowed renderer requires Windows; run with --headless")]
    UnsupportedPlatform,
}

pub type Result<T> = std::result::Result<T, Error>;
