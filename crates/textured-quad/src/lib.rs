#[cfg(windows)]
pub mod d3d12;
#[cfg(windows)]
pub mod framework;
#[cfg(windows)]
pub mod renderer;

pub mod blend;
pub mod error;
pub mod frame;
pub mod headless;
pub mod input;
pub mod logging;
pub mod math;
pub mod resource;
pub mod scene;

use clap::Parser;

pub use blend::BlendMode;
pub use error::{Error, Result};
use frame::PresentMode;

pub const CLEAR_COLOR: [f32; 4] = [0.1, 0.25, 0.5, 0.0];

const MIN_BUFFERS: usize = 2;
const MAX_BUFFERS: usize = 16;

/// Frames rendered by `--headless` when `--frames` is not given.
pub const DEFAULT_HEADLESS_FRAMES: u64 = 3;

/// Draws a textured quad; hold A or D to orbit the camera.
#[derive(Parser, Debug)]
#[command(name = "textured-quad", version)]
struct Args {
    /// Client area width in pixels
    #[arg(long, default_value_t = 1280)]
    width: u32,

    /// Client area height in pixels
    #[arg(long, default_value_t = 720)]
    height: u32,

    /// Number of swap chain backbuffers
    #[arg(long, default_value_t = 2)]
    buffers: usize,

    /// Present without waiting for vertical blank
    #[arg(long)]
    immediate: bool,

    /// Enable the D3D12 debug layer
    #[arg(long)]
    debug_layer: bool,

    /// Enable GPU-based validation (implies --debug-layer)
    #[arg(long)]
    gpu_validation: bool,

    /// Run the frame loop against the software backend, without a window
    #[arg(long)]
    headless: bool,

    /// Stop after this many frames (headless runs default to 3)
    #[arg(long)]
    frames: Option<u64>,

    #[arg(long, value_enum, default_value_t = BlendMode::Alpha)]
    blend: BlendMode,

    /// Log filter, e.g. "debug" or "textured_quad=trace"
    #[arg(long)]
    log: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    client_width: u32,
    client_height: u32,
    buffer_count: usize,
    present_mode: PresentMode,

    debug_layer_enabled: bool,
    gpu_validation_enabled: bool,

    headless: bool,
    frame_limit: Option<u64>,
    blend_mode: BlendMode,
    log_filter: Option<String>,
}

impl Config {
    pub fn client_width(&self) -> u32 {
        self.client_width
    }

    pub fn client_height(&self) -> u32 {
        self.client_height
    }

    pub fn buffer_count(&self) -> usize {
        self.buffer_count
    }

    pub fn present_mode(&self) -> PresentMode {
        self.present_mode
    }

    pub fn debug_layer_enabled(&self) -> bool {
        self.debug_layer_enabled || self.gpu_validation_enabled
    }

    pub fn gpu_validation_enabled(&self) -> bool {
        self.gpu_validation_enabled
    }

    pub fn headless(&self) -> bool {
        self.headless
    }

    pub fn frame_limit(&self) -> Option<u64> {
        self.frame_limit
    }

    pub fn blend_mode(&self) -> BlendMode {
        self.blend_mode
    }

    pub fn log_filter(&self) -> Option<&str> {
        self.log_filter.as_deref()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            client_width: 1280,
            client_height: 720,
            buffer_count: MIN_BUFFERS,
            present_mode: PresentMode::Vsync,
            debug_layer_enabled: false,
            gpu_validation_enabled: false,
            headless: false,
            frame_limit: None,
            blend_mode: BlendMode::Alpha,
            log_filter: None,
        }
    }
}

/// `--help` and `--version` come back as [`Error::Cli`]; the caller prints
/// them and picks the exit code.
pub fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Config> {
    let args = Args::try_parse_from(args)?;

    if args.width == 0 || args.height == 0 {
        return Err(Error::Config(format!(
            "the client area must not be empty: {}x{}",
            args.width, args.height
        )));
    }
    if !(MIN_BUFFERS..=MAX_BUFFERS).contains(&args.buffers) {
        return Err(Error::Config(format!(
            "--buffers must be between {MIN_BUFFERS} and {MAX_BUFFERS}, got {}",
            args.buffers
        )));
    }

    let frame_limit = match args.frames {
        Some(0) => return Err(Error::Config("--frames must be at least 1".into())),
        Some(n) => Some(n),
        None if args.headless => Some(DEFAULT_HEADLESS_FRAMES),
        None => None,
    };

    Ok(Config {
        client_width: args.width,
        client_height: args.height,
        buffer_count: args.buffers,
        present_mode: if args.immediate {
            PresentMode::Immediate
        } else {
            PresentMode::Vsync
        },
        debug_layer_enabled: args.debug_layer,
        gpu_validation_enabled: args.gpu_validation,
        headless: args.headless,
        frame_limit,
        blend_mode: args.blend,
        log_filter: args.log,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config> {
        parse_args(
            std::iter::once("textured-quad")
                .chain(args.iter().copied())
                .map(String::from),
        )
    }

    #[test]
    fn defaults_match_the_window_demo() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.client_width(), 1280);
        assert_eq!(config.client_height(), 720);
        assert_eq!(config.buffer_count(), 2);
        assert_eq!(config.present_mode(), PresentMode::Vsync);
        assert_eq!(config.blend_mode(), BlendMode::Alpha);
        assert!(!config.debug_layer_enabled());
        assert_eq!(config.frame_limit(), None);
    }

    #[test]
    fn gpu_validation_implies_debug_layer() {
        let config = parse(&["--gpu-validation"]).unwrap();
        assert!(config.debug_layer_enabled());
        assert!(config.gpu_validation_enabled());
    }

    #[test]
    fn headless_runs_are_bounded() {
        let config = parse(&["--headless"]).unwrap();
        assert_eq!(config.frame_limit(), Some(DEFAULT_HEADLESS_FRAMES));

        let config = parse(&["--headless", "--frames", "10", "--immediate"]).unwrap();
        assert_eq!(config.frame_limit(), Some(10));
        assert_eq!(config.present_mode(), PresentMode::Immediate);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(parse(&["--buffers", "1"]), Err(Error::Config(_))));
        assert!(matches!(parse(&["--width", "0"]), Err(Error::Config(_))));
        assert!(matches!(parse(&["--frames", "0"]), Err(Error::Config(_))));
        assert!(matches!(parse(&["--blend", "multiply"]), Err(Error::Cli(_))));
    }

    #[test]
    fn help_is_returned_to_the_caller() {
        let Err(Error::Cli(e)) = parse(&["--help"]) else {
            panic!("--help did not produce a clap error");
        };
        assert_eq!(e.kind(), clap::error::ErrorKind::DisplayHelp);
        assert_eq!(e.exit_code(), 0);

        let Err(Error::Cli(e)) = parse(&["--version"]) else {
            panic!("--version did not produce a clap error");
        };
        assert_eq!(e.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn blend_mode_is_selectable() {
        let config = parse(&["--blend", "color-flip"]).unwrap();
        assert_eq!(config.blend_mode(), BlendMode::ColorFlip);
    }
}
