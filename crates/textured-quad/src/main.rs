use std::process::ExitCode;

use textured_quad::*;

fn main() -> ExitCode {
    let config = match parse_args(std::env::args()) {
        Ok(config) => config,
        Err(Error::Cli(e)) => {
            // help and version go to stdout with a zero exit code
            if let Err(print_error) = e.print() {
                eprintln!("{print_error}");
            }
            return ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1));
        }
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(config.log_filter());

    // change cwd so opening HLSL files will not fail
    let dir = std::env::current_exe()
        .inspect_err(|e| tracing::warn!("Failed to get the path of this program: {e}"))
        .ok()
        .and_then(|path| path.parent().map(|p| p.to_path_buf()));
    if let Some(dir) = dir {
        if let Err(e) = std::env::set_current_dir(dir) {
            tracing::warn!("Failed to change the current working directory: {e}");
        }
    }

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<()> {
    if config.headless() {
        return headless::run(config);
    }
    run_windowed(config)
}

#[cfg(windows)]
fn run_windowed(config: &Config) -> Result<()> {
    framework::run(config)?;
    if config.debug_layer_enabled() {
        d3d12::device::report_live_objects()?;
    }
    Ok(())
}

#[cfg(not(windows))]
fn run_windowed(_config: &Config) -> Result<()> {
    Err(Error::UnsupportedPlatform)
}
