use std::ffi::CString;
use std::path;

use tracing::{info, warn};
use windows::core::{HSTRING, PCSTR};
use windows::Win32::Graphics::Direct3D::{Fxc::*, ID3DBlob};

use crate::error::{Error, Result};

pub struct ShaderConfig {
    pub path: path::PathBuf,
    pub entry_point: String,
    pub target: String,
}

/// Compiles HLSL with FXC, which ships with the OS.
pub struct ShaderCompiler {
    debug: bool,
}

impl ShaderCompiler {
    pub fn new(debug: bool) -> Self {
        Self { debug }
    }

    pub fn compile_file(&self, config: &ShaderConfig) -> Result<ID3DBlob> {
        info!(
            path = %config.path.display(),
            entry_point = %config.entry_point,
            "compiling shader"
        );

        let filename: HSTRING = config.path.as_os_str().into();
        let entry = CString::new(config.entry_point.as_str())
            .map_err(|e| Error::Shader(format!("bad entry point: {e}")))?;
        let target = CString::new(config.target.as_str())
            .map_err(|e| Error::Shader(format!("bad target: {e}")))?;

        let flags = if self.debug {
            D3DCOMPILE_DEBUG | D3DCOMPILE_SKIP_OPTIMIZATION
        } else {
            D3DCOMPILE_OPTIMIZATION_LEVEL3
        };

        let mut code = None;
        let mut errors = None;
        let result = unsafe {
            D3DCompileFromFile(
                &filename,
                None,
                None,
                PCSTR(entry.as_ptr() as *const u8),
                PCSTR(target.as_ptr() as *const u8),
                flags,
                0,
                &mut code,
                Some(&mut errors),
            )
        };

        let message = errors.as_ref().map(blob_to_string).unwrap_or_default();
        if let Err(e) = result {
            return Err(Error::Shader(format!(
                "Failed to compile {} {}: {e} {message}",
                config.path.display(),
                config.entry_point
            )));
        }
        if !message.is_empty() {
            warn!("{message}");
        }

        code.ok_or_else(|| {
            Error::Shader(format!(
                "no bytecode for {} {}",
                config.path.display(),
                config.entry_point
            ))
        })
    }
}

fn blob_to_string(blob: &ID3DBlob) -> String {
    let bytes = unsafe {
        std::slice::from_raw_parts(blob.GetBufferPointer() as *const u8, blob.GetBufferSize())
    };
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\0')
        .trim()
        .to_string()
}
