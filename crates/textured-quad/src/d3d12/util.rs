use windows::{core::HSTRING, Win32::Graphics::Direct3D12::ID3D12Object};

use crate::error::Result;

/// Labels a D3D12 object for debug-layer messages and graphics debuggers.
pub fn set_name(object: &ID3D12Object, name: &str) -> Result<()> {
    // https://github.com/microsoft/windows-rs/issues/973
    let name: HSTRING = name.into();
    unsafe { object.SetName(&name) }?;
    Ok(())
}
