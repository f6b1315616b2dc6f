use tracing::{info, warn};
use windows::core::Interface;
use windows::Win32::Graphics::{
    Direct3D::*,
    Direct3D12::*,
    Dxgi::{Common::*, *},
};

use super::util;
use crate::error::{Error, Result};

// tried in order, highest first
const FEATURE_LEVELS: [D3D_FEATURE_LEVEL; 4] = [
    D3D_FEATURE_LEVEL_12_1,
    D3D_FEATURE_LEVEL_12_0,
    D3D_FEATURE_LEVEL_11_1,
    D3D_FEATURE_LEVEL_11_0,
];

pub struct Device {
    // D3D12 Device: considered as a memory context that tracks allocations in GPU memory
    device: ID3D12Device,
    factory: IDXGIFactory6,
    feature_level: D3D_FEATURE_LEVEL,
}

impl Device {
    pub fn build(debug_layer_enabled: bool, gpu_validation_enabled: bool) -> Result<Self> {
        let factory = create_factory(debug_layer_enabled, gpu_validation_enabled)?;
        let (device, feature_level) = create_device(&factory)?;

        if debug_layer_enabled {
            if let Err(e) = register_message_callback(&device) {
                warn!("Failed to capture D3D12 debug messages: {e}");
            }
        }

        Ok(Self {
            device,
            factory,
            feature_level,
        })
    }

    pub fn get(&self) -> &ID3D12Device {
        &self.device
    }

    pub fn factory(&self) -> &IDXGIFactory6 {
        &self.factory
    }

    pub fn feature_level(&self) -> D3D_FEATURE_LEVEL {
        self.feature_level
    }

    pub fn create_descriptor_heap(
        &self,
        heap_type: D3D12_DESCRIPTOR_HEAP_TYPE,
        max_descriptor_count: u32,
        name: &str,
    ) -> Result<ID3D12DescriptorHeap> {
        let is_shader_visible = (heap_type == D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV)
            || (heap_type == D3D12_DESCRIPTOR_HEAP_TYPE_SAMPLER);

        let flags = if is_shader_visible {
            D3D12_DESCRIPTOR_HEAP_FLAG_SHADER_VISIBLE
        } else {
            D3D12_DESCRIPTOR_HEAP_FLAG_NONE
        };

        let desc = D3D12_DESCRIPTOR_HEAP_DESC {
            NumDescriptors: max_descriptor_count,
            Type: heap_type,
            Flags: flags,
            ..Default::default()
        };

        let heap: ID3D12DescriptorHeap = unsafe { self.device.CreateDescriptorHeap(&desc) }?;
        util::set_name(&heap, name)?;
        Ok(heap)
    }

    pub fn descriptor_increment(&self, heap_type: D3D12_DESCRIPTOR_HEAP_TYPE) -> u32 {
        unsafe { self.device.GetDescriptorHandleIncrementSize(heap_type) }
    }
}

pub fn report_live_objects() -> Result<()> {
    unsafe {
        let debug: IDXGIDebug1 = DXGIGetDebugInterface1(0)?;
        debug.ReportLiveObjects(
            DXGI_DEBUG_ALL,
            DXGI_DEBUG_RLO_DETAIL | DXGI_DEBUG_RLO_IGNORE_INTERNAL,
        )?;
    }
    Ok(())
}

fn create_factory(
    enable_debug_layer: bool,
    enable_gpu_based_validation: bool,
) -> Result<IDXGIFactory6> {
    let enable_debug_layer = enable_debug_layer || enable_gpu_based_validation;
    if enable_debug_layer {
        let mut debug: Option<ID3D12Debug1> = None;
        match unsafe { D3D12GetDebugInterface(&mut debug) } {
            Err(e) => warn!("Failed to enable debug layer: {e}"),
            Ok(()) => {
                if let Some(debug) = debug {
                    unsafe {
                        debug.EnableDebugLayer();
                        debug.SetEnableGPUBasedValidation(enable_gpu_based_validation);
                    }
                }
            }
        }
    }

    let flags = if enable_debug_layer {
        DXGI_CREATE_FACTORY_DEBUG
    } else {
        DXGI_CREATE_FACTORY_FLAGS(0)
    };

    Ok(unsafe { CreateDXGIFactory2(flags) }?)
}

/// Walks the adapters from the highest-performance one, skips software
/// adapters and creates the device at the first feature level that works.
fn create_device(factory: &IDXGIFactory6) -> Result<(ID3D12Device, D3D_FEATURE_LEVEL)> {
    let mut index = 0;

    while let Ok(adapter) = unsafe {
        factory.EnumAdapterByGpuPreference::<IDXGIAdapter1>(
            index,
            DXGI_GPU_PREFERENCE_HIGH_PERFORMANCE,
        )
    } {
        index += 1;

        let adapter_desc = unsafe { adapter.GetDesc1() }?;
        let adapter_flag = DXGI_ADAPTER_FLAG(adapter_desc.Flags as i32);
        if (adapter_flag & DXGI_ADAPTER_FLAG_SOFTWARE) != DXGI_ADAPTER_FLAG_NONE {
            // reject WARP
            continue;
        }

        for level in FEATURE_LEVELS {
            let mut device: Option<ID3D12Device> = None;
            if unsafe { D3D12CreateDevice(&adapter, level, &mut device) }.is_err() {
                continue;
            }
            let Some(device) = device else {
                continue;
            };

            let adapter_name = String::from_utf16_lossy(&adapter_desc.Description)
                .trim_end_matches('\0')
                .to_string();
            util::set_name(&device, &adapter_name)?;
            info!(adapter = %adapter_name, feature_level = level.0, "created device");

            return Ok((device, level));
        }
    }

    Err(Error::Device(
        "no hardware adapter supports feature level 11_0".into(),
    ))
}

fn register_message_callback(device: &ID3D12Device) -> Result<()> {
    let info_queue = device.cast::<ID3D12InfoQueue1>()?;
    let mut _callback_cookie = 0;
    unsafe {
        info_queue.SetBreakOnSeverity(D3D12_MESSAGE_SEVERITY_CORRUPTION, true)?;
        info_queue.SetBreakOnSeverity(D3D12_MESSAGE_SEVERITY_ERROR, true)?;

        let mut denied_severities = [D3D12_MESSAGE_SEVERITY_INFO];
        let deny_list = D3D12_INFO_QUEUE_FILTER_DESC {
            NumSeverities: denied_severities.len() as u32,
            pSeverityList: denied_severities.as_mut_ptr(),
            ..Default::default()
        };
        let filter = D3D12_INFO_QUEUE_FILTER {
            DenyList: deny_list,
            ..Default::default()
        };
        info_queue.PushStorageFilter(&filter)?;

        // https://github.com/microsoft/windows-rs/issues/3031
        info_queue.RegisterMessageCallback(
            Some(capture_message),
            D3D12_MESSAGE_CALLBACK_FLAG_NONE,
            std::ptr::null_mut(),
            &mut _callback_cookie,
        )?;
    }
    Ok(())
}

extern "system" fn capture_message(
    _category: D3D12_MESSAGE_CATEGORY,
    severity: D3D12_MESSAGE_SEVERITY,
    _id: D3D12_MESSAGE_ID,
    description: windows::core::PCSTR,
    _context: *mut core::ffi::c_void,
) {
    // DO NOT CALL D3D FUNCTIONS IN THIS FUNCTION
    let msg = match unsafe { description.to_string() } {
        Ok(msg) => msg,
        Err(e) => {
            tracing::error!("A message from D3D is corrupted: {e}");
            return;
        }
    };

    match severity {
        D3D12_MESSAGE_SEVERITY_CORRUPTION | D3D12_MESSAGE_SEVERITY_ERROR => {
            tracing::error!(target: "d3d12", "{msg}")
        }
        D3D12_MESSAGE_SEVERITY_WARNING => tracing::warn!(target: "d3d12", "{msg}"),
        _ => tracing::debug!(target: "d3d12", "{msg}"),
    }
}
