use bytemuck::Pod;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;

use super::device::Device;
use crate::error::{Error, Result};
use crate::resource::{GpuResourceDesc, IndexFormat, ResourceKind, TextureImage};

pub const TEXTURE_FORMAT: DXGI_FORMAT = DXGI_FORMAT_R8G8B8A8_UNORM;

pub fn heap_properties(heap_type: D3D12_HEAP_TYPE) -> D3D12_HEAP_PROPERTIES {
    D3D12_HEAP_PROPERTIES {
        Type: heap_type,
        CPUPageProperty: D3D12_CPU_PAGE_PROPERTY_UNKNOWN,
        MemoryPoolPreference: D3D12_MEMORY_POOL_UNKNOWN,
        CreationNodeMask: 1,
        VisibleNodeMask: 1,
    }
}

// CPU-writable texture memory, filled with WriteToSubresource
fn write_back_heap_properties() -> D3D12_HEAP_PROPERTIES {
    D3D12_HEAP_PROPERTIES {
        Type: D3D12_HEAP_TYPE_CUSTOM,
        CPUPageProperty: D3D12_CPU_PAGE_PROPERTY_WRITE_BACK,
        MemoryPoolPreference: D3D12_MEMORY_POOL_L0,
        CreationNodeMask: 0,
        VisibleNodeMask: 0,
    }
}

pub fn buffer_desc(buffer_size: u64) -> D3D12_RESOURCE_DESC {
    D3D12_RESOURCE_DESC {
        Dimension: D3D12_RESOURCE_DIMENSION_BUFFER,
        Alignment: 0,
        Width: buffer_size,
        Height: 1,
        DepthOrArraySize: 1,
        MipLevels: 1,
        Format: DXGI_FORMAT_UNKNOWN,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        Layout: D3D12_TEXTURE_LAYOUT_ROW_MAJOR,
        Flags: D3D12_RESOURCE_FLAG_NONE,
    }
}

pub fn texture2d_desc(width: u64, height: u32, mip_levels: u16) -> D3D12_RESOURCE_DESC {
    D3D12_RESOURCE_DESC {
        Dimension: D3D12_RESOURCE_DIMENSION_TEXTURE2D,
        Alignment: 0,
        Width: width,
        Height: height,
        DepthOrArraySize: 1,
        MipLevels: mip_levels,
        Format: TEXTURE_FORMAT,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        Layout: D3D12_TEXTURE_LAYOUT_UNKNOWN,
        Flags: D3D12_RESOURCE_FLAG_NONE,
    }
}

/// Allocates the committed resource `desc` describes. Buffers live on the
/// upload heap; textures on a CPU-writable custom heap.
pub fn create(device: &Device, desc: &GpuResourceDesc) -> Result<ID3D12Resource> {
    let (properties, resource_desc, state) = match desc.kind {
        ResourceKind::Constant | ResourceKind::Vertex { .. } | ResourceKind::Index { .. } => (
            heap_properties(D3D12_HEAP_TYPE_UPLOAD),
            buffer_desc(desc.size_in_bytes),
            D3D12_RESOURCE_STATE_GENERIC_READ,
        ),
        ResourceKind::Texture {
            width,
            height,
            mip_levels,
        } => (
            write_back_heap_properties(),
            texture2d_desc(width.into(), height, mip_levels),
            D3D12_RESOURCE_STATE_PIXEL_SHADER_RESOURCE,
        ),
    };

    let mut resource: Option<ID3D12Resource> = None;
    unsafe {
        device.get().CreateCommittedResource(
            &properties,
            D3D12_HEAP_FLAG_NONE,
            &resource_desc,
            state,
            None,
            &mut resource,
        )
    }?;
    let resource =
        resource.ok_or_else(|| Error::Gpu(format!("Failed to create {}", desc.name)))?;

    super::util::set_name(&resource, &desc.name)?;
    Ok(resource)
}

/// Copies `data` to the start of an upload-heap buffer.
pub fn upload<T: Pod>(resource: &ID3D12Resource, data: &[T]) -> Result<()> {
    let bytes: &[u8] = bytemuck::cast_slice(data);
    let mut mapped = std::ptr::null_mut();
    unsafe {
        resource.Map(0, None, Some(&mut mapped))?;
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), mapped as *mut u8, bytes.len());
        resource.Unmap(0, None);
    }
    Ok(())
}

pub fn write_texture(resource: &ID3D12Resource, image: &TextureImage) -> Result<()> {
    unsafe {
        resource.WriteToSubresource(
            0,
            None,
            image.bytes().as_ptr() as *const std::ffi::c_void,
            image.row_pitch(),
            image.slice_pitch(),
        )
    }?;
    Ok(())
}

pub fn vertex_buffer_view(resource: &ID3D12Resource, desc: &GpuResourceDesc) -> Result<D3D12_VERTEX_BUFFER_VIEW> {
    let ResourceKind::Vertex { stride } = desc.kind else {
        return Err(Error::Gpu(format!("{} is not a vertex buffer", desc.name)));
    };
    Ok(D3D12_VERTEX_BUFFER_VIEW {
        BufferLocation: unsafe { resource.GetGPUVirtualAddress() },
        SizeInBytes: desc.size_in_bytes as u32,
        StrideInBytes: stride,
    })
}

pub fn index_buffer_view(resource: &ID3D12Resource, desc: &GpuResourceDesc) -> Result<D3D12_INDEX_BUFFER_VIEW> {
    let ResourceKind::Index { format } = desc.kind else {
        return Err(Error::Gpu(format!("{} is not an index buffer", desc.name)));
    };
    let format = match format {
        IndexFormat::U16 => DXGI_FORMAT_R16_UINT,
        IndexFormat::U32 => DXGI_FORMAT_R32_UINT,
    };
    Ok(D3D12_INDEX_BUFFER_VIEW {
        BufferLocation: unsafe { resource.GetGPUVirtualAddress() },
        SizeInBytes: desc.size_in_bytes as u32,
        Format: format,
    })
}

/// An upload-heap constant buffer that stays mapped for its whole lifetime.
pub struct ConstantBuffer<T> {
    resource: ID3D12Resource,
    mapped: *mut T,
}

impl<T: Pod> ConstantBuffer<T> {
    /// Creates the buffer zero-filled and leaves it mapped.
    pub fn build(device: &Device, desc: &GpuResourceDesc) -> Result<Self> {
        if desc.kind != ResourceKind::Constant {
            return Err(Error::Gpu(format!("{} is not a constant buffer", desc.name)));
        }

        let resource = create(device, desc)?;
        let mut mapped = std::ptr::null_mut();
        // the CPU never reads it back
        let read_range = D3D12_RANGE { Begin: 0, End: 0 };
        unsafe { resource.Map(0, Some(&read_range), Some(&mut mapped)) }?;

        let buffer = Self {
            resource,
            mapped: mapped as *mut T,
        };
        buffer.write(&T::zeroed());
        Ok(buffer)
    }

    /// Only call while the GPU is not reading the buffer.
    pub fn write(&self, value: &T) {
        unsafe { std::ptr::write_unaligned(self.mapped, *value) };
    }

    pub fn gpu_address(&self) -> u64 {
        unsafe { self.resource.GetGPUVirtualAddress() }
    }
}

impl<T> Drop for ConstantBuffer<T> {
    fn drop(&mut self) {
        unsafe { self.resource.Unmap(0, None) };
    }
}
