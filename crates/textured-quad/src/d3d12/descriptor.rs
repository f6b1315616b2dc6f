use windows::Win32::Graphics::Direct3D12::*;

use super::{device::Device, resource::TEXTURE_FORMAT};
use crate::error::{Error, Result};

// D3D12_DEFAULT_SHADER_4_COMPONENT_MAPPING: R, G, B, A in order
const DEFAULT_SHADER_4_COMPONENT_MAPPING: u32 = 0x1688;

/// A shader-visible CBV/SRV/UAV heap filled front to back.
pub struct ShaderResourceHeap {
    heap: ID3D12DescriptorHeap,
    increment: u32,
    capacity: u32,
    len: u32,
}

impl ShaderResourceHeap {
    pub fn build(device: &Device, capacity: u32, name: &str) -> Result<Self> {
        let heap =
            device.create_descriptor_heap(D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV, capacity, name)?;
        let increment = device.descriptor_increment(D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV);

        Ok(Self {
            heap,
            increment,
            capacity,
            len: 0,
        })
    }

    pub fn get(&self) -> &ID3D12DescriptorHeap {
        &self.heap
    }

    /// Writes a 2D texture SRV into the next free slot and returns its GPU handle.
    pub fn create_texture_view(
        &mut self,
        device: &Device,
        texture: &ID3D12Resource,
        mip_levels: u32,
    ) -> Result<D3D12_GPU_DESCRIPTOR_HANDLE> {
        if self.len == self.capacity {
            return Err(Error::Gpu(format!(
                "the SRV heap is full ({} descriptors)",
                self.capacity
            )));
        }

        let desc = D3D12_SHADER_RESOURCE_VIEW_DESC {
            Format: TEXTURE_FORMAT,
            ViewDimension: D3D12_SRV_DIMENSION_TEXTURE2D,
            Shader4ComponentMapping: DEFAULT_SHADER_4_COMPONENT_MAPPING,
            Anonymous: D3D12_SHADER_RESOURCE_VIEW_DESC_0 {
                Texture2D: D3D12_TEX2D_SRV {
                    MostDetailedMip: 0,
                    MipLevels: mip_levels,
                    PlaneSlice: 0,
                    ResourceMinLODClamp: 0.0,
                },
            },
        };

        let offset = (self.len * self.increment) as usize;
        let mut cpu = unsafe { self.heap.GetCPUDescriptorHandleForHeapStart() };
        cpu.ptr += offset;
        let mut gpu = unsafe { self.heap.GetGPUDescriptorHandleForHeapStart() };
        gpu.ptr += offset as u64;

        unsafe { device.get().CreateShaderResourceView(texture, Some(&desc), cpu) };
        self.len += 1;
        Ok(gpu)
    }
}
