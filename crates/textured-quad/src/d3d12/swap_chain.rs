use windows::core::Interface;
use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::{
    Direct3D12::*,
    Dxgi::{Common::*, *},
};

use super::{device::Device, util};
use crate::error::{Error, Result};
use crate::frame::{DescriptorHeapLayout, RenderTargetView, SwapChain as SwapChainImages};

pub const BACK_BUFFER_FORMAT: DXGI_FORMAT = DXGI_FORMAT_R8G8B8A8_UNORM;

// views are gamma-corrected; the buffers themselves cannot be SRGB with flip-model
pub const RENDER_TARGET_FORMAT: DXGI_FORMAT = DXGI_FORMAT_R8G8B8A8_UNORM_SRGB;

pub struct SwapChain {
    swap_chain: IDXGISwapChain4,
    device: ID3D12Device,
    back_buffers: Vec<ID3D12Resource>,

    rtv_heap: ID3D12DescriptorHeap,
    rtv_size: u32,
}

impl SwapChain {
    pub fn build(
        device: &Device,
        command_queue: &ID3D12CommandQueue,
        hwnd: HWND,
        width: u32,
        height: u32,
        count: usize,
    ) -> Result<Self> {
        let desc = DXGI_SWAP_CHAIN_DESC1 {
            Width: width,
            Height: height,
            Format: BACK_BUFFER_FORMAT,
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            Stereo: false.into(),
            BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
            BufferCount: count as u32,
            // behavior when resizing window
            Scaling: DXGI_SCALING_STRETCH,
            SwapEffect: DXGI_SWAP_EFFECT_FLIP_DISCARD,
            AlphaMode: DXGI_ALPHA_MODE_UNSPECIFIED,
            Flags: 0,
        };

        let factory = device.factory();
        let swap_chain =
            unsafe { factory.CreateSwapChainForHwnd(command_queue, hwnd, &desc, None, None) }?;

        // Disable Alt+Enter fullscreen toggle
        unsafe { factory.MakeWindowAssociation(hwnd, DXGI_MWA_NO_ALT_ENTER) }?;

        let swap_chain = swap_chain.cast::<IDXGISwapChain4>()?;

        let back_buffers = (0..count)
            .map(|i| -> Result<ID3D12Resource> {
                let buffer: ID3D12Resource = unsafe { swap_chain.GetBuffer(i as u32) }?;
                util::set_name(&buffer, &format!("back_buffer[{i}]"))?;
                Ok(buffer)
            })
            .collect::<Result<Vec<_>>>()?;

        let rtv_heap =
            device.create_descriptor_heap(D3D12_DESCRIPTOR_HEAP_TYPE_RTV, count as u32, "rtv_heap")?;
        let rtv_size = device.descriptor_increment(D3D12_DESCRIPTOR_HEAP_TYPE_RTV);

        Ok(Self {
            swap_chain,
            device: device.get().clone(),
            back_buffers,
            rtv_heap,
            rtv_size,
        })
    }

    pub fn back_buffers(&self) -> &[ID3D12Resource] {
        &self.back_buffers
    }
}

impl SwapChainImages for SwapChain {
    fn image_count(&self) -> usize {
        self.back_buffers.len()
    }

    fn current_image_index(&self) -> usize {
        unsafe { self.swap_chain.GetCurrentBackBufferIndex() as usize }
    }

    fn rtv_heap(&self) -> DescriptorHeapLayout {
        let start = unsafe { self.rtv_heap.GetCPUDescriptorHandleForHeapStart() };
        DescriptorHeapLayout {
            start: start.ptr,
            increment: self.rtv_size,
        }
    }

    fn create_render_target_view(&mut self, image: usize, view: RenderTargetView) -> Result<()> {
        let buffer = self.back_buffers.get(image).ok_or(Error::ImageIndexOutOfRange {
            index: image,
            count: self.back_buffers.len(),
        })?;

        let desc = D3D12_RENDER_TARGET_VIEW_DESC {
            Format: RENDER_TARGET_FORMAT,
            ViewDimension: D3D12_RTV_DIMENSION_TEXTURE2D,
            Anonymous: D3D12_RENDER_TARGET_VIEW_DESC_0 {
                Texture2D: D3D12_TEX2D_RTV {
                    MipSlice: 0,
                    PlaneSlice: 0,
                },
            },
        };
        let handle = D3D12_CPU_DESCRIPTOR_HANDLE { ptr: view.ptr };
        unsafe { self.device.CreateRenderTargetView(buffer, Some(&desc), handle) };
        Ok(())
    }

    fn present(&mut self, sync_interval: u32) -> Result<()> {
        unsafe { self.swap_chain.Present(sync_interval, DXGI_PRESENT(0)) }.ok()?;
        Ok(())
    }
}
