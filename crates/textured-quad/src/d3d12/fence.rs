use windows::Win32::{
    Foundation::{CloseHandle, HANDLE, WAIT_OBJECT_0},
    Graphics::Direct3D12::*,
    System::Threading::{CreateEventA, ResetEvent, WaitForSingleObject, INFINITE},
};

use super::util::set_name;
use crate::error::{Error, Result};
use crate::frame::GpuFence;

pub struct Fence {
    fence: ID3D12Fence,
    queue: ID3D12CommandQueue,

    // manual-reset: stays signaled until the wait has been observed
    event: HANDLE,
}

impl Fence {
    pub fn build(device: &ID3D12Device, queue: &ID3D12CommandQueue, name: &str) -> Result<Self> {
        let fence: ID3D12Fence = unsafe { device.CreateFence(0, D3D12_FENCE_FLAG_NONE) }?;
        set_name(&fence, name)?;

        let event = unsafe { CreateEventA(None, true, false, windows::core::PCSTR::null()) }
            .map_err(|e| Error::EventCreation(e.to_string()))?;

        Ok(Self {
            fence,
            queue: queue.clone(),
            event,
        })
    }
}

impl GpuFence for Fence {
    fn signal(&mut self, value: u64) -> Result<()> {
        unsafe { self.queue.Signal(&self.fence, value) }?;
        Ok(())
    }

    fn completed_value(&self) -> u64 {
        unsafe { self.fence.GetCompletedValue() }
    }

    fn block_until(&self, value: u64) -> Result<()> {
        unsafe {
            self.fence.SetEventOnCompletion(value, self.event)?;

            let result = WaitForSingleObject(self.event, INFINITE);
            ResetEvent(self.event)?;
            if result != WAIT_OBJECT_0 {
                return Err(Error::Gpu(format!(
                    "waiting for fence value {value} failed: {result:?}"
                )));
            }
        }
        Ok(())
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        if let Err(e) = unsafe { CloseHandle(self.event) } {
            tracing::error!("Failed to close the fence event: {e}");
        }
    }
}
