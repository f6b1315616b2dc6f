use crate::error::Result;

use super::command::Command;
use super::surface::{DescriptorHeapLayout, RenderTargetView};

/// A GPU fence paired with the queue it is signaled on.
pub trait GpuFence {
    /// Enqueues a signal of `value`; the fence reaches it once the queue has
    /// drained everything submitted before.
    fn signal(&mut self, value: u64) -> Result<()>;

    fn completed_value(&self) -> u64;

    /// Blocks the calling thread until the fence reaches `value`.
    fn block_until(&self, value: u64) -> Result<()>;
}

/// The execution queue and the single allocator backing its command list.
pub trait CommandQueue {
    fn execute(&mut self, commands: &[Command]) -> Result<()>;

    /// Must not be called while submitted work is still executing.
    fn reset_allocator(&mut self) -> Result<()>;
}

/// A ring of backbuffer images bound to a window.
pub trait SwapChain {
    fn image_count(&self) -> usize;

    /// The image the next frame renders into, as reported by the swap chain.
    fn current_image_index(&self) -> usize;

    fn rtv_heap(&self) -> DescriptorHeapLayout;

    fn create_render_target_view(&mut self, image: usize, view: RenderTargetView) -> Result<()>;

    fn present(&mut self, sync_interval: u32) -> Result<()>;
}
