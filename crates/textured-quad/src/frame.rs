//! The per-frame CPU/GPU handshake, independent of any graphics API.
//!
//! A frame is recorded into a [`CommandRecorder`], submitted to a
//! [`CommandQueue`], presented through a [`PresentationSurface`] and then
//! fenced with a [`FenceCounter`]. The [`FrameDriver`] runs these steps in
//! order and never lets two frames overlap on the GPU.

pub mod backend;
pub mod command;
pub mod driver;
pub mod fence;
pub mod surface;
pub mod transition;

pub use backend::{CommandQueue, GpuFence, SwapChain};
pub use command::{
    BufferId, Command, CommandRecorder, PipelineId, RecorderState, ScissorRect, TextureId,
    Viewport,
};
pub use driver::{FrameDriver, FramePhase, FrameReport};
pub use fence::{FenceCounter, FenceValue};
pub use surface::{
    CurrentImage, DescriptorHeapLayout, PresentMode, PresentationSurface, RenderTargetView,
};
pub use transition::{transition, ResourceState};
