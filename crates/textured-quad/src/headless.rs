//! A software stand-in for the GPU.
//!
//! Nothing is rasterized: the queue counts what it is asked to execute, the
//! swap chain rotates through its images on present, and the fence completes
//! either as soon as it is signaled or when [`HeadlessGpu::complete_through`]
//! is called from another thread. A GPU built with [`HeadlessGpu::recording`]
//! also keeps every event and submission for inspection.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::{info, trace};

use crate::error::{Error, Result};
use crate::frame::{
    Command, CommandQueue, DescriptorHeapLayout, FenceCounter, FrameDriver, GpuFence,
    PresentationSurface, RenderTargetView, SwapChain,
};
use crate::scene::{QuadBindings, Scene};
use crate::{Config, CLEAR_COLOR};

const RTV_HEAP_START: usize = 0x10_0000;
const RTV_INCREMENT: u32 = 32;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompletionMode {
    /// Work completes at the moment it is signaled.
    #[default]
    Immediate,
    /// Work completes only through `complete_through`.
    Manual,
}

/// Everything the headless GPU was asked to do, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GpuEvent {
    Execute { commands: usize },
    Present { image: usize, sync_interval: u32 },
    Signal(u64),
    WaitBegin(u64),
    WaitEnd(u64),
    AllocatorReset,
    CreateRenderTargetView { image: usize, view: RenderTargetView },
}

#[derive(Default)]
struct GpuState {
    mode: CompletionMode,
    signaled: u64,
    completed: u64,
    executing: bool,
    submission_count: u64,
    recording: bool,
    submissions: Vec<Vec<Command>>,
    events: Vec<GpuEvent>,
    fail_next_present: bool,
}

impl GpuState {
    fn push_event(&mut self, event: GpuEvent) {
        if self.recording {
            self.events.push(event);
        }
    }
}

#[derive(Default)]
struct Shared {
    state: Mutex<GpuState>,
    progress: Condvar,
}

/// Handle to the shared headless device. Cloning is cheap.
#[derive(Clone, Default)]
pub struct HeadlessGpu {
    shared: Arc<Shared>,
}

impl HeadlessGpu {
    pub fn new(mode: CompletionMode) -> Self {
        let gpu = Self::default();
        gpu.shared.state.lock().mode = mode;
        gpu
    }

    /// Like [`HeadlessGpu::new`], but keeps the full event and submission log.
    /// The log grows with every frame.
    pub fn recording(mode: CompletionMode) -> Self {
        let gpu = Self::new(mode);
        gpu.shared.state.lock().recording = true;
        gpu
    }

    pub fn queue(&self) -> HeadlessQueue {
        HeadlessQueue { gpu: self.clone() }
    }

    pub fn fence(&self) -> HeadlessFence {
        HeadlessFence { gpu: self.clone() }
    }

    pub fn swap_chain(&self, image_count: usize) -> HeadlessSwapChain {
        HeadlessSwapChain {
            gpu: self.clone(),
            image_count,
            current: 0,
        }
    }

    /// Marks all work up to `value` as finished and wakes any waiter.
    pub fn complete_through(&self, value: u64) {
        let mut state = self.shared.state.lock();
        let value = value.min(state.signaled);
        if value > state.completed {
            state.completed = value;
            if state.completed == state.signaled {
                state.executing = false;
            }
            trace!(value, "headless GPU completed");
        }
        self.shared.progress.notify_all();
    }

    pub fn fail_next_present(&self) {
        self.shared.state.lock().fail_next_present = true;
    }

    pub fn completed_value(&self) -> u64 {
        self.shared.state.lock().completed
    }

    pub fn signaled_value(&self) -> u64 {
        self.shared.state.lock().signaled
    }

    pub fn submission_count(&self) -> u64 {
        self.shared.state.lock().submission_count
    }

    /// Empty unless built with [`HeadlessGpu::recording`].
    pub fn events(&self) -> Vec<GpuEvent> {
        self.shared.state.lock().events.clone()
    }

    /// Empty unless built with [`HeadlessGpu::recording`].
    pub fn submissions(&self) -> Vec<Vec<Command>> {
        self.shared.state.lock().submissions.clone()
    }
}

pub struct HeadlessQueue {
    gpu: HeadlessGpu,
}

impl CommandQueue for HeadlessQueue {
    fn execute(&mut self, commands: &[Command]) -> Result<()> {
        let mut state = self.gpu.shared.state.lock();
        state.executing = true;
        state.submission_count += 1;
        if state.recording {
            state.submissions.push(commands.to_vec());
        }
        state.push_event(GpuEvent::Execute {
            commands: commands.len(),
        });
        Ok(())
    }

    fn reset_allocator(&mut self) -> Result<()> {
        let mut state = self.gpu.shared.state.lock();
        if state.executing {
            return Err(Error::Gpu(
                "command allocator reset while its commands are executing".into(),
            ));
        }
        state.push_event(GpuEvent::AllocatorReset);
        Ok(())
    }
}

pub struct HeadlessFence {
    gpu: HeadlessGpu,
}

impl GpuFence for HeadlessFence {
    fn signal(&mut self, value: u64) -> Result<()> {
        let mut state = self.gpu.shared.state.lock();
        state.signaled = value;
        state.push_event(GpuEvent::Signal(value));
        if state.mode == CompletionMode::Immediate {
            state.completed = value;
            state.executing = false;
        }
        Ok(())
    }

    fn completed_value(&self) -> u64 {
        self.gpu.completed_value()
    }

    fn block_until(&self, value: u64) -> Result<()> {
        let mut state = self.gpu.shared.state.lock();
        state.push_event(GpuEvent::WaitBegin(value));
        while state.completed < value {
            self.gpu.shared.progress.wait(&mut state);
        }
        state.push_event(GpuEvent::WaitEnd(value));
        Ok(())
    }
}

pub struct HeadlessSwapChain {
    gpu: HeadlessGpu,
    image_count: usize,
    current: usize,
}

impl SwapChain for HeadlessSwapChain {
    fn image_count(&self) -> usize {
        self.image_count
    }

    fn current_image_index(&self) -> usize {
        self.current
    }

    fn rtv_heap(&self) -> DescriptorHeapLayout {
        DescriptorHeapLayout {
            start: RTV_HEAP_START,
            increment: RTV_INCREMENT,
        }
    }

    fn create_render_target_view(&mut self, image: usize, view: RenderTargetView) -> Result<()> {
        let mut state = self.gpu.shared.state.lock();
        state.push_event(GpuEvent::CreateRenderTargetView { image, view });
        Ok(())
    }

    fn present(&mut self, sync_interval: u32) -> Result<()> {
        let mut state = self.gpu.shared.state.lock();
        if std::mem::take(&mut state.fail_next_present) {
            return Err(Error::Gpu("present failed".into()));
        }
        state.push_event(GpuEvent::Present {
            image: self.current,
            sync_interval,
        });
        self.current = (self.current + 1) % self.image_count;
        Ok(())
    }
}

pub type HeadlessDriver = FrameDriver<HeadlessQueue, HeadlessSwapChain, HeadlessFence>;

/// Builds a frame driver over `gpu` with render-target views in place.
pub fn create_driver(gpu: &HeadlessGpu, config: &Config) -> Result<HeadlessDriver> {
    let mut surface = PresentationSurface::create(
        gpu.swap_chain(config.buffer_count()),
        config.present_mode(),
    );
    surface.create_render_target_views()?;

    Ok(FrameDriver::new(
        gpu.queue(),
        surface,
        FenceCounter::new(gpu.fence()),
        CLEAR_COLOR,
    ))
}

/// Runs the frame loop without a window for the configured number of frames.
pub fn run(config: &Config) -> Result<()> {
    let frames = config
        .frame_limit()
        .unwrap_or(crate::DEFAULT_HEADLESS_FRAMES);
    info!(
        frames,
        buffers = config.buffer_count(),
        "starting headless frame loop"
    );

    let gpu = HeadlessGpu::new(CompletionMode::Immediate);
    let mut driver = create_driver(&gpu, config)?;
    let scene = Scene::new(
        config.client_width(),
        config.client_height(),
        QuadBindings::DEFAULT,
    );

    for _ in 0..frames {
        let report = driver.render_frame(|recorder| scene.record(recorder))?;
        info!(
            frame = report.frame,
            image = report.image_index,
            fence = report.fence_value.get(),
            commands = report.command_count,
            "frame presented"
        );
    }

    driver.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_completes_the_configured_frames() {
        let config = crate::parse_args(
            ["textured-quad", "--headless", "--frames", "4"].map(String::from),
        )
        .unwrap();
        run(&config).unwrap();
    }

    #[test]
    fn plain_gpu_keeps_no_log() {
        let config = crate::Config::default();
        let gpu = HeadlessGpu::new(CompletionMode::Immediate);
        let mut driver = create_driver(&gpu, &config).unwrap();
        let scene = Scene::new(1280, 720, QuadBindings::DEFAULT);

        for _ in 0..64 {
            driver.render_frame(|recorder| scene.record(recorder)).unwrap();
        }

        assert_eq!(gpu.submission_count(), 64);
        assert_eq!(gpu.signaled_value(), 64);
        assert!(gpu.events().is_empty());
        assert!(gpu.submissions().is_empty());
    }

    #[test]
    fn recording_gpu_keeps_every_submission() {
        let config = crate::Config::default();
        let gpu = HeadlessGpu::recording(CompletionMode::Immediate);
        let mut driver = create_driver(&gpu, &config).unwrap();
        let scene = Scene::new(1280, 720, QuadBindings::DEFAULT);

        for _ in 0..3 {
            driver.render_frame(|recorder| scene.record(recorder)).unwrap();
        }

        assert_eq!(gpu.submission_count(), 3);
        assert_eq!(gpu.submissions().len(), 3);
        assert!(gpu.events().contains(&GpuEvent::Signal(3)));
    }

    #[test]
    fn immediate_mode_completes_on_signal() {
        let gpu = HeadlessGpu::new(CompletionMode::Immediate);
        let mut fence = gpu.fence();
        fence.signal(4).unwrap();
        assert_eq!(fence.completed_value(), 4);
        fence.block_until(4).unwrap();
    }

    #[test]
    fn manual_mode_never_completes_past_signaled() {
        let gpu = HeadlessGpu::new(CompletionMode::Manual);
        let mut fence = gpu.fence();
        fence.signal(2).unwrap();
        assert_eq!(gpu.completed_value(), 0);

        gpu.complete_through(10);
        assert_eq!(gpu.completed_value(), 2);
    }

    #[test]
    fn allocator_reset_is_refused_while_executing() {
        let gpu = HeadlessGpu::new(CompletionMode::Manual);
        let mut queue = gpu.queue();
        let mut fence = gpu.fence();

        queue.execute(&[]).unwrap();
        fence.signal(1).unwrap();
        assert!(queue.reset_allocator().is_err());

        gpu.complete_through(1);
        queue.reset_allocator().unwrap();
    }

    #[test]
    fn present_advances_one_slot() {
        let gpu = HeadlessGpu::default();
        let mut swap_chain = gpu.swap_chain(3);
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(swap_chain.current_image_index());
            swap_chain.present(1).unwrap();
        }
        assert_eq!(seen, vec![0, 1, 2, 0]);
    }
}
