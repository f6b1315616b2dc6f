use tracing::{debug, info, warn};

use crate::error::{Error, Result};

use super::backend::{CommandQueue, GpuFence, SwapChain};
use super::command::{Command, CommandRecorder};
use super::fence::{FenceCounter, FenceValue};
use super::surface::PresentationSurface;
use super::transition::{transition, ResourceState};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FramePhase {
    #[default]
    Idle,
    Recording,
    Submitted,
    Presented,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub frame: u64,
    pub image_index: usize,
    pub fence_value: FenceValue,
    pub command_count: usize,
}

/// Runs one frame at a time: record, submit, present, then wait for the GPU
/// before the allocator and recorder are touched again.
pub struct FrameDriver<Q, S, F> {
    queue: Q,
    surface: PresentationSurface<S>,
    fence: FenceCounter<F>,
    recorder: CommandRecorder,

    // one per backbuffer, `Present` between frames
    image_states: Vec<ResourceState>,

    phase: FramePhase,
    clear_color: [f32; 4],
    frame_count: u64,
}

impl<Q, S, F> FrameDriver<Q, S, F>
where
    Q: CommandQueue,
    S: SwapChain,
    F: GpuFence,
{
    pub fn new(
        queue: Q,
        surface: PresentationSurface<S>,
        fence: FenceCounter<F>,
        clear_color: [f32; 4],
    ) -> Self {
        let image_states = vec![ResourceState::Present; surface.image_count()];
        Self {
            queue,
            surface,
            fence,
            recorder: CommandRecorder::new(),
            image_states,
            phase: FramePhase::Idle,
            clear_color,
            frame_count: 0,
        }
    }

    /// Renders one frame. `draw` appends the draw commands; the driver
    /// wraps them in the render-target transitions, the clear and the
    /// fence handshake.
    ///
    /// On error the driver stays in the phase that failed and refuses
    /// further frames.
    pub fn render_frame<D>(&mut self, draw: D) -> Result<FrameReport>
    where
        D: FnOnce(&mut CommandRecorder) -> Result<()>,
    {
        self.expect_phase(FramePhase::Idle)?;

        // Idle -> Recording
        let image = self.surface.current_image()?;
        self.phase = FramePhase::Recording;
        debug!(frame = self.frame_count, image = image.index, "recording");

        let state = self.image_states[image.index];
        debug_assert_eq!(state, ResourceState::Present);
        let state = transition(state, &mut self.recorder, image.index)?;
        self.image_states[image.index] = state;

        self.recorder.record(Command::SetRenderTarget(image.view))?;
        self.recorder.record(Command::ClearRenderTarget {
            view: image.view,
            color: self.clear_color,
        })?;
        draw(&mut self.recorder)?;

        // Recording -> Submitted
        let state = transition(state, &mut self.recorder, image.index)?;
        self.image_states[image.index] = state;
        self.recorder.close()?;
        let command_count = self.recorder.len();
        self.queue.execute(self.recorder.commands())?;
        self.phase = FramePhase::Submitted;

        // Submitted -> Presented
        self.surface.present()?;
        self.phase = FramePhase::Presented;

        // Presented -> Idle
        let fence_value = self.fence.signal()?;
        self.recorder.mark_submitted(fence_value);
        self.fence.wait()?;
        self.queue.reset_allocator()?;
        self.recorder.reset(self.fence.completed_value())?;
        self.phase = FramePhase::Idle;

        let report = FrameReport {
            frame: self.frame_count,
            image_index: image.index,
            fence_value,
            command_count,
        };
        self.frame_count += 1;
        debug!(
            frame = report.frame,
            fence = fence_value.get(),
            commands = command_count,
            "frame complete"
        );
        Ok(report)
    }

    /// Signals and waits once so that no GPU work is outstanding.
    ///
    /// Valid in any phase, including after a failed frame whose list was
    /// already executed. The phase is left unchanged.
    pub fn flush(&mut self) -> Result<()> {
        if self.phase != FramePhase::Idle {
            warn!(phase = ?self.phase, "flushing after an incomplete frame");
        }
        let fence_value = self.fence.signal()?;
        self.fence.wait()?;
        info!(
            frames = self.frame_count,
            fence = fence_value.get(),
            "flushed GPU work"
        );
        Ok(())
    }

    fn expect_phase(&self, expected: FramePhase) -> Result<()> {
        if self.phase != expected {
            return Err(Error::InvalidPhase {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn image_states(&self) -> &[ResourceState] {
        &self.image_states
    }

    pub fn queue(&self) -> &Q {
        &self.queue
    }

    pub fn surface(&self) -> &PresentationSurface<S> {
        &self.surface
    }

    pub fn fence(&self) -> &FenceCounter<F> {
        &self.fence
    }
}
