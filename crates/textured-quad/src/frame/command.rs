use crate::error::{Error, Result};

use super::fence::FenceValue;
use super::surface::RenderTargetView;
use super::transition::ResourceState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScissorRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl ScissorRect {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            left: 0,
            top: 0,
            right: i32::try_from(width).unwrap_or(i32::MAX),
            bottom: i32::try_from(height).unwrap_or(i32::MAX),
        }
    }
}

/// A deferred GPU operation. Bind targets are opaque ids resolved by the
/// backend that executes the list.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Barrier {
        image: usize,
        before: ResourceState,
        after: ResourceState,
    },
    SetRenderTarget(RenderTargetView),
    ClearRenderTarget {
        view: RenderTargetView,
        color: [f32; 4],
    },
    SetViewport(Viewport),
    SetScissorRect(ScissorRect),
    BindPipeline(PipelineId),
    BindVertexBuffer(BufferId),
    BindIndexBuffer(BufferId),
    BindConstantBuffer { slot: u32, buffer: BufferId },
    BindTextureTable { slot: u32, texture: TextureId },
    DrawIndexed {
        index_count: u32,
        instance_count: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Recording,
    Closed,
}

/// Append-only list of commands between `reset` and `close`.
///
/// A recorder starts open. Once closed and submitted it may only be reset
/// after the fence value covering it has completed.
#[derive(Debug)]
pub struct CommandRecorder {
    commands: Vec<Command>,
    state: RecorderState,
    submitted_at: Option<FenceValue>,
}

impl Default for CommandRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            state: RecorderState::Recording,
            submitted_at: None,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn record(&mut self, command: Command) -> Result<()> {
        if self.state != RecorderState::Recording {
            return Err(Error::RecorderClosed);
        }
        self.commands.push(command);
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        if self.state != RecorderState::Recording {
            return Err(Error::RecorderClosed);
        }
        self.state = RecorderState::Closed;
        Ok(())
    }

    /// Remembers the fence value that covers the submitted list.
    pub fn mark_submitted(&mut self, fence_value: FenceValue) {
        self.submitted_at = Some(fence_value);
    }

    pub fn submitted_at(&self) -> Option<FenceValue> {
        self.submitted_at
    }

    /// Clears the list and reopens it. `completed` is the fence value the GPU
    /// has reached.
    pub fn reset(&mut self, completed: u64) -> Result<()> {
        if self.state != RecorderState::Closed {
            return Err(Error::RecorderNotClosed);
        }
        if let Some(submitted) = self.submitted_at {
            if completed < submitted.get() {
                return Err(Error::RecorderInFlight {
                    submitted: submitted.get(),
                    completed,
                });
            }
        }

        self.commands.clear();
        self.submitted_at = None;
        self.state = RecorderState::Recording;
        Ok(())
    }
}
