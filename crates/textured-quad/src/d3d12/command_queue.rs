use super::barrier;
use super::util::*;
use tracing::debug;
use windows::{
    core::Interface,
    Win32::{
        Foundation::{FALSE, RECT},
        Graphics::{Direct3D::D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST, Direct3D12::*},
    },
};

use crate::error::{Error, Result};
use crate::frame::{
    BufferId, Command, CommandQueue, PipelineId, ScissorRect, TextureId, Viewport,
};

pub struct Pipeline {
    pub state: ID3D12PipelineState,
    pub root_signature: ID3D12RootSignature,
}

pub enum BufferBinding {
    Vertex(D3D12_VERTEX_BUFFER_VIEW),
    Index(D3D12_INDEX_BUFFER_VIEW),
    Constant(u64),
}

pub struct TextureBinding {
    pub heap: ID3D12DescriptorHeap,
    pub gpu_handle: D3D12_GPU_DESCRIPTOR_HANDLE,
}

/// A direct queue with one allocator and one command list, replaying
/// recorded [`Command`]s into the native list.
pub struct Queue {
    queue: ID3D12CommandQueue,

    // backing memory for recording the GPU commands into a command list
    // cannot be reset or reused until the GPU finishes executing all commands
    allocator: ID3D12CommandAllocator,

    // GPU commands are recorded into this
    command_list: ID3D12GraphicsCommandList,

    back_buffers: Vec<ID3D12Resource>,
    pipelines: Vec<Pipeline>,
    buffers: Vec<BufferBinding>,
    textures: Vec<TextureBinding>,
}

impl Queue {
    pub fn build(device: &ID3D12Device, name: &str) -> Result<Self> {
        let desc = D3D12_COMMAND_QUEUE_DESC {
            Type: D3D12_COMMAND_LIST_TYPE_DIRECT,
            Priority: D3D12_COMMAND_QUEUE_PRIORITY_NORMAL.0,
            Flags: D3D12_COMMAND_QUEUE_FLAG_NONE,
            NodeMask: 0,
        };
        let queue: ID3D12CommandQueue = unsafe { device.CreateCommandQueue(&desc) }?;
        set_name(&queue, name)?;

        let allocator: ID3D12CommandAllocator =
            unsafe { device.CreateCommandAllocator(D3D12_COMMAND_LIST_TYPE_DIRECT) }?;
        set_name(&allocator, &format!("{name}::allocator"))?;

        // created in the recording state
        let command_list: ID3D12GraphicsCommandList = unsafe {
            device.CreateCommandList(0, D3D12_COMMAND_LIST_TYPE_DIRECT, &allocator, None)
        }?;
        set_name(&command_list, &format!("{name}::command_list"))?;

        Ok(Self {
            queue,
            allocator,
            command_list,
            back_buffers: Vec::new(),
            pipelines: Vec::new(),
            buffers: Vec::new(),
            textures: Vec::new(),
        })
    }

    #[must_use]
    pub fn get(&self) -> &ID3D12CommandQueue {
        &self.queue
    }

    pub fn set_back_buffers(&mut self, back_buffers: Vec<ID3D12Resource>) {
        self.back_buffers = back_buffers;
    }

    pub fn register_pipeline(&mut self, pipeline: Pipeline) -> PipelineId {
        self.pipelines.push(pipeline);
        PipelineId(self.pipelines.len() as u32 - 1)
    }

    pub fn register_buffer(&mut self, buffer: BufferBinding) -> BufferId {
        self.buffers.push(buffer);
        BufferId(self.buffers.len() as u32 - 1)
    }

    pub fn register_texture(&mut self, texture: TextureBinding) -> TextureId {
        self.textures.push(texture);
        TextureId(self.textures.len() as u32 - 1)
    }

    fn record(&self, command: &Command) -> Result<()> {
        let list = &self.command_list;
        match command {
            Command::Barrier {
                image,
                before,
                after,
            } => {
                let resource = self
                    .back_buffers
                    .get(*image)
                    .ok_or_else(|| Error::Gpu(format!("no backbuffer {image}")))?;
                let barriers = [barrier::transition_barrier(resource, *before, *after)];
                unsafe { list.ResourceBarrier(&barriers) };
            }
            Command::SetRenderTarget(view) => {
                let rtv = D3D12_CPU_DESCRIPTOR_HANDLE { ptr: view.ptr };
                unsafe { list.OMSetRenderTargets(1, Some(&rtv), FALSE, None) };
            }
            Command::ClearRenderTarget { view, color } => {
                let rtv = D3D12_CPU_DESCRIPTOR_HANDLE { ptr: view.ptr };
                unsafe { list.ClearRenderTargetView(rtv, color, None) };
            }
            Command::SetViewport(viewport) => {
                unsafe { list.RSSetViewports(&[native_viewport(viewport)]) };
            }
            Command::SetScissorRect(rect) => {
                unsafe { list.RSSetScissorRects(&[native_rect(rect)]) };
            }
            Command::BindPipeline(id) => {
                let pipeline = self
                    .pipelines
                    .get(id.0 as usize)
                    .ok_or_else(|| Error::Gpu(format!("unknown pipeline {id:?}")))?;
                unsafe {
                    list.SetPipelineState(&pipeline.state);
                    list.SetGraphicsRootSignature(&pipeline.root_signature);
                    list.IASetPrimitiveTopology(D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST);
                }
            }
            Command::BindVertexBuffer(id) => match self.buffer(*id)? {
                BufferBinding::Vertex(view) => unsafe {
                    list.IASetVertexBuffers(0, Some(&[*view]))
                },
                _ => return Err(Error::Gpu(format!("{id:?} is not a vertex buffer"))),
            },
            Command::BindIndexBuffer(id) => match self.buffer(*id)? {
                BufferBinding::Index(view) => unsafe { list.IASetIndexBuffer(Some(view)) },
                _ => return Err(Error::Gpu(format!("{id:?} is not an index buffer"))),
            },
            Command::BindConstantBuffer { slot, buffer } => match self.buffer(*buffer)? {
                BufferBinding::Constant(address) => unsafe {
                    list.SetGraphicsRootConstantBufferView(*slot, *address)
                },
                _ => return Err(Error::Gpu(format!("{buffer:?} is not a constant buffer"))),
            },
            Command::BindTextureTable { slot, texture } => {
                let texture = self
                    .textures
                    .get(texture.0 as usize)
                    .ok_or_else(|| Error::Gpu(format!("unknown texture {texture:?}")))?;
                unsafe {
                    list.SetDescriptorHeaps(&[Some(texture.heap.clone())]);
                    list.SetGraphicsRootDescriptorTable(*slot, texture.gpu_handle);
                }
            }
            Command::DrawIndexed {
                index_count,
                instance_count,
            } => unsafe { list.DrawIndexedInstanced(*index_count, *instance_count, 0, 0, 0) },
        }
        Ok(())
    }

    fn buffer(&self, id: BufferId) -> Result<&BufferBinding> {
        self.buffers
            .get(id.0 as usize)
            .ok_or_else(|| Error::Gpu(format!("unknown buffer {id:?}")))
    }
}

impl CommandQueue for Queue {
    fn execute(&mut self, commands: &[Command]) -> Result<()> {
        for command in commands {
            self.record(command)?;
        }

        unsafe {
            self.command_list.Close()?;

            let command_lists = [Some(self.command_list.cast()?)];
            self.queue.ExecuteCommandLists(&command_lists);
        }
        debug!(commands = commands.len(), "executed command list");
        Ok(())
    }

    fn reset_allocator(&mut self) -> Result<()> {
        unsafe {
            self.allocator.Reset()?;
            self.command_list.Reset(&self.allocator, None)?;
        }
        Ok(())
    }
}

fn native_viewport(viewport: &Viewport) -> D3D12_VIEWPORT {
    D3D12_VIEWPORT {
        TopLeftX: viewport.x,
        TopLeftY: viewport.y,
        Width: viewport.width,
        Height: viewport.height,
        MinDepth: viewport.min_depth,
        MaxDepth: viewport.max_depth,
    }
}

fn native_rect(rect: &ScissorRect) -> RECT {
    RECT {
        left: rect.left,
        top: rect.top,
        right: rect.right,
        bottom: rect.bottom,
    }
}
