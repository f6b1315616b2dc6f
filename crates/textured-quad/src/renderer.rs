use std::path::Path;

use tracing::{debug, info};
use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Direct3D12::ID3D12Resource;

use crate::d3d12::{
    command_queue::{BufferBinding, Pipeline, Queue, TextureBinding},
    descriptor::ShaderResourceHeap,
    device::Device,
    fence::Fence,
    pipeline, resource,
    resource::ConstantBuffer,
    swap_chain::SwapChain,
};
use crate::error::Result;
use crate::frame::{FenceCounter, FrameDriver, FrameReport, PresentationSurface};
use crate::input::Keyboard;
use crate::resource::{
    constant_buffer, index_buffer, texture2d, vertex_buffer, MaterialConstants, ResourceKind,
    TextureImage, TransformConstants,
};
use crate::scene::{QuadBindings, Scene, QUAD_INDICES, QUAD_VERTICES};
use crate::{Config, CLEAR_COLOR};

const SHADER_PATH: &str = "shaders/quad.hlsl";

const TEXTURE_SIZE: u32 = 256;
const TEXTURE_CELL: u32 = 32;

/// Owns the device, the GPU-side quad resources and the frame driver.
pub struct Renderer {
    driver: FrameDriver<Queue, SwapChain, Fence>,
    scene: Scene,

    transform: ConstantBuffer<TransformConstants>,
    _material: ConstantBuffer<MaterialConstants>,
    _buffers: Vec<ID3D12Resource>,
    _srv_heap: ShaderResourceHeap,

    // dropped last
    _device: Device,
}

impl Renderer {
    pub fn new(hwnd: HWND, config: &Config) -> Result<Self> {
        let device = Device::build(config.debug_layer_enabled(), config.gpu_validation_enabled())?;

        let mut queue = Queue::build(device.get(), "gfx_queue")?;
        let fence = Fence::build(device.get(), queue.get(), "frame_fence")?;

        let swap_chain = SwapChain::build(
            &device,
            queue.get(),
            hwnd,
            config.client_width(),
            config.client_height(),
            config.buffer_count(),
        )?;
        queue.set_back_buffers(swap_chain.back_buffers().to_vec());

        let mut surface = PresentationSurface::create(swap_chain, config.present_mode());
        surface.create_render_target_views()?;

        let root_signature = pipeline::create_root_signature(&device, "quad_root_signature")?;
        let state = pipeline::create_pso(
            &device,
            &root_signature,
            Path::new(SHADER_PATH),
            config.blend_mode(),
            config.debug_layer_enabled(),
        )?;
        let pipeline_id = queue.register_pipeline(Pipeline {
            state,
            root_signature,
        });

        let vertex_desc = vertex_buffer(&QUAD_VERTICES, "quad_vertices");
        let vertices = resource::create(&device, &vertex_desc)?;
        resource::upload(&vertices, &QUAD_VERTICES)?;
        let vertex_id = queue.register_buffer(BufferBinding::Vertex(
            resource::vertex_buffer_view(&vertices, &vertex_desc)?,
        ));

        let index_desc = index_buffer(&QUAD_INDICES, "quad_indices");
        let indices = resource::create(&device, &index_desc)?;
        resource::upload(&indices, &QUAD_INDICES)?;
        let index_id = queue.register_buffer(BufferBinding::Index(
            resource::index_buffer_view(&indices, &index_desc)?,
        ));

        let image = TextureImage::checkerboard(
            TEXTURE_SIZE,
            TEXTURE_SIZE,
            TEXTURE_CELL,
            [255, 255, 255, 255],
            [255, 96, 32, 255],
        );
        let texture_desc = texture2d(&image, "checkerboard");
        let texture = resource::create(&device, &texture_desc)?;
        resource::write_texture(&texture, &image)?;

        let mip_levels = match texture_desc.kind {
            ResourceKind::Texture { mip_levels, .. } => u32::from(mip_levels),
            _ => 1,
        };
        let mut srv_heap = ShaderResourceHeap::build(&device, 1, "srv_heap")?;
        let gpu_handle = srv_heap.create_texture_view(&device, &texture, mip_levels)?;
        let texture_id = queue.register_texture(TextureBinding {
            heap: srv_heap.get().clone(),
            gpu_handle,
        });

        let material = ConstantBuffer::<MaterialConstants>::build(
            &device,
            &constant_buffer::<MaterialConstants>("material"),
        )?;
        let material_id = queue.register_buffer(BufferBinding::Constant(material.gpu_address()));

        let transform = ConstantBuffer::<TransformConstants>::build(
            &device,
            &constant_buffer::<TransformConstants>("transform"),
        )?;
        let transform_id =
            queue.register_buffer(BufferBinding::Constant(transform.gpu_address()));

        let scene = Scene::new(
            config.client_width(),
            config.client_height(),
            QuadBindings {
                pipeline: pipeline_id,
                vertex_buffer: vertex_id,
                index_buffer: index_id,
                material: material_id,
                transform: transform_id,
                texture: texture_id,
            },
        );
        material.write(&scene.material());
        transform.write(&scene.transform());
        debug!(bindings = ?scene.bindings(), "registered quad resources");

        let driver = FrameDriver::new(queue, surface, FenceCounter::new(fence), CLEAR_COLOR);
        info!(
            buffers = config.buffer_count(),
            present_mode = ?config.present_mode(),
            blend = ?config.blend_mode(),
            "renderer ready"
        );

        Ok(Self {
            driver,
            scene,
            transform,
            _material: material,
            _buffers: vec![vertices, indices, texture],
            _srv_heap: srv_heap,
            _device: device,
        })
    }

    /// Applies input to the camera. The previous frame has completed by the
    /// time this runs, so the mapped transform can be rewritten in place.
    pub fn update(&mut self, keyboard: &Keyboard) {
        if self.scene.update(keyboard) {
            self.transform.write(&self.scene.transform());
        }
    }

    pub fn render(&mut self) -> Result<FrameReport> {
        let scene = &self.scene;
        self.driver.render_frame(|recorder| scene.record(recorder))
    }

    /// Waits until the GPU has drained all submitted work.
    pub fn flush(&mut self) -> Result<()> {
        self.driver.flush()
    }
}
