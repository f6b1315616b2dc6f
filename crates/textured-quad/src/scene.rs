use core::f32;

use crate::error::Result;
use crate::frame::{
    BufferId, Command, CommandRecorder, PipelineId, ScissorRect, TextureId, Viewport,
};
use crate::input::{Key, Keyboard};
use crate::math::{self, Mat4, Vec3};
use crate::resource::{MaterialConstants, TransformConstants, Vertex};

#[rustfmt::skip]
pub const QUAD_VERTICES: [Vertex; 4] = [
    Vertex { position: [-50.0, -50.0, 0.0], uv: [0.0, 1.0] }, // bottom left
    Vertex { position: [-50.0,  50.0, 0.0], uv: [0.0, 0.0] }, // top left
    Vertex { position: [ 50.0, -50.0, 0.0], uv: [1.0, 1.0] }, // bottom right
    Vertex { position: [ 50.0,  50.0, 0.0], uv: [1.0, 0.0] }, // top right
];

#[rustfmt::skip]
pub const QUAD_INDICES: [u16; 6] = [
    0, 1, 2,
    1, 2, 3,
];

pub const ROOT_SLOT_MATERIAL: u32 = 0;
pub const ROOT_SLOT_TEXTURE: u32 = 1;
pub const ROOT_SLOT_TRANSFORM: u32 = 2;

const ROTATION_SPEED_DEG: f32 = 1.0;

/// Ids under which the backend registers the quad's GPU objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuadBindings {
    pub pipeline: PipelineId,
    pub vertex_buffer: BufferId,
    pub index_buffer: BufferId,
    pub material: BufferId,
    pub transform: BufferId,
    pub texture: TextureId,
}

impl QuadBindings {
    pub const DEFAULT: QuadBindings = QuadBindings {
        pipeline: PipelineId(0),
        vertex_buffer: BufferId(0),
        index_buffer: BufferId(1),
        material: BufferId(2),
        transform: BufferId(3),
        texture: TextureId(0),
    };
}

/// Circles the origin at a fixed height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub angle: f32,
    pub radius: f32,
    pub height: f32,
    pub target: Vec3,
    pub up: Vec3,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            angle: 0.0,
            radius: 100.0,
            height: 100.0,
            target: Vec3::ZERO,
            up: Vec3::Y,
        }
    }
}

impl OrbitCamera {
    pub fn rotate(&mut self, radians: f32) {
        self.angle += radians;
    }

    pub fn eye(&self) -> Vec3 {
        Vec3::new(
            -self.radius * self.angle.sin(),
            self.height,
            -self.radius * self.angle.cos(),
        )
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_lh(self.eye(), self.target, self.up)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_y: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
}

impl Projection {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            fov_y: 45.0 * f32::consts::PI / 180.0,
            aspect_ratio: width as f32 / height.max(1) as f32,
            near: 0.1,
            far: 1000.0,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::perspective_lh(self.fov_y, self.aspect_ratio, self.near, self.far)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldTransform {
    pub scale: Vec3,
    /// Euler angles in radians.
    pub rotation: Vec3,
    pub translation: Vec3,
}

impl Default for WorldTransform {
    fn default() -> Self {
        Self {
            scale: Vec3::ONE,
            rotation: Vec3::ZERO,
            translation: Vec3::ZERO,
        }
    }
}

impl WorldTransform {
    /// Scale, then rotate around Z, X, Y, then translate.
    pub fn matrix(&self) -> Mat4 {
        let rotation = Mat4::from_rotation_y(self.rotation.y)
            * Mat4::from_rotation_x(self.rotation.x)
            * Mat4::from_rotation_z(self.rotation.z);
        Mat4::from_translation(self.translation) * rotation * Mat4::from_scale(self.scale)
    }
}

pub struct Scene {
    pub camera: OrbitCamera,
    pub projection: Projection,
    pub world: WorldTransform,
    pub color: [f32; 4],

    width: u32,
    height: u32,
    bindings: QuadBindings,
}

impl Scene {
    pub fn new(width: u32, height: u32, bindings: QuadBindings) -> Self {
        Self {
            camera: OrbitCamera::default(),
            projection: Projection::new(width, height),
            world: WorldTransform::default(),
            color: [1.0, 1.0, 1.0, 1.0],
            width,
            height,
            bindings,
        }
    }

    /// Orbits the camera with A/D. Returns whether the transform changed.
    pub fn update(&mut self, keyboard: &Keyboard) -> bool {
        let step = keyboard.axis(Key::A, Key::D, ROTATION_SPEED_DEG.to_radians());
        if step == 0.0 {
            return false;
        }
        self.camera.rotate(step);
        true
    }

    pub fn model_view_proj(&self) -> Mat4 {
        self.projection.matrix() * self.camera.view() * self.world.matrix()
    }

    pub fn transform(&self) -> TransformConstants {
        TransformConstants {
            matrix: math::mat4_to_cols(&self.model_view_proj()),
        }
    }

    pub fn material(&self) -> MaterialConstants {
        MaterialConstants { color: self.color }
    }

    pub fn bindings(&self) -> QuadBindings {
        self.bindings
    }

    /// Appends the commands that draw the quad into the bound render target.
    pub fn record(&self, recorder: &mut CommandRecorder) -> Result<()> {
        let b = &self.bindings;
        let commands = [
            Command::SetViewport(Viewport::full(self.width, self.height)),
            Command::SetScissorRect(ScissorRect::full(self.width, self.height)),
            Command::BindPipeline(b.pipeline),
            Command::BindVertexBuffer(b.vertex_buffer),
            Command::BindIndexBuffer(b.index_buffer),
            Command::BindConstantBuffer {
                slot: ROOT_SLOT_MATERIAL,
                buffer: b.material,
            },
            Command::BindTextureTable {
                slot: ROOT_SLOT_TEXTURE,
                texture: b.texture,
            },
            Command::BindConstantBuffer {
                slot: ROOT_SLOT_TRANSFORM,
                buffer: b.transform,
            },
            Command::DrawIndexed {
                index_count: QUAD_INDICES.len() as u32,
                instance_count: 1,
            },
        ];

        for command in commands {
            recorder.record(command)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KEY_COUNT;

    fn assert_close(a: Vec3, b: Vec3) {
        assert!((a - b).length() < 1e-3, "{a} != {b}");
    }

    fn press(keyboard: &mut Keyboard, key: Key) {
        let mut keys = [0; KEY_COUNT];
        keys[usize::from(key.0)] = 0x80;
        keyboard.update(&keys);
    }

    #[test]
    fn camera_starts_behind_and_above_the_quad() {
        assert_close(OrbitCamera::default().eye(), Vec3::new(0.0, 100.0, -100.0));
    }

    #[test]
    fn camera_orbits_around_y() {
        let mut camera = OrbitCamera::default();
        camera.rotate(90f32.to_radians());
        assert_close(camera.eye(), Vec3::new(-100.0, 100.0, 0.0));
    }

    #[test]
    fn keys_rotate_one_degree_per_update() {
        let mut scene = Scene::new(1280, 720, QuadBindings::DEFAULT);
        let mut keyboard = Keyboard::default();

        assert!(!scene.update(&keyboard));

        press(&mut keyboard, Key::D);
        assert!(scene.update(&keyboard));
        assert!(scene.update(&keyboard));
        assert!((scene.camera.angle - 2f32.to_radians()).abs() < 1e-6);

        press(&mut keyboard, Key::A);
        scene.update(&keyboard);
        assert!((scene.camera.angle - 1f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn origin_projects_to_screen_centre() {
        let scene = Scene::new(1280, 720, QuadBindings::DEFAULT);
        let clip = scene.model_view_proj() * math::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip / clip.w;

        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn world_transform_applies_scale_before_translation() {
        let world = WorldTransform {
            scale: Vec3::splat(2.0),
            rotation: Vec3::ZERO,
            translation: Vec3::new(1.0, 0.0, 0.0),
        };
        let p = world.matrix().transform_point3(Vec3::new(1.0, 1.0, 0.0));
        assert_close(p, Vec3::new(3.0, 2.0, 0.0));
    }

    #[test]
    fn records_a_single_indexed_draw() {
        let scene = Scene::new(1280, 720, QuadBindings::DEFAULT);
        let mut recorder = CommandRecorder::new();
        scene.record(&mut recorder).unwrap();

        let commands = recorder.commands();
        assert_eq!(commands.len(), 9);
        assert_eq!(
            commands.last(),
            Some(&Command::DrawIndexed {
                index_count: 6,
                instance_count: 1
            })
        );
        assert!(commands.contains(&Command::BindTextureTable {
            slot: ROOT_SLOT_TEXTURE,
            texture: TextureId(0)
        }));
    }
}
