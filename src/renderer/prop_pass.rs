//! Instanced draw of the scattered props and firefly markers.
//!
//! Logs and bricks share a unit cube, gypsum and fireflies share a unit sphere; each instance
//! carries its model matrix (scaled to the prop's pick shape) and its live color. Shading is
//! flat: ambient, the moon, the door light and the firefly point lights, faded into the fog.

use super::{FrameSnapshot, DEPTH_FORMAT};
use crate::color::srgb_to_linear;
use crate::ecs::{FireflyLight, PickShape, PropInstance};
use anyhow::Result;
use glam::{Mat4, Vec3};
use std::f32::consts::{PI, TAU};
use wgpu::util::DeviceExt;

pub(super) const MAX_FIREFLY_LIGHTS: usize = 8;
const FIREFLY_MARKER_DIAMETER: f32 = 0.06;
const SPHERE_RINGS: u32 = 12;
const SPHERE_SEGMENTS: u32 = 16;

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub(super) struct PropVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl PropVertex {
    fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PropVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &ATTRIBUTES,
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub(super) struct PropInstanceData {
    pub model: [[f32; 4]; 4],
    /// Linear rgb; `w` is 1 for emissive markers.
    pub color: [f32; 4],
}

impl PropInstanceData {
    fn layout() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
            2 => Float32x4,
            3 => Float32x4,
            4 => Float32x4,
            5 => Float32x4,
            6 => Float32x4
        ];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PropInstanceData>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }

    pub fn for_prop(prop: &PropInstance) -> (PropMesh, Self) {
        let (mesh, scale) = match prop.category.pick_shape() {
            PickShape::Box { half_extents } => (PropMesh::Cube, half_extents * 2.0),
            PickShape::Sphere { radius } => (PropMesh::Sphere, Vec3::splat(radius * 2.0)),
        };
        let model = prop.model * Mat4::from_scale(scale);
        (mesh, Self { model: model.to_cols_array_2d(), color: srgb_to_linear(prop.color).extend(0.0).to_array() })
    }

    pub fn for_firefly(firefly: &FireflyLight) -> Self {
        let model = Mat4::from_translation(firefly.position) * Mat4::from_scale(Vec3::splat(FIREFLY_MARKER_DIAMETER));
        Self { model: model.to_cols_array_2d(), color: srgb_to_linear(firefly.light.color).extend(1.0).to_array() }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub(super) struct PropFrameData {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub fog_color: [f32; 4],
    pub fog_params: [f32; 4],
    pub light_params: [f32; 4],
    pub firefly_positions: [[f32; 4]; MAX_FIREFLY_LIGHTS],
    pub firefly_colors: [[f32; 4]; MAX_FIREFLY_LIGHTS],
}

impl PropFrameData {
    pub fn from_snapshot(frame: &FrameSnapshot) -> Self {
        let env = &frame.environment;
        let mut firefly_positions = [[0.0; 4]; MAX_FIREFLY_LIGHTS];
        let mut firefly_colors = [[0.0; 4]; MAX_FIREFLY_LIGHTS];
        let lit = frame.fireflies.len().min(MAX_FIREFLY_LIGHTS);
        for (slot, firefly) in frame.fireflies.iter().take(lit).enumerate() {
            firefly_positions[slot] = firefly.position.extend(firefly.light.range).to_array();
            firefly_colors[slot] =
                (srgb_to_linear(firefly.light.color) * firefly.light.intensity).extend(0.0).to_array();
        }
        Self {
            view_proj: frame.view_projection.to_cols_array_2d(),
            camera_pos: frame.camera_eye.extend(1.0).to_array(),
            fog_color: srgb_to_linear(env.fog_color).extend(1.0).to_array(),
            fog_params: [env.fog_near, env.fog_far, 0.0, 0.0],
            light_params: [env.ambient_intensity, env.moon_intensity, env.door_light_intensity, lit as f32],
            firefly_positions,
            firefly_colors,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum PropMesh {
    Cube,
    Sphere,
}

/// Per-mesh instance lists for one frame.
#[derive(Debug, Default, Clone)]
pub(super) struct PropBatches {
    pub cubes: Vec<PropInstanceData>,
    pub spheres: Vec<PropInstanceData>,
}

impl PropBatches {
    pub fn from_snapshot(frame: &FrameSnapshot) -> Self {
        let mut batches = Self::default();
        for prop in &frame.props {
            let (mesh, data) = PropInstanceData::for_prop(prop);
            match mesh {
                PropMesh::Cube => batches.cubes.push(data),
                PropMesh::Sphere => batches.spheres.push(data),
            }
        }
        batches.spheres.extend(frame.fireflies.iter().map(PropInstanceData::for_firefly));
        batches
    }
}

#[derive(Debug, Clone, Default)]
pub(super) struct MeshGeometry {
    pub vertices: Vec<PropVertex>,
    pub indices: Vec<u16>,
}

impl MeshGeometry {
    /// Axis-aligned cube of side 1 centred on the origin, with per-face normals.
    pub fn unit_cube() -> Self {
        let faces = [
            (Vec3::X, Vec3::Y, Vec3::Z),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::Z, Vec3::X),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::Y, Vec3::X),
        ];
        let mut mesh = Self::default();
        for (normal, u, v) in faces {
            let base = mesh.vertices.len() as u16;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let position = (normal + u * su + v * sv) * 0.5;
                mesh.vertices.push(PropVertex { position: position.to_array(), normal: normal.to_array() });
            }
            mesh.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        mesh
    }

    /// UV sphere of diameter 1 centred on the origin.
    pub fn unit_sphere(rings: u32, segments: u32) -> Self {
        let rings = rings.max(2);
        let segments = segments.max(3);
        let mut mesh = Self::default();
        for ring in 0..=rings {
            let theta = PI * ring as f32 / rings as f32;
            for segment in 0..=segments {
                let phi = TAU * segment as f32 / segments as f32;
                let normal = Vec3::new(theta.sin() * phi.cos(), theta.cos(), theta.sin() * phi.sin());
                mesh.vertices.push(PropVertex { position: (normal * 0.5).to_array(), normal: normal.to_array() });
            }
        }
        let stride = (segments + 1) as u16;
        for ring in 0..rings as u16 {
            for segment in 0..segments as u16 {
                let a = ring * stride + segment;
                let b = a + stride;
                mesh.indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
            }
        }
        mesh
    }
}

/// Instance buffer capacity able to hold `needed` entries, doubling from 256.
fn grown_capacity(current: usize, needed: usize) -> usize {
    let mut capacity = current.max(256);
    while capacity < needed {
        capacity *= 2;
    }
    capacity
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, label: &str, geometry: &MeshGeometry) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Vertices")),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} Indices")),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self { vertex_buffer, index_buffer, index_count: geometry.indices.len() as u32 }
    }
}

#[derive(Default)]
struct InstanceBuffer {
    buffer: Option<wgpu::Buffer>,
    capacity: usize,
    count: u32,
}

impl InstanceBuffer {
    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, label: &str, instances: &[PropInstanceData]) {
        self.count = instances.len() as u32;
        if instances.is_empty() {
            return;
        }
        if self.buffer.is_none() || self.capacity < instances.len() {
            let capacity = grown_capacity(self.capacity, instances.len());
            self.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size: (capacity * std::mem::size_of::<PropInstanceData>()) as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.capacity = capacity;
        }
        if let Some(buffer) = self.buffer.as_ref() {
            queue.write_buffer(buffer, 0, bytemuck::cast_slice(instances));
        }
    }
}

struct PropPipelineResources {
    format: wgpu::TextureFormat,
    pipeline: wgpu::RenderPipeline,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    cube: GpuMesh,
    sphere: GpuMesh,
}

impl PropPipelineResources {
    fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Prop Mesh Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../assets/shaders/prop_mesh.wgsl").into()),
        });
        let frame_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Prop Frame BGL"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let frame_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Prop Frame Buffer"),
            size: std::mem::size_of::<PropFrameData>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Prop Frame BG"),
            layout: &frame_bgl,
            entries: &[wgpu::BindGroupEntry { binding: 0, resource: frame_buffer.as_entire_binding() }],
        });
        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Prop Pipeline Layout"),
            bind_group_layouts: &[&frame_bgl],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Prop Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[PropVertex::layout(), PropInstanceData::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        let cube = GpuMesh::upload(device, "Prop Cube", &MeshGeometry::unit_cube());
        let sphere = GpuMesh::upload(device, "Prop Sphere", &MeshGeometry::unit_sphere(SPHERE_RINGS, SPHERE_SEGMENTS));
        log::debug!("Prop pipeline created for {format:?}");
        Self { format, pipeline, frame_buffer, frame_bind_group, cube, sphere }
    }
}

#[derive(Default)]
pub(super) struct PropPass {
    resources: Option<PropPipelineResources>,
    cubes: InstanceBuffer,
    spheres: InstanceBuffer,
}

impl PropPass {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads the frame uniforms and the instance lists of `frame`.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        frame: &FrameSnapshot,
    ) -> Result<()> {
        if self.resources.as_ref().map(|res| res.format) != Some(format) {
            self.resources = Some(PropPipelineResources::new(device, format));
        }
        let Some(resources) = self.resources.as_ref() else {
            return Ok(());
        };
        queue.write_buffer(&resources.frame_buffer, 0, bytemuck::bytes_of(&PropFrameData::from_snapshot(frame)));
        let batches = PropBatches::from_snapshot(frame);
        self.cubes.upload(device, queue, "Prop Cube Instances", &batches.cubes);
        self.spheres.upload(device, queue, "Prop Sphere Instances", &batches.spheres);
        Ok(())
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        let Some(resources) = self.resources.as_ref() else {
            return;
        };
        pass.set_pipeline(&resources.pipeline);
        pass.set_bind_group(0, &resources.frame_bind_group, &[]);
        for (mesh, instances) in [(&resources.cube, &self.cubes), (&resources.sphere, &self.spheres)] {
            let Some(buffer) = instances.buffer.as_ref() else {
                continue;
            };
            if instances.count == 0 {
                continue;
            }
            pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
            pass.set_vertex_buffer(1, buffer.slice(..));
            pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            pass.draw_indexed(0..mesh.index_count, 0, 0..instances.count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::CursorStyle;
    use crate::ecs::{PointLight, PropCategory};
    use crate::environment::EnvironmentState;
    use bevy_ecs::prelude::Entity;
    use glam::Vec4;

    fn prop(category: PropCategory, translation: Vec3, color: Vec3) -> PropInstance {
        PropInstance {
            entity: Entity::from_raw(category as u32),
            category,
            model: Mat4::from_translation(translation),
            color,
            interactive: true,
        }
    }

    fn firefly(index: usize, position: Vec3) -> FireflyLight {
        FireflyLight {
            index,
            position,
            light: PointLight { color: Vec3::new(0.0, 1.0, 0.0), intensity: 0.4, range: 3.0 },
        }
    }

    fn snapshot(props: Vec<PropInstance>, fireflies: Vec<FireflyLight>) -> FrameSnapshot {
        FrameSnapshot {
            frame: 0,
            elapsed: 0.0,
            environment: EnvironmentState::default(),
            camera_eye: Vec3::new(4.0, 2.0, 5.0),
            view_projection: Mat4::perspective_rh(1.2, 1.5, 0.1, 100.0),
            props,
            fireflies,
            hovered: None,
            countdown: "100".to_string(),
            cursor: CursorStyle::Default,
        }
    }

    fn column(data: &PropInstanceData, index: usize) -> Vec4 {
        Vec4::from_array(data.model[index])
    }

    #[test]
    fn props_are_scaled_to_their_pick_shape() {
        let (mesh, log) = PropInstanceData::for_prop(&prop(PropCategory::Log, Vec3::new(1.0, 0.1, 2.0), Vec3::ONE));
        assert_eq!(mesh, PropMesh::Cube);
        assert!((column(&log, 0).truncate().length() - 0.2).abs() < 1e-5);
        assert!((column(&log, 1).truncate().length() - 0.7).abs() < 1e-5);
        assert_eq!(column(&log, 3), Vec4::new(1.0, 0.1, 2.0, 1.0));

        let (mesh, gypsum) = PropInstanceData::for_prop(&prop(PropCategory::Gypsum, Vec3::ZERO, Vec3::ONE));
        assert_eq!(mesh, PropMesh::Sphere);
        assert!((column(&gypsum, 2).truncate().length() - 0.3).abs() < 1e-5);

        let (mesh, brick) = PropInstanceData::for_prop(&prop(PropCategory::Brick, Vec3::ZERO, Vec3::ONE));
        assert_eq!(mesh, PropMesh::Cube);
        assert!((column(&brick, 0).truncate().length() - 0.4).abs() < 1e-5);
        assert!((column(&brick, 2).truncate().length() - 0.1).abs() < 1e-5);
    }

    #[test]
    fn live_color_is_linearised_and_not_emissive() {
        let red = Vec3::new(1.0, 0.0, 0.0);
        let (_, data) = PropInstanceData::for_prop(&prop(PropCategory::Brick, Vec3::ZERO, red));
        assert_eq!(data.color, [1.0, 0.0, 0.0, 0.0]);

        let grey = Vec3::splat(0.5);
        let (_, data) = PropInstanceData::for_prop(&prop(PropCategory::Log, Vec3::ZERO, grey));
        assert!(data.color[0] < 0.5 && data.color[0] > 0.1);
    }

    #[test]
    fn batches_split_by_mesh_and_include_fireflies() {
        let frame = snapshot(
            vec![
                prop(PropCategory::Log, Vec3::ZERO, Vec3::ONE),
                prop(PropCategory::Gypsum, Vec3::ZERO, Vec3::ONE),
                prop(PropCategory::Brick, Vec3::ZERO, Vec3::ONE),
            ],
            vec![firefly(0, Vec3::new(0.0, 0.5, 3.0)), firefly(1, Vec3::new(1.0, 0.5, 0.0))],
        );
        let batches = PropBatches::from_snapshot(&frame);
        assert_eq!(batches.cubes.len(), 2);
        assert_eq!(batches.spheres.len(), 3);
        let marker = batches.spheres[1];
        assert_eq!(marker.color, [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(column(&marker, 3), Vec4::new(0.0, 0.5, 3.0, 1.0));
    }

    #[test]
    fn frame_data_carries_fog_lights_and_camera() {
        let fireflies = (0..10).map(|i| firefly(i, Vec3::new(i as f32, 0.5, 0.0))).collect();
        let frame = snapshot(Vec::new(), fireflies);
        let data = PropFrameData::from_snapshot(&frame);
        let env = frame.environment;
        assert_eq!(data.fog_params[0], env.fog_near);
        assert_eq!(data.fog_params[1], env.fog_far);
        assert_eq!(data.fog_color[..3], srgb_to_linear(env.fog_color).to_array());
        assert_eq!(data.light_params[..3], [env.ambient_intensity, env.moon_intensity, env.door_light_intensity]);
        assert_eq!(data.light_params[3], MAX_FIREFLY_LIGHTS as f32);
        assert_eq!(data.firefly_positions[2], [2.0, 0.5, 0.0, 3.0]);
        assert!((data.firefly_colors[0][1] - 0.4).abs() < 1e-6);
        assert_eq!(data.camera_pos, [4.0, 2.0, 5.0, 1.0]);
        assert_eq!(data.view_proj, frame.view_projection.to_cols_array_2d());
    }

    fn assert_outward_winding(mesh: &MeshGeometry) {
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from_array(mesh.vertices[i as usize].position));
            let face = (b - a).cross(c - a);
            if face.length_squared() < 1e-10 {
                continue;
            }
            let centroid = (a + b + c) / 3.0;
            assert!(face.dot(centroid) > 0.0, "triangle {tri:?} faces inwards");
        }
    }

    #[test]
    fn unit_meshes_wind_counter_clockwise_outwards() {
        let cube = MeshGeometry::unit_cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        assert!(cube.vertices.iter().all(|v| v.position.iter().all(|c| c.abs() == 0.5)));
        assert_outward_winding(&cube);

        let sphere = MeshGeometry::unit_sphere(SPHERE_RINGS, SPHERE_SEGMENTS);
        assert_eq!(sphere.indices.len() as u32, SPHERE_RINGS * SPHERE_SEGMENTS * 6);
        assert!(sphere.vertices.iter().all(|v| (Vec3::from_array(v.position).length() - 0.5).abs() < 1e-5));
        assert_outward_winding(&sphere);
    }

    #[test]
    fn instance_capacity_doubles_from_256() {
        assert_eq!(grown_capacity(0, 1), 256);
        assert_eq!(grown_capacity(256, 257), 512);
        assert_eq!(grown_capacity(512, 1500), 2048);
    }
}
