use std::ops::Range;

use bytemuck::{Pod, Zeroable};

use crate::resources::DEPTH_FORMAT;

// ── uniform ───────────────────────────────────────────────────────────────

/// Per-frame uniform: elapsed seconds, padded to 16 bytes.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct TimeUniform {
    pub time: f32,
    pub _pad: [f32; 3],
}

impl TimeUniform {
    pub const SIZE: u64 = std::mem::size_of::<Self>() as u64;

    pub fn new(time: f32) -> Self {
        Self {
            time,
            _pad: [0.0; 3],
        }
    }
}

// ── draw ──────────────────────────────────────────────────────────────────

/// Non-indexed draw parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawCall {
    pub vertices: Range<u32>,
    pub instances: Range<u32>,
}

/// Two triangles forming the quad, one instance.
pub const QUAD_DRAW: DrawCall = DrawCall {
    vertices: 0..6,
    instances: 0..1,
};

// ── blend ─────────────────────────────────────────────────────────────────

/// Source-over for color, destination alpha kept as is.
pub fn source_over_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::Zero,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

// ── pipeline ──────────────────────────────────────────────────────────────

/// Compiles the quad shader and builds its pipeline and bind-group layout.
///
/// `sample_count` must match the MSAA count of the attachments it draws into.
pub fn build_pipeline(
    device: &wgpu::Device,
    surface_format: wgpu::TextureFormat,
    sample_count: u32,
) -> (wgpu::RenderPipeline, wgpu::BindGroupLayout) {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("ember quad shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("shaders/quad.wgsl").into()),
    });

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("ember quad bgl"),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: wgpu::BufferSize::new(TimeUniform::SIZE),
            },
            count: None,
        }],
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("ember quad pipeline layout"),
        bind_group_layouts: &[&bind_group_layout],
        immediate_size: 0,
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("ember quad pipeline"),
        layout: Some(&pipeline_layout),

        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[],
        },

        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(source_over_blend()),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),

        multisample: wgpu::MultisampleState {
            count: sample_count,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },

        multiview_mask: None,
        cache: None,
    });

    (pipeline, bind_group_layout)
}

/// Pipeline, its layout and the uniform buffer it reads.
///
/// Created lazily on the first frame and never rebuilt: resizes do not affect it.
pub struct PipelineBundle {
    pub pipeline: wgpu::RenderPipeline,
    pub bind_group_layout: wgpu::BindGroupLayout,
    pub uniform_buffer: wgpu::Buffer,
}

impl PipelineBundle {
    pub fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat, sample_count: u32) -> Self {
        let (pipeline, bind_group_layout) = build_pipeline(device, surface_format, sample_count);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ember time ubo"),
            size: TimeUniform::SIZE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            pipeline,
            bind_group_layout,
            uniform_buffer,
        }
    }

    pub fn write_time(&self, queue: &wgpu::Queue, elapsed: f32) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&TimeUniform::new(elapsed)),
        );
    }

    /// Binds the uniform buffer to the pipeline's layout.
    pub fn bind_group(&self, device: &wgpu::Device) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ember quad bind group"),
            layout: &self.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: self.uniform_buffer.as_entire_binding(),
            }],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::headless_test_context;

    #[test]
    fn uniform_is_sixteen_bytes() {
        assert_eq!(TimeUniform::SIZE, 16);
        let uniform = TimeUniform::new(1.5);
        let bytes = bytemuck::bytes_of(&uniform);
        assert_eq!(&bytes[..4], &1.5f32.to_ne_bytes());
        assert!(bytes[4..].iter().all(|b| *b == 0));
    }

    #[test]
    fn quad_draw_is_two_triangles() {
        assert_eq!(QUAD_DRAW.vertices.len(), 6);
        assert_eq!(QUAD_DRAW.instances.len(), 1);
    }

    #[test]
    fn blend_is_source_over_with_alpha_preserved() {
        let b = source_over_blend();
        assert_eq!(b.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(b.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
        assert_eq!(b.alpha.src_factor, wgpu::BlendFactor::Zero);
        assert_eq!(b.alpha.dst_factor, wgpu::BlendFactor::One);
    }

    #[test]
    fn pipeline_builds_without_validation_errors() {
        let ctx = headless_test_context();
        {
            let _scope = ctx.error_scope("build_pipeline");
            let bundle = PipelineBundle::new(ctx.device(), wgpu::TextureFormat::Bgra8Unorm, 4);
            bundle.write_time(ctx.queue(), 0.5);
            let _bg = bundle.bind_group(ctx.device());
        }
        ctx.tick();
        assert_eq!(ctx.error_scopes().reported(), 0);
    }
}
