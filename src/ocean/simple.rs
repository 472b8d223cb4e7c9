//! Simple height-field mode: ping-pong accumulation of layered gradient
//! noise, no spectral machinery.
//!
//! A small tileable Perlin texture is generated once on the CPU; each
//! frame one pass samples it at two time-offset UVs and folds the result
//! into the previous frame's height buffer, then a second pass derives
//! the same displacement/normal outputs the spectral path produces. The
//! height pair swaps roles unconditionally every frame.

use bytemuck::{Pod, Zeroable};
use noise::{NoiseFn, Perlin};
use wgpu::util::DeviceExt;

use crate::ocean::pipeline::{create_target_texture, PingPong};
use crate::params::{OceanParams, SimpleWaveParams};

/// Side length of the CPU-generated noise tile.
const TILE_SIZE: u32 = 256;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct SimpleUniforms {
    time: f32,
    blend: f32,
    amplitude: f32,
    patch_size: f32,
    layer1_frequency: f32,
    layer2_frequency: f32,
    layer1_velocity: [f32; 2],
    layer2_velocity: [f32; 2],
    resolution: u32,
    _pad: [u32; 3],
}

/// Seamlessly tiling Perlin tile, sampled on a torus so wrap-around
/// sampling in the shader never shows a seam. One byte per texel,
/// [-1, 1] mapped to [0, 255].
pub fn tileable_noise_tile(seed: u32, size: u32) -> Vec<u8> {
    let perlin = Perlin::new(seed);
    let radius = 1.0;
    let mut data = Vec::with_capacity((size * size) as usize);
    for j in 0..size {
        for i in 0..size {
            let a = std::f64::consts::TAU * i as f64 / size as f64;
            let b = std::f64::consts::TAU * j as f64 / size as f64;
            let v = perlin.get([
                radius * a.cos(),
                radius * a.sin(),
                radius * b.cos(),
                radius * b.sin(),
            ]);
            data.push(((v * 0.5 + 0.5).clamp(0.0, 1.0) * 255.0).round() as u8);
        }
    }
    data
}

/// GPU resources for the simple mode.
pub struct SimpleWavePipeline {
    resolution: u32,
    patch_size: f32,
    params: SimpleWaveParams,
    uniforms: wgpu::Buffer,
    height: PingPong<(wgpu::Texture, wgpu::TextureView)>,
    accumulate_pipeline: wgpu::RenderPipeline,
    accumulate_bind_groups: [wgpu::BindGroup; 2],
    maps_pipeline: wgpu::RenderPipeline,
    maps_bind_groups: [wgpu::BindGroup; 2],
    displacement_view: wgpu::TextureView,
    normal_view: wgpu::TextureView,
}

impl SimpleWavePipeline {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        ocean: &OceanParams,
        params: SimpleWaveParams,
    ) -> Self {
        let n = ocean.resolution;

        // Noise tile, uploaded once and reused every frame
        let tile_data = tileable_noise_tile(ocean.noise_seed as u32, TILE_SIZE);
        let tile_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("noise-tile"),
            size: wgpu::Extent3d {
                width: TILE_SIZE,
                height: TILE_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::R8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &tile_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &tile_data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(TILE_SIZE),
                rows_per_image: Some(TILE_SIZE),
            },
            wgpu::Extent3d {
                width: TILE_SIZE,
                height: TILE_SIZE,
                depth_or_array_layers: 1,
            },
        );
        let tile_view = tile_texture.create_view(&wgpu::TextureViewDescriptor::default());
        let tile_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("noise-tile-sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let height_a = create_target_texture(device, "simple-height-a", n, n, wgpu::TextureFormat::R16Float);
        let height_b = create_target_texture(device, "simple-height-b", n, n, wgpu::TextureFormat::R16Float);
        let height = PingPong::new([height_a, height_b]);

        let (_displacement_texture, displacement_view) = create_target_texture(
            device,
            "simple-displacement-map",
            n,
            n,
            wgpu::TextureFormat::Rgba16Float,
        );
        let (_normal_texture, normal_view) =
            create_target_texture(device, "simple-normal-map", n, n, wgpu::TextureFormat::Rgba16Float);

        let uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("simple-uniforms"),
            contents: bytemuck::cast_slice(&[SimpleUniforms {
                time: 0.0,
                blend: params.blend,
                amplitude: params.amplitude_m,
                patch_size: ocean.patch_size_m,
                layer1_frequency: params.layer1_frequency,
                layer2_frequency: params.layer2_frequency,
                layer1_velocity: params.layer1_velocity.to_array(),
                layer2_velocity: params.layer2_velocity.to_array(),
                resolution: n,
                _pad: [0; 3],
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("simple-noise-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/simple_noise.wgsl").into()),
        });

        // Accumulation: uniform + previous height + tile + sampler
        let accumulate_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("simple-accumulate-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let accumulate_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("simple-accumulate-pipeline-layout"),
                bind_group_layouts: &[&accumulate_layout],
                push_constant_ranges: &[],
            });
        let accumulate_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("simple-accumulate-pipeline"),
            layout: Some(&accumulate_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_accumulate"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: wgpu::TextureFormat::R16Float,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // One bind group per ping-pong parity: read role i, write role 1-i
        let accumulate_bind_groups = [0usize, 1].map(|i| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("simple-accumulate-bind-group"),
                layout: &accumulate_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniforms.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&height.items()[i].1),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(&tile_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::Sampler(&tile_sampler),
                    },
                ],
            })
        });

        // Map derivation reads the buffer the accumulate pass just wrote
        let maps_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("simple-maps-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
            ],
        });
        let maps_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("simple-maps-pipeline-layout"),
            bind_group_layouts: &[&maps_layout],
            push_constant_ranges: &[],
        });
        let maps_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("simple-maps-pipeline"),
            layout: Some(&maps_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_maps"),
                targets: &[
                    Some(wgpu::ColorTargetState {
                        format: wgpu::TextureFormat::Rgba16Float,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    }),
                    Some(wgpu::ColorTargetState {
                        format: wgpu::TextureFormat::Rgba16Float,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    }),
                ],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // maps_bind_groups[i]: read role is i, so the fresh buffer is 1-i
        let maps_bind_groups = [0usize, 1].map(|i| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("simple-maps-bind-group"),
                layout: &maps_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniforms.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&height.items()[1 - i].1),
                    },
                ],
            })
        });

        log::info!("simple wave pipeline ready: {n}x{n}, tile {TILE_SIZE}x{TILE_SIZE}");

        Self {
            resolution: n,
            patch_size: ocean.patch_size_m,
            params,
            uniforms,
            height,
            accumulate_pipeline,
            accumulate_bind_groups,
            maps_pipeline,
            maps_bind_groups,
            displacement_view,
            normal_view,
        }
    }

    /// Record one frame: accumulate into the write buffer, derive maps
    /// from it, then swap roles.
    pub fn encode(&mut self, queue: &wgpu::Queue, encoder: &mut wgpu::CommandEncoder, time: f32) {
        queue.write_buffer(
            &self.uniforms,
            0,
            bytemuck::cast_slice(&[SimpleUniforms {
                time,
                blend: self.params.blend,
                amplitude: self.params.amplitude_m,
                patch_size: self.patch_size,
                layer1_frequency: self.params.layer1_frequency,
                layer2_frequency: self.params.layer2_frequency,
                layer1_velocity: self.params.layer1_velocity.to_array(),
                layer2_velocity: self.params.layer2_velocity.to_array(),
                resolution: self.resolution,
                _pad: [0; 3],
            }]),
        );

        let parity = self.height.read_index();

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("simple-accumulate-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.height.write().1,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.accumulate_pipeline);
            pass.set_bind_group(0, &self.accumulate_bind_groups[parity], &[]);
            pass.draw(0..3, 0..1);
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("simple-maps-pass"),
                color_attachments: &[
                    Some(wgpu::RenderPassColorAttachment {
                        view: &self.displacement_view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                    }),
                    Some(wgpu::RenderPassColorAttachment {
                        view: &self.normal_view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                            store: wgpu::StoreOp::Store,
                        },
                    }),
                ],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&self.maps_pipeline);
            pass.set_bind_group(0, &self.maps_bind_groups[parity], &[]);
            pass.draw(0..3, 0..1);
        }

        // Unconditional swap: this frame's write buffer is next frame's input
        self.height.swap();
    }

    pub fn displacement_view(&self) -> &wgpu::TextureView {
        &self.displacement_view
    }

    pub fn normal_view(&self) -> &wgpu::TextureView {
        &self.normal_view
    }

    /// Height buffer most recently written (the current read role).
    pub fn height_view(&self) -> &wgpu::TextureView {
        &self.height.read().1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_tile_is_seamless_and_deterministic() {
        let size = 32;
        let a = tileable_noise_tile(7, size);
        let b = tileable_noise_tile(7, size);
        assert_eq!(a, b);

        // Values adjacent across the wrap edge stay as close as interior
        // neighbors (torus sampling has no seam)
        let mut interior_max = 0i32;
        for j in 0..size {
            for i in 0..size - 1 {
                let d = (a[(j * size + i) as usize] as i32 - a[(j * size + i + 1) as usize] as i32)
                    .abs();
                interior_max = interior_max.max(d);
            }
        }
        for j in 0..size {
            let left = a[(j * size) as usize] as i32;
            let right = a[(j * size + size - 1) as usize] as i32;
            assert!(
                (left - right).abs() <= interior_max + 16,
                "seam at row {j}: {left} vs {right}"
            );
        }
    }
}
