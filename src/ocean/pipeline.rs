//! GPU resources and pass recording for the spectral wave pipeline.
//!
//! Every texture, pipeline, and bind group is allocated once at
//! construction. Per frame the orchestrator records, in order: the time
//! evolution pass, 2·log2(N) FFT butterfly passes, and the surface-map
//! pass. All stages are fullscreen-triangle render passes writing to
//! float render targets; no stage ever reads the texture it is writing.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::ocean::butterfly::{butterfly_table, FftDirection};
use crate::ocean::spectrum;
use crate::params::OceanParams;

/// Pair of same-format buffers alternating between read and write roles.
///
/// Roles swap unconditionally; after an even number of swaps the read
/// slot refers to the buffer it started on.
pub struct PingPong<T> {
    items: [T; 2],
    read_index: usize,
}

impl<T> PingPong<T> {
    pub fn new(items: [T; 2]) -> Self {
        Self {
            items,
            read_index: 0,
        }
    }

    /// Buffer holding the previous iteration's result.
    pub fn read(&self) -> &T {
        &self.items[self.read_index]
    }

    /// Buffer the current iteration writes into.
    pub fn write(&self) -> &T {
        &self.items[1 - self.read_index]
    }

    pub fn read_index(&self) -> usize {
        self.read_index
    }

    /// Both buffers in fixed slot order, independent of current roles.
    pub fn items(&self) -> &[T; 2] {
        &self.items
    }

    /// Exchange roles after a completed pass.
    pub fn swap(&mut self) {
        self.read_index = 1 - self.read_index;
    }
}

/// Create an N×M float texture usable as render target, shader input,
/// upload destination, and readback source.
pub fn create_target_texture(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// Record one fullscreen pass writing `targets`.
fn encode_fullscreen_pass(
    encoder: &mut wgpu::CommandEncoder,
    label: &str,
    targets: &[&wgpu::TextureView],
    pipeline: &wgpu::RenderPipeline,
    bind_group: &wgpu::BindGroup,
) {
    let attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = targets
        .iter()
        .map(|view| {
            Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })
        })
        .collect();

    let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &attachments,
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    });
    pass.set_pipeline(pipeline);
    pass.set_bind_group(0, bind_group, &[]);
    pass.draw(0..3, 0..1);
}

/// Bind group layout entry for a non-filterable float texture read with
/// `textureLoad`.
fn texel_fetch_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Build a fullscreen-pass render pipeline with the given fragment entry
/// point and color target formats.
fn create_pass_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    shader: &wgpu::ShaderModule,
    fs_entry: &str,
    formats: &[wgpu::TextureFormat],
) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[layout],
        push_constant_ranges: &[],
    });

    let targets: Vec<Option<wgpu::ColorTargetState>> = formats
        .iter()
        .map(|&format| {
            Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })
        })
        .collect();

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fs_entry),
            targets: &targets,
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
    })
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct FftUniforms {
    stage: u32,
    axis: u32,
    _pad: [u32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct EvolveUniforms {
    resolution: u32,
    patch_size: f32,
    gravity: f32,
    time: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct MapUniforms {
    resolution: u32,
    patch_size: f32,
    amplitude: f32,
    choppiness: f32,
    inv_norm: f32,
    _pad: [f32; 3],
}

struct FftPass {
    bind_group: wgpu::BindGroup,
    writes_ping: bool,
}

/// 2D FFT over an N×N complex field, executed as 2·log2(N) butterfly
/// render passes (horizontal stages, then vertical) over a ping-pong
/// texture pair, driven by a precomputed butterfly lookup texture.
///
/// Write the frequency field into [`input_view`](Self::input_view) (or
/// upload with [`upload_input`](Self::upload_input)); after
/// [`encode`](Self::encode) the transformed field sits in
/// [`output_view`](Self::output_view). Output is unnormalized; the
/// inverse direction owes a 1/N² factor downstream.
pub struct FftKernel {
    resolution: u32,
    input_texture: wgpu::Texture,
    input_view: wgpu::TextureView,
    ping_view: wgpu::TextureView,
    pong_texture: wgpu::Texture,
    pong_view: wgpu::TextureView,
    butterfly_view: wgpu::TextureView,
    pipeline: wgpu::RenderPipeline,
    passes: Vec<FftPass>,
}

impl FftKernel {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, n: u32, direction: FftDirection) -> Self {
        assert!(n.is_power_of_two() && n >= 4);
        let stages = n.trailing_zeros();

        let (input_texture, input_view) =
            create_target_texture(device, "fft-input", n, n, wgpu::TextureFormat::Rg32Float);
        // The view keeps the underlying texture alive
        let (_ping_texture, ping_view) =
            create_target_texture(device, "fft-ping", n, n, wgpu::TextureFormat::Rg32Float);
        let (pong_texture, pong_view) =
            create_target_texture(device, "fft-pong", n, n, wgpu::TextureFormat::Rg32Float);

        // Butterfly lookup: one row per stage, one texel per output index
        let table = butterfly_table(n, direction);
        let (butterfly_texture, butterfly_view) = create_target_texture(
            device,
            "fft-butterfly",
            n,
            stages,
            wgpu::TextureFormat::Rgba32Float,
        );
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &butterfly_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(&table),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(n * 16),
                rows_per_image: Some(stages),
            },
            wgpu::Extent3d {
                width: n,
                height: stages,
                depth_or_array_layers: 1,
            },
        );

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("fft-bind-group-layout"),
            entries: &[uniform_entry(0), texel_fetch_entry(1), texel_fetch_entry(2)],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("fft-pass-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/fft_pass.wgsl").into()),
        });

        let pipeline = create_pass_pipeline(
            device,
            "fft-pass-pipeline",
            &bind_group_layout,
            &shader,
            "fs_main",
            &[wgpu::TextureFormat::Rg32Float],
        );

        // One bind group per pass, all allocated up front. Pass 0 reads
        // the dedicated input texture, after that ping and pong
        // alternate; a pass never reads its own render target.
        let total = 2 * stages;
        let mut passes = Vec::with_capacity(total as usize);
        for p in 0..total {
            let (stage, axis) = if p < stages { (p, 0) } else { (p - stages, 1) };
            let uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("fft-pass-uniforms"),
                contents: bytemuck::cast_slice(&[FftUniforms {
                    stage,
                    axis,
                    _pad: [0; 2],
                }]),
                usage: wgpu::BufferUsages::UNIFORM,
            });

            let writes_ping = p % 2 == 0;
            let source = if p == 0 {
                &input_view
            } else if writes_ping {
                &pong_view
            } else {
                &ping_view
            };

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("fft-pass-bind-group"),
                layout: &bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniforms.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(source),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::TextureView(&butterfly_view),
                    },
                ],
            });

            passes.push(FftPass {
                bind_group,
                writes_ping,
            });
        }

        log::info!(
            "FFT kernel ready: {n}x{n}, {} stages per axis, {:?}",
            stages,
            direction
        );

        Self {
            resolution: n,
            input_texture,
            input_view,
            ping_view,
            pong_texture,
            pong_view,
            butterfly_view,
            pipeline,
            passes,
        }
    }

    /// View the evolve stage (or a test) renders the frequency field into.
    pub fn input_view(&self) -> &wgpu::TextureView {
        &self.input_view
    }

    pub fn input_texture(&self) -> &wgpu::Texture {
        &self.input_texture
    }

    /// Spatial-domain result after `encode` (unnormalized).
    pub fn output_view(&self) -> &wgpu::TextureView {
        // 2·stages passes, the last one (odd index) writes pong
        &self.pong_view
    }

    pub fn output_texture(&self) -> &wgpu::Texture {
        &self.pong_texture
    }

    pub fn intermediate_view(&self) -> &wgpu::TextureView {
        &self.ping_view
    }

    pub fn butterfly_view(&self) -> &wgpu::TextureView {
        &self.butterfly_view
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Upload a complex field directly into the input texture.
    pub fn upload_input(&self, queue: &wgpu::Queue, field: &[[f32; 2]]) {
        let n = self.resolution;
        assert_eq!(field.len(), (n * n) as usize);
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.input_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(field),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(n * 8),
                rows_per_image: Some(n),
            },
            wgpu::Extent3d {
                width: n,
                height: n,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Record all butterfly passes for one transform.
    pub fn encode(&self, encoder: &mut wgpu::CommandEncoder) {
        for pass in &self.passes {
            let target = if pass.writes_ping {
                &self.ping_view
            } else {
                &self.pong_view
            };
            encode_fullscreen_pass(encoder, "fft-stage", &[target], &self.pipeline, &pass.bind_group);
        }
    }
}

/// Full spectral path: Phillips/noise/h0 tables, time evolution, inverse
/// FFT, and the displacement/normal map builder.
pub struct WavePipeline {
    params: OceanParams,
    phillips_texture: wgpu::Texture,
    phillips_view: wgpu::TextureView,
    noise_texture: wgpu::Texture,
    noise_view: wgpu::TextureView,
    h0_texture: wgpu::Texture,
    h0_view: wgpu::TextureView,
    evolve_uniforms: wgpu::Buffer,
    evolve_bind_group: wgpu::BindGroup,
    evolve_pipeline: wgpu::RenderPipeline,
    fft: FftKernel,
    maps_bind_group: wgpu::BindGroup,
    maps_pipeline: wgpu::RenderPipeline,
    displacement_texture: wgpu::Texture,
    displacement_view: wgpu::TextureView,
    normal_texture: wgpu::Texture,
    normal_view: wgpu::TextureView,
}

impl WavePipeline {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, params: &OceanParams) -> Self {
        let n = params.resolution;

        let (phillips_texture, phillips_view) =
            create_target_texture(device, "phillips-spectrum", n, n, wgpu::TextureFormat::R32Float);
        let (noise_texture, noise_view) =
            create_target_texture(device, "gaussian-noise", n, n, wgpu::TextureFormat::Rg32Float);
        let (h0_texture, h0_view) =
            create_target_texture(device, "initial-spectrum", n, n, wgpu::TextureFormat::Rg32Float);

        let fft = FftKernel::new(device, queue, n, FftDirection::Inverse);

        let (displacement_texture, displacement_view) = create_target_texture(
            device,
            "displacement-map",
            n,
            n,
            wgpu::TextureFormat::Rgba16Float,
        );
        let (normal_texture, normal_view) =
            create_target_texture(device, "normal-map", n, n, wgpu::TextureFormat::Rgba16Float);

        // Time evolution pass
        let evolve_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("evolve-bind-group-layout"),
            entries: &[uniform_entry(0), texel_fetch_entry(1)],
        });
        let evolve_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("evolve-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/evolve.wgsl").into()),
        });
        let evolve_pipeline = create_pass_pipeline(
            device,
            "evolve-pipeline",
            &evolve_layout,
            &evolve_shader,
            "fs_main",
            &[wgpu::TextureFormat::Rg32Float],
        );
        let evolve_uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("evolve-uniforms"),
            contents: bytemuck::cast_slice(&[EvolveUniforms {
                resolution: n,
                patch_size: params.patch_size_m,
                gravity: params.gravity_m_per_s2,
                time: 0.0,
            }]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let evolve_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("evolve-bind-group"),
            layout: &evolve_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: evolve_uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&h0_view),
                },
            ],
        });

        // Surface map pass (displacement + normal, one MRT pass)
        let maps_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("surface-maps-bind-group-layout"),
            entries: &[uniform_entry(0), texel_fetch_entry(1)],
        });
        let maps_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("surface-maps-shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../shaders/surface_maps.wgsl").into()),
        });
        let maps_pipeline = create_pass_pipeline(
            device,
            "surface-maps-pipeline",
            &maps_layout,
            &maps_shader,
            "fs_main",
            &[
                wgpu::TextureFormat::Rgba16Float,
                wgpu::TextureFormat::Rgba16Float,
            ],
        );
        let maps_uniforms = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("surface-maps-uniforms"),
            contents: bytemuck::cast_slice(&[MapUniforms {
                resolution: n,
                patch_size: params.patch_size_m,
                amplitude: params.amplitude_m,
                choppiness: params.choppiness,
                inv_norm: 1.0 / (n as f32 * n as f32),
                _pad: [0.0; 3],
            }]),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let maps_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("surface-maps-bind-group"),
            layout: &maps_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: maps_uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(fft.output_view()),
                },
            ],
        });

        let pipeline = Self {
            params: params.clone(),
            phillips_texture,
            phillips_view,
            noise_texture,
            noise_view,
            h0_texture,
            h0_view,
            evolve_uniforms,
            evolve_bind_group,
            evolve_pipeline,
            fft,
            maps_bind_group,
            maps_pipeline,
            displacement_texture,
            displacement_view,
            normal_texture,
            normal_view,
        };
        pipeline.upload_wind_tables(queue);
        log::info!(
            "spectral wave pipeline ready: {n}x{n}, patch {:.0} m, wind {:.1} m/s",
            params.patch_size_m,
            params.wind_speed_m_per_s
        );
        pipeline
    }

    /// Recompute the CPU-side tables (Phillips, noise, h0) from the
    /// current parameters and upload them into the existing allocations.
    fn upload_wind_tables(&self, queue: &wgpu::Queue) {
        let n = self.params.resolution;
        let phillips = spectrum::phillips_table(&self.params);
        let noise = spectrum::gaussian_noise_table(self.params.noise_seed, n);
        let h0 = spectrum::initial_spectrum(&phillips, &noise);

        let extent = wgpu::Extent3d {
            width: n,
            height: n,
            depth_or_array_layers: 1,
        };
        let write = |texture: &wgpu::Texture, data: &[u8], bytes_per_pixel: u32| {
            queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                data,
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(n * bytes_per_pixel),
                    rows_per_image: Some(n),
                },
                extent,
            );
        };

        write(&self.phillips_texture, bytemuck::cast_slice(&phillips), 4);
        write(&self.noise_texture, bytemuck::cast_slice(&noise), 8);
        write(&self.h0_texture, bytemuck::cast_slice(&h0), 8);
    }

    /// Update wind parameters and rebuild the frequency-domain tables.
    /// The downstream stages read the fresh h0 on the next frame.
    pub fn set_wind(&mut self, queue: &wgpu::Queue, wind_speed: f32, wind_direction: glam::Vec2) {
        self.params.wind_speed_m_per_s = wind_speed;
        self.params.wind_direction = wind_direction.normalize();
        self.upload_wind_tables(queue);
        log::info!(
            "wind changed: {:.1} m/s toward ({:.2}, {:.2})",
            wind_speed,
            self.params.wind_direction.x,
            self.params.wind_direction.y
        );
    }

    /// Upload a caller-supplied initial spectrum instead of the
    /// Phillips-derived one (debug and test harness hook).
    pub fn upload_initial_spectrum(&self, queue: &wgpu::Queue, h0: &[[f32; 2]]) {
        let n = self.params.resolution;
        assert_eq!(h0.len(), (n * n) as usize);
        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.h0_texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(h0),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(n * 8),
                rows_per_image: Some(n),
            },
            wgpu::Extent3d {
                width: n,
                height: n,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Record the whole frame: evolve → FFT → surface maps.
    pub fn encode(&self, queue: &wgpu::Queue, encoder: &mut wgpu::CommandEncoder, time: f32) {
        queue.write_buffer(
            &self.evolve_uniforms,
            0,
            bytemuck::cast_slice(&[EvolveUniforms {
                resolution: self.params.resolution,
                patch_size: self.params.patch_size_m,
                gravity: self.params.gravity_m_per_s2,
                time,
            }]),
        );

        encode_fullscreen_pass(
            encoder,
            "evolve-pass",
            &[self.fft.input_view()],
            &self.evolve_pipeline,
            &self.evolve_bind_group,
        );

        self.fft.encode(encoder);

        encode_fullscreen_pass(
            encoder,
            "surface-maps-pass",
            &[&self.displacement_view, &self.normal_view],
            &self.maps_pipeline,
            &self.maps_bind_group,
        );
    }

    pub fn displacement_view(&self) -> &wgpu::TextureView {
        &self.displacement_view
    }

    pub fn normal_view(&self) -> &wgpu::TextureView {
        &self.normal_view
    }

    pub fn displacement_texture(&self) -> &wgpu::Texture {
        &self.displacement_texture
    }

    pub fn phillips_view(&self) -> &wgpu::TextureView {
        &self.phillips_view
    }

    pub fn noise_view(&self) -> &wgpu::TextureView {
        &self.noise_view
    }

    pub fn h0_view(&self) -> &wgpu::TextureView {
        &self.h0_view
    }

    pub fn fft(&self) -> &FftKernel {
        &self.fft
    }

    pub fn params(&self) -> &OceanParams {
        &self.params
    }
}

/// Blocking readback of a texture's raw bytes (debug and tests; stalls
/// the queue, never used on the frame path).
pub fn read_texture_raw(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    width: u32,
    height: u32,
    bytes_per_pixel: u32,
) -> Vec<u8> {
    let unpadded_bytes_per_row = width * bytes_per_pixel;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let padded_bytes_per_row = (unpadded_bytes_per_row + align - 1) / align * align;

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("texture-readback"),
        size: (padded_bytes_per_row * height) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("readback-encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &buffer,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    slice.map_async(wgpu::MapMode::Read, |_| {});
    device.poll(wgpu::Maintain::Wait);

    let data = slice.get_mapped_range();
    let mut out = vec![0u8; (unpadded_bytes_per_row * height) as usize];
    for y in 0..height {
        let src = (y * padded_bytes_per_row) as usize;
        let dst = (y * unpadded_bytes_per_row) as usize;
        out[dst..dst + unpadded_bytes_per_row as usize]
            .copy_from_slice(&data[src..src + unpadded_bytes_per_row as usize]);
    }
    drop(data);
    buffer.unmap();
    out
}

/// Decode one IEEE half-float (the Rgba16Float map texels) to f32.
pub fn f16_bits_to_f32(bits: u16) -> f32 {
    let sign = ((bits >> 15) & 1) as u32;
    let exp = ((bits >> 10) & 0x1f) as u32;
    let frac = (bits & 0x3ff) as u32;

    let out = match (exp, frac) {
        (0, 0) => sign << 31,
        (0, _) => {
            // Subnormal: renormalize into the f32 exponent range
            let mut exp = 127 - 15 + 1;
            let mut frac = frac;
            while frac & 0x400 == 0 {
                frac <<= 1;
                exp -= 1;
            }
            (sign << 31) | ((exp as u32) << 23) | ((frac & 0x3ff) << 13)
        }
        (0x1f, 0) => (sign << 31) | 0x7f80_0000,
        (0x1f, _) => (sign << 31) | 0x7fc0_0000,
        _ => (sign << 31) | ((exp + 127 - 15) << 23) | (frac << 13),
    };
    f32::from_bits(out)
}

/// Readback of a 32-bit float texture as a flat `Vec<f32>`.
pub fn read_texture_f32(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    width: u32,
    height: u32,
    components: u32,
) -> Vec<f32> {
    let raw = read_texture_raw(device, queue, texture, width, height, components * 4);
    raw.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f16_decode() {
        assert_eq!(f16_bits_to_f32(0x0000), 0.0);
        assert_eq!(f16_bits_to_f32(0x3c00), 1.0);
        assert_eq!(f16_bits_to_f32(0xc000), -2.0);
        assert_eq!(f16_bits_to_f32(0x3800), 0.5);
        assert_eq!(f16_bits_to_f32(0x7bff), 65504.0);
        // Smallest subnormal
        assert_eq!(f16_bits_to_f32(0x0001), 5.960_464_5e-8);
    }

    #[test]
    fn test_ping_pong_roles_swap() {
        let mut pair = PingPong::new(["a", "b"]);
        assert_eq!(*pair.read(), "a");
        assert_eq!(*pair.write(), "b");

        pair.swap();
        assert_eq!(*pair.read(), "b");
        assert_eq!(*pair.write(), "a");
    }

    #[test]
    fn test_ping_pong_even_swaps_restore_roles() {
        let mut pair = PingPong::new([0, 1]);
        let initial = *pair.read();

        for _ in 0..6 {
            pair.swap();
        }
        assert_eq!(*pair.read(), initial);
        assert_eq!(pair.read_index(), 0);

        pair.swap();
        assert_ne!(*pair.read(), initial);
    }
}
