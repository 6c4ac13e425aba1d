// renderer.rs — wgpu scene host: panorama sphere + marker billboards + egui.

use image::RgbaImage;
use wgpu::util::DeviceExt;
use winit::window::Window;

use crate::camera::OrbitCamera;
use crate::mesh::SphereMesh;
use crate::scene::HotspotMarker;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct SceneUniform {
    view_proj: [[f32; 4]; 4],
    cam_right: [f32; 4],
    cam_up: [f32; 4],
    sphere_opacity: f32,
    pad: [f32; 3],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct SphereVertex {
    position: [f32; 3],
    uv: [f32; 2],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct MarkerInstance {
    position: [f32; 3],
    scale: f32,
}

pub struct Renderer {
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pub size: winit::dpi::PhysicalSize<u32>,

    sphere_pipeline: wgpu::RenderPipeline,
    marker_pipeline: wgpu::RenderPipeline,

    scene_uniform: SceneUniform,
    scene_buffer: wgpu::Buffer,
    scene_bind_group: wgpu::BindGroup,

    texture_bind_group_layout: wgpu::BindGroupLayout,
    pano_bind_group: wgpu::BindGroup,
    pano_texture: wgpu::Texture,
    icon_bind_group: wgpu::BindGroup,
    sampler: wgpu::Sampler,

    sphere_vertices: wgpu::Buffer,
    sphere_indices: wgpu::Buffer,
    sphere_index_count: u32,

    marker_instances: wgpu::Buffer,
    marker_capacity: u32,
    marker_count: u32,

    // UI
    pub egui_ctx: egui::Context,
    pub egui_state: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Renderer {
    pub async fn new(window: std::sync::Arc<Window>, mesh: &SphereMesh, icon: &RgbaImage) -> Self {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = unsafe { instance.create_surface(window.as_ref()) }.unwrap();
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .unwrap();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    features: wgpu::Features::empty(),
                    limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    label: None,
                },
                None,
            )
            .await
            .unwrap();

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(surface_caps.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo, // VSync on
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
        };
        surface.configure(&device, &config);

        // --- Textures: checkerboard placeholder until the first panorama
        // decodes, plus the shared marker icon. ---
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::Repeat, // panoramas wrap horizontally
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let texture_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            multisampled: false,
                            view_dimension: wgpu::TextureViewDimension::D2,
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
                label: Some("texture_bind_group_layout"),
            });

        let pano_texture = create_rgba_texture(&device, &queue, &placeholder_image(), "panorama_texture");
        let pano_bind_group = create_texture_bind_group(
            &device,
            &texture_bind_group_layout,
            &pano_texture,
            &sampler,
            "pano_bind_group",
        );

        let icon_texture = create_rgba_texture(&device, &queue, icon, "marker_icon_texture");
        let icon_bind_group = create_texture_bind_group(
            &device,
            &texture_bind_group_layout,
            &icon_texture,
            &sampler,
            "icon_bind_group",
        );

        // --- Scene uniform ---
        let scene_uniform = SceneUniform {
            view_proj: glam::Mat4::IDENTITY.to_cols_array_2d(),
            cam_right: [1.0, 0.0, 0.0, 0.0],
            cam_up: [0.0, 1.0, 0.0, 0.0],
            sphere_opacity: 1.0,
            pad: [0.0; 3],
        };

        let scene_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Scene Uniform Buffer"),
            contents: bytemuck::cast_slice(&[scene_uniform]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let scene_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
                label: Some("scene_bind_group_layout"),
            });

        let scene_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            layout: &scene_bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_buffer.as_entire_binding(),
            }],
            label: Some("scene_bind_group"),
        });

        // --- Geometry ---
        let vertices: Vec<SphereVertex> = mesh
            .positions
            .iter()
            .zip(&mesh.uvs)
            .map(|(&position, &uv)| SphereVertex { position, uv })
            .collect();

        let sphere_vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sphere Vertex Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let sphere_indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sphere Index Buffer"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let marker_capacity = 16u32;
        let marker_instances = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Marker Instance Buffer"),
            size: (marker_capacity as usize * std::mem::size_of::<MarkerInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // --- Pipelines ---
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Render Pipeline Layout"),
            bind_group_layouts: &[&scene_bind_group_layout, &texture_bind_group_layout],
            push_constant_ranges: &[],
        });

        let sphere_shader = device.create_shader_module(wgpu::include_wgsl!("shader_sphere.wgsl"));
        let sphere_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Sphere Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &sphere_shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<SphereVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &sphere_shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None, // double-sided: we view the sphere from inside
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        let marker_shader = device.create_shader_module(wgpu::include_wgsl!("shader_marker.wgsl"));
        let marker_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Marker Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &marker_shader,
                entry_point: "vs_main",
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<MarkerInstance>() as u64,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32],
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &marker_shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: config.format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        // --- Egui ---
        let egui_ctx = egui::Context::default();
        let mut egui_state = egui_winit::State::new(window.as_ref());
        egui_state.set_pixels_per_point(window.scale_factor() as f32);
        let egui_renderer = egui_wgpu::Renderer::new(&device, config.format, None, 1);

        Self {
            surface,
            device,
            queue,
            config,
            size,
            sphere_pipeline,
            marker_pipeline,
            scene_uniform,
            scene_buffer,
            scene_bind_group,
            texture_bind_group_layout,
            pano_bind_group,
            pano_texture,
            icon_bind_group,
            sampler,
            sphere_vertices,
            sphere_indices,
            sphere_index_count: mesh.indices.len() as u32,
            marker_instances,
            marker_capacity,
            marker_count: 0,
            egui_ctx,
            egui_state,
            egui_renderer,
        }
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
        }
    }

    /// Pushes camera matrices, sphere opacity and marker instances for
    /// this frame.
    pub fn update_scene(&mut self, camera: &OrbitCamera, opacity: f32, markers: &[HotspotMarker]) {
        let (right, up) = camera.basis();
        self.scene_uniform.view_proj = camera.view_proj().to_cols_array_2d();
        self.scene_uniform.cam_right = [right.x, right.y, right.z, 0.0];
        self.scene_uniform.cam_up = [up.x, up.y, up.z, 0.0];
        self.scene_uniform.sphere_opacity = opacity;
        self.queue
            .write_buffer(&self.scene_buffer, 0, bytemuck::cast_slice(&[self.scene_uniform]));

        let instances: Vec<MarkerInstance> = markers
            .iter()
            .map(|m| MarkerInstance {
                position: m.position.to_array(),
                scale: m.scale,
            })
            .collect();

        if instances.len() as u32 > self.marker_capacity {
            self.marker_capacity = (instances.len() as u32).next_power_of_two();
            self.marker_instances = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Marker Instance Buffer"),
                size: (self.marker_capacity as usize * std::mem::size_of::<MarkerInstance>())
                    as u64,
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
        }
        if !instances.is_empty() {
            self.queue
                .write_buffer(&self.marker_instances, 0, bytemuck::cast_slice(&instances));
        }
        self.marker_count = instances.len() as u32;
    }

    /// Replaces the panorama texture with a freshly decoded image,
    /// downscaling if it exceeds the device texture limit.
    pub fn load_panorama(&mut self, img: RgbaImage) {
        let max_dim = self.device.limits().max_texture_dimension_2d;
        let (src_w, src_h) = img.dimensions();

        let img = if src_w > max_dim || src_h > max_dim {
            let scale = (max_dim as f32 / src_w.max(src_h) as f32).min(1.0);
            let new_w = (src_w as f32 * scale) as u32;
            let new_h = (src_h as f32 * scale) as u32;
            log::warn!(
                "panorama {src_w}x{src_h} exceeds device limit {max_dim}, \
                 downscaling to {new_w}x{new_h}"
            );
            image::DynamicImage::ImageRgba8(img)
                .resize(new_w, new_h, image::imageops::FilterType::Lanczos3)
                .to_rgba8()
        } else {
            img
        };

        self.pano_texture = create_rgba_texture(&self.device, &self.queue, &img, "panorama_texture");
        self.pano_bind_group = create_texture_bind_group(
            &self.device,
            &self.texture_bind_group_layout,
            &self.pano_texture,
            &self.sampler,
            "pano_bind_group",
        );
    }

    pub fn render_with_ui(
        &mut self,
        window: &Window,
        run_ui: impl FnOnce(&egui::Context),
    ) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        // 1. Scene: sphere, then markers on top.
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.02,
                            g: 0.02,
                            b: 0.02,
                            a: 1.0,
                        }),
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });

            render_pass.set_pipeline(&self.sphere_pipeline);
            render_pass.set_bind_group(0, &self.scene_bind_group, &[]);
            render_pass.set_bind_group(1, &self.pano_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.sphere_vertices.slice(..));
            render_pass.set_index_buffer(self.sphere_indices.slice(..), wgpu::IndexFormat::Uint32);
            render_pass.draw_indexed(0..self.sphere_index_count, 0, 0..1);

            if self.marker_count > 0 {
                render_pass.set_pipeline(&self.marker_pipeline);
                render_pass.set_bind_group(1, &self.icon_bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.marker_instances.slice(..));
                render_pass.draw(0..4, 0..self.marker_count);
            }
        }

        // 2. UI overlay.
        let raw_input = self.egui_state.take_egui_input(window);
        let full_output = self.egui_ctx.run(raw_input, run_ui);

        self.egui_state
            .handle_platform_output(window, &self.egui_ctx, full_output.platform_output);
        let clipped_primitives = self.egui_ctx.tessellate(full_output.shapes);

        let screen_descriptor = egui_wgpu::renderer::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: window.scale_factor() as f32,
        };

        for (id, delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, delta);
        }

        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &clipped_primitives,
            &screen_descriptor,
        );

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Egui Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: true,
                    },
                })],
                depth_stencil_attachment: None,
            });
            self.egui_renderer
                .render(&mut render_pass, &clipped_primitives, &screen_descriptor);
        }

        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

/// 2x2 checkerboard shown until the first panorama decodes.
fn placeholder_image() -> RgbaImage {
    let mut img = RgbaImage::new(2, 2);
    img.put_pixel(0, 0, image::Rgba([60, 60, 60, 255]));
    img.put_pixel(1, 0, image::Rgba([140, 140, 140, 255]));
    img.put_pixel(0, 1, image::Rgba([140, 140, 140, 255]));
    img.put_pixel(1, 1, image::Rgba([60, 60, 60, 255]));
    img
}

fn create_rgba_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    img: &RgbaImage,
    label: &str,
) -> wgpu::Texture {
    let (width, height) = img.dimensions();
    let texture_size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        size: texture_size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        label: Some(label),
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        img,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        texture_size,
    );

    texture
}

fn create_texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture: &wgpu::Texture,
    sampler: &wgpu::Sampler,
    label: &str,
) -> wgpu::BindGroup {
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
        label: Some(label),
    })
}
