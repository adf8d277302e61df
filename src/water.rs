//! WebGL2 water surface.
//!
//! This module contains the WebGL2 rendering of the water surface, the falling
//! drops and the excitation source, using the render engine contained in
//! [`crate::render`]. The [`Water`] object owns the [`Simulation`] and the
//! [`ReflectionCompositor`], and sequences each frame.
//!
//! The water surface is drawn by two render objects that share the same
//! geometry, each sampling one of the two reflection targets. Only the object
//! sampling the target that holds the latest completed reflection is enabled
//! in each frame. A third object, which does not sample reflections, is used
//! when reflections are disabled.

use crate::camera::{Camera, Projection};
use crate::config::WaterConfig;
use crate::reflection::{
    OffscreenTargets, ReflectionCompositor, ReflectionMode, TargetIndex,
};
use crate::render::{
    texture_formats::Rgba, DrawMode, Framebuffer, ProgramSource, RenderEngine, RenderObject,
    Texture, TextureMagFilter, TextureMinFilter, TextureParameter, TextureWrap, Uniform,
    UniformValue,
};
use crate::simulation::Simulation;
use glam::{Mat4, Vec2, Vec3};
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::{
    Performance, WebGlBuffer, WebGlProgram, WebGlRenderbuffer, WebGlTexture,
    WebGlVertexArrayObject,
};

/// Water surface.
///
/// This object is used to create and add the water scene to a
/// [`RenderEngine`] and to update it on each frame.
pub struct Water {
    simulation: Simulation,
    compositor: ReflectionCompositor,
    reflection: Option<ReflectionTargets>,
    camera: Camera,
    projection: Projection,
    uniforms: Uniforms,
    buffers: Buffers,
    switches: Switches,
    distortion: Rc<WebGlTexture>,
    drop_positions: Vec<f32>,
    start_time: f64,
}

struct Uniforms {
    view: Rc<Uniform<Mat4>>,
    projection: Rc<Uniform<Mat4>>,
    reflection_view_projection: Rc<Uniform<Mat4>>,
    eye: Rc<Uniform<Vec3>>,
    water_height: Rc<Uniform<f32>>,
    world_radius: Rc<Uniform<f32>>,
    glow_position: Rc<Uniform<Vec2>>,
    glow_intensity: Rc<Uniform<f32>>,
    source_base: Rc<Uniform<Vec2>>,
    source_span: Rc<Uniform<Vec2>>,
    source_rotation: Rc<Uniform<f32>>,
}

struct Buffers {
    heights: Rc<WebGlBuffer>,
    normals: Rc<WebGlBuffer>,
    drops: Rc<WebGlBuffer>,
}

// Enable flags of the render objects that change from frame to frame.
struct Switches {
    surfaces: [Rc<Cell<bool>>; 2],
    plain_surface: Rc<Cell<bool>>,
    num_drops: Rc<Cell<u32>>,
}

// Two offscreen color targets sharing one depth renderbuffer.
struct ReflectionTargets {
    textures: [Rc<WebGlTexture>; 2],
    framebuffers: [Framebuffer; 2],
    depth: Rc<WebGlRenderbuffer>,
}

// Offscreen targets bound through the render engine.
struct EngineTargets<'a> {
    engine: &'a mut RenderEngine,
    targets: &'a ReflectionTargets,
}

impl Water {
    const MAX_DROPS: usize = 64;
    const BLADE_LENGTH: f32 = 1.5;
    const CLEAR_COLOR: [f32; 4] = [0.01, 0.015, 0.025, 1.0];

    /// Creates a new water surface, adding it to the [`RenderEngine`].
    ///
    /// The `seed` is used for the random elements of the simulation. The
    /// `performance` parameter should contain a performance object obtained
    /// with [`web_sys::Window::performance`]. It gives the time origin of the
    /// simulation.
    ///
    /// If the reflection targets cannot be allocated, the water is created with
    /// reflections disabled.
    pub fn new(
        engine: &mut RenderEngine,
        config: &WaterConfig,
        seed: u64,
        performance: &Performance,
    ) -> Result<Water, JsValue> {
        let simulation = Simulation::new(config, seed)?;
        let mut compositor = ReflectionCompositor::new(config.reflection, config.water_height);
        let mut projection = config.projection;
        let (width, height) = engine.canvas_dims().device_pixels();
        projection.set_viewport(width, height);

        let reflection = match compositor.mode() {
            ReflectionMode::Enabled => match ReflectionTargets::new(engine, width, height) {
                Ok(targets) => Some(targets),
                Err(err) => {
                    tracing::warn!(
                        error = ?err,
                        "unable to allocate reflection targets; rendering without reflections"
                    );
                    compositor.disable();
                    None
                }
            },
            ReflectionMode::Disabled => None,
        };

        let n = simulation.field().grid_size();
        let distortion = Self::distortion_texture(engine)?;
        engine.texture_image::<Rgba>(&distortion, simulation.distortion_map(), n, n)?;

        let uniforms = Uniforms::new(config);
        let (source_object, drops_object, drops_buffer, num_drops) =
            Self::scene_objects(engine, &uniforms)?;
        let surface_program = Self::surface_program(engine)?;
        let (surface_vao, heights, normals) =
            Self::surface_vao(engine, &surface_program, &simulation)?;
        let num_indices = 6 * (n - 1) * (n - 1);
        let surface = |reflection: Option<&Rc<WebGlTexture>>| {
            let (strength, reflection) = match reflection {
                Some(texture) => (1.0, texture),
                // sampled with a weight of zero
                None => (0.0, &distortion),
            };
            RenderObject {
                enabled: Rc::new(Cell::new(false)),
                reflected: false,
                program: Rc::clone(&surface_program),
                vao: Rc::clone(&surface_vao),
                draw_mode: DrawMode::Triangles,
                draw_num_indices: Rc::new(Cell::new(num_indices as u32)),
                draw_offset_elements: Rc::new(Cell::new(0)),
                uniforms: uniforms.surface_uniforms(strength),
                textures: Box::new([
                    Texture::new(String::from("uDistortion"), Rc::clone(&distortion)),
                    Texture::new(String::from("uReflection"), Rc::clone(reflection)),
                ]),
            }
        };
        let plain_surface = surface(None);
        let surfaces = match &reflection {
            Some(targets) => [
                surface(Some(&targets.textures[0])),
                surface(Some(&targets.textures[1])),
            ],
            None => [surface(None), surface(None)],
        };

        let switches = Switches {
            surfaces: [
                Rc::clone(&surfaces[0].enabled),
                Rc::clone(&surfaces[1].enabled),
            ],
            plain_surface: Rc::clone(&plain_surface.enabled),
            num_drops,
        };
        // The water is transparent, so it is drawn last.
        engine.set_clear_color(Self::CLEAR_COLOR);
        engine.add_object(source_object);
        engine.add_object(drops_object);
        let [first, second] = surfaces;
        engine.add_object(first);
        engine.add_object(second);
        engine.add_object(plain_surface);

        let water = Water {
            simulation,
            compositor,
            reflection,
            camera: config.camera,
            projection,
            uniforms,
            buffers: Buffers {
                heights,
                normals,
                drops: drops_buffer,
            },
            switches,
            distortion,
            drop_positions: Vec::with_capacity(3 * Self::MAX_DROPS),
            start_time: performance.now(),
        };
        water.select_surface();
        tracing::debug!(
            grid_size = n,
            reflections = ?water.compositor.mode(),
            "water surface created"
        );
        Ok(water)
    }

    /// Updates the water for rendering.
    ///
    /// This function must be called before each call to
    /// [`RenderEngine::render`]. It advances the simulation by one tick,
    /// uploads the new heights, normals and distortion map, and prepares the
    /// render objects for rendering. The value of `timestamp` should be the
    /// timestamp given to the `request_animation_frame` callback in which this
    /// function is called.
    pub fn prepare_render(
        &mut self,
        engine: &mut RenderEngine,
        timestamp: f32,
    ) -> Result<(), JsValue> {
        let time = ((f64::from(timestamp) - self.start_time) * 1e-3).max(0.0) as f32;
        self.simulation.tick(time);

        let field = self.simulation.field();
        let n = field.grid_size();
        engine.update_array_buffer(&self.buffers.heights, field.heights());
        engine.update_array_buffer(&self.buffers.normals, field.normals_flat());
        engine.texture_subimage::<Rgba>(
            &self.distortion,
            self.simulation.distortion_map(),
            0,
            0,
            n,
            n,
        )?;

        let num_drops = self
            .simulation
            .write_drop_positions(&mut self.drop_positions, Self::MAX_DROPS);
        if num_drops > 0 {
            engine.update_array_buffer(&self.buffers.drops, &self.drop_positions);
        }
        self.switches.num_drops.set(num_drops as u32);

        self.uniforms.view.set_data(self.camera.view_matrix());
        self.uniforms.projection.set_data(self.projection.matrix());
        self.uniforms.eye.set_data(self.camera.position);
        self.uniforms
            .reflection_view_projection
            .set_data(self.compositor.reflection_view_projection());

        let drops = self.simulation.drops();
        if let Some(impact) = drops.last_impact() {
            self.uniforms.glow_position.set_data(impact.position);
        }
        self.uniforms
            .glow_intensity
            .set_data(drops.glow_intensity(time));

        let source = self.simulation.source();
        self.uniforms.source_span.set_data(Vec2::new(
            source.height() - Self::BLADE_LENGTH,
            source.height(),
        ));
        self.uniforms.source_rotation.set_data(source.rotation());

        self.select_surface();
        Ok(())
    }

    /// Renders the reflection for the next frame.
    ///
    /// This function must be called after each call to
    /// [`RenderEngine::render`]. It renders the objects that appear in
    /// reflections, as seen by the camera mirrored across the water plane, into
    /// the reflection target that was not sampled by the water in this frame.
    pub fn render_reflection(&mut self, engine: &mut RenderEngine) -> Result<(), JsValue> {
        let Some(targets) = self.reflection.as_ref() else {
            return Ok(());
        };
        let uniforms = &self.uniforms;
        let mut targets = EngineTargets { engine, targets };
        self.compositor.render_mirrored(
            &mut targets,
            &self.camera,
            &self.projection,
            |targets, projection, view| {
                uniforms.projection.set_data(*projection);
                uniforms.view.set_data(*view);
                targets.engine.render_reflected()
            },
        )
    }

    /// Updates the water according to the new dimensions of the canvas.
    ///
    /// This function should be called each time that the canvas size or the
    /// device pixel ratio changes, after calling
    /// [`RenderEngine::resize_canvas`]. The reflection targets are resized to
    /// the new dimensions. If this fails, reflections are disabled.
    pub fn resize_canvas(&mut self, engine: &mut RenderEngine) -> Result<(), JsValue> {
        let (width, height) = engine.canvas_dims().device_pixels();
        self.projection.set_viewport(width, height);
        if let Some(targets) = self.reflection.as_mut() {
            if let Err(err) = targets.resize(engine, width, height) {
                tracing::warn!(
                    error = ?err,
                    "unable to resize reflection targets; disabling reflections"
                );
                self.compositor.disable();
                self.reflection = None;
                self.select_surface();
            }
        }
        Ok(())
    }

    /// Sets the camera.
    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    /// Starts raising or lowering the excitation source.
    ///
    /// Returns `false` if the source is already moving.
    pub fn toggle_excitation(&mut self) -> bool {
        self.simulation.toggle_excitation()
    }

    /// Returns the reflection mode.
    pub fn reflection_mode(&self) -> ReflectionMode {
        self.compositor.mode()
    }

    fn select_surface(&self) {
        let sampled = self.compositor.sampled_target();
        for (j, enabled) in self.switches.surfaces.iter().enumerate() {
            enabled.set(sampled.is_some_and(|target| target.as_usize() == j));
        }
        self.switches.plain_surface.set(sampled.is_none());
    }

    fn distortion_texture(engine: &mut RenderEngine) -> Result<Rc<WebGlTexture>, JsValue> {
        Ok(engine
            .create_texture()?
            .set_parameter(TextureParameter::MagFilter(TextureMagFilter::Linear))
            .set_parameter(TextureParameter::MinFilter(TextureMinFilter::Linear))
            .set_parameter(TextureParameter::WrapS(TextureWrap::ClampToEdge))
            .set_parameter(TextureParameter::WrapT(TextureWrap::ClampToEdge))
            .build())
    }

    #[allow(clippy::type_complexity)]
    fn scene_objects(
        engine: &mut RenderEngine,
        uniforms: &Uniforms,
    ) -> Result<(RenderObject, RenderObject, Rc<WebGlBuffer>, Rc<Cell<u32>>), JsValue> {
        let source_program = Self::source_program(engine)?;
        // (across, along) coordinates of the blade corners
        let corners: [f32; 8] = [
            -1.0, 0.0, //
            1.0, 0.0, //
            -1.0, 1.0, //
            1.0, 1.0, //
        ];
        let source_vao = engine
            .create_vao()?
            .create_array_buffer(&source_program, "aCorner", 2, &corners)?
            .create_element_array_buffer(&[0, 1, 2, 3])?
            .build();
        let source_object = RenderObject {
            enabled: Rc::new(Cell::new(true)),
            reflected: true,
            program: source_program,
            vao: source_vao,
            draw_mode: DrawMode::TriangleStrip,
            draw_num_indices: Rc::new(Cell::new(4)),
            draw_offset_elements: Rc::new(Cell::new(0)),
            uniforms: uniforms.source_uniforms(),
            textures: Box::new([]),
        };

        let drops_program = Self::drops_program(engine)?;
        let positions = vec![0.0_f32; 3 * Self::MAX_DROPS];
        let indices = (0..Self::MAX_DROPS as u16).collect::<Vec<u16>>();
        let (drops_vao, drops_buffer) = engine.create_vao()?.create_dynamic_array_buffer(
            &drops_program,
            "aPosition",
            3,
            &positions,
        )?;
        let drops_vao = drops_vao.create_element_array_buffer(&indices)?.build();
        let num_drops = Rc::new(Cell::new(0));
        let drops_object = RenderObject {
            enabled: Rc::new(Cell::new(true)),
            reflected: true,
            program: drops_program,
            vao: drops_vao,
            draw_mode: DrawMode::Points,
            draw_num_indices: Rc::clone(&num_drops),
            draw_offset_elements: Rc::new(Cell::new(0)),
            uniforms: uniforms.camera_uniforms(),
            textures: Box::new([]),
        };
        Ok((source_object, drops_object, drops_buffer, num_drops))
    }

    fn surface_vao(
        engine: &mut RenderEngine,
        program: &WebGlProgram,
        simulation: &Simulation,
    ) -> Result<(Rc<WebGlVertexArrayObject>, Rc<WebGlBuffer>, Rc<WebGlBuffer>), JsValue> {
        let field = simulation.field();
        let (positions, indices) = grid_mesh(field.grid_size(), field.world_radius());
        let (vao, heights) = engine
            .create_vao()?
            .create_array_buffer(program, "aPosition", 2, &positions)?
            .create_dynamic_array_buffer(program, "aHeight", 1, field.heights())?;
        let (vao, normals) =
            vao.create_dynamic_array_buffer(program, "aNormal", 3, field.normals_flat())?;
        let vao = vao.create_element_array_buffer(&indices)?.build();
        Ok((vao, heights, normals))
    }

    fn surface_program(engine: &RenderEngine) -> Result<Rc<WebGlProgram>, JsValue> {
        let source = ProgramSource {
            vertex_shader: r#"#version 300 es
        in vec2 aPosition;
        in float aHeight;
        in vec3 aNormal;
        uniform mat4 uView;
        uniform mat4 uProjection;
        uniform mat4 uReflectionViewProjection;
        uniform float uWaterHeight;
        uniform float uWorldRadius;
        out vec3 vWorld;
        out vec3 vNormal;
        out vec2 vTextureCoordinates;
        out vec4 vReflectionClip;
        void main() {
            vec3 world = vec3(aPosition.x, uWaterHeight + aHeight, aPosition.y);
            vWorld = world;
            vNormal = aNormal;
            vTextureCoordinates = (aPosition + uWorldRadius) / (2.0 * uWorldRadius);
            vReflectionClip = uReflectionViewProjection
                * vec4(aPosition.x, uWaterHeight, aPosition.y, 1.0);
            gl_Position = uProjection * uView * vec4(world, 1.0);
        }"#,
            fragment_shader: r#"#version 300 es
        precision highp float;
        in vec3 vWorld;
        in vec3 vNormal;
        in vec2 vTextureCoordinates;
        in vec4 vReflectionClip;
        uniform sampler2D uDistortion;
        uniform sampler2D uReflection;
        uniform float uReflectionStrength;
        uniform vec3 uEye;
        uniform vec2 uGlowPosition;
        uniform float uGlowIntensity;
        out vec4 color;
        void main() {
            vec2 distortion = texture(uDistortion, vTextureCoordinates).rg * 2.0 - 1.0;
            vec2 reflectionCoordinates = vReflectionClip.xy / vReflectionClip.w * 0.5 + 0.5;
            reflectionCoordinates = clamp(reflectionCoordinates + 0.05 * distortion,
                                          0.001, 0.999);
            vec3 reflection = texture(uReflection, reflectionCoordinates).rgb;

            vec3 normal = normalize(vNormal);
            vec3 toEye = normalize(uEye - vWorld);
            float fresnel = 0.02 + 0.98 * pow(1.0 - max(dot(normal, toEye), 0.0), 5.0);
            vec3 deep = vec3(0.02, 0.07, 0.10);
            vec3 rgb = mix(deep, reflection, uReflectionStrength * (0.35 + 0.65 * fresnel));

            float glow = uGlowIntensity * exp(-8.0 * distance(vWorld.xz, uGlowPosition));
            rgb += vec3(0.4, 0.6, 0.8) * glow;

            float alpha = 0.85;
            // pre-multiplied alpha
            color = vec4(alpha * rgb, alpha);
        }"#,
        };
        engine.make_program(source)
    }

    fn source_program(engine: &RenderEngine) -> Result<Rc<WebGlProgram>, JsValue> {
        let source = ProgramSource {
            vertex_shader: r#"#version 300 es
        in vec2 aCorner;
        uniform mat4 uView;
        uniform mat4 uProjection;
        uniform vec2 uSourceBase;
        uniform vec2 uSourceSpan;
        uniform float uSourceRotation;
        out float vAlong;
        void main() {
            float halfWidth = 0.06 * (1.0 - 0.8 * aCorner.y);
            vec2 across = aCorner.x * halfWidth
                * vec2(cos(uSourceRotation), sin(uSourceRotation));
            vec3 world = vec3(uSourceBase.x + across.x,
                              mix(uSourceSpan.x, uSourceSpan.y, aCorner.y),
                              uSourceBase.y + across.y);
            vAlong = aCorner.y;
            gl_Position = uProjection * uView * vec4(world, 1.0);
        }"#,
            fragment_shader: r#"#version 300 es
        precision highp float;
        in float vAlong;
        out vec4 color;
        void main() {
            color = vec4(mix(vec3(0.35, 0.4, 0.5), vec3(0.8, 0.9, 1.0), vAlong), 1.0);
        }"#,
        };
        engine.make_program(source)
    }

    fn drops_program(engine: &RenderEngine) -> Result<Rc<WebGlProgram>, JsValue> {
        let source = ProgramSource {
            vertex_shader: r#"#version 300 es
        in vec3 aPosition;
        uniform mat4 uView;
        uniform mat4 uProjection;
        void main() {
            gl_Position = uProjection * uView * vec4(aPosition, 1.0);
            gl_PointSize = 4.0;
        }"#,
            fragment_shader: r#"#version 300 es
        precision highp float;
        out vec4 color;
        void main() {
            vec2 c = 2.0 * gl_PointCoord - 1.0;
            float alpha = max(1.0 - dot(c, c), 0.0);
            color = vec4(alpha * vec3(0.7, 0.85, 1.0), alpha);
        }"#,
        };
        engine.make_program(source)
    }
}

/// Builds the mesh of the water grid.
///
/// Returns the (X, Z) world positions of the `grid_size` × `grid_size`
/// vertices, in the row-major order of the ripple field, and the indices of
/// two triangles per grid cell.
///
/// # Panics
///
/// Panics if the vertices cannot be indexed with `u16`.
pub fn grid_mesh(grid_size: usize, world_radius: f32) -> (Vec<f32>, Vec<u16>) {
    assert!(grid_size >= 2);
    // We cannot have more than 1 << 16 vertices, since we index them with a
    // u16.
    assert!(grid_size * grid_size <= 1 << 16);
    let spacing = 2.0 * world_radius / (grid_size - 1) as f32;
    let positions = (0..grid_size)
        .flat_map(|row| {
            (0..grid_size).flat_map(move |col| {
                [
                    -world_radius + col as f32 * spacing,
                    -world_radius + row as f32 * spacing,
                ]
            })
        })
        .collect::<Vec<f32>>();
    let indices = (0..grid_size - 1)
        .flat_map(|row| {
            (0..grid_size - 1).flat_map(move |col| {
                let a = (row * grid_size + col) as u16;
                let b = a + 1;
                let c = a + grid_size as u16;
                let d = c + 1;
                [a, c, b, b, c, d]
            })
        })
        .collect::<Vec<u16>>();
    (positions, indices)
}

impl ReflectionTargets {
    fn new(
        engine: &mut RenderEngine,
        width: u32,
        height: u32,
    ) -> Result<ReflectionTargets, JsValue> {
        let (width, height) = (width.max(1), height.max(1));
        let depth = engine.create_depth_renderbuffer(width, height)?;
        let (first_texture, first) = Self::target(engine, &depth, width, height)?;
        let (second_texture, second) = Self::target(engine, &depth, width, height)?;
        tracing::debug!(width, height, "allocated reflection targets");
        Ok(ReflectionTargets {
            textures: [first_texture, second_texture],
            framebuffers: [first, second],
            depth,
        })
    }

    fn target(
        engine: &mut RenderEngine,
        depth: &WebGlRenderbuffer,
        width: u32,
        height: u32,
    ) -> Result<(Rc<WebGlTexture>, Framebuffer), JsValue> {
        // No mipmaps, since the texture is rendered to on every frame.
        let texture = engine
            .create_texture()?
            .set_parameter(TextureParameter::MagFilter(TextureMagFilter::Linear))
            .set_parameter(TextureParameter::MinFilter(TextureMinFilter::Linear))
            .set_parameter(TextureParameter::WrapS(TextureWrap::ClampToEdge))
            .set_parameter(TextureParameter::WrapT(TextureWrap::ClampToEdge))
            .build();
        engine.texture_storage::<Rgba>(&texture, width as usize, height as usize)?;
        let framebuffer = engine.create_framebuffer(&texture, depth, width, height)?;
        Ok((texture, framebuffer))
    }

    fn resize(&mut self, engine: &mut RenderEngine, width: u32, height: u32) -> Result<(), JsValue> {
        let (width, height) = (width.max(1), height.max(1));
        if self.framebuffers[0].dimensions() == (width, height) {
            return Ok(());
        }
        engine.depth_renderbuffer_storage(&self.depth, width, height);
        for (texture, framebuffer) in self.textures.iter().zip(self.framebuffers.iter_mut()) {
            engine.texture_storage::<Rgba>(texture, width as usize, height as usize)?;
            framebuffer.set_dimensions(width, height);
        }
        tracing::debug!(width, height, "resized reflection targets");
        Ok(())
    }
}

impl OffscreenTargets for EngineTargets<'_> {
    type Error = JsValue;

    fn bind_target(&mut self, index: TargetIndex) -> Result<(), JsValue> {
        self.engine
            .bind_offscreen(&self.targets.framebuffers[index.as_usize()]);
        Ok(())
    }

    fn unbind_target(&mut self) -> Result<(), JsValue> {
        self.engine.unbind_offscreen();
        Ok(())
    }
}

impl Uniforms {
    fn new(config: &WaterConfig) -> Uniforms {
        Uniforms {
            view: Rc::new(Uniform::new(String::from("uView"), Mat4::IDENTITY)),
            projection: Rc::new(Uniform::new(String::from("uProjection"), Mat4::IDENTITY)),
            reflection_view_projection: Rc::new(Uniform::new(
                String::from("uReflectionViewProjection"),
                Mat4::IDENTITY,
            )),
            eye: Rc::new(Uniform::new(String::from("uEye"), config.camera.position)),
            water_height: Rc::new(Uniform::new(
                String::from("uWaterHeight"),
                config.water_height,
            )),
            world_radius: Rc::new(Uniform::new(
                String::from("uWorldRadius"),
                config.world_radius,
            )),
            glow_position: Rc::new(Uniform::new(String::from("uGlowPosition"), Vec2::ZERO)),
            glow_intensity: Rc::new(Uniform::new(String::from("uGlowIntensity"), 0.0)),
            source_base: Rc::new(Uniform::new(
                String::from("uSourceBase"),
                Vec2::from_array(config.excitation.lift.base),
            )),
            source_span: Rc::new(Uniform::new(String::from("uSourceSpan"), Vec2::ZERO)),
            source_rotation: Rc::new(Uniform::new(String::from("uSourceRotation"), 0.0)),
        }
    }

    fn camera_uniforms(&self) -> Box<[Rc<dyn UniformValue>]> {
        Box::new([
            Rc::clone(&self.view) as _,
            Rc::clone(&self.projection) as _,
        ])
    }

    fn source_uniforms(&self) -> Box<[Rc<dyn UniformValue>]> {
        Box::new([
            Rc::clone(&self.view) as _,
            Rc::clone(&self.projection) as _,
            Rc::clone(&self.source_base) as _,
            Rc::clone(&self.source_span) as _,
            Rc::clone(&self.source_rotation) as _,
        ])
    }

    fn surface_uniforms(&self, reflection_strength: f32) -> Box<[Rc<dyn UniformValue>]> {
        Box::new([
            Rc::clone(&self.view) as _,
            Rc::clone(&self.projection) as _,
            Rc::clone(&self.reflection_view_projection) as _,
            Rc::clone(&self.eye) as _,
            Rc::clone(&self.water_height) as _,
            Rc::clone(&self.world_radius) as _,
            Rc::clone(&self.glow_position) as _,
            Rc::clone(&self.glow_intensity) as _,
            Rc::new(Uniform::new(
                String::from("uReflectionStrength"),
                reflection_strength,
            )) as _,
        ])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mesh_vertices_match_the_ripple_grid() {
        let field =
            crate::ripple::RippleField::new(5, 2.0, crate::ripple::RippleParams::default())
                .unwrap();
        let (positions, indices) = grid_mesh(5, 2.0);
        assert_eq!(positions.len(), 2 * 25);
        for row in 0..5 {
            for col in 0..5 {
                let i = row * 5 + col;
                let world = field.grid_to_world(col, row);
                assert_eq!(positions[2 * i], world.x);
                assert_eq!(positions[2 * i + 1], world.y);
            }
        }
        assert_eq!(indices.len(), 6 * 4 * 4);
        assert_eq!(&indices[..6], &[0, 5, 1, 1, 5, 6]);
        assert_eq!(*indices.iter().max().unwrap(), 24);
    }

    #[test]
    fn mesh_of_the_largest_grid() {
        let (positions, indices) = grid_mesh(256, 7.0);
        assert_eq!(positions.len(), 2 * 256 * 256);
        assert_eq!(*indices.iter().max().unwrap(), u16::MAX);
        assert_eq!(positions[0], -7.0);
        assert!((positions[positions.len() - 1] - 7.0).abs() < 1e-5);
    }

    #[test]
    #[should_panic]
    fn mesh_too_large() {
        grid_mesh(257, 7.0);
    }
}
