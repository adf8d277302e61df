//! cave-water renders a rippling water surface with planar reflections using
//! WebGL2.
//!
//! The water surface is simulated with a damped 2D wave equation on a regular
//! grid ([`ripple`]). Falling drops ([`drops`]) and an optional excitation
//! source ([`excitation`]) disturb it. The scene above the water is reflected
//! with a pair of offscreen targets used in ping-pong fashion
//! ([`reflection`]), so that the reflection sampled by the water in each frame
//! is never the one being rendered.
//!
//! The simulation modules are independent of WebGL2 and can be used and tested
//! natively. The [`render`] and [`water`] modules and the functions in this
//! module run in the browser.

#![warn(missing_docs)]

use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::{prelude::*, JsCast};
use web_sys::{Document, HtmlCanvasElement, Window};

use crate::camera::Camera;
use crate::config::WaterConfig;
use crate::reflection::ReflectionMode;
use crate::render::RenderEngine;
use crate::water::Water;

pub mod array_view;
pub mod camera;
pub mod config;
pub mod drops;
pub mod error;
pub mod excitation;
pub mod logging;
pub mod reflection;
pub mod render;
pub mod ripple;
pub mod simulation;
pub mod version;
pub mod water;

/// Initialize the wasm module.
///
/// This function is set to run as soon as the wasm module is instantiated. It
/// applies some settings that are needed for all kinds of usage of
/// `cave-water`. For instance, it sets a panic hook using the
/// [`console_error_panic_hook`] crate.
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    Ok(())
}

/// Handle to a running water scene.
///
/// This is returned to JavaScript by [`cave_water_start`] and allows
/// interacting with the scene while it is rendered.
#[wasm_bindgen]
pub struct CaveWater {
    render_engine: Rc<RefCell<RenderEngine>>,
    water: Rc<RefCell<Water>>,
}

#[wasm_bindgen]
impl CaveWater {
    /// Starts raising or lowering the excitation source.
    ///
    /// Returns `false` if the source is already moving.
    pub fn toggle_excitation(&self) -> bool {
        self.water.borrow_mut().toggle_excitation()
    }

    /// Sets the position and orientation of the camera.
    ///
    /// The angles are given in radians.
    pub fn set_camera(&self, x: f32, y: f32, z: f32, yaw: f32, pitch: f32) {
        self.water.borrow_mut().set_camera(Camera {
            position: glam::Vec3::new(x, y, z),
            yaw,
            pitch,
        });
    }

    /// Returns `true` if reflections are being rendered.
    pub fn reflections_enabled(&self) -> bool {
        self.water.borrow().reflection_mode() == ReflectionMode::Enabled
    }

    /// Updates the scene after a change of the canvas size.
    ///
    /// This should be called each time that the canvas size or the device
    /// pixel ratio changes.
    pub fn resize(&self) -> Result<(), JsValue> {
        let mut render_engine = self.render_engine.borrow_mut();
        render_engine.resize_canvas()?;
        self.water.borrow_mut().resize_canvas(&mut render_engine)
    }
}

/// Starts rendering the water scene.
///
/// This function should be called from JavaScript when the web page is loaded.
/// The scene is rendered to the canvas element with id `canvas_id`. The
/// optional `config_json` contains a [`WaterConfig`] in JSON format. The values
/// it does not list take their defaults.
///
/// It sets up all the objects and callbacks that keep the scene running and
/// returns a handle to interact with it.
#[wasm_bindgen]
pub fn cave_water_start(
    canvas_id: &str,
    config_json: Option<String>,
) -> Result<CaveWater, JsValue> {
    let config = match config_json {
        Some(json) => WaterConfig::from_json(&json)?,
        None => WaterConfig::default(),
    };
    logging::init(&config.log_filter)?;
    tracing::info!(
        version = version::cave_water_version(),
        git = version::cave_water_git_version(),
        "starting cave-water"
    );

    let (window, document) = get_window_and_document()?;
    let canvas = Rc::new(
        document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| format!("unable to get #{canvas_id} element"))?
            .dyn_into::<web_sys::HtmlCanvasElement>()?,
    );

    let (render_engine, water) = new_water(&window, &canvas, &config)?;
    setup_render_loop(Rc::clone(&render_engine), Rc::clone(&water));

    Ok(CaveWater {
        render_engine,
        water,
    })
}

/// Returns the [`Window`] and [`Document`] objects.
///
/// These are returned inside an [`Rc`] so that their ownership can be shared.
pub fn get_window_and_document() -> Result<(Rc<Window>, Rc<Document>), JsValue> {
    let window = Rc::new(web_sys::window().ok_or("unable to get window")?);
    let document = Rc::new(window.document().ok_or("unable to get document")?);
    Ok((window, document))
}

/// Creates a [`Water`] and its associated [`RenderEngine`].
///
/// The canvas is sized according to its current dimensions before the water is
/// created, so that the reflection targets match the canvas. The seed of the
/// simulation is taken from the configuration or, if it is not set there, from
/// the clock.
#[allow(clippy::type_complexity)]
pub fn new_water(
    window: &Rc<Window>,
    canvas: &Rc<HtmlCanvasElement>,
    config: &WaterConfig,
) -> Result<(Rc<RefCell<RenderEngine>>, Rc<RefCell<Water>>), JsValue> {
    let mut render_engine = RenderEngine::new(Rc::clone(canvas), Rc::clone(window))?;
    render_engine.resize_canvas()?;
    let performance = window.performance().ok_or("unable to get performance")?;
    let seed = config
        .drops
        .seed
        .unwrap_or_else(|| js_sys::Date::now() as u64);
    let water = Water::new(&mut render_engine, config, seed, &performance)?;
    Ok((
        Rc::new(RefCell::new(render_engine)),
        Rc::new(RefCell::new(water)),
    ))
}

/// Sets up a render loop for the water.
///
/// This function sets up a render loop using `requestAnimationFrame()`. Each
/// time the callback triggers, the water is prepared for rendering, the render
/// engine is called, and the reflection for the next frame is rendered. Then,
/// the rendering of the next frame is scheduled using
/// `requestAnimationFrame()`. If any of these steps fails, the error is logged
/// to the console and the loop stops.
pub fn setup_render_loop(render_engine: Rc<RefCell<RenderEngine>>, water: Rc<RefCell<Water>>) {
    let f = Rc::new(RefCell::new(None));
    let g = f.clone();
    *g.borrow_mut() = Some(Closure::new(move |timestamp| {
        let mut render_engine = render_engine.borrow_mut();
        let mut water = water.borrow_mut();
        if let Err(e) = water.prepare_render(&mut render_engine, timestamp) {
            web_sys::console::error_1(&e);
            return;
        }
        if let Err(e) = render_engine.render() {
            web_sys::console::error_1(&e);
            return;
        }
        if let Err(e) = water.render_reflection(&mut render_engine) {
            web_sys::console::error_1(&e);
            return;
        }
        // Schedule ourselves for another requestAnimationFrame callback.
        if let Err(e) = request_animation_frame(f.borrow().as_ref()) {
            web_sys::console::error_1(&e);
        };
    }));
    // Initial requestAnimationFrame callback.
    if let Err(e) = request_animation_frame(g.borrow().as_ref()) {
        web_sys::console::error_1(&e);
    };
}

fn request_animation_frame(f: Option<&Closure<dyn FnMut(f32)>>) -> Result<(), JsValue> {
    let f = f.ok_or("render loop closure not set")?;
    web_sys::window()
        .ok_or("unable to get window")?
        .request_animation_frame(f.as_ref().unchecked_ref())?;
    Ok(())
}
