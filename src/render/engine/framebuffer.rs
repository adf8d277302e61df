use super::RenderEngine;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::{WebGl2RenderingContext, WebGlFramebuffer, WebGlRenderbuffer, WebGlTexture};

/// Offscreen render target.
///
/// Pairs a WebGL2 framebuffer with the dimensions of its attachments, which
/// are needed to set the viewport when the framebuffer is bound.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    framebuffer: Rc<WebGlFramebuffer>,
    width: u32,
    height: u32,
}

impl Framebuffer {
    /// Returns the framebuffer object.
    pub fn framebuffer(&self) -> &Rc<WebGlFramebuffer> {
        &self.framebuffer
    }

    /// Returns the dimensions of the framebuffer in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Updates the dimensions of the framebuffer.
    ///
    /// This must be called after the storage of the attachments has been
    /// reallocated with a new size.
    pub fn set_dimensions(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}

impl RenderEngine {
    /// Creates a depth renderbuffer.
    ///
    /// The renderbuffer can be shared by several framebuffers of the same
    /// size.
    pub fn create_depth_renderbuffer(
        &mut self,
        width: u32,
        height: u32,
    ) -> Result<Rc<WebGlRenderbuffer>, JsValue> {
        let renderbuffer = Rc::new(
            self.gl
                .create_renderbuffer()
                .ok_or("failed to create renderbuffer")?,
        );
        self.depth_renderbuffer_storage(&renderbuffer, width, height);
        Ok(renderbuffer)
    }

    /// Reallocates the storage of a depth renderbuffer with a new size.
    pub fn depth_renderbuffer_storage(
        &mut self,
        renderbuffer: &WebGlRenderbuffer,
        width: u32,
        height: u32,
    ) {
        self.gl
            .bind_renderbuffer(WebGl2RenderingContext::RENDERBUFFER, Some(renderbuffer));
        self.gl.renderbuffer_storage(
            WebGl2RenderingContext::RENDERBUFFER,
            WebGl2RenderingContext::DEPTH_COMPONENT16,
            width as i32,
            height as i32,
        );
        self.gl
            .bind_renderbuffer(WebGl2RenderingContext::RENDERBUFFER, None);
    }

    /// Creates a framebuffer.
    ///
    /// The `color` texture, which must have storage of `width` × `height`
    /// pixels, is attached as the color attachment, and the `depth`
    /// renderbuffer as the depth attachment. An error is returned if the
    /// resulting framebuffer is not complete.
    pub fn create_framebuffer(
        &mut self,
        color: &Rc<WebGlTexture>,
        depth: &WebGlRenderbuffer,
        width: u32,
        height: u32,
    ) -> Result<Framebuffer, JsValue> {
        let framebuffer = Rc::new(
            self.gl
                .create_framebuffer()
                .ok_or("failed to create framebuffer")?,
        );
        self.gl
            .bind_framebuffer(WebGl2RenderingContext::FRAMEBUFFER, Some(&framebuffer));
        self.gl.framebuffer_texture_2d(
            WebGl2RenderingContext::FRAMEBUFFER,
            WebGl2RenderingContext::COLOR_ATTACHMENT0,
            WebGl2RenderingContext::TEXTURE_2D,
            Some(color),
            0,
        );
        self.gl.framebuffer_renderbuffer(
            WebGl2RenderingContext::FRAMEBUFFER,
            WebGl2RenderingContext::DEPTH_ATTACHMENT,
            WebGl2RenderingContext::RENDERBUFFER,
            Some(depth),
        );
        let status = self
            .gl
            .check_framebuffer_status(WebGl2RenderingContext::FRAMEBUFFER);
        self.gl
            .bind_framebuffer(WebGl2RenderingContext::FRAMEBUFFER, None);
        if status != WebGl2RenderingContext::FRAMEBUFFER_COMPLETE {
            return Err(format!("framebuffer is not complete (status {status:#x})").into());
        }
        Ok(Framebuffer {
            framebuffer,
            width,
            height,
        })
    }

    /// Binds a framebuffer as the render destination.
    ///
    /// The viewport is set to the dimensions of the framebuffer and its color
    /// and depth are cleared.
    pub fn bind_offscreen(&mut self, framebuffer: &Framebuffer) {
        self.gl.bind_framebuffer(
            WebGl2RenderingContext::FRAMEBUFFER,
            Some(&framebuffer.framebuffer),
        );
        self.gl
            .viewport(0, 0, framebuffer.width as i32, framebuffer.height as i32);
        self.clear();
    }

    /// Restores the canvas as the render destination.
    pub fn unbind_offscreen(&mut self) {
        self.gl
            .bind_framebuffer(WebGl2RenderingContext::FRAMEBUFFER, None);
        self.canvas_dims.set_viewport(&self.gl);
    }
}
