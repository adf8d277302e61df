use crate::array_view::ArrayView;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::{WebGl2RenderingContext, WebGlBuffer, WebGlProgram, WebGlVertexArrayObject};

use super::RenderEngine;

/// WebGL2 VAO builder.
///
/// This builder object is used to create a new Vertex Array Object.
pub struct VaoBuilder<'a> {
    engine: &'a mut RenderEngine,
    vao: Rc<WebGlVertexArrayObject>,
}

impl VaoBuilder<'_> {
    pub(super) fn new(engine: &mut RenderEngine) -> Result<VaoBuilder<'_>, JsValue> {
        let vao = Rc::new(
            engine
                .gl
                .create_vertex_array()
                .ok_or("failed to create VAO")?,
        );
        engine.bind_vertex_array(&vao);
        Ok(VaoBuilder { engine, vao })
    }

    /// Adds an array buffer to the VAO.
    ///
    /// This function creates a WebGL2 buffer, fills it with the array
    /// `contents`, and associates it with the VAO being built,
    /// associating it to a given `attribute` in a WebGL2 `program`.
    pub fn create_array_buffer<T: ArrayView>(
        self,
        program: &WebGlProgram,
        attribute: &str,
        size: i32,
        contents: &[T],
    ) -> Result<Self, JsValue> {
        self.create_attribute_buffer(
            program,
            attribute,
            size,
            contents,
            WebGl2RenderingContext::STATIC_DRAW,
        )?;
        Ok(self)
    }

    /// Adds an array buffer whose contents are updated often.
    ///
    /// This works as [`create_array_buffer`](VaoBuilder::create_array_buffer),
    /// but the buffer is created with the `DYNAMIC_DRAW` usage and returned, so
    /// that it can be updated later with
    /// [`RenderEngine::update_array_buffer`].
    pub fn create_dynamic_array_buffer<T: ArrayView>(
        self,
        program: &WebGlProgram,
        attribute: &str,
        size: i32,
        contents: &[T],
    ) -> Result<(Self, Rc<WebGlBuffer>), JsValue> {
        let buffer = self.create_attribute_buffer(
            program,
            attribute,
            size,
            contents,
            WebGl2RenderingContext::DYNAMIC_DRAW,
        )?;
        Ok((self, Rc::new(buffer)))
    }

    /// Adds an element array buffer to the VAO.
    ///
    /// This function creates a WebGL2 buffer, fills it with the array
    /// `contents`, and associates it with the VAO as an element array buffer.
    pub fn create_element_array_buffer(self, contents: &[u16]) -> Result<Self, JsValue> {
        self.create_and_fill_buffer(
            WebGl2RenderingContext::ELEMENT_ARRAY_BUFFER,
            contents,
            WebGl2RenderingContext::STATIC_DRAW,
        )?;
        Ok(self)
    }

    fn create_attribute_buffer<T: ArrayView>(
        &self,
        program: &WebGlProgram,
        attribute: &str,
        size: i32,
        contents: &[T],
        usage: u32,
    ) -> Result<WebGlBuffer, JsValue> {
        let attribute_location = match self.engine.gl.get_attrib_location(program, attribute) {
            x if x >= 0 => Ok(x as u32),
            _ => Err(format!("failed to get location of attribute {attribute}")),
        }?;
        self.engine
            .gl
            .enable_vertex_attrib_array(attribute_location);
        let buffer =
            self.create_and_fill_buffer(WebGl2RenderingContext::ARRAY_BUFFER, contents, usage)?;
        let normalized = false;
        let stride = 0;
        let offset = 0;
        self.engine.gl.vertex_attrib_pointer_with_i32(
            attribute_location,
            size,
            T::GL_TYPE,
            normalized,
            stride,
            offset,
        );
        Ok(buffer)
    }

    fn create_and_fill_buffer<T: ArrayView>(
        &self,
        target: u32,
        contents: &[T],
        usage: u32,
    ) -> Result<WebGlBuffer, JsValue> {
        let buffer = self
            .engine
            .gl
            .create_buffer()
            .ok_or("failed to create_buffer")?;
        self.engine.gl.bind_buffer(target, Some(&buffer));
        unsafe {
            let view = T::view(contents);
            self.engine
                .gl
                .buffer_data_with_array_buffer_view(target, &view, usage);
        }
        Ok(buffer)
    }

    /// Builds the VAO.
    ///
    /// Finishes the construction of the VAO, returning the VAO object.
    pub fn build(self) -> Rc<WebGlVertexArrayObject> {
        self.vao
    }
}

impl RenderEngine {
    /// Updates the contents of an array buffer.
    ///
    /// The `contents` are written at the beginning of the `buffer`, which must
    /// have been created with at least the same size, usually with
    /// [`VaoBuilder::create_dynamic_array_buffer`].
    pub fn update_array_buffer<T: ArrayView>(&mut self, buffer: &WebGlBuffer, contents: &[T]) {
        self.gl
            .bind_buffer(WebGl2RenderingContext::ARRAY_BUFFER, Some(buffer));
        unsafe {
            let view = T::view(contents);
            self.gl.buffer_sub_data_with_i32_and_array_buffer_view(
                WebGl2RenderingContext::ARRAY_BUFFER,
                0,
                &view,
            );
        }
    }
}
