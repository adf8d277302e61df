//! Views of Rust slices as JavaScript typed arrays.
//!
//! WebGL2 functions that upload data to the GPU take JavaScript typed arrays.
//! The [`ArrayView`] trait links native Rust types with their typed array and
//! WebGL2 type constant, so that Rust slices can be passed to WebGL2 without
//! copying.

use web_sys::WebGl2RenderingContext;

/// Native Rust type that can be viewed as a JavaScript typed array.
pub trait ArrayView: Sized {
    /// WebGL2 constant for the type (for instance, `FLOAT` for `f32`).
    const GL_TYPE: u32;

    /// Returns a typed array that views the memory of `array`.
    ///
    /// # Safety
    ///
    /// The returned object points directly into the wasm linear memory. No
    /// allocations must happen while it is alive, since they can grow the
    /// memory and invalidate the view. The object must only be passed to a
    /// WebGL2 function and then dropped.
    unsafe fn view(array: &[Self]) -> js_sys::Object;
}

macro_rules! impl_array_view {
    ($t:ty, $gl_type:expr, $js:ty) => {
        impl ArrayView for $t {
            const GL_TYPE: u32 = $gl_type;

            unsafe fn view(array: &[$t]) -> js_sys::Object {
                <$js>::view(array).into()
            }
        }
    };
}

impl_array_view!(f32, WebGl2RenderingContext::FLOAT, js_sys::Float32Array);
impl_array_view!(u8, WebGl2RenderingContext::UNSIGNED_BYTE, js_sys::Uint8Array);
impl_array_view!(u16, WebGl2RenderingContext::UNSIGNED_SHORT, js_sys::Uint16Array);
