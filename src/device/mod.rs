//! The external graphics sink.
//!
//! The core drives rendering through this trait and nothing else; path
//! rasterization, glyph outlines, and pixel output live behind it. Every
//! method has a no-op default so a sink only implements what it renders.

mod raster;

pub use raster::RasterDevice;

use crate::{
    error::PsResult,
    font::Font,
    graphics_state::GraphicsState,
    matrix::Matrix,
    path::Path,
};

/// The record handed to `image`
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub width: i32,
    pub height: i32,
    pub bits_per_component: i32,
    /// maps image space to user space
    pub matrix: Matrix,
    pub data: Vec<u8>,
}

pub trait Device {
    /// Mirror of the VM's graphics-state stack
    fn gsave(&mut self) {}
    fn grestore(&mut self) {}

    /// Called whenever the CTM changes
    fn set_ctm(&mut self, _ctm: &Matrix) {}

    fn fill(&mut self, _state: &GraphicsState, _even_odd: bool) -> PsResult<()> {
        Ok(())
    }

    fn stroke(&mut self, _state: &GraphicsState) -> PsResult<()> {
        Ok(())
    }

    fn clip(&mut self, _state: &GraphicsState, _even_odd: bool) {}

    fn init_clip(&mut self) {}

    fn image(&mut self, _state: &GraphicsState, _image: &ImageRecord) -> PsResult<()> {
        Ok(())
    }

    fn set_font(&mut self, _font: &Font) {}

    /// Render `text` at the current point
    fn show_text(&mut self, _state: &GraphicsState, _text: &[u8]) -> PsResult<()> {
        Ok(())
    }

    /// Advance of `text` in the space of the font matrix. Without glyph
    /// metrics the sink assumes a fixed per-glyph advance of 0.6 em.
    fn string_width(&mut self, font: &Font, text: &[u8]) -> (f64, f64) {
        let glyph_space = 0.6 * text.len() as f64;
        font.matrix.dtransform(glyph_space, 0.0)
    }

    /// Glyph outlines for `text`, for `charpath`
    fn char_path(&mut self, _state: &GraphicsState, _text: &[u8]) -> Path {
        Path::new()
    }

    fn show_page(&mut self) -> PsResult<()> {
        Ok(())
    }

    fn erase_page(&mut self) {}
}

/// A sink that swallows everything; the REPL and most tests run over it
#[derive(Debug, Default)]
pub struct NulDevice;

impl Device for NulDevice {}

/// Shared handle to a sink, for hosts that keep their own reference to read
/// the canvas back after execution
impl<D: Device> Device for std::rc::Rc<std::cell::RefCell<D>> {
    fn gsave(&mut self) {
        self.borrow_mut().gsave()
    }

    fn grestore(&mut self) {
        self.borrow_mut().grestore()
    }

    fn set_ctm(&mut self, ctm: &Matrix) {
        self.borrow_mut().set_ctm(ctm)
    }

    fn fill(&mut self, state: &GraphicsState, even_odd: bool) -> PsResult<()> {
        self.borrow_mut().fill(state, even_odd)
    }

    fn stroke(&mut self, state: &GraphicsState) -> PsResult<()> {
        self.borrow_mut().stroke(state)
    }

    fn clip(&mut self, state: &GraphicsState, even_odd: bool) {
        self.borrow_mut().clip(state, even_odd)
    }

    fn init_clip(&mut self) {
        self.borrow_mut().init_clip()
    }

    fn image(&mut self, state: &GraphicsState, image: &ImageRecord) -> PsResult<()> {
        self.borrow_mut().image(state, image)
    }

    fn set_font(&mut self, font: &Font) {
        self.borrow_mut().set_font(font)
    }

    fn show_text(&mut self, state: &GraphicsState, text: &[u8]) -> PsResult<()> {
        self.borrow_mut().show_text(state, text)
    }

    fn string_width(&mut self, font: &Font, text: &[u8]) -> (f64, f64) {
        self.borrow_mut().string_width(font, text)
    }

    fn char_path(&mut self, state: &GraphicsState, text: &[u8]) -> Path {
        self.borrow_mut().char_path(state, text)
    }

    fn show_page(&mut self) -> PsResult<()> {
        self.borrow_mut().show_page()
    }

    fn erase_page(&mut self) {
        self.borrow_mut().erase_page()
    }
}
