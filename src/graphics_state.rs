use std::rc::Rc;

use crate::{font::Font, matrix::Matrix, path::Path};

/// Paint for filling and stroking
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    Gray(f64),
    Rgb(f64, f64, f64),
    Cmyk(f64, f64, f64, f64),
}

impl Paint {
    pub fn black() -> Self {
        Paint::Gray(0.0)
    }

    pub fn to_rgb(self) -> (f64, f64, f64) {
        fn clamp01(v: f64) -> f64 {
            v.clamp(0.0, 1.0)
        }

        match self {
            Paint::Gray(g) => (clamp01(g), clamp01(g), clamp01(g)),
            Paint::Rgb(r, g, b) => (clamp01(r), clamp01(g), clamp01(b)),
            Paint::Cmyk(c, m, y, k) => (
                1.0 - clamp01(c + k),
                1.0 - clamp01(m + k),
                1.0 - clamp01(y + k),
            ),
        }
    }

    pub fn to_gray(self) -> f64 {
        let (r, g, b) = self.to_rgb();
        0.3 * r + 0.59 * g + 0.11 * b
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// One graphics-state frame. `gsave` pushes a copy, `grestore` pops; the
/// current path and current point travel with it.
#[derive(Debug, Clone)]
pub struct GraphicsState {
    /// Maps user space to device space; composed by pre-multiplication
    pub ctm: Matrix,

    /// Thickness, in user space units, of stroked paths. Initial value: 1.0
    pub line_width: f64,

    /// Maximum length of mitered joins. Initial value: 10.0, a cutoff below
    /// approximately 11.5 degrees
    pub miter_limit: f64,

    pub line_cap: LineCap,
    pub line_join: LineJoin,

    /// Maximum deviation, in device pixels, of flattened curves.
    /// Initial value: 1.0
    pub flatness: f64,

    pub dash_pattern: Vec<f64>,
    pub dash_offset: f64,

    pub fill_paint: Paint,
    pub stroke_paint: Paint,

    pub path: Path,
    pub clip: Option<Path>,

    pub font: Option<Rc<Font>>,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Matrix::identity(),
            line_width: 1.0,
            miter_limit: 10.0,
            line_cap: LineCap::default(),
            line_join: LineJoin::default(),
            flatness: 1.0,
            dash_pattern: Vec::new(),
            dash_offset: 0.0,
            fill_paint: Paint::black(),
            stroke_paint: Paint::black(),
            path: Path::new(),
            clip: None,
            font: None,
        }
    }
}

impl GraphicsState {
    /// Replace both paints, the default behavior of the color-setting
    /// operators
    pub fn set_paint(&mut self, paint: Paint) {
        self.fill_paint = paint;
        self.stroke_paint = paint;
    }
}
