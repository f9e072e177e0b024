//! Scanline raster sink: flattens paths and fills them into an RGBA8
//! canvas, written out as PNG by the batch runner.

use std::{fs::File, io::BufWriter, path::Path as FsPath};

use log::warn;

use crate::{
    device::{Device, ImageRecord},
    error::{PostScriptError, PsResult},
    graphics_state::{GraphicsState, Paint},
    matrix::Matrix,
    path::{Path, Point, SegmentCommand},
};

/// An edge of a flattened subpath, with its winding direction
#[derive(Debug, Clone, Copy)]
struct Edge {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    winding: i32,
}

pub struct RasterDevice {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
    /// PostScript user space is y-up; the canvas is y-down
    page_transform: Matrix,
    /// conservative clip: the intersection of clip-path bounding boxes
    clip_box: Option<(f64, f64, f64, f64)>,
    clip_stack: Vec<Option<(f64, f64, f64, f64)>>,
    warned_text: bool,
}

impl RasterDevice {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![255; width * height * 4],
            page_transform: Matrix::new(1.0, 0.0, 0.0, -1.0, 0.0, height as f64),
            clip_box: None,
            clip_stack: Vec::new(),
            warned_text: false,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> (u8, u8, u8, u8) {
        let idx = (y * self.width + x) * 4;
        (
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        )
    }

    pub fn write_png(&self, path: &FsPath) -> PsResult<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);

        let mut encoder = png::Encoder::new(writer, self.width as u32, self.height as u32);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut png_writer = encoder.write_header()?;
        png_writer.write_image_data(&self.pixels)?;

        Ok(())
    }

    fn collect_edges(&self, path: &Path, flatness: f64) -> Vec<Edge> {
        let flat = path.flattened(flatness);

        let mut edges = Vec::new();
        let mut current = Point::default();
        let mut subpath_start = Point::default();

        let mut add_edge = |a: Point, b: Point| {
            let a = a.transformed(&self.page_transform);
            let b = b.transformed(&self.page_transform);

            if a.y == b.y {
                return;
            }

            edges.push(Edge {
                x0: a.x,
                y0: a.y,
                x1: b.x,
                y1: b.y,
                winding: if b.y > a.y { 1 } else { -1 },
            });
        };

        for seg in &flat.segments {
            match seg.command {
                SegmentCommand::MoveTo(p) => {
                    // implicitly close the previous subpath for filling
                    if current != subpath_start {
                        add_edge(current, subpath_start);
                    }
                    current = p;
                    subpath_start = p;
                }
                SegmentCommand::LineTo(p) => {
                    add_edge(current, p);
                    current = p;
                }
                SegmentCommand::Close => {
                    add_edge(current, subpath_start);
                    current = subpath_start;
                }
                SegmentCommand::CurveTo(..) => unreachable!("path was flattened"),
            }
        }

        if current != subpath_start {
            add_edge(current, subpath_start);
        }

        edges
    }

    fn fill_edges(&mut self, edges: &[Edge], paint: Paint, even_odd: bool) {
        if edges.is_empty() {
            return;
        }

        let (r, g, b) = paint.to_rgb();
        let rgba = [
            (r * 255.0).round() as u8,
            (g * 255.0).round() as u8,
            (b * 255.0).round() as u8,
            255,
        ];

        let (clip_x0, clip_y0, clip_x1, clip_y1) = self.device_clip_box();

        for y in clip_y0..clip_y1 {
            let scan_y = y as f64 + 0.5;

            // x-crossings with winding contributions
            let mut crossings: Vec<(f64, i32)> = Vec::new();

            for edge in edges {
                let (top, bottom) = if edge.y0 < edge.y1 {
                    (edge.y0, edge.y1)
                } else {
                    (edge.y1, edge.y0)
                };

                if scan_y < top || scan_y >= bottom {
                    continue;
                }

                let t = (scan_y - edge.y0) / (edge.y1 - edge.y0);
                crossings.push((edge.x0 + t * (edge.x1 - edge.x0), edge.winding));
            }

            crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut winding = 0;
            let mut parity = 0;
            let mut span_start: Option<f64> = None;

            for (x, w) in crossings {
                let was_inside = if even_odd {
                    parity % 2 != 0
                } else {
                    winding != 0
                };

                winding += w;
                parity += 1;

                let is_inside = if even_odd {
                    parity % 2 != 0
                } else {
                    winding != 0
                };

                if !was_inside && is_inside {
                    span_start = Some(x);
                } else if was_inside && !is_inside {
                    if let Some(start) = span_start.take() {
                        self.fill_span(y, start, x, clip_x0, clip_x1, rgba);
                    }
                }
            }
        }
    }

    fn fill_span(
        &mut self,
        y: usize,
        x_start: f64,
        x_end: f64,
        clip_x0: usize,
        clip_x1: usize,
        rgba: [u8; 4],
    ) {
        let x0 = (x_start.round().max(clip_x0 as f64)) as usize;
        let x1 = (x_end.round().min(clip_x1 as f64)) as usize;

        for x in x0..x1 {
            let idx = (y * self.width + x) * 4;
            self.pixels[idx..idx + 4].copy_from_slice(&rgba);
        }
    }

    /// The clip box in canvas coordinates
    fn device_clip_box(&self) -> (usize, usize, usize, usize) {
        match self.clip_box {
            None => (0, 0, self.width, self.height),
            Some((min_x, min_y, max_x, max_y)) => {
                // user-space box through the page flip
                let (x0, y0) = self.page_transform.transform_point(min_x, max_y);
                let (x1, y1) = self.page_transform.transform_point(max_x, min_y);

                (
                    x0.floor().clamp(0.0, self.width as f64) as usize,
                    y0.floor().clamp(0.0, self.height as f64) as usize,
                    x1.ceil().clamp(0.0, self.width as f64) as usize,
                    y1.ceil().clamp(0.0, self.height as f64) as usize,
                )
            }
        }
    }

    /// A stroked segment as a filled quad of the stroke width
    fn stroke_quad(a: Point, b: Point, half_width: f64) -> [Point; 4] {
        let dir = b - a;
        let len = dir.distance(Point::default());

        let n = if len < 1e-12 {
            Point::new(half_width, 0.0)
        } else {
            Point::new(-dir.y / len * half_width, dir.x / len * half_width)
        };

        [a + n, b + n, b - n, a - n]
    }
}

impl Device for RasterDevice {
    fn gsave(&mut self) {
        self.clip_stack.push(self.clip_box);
    }

    fn grestore(&mut self) {
        if let Some(saved) = self.clip_stack.pop() {
            self.clip_box = saved;
        }
    }

    fn fill(&mut self, state: &GraphicsState, even_odd: bool) -> PsResult<()> {
        let edges = self.collect_edges(&state.path, state.flatness);
        self.fill_edges(&edges, state.fill_paint, even_odd);
        Ok(())
    }

    fn stroke(&mut self, state: &GraphicsState) -> PsResult<()> {
        // width through the CTM scale, averaged over both axes
        let (wx, wy) = state.ctm.dtransform(state.line_width, state.line_width);
        let half_width = ((wx.abs() + wy.abs()) / 4.0).max(0.35);

        let flat = state.path.flattened(state.flatness);
        let mut current = Point::default();
        let mut subpath_start = Point::default();

        let mut quads: Vec<[Point; 4]> = Vec::new();

        for seg in &flat.segments {
            match seg.command {
                SegmentCommand::MoveTo(p) => {
                    current = p;
                    subpath_start = p;
                }
                SegmentCommand::LineTo(p) => {
                    quads.push(Self::stroke_quad(current, p, half_width));
                    current = p;
                }
                SegmentCommand::Close => {
                    quads.push(Self::stroke_quad(current, subpath_start, half_width));
                    current = subpath_start;
                }
                SegmentCommand::CurveTo(..) => unreachable!("path was flattened"),
            }
        }

        let identity = Matrix::identity();

        for quad in quads {
            let mut quad_path = Path::new();
            quad_path.move_to(&identity, quad[0].x, quad[0].y);
            for p in &quad[1..] {
                quad_path.line_to(&identity, p.x, p.y)?;
            }
            quad_path.close(&identity)?;

            let edges = self.collect_edges(&quad_path, state.flatness);
            self.fill_edges(&edges, state.stroke_paint, false);
        }

        Ok(())
    }

    fn clip(&mut self, state: &GraphicsState, _even_odd: bool) {
        // conservative: intersect bounding boxes
        if let Some(bbox) = state.path.bounding_box() {
            self.clip_box = Some(match self.clip_box {
                None => bbox,
                Some((x0, y0, x1, y1)) => (
                    x0.max(bbox.0),
                    y0.max(bbox.1),
                    x1.min(bbox.2),
                    y1.min(bbox.3),
                ),
            });
        }
    }

    fn init_clip(&mut self) {
        self.clip_box = None;
    }

    fn image(&mut self, state: &GraphicsState, image: &ImageRecord) -> PsResult<()> {
        if image.width <= 0 || image.height <= 0 {
            anyhow::bail!(PostScriptError::RangeCheck);
        }

        if image.bits_per_component != 8 && image.bits_per_component != 1 {
            warn!(
                "image: {}-bit components approximated as gray",
                image.bits_per_component
            );
        }

        // image space -> user space -> device space
        let mut full = state.ctm;
        full.pre_multiply(&image.matrix);

        let w = image.width as usize;
        let h = image.height as usize;
        let row_bytes = match image.bits_per_component {
            1 => (w + 7) / 8,
            _ => w,
        };

        for sy in 0..h {
            for sx in 0..w {
                let gray = match image.bits_per_component {
                    1 => {
                        let byte = image.data.get(sy * row_bytes + sx / 8).copied().unwrap_or(0);
                        if byte & (0x80 >> (sx % 8)) != 0 {
                            255
                        } else {
                            0
                        }
                    }
                    _ => image.data.get(sy * row_bytes + sx).copied().unwrap_or(0),
                };

                // sample center, image space has y increasing downward
                let ix = sx as f64 + 0.5;
                let iy = image.height as f64 - (sy as f64 + 0.5);

                let (ux, uy) = full.transform_point(ix, iy);
                let (dx, dy) = self.page_transform.transform_point(ux, uy);

                let px = dx.floor();
                let py = dy.floor();

                if px < 0.0 || py < 0.0 || px >= self.width as f64 || py >= self.height as f64 {
                    continue;
                }

                let idx = (py as usize * self.width + px as usize) * 4;
                self.pixels[idx] = gray;
                self.pixels[idx + 1] = gray;
                self.pixels[idx + 2] = gray;
                self.pixels[idx + 3] = 255;
            }
        }

        Ok(())
    }

    fn show_text(&mut self, _state: &GraphicsState, _text: &[u8]) -> PsResult<()> {
        if !self.warned_text {
            warn!("raster sink has no glyph source; text is advanced but not painted");
            self.warned_text = true;
        }

        Ok(())
    }

    fn erase_page(&mut self) {
        self.pixels.fill(255);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fill_paints_inside_the_rect() {
        let mut device = RasterDevice::new(100, 100);

        let mut state = GraphicsState::default();
        state
            .path
            .rect(&Matrix::identity(), 10.0, 10.0, 50.0, 50.0)
            .unwrap();
        state.set_paint(Paint::Gray(0.0));

        device.fill(&state, false).unwrap();

        // y is flipped: user (20, 20) lands near canvas (20, 79)
        assert_eq!(device.pixel(20, 79), (0, 0, 0, 255));
        // outside stays white
        assert_eq!(device.pixel(80, 50), (255, 255, 255, 255));
    }

    #[test]
    fn even_odd_leaves_hole() {
        let mut device = RasterDevice::new(100, 100);

        let mut state = GraphicsState::default();
        let identity = Matrix::identity();
        state.path.rect(&identity, 10.0, 10.0, 80.0, 80.0).unwrap();
        state.path.rect(&identity, 30.0, 30.0, 40.0, 40.0).unwrap();

        device.fill(&state, true).unwrap();

        // inside the outer ring
        assert_eq!(device.pixel(15, 50), (0, 0, 0, 255));
        // inside the hole
        assert_eq!(device.pixel(50, 50), (255, 255, 255, 255));
    }

    #[test]
    fn erase_page_resets_to_white() {
        let mut device = RasterDevice::new(10, 10);

        let mut state = GraphicsState::default();
        state
            .path
            .rect(&Matrix::identity(), 0.0, 0.0, 10.0, 10.0)
            .unwrap();
        device.fill(&state, false).unwrap();

        device.erase_page();
        assert_eq!(device.pixel(5, 5), (255, 255, 255, 255));
    }
}
