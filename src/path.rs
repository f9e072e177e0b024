//! The path model.
//!
//! A path is a sequence of segments, each carrying a snapshot of the CTM at
//! the time it was built, so later transforms on the graphics state do not
//! retroactively warp segments already in the path. Coordinates are stored
//! in user space; consumers apply the per-segment snapshot. Circular arcs
//! are emitted as chains of cubic Béziers, one per quarter turn.

use std::ops::{Add, Mul, Sub};

use crate::{
    error::{PostScriptError, PsResult},
    matrix::Matrix,
};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn midpoint(self, other: Point) -> Point {
        (self + other) * 0.5
    }

    pub fn transformed(self, m: &Matrix) -> Point {
        let (x, y) = m.transform_point(self.x, self.y);
        Point::new(x, y)
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum SegmentCommand {
    MoveTo(Point),
    LineTo(Point),
    CurveTo(Point, Point, Point),
    Close,
}

#[derive(Debug, Clone, Copy)]
pub struct Segment {
    pub command: SegmentCommand,
    pub transform: Matrix,
}

#[derive(Debug, Clone, Default)]
pub struct Path {
    pub segments: Vec<Segment>,
    /// user-space current point plus the CTM it was built under
    current: Option<(Point, Matrix)>,
    start: Option<(Point, Matrix)>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn has_current_point(&self) -> bool {
        self.current.is_some()
    }

    /// The current point in device space (through the snapshot it was built
    /// under)
    pub fn current_point(&self) -> Option<Point> {
        self.current.map(|(p, m)| p.transformed(&m))
    }

    /// The current point expressed in the user space of `ctm`
    pub fn current_point_user(&self, ctm: &Matrix) -> PsResult<Point> {
        let device = match self.current_point() {
            Some(p) => p,
            None => anyhow::bail!(PostScriptError::NoCurrentPoint),
        };

        match ctm.inverse() {
            Some(inv) => Ok(device.transformed(&inv)),
            None => anyhow::bail!(PostScriptError::UndefinedResult),
        }
    }

    fn push(&mut self, command: SegmentCommand, ctm: &Matrix) {
        self.segments.push(Segment {
            command,
            transform: *ctm,
        });
    }

    pub fn move_to(&mut self, ctm: &Matrix, x: f64, y: f64) {
        let p = Point::new(x, y);

        self.push(SegmentCommand::MoveTo(p), ctm);
        self.current = Some((p, *ctm));
        self.start = self.current;
    }

    pub fn line_to(&mut self, ctm: &Matrix, x: f64, y: f64) -> PsResult<()> {
        if self.current.is_none() {
            anyhow::bail!(PostScriptError::NoCurrentPoint);
        }

        let p = Point::new(x, y);
        self.push(SegmentCommand::LineTo(p), ctm);
        self.current = Some((p, *ctm));

        Ok(())
    }

    pub fn curve_to(
        &mut self,
        ctm: &Matrix,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x3: f64,
        y3: f64,
    ) -> PsResult<()> {
        if self.current.is_none() {
            anyhow::bail!(PostScriptError::NoCurrentPoint);
        }

        self.push(
            SegmentCommand::CurveTo(
                Point::new(x1, y1),
                Point::new(x2, y2),
                Point::new(x3, y3),
            ),
            ctm,
        );
        self.current = Some((Point::new(x3, y3), *ctm));

        Ok(())
    }

    /// Returns the current point to the most recent subpath start
    pub fn close(&mut self, ctm: &Matrix) -> PsResult<()> {
        if self.current.is_none() {
            anyhow::bail!(PostScriptError::NoCurrentPoint);
        }

        self.push(SegmentCommand::Close, ctm);
        self.current = self.start;

        Ok(())
    }

    /// Circular arc around (cx, cy); angles in degrees, counterclockwise
    /// when `ccw`. A line connects the current point to the arc start when
    /// one exists.
    pub fn arc(
        &mut self,
        ctm: &Matrix,
        cx: f64,
        cy: f64,
        radius: f64,
        start_deg: f64,
        end_deg: f64,
        ccw: bool,
    ) -> PsResult<()> {
        let mut a1 = start_deg.to_radians();
        let mut a2 = end_deg.to_radians();

        if ccw {
            while a2 < a1 {
                a2 += 2.0 * std::f64::consts::PI;
            }
        } else {
            while a2 > a1 {
                a2 -= 2.0 * std::f64::consts::PI;
            }
        }

        let start = Point::new(cx + radius * a1.cos(), cy + radius * a1.sin());

        if self.current.is_some() {
            self.line_to(ctm, start.x, start.y)?;
        } else {
            self.move_to(ctm, start.x, start.y);
        }

        // quarter-arc subdivision, one cubic per piece
        let total = a2 - a1;
        let pieces = (total.abs() / std::f64::consts::FRAC_PI_2).ceil().max(1.0) as usize;
        let step = total / pieces as f64;

        for _ in 0..pieces {
            let t1 = a1 + step;
            self.append_arc_cubic(ctm, cx, cy, radius, a1, t1)?;
            a1 = t1;
        }

        Ok(())
    }

    /// One cubic for the arc slice t0..t1, using α = (4/3)·tan(Δθ/4)
    fn append_arc_cubic(
        &mut self,
        ctm: &Matrix,
        cx: f64,
        cy: f64,
        r: f64,
        t0: f64,
        t1: f64,
    ) -> PsResult<()> {
        let (sin0, cos0) = t0.sin_cos();
        let (sin1, cos1) = t1.sin_cos();

        let alpha = ((t1 - t0) / 4.0).tan() * 4.0 / 3.0;

        let x0 = cx + r * cos0;
        let y0 = cy + r * sin0;

        let x1 = x0 - r * alpha * sin0;
        let y1 = y0 + r * alpha * cos0;

        let x3 = cx + r * cos1;
        let y3 = cy + r * sin1;

        let x2 = x3 + r * alpha * sin1;
        let y2 = y3 - r * alpha * cos1;

        self.curve_to(ctm, x1, y1, x2, y2, x3, y3)
    }

    /// Tangent-arc construction: a line to the first tangent point and an
    /// arc to the second. Returns both tangent points; the current point
    /// ends at the second.
    pub fn arc_to(
        &mut self,
        ctm: &Matrix,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        r: f64,
    ) -> PsResult<(Point, Point)> {
        let p0 = self.current_point_user(ctm)?;

        // direction vectors away from the corner
        let d1 = Point::new(p0.x - x1, p0.y - y1);
        let d2 = Point::new(x2 - x1, y2 - y1);

        let len1 = d1.distance(Point::default());
        let len2 = d2.distance(Point::default());

        if len1 == 0.0 || len2 == 0.0 {
            anyhow::bail!(PostScriptError::UndefinedResult);
        }

        let v1 = d1 * (1.0 / len1);
        let v2 = d2 * (1.0 / len2);

        // interior angle at the corner
        let dot = (v1.x * v2.x + v1.y * v2.y).clamp(-1.0, 1.0);
        let theta = dot.acos();

        if theta.sin() < 1e-12 {
            // collinear: the arc degenerates to a line through the corner
            self.line_to(ctm, x1, y1)?;
            let t = Point::new(x1, y1);
            return Ok((t, t));
        }

        // distance from the corner back to the tangent points
        let d = r / (theta / 2.0).tan();

        let t1 = Point::new(x1 + v1.x * d, y1 + v1.y * d);
        let t2 = Point::new(x1 + v2.x * d, y1 + v2.y * d);

        // the bisector points from the corner toward the arc center
        let mut bx = v1.x + v2.x;
        let mut by = v1.y + v2.y;
        let blen = (bx * bx + by * by).sqrt();
        bx /= blen;
        by /= blen;

        let h = r / (theta / 2.0).sin();
        let center = Point::new(x1 + bx * h, y1 + by * h);

        // sweep direction from the signed area of (t1 - c) × (t2 - c)
        let cross = (t1.x - center.x) * (t2.y - center.y) - (t2.x - center.x) * (t1.y - center.y);
        let ccw = cross > 0.0;

        let a1 = (t1.y - center.y).atan2(t1.x - center.x);
        let a2 = (t2.y - center.y).atan2(t2.x - center.x);

        self.line_to(ctm, t1.x, t1.y)?;
        self.arc(
            ctm,
            center.x,
            center.y,
            r,
            a1.to_degrees(),
            a2.to_degrees(),
            ccw,
        )?;

        Ok((t1, t2))
    }

    pub fn rect(&mut self, ctm: &Matrix, x: f64, y: f64, width: f64, height: f64) -> PsResult<()> {
        self.move_to(ctm, x, y);
        self.line_to(ctm, x + width, y)?;
        self.line_to(ctm, x + width, y + height)?;
        self.line_to(ctm, x, y + height)?;
        self.close(ctm)
    }

    /// Bounding box over every segment's control points, each taken through
    /// its construction-time snapshot
    pub fn bounding_box(&self) -> Option<(f64, f64, f64, f64)> {
        let mut bbox: Option<(f64, f64, f64, f64)> = None;

        let mut include = |p: Point| {
            bbox = Some(match bbox {
                None => (p.x, p.y, p.x, p.y),
                Some((min_x, min_y, max_x, max_y)) => (
                    min_x.min(p.x),
                    min_y.min(p.y),
                    max_x.max(p.x),
                    max_y.max(p.y),
                ),
            });
        };

        for seg in &self.segments {
            match seg.command {
                SegmentCommand::MoveTo(p) | SegmentCommand::LineTo(p) => {
                    include(p.transformed(&seg.transform))
                }
                SegmentCommand::CurveTo(p1, p2, p3) => {
                    include(p1.transformed(&seg.transform));
                    include(p2.transformed(&seg.transform));
                    include(p3.transformed(&seg.transform));
                }
                SegmentCommand::Close => {}
            }
        }

        bbox
    }

    /// Replace curves with line segments by recursive subdivision until the
    /// maximum control-point-to-chord distance is within `flatness`. The
    /// result is in device space with identity snapshots.
    pub fn flattened(&self, flatness: f64) -> Path {
        let identity = Matrix::identity();
        let mut out = Path::new();
        let mut current = Point::default();

        for seg in &self.segments {
            match seg.command {
                SegmentCommand::MoveTo(p) => {
                    current = p.transformed(&seg.transform);
                    out.move_to(&identity, current.x, current.y);
                }
                SegmentCommand::LineTo(p) => {
                    current = p.transformed(&seg.transform);
                    let _ = out.line_to(&identity, current.x, current.y);
                }
                SegmentCommand::CurveTo(p1, p2, p3) => {
                    let c1 = p1.transformed(&seg.transform);
                    let c2 = p2.transformed(&seg.transform);
                    let c3 = p3.transformed(&seg.transform);

                    flatten_cubic(&mut out, current, c1, c2, c3, flatness.max(0.001), 0);
                    current = c3;
                }
                SegmentCommand::Close => {
                    let _ = out.close(&identity);
                    if let Some(p) = out.current_point() {
                        current = p;
                    }
                }
            }
        }

        out
    }
}

fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let chord = b - a;
    let len = chord.distance(Point::default());

    if len < 1e-12 {
        return p.distance(a);
    }

    ((p.x - a.x) * chord.y - (p.y - a.y) * chord.x).abs() / len
}

fn flatten_cubic(out: &mut Path, p0: Point, p1: Point, p2: Point, p3: Point, flatness: f64, depth: u32) {
    const MAX_DEPTH: u32 = 16;

    let d1 = perpendicular_distance(p1, p0, p3);
    let d2 = perpendicular_distance(p2, p0, p3);

    if (d1 <= flatness && d2 <= flatness) || depth >= MAX_DEPTH {
        let _ = out.line_to(&Matrix::identity(), p3.x, p3.y);
        return;
    }

    // de Casteljau split at t = 1/2
    let p01 = p0.midpoint(p1);
    let p12 = p1.midpoint(p2);
    let p23 = p2.midpoint(p3);
    let p012 = p01.midpoint(p12);
    let p123 = p12.midpoint(p23);
    let mid = p012.midpoint(p123);

    flatten_cubic(out, p0, p01, p012, mid, flatness, depth + 1);
    flatten_cubic(out, mid, p123, p23, p3, flatness, depth + 1);
}

#[cfg(test)]
mod test {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn moveto_sets_current_point() {
        let mut path = Path::new();
        let ctm = Matrix::identity();

        path.move_to(&ctm, 10.0, 20.0);
        assert_eq!(path.current_point(), Some(Point::new(10.0, 20.0)));
    }

    #[test]
    fn lineto_without_current_point_fails() {
        let mut path = Path::new();
        assert!(path.line_to(&Matrix::identity(), 1.0, 1.0).is_err());
    }

    #[test]
    fn close_returns_to_subpath_start() {
        let mut path = Path::new();
        let ctm = Matrix::identity();

        path.move_to(&ctm, 10.0, 10.0);
        path.line_to(&ctm, 100.0, 10.0).unwrap();
        path.line_to(&ctm, 100.0, 100.0).unwrap();
        path.close(&ctm).unwrap();

        assert_eq!(path.current_point(), Some(Point::new(10.0, 10.0)));
    }

    #[test]
    fn current_point_uses_moveto_time_ctm() {
        let mut path = Path::new();
        let ctm = Matrix::scaling(2.0, 3.0);

        path.move_to(&ctm, 5.0, 5.0);
        path.close(&ctm).unwrap();

        assert_eq!(path.current_point(), Some(Point::new(10.0, 15.0)));
    }

    #[test]
    fn bbox_of_triangle() {
        let mut path = Path::new();
        let ctm = Matrix::identity();

        path.move_to(&ctm, 10.0, 10.0);
        path.line_to(&ctm, 100.0, 10.0).unwrap();
        path.line_to(&ctm, 100.0, 100.0).unwrap();
        path.close(&ctm).unwrap();

        assert_eq!(path.bounding_box(), Some((10.0, 10.0, 100.0, 100.0)));
    }

    #[test]
    fn later_ctm_changes_do_not_warp_segments() {
        let mut path = Path::new();

        path.move_to(&Matrix::identity(), 1.0, 1.0);
        path.line_to(&Matrix::scaling(10.0, 10.0), 2.0, 2.0).unwrap();

        assert_eq!(path.bounding_box(), Some((1.0, 1.0, 20.0, 20.0)));
    }

    #[test]
    fn full_circle_arc_stays_on_radius() {
        let mut path = Path::new();
        path.arc(&Matrix::identity(), 0.0, 0.0, 10.0, 0.0, 360.0, true)
            .unwrap();

        // four quarter cubics plus the initial moveto
        assert_eq!(path.segments.len(), 5);

        let flat = path.flattened(0.01);
        for seg in &flat.segments {
            if let SegmentCommand::LineTo(p) = seg.command {
                let r = p.distance(Point::default());
                assert!((r - 10.0).abs() < 0.05, "point off circle: r = {}", r);
            }
        }
    }

    #[test]
    fn arc_endpoint_becomes_current_point() {
        let mut path = Path::new();
        path.arc(&Matrix::identity(), 0.0, 0.0, 5.0, 0.0, 90.0, true)
            .unwrap();

        let p = path.current_point().unwrap();
        assert!((p.x - 0.0).abs() < EPSILON);
        assert!((p.y - 5.0).abs() < EPSILON);
    }

    #[test]
    fn arcn_sweeps_clockwise() {
        let mut path = Path::new();
        path.arc(&Matrix::identity(), 0.0, 0.0, 5.0, 90.0, 0.0, false)
            .unwrap();

        let p = path.current_point().unwrap();
        assert!((p.x - 5.0).abs() < EPSILON);
        assert!(p.y.abs() < EPSILON);
    }

    #[test]
    fn arcto_right_angle_tangents() {
        let mut path = Path::new();
        let ctm = Matrix::identity();

        // approach the corner (100, 0) heading for (100, 100) with r = 10
        path.move_to(&ctm, 0.0, 0.0);
        let (t1, t2) = path.arc_to(&ctm, 100.0, 0.0, 100.0, 100.0, 10.0).unwrap();

        assert!((t1.x - 90.0).abs() < EPSILON);
        assert!(t1.y.abs() < EPSILON);
        assert!((t2.x - 100.0).abs() < EPSILON);
        assert!((t2.y - 10.0).abs() < EPSILON);

        // current point ends at the second tangent point
        let p = path.current_point().unwrap();
        assert!((p.x - 100.0).abs() < 1e-6);
        assert!((p.y - 10.0).abs() < 1e-6);
    }

    #[test]
    fn flatten_respects_flatness() {
        let mut path = Path::new();
        let ctm = Matrix::identity();

        path.move_to(&ctm, 0.0, 0.0);
        path.curve_to(&ctm, 0.0, 100.0, 100.0, 100.0, 100.0, 0.0)
            .unwrap();

        let coarse = path.flattened(10.0).segments.len();
        let fine = path.flattened(0.1).segments.len();

        assert!(fine > coarse);
    }
}
