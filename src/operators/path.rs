//! Path construction operators.

use std::{cell::RefCell, rc::Rc};

use crate::{
    dictionary::Dictionary,
    error::{PostScriptError, PsResult},
    interpreter::Interpreter,
    object::{Object, Value},
    path::Path,
    operators::op,
};

pub(crate) fn install(dict: &mut Dictionary) {
    op(dict, b"newpath", op_newpath);
    op(dict, b"currentpoint", op_currentpoint);
    op(dict, b"moveto", op_moveto);
    op(dict, b"rmoveto", op_rmoveto);
    op(dict, b"lineto", op_lineto);
    op(dict, b"rlineto", op_rlineto);
    op(dict, b"curveto", op_curveto);
    op(dict, b"rcurveto", op_rcurveto);
    op(dict, b"closepath", op_closepath);
    op(dict, b"arc", op_arc);
    op(dict, b"arcn", op_arcn);
    op(dict, b"arcto", op_arcto);
    op(dict, b"rectpath", op_rectpath);
    op(dict, b"flattenpath", op_flattenpath);
    op(dict, b"pathbbox", op_pathbbox);
    op(dict, b"clippath", op_clippath);
}

fn op_newpath(interp: &mut Interpreter) -> PsResult<()> {
    interp.gstate.path = Path::new();

    Ok(())
}

fn op_currentpoint(interp: &mut Interpreter) -> PsResult<()> {
    let p = interp.gstate.path.current_point_user(&interp.gstate.ctm)?;

    interp.push(Object::real(p.x))?;
    interp.push(Object::real(p.y))
}

fn op_moveto(interp: &mut Interpreter) -> PsResult<()> {
    let y = interp.pop_number()?;
    let x = interp.pop_number()?;

    let ctm = interp.gstate.ctm;
    interp.gstate.path.move_to(&ctm, x, y);

    Ok(())
}

fn op_rmoveto(interp: &mut Interpreter) -> PsResult<()> {
    let dy = interp.pop_number()?;
    let dx = interp.pop_number()?;

    let ctm = interp.gstate.ctm;
    let p = interp.gstate.path.current_point_user(&ctm)?;
    interp.gstate.path.move_to(&ctm, p.x + dx, p.y + dy);

    Ok(())
}

fn op_lineto(interp: &mut Interpreter) -> PsResult<()> {
    let y = interp.pop_number()?;
    let x = interp.pop_number()?;

    let ctm = interp.gstate.ctm;
    interp.gstate.path.line_to(&ctm, x, y)
}

fn op_rlineto(interp: &mut Interpreter) -> PsResult<()> {
    let dy = interp.pop_number()?;
    let dx = interp.pop_number()?;

    let ctm = interp.gstate.ctm;
    let p = interp.gstate.path.current_point_user(&ctm)?;
    interp.gstate.path.line_to(&ctm, p.x + dx, p.y + dy)
}

fn op_curveto(interp: &mut Interpreter) -> PsResult<()> {
    let y3 = interp.pop_number()?;
    let x3 = interp.pop_number()?;
    let y2 = interp.pop_number()?;
    let x2 = interp.pop_number()?;
    let y1 = interp.pop_number()?;
    let x1 = interp.pop_number()?;

    let ctm = interp.gstate.ctm;
    interp.gstate.path.curve_to(&ctm, x1, y1, x2, y2, x3, y3)
}

fn op_rcurveto(interp: &mut Interpreter) -> PsResult<()> {
    let dy3 = interp.pop_number()?;
    let dx3 = interp.pop_number()?;
    let dy2 = interp.pop_number()?;
    let dx2 = interp.pop_number()?;
    let dy1 = interp.pop_number()?;
    let dx1 = interp.pop_number()?;

    let ctm = interp.gstate.ctm;
    let p = interp.gstate.path.current_point_user(&ctm)?;

    interp.gstate.path.curve_to(
        &ctm,
        p.x + dx1,
        p.y + dy1,
        p.x + dx2,
        p.y + dy2,
        p.x + dx3,
        p.y + dy3,
    )
}

fn op_closepath(interp: &mut Interpreter) -> PsResult<()> {
    // closing an empty path is a no-op, not an error
    if !interp.gstate.path.has_current_point() {
        return Ok(());
    }

    let ctm = interp.gstate.ctm;
    interp.gstate.path.close(&ctm)
}

fn arc_operands(interp: &mut Interpreter) -> PsResult<(f64, f64, f64, f64, f64)> {
    let end = interp.pop_number()?;
    let start = interp.pop_number()?;
    let radius = interp.pop_number()?;
    let cy = interp.pop_number()?;
    let cx = interp.pop_number()?;

    if radius < 0.0 {
        anyhow::bail!(PostScriptError::RangeCheck);
    }

    Ok((cx, cy, radius, start, end))
}

fn op_arc(interp: &mut Interpreter) -> PsResult<()> {
    let (cx, cy, radius, start, end) = arc_operands(interp)?;

    let ctm = interp.gstate.ctm;
    interp.gstate.path.arc(&ctm, cx, cy, radius, start, end, true)
}

fn op_arcn(interp: &mut Interpreter) -> PsResult<()> {
    let (cx, cy, radius, start, end) = arc_operands(interp)?;

    let ctm = interp.gstate.ctm;
    interp
        .gstate
        .path
        .arc(&ctm, cx, cy, radius, start, end, false)
}

/// x1 y1 x2 y2 r `arcto` xt1 yt1 xt2 yt2
fn op_arcto(interp: &mut Interpreter) -> PsResult<()> {
    let r = interp.pop_number()?;
    let y2 = interp.pop_number()?;
    let x2 = interp.pop_number()?;
    let y1 = interp.pop_number()?;
    let x1 = interp.pop_number()?;

    if r < 0.0 {
        anyhow::bail!(PostScriptError::RangeCheck);
    }

    let ctm = interp.gstate.ctm;
    let (t1, t2) = interp.gstate.path.arc_to(&ctm, x1, y1, x2, y2, r)?;

    interp.push(Object::real(t1.x))?;
    interp.push(Object::real(t1.y))?;
    interp.push(Object::real(t2.x))?;
    interp.push(Object::real(t2.y))
}

fn op_rectpath(interp: &mut Interpreter) -> PsResult<()> {
    let height = interp.pop_number()?;
    let width = interp.pop_number()?;
    let y = interp.pop_number()?;
    let x = interp.pop_number()?;

    let ctm = interp.gstate.ctm;
    interp.gstate.path.rect(&ctm, x, y, width, height)
}

fn op_flattenpath(interp: &mut Interpreter) -> PsResult<()> {
    let flatness = interp.gstate.flatness;

    interp.gstate.path = interp.gstate.path.flattened(flatness);

    Ok(())
}

/// llx lly urx ury of the current path — or of a path object left on the
/// stack
fn op_pathbbox(interp: &mut Interpreter) -> PsResult<()> {
    let bbox = match interp.peek() {
        Some(Object {
            value: Value::Path(path),
            ..
        }) => path.borrow().bounding_box(),
        _ => interp.gstate.path.bounding_box(),
    };

    let (llx, lly, urx, ury) = match bbox {
        Some(bbox) => bbox,
        None => anyhow::bail!(PostScriptError::NoCurrentPoint),
    };

    interp.push(Object::real(llx))?;
    interp.push(Object::real(lly))?;
    interp.push(Object::real(urx))?;
    interp.push(Object::real(ury))
}

fn op_clippath(interp: &mut Interpreter) -> PsResult<()> {
    let clip = interp.gstate.clip.clone().unwrap_or_default();

    interp.push(Object::literal(Value::Path(Rc::new(RefCell::new(clip)))))
}

#[cfg(test)]
mod test {
    use crate::interpreter::Interpreter;

    fn run(source: &[u8]) -> Interpreter {
        let mut interp = Interpreter::new(source);
        interp.run().unwrap();
        interp
    }

    #[test]
    fn moveto_closepath_restores_start() {
        let mut interp = run(b"10 20 moveto 50 60 lineto closepath currentpoint");

        assert_eq!(interp.pop_number().unwrap(), 20.0);
        assert_eq!(interp.pop_number().unwrap(), 10.0);
    }

    #[test]
    fn relative_operators_add_to_the_current_point() {
        let mut interp = run(b"10 10 moveto 5 -3 rmoveto currentpoint");

        assert_eq!(interp.pop_number().unwrap(), 7.0);
        assert_eq!(interp.pop_number().unwrap(), 15.0);
    }

    #[test]
    fn lineto_without_point_raises_nocurrentpoint() {
        let mut interp = Interpreter::new(b"1 2 lineto");
        assert!(interp.run().is_err());
    }

    #[test]
    fn rectpath_bbox() {
        let mut interp = run(b"5 6 20 10 rectpath pathbbox");

        assert_eq!(interp.pop_number().unwrap(), 16.0);
        assert_eq!(interp.pop_number().unwrap(), 25.0);
        assert_eq!(interp.pop_number().unwrap(), 6.0);
        assert_eq!(interp.pop_number().unwrap(), 5.0);
    }

    #[test]
    fn arc_advances_the_current_point() {
        let mut interp = run(b"0 0 10 0 90 arc currentpoint");

        assert!((interp.pop_number().unwrap() - 10.0).abs() < 1e-9);
        assert!(interp.pop_number().unwrap().abs() < 1e-9);
    }

    #[test]
    fn arcto_pushes_the_tangent_points() {
        let mut interp = run(b"0 0 moveto 100 0 100 100 10 arcto");

        assert!((interp.pop_number().unwrap() - 10.0).abs() < 1e-9);
        assert!((interp.pop_number().unwrap() - 100.0).abs() < 1e-9);
        assert!(interp.pop_number().unwrap().abs() < 1e-9);
        assert!((interp.pop_number().unwrap() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn flattenpath_removes_curves() {
        let mut interp = run(
            b"0 0 moveto 0 10 10 10 10 0 curveto flattenpath pathbbox",
        );

        // the flattened path stays within the curve's hull
        let ury = interp.pop_number().unwrap();
        assert!(ury <= 10.0 + 1e-9);
    }

    #[test]
    fn moveto_uses_the_ctm_at_construction_time() {
        let mut interp = run(b"2 2 scale 5 5 moveto 1 1 scale pathbbox");

        assert_eq!(interp.pop_number().unwrap(), 10.0);
        assert_eq!(interp.pop_number().unwrap(), 10.0);
    }
}
