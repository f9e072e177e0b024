//! Graphics-state, paint, and painting operators.

use crate::{
    device::ImageRecord,
    dictionary::{new_dict_ref, Dictionary},
    error::{PostScriptError, PsResult},
    graphics_state::{GraphicsState, LineCap, LineJoin, Paint},
    interpreter::{object_to_matrix, Interpreter},
    matrix::Matrix,
    name::Name,
    object::{ArrayRef, Object, Value},
    path::Path,
    operators::op,
};

pub(crate) fn install(dict: &mut Dictionary) {
    op(dict, b"gsave", op_gsave);
    op(dict, b"grestore", op_grestore);
    op(dict, b"setlinewidth", op_setlinewidth);
    op(dict, b"currentlinewidth", op_currentlinewidth);
    op(dict, b"setlinecap", op_setlinecap);
    op(dict, b"currentlinecap", op_currentlinecap);
    op(dict, b"setlinejoin", op_setlinejoin);
    op(dict, b"currentlinejoin", op_currentlinejoin);
    op(dict, b"setmiterlimit", op_setmiterlimit);
    op(dict, b"currentmiterlimit", op_currentmiterlimit);
    op(dict, b"setflat", op_setflat);
    op(dict, b"currentflat", op_currentflat);
    op(dict, b"setdash", op_setdash);
    op(dict, b"currentdash", op_currentdash);
    op(dict, b"setgray", op_setgray);
    op(dict, b"currentgray", op_currentgray);
    op(dict, b"setrgbcolor", op_setrgbcolor);
    op(dict, b"currentrgbcolor", op_currentrgbcolor);
    op(dict, b"setcmykcolor", op_setcmykcolor);
    op(dict, b"currentcmykcolor", op_currentcmykcolor);
    op(dict, b"fill", op_fill);
    op(dict, b"eofill", op_eofill);
    op(dict, b"stroke", op_stroke);
    op(dict, b"clip", op_clip);
    op(dict, b"eoclip", op_eoclip);
    op(dict, b"initclip", op_initclip);
    op(dict, b"erasepage", op_erasepage);
    op(dict, b"showpage", op_showpage);
    op(dict, b"image", op_image);
    op(dict, b"initgraphics", op_initgraphics);
    op(dict, b"setpagedevice", op_setpagedevice);
    op(dict, b"currentpagedevice", op_currentpagedevice);
}

fn op_gsave(interp: &mut Interpreter) -> PsResult<()> {
    interp.gstate_stack.push(interp.gstate.clone());
    interp.device.gsave();

    Ok(())
}

/// Restoring past the bottom of the graphics stack is a no-op
fn op_grestore(interp: &mut Interpreter) -> PsResult<()> {
    if let Some(state) = interp.gstate_stack.pop() {
        interp.gstate = state;
        interp.device.grestore();
        let ctm = interp.gstate.ctm;
        interp.device.set_ctm(&ctm);
    }

    Ok(())
}

fn op_setlinewidth(interp: &mut Interpreter) -> PsResult<()> {
    let width = interp.pop_number()?;

    if width < 0.0 {
        anyhow::bail!(PostScriptError::RangeCheck);
    }

    interp.gstate.line_width = width;

    Ok(())
}

fn op_currentlinewidth(interp: &mut Interpreter) -> PsResult<()> {
    interp.push(Object::real(interp.gstate.line_width))
}

fn op_setlinecap(interp: &mut Interpreter) -> PsResult<()> {
    interp.gstate.line_cap = match interp.pop_int()? {
        0 => LineCap::Butt,
        1 => LineCap::Round,
        2 => LineCap::Square,
        _ => anyhow::bail!(PostScriptError::RangeCheck),
    };

    Ok(())
}

fn op_currentlinecap(interp: &mut Interpreter) -> PsResult<()> {
    interp.push(Object::integer(interp.gstate.line_cap as i32))
}

fn op_setlinejoin(interp: &mut Interpreter) -> PsResult<()> {
    interp.gstate.line_join = match interp.pop_int()? {
        0 => LineJoin::Miter,
        1 => LineJoin::Round,
        2 => LineJoin::Bevel,
        _ => anyhow::bail!(PostScriptError::RangeCheck),
    };

    Ok(())
}

fn op_currentlinejoin(interp: &mut Interpreter) -> PsResult<()> {
    interp.push(Object::integer(interp.gstate.line_join as i32))
}

fn op_setmiterlimit(interp: &mut Interpreter) -> PsResult<()> {
    let limit = interp.pop_number()?;

    if limit < 1.0 {
        anyhow::bail!(PostScriptError::RangeCheck);
    }

    interp.gstate.miter_limit = limit;

    Ok(())
}

fn op_currentmiterlimit(interp: &mut Interpreter) -> PsResult<()> {
    interp.push(Object::real(interp.gstate.miter_limit))
}

fn op_setflat(interp: &mut Interpreter) -> PsResult<()> {
    let flatness = interp.pop_number()?;

    if flatness < 0.0 {
        anyhow::bail!(PostScriptError::RangeCheck);
    }

    interp.gstate.flatness = flatness;

    Ok(())
}

fn op_currentflat(interp: &mut Interpreter) -> PsResult<()> {
    interp.push(Object::real(interp.gstate.flatness))
}

fn op_setdash(interp: &mut Interpreter) -> PsResult<()> {
    let offset = interp.pop_number()?;
    let pattern = interp.pop_array()?;

    if offset < 0.0 {
        anyhow::bail!(PostScriptError::RangeCheck);
    }

    let mut dashes = Vec::with_capacity(pattern.len());

    for i in 0..pattern.len() {
        let value = pattern.get(i)?.expect_number()?;

        if value < 0.0 {
            anyhow::bail!(PostScriptError::RangeCheck);
        }

        dashes.push(value);
    }

    interp.gstate.dash_pattern = dashes;
    interp.gstate.dash_offset = offset;

    Ok(())
}

fn op_currentdash(interp: &mut Interpreter) -> PsResult<()> {
    let pattern: Vec<Object> = interp
        .gstate
        .dash_pattern
        .iter()
        .map(|&v| Object::real(v))
        .collect();

    interp.push(Object::array(crate::object::ArrayRef::from_objects(
        pattern,
    )))?;
    interp.push(Object::real(interp.gstate.dash_offset))
}

/// The color-setting operators replace both the fill and stroke paint
fn op_setgray(interp: &mut Interpreter) -> PsResult<()> {
    let gray = interp.pop_number()?.clamp(0.0, 1.0);

    interp.gstate.set_paint(Paint::Gray(gray));

    Ok(())
}

fn op_currentgray(interp: &mut Interpreter) -> PsResult<()> {
    interp.push(Object::real(interp.gstate.fill_paint.to_gray()))
}

fn op_setrgbcolor(interp: &mut Interpreter) -> PsResult<()> {
    let b = interp.pop_number()?.clamp(0.0, 1.0);
    let g = interp.pop_number()?.clamp(0.0, 1.0);
    let r = interp.pop_number()?.clamp(0.0, 1.0);

    interp.gstate.set_paint(Paint::Rgb(r, g, b));

    Ok(())
}

fn op_currentrgbcolor(interp: &mut Interpreter) -> PsResult<()> {
    let (r, g, b) = interp.gstate.fill_paint.to_rgb();

    interp.push(Object::real(r))?;
    interp.push(Object::real(g))?;
    interp.push(Object::real(b))
}

fn op_setcmykcolor(interp: &mut Interpreter) -> PsResult<()> {
    let k = interp.pop_number()?.clamp(0.0, 1.0);
    let y = interp.pop_number()?.clamp(0.0, 1.0);
    let m = interp.pop_number()?.clamp(0.0, 1.0);
    let c = interp.pop_number()?.clamp(0.0, 1.0);

    interp.gstate.set_paint(Paint::Cmyk(c, m, y, k));

    Ok(())
}

fn op_currentcmykcolor(interp: &mut Interpreter) -> PsResult<()> {
    let (c, m, y, k) = match interp.gstate.fill_paint {
        Paint::Cmyk(c, m, y, k) => (c, m, y, k),
        paint => {
            let (r, g, b) = paint.to_rgb();
            (1.0 - r, 1.0 - g, 1.0 - b, 0.0)
        }
    };

    interp.push(Object::real(c))?;
    interp.push(Object::real(m))?;
    interp.push(Object::real(y))?;
    interp.push(Object::real(k))
}

/// Painting consumes the current path
fn op_fill(interp: &mut Interpreter) -> PsResult<()> {
    interp.device.fill(&interp.gstate, false)?;
    interp.gstate.path = Path::new();

    Ok(())
}

fn op_eofill(interp: &mut Interpreter) -> PsResult<()> {
    interp.device.fill(&interp.gstate, true)?;
    interp.gstate.path = Path::new();

    Ok(())
}

fn op_stroke(interp: &mut Interpreter) -> PsResult<()> {
    interp.device.stroke(&interp.gstate)?;
    interp.gstate.path = Path::new();

    Ok(())
}

/// Clipping intersects; the current path survives
fn op_clip(interp: &mut Interpreter) -> PsResult<()> {
    interp.device.clip(&interp.gstate, false);
    interp.gstate.clip = Some(interp.gstate.path.clone());

    Ok(())
}

fn op_eoclip(interp: &mut Interpreter) -> PsResult<()> {
    interp.device.clip(&interp.gstate, true);
    interp.gstate.clip = Some(interp.gstate.path.clone());

    Ok(())
}

fn op_initclip(interp: &mut Interpreter) -> PsResult<()> {
    interp.device.init_clip();
    interp.gstate.clip = None;

    Ok(())
}

fn op_erasepage(interp: &mut Interpreter) -> PsResult<()> {
    interp.device.erase_page();

    Ok(())
}

fn op_showpage(interp: &mut Interpreter) -> PsResult<()> {
    interp.device.show_page()
}

/// width height bits/comp matrix datasrc `image`
fn op_image(interp: &mut Interpreter) -> PsResult<()> {
    let source = interp.pop()?;
    let matrix_operand = interp.pop()?;
    let bits = interp.pop_int()?;
    let height = interp.pop_int()?;
    let width = interp.pop_int()?;

    if width < 0 || height < 0 {
        anyhow::bail!(PostScriptError::RangeCheck);
    }

    if !matches!(bits, 1 | 2 | 4 | 8) {
        anyhow::bail!(PostScriptError::RangeCheck);
    }

    let matrix = object_to_matrix(&matrix_operand)?;

    let row_bytes = ((width as usize) * (bits as usize) + 7) / 8;
    let expected = row_bytes * height as usize;

    let mut data = Vec::with_capacity(expected);

    match &source.value {
        Value::String(s) => data.extend_from_slice(&s.bytes()),
        Value::Array(_) if source.executable => {
            // the data source procedure is called until it delivers enough
            // bytes or comes up empty
            while data.len() < expected {
                interp.execute_object(source.clone())?;

                if interp.stop_requested || interp.exit_requested {
                    break;
                }

                let chunk = interp.pop_string()?;
                let bytes = chunk.bytes();

                if bytes.is_empty() {
                    break;
                }

                data.extend_from_slice(&bytes);
            }
        }
        Value::File(file) => {
            while data.len() < expected {
                let byte = file.borrow_mut().read_byte();

                match byte {
                    Some(b) => data.push(b),
                    None => break,
                }
            }
        }
        _ => anyhow::bail!(PostScriptError::TypeCheck),
    }

    data.truncate(expected);

    let record = ImageRecord {
        width,
        height,
        bits_per_component: bits,
        matrix,
        data,
    };

    interp.device.image(&interp.gstate, &record)
}

/// Equivalent to initmatrix newpath initclip plus the default line
/// attributes and paint; the current font survives
fn op_initgraphics(interp: &mut Interpreter) -> PsResult<()> {
    let font = interp.gstate.font.take();

    interp.gstate = GraphicsState::default();
    interp.gstate.font = font;

    interp.device.init_clip();
    interp.device.set_ctm(&Matrix::identity());

    Ok(())
}

/// Only the PageSize request is honored
fn op_setpagedevice(interp: &mut Interpreter) -> PsResult<()> {
    let dict = interp.pop_dict()?;

    let page_size = match dict.borrow().get(Name::new(b"PageSize")) {
        Some(Object {
            value: Value::Array(arr),
            ..
        }) => arr.clone(),
        Some(_) => anyhow::bail!(PostScriptError::TypeCheck),
        None => anyhow::bail!(PostScriptError::Undefined {
            key: Name::new(b"PageSize"),
        }),
    };

    if page_size.len() != 2 {
        anyhow::bail!(PostScriptError::RangeCheck);
    }

    let width = page_size.get(0)?.expect_number()?;
    let height = page_size.get(1)?.expect_number()?;

    interp.page_size = (width, height);

    Ok(())
}

fn op_currentpagedevice(interp: &mut Interpreter) -> PsResult<()> {
    let (width, height) = interp.page_size;

    let page_size = ArrayRef::from_objects(vec![Object::real(width), Object::real(height)]);

    let dict = new_dict_ref(Dictionary::new());
    dict.borrow_mut()
        .insert(Name::new(b"PageSize"), Object::array(page_size));

    interp.push(Object::dictionary(dict))
}
