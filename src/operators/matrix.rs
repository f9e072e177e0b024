//! Matrix and coordinate-system operators.
//!
//! `translate`, `scale`, and `rotate` come in two forms: with a matrix
//! operand they fill and return it, with bare numbers they update the CTM.
//! The transform family likewise accepts an explicit matrix or falls back
//! to the CTM.

use crate::{
    dictionary::Dictionary,
    error::{PostScriptError, PsResult},
    interpreter::{object_to_matrix, Interpreter},
    matrix::Matrix,
    object::{Object, Value},
    operators::op,
};

pub(crate) fn install(dict: &mut Dictionary) {
    op(dict, b"matrix", op_matrix);
    op(dict, b"identmatrix", op_identmatrix);
    op(dict, b"currentmatrix", op_currentmatrix);
    op(dict, b"setmatrix", op_setmatrix);
    op(dict, b"defaultmatrix", op_defaultmatrix);
    op(dict, b"initmatrix", op_initmatrix);
    op(dict, b"invertmatrix", op_invertmatrix);
    op(dict, b"concatmatrix", op_concatmatrix);
    op(dict, b"concat", op_concat);
    op(dict, b"translate", op_translate);
    op(dict, b"scale", op_scale);
    op(dict, b"rotate", op_rotate);
    op(dict, b"transform", op_transform);
    op(dict, b"dtransform", op_dtransform);
    op(dict, b"itransform", op_itransform);
    op(dict, b"idtransform", op_idtransform);
}

fn is_matrix_operand(obj: &Object) -> bool {
    matches!(obj.value, Value::Matrix(_) | Value::Array(_))
}

fn op_matrix(interp: &mut Interpreter) -> PsResult<()> {
    interp.push(Object::matrix(Matrix::identity()))
}

fn op_identmatrix(interp: &mut Interpreter) -> PsResult<()> {
    let target = interp.pop()?;

    interp.store_matrix(target, Matrix::identity())
}

fn op_currentmatrix(interp: &mut Interpreter) -> PsResult<()> {
    let target = interp.pop()?;
    let ctm = interp.gstate.ctm;

    interp.store_matrix(target, ctm)
}

fn op_setmatrix(interp: &mut Interpreter) -> PsResult<()> {
    let m = interp.pop_matrix()?;

    interp.gstate.ctm = m;
    interp.device.set_ctm(&m);

    Ok(())
}

/// The device default; user space starts out untransformed
fn op_defaultmatrix(interp: &mut Interpreter) -> PsResult<()> {
    let target = interp.pop()?;

    interp.store_matrix(target, Matrix::identity())
}

fn op_initmatrix(interp: &mut Interpreter) -> PsResult<()> {
    interp.gstate.ctm = Matrix::identity();
    interp.device.set_ctm(&interp.gstate.ctm);

    Ok(())
}

fn op_invertmatrix(interp: &mut Interpreter) -> PsResult<()> {
    let m = interp.pop_matrix()?;

    match m.inverse() {
        Some(inv) => interp.push(Object::matrix(inv)),
        None => anyhow::bail!(PostScriptError::UndefinedResult),
    }
}

/// m1 m2 `concatmatrix` — the product "m1 then m2"
fn op_concatmatrix(interp: &mut Interpreter) -> PsResult<()> {
    let m2 = interp.pop_matrix()?;
    let m1 = interp.pop_matrix()?;

    let mut result = m2;
    result.pre_multiply(&m1);

    interp.push(Object::matrix(result))
}

fn op_concat(interp: &mut Interpreter) -> PsResult<()> {
    let m = interp.pop_matrix()?;

    interp.gstate.ctm.pre_multiply(&m);
    let ctm = interp.gstate.ctm;
    interp.device.set_ctm(&ctm);

    Ok(())
}

fn op_translate(interp: &mut Interpreter) -> PsResult<()> {
    let top = interp.pop()?;

    if is_matrix_operand(&top) {
        let ty = interp.pop_number()?;
        let tx = interp.pop_number()?;

        interp.store_matrix(top, Matrix::translation(tx, ty))
    } else {
        let ty = top.expect_number()?;
        let tx = interp.pop_number()?;

        interp.gstate.ctm.translate(tx, ty);
        let ctm = interp.gstate.ctm;
        interp.device.set_ctm(&ctm);

        Ok(())
    }
}

fn op_scale(interp: &mut Interpreter) -> PsResult<()> {
    let top = interp.pop()?;

    if is_matrix_operand(&top) {
        let sy = interp.pop_number()?;
        let sx = interp.pop_number()?;

        interp.store_matrix(top, Matrix::scaling(sx, sy))
    } else {
        let sy = top.expect_number()?;
        let sx = interp.pop_number()?;

        interp.gstate.ctm.scale(sx, sy);
        let ctm = interp.gstate.ctm;
        interp.device.set_ctm(&ctm);

        Ok(())
    }
}

fn op_rotate(interp: &mut Interpreter) -> PsResult<()> {
    let top = interp.pop()?;

    if is_matrix_operand(&top) {
        let angle = interp.pop_number()?;

        interp.store_matrix(top, Matrix::rotation(angle))
    } else {
        let angle = top.expect_number()?;

        interp.gstate.ctm.rotate(angle);
        let ctm = interp.gstate.ctm;
        interp.device.set_ctm(&ctm);

        Ok(())
    }
}

/// Pop the optional matrix operand of the transform family; falls back to
/// the CTM
fn transform_matrix(interp: &mut Interpreter) -> PsResult<Matrix> {
    let explicit = matches!(interp.peek(), Some(obj) if is_matrix_operand(obj));

    if explicit {
        let obj = interp.pop()?;
        object_to_matrix(&obj)
    } else {
        Ok(interp.gstate.ctm)
    }
}

fn op_transform(interp: &mut Interpreter) -> PsResult<()> {
    let m = transform_matrix(interp)?;
    let y = interp.pop_number()?;
    let x = interp.pop_number()?;

    let (tx, ty) = m.transform_point(x, y);

    interp.push(Object::real(tx))?;
    interp.push(Object::real(ty))
}

fn op_dtransform(interp: &mut Interpreter) -> PsResult<()> {
    let m = transform_matrix(interp)?;
    let dy = interp.pop_number()?;
    let dx = interp.pop_number()?;

    let (tx, ty) = m.dtransform(dx, dy);

    interp.push(Object::real(tx))?;
    interp.push(Object::real(ty))
}

fn inverse_of(m: Matrix) -> PsResult<Matrix> {
    match m.inverse() {
        Some(inv) => Ok(inv),
        None => anyhow::bail!(PostScriptError::UndefinedResult),
    }
}

fn op_itransform(interp: &mut Interpreter) -> PsResult<()> {
    let m = inverse_of(transform_matrix(interp)?)?;
    let y = interp.pop_number()?;
    let x = interp.pop_number()?;

    let (tx, ty) = m.transform_point(x, y);

    interp.push(Object::real(tx))?;
    interp.push(Object::real(ty))
}

fn op_idtransform(interp: &mut Interpreter) -> PsResult<()> {
    let m = inverse_of(transform_matrix(interp)?)?;
    let dy = interp.pop_number()?;
    let dx = interp.pop_number()?;

    let (tx, ty) = m.dtransform(dx, dy);

    interp.push(Object::real(tx))?;
    interp.push(Object::real(ty))
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
    fn scale_updates_the_ctm() {
        let mut interp = run(b"2 3 scale 10 10 transform");

        assert_eq!(interp.pop_number().unwrap(), 30.0);
        assert_eq!(interp.pop_number().unwrap(), 20.0);
    }

    #[test]
    fn translate_then_itransform_round_trips() {
        let mut interp = run(b"5 7 translate 10 10 transform itransform");

        assert!((interp.pop_number().unwrap() - 10.0).abs() < 1e-9);
        assert!((interp.pop_number().unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn matrix_operand_form_fills_a_matrix() {
        let mut interp = run(b"/m 2 3 matrix scale def 4 5 m transform");

        assert_eq!(interp.pop_number().unwrap(), 15.0);
        assert_eq!(interp.pop_number().unwrap(), 8.0);
    }

    #[test]
    fn array_operand_is_filled_in_place() {
        let mut interp = run(b"[1 0 0 1 0 0] dup 2 3 3 -1 roll scale pop 0 get");

        assert_eq!(interp.pop_number().unwrap(), 2.0);
    }

    #[test]
    fn invertmatrix_fails_on_singular() {
        let mut interp = Interpreter::new(b"[0 0 0 0 0 0] invertmatrix");
        assert!(interp.run().is_err());
    }

    #[test]
    fn invertmatrix_undoes_scaling() {
        let mut interp = run(b"4 6 2 3 matrix scale invertmatrix transform");

        assert_eq!(interp.pop_number().unwrap(), 2.0);
        assert_eq!(interp.pop_number().unwrap(), 2.0);
    }

    #[test]
    fn dtransform_ignores_translation() {
        let mut interp = run(b"100 200 translate 3 4 dtransform");

        assert_eq!(interp.pop_number().unwrap(), 4.0);
        assert_eq!(interp.pop_number().unwrap(), 3.0);
    }

    #[test]
    fn concatmatrix_composes_in_order() {
        // scale then translate: the translation is unscaled
        let mut interp =
            run(b"2 2 matrix scale 10 0 matrix translate concatmatrix 1 0 3 -1 roll transform");

        assert_eq!(interp.pop_number().unwrap(), 0.0);
        assert_eq!(interp.pop_number().unwrap(), 12.0);
    }

    #[test]
    fn setmatrix_replaces_the_ctm() {
        let mut interp = run(b"5 5 scale matrix setmatrix 2 2 transform");

        assert_eq!(interp.pop_number().unwrap(), 2.0);
        assert_eq!(interp.pop_number().unwrap(), 2.0);
    }
}
