//! Array construction and whole-array transfer operators.

use crate::{
    dictionary::Dictionary,
    error::{PostScriptError, PsResult},
    interpreter::Interpreter,
    object::{ArrayRef, Object},
    operators::op,
};

pub(crate) fn install(dict: &mut Dictionary) {
    op(dict, b"array", op_array);
    op(dict, b"]", op_array_from_mark);
    op(dict, b"aload", op_aload);
    op(dict, b"astore", op_astore);
}

fn op_array(interp: &mut Interpreter) -> PsResult<()> {
    let len = interp.pop_usize()?;

    interp.push(Object::array(ArrayRef::from_objects(vec![
        Object::null();
        len
    ])))
}

/// `]` — pop objects back to the matching mark and build a literal array
fn op_array_from_mark(interp: &mut Interpreter) -> PsResult<()> {
    let mut elements = Vec::new();

    loop {
        match interp.operand_stack.pop() {
            Some(obj) if obj.is_mark() => break,
            Some(obj) => elements.push(obj),
            None => anyhow::bail!(PostScriptError::UnmatchedMark),
        }
    }

    elements.reverse();

    interp.push(Object::array(ArrayRef::from_objects(elements)))
}

/// array `aload` — push every element, then the array itself
fn op_aload(interp: &mut Interpreter) -> PsResult<()> {
    let arr = interp.pop_array()?;

    for i in 0..arr.len() {
        interp.push(arr.get(i)?)?;
    }

    interp.push(Object::array(arr))
}

/// array `astore` — pop length elements into the array, bottommost first
fn op_astore(interp: &mut Interpreter) -> PsResult<()> {
    let arr = interp.pop_array()?;

    if interp.operand_stack.len() < arr.len() {
        anyhow::bail!(PostScriptError::StackUnderflow);
    }

    for i in (0..arr.len()).rev() {
        let obj = interp.pop()?;
        arr.put(i, obj)?;
    }

    interp.push(Object::array(arr))
}
