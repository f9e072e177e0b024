//! String creation and conversion to/from text.

use crate::{
    dictionary::Dictionary,
    error::{PostScriptError, PsResult},
    interpreter::Interpreter,
    name::Name,
    object::{Object, StringRef, Value},
    operators::{debug, op},
};

pub(crate) fn install(dict: &mut Dictionary) {
    op(dict, b"string", op_string);
    op(dict, b"cvs", op_cvs);
    op(dict, b"cvn", op_cvn);
}

fn op_string(interp: &mut Interpreter) -> PsResult<()> {
    let capacity = interp.pop_usize()?;

    interp.push(Object::string(StringRef::with_capacity(capacity)))
}

/// any string `cvs` substring — write the text form of any into string and
/// return the filled part
fn op_cvs(interp: &mut Interpreter) -> PsResult<()> {
    let target = interp.pop_string()?;
    let obj = interp.pop()?;

    let text = debug::shallow_bytes(&obj);

    if text.len() > target.capacity() {
        anyhow::bail!(PostScriptError::RangeCheck);
    }

    for (i, &b) in text.iter().enumerate() {
        target.put(i, b)?;
    }

    interp.push(Object::string(target.getinterval(0, text.len())?))
}

/// string `cvn` name — the executable attribute carries over
fn op_cvn(interp: &mut Interpreter) -> PsResult<()> {
    let obj = interp.pop()?;

    let s = match &obj.value {
        Value::String(s) => s,
        _ => anyhow::bail!(PostScriptError::TypeCheck),
    };

    let name = Name::new(&s.bytes());

    interp.push(Object {
        value: Value::Name(name),
        executable: obj.executable,
    })
}
