//! `save` and `restore`.
//!
//! Snapshots are shallow: a save object captures a generation counter plus
//! the graphics-state and dictionary stack depths, and restore rolls those
//! back. Mutations of composite objects are not reverted.

use crate::{
    dictionary::Dictionary,
    error::{PostScriptError, PsResult},
    interpreter::Interpreter,
    object::{Object, Value},
    operators::op,
};

pub(crate) fn install(dict: &mut Dictionary) {
    op(dict, b"save", op_save);
    op(dict, b"restore", op_restore);
    op(dict, b"vmstatus", op_vmstatus);
}

fn op_save(interp: &mut Interpreter) -> PsResult<()> {
    let record = interp.capture_save();

    interp.push(Object::literal(Value::Save(record)))
}

fn op_restore(interp: &mut Interpreter) -> PsResult<()> {
    let record = match interp.pop()?.value {
        Value::Save(record) => record,
        _ => anyhow::bail!(PostScriptError::TypeCheck),
    };

    interp.restore_save(record)
}

/// Nominal figures; the VM has no fixed arena to report on
fn op_vmstatus(interp: &mut Interpreter) -> PsResult<()> {
    let depth = interp.gstate_stack.len() as i32;

    interp.push(Object::integer(depth))?;
    interp.push(Object::integer(0))?;
    interp.push(Object::integer(i32::MAX))
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
    fn restore_reverts_graphics_state() {
        let mut interp = run(b"2 setlinewidth save 7 setlinewidth restore currentlinewidth");
        assert_eq!(interp.pop_number().unwrap(), 2.0);
    }

    #[test]
    fn restore_pops_dictionaries_begun_since_save() {
        let mut interp = run(b"save 4 dict begin 4 dict begin restore countdictstack");
        assert_eq!(interp.pop_int().unwrap(), 2);
    }

    #[test]
    fn a_save_object_is_single_use() {
        let mut interp = Interpreter::new(b"save dup restore restore");
        assert!(interp.run().is_err());
    }
}
