//! Operand-stack manipulation.

use crate::{
    dictionary::Dictionary,
    error::{PostScriptError, PsResult},
    interpreter::Interpreter,
    object::{Object, Value},
    operators::op,
};

pub(crate) fn install(dict: &mut Dictionary) {
    op(dict, b"dup", op_dup);
    op(dict, b"pop", op_pop);
    op(dict, b"exch", op_exch);
    op(dict, b"copy", op_copy);
    op(dict, b"index", op_index);
    op(dict, b"roll", op_roll);
    op(dict, b"clear", op_clear);
    op(dict, b"count", op_count);
    op(dict, b"mark", op_mark);
    op(dict, b"[", op_mark);
    op(dict, b"<<", op_mark);
    op(dict, b"cleartomark", op_cleartomark);
    op(dict, b"counttomark", op_counttomark);
}

fn op_dup(interp: &mut Interpreter) -> PsResult<()> {
    let obj = interp.pop()?;

    interp.push(obj.clone())?;
    interp.push(obj)
}

fn op_pop(interp: &mut Interpreter) -> PsResult<()> {
    interp.pop()?;

    Ok(())
}

fn op_exch(interp: &mut Interpreter) -> PsResult<()> {
    let b = interp.pop()?;
    let a = interp.pop()?;

    interp.push(b)?;
    interp.push(a)
}

/// In the integer form, duplicates the top n objects. In the composite
/// forms, copies all elements of the first operand into the second and
/// returns the filled prefix of the second.
fn op_copy(interp: &mut Interpreter) -> PsResult<()> {
    let top = interp.pop()?;

    match top.value {
        Value::Integer(n) => {
            let n = usize::try_from(n).map_err(|_| PostScriptError::RangeCheck)?;

            if n > interp.operand_stack.len() {
                anyhow::bail!(PostScriptError::StackUnderflow);
            }

            let from = interp.operand_stack.len() - n;
            for i in from..interp.operand_stack.len() {
                let obj = interp.operand_stack[i].clone();
                interp.push(obj)?;
            }

            Ok(())
        }
        Value::Array(dst) => {
            let src = interp.pop_array()?;

            if dst.len() < src.len() {
                anyhow::bail!(PostScriptError::RangeCheck);
            }

            dst.putinterval(0, &src)?;
            interp.push(Object::array(dst.getinterval(0, src.len())?))
        }
        Value::String(dst) => {
            let src = interp.pop_string()?;
            let bytes = src.bytes();

            if dst.capacity() < bytes.len() {
                anyhow::bail!(PostScriptError::RangeCheck);
            }

            for (i, &b) in bytes.iter().enumerate() {
                dst.put(i, b)?;
            }

            interp.push(Object::string(dst.getinterval(0, bytes.len())?))
        }
        Value::Dictionary(dst) => {
            let src = interp.pop_dict()?;

            // copying a dictionary onto itself is a no-op
            if !std::rc::Rc::ptr_eq(&src, &dst) {
                let entries = src.borrow().entries();

                for (key, value) in entries {
                    dst.borrow_mut().insert(key, value);
                }
            }

            interp.push(Object::dictionary(dst))
        }
        _ => anyhow::bail!(PostScriptError::TypeCheck),
    }
}

fn op_index(interp: &mut Interpreter) -> PsResult<()> {
    let n = interp.pop_usize()?;

    if n >= interp.operand_stack.len() {
        anyhow::bail!(PostScriptError::StackUnderflow);
    }

    let obj = interp.operand_stack[interp.operand_stack.len() - 1 - n].clone();
    interp.push(obj)
}

/// any(n-1) … any0 n j `roll` — cyclically rotate the top n objects by j
/// positions; positive j moves objects toward the top of the stack
fn op_roll(interp: &mut Interpreter) -> PsResult<()> {
    let j = interp.pop_int()?;
    let n = interp.pop_usize()?;

    if n > interp.operand_stack.len() {
        anyhow::bail!(PostScriptError::StackUnderflow);
    }

    if n == 0 {
        return Ok(());
    }

    let from = interp.operand_stack.len() - n;
    let shift = (j.rem_euclid(n as i32)) as usize;

    interp.operand_stack[from..].rotate_right(shift);

    Ok(())
}

fn op_clear(interp: &mut Interpreter) -> PsResult<()> {
    interp.operand_stack.clear();

    Ok(())
}

fn op_count(interp: &mut Interpreter) -> PsResult<()> {
    let count = interp.operand_stack.len();

    interp.push(Object::integer(count as i32))
}

/// All marks are identical; the operand stack may hold any number of them
fn op_mark(interp: &mut Interpreter) -> PsResult<()> {
    interp.push(Object::mark())
}

fn op_cleartomark(interp: &mut Interpreter) -> PsResult<()> {
    loop {
        match interp.operand_stack.pop() {
            Some(obj) if obj.is_mark() => return Ok(()),
            Some(_) => {}
            None => anyhow::bail!(PostScriptError::UnmatchedMark),
        }
    }
}

fn op_counttomark(interp: &mut Interpreter) -> PsResult<()> {
    let above = interp
        .operand_stack
        .iter()
        .rev()
        .position(Object::is_mark);

    match above {
        Some(n) => interp.push(Object::integer(n as i32)),
        None => anyhow::bail!(PostScriptError::UnmatchedMark),
    }
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
    fn dup_exch_pop() {
        let mut interp = run(b"1 2 dup pop exch");

        assert_eq!(interp.pop_int().unwrap(), 1);
        assert_eq!(interp.pop_int().unwrap(), 2);
        assert!(interp.pop().is_err());
    }

    #[test]
    fn copy_duplicates_top_n() {
        let mut interp = run(b"1 2 3 2 copy");

        assert_eq!(interp.pop_int().unwrap(), 3);
        assert_eq!(interp.pop_int().unwrap(), 2);
        assert_eq!(interp.pop_int().unwrap(), 3);
        assert_eq!(interp.pop_int().unwrap(), 2);
        assert_eq!(interp.pop_int().unwrap(), 1);
        assert!(interp.pop().is_err());
    }

    #[test]
    fn copy_zero_is_a_no_op() {
        let mut interp = run(b"1 2 0 copy");

        assert_eq!(interp.pop_int().unwrap(), 2);
        assert_eq!(interp.pop_int().unwrap(), 1);
        assert!(interp.pop().is_err());
    }

    #[test]
    fn copy_into_array_returns_filled_prefix() {
        let mut interp = run(b"[1 2 3] 5 array copy length");
        assert_eq!(interp.pop_int().unwrap(), 3);
    }

    #[test]
    fn index_reaches_below() {
        let mut interp = run(b"10 20 30 2 index");
        assert_eq!(interp.pop_int().unwrap(), 10);
    }

    #[test]
    fn roll_rotates_toward_top() {
        // (a) (b) (c) 3 1 roll => (c) (a) (b)
        let mut interp = run(b"1 2 3 3 1 roll");

        assert_eq!(interp.pop_int().unwrap(), 2);
        assert_eq!(interp.pop_int().unwrap(), 1);
        assert_eq!(interp.pop_int().unwrap(), 3);
    }

    #[test]
    fn roll_negative_rotates_down() {
        let mut interp = run(b"1 2 3 3 -1 roll");

        assert_eq!(interp.pop_int().unwrap(), 1);
        assert_eq!(interp.pop_int().unwrap(), 3);
        assert_eq!(interp.pop_int().unwrap(), 2);
    }

    #[test]
    fn counttomark_counts_and_cleartomark_drops() {
        let mut interp = run(b"mark 1 2 3 counttomark");
        assert_eq!(interp.pop_int().unwrap(), 3);

        let mut interp = run(b"9 mark 1 2 cleartomark");
        assert_eq!(interp.pop_int().unwrap(), 9);
        assert!(interp.pop().is_err());
    }

    #[test]
    fn count_reports_depth() {
        let mut interp = run(b"1 2 count");
        assert_eq!(interp.pop_int().unwrap(), 2);
    }
}
