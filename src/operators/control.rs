//! Control flow: conditionals, loops, cancellation, and `bind`.

use crate::{
    dictionary::Dictionary,
    error::{PostScriptError, PsResult},
    interpreter::Interpreter,
    object::{ArrayRef, Object, Value},
    operators::op,
};

pub(crate) fn install(dict: &mut Dictionary) {
    op(dict, b"exec", op_exec);
    op(dict, b"if", op_if);
    op(dict, b"ifelse", op_ifelse);
    op(dict, b"for", op_for);
    op(dict, b"repeat", op_repeat);
    op(dict, b"loop", op_loop);
    op(dict, b"forall", op_forall);
    op(dict, b"exit", op_exit);
    op(dict, b"stop", op_stop);
    op(dict, b"stopped", op_stopped);
    op(dict, b"quit", op_quit);
    op(dict, b"bind", op_bind);
}

fn op_exec(interp: &mut Interpreter) -> PsResult<()> {
    let obj = interp.pop()?;

    if obj.executable {
        interp.execute_object(obj)
    } else {
        interp.push(obj)
    }
}

fn op_if(interp: &mut Interpreter) -> PsResult<()> {
    let proc = interp.pop_proc()?;
    let condition = interp.pop_bool()?;

    if condition {
        interp.execute_proc(&proc)?;
    }

    Ok(())
}

fn op_ifelse(interp: &mut Interpreter) -> PsResult<()> {
    let proc_else = interp.pop_proc()?;
    let proc_then = interp.pop_proc()?;
    let condition = interp.pop_bool()?;

    if condition {
        interp.execute_proc(&proc_then)
    } else {
        interp.execute_proc(&proc_else)
    }
}

/// True when a loop body asked to unwind; `exit` is consumed here, `stop`
/// keeps propagating
fn loop_interrupted(interp: &mut Interpreter) -> bool {
    if interp.exit_requested {
        interp.exit_requested = false;
        return true;
    }

    interp.stop_requested || interp.quit_requested
}

/// initial increment limit proc `for` — the control variable stays an
/// integer when all three bounds are integers
fn op_for(interp: &mut Interpreter) -> PsResult<()> {
    let proc = interp.pop_proc()?;
    let limit = interp.pop()?;
    let increment = interp.pop()?;
    let initial = interp.pop()?;

    let all_integers = matches!(
        (&initial.value, &increment.value, &limit.value),
        (Value::Integer(_), Value::Integer(_), Value::Integer(_))
    );

    let initial = initial.expect_number()?;
    let increment = increment.expect_number()?;
    let limit = limit.expect_number()?;

    if increment == 0.0 {
        anyhow::bail!(PostScriptError::RangeCheck);
    }

    let finished = |control: f64| {
        if increment > 0.0 {
            control > limit
        } else {
            control < limit
        }
    };

    let mut control = initial;

    while !finished(control) {
        if all_integers {
            interp.push(Object::integer(control as i32))?;
        } else {
            interp.push(Object::real(control))?;
        }

        interp.execute_proc(&proc)?;

        if loop_interrupted(interp) {
            break;
        }

        control += increment;
    }

    Ok(())
}

fn op_repeat(interp: &mut Interpreter) -> PsResult<()> {
    let proc = interp.pop_proc()?;
    let count = interp.pop_usize()?;

    for _ in 0..count {
        interp.execute_proc(&proc)?;

        if loop_interrupted(interp) {
            break;
        }
    }

    Ok(())
}

fn op_loop(interp: &mut Interpreter) -> PsResult<()> {
    let proc = interp.pop_proc()?;

    loop {
        interp.execute_proc(&proc)?;

        if loop_interrupted(interp) {
            break;
        }
    }

    Ok(())
}

/// Iterate a container: array elements, dictionary key/value pairs, or
/// string bytes
fn op_forall(interp: &mut Interpreter) -> PsResult<()> {
    let proc = interp.pop_proc()?;
    let container = interp.pop()?;

    match container.value {
        Value::Array(arr) => {
            for i in 0..arr.len() {
                interp.push(arr.get(i)?)?;
                interp.execute_proc(&proc)?;

                if loop_interrupted(interp) {
                    break;
                }
            }
        }
        Value::Dictionary(dict) => {
            let entries = dict.borrow().entries();

            for (key, value) in entries {
                interp.push(Object::literal_name(key))?;
                interp.push(value)?;
                interp.execute_proc(&proc)?;

                if loop_interrupted(interp) {
                    break;
                }
            }
        }
        Value::String(s) => {
            for i in 0..s.len() {
                interp.push(Object::integer(i32::from(s.get(i)?)))?;
                interp.execute_proc(&proc)?;

                if loop_interrupted(interp) {
                    break;
                }
            }
        }
        _ => anyhow::bail!(PostScriptError::TypeCheck),
    }

    Ok(())
}

/// Unwinds the nearest enclosing looping context
fn op_exit(interp: &mut Interpreter) -> PsResult<()> {
    interp.exit_requested = true;

    Ok(())
}

fn op_stop(interp: &mut Interpreter) -> PsResult<()> {
    interp.stop_requested = true;

    Ok(())
}

/// any `stopped` bool — true when the object stopped, false on normal
/// completion
fn op_stopped(interp: &mut Interpreter) -> PsResult<()> {
    let obj = interp.pop()?;

    let stopped = interp.run_stopped(obj)?;

    interp.push(Object::boolean(stopped))
}

fn op_quit(interp: &mut Interpreter) -> PsResult<()> {
    interp.quit_requested = true;

    Ok(())
}

/// Replace executable operator names in a procedure with the operators
/// themselves, recursing into nested procedures
fn op_bind(interp: &mut Interpreter) -> PsResult<()> {
    let proc = interp.pop_proc()?;

    bind_procedure(interp, &proc, 0);

    interp.push(Object::procedure(proc))
}

fn bind_procedure(interp: &Interpreter, proc: &ArrayRef, depth: usize) {
    // runaway self-reference guard
    if depth > 32 || !proc.access().writable() {
        return;
    }

    for i in 0..proc.len() {
        let element = match proc.get(i) {
            Ok(obj) => obj,
            Err(_) => return,
        };

        match &element.value {
            Value::Name(name) if element.executable => {
                if let Some(resolved) = interp.dicts.lookup(*name) {
                    if matches!(resolved.value, Value::Operator(_)) {
                        let _ = proc.put(i, resolved);
                    }
                }
            }
            Value::Array(nested) if nested.is_procedure() => {
                bind_procedure(interp, nested, depth + 1);
            }
            _ => {}
        }
    }
}
